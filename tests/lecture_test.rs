//! Integration tests for lecture set up, navigation and page numbers.

use std::fs;

use matuc::config::{ConfFactory, LectureMetaData, MetaInfo, CONF_FILE_NAME};
use matuc::pagenumbering::{add_page_number, fix_page_numbers_in_file};
use matuc::{
    get_lecture_root, is_within_lecture, table_of_contents, FileCache, FileWalker,
    ImageDescription, InitLecture,
};
use tempfile::TempDir;

fn lecture() -> TempDir {
    let dir = TempDir::new().unwrap();
    InitLecture::new(dir.path(), 2, "de")
        .with_preface(true)
        .with_appendix_count(1)
        .generate_structure()
        .unwrap();
    dir
}

#[test]
fn test_conf_is_found_from_chapter() {
    let dir = lecture();
    let chapter = dir.path().join("k02").join("k02.md");
    assert!(is_within_lecture(&chapter));
    assert_eq!(
        get_lecture_root(&chapter).unwrap(),
        dir.path().canonicalize().unwrap()
    );

    let mut conf = LectureMetaData::new(dir.path().join(CONF_FILE_NAME));
    conf.read().unwrap();
    conf.set(MetaInfo::LectureTitle, "Analysis I");
    conf.write().unwrap();

    let found = ConfFactory::new().get_conf_instance(&chapter).unwrap();
    assert_eq!(found.get(MetaInfo::LectureTitle), "Analysis I");
    assert_eq!(found.get(MetaInfo::Language), "de");
}

#[test]
fn test_navigation_order() {
    let dir = lecture();
    let cache = FileCache::new(FileWalker::new(dir.path()).walk().unwrap()).unwrap();
    assert_eq!(cache.len(), 4);

    let (previous, next) = cache.get_neighbours_for(dir.path().join("k01/k01.md")).unwrap();
    assert_eq!(previous.unwrap().1, "v01.md");
    assert_eq!(next.unwrap().1, "k02.md");

    let (previous, next) = cache.get_neighbours_for(dir.path().join("anh01/anh01.md")).unwrap();
    assert_eq!(previous.unwrap().1, "k02.md");
    assert!(next.is_none());
}

#[test]
fn test_table_of_contents_lists_all_chapters() {
    let dir = lecture();
    fs::write(
        dir.path().join("k01/k01.md"),
        "Kapitel 1\n=========\n\nGrundlagen\n----------\n\nText\n",
    )
    .unwrap();
    let toc = table_of_contents(dir.path()).unwrap();
    let preface = toc.find("v01/v01.html").unwrap();
    let first = toc.find("k01/k01.html").unwrap();
    let appendix = toc.find("anh01/anh01.html").unwrap();
    assert!(preface < first && first < appendix);
    assert!(toc.contains("Grundlagen"));
}

#[test]
fn test_page_numbers_in_chapter() {
    let dir = lecture();
    let file = dir.path().join("k01/k01.md");
    fs::write(
        &file,
        "Kapitel 1\n=========\n\n|| - Seite 1 -\n\nText\n\n|| - Seite 3 -\n\nmehr\n",
    )
    .unwrap();

    let next = add_page_number(&file, 10).unwrap();
    assert_eq!(next.format(), "|| - Seite 4 -");

    let fixes = fix_page_numbers_in_file(&file).unwrap();
    assert_eq!(fixes, vec![(8, "|| - Seite 2 -".to_string())]);
    let text = fs::read_to_string(&file).unwrap();
    assert!(text.contains("|| - Seite 2 -"));
    assert!(!text.contains("|| - Seite 3 -"));
}

#[test]
fn test_long_image_description_is_outsourced() {
    let description = "Ein Diagramm mit sehr vielen Details. ".repeat(4);
    let snippets = ImageDescription::new("bilder/diagramm.png")
        .with_description(description.clone())
        .with_title("Diagramm")
        .with_language("de")
        .get_output()
        .unwrap();
    assert_eq!(snippets.external_file.as_deref(), Some("bilder.md"));
    assert!(snippets.internal.contains("bilder.html#"));
    assert!(snippets.external.unwrap().contains(description.trim()));
}
