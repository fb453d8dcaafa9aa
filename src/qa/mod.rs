//! Quality assurance for lecture sources.
//!
//! The [`Mistkerl`] walks a lecture and feeds every file to a list of
//! checks implementing [`Mistake`]. Each check announces which part of a
//! document it needs (single lines, paragraphs, formulas, headings of a
//! directory, ...) and reports the first mistake it finds, with a German
//! message for the editor. Links are verified afterwards by the
//! [`LinkChecker`] over the whole tree.

mod all_formats;
mod latex;
mod linkchecker;
mod markdown;
mod meta;
mod mistkerl;

pub use all_formats::{BrokenUmlautsFromPdfFiles, ConfigurationValuesAreAllSet};
pub use latex::{
    CasesSqueezedOnOneLine, LaTeXMatricesAreHardToRead, NonAsciiCharactersInFormula,
    SpacingInFormulaShouldBeDoneWithQuad, UseProperCommandsForMathOperatorsAndFunctions,
};
pub use linkchecker::{
    extract_document_links, format_extensions_list, Anchors, LinkChecker, LinkExtractor,
    LinkRecord, DOCUMENT_EXTENSIONS, IMAGE_EXTENSIONS,
};
pub use markdown::{
    BrokenImageLinksAreDetected, DetectEmptyImageDescriptions, DetectStrayingDollars,
    DisplayMathShouldNotBeUsedWithinAParagraph, DoNotEmbedHtml,
    FreeStandingFormulasShouldBeDisplaymath, HeadingIsParagraph,
    HyphensFromJustifiedTextWereRemoved, InlineMathsShouldntContainNewlines, ItemizeIsParagraph,
    LevelOneHeading, OldstylePageNumbering, PageNumberIsParagraph, PageNumberingTextIsLowercase,
    PageNumbersWithoutDashes, PageStringButNoPageNumber, ParagraphMayNotEndOnBackslash,
    TextInItemizeShouldntStartWithItemizeCharacter, ToDosInImageDescriptionsAreBad,
    TooManyHeadings, UniformPageStrings, UnknownPageString,
};
pub use meta::{
    is_image_file, raw_page_numbers, DirectoryHeadings, DirectoryPageNumbers, ErrorMessage,
    Mistake, MistakeInput, MistakePriority, MistakeType, RawPageNumber,
};
pub use mistkerl::{paragraphs_to_text, Mistkerl};

use std::sync::Arc;

/// All checks. `toc_depth` limits the headings counted for the table of
/// contents.
pub fn all_checks(toc_depth: u8) -> Vec<Arc<dyn Mistake>> {
    vec![
        Arc::new(PageNumberIsParagraph),
        Arc::new(HeadingIsParagraph),
        Arc::new(LevelOneHeading),
        Arc::new(OldstylePageNumbering),
        Arc::new(ItemizeIsParagraph),
        Arc::new(PageNumberingTextIsLowercase),
        Arc::new(PageStringButNoPageNumber),
        Arc::new(UnknownPageString),
        Arc::new(UniformPageStrings),
        Arc::new(TooManyHeadings::default().with_max_depth(toc_depth)),
        Arc::new(LaTeXMatricesAreHardToRead),
        Arc::new(PageNumbersWithoutDashes),
        Arc::new(BrokenUmlautsFromPdfFiles),
        Arc::new(ConfigurationValuesAreAllSet),
        Arc::new(DetectStrayingDollars),
        Arc::new(DoNotEmbedHtml),
        Arc::new(DetectEmptyImageDescriptions),
        Arc::new(ToDosInImageDescriptionsAreBad),
        Arc::new(ParagraphMayNotEndOnBackslash),
        Arc::new(FreeStandingFormulasShouldBeDisplaymath),
        Arc::new(DisplayMathShouldNotBeUsedWithinAParagraph),
        Arc::new(InlineMathsShouldntContainNewlines),
        Arc::new(NonAsciiCharactersInFormula),
        Arc::new(SpacingInFormulaShouldBeDoneWithQuad),
        Arc::new(TextInItemizeShouldntStartWithItemizeCharacter),
        Arc::new(HyphensFromJustifiedTextWereRemoved),
        Arc::new(CasesSqueezedOnOneLine),
        Arc::new(UseProperCommandsForMathOperatorsAndFunctions),
        Arc::new(BrokenImageLinksAreDetected),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_check_names_are_unique() {
        let checks = all_checks(5);
        let names: HashSet<_> = checks.iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), checks.len());
    }
}
