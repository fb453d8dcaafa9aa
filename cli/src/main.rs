//! matuc CLI - convert and check MarkDown lectures

use std::error::Error;
use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{json, Value};

use matuc::config::{ConfFactory, LectureMetaData, MetaInfo, CONF_FILE_NAME};
use matuc::convert::{ConversionProfile, Master, Pandoc};
use matuc::pagenumbering::{
    add_page_number, add_page_number_from_str, apply_corrections, fix_page_numbers, insert_line,
};
use matuc::qa::MistakePriority;
use matuc::{
    is_within_lecture, table_of_contents, ImageDescription, InitLecture, JsonFormat, MistakeReport,
    Mistkerl, Response,
};

/// Exit code for errors reported by the library
const EXIT_LIBRARY_ERROR: i32 = 119;
/// Exit code for invalid command line input
const EXIT_INVALID_INPUT: i32 = 127;

#[derive(Parser)]
#[command(name = "matuc")]
#[command(author = "AGSBS")]
#[command(version)]
#[command(about = "Convert MarkDown lectures to accessible HTML and check them for mistakes", long_about = None)]
struct Cli {
    /// Print all output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a page number for a given line
    Addpnum {
        /// Read the document from PATH instead of standard input
        #[arg(short = 'f')]
        read_from_file: bool,

        /// Read the document from PATH and insert the page number there
        #[arg(short = 'F', conflicts_with = "read_from_file")]
        write_to_file: bool,

        /// File or directory to load the configuration from
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Line to generate the page number for
        #[arg(value_name = "LINE")]
        line: usize,
    },

    /// Show or change the lecture configuration
    Conf {
        #[command(subcommand)]
        action: ConfAction,
    },

    /// Convert a file or a directory containing lectures
    Conv {
        /// File or directory
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Conversion profile
        #[arg(short, long, value_enum, default_value = "blind")]
        profile: Profile,

        /// Convert files even if their output is up to date
        #[arg(long)]
        force: bool,
    },

    /// Check page numbers and fix those not increasing by one
    Fixpnums {
        /// Read from this file instead of standard input
        #[arg(short = 'f', value_name = "FILE")]
        file: Option<PathBuf>,

        /// Replace the page numbers in FILE
        #[arg(short = 'i')]
        in_place: bool,
    },

    /// Generate snippets for an image description
    Imgdsc {
        /// Image path, relative to the chapter file
        #[arg(value_name = "PATH")]
        path: String,

        /// Description (- reads standard input)
        #[arg(short, long, value_name = "DESC", default_value = "no description")]
        description: String,

        /// Outsource the description regardless of its length
        #[arg(short = 'o', long = "outsource-descriptions")]
        outsource: bool,

        /// Title for outsourced descriptions
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Check whether a path is part of a lecture
    Iswithinlecture {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Run the Mistkerl, checking for common mistakes
    Mk {
        /// File or directory
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Least important mistakes to report
        #[arg(short, long, value_enum, default_value = "normal")]
        priority: Priority,

        /// Use less blank lines in output
        #[arg(short, long)]
        squeeze: bool,

        /// Do not check links
        #[arg(long)]
        no_links: bool,
    },

    /// Create a new lecture
    New {
        /// Directory of the new lecture
        #[arg(value_name = "DIR")]
        directory: PathBuf,

        /// Number of appendix chapters
        #[arg(short, value_name = "COUNT", default_value = "0")]
        appendix_count: u32,

        /// Number of chapters
        #[arg(short, value_name = "COUNT", default_value = "2")]
        chapter_count: u32,

        /// Add a preface
        #[arg(short)]
        preface: bool,

        /// Use exercise sheets (blattNN) instead of chapters (kNN)
        #[arg(short = 'n')]
        papers: bool,

        /// Language of the lecture
        #[arg(short, default_value = "de")]
        lang: String,
    },

    /// Generate the table of contents
    Toc {
        /// Lecture directory
        #[arg(value_name = "DIR")]
        directory: PathBuf,

        /// Write to this file instead of standard output
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum ConfAction {
    /// Show the configuration of the current lecture, defaults if none exists
    Show,
    /// Change the configuration of the current lecture
    Update(ConfValues),
    /// Write a configuration to the current directory
    Init(ConfValues),
}

#[derive(Args, Default)]
struct ConfValues {
    /// Prefix appendix chapter numbers with "A" and omit the appendix heading
    #[arg(short = 'a')]
    appendix_prefix: bool,

    /// Author of the source document
    #[arg(short = 'A', value_name = "NAME")]
    source_author: Option<String>,

    /// Editor of the lecture
    #[arg(short = 'e', value_name = "NAME")]
    editor: Option<String>,

    /// Institution
    #[arg(short = 'i', value_name = "NAME")]
    institution: Option<String>,

    /// Title of the lecture
    #[arg(short = 'l', value_name = "TITLE")]
    lecture_title: Option<String>,

    /// Language of the lecture
    #[arg(short = 'L', value_name = "LANG")]
    language: Option<String>,

    /// Gap between page links in the navigation bar
    #[arg(short = 'p', long = "pnum-gap", value_name = "NUM")]
    page_numbering_gap: Option<usize>,

    /// Source document
    #[arg(short = 's', value_name = "SRC")]
    source: Option<String>,

    /// Semester of edit
    #[arg(short = 'S', value_name = "SEMYEAR")]
    semester_of_edit: Option<String>,

    /// Depth of headings in the table of contents
    #[arg(long, value_name = "NUM")]
    toc_depth: Option<usize>,

    /// Working group
    #[arg(short = 'w', value_name = "GROUP")]
    working_group: Option<String>,

    /// Number chapters automatically
    #[arg(long)]
    auto_numbering: bool,
}

impl ConfValues {
    fn apply(&self, conf: &mut LectureMetaData) {
        let values = [
            (MetaInfo::SourceAuthor, self.source_author.clone()),
            (MetaInfo::Editor, self.editor.clone()),
            (MetaInfo::Institution, self.institution.clone()),
            (MetaInfo::LectureTitle, self.lecture_title.clone()),
            (MetaInfo::Language, self.language.clone()),
            (MetaInfo::PageNumberingGap, self.page_numbering_gap.map(|n| n.to_string())),
            (MetaInfo::Source, self.source.clone()),
            (MetaInfo::SemesterOfEdit, self.semester_of_edit.clone()),
            (MetaInfo::TocDepth, self.toc_depth.map(|n| n.to_string())),
            (MetaInfo::WorkingGroup, self.working_group.clone()),
        ];
        for (key, value) in values {
            if let Some(value) = value {
                conf.set(key, value);
            }
        }
        if self.appendix_prefix {
            conf.set(MetaInfo::AppendixPrefix, "1");
        }
        if self.auto_numbering {
            conf.set(MetaInfo::AutoNumberingOfChapter, "1");
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Profile {
    /// Formulas as images for blind readers
    Blind,
    /// Formulas rendered with MathJax for visually impaired readers
    Vid,
}

impl From<Profile> for ConversionProfile {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::Blind => ConversionProfile::Blind,
            Profile::Vid => ConversionProfile::VisuallyImpaired,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Priority {
    /// Only mistakes breaking the conversion
    Critical,
    /// Mistakes affecting the result
    Normal,
    /// Everything, including style
    Pedantic,
}

impl From<Priority> for MistakePriority {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Critical => MistakePriority::Critical,
            Priority::Normal => MistakePriority::Normal,
            Priority::Pedantic => MistakePriority::Pedantic,
        }
    }
}

/// Invalid input on the command line, as opposed to a failure of the library.
#[derive(Debug)]
struct InvalidInput(String);

impl fmt::Display for InvalidInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for InvalidInput {}

fn invalid(message: impl Into<String>) -> Box<dyn Error> {
    Box::new(InvalidInput(message.into()))
}

type CmdResult = Result<(), Box<dyn Error>>;

/// Writes results either for humans or as JSON.
struct Output {
    json: bool,
}

impl Output {
    fn result(&self, value: Value, text: impl fmt::Display) {
        self.result_with_warnings(value, text, &[]);
    }

    fn result_with_warnings(&self, value: Value, text: impl fmt::Display, warnings: &[String]) {
        if self.json {
            self.emit(&Response::result(value).with_warnings(warnings.iter().cloned()));
        } else {
            for warning in warnings {
                eprintln!("{}: {}", "Warning".yellow().bold(), warning);
            }
            println!("{}", text);
        }
    }

    fn emit(&self, response: &Response) {
        match response.to_json(JsonFormat::Pretty) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("{}: {}", "Error".red().bold(), e),
        }
    }

    /// Report an error and return the exit code for it.
    fn error(&self, error: &(dyn Error + 'static)) -> i32 {
        let (response, code) = if let Some(e) = error.downcast_ref::<matuc::Error>() {
            (Response::error(e), EXIT_LIBRARY_ERROR)
        } else if error.downcast_ref::<InvalidInput>().is_some() {
            (Response::error_message(error.to_string()), EXIT_INVALID_INPUT)
        } else {
            (Response::error_message(error.to_string()), EXIT_LIBRARY_ERROR)
        };
        if self.json {
            self.emit(&response);
        } else {
            eprintln!("{}: {}", "Error".red().bold(), error);
        }
        code
    }

    fn progress_bar(&self, len: Option<u64>) -> ProgressBar {
        if self.json {
            return ProgressBar::hidden();
        }
        match len {
            Some(len) => {
                let pb = ProgressBar::new(len);
                if let Ok(style) =
                    ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                {
                    pb.set_style(style.progress_chars("#>-"));
                }
                pb
            }
            None => ProgressBar::new_spinner(),
        }
    }
}

fn main() {
    env_logger::init();

    let json = std::env::args().any(|arg| arg == "--json");
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_INVALID_INPUT } else { 0 };
            if json {
                let usage = Cli::command_usage();
                let error = e.use_stderr().then(|| e.to_string());
                Output { json }.emit(&Response::usage(usage, error.as_deref()));
            } else {
                let _ = e.print();
            }
            std::process::exit(code);
        }
    };
    let out = Output { json: cli.json };

    let result = match cli.command {
        Commands::Addpnum {
            read_from_file,
            write_to_file,
            path,
            line,
        } => cmd_addpnum(&out, &path, line, read_from_file, write_to_file),
        Commands::Conf { action } => cmd_conf(&out, action),
        Commands::Conv {
            path,
            profile,
            force,
        } => cmd_conv(&out, &path, profile.into(), force),
        Commands::Fixpnums { file, in_place } => cmd_fixpnums(&out, file.as_deref(), in_place),
        Commands::Imgdsc {
            path,
            description,
            outsource,
            title,
        } => cmd_imgdsc(&out, path, description, outsource, title),
        Commands::Iswithinlecture { path } => {
            let within = is_within_lecture(&path);
            out.result(json!({ "is within a lecture": within }), within);
            Ok(())
        }
        Commands::Mk {
            path,
            priority,
            squeeze,
            no_links,
        } => cmd_mk(&out, &path, priority.into(), squeeze, !no_links),
        Commands::New {
            directory,
            appendix_count,
            chapter_count,
            preface,
            papers,
            lang,
        } => cmd_new(&out, &directory, appendix_count, chapter_count, preface, papers, lang),
        Commands::Toc { directory, output } => cmd_toc(&out, &directory, output.as_deref()),
        Commands::Version => {
            cmd_version(&out);
            Ok(())
        }
    };

    if let Err(e) = result {
        std::process::exit(out.error(e.as_ref()));
    }
}

impl Cli {
    fn command_usage() -> String {
        use clap::CommandFactory;
        Cli::command().render_usage().to_string()
    }
}

fn read_stdin() -> io::Result<String> {
    let mut text = String::new();
    io::stdin().read_to_string(&mut text)?;
    Ok(text)
}

fn cmd_addpnum(
    out: &Output,
    path: &Path,
    line: usize,
    read_from_file: bool,
    write_to_file: bool,
) -> CmdResult {
    if !path.exists() {
        return Err(invalid(format!("{} does not exist", path.display())));
    }
    if line == 0 {
        return Err(invalid("line numbers count from one"));
    }
    if (read_from_file || write_to_file) && !path.is_file() {
        return Err(invalid(
            "Given path is not a file, but reading from it has been requested.",
        ));
    }

    let pnum = if read_from_file || write_to_file {
        add_page_number(path, line)?
    } else {
        let text = read_stdin()?;
        let conf = ConfFactory::new().get_conf_instance(path)?;
        add_page_number_from_str(&text, line, conf.get(MetaInfo::Language))
    };
    let marker = pnum.format();

    if write_to_file {
        let text = fs::read_to_string(path)?;
        let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        insert_line(&mut lines, line, &marker)?;
        fs::write(path, lines.join("\n"))?;
        log::debug!("inserted {} into {}", marker, path.display());
        out.result(json!({ "pagenumber": marker }), format!("{} {}", "Inserted".green(), marker));
    } else {
        out.result(json!({ "pagenumber": marker }), &marker);
    }
    Ok(())
}

fn cmd_conf(out: &Output, action: ConfAction) -> CmdResult {
    let cwd = std::env::current_dir()?;
    let (mut conf, values, title) = match action {
        ConfAction::Show => (ConfFactory::new().get_conf_instance(&cwd)?, None, "Current settings"),
        ConfAction::Update(values) => (
            ConfFactory::new().get_conf_instance(&cwd)?,
            Some(values),
            "New settings",
        ),
        ConfAction::Init(values) => {
            let mut conf = LectureMetaData::new(cwd.join(CONF_FILE_NAME));
            if conf.path().is_file() {
                conf.read()?;
            }
            (conf, Some(values), "New settings")
        }
    };
    if let Some(values) = values {
        values.apply(&mut conf);
        conf.write()?;
    }

    let settings = serde_json::to_value(&conf)?;
    let mut text = format!("{}\n", title.bold());
    for (key, value) in conf.items() {
        text.push_str(&format!("  {:<24} {}\n", key.name().cyan(), value));
    }
    out.result_with_warnings(
        json!({ title: settings }),
        text.trim_end(),
        conf.warnings(),
    );
    Ok(())
}

fn cmd_conv(out: &Output, path: &Path, profile: ConversionProfile, force: bool) -> CmdResult {
    if !path.exists() {
        return Err(invalid(format!("file or directory not found: {}", path.display())));
    }

    let written = if path.is_dir() {
        let master = Master::new(path)?.with_profile(profile).with_force(force);
        let pb = out.progress_bar(None);
        pb.set_message("Converting...");
        let written = master.run_with_progress(|file| {
            pb.set_message(file.display().to_string());
            pb.tick();
        })?;
        pb.finish_and_clear();
        written
    } else {
        let pb = out.progress_bar(Some(1));
        let mut pandoc = Pandoc::new().with_profile(profile).with_force(force);
        let written = pandoc.convert_files_with_progress(&[path], |_| pb.inc(1))?;
        pb.finish_and_clear();
        written
    };

    let files: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
    let text = if files.is_empty() {
        "Nothing to convert, everything is up to date.".dimmed().to_string()
    } else {
        let mut text = format!("{}", "Converted files:".green().bold());
        for (idx, file) in files.iter().enumerate() {
            let branch = if idx + 1 == files.len() { "└─" } else { "├─" };
            text.push_str(&format!("\n  {} {}", branch.dimmed(), file));
        }
        text
    };
    out.result(json!({ "converted": files }), text);
    Ok(())
}

fn cmd_fixpnums(out: &Output, file: Option<&Path>, in_place: bool) -> CmdResult {
    if in_place && file.is_none() {
        return Err(invalid("In-place modifications requested, but no file given."));
    }
    let text = match file {
        Some(path) if !path.exists() => {
            return Err(invalid(format!("{} does not exist", path.display())));
        }
        Some(path) => fs::read_to_string(path)?,
        None => read_stdin()?,
    };

    let corrections = fix_page_numbers(&text);
    if in_place {
        if let Some(path) = file {
            if !corrections.is_empty() {
                fs::write(path, apply_corrections(&text, &corrections))?;
            }
        }
    }

    let value: Vec<Value> = corrections
        .iter()
        .map(|(line, marker)| json!({ line.to_string(): marker }))
        .collect();
    let text = if corrections.is_empty() {
        "Page numbering is correct.".green().to_string()
    } else {
        corrections
            .iter()
            .map(|(line, marker)| format!("{}: {}", line, marker))
            .collect::<Vec<_>>()
            .join("\n")
    };
    out.result(Value::Array(value), text);
    Ok(())
}

fn cmd_imgdsc(
    out: &Output,
    path: String,
    description: String,
    outsource: bool,
    title: Option<String>,
) -> CmdResult {
    let description = if description == "-" {
        read_stdin()?
    } else {
        description
    };
    let conf = ConfFactory::new().get_conf_instance(std::env::current_dir()?)?;
    let mut image = ImageDescription::new(path)
        .with_description(description)
        .with_outsourcing(outsource)
        .with_language(conf.get(MetaInfo::Language));
    if let Some(title) = title {
        image = image.with_title(title);
    }
    let snippets = image.get_output()?;

    let mut text = snippets.internal.clone();
    if let (Some(external), Some(file)) = (&snippets.external, &snippets.external_file) {
        text.push_str(&format!("\n\n{} {}\n\n{}", "Add to".green().bold(), file, external));
    }
    out.result(serde_json::to_value(&snippets)?, text.trim_end());
    Ok(())
}

fn cmd_mk(
    out: &Output,
    path: &Path,
    priority: MistakePriority,
    squeeze: bool,
    check_links: bool,
) -> CmdResult {
    if !path.exists() {
        return Err(invalid(format!("{} does not exist.", path.display())));
    }
    let mistakes = Mistkerl::new()
        .with_priority(priority)
        .with_link_checking(check_links)
        .run(path)?;
    let report = MistakeReport::new(mistakes);
    out.result(report.to_json(), report.format_text(squeeze));
    Ok(())
}

fn cmd_new(
    out: &Output,
    directory: &Path,
    appendix_count: u32,
    chapter_count: u32,
    preface: bool,
    papers: bool,
    lang: String,
) -> CmdResult {
    let created = InitLecture::new(directory, chapter_count, lang)
        .with_appendix_count(appendix_count)
        .with_preface(preface)
        .with_papers(papers)
        .generate_structure()?;
    let files: Vec<String> = created.iter().map(|p| p.display().to_string()).collect();
    out.result(
        json!({ "created": files }),
        format!("{} {}", "Created lecture in".green(), directory.display()),
    );
    Ok(())
}

fn cmd_toc(out: &Output, directory: &Path, output: Option<&Path>) -> CmdResult {
    if !directory.exists() {
        return Err(invalid(format!("Directory {} does not exist", directory.display())));
    }
    let toc = table_of_contents(directory)?;
    match output {
        Some(path) => {
            fs::write(path, &toc)?;
            out.result(
                json!({ "written": path.display().to_string() }),
                format!("{} {}", "Saved to".green(), path.display()),
            );
        }
        None => out.result(Value::String(toc.clone()), toc),
    }
    Ok(())
}

fn cmd_version(out: &Output) {
    let version = env!("CARGO_PKG_VERSION");
    out.result(
        json!({ "version": version }),
        format!(
            "{} {}\nConvert and check MarkDown lectures\n\nLicense: LGPL-3.0-or-later",
            "matuc".cyan().bold(),
            version
        ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_global_json_flag() {
        let cli = Cli::try_parse_from(["matuc", "mk", "--json", "-p", "pedantic", "k01"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Mk { priority, path, .. } => {
                assert!(priority == Priority::Pedantic);
                assert_eq!(path, PathBuf::from("k01"));
            }
            _ => panic!("expected mk"),
        }
    }

    #[test]
    fn test_addpnum_flags_conflict() {
        assert!(Cli::try_parse_from(["matuc", "addpnum", "-f", "-F", "k01.md", "3"]).is_err());
    }

    #[test]
    fn test_conf_values_are_applied() {
        let dir = TempDir::new().unwrap();
        let mut conf = LectureMetaData::new(dir.path().join(CONF_FILE_NAME));
        let cli = Cli::try_parse_from([
            "matuc", "conf", "update", "-l", "Analysis", "-L", "en", "--pnum-gap", "10", "-a",
        ])
        .unwrap();
        let Commands::Conf {
            action: ConfAction::Update(values),
        } = cli.command
        else {
            panic!("expected conf update");
        };
        values.apply(&mut conf);
        assert_eq!(conf.get(MetaInfo::LectureTitle), "Analysis");
        assert_eq!(conf.get(MetaInfo::Language), "en");
        assert_eq!(conf.get(MetaInfo::PageNumberingGap), "10");
        assert!(conf.get_bool(MetaInfo::AppendixPrefix));
        assert_eq!(conf.get(MetaInfo::Institution), "TU Dresden");
    }

    #[test]
    fn test_invalid_input_maps_to_exit_code() {
        let out = Output { json: false };
        assert_eq!(out.error(invalid("kaputt").as_ref()), EXIT_INVALID_INPUT);
        let err: Box<dyn Error> = Box::new(matuc::Error::Other("kaputt".into()));
        assert_eq!(out.error(err.as_ref()), EXIT_LIBRARY_ERROR);
    }
}
