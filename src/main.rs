//! Java Source Breakdown Tool
//!
//! Classifies every line of a Java source file as code, comment,
//! documentation comment, or whitespace and reports the composition of a
//! single file or of a whole directory tree, largest category first.

use clap::{ArgAction, CommandFactory, Parser};
use std::fmt::Write as FmtWrite;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use colored::*;

mod classifier;
mod report;
mod selector;
mod tally;

use classifier::{classify, classify_with, Classification};
use report::{listing_width, render, truncate_start, ReportContext};
use selector::{
    check_file, collect_files, read_lines, Eligibility, SelectorConfig, Sniffer, WalkConfig,
};
use tally::{merge_all, Tally};

const DEFAULT_TARGET_DIR: &str = "src";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Line composition breakdown for Java sources",
    long_about = "Counts lines of code, comments, documentation comments and whitespace in a Java source file or directory tree. Without a path, the `src` directory is used if present, otherwise the current directory."
)]
struct Args {
    /// File or directory to analyse.
    path: Option<PathBuf>,

    /// Output the result for every file as well as the grand total (directories only).
    #[arg(short, long)]
    individual: bool,

    /// Show debug information about file selection and line parsing.
    #[arg(short, long)]
    debug: bool,

    /// List the files that were analysed.
    #[arg(short, long)]
    verbose: bool,

    /// Source file extension, without the leading dot.
    #[arg(short, long, default_value = "java")]
    extension: String,

    /// How to determine a file's content type.
    #[arg(short, long, value_enum, default_value_t = Sniffer::Auto)]
    sniffer: Sniffer,

    /// Additional directory name to skip (repeatable).
    #[arg(long, action = ArgAction::Append)]
    ignore: Vec<String>,

    /// Only consider files whose name or relative path matches this glob.
    #[arg(short = 'f', long)]
    filespec: Option<String>,

    /// Do not descend into subdirectories.
    #[arg(short = 'n', long)]
    non_recursive: bool,

    #[arg(long, default_value = "100")]
    max_depth: usize,

    #[arg(short, long, default_value = "1000000")]
    max_entries: usize,
}

/// Everything a run needs, resolved from the command line.
#[derive(Debug, Clone)]
struct RunConfig {
    target: PathBuf,
    individual: bool,
    debug: bool,
    verbose: bool,
    selector: SelectorConfig,
    walk: WalkConfig,
}

impl RunConfig {
    fn from_args(args: Args, base_dir: &Path) -> Self {
        RunConfig {
            target: resolve_target(args.path, base_dir),
            individual: args.individual,
            debug: args.debug,
            verbose: args.verbose,
            selector: SelectorConfig {
                extension: args.extension,
                sniffer: args.sniffer,
            },
            walk: WalkConfig {
                ignore: args.ignore,
                filespec: args.filespec,
                non_recursive: args.non_recursive,
                max_depth: args.max_depth,
                max_entries: args.max_entries,
            },
        }
    }
}

fn resolve_target(path: Option<PathBuf>, base_dir: &Path) -> PathBuf {
    match path {
        Some(path) => path,
        None if base_dir.join(DEFAULT_TARGET_DIR).is_dir() => PathBuf::from(DEFAULT_TARGET_DIR),
        None => PathBuf::from("."),
    }
}

fn format_warning(file: &Path, line_number: u64, message: &str) -> String {
    format!("Warning: {}:{}: {}", file.display(), line_number, message)
}

/// Prints a single-line advisory to stderr.
pub(crate) fn warning(file: &Path, line_number: u64, message: &str) {
    eprintln!("{}", format_warning(file, line_number, message));
}

fn debug(config: &RunConfig, message: &str) {
    if config.debug {
        eprintln!("{} {}", "debug:".cyan(), message);
    }
}

fn analyze_file(path: &Path, config: &RunConfig) -> io::Result<Classification> {
    let lines = read_lines(path)?.collect::<io::Result<Vec<String>>>()?;
    let classification = if config.debug {
        classify_with(&lines, |line, category, state| {
            let decision = category
                .map(|c| c.to_string())
                .unwrap_or_else(|| String::from("UNCOUNTED"));
            debug(
                config,
                &format!("{}  {}  {} ({:?})", line.number, line.text, decision, state),
            );
        })
    } else {
        classify(&lines)
    };
    for w in &classification.warnings {
        warning(path, w.line_number, w.kind.message());
    }
    debug(
        config,
        &format!(
            "{}: {} lines seen, {:?}",
            path.display(),
            classification.lines_seen,
            classification.tally
        ),
    );
    Ok(classification)
}

#[derive(Debug)]
struct FileResult {
    path: PathBuf,
    tally: Tally,
}

/// Tallies of every eligible file under a directory, in traversal order.
#[derive(Debug, Default)]
struct DirectoryAnalysis {
    files: Vec<FileResult>,
    skipped: usize,
}

fn analyze_directory(root: &Path, config: &RunConfig) -> io::Result<DirectoryAnalysis> {
    let outcome = collect_files(root, &config.walk)?;
    let mut analysis = DirectoryAnalysis {
        skipped: outcome.error_count,
        ..DirectoryAnalysis::default()
    };

    for dir in &outcome.skipped_dirs {
        debug(config, &format!("Skipping directory {}", dir.display()));
    }

    for path in outcome.files {
        debug(config, &format!("Checking {}", path.display()));
        if let Eligibility::Rejected(reason) = check_file(&path, &config.selector) {
            debug(config, &reason);
            continue;
        }
        match analyze_file(&path, config) {
            Ok(classification) => analysis.files.push(FileResult {
                path,
                tally: classification.tally,
            }),
            Err(err) => {
                warning(&path, 0, &format!("could not read file: {}", err));
                analysis.skipped += 1;
            }
        }
    }

    Ok(analysis)
}

fn display_relative(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}

fn directory_label(target: &Path) -> String {
    let mut label = target.to_string_lossy().into_owned();
    if !label.ends_with('/') && !label.ends_with(std::path::MAIN_SEPARATOR) {
        label.push('/');
    }
    label
}

/// Runs the analysis described by `config` and returns the rendered report.
fn build_report(config: &RunConfig) -> io::Result<String> {
    let target = config.target.as_path();
    if !target.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("File does not exist: \"{}\"", target.display()),
        ));
    }

    if target.is_file() {
        debug(config, &format!("Checking {}", target.display()));
        if let Eligibility::Rejected(reason) = check_file(target, &config.selector) {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, reason));
        }
        let classification = analyze_file(target, config)?;
        let label = target.to_string_lossy();
        return Ok(render(
            &classification.tally,
            &ReportContext::SingleFile { target: &label },
        ));
    }

    let analysis = analyze_directory(target, config)?;
    let mut output = String::new();

    if config.individual {
        for file in &analysis.files {
            let name = display_relative(&file.path, target);
            output.push_str(&render(
                &file.tally,
                &ReportContext::SingleFile { target: &name },
            ));
        }
    }

    let listing: Vec<String> = if config.verbose {
        let width = listing_width();
        analysis
            .files
            .iter()
            .map(|file| truncate_start(&display_relative(&file.path, target), width))
            .collect()
    } else {
        Vec::new()
    };

    let total = merge_all(analysis.files.iter().map(|file| &file.tally));
    let label = directory_label(target);
    output.push_str(&render(
        &total,
        &ReportContext::Directory {
            target: &label,
            file_count: analysis.files.len(),
            listing: &listing,
        },
    ));

    if analysis.skipped > 0 {
        let _ = writeln!(
            output,
            "\n{}: {} files or directories could not be read",
            "Warning".red().bold(),
            analysis.skipped.to_string().bright_yellow()
        );
    }

    Ok(output)
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = RunConfig::from_args(args, Path::new("."));

    println!(
        "{} {}",
        env!("CARGO_PKG_NAME").bright_cyan().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_yellow()
    );

    match build_report(&config) {
        Ok(report) => {
            print!("{}", report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", Args::command().render_help());
            eprintln!("\n{} {}", "Error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}
