//! Decides which files are source files and supplies their lines.
//!
//! A file is eligible when its extension matches the configured source
//! suffix and its content type is one of a small set of text types. Content
//! types come from the system `file` utility when it is available, otherwise
//! from a built-in sniff of the first few kilobytes.

use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::Command;

use clap::ValueEnum;
use glob::Pattern;

/// Content types accepted as source text.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "text/x-c",
    "text/x-c++",
    "text/x-java",
    "text/x-java-source",
    "text/plain",
    "inode/x-empty",
];

const SNIFF_LEN: u64 = 8 * 1024;

/// Tool metadata directories, skipped at any depth.
const METADATA_DIRS: &[&str] = &[".git", ".gradle", ".idea", ".svn"];

/// Build output directories, skipped only directly under the scanned root so
/// that packages with the same name (`com/acme/build`) are still counted.
const OUTPUT_DIRS: &[&str] = &["build", "out", "target", "node_modules"];

/// How the content type of a file is determined.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Sniffer {
    /// Use the `file` utility, falling back to the built-in sniffer if it cannot be run.
    #[default]
    Auto,
    /// Always use the `file` utility.
    File,
    /// Always use the built-in sniffer.
    Builtin,
}

#[derive(Debug, Clone)]
pub struct SelectorConfig {
    /// Source suffix without the leading dot.
    pub extension: String,
    pub sniffer: Sniffer,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        SelectorConfig {
            extension: String::from("java"),
            sniffer: Sniffer::Auto,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Rejected(String),
}

/// Checks the extension first, then the content type.
pub fn check_file(path: &Path, config: &SelectorConfig) -> Eligibility {
    let extension = path.extension().and_then(|ext| ext.to_str());
    if extension != Some(config.extension.as_str()) {
        let found = extension.map(|ext| format!(".{ext}")).unwrap_or_default();
        return Eligibility::Rejected(format!(
            "File \"{}\" does not have the source code extension (.{}). File's extension was \"{}\"",
            path.display(),
            config.extension,
            found
        ));
    }

    match detect_content_type(path, config.sniffer) {
        Ok(content_type) if is_allowed_content_type(&content_type) => Eligibility::Eligible,
        Ok(content_type) => Eligibility::Rejected(format!(
            "File \"{}\"'s content type was not one of {} (was \"{}\")",
            path.display(),
            ALLOWED_CONTENT_TYPES.join(", "),
            content_type
        )),
        Err(err) => Eligibility::Rejected(format!(
            "Could not determine the content type of \"{}\": {}",
            path.display(),
            err
        )),
    }
}

pub fn is_allowed_content_type(content_type: &str) -> bool {
    ALLOWED_CONTENT_TYPES.contains(&content_type)
}

pub fn detect_content_type(path: &Path, sniffer: Sniffer) -> io::Result<String> {
    match sniffer {
        Sniffer::Builtin => sniff_content_type(path),
        Sniffer::File => query_file_utility(path),
        Sniffer::Auto => match query_file_utility(path) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => sniff_content_type(path),
            other => other,
        },
    }
}

fn file_utility_command(path: &Path) -> Command {
    let mut command = Command::new("file");
    command.arg("--brief").arg("--mime-type").arg("--").arg(path);
    command
}

/// Asks `file --brief --mime-type` for the content type. A missing utility
/// surfaces as `ErrorKind::NotFound`.
fn query_file_utility(path: &Path) -> io::Result<String> {
    let output = file_utility_command(path).output()?;
    if !output.status.success() {
        return Err(io::Error::other(format!(
            "`file` exited with {}",
            output.status
        )));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or_else(|| io::Error::other("`file` produced no output"))
}

fn sniff_content_type(path: &Path) -> io::Result<String> {
    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    fs::File::open(path)?.take(SNIFF_LEN).read_to_end(&mut head)?;
    Ok(sniff_bytes(&head).to_string())
}

fn sniff_bytes(head: &[u8]) -> &'static str {
    if head.is_empty() {
        "inode/x-empty"
    } else if head.starts_with(b"\xCA\xFE\xBA\xBE") {
        "application/x-java-applet"
    } else if head.starts_with(b"PK\x03\x04") {
        "application/zip"
    } else if head.starts_with(b"\x1F\x8B") {
        "application/gzip"
    } else if head.contains(&0) {
        "application/octet-stream"
    } else {
        "text/plain"
    }
}

/// Splits a byte stream into lines on `\n`, `\r\n` or a bare `\r`.
/// Invalid UTF-8 is decoded with replacement characters.
pub struct SourceLines<R> {
    reader: R,
    /// The previous line ended in `\r`; a `\n` that follows belongs to it.
    after_cr: bool,
}

impl<R: BufRead> SourceLines<R> {
    pub fn new(reader: R) -> Self {
        SourceLines {
            reader,
            after_cr: false,
        }
    }
}

impl<R: BufRead> Iterator for SourceLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = Vec::new();
        loop {
            let (consumed, terminator) = {
                let available = match self.reader.fill_buf() {
                    Ok(buf) => buf,
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    Err(err) => return Some(Err(err)),
                };
                if available.is_empty() {
                    self.after_cr = false;
                    if line.is_empty() {
                        return None;
                    }
                    break;
                }
                if std::mem::take(&mut self.after_cr) && available[0] == b'\n' {
                    (1, None)
                } else {
                    match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                        Some(end) => {
                            line.extend_from_slice(&available[..end]);
                            (end + 1, Some(available[end]))
                        }
                        None => {
                            line.extend_from_slice(available);
                            (available.len(), None)
                        }
                    }
                }
            };
            self.reader.consume(consumed);
            if let Some(byte) = terminator {
                self.after_cr = byte == b'\r';
                break;
            }
        }
        Some(Ok(String::from_utf8_lossy(&line).into_owned()))
    }
}

pub fn read_lines(path: &Path) -> io::Result<SourceLines<BufReader<fs::File>>> {
    let file = fs::File::open(path)?;
    Ok(SourceLines::new(BufReader::new(file)))
}

#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Extra directory names to skip.
    pub ignore: Vec<String>,
    pub filespec: Option<String>,
    pub non_recursive: bool,
    pub max_depth: usize,
    pub max_entries: usize,
}

impl Default for WalkConfig {
    fn default() -> Self {
        WalkConfig {
            ignore: Vec::new(),
            filespec: None,
            non_recursive: false,
            max_depth: 100,
            max_entries: 1_000_000,
        }
    }
}

/// Candidate files found under a root, in traversal order.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub files: Vec<PathBuf>,
    /// Directories left out because of the ignore lists.
    pub skipped_dirs: Vec<PathBuf>,
    /// Directories that could not be read or were cut off by the depth limit.
    pub error_count: usize,
}

/// Recursively lists regular files under `root`, sorted by name within each
/// directory. Eligibility is not checked here.
pub fn collect_files(root: &Path, config: &WalkConfig) -> io::Result<WalkOutcome> {
    let filespec = match config.filespec.as_deref() {
        Some(spec) => Some(Pattern::new(spec).map_err(|err| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid filespec pattern '{}': {}", spec, err),
            )
        })?),
        None => None,
    };

    let mut outcome = WalkOutcome::default();
    walk_directory(root, root, config, filespec.as_ref(), 0, &mut outcome)?;
    Ok(outcome)
}

/// `depth` is the depth of `path` itself; children of the root are at depth 1.
fn is_ignored_dir(path: &Path, depth: usize, extra: &[String]) -> bool {
    let dir_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    METADATA_DIRS.contains(&dir_name)
        || (depth == 1 && OUTPUT_DIRS.contains(&dir_name))
        || extra.iter().any(|d| path.ends_with(Path::new(d)))
}

fn walk_directory(
    path: &Path,
    root: &Path,
    config: &WalkConfig,
    filespec: Option<&Pattern>,
    current_depth: usize,
    outcome: &mut WalkOutcome,
) -> io::Result<()> {
    if current_depth > config.max_depth {
        crate::warning(
            path,
            0,
            &format!("maximum directory depth ({}) reached", config.max_depth),
        );
        outcome.error_count += 1;
        return Ok(());
    }

    let read_dir = match fs::read_dir(path) {
        Ok(iter) => iter,
        Err(err) => {
            crate::warning(path, 0, &format!("could not read directory: {}", err));
            outcome.error_count += 1;
            return Ok(());
        }
    };

    let mut entries = Vec::new();
    for entry_result in read_dir {
        match entry_result {
            Ok(entry) => entries.push(entry),
            Err(err) => {
                crate::warning(path, 0, &format!("could not read directory entry: {}", err));
                outcome.error_count += 1;
            }
        }
    }
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let entry_path = entry.path();
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(err) => {
                crate::warning(&entry_path, 0, &format!("could not read file type: {}", err));
                outcome.error_count += 1;
                continue;
            }
        };

        if file_type.is_dir() && !file_type.is_symlink() {
            if config.non_recursive {
                continue;
            }
            if is_ignored_dir(&entry_path, current_depth + 1, &config.ignore) {
                outcome.skipped_dirs.push(entry_path);
                continue;
            }
            walk_directory(
                &entry_path,
                root,
                config,
                filespec,
                current_depth + 1,
                outcome,
            )?;
        } else if file_type.is_file() && !file_type.is_symlink() {
            if !should_process_file(filespec, root, &entry_path) {
                continue;
            }
            if outcome.files.len() >= config.max_entries {
                return Err(io::Error::other("Too many entries in directory tree"));
            }
            outcome.files.push(entry_path);
        }
    }

    Ok(())
}

fn should_process_file(filespec: Option<&Pattern>, root_path: &Path, file_path: &Path) -> bool {
    filespec
        .map(|pattern| filespec_matches(pattern, root_path, file_path))
        .unwrap_or(true)
}

fn filespec_matches(pattern: &Pattern, root_path: &Path, file_path: &Path) -> bool {
    if file_path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| pattern.matches(name))
        .unwrap_or(false)
    {
        return true;
    }

    let relative = match file_path.strip_prefix(root_path) {
        Ok(rel) => rel,
        Err(_) => return false,
    };

    match relative.to_str() {
        Some(s) => pattern.matches(&s.replace('\\', "/")),
        None => false,
    }
}
