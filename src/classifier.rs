//! Line classification state machine.
//!
//! Each line of a file is assigned to exactly one [`Category`] using line-level
//! substring heuristics. Block (`/* ... */`) and documentation (`/** ... */`)
//! spans that open on one line and close on a later one are tracked with a
//! [`ScanState`]. The classifier performs no I/O.

use crate::tally::{Category, Tally};

const LINE_COMMENT: &str = "//";
const BLOCK_OPEN: &str = "/*";
const DOC_OPEN: &str = "/**";
const BLOCK_CLOSE: &str = "*/";

/// One source line: its 1-based position and its trimmed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: u64,
    pub text: String,
}

impl Line {
    pub fn new(number: u64, raw: &str) -> Self {
        Line {
            number,
            text: raw.trim().to_string(),
        }
    }
}

/// Which multi-line span, if any, is open after the previous line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    #[default]
    Normal,
    InBlockComment,
    InDocBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    UnmatchedClosingMarker,
    LineCountMismatch,
}

impl WarningKind {
    pub fn message(self) -> &'static str {
        match self {
            WarningKind::UnmatchedClosingMarker => "unmatched closing marker",
            WarningKind::LineCountMismatch => "line count mismatch",
        }
    }
}

/// An advisory anomaly found while classifying a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierWarning {
    pub line_number: u64,
    pub kind: WarningKind,
}

/// Result of classifying one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub tally: Tally,
    pub lines_seen: u64,
    pub warnings: Vec<ClassifierWarning>,
}

/// Streaming classifier for a single file. Feed lines in order, then call
/// [`Classifier::finish`].
#[derive(Debug, Default)]
pub struct Classifier {
    state: ScanState,
    tally: Tally,
    lines_seen: u64,
    warnings: Vec<ClassifierWarning>,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Classifies the next line. Returns `None` when the line could not be
    /// attributed to any category (an unmatched `*/`).
    pub fn feed(&mut self, line: &Line) -> Option<Category> {
        self.lines_seen += 1;
        let category = self.step(line);
        match category {
            Some(category) => self.tally.record(category),
            None => self.warnings.push(ClassifierWarning {
                line_number: line.number,
                kind: WarningKind::UnmatchedClosingMarker,
            }),
        }
        category
    }

    fn step(&mut self, line: &Line) -> Option<Category> {
        let text = line.text.as_str();
        if text.trim().is_empty() {
            return Some(Category::Whitespace);
        }

        if text.contains(BLOCK_CLOSE) {
            return match self.state {
                ScanState::InBlockComment => {
                    self.state = ScanState::Normal;
                    Some(Category::Comment)
                }
                ScanState::InDocBlock => {
                    self.state = ScanState::Normal;
                    Some(Category::Documentation)
                }
                ScanState::Normal if opens_before_close(text) => {
                    if text.contains(DOC_OPEN) {
                        Some(Category::Documentation)
                    } else {
                        Some(Category::Comment)
                    }
                }
                ScanState::Normal => None,
            };
        }

        if text.starts_with(LINE_COMMENT) || self.state == ScanState::InBlockComment {
            return Some(Category::Comment);
        }

        // A plain opener inside an open doc block stays documentation.
        if self.state == ScanState::Normal && text.contains(BLOCK_OPEN) && !text.contains(DOC_OPEN)
        {
            self.state = ScanState::InBlockComment;
            return Some(Category::Comment);
        }

        if text.contains(DOC_OPEN) || self.state == ScanState::InDocBlock {
            self.state = ScanState::InDocBlock;
            return Some(Category::Documentation);
        }

        Some(Category::Code)
    }

    pub fn finish(mut self) -> Classification {
        if self.tally.total() != self.lines_seen {
            self.warnings.push(ClassifierWarning {
                line_number: self.lines_seen,
                kind: WarningKind::LineCountMismatch,
            });
        }
        Classification {
            tally: self.tally,
            lines_seen: self.lines_seen,
            warnings: self.warnings,
        }
    }
}

/// True when an opener starts before the first closer, so the whole span
/// sits on this line.
fn opens_before_close(text: &str) -> bool {
    match (text.find(BLOCK_OPEN), text.find(BLOCK_CLOSE)) {
        (Some(open), Some(_)) => text[open + BLOCK_OPEN.len()..].contains(BLOCK_CLOSE),
        _ => false,
    }
}

/// Classifies an ordered sequence of raw lines, numbering them from 1.
pub fn classify<I, S>(lines: I) -> Classification
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    classify_with(lines, |_, _, _| {})
}

/// Like [`classify`], but reports every decision and the state it left behind.
pub fn classify_with<I, S, F>(lines: I, mut observer: F) -> Classification
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: FnMut(&Line, Option<Category>, ScanState),
{
    let mut classifier = Classifier::new();
    for (idx, raw) in lines.into_iter().enumerate() {
        let line = Line::new(idx as u64 + 1, raw.as_ref());
        let category = classifier.feed(&line);
        observer(&line, category, classifier.state());
    }
    classifier.finish()
}
