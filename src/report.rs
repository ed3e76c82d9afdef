//! Rank-ordered, percentage-annotated rendering of a [`Tally`].

use std::fmt::Write as FmtWrite;

use colored::*;
use terminal_size::{terminal_size, Width};

use crate::tally::{Category, Tally};

const DEFAULT_LISTING_WIDTH: usize = 80;

/// What a report describes.
#[derive(Debug, Clone, Copy)]
pub enum ReportContext<'a> {
    SingleFile {
        target: &'a str,
    },
    Directory {
        target: &'a str,
        file_count: usize,
        /// Analyzed files to list under the header; empty unless verbose.
        listing: &'a [String],
    },
}

fn safe_percentage(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        (numerator as f64 / denominator as f64) * 100.0
    }
}

/// Categories by count, largest first. Equal counts fall back to
/// [`Category::tie_rank`].
pub fn ranked(tally: &Tally) -> Vec<(Category, u64)> {
    let mut entries = tally.entries().to_vec();
    entries.sort_by(|(a, a_count), (b, b_count)| {
        b_count
            .cmp(a_count)
            .then_with(|| a.tie_rank().cmp(&b.tie_rank()))
    });
    entries
}

pub fn render(tally: &Tally, context: &ReportContext<'_>) -> String {
    let mut output = String::new();

    match context {
        ReportContext::SingleFile { target } => {
            let _ = writeln!(output, "\n{}\n", target.bold());
        }
        ReportContext::Directory {
            target,
            file_count,
            listing,
        } => {
            let _ = writeln!(output, "\n{} ({} files)\n", target.bold(), file_count);
            if !listing.is_empty() {
                for file in listing.iter() {
                    let _ = writeln!(output, "{}", file);
                }
                let _ = writeln!(output);
            }
        }
    }

    let total = tally.total();
    let rows = ranked(tally);
    let width = rows
        .first()
        .map(|(_, count)| count.to_string().len())
        .unwrap_or(1);

    for (category, count) in rows {
        let _ = writeln!(
            output,
            "{:>width$} {} ({:.2}%)",
            count,
            category.label(),
            safe_percentage(count, total),
            width = width
        );
    }

    let total_line = format!("{} total lines", total);
    let _ = writeln!(output, "{}", "-".repeat(total_line.len()));
    let _ = writeln!(output, "{}", total_line);
    output
}

/// Truncates the given string to at most `max_len` characters by keeping the
/// last characters. If truncation occurs the result is prefixed with "...".
pub fn truncate_start(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().skip(char_count - max_len).collect()
    } else {
        let skip_count = char_count - (max_len - 3);
        let truncated: String = s.chars().skip(skip_count).collect();
        format!("...{}", truncated)
    }
}

/// Width available for the verbose file listing.
pub fn listing_width() -> usize {
    match terminal_size() {
        Some((Width(w), _)) if w > 0 => w as usize,
        _ => DEFAULT_LISTING_WIDTH,
    }
}
