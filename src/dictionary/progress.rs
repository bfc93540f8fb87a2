use std::fmt;
use std::path::Path;

use super::{read_text, SEP, TERMINATOR};
use crate::error::{Result, TransDictError};

/// Percentage (0..=100) of entries whose translated field is filled.
///
/// Blank segments are ignored; a dictionary without entries counts as done.
/// The ratio is rounded to nearest and then ceiled, which keeps the displayed
/// numbers identical to earlier releases.
pub fn compute_progress(text: &str) -> u8 {
    let entries: Vec<&str> = text
        .split(TERMINATOR)
        .filter(|s| !s.trim().is_empty())
        .collect();

    if entries.is_empty() {
        return 100;
    }

    let filled = entries
        .iter()
        .filter(|entry| {
            entry
                .split(SEP)
                .nth(2)
                .is_some_and(|translated| !translated.trim().is_empty())
        })
        .count();

    let ratio = filled as f64 / entries.len() as f64 * 100.0;
    ratio.round().ceil().clamp(0.0, 100.0) as u8
}

/// Progress of a dictionary on disk; a missing file has made no progress.
pub fn progress_of_file<P: AsRef<Path>>(path: P) -> Result<u8> {
    match read_text(path) {
        Ok(text) => Ok(compute_progress(&text)),
        Err(TransDictError::NotFound(_)) => Ok(0),
        Err(e) => Err(e),
    }
}

/// Human-readable progress as shown in status listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressLabel(pub u8);

impl fmt::Display for ProgressLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            100 => write!(f, "Translated"),
            0 => write!(f, "Not translated"),
            p => write!(f, "{}%", p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(filled: usize, total: usize) -> String {
        (0..total)
            .map(|i| {
                let translated = if i < filled { "done" } else { "" };
                format!("k{}{}v{}{}{}{}", i, SEP, i, SEP, translated, TERMINATOR)
            })
            .collect()
    }

    #[test]
    fn test_empty_dictionary_is_complete() {
        assert_eq!(compute_progress(""), 100);
        assert_eq!(compute_progress("  \n|_END_|\n"), 100);
    }

    #[test]
    fn test_progress_edges() {
        assert_eq!(compute_progress(&dict(0, 5)), 0);
        assert_eq!(compute_progress(&dict(5, 5)), 100);
    }

    #[test]
    fn test_progress_rounding() {
        assert_eq!(compute_progress(&dict(1, 3)), 33);
        assert_eq!(compute_progress(&dict(2, 3)), 67);
        assert_eq!(compute_progress(&dict(1, 8)), 13);
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut last = 0;
        for filled in 0..=17 {
            let progress = compute_progress(&dict(filled, 17));
            assert!(progress >= last);
            last = progress;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn test_blank_translation_does_not_count() {
        let text = format!("a{}b{}   {}", SEP, SEP, TERMINATOR);
        assert_eq!(compute_progress(&text), 0);
    }

    #[test]
    fn test_missing_file_reports_zero() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(progress_of_file(dir.path().join("none.dict")).unwrap(), 0);
    }

    #[test]
    fn test_label() {
        assert_eq!(ProgressLabel(100).to_string(), "Translated");
        assert_eq!(ProgressLabel(42).to_string(), "42%");
        assert_eq!(ProgressLabel(0).to_string(), "Not translated");
    }
}
