//! Input parsing and batch planning.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::Path;

use super::{Batch, TrackNumber, MAX_BATCH_SIZE};

/// Parses one track number per line. Blank lines are skipped, non-ASCII
/// lines are skipped with a warning, and duplicates are dropped, keeping
/// first-seen order.
pub fn parse_track_numbers(text: &str) -> Vec<TrackNumber> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        match TrackNumber::new(line) {
            Some(n) => {
                if seen.insert(n.clone()) {
                    out.push(n);
                }
            }
            None if !line.trim().is_empty() => {
                tracing::warn!(line = lineno + 1, "skipping non-ASCII track number");
            }
            None => {}
        }
    }
    out
}

/// Reads and parses a UTF-8 input file of track numbers.
pub fn read_track_file(path: &Path) -> Result<Vec<TrackNumber>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read track file: {}", path.display()))?;
    Ok(parse_track_numbers(&text))
}

/// Splits `numbers` into batches of at most `batch_size` (clamped to
/// `1..=MAX_BATCH_SIZE`). The last batch may be shorter.
/// Returns an empty vec if `numbers` is empty.
pub fn plan_batches(numbers: &[TrackNumber], batch_size: usize) -> Vec<Batch> {
    let size = batch_size.clamp(1, MAX_BATCH_SIZE);
    numbers
        .chunks(size)
        .map(|chunk| Batch::new(chunk.iter().cloned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(n: usize) -> Vec<TrackNumber> {
        (0..n)
            .map(|i| TrackNumber::new(&format!("TN{i:04}")).unwrap())
            .collect()
    }

    #[test]
    fn parse_skips_blank_and_duplicate_lines() {
        let parsed = parse_track_numbers("111\n\n  222  \r\n111\n333\n");
        let as_str: Vec<&str> = parsed.iter().map(|n| n.as_str()).collect();
        assert_eq!(as_str, vec!["111", "222", "333"]);
    }

    #[test]
    fn parse_skips_non_ascii_lines() {
        let parsed = parse_track_numbers("111\nЖ222\n333\n");
        let as_str: Vec<&str> = parsed.iter().map(|n| n.as_str()).collect();
        assert_eq!(as_str, vec!["111", "333"]);
    }

    #[test]
    fn plan_batches_even() {
        let batches = plan_batches(&numbers(80), 40);
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.len() == 40));
    }

    #[test]
    fn plan_batches_remainder() {
        let batches = plan_batches(&numbers(85), 40);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[2].len(), 5);
    }

    #[test]
    fn plan_batches_clamps_to_cap() {
        let batches = plan_batches(&numbers(100), 500);
        assert!(batches.iter().all(|b| b.len() <= MAX_BATCH_SIZE));
        let batches = plan_batches(&numbers(3), 0);
        assert_eq!(batches.len(), 3);
    }

    #[test]
    fn plan_batches_empty() {
        assert!(plan_batches(&[], 40).is_empty());
    }

    #[test]
    fn read_track_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracks.txt");
        std::fs::write(&path, "A1\nA2\nA1\n").unwrap();
        let parsed = read_track_file(&path).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(read_track_file(&dir.path().join("missing.txt")).is_err());
    }
}
