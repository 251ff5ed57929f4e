//! Text layout of result records.

use crate::tracking::{PartialTrack, ResolvedTrack};

/// Placeholder for a timestamp the endpoint did not report.
pub const MISSING_TIMESTAMP: &str = "-";

/// `number\nt0\nt1\n\n` per track, with the note as an extra line when set.
pub fn format_resolved(tracks: &[ResolvedTrack]) -> String {
    let mut out = String::new();
    for t in tracks {
        out.push_str(&t.number);
        out.push('\n');
        out.push_str(t.info_received.as_deref().unwrap_or(MISSING_TIMESTAMP));
        out.push('\n');
        out.push_str(t.picked_up.as_deref().unwrap_or(MISSING_TIMESTAMP));
        out.push('\n');
        if let Some(note) = &t.note {
            out.push_str(note);
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// `number\nt0\n\n` per track.
pub fn format_partial(tracks: &[PartialTrack]) -> String {
    let mut out = String::new();
    for t in tracks {
        out.push_str(&t.number);
        out.push('\n');
        out.push_str(&t.info_received);
        out.push_str("\n\n");
    }
    out
}

/// One number per line.
pub fn format_numbers<'a, I>(numbers: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = String::new();
    for n in numbers {
        out.push_str(n);
        out.push('\n');
    }
    out
}
