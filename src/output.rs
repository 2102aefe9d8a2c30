//! CLI output formatting.
//!
//! The first line of every result is the machine-friendly summary; indented
//! context lines follow.
//!
//! ```text
//! 3f1c…9a.webp gif
//!     Original: original/3f1c…9a.gif (sha256 5e8d…)
//!     Feed: feed/3f1c…9a.webp
//!     Thumb: thumb/3f1c…9a.webp
//!     Frames: 10
//! ```

use crate::imaging::Format;
use crate::store::AddOutcome;
use std::path::Path;

const INDENT: &str = "    ";

pub fn format_add_outcome(outcome: &AddOutcome) -> Vec<String> {
    let mut lines = vec![
        format!("{} {}", outcome.filename, outcome.format),
        format!(
            "{INDENT}Original: original/{} (sha256 {})",
            outcome.original, outcome.original_sha256
        ),
        format!("{INDENT}Feed: feed/{}", outcome.filename),
        format!("{INDENT}Thumb: thumb/{}", outcome.filename),
    ];
    if outcome.animated {
        lines.push(format!("{INDENT}Frames: {}", outcome.frames));
    }
    lines
}

pub fn print_add_outcome(outcome: &AddOutcome) {
    for line in format_add_outcome(outcome) {
        println!("{line}");
    }
}

pub fn format_check(path: &Path, format: Option<Format>) -> String {
    match format {
        Some(format) => format!("{} {}", path.display(), format),
        None => format!("{} unrecognized", path.display()),
    }
}
