//! Line parser: turns raw pasted text into contact seeds and per-line errors.
//!
//! Each non-blank line yields exactly one seed or one error. Blank lines are
//! dropped silently and do not count towards line numbers.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::model::{ContactSeed, LineError, LineErrorReason};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("email pattern compiles")
});

/// Result of parsing a block of raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseOutput {
    /// Valid contacts, in input order.
    pub seeds: Vec<ContactSeed>,
    /// Rejected lines, in input order.
    pub errors: Vec<LineError>,
}

impl ParseOutput {
    /// Number of non-blank lines that were examined.
    pub fn lines_examined(&self) -> usize {
        self.seeds.len() + self.errors.len()
    }
}

/// Parse raw multi-line text into contact seeds.
pub fn parse(raw: &str) -> ParseOutput {
    let mut output = ParseOutput::default();

    let lines = raw.lines().filter(|line| !line.trim().is_empty());
    for (index, line) in lines.enumerate() {
        match parse_line(line) {
            Ok(seed) => output.seeds.push(seed),
            Err(reason) => {
                debug!(line_number = index + 1, %reason, "Rejected input line");
                output.errors.push(LineError {
                    line_number: index + 1,
                    raw_line: line.to_string(),
                    reason,
                });
            }
        }
    }

    output
}

fn parse_line(line: &str) -> Result<ContactSeed, LineErrorReason> {
    let found = EMAIL_PATTERN.find(line).ok_or(LineErrorReason::NoEmail)?;

    let mut before = &line[..found.start()];
    let mut after = &line[found.end()..];

    // "Jane Doe <jane@acme.com>" should not leave "<>" behind in the name.
    if let (Some(b), Some(a)) = (before.strip_suffix('<'), after.strip_prefix('>')) {
        before = b;
        after = a;
    }

    let joined = format!("{before} {after}");
    let collapsed = joined.split_whitespace().collect::<Vec<_>>().join(" ");
    let name = collapsed.trim_matches(|c: char| c == ',' || c.is_whitespace());

    if name.is_empty() {
        return Err(LineErrorReason::NoName);
    }

    Ok(ContactSeed::new(name, found.as_str()))
}
