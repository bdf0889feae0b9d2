//! Line-oriented substring checks over captured output.

use crate::capture::split_lines;
use crate::error::PatternMismatch;

/// Which required and forbidden patterns were seen in some output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternReport {
    must_exist: Vec<(String, bool)>,
    must_not_exist: Vec<(String, bool)>,
}

impl PatternReport {
    /// Required patterns that no line contained, in the order given.
    pub fn missing(&self) -> Vec<&str> {
        self.must_exist.iter().filter(|(_, found)| !found).map(|(p, _)| p.as_str()).collect()
    }

    /// Forbidden patterns that some line contained, in the order given.
    pub fn forbidden_found(&self) -> Vec<&str> {
        self.must_not_exist.iter().filter(|(_, found)| *found).map(|(p, _)| p.as_str()).collect()
    }

    /// Whether every required pattern was found and no forbidden one was.
    pub fn is_satisfied(&self) -> bool {
        self.missing().is_empty() && self.forbidden_found().is_empty()
    }

    /// Turn the report into a result.
    ///
    /// # Errors
    ///
    /// Returns [`PatternMismatch`] listing every violation.
    pub fn check(&self) -> Result<(), PatternMismatch> {
        if self.is_satisfied() {
            return Ok(());
        }
        Err(PatternMismatch {
            missing: self.missing().into_iter().map(str::to_string).collect(),
            forbidden: self.forbidden_found().into_iter().map(str::to_string).collect(),
        })
    }
}

/// Scan `output` line by line for the given patterns.
///
/// A pattern counts as found once any line contains it as a substring. A
/// single line can mark several patterns, and required and forbidden patterns
/// are tracked independently.
pub fn find_patterns<S: AsRef<str>>(
    output: &[u8],
    must_exist: &[S],
    must_not_exist: &[S],
) -> PatternReport {
    let mut must_exist: Vec<(String, bool)> =
        must_exist.iter().map(|p| (p.as_ref().to_string(), false)).collect();
    let mut must_not_exist: Vec<(String, bool)> =
        must_not_exist.iter().map(|p| (p.as_ref().to_string(), false)).collect();

    for line in split_lines(output) {
        for (pattern, found) in must_exist.iter_mut().chain(must_not_exist.iter_mut()) {
            if !*found && line.contains(pattern.as_str()) {
                *found = true;
            }
        }
    }

    PatternReport { must_exist, must_not_exist }
}

/// Assert that every `must_exist` pattern and no `must_not_exist` pattern
/// appears in `output`.
///
/// # Panics
///
/// Panics with the offending patterns and the scanned output when the
/// expectation does not hold.
#[track_caller]
pub fn assert_patterns<S: AsRef<str>>(output: &[u8], must_exist: &[S], must_not_exist: &[S]) {
    if let Err(mismatch) = find_patterns(output, must_exist, must_not_exist).check() {
        panic!("{mismatch}\n--- output ---\n{}", String::from_utf8_lossy(output));
    }
}
