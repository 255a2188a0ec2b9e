//! Name-based exclusion of directory entries.

use regex::Regex;

use super::error::CoreError;

/// Compiled exclusion patterns.
///
/// Patterns come from a comma-separated, user-editable string. Each trimmed
/// pattern is a regular expression searched (not full-matched) against an
/// entry's base name.
#[derive(Debug, Clone, Default)]
pub struct ExclusionMatcher {
    patterns: Vec<Regex>,
}

impl ExclusionMatcher {
    /// Parses and compiles a comma-separated pattern list.
    ///
    /// Blank input yields a matcher that excludes nothing. Empty items
    /// (e.g. from a trailing comma) are skipped.
    pub fn parse(pattern_text: &str) -> Result<Self, CoreError> {
        let patterns = split_patterns(pattern_text)
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| CoreError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn is_excluded(&self, entry_name: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(entry_name))
    }
}

fn split_patterns(pattern_text: &str) -> impl Iterator<Item = &str> {
    pattern_text
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
}
