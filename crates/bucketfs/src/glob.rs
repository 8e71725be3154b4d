// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Name patterns used to hide entries from directory listings
//!
//! Patterns match a single name (never a path) and support `*` wildcards
//! only, e.g. `*.pyc`, `__pycache__`, `*~`. Other glob syntax (`?`, `[...]`)
//! is rejected rather than taken literally.

/// A compiled single-component pattern
#[derive(Debug, Clone, PartialEq)]
pub enum NamePattern {
    /// Literal segments that must appear in order, separated by wildcards
    Wildcard(Vec<String>),
    /// Exact name
    Normal(String),
}

impl NamePattern {
    /// Compile a pattern; `None` if it contains a path separator or
    /// unsupported glob syntax
    #[must_use]
    pub fn parse(pattern: &str) -> Option<Self> {
        if pattern.is_empty() || pattern.contains(['/', '?', '[', ']']) {
            return None;
        }
        if pattern.contains('*') {
            Some(NamePattern::Wildcard(
                pattern.split('*').map(str::to_string).collect(),
            ))
        } else {
            Some(NamePattern::Normal(pattern.to_string()))
        }
    }

    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Normal(literal) => name == literal,
            NamePattern::Wildcard(segments) => {
                let (first, rest) = match segments.split_first() {
                    Some(split) => split,
                    None => return true,
                };
                if !name.starts_with(first.as_str()) {
                    return false;
                }
                let mut pos = first.len();
                let last = rest.len().saturating_sub(1);
                for (i, segment) in rest.iter().enumerate() {
                    if segment.is_empty() {
                        continue;
                    }
                    if i == last {
                        // The final literal anchors at the end of the name
                        return name.len() >= pos + segment.len()
                            && name.ends_with(segment.as_str());
                    }
                    match name[pos..].find(segment.as_str()) {
                        Some(found) => pos += found + segment.len(),
                        None => return false,
                    }
                }
                true
            }
        }
    }
}

/// A set of patterns; a name is hidden when any pattern matches
#[derive(Debug, Clone, Default)]
pub struct HideSet {
    patterns: Vec<NamePattern>,
}

impl HideSet {
    /// Compile every pattern; returns the first invalid one on failure
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self, String> {
        let patterns = patterns
            .iter()
            .map(|p| NamePattern::parse(p.as_ref()).ok_or_else(|| p.as_ref().to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    #[must_use]
    pub fn is_hidden(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, name: &str) -> bool {
        NamePattern::parse(pattern).map(|p| p.matches(name)).unwrap_or(false)
    }

    #[test]
    fn test_literal() {
        assert!(matches("__pycache__", "__pycache__"));
        assert!(!matches("__pycache__", "__pycache__x"));
        assert!(matches(".DS_Store", ".DS_Store"));
    }

    #[test]
    fn test_suffix_and_prefix_wildcards() {
        assert!(matches("*.pyc", "module.pyc"));
        assert!(!matches("*.pyc", "module.pyc.txt"));
        assert!(matches("*~", "notes.txt~"));
        assert!(!matches("*~", "notes.txt"));
        assert!(matches("tmp*", "tmp123"));
        assert!(matches("*", "anything"));
    }

    #[test]
    fn test_middle_wildcards() {
        assert!(matches("a*b*c", "axxbyyc"));
        assert!(!matches("a*b*c", "axxbyy"));
        assert!(matches("*.tar.*", "x.tar.gz"));
    }

    #[test]
    fn test_separator_rejected() {
        assert!(NamePattern::parse("a/*.txt").is_none());
        assert!(HideSet::compile(&["ok", "bad/x"]).is_err());
    }

    #[test]
    fn test_unsupported_syntax_rejected() {
        assert!(NamePattern::parse("*.py[co]").is_none());
        assert!(NamePattern::parse("?.tmp").is_none());
        assert_eq!(
            HideSet::compile(&["*.pyc", "*.py[co]"]).err(),
            Some("*.py[co]".to_string())
        );
    }

    #[test]
    fn test_hide_set() {
        let set = HideSet::compile(&["*.pyc", "__pycache__"]).expect("valid patterns");
        assert!(set.is_hidden("a.pyc"));
        assert!(set.is_hidden("__pycache__"));
        assert!(!set.is_hidden("a.py"));
    }
}
