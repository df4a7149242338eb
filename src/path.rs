/*!
 * Path Utilities
 * Segment decomposition and pure path-string helpers
 */

use serde::{Deserialize, Serialize};

/// Check if a character separates path components
#[inline]
#[must_use]
pub const fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Decomposition of one textual path: how many levels above the base it
/// starts, and the descending name segments from there
///
/// The decomposition is relative to whatever base the caller resolves it
/// against; leading separators carry no information through a parse.
/// Plain value type with no interior mutability; clone it to share across
/// threads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSegments {
    /// Count of leading "go up a directory" steps
    pub parent_level: u32,
    /// Name segments in descending order, free of `.`/`..` and separators
    pub segments: Vec<String>,
}

impl PathSegments {
    /// Decompose a path
    ///
    /// Splits on `/` and `\`, discards empty and `.` segments. A `..` pops
    /// the most recently parsed name; with no name left to cancel it
    /// increments `parent_level` instead. Never fails; malformed input just
    /// yields a shorter segment list.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let mut parent_level = 0u32;
        let mut segments: Vec<String> = Vec::new();

        for raw in path.split(is_separator) {
            match raw {
                "" | "." => {}
                ".." => {
                    if segments.is_empty() {
                        parent_level += 1;
                    } else {
                        segments.pop();
                    }
                }
                name => segments.push(name.to_string()),
            }
        }

        Self {
            parent_level,
            segments,
        }
    }

    /// Reconstruct the canonical path string
    ///
    /// `parent_level` `..` tokens followed by the segments, joined with `/`:
    /// no redundant separators, no `.` segments. Parsing the result yields
    /// this same decomposition back.
    #[must_use]
    pub fn build(&self) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(self.parent_level as usize + self.segments.len());
        for _ in 0..self.parent_level {
            parts.push("..");
        }
        for segment in &self.segments {
            parts.push(segment);
        }
        parts.join("/")
    }

    /// Check if the decomposition is empty (the path named its own base)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parent_level == 0 && self.segments.is_empty()
    }
}

/// Get the parent directory portion of a path
///
/// Trailing separators are ignored; a path with no separator has an empty
/// parent. The root `/` is its own parent boundary and yields `/`.
#[must_use]
pub fn parent_directory_path(path: &str) -> String {
    let trimmed = path.trim_end_matches(is_separator);
    match trimmed.rfind(is_separator) {
        Some(0) => "/".to_string(),
        Some(pos) => trimmed[..pos].to_string(),
        None => String::new(),
    }
}

/// Get the last component of a path (everything after the final separator)
#[must_use]
pub fn file_name(path: &str) -> &str {
    match path.rfind(is_separator) {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// Get the extension of the last path component, without the dot
///
/// A leading dot does not start an extension, so dot-names like `.profile`
/// have none.
#[must_use]
pub fn file_extension(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(pos) if pos > 0 => &name[pos + 1..],
        _ => "",
    }
}

/// Get the last path component with its extension removed
#[must_use]
pub fn file_name_without_extension(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(pos) if pos > 0 => &name[..pos],
        _ => name,
    }
}

/// Strip trailing separators from a directory path
///
/// An absolute root collapses to a single `/` instead of an empty string.
#[must_use]
pub fn normalize_directory_path(path: &str) -> String {
    let trimmed = path.trim_end_matches(is_separator);
    if trimmed.is_empty() && !path.is_empty() {
        return "/".to_string();
    }
    trimmed.to_string()
}

/// Characters never allowed in a file name or path, besides the separators
const fn is_unsafe_char(c: char) -> bool {
    let code = c as u32;
    code <= 0x1F
        || (code >= 0x7F && code <= 0x9F)
        || matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|')
}

/// Replace every character unusable in a single file name with `_`
///
/// Rejects the control ranges U+0000..U+001F and U+007F..U+009F plus
/// `: * ? " < > | \ /`.
#[must_use]
pub fn make_safe_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if is_unsafe_char(c) || is_separator(c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Replace every character unusable in a full path with `_`
///
/// Same set as [`make_safe_file_name`] except the separators, which a path
/// legitimately contains.
#[must_use]
pub fn make_safe_file_path(path: &str) -> String {
    path.chars()
        .map(|c| if is_unsafe_char(c) { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_parse_leading_parents() {
        let parsed = PathSegments::parse("../../a/b");
        assert_eq!(parsed.parent_level, 2);
        assert_eq!(parsed.segments, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_internal_cancellation() {
        let parsed = PathSegments::parse("a/../b");
        assert_eq!(parsed.parent_level, 0);
        assert_eq!(parsed.segments, vec!["b"]);

        // Cancellation can drain the list, then parents accumulate again
        let parsed = PathSegments::parse("a/../../b");
        assert_eq!(parsed.parent_level, 1);
        assert_eq!(parsed.segments, vec!["b"]);
    }

    #[test]
    fn test_parse_noise() {
        let parsed = PathSegments::parse("a//.///b/");
        assert_eq!(parsed.parent_level, 0);
        assert_eq!(parsed.segments, vec!["a", "b"]);

        let parsed = PathSegments::parse("a\\b/c");
        assert_eq!(parsed.segments, vec!["a", "b", "c"]);

        assert!(PathSegments::parse("").is_empty());
        assert!(PathSegments::parse("./.").is_empty());
    }

    #[test]
    fn test_build() {
        let parsed = PathSegments::parse("../../a/b");
        assert_eq!(parsed.build(), "../../a/b");

        let parsed = PathSegments::parse("..");
        assert_eq!(parsed.build(), "..");

        let parsed = PathSegments::parse("a//b/./c");
        assert_eq!(parsed.build(), "a/b/c");

        assert_eq!(PathSegments::default().build(), "");
    }

    #[test]
    fn test_parent_directory_path() {
        assert_eq!(parent_directory_path("a/b/c"), "a/b");
        assert_eq!(parent_directory_path("a/b/"), "a");
        assert_eq!(parent_directory_path("a"), "");
        assert_eq!(parent_directory_path("/a"), "/");
        assert_eq!(parent_directory_path("/a/b"), "/a");
    }

    #[test]
    fn test_file_name_parts() {
        assert_eq!(file_name("a/b/c.txt"), "c.txt");
        assert_eq!(file_name("c.txt"), "c.txt");
        assert_eq!(file_name("a/b/"), "");

        assert_eq!(file_extension("a/b/c.tar.gz"), "gz");
        assert_eq!(file_extension("a/b/c"), "");
        assert_eq!(file_extension("a/.profile"), "");

        assert_eq!(file_name_without_extension("a/b/c.tar.gz"), "c.tar");
        assert_eq!(file_name_without_extension("a/.profile"), ".profile");
        assert_eq!(file_name_without_extension("c"), "c");
    }

    #[test]
    fn test_normalize_directory_path() {
        assert_eq!(normalize_directory_path("a/b/"), "a/b");
        assert_eq!(normalize_directory_path("a/b///"), "a/b");
        assert_eq!(normalize_directory_path("a/b"), "a/b");
        assert_eq!(normalize_directory_path("/"), "/");
        assert_eq!(normalize_directory_path(""), "");
    }

    #[test]
    fn test_safe_file_name() {
        assert_eq!(make_safe_file_name("a:b*c"), "a_b_c");
        assert_eq!(make_safe_file_name("a/b\\c"), "a_b_c");
        assert_eq!(make_safe_file_name("plain-name_2.txt"), "plain-name_2.txt");
        assert_eq!(make_safe_file_name("tab\there"), "tab_here");
        assert_eq!(make_safe_file_name("del\u{7f}\u{9f}"), "del__");
    }

    #[test]
    fn test_safe_file_path() {
        // Separators survive in a path, the rest of the set does not
        assert_eq!(make_safe_file_path("a/b:c|d"), "a/b_c_d");
        assert_eq!(make_safe_file_path("a\\b?c"), "a\\b_c");
    }

    proptest! {
        #[test]
        fn prop_build_parse_round_trip(
            parent_level in 0u32..4,
            segments in prop::collection::vec("[a-z][a-z0-9_.-]{0,7}", 0..5),
        ) {
            // Reject generated segments that are themselves special tokens
            prop_assume!(segments.iter().all(|s| s != "." && s != ".."));

            let state = PathSegments { parent_level, segments };
            let rebuilt = PathSegments::parse(&state.build());
            prop_assert_eq!(rebuilt, state);
        }

        #[test]
        fn prop_parse_is_idempotent(path in "[a-z./\\\\]{0,24}") {
            let first = PathSegments::parse(&path);
            let second = PathSegments::parse(&first.build());
            prop_assert_eq!(second, first);
        }
    }
}
