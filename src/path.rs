//! Virtual path handling
//!
//! Callers address files with slash-delimited virtual paths. Drive has no
//! paths, only a folder graph, so every path is split into segments and
//! walked one folder at a time. Splitting is purely lexical: `.` and `..`
//! are ordinary names.

/// Path separator for virtual paths
pub const SEPARATOR: char = '/';

/// Split a virtual path into its segments.
///
/// One leading separator is stripped; empty segments left by repeated or
/// trailing separators are dropped. The empty path (and `/`) yields no
/// segments, which denotes the root.
pub fn split_path(path: &str) -> Vec<&str> {
    path.strip_prefix(SEPARATOR)
        .unwrap_or(path)
        .split(SEPARATOR)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Join segments back into a relative virtual path
pub fn join_segments(segments: &[&str]) -> String {
    segments.join("/")
}

/// Join a directory entry name onto the path it was listed from
pub fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else if base.ends_with(SEPARATOR) {
        format!("{}{}", base, name)
    } else {
        format!("{}{}{}", base, SEPARATOR, name)
    }
}

/// Replace the final segment of `path`, keeping everything before it verbatim
pub fn replace_leaf(path: &str, leaf: &str) -> String {
    match path.trim_end_matches(SEPARATOR).rsplit_once(SEPARATOR) {
        Some((head, _)) => format!("{}{}{}", head, SEPARATOR, leaf),
        None => leaf.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_nested() {
        assert_eq!(split_path("a/b/c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_leading_slash_is_ignored() {
        for p in ["a", "a/b", "reports/2024/q1.csv", "x/./y", "../up"] {
            let rooted = format!("/{}", p);
            assert_eq!(split_path(p), split_path(&rooted), "path {:?}", p);
        }
    }

    #[test]
    fn test_split_root_is_empty() {
        assert!(split_path("").is_empty());
        assert!(split_path("/").is_empty());
    }

    #[test]
    fn test_split_drops_empty_segments() {
        assert_eq!(split_path("a//b"), vec!["a", "b"]);
        assert_eq!(split_path("a/b/"), vec!["a", "b"]);
        assert_eq!(split_path("//a"), vec!["a"]);
    }

    #[test]
    fn test_split_is_lexical() {
        assert_eq!(split_path("a/../b"), vec!["a", "..", "b"]);
    }

    #[test]
    fn test_join_segments() {
        assert_eq!(join_segments(&["a", "b"]), "a/b");
        assert_eq!(join_segments(&[]), "");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/", "file1"), "/file1");
        assert_eq!(join_path("/test4", "logo.png"), "/test4/logo.png");
        assert_eq!(join_path("/test4/", "logo.png"), "/test4/logo.png");
        assert_eq!(join_path("", "logo.png"), "logo.png");
    }

    #[test]
    fn test_replace_leaf() {
        assert_eq!(replace_leaf("/reports/q1.csv", "q1 (1).csv"), "/reports/q1 (1).csv");
        assert_eq!(replace_leaf("q1.csv", "other.csv"), "other.csv");
        assert_eq!(replace_leaf("media/a/b.txt", "b.txt"), "media/a/b.txt");
    }
}
