use std::path::{Path, PathBuf};

/// Sanitizes a configuration-supplied relative path component.
///
/// Paths containing a `..` segment are rejected and rewritten to `"./"`,
/// per the configuration contract: recipe and error-report paths come from
/// a YAML file an operator controls, but must never let a typo or a
/// malicious config escape `base_path`.
#[must_use]
pub fn sanitize_relative(path: &str) -> PathBuf {
    if Path::new(path)
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir))
    {
        PathBuf::from("./")
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_clean_relative_path() {
        assert_eq!(sanitize_relative("cisco/routers"), PathBuf::from("cisco/routers"));
    }

    #[test]
    fn rejects_parent_dir_traversal() {
        assert_eq!(sanitize_relative("../etc/passwd"), PathBuf::from("./"));
    }

    #[test]
    fn rejects_embedded_parent_dir() {
        assert_eq!(sanitize_relative("cisco/../../etc"), PathBuf::from("./"));
    }

    #[test]
    fn empty_path_passes_through() {
        assert_eq!(sanitize_relative(""), PathBuf::from(""));
    }
}
