//! Path helpers for config and data directory options

use std::path::PathBuf;

/// Expand a user-supplied path to an absolute one.
///
/// `~` and `~/...` resolve against the home directory, relative paths
/// against the current directory. Surrounding whitespace is ignored and an
/// empty string means the current directory.
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    }

    let expanded = match path.strip_prefix('~') {
        Some("") => dirs::home_dir().unwrap_or_else(|| PathBuf::from(path)),
        Some(rest) if rest.starts_with('/') || rest.starts_with('\\') => dirs::home_dir()
            .map(|home| home.join(&rest[1..]))
            .unwrap_or_else(|| PathBuf::from(path)),
        _ => PathBuf::from(path),
    };

    if expanded.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    } else {
        expanded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_unchanged() {
        assert_eq!(expand_path("/srv/tablekit"), PathBuf::from("/srv/tablekit"));
        assert_eq!(expand_path("  /srv/tablekit  "), PathBuf::from("/srv/tablekit"));
    }

    #[test]
    fn test_relative_joins_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(expand_path("tablekit.json"), cwd.join("tablekit.json"));
        assert_eq!(expand_path("../data"), cwd.join("../data"));
    }

    #[test]
    fn test_tilde() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand_path("~"), home);
        assert_eq!(expand_path("~/.tablekit"), home.join(".tablekit"));
    }

    #[test]
    fn test_tilde_user_is_relative() {
        let result = expand_path("~other/x");
        assert!(result.is_absolute());
        assert!(result.to_string_lossy().contains("~other"));
    }

    #[test]
    fn test_empty_is_cwd() {
        assert_eq!(expand_path("   "), std::env::current_dir().unwrap());
    }
}
