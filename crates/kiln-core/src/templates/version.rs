//! Version normalization and CLI update notices

use crate::error::{KilnError, KilnResult};
use semver::Version;

/// Parse a loosely written version, handling various formats.
///
/// Surrounding whitespace and a leading `v` or `=` are accepted, so
/// `v1.2.3` and `=1.2.3` both yield `1.2.3`.
pub fn parse_version(version_str: &str) -> KilnResult<Version> {
    let trimmed = version_str.trim();
    let cleaned = trimmed
        .strip_prefix('=')
        .unwrap_or(trimmed)
        .trim_start();
    let cleaned = cleaned.strip_prefix('v').unwrap_or(cleaned);
    Version::parse(cleaned).map_err(|e| KilnError::Validation {
        field: "version",
        message: format!("'{}' is not a semantic version: {}", version_str, e),
    })
}

/// Strict form of a loosely written version
pub fn normalize_version(version_str: &str) -> KilnResult<String> {
    parse_version(version_str).map(|v| v.to_string())
}

/// Compare the running CLI version against the latest published one.
/// Returns a notice if a newer release is available.
pub fn update_notice(current: &str, latest: &str, upgrade_command: &str) -> Option<String> {
    let current_ver = parse_version(current).ok()?;
    let latest_ver = parse_version(latest).ok()?;

    if latest_ver > current_ver {
        Some(format!(
            "A newer version is available: {} (current {}).\n\
             Update with: {}",
            latest, current, upgrade_command
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strict_version_unchanged() {
        assert_eq!(normalize_version("1.2.3").unwrap(), "1.2.3");
    }

    #[test]
    fn test_normalize_loose_versions() {
        assert_eq!(normalize_version("v1.2.3").unwrap(), "1.2.3");
        assert_eq!(normalize_version("=1.2.3").unwrap(), "1.2.3");
        assert_eq!(normalize_version("  1.2.3 ").unwrap(), "1.2.3");
        assert_eq!(normalize_version("1.0.0-beta.1").unwrap(), "1.0.0-beta.1");
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        for input in ["abc", "", "1.2", "vv1.2.3"] {
            assert!(
                matches!(normalize_version(input), Err(KilnError::Validation { .. })),
                "{} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_update_available() {
        let notice = update_notice("0.1.0", "0.2.0", "npm install -g @kiln-cli/core");
        assert!(notice.is_some());
        assert!(notice.unwrap().contains("0.2.0"));
    }

    #[test]
    fn test_no_notice_when_current() {
        assert!(update_notice("0.2.0", "0.2.0", "upgrade").is_none());
        assert!(update_notice("0.3.0", "0.2.0", "upgrade").is_none());
    }

    #[test]
    fn test_invalid_versions() {
        // Should return None (no notice) for invalid versions
        assert!(update_notice("invalid", "0.1.0", "upgrade").is_none());
    }
}
