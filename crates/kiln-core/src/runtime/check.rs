//! Host runtime detection for Node.js, which runs artifact entry points

use crate::error::{KilnError, KilnResult};
use crate::templates::version::parse_version;
use std::process::Command;

/// Oldest Node.js release artifacts may rely on
pub const LOWEST_NODE_VERSION: &str = "12.0.0";

/// Runtime detection result
#[derive(Debug, Clone)]
pub struct RuntimeInfo {
    pub name: &'static str,
    pub version: Option<String>,
    pub available: bool,
}

/// Check if Node.js is available
pub fn check_node() -> RuntimeInfo {
    let output = Command::new("node").arg("--version").output();

    match output {
        Ok(out) if out.status.success() => {
            let version = String::from_utf8_lossy(&out.stdout).trim().to_string();
            RuntimeInfo {
                name: "Node.js",
                version: Some(version),
                available: true,
            }
        }
        _ => RuntimeInfo {
            name: "Node.js",
            version: None,
            available: false,
        },
    }
}

/// Fail unless `runtime` is available at version `floor` or newer
pub fn ensure_minimum(runtime: &RuntimeInfo, floor: &str) -> KilnResult<()> {
    let environment_error = |found: &str| KilnError::Environment {
        runtime: runtime.name,
        required: floor.to_string(),
        found: found.to_string(),
    };

    let found = match (&runtime.version, runtime.available) {
        (Some(version), true) => version,
        _ => return Err(environment_error("not installed")),
    };

    let required = parse_version(floor)
        .map_err(|_| KilnError::configuration(format!("invalid version floor '{}'", floor)))?;
    let current = parse_version(found).map_err(|_| environment_error(found))?;

    if current < required {
        return Err(environment_error(found));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(version: Option<&str>) -> RuntimeInfo {
        RuntimeInfo {
            name: "Node.js",
            version: version.map(str::to_string),
            available: version.is_some(),
        }
    }

    #[test]
    fn test_accepts_newer_node() {
        assert!(ensure_minimum(&node(Some("v18.19.0")), LOWEST_NODE_VERSION).is_ok());
        assert!(ensure_minimum(&node(Some("v12.0.0")), LOWEST_NODE_VERSION).is_ok());
    }

    #[test]
    fn test_rejects_old_node() {
        let err = ensure_minimum(&node(Some("v10.24.1")), LOWEST_NODE_VERSION).unwrap_err();
        assert!(matches!(err, KilnError::Environment { .. }));
        assert!(err.to_string().contains("12.0.0"));
    }

    #[test]
    fn test_rejects_missing_node() {
        assert!(matches!(
            ensure_minimum(&node(None), LOWEST_NODE_VERSION),
            Err(KilnError::Environment { .. })
        ));
    }

    #[test]
    fn test_unparseable_version_is_environment_error() {
        assert!(matches!(
            ensure_minimum(&node(Some("nightly")), LOWEST_NODE_VERSION),
            Err(KilnError::Environment { .. })
        ));
    }
}
