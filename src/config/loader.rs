//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::RouterConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Validation(_) => None,
        }
    }
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RouterConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<RouterConfig, ConfigError> {
    let config: RouterConfig = toml::from_str(content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouterMode;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
mode = "hash"

[navigation]
guard_stall_warning_ms = 500

[logging]
filter = "page_router=debug"
json = true

[host]
entry_page = "pages/index/index"
pages = ["pages/index/index", "pages/home/index", "pages/mine/index"]
tab_pages = ["pages/home/index", "pages/mine/index"]
max_stack_depth = 5

[[routes]]
path = "/pages/mine/index"
name = "mine"
meta = { requiresAuth = true }
"#,
        )
        .unwrap();

        assert_eq!(config.mode, RouterMode::Hash);
        assert_eq!(config.navigation.guard_stall_warning_ms, Some(500));
        assert!(config.logging.json);
        assert_eq!(config.host.max_stack_depth, 5);
        assert_eq!(config.routes[0].meta.get("requiresAuth"), Some(&serde_json::Value::Bool(true)));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.mode, RouterMode::History);
        assert_eq!(config.host.entry_page, "pages/index/index");
        assert_eq!(config.host.max_stack_depth, 10);
    }

    #[test]
    fn test_validation_errors_are_reported() {
        let err = parse_config("[host]\nmax_stack_depth = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("host.max_stack_depth"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
