//! Dispatcher configuration loaded from TOML.

use std::path::Path;

use serde::Deserialize;

use crate::error::{DispatchError, Result};

/// Dispatcher-wide settings.
///
/// Every field has a default, so an empty TOML document is a valid config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatcherConfig {
    /// Maximum edit distance for "did you mean" suggestions.
    pub suggestion_threshold: usize,
    /// Dispatcher-wide unknown-command message. Node-specific hooks win.
    pub invalid_command_message: Option<String>,
    /// Dispatcher-wide invalid-arguments message. Node-specific hooks win.
    pub invalid_args_message: Option<String>,
    /// When no close match exists, list the legal commands at the point
    /// where resolution stopped.
    pub list_available_commands: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            suggestion_threshold: 2,
            invalid_command_message: None,
            invalid_args_message: None,
            list_available_commands: true,
        }
    }
}

impl DispatcherConfig {
    /// Parse a config from a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        log::debug!("Loaded dispatcher config from {}", path.display());
        Self::from_toml(&text)
    }

    fn validate(&self) -> Result<()> {
        if self
            .invalid_command_message
            .as_deref()
            .is_some_and(|m| m.trim().is_empty())
        {
            return Err(DispatchError::Config(
                "invalid_command_message must not be blank".into(),
            ));
        }
        if self
            .invalid_args_message
            .as_deref()
            .is_some_and(|m| m.trim().is_empty())
        {
            return Err(DispatchError::Config(
                "invalid_args_message must not be blank".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = DispatcherConfig::from_toml("").unwrap();
        assert_eq!(config, DispatcherConfig::default());
        assert_eq!(config.suggestion_threshold, 2);
        assert!(config.list_available_commands);
    }

    #[test]
    fn overrides_are_applied() {
        let config = DispatcherConfig::from_toml(
            r#"
            suggestion_threshold = 1
            invalid_command_message = "no such command"
            list_available_commands = false
            "#,
        )
        .unwrap();
        assert_eq!(config.suggestion_threshold, 1);
        assert_eq!(
            config.invalid_command_message.as_deref(),
            Some("no such command")
        );
        assert_eq!(config.invalid_args_message, None);
        assert!(!config.list_available_commands);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = DispatcherConfig::from_toml("threshold = 3").unwrap_err();
        assert!(matches!(err, DispatchError::TomlParse(_)));
    }

    #[test]
    fn blank_message_is_rejected() {
        let err = DispatcherConfig::from_toml("invalid_args_message = \"  \"").unwrap_err();
        assert!(matches!(err, DispatchError::Config(_)));
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "suggestion_threshold = 4").unwrap();
        let config = DispatcherConfig::from_file(file.path()).unwrap();
        assert_eq!(config.suggestion_threshold, 4);
    }

    #[test]
    fn from_file_missing_is_io_error() {
        let err = DispatcherConfig::from_file(Path::new("/nonexistent/cmdroute.toml")).unwrap_err();
        assert!(matches!(err, DispatchError::Io(_)));
    }
}
