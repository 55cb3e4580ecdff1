//! Runtime configuration

use logobj_core::{ObjError, ObjResult};
use serde::{Deserialize, Serialize};

use crate::{OBJ_CURR_IF_VERSION, OBJ_MIN_IF_VERSION};

/// Runtime configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObjConfig {
    /// Object interface version requested at startup
    pub interface_version: u32,
    pub log: LogConfig,
}

impl Default for ObjConfig {
    fn default() -> Self {
        Self {
            interface_version: OBJ_CURR_IF_VERSION,
            log: LogConfig::default(),
        }
    }
}

impl ObjConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(input: &str) -> ObjResult<Self> {
        let config: ObjConfig = serde_json::from_str(input)
            .map_err(|e| ObjError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ObjResult<()> {
        if !(OBJ_MIN_IF_VERSION..=OBJ_CURR_IF_VERSION).contains(&self.interface_version) {
            return Err(ObjError::Config(format!(
                "interface_version {} outside {}..={}",
                self.interface_version, OBJ_MIN_IF_VERSION, OBJ_CURR_IF_VERSION
            )));
        }
        Ok(())
    }
}

/// Log output settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// `EnvFilter` directives. Empty defers to `RUST_LOG`.
    pub filter: String,
    /// Emit JSON lines instead of human readable text
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".into(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ObjConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ObjConfig::default());
        assert_eq!(config.interface_version, OBJ_CURR_IF_VERSION);
        assert_eq!(config.log.filter, "info");
        assert!(!config.log.json);
    }

    #[test]
    fn test_partial_document() {
        let config =
            ObjConfig::from_json_str(r#"{"interface_version": 1, "log": {"json": true}}"#).unwrap();
        assert_eq!(config.interface_version, 1);
        assert!(config.log.json);
        assert_eq!(config.log.filter, "info");
    }

    #[test]
    fn test_rejects_bad_input() {
        for input in [
            "not json",
            r#"{"interface_version": 3}"#,
            r#"{"interface_version": 0}"#,
            r#"{"unknown": true}"#,
        ] {
            assert!(
                matches!(ObjConfig::from_json_str(input), Err(ObjError::Config(_))),
                "{input} was accepted"
            );
        }
    }

    #[test]
    fn test_serializes_back() {
        let config = ObjConfig::default();
        let text = serde_json::to_string(&config).unwrap();
        assert_eq!(ObjConfig::from_json_str(&text).unwrap(), config);
    }
}
