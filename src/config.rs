//! YAML configuration for the attack workflow.
//!
//! ```yaml
//! pcap_file: data/sample_trace.json   # a JSON trace, despite the key name
//! active_profile: drop_first_client
//! profiles:
//!   drop_first_client:
//!     description: "Drop the client's second message"
//!     drop_indices: [2]
//! ```

use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{DemoError, Result};
use crate::selector::DropSpec;

#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    /// Trace to load, used exactly as written in the config
    pub pcap_file: PathBuf,
    pub drop_spec: DropSpec,
}

/// Read a config file as a raw YAML mapping, without requiring any key
pub fn load_mapping(path: impl AsRef<Path>) -> Result<Mapping> {
    let path = path.as_ref();
    debug!("Reading config: {}", path.display());

    let text = fs::read_to_string(path).map_err(|e| DemoError::io(path, e))?;
    parse_mapping(&text, path)
}

/// Parse config text into a mapping. `path` only appears in error messages.
pub fn parse_mapping(text: &str, path: &Path) -> Result<Mapping> {
    match serde_yaml::from_str::<Value>(text)? {
        Value::Mapping(mapping) => Ok(mapping),
        _ => Err(DemoError::InvalidConfig {
            path: path.to_path_buf(),
            reason: "configuration must be a mapping".to_string(),
        }),
    }
}

impl DemoConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_mapping(&load_mapping(path)?)
    }

    /// Parse config text. `path` only appears in error messages.
    pub fn from_yaml_str(text: &str, path: &Path) -> Result<Self> {
        Self::from_mapping(&parse_mapping(text, path)?)
    }

    pub fn from_mapping(mapping: &Mapping) -> Result<Self> {
        let pcap_file = match mapping.get("pcap_file") {
            Some(Value::String(s)) => PathBuf::from(s),
            _ => return Err(DemoError::MissingConfigKey("pcap_file".to_string())),
        };
        let drop_spec = DropSpec::from_config(mapping)?;

        Ok(Self { pcap_file, drop_spec })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<DemoConfig> {
        DemoConfig::from_yaml_str(text, Path::new("demo.yaml"))
    }

    #[test]
    fn test_flat_config() {
        let config = parse("pcap_file: data/sample_trace.json\ndrop_indices: [2]\n").unwrap();
        assert_eq!(config.pcap_file, PathBuf::from("data/sample_trace.json"));
        assert_eq!(config.drop_spec, DropSpec::FlatList(vec![2]));
    }

    #[test]
    fn test_missing_pcap_file() {
        match parse("drop_indices: [2]\n") {
            Err(DemoError::MissingConfigKey(key)) => assert_eq!(key, "pcap_file"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_pcap_file_reported_before_drop_list() {
        assert!(matches!(
            parse("drop_indices: oops\n"),
            Err(DemoError::MissingConfigKey(_))
        ));
    }

    #[test]
    fn test_not_a_mapping() {
        assert!(matches!(parse("- 1\n- 2\n"), Err(DemoError::InvalidConfig { .. })));
        assert!(matches!(parse("key: [unclosed"), Err(DemoError::Yaml(_))));
    }

    #[test]
    fn test_profile_config() {
        let config = parse(
            "pcap_file: t.json\nactive_profile: a\nprofiles:\n  a:\n    drop_indices: [1, 3]\n",
        )
        .unwrap();
        assert!(matches!(
            config.drop_spec,
            DropSpec::NamedProfile { ref active, .. } if active == "a"
        ));
        assert_eq!(config.drop_spec.resolve().unwrap().indices, vec![1, 3]);
    }

    #[test]
    fn test_mapping_does_not_require_pcap_file() {
        let mapping = parse_mapping("drop_indices: [2]\n", Path::new("demo.yaml")).unwrap();
        let spec = DropSpec::from_config(&mapping).unwrap();
        assert_eq!(spec, DropSpec::FlatList(vec![2]));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            DemoConfig::load("/nonexistent/demo.yaml"),
            Err(DemoError::Io { .. })
        ));
    }
}
