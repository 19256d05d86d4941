use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::TurnLoopConfig;
use crate::error::ConfigError;
use crate::world::{Attributes, ZoneId};

/// World layout document:
///
/// ```json
/// { "turn_ms": 300,
///   "zones": [ { "id": "tavern", "width": 40, "height": 40,
///                "configurators": ["tavern_maid"], "attributes": {} } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorldConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_ms: Option<u64>,
    pub zones: Vec<ZoneConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoneConfig {
    pub id: ZoneId,
    pub width: u32,
    pub height: u32,
    /// Applied in order once the zone exists.
    #[serde(default)]
    pub configurators: Vec<String>,
    #[serde(default)]
    pub attributes: Attributes,
}

impl WorldConfig {
    pub fn turn_loop_config(&self, base: TurnLoopConfig) -> TurnLoopConfig {
        match self.turn_ms {
            Some(ms) if ms > 0 => TurnLoopConfig {
                turn_duration: Duration::from_millis(ms),
                ..base
            },
            _ => base,
        }
    }
}

pub fn load_world_config(path: &Path) -> Result<WorldConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    parse_world_config(path, &raw)
}

/// `source` only labels errors.
pub fn parse_world_config(source: &Path, raw: &str) -> Result<WorldConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, WorldConfig>(&mut deserializer).map_err(|error| {
        let json_path = error.path().to_string();
        ConfigError::Parse {
            path: source.to_path_buf(),
            json_path,
            source: error.into_inner(),
        }
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    const SAMPLE: &str = r#"{
        "turn_ms": 150,
        "zones": [
            { "id": "tavern", "width": 40, "height": 40,
              "configurators": ["tavern_maid"], "attributes": { "maid_hp": 80 } },
            { "id": "castle", "width": 100, "height": 100 }
        ]
    }"#;

    #[test]
    fn parses_zones_with_defaults() {
        let config = parse_world_config(Path::new("inline"), SAMPLE).expect("parse");

        assert_eq!(config.turn_ms, Some(150));
        assert_eq!(config.zones.len(), 2);
        assert_eq!(config.zones[0].id, ZoneId::from("tavern"));
        assert_eq!(config.zones[0].configurators, vec!["tavern_maid"]);
        assert_eq!(config.zones[0].attributes.int("maid_hp"), Some(80));
        assert!(config.zones[1].configurators.is_empty());
        assert!(config.zones[1].attributes.is_empty());
    }

    #[test]
    fn parse_error_reports_json_path() {
        let raw = r#"{ "zones": [ { "id": "tavern", "width": "wide", "height": 4 } ] }"#;
        let err = parse_world_config(Path::new("world.json"), raw).expect_err("bad width");

        match err {
            ConfigError::Parse { json_path, .. } => assert_eq!(json_path, "zones[0].width"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let raw = r#"{ "zones": [], "tick": 5 }"#;
        assert!(matches!(
            parse_world_config(Path::new("world.json"), raw),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(SAMPLE.as_bytes()).expect("write");

        let config = load_world_config(file.path()).expect("load");
        assert_eq!(config.zones[1].id, ZoneId::from("castle"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("absent.json");

        let err = load_world_config(&path).expect_err("missing");
        assert!(matches!(err, ConfigError::ReadFile { path: ref p, .. } if p == &path));
    }

    #[test]
    fn turn_ms_overrides_base_loop_config() {
        let config = parse_world_config(Path::new("inline"), SAMPLE).expect("parse");
        let loop_config = config.turn_loop_config(TurnLoopConfig::default());
        assert_eq!(loop_config.turn_duration, Duration::from_millis(150));

        let no_override = WorldConfig {
            turn_ms: Some(0),
            zones: Vec::new(),
        };
        assert_eq!(
            no_override.turn_loop_config(TurnLoopConfig::default()),
            TurnLoopConfig::default()
        );
    }
}
