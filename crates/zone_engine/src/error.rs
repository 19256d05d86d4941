use std::path::PathBuf;

use thiserror::Error;

use crate::world::{Identifier, ZoneError, ZoneId};

/// Startup-time failures. Nothing raised while the turn loop is live uses this type.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("action type name cannot be empty")]
    EmptyActionType,
    #[error("duplicate action handler registration: {action_type}")]
    DuplicateActionType { action_type: String },
    #[error("zone id cannot be empty")]
    EmptyZoneId,
    #[error("duplicate zone registration: {zone}")]
    DuplicateZone { zone: ZoneId },
    #[error("zone {zone} has invalid bounds {width}x{height}")]
    InvalidZoneBounds {
        zone: ZoneId,
        width: u32,
        height: u32,
    },
    #[error("world configuration declares no zones")]
    NoZones,
    #[error("configurator name cannot be empty")]
    EmptyConfiguratorName,
    #[error("duplicate zone configurator registration: {name}")]
    DuplicateConfigurator { name: String },
    #[error("zone {zone} references unknown configurator {configurator}")]
    UnknownConfigurator { zone: ZoneId, configurator: String },
    #[error("zone {zone} is missing required attribute {attribute}")]
    MissingAttribute { zone: ZoneId, attribute: String },
    #[error("zone {zone} attribute {attribute} has invalid value {value:?}")]
    InvalidAttribute {
        zone: ZoneId,
        attribute: String,
        value: String,
    },
    #[error("failed to populate zone: {0}")]
    Zone(#[from] ZoneError),
    #[error("failed to read world config {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse world config {path} at {json_path}: {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Expected lookup misses. Callers on the turn thread treat these as "ignore".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFound {
    #[error("zone {0} is not registered")]
    Zone(ZoneId),
    #[error("object {0} does not exist")]
    Object(Identifier),
}

/// Failure raised by a single action handler, turn listener or entity behavior.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    NotFound(#[from] NotFound),
    #[error(transparent)]
    Zone(#[from] ZoneError),
}

impl HandlerError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}
