//! Client records for registered kinect and beamer devices.
//!
//! A client is created only in response to a registration command and is never
//! removed.  Ids are scoped to the client's kind: the first kinect and the first
//! beamer both receive id `0`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Identifier of a registered client, unique within its [`ClientKind`].
///
/// The id equals the record's index in its kind's sequence at the moment of
/// insertion.
pub type ClientId = usize;

/// The kind of device a client represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientKind {
    /// Depth-sensing input device that reports sand heights.
    Kinect,
    /// Projector output device that displays the computed frame.
    Beamer,
}

impl ClientKind {
    /// Returns the lowercase wire name (`"kinect"` or `"beamer"`).
    pub fn as_str(self) -> &'static str {
        match self {
            ClientKind::Kinect => "kinect",
            ClientKind::Beamer => "beamer",
        }
    }
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a kind string names neither a kinect nor a beamer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown client kind: {0:?}")]
pub struct UnknownClientKind(pub String);

impl FromStr for ClientKind {
    type Err = UnknownClientKind;

    /// Parses the exact lowercase wire names.  Matching is case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kinect" => Ok(ClientKind::Kinect),
            "beamer" => Ok(ClientKind::Beamer),
            other => Err(UnknownClientKind(other.to_string())),
        }
    }
}

/// A registered device.
///
/// `payload` is device-specific configuration supplied at registration.  The
/// coordinator stores it verbatim and never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: ClientId,
    pub kind: ClientKind,
    pub payload: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_kind_parses_wire_names() {
        assert_eq!("kinect".parse::<ClientKind>(), Ok(ClientKind::Kinect));
        assert_eq!("beamer".parse::<ClientKind>(), Ok(ClientKind::Beamer));
    }

    #[test]
    fn test_client_kind_rejects_unknown_name() {
        // Arrange / Act
        let result = "projector".parse::<ClientKind>();

        // Assert
        assert_eq!(result, Err(UnknownClientKind("projector".to_string())));
    }

    #[test]
    fn test_client_kind_parsing_is_case_sensitive() {
        assert!("Kinect".parse::<ClientKind>().is_err());
    }

    #[test]
    fn test_client_kind_display_matches_wire_name() {
        assert_eq!(ClientKind::Beamer.to_string(), "beamer");
    }
}
