//! ManageClientsUseCase: the registry of kinect and beamer clients.
//!
//! The `ClientRegistry` is the master's in-memory record of every device that
//! has registered since start-up.  It keeps one ordered sequence per
//! [`ClientKind`]:
//!
//! ```text
//! kinects:  [ id 0 ] [ id 1 ] [ id 2 ] ...   append-only
//! beamers:  [ id 0 ] [ id 1 ] ...            append-only
//! ```
//!
//! # Id assignment
//!
//! A new record's id is the current length of its kind's sequence.  Records
//! are never removed, so an id is also the record's index for the lifetime of
//! the process, and ids never repeat within a kind.
//!
//! # Ownership
//!
//! Only the simulation loop holds a `ClientRegistry`.  The control plane never
//! touches it; it enqueues commands instead.  Confinement to one thread is what
//! lets the registry go without a `Mutex`.

use sandbox_core::{ClientId, ClientKind, ClientRecord};
use serde_json::{Map, Value};

/// In-memory registry of all registered clients.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    kinects: Vec<ClientRecord>,
    beamers: Vec<ClientRecord>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new client of `kind` and returns its id.
    pub fn register(&mut self, kind: ClientKind, payload: Map<String, Value>) -> ClientId {
        let sequence = self.sequence_mut(kind);
        let id = sequence.len();
        sequence.push(ClientRecord { id, kind, payload });
        id
    }

    /// Returns every client of `kind` in registration order.
    pub fn list(&self, kind: ClientKind) -> &[ClientRecord] {
        match kind {
            ClientKind::Kinect => &self.kinects,
            ClientKind::Beamer => &self.beamers,
        }
    }

    /// Returns the client of `kind` with `id`.
    pub fn get(&self, kind: ClientKind, id: ClientId) -> Option<&ClientRecord> {
        self.list(kind).get(id)
    }

    /// Number of clients of `kind`.
    pub fn len(&self, kind: ClientKind) -> usize {
        self.list(kind).len()
    }

    /// Returns `true` when no client of any kind has registered.
    pub fn is_empty(&self) -> bool {
        self.kinects.is_empty() && self.beamers.is_empty()
    }

    fn sequence_mut(&mut self, kind: ClientKind) -> &mut Vec<ClientRecord> {
        match kind {
            ClientKind::Kinect => &mut self.kinects,
            ClientKind::Beamer => &mut self.beamers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(map) => map,
            other => panic!("test payload must be an object, got {other}"),
        }
    }

    #[test]
    fn test_registry_starts_empty() {
        let registry = ClientRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.list(ClientKind::Kinect).is_empty());
        assert!(registry.list(ClientKind::Beamer).is_empty());
    }

    #[test]
    fn test_ids_follow_registration_order_within_kind() {
        // Arrange
        let mut registry = ClientRegistry::new();

        // Act
        let ids: Vec<ClientId> = (0..5)
            .map(|i| registry.register(ClientKind::Kinect, payload(json!({ "n": i }))))
            .collect();

        // Assert
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(registry.len(ClientKind::Kinect), 5);
        for (index, record) in registry.list(ClientKind::Kinect).iter().enumerate() {
            assert_eq!(record.id, index);
            assert_eq!(record.payload["n"], json!(index));
        }
    }

    #[test]
    fn test_kinds_have_independent_id_sequences() {
        // Arrange
        let mut registry = ClientRegistry::new();

        // Act
        let k0 = registry.register(ClientKind::Kinect, Map::new());
        let b0 = registry.register(ClientKind::Beamer, Map::new());
        let k1 = registry.register(ClientKind::Kinect, Map::new());

        // Assert
        assert_eq!((k0, b0, k1), (0, 0, 1));
        assert_eq!(registry.len(ClientKind::Beamer), 1);
    }

    #[test]
    fn test_registering_beamer_leaves_kinects_untouched() {
        // Arrange
        let mut registry = ClientRegistry::new();
        registry.register(ClientKind::Kinect, payload(json!({"serial": "K1"})));
        let before = registry.list(ClientKind::Kinect).to_vec();

        // Act
        registry.register(ClientKind::Beamer, payload(json!({"output": "HDMI-1"})));

        // Assert
        assert_eq!(registry.list(ClientKind::Kinect), before.as_slice());
    }

    #[test]
    fn test_get_returns_record_by_kind_and_id() {
        let mut registry = ClientRegistry::new();
        registry.register(ClientKind::Beamer, payload(json!({"output": "DP-2"})));

        let record = registry.get(ClientKind::Beamer, 0).expect("beamer 0 exists");
        assert_eq!(record.kind, ClientKind::Beamer);
        assert_eq!(record.payload["output"], json!("DP-2"));
        assert!(registry.get(ClientKind::Kinect, 0).is_none());
    }
}
