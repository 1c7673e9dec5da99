//! # Host Interfaces
//!
//! Traits the embedding game server implements so the engine can find
//! clients, query the world and hand packets to the transport.
//!
//! ## Architecture
//!
//! The engine never owns connections or world state. It asks through these
//! traits and the host answers.
//!
//! ```text
//! Engine defines:          Host implements:
//! ┌──────────────────┐     ┌──────────────────┐
//! │ trait PacketSink │ ←── │ impl PacketSink  │
//! └──────────────────┘     └──────────────────┘
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use ignis_shared::{ClientId, Vec3, WorldId};
use parking_lot::{Mutex, RwLock};

use crate::error::TransmitError;
use crate::protocol::EncodedPacket;

/// Snapshot of one connected client.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClientRef {
    id: ClientId,
    world: WorldId,
    position: Vec3,
}

impl ClientRef {
    /// Creates a client snapshot.
    #[must_use]
    pub const fn new(id: ClientId, world: WorldId, position: Vec3) -> Self {
        Self { id, world, position }
    }

    /// Connection identity.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ClientId {
        self.id
    }

    /// World the client is in.
    #[inline]
    #[must_use]
    pub const fn world(&self) -> WorldId {
        self.world
    }

    /// Client position.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }
}

// ============================================================================
// HOST TRAITS
// ============================================================================

/// Who is online and where.
pub trait ClientDirectory: Send + Sync {
    /// Every connected client.
    fn online_clients(&self) -> Vec<ClientRef>;

    /// Connected clients in `world`.
    fn clients_in_world(&self, world: WorldId) -> Vec<ClientRef>;

    /// A single client by id.
    fn client(&self, id: ClientId) -> Option<ClientRef> {
        self.online_clients().into_iter().find(|c| c.id() == id)
    }
}

/// Block material queries.
pub trait LiquidQuery: Send + Sync {
    /// Returns true if the block containing `point` is a liquid.
    fn is_liquid(&self, world: WorldId, point: Vec3) -> bool;
}

/// Outbound transport.
pub trait PacketSink: Send + Sync {
    /// Queues `packet` for `client`.
    ///
    /// # Errors
    ///
    /// A [`TransmitError`] for this client only.
    fn send(&self, client: ClientId, packet: &EncodedPacket) -> Result<(), TransmitError>;
}

/// Where the server's protocol revision comes from.
pub trait ProtocolSource: Send + Sync {
    /// Revision string such as `v1_8_R3`, or `None` if unknown.
    fn server_revision(&self) -> Option<String>;
}

// ============================================================================
// IN-MEMORY IMPLEMENTATIONS (For Testing and the demo server)
// ============================================================================

/// Directory over a mutable in-memory client list.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    clients: RwLock<Vec<ClientRef>>,
}

impl StaticDirectory {
    /// Creates a directory holding `clients`.
    #[must_use]
    pub fn new(clients: Vec<ClientRef>) -> Self {
        Self {
            clients: RwLock::new(clients),
        }
    }

    /// Adds a client or replaces the one with the same id.
    pub fn upsert(&self, client: ClientRef) {
        let mut clients = self.clients.write();
        match clients.iter_mut().find(|c| c.id() == client.id()) {
            Some(existing) => *existing = client,
            None => clients.push(client),
        }
    }

    /// Removes a client. Returns true if it was present.
    pub fn remove(&self, id: ClientId) -> bool {
        let mut clients = self.clients.write();
        let before = clients.len();
        clients.retain(|c| c.id() != id);
        clients.len() != before
    }

    /// Number of clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    /// Returns true if nobody is online.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }
}

impl ClientDirectory for StaticDirectory {
    fn online_clients(&self) -> Vec<ClientRef> {
        self.clients.read().clone()
    }

    fn clients_in_world(&self, world: WorldId) -> Vec<ClientRef> {
        self.clients
            .read()
            .iter()
            .filter(|c| c.world() == world)
            .copied()
            .collect()
    }

    fn client(&self, id: ClientId) -> Option<ClientRef> {
        self.clients.read().iter().find(|c| c.id() == id).copied()
    }
}

/// A world with no liquid anywhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLiquid;

impl LiquidQuery for NoLiquid {
    fn is_liquid(&self, _world: WorldId, _point: Vec3) -> bool {
        false
    }
}

/// Liquid at an explicit set of block cells.
#[derive(Debug, Default)]
pub struct LiquidSet {
    cells: RwLock<HashSet<(WorldId, [i64; 3])>>,
}

impl LiquidSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the block containing `point` as liquid.
    #[must_use]
    pub fn with_block(self, world: WorldId, point: Vec3) -> Self {
        self.cells.write().insert((world, block_of(point)));
        self
    }
}

#[allow(clippy::cast_possible_truncation)]
fn block_of(point: Vec3) -> [i64; 3] {
    [
        point.x.floor() as i64,
        point.y.floor() as i64,
        point.z.floor() as i64,
    ]
}

impl LiquidQuery for LiquidSet {
    fn is_liquid(&self, world: WorldId, point: Vec3) -> bool {
        self.cells.read().contains(&(world, block_of(point)))
    }
}

/// Sink that records every packet and can be told to fail per client.
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(ClientId, EncodedPacket)>>,
    failures: Mutex<HashMap<ClientId, TransmitError>>,
}

impl RecordingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every later send to `client` fails with `error`.
    pub fn fail_for(&self, client: ClientId, error: TransmitError) {
        self.failures.lock().insert(client, error);
    }

    /// All recorded sends, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<(ClientId, EncodedPacket)> {
        self.sent.lock().clone()
    }

    /// Number of recorded sends.
    #[must_use]
    pub fn count(&self) -> usize {
        self.sent.lock().len()
    }

    /// Distinct receivers, sorted.
    #[must_use]
    pub fn receivers(&self) -> Vec<ClientId> {
        let mut ids: Vec<_> = self.sent.lock().iter().map(|(id, _)| *id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Forgets recorded sends.
    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl PacketSink for RecordingSink {
    fn send(&self, client: ClientId, packet: &EncodedPacket) -> Result<(), TransmitError> {
        if let Some(error) = self.failures.lock().get(&client) {
            return Err(error.clone());
        }
        self.sent.lock().push((client, packet.clone()));
        Ok(())
    }
}

/// One packet waiting in a [`ChannelSink`] queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outbound {
    /// Receiver.
    pub client: ClientId,
    /// Packet bytes.
    pub packet: EncodedPacket,
}

/// Sink that forwards packets over a bounded channel to a transport thread.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<Outbound>,
}

impl ChannelSink {
    /// Creates a sink with room for `capacity` queued packets.
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, Receiver<Outbound>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (Self { tx }, rx)
    }

    /// Packets currently queued.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.tx.len()
    }
}

impl PacketSink for ChannelSink {
    fn send(&self, client: ClientId, packet: &EncodedPacket) -> Result<(), TransmitError> {
        let outbound = Outbound {
            client,
            packet: packet.clone(),
        };
        self.tx.try_send(outbound).map_err(|err| match err {
            TrySendError::Full(_) => TransmitError::QueueFull(client),
            TrySendError::Disconnected(_) => TransmitError::Disconnected(client),
        })
    }
}

/// Protocol source returning a fixed revision, counting how often it is asked.
#[derive(Debug, Default)]
pub struct FixedRevision {
    revision: Option<String>,
    queries: AtomicUsize,
}

impl FixedRevision {
    /// Always answers `revision`.
    #[must_use]
    pub fn new(revision: impl Into<String>) -> Self {
        Self {
            revision: Some(revision.into()),
            queries: AtomicUsize::new(0),
        }
    }

    /// Never knows its revision.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// How many times [`ProtocolSource::server_revision`] was called.
    #[must_use]
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }
}

impl ProtocolSource for FixedRevision {
    fn server_revision(&self) -> Option<String> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.revision.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ProtocolEra;

    fn packet() -> EncodedPacket {
        EncodedPacket::new(ProtocolEra::Modern, &[0x2A, 0, 0, 0, 1])
    }

    #[test]
    fn test_directory_filters_by_world() {
        let nether = WorldId(1);
        let directory = StaticDirectory::new(vec![
            ClientRef::new(ClientId(1), WorldId::OVERWORLD, Vec3::ZERO),
            ClientRef::new(ClientId(2), nether, Vec3::ZERO),
        ]);
        assert_eq!(directory.online_clients().len(), 2);
        assert_eq!(directory.clients_in_world(nether).len(), 1);

        directory.upsert(ClientRef::new(ClientId(2), WorldId::OVERWORLD, Vec3::Y));
        assert!(directory.clients_in_world(nether).is_empty());
        assert_eq!(directory.client(ClientId(2)).unwrap().position(), Vec3::Y);

        assert!(directory.remove(ClientId(1)));
        assert!(!directory.remove(ClientId(1)));
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn test_liquid_set_uses_block_cells() {
        let liquid = LiquidSet::new().with_block(WorldId::OVERWORLD, Vec3::new(3.2, 60.9, -0.5));
        assert!(liquid.is_liquid(WorldId::OVERWORLD, Vec3::new(3.9, 60.0, -0.1)));
        assert!(!liquid.is_liquid(WorldId::OVERWORLD, Vec3::new(3.9, 60.0, 0.1)));
        assert!(!liquid.is_liquid(WorldId(7), Vec3::new(3.2, 60.9, -0.5)));
    }

    #[test]
    fn test_recording_sink_failures() {
        let sink = RecordingSink::new();
        sink.fail_for(ClientId(9), TransmitError::Disconnected(ClientId(9)));
        assert!(sink.send(ClientId(1), &packet()).is_ok());
        assert_eq!(
            sink.send(ClientId(9), &packet()),
            Err(TransmitError::Disconnected(ClientId(9)))
        );
        assert_eq!(sink.receivers(), vec![ClientId(1)]);
    }

    #[test]
    fn test_channel_sink_backpressure() {
        let (sink, rx) = ChannelSink::bounded(1);
        assert!(sink.send(ClientId(1), &packet()).is_ok());
        assert_eq!(
            sink.send(ClientId(2), &packet()),
            Err(TransmitError::QueueFull(ClientId(2)))
        );
        assert_eq!(rx.recv().unwrap().client, ClientId(1));

        drop(rx);
        assert_eq!(
            sink.send(ClientId(3), &packet()),
            Err(TransmitError::Disconnected(ClientId(3)))
        );
    }
}
