//! Identifiers handed out by the host server.
//!
//! The engine never allocates these; it only compares and hashes them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one connected client (one player connection).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(pub u32);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client#{}", self.0)
    }
}

/// Identity of a world (dimension) on the host server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldId(pub u32);

impl WorldId {
    /// The host's default overworld.
    pub const OVERWORLD: Self = Self(0);
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "world#{}", self.0)
    }
}
