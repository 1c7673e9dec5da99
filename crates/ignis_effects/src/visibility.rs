//! # Visibility Resolution
//!
//! Decides which connected clients receive an effect packet.
//!
//! ## Strategies
//!
//! ```text
//! Everyone       all online clients, any world, any distance
//! Radius(R)      same world as the center, distance <= R
//! Explicit(ids)  exactly the listed clients that are online
//! ```
//!
//! Output is deduplicated by client id. Order carries no meaning.

use std::collections::HashSet;

use ignis_shared::{ClientId, Vec3, WorldId};

use crate::error::{EffectError, EffectResult};
use crate::host::{ClientDirectory, ClientRef};

/// Receiver selection strategy.
#[derive(Clone, Debug, PartialEq)]
pub enum VisibilityFilter {
    /// All online clients.
    Everyone,
    /// Clients in the center's world within this distance (inclusive).
    Radius(f64),
    /// An explicit selection. Must not be empty.
    Explicit(Vec<ClientId>),
}

impl VisibilityFilter {
    /// Radius filter, validated.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for a negative or non-finite radius.
    pub fn radius(range: f64) -> EffectResult<Self> {
        let filter = Self::Radius(range);
        filter.validate()?;
        Ok(filter)
    }

    /// Explicit selection of the given clients.
    #[must_use]
    pub fn explicit(clients: impl IntoIterator<Item = ClientId>) -> Self {
        Self::Explicit(clients.into_iter().collect())
    }

    /// The range of a radius filter.
    #[inline]
    #[must_use]
    pub fn range(&self) -> Option<f64> {
        match self {
            Self::Radius(range) => Some(*range),
            _ => None,
        }
    }

    /// Checks the filter's own parameters.
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` for a bad radius
    /// - `EmptyReceiverSet` for an empty explicit selection
    pub fn validate(&self) -> EffectResult<()> {
        match self {
            Self::Radius(range) if !range.is_finite() || *range < 0.0 => Err(
                EffectError::invalid("range", format!("{range} is not a finite value >= 0")),
            ),
            Self::Explicit(clients) if clients.is_empty() => Err(EffectError::EmptyReceiverSet),
            _ => Ok(()),
        }
    }
}

/// Applies a [`VisibilityFilter`] against the host's client directory.
pub struct VisibilityResolver<'a> {
    directory: &'a dyn ClientDirectory,
}

impl<'a> VisibilityResolver<'a> {
    /// Creates a resolver over `directory`.
    #[must_use]
    pub fn new(directory: &'a dyn ClientDirectory) -> Self {
        Self { directory }
    }

    /// Resolves the receivers of an effect centered at `center` in `world`.
    ///
    /// Explicitly listed clients that are not online are skipped.
    ///
    /// # Errors
    ///
    /// See [`VisibilityFilter::validate`].
    pub fn resolve(
        &self,
        world: WorldId,
        center: Vec3,
        filter: &VisibilityFilter,
    ) -> EffectResult<Vec<ClientRef>> {
        filter.validate()?;

        let candidates = match filter {
            VisibilityFilter::Everyone => self.directory.online_clients(),
            VisibilityFilter::Radius(range) => {
                let limit = range * range;
                self.directory
                    .clients_in_world(world)
                    .into_iter()
                    .filter(|c| c.position().distance_squared(center) <= limit)
                    .collect()
            }
            VisibilityFilter::Explicit(ids) => ids
                .iter()
                .filter_map(|id| {
                    let client = self.directory.client(*id);
                    if client.is_none() {
                        tracing::debug!(%id, "explicit receiver is not online");
                    }
                    client
                })
                .collect(),
        };

        let mut seen = HashSet::with_capacity(candidates.len());
        Ok(candidates
            .into_iter()
            .filter(|c| seen.insert(c.id()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::StaticDirectory;

    fn directory() -> StaticDirectory {
        StaticDirectory::new(vec![
            ClientRef::new(ClientId(1), WorldId::OVERWORLD, Vec3::new(10.0, 0.0, 0.0)),
            ClientRef::new(ClientId(2), WorldId::OVERWORLD, Vec3::new(10.001, 0.0, 0.0)),
            ClientRef::new(ClientId(3), WorldId(1), Vec3::ZERO),
        ])
    }

    fn ids(clients: &[ClientRef]) -> Vec<ClientId> {
        let mut ids: Vec<_> = clients.iter().map(ClientRef::id).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_radius_is_inclusive() {
        let directory = directory();
        let resolver = VisibilityResolver::new(&directory);
        let filter = VisibilityFilter::radius(10.0).unwrap();
        let clients = resolver
            .resolve(WorldId::OVERWORLD, Vec3::ZERO, &filter)
            .unwrap();
        assert_eq!(ids(&clients), vec![ClientId(1)]);
    }

    #[test]
    fn test_everyone_ignores_world() {
        let directory = directory();
        let resolver = VisibilityResolver::new(&directory);
        let clients = resolver
            .resolve(WorldId::OVERWORLD, Vec3::ZERO, &VisibilityFilter::Everyone)
            .unwrap();
        assert_eq!(clients.len(), 3);
    }

    #[test]
    fn test_explicit_deduplicates_and_skips_offline() {
        let directory = directory();
        let resolver = VisibilityResolver::new(&directory);
        let filter = VisibilityFilter::explicit([ClientId(3), ClientId(3), ClientId(44)]);
        let clients = resolver
            .resolve(WorldId::OVERWORLD, Vec3::ZERO, &filter)
            .unwrap();
        assert_eq!(ids(&clients), vec![ClientId(3)]);
    }

    #[test]
    fn test_invalid_filters() {
        assert!(matches!(
            VisibilityFilter::radius(-1.0),
            Err(EffectError::InvalidParameter { name: "range", .. })
        ));
        assert!(VisibilityFilter::radius(f64::INFINITY).is_err());

        let directory = directory();
        let resolver = VisibilityResolver::new(&directory);
        assert_eq!(
            resolver.resolve(
                WorldId::OVERWORLD,
                Vec3::ZERO,
                &VisibilityFilter::Explicit(Vec::new())
            ),
            Err(EffectError::EmptyReceiverSet)
        );
    }
}
