//! Typed read access to one entity type.

use crate::catalog::{Catalog, Record};
use crate::entities::{Alliance, UniverseEntity};
use crate::error::Result;
use crate::history::{History, LookupMode, Snapshot};
use crate::tick::TickId;

/// Borrowed view pairing a catalog with its history.
///
/// Every query takes concrete key and tick parameters and returns a concrete
/// record or a typed error.
#[derive(Debug)]
pub struct Repository<'a, E: UniverseEntity> {
    catalog: &'a Catalog<E>,
    history: &'a History<E>,
}

impl<E: UniverseEntity> Clone for Repository<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: UniverseEntity> Copy for Repository<'_, E> {}

impl<'a, E: UniverseEntity> Repository<'a, E> {
    /// Pair a catalog and history.
    #[must_use]
    pub const fn new(catalog: &'a Catalog<E>, history: &'a History<E>) -> Self {
        Self { catalog, history }
    }

    /// The underlying catalog.
    #[must_use]
    pub const fn catalog(&self) -> &'a Catalog<E> {
        self.catalog
    }

    /// The underlying history.
    #[must_use]
    pub const fn history(&self) -> &'a History<E> {
        self.history
    }

    /// Current record at a key. See [`Catalog::load_by_key`].
    pub fn load_by_key(&self, key: &E::Key, require_active: bool) -> Result<&'a Record<E>> {
        self.catalog.load_by_key(key, require_active)
    }

    /// Every record ever held at a key, oldest first.
    #[must_use]
    pub fn records_at(&self, key: &E::Key) -> Vec<&'a Record<E>> {
        self.catalog.records_at(key)
    }

    /// Snapshot near a tick. See [`History::load_snapshot`].
    pub fn load_snapshot(
        &self,
        key: &E::Key,
        tick: TickId,
        mode: LookupMode,
        require_active: bool,
    ) -> Result<&'a Snapshot<E>> {
        self.history
            .load_snapshot(self.catalog, key, tick, mode, require_active)
    }

    /// Entity state as recorded at the resolved tick.
    pub fn load_entity_at_tick(
        &self,
        key: &E::Key,
        tick: TickId,
        mode: LookupMode,
        require_active: bool,
    ) -> Result<&'a E> {
        self.history
            .load_entity_at_tick(self.catalog, key, tick, mode, require_active)
    }

    /// The record that produced a snapshot.
    #[must_use]
    pub fn owner_as_of(&self, snapshot: &Snapshot<E>) -> Option<&'a Record<E>> {
        snapshot.owner_as_of(self.catalog)
    }

    /// The record active at a snapshot's key today.
    #[must_use]
    pub fn current_owner(&self, snapshot: &Snapshot<E>) -> Option<&'a Record<E>> {
        snapshot.current_owner(self.catalog)
    }
}

impl<'a> Repository<'a, Alliance> {
    /// Fuzzy alliance lookup. See [`Catalog::search`].
    pub fn search(&self, query: &str, require_active: bool, exact: bool) -> Result<&'a Record<Alliance>> {
        self.catalog.search(query, require_active, exact)
    }
}
