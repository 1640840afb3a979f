//! Registry of placed structures with a per-tile index.

use std::collections::{BTreeMap, BTreeSet};

use isocity_core::{Footprint, Structure, StructureId, TilePos};

/// Structure stored inside the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct StructureEntry {
    pub(crate) structure: Structure,
    pub(crate) footprint: Footprint,
}

/// Registry that stores structures and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct StructureRegistry {
    entries: BTreeMap<StructureId, StructureEntry>,
    by_tile: BTreeMap<TilePos, BTreeSet<StructureId>>,
    next_id: StructureId,
}

impl StructureRegistry {
    /// Creates an empty registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            by_tile: BTreeMap::new(),
            next_id: StructureId::new(0),
        }
    }

    pub(crate) fn insert(&mut self, structure: Structure, footprint: Footprint) -> StructureId {
        let id = self.next_id;
        self.next_id = StructureId::new(id.get() + 1);
        for (_, _, tile) in footprint.cells() {
            let _ = self.by_tile.entry(tile).or_default().insert(id);
        }
        let _ = self.entries.insert(
            id,
            StructureEntry {
                structure,
                footprint,
            },
        );
        id
    }

    /// Detaches the tiles of `area` from every structure covering them.
    ///
    /// Roads keep their entry while any of their tiles is still indexed;
    /// every other structure is removed as a whole. Returns the removed
    /// entries.
    pub(crate) fn release(&mut self, area: &Footprint) -> Vec<(StructureId, StructureEntry)> {
        let touched: BTreeSet<StructureId> = area
            .cells()
            .filter_map(|(_, _, tile)| self.by_tile.get(&tile))
            .flatten()
            .copied()
            .collect();

        let mut removed = Vec::with_capacity(touched.len());
        for id in touched {
            let Some(entry) = self.entries.get(&id).copied() else {
                continue;
            };
            if entry.structure.kind.is_road() {
                for (_, _, tile) in area.cells() {
                    self.unindex(id, tile);
                }
                let remaining = entry.footprint.cells().any(|(_, _, tile)| {
                    self.by_tile
                        .get(&tile)
                        .is_some_and(|ids| ids.contains(&id))
                });
                if remaining {
                    continue;
                }
            }
            for (_, _, tile) in entry.footprint.cells() {
                self.unindex(id, tile);
            }
            let _ = self.entries.remove(&id);
            removed.push((id, entry));
        }
        removed
    }

    fn unindex(&mut self, id: StructureId, tile: TilePos) {
        if let Some(ids) = self.by_tile.get_mut(&tile) {
            let _ = ids.remove(&id);
            if ids.is_empty() {
                let _ = self.by_tile.remove(&tile);
            }
        }
    }

    pub(crate) fn ids_at(&self, tile: TilePos) -> Vec<StructureId> {
        self.by_tile
            .get(&tile)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (StructureId, &StructureEntry)> {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
