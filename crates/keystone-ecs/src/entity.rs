use std::fmt;

use tracing::trace;

use crate::component::ComponentId;
use crate::error::{EcsError, Result};
use crate::signature::{self, words_for};

/// A generational entity handle. Uses compact u32 index + generation so a stale
/// handle never aliases the entity that later reuses its slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl Entity {
    /// Create an entity from raw parts (mainly for testing).
    pub fn from_raw(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The slot index of this entity.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The generation of this entity (incremented each time the slot is freed).
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Owns entity slots: liveness, generations, free-list recycling and the
/// per-slot component signature.
///
/// Signatures are stored flat, `stride` words per slot, so reserving slots also
/// reserves their signatures.
pub struct EntityTable {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free_list: Vec<u32>,
    signatures: Vec<u64>,
    stride: usize,
    len: usize,
}

impl EntityTable {
    /// A table whose signatures are wide enough for `component_capacity` types.
    pub fn new(component_capacity: usize) -> Self {
        Self {
            generations: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            signatures: Vec::new(),
            stride: words_for(component_capacity),
            len: 0,
        }
    }

    /// Allocate a new entity with an empty signature, reusing a freed slot if
    /// available.
    pub fn create(&mut self) -> Entity {
        self.len += 1;
        let entity = if let Some(index) = self.free_list.pop() {
            self.alive[index as usize] = true;
            self.signature_words_mut(index).fill(0);
            Entity {
                index,
                generation: self.generations[index as usize],
            }
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(true);
            self.signatures.resize(self.signatures.len() + self.stride, 0);
            Entity {
                index,
                generation: 0,
            }
        };
        trace!(%entity, "entity created");
        entity
    }

    /// Free an entity's slot and clear its signature. Returns `true` if it was
    /// alive.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let idx = entity.index as usize;
        self.alive[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.signature_words_mut(entity.index).fill(0);
        self.free_list.push(entity.index);
        self.len -= 1;
        trace!(%entity, "entity destroyed");
        true
    }

    /// Pre-allocate room for at least `count` simultaneously live entities.
    pub fn reserve(&mut self, count: usize) {
        let additional = count.saturating_sub(self.generations.len());
        self.generations.reserve(additional);
        self.alive.reserve(additional);
        self.signatures.reserve(additional * self.stride);
    }

    /// Check if an entity is currently alive.
    pub fn is_alive(&self, entity: Entity) -> bool {
        let idx = entity.index as usize;
        idx < self.alive.len() && self.alive[idx] && self.generations[idx] == entity.generation
    }

    /// `Ok` if the entity is alive, [`EcsError::InvalidEntity`] otherwise.
    pub fn ensure_alive(&self, entity: Entity) -> Result<()> {
        if self.is_alive(entity) {
            Ok(())
        } else {
            Err(EcsError::InvalidEntity(entity))
        }
    }

    /// Number of currently alive entities.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether there are no alive entities.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate all alive entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive
            .iter()
            .zip(&self.generations)
            .enumerate()
            .filter(|(_, (alive, _))| **alive)
            .map(|(index, (_, &generation))| Entity {
                index: index as u32,
                generation,
            })
    }

    /// Signature words of slot `index`. Callers validate liveness first.
    pub(crate) fn signature_words(&self, index: u32) -> &[u64] {
        let start = index as usize * self.stride;
        &self.signatures[start..start + self.stride]
    }

    fn signature_words_mut(&mut self, index: u32) -> &mut [u64] {
        let start = index as usize * self.stride;
        &mut self.signatures[start..start + self.stride]
    }

    /// Set a signature bit. Returns `true` if the bit changed.
    pub(crate) fn set_bit(&mut self, index: u32, id: ComponentId) -> bool {
        let (word, mask) = signature::locate(id);
        let words = self.signature_words_mut(index);
        let changed = words[word] & mask == 0;
        words[word] |= mask;
        changed
    }

    /// Clear a signature bit. Returns `true` if the bit changed.
    pub(crate) fn clear_bit(&mut self, index: u32, id: ComponentId) -> bool {
        let (word, mask) = signature::locate(id);
        let words = self.signature_words_mut(index);
        let changed = words[word] & mask != 0;
        words[word] &= !mask;
        changed
    }

    /// Component ids currently set for slot `index`.
    pub(crate) fn component_ids(&self, index: u32) -> impl Iterator<Item = ComponentId> + '_ {
        signature::set_bits(self.signature_words(index)).map(ComponentId::from_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_sequential() {
        let mut table = EntityTable::new(64);
        let e0 = table.create();
        let e1 = table.create();
        assert_eq!(e0.index, 0);
        assert_eq!(e1.index, 1);
        assert_eq!(e0.generation, 0);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn destroy_and_reuse() {
        let mut table = EntityTable::new(64);
        let e0 = table.create();
        assert!(table.destroy(e0));
        let e0_reused = table.create();
        assert_eq!(e0_reused.index, 0);
        assert_eq!(e0_reused.generation, 1);
        assert_ne!(e0, e0_reused);
    }

    #[test]
    fn double_destroy_fails() {
        let mut table = EntityTable::new(64);
        let e = table.create();
        assert!(table.destroy(e));
        assert!(!table.destroy(e));
    }

    #[test]
    fn stale_entity_not_alive() {
        let mut table = EntityTable::new(64);
        let e0 = table.create();
        table.destroy(e0);
        assert!(!table.is_alive(e0));
        assert_eq!(table.ensure_alive(e0), Err(EcsError::InvalidEntity(e0)));
        let e0_new = table.create();
        assert!(table.is_alive(e0_new));
    }

    #[test]
    fn never_issued_entity_is_invalid() {
        let table = EntityTable::new(64);
        assert!(!table.is_alive(Entity::from_raw(7, 0)));
    }

    #[test]
    fn reused_slot_starts_with_empty_signature() {
        let mut table = EntityTable::new(128);
        let e = table.create();
        table.set_bit(e.index, ComponentId::from_index(3));
        table.set_bit(e.index, ComponentId::from_index(100));
        assert_eq!(table.component_ids(e.index).count(), 2);

        table.destroy(e);
        let reused = table.create();
        assert_eq!(reused.index, e.index);
        assert!(table.signature_words(reused.index).iter().all(|&w| w == 0));
    }

    #[test]
    fn bit_changes_are_reported() {
        let mut table = EntityTable::new(8);
        let e = table.create();
        let id = ComponentId::from_index(2);
        assert!(table.set_bit(e.index, id));
        assert!(!table.set_bit(e.index, id));
        assert!(table.clear_bit(e.index, id));
        assert!(!table.clear_bit(e.index, id));
    }

    #[test]
    fn reserve_avoids_reallocation() {
        let mut table = EntityTable::new(64);
        table.reserve(1000);
        let capacity = table.generations.capacity();
        for _ in 0..1000 {
            table.create();
        }
        assert_eq!(table.generations.capacity(), capacity);
        assert_eq!(table.len(), 1000);
    }

    #[test]
    fn iter_skips_dead_slots() {
        let mut table = EntityTable::new(64);
        let a = table.create();
        let b = table.create();
        let c = table.create();
        table.destroy(b);
        assert_eq!(table.iter().collect::<Vec<_>>(), vec![a, c]);
    }
}
