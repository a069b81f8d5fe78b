use std::any::Any;

use crate::entity::Entity;

const EMPTY: u32 = u32::MAX;

/// Type-erased view of a component pool, used where the concrete type is only
/// known by its [`ComponentId`](crate::ComponentId).
pub(crate) trait ComponentStorage: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Drop the value stored for slot `index`. Returns `true` if one existed.
    fn remove_index(&mut self, index: u32) -> bool;
    fn has_index(&self, index: u32) -> bool;
    fn len(&self) -> usize;
}

/// Sparse-set storage keyed by entity slot. O(1) insert/remove/lookup, with
/// values packed densely for sequential iteration.
///
/// Removal swaps the last value into the hole, so dense order only changes on
/// removal and the moved entity's sparse entry is patched in place.
pub struct SparseSet<T> {
    /// Entity slot -> dense index, `EMPTY` when absent.
    sparse: Vec<u32>,
    dense: Vec<T>,
    /// Owning entity of each dense slot.
    entities: Vec<Entity>,
}

impl<T> SparseSet<T> {
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
            entities: Vec::new(),
        }
    }

    /// Insert or replace the value for `entity`. Returns the previous value.
    pub fn insert(&mut self, entity: Entity, value: T) -> Option<T> {
        let idx = entity.index as usize;
        if idx >= self.sparse.len() {
            self.sparse.resize(idx + 1, EMPTY);
        }
        match self.sparse[idx] {
            EMPTY => {
                self.sparse[idx] = self.dense.len() as u32;
                self.dense.push(value);
                self.entities.push(entity);
                None
            }
            dense_idx => {
                self.entities[dense_idx as usize] = entity;
                Some(std::mem::replace(&mut self.dense[dense_idx as usize], value))
            }
        }
    }

    /// Remove and return the value for the given entity slot.
    pub fn remove(&mut self, index: u32) -> Option<T> {
        let dense_idx = self.dense_index(index)?;
        self.sparse[index as usize] = EMPTY;

        let value = self.dense.swap_remove(dense_idx);
        self.entities.swap_remove(dense_idx);
        if let Some(moved) = self.entities.get(dense_idx) {
            self.sparse[moved.index as usize] = dense_idx as u32;
        }
        Some(value)
    }

    pub fn get(&self, index: u32) -> Option<&T> {
        self.dense_index(index).map(|d| &self.dense[d])
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        self.dense_index(index).map(|d| &mut self.dense[d])
    }

    pub fn contains(&self, index: u32) -> bool {
        self.dense_index(index).is_some()
    }

    /// Iterate all (entity, &value) pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.dense.iter())
    }

    /// Iterate all (entity, &mut value) pairs in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.entities.iter().copied().zip(self.dense.iter_mut())
    }

    /// Entities that have a value, in dense order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// The packed values, parallel to [`entities`](Self::entities).
    pub fn values(&self) -> &[T] {
        &self.dense
    }

    /// Number of values stored.
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    fn dense_index(&self, index: u32) -> Option<usize> {
        match self.sparse.get(index as usize) {
            Some(&d) if d != EMPTY => Some(d as usize),
            _ => None,
        }
    }
}

impl<T> Default for SparseSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static + Send + Sync> ComponentStorage for SparseSet<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn remove_index(&mut self, index: u32) -> bool {
        self.remove(index).is_some()
    }

    fn has_index(&self, index: u32) -> bool {
        self.contains(index)
    }

    fn len(&self) -> usize {
        self.dense.len()
    }
}
