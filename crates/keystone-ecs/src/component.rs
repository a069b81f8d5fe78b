use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::entity::Entity;
use crate::error::{EcsError, Result};
use crate::storage::{ComponentStorage, SparseSet};

/// Marker trait for types that can be stored as ECS components.
pub trait Component: 'static + Send + Sync {}

/// Blanket implementation: any `'static + Send + Sync` type is a valid component.
impl<T: 'static + Send + Sync> Component for T {}

/// Stable identifier of a registered component type, also its signature bit.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u32);

impl ComponentId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

/// Append-only map from component type to [`ComponentId`], owning one pool per
/// registered type. Pools are indexed by id; the `TypeId` lookup happens once
/// per call at the boundary.
pub struct ComponentRegistry {
    ids: HashMap<TypeId, ComponentId>,
    names: Vec<&'static str>,
    pools: Vec<Box<dyn ComponentStorage>>,
    capacity: usize,
}

impl ComponentRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            ids: HashMap::new(),
            names: Vec::new(),
            pools: Vec::new(),
            capacity,
        }
    }

    /// Assign the next id to `T` and allocate its pool.
    pub fn register<T: Component>(&mut self) -> Result<ComponentId> {
        let type_id = TypeId::of::<T>();
        if self.ids.contains_key(&type_id) {
            return Err(EcsError::DuplicateComponent(type_name::<T>()));
        }
        if self.pools.len() >= self.capacity {
            return Err(EcsError::ComponentCapacityExceeded {
                capacity: self.capacity,
            });
        }
        let id = ComponentId::from_index(self.pools.len());
        self.ids.insert(type_id, id);
        self.names.push(type_name::<T>());
        self.pools.push(Box::new(SparseSet::<T>::new()));
        debug!(component = type_name::<T>(), id = id.index(), "registered component type");
        Ok(id)
    }

    /// The id assigned to `T` at registration.
    pub fn id<T: Component>(&self) -> Result<ComponentId> {
        self.ids
            .get(&TypeId::of::<T>())
            .copied()
            .ok_or_else(EcsError::unknown::<T>)
    }

    pub fn is_registered<T: Component>(&self) -> bool {
        self.ids.contains_key(&TypeId::of::<T>())
    }

    /// Type name recorded for `id`, if registered.
    pub fn name(&self, id: ComponentId) -> Option<&'static str> {
        self.names.get(id.index()).copied()
    }

    /// Number of registered component types.
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The pool for `T`.
    pub fn pool<T: Component>(&self) -> Result<&SparseSet<T>> {
        let id = self.id::<T>()?;
        self.pools[id.index()]
            .as_any()
            .downcast_ref::<SparseSet<T>>()
            .ok_or_else(EcsError::unknown::<T>)
    }

    /// Mutable pool for `T`.
    pub fn pool_mut<T: Component>(&mut self) -> Result<&mut SparseSet<T>> {
        let id = self.id::<T>()?;
        self.pools[id.index()]
            .as_any_mut()
            .downcast_mut::<SparseSet<T>>()
            .ok_or_else(EcsError::unknown::<T>)
    }

    /// Borrow several pools mutably at once. Fails if an id repeats.
    pub(crate) fn storages_disjoint_mut<const N: usize>(
        &mut self,
        ids: [ComponentId; N],
    ) -> Result<[&mut Box<dyn ComponentStorage>; N]> {
        self.pools
            .get_disjoint_mut(ids.map(ComponentId::index))
            .map_err(|_| EcsError::AliasedComponents)
    }

    /// Drop the value `entity` holds in pool `id`.
    pub(crate) fn remove_dyn(&mut self, id: ComponentId, entity: Entity) -> bool {
        self.pools
            .get_mut(id.index())
            .is_some_and(|pool| pool.remove_index(entity.index))
    }

    pub(crate) fn has_dyn(&self, id: ComponentId, entity: Entity) -> bool {
        self.pools
            .get(id.index())
            .is_some_and(|pool| pool.has_index(entity.index))
    }

    /// Number of values stored in pool `id`.
    pub fn pool_len(&self, id: ComponentId) -> usize {
        self.pools.get(id.index()).map_or(0, |pool| pool.len())
    }
}
