use std::any::type_name;

use keystone_core::EcsConfig;
use tracing::debug;

use crate::component::{Component, ComponentId, ComponentRegistry};
use crate::entity::{Entity, EntityTable};
use crate::error::{EcsError, Result};
use crate::query::ComponentSet;
use crate::signature::Signature;
use crate::storage::SparseSet;
use crate::system::{SystemId, SystemRegistry, SystemSetup};

/// The central ECS container. Owns the component registry and pools, the entity
/// table and the system registry, and routes every access between them.
///
/// Component types and systems are registered up front; entities come and go
/// during steady-state use.
pub struct EntityManager {
    entities: EntityTable,
    components: ComponentRegistry,
    systems: SystemRegistry,
}

impl EntityManager {
    /// A manager accepting up to `max_component_types` component types and
    /// `max_system_types` systems.
    pub fn new(max_component_types: usize, max_system_types: usize) -> Self {
        Self {
            entities: EntityTable::new(max_component_types),
            components: ComponentRegistry::new(max_component_types),
            systems: SystemRegistry::new(max_system_types),
        }
    }

    /// Build a manager from config and apply its initial entity reservation.
    pub fn from_config(config: &EcsConfig) -> Self {
        let mut manager = Self::new(config.max_component_types, config.max_system_types);
        if config.initial_entity_capacity > 0 {
            manager.reserve(config.initial_entity_capacity);
        }
        manager
    }

    // ---- Registration ----

    /// Assign `T` the next component id and allocate its pool.
    pub fn register_component<T: Component>(&mut self) -> Result<ComponentId> {
        self.components.register::<T>()
    }

    /// The id `T` was registered under.
    pub fn component_id<T: Component>(&self) -> Result<ComponentId> {
        self.components.id::<T>()
    }

    /// Number of registered component types.
    pub fn component_type_count(&self) -> usize {
        self.components.len()
    }

    pub fn component_capacity(&self) -> usize {
        self.components.capacity()
    }

    /// Construct and register a system.
    ///
    /// `build` receives a [`SystemSetup`] carrying the new system's id and must
    /// declare the requirement through it. Nothing is registered if `build`
    /// fails. Entities that already match are managed immediately.
    ///
    /// # Example
    /// ```ignore
    /// let physics = manager.create_system(|setup| {
    ///     setup.require::<(Position, Velocity)>()?;
    ///     Ok(PhysicsSystem { id: setup.id() })
    /// })?;
    /// ```
    pub fn create_system<S, F>(&mut self, build: F) -> Result<S>
    where
        F: FnOnce(&mut SystemSetup<'_>) -> Result<S>,
    {
        let id = self.systems.next_id()?;
        let mut setup = SystemSetup::new(id, &self.components);
        let system = build(&mut setup)?;
        let requirement = setup.into_requirement();
        debug!(
            system = type_name::<S>(),
            %id,
            requirement = ?requirement,
            "created system"
        );

        let entities = &self.entities;
        let live = entities
            .iter()
            .map(|entity| (entity, entities.signature_words(entity.index)));
        self.systems.insert(type_name::<S>(), requirement, live);
        Ok(system)
    }

    /// Number of created systems.
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    pub fn system_capacity(&self) -> usize {
        self.systems.capacity()
    }

    /// The requirement `id` declared at construction.
    pub fn system_requirement(&self, id: SystemId) -> Result<&Signature> {
        self.systems.requirement(id)
    }

    /// Type name of the system registered as `id`.
    pub fn system_name(&self, id: SystemId) -> Result<&'static str> {
        self.systems.name(id)
    }

    // ---- Entity management ----

    /// Create a new entity with an empty signature.
    pub fn create_entity(&mut self) -> Entity {
        let entity = self.entities.create();
        // Systems with an empty requirement match the empty signature.
        self.systems
            .refresh(entity, self.entities.signature_words(entity.index));
        entity
    }

    /// Destroy an entity: its components are dropped from every pool, it leaves
    /// every system, and the handle becomes invalid.
    pub fn destroy_entity(&mut self, entity: Entity) -> Result<()> {
        self.entities.ensure_alive(entity)?;
        for id in self.entities.component_ids(entity.index) {
            self.components.remove_dyn(id, entity);
        }
        self.systems.forget(entity);
        self.entities.destroy(entity);
        Ok(())
    }

    /// Pre-allocate room for `count` simultaneously live entities.
    pub fn reserve(&mut self, count: usize) {
        debug!(count, "reserving entity capacity");
        self.entities.reserve(count);
    }

    /// Check whether an entity is alive.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of alive entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// A copy of the entity's current signature.
    pub fn signature(&self, entity: Entity) -> Result<Signature> {
        self.entities.ensure_alive(entity)?;
        Ok(Signature::from_words(
            self.entities.signature_words(entity.index),
        ))
    }

    // ---- Component management ----

    /// Attach a component, replacing any existing one of the same type.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> Result<()> {
        self.entities.ensure_alive(entity)?;
        let id = self.components.id::<T>()?;
        self.components.pool_mut::<T>()?.insert(entity, component);
        if self.entities.set_bit(entity.index, id) {
            self.systems
                .refresh(entity, self.entities.signature_words(entity.index));
        }
        Ok(())
    }

    /// Detach a component. Returns the removed value, or `None` if the entity
    /// did not carry one.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<Option<T>> {
        self.entities.ensure_alive(entity)?;
        let id = self.components.id::<T>()?;
        let removed = self.components.pool_mut::<T>()?.remove(entity.index);
        if self.entities.clear_bit(entity.index, id) {
            self.systems
                .refresh(entity, self.entities.signature_words(entity.index));
        }
        Ok(removed)
    }

    /// Check whether an entity has a component of the given type. Dead
    /// entities and unregistered types have nothing.
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
            && self
                .components
                .id::<T>()
                .is_ok_and(|id| self.components.has_dyn(id, entity))
    }

    /// Get an immutable reference to a component on an entity.
    pub fn get_component<T: Component>(&self, entity: Entity) -> Result<&T> {
        self.entities.ensure_alive(entity)?;
        self.components
            .pool::<T>()?
            .get(entity.index)
            .ok_or_else(|| EcsError::missing::<T>(entity))
    }

    /// Get a mutable reference to a component on an entity.
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T> {
        self.entities.ensure_alive(entity)?;
        self.components
            .pool_mut::<T>()?
            .get_mut(entity.index)
            .ok_or_else(|| EcsError::missing::<T>(entity))
    }

    /// Get references to several components at once, e.g.
    /// `get_components::<(Position, Velocity)>(entity)`.
    pub fn get_components<Q: ComponentSet>(&self, entity: Entity) -> Result<Q::Refs<'_>> {
        self.entities.ensure_alive(entity)?;
        Q::fetch(&self.components, entity)
    }

    /// Mutable counterpart of [`get_components`](Self::get_components).
    pub fn get_components_mut<Q: ComponentSet>(&mut self, entity: Entity) -> Result<Q::Muts<'_>> {
        self.entities.ensure_alive(entity)?;
        Q::fetch_mut(&mut self.components, entity)
    }

    /// Iterate every `(entity, &T)` in the pool for `T`.
    pub fn iter<T: Component>(&self) -> Result<impl Iterator<Item = (Entity, &T)>> {
        Ok(self.components.pool::<T>()?.iter())
    }

    /// Iterate every `(entity, &mut T)` in the pool for `T`.
    pub fn iter_mut<T: Component>(&mut self) -> Result<impl Iterator<Item = (Entity, &mut T)>> {
        Ok(self.components.pool_mut::<T>()?.iter_mut())
    }

    /// The packed pool for `T`.
    pub fn pool<T: Component>(&self) -> Result<&SparseSet<T>> {
        self.components.pool::<T>()
    }

    // ---- Systems ----

    /// Entities whose signature contains everything system `id` requires.
    pub fn managed_entities(&self, id: SystemId) -> Result<&[Entity]> {
        self.systems.managed(id)
    }

    /// Split the manager into system `id`'s managed entities and a component
    /// accessor, so a step can walk its entities while mutating components.
    ///
    /// # Example
    /// ```ignore
    /// let SystemView { entities, mut components } = manager.system_view(self.id)?;
    /// for &entity in entities {
    ///     let (position, velocity) = components.get_components_mut::<(Position, Velocity)>(entity)?;
    ///     position.x += velocity.x * dt;
    /// }
    /// ```
    pub fn system_view(&mut self, id: SystemId) -> Result<SystemView<'_>> {
        Ok(SystemView {
            entities: self.systems.managed(id)?,
            components: Components {
                entities: &self.entities,
                registry: &mut self.components,
            },
        })
    }
}

/// A system's managed entities alongside component access for one step.
///
/// Structural changes (creating entities, adding or removing components) are
/// not possible through a view, so the entity slice cannot change under it.
pub struct SystemView<'a> {
    pub entities: &'a [Entity],
    pub components: Components<'a>,
}

/// Component read/write access without structural mutation.
pub struct Components<'a> {
    entities: &'a EntityTable,
    registry: &'a mut ComponentRegistry,
}

impl Components<'_> {
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
            && self
                .registry
                .id::<T>()
                .is_ok_and(|id| self.registry.has_dyn(id, entity))
    }

    pub fn get_component<T: Component>(&self, entity: Entity) -> Result<&T> {
        self.entities.ensure_alive(entity)?;
        self.registry
            .pool::<T>()?
            .get(entity.index)
            .ok_or_else(|| EcsError::missing::<T>(entity))
    }

    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T> {
        self.entities.ensure_alive(entity)?;
        self.registry
            .pool_mut::<T>()?
            .get_mut(entity.index)
            .ok_or_else(|| EcsError::missing::<T>(entity))
    }

    pub fn get_components<Q: ComponentSet>(&self, entity: Entity) -> Result<Q::Refs<'_>> {
        self.entities.ensure_alive(entity)?;
        Q::fetch(self.registry, entity)
    }

    pub fn get_components_mut<Q: ComponentSet>(&mut self, entity: Entity) -> Result<Q::Muts<'_>> {
        self.entities.ensure_alive(entity)?;
        Q::fetch_mut(self.registry, entity)
    }
}
