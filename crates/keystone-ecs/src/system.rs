use std::fmt;

use crate::component::ComponentRegistry;
use crate::entity::Entity;
use crate::error::{EcsError, Result};
use crate::manager::EntityManager;
use crate::query::ComponentSet;
use crate::signature::{self, Signature};
use crate::storage::SparseSet;

/// Identifier assigned to a system by [`EntityManager::create_system`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemId(u32);

impl SystemId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SystemId({})", self.0)
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A behavior unit stepped explicitly by the caller.
///
/// Implementors keep the [`SystemId`] handed to them by
/// [`SystemSetup::id`] and use it to reach their managed entities through the
/// manager.
pub trait System {
    fn id(&self) -> SystemId;

    /// Advance one simulation step.
    fn update(&mut self, manager: &mut EntityManager, dt: f32) -> Result<()>;

    /// Entities currently carrying every component this system requires.
    fn managed_entities<'m>(&self, manager: &'m EntityManager) -> Result<&'m [Entity]> {
        manager.managed_entities(self.id())
    }
}

/// Handed to a system's constructor so it can declare its requirement.
///
/// The requirement can only be set here, so it is fixed once the system exists.
pub struct SystemSetup<'a> {
    id: SystemId,
    components: &'a ComponentRegistry,
    requirement: Signature,
}

impl<'a> SystemSetup<'a> {
    pub(crate) fn new(id: SystemId, components: &'a ComponentRegistry) -> Self {
        Self {
            id,
            components,
            requirement: Signature::with_width(components.capacity()),
        }
    }

    /// The id the system will be registered under.
    pub fn id(&self) -> SystemId {
        self.id
    }

    /// Set the requirement to exactly the component types in `Q`, replacing any
    /// earlier declaration. Fails if any of them is unregistered.
    pub fn require<Q: ComponentSet>(&mut self) -> Result<()> {
        let ids = Q::component_ids(self.components)?;
        self.requirement = Signature::from_ids(self.components.capacity(), ids);
        Ok(())
    }

    pub(crate) fn into_requirement(self) -> Signature {
        self.requirement
    }
}

struct SystemSlot {
    name: &'static str,
    requirement: Signature,
    managed: SparseSet<()>,
}

/// Up to `capacity` systems, each with a fixed requirement and an incrementally
/// maintained set of matching entities.
pub(crate) struct SystemRegistry {
    slots: Vec<SystemSlot>,
    capacity: usize,
}

impl SystemRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            capacity,
        }
    }

    /// The id the next system would receive, or a capacity error.
    pub fn next_id(&self) -> Result<SystemId> {
        if self.slots.len() >= self.capacity {
            return Err(EcsError::SystemCapacityExceeded {
                capacity: self.capacity,
            });
        }
        Ok(SystemId(self.slots.len() as u32))
    }

    /// Register a system, seeding its managed set from `(entity, signature)`
    /// pairs of the currently live entities.
    pub fn insert<'w>(
        &mut self,
        name: &'static str,
        requirement: Signature,
        live: impl Iterator<Item = (Entity, &'w [u64])>,
    ) -> SystemId {
        let id = SystemId(self.slots.len() as u32);
        let mut managed = SparseSet::new();
        for (entity, words) in live {
            if signature::contains_all(words, requirement.words()) {
                managed.insert(entity, ());
            }
        }
        self.slots.push(SystemSlot {
            name,
            requirement,
            managed,
        });
        id
    }

    /// Re-evaluate membership of `entity` after its signature changed.
    pub fn refresh(&mut self, entity: Entity, words: &[u64]) {
        for slot in &mut self.slots {
            let matches = signature::contains_all(words, slot.requirement.words());
            let present = slot.managed.contains(entity.index);
            if matches && !present {
                slot.managed.insert(entity, ());
            } else if !matches && present {
                slot.managed.remove(entity.index);
            }
        }
    }

    /// Drop `entity` from every managed set.
    pub fn forget(&mut self, entity: Entity) {
        for slot in &mut self.slots {
            slot.managed.remove(entity.index);
        }
    }

    pub fn managed(&self, id: SystemId) -> Result<&[Entity]> {
        self.slot(id).map(|slot| slot.managed.entities())
    }

    pub fn requirement(&self, id: SystemId) -> Result<&Signature> {
        self.slot(id).map(|slot| &slot.requirement)
    }

    pub fn name(&self, id: SystemId) -> Result<&'static str> {
        self.slot(id).map(|slot| slot.name)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn slot(&self, id: SystemId) -> Result<&SystemSlot> {
        self.slots.get(id.index()).ok_or(EcsError::UnknownSystem(id))
    }
}

/// An ordered list of systems, stepped in insertion order.
///
/// There is no dependency resolution: the caller decides the order by the
/// order systems are added.
pub struct SystemSchedule {
    systems: Vec<Box<dyn System>>,
}

impl SystemSchedule {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
        }
    }

    /// Add a system to the end of the schedule.
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        self.systems.push(Box::new(system));
    }

    /// Step every system in order, stopping at the first error.
    pub fn run_all(&mut self, manager: &mut EntityManager, dt: f32) -> Result<()> {
        for system in &mut self.systems {
            system.update(manager, dt)?;
        }
        Ok(())
    }

    /// Number of systems in the schedule.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

impl Default for SystemSchedule {
    fn default() -> Self {
        Self::new()
    }
}
