//! Keystone ECS - Entity Component System runtime
//!
//! Component types and systems are registered against an [`EntityManager`] with
//! fixed capacities; entities are generational handles whose signatures route
//! them to every system whose requirement they satisfy.
//! Components live in sparse-set pools for dense iteration, and each system's
//! managed entities are maintained incrementally as signatures change.

mod component;
mod entity;
mod error;
mod manager;
mod query;
mod signature;
mod storage;
mod system;

pub use component::{Component, ComponentId, ComponentRegistry};
pub use entity::{Entity, EntityTable};
pub use error::{EcsError, Result};
pub use keystone_core::EcsConfig;
pub use manager::{Components, EntityManager, SystemView};
pub use query::ComponentSet;
pub use signature::Signature;
pub use storage::SparseSet;
pub use system::{System, SystemId, SystemSchedule, SystemSetup};
