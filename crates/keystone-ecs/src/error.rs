use std::any::type_name;

use crate::entity::Entity;
use crate::system::SystemId;

/// Errors returned by the entity manager and its registries.
///
/// Every variant is a contract violation by the caller; none are transient.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    #[error("component capacity exceeded: at most {capacity} component types can be registered")]
    ComponentCapacityExceeded { capacity: usize },

    #[error("system capacity exceeded: at most {capacity} systems can be created")]
    SystemCapacityExceeded { capacity: usize },

    #[error("component type `{0}` is already registered")]
    DuplicateComponent(&'static str),

    #[error("component type `{0}` is not registered")]
    UnknownComponent(&'static str),

    #[error("entity {0} is not alive")]
    InvalidEntity(Entity),

    #[error("entity {entity} has no `{component}` component")]
    MissingComponent {
        entity: Entity,
        component: &'static str,
    },

    #[error("system {0} was not created by this manager")]
    UnknownSystem(SystemId),

    #[error("the same component type was requested more than once for mutable access")]
    AliasedComponents,
}

impl EcsError {
    pub(crate) fn unknown<T: 'static>() -> Self {
        Self::UnknownComponent(type_name::<T>())
    }

    pub(crate) fn missing<T: 'static>(entity: Entity) -> Self {
        Self::MissingComponent {
            entity,
            component: type_name::<T>(),
        }
    }
}

pub type Result<T, E = EcsError> = std::result::Result<T, E>;
