use crate::component::{Component, ComponentId, ComponentRegistry};
use crate::entity::Entity;
use crate::error::{EcsError, Result};
use crate::storage::SparseSet;

/// A fixed-arity tuple of component types fetched together, e.g.
/// `(Position, Velocity)`.
///
/// Fetching succeeds or fails as a unit: if the entity lacks any one of the
/// types, nothing is returned. Callers validate the entity handle first.
pub trait ComponentSet {
    /// Shared references to each component, in tuple order.
    type Refs<'a>;
    /// Exclusive references to each component, in tuple order.
    type Muts<'a>;

    /// Ids of the member types, in tuple order.
    fn component_ids(registry: &ComponentRegistry) -> Result<Vec<ComponentId>>;

    fn fetch(registry: &ComponentRegistry, entity: Entity) -> Result<Self::Refs<'_>>;

    /// Fails with [`EcsError::AliasedComponents`] if a type appears twice.
    fn fetch_mut(registry: &mut ComponentRegistry, entity: Entity) -> Result<Self::Muts<'_>>;
}

macro_rules! impl_component_set {
    ($($name:ident => $slot:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            type Refs<'a> = ($(&'a $name,)+);
            type Muts<'a> = ($(&'a mut $name,)+);

            fn component_ids(registry: &ComponentRegistry) -> Result<Vec<ComponentId>> {
                Ok(vec![$(registry.id::<$name>()?),+])
            }

            fn fetch(registry: &ComponentRegistry, entity: Entity) -> Result<Self::Refs<'_>> {
                Ok(($(
                    registry
                        .pool::<$name>()?
                        .get(entity.index)
                        .ok_or_else(|| EcsError::missing::<$name>(entity))?,
                )+))
            }

            fn fetch_mut(
                registry: &mut ComponentRegistry,
                entity: Entity,
            ) -> Result<Self::Muts<'_>> {
                let ids = [$(registry.id::<$name>()?),+];
                let [$($slot),+] = registry.storages_disjoint_mut(ids)?;
                Ok(($(
                    $slot
                        .as_any_mut()
                        .downcast_mut::<SparseSet<$name>>()
                        .ok_or_else(EcsError::unknown::<$name>)?
                        .get_mut(entity.index)
                        .ok_or_else(|| EcsError::missing::<$name>(entity))?,
                )+))
            }
        }
    };
}

impl_component_set!(A => a);
impl_component_set!(A => a, B => b);
impl_component_set!(A => a, B => b, C => c);
impl_component_set!(A => a, B => b, C => c, D => d);
impl_component_set!(A => a, B => b, C => c, D => d, E => e);
impl_component_set!(A => a, B => b, C => c, D => d, E => e, F => f);
impl_component_set!(A => a, B => b, C => c, D => d, E => e, F => f, G => g);
impl_component_set!(A => a, B => b, C => c, D => d, E => e, F => f, G => g, H => h);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Position(f32);
    #[derive(Debug, PartialEq)]
    struct Velocity(f32);
    #[derive(Debug, PartialEq)]
    struct Mass(f32);

    fn registry_with_entity() -> (ComponentRegistry, Entity) {
        let mut registry = ComponentRegistry::new(8);
        registry.register::<Position>().unwrap();
        registry.register::<Velocity>().unwrap();
        registry.register::<Mass>().unwrap();
        let entity = Entity::from_raw(3, 0);
        registry.pool_mut::<Position>().unwrap().insert(entity, Position(1.0));
        registry.pool_mut::<Velocity>().unwrap().insert(entity, Velocity(2.0));
        (registry, entity)
    }

    #[test]
    fn fetch_pair() {
        let (registry, entity) = registry_with_entity();
        let (pos, vel) = <(Position, Velocity)>::fetch(&registry, entity).unwrap();
        assert_eq!(pos, &Position(1.0));
        assert_eq!(vel, &Velocity(2.0));
    }

    #[test]
    fn fetch_mut_writes_through() {
        let (mut registry, entity) = registry_with_entity();
        {
            let (pos, vel) = <(Position, Velocity)>::fetch_mut(&mut registry, entity).unwrap();
            pos.0 += vel.0;
        }
        assert_eq!(
            registry.pool::<Position>().unwrap().get(entity.index),
            Some(&Position(3.0))
        );
    }

    #[test]
    fn missing_member_fails_as_unit() {
        let (mut registry, entity) = registry_with_entity();
        let err = <(Position, Mass)>::fetch(&registry, entity).unwrap_err();
        assert!(matches!(err, EcsError::MissingComponent { component, .. } if component.ends_with("Mass")));
        assert!(<(Position, Mass)>::fetch_mut(&mut registry, entity).is_err());
    }

    #[test]
    fn repeated_type_is_rejected_for_mutation() {
        let (mut registry, entity) = registry_with_entity();
        assert!(<(Position, Position)>::fetch(&registry, entity).is_ok());
        assert_eq!(
            <(Position, Position)>::fetch_mut(&mut registry, entity).err(),
            Some(EcsError::AliasedComponents)
        );
    }

    #[test]
    fn ids_follow_tuple_order() {
        let (registry, _) = registry_with_entity();
        let ids = <(Mass, Position)>::component_ids(&registry).unwrap();
        assert_eq!(ids.iter().map(|id| id.index()).collect::<Vec<_>>(), vec![2, 0]);
    }
}
