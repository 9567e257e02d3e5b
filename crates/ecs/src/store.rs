//! Per-type sparse component storage.
//!
//! Each component type gets its own [`ComponentStore`], a sparse set indexed
//! by entity slot. The world keeps them in a registry behind the
//! [`AnyStore`] trait, which exposes only what `flush` needs without knowing
//! the concrete type.

use std::any::{Any, type_name};

use crate::{EcsError, Entity};

/// Marker for types that can be stored as components.
pub trait Component: 'static {}

impl<T: 'static> Component for T {}

/// Dense array of values plus a sparse index from entity slot to dense row.
///
/// ```text
/// sparse: [None, Some(1), None, Some(0)]   entity index -> dense row
/// dense:  [T(e3), T(e1)]
/// owners: [e3,    e1]
/// ```
///
/// Removal swaps the last row into the hole, so iteration order only changes
/// when this store is structurally mutated.
#[derive(Debug)]
pub struct ComponentStore<T> {
    sparse: Vec<Option<u32>>,
    dense: Vec<T>,
    owners: Vec<Entity>,
}

impl<T> Default for ComponentStore<T> {
    fn default() -> Self {
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
            owners: Vec::new(),
        }
    }
}

impl<T: Component> ComponentStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn row(&self, entity: Entity) -> Option<usize> {
        let row = (*self.sparse.get(entity.index as usize)?)? as usize;
        (self.owners[row] == entity).then_some(row)
    }

    pub fn has(&self, entity: Entity) -> bool {
        self.row(entity).is_some()
    }

    /// Insert a value. Refuses to overwrite: the existing value is kept and
    /// `DuplicateComponent` returned.
    ///
    /// A row left in the same slot by an older generation is dropped first;
    /// a row owned by a newer generation means `entity` is stale.
    pub fn add(&mut self, entity: Entity, value: T) -> Result<&mut T, EcsError> {
        if self.has(entity) {
            return Err(EcsError::DuplicateComponent {
                entity,
                component: type_name::<T>(),
            });
        }
        self.claim_slot(entity)?;
        Ok(self.insert_new(entity, value))
    }

    /// Existing value, or a freshly inserted `T::default()`.
    ///
    /// Panics if a newer generation already owns the slot.
    #[track_caller]
    pub fn get_or_add(&mut self, entity: Entity) -> &mut T
    where
        T: Default,
    {
        if let Some(row) = self.row(entity) {
            return &mut self.dense[row];
        }
        if let Err(err) = self.claim_slot(entity) {
            panic!("{err}");
        }
        self.insert_new(entity, T::default())
    }

    /// Make the slot of `entity` free for it, evicting an older occupant.
    fn claim_slot(&mut self, entity: Entity) -> Result<(), EcsError> {
        let Some(Some(row)) = self.sparse.get(entity.index as usize).copied() else {
            return Ok(());
        };
        let occupant = self.owners[row as usize];
        if occupant.generation > entity.generation {
            return Err(EcsError::StaleEntity(entity));
        }
        self.remove(occupant);
        Ok(())
    }

    fn insert_new(&mut self, entity: Entity, value: T) -> &mut T {
        let slot = entity.index as usize;
        if slot >= self.sparse.len() {
            self.sparse.resize(slot + 1, None);
        }
        let row = self.dense.len();
        self.sparse[slot] = Some(row as u32);
        self.dense.push(value);
        self.owners.push(entity);
        &mut self.dense[row]
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.row(entity).map(|row| &self.dense[row])
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.row(entity).map(|row| &mut self.dense[row])
    }

    /// Erase the entity's value. Absent entities are a no-op.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let row = self.row(entity)?;
        self.sparse[entity.index as usize] = None;
        let value = self.dense.swap_remove(row);
        self.owners.swap_remove(row);
        if let Some(moved) = self.owners.get(row) {
            self.sparse[moved.index as usize] = Some(row as u32);
        }
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Owning entities in dense order.
    pub fn entities(&self) -> &[Entity] {
        &self.owners
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.owners.iter().copied().zip(self.dense.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.owners.iter().copied().zip(self.dense.iter_mut())
    }
}

/// Untyped view of a [`ComponentStore`] held by the world's registry.
pub trait AnyStore: Any {
    /// Drop the entity's row if present.
    fn remove_entity(&mut self, entity: Entity);
    fn contains(&self, entity: Entity) -> bool;
    fn len(&self) -> usize;
    fn component_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> AnyStore for ComponentStore<T> {
    fn remove_entity(&mut self, entity: Entity) {
        self.remove(entity);
    }

    fn contains(&self, entity: Entity) -> bool {
        self.has(entity)
    }

    fn len(&self) -> usize {
        self.dense.len()
    }

    fn component_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub(crate) fn downcast_ref<T: Component>(store: &dyn AnyStore) -> &ComponentStore<T> {
    match store.as_any().downcast_ref() {
        Some(s) => s,
        None => unreachable!("store registered under the wrong type id"),
    }
}

pub(crate) fn downcast_mut<T: Component>(store: &mut dyn AnyStore) -> &mut ComponentStore<T> {
    match store.as_any_mut().downcast_mut() {
        Some(s) => s,
        None => unreachable!("store registered under the wrong type id"),
    }
}
