//! The world: entity lifecycle plus a registry of component stores.
//!
//! # Deferred destruction
//! `destroy` only marks an entity. Its components stay readable and its
//! handle stays valid until `flush`, which strips every store, bumps the slot
//! generation and recycles the slot. Queries skip marked entities, so a
//! system never sees something another system just destroyed.

use std::any::{TypeId, type_name};

use crate::entity::EntityTable;
use crate::query::{QueryParam, RestoreGuard, StoreMap};
use crate::store::{AnyStore, Component, ComponentStore, downcast_mut, downcast_ref};
use crate::{EcsError, Entity};

/// Owns every entity and component of the simulation.
///
/// There is no global instance: the frame driver constructs one and passes
/// it by reference to each system.
#[derive(Default)]
pub struct World {
    entities: EntityTable,
    stores: StoreMap,
    pending_destroy: Vec<Entity>,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut stores: Vec<_> = self
            .stores
            .values()
            .map(|s| (s.component_name(), s.len()))
            .collect();
        stores.sort();
        f.debug_struct("World")
            .field("entities", &self.entities.alive_count())
            .field("pending_destroy", &self.pending_destroy.len())
            .field("stores", &stores)
            .finish()
    }
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Entity lifecycle ---

    /// Allocate a new entity. Always valid; never equal to any live handle.
    pub fn create_entity(&mut self) -> Entity {
        let entity = self.entities.allocate();
        tracing::trace!(%entity, "entity created");
        entity
    }

    /// Schedule `entity` for removal at the next [`flush`](Self::flush).
    ///
    /// Idempotent. Stale handles are ignored.
    pub fn destroy(&mut self, entity: Entity) {
        if self.entities.mark_pending(entity) {
            tracing::trace!(%entity, "entity marked for destruction");
            self.pending_destroy.push(entity);
        }
    }

    /// Free every entity marked by [`destroy`](Self::destroy). Returns how
    /// many were freed; zero pending is a no-op.
    pub fn flush(&mut self) -> usize {
        if self.pending_destroy.is_empty() {
            return 0;
        }
        let pending = std::mem::take(&mut self.pending_destroy);
        for &entity in &pending {
            for store in self.stores.values_mut() {
                store.remove_entity(entity);
            }
            self.entities.free(entity);
        }
        tracing::debug!(freed = pending.len(), "flushed destroyed entities");
        pending.len()
    }

    /// `true` while the handle's generation matches its slot (including
    /// entities marked for destruction but not yet flushed).
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    pub fn is_pending_destroy(&self, entity: Entity) -> bool {
        self.entities.is_pending_destroy(entity)
    }

    /// Number of live entities, pending ones included.
    pub fn entity_count(&self) -> usize {
        self.entities.alive_count()
    }

    /// Number of slots ever allocated.
    pub fn capacity(&self) -> usize {
        self.entities.capacity()
    }

    /// All live entities in slot order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter_alive()
    }

    pub fn check(&self, entity: Entity) -> Result<(), EcsError> {
        if self.entities.is_alive(entity) {
            Ok(())
        } else {
            Err(EcsError::StaleEntity(entity))
        }
    }

    #[track_caller]
    fn expect_alive(&self, entity: Entity) {
        if let Err(err) = self.check(entity) {
            panic!("{err}");
        }
    }

    // --- Stores ---

    pub fn store<T: Component>(&self) -> Option<&ComponentStore<T>> {
        self.stores
            .get(&TypeId::of::<T>())
            .map(|s| downcast_ref(&**s))
    }

    pub fn store_mut<T: Component>(&mut self) -> Option<&mut ComponentStore<T>> {
        self.stores
            .get_mut(&TypeId::of::<T>())
            .map(|s| downcast_mut(&mut **s))
    }

    fn store_or_register<T: Component>(&mut self) -> &mut ComponentStore<T> {
        let store = self.stores.entry(TypeId::of::<T>()).or_insert_with(|| {
            tracing::trace!(component = type_name::<T>(), "registered component store");
            Box::new(ComponentStore::<T>::new())
        });
        downcast_mut(&mut **store)
    }

    // --- Components ---

    /// Attach `value`. Reports `DuplicateComponent` (keeping the existing
    /// value) if the entity already has a `T`.
    pub fn try_add<T: Component>(&mut self, entity: Entity, value: T) -> Result<&mut T, EcsError> {
        self.check(entity)?;
        self.store_or_register::<T>().add(entity, value)
    }

    /// Attach `value`, panicking on a stale handle or an existing `T`.
    #[track_caller]
    pub fn add<T: Component>(&mut self, entity: Entity, value: T) -> &mut T {
        match self.try_add(entity, value) {
            Ok(v) => v,
            Err(err) => panic!("{err}"),
        }
    }

    /// Existing `T`, or a default-constructed one inserted now.
    #[track_caller]
    pub fn get_or_add<T: Component + Default>(&mut self, entity: Entity) -> &mut T {
        self.expect_alive(entity);
        self.store_or_register::<T>().get_or_add(entity)
    }

    /// `None` for stale handles and for entities without a `T`.
    pub fn try_get<T: Component>(&self, entity: Entity) -> Option<&T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.store::<T>()?.get(entity)
    }

    pub fn try_get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.store_mut::<T>()?.get_mut(entity)
    }

    #[track_caller]
    pub fn get<T: Component>(&self, entity: Entity) -> &T {
        self.expect_alive(entity);
        match self.try_get(entity) {
            Some(v) => v,
            None => panic!("{}", missing::<T>(entity)),
        }
    }

    #[track_caller]
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> &mut T {
        self.expect_alive(entity);
        match self.try_get_mut(entity) {
            Some(v) => v,
            None => panic!("{}", missing::<T>(entity)),
        }
    }

    /// Never fails; `false` for stale handles.
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.try_get::<T>(entity).is_some()
    }

    /// Detach and return the entity's `T`. Absent components are a no-op.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.store_mut::<T>()?.remove(entity)
    }

    // --- Queries ---

    /// Run `f` for every live, non-pending entity holding all components of
    /// `Q`, e.g. `world.query::<(&Transform, &mut Velocity)>(|e, (t, v)| ..)`.
    ///
    /// Each matching entity is visited exactly once. Naming the same
    /// component twice in `Q` panics.
    #[track_caller]
    pub fn query<Q: QueryParam>(&mut self, mut f: impl FnMut(Entity, Q::Item<'_>)) {
        assert_distinct::<Q>();
        let Some(mut guard) = RestoreGuard::<Q>::extract(&mut self.stores) else {
            return;
        };
        let Some(extracted) = guard.stores_mut() else {
            return;
        };
        for entity in Q::candidates(extracted) {
            if !self.entities.is_iterable(entity) {
                continue;
            }
            if let Some(item) = Q::fetch(extracted, entity) {
                f(entity, item);
            }
        }
    }

    /// Snapshot of the entities [`query`](Self::query) would visit, for
    /// systems that need the whole world inside their loop.
    pub fn entities_with<Q: QueryParam>(&self) -> Vec<Entity> {
        let ids = Q::type_ids();
        let mut stores: Vec<&dyn AnyStore> = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.stores.get(id) {
                Some(s) => stores.push(&**s),
                None => return Vec::new(),
            }
        }
        let Some(driver) = stores.iter().min_by_key(|s| s.len()) else {
            return Vec::new();
        };
        self.entities
            .iter_alive()
            .filter(|e| driver.contains(*e))
            .filter(|e| self.entities.is_iterable(*e))
            .filter(|e| stores.iter().all(|s| s.contains(*e)))
            .collect()
    }
}

fn missing<T>(entity: Entity) -> EcsError {
    EcsError::MissingComponent {
        entity,
        component: type_name::<T>(),
    }
}

#[track_caller]
fn assert_distinct<Q: QueryParam>() {
    let ids = Q::type_ids();
    for (i, id) in ids.iter().enumerate() {
        assert!(
            !ids[i + 1..].contains(id),
            "query {} names the same component twice",
            type_name::<Q>()
        );
    }
}
