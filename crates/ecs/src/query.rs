//! Closure-based multi-component iteration.
//!
//! ```text
//! world.query::<(&Transform, &mut Velocity)>(|entity, (transform, velocity)| {
//!     // ...
//! });
//! ```
//!
//! The named stores are taken out of the world's registry for the duration
//! of the call, which gives each one an independent `&mut` borrow without
//! `unsafe`, and put back afterwards, also when the closure panics. The
//! closure cannot reach the world, so it cannot add or remove components of
//! a type being iterated.

use std::any::TypeId;
use std::collections::HashMap;
use std::marker::PhantomData;

use crate::Entity;
use crate::store::{AnyStore, Component, ComponentStore, downcast_mut, downcast_ref};

pub type StoreMap = HashMap<TypeId, Box<dyn AnyStore>>;

/// A store taken out of the registry, remembering its component type.
pub struct Extracted<T> {
    store: Box<dyn AnyStore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Component> Extracted<T> {
    fn typed(&self) -> &ComponentStore<T> {
        downcast_ref(&*self.store)
    }

    fn typed_mut(&mut self) -> &mut ComponentStore<T> {
        downcast_mut(&mut *self.store)
    }
}

/// Something that can be fetched per entity: `&T`, `&mut T`, or a tuple of
/// those.
pub trait QueryParam {
    type Item<'w>;
    type Stores;

    fn type_ids() -> Vec<TypeId>;

    /// Take the needed stores out of the registry. `None` (with nothing
    /// taken) if any of them has never been registered.
    fn extract(stores: &mut StoreMap) -> Option<Self::Stores>;

    fn restore(extracted: Self::Stores, stores: &mut StoreMap);

    /// Owners of the smallest extracted store; every match is among them.
    fn candidates(extracted: &Self::Stores) -> Vec<Entity>;

    fn fetch(extracted: &mut Self::Stores, entity: Entity) -> Option<Self::Item<'_>>;
}

/// Holds stores taken out of the registry and puts them back on drop, so a
/// panicking query closure still leaves the world intact.
pub(crate) struct RestoreGuard<'a, Q: QueryParam> {
    stores: &'a mut StoreMap,
    extracted: Option<Q::Stores>,
}

impl<'a, Q: QueryParam> RestoreGuard<'a, Q> {
    pub(crate) fn extract(stores: &'a mut StoreMap) -> Option<Self> {
        let extracted = Q::extract(stores)?;
        Some(Self {
            stores,
            extracted: Some(extracted),
        })
    }

    pub(crate) fn stores_mut(&mut self) -> Option<&mut Q::Stores> {
        self.extracted.as_mut()
    }
}

impl<Q: QueryParam> Drop for RestoreGuard<'_, Q> {
    fn drop(&mut self) {
        if let Some(extracted) = self.extracted.take() {
            Q::restore(extracted, self.stores);
        }
    }
}

fn take<T: Component>(stores: &mut StoreMap) -> Option<Extracted<T>> {
    stores.remove(&TypeId::of::<T>()).map(|store| Extracted {
        store,
        _marker: PhantomData,
    })
}

impl<T: Component> QueryParam for &T {
    type Item<'w> = &'w T;
    type Stores = Extracted<T>;

    fn type_ids() -> Vec<TypeId> {
        vec![TypeId::of::<T>()]
    }

    fn extract(stores: &mut StoreMap) -> Option<Self::Stores> {
        take::<T>(stores)
    }

    fn restore(extracted: Self::Stores, stores: &mut StoreMap) {
        stores.insert(TypeId::of::<T>(), extracted.store);
    }

    fn candidates(extracted: &Self::Stores) -> Vec<Entity> {
        extracted.typed().entities().to_vec()
    }

    fn fetch(extracted: &mut Self::Stores, entity: Entity) -> Option<Self::Item<'_>> {
        extracted.typed().get(entity)
    }
}

impl<T: Component> QueryParam for &mut T {
    type Item<'w> = &'w mut T;
    type Stores = Extracted<T>;

    fn type_ids() -> Vec<TypeId> {
        vec![TypeId::of::<T>()]
    }

    fn extract(stores: &mut StoreMap) -> Option<Self::Stores> {
        take::<T>(stores)
    }

    fn restore(extracted: Self::Stores, stores: &mut StoreMap) {
        stores.insert(TypeId::of::<T>(), extracted.store);
    }

    fn candidates(extracted: &Self::Stores) -> Vec<Entity> {
        extracted.typed().entities().to_vec()
    }

    fn fetch(extracted: &mut Self::Stores, entity: Entity) -> Option<Self::Item<'_>> {
        extracted.typed_mut().get_mut(entity)
    }
}

macro_rules! impl_query_param_tuple {
    ($($P:ident),+) => {
        impl<$($P: QueryParam),+> QueryParam for ($($P,)+) {
            type Item<'w> = ($($P::Item<'w>,)+);
            type Stores = ($($P::Stores,)+);

            fn type_ids() -> Vec<TypeId> {
                let mut ids = Vec::new();
                $(ids.extend($P::type_ids());)+
                ids
            }

            #[allow(non_snake_case)]
            fn extract(stores: &mut StoreMap) -> Option<Self::Stores> {
                $(let $P = $P::extract(stores);)+
                if true $(&& $P.is_some())+ {
                    Some(($($P?,)+))
                } else {
                    $(if let Some(s) = $P {
                        $P::restore(s, stores);
                    })+
                    None
                }
            }

            #[allow(non_snake_case)]
            fn restore(extracted: Self::Stores, stores: &mut StoreMap) {
                let ($($P,)+) = extracted;
                $($P::restore($P, stores);)+
            }

            #[allow(non_snake_case)]
            fn candidates(extracted: &Self::Stores) -> Vec<Entity> {
                let ($($P,)+) = extracted;
                let mut best: Option<Vec<Entity>> = None;
                $(
                    let c = $P::candidates($P);
                    if best.as_ref().is_none_or(|b| c.len() < b.len()) {
                        best = Some(c);
                    }
                )+
                best.unwrap_or_default()
            }

            #[allow(non_snake_case)]
            fn fetch(extracted: &mut Self::Stores, entity: Entity) -> Option<Self::Item<'_>> {
                let ($($P,)+) = extracted;
                Some(($($P::fetch($P, entity)?,)+))
            }
        }
    };
}

impl_query_param_tuple!(A);
impl_query_param_tuple!(A, B);
impl_query_param_tuple!(A, B, C);
impl_query_param_tuple!(A, B, C, D);
impl_query_param_tuple!(A, B, C, D, E);
