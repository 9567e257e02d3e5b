use serde::{Deserialize, Serialize};
use std::fmt;

/// Generation-checked handle to a row in the [`World`](crate::World).
///
/// A handle is only meaningful while its generation matches the slot's
/// current generation. After the entity is flushed the slot's generation is
/// bumped, so every copy of the old handle reads as "does not exist".
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl Entity {
    /// The "no entity" sentinel. Never alive in any world.
    pub const NULL: Self = Self {
        index: u32::MAX,
        generation: 0,
    };

    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }

    pub fn is_null(self) -> bool {
        self.index == u32::MAX
    }

    /// `None` for the sentinel, `Some(self)` otherwise.
    pub fn to_option(self) -> Option<Entity> {
        if self.is_null() { None } else { Some(self) }
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Entity(null)")
        } else {
            write!(f, "Entity({}v{})", self.index, self.generation)
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "{}v{}", self.index, self.generation)
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    alive: bool,
    pending_destroy: bool,
}

/// Slot table: one generation per slot ever allocated plus a free list.
///
/// ```text
/// slots:     [g0 alive, g1 free, g0 alive(pending), g2 free]
/// free_list: [1, 3]
/// ```
///
/// Allocation pops the free list before growing. Freeing bumps the
/// generation, which is what invalidates outstanding handles.
#[derive(Debug, Default)]
pub(crate) struct EntityTable {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    alive: usize,
}

impl EntityTable {
    pub fn allocate(&mut self) -> Entity {
        self.alive += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.alive = true;
            slot.pending_destroy = false;
            return Entity {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        assert!(index != u32::MAX, "entity table exhausted");
        self.slots.push(Slot {
            generation: 0,
            alive: true,
            pending_destroy: false,
        });
        Entity {
            index,
            generation: 0,
        }
    }

    fn slot(&self, entity: Entity) -> Option<&Slot> {
        self.slots
            .get(entity.index as usize)
            .filter(|s| s.alive && s.generation == entity.generation)
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.slot(entity).is_some()
    }

    pub fn is_pending_destroy(&self, entity: Entity) -> bool {
        self.slot(entity).is_some_and(|s| s.pending_destroy)
    }

    /// Alive and not scheduled for destruction.
    pub fn is_iterable(&self, entity: Entity) -> bool {
        self.slot(entity).is_some_and(|s| !s.pending_destroy)
    }

    /// Returns `true` if the entity was newly marked.
    pub fn mark_pending(&mut self, entity: Entity) -> bool {
        match self.slots.get_mut(entity.index as usize) {
            Some(slot) if slot.alive && slot.generation == entity.generation => {
                let newly = !slot.pending_destroy;
                slot.pending_destroy = true;
                newly
            }
            _ => false,
        }
    }

    pub fn free(&mut self, entity: Entity) {
        let Some(slot) = self.slots.get_mut(entity.index as usize) else {
            return;
        };
        if !slot.alive || slot.generation != entity.generation {
            return;
        }
        slot.alive = false;
        slot.pending_destroy = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(entity.index);
        self.alive -= 1;
    }

    pub fn alive_count(&self) -> usize {
        self.alive
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn iter_alive(&self) -> impl Iterator<Item = Entity> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.alive.then_some(Entity {
                index: i as u32,
                generation: s.generation,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_is_falsy() {
        assert!(Entity::NULL.is_null());
        assert_eq!(Entity::default(), Entity::NULL);
        assert_eq!(Entity::NULL.to_option(), None);
        assert_eq!(format!("{:?}", Entity::NULL), "Entity(null)");
    }

    #[test]
    fn allocate_fresh_slots() {
        let mut table = EntityTable::default();
        let a = table.allocate();
        let b = table.allocate();
        assert_ne!(a, b);
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert!(table.is_alive(a));
        assert_eq!(table.alive_count(), 2);
    }

    #[test]
    fn free_bumps_generation_and_recycles() {
        let mut table = EntityTable::default();
        let a = table.allocate();
        table.free(a);
        assert!(!table.is_alive(a));

        let b = table.allocate();
        assert_eq!(b.index(), a.index());
        assert_eq!(b.generation(), a.generation() + 1);
        assert!(table.is_alive(b));
        assert!(!table.is_alive(a));
    }

    #[test]
    fn pending_entities_are_alive_but_not_iterable() {
        let mut table = EntityTable::default();
        let a = table.allocate();
        assert!(table.mark_pending(a));
        assert!(!table.mark_pending(a));
        assert!(table.is_alive(a));
        assert!(table.is_pending_destroy(a));
        assert!(!table.is_iterable(a));
    }

    #[test]
    fn stale_and_null_handles_are_dead() {
        let mut table = EntityTable::default();
        let a = table.allocate();
        table.free(a);
        table.free(a);
        assert_eq!(table.alive_count(), 0);
        assert!(!table.mark_pending(a));
        assert!(!table.is_alive(Entity::NULL));
    }

    #[test]
    fn display_format() {
        let e = Entity {
            index: 3,
            generation: 2,
        };
        assert_eq!(e.to_string(), "3v2");
        assert_eq!(format!("{e:?}"), "Entity(3v2)");
    }
}
