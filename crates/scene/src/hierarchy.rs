//! Parent/child links stored as an intrusive doubly-linked sibling list.
//!
//! ```text
//! parent.first_child -> a <-> b <-> c
//!                       ^prev=None    ^next=None
//! ```
//!
//! Every link is a plain [`Entity`] handle: navigation only, never
//! ownership. Destroying a parent leaves its children pointing at a dead
//! handle until they are re-parented or destroyed themselves;
//! [`destroy_recursive`] is the opt-in cascading policy.
//!
//! [`set_parent`] and [`remove_parent`] are the only mutators. The fields are
//! private so nothing else can break the list.

use glam::Mat4;
use strafe_common::Transform;
use strafe_ecs::{Entity, World};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hierarchy {
    parent: Option<Entity>,
    first_child: Option<Entity>,
    prev_sibling: Option<Entity>,
    next_sibling: Option<Entity>,
}

impl Hierarchy {
    pub fn parent(&self) -> Option<Entity> {
        self.parent
    }

    pub fn first_child(&self) -> Option<Entity> {
        self.first_child
    }

    pub fn prev_sibling(&self) -> Option<Entity> {
        self.prev_sibling
    }

    pub fn next_sibling(&self) -> Option<Entity> {
        self.next_sibling
    }
}

fn links(world: &World, entity: Entity) -> Hierarchy {
    world.try_get::<Hierarchy>(entity).copied().unwrap_or_default()
}

/// Detach `entity` from its parent's child list. No-op without a parent.
///
/// Panics if the list around `entity` is inconsistent.
#[track_caller]
pub fn remove_parent(world: &mut World, entity: Entity) {
    let h = *world.get_or_add::<Hierarchy>(entity);
    let Some(parent) = h.parent else {
        return;
    };

    if world.is_alive(parent) {
        let parent_h = world.get_or_add::<Hierarchy>(parent);
        assert!(
            parent_h.first_child.is_some(),
            "hierarchy corrupted: parent {parent} of {entity} has no children"
        );
        if parent_h.first_child == Some(entity) {
            assert!(
                h.prev_sibling.is_none(),
                "hierarchy corrupted: first child {entity} has a previous sibling"
            );
            parent_h.first_child = h.next_sibling;
        } else {
            let Some(prev) = h.prev_sibling else {
                panic!("hierarchy corrupted: non-first child {entity} has no previous sibling");
            };
            if let Some(prev_h) = world.try_get_mut::<Hierarchy>(prev) {
                prev_h.next_sibling = h.next_sibling;
            }
        }
    } else if let Some(prev) = h.prev_sibling.filter(|p| world.is_alive(*p)) {
        // The parent is gone; keep the surviving siblings chained.
        world.get_mut::<Hierarchy>(prev).next_sibling = h.next_sibling;
    }

    if let Some(next) = h.next_sibling.filter(|n| world.is_alive(*n)) {
        world.get_mut::<Hierarchy>(next).prev_sibling = h.prev_sibling;
    }

    let h = world.get_mut::<Hierarchy>(entity);
    h.parent = None;
    h.prev_sibling = None;
    h.next_sibling = None;
    tracing::trace!(%entity, %parent, "detached from parent");
}

/// Make `entity` the last child of `parent`, detaching it from any previous
/// parent first.
///
/// Panics when the link would create a cycle.
#[track_caller]
pub fn set_parent(world: &mut World, entity: Entity, parent: Entity) {
    assert!(
        entity != parent && !ancestors(world, parent).any(|a| a == entity),
        "cannot parent {entity} under its own descendant {parent}"
    );
    remove_parent(world, entity);

    // A dead link ends the list; the new child is attached in its place.
    let first = world.get_or_add::<Hierarchy>(parent).first_child;
    let first = first.filter(|f| world.is_alive(*f));
    let prev = match first {
        None => {
            world.get_mut::<Hierarchy>(parent).first_child = Some(entity);
            None
        }
        Some(first) => {
            let mut last = first;
            while let Some(next) = links(world, last).next_sibling.filter(|n| world.is_alive(*n)) {
                last = next;
            }
            world.get_or_add::<Hierarchy>(last).next_sibling = Some(entity);
            Some(last)
        }
    };

    let h = world.get_mut::<Hierarchy>(entity);
    h.parent = Some(parent);
    h.prev_sibling = prev;
    h.next_sibling = None;
    tracing::trace!(%entity, %parent, "attached to parent");
}

/// Walks `first_child -> next_sibling`, stopping at the end or at a dead link.
///
/// Siblings after a node flushed without [`detach_and_destroy`] are not
/// reachable; its links went with it.
pub struct Children<'w> {
    world: &'w World,
    next: Option<Entity>,
}

impl Iterator for Children<'_> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        let current = self.next.filter(|e| self.world.is_alive(*e))?;
        self.next = links(self.world, current).next_sibling;
        Some(current)
    }
}

pub fn children(world: &World, parent: Entity) -> Children<'_> {
    Children {
        world,
        next: links(world, parent).first_child,
    }
}

/// Parent, grandparent, ... up to the root or the first dead link.
pub struct Ancestors<'w> {
    world: &'w World,
    next: Option<Entity>,
}

impl Iterator for Ancestors<'_> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        let current = self.next.filter(|e| self.world.is_alive(*e))?;
        self.next = links(self.world, current).parent;
        Some(current)
    }
}

pub fn ancestors(world: &World, entity: Entity) -> Ancestors<'_> {
    Ancestors {
        world,
        next: links(world, entity).parent,
    }
}

/// Local-to-world matrix: the entity's [`Transform`] composed with every
/// ancestor's. Entities without a `Transform` contribute identity.
pub fn world_matrix(world: &World, entity: Entity) -> Mat4 {
    let local = |e: Entity| {
        world
            .try_get::<Transform>(e)
            .map_or(Mat4::IDENTITY, Transform::matrix)
    };
    ancestors(world, entity).fold(local(entity), |m, ancestor| local(ancestor) * m)
}

/// Detach `entity` from its parent, then mark it for destruction. Its
/// children keep pointing at it until they are re-parented.
///
/// Prefer this over a bare [`World::destroy`] for scene nodes: a child
/// flushed while still linked cuts its later siblings off the list.
pub fn detach_and_destroy(world: &mut World, entity: Entity) {
    if !world.is_alive(entity) {
        return;
    }
    remove_parent(world, entity);
    world.destroy(entity);
}

/// Detach `entity` and mark it and all of its descendants for destruction.
pub fn destroy_recursive(world: &mut World, entity: Entity) {
    if !world.is_alive(entity) {
        return;
    }
    remove_parent(world, entity);
    let mut stack = vec![entity];
    while let Some(e) = stack.pop() {
        stack.extend(children(world, e));
        world.destroy(e);
    }
}
