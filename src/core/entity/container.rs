//=========================================================================
// Entity Container
//=========================================================================
//
// Owns a scene's entities, keyed by id.
//
// Entities are kept in id order so rendering layers deterministically.
// Destruction is deferred: a flagged entity is removed during the next
// update pass, in place of receiving that update.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::BTreeMap;

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use super::Entity;
use crate::core::render::ResourceGraph;
use crate::core::scene::SceneContext;

//=== EntityContainer =====================================================

/// Id-keyed owner of boxed entities.
#[derive(Default)]
pub struct EntityContainer {
    entities: BTreeMap<String, Box<dyn Entity>>,
}

impl EntityContainer {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    //--- Membership -------------------------------------------------------

    /// Runs the entity's `setup` and takes ownership of it.
    ///
    /// An id already in use is rejected and the new entity is dropped.
    pub fn add(&mut self, id: impl Into<String>, mut entity: Box<dyn Entity>) -> bool {
        let id = id.into();
        if self.entities.contains_key(&id) {
            warn!(target: "scene", "Entity id \"{id}\" already in use, new entity rejected");
            return false;
        }

        entity.setup();
        self.entities.insert(id, entity);
        true
    }

    /// Boxes and adds `entity`.
    pub fn spawn<E: Entity + 'static>(&mut self, id: impl Into<String>, entity: E) -> bool {
        self.add(id, Box::new(entity))
    }

    /// Drops the entity with `id`. Returns `false` if there was none.
    pub fn remove(&mut self, id: &str) -> bool {
        self.entities.remove(id).is_some()
    }

    /// Drops every entity.
    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Returns the entity stored under `id`.
    pub fn get(&self, id: &str) -> Option<&dyn Entity> {
        self.entities.get(id).map(|entity| entity.as_ref())
    }

    /// Returns the entity stored under `id` mutably.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut (dyn Entity + 'static)> {
        self.entities.get_mut(id).map(|entity| entity.as_mut())
    }

    /// Returns `true` if an entity is stored under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    /// Returns the number of entities, including those pending destruction.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if the container holds no entity.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entity ids in render order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    //--- Frame ------------------------------------------------------------

    /// Removes flagged entities and updates the rest, in one pass.
    pub fn update(&mut self, ctx: &mut SceneContext<'_>) {
        if self.entities.is_empty() {
            warn!(target: "scene", "No entities to update");
            return;
        }

        self.entities.retain(|id, entity| {
            if entity.base().is_pending_destroy() {
                debug!(target: "scene", "Entity \"{id}\" destroyed");
                false
            } else {
                entity.update(ctx);
                true
            }
        });
    }

    /// Renders every entity in id order.
    pub fn render(&self, graph: &mut ResourceGraph) {
        if self.entities.is_empty() {
            warn!(target: "scene", "No entities to render");
            return;
        }

        for entity in self.entities.values() {
            entity.render(graph);
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
