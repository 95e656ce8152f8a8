//=========================================================================
// Scene Generators
//=========================================================================
//
// Named factories producing fresh scene instances on demand, so scenes
// can be pushed by id without the caller knowing their concrete type.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;
use std::fmt;

use log::{debug, error, warn};

//=== Internal Dependencies ===============================================

use super::Scene;

//=== GeneratorRegistry ===================================================

/// Factory producing a new scene each time it is called.
pub type SceneGenerator = Box<dyn Fn() -> Box<dyn Scene>>;

/// Scene factories by id.
#[derive(Default)]
pub struct GeneratorRegistry {
    generators: HashMap<String, SceneGenerator>,
}

impl GeneratorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `generator` under `id`.
    ///
    /// The first registration wins: a later one with the same id is
    /// rejected and the original stays in place.
    pub fn add<F>(&mut self, id: impl Into<String>, generator: F) -> bool
    where
        F: Fn() -> Box<dyn Scene> + 'static,
    {
        let id = id.into();
        if self.generators.contains_key(&id) {
            warn!(target: "scene", "Scene generator \"{id}\" already registered, new one rejected");
            return false;
        }
        debug!(target: "scene", "Scene generator \"{id}\" registered");
        self.generators.insert(id, Box::new(generator));
        true
    }

    /// Removes the generator under `id`. Returns `false` if there was none.
    pub fn remove(&mut self, id: &str) -> bool {
        self.generators.remove(id).is_some()
    }

    /// Returns `true` if a generator is registered under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.generators.contains_key(id)
    }

    /// Returns the number of registered generators.
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    /// Returns `true` if no generator is registered.
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Builds a new scene from the generator registered under `id`.
    pub fn generate(&self, id: &str) -> Option<Box<dyn Scene>> {
        match self.generators.get(id) {
            Some(generator) => Some(generator()),
            None => {
                error!(target: "scene", "Error pushing scene \"{id}\": no generator registered");
                None
            }
        }
    }
}

impl fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.generators.keys()).finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
