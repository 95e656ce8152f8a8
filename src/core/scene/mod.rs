//=========================================================================
// Scene System
//=========================================================================
//
// Stack-based scene switching with deferred transitions.
//
// Architecture:
//   StateMachine
//     ├─ pool: Vec<Box<dyn Scene>>        (index 0 = bottom)
//     ├─ changes: TransitionQueue         (Push | Pop, FIFO)
//     └─ generators: GeneratorRegistry    (id → scene factory)
//
// Flow:
//   update() → apply queued changes → top scene update()
//   render() → every scene, bottom to top
//
// Scenes never touch the pool directly. They request changes through
// the SceneContext handed to their hooks.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::entity::EntityContainer;
use crate::core::globals::GlobalContext;
use crate::core::render::{ResourceGraph, TileMapRegistry};

//=== Module Declarations =================================================

mod generators;
mod state_machine;
mod transition_queue;

//=== Public API ==========================================================

pub use generators::{GeneratorRegistry, SceneGenerator};
pub use state_machine::{StackState, StateMachine};
pub use transition_queue::{Transition, TransitionQueue};

//=== Scene Trait =========================================================

/// A screen or layer of the game: a set of entities with lifecycle hooks.
///
/// Only the container accessors and `on_enter` are required:
///
/// ```rust
/// # use mosaic_engine::prelude::*;
/// #[derive(Default)]
/// struct Title {
///     entities: EntityContainer,
/// }
///
/// impl Scene for Title {
///     fn entities(&self) -> &EntityContainer {
///         &self.entities
///     }
///
///     fn entities_mut(&mut self) -> &mut EntityContainer {
///         &mut self.entities
///     }
///
///     fn on_enter(&mut self, ctx: &mut SceneContext<'_>) {
///         // Load textures, create tiles, spawn entities.
///         let _ = ctx.graph();
///     }
/// }
/// ```
pub trait Scene {
    fn entities(&self) -> &EntityContainer;

    fn entities_mut(&mut self) -> &mut EntityContainer;

    /// Called once when the scene is placed on top of the pool.
    fn on_enter(&mut self, ctx: &mut SceneContext<'_>);

    /// Called once before the scene is dropped.
    ///
    /// The default releases every entity.
    fn on_exit(&mut self, _ctx: &mut SceneContext<'_>) {
        self.entities_mut().clear();
    }

    /// Called once per tick while the scene is on top.
    ///
    /// The default updates the entity container.
    fn update(&mut self, ctx: &mut SceneContext<'_>) {
        self.entities_mut().update(ctx);
    }

    /// Called once per frame while the scene is anywhere in the pool.
    ///
    /// The default renders the entity container.
    fn render(&self, globals: &mut GlobalContext) {
        self.entities().render(&mut globals.graph);
    }

    /// Name used in logs.
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

//=== SceneContext ========================================================

/// What a scene can reach while one of its hooks runs.
///
/// Transition requests made here are queued and applied at the start of
/// the next state machine update.
pub struct SceneContext<'a> {
    globals: &'a mut GlobalContext,
    transitions: &'a mut TransitionQueue,
    generators: &'a GeneratorRegistry,
}

impl<'a> SceneContext<'a> {
    /// Bundles the pieces a scene hook may touch.
    pub fn new(
        globals: &'a mut GlobalContext,
        transitions: &'a mut TransitionQueue,
        generators: &'a GeneratorRegistry,
    ) -> Self {
        Self {
            globals,
            transitions,
            generators,
        }
    }

    //--- Shared state -----------------------------------------------------

    /// Returns the shared context.
    pub fn globals(&mut self) -> &mut GlobalContext {
        self.globals
    }

    /// Returns the resource graph.
    pub fn graph(&mut self) -> &mut ResourceGraph {
        &mut self.globals.graph
    }

    /// Returns the tile map registry.
    pub fn tile_maps(&mut self) -> &mut TileMapRegistry {
        &mut self.globals.tile_maps
    }

    //--- Transitions ------------------------------------------------------

    /// Queues `scene` to be entered on top of the pool.
    pub fn push_scene<S: Scene + 'static>(&mut self, scene: S) {
        self.transitions.push(Transition::Push(Box::new(scene)));
    }

    /// Queues an already boxed scene.
    pub fn push_boxed(&mut self, scene: Box<dyn Scene>) {
        self.transitions.push(Transition::Push(scene));
    }

    /// Queues a fresh scene from the generator registered under `id`.
    ///
    /// Returns `false`, queuing nothing, if no such generator exists.
    pub fn push_named(&mut self, id: &str) -> bool {
        match self.generators.generate(id) {
            Some(scene) => {
                self.transitions.push(Transition::Push(scene));
                true
            }
            None => false,
        }
    }

    /// Queues removal of the top scene.
    pub fn pop_scene(&mut self) {
        self.transitions.push(Transition::Pop);
    }
}
