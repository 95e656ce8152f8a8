//=========================================================================
// Entity System
//=========================================================================
//
// Drawable, updatable game objects owned by a scene's container.
//
// Architecture:
//   EntityContainer
//     └─ id → Box<dyn Entity>
//                └─ EntityBase (placement, frames, destroy flag)
//
// Lifecycle:
//   add() → setup() → update()* / render()* → destroy() → swept on
//   the next container update
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;

use log::trace;

//=== Internal Dependencies ===============================================

use crate::core::render::{Placement, ResourceGraph, WindowId};
use crate::core::scene::SceneContext;

//=== Module Declarations =================================================

mod container;

//=== Public API ==========================================================

pub use container::EntityContainer;

//=== Frame ===============================================================

/// One drawable appearance of an entity: a tile in a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub tile_id: String,
    pub window: WindowId,
}

impl Frame {
    /// Frame drawing `tile_id` in `window`.
    pub fn new(tile_id: impl Into<String>, window: WindowId) -> Self {
        Self {
            tile_id: tile_id.into(),
            window,
        }
    }
}

//=== EntityBase ==========================================================

/// State shared by every entity.
#[derive(Debug, Clone, Default)]
pub struct EntityBase {
    pub placement: Placement,
    frames: HashMap<String, Frame>,
    current_frame: String,
    pending_destroy: bool,
}

impl EntityBase {
    /// Base at the origin with no frames.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets spatial state to defaults and clears the destroy flag.
    ///
    /// Frames are kept.
    pub fn reset(&mut self) {
        self.placement = Placement::default();
        self.pending_destroy = false;
    }

    //--- Frames -----------------------------------------------------------

    /// Registers a named frame. A frame with the same name is replaced.
    pub fn add_frame(&mut self, name: impl Into<String>, frame: Frame) {
        self.frames.insert(name.into(), frame);
    }

    /// Selects the frame drawn by [`render`](Self::render).
    pub fn set_frame(&mut self, name: impl Into<String>) {
        self.current_frame = name.into();
    }

    /// Name of the frame drawn by the default render.
    pub fn current_frame(&self) -> &str {
        &self.current_frame
    }

    /// Returns the frame registered under `name`.
    pub fn frame(&self, name: &str) -> Option<&Frame> {
        self.frames.get(name)
    }

    //--- Destruction ------------------------------------------------------

    /// Flags the entity for removal on the next container update.
    pub fn destroy(&mut self) {
        self.pending_destroy = true;
    }

    /// Returns `true` once the entity has asked to be removed.
    pub fn is_pending_destroy(&self) -> bool {
        self.pending_destroy
    }

    //--- Rendering --------------------------------------------------------

    /// Draws the current frame. Draws nothing if no such frame exists.
    pub fn render(&self, graph: &mut ResourceGraph) -> bool {
        match self.frames.get(&self.current_frame) {
            Some(frame) => graph.draw(frame.window, &frame.tile_id, &self.placement),
            None => {
                trace!(target: "scene", "No frame \"{}\" to render", self.current_frame);
                false
            }
        }
    }
}

//=== Entity Trait ========================================================

/// A game object living in a scene's [`EntityContainer`].
///
/// Only the base accessors are required:
///
/// ```rust
/// # use mosaic_engine::prelude::*;
/// struct Rock {
///     base: EntityBase,
/// }
///
/// impl Entity for Rock {
///     fn base(&self) -> &EntityBase {
///         &self.base
///     }
///
///     fn base_mut(&mut self) -> &mut EntityBase {
///         &mut self.base
///     }
/// }
/// ```
pub trait Entity {
    fn base(&self) -> &EntityBase;

    fn base_mut(&mut self) -> &mut EntityBase;

    /// Runs once when the entity joins a container, before any update or
    /// render. The default resets spatial state.
    fn setup(&mut self) {
        self.base_mut().reset();
    }

    /// Called once per tick while the owning scene is on top.
    fn update(&mut self, _ctx: &mut SceneContext<'_>) {}

    /// Called once per frame while the owning scene is in the pool.
    fn render(&self, graph: &mut ResourceGraph) {
        self.base().render(graph);
    }

    /// Flags the entity for removal on the next container update.
    fn destroy(&mut self) {
        self.base_mut().destroy();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
