//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use mosaic_engine::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Engine core
pub use crate::engine::{Engine, EngineBuilder};

// Global context
pub use crate::core::globals::GlobalContext;

// Rendering
pub use crate::core::render::{
    BlendMode, Color, Flip, Placement, RenderBackend, ResourceGraph, SoftwareBackend, Tile,
    TileMap, TileMapRegistry, WindowConfig, WindowId,
};

// Entities
pub use crate::core::entity::{Entity, EntityBase, EntityContainer, Frame};

// Scene system
pub use crate::core::scene::{Scene, SceneContext, StackState, StateMachine};
