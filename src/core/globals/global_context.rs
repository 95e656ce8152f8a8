//=========================================================================
// Global Context
//=========================================================================
//
// Shared data container for scenes.
//
// Contains state data that scenes read/write:
// - graph: windows, textures, tiles and render targets
// - tile_maps: named tile maps drawn through the graph
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::render::{RenderBackend, ResourceGraph, TileMapRegistry};

//=== GlobalContext =======================================================

/// Shared context data accessible to scenes.
///
/// Scenes reach it through [`SceneContext`](crate::core::scene::SceneContext)
/// while their hooks run, and receive it directly when rendering. Both
/// fields are public so a scene can borrow them at the same time, e.g. to
/// blend a tile map through the graph.
pub struct GlobalContext {
    /// Rendering resources of every window.
    pub graph: ResourceGraph,

    /// Tile maps by id.
    pub tile_maps: TileMapRegistry,
}

impl GlobalContext {
    /// Creates a context drawing through `backend`.
    pub fn new(backend: Box<dyn RenderBackend>) -> Self {
        Self {
            graph: ResourceGraph::new(backend),
            tile_maps: TileMapRegistry::new(),
        }
    }
}

impl Default for GlobalContext {
    /// Context on the software backend.
    fn default() -> Self {
        Self {
            graph: ResourceGraph::default(),
            tile_maps: TileMapRegistry::new(),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
