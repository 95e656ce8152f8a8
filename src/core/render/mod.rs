//=========================================================================
// Render System
//=========================================================================
//
// Windowed rendering resources and the backend seam they draw through.
//
// Architecture:
//   ResourceGraph
//     ├─ backend: Box<dyn RenderBackend>   (SoftwareBackend by default)
//     └─ windows: WindowId → Window
//                   ├─ textures
//                   ├─ tiles
//                   └─ render target slot
//
//   TileMapRegistry ──draws through──> ResourceGraph
//
//=========================================================================

//=== Module Declarations =================================================

mod backend;
mod graph;
mod placement;
mod software;
mod tile;
mod tile_map;
mod window;

//=== Public API ==========================================================

pub use backend::{
    BackendError, BlendMode, Color, ContextHandle, Flip, HandleKind, Rect, RenderBackend,
    SurfaceHandle, TextureHandle,
};
pub use graph::{GraphError, ResourceGraph};
pub use placement::Placement;
pub use software::SoftwareBackend;
pub use tile::Tile;
pub use tile_map::{TileMap, TileMapRegistry};
pub use window::{TextureKind, WindowConfig, WindowId};
