//=========================================================================
// Mosaic Engine: Library Root
//
// A 2D tile engine scaffold: a scene stack with deferred transitions,
// per-scene entity ownership, and a windowed resource graph
// (windows → textures → tiles) drawn through a pluggable backend.
//
// Typical usage:
// ```no_run
// use mosaic_engine::prelude::*;
//
// let mut engine = EngineBuilder::new()
//     .with_window(WindowConfig::new("Game", 640, 480))
//     .build();
//
// while engine.is_running() {
//     engine.frame();
// }
// engine.shutdown();
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` contains the engine subsystems (rendering resources, entities,
// scenes). Application code usually goes through `prelude`.
//
pub mod core;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------

mod engine;

//--- Public Exports ------------------------------------------------------

pub use engine::{Engine, EngineBuilder};
