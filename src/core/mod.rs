//=========================================================================
// Core Systems
//
// Engine subsystems, leaves first:
//
// - render:   backend seam, resource graph, tile maps
// - entity:   game objects and their per-scene container
// - scene:    scene trait, transition queue, state machine
// - globals:  shared context handed to scenes
//
// Everything runs on the caller's thread. Subsystems talk through
// explicit context objects rather than global state.
//
//=========================================================================

pub mod entity;
pub mod globals;
pub mod render;
pub mod scene;
