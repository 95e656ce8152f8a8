//=========================================================================
// Global Engine State
//=========================================================================
//
// Shared data every scene can reach, passed explicitly instead of living
// in process-wide singletons.
//
// Architecture:
//   Engine
//     ├─ GlobalContext: ResourceGraph + TileMapRegistry (passed to scenes)
//     └─ StateMachine:  scene pool and transition queue
//
//=========================================================================

//=== Module Declarations =================================================

mod global_context;

//=== Public API ==========================================================

pub use global_context::GlobalContext;
