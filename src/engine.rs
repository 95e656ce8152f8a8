//=========================================================================
// Mosaic Engine
//
// Main entry point and coordinator for the engine.
//
// Architecture:
// ```text
//     EngineBuilder  ──build()──>  Engine  ──frame()──>  [one tick]
//         │                          │
//         ├─ with_backend()          ├─ states.update()
//         ├─ with_clear_color()      ├─ fill_background() per window
//         └─ with_window()           ├─ states.render()
//                                    └─ present() per window
// ```
//
// The engine owns no loop. An external driver (a winit event loop, a
// fixed-step timer, a test) calls `frame()` while `is_running()` holds.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{info, warn};

//=== Internal Dependencies ===============================================

use crate::core::globals::GlobalContext;
use crate::core::render::{Color, RenderBackend, ResourceGraph, SoftwareBackend, WindowConfig, WindowId};
use crate::core::scene::StateMachine;

//=== EngineBuilder =======================================================

/// Builder for configuring and constructing an [`Engine`].
///
/// # Default Values
///
/// - **Backend**: [`SoftwareBackend`]
/// - **Clear color**: opaque black
/// - **Windows**: none
///
/// # Examples
///
/// ```
/// use mosaic_engine::prelude::*;
///
/// let mut engine = EngineBuilder::new()
///     .with_clear_color(Color::rgb(30, 30, 60))
///     .with_window(WindowConfig::new("Main", 320, 240))
///     .build();
///
/// assert_eq!(engine.windows().len(), 1);
/// engine.frame();
/// engine.shutdown();
/// ```
pub struct EngineBuilder {
    backend: Option<Box<dyn RenderBackend>>,
    clear_color: Color,
    windows: Vec<WindowConfig>,
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            backend: None,
            clear_color: Color::BLACK,
            windows: Vec::new(),
        }
    }

    /// Sets the rendering backend every window draws through.
    ///
    /// Default: [`SoftwareBackend`]
    pub fn with_backend(mut self, backend: impl RenderBackend + 'static) -> Self {
        self.backend = Some(Box::new(backend));
        self
    }

    /// Sets the color each window is cleared to at the start of a frame.
    ///
    /// Default: opaque black
    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Queues a window to be created by [`build`](Self::build).
    pub fn with_window(mut self, config: WindowConfig) -> Self {
        self.windows.push(config);
        self
    }

    /// Builds the engine and creates the configured windows.
    ///
    /// A window the backend refuses is logged and skipped.
    pub fn build(self) -> Engine {
        info!(target: "engine", "Building engine ({} window(s) configured)", self.windows.len());

        let backend = self
            .backend
            .unwrap_or_else(|| Box::new(SoftwareBackend::new()));

        let mut engine = Engine {
            globals: GlobalContext::new(backend),
            states: StateMachine::new(),
            windows: Vec::new(),
            clear_color: self.clear_color,
            running: true,
        };

        for config in &self.windows {
            engine.create_window(config);
        }
        engine
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=== Engine ==============================================================

/// Mosaic Engine runtime.
///
/// Owns the shared [`GlobalContext`] and the scene [`StateMachine`], and
/// keeps the list of windows it created in creation order. Create via
/// [`EngineBuilder`].
///
/// # Lifecycle
///
/// ```text
/// build() → init() → frame()* → shutdown()
/// ```
pub struct Engine {
    globals: GlobalContext,
    states: StateMachine,
    windows: Vec<WindowId>,
    clear_color: Color,
    running: bool,
}

impl Engine {
    //--- Initialization ---------------------------------------------------

    /// Runs setup code against the engine before the first frame.
    ///
    /// Typical work: create windows, register scene generators, push the
    /// first scene.
    ///
    /// ```
    /// # use mosaic_engine::prelude::*;
    /// # #[derive(Default)]
    /// # struct Title { entities: EntityContainer }
    /// # impl Scene for Title {
    /// #     fn entities(&self) -> &EntityContainer { &self.entities }
    /// #     fn entities_mut(&mut self) -> &mut EntityContainer { &mut self.entities }
    /// #     fn on_enter(&mut self, _ctx: &mut SceneContext<'_>) {}
    /// # }
    /// let engine = EngineBuilder::new().build().init(|engine| {
    ///     engine.create_window(&WindowConfig::default());
    ///     engine.states_mut().add_generator("title", || Box::new(Title::default()) as Box<dyn Scene>);
    ///     engine.states_mut().push_named("title");
    /// });
    /// # drop(engine);
    /// ```
    pub fn init<F>(mut self, init_fn: F) -> Self
    where
        F: FnOnce(&mut Engine),
    {
        info!(target: "engine", "Initializing engine");
        init_fn(&mut self);
        info!(target: "engine", "Engine initialization complete");
        self
    }

    //--- Windows ----------------------------------------------------------

    /// Creates a window and records it in the engine's window list.
    pub fn create_window(&mut self, config: &WindowConfig) -> Option<WindowId> {
        let id = self.globals.graph.create_window(config);
        match id {
            Some(id) => self.windows.push(id),
            None => warn!(target: "engine", "Window \"{}\" was not created", config.title),
        }
        id
    }

    /// The `index`-th window created through the engine.
    pub fn window(&self, index: usize) -> Option<WindowId> {
        self.windows.get(index).copied()
    }

    /// Windows created through the engine, in creation order.
    pub fn windows(&self) -> &[WindowId] {
        &self.windows
    }

    //--- Accessors --------------------------------------------------------

    /// Returns the shared context.
    pub fn globals(&self) -> &GlobalContext {
        &self.globals
    }

    /// Returns the shared context mutably.
    pub fn globals_mut(&mut self) -> &mut GlobalContext {
        &mut self.globals
    }

    /// Returns the resource graph.
    pub fn graph(&self) -> &ResourceGraph {
        &self.globals.graph
    }

    /// Returns the resource graph mutably.
    pub fn graph_mut(&mut self) -> &mut ResourceGraph {
        &mut self.globals.graph
    }

    /// Returns the scene state machine.
    pub fn states(&self) -> &StateMachine {
        &self.states
    }

    /// Returns the scene state machine mutably.
    pub fn states_mut(&mut self) -> &mut StateMachine {
        &mut self.states
    }

    /// Color each window is cleared to before rendering.
    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    //--- Run State --------------------------------------------------------

    /// Whether the driver should keep calling [`frame`](Self::frame).
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Sets the flag the external driver checks before each frame.
    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    //--- Frame ------------------------------------------------------------

    /// Applies queued scene changes and updates the top scene.
    pub fn update(&mut self) {
        self.states.update(&mut self.globals);
    }

    /// Clears every window, renders every scene, presents every window.
    pub fn render(&mut self) {
        for &window in &self.windows {
            self.globals.graph.fill_background(window, self.clear_color);
        }

        self.states.render(&mut self.globals);

        for &window in &self.windows {
            self.globals.graph.present(window);
        }
    }

    /// One full step: update then render.
    pub fn frame(&mut self) {
        self.update();
        self.render();
    }

    //--- Shutdown ---------------------------------------------------------

    /// Exits every scene, then releases every window.
    pub fn shutdown(mut self) {
        info!(target: "engine", "Shutting down engine");
        self.release();
        info!(target: "engine", "Engine shutdown complete");
    }

    fn release(&mut self) {
        self.running = false;
        self.states.shutdown(&mut self.globals);
        self.globals.graph.shutdown();
        self.windows.clear();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
