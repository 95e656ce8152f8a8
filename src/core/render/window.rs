//=========================================================================
// Window
//=========================================================================
//
// Window configuration and the per-window node of the resource graph.
//
// A window owns one surface and one render context (created and
// destroyed together), every texture created through that context, and
// the tiles cut from those textures:
//
//   Window ──owns──> Surface + Context
//          ──owns──> textures: id → TextureEntry
//          ──owns──> tiles:    id → Tile (texture referenced by id)
//          ──slot──> target:   Option<texture id>
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;
use std::fmt;

use winit::dpi::LogicalSize;
use winit::window::{Fullscreen, WindowAttributes};

//=== Internal Dependencies ===============================================

use super::backend::{ContextHandle, RenderBackend, SurfaceHandle, TextureHandle};
use super::tile::Tile;

//=== WindowId ============================================================

/// Opaque window identifier issued by the resource graph.
///
/// Ids start at 1 and are never reused within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub(crate) u32);

impl WindowId {
    /// Returns the raw numeric id.
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//=== WindowConfig ========================================================

/// Describes a window to create.
///
/// # Defaults
///
/// - Title: `"Mosaic Engine"`
/// - Size: 800x600
/// - Windowed, visible, decorated, not resizable, no input grab
///
/// # Example
///
/// ```
/// use mosaic_engine::prelude::*;
///
/// let config = WindowConfig::new("Overworld", 640, 480)
///     .with_resizable(true)
///     .with_borderless(true);
/// assert_eq!(config.width, 640);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub input_focus: bool,
    pub hidden: bool,
    pub borderless: bool,
    pub resizable: bool,
}

impl WindowConfig {
    /// Creates a windowed configuration of the given size.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        assert!(
            width > 0 && height > 0,
            "Window size must be positive, got {width}x{height}"
        );
        Self {
            title: title.into(),
            width,
            height,
            fullscreen: false,
            input_focus: false,
            hidden: false,
            borderless: false,
            resizable: false,
        }
    }

    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    /// Requests keyboard focus when the window opens.
    pub fn with_input_focus(mut self, input_focus: bool) -> Self {
        self.input_focus = input_focus;
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn with_borderless(mut self, borderless: bool) -> Self {
        self.borderless = borderless;
        self
    }

    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    /// Maps this configuration onto winit attributes for a windowing
    /// frame driver.
    ///
    /// Fullscreen maps to borderless fullscreen on the current monitor.
    pub fn attributes(&self) -> WindowAttributes {
        let fullscreen = self.fullscreen.then_some(Fullscreen::Borderless(None));

        WindowAttributes::default()
            .with_title(self.title.clone())
            .with_inner_size(LogicalSize::new(self.width, self.height))
            .with_visible(!self.hidden)
            .with_decorations(!self.borderless)
            .with_resizable(self.resizable)
            .with_fullscreen(fullscreen)
            .with_active(self.input_focus)
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::new("Mosaic Engine", 800, 600)
    }
}

//=== TextureEntry ========================================================

/// Whether a texture holds loaded pixels or can receive drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    Static,
    Target,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TextureEntry {
    pub(crate) handle: TextureHandle,
    pub(crate) kind: TextureKind,
}

//=== Window ==============================================================

pub(crate) struct Window {
    pub(crate) surface: SurfaceHandle,
    pub(crate) context: ContextHandle,
    pub(crate) textures: HashMap<String, TextureEntry>,
    pub(crate) tiles: HashMap<String, Tile>,
    pub(crate) target: Option<String>,
}

impl Window {
    pub(crate) fn new(surface: SurfaceHandle, context: ContextHandle) -> Self {
        Self {
            surface,
            context,
            textures: HashMap::new(),
            tiles: HashMap::new(),
            target: None,
        }
    }

    /// Releases everything the window owns: textures, then the context,
    /// then the surface.
    pub(crate) fn release(self, backend: &mut dyn RenderBackend) {
        for entry in self.textures.into_values() {
            backend.destroy_texture(entry.handle);
        }
        backend.destroy_context(self.context);
        backend.destroy_surface(self.surface);
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_windowed_800x600() {
        let config = WindowConfig::default();
        assert_eq!(config.title, "Mosaic Engine");
        assert_eq!((config.width, config.height), (800, 600));
        assert!(!config.fullscreen && !config.hidden && !config.borderless);
    }

    #[test]
    fn builder_setters_apply() {
        let config = WindowConfig::new("t", 10, 20)
            .with_fullscreen(true)
            .with_input_focus(true)
            .with_hidden(true)
            .with_borderless(true)
            .with_resizable(true);

        assert!(config.fullscreen);
        assert!(config.input_focus);
        assert!(config.hidden);
        assert!(config.borderless);
        assert!(config.resizable);
    }

    #[test]
    #[should_panic(expected = "Window size must be positive")]
    fn zero_width_panics() {
        let _ = WindowConfig::new("bad", 0, 10);
    }

    #[test]
    fn attributes_mirror_config() {
        let attrs = WindowConfig::new("Map", 320, 200)
            .with_hidden(true)
            .with_borderless(true)
            .with_resizable(true)
            .with_fullscreen(true)
            .attributes();

        assert_eq!(attrs.title, "Map");
        assert!(!attrs.visible);
        assert!(!attrs.decorations);
        assert!(attrs.resizable);
        assert!(matches!(attrs.fullscreen, Some(Fullscreen::Borderless(None))));
    }

    #[test]
    fn window_id_displays_with_hash() {
        assert_eq!(WindowId(3).to_string(), "#3");
    }
}
