//=========================================================================
// Resource Graph
//=========================================================================
//
// Owns every rendering resource: windows, their render contexts, the
// textures created through those contexts, and the tiles cut from them.
//
// Architecture:
//   ResourceGraph
//     └── WindowId → Window (surface + context)
//           ├── texture id → TextureEntry (Static | Target)
//           ├── tile id    → Tile (texture referenced by id)
//           └── target     : Option<texture id>
//
// Back-references are ids only. Removing a parent releases its children
// in order (textures, context, surface).
//
// Error policy:
//   Public operations never panic on bad identifiers. Each one runs a
//   private `Result`-returning step and converts failures to `false` or
//   `None` at the boundary, logging them under the "graph" target.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;
use std::path::Path;

use image::RgbaImage;
use log::{debug, error, info, warn};
use thiserror::Error;

//=== Internal Dependencies ===============================================

use super::backend::{
    BackendError, BlendMode, Color, ContextHandle, RenderBackend, SurfaceHandle, TextureHandle,
};
use super::placement::Placement;
use super::software::SoftwareBackend;
use super::tile::Tile;
use super::window::{TextureEntry, TextureKind, Window, WindowConfig, WindowId};

//=== GraphError ==========================================================

/// Failures of resource graph operations.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("window {0} does not exist")]
    UnknownWindow(WindowId),

    #[error("texture \"{texture}\" does not exist in window {window}")]
    UnknownTexture { window: WindowId, texture: String },

    #[error("tile \"{tile}\" does not exist in window {window}")]
    UnknownTile { window: WindowId, tile: String },

    #[error("texture \"{texture}\" already exists in window {window}")]
    DuplicateTexture { window: WindowId, texture: String },

    #[error("texture \"{texture}\" in window {window} is not a render target")]
    NotATarget { window: WindowId, texture: String },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

type GraphResult<T> = Result<T, GraphError>;

fn report<T>(result: GraphResult<T>, action: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            error!(target: "graph", "Error {action}: {err}");
            None
        }
    }
}

//=== ResourceGraph =======================================================

/// Registry of windows and the rendering resources they own.
///
/// # Example
///
/// ```
/// use mosaic_engine::prelude::*;
///
/// let mut graph = ResourceGraph::default();
/// let window = graph.create_window(&WindowConfig::new("Demo", 64, 64)).unwrap();
///
/// let sheet = image::RgbaImage::from_pixel(32, 16, image::Rgba([255, 0, 0, 255]));
/// assert!(graph.add_texture(window, "sheet", &sheet));
/// assert!(graph.create_tile(window, "sheet", "whole", 0, 0, 0, 0));
/// assert!(graph.draw(window, "whole", &Placement::at(8.0, 8.0)));
/// assert!(graph.present(window));
/// ```
pub struct ResourceGraph {
    backend: Box<dyn RenderBackend>,
    windows: HashMap<WindowId, Window>,
    next_window: u32,
}

impl ResourceGraph {
    /// Creates an empty graph drawing through `backend`.
    pub fn new(backend: Box<dyn RenderBackend>) -> Self {
        Self {
            backend,
            windows: HashMap::new(),
            next_window: 0,
        }
    }

    //=== Windows =========================================================

    /// Creates a window with its surface and render context.
    ///
    /// Returns `None` if either backend step fails. A surface whose
    /// context could not be created is destroyed before returning.
    pub fn create_window(&mut self, config: &WindowConfig) -> Option<WindowId> {
        report(self.try_create_window(config), "creating window")
    }

    fn try_create_window(&mut self, config: &WindowConfig) -> GraphResult<WindowId> {
        let surface = self.backend.create_surface(config)?;
        let context = match self.backend.create_context(surface) {
            Ok(context) => context,
            Err(err) => {
                self.backend.destroy_surface(surface);
                return Err(err.into());
            }
        };

        self.next_window += 1;
        let id = WindowId(self.next_window);
        self.windows.insert(id, Window::new(surface, context));

        info!(
            target: "graph",
            "Window {id} created (\"{}\", {}x{})",
            config.title, config.width, config.height
        );
        Ok(id)
    }

    /// Destroys a window and everything it owns.
    pub fn remove_window(&mut self, window: WindowId) -> bool {
        match self.windows.remove(&window) {
            Some(node) => {
                node.release(self.backend.as_mut());
                info!(target: "graph", "Window {window} removed");
                true
            }
            None => {
                error!(target: "graph", "Error removing window: {}", GraphError::UnknownWindow(window));
                false
            }
        }
    }

    /// Returns `true` if `window` exists.
    pub fn contains_window(&self, window: WindowId) -> bool {
        self.windows.contains_key(&window)
    }

    /// Returns the number of live windows.
    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Window size as `(width, height)`.
    pub fn window_size(&self, window: WindowId) -> Option<(u32, u32)> {
        let node = self.windows.get(&window)?;
        self.backend.surface_size(node.surface)
    }

    //=== Textures ========================================================

    /// Decodes an image file into a new texture of `window`.
    ///
    /// Fails without side effects on an unknown window, a texture id
    /// already in use, or an image that cannot be decoded.
    pub fn load_texture(&mut self, window: WindowId, path: impl AsRef<Path>, texture_id: &str) -> bool {
        let path = path.as_ref();
        report(self.try_load_texture(window, path, texture_id), "loading texture").is_some()
    }

    fn try_load_texture(&mut self, window: WindowId, path: &Path, texture_id: &str) -> GraphResult<()> {
        let node = self.windows.get_mut(&window).ok_or(GraphError::UnknownWindow(window))?;
        ensure_free(node, window, texture_id)?;

        let handle = self.backend.decode_image(node.context, path)?;
        node.textures
            .insert(texture_id.to_owned(), TextureEntry { handle, kind: TextureKind::Static });

        debug!(target: "graph", "Texture \"{texture_id}\" loaded into window {window} from {}", path.display());
        Ok(())
    }

    /// Registers already-decoded pixels as a texture of `window`.
    pub fn add_texture(&mut self, window: WindowId, texture_id: &str, image: &RgbaImage) -> bool {
        report(self.try_add_texture(window, texture_id, image), "adding texture").is_some()
    }

    fn try_add_texture(&mut self, window: WindowId, texture_id: &str, image: &RgbaImage) -> GraphResult<()> {
        let node = self.windows.get_mut(&window).ok_or(GraphError::UnknownWindow(window))?;
        ensure_free(node, window, texture_id)?;

        let handle = self.backend.upload_image(node.context, image)?;
        node.textures
            .insert(texture_id.to_owned(), TextureEntry { handle, kind: TextureKind::Static });

        debug!(target: "graph", "Texture \"{texture_id}\" added to window {window}");
        Ok(())
    }

    /// Destroys a texture.
    ///
    /// If it is the active render target, drawing is first restored to
    /// the visible surface. Tiles referring to it stay registered and
    /// fail to draw until a texture with that id exists again.
    pub fn remove_texture(&mut self, window: WindowId, texture_id: &str) -> bool {
        report(self.try_remove_texture(window, texture_id), "removing texture").is_some()
    }

    fn try_remove_texture(&mut self, window: WindowId, texture_id: &str) -> GraphResult<()> {
        let node = self.windows.get_mut(&window).ok_or(GraphError::UnknownWindow(window))?;
        if !node.textures.contains_key(texture_id) {
            return Err(unknown_texture(window, texture_id));
        }

        if node.target.as_deref() == Some(texture_id) {
            self.backend.set_render_target(node.context, None)?;
            node.target = None;
            debug!(target: "graph", "Window {window} render target restored before removing \"{texture_id}\"");
        }

        if let Some(entry) = node.textures.remove(texture_id) {
            self.backend.destroy_texture(entry.handle);
        }
        Ok(())
    }

    /// Texture size as `(width, height)`.
    pub fn texture_size(&self, window: WindowId, texture_id: &str) -> Option<(u32, u32)> {
        let entry = self.windows.get(&window)?.textures.get(texture_id)?;
        self.backend.texture_size(entry.handle)
    }

    /// Returns `true` if `window` has a texture named `texture_id`.
    pub fn contains_texture(&self, window: WindowId, texture_id: &str) -> bool {
        self.windows
            .get(&window)
            .is_some_and(|node| node.textures.contains_key(texture_id))
    }

    /// Sets how `texture_id` is blended when drawn.
    pub fn set_texture_blend_mode(&mut self, window: WindowId, texture_id: &str, mode: BlendMode) -> bool {
        report(self.try_set_blend_mode(window, texture_id, mode), "setting blend mode").is_some()
    }

    fn try_set_blend_mode(&mut self, window: WindowId, texture_id: &str, mode: BlendMode) -> GraphResult<()> {
        let node = self.windows.get(&window).ok_or(GraphError::UnknownWindow(window))?;
        let entry = node
            .textures
            .get(texture_id)
            .ok_or_else(|| unknown_texture(window, texture_id))?;
        self.backend.set_texture_blend_mode(entry.handle, mode)?;
        Ok(())
    }

    //=== Tiles ===========================================================

    /// Registers a region of `texture_id` as tile `tile_id`.
    ///
    /// If `h` or `w` is zero the tile covers the whole texture, which must
    /// then exist. An existing tile with the same id is replaced.
    #[allow(clippy::too_many_arguments)]
    pub fn create_tile(
        &mut self,
        window: WindowId,
        texture_id: &str,
        tile_id: &str,
        x: i32,
        y: i32,
        h: u32,
        w: u32,
    ) -> bool {
        report(self.try_create_tile(window, texture_id, tile_id, x, y, h, w), "creating tile").is_some()
    }

    #[allow(clippy::too_many_arguments)]
    fn try_create_tile(
        &mut self,
        window: WindowId,
        texture_id: &str,
        tile_id: &str,
        x: i32,
        y: i32,
        h: u32,
        w: u32,
    ) -> GraphResult<()> {
        let node = self.windows.get_mut(&window).ok_or(GraphError::UnknownWindow(window))?;

        let (h, w) = if h == 0 || w == 0 {
            let entry = node
                .textures
                .get(texture_id)
                .ok_or_else(|| unknown_texture(window, texture_id))?;
            let (tw, th) = self
                .backend
                .texture_size(entry.handle)
                .ok_or_else(|| unknown_texture(window, texture_id))?;
            (th, tw)
        } else {
            (h, w)
        };

        insert_tile(node, window, tile_id, Tile::new(texture_id, x, y, h, w));
        Ok(())
    }

    /// Inserts an existing tile value into `window`.
    ///
    /// The tile's texture id is resolved against this window's textures
    /// when it is drawn.
    pub fn add_tile(&mut self, window: WindowId, tile_id: &str, tile: Tile) -> bool {
        match self.windows.get_mut(&window) {
            Some(node) => {
                insert_tile(node, window, tile_id, tile);
                true
            }
            None => {
                error!(target: "graph", "Error adding tile: {}", GraphError::UnknownWindow(window));
                false
            }
        }
    }

    /// Forgets a tile. Its texture is left alone.
    pub fn remove_tile(&mut self, window: WindowId, tile_id: &str) -> bool {
        let removed = self
            .windows
            .get_mut(&window)
            .ok_or(GraphError::UnknownWindow(window))
            .and_then(|node| {
                node.tiles.remove(tile_id).ok_or_else(|| GraphError::UnknownTile {
                    window,
                    tile: tile_id.to_owned(),
                })
            });
        report(removed, "removing tile").is_some()
    }

    /// Returns the tile `tile_id` of `window`.
    pub fn tile(&self, window: WindowId, tile_id: &str) -> Option<&Tile> {
        self.windows.get(&window)?.tiles.get(tile_id)
    }

    //=== Drawing =========================================================

    /// Draws a tile into the window's current render target.
    pub fn draw(&mut self, window: WindowId, tile_id: &str, placement: &Placement) -> bool {
        report(self.try_draw(window, tile_id, placement), "drawing tile").is_some()
    }

    fn try_draw(&mut self, window: WindowId, tile_id: &str, placement: &Placement) -> GraphResult<()> {
        let node = self.windows.get(&window).ok_or(GraphError::UnknownWindow(window))?;
        let tile = node.tiles.get(tile_id).ok_or_else(|| GraphError::UnknownTile {
            window,
            tile: tile_id.to_owned(),
        })?;
        let entry = node
            .textures
            .get(&tile.texture_id)
            .ok_or_else(|| unknown_texture(window, &tile.texture_id))?;

        let src = tile.rect();
        let dst = placement.destination(src);
        self.backend
            .compose_rect(node.context, entry.handle, src, dst, placement.angle, placement.flip())?;
        Ok(())
    }

    /// Fills the window's current render target with `color`.
    pub fn fill_background(&mut self, window: WindowId, color: Color) -> bool {
        let result = self
            .windows
            .get(&window)
            .ok_or(GraphError::UnknownWindow(window))
            .and_then(|node| {
                self.backend
                    .clear(node.context, color)
                    .map_err(GraphError::from)
            });
        report(result, "filling background").is_some()
    }

    /// Shows the window's visible surface.
    ///
    /// An unknown window is a recoverable condition and returns `false`.
    pub fn present(&mut self, window: WindowId) -> bool {
        let Some(node) = self.windows.get(&window) else {
            warn!(target: "graph", "Present skipped: window {window} does not exist");
            return false;
        };
        report(self.backend.present(node.context).map_err(GraphError::from), "presenting").is_some()
    }

    //=== Render Targets ==================================================

    /// Allocates a blank target texture and redirects drawing to it.
    ///
    /// If the redirection fails the texture is destroyed again.
    pub fn create_target_texture(&mut self, window: WindowId, texture_id: &str, h: u32, w: u32) -> bool {
        let result = self.try_allocate_target(window, texture_id, h, w).and_then(|_| {
            self.try_set_render_target(window, texture_id).inspect_err(|_| {
                self.discard_texture(window, texture_id);
            })
        });
        report(result, "creating target texture").is_some()
    }

    /// Allocates a blank target texture without redirecting drawing.
    pub fn allocate_target_texture(&mut self, window: WindowId, texture_id: &str, h: u32, w: u32) -> bool {
        report(self.try_allocate_target(window, texture_id, h, w), "allocating target texture").is_some()
    }

    fn try_allocate_target(&mut self, window: WindowId, texture_id: &str, h: u32, w: u32) -> GraphResult<()> {
        let node = self.windows.get_mut(&window).ok_or(GraphError::UnknownWindow(window))?;
        ensure_free(node, window, texture_id)?;

        let handle = self.backend.create_target_texture(node.context, w, h)?;
        node.textures
            .insert(texture_id.to_owned(), TextureEntry { handle, kind: TextureKind::Target });

        debug!(target: "graph", "Target texture \"{texture_id}\" ({w}x{h}) allocated in window {window}");
        Ok(())
    }

    /// Redirects drawing in `window` to an existing target texture.
    pub fn set_render_target(&mut self, window: WindowId, texture_id: &str) -> bool {
        report(self.try_set_render_target(window, texture_id), "setting render target").is_some()
    }

    fn try_set_render_target(&mut self, window: WindowId, texture_id: &str) -> GraphResult<()> {
        let node = self.windows.get_mut(&window).ok_or(GraphError::UnknownWindow(window))?;
        let entry = node
            .textures
            .get(texture_id)
            .ok_or_else(|| unknown_texture(window, texture_id))?;
        if entry.kind != TextureKind::Target {
            return Err(GraphError::NotATarget {
                window,
                texture: texture_id.to_owned(),
            });
        }

        self.backend.set_render_target(node.context, Some(entry.handle))?;
        if let Some(previous) = node.target.replace(texture_id.to_owned()) {
            if previous != texture_id {
                debug!(target: "graph", "Window {window} render target \"{previous}\" replaced by \"{texture_id}\"");
            }
        }
        Ok(())
    }

    /// Points drawing in `window` back at its visible surface.
    pub fn restore_render_target(&mut self, window: WindowId) -> bool {
        let result = self
            .windows
            .get_mut(&window)
            .ok_or(GraphError::UnknownWindow(window))
            .and_then(|node| {
                self.backend.set_render_target(node.context, None)?;
                node.target = None;
                Ok(())
            });
        report(result, "restoring render target").is_some()
    }

    /// Runs `f` with drawing redirected to `texture_id`, then restores
    /// the visible surface.
    ///
    /// Returns `None` without calling `f` if the redirection fails.
    pub fn with_render_target<R>(
        &mut self,
        window: WindowId,
        texture_id: &str,
        f: impl FnOnce(&mut Self) -> R,
    ) -> Option<R> {
        if !self.set_render_target(window, texture_id) {
            return None;
        }
        let result = f(self);
        if self.contains_window(window) {
            self.restore_render_target(window);
        }
        Some(result)
    }

    /// Id of the active off-screen target, `None` for the visible surface.
    pub fn render_target(&self, window: WindowId) -> Option<&str> {
        self.windows.get(&window)?.target.as_deref()
    }

    //=== Backend Access ==================================================

    /// The backend every window draws through, for inspection.
    pub fn backend(&self) -> &dyn RenderBackend {
        self.backend.as_ref()
    }

    /// Backend surface of `window`.
    pub fn surface(&self, window: WindowId) -> Option<SurfaceHandle> {
        self.windows.get(&window).map(|node| node.surface)
    }

    /// Backend render context of `window`.
    pub fn context(&self, window: WindowId) -> Option<ContextHandle> {
        self.windows.get(&window).map(|node| node.context)
    }

    /// Backend handle of the texture `texture_id`.
    pub fn texture_handle(&self, window: WindowId, texture_id: &str) -> Option<TextureHandle> {
        self.windows
            .get(&window)?
            .textures
            .get(texture_id)
            .map(|entry| entry.handle)
    }

    //=== Shutdown ========================================================

    /// Destroys every window and the resources it owns.
    pub fn shutdown(&mut self) {
        if self.windows.is_empty() {
            return;
        }
        info!(target: "graph", "Releasing {} window(s)", self.windows.len());
        for (_, node) in self.windows.drain() {
            node.release(self.backend.as_mut());
        }
    }

    fn discard_texture(&mut self, window: WindowId, texture_id: &str) {
        if let Some(node) = self.windows.get_mut(&window) {
            if let Some(entry) = node.textures.remove(texture_id) {
                self.backend.destroy_texture(entry.handle);
            }
        }
    }
}

impl Default for ResourceGraph {
    /// Graph on a [`SoftwareBackend`].
    fn default() -> Self {
        Self::new(Box::new(SoftwareBackend::new()))
    }
}

impl Drop for ResourceGraph {
    fn drop(&mut self) {
        self.shutdown();
    }
}

//=== Helpers =============================================================

fn unknown_texture(window: WindowId, texture_id: &str) -> GraphError {
    GraphError::UnknownTexture {
        window,
        texture: texture_id.to_owned(),
    }
}

fn ensure_free(node: &Window, window: WindowId, texture_id: &str) -> GraphResult<()> {
    if node.textures.contains_key(texture_id) {
        return Err(GraphError::DuplicateTexture {
            window,
            texture: texture_id.to_owned(),
        });
    }
    Ok(())
}

fn insert_tile(node: &mut Window, window: WindowId, tile_id: &str, tile: Tile) {
    if node.tiles.insert(tile_id.to_owned(), tile).is_some() {
        warn!(target: "graph", "Tile \"{tile_id}\" in window {window} replaced");
    } else {
        debug!(target: "graph", "Tile \"{tile_id}\" created in window {window}");
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
