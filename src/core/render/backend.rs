//=========================================================================
// Render Backend
//=========================================================================
//
// Contract between the resource graph and a concrete rendering backend.
//
// Architecture:
//   ResourceGraph ──calls──> dyn RenderBackend ──owns──> surfaces
//                                                        contexts
//                                                        textures
//
// Handles are opaque integers minted by the backend. The graph keeps
// them in its id maps and never looks behind them, so a backend can be
// swapped (software, GPU, headless) without touching graph logic.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::Any;
use std::fmt;
use std::path::Path;

use image::RgbaImage;
use thiserror::Error;

//=== Internal Dependencies ===============================================

use super::window::WindowConfig;

//=== Handles =============================================================

/// Backend handle to a visible rendering surface (one per window).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(u32);

/// Backend handle to a render context bound to one surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextHandle(u32);

/// Backend handle to a texture owned by one render context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(u32);

impl SurfaceHandle {
    /// Wraps a backend-specific raw id.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the backend-specific raw id.
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl ContextHandle {
    /// Wraps a backend-specific raw id.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the backend-specific raw id.
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl TextureHandle {
    /// Wraps a backend-specific raw id.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the backend-specific raw id.
    pub fn raw(self) -> u32 {
        self.0
    }
}

//=== Geometry ============================================================

/// Integer rectangle in pixels, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Returns `true` if the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

//=== Flip ================================================================

/// Mirroring applied when composing a texture region.
///
/// Vertical and horizontal flips are mutually exclusive; see
/// [`Flip::from_flags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flip {
    #[default]
    None,
    Horizontal,
    Vertical,
}

impl Flip {
    /// Collapses a pair of flip flags into a single mode.
    ///
    /// The vertical flag wins when both are set.
    pub fn from_flags(flip_v: bool, flip_h: bool) -> Self {
        if flip_v {
            Self::Vertical
        } else if flip_h {
            Self::Horizontal
        } else {
            Self::None
        }
    }
}

//=== Color ===============================================================

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Returns the color as an `image` pixel.
    pub fn to_pixel(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }
}

//=== BlendMode ===========================================================

/// How a texture's pixels combine with the render target when drawn.
///
/// | Mode    | Color                          | Alpha              |
/// |---------|--------------------------------|--------------------|
/// | `None`  | `src`                          | `src`              |
/// | `Blend` | `src * srcA + dst * (1 - srcA)` | `srcA + dstA * (1 - srcA)` |
/// | `Add`   | `src * srcA + dst`             | `dst`              |
/// | `Mod`   | `src * dst`                    | `dst`              |
/// | `Mul`   | `src * dst + dst * (1 - srcA)` | `dst`              |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    None,
    Blend,
    Add,
    Mod,
    Mul,
}

//=== BackendError ========================================================

/// Failures reported by a [`RenderBackend`].
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("surface creation failed: {0}")]
    SurfaceCreation(String),

    #[error("render context creation failed: {0}")]
    ContextCreation(String),

    #[error("could not decode image {path}: {source}")]
    ImageDecode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("texture creation failed: {0}")]
    TextureCreation(String),

    #[error("unknown {kind} handle {raw}")]
    UnknownHandle { kind: HandleKind, raw: u32 },

    #[error("texture {texture} belongs to another render context than {context}")]
    ForeignTexture { texture: u32, context: u32 },

    #[error("texture {0} was not created as a render target")]
    NotATarget(u32),

    #[error("render target redirection failed: {0}")]
    TargetRedirect(String),
}

/// Handle category named in [`BackendError::UnknownHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Surface,
    Context,
    Texture,
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Surface => write!(f, "surface"),
            Self::Context => write!(f, "context"),
            Self::Texture => write!(f, "texture"),
        }
    }
}

//=== RenderBackend Trait =================================================

/// Rendering operations the resource graph consumes.
///
/// All calls are synchronous and made from the single engine thread.
/// Draw calls (`compose_rect`, `clear`) write into the context's current
/// render target: the surface's back buffer by default, or an off-screen
/// texture after [`set_render_target`](Self::set_render_target).
pub trait RenderBackend {
    //--- Surfaces & Contexts ----------------------------------------------

    /// Creates a visible surface described by `config`.
    fn create_surface(&mut self, config: &WindowConfig) -> Result<SurfaceHandle, BackendError>;

    /// Creates a render context drawing to `surface`.
    fn create_context(&mut self, surface: SurfaceHandle) -> Result<ContextHandle, BackendError>;

    /// Destroys a context and every texture it still owns.
    fn destroy_context(&mut self, context: ContextHandle);

    /// Destroys a surface. Its context must already be destroyed.
    fn destroy_surface(&mut self, surface: SurfaceHandle);

    /// Returns the surface size as `(width, height)`.
    fn surface_size(&self, surface: SurfaceHandle) -> Option<(u32, u32)>;

    //--- Textures ---------------------------------------------------------

    /// Decodes an image file and uploads it as a texture of `context`.
    fn decode_image(
        &mut self,
        context: ContextHandle,
        path: &Path,
    ) -> Result<TextureHandle, BackendError> {
        let image = image::open(path)
            .map_err(|source| BackendError::ImageDecode {
                path: path.display().to_string(),
                source,
            })?
            .to_rgba8();

        self.upload_image(context, &image)
    }

    /// Uploads decoded pixels as a texture of `context`.
    fn upload_image(
        &mut self,
        context: ContextHandle,
        image: &RgbaImage,
    ) -> Result<TextureHandle, BackendError>;

    /// Allocates a blank texture that can be selected as a render target.
    fn create_target_texture(
        &mut self,
        context: ContextHandle,
        width: u32,
        height: u32,
    ) -> Result<TextureHandle, BackendError>;

    /// Destroys a texture. A context targeting it falls back to its surface.
    fn destroy_texture(&mut self, texture: TextureHandle);

    /// Returns the texture size as `(width, height)`.
    fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)>;

    /// Sets how the texture blends into render targets.
    fn set_texture_blend_mode(
        &mut self,
        texture: TextureHandle,
        mode: BlendMode,
    ) -> Result<(), BackendError>;

    //--- Drawing ----------------------------------------------------------

    /// Copies `src` of `texture` into `dst` of the current render target.
    ///
    /// `angle` is in degrees, clockwise, about the centre of `dst`.
    fn compose_rect(
        &mut self,
        context: ContextHandle,
        texture: TextureHandle,
        src: Rect,
        dst: Rect,
        angle: f64,
        flip: Flip,
    ) -> Result<(), BackendError>;

    /// Redirects drawing to `target`, or back to the surface with `None`.
    fn set_render_target(
        &mut self,
        context: ContextHandle,
        target: Option<TextureHandle>,
    ) -> Result<(), BackendError>;

    /// Fills the current render target with `color`.
    fn clear(&mut self, context: ContextHandle, color: Color) -> Result<(), BackendError>;

    /// Shows everything drawn to the surface since the last present.
    fn present(&mut self, context: ContextHandle) -> Result<(), BackendError>;

    //--- Inspection -------------------------------------------------------

    /// Downcasts to `&dyn Any` for backend-specific queries.
    fn as_any(&self) -> &dyn Any;

    /// Downcasts to `&mut dyn Any` for backend-specific configuration.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_flip_wins_over_horizontal() {
        assert_eq!(Flip::from_flags(true, true), Flip::Vertical);
        assert_eq!(Flip::from_flags(true, false), Flip::Vertical);
        assert_eq!(Flip::from_flags(false, true), Flip::Horizontal);
        assert_eq!(Flip::from_flags(false, false), Flip::None);
    }

    #[test]
    fn rect_with_zero_side_is_empty() {
        assert!(Rect::new(0, 0, 0, 5).is_empty());
        assert!(Rect::new(3, 3, 5, 0).is_empty());
        assert!(!Rect::new(-2, -2, 1, 1).is_empty());
    }

    #[test]
    fn color_converts_to_pixel() {
        let pixel = Color::rgba(1, 2, 3, 4).to_pixel();
        assert_eq!(pixel.0, [1, 2, 3, 4]);
        assert_eq!(Color::rgb(9, 8, 7).a, 255);
    }

    #[test]
    fn unknown_handle_error_names_kind() {
        let err = BackendError::UnknownHandle {
            kind: HandleKind::Texture,
            raw: 7,
        };
        assert_eq!(err.to_string(), "unknown texture handle 7");
    }

    #[test]
    fn handles_round_trip_raw_ids() {
        assert_eq!(SurfaceHandle::from_raw(3).raw(), 3);
        assert_eq!(ContextHandle::from_raw(4).raw(), 4);
        assert_eq!(TextureHandle::from_raw(5).raw(), 5);
    }
}
