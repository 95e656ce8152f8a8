//=========================================================================
// Software Backend
//=========================================================================
//
// CPU implementation of `RenderBackend` on `image::RgbaImage` buffers.
//
// Each surface keeps a back buffer (drawn into) and a front buffer (the
// last presented frame). Contexts draw into their surface's back buffer
// unless redirected to one of their target textures.
//
// Drawing uses nearest-neighbour sampling. Rotation is computed by
// mapping every destination pixel back into the unrotated destination
// rectangle, so rotated quads have no holes.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::Any;
use std::collections::HashMap;

use image::{Rgba, RgbaImage};
use log::trace;

//=== Internal Dependencies ===============================================

use super::backend::{
    BackendError, BlendMode, Color, ContextHandle, Flip, HandleKind, Rect, RenderBackend,
    SurfaceHandle, TextureHandle,
};
use super::window::WindowConfig;

//=== Limits ==============================================================

/// Largest pixel buffer, in bytes, the backend allocates for a surface
/// or target texture. Larger requests fail with a creation error.
pub const MAX_BUFFER_BYTES: u64 = 1 << 30;

/// Byte length of a `width`x`height` RGBA buffer, if within the limit.
fn buffer_len(width: u32, height: u32) -> Option<u64> {
    u64::from(width)
        .checked_mul(u64::from(height))?
        .checked_mul(4)
        .filter(|&len| len <= MAX_BUFFER_BYTES)
}

//=== Storage =============================================================

struct SoftSurface {
    back: RgbaImage,
    front: RgbaImage,
    presents: u64,
}

struct SoftContext {
    surface: SurfaceHandle,
    target: Option<TextureHandle>,
}

struct SoftTexture {
    context: ContextHandle,
    pixels: RgbaImage,
    blend: BlendMode,
    target: bool,
}

//=== SoftwareBackend =====================================================

/// Headless rendering backend.
///
/// Useful for tests and tools: every buffer can be inspected through
/// [`back_buffer`](Self::back_buffer), [`front_buffer`](Self::front_buffer)
/// and [`texture_pixels`](Self::texture_pixels). Surface and context
/// creation can be made to fail on purpose to exercise error paths.
#[derive(Default)]
pub struct SoftwareBackend {
    surfaces: HashMap<SurfaceHandle, SoftSurface>,
    contexts: HashMap<ContextHandle, SoftContext>,
    textures: HashMap<TextureHandle, SoftTexture>,
    next_handle: u32,
    fail_surfaces: bool,
    fail_contexts: bool,
    fail_targets: bool,
}

impl SoftwareBackend {
    /// Creates a backend with no surfaces and no injected failures.
    pub fn new() -> Self {
        Self::default()
    }

    //--- Failure injection ------------------------------------------------

    /// Makes every subsequent surface creation fail.
    pub fn with_surface_failure(mut self) -> Self {
        self.fail_surfaces = true;
        self
    }

    /// Makes every subsequent context creation fail.
    pub fn with_context_failure(mut self) -> Self {
        self.fail_contexts = true;
        self
    }

    /// Makes every redirection to a target texture fail.
    pub fn with_render_target_failure(mut self) -> Self {
        self.fail_targets = true;
        self
    }

    //--- Inspection -------------------------------------------------------

    /// Returns the number of live surfaces.
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Returns the number of live contexts.
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Returns the number of live textures.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Pixels drawn since the last present.
    pub fn back_buffer(&self, surface: SurfaceHandle) -> Option<&RgbaImage> {
        self.surfaces.get(&surface).map(|s| &s.back)
    }

    /// Pixels shown by the last present.
    pub fn front_buffer(&self, surface: SurfaceHandle) -> Option<&RgbaImage> {
        self.surfaces.get(&surface).map(|s| &s.front)
    }

    /// Number of presents of `surface`.
    pub fn present_count(&self, surface: SurfaceHandle) -> u64 {
        self.surfaces.get(&surface).map_or(0, |s| s.presents)
    }

    /// Current pixels of `texture`.
    pub fn texture_pixels(&self, texture: TextureHandle) -> Option<&RgbaImage> {
        self.textures.get(&texture).map(|t| &t.pixels)
    }

    pub fn texture_blend_mode(&self, texture: TextureHandle) -> Option<BlendMode> {
        self.textures.get(&texture).map(|t| t.blend)
    }

    /// Current render target of `context`; `None` means its surface.
    pub fn render_target(&self, context: ContextHandle) -> Option<TextureHandle> {
        self.contexts.get(&context).and_then(|c| c.target)
    }

    //--- Internals --------------------------------------------------------

    fn next_raw(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    fn context(&self, context: ContextHandle) -> Result<&SoftContext, BackendError> {
        self.contexts.get(&context).ok_or(BackendError::UnknownHandle {
            kind: HandleKind::Context,
            raw: context.raw(),
        })
    }

    fn target_buffer_mut(&mut self, context: ContextHandle) -> Result<&mut RgbaImage, BackendError> {
        let (surface, target) = {
            let ctx = self.context(context)?;
            (ctx.surface, ctx.target)
        };

        match target {
            Some(texture) => self
                .textures
                .get_mut(&texture)
                .map(|t| &mut t.pixels)
                .ok_or(BackendError::UnknownHandle {
                    kind: HandleKind::Texture,
                    raw: texture.raw(),
                }),
            None => self
                .surfaces
                .get_mut(&surface)
                .map(|s| &mut s.back)
                .ok_or(BackendError::UnknownHandle {
                    kind: HandleKind::Surface,
                    raw: surface.raw(),
                }),
        }
    }

    fn insert_texture(&mut self, context: ContextHandle, pixels: RgbaImage, target: bool) -> TextureHandle {
        let handle = TextureHandle::from_raw(self.next_raw());
        let blend = if target { BlendMode::None } else { BlendMode::Blend };
        self.textures.insert(
            handle,
            SoftTexture {
                context,
                pixels,
                blend,
                target,
            },
        );
        handle
    }
}

//=== RenderBackend =======================================================

impl RenderBackend for SoftwareBackend {
    fn create_surface(&mut self, config: &WindowConfig) -> Result<SurfaceHandle, BackendError> {
        if self.fail_surfaces {
            return Err(BackendError::SurfaceCreation(format!(
                "surface for \"{}\" refused",
                config.title
            )));
        }
        if config.width == 0 || config.height == 0 {
            return Err(BackendError::SurfaceCreation(format!(
                "zero-sized surface {}x{}",
                config.width, config.height
            )));
        }
        if buffer_len(config.width, config.height).is_none() {
            return Err(BackendError::SurfaceCreation(format!(
                "surface {}x{} exceeds {MAX_BUFFER_BYTES} bytes",
                config.width, config.height
            )));
        }

        let handle = SurfaceHandle::from_raw(self.next_raw());
        let blank = RgbaImage::from_pixel(config.width, config.height, Color::BLACK.to_pixel());
        self.surfaces.insert(
            handle,
            SoftSurface {
                back: blank.clone(),
                front: blank,
                presents: 0,
            },
        );
        trace!(target: "graph", "Software surface {} created", handle.raw());
        Ok(handle)
    }

    fn create_context(&mut self, surface: SurfaceHandle) -> Result<ContextHandle, BackendError> {
        if self.fail_contexts {
            return Err(BackendError::ContextCreation(format!(
                "context for surface {} refused",
                surface.raw()
            )));
        }
        if !self.surfaces.contains_key(&surface) {
            return Err(BackendError::UnknownHandle {
                kind: HandleKind::Surface,
                raw: surface.raw(),
            });
        }

        let handle = ContextHandle::from_raw(self.next_raw());
        self.contexts.insert(
            handle,
            SoftContext {
                surface,
                target: None,
            },
        );
        Ok(handle)
    }

    fn destroy_context(&mut self, context: ContextHandle) {
        self.textures.retain(|_, t| t.context != context);
        self.contexts.remove(&context);
    }

    fn destroy_surface(&mut self, surface: SurfaceHandle) {
        self.surfaces.remove(&surface);
    }

    fn surface_size(&self, surface: SurfaceHandle) -> Option<(u32, u32)> {
        self.surfaces.get(&surface).map(|s| s.back.dimensions())
    }

    fn upload_image(
        &mut self,
        context: ContextHandle,
        image: &RgbaImage,
    ) -> Result<TextureHandle, BackendError> {
        self.context(context)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(BackendError::TextureCreation("image has no pixels".into()));
        }
        Ok(self.insert_texture(context, image.clone(), false))
    }

    fn create_target_texture(
        &mut self,
        context: ContextHandle,
        width: u32,
        height: u32,
    ) -> Result<TextureHandle, BackendError> {
        self.context(context)?;
        if width == 0 || height == 0 {
            return Err(BackendError::TextureCreation(format!(
                "zero-sized target {width}x{height}"
            )));
        }
        if buffer_len(width, height).is_none() {
            return Err(BackendError::TextureCreation(format!(
                "target {width}x{height} exceeds {MAX_BUFFER_BYTES} bytes"
            )));
        }
        let blank = RgbaImage::from_pixel(width, height, Color::TRANSPARENT.to_pixel());
        Ok(self.insert_texture(context, blank, true))
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(&texture).is_none() {
            return;
        }
        for ctx in self.contexts.values_mut() {
            if ctx.target == Some(texture) {
                ctx.target = None;
            }
        }
    }

    fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.textures.get(&texture).map(|t| t.pixels.dimensions())
    }

    fn set_texture_blend_mode(
        &mut self,
        texture: TextureHandle,
        mode: BlendMode,
    ) -> Result<(), BackendError> {
        let tex = self
            .textures
            .get_mut(&texture)
            .ok_or(BackendError::UnknownHandle {
                kind: HandleKind::Texture,
                raw: texture.raw(),
            })?;
        tex.blend = mode;
        Ok(())
    }

    fn compose_rect(
        &mut self,
        context: ContextHandle,
        texture: TextureHandle,
        src: Rect,
        dst: Rect,
        angle: f64,
        flip: Flip,
    ) -> Result<(), BackendError> {
        let (region, blend) = {
            let tex = self.textures.get(&texture).ok_or(BackendError::UnknownHandle {
                kind: HandleKind::Texture,
                raw: texture.raw(),
            })?;
            if tex.context != context {
                return Err(BackendError::ForeignTexture {
                    texture: texture.raw(),
                    context: context.raw(),
                });
            }
            match clip(src, tex.pixels.width(), tex.pixels.height()) {
                Some(src) => (
                    image::imageops::crop_imm(&tex.pixels, src.x as u32, src.y as u32, src.w, src.h)
                        .to_image(),
                    tex.blend,
                ),
                None => return Ok(()),
            }
        };

        if dst.is_empty() {
            return Ok(());
        }

        let target = self.target_buffer_mut(context)?;
        rasterize(target, &region, dst, angle, flip, blend);
        Ok(())
    }

    fn set_render_target(
        &mut self,
        context: ContextHandle,
        target: Option<TextureHandle>,
    ) -> Result<(), BackendError> {
        if let Some(texture) = target {
            if self.fail_targets {
                return Err(BackendError::TargetRedirect(format!(
                    "redirect of context {} to texture {} refused",
                    context.raw(),
                    texture.raw()
                )));
            }
            let tex = self.textures.get(&texture).ok_or(BackendError::UnknownHandle {
                kind: HandleKind::Texture,
                raw: texture.raw(),
            })?;
            if !tex.target {
                return Err(BackendError::NotATarget(texture.raw()));
            }
            if tex.context != context {
                return Err(BackendError::ForeignTexture {
                    texture: texture.raw(),
                    context: context.raw(),
                });
            }
        }

        let ctx = self
            .contexts
            .get_mut(&context)
            .ok_or(BackendError::UnknownHandle {
                kind: HandleKind::Context,
                raw: context.raw(),
            })?;
        ctx.target = target;
        Ok(())
    }

    fn clear(&mut self, context: ContextHandle, color: Color) -> Result<(), BackendError> {
        let pixel = color.to_pixel();
        for p in self.target_buffer_mut(context)?.pixels_mut() {
            *p = pixel;
        }
        Ok(())
    }

    fn present(&mut self, context: ContextHandle) -> Result<(), BackendError> {
        let surface = self.context(context)?.surface;
        let soft = self
            .surfaces
            .get_mut(&surface)
            .ok_or(BackendError::UnknownHandle {
                kind: HandleKind::Surface,
                raw: surface.raw(),
            })?;
        soft.front.clone_from(&soft.back);
        soft.presents += 1;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

//=== Rasterization =======================================================

/// Intersects `src` with a `width`x`height` texture.
fn clip(src: Rect, width: u32, height: u32) -> Option<Rect> {
    let x0 = i64::from(src.x).max(0);
    let y0 = i64::from(src.y).max(0);
    let x1 = (i64::from(src.x) + i64::from(src.w)).min(i64::from(width));
    let y1 = (i64::from(src.y) + i64::from(src.h)).min(i64::from(height));

    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(Rect::new(x0 as i32, y0 as i32, (x1 - x0) as u32, (y1 - y0) as u32))
}

fn rasterize(
    target: &mut RgbaImage,
    region: &RgbaImage,
    dst: Rect,
    angle: f64,
    flip: Flip,
    blend: BlendMode,
) {
    let (dw, dh) = (f64::from(dst.w), f64::from(dst.h));
    let cx = f64::from(dst.x) + dw / 2.0;
    let cy = f64::from(dst.y) + dh / 2.0;
    let (sin, cos) = angle.to_radians().sin_cos();

    // Half extents of the rotated quad's bounding box.
    let hx = (dw / 2.0 * cos).abs() + (dh / 2.0 * sin).abs();
    let hy = (dw / 2.0 * sin).abs() + (dh / 2.0 * cos).abs();

    let x0 = (cx - hx).floor().max(0.0) as u32;
    let y0 = (cy - hy).floor().max(0.0) as u32;
    let x1 = (cx + hx).ceil().min(f64::from(target.width())).max(0.0) as u32;
    let y1 = (cy + hy).ceil().min(f64::from(target.height())).max(0.0) as u32;

    let (sw, sh) = region.dimensions();

    for py in y0..y1 {
        for px in x0..x1 {
            let fx = f64::from(px) + 0.5 - cx;
            let fy = f64::from(py) + 0.5 - cy;

            // Inverse clockwise rotation back into the unrotated quad.
            let lx = fx * cos + fy * sin + dw / 2.0;
            let ly = -fx * sin + fy * cos + dh / 2.0;
            if lx < 0.0 || ly < 0.0 || lx >= dw || ly >= dh {
                continue;
            }

            let mut sx = ((lx / dw) * f64::from(sw)) as u32;
            let mut sy = ((ly / dh) * f64::from(sh)) as u32;
            sx = sx.min(sw - 1);
            sy = sy.min(sh - 1);
            match flip {
                Flip::Horizontal => sx = sw - 1 - sx,
                Flip::Vertical => sy = sh - 1 - sy,
                Flip::None => {}
            }

            let src_px = *region.get_pixel(sx, sy);
            let dst_px = target.get_pixel_mut(px, py);
            *dst_px = blend_pixel(src_px, *dst_px, blend);
        }
    }
}

fn blend_pixel(src: Rgba<u8>, dst: Rgba<u8>, mode: BlendMode) -> Rgba<u8> {
    let s = src.0.map(|c| f32::from(c) / 255.0);
    let d = dst.0.map(|c| f32::from(c) / 255.0);
    let sa = s[3];

    let out = match mode {
        BlendMode::None => s,
        BlendMode::Blend => [
            s[0] * sa + d[0] * (1.0 - sa),
            s[1] * sa + d[1] * (1.0 - sa),
            s[2] * sa + d[2] * (1.0 - sa),
            sa + d[3] * (1.0 - sa),
        ],
        BlendMode::Add => [s[0] * sa + d[0], s[1] * sa + d[1], s[2] * sa + d[2], d[3]],
        BlendMode::Mod => [s[0] * d[0], s[1] * d[1], s[2] * d[2], d[3]],
        BlendMode::Mul => [
            s[0] * d[0] + d[0] * (1.0 - sa),
            s[1] * d[1] + d[1] * (1.0 - sa),
            s[2] * d[2] + d[2] * (1.0 - sa),
            d[3],
        ],
    };

    Rgba(out.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
}

//=========================================================================
// Unit Tests
//=========================================================================
