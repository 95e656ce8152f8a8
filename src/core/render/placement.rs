//=========================================================================
// Placement
//=========================================================================
//
// Spatial attributes of one draw: position, size, rotation, flips.
// Shared by entities and tile-map draw entries.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use super::backend::{Flip, Rect};

//=== Placement ===========================================================

/// Where and how a tile is drawn.
///
/// In scale mode (`scale == true`) `h` and `w` are multipliers applied to
/// the tile's source size; otherwise they are the destination size in
/// pixels. `angle` is in degrees, clockwise, about the destination centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub h: f64,
    pub w: f64,
    pub angle: f64,
    pub scale: bool,
    pub flip_v: bool,
    pub flip_h: bool,
}

impl Placement {
    /// Placement at `(x, y)` with otherwise default attributes.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    /// Sets height and width (multipliers in scale mode).
    pub fn with_size(mut self, h: f64, w: f64) -> Self {
        self.h = h;
        self.w = w;
        self
    }

    /// Selects scale mode or literal pixel sizes.
    pub fn with_scale(mut self, scale: bool) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_flips(mut self, flip_v: bool, flip_h: bool) -> Self {
        self.flip_v = flip_v;
        self.flip_h = flip_h;
        self
    }

    /// Same placement moved by `(dx, dy)`.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Flip mode to apply; vertical wins over horizontal.
    pub fn flip(&self) -> Flip {
        Flip::from_flags(self.flip_v, self.flip_h)
    }

    /// Destination rectangle for a draw of `src`.
    ///
    /// Coordinates and sizes are truncated toward zero; negative sizes
    /// clamp to zero.
    pub fn destination(&self, src: Rect) -> Rect {
        let (w, h) = if self.scale {
            (f64::from(src.w) * self.w, f64::from(src.h) * self.h)
        } else {
            (self.w, self.h)
        };

        Rect::new(self.x as i32, self.y as i32, w as u32, h as u32)
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            h: 1.0,
            w: 1.0,
            angle: 0.0,
            scale: true,
            flip_v: false,
            flip_h: false,
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unit_scale_at_origin() {
        let p = Placement::default();
        assert_eq!((p.x, p.y), (0.0, 0.0));
        assert_eq!((p.h, p.w), (1.0, 1.0));
        assert_eq!(p.angle, 0.0);
        assert!(p.scale);
        assert!(!p.flip_v && !p.flip_h);
    }

    #[test]
    fn scale_mode_multiplies_source_size() {
        // Tile 10 high, 20 wide drawn with h = 2, w = 3.
        let src = Rect::new(0, 0, 20, 10);
        let dst = Placement::at(5.0, 7.0).with_size(2.0, 3.0).destination(src);

        assert_eq!(dst, Rect::new(5, 7, 60, 20));
    }

    #[test]
    fn literal_mode_uses_size_directly() {
        let src = Rect::new(0, 0, 20, 10);
        let dst = Placement::at(1.0, 1.0)
            .with_scale(false)
            .with_size(4.0, 9.0)
            .destination(src);

        assert_eq!(dst, Rect::new(1, 1, 9, 4));
    }

    #[test]
    fn negative_size_clamps_to_empty() {
        let dst = Placement::default()
            .with_size(-1.0, 2.0)
            .destination(Rect::new(0, 0, 4, 4));
        assert!(dst.is_empty());
    }

    #[test]
    fn translated_keeps_other_attributes() {
        let p = Placement::at(1.0, 2.0).with_angle(45.0).translated(-1.0, 3.0);
        assert_eq!((p.x, p.y), (0.0, 5.0));
        assert_eq!(p.angle, 45.0);
    }

    #[test]
    fn both_flips_resolve_to_vertical() {
        let p = Placement::default().with_flips(true, true);
        assert_eq!(p.flip(), Flip::Vertical);
    }
}
