//=========================================================================
// Tile
//=========================================================================

//=== Internal Dependencies ===============================================

use super::backend::Rect;

//=== Tile ================================================================

/// A rectangular region of a texture, addressed by texture id.
///
/// Tiles are plain values. The texture is resolved by id in the owning
/// window at draw time, so the same tile can be added to several windows
/// that each hold a texture under that id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub texture_id: String,
    pub x: i32,
    pub y: i32,
    pub h: u32,
    pub w: u32,
}

impl Tile {
    pub fn new(texture_id: impl Into<String>, x: i32, y: i32, h: u32, w: u32) -> Self {
        Self {
            texture_id: texture_id.into(),
            x,
            y,
            h,
            w,
        }
    }

    /// Source rectangle within the texture.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_swaps_into_width_height_order() {
        let tile = Tile::new("sheet", 4, 8, 10, 20);
        assert_eq!(tile.rect(), Rect::new(4, 8, 20, 10));
    }
}
