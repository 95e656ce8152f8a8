//=========================================================================
// Tile Maps
//=========================================================================
//
// Named groups of tile placements that draw as one unit, or bake into a
// single off-screen texture.
//
// A map belongs to one window and refers to tiles by id. It never owns
// tiles or textures, so removing a map leaves the graph untouched.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::{BTreeMap, HashMap};

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use super::backend::Rect;
use super::graph::ResourceGraph;
use super::placement::Placement;
use super::window::WindowId;

//=== TileMap =============================================================

/// Tile placements for one window, keyed by tile id.
#[derive(Debug, Clone)]
pub struct TileMap {
    window: WindowId,
    draws: BTreeMap<String, Vec<Placement>>,
}

impl TileMap {
    /// Creates an empty map for `window`.
    pub fn new(window: WindowId) -> Self {
        Self {
            window,
            draws: BTreeMap::new(),
        }
    }

    /// Window whose tiles the map draws.
    pub fn window(&self) -> WindowId {
        self.window
    }

    /// Appends a placement of `tile_id`. Earlier placements are kept.
    pub fn add_draw_info(&mut self, tile_id: impl Into<String>, placement: Placement) {
        self.draws.entry(tile_id.into()).or_default().push(placement);
    }

    /// Placements of `tile_id` in insertion order.
    pub fn placements(&self, tile_id: &str) -> &[Placement] {
        self.draws.get(tile_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of placements across all tiles.
    pub fn len(&self) -> usize {
        self.draws.values().map(Vec::len).sum()
    }

    /// Returns `true` if the map has no placement.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Moves every placement by `(dx, dy)`.
    pub fn move_by(&mut self, dx: f64, dy: f64) {
        for placement in self.draws.values_mut().flatten() {
            *placement = placement.translated(dx, dy);
        }
    }

    /// Draws every placement. Returns `false` if any draw failed.
    pub fn draw(&self, graph: &mut ResourceGraph) -> bool {
        self.draw_offset(graph, 0.0, 0.0)
    }

    fn draw_offset(&self, graph: &mut ResourceGraph, dx: f64, dy: f64) -> bool {
        let mut all_drawn = true;
        for (tile_id, placements) in &self.draws {
            for placement in placements {
                all_drawn &= graph.draw(self.window, tile_id, &placement.translated(dx, dy));
            }
        }
        all_drawn
    }

    /// Smallest rectangle covering every placement with a known tile.
    ///
    /// Rotation is ignored. Returns `None` when nothing can be measured
    /// or the covered span does not fit a `u32`.
    pub fn bounds(&self, graph: &ResourceGraph) -> Option<Rect> {
        let mut extent: Option<(i64, i64, i64, i64)> = None;

        for (tile_id, placements) in &self.draws {
            let Some(tile) = graph.tile(self.window, tile_id) else {
                warn!(target: "graph", "Tile \"{tile_id}\" missing from window {}, skipped in map bounds", self.window);
                continue;
            };
            for placement in placements {
                let dst = placement.destination(tile.rect());
                if dst.is_empty() {
                    continue;
                }
                let (x0, y0) = (i64::from(dst.x), i64::from(dst.y));
                let (x1, y1) = (x0 + i64::from(dst.w), y0 + i64::from(dst.h));
                extent = Some(match extent {
                    None => (x0, y0, x1, y1),
                    Some((ax0, ay0, ax1, ay1)) => (ax0.min(x0), ay0.min(y0), ax1.max(x1), ay1.max(y1)),
                });
            }
        }

        let (x0, y0, x1, y1) = extent?;
        match (u32::try_from(x1 - x0), u32::try_from(y1 - y0)) {
            // Corners come from `i32` destinations, so only the span can overflow.
            (Ok(w), Ok(h)) => Some(Rect::new(x0 as i32, y0 as i32, w, h)),
            _ => {
                warn!(target: "graph", "Tile map in window {} spans more than {} pixels", self.window, u32::MAX);
                None
            }
        }
    }

    /// Bakes the map into a new target texture exactly covering its
    /// bounds, with the bounds' top-left corner at the texture origin.
    ///
    /// The window's visible surface is the render target afterwards. If
    /// drawing cannot be redirected the new texture is removed again.
    pub fn blend_to_texture(&self, graph: &mut ResourceGraph, texture_id: &str) -> bool {
        let Some(bounds) = self.bounds(graph) else {
            warn!(target: "graph", "Tile map in window {} has nothing to blend", self.window);
            return false;
        };
        if !graph.allocate_target_texture(self.window, texture_id, bounds.h, bounds.w) {
            return false;
        }

        let (dx, dy) = (-f64::from(bounds.x), -f64::from(bounds.y));
        let Some(drawn) = graph.with_render_target(self.window, texture_id, |graph| self.draw_offset(graph, dx, dy))
        else {
            graph.remove_texture(self.window, texture_id);
            return false;
        };

        debug!(
            target: "graph",
            "Tile map blended into \"{texture_id}\" ({}x{}) in window {}",
            bounds.w, bounds.h, self.window
        );
        drawn
    }
}

//=== TileMapRegistry =====================================================

/// Tile maps by id.
#[derive(Debug, Default)]
pub struct TileMapRegistry {
    maps: HashMap<String, TileMap>,
}

impl TileMapRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a map. An id already in use is rejected.
    pub fn add_map(&mut self, map_id: impl Into<String>, map: TileMap) -> bool {
        let map_id = map_id.into();
        if self.maps.contains_key(&map_id) {
            warn!(target: "graph", "Tile map \"{map_id}\" already exists, new map rejected");
            return false;
        }
        self.maps.insert(map_id, map);
        true
    }

    /// Appends a placement to the map `map_id`. Returns `false` if it does not exist.
    pub fn add_draw_info(&mut self, map_id: &str, tile_id: &str, placement: Placement) -> bool {
        match self.maps.get_mut(map_id) {
            Some(map) => {
                map.add_draw_info(tile_id, placement);
                true
            }
            None => {
                warn!(target: "graph", "Tile map \"{map_id}\" does not exist");
                false
            }
        }
    }

    /// Removes and returns the map `map_id`.
    pub fn remove_map(&mut self, map_id: &str) -> Option<TileMap> {
        self.maps.remove(map_id)
    }

    /// Returns the map `map_id`.
    pub fn get(&self, map_id: &str) -> Option<&TileMap> {
        self.maps.get(map_id)
    }

    /// Returns the map `map_id` mutably.
    pub fn get_mut(&mut self, map_id: &str) -> Option<&mut TileMap> {
        self.maps.get_mut(map_id)
    }

    /// Returns the number of registered maps.
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// Returns `true` if no map is registered.
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Draws the map `map_id`. See [`TileMap::draw`].
    pub fn draw_map(&self, map_id: &str, graph: &mut ResourceGraph) -> bool {
        match self.maps.get(map_id) {
            Some(map) => map.draw(graph),
            None => {
                warn!(target: "graph", "Tile map \"{map_id}\" does not exist");
                false
            }
        }
    }

    /// Bakes the map `map_id`. See [`TileMap::blend_to_texture`].
    pub fn blend_to_texture(&self, map_id: &str, texture_id: &str, graph: &mut ResourceGraph) -> bool {
        match self.maps.get(map_id) {
            Some(map) => map.blend_to_texture(graph, texture_id),
            None => {
                warn!(target: "graph", "Tile map \"{map_id}\" does not exist");
                false
            }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::render::{SoftwareBackend, WindowConfig};
    use image::{Rgba, RgbaImage};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn graph_with_tile() -> (ResourceGraph, WindowId) {
        let mut graph = ResourceGraph::default();
        let window = graph.create_window(&WindowConfig::new("map", 64, 64)).unwrap();
        graph.add_texture(window, "sheet", &RgbaImage::from_pixel(10, 10, RED));
        graph.create_tile(window, "sheet", "grass", 0, 0, 0, 0);
        (graph, window)
    }

    fn two_tile_map(window: WindowId) -> TileMap {
        let mut map = TileMap::new(window);
        map.add_draw_info("grass", Placement::at(10.0, 10.0));
        map.add_draw_info("grass", Placement::at(30.0, 20.0));
        map
    }

    #[test]
    fn draw_info_appends() {
        let map = two_tile_map(WindowId(1));
        assert_eq!(map.placements("grass").len(), 2);
        assert_eq!(map.len(), 2);
        assert!(map.placements("dirt").is_empty());
    }

    #[test]
    fn bounds_cover_all_placements() {
        let (graph, window) = graph_with_tile();
        let map = two_tile_map(window);

        assert_eq!(map.bounds(&graph), Some(Rect::new(10, 10, 30, 20)));
    }

    #[test]
    fn bounds_skip_unknown_tiles() {
        let (graph, window) = graph_with_tile();
        let mut map = TileMap::new(window);
        map.add_draw_info("ghost", Placement::default());

        assert_eq!(map.bounds(&graph), None);
    }

    #[test]
    fn move_by_shifts_everything() {
        let (graph, window) = graph_with_tile();
        let mut map = two_tile_map(window);
        map.move_by(-10.0, 5.0);

        assert_eq!(map.bounds(&graph), Some(Rect::new(0, 15, 30, 20)));
    }

    #[test]
    fn blend_bakes_map_at_origin() {
        let (mut graph, window) = graph_with_tile();
        let map = two_tile_map(window);

        assert!(map.blend_to_texture(&mut graph, "baked"));
        assert_eq!(graph.texture_size(window, "baked"), Some((30, 20)));
        assert_eq!(graph.render_target(window), None, "visible surface restored");
        assert_eq!(map.placements("grass")[0], Placement::at(10.0, 10.0), "map not mutated");

        let handle = graph.texture_handle(window, "baked").unwrap();
        let backend = graph.backend().as_any().downcast_ref::<SoftwareBackend>().unwrap();
        let baked = backend.texture_pixels(handle).unwrap();
        assert_eq!(*baked.get_pixel(0, 0), RED);
        assert_eq!(*baked.get_pixel(29, 19), RED);
        assert_eq!(baked.get_pixel(25, 0).0[3], 0, "gap between tiles stays transparent");
    }

    #[test]
    fn empty_map_does_not_blend() {
        let (mut graph, window) = graph_with_tile();
        assert!(!TileMap::new(window).blend_to_texture(&mut graph, "baked"));
        assert!(!graph.contains_texture(window, "baked"));
    }

    #[test]
    fn span_wider_than_u32_has_no_bounds() {
        let (mut graph, window) = graph_with_tile();
        let mut map = TileMap::new(window);
        map.add_draw_info("grass", Placement::at(-2.0e9, 0.0));
        map.add_draw_info("grass", Placement::at(2.0e9, 0.0).with_scale(false).with_size(10.0, 2.0e9));

        assert_eq!(map.bounds(&graph), None);
        assert!(!map.blend_to_texture(&mut graph, "baked"));
        assert!(!graph.contains_texture(window, "baked"));
    }

    #[test]
    fn failed_redirect_removes_baked_texture() {
        let mut graph = ResourceGraph::new(Box::new(SoftwareBackend::new().with_render_target_failure()));
        let window = graph.create_window(&WindowConfig::new("map", 64, 64)).unwrap();
        graph.add_texture(window, "sheet", &RgbaImage::from_pixel(10, 10, RED));
        graph.create_tile(window, "sheet", "grass", 0, 0, 0, 0);

        assert!(!two_tile_map(window).blend_to_texture(&mut graph, "baked"));
        assert!(!graph.contains_texture(window, "baked"));
        assert_eq!(graph.render_target(window), None);
    }

    #[test]
    fn registry_rejects_duplicates() {
        let mut registry = TileMapRegistry::new();
        assert!(registry.add_map("world", TileMap::new(WindowId(1))));
        assert!(!registry.add_map("world", TileMap::new(WindowId(2))));
        assert_eq!(registry.get("world").map(TileMap::window), Some(WindowId(1)));
    }

    #[test]
    fn registry_draws_and_removes() {
        let (mut graph, window) = graph_with_tile();
        let mut registry = TileMapRegistry::new();
        registry.add_map("world", TileMap::new(window));

        assert!(registry.add_draw_info("world", "grass", Placement::at(5.0, 5.0)));
        assert!(!registry.add_draw_info("nowhere", "grass", Placement::default()));
        assert!(registry.draw_map("world", &mut graph));
        assert!(!registry.draw_map("nowhere", &mut graph));

        assert!(registry.remove_map("world").is_some());
        assert!(registry.is_empty());
        assert!(graph.tile(window, "grass").is_some(), "tiles outlive maps");
    }
}
