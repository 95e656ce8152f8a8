//=========================================================================
// Scene Flow Integration Tests
//=========================================================================
//
// Drives the engine through its public API: scenes load resources in
// `on_enter`, spawn entities, layer over each other, and are rendered
// into a software-backed window whose pixels are checked.
//
//=========================================================================

use std::cell::RefCell;
use std::rc::Rc;

use image::{Rgba, RgbaImage};
use mosaic_engine::prelude::*;

type Log = Rc<RefCell<Vec<String>>>;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn drain(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.borrow_mut())
}

//=== Fixtures ============================================================

/// Entity drawing one tile, moving right by one pixel per update.
struct Walker {
    base: EntityBase,
    log: Log,
    tag: &'static str,
}

impl Entity for Walker {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn update(&mut self, _ctx: &mut SceneContext<'_>) {
        self.base.placement.x += 1.0;
        self.log.borrow_mut().push(format!("update {}", self.tag));
    }
}

/// Scene with one full-size tile entity of a solid color.
struct Layer {
    tag: &'static str,
    window: WindowId,
    color: Rgba<u8>,
    size: (u32, u32),
    log: Log,
    entities: EntityContainer,
}

impl Layer {
    fn new(tag: &'static str, window: WindowId, color: Rgba<u8>, size: (u32, u32), log: &Log) -> Self {
        Self {
            tag,
            window,
            color,
            size,
            log: Rc::clone(log),
            entities: EntityContainer::new(),
        }
    }
}

impl Scene for Layer {
    fn entities(&self) -> &EntityContainer {
        &self.entities
    }

    fn entities_mut(&mut self) -> &mut EntityContainer {
        &mut self.entities
    }

    fn on_enter(&mut self, ctx: &mut SceneContext<'_>) {
        self.log.borrow_mut().push(format!("enter {}", self.tag));

        let graph = ctx.graph();
        let (w, h) = self.size;
        assert!(graph.add_texture(self.window, self.tag, &RgbaImage::from_pixel(w, h, self.color)));
        assert!(graph.create_tile(self.window, self.tag, self.tag, 0, 0, 0, 0));

        let mut walker = Walker {
            base: EntityBase::new(),
            log: Rc::clone(&self.log),
            tag: self.tag,
        };
        walker.base.add_frame("idle", Frame::new(self.tag, self.window));
        walker.base.set_frame("idle");
        assert!(self.entities.spawn(self.tag, walker));
    }

    fn on_exit(&mut self, ctx: &mut SceneContext<'_>) {
        self.log.borrow_mut().push(format!("exit {}", self.tag));
        self.entities.clear();
        ctx.graph().remove_tile(self.window, self.tag);
        ctx.graph().remove_texture(self.window, self.tag);
    }

    fn render(&self, globals: &mut GlobalContext) {
        self.log.borrow_mut().push(format!("render {}", self.tag));
        self.entities.render(&mut globals.graph);
    }

    fn name(&self) -> &str {
        self.tag
    }
}

fn front_pixel(engine: &Engine, window: WindowId, x: u32, y: u32) -> Rgba<u8> {
    let surface = engine.graph().surface(window).unwrap();
    let backend = engine
        .graph()
        .backend()
        .as_any()
        .downcast_ref::<SoftwareBackend>()
        .unwrap();
    *backend.front_buffer(surface).unwrap().get_pixel(x, y)
}

//=== Scenarios ===========================================================

#[test]
fn overlay_scene_updates_alone_and_renders_on_top() {
    init_logging();
    let log = Log::default();
    let mut engine = EngineBuilder::new()
        .with_window(WindowConfig::new("main", 16, 16))
        .build();
    let window = engine.window(0).unwrap();

    // A enters on the first update, then updates alone.
    engine.states_mut().push(Layer::new("a", window, RED, (16, 16), &log));
    assert_eq!(engine.states().len(), 0, "push is deferred");
    engine.update();
    assert_eq!(drain(&log), ["enter a", "update a"]);
    engine.update();
    assert_eq!(drain(&log), ["update a"]);

    // B overlays A; A is left alone while B enters.
    engine.states_mut().push(Layer::new("b", window, GREEN, (4, 4), &log));
    engine.update();
    assert_eq!(drain(&log), ["enter b", "update b"]);
    assert_eq!(engine.states().state(), StackState::Layered);

    engine.update();
    engine.render();
    assert_eq!(drain(&log), ["update b", "render a", "render b"]);

    // a walked 2px right: first column still cleared black.
    assert_eq!(front_pixel(&engine, window, 0, 8), Rgba([0, 0, 0, 255]));
    assert_eq!(front_pixel(&engine, window, 10, 10), RED);
    // b walked 2px right, 4x4 green drawn over a.
    assert_eq!(front_pixel(&engine, window, 3, 1), GREEN);
    assert_eq!(front_pixel(&engine, window, 7, 1), RED);

    engine.shutdown();
    assert_eq!(drain(&log), ["exit b", "exit a"]);
}

#[test]
fn popping_overlay_reveals_scene_beneath() {
    init_logging();
    let log = Log::default();
    let mut engine = EngineBuilder::new()
        .with_window(WindowConfig::new("main", 8, 8))
        .build();
    let window = engine.window(0).unwrap();

    engine.states_mut().push(Layer::new("a", window, RED, (8, 8), &log));
    engine.states_mut().push(Layer::new("b", window, GREEN, (8, 8), &log));
    engine.frame();
    assert_eq!(front_pixel(&engine, window, 5, 5), GREEN);

    engine.states_mut().pop();
    engine.frame();
    assert_eq!(engine.states().scene_names(), ["a"]);
    assert_eq!(front_pixel(&engine, window, 5, 5), RED);
    assert!(!engine.graph().contains_texture(window, "b"), "b released its texture");
}

#[test]
fn named_scenes_and_empty_pool() {
    init_logging();
    let log = Log::default();
    let gen_log = Rc::clone(&log);

    let mut engine = EngineBuilder::new().build().init(move |engine| {
        let window = engine
            .create_window(&WindowConfig::new("main", 8, 8))
            .unwrap();
        engine.states_mut().add_generator("title", move || {
            Box::new(Layer::new("title", window, RED, (2, 2), &gen_log)) as Box<dyn Scene>
        });
        assert!(engine.states_mut().push_named("title"));
    });

    engine.frame();
    assert_eq!(engine.states().state(), StackState::Single);

    engine.states_mut().pop();
    engine.frame();
    assert_eq!(engine.states().state(), StackState::Empty);

    // Nothing left to update or render; still fine.
    engine.frame();
    assert_eq!(drain(&log), ["enter title", "update title", "render title", "exit title"]);
}

#[test]
fn tile_map_baked_inside_scene() {
    init_logging();

    struct Baker {
        window: WindowId,
        entities: EntityContainer,
    }

    impl Scene for Baker {
        fn entities(&self) -> &EntityContainer {
            &self.entities
        }

        fn entities_mut(&mut self) -> &mut EntityContainer {
            &mut self.entities
        }

        fn on_enter(&mut self, ctx: &mut SceneContext<'_>) {
            let GlobalContext { graph, tile_maps } = ctx.globals();
            graph.add_texture(self.window, "sheet", &RgbaImage::from_pixel(4, 4, RED));
            graph.create_tile(self.window, "sheet", "t", 0, 0, 0, 0);

            let mut map = TileMap::new(self.window);
            map.add_draw_info("t", Placement::at(0.0, 0.0));
            map.add_draw_info("t", Placement::at(4.0, 0.0));
            tile_maps.add_map("row", map);
            assert!(tile_maps.blend_to_texture("row", "baked", graph));
        }
    }

    let mut engine = EngineBuilder::new()
        .with_window(WindowConfig::new("main", 16, 16))
        .build();
    let window = engine.window(0).unwrap();

    engine.states_mut().push(Baker {
        window,
        entities: EntityContainer::new(),
    });
    engine.frame();

    assert_eq!(engine.graph().texture_size(window, "baked"), Some((8, 4)));
    assert_eq!(engine.graph().render_target(window), None);
}
