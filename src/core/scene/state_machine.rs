//=========================================================================
// State Machine
//=========================================================================
//
// Owns the scene pool and applies queued transitions between ticks.
//
// Only the top scene updates; every scene in the pool renders, bottom
// first, so a scene pushed over another draws as an overlay.
//
// Transition processing:
//   update() takes the whole queue, then applies it in FIFO order:
//     Push(scene) → pool.push(scene), scene.on_enter()
//     Pop         → top.on_exit(), release leftover entities, drop
//   Transitions queued while the drain runs wait for the next update.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, info, warn};

//=== Internal Dependencies ===============================================

use super::{GeneratorRegistry, Scene, SceneContext, Transition, TransitionQueue};
use crate::core::globals::GlobalContext;

//=== StackState ==========================================================

/// Depth of the scene pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackState {
    /// No scenes.
    Empty,
    /// Exactly one scene.
    Single,
    /// Two or more scenes; upper ones draw over lower ones.
    Layered,
}

//=== StateMachine ========================================================

/// Scene pool with a deferred change queue and named scene generators.
///
/// # Example
///
/// ```rust
/// # use mosaic_engine::prelude::*;
/// # #[derive(Default)]
/// # struct Title { entities: EntityContainer }
/// # impl Scene for Title {
/// #     fn entities(&self) -> &EntityContainer { &self.entities }
/// #     fn entities_mut(&mut self) -> &mut EntityContainer { &mut self.entities }
/// #     fn on_enter(&mut self, _ctx: &mut SceneContext<'_>) {}
/// # }
/// let mut globals = GlobalContext::default();
/// let mut states = StateMachine::new();
///
/// states.push(Title::default());
/// assert_eq!(states.state(), StackState::Empty, "nothing happens until update");
///
/// states.update(&mut globals);
/// assert_eq!(states.state(), StackState::Single);
/// ```
#[derive(Default)]
pub struct StateMachine {
    pool: Vec<Box<dyn Scene>>,
    changes: TransitionQueue,
    generators: GeneratorRegistry,
}

impl StateMachine {
    //--- Construction -----------------------------------------------------

    /// Creates a state machine with an empty pool and no generators.
    pub fn new() -> Self {
        Self::default()
    }

    //--- Generators -------------------------------------------------------

    /// Registers a named scene factory. The first registration wins.
    pub fn add_generator<F>(&mut self, id: impl Into<String>, generator: F) -> bool
    where
        F: Fn() -> Box<dyn Scene> + 'static,
    {
        self.generators.add(id, generator)
    }

    /// Forgets the generator registered under `id`.
    pub fn remove_generator(&mut self, id: &str) -> bool {
        self.generators.remove(id)
    }

    /// Returns `true` if a generator is registered under `id`.
    pub fn has_generator(&self, id: &str) -> bool {
        self.generators.contains(id)
    }

    //--- Transition Requests ----------------------------------------------

    /// Queues `scene` to be entered on the next update.
    pub fn push<S: Scene + 'static>(&mut self, scene: S) {
        self.push_boxed(Box::new(scene));
    }

    /// Queues an already boxed scene to be entered.
    pub fn push_boxed(&mut self, scene: Box<dyn Scene>) {
        self.changes.push(Transition::Push(scene));
    }

    /// Queues a fresh scene from the generator registered under `id`.
    ///
    /// Returns `false`, queuing nothing, if no such generator exists.
    pub fn push_named(&mut self, id: &str) -> bool {
        match self.generators.generate(id) {
            Some(scene) => {
                self.changes.push(Transition::Push(scene));
                true
            }
            None => false,
        }
    }

    /// Queues removal of the top scene on the next update.
    pub fn pop(&mut self) {
        self.changes.push(Transition::Pop);
    }

    //--- Queries ----------------------------------------------------------

    /// Returns the shape of the pool.
    pub fn state(&self) -> StackState {
        match self.pool.len() {
            0 => StackState::Empty,
            1 => StackState::Single,
            _ => StackState::Layered,
        }
    }

    /// Returns the number of scenes in the pool.
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Returns `true` if no scene is in the pool.
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Number of transitions waiting for the next update.
    pub fn pending_changes(&self) -> usize {
        self.changes.len()
    }

    /// Returns the scene that receives updates, if any.
    pub fn top(&self) -> Option<&dyn Scene> {
        self.pool.last().map(|scene| scene.as_ref())
    }

    /// Scene names from bottom to top.
    pub fn scene_names(&self) -> Vec<&str> {
        self.pool.iter().map(|scene| scene.name()).collect()
    }

    //--- Frame ------------------------------------------------------------

    /// Applies every queued transition, then updates the top scene.
    pub fn update(&mut self, globals: &mut GlobalContext) {
        self.apply_changes(globals);

        let Self {
            pool,
            changes,
            generators,
        } = self;

        let Some(top) = pool.last_mut() else {
            warn!(target: "scene", "No scenes to update");
            return;
        };
        let mut ctx = SceneContext::new(globals, changes, generators);
        top.update(&mut ctx);
    }

    /// Renders every scene from bottom to top.
    pub fn render(&self, globals: &mut GlobalContext) {
        if self.pool.is_empty() {
            warn!(target: "scene", "No scenes to render");
            return;
        }

        for scene in &self.pool {
            scene.render(globals);
        }
    }

    /// Exits every scene top to bottom and drops queued transitions.
    pub fn shutdown(&mut self, globals: &mut GlobalContext) {
        if !self.changes.is_empty() {
            debug!(target: "scene", "Discarding {} queued scene change(s)", self.changes.len());
            self.changes.clear();
        }

        info!(target: "scene", "Shutting down {} scene(s)", self.pool.len());
        while !self.pool.is_empty() {
            self.exit_top(globals);
        }
        // Exit hooks may have queued more changes.
        self.changes.clear();
    }

    //--- Transition Processing --------------------------------------------

    fn apply_changes(&mut self, globals: &mut GlobalContext) {
        let changes = self.changes.take();
        if changes.is_empty() {
            return;
        }

        debug!(target: "scene", "Applying {} scene change(s)", changes.len());
        for change in changes {
            match change {
                Transition::Push(scene) => self.enter(scene, globals),
                Transition::Pop => self.exit_top(globals),
            }
        }
    }

    fn enter(&mut self, scene: Box<dyn Scene>, globals: &mut GlobalContext) {
        debug!(target: "scene", "Entering scene {}", scene.name());
        self.pool.push(scene);

        let Self {
            pool,
            changes,
            generators,
        } = self;
        if let Some(top) = pool.last_mut() {
            let mut ctx = SceneContext::new(globals, changes, generators);
            top.on_enter(&mut ctx);
        }
    }

    fn exit_top(&mut self, globals: &mut GlobalContext) {
        let Self {
            pool,
            changes,
            generators,
        } = self;

        let Some(top) = pool.last_mut() else {
            warn!(target: "scene", "Pop requested with no scenes in the pool, ignored");
            return;
        };

        debug!(target: "scene", "Exiting scene {}", top.name());
        let mut ctx = SceneContext::new(globals, changes, generators);
        top.on_exit(&mut ctx);

        let leftover = top.entities().len();
        if leftover > 0 {
            warn!(
                target: "scene",
                "Scene {} kept {leftover} entities after exiting, releasing them",
                top.name()
            );
            top.entities_mut().clear();
        }

        pool.pop();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::{Entity, EntityBase, EntityContainer};
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    //--- Fixtures ---------------------------------------------------------

    /// Scene recording every hook into a shared log.
    struct Probe {
        tag: &'static str,
        log: Log,
        entities: EntityContainer,
        on_enter: Option<Box<dyn FnMut(&mut SceneContext<'_>)>>,
        on_update: Option<Box<dyn FnMut(&mut SceneContext<'_>)>>,
        keep_entities: bool,
    }

    impl Probe {
        fn new(tag: &'static str, log: &Log) -> Self {
            Self {
                tag,
                log: Rc::clone(log),
                entities: EntityContainer::new(),
                on_enter: None,
                on_update: None,
                keep_entities: false,
            }
        }

        fn entering(mut self, f: impl FnMut(&mut SceneContext<'_>) + 'static) -> Self {
            self.on_enter = Some(Box::new(f));
            self
        }

        fn updating(mut self, f: impl FnMut(&mut SceneContext<'_>) + 'static) -> Self {
            self.on_update = Some(Box::new(f));
            self
        }
    }

    impl Scene for Probe {
        fn entities(&self) -> &EntityContainer {
            &self.entities
        }

        fn entities_mut(&mut self) -> &mut EntityContainer {
            &mut self.entities
        }

        fn on_enter(&mut self, ctx: &mut SceneContext<'_>) {
            self.log.borrow_mut().push(format!("enter {}", self.tag));
            if let Some(f) = self.on_enter.as_mut() {
                f(ctx);
            }
        }

        fn on_exit(&mut self, _ctx: &mut SceneContext<'_>) {
            self.log.borrow_mut().push(format!("exit {}", self.tag));
            if !self.keep_entities {
                self.entities.clear();
            }
        }

        fn update(&mut self, ctx: &mut SceneContext<'_>) {
            self.log.borrow_mut().push(format!("update {}", self.tag));
            if let Some(f) = self.on_update.as_mut() {
                f(ctx);
            }
        }

        fn render(&self, _globals: &mut GlobalContext) {
            self.log.borrow_mut().push(format!("render {}", self.tag));
        }

        fn name(&self) -> &str {
            self.tag
        }
    }

    struct Dummy(EntityBase);

    impl Entity for Dummy {
        fn base(&self) -> &EntityBase {
            &self.0
        }

        fn base_mut(&mut self) -> &mut EntityBase {
            &mut self.0
        }
    }

    fn drain(log: &Log) -> Vec<String> {
        std::mem::take(&mut *log.borrow_mut())
    }

    //--- Deferral ---------------------------------------------------------

    #[test]
    fn requests_do_nothing_until_update() {
        let log = Log::default();
        let mut globals = GlobalContext::default();
        let mut states = StateMachine::new();

        states.push(Probe::new("a", &log));
        states.pop();
        assert_eq!(states.state(), StackState::Empty);
        assert_eq!(states.pending_changes(), 2);
        assert!(log.borrow().is_empty(), "no hooks ran");

        states.update(&mut globals);
        assert_eq!(drain(&log), ["enter a", "exit a"]);
        assert_eq!(states.pending_changes(), 0);
        assert_eq!(states.state(), StackState::Empty);
    }

    #[test]
    fn changes_apply_in_fifo_order() {
        let log = Log::default();
        let mut globals = GlobalContext::default();
        let mut states = StateMachine::new();

        states.push(Probe::new("a", &log));
        states.push(Probe::new("b", &log));
        states.pop();
        states.update(&mut globals);

        assert_eq!(drain(&log), ["enter a", "enter b", "exit b", "update a"]);
        assert_eq!(states.scene_names(), ["a"]);
    }

    #[test]
    fn only_top_updates_but_all_render() {
        let log = Log::default();
        let mut globals = GlobalContext::default();
        let mut states = StateMachine::new();

        states.push(Probe::new("a", &log));
        states.push(Probe::new("b", &log));
        states.update(&mut globals);
        drain(&log);

        states.update(&mut globals);
        states.render(&mut globals);
        assert_eq!(drain(&log), ["update b", "render a", "render b"]);
        assert_eq!(states.state(), StackState::Layered);
    }

    #[test]
    fn requests_from_on_enter_wait_for_next_update() {
        let log = Log::default();
        let mut globals = GlobalContext::default();
        let mut states = StateMachine::new();

        let child_log = Rc::clone(&log);
        states.push(
            Probe::new("a", &log)
                .entering(move |ctx| ctx.push_scene(Probe::new("b", &child_log))),
        );

        states.update(&mut globals);
        assert_eq!(drain(&log), ["enter a", "update a"]);
        assert_eq!(states.pending_changes(), 1);

        states.update(&mut globals);
        assert_eq!(drain(&log), ["enter b", "update b"]);
    }

    #[test]
    fn scenes_can_pop_themselves() {
        let log = Log::default();
        let mut globals = GlobalContext::default();
        let mut states = StateMachine::new();

        states.push(Probe::new("a", &log).updating(|ctx| ctx.pop_scene()));
        states.update(&mut globals);
        assert_eq!(states.len(), 1, "pop is deferred");

        states.update(&mut globals);
        assert_eq!(states.state(), StackState::Empty);
    }

    //--- Empty pool -------------------------------------------------------

    #[test]
    fn popping_to_empty_is_harmless() {
        let log = Log::default();
        let mut globals = GlobalContext::default();
        let mut states = StateMachine::new();

        states.push(Probe::new("a", &log));
        states.update(&mut globals);
        states.pop();
        states.pop();
        states.update(&mut globals);
        states.render(&mut globals);

        assert_eq!(states.state(), StackState::Empty);
        assert_eq!(drain(&log), ["enter a", "update a", "exit a"]);
    }

    //--- Generators -------------------------------------------------------

    #[test]
    fn named_push_uses_first_generator() {
        let log = Log::default();
        let mut globals = GlobalContext::default();
        let mut states = StateMachine::new();

        let first = Rc::clone(&log);
        let second = Rc::clone(&log);
        assert!(states.add_generator("menu", move || Box::new(Probe::new("first", &first)) as Box<dyn Scene>));
        assert!(!states.add_generator("menu", move || Box::new(Probe::new("second", &second)) as Box<dyn Scene>));

        assert!(states.push_named("menu"));
        assert!(!states.push_named("unknown"));
        states.update(&mut globals);
        assert_eq!(states.scene_names(), ["first"]);
    }

    #[test]
    fn scenes_push_by_name_through_context() {
        let log = Log::default();
        let mut globals = GlobalContext::default();
        let mut states = StateMachine::new();

        let gen_log = Rc::clone(&log);
        states.add_generator("pause", move || Box::new(Probe::new("pause", &gen_log)) as Box<dyn Scene>);
        states.push(Probe::new("game", &log).updating(|ctx| {
            assert!(ctx.push_named("pause"));
            assert!(!ctx.push_named("missing"));
        }));

        states.update(&mut globals);
        states.update(&mut globals);
        assert_eq!(states.scene_names(), ["game", "pause"]);
        assert!(states.remove_generator("pause"));
        assert!(!states.has_generator("pause"));
    }

    //--- Exit -------------------------------------------------------------

    #[test]
    fn entities_left_after_exit_are_released() {
        let log = Log::default();
        let mut globals = GlobalContext::default();
        let mut states = StateMachine::new();

        let mut sticky = Probe::new("sticky", &log);
        sticky.keep_entities = true;
        sticky.entities.spawn("rock", Dummy(EntityBase::new()));
        states.push(sticky);
        states.update(&mut globals);
        assert_eq!(states.top().unwrap().entities().len(), 1);

        states.pop();
        states.update(&mut globals);
        assert!(states.is_empty());
    }

    #[test]
    fn shutdown_exits_top_down_and_skips_queued() {
        let log = Log::default();
        let mut globals = GlobalContext::default();
        let mut states = StateMachine::new();

        states.push(Probe::new("a", &log));
        states.push(Probe::new("b", &log));
        states.update(&mut globals);
        states.push(Probe::new("never", &log));
        drain(&log);

        states.shutdown(&mut globals);
        assert_eq!(drain(&log), ["exit b", "exit a"]);
        assert_eq!(states.pending_changes(), 0);
    }
}
