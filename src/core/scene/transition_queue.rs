//=========================================================================
// Transition Queue
//=========================================================================
//
// FIFO of pending scene changes.
//
// Scenes and application code queue transitions here. The state machine
// drains the queue at the start of its next update, so the pool never
// changes while a scene is running.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

//=== Internal Dependencies ===============================================

use super::Scene;

//=== Transition ==========================================================

/// A pending change to the scene pool.
pub enum Transition {
    /// Enter this scene on top of the pool.
    Push(Box<dyn Scene>),
    /// Exit and drop the top scene.
    Pop,
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Push(scene) => f.debug_tuple("Push").field(&scene.name()).finish(),
            Self::Pop => f.write_str("Pop"),
        }
    }
}

//=== TransitionQueue =====================================================

/// Ordered queue of scene transitions.
#[derive(Debug, Default)]
pub struct TransitionQueue {
    queue: Vec<Transition>,
}

impl TransitionQueue {
    /// Creates a new empty transition queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a transition behind every one already waiting.
    pub fn push(&mut self, transition: Transition) {
        self.queue.push(transition);
    }

    /// Returns `true` if no transition is waiting.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the number of queued transitions.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Drops every queued transition. Queued scenes are never entered.
    pub fn clear(&mut self) {
        self.queue.clear()
    }

    /// Takes all transitions in arrival order, leaving the queue empty.
    ///
    /// Transitions queued after this call wait for the next drain.
    pub fn take(&mut self) -> Vec<Transition> {
        std::mem::take(&mut self.queue)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::EntityContainer;
    use crate::core::scene::SceneContext;

    #[derive(Default)]
    struct Blank {
        entities: EntityContainer,
    }

    impl Scene for Blank {
        fn entities(&self) -> &EntityContainer {
            &self.entities
        }

        fn entities_mut(&mut self) -> &mut EntityContainer {
            &mut self.entities
        }

        fn on_enter(&mut self, _ctx: &mut SceneContext<'_>) {}
    }

    #[test]
    fn take_preserves_order_and_empties() {
        let mut queue = TransitionQueue::new();
        queue.push(Transition::Push(Box::new(Blank::default())));
        queue.push(Transition::Pop);
        assert_eq!(queue.len(), 2);

        let taken = queue.take();
        assert!(queue.is_empty());
        assert!(matches!(taken[0], Transition::Push(_)));
        assert!(matches!(taken[1], Transition::Pop));
    }

    #[test]
    fn debug_names_pushed_scene() {
        let push = Transition::Push(Box::new(Blank::default()));
        assert!(format!("{push:?}").contains("Blank"));
        assert_eq!(format!("{:?}", Transition::Pop), "Pop");
    }
}
