//! Tree extension seam
//!
//! The driver grows a kinodynamic tree it does not own: a concrete
//! planner supplies an [`ExtensionStrategy`] that roots motions and
//! extends them inside a chosen region. The driver only ever sees
//! motion identifiers and reads states and parent links back through
//! the strategy.

use kinoplan_core::space::State;
use rand::rngs::StdRng;

use crate::graph::Region;

/// Identifier of a motion in the strategy's tree arena.
pub type MotionId = usize;

/// A node of the kinodynamic tree.
#[derive(Debug, Clone)]
pub struct Motion {
    pub state: State,
    /// Control applied to the parent to produce this state; empty for roots.
    pub control: Vec<f64>,
    /// Propagation steps the control was applied for.
    pub steps: u32,
    pub parent: Option<MotionId>,
}

/// Tree-growth primitive supplied by a concrete planner.
pub trait ExtensionStrategy {
    /// Create a rooted motion for a valid start state.
    fn add_root(&mut self, state: &State) -> MotionId;

    /// Extend the tree from motions associated with `region`, appending
    /// zero or more new motion ids to `new_motions`.
    fn select_and_extend(
        &mut self,
        region: &Region,
        rng: &mut StdRng,
        new_motions: &mut Vec<MotionId>,
    );

    /// Read access to any motion previously returned.
    fn motion(&self, id: MotionId) -> &Motion;

    /// Drop the entire tree.
    fn clear(&mut self);
}

/// Push-only motion arena concrete strategies can embed.
#[derive(Debug, Default)]
pub struct MotionTree {
    motions: Vec<Motion>,
}

impl MotionTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self, state: &State) -> MotionId {
        self.push(Motion {
            state: state.clone(),
            control: Vec::new(),
            steps: 0,
            parent: None,
        })
    }

    pub fn add_child(
        &mut self,
        parent: MotionId,
        state: State,
        control: Vec<f64>,
        steps: u32,
    ) -> MotionId {
        self.push(Motion {
            state,
            control,
            steps,
            parent: Some(parent),
        })
    }

    fn push(&mut self, motion: Motion) -> MotionId {
        let id = self.motions.len();
        self.motions.push(motion);
        id
    }

    pub fn motion(&self, id: MotionId) -> &Motion {
        &self.motions[id]
    }

    pub fn len(&self) -> usize {
        self.motions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motions.is_empty()
    }

    pub fn clear(&mut self) {
        self.motions.clear();
    }
}
