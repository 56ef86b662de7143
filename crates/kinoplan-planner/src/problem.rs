//! Problem interface
//!
//! What the planner consumes from its caller: start states, a goal
//! that can judge and sample states, and a container for the solution
//! path handed back when planning ends.

use kinoplan_core::space::State;

/// One step of a planned path. Roots carry no control; every later
/// waypoint records the control and step count that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct PathWaypoint {
    pub state: State,
    pub control: Option<(Vec<f64>, u32)>,
}

/// Ordered waypoint sequence from a root motion to the solution motion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlannedPath {
    pub waypoints: Vec<PathWaypoint>,
}

impl PlannedPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, state: State) {
        self.waypoints.push(PathWaypoint {
            state,
            control: None,
        });
    }

    pub fn append_with_control(&mut self, state: State, control: Vec<f64>, steps: u32) {
        self.waypoints.push(PathWaypoint {
            state,
            control: Some((control, steps)),
        });
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn last_state(&self) -> Option<&State> {
        self.waypoints.last().map(|w| &w.state)
    }
}

/// Goal supplied by the problem definition.
pub trait Goal {
    /// Whether `s` satisfies the goal; always writes the distance to
    /// the goal into `distance`.
    fn is_satisfied(&self, s: &State, distance: &mut f64) -> bool;

    /// Whether another goal state can still be drawn.
    fn has_more_samples(&self) -> bool;

    /// Draw the next goal state, if any.
    fn next_sample(&mut self) -> Option<State>;

    /// Receive the final path. `approximate` is set when the planner
    /// terminated before an exact solution; `distance` is the best
    /// goal distance achieved.
    fn add_solution_path(&mut self, path: PlannedPath, approximate: bool, distance: f64);
}

/// Start states and goal for one planning query.
pub struct ProblemDefinition {
    pub start_states: Vec<State>,
    pub goal: Box<dyn Goal>,
}

impl ProblemDefinition {
    pub fn new(start_states: Vec<State>, goal: Box<dyn Goal>) -> Self {
        Self { start_states, goal }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_append_order() {
        let mut path = PlannedPath::new();
        path.append(State::from_vec(vec![0.0]));
        path.append_with_control(State::from_vec(vec![1.0]), vec![0.5], 3);

        assert_eq!(path.len(), 2);
        assert!(path.waypoints[0].control.is_none());
        assert_eq!(path.waypoints[1].control, Some((vec![0.5], 3)));
        assert_eq!(path.last_state(), Some(&State::from_vec(vec![1.0])));
    }
}
