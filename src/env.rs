use crate::error::Result;

/// Auxiliary information reported alongside every transition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Info {
    /// Number of accepted actions in the current episode
    pub step_count: u32,
    /// The agent is standing on the goal
    pub is_goal: bool,
    /// The agent is standing on an obstacle
    pub is_obstacle: bool,
}

/// The result of applying one action to an [`Environment`]
#[derive(Debug, Clone, PartialEq)]
pub struct Step<S> {
    /// The state after the action was applied
    pub state: S,
    /// The reward received for the action
    pub reward: f32,
    /// The episode ended in an absorbing state
    pub terminated: bool,
    /// The episode ran out of its step budget
    ///
    /// Reported independently of `terminated`, both may be set.
    pub truncated: bool,
    pub info: Info,
}

impl<S> Step<S> {
    /// Either terminal flag is set
    pub fn is_done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// Represents a Markov decision process, defining the dynamics of an environment
/// in which an agent can operate.
///
/// This base trait represents the common case of a discrete-time MDP with one agent
/// and a finite state space and action space.
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State;

    /// A representation of an action that an agent can take to affect the environment
    type Action;

    /// Reset the environment to an initial state
    ///
    /// `seed`, if given, reseeds any randomness owned by the environment.
    ///
    /// **Returns** `(state, info)`
    fn reset(&mut self, seed: Option<u64>) -> (Self::State, Info);

    /// Update the environment in response to an action taken by an agent, producing a new state and associated reward
    fn step(&mut self, action: Self::Action) -> Result<Step<Self::State>>;
}

/// An [`Environment`] with a finite, state-independent set of actions
pub trait DiscreteActionSpace: Environment {
    /// Get the available actions
    ///
    /// The returned vector is never empty.
    fn actions(&self) -> Vec<Self::Action>;

    /// Sample an action uniformly at random
    fn random_action(&mut self) -> Self::Action;

    /// Number of distinct actions
    fn action_count(&self) -> usize {
        self.actions().len()
    }
}

/// An [`Environment`] whose states can be numbered `0..state_count()`
pub trait DiscreteStateSpace: Environment {
    /// Total number of states
    fn state_count(&self) -> usize;

    /// Dense index of a state, in `0..state_count()`
    fn state_index(&self, state: &Self::State) -> usize;
}
