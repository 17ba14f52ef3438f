use std::collections::HashSet;

use log::{debug, trace};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, FromRepr, VariantArray};

use crate::{
    env::{DiscreteActionSpace, DiscreteStateSpace, Environment, Info, Step},
    error::{Error, Result},
};

/// Grid coordinates as `(x, y)`, with `y` growing downwards
pub type Pos = (usize, usize);

/// Parameters of a [`GridWorld`]
///
/// Validated when the environment is constructed, see [`GridConfig::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// The grid is `size × size`
    pub size: usize,
    pub start: Pos,
    pub goal: Pos,
    pub obstacles: Vec<Pos>,
    pub goal_reward: f32,
    pub obstacle_penalty: f32,
    /// Reward for every non-terminal step, keep it small and negative to favor short paths
    pub step_penalty: f32,
    /// Episode length cap
    pub max_steps: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 5,
            start: (0, 0),
            goal: (4, 4),
            obstacles: Vec::new(),
            goal_reward: 10.0,
            obstacle_penalty: -10.0,
            step_penalty: -0.1,
            max_steps: 100,
        }
    }
}

impl GridConfig {
    fn in_bounds(&self, pos: Pos) -> bool {
        pos.0 < self.size && pos.1 < self.size
    }

    /// Check the configuration invariants
    ///
    /// Obstacles may not share a cell with the start or the goal, so every
    /// terminal cell has exactly one meaning.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(Error::Configuration(msg));

        if self.size == 0 {
            return fail("grid size must be positive".into());
        }
        if self.max_steps == 0 {
            return fail("max_steps must be positive".into());
        }
        if !self.in_bounds(self.start) {
            return fail(format!("start position {:?} outside grid", self.start));
        }
        if !self.in_bounds(self.goal) {
            return fail(format!("goal position {:?} outside grid", self.goal));
        }
        if self.start == self.goal {
            return fail("start and goal positions cannot be the same".into());
        }
        for &obs in &self.obstacles {
            if !self.in_bounds(obs) {
                return fail(format!("obstacle position {obs:?} outside grid"));
            }
            if obs == self.start || obs == self.goal {
                return fail(format!("obstacle {obs:?} overlaps start or goal"));
            }
        }

        Ok(())
    }
}

/// Preset grids of increasing difficulty
#[derive(EnumIter, EnumString, Display, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    /// 5×5, no obstacles
    Easy,
    /// 5×5, two obstacles
    #[default]
    Medium,
    /// 7×7, six obstacles
    Hard,
}

impl Difficulty {
    pub fn config(self) -> GridConfig {
        match self {
            Difficulty::Easy => GridConfig {
                max_steps: 50,
                ..Default::default()
            },
            Difficulty::Medium => GridConfig {
                obstacles: vec![(2, 2), (3, 1)],
                max_steps: 50,
                ..Default::default()
            },
            Difficulty::Hard => GridConfig {
                size: 7,
                goal: (6, 6),
                obstacles: vec![(2, 2), (3, 1), (4, 4), (5, 3), (1, 5), (3, 5)],
                max_steps: 100,
                ..Default::default()
            },
        }
    }
}

impl From<Difficulty> for GridConfig {
    fn from(value: Difficulty) -> Self {
        value.config()
    }
}

#[derive(EnumIter, VariantArray, FromRepr, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl Action {
    /// Glyph used when drawing a policy
    pub fn arrow(self) -> char {
        match self {
            Action::Up => '↑',
            Action::Down => '↓',
            Action::Left => '←',
            Action::Right => '→',
        }
    }
}

impl TryFrom<usize> for Action {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self> {
        Action::from_repr(value).ok_or(Error::InvalidAction(value))
    }
}

impl From<Action> for usize {
    fn from(value: Action) -> Self {
        value as usize
    }
}

/// A square grid with a start cell, an absorbing goal, absorbing obstacles, and a step budget
///
/// Transitions are deterministic. The environment's RNG only drives
/// [`random_action`](DiscreteActionSpace::random_action).
pub struct GridWorld {
    config: GridConfig,
    obstacles: HashSet<Pos>,
    pos: Option<Pos>,
    step_count: u32,
    rng: StdRng,
}

impl GridWorld {
    /// Build an environment, rejecting invalid configurations
    pub fn new(config: GridConfig) -> Result<Self> {
        config.validate()?;
        let obstacles = config.obstacles.iter().copied().collect();
        Ok(Self {
            config,
            obstacles,
            pos: None,
            step_count: 0,
            rng: StdRng::from_entropy(),
        })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn size(&self) -> usize {
        self.config.size
    }

    /// Current agent position, `None` before the first reset
    pub fn agent_pos(&self) -> Option<Pos> {
        self.pos
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    /// Inverse of [`state_index`](DiscreteStateSpace::state_index)
    pub fn index_to_position(&self, index: usize) -> Pos {
        (index % self.config.size, index / self.config.size)
    }

    pub fn is_goal(&self, pos: Pos) -> bool {
        pos == self.config.goal
    }

    pub fn is_obstacle(&self, pos: Pos) -> bool {
        self.obstacles.contains(&pos)
    }

    /// Manhattan distance from start to goal, the length of the shortest path on an open grid
    pub fn optimal_steps(&self) -> usize {
        let (start, goal) = (self.config.start, self.config.goal);
        start.0.abs_diff(goal.0) + start.1.abs_diff(goal.1)
    }

    /// [`step`](Environment::step) with a raw action index
    ///
    /// Indices outside `0..4` are rejected before any state is touched.
    pub fn step_index(&mut self, action: usize) -> Result<Step<Pos>> {
        let action = Action::try_from(action)?;
        self.step(action)
    }

    fn info(&self, pos: Pos) -> Info {
        Info {
            step_count: self.step_count,
            is_goal: self.is_goal(pos),
            is_obstacle: self.is_obstacle(pos),
        }
    }

    fn draw(&self, cell: impl Fn(Pos) -> char) -> String {
        (0..self.config.size)
            .map(|y| {
                (0..self.config.size)
                    .map(|x| cell((x, y)).to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Text snapshot of the grid
    ///
    /// `A` agent, `G` goal, `X` obstacle, `·` empty. The agent is drawn over the goal.
    pub fn render(&self) -> String {
        let grid = self.draw(|pos| {
            if self.pos == Some(pos) {
                'A'
            } else if self.is_goal(pos) {
                'G'
            } else if self.is_obstacle(pos) {
                'X'
            } else {
                '·'
            }
        });
        format!("Step: {}\n{grid}", self.step_count)
    }

    /// Draw a greedy policy (one action index per state) as arrows over the grid
    pub fn render_policy(&self, policy: &[usize]) -> String {
        self.draw(|pos| {
            if self.is_goal(pos) {
                return 'G';
            }
            if self.is_obstacle(pos) {
                return 'X';
            }
            policy
                .get(self.state_index(&pos))
                .and_then(|&a| Action::from_repr(a))
                .map_or('·', Action::arrow)
        })
    }
}

impl Environment for GridWorld {
    type State = Pos;
    type Action = Action;

    fn reset(&mut self, seed: Option<u64>) -> (Self::State, Info) {
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.pos = Some(self.config.start);
        self.step_count = 0;
        debug!("grid world reset to {:?}", self.config.start);

        (self.config.start, Info::default())
    }

    fn step(&mut self, action: Self::Action) -> Result<Step<Self::State>> {
        let pos = self.pos.ok_or(Error::NotReset)?;
        let next = move_pos(pos, action, self.config.size);

        self.pos = Some(next);
        self.step_count += 1;

        let mut reward = self.config.step_penalty;
        let mut terminated = false;
        if self.is_goal(next) {
            reward = self.config.goal_reward;
            terminated = true;
        } else if self.is_obstacle(next) {
            reward = self.config.obstacle_penalty;
            terminated = true;
        }
        let truncated = self.step_count >= self.config.max_steps;

        trace!("{pos:?} --{action:?}--> {next:?} (reward {reward})");

        Ok(Step {
            state: next,
            reward,
            terminated,
            truncated,
            info: self.info(next),
        })
    }
}

impl DiscreteStateSpace for GridWorld {
    /// `size * size`
    fn state_count(&self) -> usize {
        self.config.size * self.config.size
    }

    /// Row-major index of a position, `y * size + x`
    fn state_index(&self, pos: &Pos) -> usize {
        pos.1 * self.config.size + pos.0
    }
}

impl DiscreteActionSpace for GridWorld {
    fn actions(&self) -> Vec<Self::Action> {
        Action::VARIANTS.to_vec()
    }

    fn random_action(&mut self) -> Self::Action {
        *Action::VARIANTS
            .choose(&mut self.rng)
            .expect("action set is not empty")
    }

    fn action_count(&self) -> usize {
        Action::VARIANTS.len()
    }
}

/// Move one cell, clamping to `[0, size)` on each axis
fn move_pos(pos: Pos, action: Action, size: usize) -> Pos {
    let (x, y) = pos;
    match action {
        Action::Up => (x, y.saturating_sub(1)),
        Action::Down => (x, (y + 1).min(size - 1)),
        Action::Left => (x.saturating_sub(1), y),
        Action::Right => ((x + 1).min(size - 1), y),
    }
}
