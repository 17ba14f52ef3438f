use std::path::Path;

use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    algo::snapshot::QTableSnapshot,
    assert_interval,
    env::{DiscreteActionSpace, DiscreteStateSpace, Environment, Info},
    error::{Error, Result},
    exploration::{Choice, EpsilonGreedy},
    util,
};

/// Configuration for the [`QTableAgent`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QTableAgentConfig {
    /// Step size α of the value update
    pub learning_rate: f32,
    /// Discount γ applied to the next state's value
    pub discount_factor: f32,
    pub epsilon_start: f32,
    pub epsilon_end: f32,
    /// Multiplier applied to epsilon by each [`decay_epsilon`](QTableAgent::decay_epsilon)
    pub epsilon_decay: f32,
}

impl Default for QTableAgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 0.99,
            epsilon_start: 1.0,
            epsilon_end: 0.01,
            epsilon_decay: 0.995,
        }
    }
}

impl QTableAgentConfig {
    /// Check that every hyperparameter lies in `[0,1]` and that epsilon can only decay
    pub fn validate(&self) -> Result<()> {
        let params = [
            ("learning_rate", self.learning_rate),
            ("discount_factor", self.discount_factor),
            ("epsilon_start", self.epsilon_start),
            ("epsilon_end", self.epsilon_end),
            ("epsilon_decay", self.epsilon_decay),
        ];
        for (name, value) in params {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Configuration(format!(
                    "`{name}` must be in the interval [0, 1], got {value}"
                )));
            }
        }
        if self.epsilon_start < self.epsilon_end {
            return Err(Error::Configuration(
                "`epsilon_start` must not be less than `epsilon_end`".into(),
            ));
        }
        Ok(())
    }
}

/// How an episode ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Outcome {
    Goal,
    Obstacle,
    #[default]
    Truncated,
}

impl From<&Info> for Outcome {
    fn from(info: &Info) -> Self {
        if info.is_goal {
            Outcome::Goal
        } else if info.is_obstacle {
            Outcome::Obstacle
        } else {
            Outcome::Truncated
        }
    }
}

/// Statistics of one finished episode
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EpisodeSummary {
    pub steps: u32,
    pub total_reward: f32,
    pub outcome: Outcome,
}

/// A Q-learning agent that stores its action values in a dense table
///
/// States and actions are plain indices: the table has one row per state index
/// and one column per action index, all initialized to zero. The agent never
/// talks to an environment on its own, a driver feeds it transitions through
/// [`select_action`](Self::select_action) and [`learn`](Self::learn), or runs
/// whole episodes with [`go`](Self::go).
pub struct QTableAgent {
    table: Vec<f32>,
    state_count: usize,
    action_count: usize,
    config: QTableAgentConfig,
    exploration: EpsilonGreedy,
    rng: StdRng,
    episode: u32,
}

impl QTableAgent {
    /// Initialize a new `QTableAgent` for a state space and action space of the given sizes
    ///
    /// **Panics** if a hyperparameter is not in the interval `[0,1]`, if
    /// `epsilon_start` is less than `epsilon_end`, or if there are no actions
    pub fn new(state_count: usize, action_count: usize, config: QTableAgentConfig) -> Self {
        assert_interval!(config.learning_rate, 0.0, 1.0);
        assert_interval!(config.discount_factor, 0.0, 1.0);
        assert!(action_count > 0, "There must be at least one action.");
        let exploration = EpsilonGreedy::new(
            config.epsilon_start,
            config.epsilon_end,
            config.epsilon_decay,
        );
        Self {
            table: vec![0.0; state_count * action_count],
            state_count,
            action_count,
            config,
            exploration,
            rng: StdRng::from_entropy(),
            episode: 0,
        }
    }

    /// Initialize an agent sized for `env`
    pub fn for_env<E>(env: &E, config: QTableAgentConfig) -> Self
    where
        E: DiscreteStateSpace + DiscreteActionSpace,
    {
        Self::new(env.state_count(), env.action_count(), config)
    }

    /// Reseed the agent's RNG for reproducible exploration
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Build an agent from a file written by [`save`](Self::save)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let snapshot = QTableSnapshot::load_from_file(path.as_ref())?;
        snapshot.check_shape()?;
        snapshot.config.validate()?;

        let mut agent = Self::new(
            snapshot.state_count,
            snapshot.action_count,
            snapshot.config.clone(),
        );
        agent.restore(snapshot);
        info!("loaded agent from {}", path.as_ref().display());
        Ok(agent)
    }

    pub fn state_count(&self) -> usize {
        self.state_count
    }

    pub fn action_count(&self) -> usize {
        self.action_count
    }

    pub fn config(&self) -> &QTableAgentConfig {
        &self.config
    }

    pub fn epsilon(&self) -> f32 {
        self.exploration.epsilon()
    }

    /// Number of training episodes run with [`go`](Self::go)
    pub fn episode(&self) -> u32 {
        self.episode
    }

    /// The action values of one state
    ///
    /// **Panics** if `state` is out of range
    pub fn q_values(&self, state: usize) -> &[f32] {
        let start = state * self.action_count;
        &self.table[start..start + self.action_count]
    }

    fn q_values_mut(&mut self, state: usize) -> &mut [f32] {
        let start = state * self.action_count;
        &mut self.table[start..start + self.action_count]
    }

    /// Choose an action for `state`
    ///
    /// While training, explores with probability epsilon. Otherwise, and always
    /// when not training, picks the highest valued action, preferring the lowest
    /// index on ties.
    pub fn select_action(&mut self, state: usize, training: bool) -> usize {
        if training {
            if let Choice::Explore = self.exploration.choose(&mut self.rng) {
                return self.rng.gen_range(0..self.action_count);
            }
        }
        util::argmax(self.q_values(state))
    }

    /// Apply the Q-learning update for one transition
    ///
    /// Q(s,a) ← Q(s,a) + α[r + γ max<sub>a'</sub> Q(s',a') - Q(s,a)]
    ///
    /// The future term is dropped when `terminated`. **Returns** the TD error.
    pub fn learn(
        &mut self,
        state: usize,
        action: usize,
        reward: f32,
        next_state: usize,
        terminated: bool,
    ) -> f32 {
        let max_next_q = if terminated {
            0.0
        } else {
            util::max(self.q_values(next_state))
        };
        let target = reward + self.config.discount_factor * max_next_q;
        let alpha = self.config.learning_rate;

        let q = &mut self.q_values_mut(state)[action];
        let td_error = target - *q;
        *q += alpha * td_error;
        td_error
    }

    /// Advance the exploration schedule by one step
    pub fn decay_epsilon(&mut self) {
        self.exploration.decay();
    }

    /// The greedy action of every state, in state index order
    pub fn policy(&self) -> Vec<usize> {
        self.table
            .chunks(self.action_count)
            .map(util::argmax)
            .collect()
    }

    /// The value of a state under the greedy policy, `max_a Q(state, a)`
    pub fn state_value(&self, state: usize) -> f32 {
        util::max(self.q_values(state))
    }

    /// Zero the table and restore epsilon to its start value
    ///
    /// Hyperparameters are kept.
    pub fn reset_q_table(&mut self) {
        self.table.fill(0.0);
        self.exploration.reset();
        self.episode = 0;
    }

    /// Write the table, epsilon, and hyperparameters to `path` as JSON
    ///
    /// Missing parent directories are created.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        QTableSnapshot::from_agent(self).save_to_file(path.as_ref())?;
        info!("saved agent to {}", path.as_ref().display());
        Ok(())
    }

    /// Replace the table, epsilon, and hyperparameters with the contents of `path`
    ///
    /// Fails with [`Error::DimensionMismatch`] if the saved table does not have
    /// this agent's number of states and actions. The agent is unchanged on error.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let snapshot = QTableSnapshot::load_from_file(path.as_ref())?;
        snapshot.check_shape()?;
        let found = (snapshot.state_count, snapshot.action_count);
        let expected = (self.state_count, self.action_count);
        if found != expected {
            return Err(Error::DimensionMismatch { expected, found });
        }
        snapshot.config.validate()?;

        self.restore(snapshot);
        info!("loaded agent from {}", path.as_ref().display());
        Ok(())
    }

    fn restore(&mut self, snapshot: QTableSnapshot) {
        let QTableSnapshot {
            q_table,
            epsilon,
            config,
            ..
        } = snapshot;

        self.table = q_table.into_iter().flatten().collect();
        self.exploration =
            EpsilonGreedy::new(config.epsilon_start, config.epsilon_end, config.epsilon_decay);
        self.exploration.set_epsilon(epsilon);
        self.config = config;
    }

    /// Table rows, one per state
    pub(crate) fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.table.chunks(self.action_count)
    }

    /// Run one training episode in `env`
    ///
    /// Every transition is learned from in the order it happened, and epsilon
    /// decays once at the end of the episode.
    pub fn go<E>(&mut self, env: &mut E) -> Result<EpisodeSummary>
    where
        E: DiscreteStateSpace + DiscreteActionSpace,
        E::Action: TryFrom<usize, Error = Error>,
    {
        let summary = self.run_episode(env, true)?;
        self.decay_epsilon();
        self.episode += 1;
        debug!(
            "episode {} finished: {:?} in {} steps, reward {:.2}, epsilon {:.3}",
            self.episode,
            summary.outcome,
            summary.steps,
            summary.total_reward,
            self.epsilon()
        );
        Ok(summary)
    }

    /// Run one greedy episode in `env` without learning
    pub fn evaluate<E>(&mut self, env: &mut E) -> Result<EpisodeSummary>
    where
        E: DiscreteStateSpace + DiscreteActionSpace,
        E::Action: TryFrom<usize, Error = Error>,
    {
        self.run_episode(env, false)
    }

    fn run_episode<E>(&mut self, env: &mut E, training: bool) -> Result<EpisodeSummary>
    where
        E: DiscreteStateSpace + DiscreteActionSpace,
        E::Action: TryFrom<usize, Error = Error>,
    {
        let (mut state, _) = env.reset(None);
        let mut summary = EpisodeSummary::default();

        loop {
            let s = env.state_index(&state);
            let action = self.select_action(s, training);
            let step = env.step(<E::Action as TryFrom<usize>>::try_from(action)?)?;

            if training {
                let next = env.state_index(&step.state);
                self.learn(s, action, step.reward, next, step.terminated);
            }

            summary.steps += 1;
            summary.total_reward += step.reward;
            if step.is_done() {
                summary.outcome = Outcome::from(&step.info);
                return Ok(summary);
            }
            state = step.state;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::gym::{Difficulty, GridConfig, GridWorld};

    use super::*;

    fn agent(config: QTableAgentConfig) -> QTableAgent {
        QTableAgent::new(25, 4, config).with_seed(42)
    }

    fn set_row(agent: &mut QTableAgent, state: usize, values: [f32; 4]) {
        agent.q_values_mut(state).copy_from_slice(&values);
    }

    #[test]
    fn starts_empty() {
        let agent = agent(QTableAgentConfig::default());
        assert_eq!(agent.state_count(), 25);
        assert_eq!(agent.action_count(), 4);
        assert!(agent.rows().all(|row| row.iter().all(|&q| q == 0.0)));
        assert_eq!(agent.rows().count(), 25);
        assert_eq!(agent.epsilon(), 1.0);
    }

    #[test]
    fn bellman_update() {
        let mut agent = agent(QTableAgentConfig {
            learning_rate: 0.5,
            discount_factor: 0.9,
            ..Default::default()
        });
        set_row(&mut agent, 0, [2.0, 0.0, 0.0, 0.0]);
        set_row(&mut agent, 1, [1.0, 5.0, 3.0, 0.0]);

        let td_error = agent.learn(0, 0, 4.0, 1, false);

        assert!((td_error - 6.5).abs() < 1e-6, "TD error is 4 + 0.9 * 5 - 2");
        assert!((agent.q_values(0)[0] - 5.25).abs() < 1e-6);
        assert_eq!(agent.q_values(1), &[1.0, 5.0, 3.0, 0.0], "Next state untouched");
    }

    #[test]
    fn terminal_update_ignores_future() {
        let mut agent = agent(QTableAgentConfig {
            learning_rate: 0.1,
            discount_factor: 0.9,
            ..Default::default()
        });
        set_row(&mut agent, 24, [100.0, 100.0, 100.0, 100.0]);

        let td_error = agent.learn(0, 0, 10.0, 24, true);

        assert!((agent.q_values(0)[0] - 1.0).abs() < 1e-6);
        assert!((td_error - 10.0).abs() < 1e-6);
    }

    #[test]
    fn repeated_updates_accumulate() {
        let mut agent = agent(QTableAgentConfig {
            learning_rate: 0.5,
            discount_factor: 0.9,
            ..Default::default()
        });

        agent.learn(0, 0, 10.0, 1, true);
        agent.learn(0, 0, 10.0, 1, true);
        assert!((agent.q_values(0)[0] - 7.5).abs() < 1e-6);

        agent.learn(0, 1, 6.0, 1, true);
        assert!((agent.q_values(0)[1] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn greedy_selection_ignores_epsilon() {
        let mut agent = agent(QTableAgentConfig::default());
        assert_eq!(agent.epsilon(), 1.0);
        set_row(&mut agent, 0, [1.0, 2.0, 3.0, 5.0]);

        for _ in 0..20 {
            assert_eq!(agent.select_action(0, false), 3);
        }
    }

    #[test]
    fn greedy_ties_pick_first() {
        let mut agent = agent(QTableAgentConfig::default());
        set_row(&mut agent, 3, [1.0, 4.0, 4.0, 4.0]);

        assert_eq!(agent.select_action(3, false), 1);
        assert_eq!(agent.select_action(4, false), 0, "All zero row picks action 0");
    }

    #[test]
    fn training_without_epsilon_exploits() {
        let mut agent = agent(QTableAgentConfig {
            epsilon_start: 0.0,
            epsilon_end: 0.0,
            ..Default::default()
        });
        set_row(&mut agent, 0, [1.0, 2.0, 5.0, 3.0]);

        for _ in 0..20 {
            assert_eq!(agent.select_action(0, true), 2);
        }
    }

    #[test]
    fn full_epsilon_explores() {
        let mut agent = agent(QTableAgentConfig::default());
        set_row(&mut agent, 0, [1.0, 2.0, 5.0, 3.0]);

        let mut seen = [false; 4];
        for _ in 0..100 {
            seen[agent.select_action(0, true)] = true;
        }
        assert!(seen.iter().filter(|&&s| s).count() >= 2);
    }

    #[test]
    fn exploration_frequency() {
        let mut agent = agent(QTableAgentConfig {
            epsilon_start: 0.4,
            epsilon_end: 0.4,
            ..Default::default()
        });
        set_row(&mut agent, 0, [0.0, 0.0, 0.0, 1.0]);

        let trials = 10_000;
        let mut counts = [0usize; 4];
        for _ in 0..trials {
            counts[agent.select_action(0, true)] += 1;
        }

        let freq = |a: usize| counts[a] as f32 / trials as f32;
        assert!((freq(3) - 0.7).abs() < 0.05, "greedy action ~ 0.6 + 0.4 / 4");
        for a in 0..3 {
            assert!((freq(a) - 0.1).abs() < 0.05, "other actions ~ 0.4 / 4");
        }
    }

    #[test]
    fn decay_is_floored() {
        let mut agent = agent(QTableAgentConfig {
            epsilon_decay: 0.9,
            ..Default::default()
        });
        let mut prev = agent.epsilon();
        for _ in 0..200 {
            agent.decay_epsilon();
            assert!(agent.epsilon() <= prev);
            assert!(agent.epsilon() >= 0.01);
            prev = agent.epsilon();
        }
    }

    #[test]
    fn policy_and_state_values() {
        let mut agent = QTableAgent::new(4, 4, QTableAgentConfig::default());
        set_row(&mut agent, 0, [1.0, 2.0, 3.0, 4.0]);
        set_row(&mut agent, 1, [5.0, 1.0, 1.0, 1.0]);
        set_row(&mut agent, 2, [1.0, 5.0, 1.0, 1.0]);
        set_row(&mut agent, 3, [1.0, 1.0, 5.0, 1.0]);

        assert_eq!(agent.policy(), vec![3, 0, 1, 2]);
        assert_eq!(agent.state_value(1), 5.0);
        assert_eq!(agent.q_values(0), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn reset_clears_table_and_epsilon() {
        let mut agent = agent(QTableAgentConfig {
            learning_rate: 0.3,
            ..Default::default()
        });
        agent.learn(5, 2, 1.0, 6, false);
        agent.decay_epsilon();
        agent.decay_epsilon();

        agent.reset_q_table();

        assert!(agent.rows().flatten().all(|&q| q == 0.0));
        assert_eq!(agent.epsilon(), 1.0);
        assert_eq!(agent.config().learning_rate, 0.3, "Hyperparameters kept");
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/agent.json");

        let mut agent = agent(QTableAgentConfig {
            learning_rate: 0.3,
            discount_factor: 0.95,
            ..Default::default()
        });
        agent.learn(0, 1, 1.25, 1, false);
        agent.learn(7, 3, -0.1, 8, false);
        agent.learn(8, 2, 10.0, 9, true);
        agent.decay_epsilon();
        agent.save(&path).unwrap();

        let mut loaded = QTableAgent::new(25, 4, QTableAgentConfig::default());
        loaded.load(&path).unwrap();

        assert!(agent.rows().eq(loaded.rows()), "Identical table");
        assert_eq!(loaded.epsilon(), agent.epsilon());
        assert_eq!(loaded.config(), agent.config());

        let restored = QTableAgent::from_file(&path).unwrap();
        assert!(agent.rows().eq(restored.rows()));
        assert_eq!(restored.epsilon(), agent.epsilon());
        assert_eq!(restored.config().learning_rate, 0.3);
    }

    #[test]
    fn load_rejects_other_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.json");
        let mut small = QTableAgent::new(16, 4, QTableAgentConfig::default());
        small.learn(0, 0, 1.0, 1, true);
        small.save(&path).unwrap();

        let mut agent = agent(QTableAgentConfig::default());
        let err = agent.load(&path).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: (25, 4),
                found: (16, 4)
            }
        ));
        assert!(agent.rows().flatten().all(|&q| q == 0.0), "Agent unchanged");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut agent = agent(QTableAgentConfig::default());
        assert!(matches!(
            agent.load(dir.path().join("missing.json")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn config_validation() {
        assert!(QTableAgentConfig::default().validate().is_ok());
        assert!(QTableAgentConfig {
            learning_rate: 1.5,
            ..Default::default()
        }
        .validate()
        .is_err());
        assert!(QTableAgentConfig {
            epsilon_start: 0.1,
            epsilon_end: 0.2,
            ..Default::default()
        }
        .validate()
        .is_err());
    }

    #[test]
    #[should_panic]
    fn invalid_learning_rate_panics() {
        QTableAgent::new(
            4,
            4,
            QTableAgentConfig {
                learning_rate: 2.0,
                ..Default::default()
            },
        );
    }

    #[test]
    fn greedy_episode_without_learning() {
        let mut env = GridWorld::new(GridConfig {
            max_steps: 10,
            ..Default::default()
        })
        .unwrap();
        let mut agent = QTableAgent::for_env(&env, QTableAgentConfig::default());

        let summary = agent.evaluate(&mut env).unwrap();

        // An all-zero table always picks Up, which bumps into the wall at the start
        assert_eq!(summary.outcome, Outcome::Truncated);
        assert_eq!(summary.steps, 10);
        assert!(agent.rows().flatten().all(|&q| q == 0.0), "No learning");
        assert_eq!(agent.epsilon(), 1.0, "No decay");
    }

    #[test]
    fn training_episode_learns_and_decays() {
        let mut env = GridWorld::new(Difficulty::Medium.config()).unwrap();
        let mut agent = QTableAgent::for_env(&env, QTableAgentConfig::default()).with_seed(3);

        let summary = agent.go(&mut env).unwrap();

        assert!(summary.steps >= 1 && summary.steps <= 50);
        assert_eq!(summary.steps, env.step_count());
        assert!(agent.rows().flatten().any(|&q| q != 0.0), "Table was updated");
        assert!((agent.epsilon() - 0.995).abs() < 1e-6, "Epsilon decayed once");
        assert_eq!(agent.episode(), 1);
    }

    #[test]
    fn learns_the_shortest_path() {
        let mut env = GridWorld::new(GridConfig::default()).unwrap();
        let mut agent = QTableAgent::for_env(
            &env,
            QTableAgentConfig {
                learning_rate: 0.5,
                discount_factor: 0.95,
                epsilon_decay: 0.99,
                ..Default::default()
            },
        )
        .with_seed(7);

        let mut greedy_steps = Vec::new();
        for episode in 0..1000 {
            agent.go(&mut env).unwrap();
            if episode % 100 == 99 {
                let eval = agent.evaluate(&mut env).unwrap();
                greedy_steps.push((eval.outcome, eval.steps));
            }
        }

        let (outcome, steps) = *greedy_steps.last().unwrap();
        assert_eq!(outcome, Outcome::Goal, "Greedy policy reaches the goal");
        assert_eq!(steps, 8, "Greedy policy takes the optimal path");
    }
}
