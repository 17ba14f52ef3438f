use std::{
    panic,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::Sender,
        Arc,
    },
    thread::{self, JoinHandle},
};

use log::{info, warn};

use crate::{
    algo::QTableAgent,
    env::{DiscreteActionSpace, DiscreteStateSpace},
    error::{Error, Result},
};

/// Names of the metrics in [`Update::data`], in order
pub const METRICS: [&str; 3] = ["Steps", "Reward", "Epsilon"];

/// Progress report sent after every training episode
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    /// Episodes the agent has trained for so far, counting this one
    pub episode: u32,
    /// One value per entry of [`METRICS`]
    pub data: Vec<f64>,
    /// Greedy action per state after this episode
    pub policy: Vec<usize>,
}

/// What a worker hands back when it finishes
struct Finished<E> {
    env: E,
    agent: QTableAgent,
    episodes: u32,
    error: Option<Error>,
}

struct Worker<E> {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<Finished<E>>,
}

/// Owns one environment and one agent and trains them on a background thread
///
/// At most one training loop runs at a time. While it runs, the worker thread
/// owns the environment and the agent, and they are handed back when the loop
/// is stopped or finishes. Cancellation is checked between episodes, so a
/// stopped session always holds a table where every taken step was learned.
pub struct TrainingSession<E> {
    idle: Option<(E, QTableAgent)>,
    worker: Option<Worker<E>>,
}

impl<E> TrainingSession<E>
where
    E: DiscreteStateSpace + DiscreteActionSpace + Send + 'static,
    E::Action: TryFrom<usize, Error = Error>,
{
    pub fn new(env: E, agent: QTableAgent) -> Self {
        Self {
            idle: Some((env, agent)),
            worker: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// The agent, `None` while a training loop is running
    pub fn agent(&self) -> Option<&QTableAgent> {
        self.idle.as_ref().map(|(_, agent)| agent)
    }

    /// The environment, `None` while a training loop is running
    pub fn env(&self) -> Option<&E> {
        self.idle.as_ref().map(|(env, _)| env)
    }

    /// Train for `episodes` episodes in the background
    ///
    /// A loop that is already running is cancelled and joined first. If
    /// `progress` is given, one [`Update`] per episode is sent on it in episode
    /// order. A receiver that hangs up does not stop training.
    pub fn start(&mut self, episodes: u32, progress: Option<Sender<Update>>) -> Result<()> {
        self.stop()?;
        let Some((mut env, mut agent)) = self.idle.take() else {
            unreachable!("a stopped session holds its environment and agent");
        };

        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        info!("training started for {episodes} episodes");

        let handle = thread::spawn(move || {
            let mut completed = 0;
            let mut error = None;
            let mut listening = progress.is_some();

            while completed < episodes && !flag.load(Ordering::Relaxed) {
                let summary = match agent.go(&mut env) {
                    Ok(summary) => summary,
                    Err(e) => {
                        error = Some(e);
                        break;
                    }
                };
                completed += 1;

                if let (true, Some(tx)) = (listening, &progress) {
                    let update = Update {
                        episode: agent.episode(),
                        data: vec![
                            summary.steps as f64,
                            summary.total_reward as f64,
                            agent.epsilon() as f64,
                        ],
                        policy: agent.policy(),
                    };
                    if tx.send(update).is_err() {
                        warn!("progress receiver disconnected, training continues");
                        listening = false;
                    }
                }
            }

            Finished {
                env,
                agent,
                episodes: completed,
                error,
            }
        });

        self.worker = Some(Worker { cancel, handle });
        Ok(())
    }

    /// Cancel the running loop, if any, and wait for it to hand back the agent
    ///
    /// **Returns** the number of episodes the loop completed, `0` if nothing was running.
    pub fn stop(&mut self) -> Result<u32> {
        if let Some(worker) = &self.worker {
            worker.cancel.store(true, Ordering::Relaxed);
        }
        self.wait()
    }

    /// Wait for the running loop, if any, to finish on its own
    ///
    /// **Returns** the number of episodes the loop completed, `0` if nothing was running.
    pub fn wait(&mut self) -> Result<u32> {
        let Some(worker) = self.worker.take() else {
            return Ok(0);
        };
        let finished = match worker.handle.join() {
            Ok(finished) => finished,
            Err(payload) => panic::resume_unwind(payload),
        };

        self.idle = Some((finished.env, finished.agent));
        info!("training stopped after {} episodes", finished.episodes);
        match finished.error {
            Some(e) => Err(e),
            None => Ok(finished.episodes),
        }
    }

    /// Stop training and take back the environment and agent
    pub fn into_inner(mut self) -> Result<(E, QTableAgent)> {
        self.stop()?;
        Ok(self
            .idle
            .take()
            .expect("a stopped session holds its environment and agent"))
    }
}

impl<E> Drop for TrainingSession<E> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.cancel.store(true, Ordering::Relaxed);
            let _ = worker.handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use crate::{
        algo::QTableAgentConfig,
        gym::{GridConfig, GridWorld},
    };

    use super::*;

    fn session() -> TrainingSession<GridWorld> {
        let env = GridWorld::new(GridConfig::default()).unwrap();
        let agent = QTableAgent::for_env(&env, QTableAgentConfig::default()).with_seed(1);
        TrainingSession::new(env, agent)
    }

    #[test]
    fn reports_every_episode_in_order() {
        let mut session = session();
        let (tx, rx) = mpsc::channel();

        session.start(50, Some(tx)).unwrap();
        assert!(session.is_running());
        assert!(session.agent().is_none(), "Agent is owned by the worker");
        assert_eq!(session.wait().unwrap(), 50);

        let updates: Vec<Update> = rx.iter().collect();
        assert_eq!(updates.len(), 50);
        for (i, update) in updates.iter().enumerate() {
            assert_eq!(update.episode, i as u32 + 1, "Updates arrive in episode order");
            assert_eq!(update.data.len(), METRICS.len());
            assert_eq!(update.policy.len(), 25);
        }

        let agent = session.agent().unwrap();
        assert_eq!(agent.episode(), 50);
        assert_eq!(updates.last().unwrap().policy, agent.policy());
    }

    #[test]
    fn stop_without_training_is_a_no_op() {
        let mut session = session();
        assert_eq!(session.stop().unwrap(), 0);
        assert_eq!(session.stop().unwrap(), 0);
        assert!(!session.is_running());
        assert!(session.agent().is_some());
    }

    #[test]
    fn restart_cancels_the_previous_loop() {
        let mut session = session();
        session.start(u32::MAX, None).unwrap();
        session.start(20, None).unwrap();

        assert_eq!(session.wait().unwrap(), 20);
        assert!(!session.is_running());
        let trained = session.agent().unwrap().episode();
        assert!(trained >= 20, "Second loop continues from the first");

        session.start(u32::MAX, None).unwrap();
        let completed = session.stop().unwrap();
        assert_eq!(session.agent().unwrap().episode(), trained + completed);
    }

    #[test]
    fn hung_up_receiver_does_not_stop_training() {
        let mut session = session();
        let (tx, rx) = mpsc::channel();
        drop(rx);

        session.start(10, Some(tx)).unwrap();
        assert_eq!(session.wait().unwrap(), 10);

        let (env, agent) = session.into_inner().unwrap();
        assert_eq!(agent.episode(), 10);
        assert!(env.step_count() > 0);
    }
}
