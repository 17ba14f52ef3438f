use std::{error::Error, path::Path, str::FromStr, sync::mpsc};

use gridq::{
    algo::{QTableAgent, QTableAgentConfig},
    gym::{Difficulty, GridWorld},
    train::{TrainingSession, METRICS},
    viz::App,
};

const NUM_EPISODES: u32 = 2000;

fn main() -> Result<(), Box<dyn Error>> {
    tui_logger::init_logger(log::LevelFilter::Debug)?;
    tui_logger::set_default_level(log::LevelFilter::Debug);

    let difficulty = std::env::args()
        .nth(1)
        .map(|arg| Difficulty::from_str(&arg))
        .transpose()?
        .unwrap_or_default();
    let path = Path::new("demos/train_grid_world/out").join(format!("{difficulty}.json"));

    let env = GridWorld::new(difficulty.config())?;
    let mut agent = QTableAgent::for_env(&env, QTableAgentConfig::default());
    if path.exists() {
        agent.load(&path)?;
    }

    let mut session = TrainingSession::new(env, agent);
    let (tx, rx) = mpsc::channel();
    session.start(NUM_EPISODES, Some(tx))?;

    let mut app = App::new(&METRICS, NUM_EPISODES, GridWorld::new(difficulty.config())?);
    app.run(rx)?;

    let (mut env, mut agent) = session.into_inner()?;
    agent.save(&path)?;

    let summary = agent.evaluate(&mut env)?;
    println!("{}", env.render());
    println!(
        "Greedy run: {:?} in {} steps (optimal {}), reward {:.1}",
        summary.outcome,
        summary.steps,
        env.optimal_steps(),
        summary.total_reward
    );

    Ok(())
}
