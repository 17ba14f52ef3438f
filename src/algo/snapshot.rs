use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
    algo::q_table::{QTableAgent, QTableAgentConfig},
    error::{Error, Result},
};

/// The persisted form of a [`QTableAgent`]
///
/// The table is stored dense, one inner list of action values per state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QTableSnapshot {
    pub q_table: Vec<Vec<f32>>,
    pub epsilon: f32,
    pub state_count: usize,
    pub action_count: usize,
    pub config: QTableAgentConfig,
}

impl QTableSnapshot {
    pub fn from_agent(agent: &QTableAgent) -> Self {
        Self {
            q_table: agent.rows().map(<[f32]>::to_vec).collect(),
            epsilon: agent.epsilon(),
            state_count: agent.state_count(),
            action_count: agent.action_count(),
            config: agent.config().clone(),
        }
    }

    /// Check that the table really has the declared number of states and actions
    pub fn check_shape(&self) -> Result<()> {
        if self.action_count == 0 {
            return Err(Error::Configuration("saved table has no actions".into()));
        }
        let expected = (self.state_count, self.action_count);
        let found = self
            .q_table
            .iter()
            .find(|row| row.len() != self.action_count)
            .map_or((self.q_table.len(), self.action_count), |row| {
                (self.q_table.len(), row.len())
            });

        if found != expected {
            return Err(Error::DimensionMismatch { expected, found });
        }
        Ok(())
    }

    /// Write the snapshot as pretty-printed JSON, creating parent directories as needed
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
