use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::Mission;
use crate::error::{PilotError, Result};

/// Produces a Mission from some external document.
///
/// Sources own validation of the model invariants (unique criterion ids);
/// downstream components trust their output.
#[async_trait]
pub trait MissionSource: Send + Sync {
    async fn load(&self) -> Result<Mission>;
}

/// Mission source backed by a YAML file on disk.
pub struct YamlMissionSource {
    path: PathBuf,
}

impl YamlMissionSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn validate(mission: &Mission) -> Result<()> {
        if mission.id.is_empty() {
            return Err(PilotError::InvalidMission("mission id is empty".into()));
        }

        let mut seen = HashSet::new();
        for criterion in &mission.definition_of_done {
            if !seen.insert(criterion.id.as_str()) {
                return Err(PilotError::InvalidMission(format!(
                    "duplicate criterion id: {}",
                    criterion.id
                )));
            }
            if criterion.completed && criterion.completed_at.is_none() {
                return Err(PilotError::InvalidMission(format!(
                    "criterion {} is completed without completed_at",
                    criterion.id
                )));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl MissionSource for YamlMissionSource {
    async fn load(&self) -> Result<Mission> {
        if !self.path.exists() {
            return Err(PilotError::MissionNotFound(
                self.path.display().to_string(),
            ));
        }

        let content = fs::read_to_string(&self.path).await?;
        let mission: Mission = serde_yaml_bw::from_str(&content)?;
        Self::validate(&mission)?;

        debug!(
            mission_id = mission.id,
            criteria = mission.definition_of_done.len(),
            "Mission loaded"
        );
        Ok(mission)
    }
}
