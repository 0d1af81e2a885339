use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BoundaryError, Result};
use crate::types::Fid;

/// Buffer size used when reading graph files.
pub const READ_BUFFER_SIZE: usize = 1024 * 1024;

/// The fragment whose worker merges and encodes the result unless configured otherwise.
pub const COORDINATOR_FID: Fid = 0;

/// Number of fragments used when neither the config file nor the command line sets one.
pub const DEFAULT_FRAGMENT_NUM: usize = 4;

/// Runtime configuration of a boundary computation.
///
/// Loaded from a YAML file, e.g.
///
/// ```yaml
/// fragment_num: 4
/// coordinator: 0
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    /// Number of fragments (and workers) the graph is split into.
    pub fragment_num: usize,
    /// Fragment id of the worker that owns the merged result.
    pub coordinator: Fid,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            fragment_num: DEFAULT_FRAGMENT_NUM,
            coordinator: COORDINATOR_FID,
        }
    }
}

impl BoundaryConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: BoundaryConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Checks that the fragment count is positive and the coordinator is one of the fragments.
    pub fn validate(&self) -> Result<()> {
        if self.fragment_num == 0 {
            return Err(BoundaryError::InvalidConfig(
                "fragment_num must be at least 1".to_string(),
            ));
        }
        if self.coordinator >= self.fragment_num {
            return Err(BoundaryError::InvalidConfig(format!(
                "coordinator {} is not a fragment id below {}",
                self.coordinator, self.fragment_num
            )));
        }
        Ok(())
    }
}
