// ABOUTME: Per-attempt deployment configuration.
// ABOUTME: Resolved from inline webhook data or a project-local .slipway.yml file.

use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const PROJECT_CONFIG_FILENAME: &str = ".slipway.yml";
pub const PROJECT_CONFIG_FILENAME_ALT: &str = ".slipway.yaml";

/// Supported deployment types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentType {
    /// Build and (re)start the project's compose stack.
    Deploy,
    /// Update the working copy only; no compose run.
    Pull,
}

#[derive(Debug, Error)]
pub enum DeployConfigError {
    #[error("no deployment config in webhook data or {}", .0.display())]
    NotFound(PathBuf),

    #[error("invalid deployment config: {0}")]
    Invalid(String),

    #[error("failed to read deployment config: {0}")]
    Io(#[from] std::io::Error),
}

/// Transient input to one deployment attempt. Never persisted standalone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    pub deployment_type: DeploymentType,

    /// Layer the prod compose override on top of the base compose file.
    #[serde(default)]
    pub prod_compose: bool,

    /// Container names to healthcheck after a deploy. Absent (or empty)
    /// means the attempt passes verification automatically.
    #[serde(default, deserialize_with = "deserialize_targets")]
    pub healthcheck: Option<NonEmpty<String>>,
}

impl DeployConfig {
    /// Resolve the config for one attempt. Inline webhook data wins over the
    /// project-local config file.
    pub fn resolve(
        inline: Option<&serde_json::Value>,
        project_dir: &Path,
    ) -> Result<Self, DeployConfigError> {
        if let Some(value) = inline {
            return serde_json::from_value(value.clone())
                .map_err(|e| DeployConfigError::Invalid(e.to_string()));
        }

        let candidates = [
            project_dir.join(PROJECT_CONFIG_FILENAME),
            project_dir.join(PROJECT_CONFIG_FILENAME_ALT),
        ];

        for path in &candidates {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                return serde_yaml::from_str(&content)
                    .map_err(|e| DeployConfigError::Invalid(e.to_string()));
            }
        }

        Err(DeployConfigError::NotFound(project_dir.to_path_buf()))
    }
}

fn deserialize_targets<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<NonEmpty<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<Vec<String>> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(NonEmpty::from_vec))
}
