// ABOUTME: Server settings parsing for slipway.yml.
// ABOUTME: One explicit Settings struct constructed at startup and passed by reference.

mod deployment;

pub use deployment::{DeployConfig, DeployConfigError, DeploymentType};

use crate::error::{Error, Result};
use crate::webhook::ProjectId;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SETTINGS_FILENAME: &str = "slipway.yml";
pub const SETTINGS_FILENAME_ALT: &str = "slipway.yaml";

/// Server-side settings. Loaded once at process start; no component reads
/// ambient global state.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Shared webhook secret. When set, unsigned or mis-signed payloads are
    /// rejected.
    #[serde(default)]
    pub secret: Option<String>,

    /// Branches allowed to trigger a deployment.
    #[serde(default = "default_branches")]
    pub allowed_branches: Vec<String>,

    /// Whether a pushed tag triggers a deployment regardless of branch.
    #[serde(default)]
    pub deploy_on_tag: bool,

    /// Directory holding per-project working copies.
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,

    /// Path of the SQLite record store.
    #[serde(default = "default_store")]
    pub store: PathBuf,

    /// Upper bound for one compose up/build run.
    #[serde(default = "default_compose_timeout", with = "humantime_serde")]
    pub compose_timeout: Duration,

    /// Upper bound for one git clone/pull.
    #[serde(default = "default_vcs_timeout", with = "humantime_serde")]
    pub vcs_timeout: Duration,

    /// Retries after the first failed workload inspection.
    #[serde(default = "default_healthcheck_retries")]
    pub healthcheck_retries: u32,

    /// Fixed backoff between healthcheck attempts.
    #[serde(default = "default_healthcheck_backoff", with = "humantime_serde")]
    pub healthcheck_backoff: Duration,

    /// Whether finalization sends a chat notification.
    #[serde(default)]
    pub notifications: bool,
}

fn default_branches() -> Vec<String> {
    vec!["master".to_string(), "main".to_string()]
}

fn default_workspace() -> PathBuf {
    PathBuf::from("projects")
}

fn default_store() -> PathBuf {
    PathBuf::from("slipway.db")
}

fn default_compose_timeout() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_vcs_timeout() -> Duration {
    Duration::from_secs(3 * 60)
}

fn default_healthcheck_retries() -> u32 {
    5
}

fn default_healthcheck_backoff() -> Duration {
    Duration::from_secs(3)
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            secret: None,
            allowed_branches: default_branches(),
            deploy_on_tag: false,
            workspace: default_workspace(),
            store: default_store(),
            compose_timeout: default_compose_timeout(),
            vcs_timeout: default_vcs_timeout(),
            healthcheck_retries: default_healthcheck_retries(),
            healthcheck_backoff: default_healthcheck_backoff(),
            notifications: false,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [dir.join(SETTINGS_FILENAME), dir.join(SETTINGS_FILENAME_ALT)];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Working-copy directory for a project.
    pub fn project_dir(&self, project: &ProjectId) -> PathBuf {
        self.workspace.join(project.full_name())
    }

    /// Whether this branch name is allowed to trigger a deployment.
    pub fn branch_allowed(&self, branch: &str) -> bool {
        self.allowed_branches.iter().any(|b| b == branch)
    }
}

/// Write a template slipway.yml into `dir`.
pub fn init_settings(dir: &Path, force: bool) -> Result<()> {
    let path = dir.join(SETTINGS_FILENAME);

    if path.exists() && !force {
        return Err(Error::AlreadyExists(path));
    }

    std::fs::write(&path, template_yaml())?;
    Ok(())
}

fn template_yaml() -> String {
    r#"# slipway server settings
# secret: change-me
allowed_branches:
  - master
  - main
deploy_on_tag: false
workspace: projects
store: slipway.db
compose_timeout: 30m
vcs_timeout: 3m
healthcheck_retries: 5
healthcheck_backoff: 3s
notifications: false
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let settings = Settings::from_yaml("{}").unwrap();
        assert_eq!(settings.allowed_branches, vec!["master", "main"]);
        assert!(!settings.deploy_on_tag);
        assert_eq!(settings.healthcheck_retries, 5);
        assert_eq!(settings.healthcheck_backoff, Duration::from_secs(3));
        assert!(settings.secret.is_none());
    }

    #[test]
    fn parse_full_settings() {
        let yaml = r#"
secret: hunter2
allowed_branches:
  - main
  - staging
deploy_on_tag: true
workspace: /srv/projects
store: /var/lib/slipway/records.db
compose_timeout: 10m
healthcheck_backoff: 500ms
notifications: true
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.secret.as_deref(), Some("hunter2"));
        assert!(settings.deploy_on_tag);
        assert!(settings.branch_allowed("staging"));
        assert!(!settings.branch_allowed("master"));
        assert_eq!(settings.compose_timeout, Duration::from_secs(600));
        assert_eq!(settings.healthcheck_backoff, Duration::from_millis(500));
        assert!(settings.notifications);
    }

    #[test]
    fn project_dir_nests_owner_and_repo() {
        let settings = Settings::default();
        let project = ProjectId::new("Acme/WebApp");
        assert_eq!(
            settings.project_dir(&project),
            PathBuf::from("projects/acme/webapp")
        );
    }

    #[test]
    fn template_round_trips() {
        let settings = Settings::from_yaml(&template_yaml()).unwrap();
        assert_eq!(settings.allowed_branches, vec!["master", "main"]);
        assert_eq!(settings.compose_timeout, Duration::from_secs(30 * 60));
    }
}
