//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Approval workflow configuration.
    #[serde(default)]
    pub workflow: WorkflowConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// What submission does when neither the management chain nor any rule
/// produces an approval step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyWorkflowPolicy {
    /// Refuse the submission; the expense stays in draft.
    #[default]
    Fail,
    /// Approve the expense immediately.
    AutoApprove,
    /// Keep the expense in `submitted` for an administrator to resolve.
    LeaveSubmitted,
}

/// Approval workflow configuration.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct WorkflowConfig {
    /// Outcome for submissions without any approval step.
    #[serde(default)]
    pub empty_workflow: EmptyWorkflowPolicy,
    /// Whether an approval rule may route an expense back to its submitter.
    #[serde(default)]
    pub allow_self_approval: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_log_filter() -> String {
    "spendflow=debug,sea_orm=info".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones overriding earlier ones:
    /// `config/default`, `config/{RUN_MODE}`, then `SPENDFLOW__*` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SPENDFLOW").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Config, File, FileFormat};

    fn from_toml(toml: &str) -> Result<AppConfig, config::ConfigError> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn test_defaults_applied() {
        let config = from_toml(
            r#"
            [database]
            url = "postgres://localhost/spendflow"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.database.min_connections, 1);
        assert_eq!(config.workflow.empty_workflow, EmptyWorkflowPolicy::Fail);
        assert!(!config.workflow.allow_self_approval);
        assert!(!config.logging.json);
        assert!(config.logging.filter.starts_with("spendflow="));
    }

    #[test]
    fn test_workflow_section() {
        let config = from_toml(
            r#"
            [database]
            url = "sqlite::memory:"

            [workflow]
            empty_workflow = "auto_approve"
            allow_self_approval = true
            "#,
        )
        .unwrap();

        assert_eq!(
            config.workflow.empty_workflow,
            EmptyWorkflowPolicy::AutoApprove
        );
        assert!(config.workflow.allow_self_approval);
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let result = from_toml(
            r#"
            [database]
            url = "sqlite::memory:"

            [workflow]
            empty_workflow = "pending_forever"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_database_url_rejected() {
        assert!(from_toml("[workflow]\nempty_workflow = \"fail\"").is_err());
    }
}
