use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_REGION: &str = "eu-west-1";
// Failover moves traffic from Ireland to London
pub const LONDON: &str = "eu-west-2";
pub const IRELAND: &str = "eu-west-1";

pub const IAM_ROLE_VAR: &str = "AWS_IAM_ROLE";

const PRODUCTION: &str = "production";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Environment(String);

impl Environment {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_production(&self) -> bool {
        self.0 == PRODUCTION
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn parse_environment(value: &str) -> Result<Environment, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("environment must not be empty".to_string());
    }
    Ok(Environment::new(value))
}

/// Manual regional failover for Sirius environments.
#[derive(Parser, Debug)]
#[command(name = "failover")]
#[command(about = "Fail a Sirius environment over from Ireland to London")]
#[command(version)]
pub struct Cli {
    /// Environment to failover
    #[arg(long = "env", value_parser = parse_environment)]
    pub env: Environment,

    /// Resolve and print the failover plan without changing anything
    #[arg(long)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Repoint the weighted DNS record at the London load balancer (default)
    Dns,
    /// Promote the London database clusters inside their global clusters
    Clusters,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dns => write!(f, "dns"),
            Self::Clusters => write!(f, "clusters"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailoverConfig {
    pub environment: Environment,
    pub command: Command,
    pub dry_run: bool,
}

impl From<Cli> for FailoverConfig {
    fn from(cli: Cli) -> Self {
        Self {
            environment: cli.env,
            command: cli.command.unwrap_or(Command::Dns),
            dry_run: cli.dry_run,
        }
    }
}

impl FailoverConfig {
    /// Only production mutations go through the confirmation prompt.
    pub fn requires_confirmation(&self) -> bool {
        self.environment.is_production() && !self.dry_run
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub default_region: String,
    pub assume_role: Option<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            default_region: DEFAULT_REGION.to_string(),
            assume_role: None,
        }
    }
}

impl SessionSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let assume_role = lookup(IAM_ROLE_VAR).filter(|role| !role.trim().is_empty());

        Self {
            assume_role,
            ..Self::default()
        }
    }

    pub fn resolve_region<'a>(&'a self, region: &'a str) -> &'a str {
        if region.is_empty() {
            &self.default_region
        } else {
            region
        }
    }
}

pub fn validate_region(region: &str) -> bool {
    // Shape check only; the SDK rejects unknown regions on first call
    !region.is_empty()
        && region.contains('-')
        && region
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
