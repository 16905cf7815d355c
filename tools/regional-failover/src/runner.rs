use chrono::Utc;
use serde::Serialize;
use std::future::Future;
use tracing::{info, warn};

use crate::cluster::{ClusterFailoverReport, ClusterService};
use crate::config::{Command, FailoverConfig, LONDON};
use crate::confirm::{production_prompt, Confirm};
use crate::dns::DnsService;
use crate::error::Result;
use crate::plan::{assemble_plan, FailoverPlan};
use crate::session::CloudProvider;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CutoverReport {
    pub status: String,
    pub change_id: String,
    pub record_name: String,
    pub hosted_zone_id: String,
    pub target_region: String,
    pub timestamp: String,
}

impl CutoverReport {
    fn started(plan: &FailoverPlan, change_id: String) -> Self {
        Self {
            status: "started".to_string(),
            change_id,
            record_name: plan.record_name.clone(),
            hosted_zone_id: plan.hosted_zone_id.clone(),
            target_region: LONDON.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The operator answered no; nothing was called.
    Declined,
    Planned(FailoverPlan),
    DnsCutover(CutoverReport),
    ClusterFailover { reports: Vec<ClusterFailoverReport> },
}

pub struct FailoverRunner<G> {
    config: FailoverConfig,
    gate: G,
}

impl<G: Confirm> FailoverRunner<G> {
    pub fn new(config: FailoverConfig, gate: G) -> Self {
        Self { config, gate }
    }

    /// Confirms if needed, then connects and executes.
    pub async fn run<P, F, Fut>(&self, connect: F) -> Result<RunOutcome>
    where
        P: CloudProvider,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<P>>,
    {
        if self.config.requires_confirmation() {
            let prompt = production_prompt(&self.config.command.to_string());
            if !self.gate.confirm(&prompt).await? {
                warn!("You confirmed you didn't want to failover production.");
                return Ok(RunOutcome::Declined);
            }
        }

        // Connect only after the gate, a declined run never builds a session
        let provider = connect().await?;
        self.execute(&provider).await
    }

    pub async fn execute<P: CloudProvider>(&self, provider: &P) -> Result<RunOutcome> {
        info!(
            "Starting {} failover for {}",
            self.config.command, self.config.environment
        );

        let plan = assemble_plan(provider, &self.config.environment).await?;

        if self.config.dry_run {
            info!("Dry run, no changes made");
            return Ok(RunOutcome::Planned(plan));
        }

        match self.config.command {
            Command::Dns => {
                let change_id = DnsService::new(provider.route53().await?)
                    .failover_dns(&plan)
                    .await?;

                Ok(RunOutcome::DnsCutover(CutoverReport::started(
                    &plan, change_id,
                )))
            }
            Command::Clusters => {
                let reports = ClusterService::new(provider.rds(LONDON).await?)
                    .failover_all(&plan.global_clusters)
                    .await?;

                Ok(RunOutcome::ClusterFailover { reports })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use async_trait::async_trait;
    use crate::error::FailoverError;
    use crate::session::AwsCloud;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Answer(bool);

    #[async_trait]
    impl Confirm for Answer {
        async fn confirm(&self, _prompt: &str) -> Result<bool> {
            Ok(self.0)
        }
    }

    struct BrokenPrompt;

    #[async_trait]
    impl Confirm for BrokenPrompt {
        async fn confirm(&self, _prompt: &str) -> Result<bool> {
            Err(FailoverError::Prompt("not a terminal".to_string()))
        }
    }

    fn production(command: Command) -> FailoverConfig {
        FailoverConfig {
            environment: Environment::new("production"),
            command,
            dry_run: false,
        }
    }

    #[tokio::test]
    async fn test_declined_production_never_connects() {
        let runner = FailoverRunner::new(production(Command::Dns), Answer(false));

        let connected = AtomicBool::new(false);

        let outcome = runner
            .run(|| async {
                connected.store(true, Ordering::SeqCst);
                Err::<AwsCloud, _>(FailoverError::Configuration(String::new()))
            })
            .await
            .unwrap();

        assert_eq!(outcome, RunOutcome::Declined);
        assert!(!connected.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_prompt_failure_aborts() {
        let runner = FailoverRunner::new(production(Command::Clusters), BrokenPrompt);

        let err = runner
            .run(|| async { Err::<AwsCloud, _>(FailoverError::Configuration(String::new())) })
            .await
            .unwrap_err();

        assert!(matches!(err, FailoverError::Prompt(_)));
    }

    #[tokio::test]
    async fn test_connect_failure_propagates() {
        let runner = FailoverRunner::new(production(Command::Dns), Answer(true));

        let err = runner
            .run(|| async {
                Err::<AwsCloud, _>(FailoverError::Configuration("invalid region".to_string()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, FailoverError::Configuration(_)));
    }

    #[test]
    fn test_declined_outcome_serialization() {
        let json = serde_json::to_value(RunOutcome::Declined).unwrap();
        assert_eq!(json["outcome"], "declined");
    }
}
