use async_trait::async_trait;
use aws_sdk_rds::error::DisplayErrorContext;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::config::{Environment, LONDON};
use crate::error::{FailoverError, Result};

const GLOBAL_CLUSTER_STACKS: [&str; 2] = ["membrane", "api"];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GlobalClusterTarget {
    pub global_cluster_id: String,
    pub target_cluster_arn: String,
}

impl GlobalClusterTarget {
    pub fn new(stack: &str, environment: &Environment, account_id: &str) -> Self {
        Self {
            global_cluster_id: format!("{}-{}-global", environment, stack),
            target_cluster_arn: format!(
                "arn:aws:rds:{}:{}:cluster:{}-{}",
                LONDON, account_id, stack, environment
            ),
        }
    }

    pub fn for_environment(environment: &Environment, account_id: &str) -> Vec<Self> {
        GLOBAL_CLUSTER_STACKS
            .iter()
            .map(|stack| Self::new(stack, environment, account_id))
            .collect()
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ClusterFailoverReport {
    pub status: String,
    pub global_cluster_id: String,
    pub target_cluster_arn: String,
    pub timestamp: String,
}

#[async_trait]
pub trait RdsApi: Send + Sync {
    async fn failover_global_cluster(
        &self,
        global_cluster_id: &str,
        target_cluster_arn: &str,
    ) -> Result<()>;
}

#[async_trait]
impl<T: RdsApi + ?Sized> RdsApi for Arc<T> {
    async fn failover_global_cluster(
        &self,
        global_cluster_id: &str,
        target_cluster_arn: &str,
    ) -> Result<()> {
        (**self)
            .failover_global_cluster(global_cluster_id, target_cluster_arn)
            .await
    }
}

#[async_trait]
impl RdsApi for aws_sdk_rds::Client {
    async fn failover_global_cluster(
        &self,
        global_cluster_id: &str,
        target_cluster_arn: &str,
    ) -> Result<()> {
        aws_sdk_rds::Client::failover_global_cluster(self)
            .global_cluster_identifier(global_cluster_id)
            .target_db_cluster_identifier(target_cluster_arn)
            .send()
            .await
            .map_err(|e| {
                FailoverError::upstream("FailoverGlobalCluster", DisplayErrorContext(e).to_string())
            })?;

        Ok(())
    }
}

pub struct ClusterService<C> {
    client: C,
}

impl<C: RdsApi> ClusterService<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn failover_cluster(
        &self,
        global_cluster_id: &str,
        target_cluster_arn: &str,
    ) -> Result<()> {
        self.client
            .failover_global_cluster(global_cluster_id, target_cluster_arn)
            .await?;

        info!("{} has started to failover", global_cluster_id);

        Ok(())
    }

    pub async fn failover_all(
        &self,
        targets: &[GlobalClusterTarget],
    ) -> Result<Vec<ClusterFailoverReport>> {
        let mut reports = Vec::with_capacity(targets.len());

        for target in targets {
            // A half-promoted set needs an operator, so don't push on past a rejection
            if let Err(e) = self
                .failover_cluster(&target.global_cluster_id, &target.target_cluster_arn)
                .await
            {
                error!(
                    "Failover of {} stopped after {} of {} clusters: {}",
                    target.global_cluster_id,
                    reports.len(),
                    targets.len(),
                    e
                );
                return Err(e);
            }

            reports.push(ClusterFailoverReport {
                status: "started".to_string(),
                global_cluster_id: target.global_cluster_id.clone(),
                target_cluster_arn: target.target_cluster_arn.clone(),
                timestamp: Utc::now().to_rfc3339(),
            });
        }

        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_for_environment() {
        let targets =
            GlobalClusterTarget::for_environment(&Environment::new("production"), "012345678");

        assert_eq!(
            targets,
            vec![
                GlobalClusterTarget {
                    global_cluster_id: "production-membrane-global".to_string(),
                    target_cluster_arn: "arn:aws:rds:eu-west-2:012345678:cluster:membrane-production"
                        .to_string(),
                },
                GlobalClusterTarget {
                    global_cluster_id: "production-api-global".to_string(),
                    target_cluster_arn: "arn:aws:rds:eu-west-2:012345678:cluster:api-production"
                        .to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_report_serialization() {
        let report = ClusterFailoverReport {
            status: "started".to_string(),
            global_cluster_id: "preproduction-api-global".to_string(),
            target_cluster_arn: "arn:aws:rds:eu-west-2:012345678:cluster:api-preproduction"
                .to_string(),
            timestamp: "2025-01-06T12:00:00Z".to_string(),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "started");
        assert_eq!(json["global_cluster_id"], "preproduction-api-global");
    }
}
