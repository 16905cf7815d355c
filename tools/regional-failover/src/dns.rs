use async_trait::async_trait;
use aws_sdk_route53::error::DisplayErrorContext;
use aws_sdk_route53::types::{
    AliasTarget, Change, ChangeAction, ChangeBatch, ResourceRecordSet, RrType,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::config::{IRELAND, LONDON};
use crate::error::{FailoverError, Result};
use crate::load_balancer::LoadBalancerAliasTarget;
use crate::plan::FailoverPlan;

const HOSTED_ZONE_PREFIX: &str = "/hostedzone/";
const HOSTED_ZONE_LOOKUP_LIMIT: i32 = 1;

pub const ACTIVE_WEIGHT: i64 = 100;
pub const STANDBY_WEIGHT: i64 = 0;
pub const FAILOVER_COMMENT: &str = "Failing over to London";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZoneSummary {
    pub id: String,
    pub name: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct WeightedAliasChange {
    pub name: String,
    pub record_type: String,
    pub set_identifier: String,
    pub weight: i64,
    pub alias_target: LoadBalancerAliasTarget,
    pub evaluate_target_health: bool,
}

// Submitted as one batch so Route 53 applies both weights atomically
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FailoverChangeBatch {
    pub comment: String,
    pub changes: Vec<WeightedAliasChange>,
}

#[async_trait]
pub trait Route53Api: Send + Sync {
    async fn list_hosted_zones_by_name(
        &self,
        dns_name: &str,
        max_items: i32,
    ) -> Result<Vec<HostedZoneSummary>>;

    async fn change_resource_record_sets(
        &self,
        hosted_zone_id: &str,
        batch: &FailoverChangeBatch,
    ) -> Result<String>;
}

#[async_trait]
impl<T: Route53Api + ?Sized> Route53Api for Arc<T> {
    async fn list_hosted_zones_by_name(
        &self,
        dns_name: &str,
        max_items: i32,
    ) -> Result<Vec<HostedZoneSummary>> {
        (**self).list_hosted_zones_by_name(dns_name, max_items).await
    }

    async fn change_resource_record_sets(
        &self,
        hosted_zone_id: &str,
        batch: &FailoverChangeBatch,
    ) -> Result<String> {
        (**self)
            .change_resource_record_sets(hosted_zone_id, batch)
            .await
    }
}

fn invalid_request(e: aws_sdk_route53::error::BuildError) -> FailoverError {
    FailoverError::InvalidRequest(e.to_string())
}

fn to_sdk_change(change: &WeightedAliasChange) -> Result<Change> {
    let alias_target = AliasTarget::builder()
        .hosted_zone_id(&change.alias_target.hosted_zone_id)
        .dns_name(&change.alias_target.dns_name)
        .evaluate_target_health(change.evaluate_target_health)
        .build()
        .map_err(invalid_request)?;

    let record_set = ResourceRecordSet::builder()
        .name(&change.name)
        .r#type(RrType::from(change.record_type.as_str()))
        .set_identifier(&change.set_identifier)
        .weight(change.weight)
        .alias_target(alias_target)
        .build()
        .map_err(invalid_request)?;

    Change::builder()
        .action(ChangeAction::Upsert)
        .resource_record_set(record_set)
        .build()
        .map_err(invalid_request)
}

#[async_trait]
impl Route53Api for aws_sdk_route53::Client {
    async fn list_hosted_zones_by_name(
        &self,
        dns_name: &str,
        max_items: i32,
    ) -> Result<Vec<HostedZoneSummary>> {
        let output = aws_sdk_route53::Client::list_hosted_zones_by_name(self)
            .dns_name(dns_name)
            .max_items(max_items)
            .send()
            .await
            .map_err(|e| {
                FailoverError::upstream("ListHostedZonesByName", DisplayErrorContext(e).to_string())
            })?;

        Ok(output
            .hosted_zones()
            .iter()
            .map(|zone| HostedZoneSummary {
                id: zone.id().to_string(),
                name: zone.name().to_string(),
            })
            .collect())
    }

    async fn change_resource_record_sets(
        &self,
        hosted_zone_id: &str,
        batch: &FailoverChangeBatch,
    ) -> Result<String> {
        let changes = batch
            .changes
            .iter()
            .map(to_sdk_change)
            .collect::<Result<Vec<_>>>()?;

        let change_batch = ChangeBatch::builder()
            .set_changes(Some(changes))
            .comment(&batch.comment)
            .build()
            .map_err(invalid_request)?;

        let output = aws_sdk_route53::Client::change_resource_record_sets(self)
            .hosted_zone_id(hosted_zone_id)
            .change_batch(change_batch)
            .send()
            .await
            .map_err(|e| {
                FailoverError::upstream(
                    "ChangeResourceRecordSets",
                    DisplayErrorContext(e).to_string(),
                )
            })?;

        output
            .change_info()
            .map(|info| info.id().to_string())
            .ok_or_else(|| {
                FailoverError::NotFound("change info in ChangeResourceRecordSets response".into())
            })
    }
}

// Route 53 returns zone names fully qualified
fn same_domain(zone_name: &str, name: &str) -> bool {
    zone_name.trim_end_matches('.') == name.trim_end_matches('.')
}

pub fn bare_zone_id(id: &str) -> &str {
    id.strip_prefix(HOSTED_ZONE_PREFIX).unwrap_or(id)
}

fn weighted_alias(
    plan: &FailoverPlan,
    region: &str,
    weight: i64,
    target: &LoadBalancerAliasTarget,
) -> WeightedAliasChange {
    WeightedAliasChange {
        name: plan.record_name.clone(),
        record_type: "A".to_string(),
        set_identifier: region.to_string(),
        weight,
        alias_target: target.clone(),
        evaluate_target_health: false,
    }
}

/// The London-active batch: London at full weight, Ireland drained.
pub fn failover_change_batch(plan: &FailoverPlan) -> FailoverChangeBatch {
    FailoverChangeBatch {
        comment: FAILOVER_COMMENT.to_string(),
        changes: vec![
            weighted_alias(plan, LONDON, ACTIVE_WEIGHT, &plan.london),
            weighted_alias(plan, IRELAND, STANDBY_WEIGHT, &plan.ireland),
        ],
    }
}

pub struct DnsService<C> {
    client: C,
}

impl<C: Route53Api> DnsService<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn lookup_hosted_zone(&self, name: &str) -> Result<String> {
        let zones = self
            .client
            .list_hosted_zones_by_name(name, HOSTED_ZONE_LOOKUP_LIMIT)
            .await?;

        // The listing starts at `name` but can return the next zone along
        let mut matching: Vec<HostedZoneSummary> = zones
            .into_iter()
            .filter(|zone| same_domain(&zone.name, name))
            .collect();

        match matching.len() {
            0 => Err(FailoverError::NotFound(format!("hosted zone named {}", name))),
            1 => {
                let zone = matching.remove(0);
                let id = bare_zone_id(&zone.id).to_string();
                info!("Hosted zone for {} is {}", name, id);
                Ok(id)
            }
            count => Err(FailoverError::Ambiguous {
                what: format!("hosted zone named {}", name),
                count,
            }),
        }
    }

    #[instrument(skip(self, plan), fields(record = %plan.record_name, zone = %plan.hosted_zone_id))]
    pub async fn failover_dns(&self, plan: &FailoverPlan) -> Result<String> {
        let batch = failover_change_batch(plan);

        let change_id = self
            .client
            .change_resource_record_sets(&plan.hosted_zone_id, &batch)
            .await?;

        info!("{} has started to failover", change_id);

        Ok(change_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use aws_sdk_route53::operation::change_resource_record_sets::{
        ChangeResourceRecordSetsInput, ChangeResourceRecordSetsOutput,
    };
    use aws_sdk_route53::primitives::DateTime;
    use aws_sdk_route53::types::{ChangeInfo, ChangeStatus};
    use aws_smithy_mocks::{mock, mock_client};
    use std::sync::Mutex;

    fn plan() -> FailoverPlan {
        FailoverPlan::builder()
            .environment(Environment::new("production"))
            .account_id("012345678")
            .zone_lookup_name("sirius-opg.uk")
            .record_name("live.sirius-opg.uk")
            .hosted_zone_id("Z12345678")
            .london(LoadBalancerAliasTarget {
                hosted_zone_id: "ZHURV8PSTC4K8".to_string(),
                dns_name: "production-1.eu-west-2.elb.amazonaws.com".to_string(),
            })
            .ireland(LoadBalancerAliasTarget {
                hosted_zone_id: "Z32O12XQLNTSW2".to_string(),
                dns_name: "production-2.eu-west-1.elb.amazonaws.com".to_string(),
            })
            .global_clusters(Vec::new())
            .build()
    }

    fn pending_change(id: &str) -> ChangeInfo {
        ChangeInfo::builder()
            .id(id)
            .status(ChangeStatus::Pending)
            .submitted_at(DateTime::from_secs(0))
            .build()
            .unwrap()
    }

    #[test]
    fn test_bare_zone_id() {
        assert_eq!(bare_zone_id("/hostedzone/Z12345678"), "Z12345678");
        assert_eq!(bare_zone_id("Z12345678"), "Z12345678");
    }

    #[test]
    fn test_same_domain_ignores_trailing_dot() {
        assert!(same_domain("sirius-opg.uk.", "sirius-opg.uk"));
        assert!(same_domain("sirius-opg.uk", "sirius-opg.uk."));
        assert!(!same_domain("live.sirius-opg.uk.", "sirius-opg.uk"));
    }

    #[tokio::test]
    async fn test_sdk_client_sends_weighted_upserts() {
        let sent: Arc<Mutex<Option<ChangeResourceRecordSetsInput>>> = Arc::new(Mutex::new(None));
        let capture = sent.clone();

        let rule = mock!(aws_sdk_route53::Client::change_resource_record_sets)
            .match_requests(move |req| {
                *capture.lock().unwrap() = Some(req.clone());
                true
            })
            .then_output(|| {
                ChangeResourceRecordSetsOutput::builder()
                    .change_info(pending_change("/change/C0123456789"))
                    .build()
            });
        let client = mock_client!(aws_sdk_route53, [&rule]);

        let batch = failover_change_batch(&plan());
        let change_id = Route53Api::change_resource_record_sets(&client, "Z12345678", &batch)
            .await
            .unwrap();
        assert_eq!(change_id, "/change/C0123456789");

        let input = sent.lock().unwrap().take().unwrap();
        assert_eq!(input.hosted_zone_id(), Some("Z12345678"));

        let change_batch = input.change_batch().unwrap();
        assert_eq!(change_batch.comment(), Some("Failing over to London"));
        assert_eq!(change_batch.changes().len(), 2);

        let expected = [
            ("eu-west-2", 100, "ZHURV8PSTC4K8", "production-1.eu-west-2.elb.amazonaws.com"),
            ("eu-west-1", 0, "Z32O12XQLNTSW2", "production-2.eu-west-1.elb.amazonaws.com"),
        ];

        for (change, (region, weight, zone, dns)) in change_batch.changes().iter().zip(expected) {
            assert_eq!(change.action(), &ChangeAction::Upsert);

            let record_set = change.resource_record_set().unwrap();
            assert_eq!(record_set.name(), "live.sirius-opg.uk");
            assert_eq!(record_set.r#type(), &RrType::A);
            assert_eq!(record_set.set_identifier(), Some(region));
            assert_eq!(record_set.weight(), Some(weight));

            let alias = record_set.alias_target().unwrap();
            assert_eq!(alias.hosted_zone_id(), zone);
            assert_eq!(alias.dns_name(), dns);
            assert!(!alias.evaluate_target_health());
        }
    }

    #[tokio::test]
    async fn test_sdk_client_without_change_info() {
        let rule = mock!(aws_sdk_route53::Client::change_resource_record_sets)
            .then_output(|| ChangeResourceRecordSetsOutput::builder().build());
        let client = mock_client!(aws_sdk_route53, [&rule]);

        let batch = failover_change_batch(&plan());
        let err = Route53Api::change_resource_record_sets(&client, "Z12345678", &batch)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
