use bon::Builder;
use serde::Serialize;
use tracing::info;

use crate::cluster::GlobalClusterTarget;
use crate::config::{Environment, IRELAND, LONDON};
use crate::dns::DnsService;
use crate::error::Result;
use crate::identity::IdentityResolver;
use crate::load_balancer::{locate_load_balancer, LoadBalancerAliasTarget};
use crate::session::CloudProvider;

const PRODUCTION_ZONE: &str = "sirius-opg.uk";
const PRODUCTION_RECORD: &str = "live.sirius-opg.uk";
const PREPRODUCTION_RECORD: &str = "preproduction.sirius.opg.digital";

#[derive(Builder, Serialize, Debug, Clone, PartialEq, Eq)]
#[builder(on(String, into))]
#[serde(rename_all = "snake_case")]
pub struct FailoverPlan {
    pub environment: Environment,
    pub account_id: String,
    /// Name the hosted zone was found under.
    pub zone_lookup_name: String,
    pub record_name: String,
    pub hosted_zone_id: String,
    pub london: LoadBalancerAliasTarget,
    pub ireland: LoadBalancerAliasTarget,
    pub global_clusters: Vec<GlobalClusterTarget>,
}

pub fn zone_lookup_name(environment: &Environment) -> &'static str {
    if environment.is_production() {
        PRODUCTION_ZONE
    } else {
        PREPRODUCTION_RECORD
    }
}

/// Record rewritten by the cutover. Production lives one label below its zone apex.
pub fn record_name(environment: &Environment) -> &'static str {
    if environment.is_production() {
        PRODUCTION_RECORD
    } else {
        zone_lookup_name(environment)
    }
}

/// Resolves account, zone and both regions' load balancers for `environment`.
pub async fn assemble_plan<P: CloudProvider>(
    provider: &P,
    environment: &Environment,
) -> Result<FailoverPlan> {
    // Fixed order: identity, hosted zone, London, Ireland. First failure aborts.
    let account_id = IdentityResolver::new(provider.sts().await?)
        .get_account_id()
        .await?;

    let lookup_name = zone_lookup_name(environment);
    let hosted_zone_id = DnsService::new(provider.route53().await?)
        .lookup_hosted_zone(lookup_name)
        .await?;

    let london = locate_load_balancer(provider, environment.as_str(), LONDON).await?;
    let ireland = locate_load_balancer(provider, environment.as_str(), IRELAND).await?;

    let plan = FailoverPlan::builder()
        .environment(environment.clone())
        .global_clusters(GlobalClusterTarget::for_environment(
            environment,
            &account_id,
        ))
        .account_id(account_id)
        .zone_lookup_name(lookup_name)
        .record_name(record_name(environment))
        .hosted_zone_id(hosted_zone_id)
        .london(london)
        .ireland(ireland)
        .build();

    info!(
        "Assembled failover plan for {}: {} in zone {}",
        plan.environment, plan.record_name, plan.hosted_zone_id
    );

    Ok(plan)
}
