use async_trait::async_trait;
use aws_sdk_elasticloadbalancingv2::error::DisplayErrorContext;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::{FailoverError, Result};
use crate::session::CloudProvider;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerAliasTarget {
    pub hosted_zone_id: String,
    pub dns_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadBalancerDescription {
    pub name: Option<String>,
    pub dns_name: Option<String>,
    pub canonical_hosted_zone_id: Option<String>,
}

#[async_trait]
pub trait ElbApi: Send + Sync {
    /// Balancers called `name`; an unknown name yields an empty list.
    async fn describe_load_balancers_by_name(
        &self,
        name: &str,
    ) -> Result<Vec<LoadBalancerDescription>>;
}

#[async_trait]
impl<T: ElbApi + ?Sized> ElbApi for Arc<T> {
    async fn describe_load_balancers_by_name(
        &self,
        name: &str,
    ) -> Result<Vec<LoadBalancerDescription>> {
        (**self).describe_load_balancers_by_name(name).await
    }
}

#[async_trait]
impl ElbApi for aws_sdk_elasticloadbalancingv2::Client {
    async fn describe_load_balancers_by_name(
        &self,
        name: &str,
    ) -> Result<Vec<LoadBalancerDescription>> {
        let result = aws_sdk_elasticloadbalancingv2::Client::describe_load_balancers(self)
            .names(name)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            // ELBv2 reports an unknown name as an error rather than an empty list
            Err(e)
                if e.as_service_error()
                    .map(|se| se.is_load_balancer_not_found_exception())
                    .unwrap_or(false) =>
            {
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(FailoverError::upstream(
                    "DescribeLoadBalancers",
                    DisplayErrorContext(e).to_string(),
                ))
            }
        };

        Ok(output
            .load_balancers()
            .iter()
            .map(|lb| LoadBalancerDescription {
                name: lb.load_balancer_name().map(str::to_string),
                dns_name: lb.dns_name().map(str::to_string),
                canonical_hosted_zone_id: lb.canonical_hosted_zone_id().map(str::to_string),
            })
            .collect())
    }
}

pub struct LoadBalancerLocator<C> {
    client: C,
}

impl<C: ElbApi> LoadBalancerLocator<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub async fn find(&self, name: &str) -> Result<LoadBalancerAliasTarget> {
        let mut balancers = self.client.describe_load_balancers_by_name(name).await?;

        let balancer = match balancers.len() {
            0 => {
                return Err(FailoverError::NotFound(format!(
                    "load balancer named {}",
                    name
                )))
            }
            1 => balancers.remove(0),
            count => {
                return Err(FailoverError::Ambiguous {
                    what: format!("load balancer named {}", name),
                    count,
                })
            }
        };

        let missing = |field: &str| {
            FailoverError::NotFound(format!("{} of load balancer {}", field, name))
        };

        Ok(LoadBalancerAliasTarget {
            hosted_zone_id: balancer
                .canonical_hosted_zone_id
                .ok_or_else(|| missing("canonical hosted zone id"))?,
            dns_name: balancer.dns_name.ok_or_else(|| missing("DNS name"))?,
        })
    }
}

/// Opens a session in `region` and resolves the alias target of `name` there.
#[instrument(skip(provider))]
pub async fn locate_load_balancer<P: CloudProvider>(
    provider: &P,
    name: &str,
    region: &str,
) -> Result<LoadBalancerAliasTarget> {
    let client = provider.elb(region).await?;

    // Both regions are searched for the same name, so failures must say where.
    let target = LoadBalancerLocator::new(client)
        .find(name)
        .await
        .map_err(|e| e.in_region(region))?;

    info!(
        "Load balancer {} in {} resolves to {}",
        name, region, target.dns_name
    );

    Ok(target)
}
