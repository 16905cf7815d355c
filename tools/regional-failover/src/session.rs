use async_trait::async_trait;
use aws_config::sts::AssumeRoleProvider;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use tracing::{debug, info};

use crate::cluster::RdsApi;
use crate::config::{validate_region, SessionSettings};
use crate::dns::Route53Api;
use crate::error::{FailoverError, Result};
use crate::identity::StsApi;
use crate::load_balancer::ElbApi;

const ROLE_SESSION_NAME: &str = "regional-failover";

#[derive(Debug, Clone)]
pub struct Session {
    region: String,
    config: SdkConfig,
}

impl Session {
    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn sts_client(&self) -> aws_sdk_sts::Client {
        aws_sdk_sts::Client::new(&self.config)
    }

    pub fn route53_client(&self) -> aws_sdk_route53::Client {
        aws_sdk_route53::Client::new(&self.config)
    }

    pub fn elb_client(&self) -> aws_sdk_elasticloadbalancingv2::Client {
        aws_sdk_elasticloadbalancingv2::Client::new(&self.config)
    }

    pub fn rds_client(&self) -> aws_sdk_rds::Client {
        aws_sdk_rds::Client::new(&self.config)
    }
}

pub struct SessionFactory {
    settings: SessionSettings,
}

impl SessionFactory {
    pub fn new(settings: SessionSettings) -> Self {
        Self { settings }
    }

    /// Builds a session for `region`, or the default region when it is empty.
    pub async fn session(&self, region: &str) -> Result<Session> {
        let region = self.settings.resolve_region(region).to_string();

        if !validate_region(&region) {
            return Err(FailoverError::Configuration(format!(
                "invalid region '{}'",
                region
            )));
        }

        let base = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;

        let config = match &self.settings.assume_role {
            // Ambient credentials are only used to assume the role, clients sign
            // with the temporary role credentials
            Some(role) => {
                info!("Assuming role {} for session in {}", role, region);

                let provider = AssumeRoleProvider::builder(role.clone())
                    .session_name(ROLE_SESSION_NAME)
                    .region(Region::new(region.clone()))
                    .configure(&base)
                    .build()
                    .await;

                aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(region.clone()))
                    .credentials_provider(provider)
                    .load()
                    .await
            }
            None => base,
        };

        debug!("Created session for region {}", region);

        Ok(Session { region, config })
    }
}

/// Hands out clients for each external service the failover talks to.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    type Sts: StsApi;
    type Route53: Route53Api;
    type Elb: ElbApi;
    type Rds: RdsApi;

    async fn sts(&self) -> Result<Self::Sts>;

    async fn route53(&self) -> Result<Self::Route53>;

    /// Load balancers are regional, so every call opens a fresh session.
    async fn elb(&self, region: &str) -> Result<Self::Elb>;

    async fn rds(&self, region: &str) -> Result<Self::Rds>;
}

pub struct AwsCloud {
    factory: SessionFactory,
    default_session: Session,
}

impl AwsCloud {
    pub async fn new(settings: SessionSettings) -> Result<Self> {
        let factory = SessionFactory::new(settings);
        let default_session = factory.session("").await?;

        Ok(Self {
            factory,
            default_session,
        })
    }
}

#[async_trait]
impl CloudProvider for AwsCloud {
    type Sts = aws_sdk_sts::Client;
    type Route53 = aws_sdk_route53::Client;
    type Elb = aws_sdk_elasticloadbalancingv2::Client;
    type Rds = aws_sdk_rds::Client;

    async fn sts(&self) -> Result<Self::Sts> {
        Ok(self.default_session.sts_client())
    }

    async fn route53(&self) -> Result<Self::Route53> {
        Ok(self.default_session.route53_client())
    }

    async fn elb(&self, region: &str) -> Result<Self::Elb> {
        Ok(self.factory.session(region).await?.elb_client())
    }

    async fn rds(&self, region: &str) -> Result<Self::Rds> {
        Ok(self.factory.session(region).await?.rds_client())
    }
}
