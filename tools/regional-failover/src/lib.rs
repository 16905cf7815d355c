//! Manual regional failover for Sirius environments.
//!
//! Resolves the account, hosted zone and per-region load balancers for an
//! environment, then either moves its weighted DNS record to London in one
//! atomic change batch or promotes the London database clusters inside their
//! global clusters.

pub mod cluster;
pub mod config;
pub mod confirm;
pub mod dns;
pub mod error;
pub mod identity;
pub mod load_balancer;
pub mod plan;
pub mod runner;
pub mod session;

pub use cluster::{ClusterFailoverReport, ClusterService, GlobalClusterTarget, RdsApi};
pub use config::{
    validate_region, Cli, Command, Environment, FailoverConfig, SessionSettings, DEFAULT_REGION,
    IRELAND, LONDON,
};
pub use confirm::{Confirm, InteractiveConfirm};
pub use dns::{
    failover_change_batch, DnsService, FailoverChangeBatch, HostedZoneSummary, Route53Api,
    WeightedAliasChange,
};
pub use error::{FailoverError, Result};
pub use identity::{CallerIdentity, IdentityResolver, StsApi};
pub use load_balancer::{
    locate_load_balancer, ElbApi, LoadBalancerAliasTarget, LoadBalancerDescription,
    LoadBalancerLocator,
};
pub use plan::{assemble_plan, FailoverPlan};
pub use runner::{CutoverReport, FailoverRunner, RunOutcome};
pub use session::{AwsCloud, CloudProvider, Session, SessionFactory};
