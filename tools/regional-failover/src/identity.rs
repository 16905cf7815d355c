use async_trait::async_trait;
use aws_sdk_sts::error::DisplayErrorContext;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::{FailoverError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account: Option<String>,
    pub arn: Option<String>,
    pub user_id: Option<String>,
}

#[async_trait]
pub trait StsApi: Send + Sync {
    async fn get_caller_identity(&self) -> Result<CallerIdentity>;
}

#[async_trait]
impl<T: StsApi + ?Sized> StsApi for Arc<T> {
    async fn get_caller_identity(&self) -> Result<CallerIdentity> {
        (**self).get_caller_identity().await
    }
}

#[async_trait]
impl StsApi for aws_sdk_sts::Client {
    async fn get_caller_identity(&self) -> Result<CallerIdentity> {
        let output = aws_sdk_sts::Client::get_caller_identity(self)
            .send()
            .await
            .map_err(|e| {
                FailoverError::upstream("GetCallerIdentity", DisplayErrorContext(e).to_string())
            })?;

        Ok(CallerIdentity {
            account: output.account().map(str::to_string),
            arn: output.arn().map(str::to_string),
            user_id: output.user_id().map(str::to_string),
        })
    }
}

pub struct IdentityResolver<C> {
    client: C,
}

impl<C: StsApi> IdentityResolver<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn get_account_id(&self) -> Result<String> {
        let identity = self.client.get_caller_identity().await?;

        let account = identity
            .account
            // Cluster ARNs are built from this, an empty account is as bad as none
            .filter(|account| !account.is_empty())
            .ok_or_else(|| {
                FailoverError::NotFound("caller identity did not include an account".to_string())
            })?;

        info!(
            "Running as {} in account {}",
            identity.arn.as_deref().unwrap_or("unknown principal"),
            account
        );

        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedIdentity(CallerIdentity);

    #[async_trait]
    impl StsApi for FixedIdentity {
        async fn get_caller_identity(&self) -> Result<CallerIdentity> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_get_account_id() {
        let resolver = IdentityResolver::new(FixedIdentity(CallerIdentity {
            account: Some("012345678".to_string()),
            arn: Some("arn:test::value".to_string()),
            user_id: Some("12345".to_string()),
        }));

        assert_eq!(resolver.get_account_id().await.unwrap(), "012345678");
    }

    #[tokio::test]
    async fn test_missing_account_is_not_found() {
        let resolver = IdentityResolver::new(FixedIdentity(CallerIdentity::default()));

        let err = resolver.get_account_id().await.unwrap_err();
        assert!(err.is_not_found());
    }
}
