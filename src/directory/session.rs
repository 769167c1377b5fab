use std::time::SystemTime;

use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{AppName, BehaviorVersion, Region, SdkConfig};
use aws_sdk_sts::config::{Credentials, SharedCredentialsProvider};
use aws_sdk_sts::error::DisplayErrorContext;
use aws_sdk_sts::Client as StsClient;
use tracing::{debug, info};

use crate::config::DirectoryConfig;
use crate::error::{Error, Result};
use crate::role::RoleReference;

const APP_NAME: &str = "aws-sso-directory";

fn sdk_config(config: &DirectoryConfig, credentials: Credentials) -> SdkConfig {
    let mut builder = SdkConfig::builder()
        .app_name(AppName::new(APP_NAME).expect("Const app name should be valid"))
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .credentials_provider(SharedCredentialsProvider::new(credentials));
    if let Some(max_attempts) = config.max_attempts {
        builder = builder.retry_config(RetryConfig::standard().with_max_attempts(max_attempts));
    }
    if let Some(timeout) = config.operation_timeout {
        builder = builder.timeout_config(TimeoutConfig::builder().operation_timeout(timeout).build());
    }
    builder.build()
}

/// Assumes `role` with the configured credentials and returns an SDK config
/// carrying the temporary role credentials.
pub(crate) async fn assume_role(role: &RoleReference, config: &DirectoryConfig) -> Result<SdkConfig> {
    config.validate()?;

    let base_credentials = Credentials::new(
        config.credentials.access_key_id.clone(),
        config.credentials.secret_access_key.clone(),
        config.credentials.session_token.clone(),
        None,
        "directory-config",
    );
    let sts_client = StsClient::new(&sdk_config(config, base_credentials));

    debug!(role = %role, session = config.session_name(), "Trying to assume role");
    let output = sts_client
        .assume_role()
        .role_arn(role.arn())
        .role_session_name(config.session_name())
        .send()
        .await
        .map_err(|err| {
            Error::Authentication(format!(
                "AssumeRole {role} failed: {}",
                DisplayErrorContext(&err)
            ))
        })?;

    let credentials = output
        .credentials()
        .ok_or_else(|| Error::Authentication(format!("AssumeRole {role} returned no credentials")))?;
    let expires_after = SystemTime::try_from(*credentials.expiration()).ok();

    info!(role = %role, "Assumed role session established");
    Ok(sdk_config(
        config,
        Credentials::new(
            credentials.access_key_id(),
            credentials.secret_access_key(),
            Some(credentials.session_token().to_string()),
            expires_after,
            "assumed-role",
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticCredentials;

    #[tokio::test]
    async fn test_blank_credentials_fail_before_any_call() {
        let role = RoleReference::new("123456789012", "SSOAdmin").unwrap();
        let config = DirectoryConfig::new("eu-west-1", StaticCredentials::new("", "secret", None));
        let err = assume_role(&role, &config).await.unwrap_err();
        assert!(matches!(err, Error::Authentication(msg) if msg.contains("access_key_id")));
    }

    #[test]
    fn test_sdk_config_applies_knobs() {
        let config = DirectoryConfig::new(
            "eu-central-1",
            StaticCredentials::new("AKIA", "secret", None),
        )
        .with_max_attempts(7)
        .with_operation_timeout(std::time::Duration::from_secs(45));
        let sdk = sdk_config(
            &config,
            Credentials::new("AKIA", "secret", None, None, "test"),
        );
        assert_eq!(sdk.region().map(|r| r.as_ref()), Some("eu-central-1"));
        assert_eq!(sdk.retry_config().map(|r| r.max_attempts()), Some(7));
        assert!(sdk.credentials_provider().is_some());
        assert_eq!(
            sdk.timeout_config().and_then(|t| t.operation_timeout()),
            Some(std::time::Duration::from_secs(45))
        );

        let defaults = sdk_config(
            &DirectoryConfig::new("eu-central-1", StaticCredentials::new("AKIA", "secret", None)),
            Credentials::new("AKIA", "secret", None, None, "test"),
        );
        assert_eq!(
            defaults.timeout_config().and_then(|t| t.operation_timeout()),
            None
        );
    }
}
