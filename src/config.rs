use serde::{Deserialize, Deserializer};
use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_SESSION_NAME: &str = "aws-sso-directory";
pub const DEFAULT_ASSIGNMENT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_ASSIGNMENT_MAX_POLLS: usize = 10;

const ENV_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
const ENV_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
const ENV_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
const ENV_REGION: &str = "AWS_REGION";
const ENV_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid config due to missing fields or invalid syntax: {0}")]
    InvalidConfig(serde_json::Error),
    #[error("Config file not found at {0:?}: {1}")]
    ConfigNotFound(PathBuf, std::io::Error),
    #[error("Environment variable {0} is not set")]
    MissingEnv(&'static str),
    #[error("Credential field {0} is empty")]
    EmptyCredential(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for crate::Error {
    fn from(value: Error) -> Self {
        crate::Error::Authentication(value.to_string())
    }
}

/// Long-lived credentials used to call STS AssumeRole.
#[derive(Clone, Deserialize)]
pub struct StaticCredentials {
    #[serde(alias = "accessKeyId")]
    pub access_key_id: String,
    #[serde(alias = "secretAccessKey")]
    pub secret_access_key: String,
    #[serde(default, alias = "sessionToken")]
    pub session_token: Option<String>,
}

impl StaticCredentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.access_key_id.trim().is_empty() {
            return Err(Error::EmptyCredential("access_key_id"));
        }
        if self.secret_access_key.trim().is_empty() {
            return Err(Error::EmptyCredential("secret_access_key"));
        }
        if matches!(&self.session_token, Some(token) if token.trim().is_empty()) {
            return Err(Error::EmptyCredential("session_token"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "** redacted **"),
            )
            .finish()
    }
}

fn deserialize_seconds<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer)?
        .map(|secs| Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom))
        .transpose()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    pub region: String,
    pub credentials: StaticCredentials,
    /// Identity Center instance; discovered through ListInstances when unset.
    #[serde(default, alias = "instanceArn")]
    pub instance_arn: Option<String>,
    #[serde(default, alias = "identityStoreId")]
    pub identity_store_id: Option<String>,
    #[serde(default, alias = "sessionName")]
    pub session_name: Option<String>,
    /// Forwarded to the SDK standard retry strategy.
    #[serde(default, alias = "maxAttempts")]
    pub max_attempts: Option<u32>,
    /// Seconds, fractions allowed.
    #[serde(default, alias = "operationTimeout", deserialize_with = "deserialize_seconds")]
    pub operation_timeout: Option<Duration>,
    /// Seconds, fractions allowed.
    #[serde(
        default,
        alias = "assignmentPollInterval",
        deserialize_with = "deserialize_seconds"
    )]
    pub assignment_poll_interval: Option<Duration>,
    #[serde(default, alias = "assignmentMaxPolls")]
    pub assignment_max_polls: Option<usize>,
}

impl DirectoryConfig {
    pub fn new(region: impl Into<String>, credentials: StaticCredentials) -> Self {
        Self {
            region: region.into(),
            credentials,
            instance_arn: None,
            identity_store_id: None,
            session_name: None,
            max_attempts: None,
            operation_timeout: None,
            assignment_poll_interval: None,
            assignment_max_polls: None,
        }
    }

    pub fn with_instance(
        mut self,
        instance_arn: impl Into<String>,
        identity_store_id: impl Into<String>,
    ) -> Self {
        self.instance_arn = Some(instance_arn.into());
        self.identity_store_id = Some(identity_store_id.into());
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    pub fn with_assignment_polling(mut self, interval: Duration, max_polls: usize) -> Self {
        self.assignment_poll_interval = Some(interval);
        self.assignment_max_polls = Some(max_polls);
        self
    }

    pub fn session_name(&self) -> &str {
        self.session_name.as_deref().unwrap_or(DEFAULT_SESSION_NAME)
    }

    pub fn polling(&self) -> AssignmentPolling {
        AssignmentPolling {
            interval: self
                .assignment_poll_interval
                .unwrap_or(DEFAULT_ASSIGNMENT_POLL_INTERVAL),
            max_polls: self
                .assignment_max_polls
                .unwrap_or(DEFAULT_ASSIGNMENT_MAX_POLLS),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.region.trim().is_empty() {
            return Err(Error::EmptyCredential("region"));
        }
        self.credentials.validate()
    }

    /// Builds a config from the standard AWS environment variables.
    ///
    /// The environment is read once, here; nothing downstream looks at it again.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(Error::MissingEnv(key));
        let credentials = StaticCredentials::new(
            required(ENV_ACCESS_KEY_ID)?,
            required(ENV_SECRET_ACCESS_KEY)?,
            lookup(ENV_SESSION_TOKEN),
        );
        let region = lookup(ENV_REGION)
            .or_else(|| lookup(ENV_DEFAULT_REGION))
            .ok_or(Error::MissingEnv(ENV_REGION))?;
        let config = Self::new(region, credentials);
        config.validate()?;
        Ok(config)
    }

    fn load_config_from_reader<R: Read>(reader: R) -> Result<Self> {
        serde_json::from_reader::<R, DirectoryConfig>(reader).map_err(Error::InvalidConfig)
    }

    pub fn load_config(config_path: &Path) -> Result<Self> {
        let config_file = File::open(config_path)
            .map_err(|err| Error::ConfigNotFound(config_path.to_path_buf(), err))?;
        DirectoryConfig::load_config_from_reader(config_file)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentPolling {
    pub interval: Duration,
    pub max_polls: usize,
}

impl Default for AssignmentPolling {
    fn default() -> Self {
        Self {
            interval: DEFAULT_ASSIGNMENT_POLL_INTERVAL,
            max_polls: DEFAULT_ASSIGNMENT_MAX_POLLS,
        }
    }
}
