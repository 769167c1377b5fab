use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub user_name: String,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub emails: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub arn: Option<String>,
    pub email: Option<String>,
    pub status: Option<String>,
    pub joined_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSet {
    pub arn: String,
    pub name: String,
    pub description: Option<String>,
    /// ISO-8601 duration, e.g. `PT2H`.
    pub session_duration: Option<String>,
    pub relay_state: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// An IAM policy document. Only checked to be a JSON object; the policy
/// language itself is validated remotely.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PolicyDocument(serde_json::Value);

impl PolicyDocument {
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if value.is_object() {
            Ok(Self(value))
        } else {
            Err(Error::Validation {
                operation: "PolicyDocument",
                message: "policy document must be a JSON object".to_string(),
            })
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let value = serde_json::from_str(raw).map_err(|err| Error::Validation {
            operation: "PolicyDocument",
            message: err.to_string(),
        })?;
        Self::from_value(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn to_json(&self) -> String {
        self.0.to_string()
    }
}

impl std::str::FromStr for PolicyDocument {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// The identity side of an account assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "UPPERCASE")]
pub enum Principal {
    User(String),
    Group(String),
}

impl Principal {
    pub fn id(&self) -> &str {
        match self {
            Principal::User(id) | Principal::Group(id) => id,
        }
    }

    pub fn principal_type(&self) -> &'static str {
        match self {
            Principal::User(_) => "USER",
            Principal::Group(_) => "GROUP",
        }
    }
}

impl From<&User> for Principal {
    fn from(value: &User) -> Self {
        Principal::User(value.id.clone())
    }
}

impl From<&Group> for Principal {
    fn from(value: &Group) -> Self {
        Principal::Group(value.id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub principal: Principal,
    pub account_id: String,
    pub permission_set_arn: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignmentOperation {
    Create,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignmentState {
    InProgress,
    Succeeded,
    Failed,
}

impl AssignmentState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AssignmentState::InProgress)
    }
}

impl std::fmt::Display for AssignmentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignmentState::InProgress => write!(f, "IN_PROGRESS"),
            AssignmentState::Succeeded => write!(f, "SUCCEEDED"),
            AssignmentState::Failed => write!(f, "FAILED"),
        }
    }
}

/// Acceptance record of an asynchronous assignment change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentStatus {
    pub operation: AssignmentOperation,
    pub request_id: String,
    pub state: AssignmentState,
    pub failure_reason: Option<String>,
    pub assignment: Assignment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SsoInstance {
    pub instance_arn: String,
    pub identity_store_id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPermissionSet {
    pub name: String,
    pub description: Option<String>,
    pub session_duration: Option<String>,
    pub relay_state: Option<String>,
    pub inline_policy: Option<PolicyDocument>,
}

impl NewPermissionSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            session_duration: None,
            relay_state: None,
            inline_policy: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn session_duration(mut self, session_duration: impl Into<String>) -> Self {
        self.session_duration = Some(session_duration.into());
        self
    }

    pub fn relay_state(mut self, relay_state: impl Into<String>) -> Self {
        self.relay_state = Some(relay_state.into());
        self
    }

    pub fn inline_policy(mut self, policy: PolicyDocument) -> Self {
        self.inline_policy = Some(policy);
        self
    }
}

/// Mutable permission set fields; unset fields are left untouched remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSetChanges {
    pub description: Option<String>,
    pub session_duration: Option<String>,
    pub relay_state: Option<String>,
}

impl PermissionSetChanges {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.session_duration.is_none() && self.relay_state.is_none()
    }

    pub fn apply_to(&self, permission_set: &PermissionSet) -> PermissionSet {
        let mut updated = permission_set.clone();
        if let Some(description) = &self.description {
            updated.description = Some(description.clone());
        }
        if let Some(session_duration) = &self.session_duration {
            updated.session_duration = Some(session_duration.clone());
        }
        if let Some(relay_state) = &self.relay_state {
            updated.relay_state = Some(relay_state.clone());
        }
        updated
    }
}
