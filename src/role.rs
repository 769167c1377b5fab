use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;

const ROLE_NAME_PATTERN: &str = r"(?:[\w+=,.@-]+/)*[\w+=,.@-]+";

#[derive(Debug)]
pub enum Error {
    InvalidAccountId(String),
    EmptyRoleName,
    InvalidRoleName(String),
    InvalidArn(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidAccountId(reason) => write!(f, "Invalid AWS account id: {reason}"),
            Error::EmptyRoleName => write!(f, "Role name must not be empty"),
            Error::InvalidRoleName(name) => write!(f, "Not a valid IAM role name: {name}"),
            Error::InvalidArn(arn) => write!(f, "Not an IAM role ARN: {arn}"),
        }
    }
}

impl std::error::Error for Error {}

pub fn validate_account_id(s: &str) -> Result<String, String> {
    if s.len() != 12 {
        return Err(format!(
            "AWS Account ID must be exactly 12 digits, got {}",
            s.len()
        ));
    }
    if !s.chars().all(|c| c.is_ascii_digit()) {
        return Err("AWS Account ID must contain only digits".to_string());
    }
    Ok(s.to_string())
}

fn role_arn_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"^arn:(?P<partition>aws[a-zA-Z-]*):iam::(?P<account>\d{{12}}):role/(?P<role>{ROLE_NAME_PATTERN})$"
        ))
        .expect("Const pattern should be valid")
    })
}

fn role_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!("^{ROLE_NAME_PATTERN}$")).expect("Const pattern should be valid")
    })
}

/// The role the directory session is established with.
///
/// Renders as `arn:<partition>:iam::<account>:role/<role>`; the role name may
/// carry an IAM path (`team/SSOAdmin`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleReference {
    partition: String,
    account_id: String,
    role_name: String,
}

impl RoleReference {
    pub fn new(account_id: &str, role_name: &str) -> Result<Self, Error> {
        let account_id = validate_account_id(account_id).map_err(Error::InvalidAccountId)?;
        let role_name = role_name.trim_matches('/');
        if role_name.is_empty() {
            return Err(Error::EmptyRoleName);
        }
        if !role_name_regex().is_match(role_name) {
            return Err(Error::InvalidRoleName(role_name.to_string()));
        }
        Ok(Self {
            partition: "aws".to_string(),
            account_id,
            role_name: role_name.to_string(),
        })
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn role_name(&self) -> &str {
        &self.role_name
    }

    pub fn arn(&self) -> String {
        format!(
            "arn:{}:iam::{}:role/{}",
            self.partition, self.account_id, self.role_name
        )
    }
}

impl FromStr for RoleReference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = role_arn_regex()
            .captures(s.trim())
            .ok_or_else(|| Error::InvalidArn(s.to_string()))?;
        Ok(Self {
            partition: captures["partition"].to_string(),
            account_id: captures["account"].to_string(),
            role_name: captures["role"].to_string(),
        })
    }
}

impl std::fmt::Display for RoleReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.arn())
    }
}
