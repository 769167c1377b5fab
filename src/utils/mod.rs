pub mod formatters;

use crate::cmd::RoleInput;
use aws_sso_directory::config::{self, DirectoryConfig};
use aws_sso_directory::role::{self, RoleReference};
use std::env;
use std::path::{Path, PathBuf};

const CONFIG_DIR_NAME: &str = ".aws-sso-directory";
const CONFIG_FILE_NAME: &str = "config.json";

pub fn resolve_config_dir(config_dir: Option<&Path>) -> PathBuf {
    config_dir.map_or_else(
        || {
            let home_dir = home::home_dir().unwrap_or_else(env::temp_dir);
            home_dir.join(CONFIG_DIR_NAME)
        },
        PathBuf::from,
    )
}

/// Reads `config.json` from the config directory, falling back to the
/// standard AWS environment variables when the file does not exist.
pub fn resolve_directory_config(config_dir: &Path) -> Result<DirectoryConfig, config::Error> {
    let config_file = config_dir.join(CONFIG_FILE_NAME);
    if config_file.exists() {
        tracing::debug!(path = %config_file.display(), "Loading directory config");
        DirectoryConfig::load_config(&config_file)
    } else {
        tracing::debug!(path = %config_file.display(), "No config file, reading environment");
        DirectoryConfig::from_env()
    }
}

pub fn resolve_role(input: &RoleInput) -> Result<RoleReference, role::Error> {
    match input {
        RoleInput {
            role_arn: Some(arn),
            ..
        } => arn.parse(),
        RoleInput {
            account: Some(account),
            role: Some(role),
            role_arn: None,
        } => RoleReference::new(account, role),
        _ => unreachable!("Clap should prevent code from reaching this branch"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_config_dir() {
        let explicit = resolve_config_dir(Some(Path::new("/tmp/sso")));
        assert_eq!(explicit, PathBuf::from("/tmp/sso"));
        assert!(resolve_config_dir(None).ends_with(CONFIG_DIR_NAME));
    }

    #[test]
    fn test_resolve_role() {
        let from_arn = resolve_role(&RoleInput {
            account: None,
            role: None,
            role_arn: Some("arn:aws:iam::123456789012:role/admins/SSOAdmin".to_string()),
        })
        .unwrap();
        assert_eq!(from_arn.role_name(), "admins/SSOAdmin");

        let from_parts = resolve_role(&RoleInput {
            account: Some("123456789012".to_string()),
            role: Some("SSOAdmin".to_string()),
            role_arn: None,
        })
        .unwrap();
        assert_eq!(from_parts.arn(), "arn:aws:iam::123456789012:role/SSOAdmin");

        assert!(resolve_role(&RoleInput {
            account: None,
            role: None,
            role_arn: Some("arn:aws:iam::123:role/x".to_string()),
        })
        .is_err());
    }
}
