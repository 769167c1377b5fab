use std::path::{Path, PathBuf};

use aws_sso_directory::types::{NewPermissionSet, PermissionSet, PermissionSetChanges, PolicyDocument};
use aws_sso_directory::{DirectoryApi, SsoDirectory};

use super::Error;

pub struct CreateInputs {
    pub name: String,
    pub description: Option<String>,
    pub session_duration: Option<String>,
    pub relay_state: Option<String>,
    pub policy_file: Option<PathBuf>,
}

fn read_policy(path: &Path) -> Result<PolicyDocument, Error> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| Error::PolicyFile(path.to_path_buf(), err))?;
    Ok(PolicyDocument::parse(&raw)?)
}

fn print_permission_set(permission_set: &PermissionSet) -> Result<(), Error> {
    let output = serde_json::to_string_pretty(permission_set).map_err(Error::JsonFormatter)?;
    println!("{output}");
    Ok(())
}

pub(super) async fn lookup<A: DirectoryApi>(
    directory: &SsoDirectory<A>,
    name: &str,
) -> Result<PermissionSet, Error> {
    directory
        .find_permission_set_by_name(name)
        .await?
        .ok_or_else(|| Error::NotFound {
            kind: "permission set",
            name: name.to_string(),
        })
}

pub async fn exec_create<A: DirectoryApi>(
    directory: &SsoDirectory<A>,
    inputs: CreateInputs,
) -> Result<(), Error> {
    let mut request = NewPermissionSet::new(inputs.name);
    request.description = inputs.description;
    request.session_duration = inputs.session_duration;
    request.relay_state = inputs.relay_state;
    if let Some(path) = &inputs.policy_file {
        request = request.inline_policy(read_policy(path)?);
    }

    let permission_set = directory.create_permission_set(&request).await?;
    print_permission_set(&permission_set)
}

pub async fn exec_attach_policy<A: DirectoryApi>(
    directory: &SsoDirectory<A>,
    permission_set: &str,
    policy_file: &Path,
) -> Result<(), Error> {
    let policy = read_policy(policy_file)?;
    let permission_set = lookup(directory, permission_set).await?;
    directory
        .attach_custom_policy(&permission_set, &policy)
        .await?;
    println!("Policy attached to {}", permission_set.name);
    Ok(())
}

pub async fn exec_update<A: DirectoryApi>(
    directory: &SsoDirectory<A>,
    permission_set: &str,
    changes: PermissionSetChanges,
) -> Result<(), Error> {
    if changes.is_empty() {
        tracing::warn!(permission_set, "No changes given, sending an empty update");
    }
    let permission_set = lookup(directory, permission_set).await?;
    let updated = directory
        .update_permission_set(&permission_set, &changes)
        .await?;
    print_permission_set(&updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_policy() {
        let dir = std::env::temp_dir().join(format!("aws-sso-directory-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let valid = dir.join("policy.json");
        std::fs::write(&valid, r#"{"Version":"2012-10-17","Statement":[]}"#).unwrap();
        let policy = read_policy(&valid).unwrap();
        assert_eq!(policy.as_value()["Version"], "2012-10-17");

        let not_object = dir.join("array.json");
        std::fs::write(&not_object, "[]").unwrap();
        assert!(matches!(
            read_policy(&not_object),
            Err(Error::Directory(aws_sso_directory::Error::Validation { .. }))
        ));

        assert!(matches!(
            read_policy(&dir.join("missing.json")),
            Err(Error::PolicyFile(..))
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
