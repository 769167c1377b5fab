mod assignment;
mod list;
mod permission_set;

use std::path::PathBuf;

use aws_sso_directory::types::AssignmentOperation;
use aws_sso_directory::{config, role, DirectoryApi, SsoDirectory};

use crate::cmd::{Commands, CommonArgs, FormatCommonArgs, OutputFormat};
use crate::utils::formatters::{
    json::JsonFormatter, text::TextFormatter, TableRow, TabularFormatter,
};
use crate::utils::{resolve_config_dir, resolve_directory_config, resolve_role};

#[derive(Debug)]
pub enum Error {
    Config(config::Error),
    Role(role::Error),
    Directory(aws_sso_directory::Error),
    PolicyFile(PathBuf, std::io::Error),
    NotFound { kind: &'static str, name: String },
    JsonFormatter(serde_json::Error),
    TextFormatter(std::fmt::Error),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Config(err) => write!(f, "Error loading directory config: {err}"),
            Error::Role(err) => write!(f, "Error resolving role: {err}"),
            Error::Directory(err) => write!(f, "Directory error: {err}"),
            Error::PolicyFile(path, err) => {
                write!(f, "Error reading policy file {}: {err}", path.display())
            }
            Error::NotFound { kind, name } => write!(f, "No {kind} named {name}"),
            Error::JsonFormatter(err) => write!(f, "Error formatting json output: {err}"),
            Error::TextFormatter(err) => write!(f, "Error formatting text output: {err}"),
        }
    }
}

impl From<aws_sso_directory::Error> for Error {
    fn from(value: aws_sso_directory::Error) -> Self {
        Error::Directory(value)
    }
}

async fn connect(common: &CommonArgs) -> Result<SsoDirectory, Error> {
    let config_dir = resolve_config_dir(common.config_dir.as_deref());
    let config = resolve_directory_config(&config_dir).map_err(Error::Config)?;
    let role = resolve_role(&common.role_input).map_err(Error::Role)?;
    Ok(SsoDirectory::connect(&role, &config).await?)
}

fn render_rows<R: TableRow>(rows: &[R], formatting: &FormatCommonArgs) -> Result<String, Error> {
    let omit_fields = formatting.omit_fields.iter().map(|v| v.as_str()).collect();
    match formatting.output {
        OutputFormat::Json => JsonFormatter::new(omit_fields, formatting.no_headers)
            .format(rows)
            .map_err(Error::JsonFormatter),
        OutputFormat::Text => TextFormatter::new(omit_fields, formatting.no_headers, " | ")
            .format(rows)
            .map_err(Error::TextFormatter),
    }
}

fn print_rows<R: TableRow>(rows: &[R], formatting: &FormatCommonArgs) -> Result<(), Error> {
    println!("{}", render_rows(rows, formatting)?);
    Ok(())
}

pub async fn exec(command: Commands) -> Result<(), Error> {
    let directory = connect(command.get_common_args()).await?;
    exec_with(&directory, command).await
}

async fn exec_with<A: DirectoryApi>(
    directory: &SsoDirectory<A>,
    command: Commands,
) -> Result<(), Error> {
    match command {
        Commands::Groups { formatting, .. } => {
            list::exec_list(directory.groups(), &formatting).await
        }
        Commands::Users { formatting, .. } => list::exec_list(directory.users(), &formatting).await,
        Commands::Accounts { formatting, .. } => {
            list::exec_list(directory.accounts(), &formatting).await
        }
        Commands::PermissionSets { formatting, .. } => {
            list::exec_list(directory.permission_sets(), &formatting).await
        }
        Commands::CreatePermissionSet {
            name,
            description,
            session_duration,
            relay_state,
            policy_file,
            ..
        } => {
            permission_set::exec_create(
                directory,
                permission_set::CreateInputs {
                    name,
                    description,
                    session_duration,
                    relay_state,
                    policy_file,
                },
            )
            .await
        }
        Commands::AttachPolicy {
            permission_set,
            policy_file,
            ..
        } => permission_set::exec_attach_policy(directory, &permission_set, &policy_file).await,
        Commands::UpdatePermissionSet {
            permission_set,
            description,
            session_duration,
            relay_state,
            ..
        } => {
            permission_set::exec_update(
                directory,
                &permission_set,
                aws_sso_directory::types::PermissionSetChanges {
                    description,
                    session_duration,
                    relay_state,
                },
            )
            .await
        }
        Commands::Associate { assignment, .. } => {
            assignment::exec_assignment(directory, assignment, AssignmentOperation::Create).await
        }
        Commands::Disassociate { assignment, .. } => {
            assignment::exec_assignment(directory, assignment, AssignmentOperation::Delete).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sso_directory::types::Group;

    fn formatting(output: OutputFormat, omit_fields: &[&str]) -> FormatCommonArgs {
        FormatCommonArgs {
            output,
            no_headers: false,
            omit_fields: omit_fields.iter().map(|v| v.to_string()).collect(),
        }
    }

    #[test]
    fn test_render_rows_json() {
        let rows = [Group {
            id: "g-1".to_string(),
            name: "Engineering".to_string(),
            description: None,
        }];
        let output = render_rows(&rows, &formatting(OutputFormat::Json, &["description"])).unwrap();
        assert_eq!(output, r#"[{"groupId":"g-1","name":"Engineering"}]"#);
    }

    #[test]
    fn test_error_display() {
        let err = Error::NotFound {
            kind: "group",
            name: "Marketing".to_string(),
        };
        assert_eq!(err.to_string(), "No group named Marketing");
        let err = Error::Config(config::Error::MissingEnv("AWS_REGION"));
        assert_eq!(
            err.to_string(),
            "Error loading directory config: Environment variable AWS_REGION is not set"
        );
    }
}
