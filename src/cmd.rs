use aws_sso_directory::role::validate_account_id;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// CLI tool for administering an AWS IAM Identity Center directory
#[derive(Parser)]
#[command(about, version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    /// `RUST_LOG` takes precedence when set.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

const ARG_SHORT_ACCOUNT: char = 'a';
const ARG_SHORT_ROLE: char = 'r';
const ARG_SHORT_ROLE_ARN: char = 'A';
const ARG_SHORT_CONFIG_DIR: char = 'C';
const ARG_SHORT_PERMISSION_SET: char = 'p';

/// Output format for command results
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum OutputFormat {
    /// JSON formatted output
    Json,
    /// Plain text formatted output
    Text,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}

#[derive(Args, Clone)]
#[group(required = true, multiple = true)]
pub struct RoleInput {
    /// AWS Account ID holding the administration role.
    #[arg(short = ARG_SHORT_ACCOUNT, long, requires="role", conflicts_with="role_arn", value_parser=validate_account_id)]
    pub account: Option<String>,

    /// Name of the IAM role to assume in that account.
    #[arg(short = ARG_SHORT_ROLE, long, requires="account", conflicts_with="role_arn")]
    pub role: Option<String>,

    /// Full ARN of the IAM role to assume.
    #[arg(short = ARG_SHORT_ROLE_ARN, long, conflicts_with="account", conflicts_with="role")]
    pub role_arn: Option<String>,
}

/// Arguments every directory command needs to open a session
#[derive(Args)]
pub struct CommonArgs {
    #[command(flatten)]
    pub role_input: RoleInput,

    /// Optional config directory holding `config.json`.
    /// If not provided, `$HOME/.aws-sso-directory` is used; when no config file
    /// exists the standard AWS environment variables are read instead.
    #[arg(short = ARG_SHORT_CONFIG_DIR, long, env = "AWS_SSO_DIRECTORY_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct FormatCommonArgs {
    /// Format for the output list
    #[arg(short = 'F', long, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
    /// Flag to omit headers in the output
    #[arg(short = 'H', long, default_value_t = false)]
    pub no_headers: bool,
    /// Fields to omit from the output
    #[arg(short = 'O', long, value_delimiter = ',')]
    pub omit_fields: Vec<String>,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct PrincipalInput {
    /// Name of the group to assign
    #[arg(short = 'g', long)]
    pub group: Option<String>,
    /// User name of the user to assign
    #[arg(short = 'u', long)]
    pub user: Option<String>,
}

#[derive(Args)]
pub struct AssignmentArgs {
    #[command(flatten)]
    pub principal: PrincipalInput,

    /// Target AWS Account ID
    #[arg(short = 't', long, value_parser=validate_account_id)]
    pub target_account: String,

    /// Name of the permission set to assign
    #[arg(short = ARG_SHORT_PERMISSION_SET, long)]
    pub permission_set: String,

    /// Poll the assignment status until it settles
    #[arg(short = 'w', long, default_value_t = false)]
    pub wait: bool,

    /// Optional formatting arguments for the output
    #[clap(flatten)]
    pub formatting: FormatCommonArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the groups of the identity store.
    Groups {
        #[clap(flatten)]
        common: CommonArgs,
        #[clap(flatten)]
        formatting: FormatCommonArgs,
    },

    /// List the users of the identity store.
    Users {
        #[clap(flatten)]
        common: CommonArgs,
        #[clap(flatten)]
        formatting: FormatCommonArgs,
    },

    /// List the accounts of the organization.
    Accounts {
        #[clap(flatten)]
        common: CommonArgs,
        #[clap(flatten)]
        formatting: FormatCommonArgs,
    },

    /// List the permission sets of the Identity Center instance.
    PermissionSets {
        #[clap(flatten)]
        common: CommonArgs,
        #[clap(flatten)]
        formatting: FormatCommonArgs,
    },

    /// Create a permission set, optionally with an inline policy.
    CreatePermissionSet {
        #[clap(flatten)]
        common: CommonArgs,
        /// Name of the new permission set
        name: String,
        #[arg(short = 'd', long)]
        description: Option<String>,
        /// ISO-8601 session duration, e.g. `PT4H`
        #[arg(short = 's', long)]
        session_duration: Option<String>,
        #[arg(long)]
        relay_state: Option<String>,
        /// JSON file holding the inline policy document
        #[arg(short = 'P', long)]
        policy_file: Option<PathBuf>,
    },

    /// Replace the inline policy of a permission set.
    AttachPolicy {
        #[clap(flatten)]
        common: CommonArgs,
        /// Name of the permission set
        #[arg(short = ARG_SHORT_PERMISSION_SET, long)]
        permission_set: String,
        /// JSON file holding the policy document
        #[arg(short = 'P', long)]
        policy_file: PathBuf,
    },

    /// Change the description, session duration or relay state of a permission set.
    UpdatePermissionSet {
        #[clap(flatten)]
        common: CommonArgs,
        /// Name of the permission set
        #[arg(short = ARG_SHORT_PERMISSION_SET, long)]
        permission_set: String,
        #[arg(short = 'd', long)]
        description: Option<String>,
        #[arg(short = 's', long)]
        session_duration: Option<String>,
        #[arg(long)]
        relay_state: Option<String>,
    },

    /// Grant a user or group a permission set on an account.
    Associate {
        #[clap(flatten)]
        common: CommonArgs,
        #[clap(flatten)]
        assignment: AssignmentArgs,
    },

    /// Revoke a permission set from a user or group on an account.
    Disassociate {
        #[clap(flatten)]
        common: CommonArgs,
        #[clap(flatten)]
        assignment: AssignmentArgs,
    },
}

impl Commands {
    pub fn get_common_args(&self) -> &CommonArgs {
        match self {
            Commands::Groups { common, .. }
            | Commands::Users { common, .. }
            | Commands::Accounts { common, .. }
            | Commands::PermissionSets { common, .. }
            | Commands::CreatePermissionSet { common, .. }
            | Commands::AttachPolicy { common, .. }
            | Commands::UpdatePermissionSet { common, .. }
            | Commands::Associate { common, .. }
            | Commands::Disassociate { common, .. } => common,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_role_input_variants() {
        let cli = Cli::try_parse_from([
            "aws-sso-directory",
            "groups",
            "--account",
            "123456789012",
            "--role",
            "SSOAdmin",
        ])
        .unwrap();
        let RoleInput { account, role, .. } = cli.command.get_common_args().role_input.clone();
        assert_eq!(account.as_deref(), Some("123456789012"));
        assert_eq!(role.as_deref(), Some("SSOAdmin"));

        assert!(Cli::try_parse_from([
            "aws-sso-directory",
            "groups",
            "--role-arn",
            "arn:aws:iam::123456789012:role/SSOAdmin",
            "--account",
            "123456789012",
        ])
        .is_err());
        assert!(Cli::try_parse_from(["aws-sso-directory", "groups"]).is_err());
        assert!(
            Cli::try_parse_from(["aws-sso-directory", "groups", "--account", "1234", "--role", "x"])
                .is_err()
        );
    }

    #[test]
    fn test_associate_requires_single_principal() {
        let base = [
            "aws-sso-directory",
            "associate",
            "--role-arn",
            "arn:aws:iam::123456789012:role/SSOAdmin",
            "--target-account",
            "210987654321",
            "--permission-set",
            "ReadOnly",
        ];
        let with_group: Vec<&str> = base.iter().copied().chain(["--group", "Engineering", "-w"]).collect();
        let cli = Cli::try_parse_from(with_group).unwrap();
        match cli.command {
            Commands::Associate { assignment, .. } => {
                assert_eq!(assignment.principal.group.as_deref(), Some("Engineering"));
                assert!(assignment.wait);
            }
            _ => panic!("expected associate"),
        }

        let both: Vec<&str> = base
            .iter()
            .copied()
            .chain(["--group", "Engineering", "--user", "alice"])
            .collect();
        assert!(Cli::try_parse_from(both).is_err());
        assert!(Cli::try_parse_from(base).is_err());
    }
}
