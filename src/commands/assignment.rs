use aws_sso_directory::types::{AssignmentOperation, Principal};
use aws_sso_directory::{DirectoryApi, SsoDirectory};

use super::{permission_set, print_rows, Error};
use crate::cmd::{AssignmentArgs, PrincipalInput};

async fn resolve_principal<A: DirectoryApi>(
    directory: &SsoDirectory<A>,
    input: &PrincipalInput,
) -> Result<Principal, Error> {
    match input {
        PrincipalInput {
            group: Some(name),
            user: None,
        } => directory
            .find_group_by_name(name)
            .await?
            .map(|group| Principal::from(&group))
            .ok_or_else(|| Error::NotFound {
                kind: "group",
                name: name.clone(),
            }),
        PrincipalInput {
            group: None,
            user: Some(name),
        } => directory
            .find_user_by_name(name)
            .await?
            .map(|user| Principal::from(&user))
            .ok_or_else(|| Error::NotFound {
                kind: "user",
                name: name.clone(),
            }),
        _ => unreachable!("Clap should prevent code from reaching this branch"),
    }
}

pub async fn exec_assignment<A: DirectoryApi>(
    directory: &SsoDirectory<A>,
    args: AssignmentArgs,
    operation: AssignmentOperation,
) -> Result<(), Error> {
    let principal = resolve_principal(directory, &args.principal).await?;
    let permission_set = permission_set::lookup(directory, &args.permission_set).await?;

    let status = match operation {
        AssignmentOperation::Create => {
            directory
                .associate(&principal, &args.target_account, &permission_set)
                .await?
        }
        AssignmentOperation::Delete => {
            directory
                .disassociate(&principal, &args.target_account, &permission_set)
                .await?
        }
    };
    let status = if args.wait {
        directory.wait_for_assignment(&status).await?
    } else {
        status
    };

    print_rows(&[status], &args.formatting)
}
