use aws_config::SdkConfig;
use aws_sdk_identitystore::types::MemberId;
use aws_sdk_identitystore::Client as IdentityStoreClient;
use aws_sdk_organizations::Client as OrganizationsClient;
use aws_sdk_ssoadmin::primitives::DateTime as SmithyDateTime;
use aws_sdk_ssoadmin::types::{AccountAssignmentOperationStatus, PrincipalType, TargetType};
use aws_sdk_ssoadmin::Client as SsoAdminClient;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{sdk_err, Error, Result};
use crate::types::{
    Account, Assignment, AssignmentOperation, AssignmentState, AssignmentStatus, Group,
    NewPermissionSet, PermissionSet, PermissionSetChanges, SsoInstance, User,
};

use super::api::DirectoryApi;
use super::paginator::Page;

const IDENTITY_STORE_PAGE_SIZE: i32 = 100;
const TARGET_TYPE_ACCOUNT: &str = "AWS_ACCOUNT";

/// A response field the service contract marks as present.
trait RequiredField {
    fn required(self, operation: &'static str, field: &'static str) -> Result<String>;
}

impl RequiredField for &str {
    fn required(self, _operation: &'static str, _field: &'static str) -> Result<String> {
        Ok(self.to_string())
    }
}

impl RequiredField for Option<&str> {
    fn required(self, operation: &'static str, field: &'static str) -> Result<String> {
        self.map(ToString::to_string)
            .ok_or_else(|| Error::malformed(operation, format!("missing {field}")))
    }
}

fn to_utc(value: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(ToString::to_string)
}

fn assignment_state(status: &AccountAssignmentOperationStatus) -> AssignmentState {
    match status.status().map(|s| s.as_str()) {
        Some("SUCCEEDED") => AssignmentState::Succeeded,
        Some("FAILED") => AssignmentState::Failed,
        _ => AssignmentState::InProgress,
    }
}

fn assignment_status(
    operation: &'static str,
    kind: AssignmentOperation,
    assignment: &Assignment,
    status: Option<&AccountAssignmentOperationStatus>,
) -> Result<AssignmentStatus> {
    let status = status.ok_or_else(|| Error::malformed(operation, "missing assignment status"))?;
    Ok(AssignmentStatus {
        operation: kind,
        request_id: status.request_id().required(operation, "RequestId")?,
        state: assignment_state(status),
        failure_reason: owned(status.failure_reason()),
        assignment: assignment.clone(),
    })
}

/// `DirectoryApi` backed by the AWS SDK clients of one assumed-role session.
#[derive(Debug, Clone)]
pub struct AwsDirectoryApi {
    sso_admin: SsoAdminClient,
    identity_store: IdentityStoreClient,
    organizations: OrganizationsClient,
}

impl AwsDirectoryApi {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            sso_admin: SsoAdminClient::new(sdk_config),
            identity_store: IdentityStoreClient::new(sdk_config),
            organizations: OrganizationsClient::new(sdk_config),
        }
    }
}

impl DirectoryApi for AwsDirectoryApi {
    async fn list_instances(&self) -> Result<Vec<SsoInstance>> {
        const OP: &str = "ListInstances";
        debug!("Trying to list identity center instances");
        let output = self.sso_admin.list_instances().send().await.map_err(sdk_err(OP))?;
        output
            .instances()
            .iter()
            .map(|instance| {
                Ok(SsoInstance {
                    instance_arn: instance.instance_arn().required(OP, "InstanceArn")?,
                    identity_store_id: instance
                        .identity_store_id()
                        .required(OP, "IdentityStoreId")?,
                    name: owned(instance.name()),
                })
            })
            .collect()
    }

    async fn list_groups(
        &self,
        identity_store_id: &str,
        token: Option<String>,
    ) -> Result<Page<Group>> {
        const OP: &str = "ListGroups";
        debug!(identity_store_id, "Trying to list groups");
        let output = self
            .identity_store
            .list_groups()
            .identity_store_id(identity_store_id)
            .max_results(IDENTITY_STORE_PAGE_SIZE)
            .set_next_token(token)
            .send()
            .await
            .map_err(sdk_err(OP))?;
        let groups = output
            .groups()
            .iter()
            .map(|group| {
                Ok(Group {
                    id: group.group_id().required(OP, "GroupId")?,
                    name: group.display_name().unwrap_or_default().to_string(),
                    description: owned(group.description()),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(groups, owned(output.next_token())))
    }

    async fn list_users(&self, identity_store_id: &str, token: Option<String>) -> Result<Page<User>> {
        const OP: &str = "ListUsers";
        debug!(identity_store_id, "Trying to list users");
        let output = self
            .identity_store
            .list_users()
            .identity_store_id(identity_store_id)
            .max_results(IDENTITY_STORE_PAGE_SIZE)
            .set_next_token(token)
            .send()
            .await
            .map_err(sdk_err(OP))?;
        let users = output
            .users()
            .iter()
            .map(|user| {
                Ok(User {
                    id: user.user_id().required(OP, "UserId")?,
                    user_name: user.user_name().unwrap_or_default().to_string(),
                    display_name: owned(user.display_name()),
                    first_name: owned(user.name().and_then(|name| name.given_name())),
                    last_name: owned(user.name().and_then(|name| name.family_name())),
                    emails: user
                        .emails()
                        .iter()
                        .filter_map(|email| owned(email.value()))
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(users, owned(output.next_token())))
    }

    async fn list_group_members(
        &self,
        identity_store_id: &str,
        group_id: &str,
        token: Option<String>,
    ) -> Result<Page<String>> {
        const OP: &str = "ListGroupMemberships";
        debug!(identity_store_id, group_id, "Trying to list group members");
        let output = self
            .identity_store
            .list_group_memberships()
            .identity_store_id(identity_store_id)
            .group_id(group_id)
            .max_results(IDENTITY_STORE_PAGE_SIZE)
            .set_next_token(token)
            .send()
            .await
            .map_err(sdk_err(OP))?;
        let members = output
            .group_memberships()
            .iter()
            .filter_map(|membership| membership.member_id())
            .filter_map(|member| member.as_user_id().ok().cloned())
            .collect();
        Ok(Page::new(members, owned(output.next_token())))
    }

    async fn list_user_groups(
        &self,
        identity_store_id: &str,
        user_id: &str,
        token: Option<String>,
    ) -> Result<Page<String>> {
        const OP: &str = "ListGroupMembershipsForMember";
        debug!(identity_store_id, user_id, "Trying to list groups for user");
        let output = self
            .identity_store
            .list_group_memberships_for_member()
            .identity_store_id(identity_store_id)
            .member_id(MemberId::UserId(user_id.to_string()))
            .max_results(IDENTITY_STORE_PAGE_SIZE)
            .set_next_token(token)
            .send()
            .await
            .map_err(sdk_err(OP))?;
        let groups = output
            .group_memberships()
            .iter()
            .filter_map(|membership| owned(membership.group_id()))
            .collect();
        Ok(Page::new(groups, owned(output.next_token())))
    }

    async fn list_accounts(&self, token: Option<String>) -> Result<Page<Account>> {
        const OP: &str = "ListAccounts";
        debug!("Trying to list organization accounts");
        let output = self
            .organizations
            .list_accounts()
            .set_next_token(token)
            .send()
            .await
            .map_err(sdk_err(OP))?;
        let accounts = output
            .accounts()
            .iter()
            .map(|account| {
                Ok(Account {
                    id: account.id().required(OP, "Id")?,
                    name: account.name().unwrap_or_default().to_string(),
                    arn: owned(account.arn()),
                    email: owned(account.email()),
                    status: account.status().map(|status| status.as_str().to_string()),
                    joined_at: account.joined_timestamp().and_then(to_utc),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(accounts, owned(output.next_token())))
    }

    async fn list_permission_sets(
        &self,
        instance_arn: &str,
        token: Option<String>,
    ) -> Result<Page<String>> {
        const OP: &str = "ListPermissionSets";
        debug!(instance_arn, "Trying to list permission sets");
        let output = self
            .sso_admin
            .list_permission_sets()
            .instance_arn(instance_arn)
            .set_next_token(token)
            .send()
            .await
            .map_err(sdk_err(OP))?;
        Ok(Page::new(
            output.permission_sets().to_vec(),
            owned(output.next_token()),
        ))
    }

    async fn describe_permission_set(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
    ) -> Result<PermissionSet> {
        const OP: &str = "DescribePermissionSet";
        debug!(permission_set_arn, "Trying to describe permission set");
        let output = self
            .sso_admin
            .describe_permission_set()
            .instance_arn(instance_arn)
            .permission_set_arn(permission_set_arn)
            .send()
            .await
            .map_err(sdk_err(OP))?;
        permission_set(OP, output.permission_set())
    }

    async fn create_permission_set(
        &self,
        instance_arn: &str,
        request: &NewPermissionSet,
    ) -> Result<PermissionSet> {
        const OP: &str = "CreatePermissionSet";
        debug!(name = %request.name, "Trying to create permission set");
        let output = self
            .sso_admin
            .create_permission_set()
            .instance_arn(instance_arn)
            .name(&request.name)
            .set_description(request.description.clone())
            .set_session_duration(request.session_duration.clone())
            .set_relay_state(request.relay_state.clone())
            .send()
            .await
            .map_err(sdk_err(OP))?;
        permission_set(OP, output.permission_set())
    }

    async fn update_permission_set(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
        changes: &PermissionSetChanges,
    ) -> Result<()> {
        const OP: &str = "UpdatePermissionSet";
        debug!(permission_set_arn, ?changes, "Trying to update permission set");
        self.sso_admin
            .update_permission_set()
            .instance_arn(instance_arn)
            .permission_set_arn(permission_set_arn)
            .set_description(changes.description.clone())
            .set_session_duration(changes.session_duration.clone())
            .set_relay_state(changes.relay_state.clone())
            .send()
            .await
            .map_err(sdk_err(OP))?;
        Ok(())
    }

    async fn put_inline_policy(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
        policy: &str,
    ) -> Result<()> {
        const OP: &str = "PutInlinePolicyToPermissionSet";
        debug!(permission_set_arn, "Trying to put inline policy");
        self.sso_admin
            .put_inline_policy_to_permission_set()
            .instance_arn(instance_arn)
            .permission_set_arn(permission_set_arn)
            .inline_policy(policy)
            .send()
            .await
            .map_err(sdk_err(OP))?;
        Ok(())
    }

    async fn get_inline_policy(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
    ) -> Result<Option<String>> {
        const OP: &str = "GetInlinePolicyForPermissionSet";
        debug!(permission_set_arn, "Trying to get inline policy");
        let output = self
            .sso_admin
            .get_inline_policy_for_permission_set()
            .instance_arn(instance_arn)
            .permission_set_arn(permission_set_arn)
            .send()
            .await
            .map_err(sdk_err(OP))?;
        Ok(owned(output.inline_policy()).filter(|policy| !policy.is_empty()))
    }

    async fn list_provisioned_accounts(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
        token: Option<String>,
    ) -> Result<Page<String>> {
        const OP: &str = "ListAccountsForProvisionedPermissionSet";
        debug!(permission_set_arn, "Trying to list provisioned accounts");
        let output = self
            .sso_admin
            .list_accounts_for_provisioned_permission_set()
            .instance_arn(instance_arn)
            .permission_set_arn(permission_set_arn)
            .set_next_token(token)
            .send()
            .await
            .map_err(sdk_err(OP))?;
        Ok(Page::new(
            output.account_ids().to_vec(),
            owned(output.next_token()),
        ))
    }

    async fn create_account_assignment(
        &self,
        instance_arn: &str,
        assignment: &Assignment,
    ) -> Result<AssignmentStatus> {
        const OP: &str = "CreateAccountAssignment";
        debug!(?assignment, "Trying to assign principal to account");
        let output = self
            .sso_admin
            .create_account_assignment()
            .instance_arn(instance_arn)
            .target_id(&assignment.account_id)
            .target_type(TargetType::from(TARGET_TYPE_ACCOUNT))
            .permission_set_arn(&assignment.permission_set_arn)
            .principal_type(PrincipalType::from(assignment.principal.principal_type()))
            .principal_id(assignment.principal.id())
            .send()
            .await
            .map_err(sdk_err(OP))?;
        assignment_status(
            OP,
            AssignmentOperation::Create,
            assignment,
            output.account_assignment_creation_status(),
        )
    }

    async fn delete_account_assignment(
        &self,
        instance_arn: &str,
        assignment: &Assignment,
    ) -> Result<AssignmentStatus> {
        const OP: &str = "DeleteAccountAssignment";
        debug!(?assignment, "Trying to remove principal from account");
        let output = self
            .sso_admin
            .delete_account_assignment()
            .instance_arn(instance_arn)
            .target_id(&assignment.account_id)
            .target_type(TargetType::from(TARGET_TYPE_ACCOUNT))
            .permission_set_arn(&assignment.permission_set_arn)
            .principal_type(PrincipalType::from(assignment.principal.principal_type()))
            .principal_id(assignment.principal.id())
            .send()
            .await
            .map_err(sdk_err(OP))?;
        assignment_status(
            OP,
            AssignmentOperation::Delete,
            assignment,
            output.account_assignment_deletion_status(),
        )
    }

    async fn describe_assignment_status(
        &self,
        instance_arn: &str,
        status: &AssignmentStatus,
    ) -> Result<AssignmentStatus> {
        match status.operation {
            AssignmentOperation::Create => {
                const OP: &str = "DescribeAccountAssignmentCreationStatus";
                debug!(request_id = %status.request_id, "Trying to describe assignment creation");
                let output = self
                    .sso_admin
                    .describe_account_assignment_creation_status()
                    .instance_arn(instance_arn)
                    .account_assignment_creation_request_id(&status.request_id)
                    .send()
                    .await
                    .map_err(sdk_err(OP))?;
                assignment_status(
                    OP,
                    AssignmentOperation::Create,
                    &status.assignment,
                    output.account_assignment_creation_status(),
                )
            }
            AssignmentOperation::Delete => {
                const OP: &str = "DescribeAccountAssignmentDeletionStatus";
                debug!(request_id = %status.request_id, "Trying to describe assignment deletion");
                let output = self
                    .sso_admin
                    .describe_account_assignment_deletion_status()
                    .instance_arn(instance_arn)
                    .account_assignment_deletion_request_id(&status.request_id)
                    .send()
                    .await
                    .map_err(sdk_err(OP))?;
                assignment_status(
                    OP,
                    AssignmentOperation::Delete,
                    &status.assignment,
                    output.account_assignment_deletion_status(),
                )
            }
        }
    }
}

fn permission_set(
    operation: &'static str,
    permission_set: Option<&aws_sdk_ssoadmin::types::PermissionSet>,
) -> Result<PermissionSet> {
    let permission_set =
        permission_set.ok_or_else(|| Error::malformed(operation, "missing PermissionSet"))?;
    Ok(PermissionSet {
        arn: permission_set
            .permission_set_arn()
            .required(operation, "PermissionSetArn")?,
        name: permission_set.name().unwrap_or_default().to_string(),
        description: owned(permission_set.description()),
        session_duration: owned(permission_set.session_duration()),
        relay_state: owned(permission_set.relay_state()),
        created_at: permission_set.created_date().and_then(to_utc),
    })
}
