pub mod api;
pub mod aws;
#[cfg(test)]
pub(crate) mod memory;
pub mod paginator;
mod session;

use tracing::{info, warn};

use crate::config::{AssignmentPolling, DirectoryConfig};
use crate::error::{Error, Result};
use crate::role::RoleReference;
use crate::types::{
    Account, Assignment, AssignmentOperation, AssignmentState, AssignmentStatus, Group,
    NewPermissionSet, PermissionSet, PermissionSetChanges, PolicyDocument, Principal, SsoInstance,
    User,
};

pub use api::DirectoryApi;
pub use aws::AwsDirectoryApi;
pub use paginator::{Page, PageSource, PageState, Paginator};

/// Facade over the Identity Center directory of one assumed-role session.
///
/// Nothing read through it is cached: every accessor goes back to the
/// service. The instance ARN and identity store id are fixed at construction.
pub struct SsoDirectory<A: DirectoryApi = AwsDirectoryApi> {
    api: A,
    instance: SsoInstance,
    polling: AssignmentPolling,
}

impl SsoDirectory<AwsDirectoryApi> {
    /// Assumes `role` with the credentials in `config` and binds the
    /// resulting session to an Identity Center instance.
    pub async fn connect(role: &RoleReference, config: &DirectoryConfig) -> Result<Self> {
        let sdk_config = session::assume_role(role, config).await?;
        let api = AwsDirectoryApi::new(&sdk_config);
        let directory = match configured_instance(config) {
            Some(instance) => Self::new(api, instance),
            None => Self::discover(api).await?,
        };
        Ok(directory.with_polling(config.polling()))
    }
}

impl<A: DirectoryApi> SsoDirectory<A> {
    pub fn new(api: A, instance: SsoInstance) -> Self {
        Self {
            api,
            instance,
            polling: AssignmentPolling::default(),
        }
    }

    /// Binds to the first instance ListInstances reports.
    pub async fn discover(api: A) -> Result<Self> {
        let instance = api
            .list_instances()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound {
                operation: "ListInstances",
                message: "no Identity Center instance is visible to this session".to_string(),
            })?;
        info!(
            instance_arn = %instance.instance_arn,
            identity_store_id = %instance.identity_store_id,
            "Discovered Identity Center instance"
        );
        Ok(Self::new(api, instance))
    }

    pub fn with_polling(mut self, polling: AssignmentPolling) -> Self {
        self.polling = polling;
        self
    }

    pub fn instance(&self) -> &SsoInstance {
        &self.instance
    }

    pub fn identity_store_id(&self) -> &str {
        &self.instance.identity_store_id
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn groups(&self) -> Paginator<impl PageSource<Item = Group> + '_> {
        let api = &self.api;
        let store = self.instance.identity_store_id.as_str();
        Paginator::new("ListGroups", move |token: Option<String>| {
            api.list_groups(store, token)
        })
    }

    pub fn users(&self) -> Paginator<impl PageSource<Item = User> + '_> {
        let api = &self.api;
        let store = self.instance.identity_store_id.as_str();
        Paginator::new("ListUsers", move |token: Option<String>| {
            api.list_users(store, token)
        })
    }

    /// Accounts of the organization; the session role needs
    /// `organizations:ListAccounts` on top of the Identity Center permissions.
    pub fn accounts(&self) -> Paginator<impl PageSource<Item = Account> + '_> {
        let api = &self.api;
        Paginator::new("ListAccounts", move |token: Option<String>| {
            api.list_accounts(token)
        })
    }

    pub fn permission_sets(&self) -> Paginator<impl PageSource<Item = PermissionSet> + '_> {
        let api = &self.api;
        let instance = self.instance.instance_arn.as_str();
        Paginator::new("ListPermissionSets", move |token: Option<String>| async move {
            let page = api.list_permission_sets(instance, token).await?;
            let mut permission_sets = Vec::with_capacity(page.items.len());
            for arn in &page.items {
                permission_sets.push(api.describe_permission_set(instance, arn).await?);
            }
            Ok::<_, Error>(Page::new(permission_sets, page.next_token))
        })
    }

    /// User ids of `group`'s members.
    pub fn group_members<'a>(
        &'a self,
        group: &'a Group,
    ) -> Paginator<impl PageSource<Item = String> + 'a> {
        let api = &self.api;
        let store = self.instance.identity_store_id.as_str();
        let group_id = group.id.as_str();
        Paginator::new("ListGroupMemberships", move |token: Option<String>| {
            api.list_group_members(store, group_id, token)
        })
    }

    /// Group ids `user` belongs to.
    pub fn user_groups<'a>(&'a self, user: &'a User) -> Paginator<impl PageSource<Item = String> + 'a> {
        let api = &self.api;
        let store = self.instance.identity_store_id.as_str();
        let user_id = user.id.as_str();
        Paginator::new("ListGroupMembershipsForMember", move |token: Option<String>| {
            api.list_user_groups(store, user_id, token)
        })
    }

    /// Account ids `permission_set` is provisioned to.
    pub fn provisioned_accounts<'a>(
        &'a self,
        permission_set: &'a PermissionSet,
    ) -> Paginator<impl PageSource<Item = String> + 'a> {
        let api = &self.api;
        let instance = self.instance.instance_arn.as_str();
        let arn = permission_set.arn.as_str();
        Paginator::new(
            "ListAccountsForProvisionedPermissionSet",
            move |token: Option<String>| api.list_provisioned_accounts(instance, arn, token),
        )
    }

    pub async fn find_group_by_name(&self, name: &str) -> Result<Option<Group>> {
        self.groups().find(|group| group.name == name).await
    }

    pub async fn find_group_by_id(&self, id: &str) -> Result<Option<Group>> {
        self.groups().find(|group| group.id == id).await
    }

    pub async fn find_user_by_name(&self, user_name: &str) -> Result<Option<User>> {
        self.users().find(|user| user.user_name == user_name).await
    }

    pub async fn find_user_by_id(&self, id: &str) -> Result<Option<User>> {
        self.users().find(|user| user.id == id).await
    }

    pub async fn find_account_by_name(&self, name: &str) -> Result<Option<Account>> {
        self.accounts().find(|account| account.name == name).await
    }

    pub async fn find_account_by_id(&self, id: &str) -> Result<Option<Account>> {
        self.accounts().find(|account| account.id == id).await
    }

    pub async fn find_permission_set_by_name(&self, name: &str) -> Result<Option<PermissionSet>> {
        self.permission_sets()
            .find(|permission_set| permission_set.name == name)
            .await
    }

    /// Creates a permission set and, when the request carries one, attaches
    /// its inline policy. Neither step is retried.
    pub async fn create_permission_set(&self, request: &NewPermissionSet) -> Result<PermissionSet> {
        info!(name = %request.name, "Creating permission set");
        let permission_set = self
            .api
            .create_permission_set(&self.instance.instance_arn, request)
            .await?;
        if let Some(policy) = &request.inline_policy {
            self.attach_custom_policy(&permission_set, policy).await?;
        }
        Ok(permission_set)
    }

    /// Replaces the inline policy of `permission_set`.
    pub async fn attach_custom_policy(
        &self,
        permission_set: &PermissionSet,
        policy: &PolicyDocument,
    ) -> Result<()> {
        self.api
            .put_inline_policy(
                &self.instance.instance_arn,
                &permission_set.arn,
                &policy.to_json(),
            )
            .await
    }

    pub async fn permission_policy(
        &self,
        permission_set: &PermissionSet,
    ) -> Result<Option<PolicyDocument>> {
        const OP: &str = "GetInlinePolicyForPermissionSet";
        self.api
            .get_inline_policy(&self.instance.instance_arn, &permission_set.arn)
            .await?
            .map(|raw| {
                PolicyDocument::parse(&raw).map_err(|err| Error::malformed(OP, err.to_string()))
            })
            .transpose()
    }

    /// Sends the set fields of `changes` in one request and returns
    /// `permission_set` with them applied.
    pub async fn update_permission_set(
        &self,
        permission_set: &PermissionSet,
        changes: &PermissionSetChanges,
    ) -> Result<PermissionSet> {
        info!(arn = %permission_set.arn, "Updating permission set");
        self.api
            .update_permission_set(&self.instance.instance_arn, &permission_set.arn, changes)
            .await?;
        Ok(changes.apply_to(permission_set))
    }

    /// Requests the assignment; the returned status is usually still in
    /// progress. See [`Self::wait_for_assignment`].
    pub async fn associate(
        &self,
        principal: &Principal,
        account_id: &str,
        permission_set: &PermissionSet,
    ) -> Result<AssignmentStatus> {
        let assignment = assignment(principal, account_id, permission_set);
        info!(
            principal = principal.id(),
            account_id,
            permission_set = %permission_set.name,
            "Requesting account assignment"
        );
        self.api
            .create_account_assignment(&self.instance.instance_arn, &assignment)
            .await
    }

    pub async fn disassociate(
        &self,
        principal: &Principal,
        account_id: &str,
        permission_set: &PermissionSet,
    ) -> Result<AssignmentStatus> {
        let assignment = assignment(principal, account_id, permission_set);
        info!(
            principal = principal.id(),
            account_id,
            permission_set = %permission_set.name,
            "Requesting account assignment removal"
        );
        self.api
            .delete_account_assignment(&self.instance.instance_arn, &assignment)
            .await
    }

    pub async fn assignment_status(&self, status: &AssignmentStatus) -> Result<AssignmentStatus> {
        self.api
            .describe_assignment_status(&self.instance.instance_arn, status)
            .await
    }

    /// Polls an accepted assignment change until it settles or the configured
    /// number of polls is used up, in which case the last in-progress status
    /// is returned.
    pub async fn wait_for_assignment(&self, status: &AssignmentStatus) -> Result<AssignmentStatus> {
        let mut current = status.clone();
        let mut polls = 0;
        loop {
            match current.state {
                AssignmentState::Succeeded => break Ok(current),
                AssignmentState::Failed => {
                    warn!(request_id = %current.request_id, reason = ?current.failure_reason, "Account assignment failed");
                    break Err(Error::RemoteService {
                        operation: match current.operation {
                            AssignmentOperation::Create => "CreateAccountAssignment",
                            AssignmentOperation::Delete => "DeleteAccountAssignment",
                        },
                        message: current
                            .failure_reason
                            .unwrap_or_else(|| "assignment failed".to_string()),
                    });
                }
                AssignmentState::InProgress if polls >= self.polling.max_polls => break Ok(current),
                AssignmentState::InProgress => {
                    tokio::time::sleep(self.polling.interval).await;
                    current = self.assignment_status(&current).await?;
                    polls += 1;
                }
            }
        }
    }
}

/// The instance pinned in `config`; both fields must be set for it to count.
fn configured_instance(config: &DirectoryConfig) -> Option<SsoInstance> {
    match (&config.instance_arn, &config.identity_store_id) {
        (Some(instance_arn), Some(identity_store_id)) => Some(SsoInstance {
            instance_arn: instance_arn.clone(),
            identity_store_id: identity_store_id.clone(),
            name: None,
        }),
        (None, None) => None,
        (instance_arn, identity_store_id) => {
            warn!(
                ?instance_arn,
                ?identity_store_id,
                "Only one of instanceArn and identityStoreId is configured, discovering the instance instead"
            );
            None
        }
    }
}

fn assignment(principal: &Principal, account_id: &str, permission_set: &PermissionSet) -> Assignment {
    Assignment {
        principal: principal.clone(),
        account_id: account_id.to_string(),
        permission_set_arn: permission_set.arn.clone(),
    }
}
