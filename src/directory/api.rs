use crate::error::Result;
use crate::types::{
    Account, Assignment, AssignmentStatus, Group, NewPermissionSet, PermissionSet,
    PermissionSetChanges, SsoInstance, User,
};

use super::paginator::Page;

/// Remote calls the directory facade is built on.
///
/// Every method maps onto exactly one AWS API request; list methods return a
/// single page for the given cursor.
#[allow(async_fn_in_trait)]
pub trait DirectoryApi {
    async fn list_instances(&self) -> Result<Vec<SsoInstance>>;

    async fn list_groups(&self, identity_store_id: &str, token: Option<String>)
        -> Result<Page<Group>>;
    async fn list_users(&self, identity_store_id: &str, token: Option<String>) -> Result<Page<User>>;
    /// User ids of the group's members.
    async fn list_group_members(
        &self,
        identity_store_id: &str,
        group_id: &str,
        token: Option<String>,
    ) -> Result<Page<String>>;
    /// Group ids the user belongs to.
    async fn list_user_groups(
        &self,
        identity_store_id: &str,
        user_id: &str,
        token: Option<String>,
    ) -> Result<Page<String>>;

    async fn list_accounts(&self, token: Option<String>) -> Result<Page<Account>>;

    /// Permission set ARNs of the instance.
    async fn list_permission_sets(
        &self,
        instance_arn: &str,
        token: Option<String>,
    ) -> Result<Page<String>>;
    async fn describe_permission_set(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
    ) -> Result<PermissionSet>;
    async fn create_permission_set(
        &self,
        instance_arn: &str,
        request: &NewPermissionSet,
    ) -> Result<PermissionSet>;
    async fn update_permission_set(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
        changes: &PermissionSetChanges,
    ) -> Result<()>;
    async fn put_inline_policy(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
        policy: &str,
    ) -> Result<()>;
    async fn get_inline_policy(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
    ) -> Result<Option<String>>;
    /// Account ids the permission set is provisioned to.
    async fn list_provisioned_accounts(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
        token: Option<String>,
    ) -> Result<Page<String>>;

    async fn create_account_assignment(
        &self,
        instance_arn: &str,
        assignment: &Assignment,
    ) -> Result<AssignmentStatus>;
    async fn delete_account_assignment(
        &self,
        instance_arn: &str,
        assignment: &Assignment,
    ) -> Result<AssignmentStatus>;
    /// Re-reads the status of a previously accepted creation or deletion.
    async fn describe_assignment_status(
        &self,
        instance_arn: &str,
        status: &AssignmentStatus,
    ) -> Result<AssignmentStatus>;
}
