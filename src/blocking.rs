//! Synchronous wrapper around [`crate::SsoDirectory`].
//!
//! Every call blocks the current thread on a private current-thread runtime,
//! so this module must not be used from inside another tokio runtime.

use tokio::runtime::{Builder, Runtime};

use crate::config::DirectoryConfig;
use crate::directory::{self, AwsDirectoryApi, DirectoryApi, PageSource, Paginator};
use crate::error::{Error, Result};
use crate::role::RoleReference;
use crate::types::{
    Account, AssignmentStatus, Group, NewPermissionSet, PermissionSet, PermissionSetChanges,
    PolicyDocument, Principal, SsoInstance, User,
};

fn runtime() -> Result<Runtime> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| Error::RemoteService {
            operation: "Runtime",
            message: format!("failed to start runtime: {err}"),
        })
}

pub struct SsoDirectory<A: DirectoryApi = AwsDirectoryApi> {
    inner: directory::SsoDirectory<A>,
    runtime: Runtime,
}

impl SsoDirectory<AwsDirectoryApi> {
    pub fn connect(role: &RoleReference, config: &DirectoryConfig) -> Result<Self> {
        let runtime = runtime()?;
        let inner = runtime.block_on(directory::SsoDirectory::connect(role, config))?;
        Ok(Self { inner, runtime })
    }
}

impl<A: DirectoryApi> SsoDirectory<A> {
    pub fn from_async(inner: directory::SsoDirectory<A>) -> Result<Self> {
        Ok(Self {
            inner,
            runtime: runtime()?,
        })
    }

    pub fn instance(&self) -> &SsoInstance {
        self.inner.instance()
    }

    pub fn identity_store_id(&self) -> &str {
        self.inner.identity_store_id()
    }

    fn pages<S: PageSource>(&self, paginator: Paginator<S>) -> Pages<'_, S> {
        Pages {
            runtime: &self.runtime,
            paginator,
        }
    }

    pub fn groups(&self) -> Pages<'_, impl PageSource<Item = Group> + '_> {
        self.pages(self.inner.groups())
    }

    pub fn users(&self) -> Pages<'_, impl PageSource<Item = User> + '_> {
        self.pages(self.inner.users())
    }

    pub fn accounts(&self) -> Pages<'_, impl PageSource<Item = Account> + '_> {
        self.pages(self.inner.accounts())
    }

    pub fn permission_sets(&self) -> Pages<'_, impl PageSource<Item = PermissionSet> + '_> {
        self.pages(self.inner.permission_sets())
    }

    pub fn group_members<'a>(&'a self, group: &'a Group) -> Pages<'a, impl PageSource<Item = String> + 'a> {
        self.pages(self.inner.group_members(group))
    }

    pub fn user_groups<'a>(&'a self, user: &'a User) -> Pages<'a, impl PageSource<Item = String> + 'a> {
        self.pages(self.inner.user_groups(user))
    }

    pub fn provisioned_accounts<'a>(
        &'a self,
        permission_set: &'a PermissionSet,
    ) -> Pages<'a, impl PageSource<Item = String> + 'a> {
        self.pages(self.inner.provisioned_accounts(permission_set))
    }

    pub fn find_group_by_name(&self, name: &str) -> Result<Option<Group>> {
        self.runtime.block_on(self.inner.find_group_by_name(name))
    }

    pub fn find_user_by_name(&self, user_name: &str) -> Result<Option<User>> {
        self.runtime.block_on(self.inner.find_user_by_name(user_name))
    }

    pub fn find_account_by_id(&self, id: &str) -> Result<Option<Account>> {
        self.runtime.block_on(self.inner.find_account_by_id(id))
    }

    pub fn find_permission_set_by_name(&self, name: &str) -> Result<Option<PermissionSet>> {
        self.runtime
            .block_on(self.inner.find_permission_set_by_name(name))
    }

    pub fn create_permission_set(&self, request: &NewPermissionSet) -> Result<PermissionSet> {
        self.runtime.block_on(self.inner.create_permission_set(request))
    }

    pub fn attach_custom_policy(
        &self,
        permission_set: &PermissionSet,
        policy: &PolicyDocument,
    ) -> Result<()> {
        self.runtime
            .block_on(self.inner.attach_custom_policy(permission_set, policy))
    }

    pub fn permission_policy(&self, permission_set: &PermissionSet) -> Result<Option<PolicyDocument>> {
        self.runtime.block_on(self.inner.permission_policy(permission_set))
    }

    pub fn update_permission_set(
        &self,
        permission_set: &PermissionSet,
        changes: &PermissionSetChanges,
    ) -> Result<PermissionSet> {
        self.runtime
            .block_on(self.inner.update_permission_set(permission_set, changes))
    }

    pub fn associate(
        &self,
        principal: &Principal,
        account_id: &str,
        permission_set: &PermissionSet,
    ) -> Result<AssignmentStatus> {
        self.runtime
            .block_on(self.inner.associate(principal, account_id, permission_set))
    }

    pub fn disassociate(
        &self,
        principal: &Principal,
        account_id: &str,
        permission_set: &PermissionSet,
    ) -> Result<AssignmentStatus> {
        self.runtime
            .block_on(self.inner.disassociate(principal, account_id, permission_set))
    }

    pub fn wait_for_assignment(&self, status: &AssignmentStatus) -> Result<AssignmentStatus> {
        self.runtime.block_on(self.inner.wait_for_assignment(status))
    }
}

/// Blocking iterator over a paginated listing. Pages are fetched on demand.
pub struct Pages<'r, S: PageSource> {
    runtime: &'r Runtime,
    paginator: Paginator<S>,
}

impl<S: PageSource> Pages<'_, S> {
    pub fn restart(&mut self) {
        self.paginator.restart();
    }

    pub fn try_collect(&mut self) -> Result<Vec<S::Item>> {
        self.runtime.block_on(self.paginator.try_collect())
    }
}

impl<S: PageSource> Iterator for Pages<'_, S> {
    type Item = Result<S::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        self.runtime.block_on(self.paginator.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssignmentPolling;
    use crate::directory::memory::MemoryDirectory;
    use std::time::Duration;

    fn blocking_directory(api: MemoryDirectory) -> SsoDirectory<MemoryDirectory> {
        let inner = directory::SsoDirectory::new(api, MemoryDirectory::instance()).with_polling(
            AssignmentPolling {
                interval: Duration::from_millis(1),
                max_polls: 2,
            },
        );
        SsoDirectory::from_async(inner).unwrap()
    }

    #[test]
    fn test_iterates_groups_across_pages() {
        let sso = blocking_directory(
            MemoryDirectory::new()
                .with_page_size(1)
                .with_group("g-1", "Engineering")
                .with_group("g-2", "Finance"),
        );
        let names: Vec<String> = sso
            .groups()
            .map(|group| group.map(|g| g.name))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(names, vec!["Engineering", "Finance"]);
        assert!(sso.find_group_by_name("Marketing").unwrap().is_none());
    }

    #[test]
    fn test_restart_replays_listing() {
        let sso = blocking_directory(MemoryDirectory::new().with_user("u-1", "alice"));
        let mut users = sso.users();
        assert_eq!(users.try_collect().unwrap().len(), 1);
        assert!(users.next().is_none());
        users.restart();
        assert_eq!(users.next().unwrap().unwrap().user_name, "alice");
    }

    #[test]
    fn test_create_and_associate() {
        let sso = blocking_directory(MemoryDirectory::new().with_account("123456789012", "prod"));
        let permission_set = sso
            .create_permission_set(&NewPermissionSet::new("ReadOnly"))
            .unwrap();
        assert!(matches!(
            sso.create_permission_set(&NewPermissionSet::new("ReadOnly")),
            Err(Error::Conflict { .. })
        ));
        let principal = Principal::User("u-1".to_string());
        let status = sso
            .associate(&principal, "123456789012", &permission_set)
            .unwrap();
        let settled = sso.wait_for_assignment(&status).unwrap();
        assert!(settled.state.is_terminal());
        sso.disassociate(&principal, "123456789012", &permission_set)
            .unwrap();
    }
}
