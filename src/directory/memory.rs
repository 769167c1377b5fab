use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};
use crate::types::{
    Account, Assignment, AssignmentOperation, AssignmentState, AssignmentStatus, Group,
    NewPermissionSet, PermissionSet, PermissionSetChanges, SsoInstance, User,
};

use super::api::DirectoryApi;
use super::paginator::Page;

const INSTANCE_ARN: &str = "arn:aws:sso:::instance/ssoins-test";
const IDENTITY_STORE_ID: &str = "d-test";

#[derive(Default)]
struct State {
    permission_sets: BTreeMap<String, PermissionSet>,
    policies: HashMap<String, String>,
    assignments: Vec<Assignment>,
    // request id -> describe calls seen so far
    requests: HashMap<String, usize>,
    next_id: usize,
}

/// Directory kept entirely in memory, paging with numeric cursors.
pub(crate) struct MemoryDirectory {
    instances: Vec<SsoInstance>,
    groups: Vec<Group>,
    users: Vec<User>,
    memberships: Vec<(String, String)>,
    accounts: Vec<Account>,
    page_size: usize,
    settle_after: usize,
    failing: Option<(&'static str, usize)>,
    state: RefCell<State>,
    calls: RefCell<HashMap<&'static str, usize>>,
}

impl MemoryDirectory {
    pub(crate) fn new() -> Self {
        Self {
            instances: vec![Self::instance()],
            groups: Vec::new(),
            users: Vec::new(),
            memberships: Vec::new(),
            accounts: Vec::new(),
            page_size: 100,
            settle_after: 1,
            failing: None,
            state: RefCell::new(State::default()),
            calls: RefCell::new(HashMap::new()),
        }
    }

    pub(crate) fn instance() -> SsoInstance {
        SsoInstance {
            instance_arn: INSTANCE_ARN.to_string(),
            identity_store_id: IDENTITY_STORE_ID.to_string(),
            name: Some("test".to_string()),
        }
    }

    pub(crate) fn without_instances(mut self) -> Self {
        self.instances.clear();
        self
    }

    pub(crate) fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub(crate) fn with_group(mut self, id: &str, name: &str) -> Self {
        self.groups.push(Group {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
        });
        self
    }

    pub(crate) fn with_user(mut self, id: &str, user_name: &str) -> Self {
        self.users.push(User {
            id: id.to_string(),
            user_name: user_name.to_string(),
            display_name: None,
            first_name: None,
            last_name: None,
            emails: Vec::new(),
        });
        self
    }

    pub(crate) fn with_membership(mut self, group_id: &str, user_id: &str) -> Self {
        self.memberships
            .push((group_id.to_string(), user_id.to_string()));
        self
    }

    pub(crate) fn with_account(mut self, id: &str, name: &str) -> Self {
        self.accounts.push(Account {
            id: id.to_string(),
            name: name.to_string(),
            arn: None,
            email: None,
            status: Some("ACTIVE".to_string()),
            joined_at: None,
        });
        self
    }

    /// Assignment requests report success from the n-th status read on.
    pub(crate) fn settling_after(mut self, describes: usize) -> Self {
        self.settle_after = describes;
        self
    }

    /// Fails the `nth` call (1-based) of `operation`.
    pub(crate) fn failing_on(mut self, operation: &'static str, nth: usize) -> Self {
        self.failing = Some((operation, nth));
        self
    }

    pub(crate) fn calls(&self, operation: &str) -> usize {
        self.calls.borrow().get(operation).copied().unwrap_or(0)
    }

    fn call(&self, operation: &'static str) -> Result<()> {
        let mut calls = self.calls.borrow_mut();
        let count = calls.entry(operation).or_insert(0);
        *count += 1;
        match self.failing {
            Some((failing, nth)) if failing == operation && nth == *count => Err(Error::classify(
                operation,
                Some("InternalServerException"),
                "injected failure".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn page<T: Clone>(
        &self,
        operation: &'static str,
        items: &[T],
        token: Option<String>,
    ) -> Result<Page<T>> {
        let start = match token {
            Some(token) => token.parse::<usize>().map_err(|_| {
                Error::classify(
                    operation,
                    Some("ValidationException"),
                    format!("invalid next token {token}"),
                )
            })?,
            None => 0,
        }
        .min(items.len());
        let end = (start + self.page_size).min(items.len());
        let next_token = (end < items.len()).then(|| end.to_string());
        Ok(Page::new(items[start..end].to_vec(), next_token))
    }

    fn check_instance(&self, operation: &'static str, instance_arn: &str) -> Result<()> {
        if self.instances.iter().any(|i| i.instance_arn == instance_arn) {
            Ok(())
        } else {
            Err(Error::classify(
                operation,
                Some("ResourceNotFoundException"),
                format!("instance {instance_arn} not found"),
            ))
        }
    }

    fn missing_permission_set(operation: &'static str, arn: &str) -> Error {
        Error::classify(
            operation,
            Some("ResourceNotFoundException"),
            format!("permission set {arn} not found"),
        )
    }

    fn accept(
        &self,
        operation: &'static str,
        kind: AssignmentOperation,
        assignment: &Assignment,
    ) -> Result<AssignmentStatus> {
        let mut state = self.state.borrow_mut();
        if !state
            .permission_sets
            .contains_key(&assignment.permission_set_arn)
        {
            return Err(Error::classify(
                operation,
                Some("ValidationException"),
                format!(
                    "permission set {} is not part of the instance",
                    assignment.permission_set_arn
                ),
            ));
        }
        if !self.accounts.iter().any(|a| a.id == assignment.account_id) {
            return Err(Error::classify(
                operation,
                Some("ValidationException"),
                format!("account {} is not part of the organization", assignment.account_id),
            ));
        }
        match kind {
            AssignmentOperation::Create => {
                if !state.assignments.contains(assignment) {
                    state.assignments.push(assignment.clone());
                }
            }
            AssignmentOperation::Delete => state.assignments.retain(|a| a != assignment),
        }
        state.next_id += 1;
        let request_id = format!("req-{}", state.next_id);
        state.requests.insert(request_id.clone(), 0);
        Ok(AssignmentStatus {
            operation: kind,
            request_id,
            state: AssignmentState::InProgress,
            failure_reason: None,
            assignment: assignment.clone(),
        })
    }
}

impl DirectoryApi for MemoryDirectory {
    async fn list_instances(&self) -> Result<Vec<SsoInstance>> {
        self.call("ListInstances")?;
        Ok(self.instances.clone())
    }

    async fn list_groups(&self, _identity_store_id: &str, token: Option<String>) -> Result<Page<Group>> {
        self.call("ListGroups")?;
        self.page("ListGroups", &self.groups, token)
    }

    async fn list_users(&self, _identity_store_id: &str, token: Option<String>) -> Result<Page<User>> {
        self.call("ListUsers")?;
        self.page("ListUsers", &self.users, token)
    }

    async fn list_group_members(
        &self,
        _identity_store_id: &str,
        group_id: &str,
        token: Option<String>,
    ) -> Result<Page<String>> {
        self.call("ListGroupMemberships")?;
        let members: Vec<String> = self
            .memberships
            .iter()
            .filter(|(group, _)| group == group_id)
            .map(|(_, user)| user.clone())
            .collect();
        self.page("ListGroupMemberships", &members, token)
    }

    async fn list_user_groups(
        &self,
        _identity_store_id: &str,
        user_id: &str,
        token: Option<String>,
    ) -> Result<Page<String>> {
        self.call("ListGroupMembershipsForMember")?;
        let groups: Vec<String> = self
            .memberships
            .iter()
            .filter(|(_, user)| user == user_id)
            .map(|(group, _)| group.clone())
            .collect();
        self.page("ListGroupMembershipsForMember", &groups, token)
    }

    async fn list_accounts(&self, token: Option<String>) -> Result<Page<Account>> {
        self.call("ListAccounts")?;
        self.page("ListAccounts", &self.accounts, token)
    }

    async fn list_permission_sets(
        &self,
        instance_arn: &str,
        token: Option<String>,
    ) -> Result<Page<String>> {
        self.call("ListPermissionSets")?;
        self.check_instance("ListPermissionSets", instance_arn)?;
        let arns: Vec<String> = self.state.borrow().permission_sets.keys().cloned().collect();
        self.page("ListPermissionSets", &arns, token)
    }

    async fn describe_permission_set(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
    ) -> Result<PermissionSet> {
        const OP: &str = "DescribePermissionSet";
        self.call(OP)?;
        self.check_instance(OP, instance_arn)?;
        self.state
            .borrow()
            .permission_sets
            .get(permission_set_arn)
            .cloned()
            .ok_or_else(|| Self::missing_permission_set(OP, permission_set_arn))
    }

    async fn create_permission_set(
        &self,
        instance_arn: &str,
        request: &NewPermissionSet,
    ) -> Result<PermissionSet> {
        const OP: &str = "CreatePermissionSet";
        self.call(OP)?;
        self.check_instance(OP, instance_arn)?;
        let mut state = self.state.borrow_mut();
        if state
            .permission_sets
            .values()
            .any(|ps| ps.name == request.name)
        {
            return Err(Error::classify(
                OP,
                Some("ConflictException"),
                format!("permission set {} already exists", request.name),
            ));
        }
        state.next_id += 1;
        let permission_set = PermissionSet {
            arn: format!("{INSTANCE_ARN}/ps-{:04}", state.next_id),
            name: request.name.clone(),
            description: request.description.clone(),
            session_duration: request.session_duration.clone(),
            relay_state: request.relay_state.clone(),
            created_at: None,
        };
        state
            .permission_sets
            .insert(permission_set.arn.clone(), permission_set.clone());
        Ok(permission_set)
    }

    async fn update_permission_set(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
        changes: &PermissionSetChanges,
    ) -> Result<()> {
        const OP: &str = "UpdatePermissionSet";
        self.call(OP)?;
        self.check_instance(OP, instance_arn)?;
        let mut state = self.state.borrow_mut();
        let stored = state
            .permission_sets
            .get_mut(permission_set_arn)
            .ok_or_else(|| Self::missing_permission_set(OP, permission_set_arn))?;
        *stored = changes.apply_to(stored);
        Ok(())
    }

    async fn put_inline_policy(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
        policy: &str,
    ) -> Result<()> {
        const OP: &str = "PutInlinePolicyToPermissionSet";
        self.call(OP)?;
        self.check_instance(OP, instance_arn)?;
        let mut state = self.state.borrow_mut();
        if !state.permission_sets.contains_key(permission_set_arn) {
            return Err(Self::missing_permission_set(OP, permission_set_arn));
        }
        let parsed: serde_json::Value = serde_json::from_str(policy)
            .map_err(|err| Error::classify(OP, Some("ValidationException"), err.to_string()))?;
        if parsed.get("Statement").is_none() {
            return Err(Error::classify(
                OP,
                Some("ValidationException"),
                "policy has no Statement".to_string(),
            ));
        }
        state
            .policies
            .insert(permission_set_arn.to_string(), policy.to_string());
        Ok(())
    }

    async fn get_inline_policy(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
    ) -> Result<Option<String>> {
        const OP: &str = "GetInlinePolicyForPermissionSet";
        self.call(OP)?;
        self.check_instance(OP, instance_arn)?;
        let state = self.state.borrow();
        if !state.permission_sets.contains_key(permission_set_arn) {
            return Err(Self::missing_permission_set(OP, permission_set_arn));
        }
        Ok(state.policies.get(permission_set_arn).cloned())
    }

    async fn list_provisioned_accounts(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
        token: Option<String>,
    ) -> Result<Page<String>> {
        const OP: &str = "ListAccountsForProvisionedPermissionSet";
        self.call(OP)?;
        self.check_instance(OP, instance_arn)?;
        let mut accounts: Vec<String> = Vec::new();
        for assignment in &self.state.borrow().assignments {
            if assignment.permission_set_arn == permission_set_arn
                && !accounts.contains(&assignment.account_id)
            {
                accounts.push(assignment.account_id.clone());
            }
        }
        self.page(OP, &accounts, token)
    }

    async fn create_account_assignment(
        &self,
        instance_arn: &str,
        assignment: &Assignment,
    ) -> Result<AssignmentStatus> {
        const OP: &str = "CreateAccountAssignment";
        self.call(OP)?;
        self.check_instance(OP, instance_arn)?;
        self.accept(OP, AssignmentOperation::Create, assignment)
    }

    async fn delete_account_assignment(
        &self,
        instance_arn: &str,
        assignment: &Assignment,
    ) -> Result<AssignmentStatus> {
        const OP: &str = "DeleteAccountAssignment";
        self.call(OP)?;
        self.check_instance(OP, instance_arn)?;
        self.accept(OP, AssignmentOperation::Delete, assignment)
    }

    async fn describe_assignment_status(
        &self,
        instance_arn: &str,
        status: &AssignmentStatus,
    ) -> Result<AssignmentStatus> {
        const OP: &str = "DescribeAssignmentStatus";
        self.call(OP)?;
        self.check_instance(OP, instance_arn)?;
        let mut state = self.state.borrow_mut();
        let seen = state.requests.get_mut(&status.request_id).ok_or_else(|| {
            Error::classify(
                OP,
                Some("ResourceNotFoundException"),
                format!("request {} not found", status.request_id),
            )
        })?;
        *seen += 1;
        let mut current = status.clone();
        current.state = if *seen >= self.settle_after {
            AssignmentState::Succeeded
        } else {
            AssignmentState::InProgress
        };
        Ok(current)
    }
}
