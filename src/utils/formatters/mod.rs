pub mod json;
pub mod text;

use aws_sso_directory::types::{Account, AssignmentStatus, Group, PermissionSet, User};

/// A column of a listing: `key` is used by the JSON output, `title` by text.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub key: &'static str,
    pub title: &'static str,
}

const fn column(key: &'static str, title: &'static str) -> Column {
    Column { key, title }
}

pub trait TableRow {
    const COLUMNS: &'static [Column];

    /// One cell per entry of `COLUMNS`, in the same order.
    fn cells(&self) -> Vec<String>;
}

pub trait TabularFormatter {
    type Error: std::error::Error + 'static;

    fn format<R: TableRow>(&self, rows: &[R]) -> Result<String, Self::Error>;
}

/// Indices of the columns that survive `--omit-fields`. Omitted fields may be
/// given either by JSON key or by text title, case-insensitively.
fn visible_columns(columns: &[Column], omit_fields: &[&str]) -> Vec<usize> {
    columns
        .iter()
        .enumerate()
        .filter(|(_, column)| {
            !omit_fields.iter().any(|omit| {
                omit.eq_ignore_ascii_case(column.key) || omit.eq_ignore_ascii_case(column.title)
            })
        })
        .map(|(i, _)| i)
        .collect()
}

fn optional(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

impl TableRow for Group {
    const COLUMNS: &'static [Column] = &[
        column("groupId", "Group Id"),
        column("name", "Name"),
        column("description", "Description"),
    ];

    fn cells(&self) -> Vec<String> {
        vec![self.id.clone(), self.name.clone(), optional(&self.description)]
    }
}

impl TableRow for User {
    const COLUMNS: &'static [Column] = &[
        column("userId", "User Id"),
        column("userName", "User Name"),
        column("displayName", "Display Name"),
        column("emails", "Emails"),
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.user_name.clone(),
            optional(&self.display_name),
            self.emails.join(","),
        ]
    }
}

impl TableRow for Account {
    const COLUMNS: &'static [Column] = &[
        column("accountId", "Account Id"),
        column("accountName", "Account Name"),
        column("accountEmail", "Account Email"),
        column("status", "Status"),
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            optional(&self.email),
            optional(&self.status),
        ]
    }
}

impl TableRow for PermissionSet {
    const COLUMNS: &'static [Column] = &[
        column("name", "Name"),
        column("permissionSetArn", "Permission Set Arn"),
        column("sessionDuration", "Session Duration"),
        column("description", "Description"),
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.arn.clone(),
            optional(&self.session_duration),
            optional(&self.description),
        ]
    }
}

impl TableRow for AssignmentStatus {
    const COLUMNS: &'static [Column] = &[
        column("requestId", "Request Id"),
        column("status", "Status"),
        column("principalId", "Principal Id"),
        column("accountId", "Account Id"),
        column("failureReason", "Failure Reason"),
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.request_id.clone(),
            self.state.to_string(),
            self.assignment.principal.id().to_string(),
            self.assignment.account_id.clone(),
            optional(&self.failure_reason),
        ]
    }
}
