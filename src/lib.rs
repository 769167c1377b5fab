//! Administration of an AWS IAM Identity Center directory through an
//! assumed role: groups, users, organization accounts, permission sets and
//! account assignments.

pub mod blocking;
pub mod config;
pub mod directory;
mod error;
pub mod role;
pub mod types;

pub use config::{DirectoryConfig, StaticCredentials};
pub use directory::{AwsDirectoryApi, DirectoryApi, Page, PageSource, Paginator, SsoDirectory};
pub use error::{Error, Result};
pub use role::RoleReference;
