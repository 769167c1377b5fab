use aws_sdk_ssoadmin::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_runtime_api::http::Response;

const CONFLICT_CODES: &[&str] = &["ConflictException"];
const VALIDATION_CODES: &[&str] = &[
    "ValidationException",
    "InvalidInputException",
    "MalformedPolicyDocumentException",
    "MalformedPolicyDocument",
];
const NOT_FOUND_CODES: &[&str] = &[
    "ResourceNotFoundException",
    "AccountNotFoundException",
    "NoSuchEntity",
];

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("{operation} rejected the request: {message}")]
    Validation {
        operation: &'static str,
        message: String,
    },
    #[error("{operation} could not find the referenced entity: {message}")]
    NotFound {
        operation: &'static str,
        message: String,
    },
    #[error("{operation} conflicts with existing state: {message}")]
    Conflict {
        operation: &'static str,
        message: String,
    },
    #[error("{operation} failed: {message}")]
    RemoteService {
        operation: &'static str,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Maps an AWS error code onto the closest taxonomy kind.
    pub(crate) fn classify(operation: &'static str, code: Option<&str>, message: String) -> Self {
        match code {
            Some(code) if CONFLICT_CODES.contains(&code) => Error::Conflict { operation, message },
            Some(code) if VALIDATION_CODES.contains(&code) => {
                Error::Validation { operation, message }
            }
            Some(code) if NOT_FOUND_CODES.contains(&code) => {
                Error::NotFound { operation, message }
            }
            _ => Error::RemoteService { operation, message },
        }
    }

    pub(crate) fn malformed(operation: &'static str, message: impl Into<String>) -> Self {
        Error::RemoteService {
            operation,
            message: format!("malformed response: {}", message.into()),
        }
    }

    pub(crate) fn from_sdk<E>(operation: &'static str, err: SdkError<E, Response>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
    {
        let code = err.code().map(ToString::to_string);
        Error::classify(
            operation,
            code.as_deref(),
            DisplayErrorContext(&err).to_string(),
        )
    }

    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Error::Authentication(_) => None,
            Error::Validation { operation, .. }
            | Error::NotFound { operation, .. }
            | Error::Conflict { operation, .. }
            | Error::RemoteService { operation, .. } => Some(*operation),
        }
    }
}

/// Shorthand for `.map_err(sdk_err("Operation"))` at call sites.
pub(crate) fn sdk_err<E>(operation: &'static str) -> impl FnOnce(SdkError<E, Response>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    move |err| Error::from_sdk(operation, err)
}
