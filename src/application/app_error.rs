use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// No usable value for a provider setting in any configuration source.
    /// `remediation` tells the operator what to do about it.
    #[error("Missing configuration `{setting}`: {remediation}")]
    ConfigurationMissing { setting: String, remediation: String },

    #[error("Invalid credential format for `{setting}`: expected {expected}")]
    InvalidCredentialFormat { setting: String, expected: String },

    /// The provider rejected our credentials (HTTP 401/403). Not retryable,
    /// needs an operator to rotate or fix the key.
    #[error("Payment provider rejected the configured credentials")]
    AuthenticationFailure,

    /// Network failure or provider 5xx. Safe for the caller to retry.
    #[error("Payment provider is unavailable, try again shortly")]
    ServiceUnavailable,

    /// Business-level rejection from the provider, surfaced verbatim.
    #[error("Payment provider rejected the request: {0}")]
    ProviderRejected(String),

    #[error("Plan not found")]
    PlanNotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    /// Uniqueness violation from the store. Internal signal for the
    /// conflict-then-reread pattern in payment creation; callers resolve it
    /// by re-querying, it is never returned to the end user.
    #[error("A record with this value already exists")]
    Conflict,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the caller may safely retry the same request (typically by
    /// polling again). Only transient provider/network failures qualify.
    pub fn retryable(&self) -> bool {
        matches!(self, AppError::ServiceUnavailable)
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ErrorCode {
    ConfigurationMissing,
    InvalidCredentialFormat,
    AuthenticationFailure,
    ServiceUnavailable,
    ProviderRejected,
    PlanNotFound,
    Forbidden,
    NotFound,
    Conflict,
    InvalidInput,
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigurationMissing => "CONFIGURATION_MISSING",
            ErrorCode::InvalidCredentialFormat => "INVALID_CREDENTIAL_FORMAT",
            ErrorCode::AuthenticationFailure => "AUTHENTICATION_FAILURE",
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorCode::ProviderRejected => "PROVIDER_REJECTED",
            ErrorCode::PlanNotFound => "PLAN_NOT_FOUND",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
