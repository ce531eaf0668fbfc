//! Error types for the access control engine and its consumers

/// Errors produced by the engine and the ownable-to-ACL adapter.
///
/// `AccessDenied` and `AccessRoleNotSet` are the only authorization
/// failures; both leave state untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Caller's role mask lacks the bit(s) required for the gated operation
    #[error("access denied")]
    AccessDenied,

    /// Adapter: no access role configured for the requested selector
    #[error("access role not set")]
    AccessRoleNotSet,

    /// Adapter: the relayed call to the target failed (includes sending
    /// value to a non-payable target function)
    #[error("execution failed")]
    ExecutionFailed,

    /// Underlying LMDB failure
    #[error("store error: {0}")]
    Store(String),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Convert a storage-layer error into [`Error::Store`]
#[inline]
pub(crate) fn store_err<E: std::error::Error>(e: E) -> Error {
    Error::Store(e.to_string())
}

/// Errors produced by the token-like consumers.
///
/// Reason strings name the exact missing feature toggle or the failed
/// balance/allowance precondition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("transfers are disabled")]
    TransfersDisabled,

    #[error("transfers on behalf are disabled")]
    TransfersOnBehalfDisabled,

    #[error("burns are disabled")]
    BurnsDisabled,

    #[error("burns on behalf are disabled")]
    BurnsOnBehalfDisabled,

    #[error("transfer amount exceeds balance")]
    BalanceExceeded,

    #[error("transfer amount exceeds allowance")]
    AllowanceExceeded,

    #[error("burn amount exceeds allowance")]
    BurnAllowanceExceeded,

    #[error("token already exists")]
    AlreadyExists,

    #[error("token doesn't exist")]
    NonExistent,

    #[error("transfer from incorrect owner")]
    IncorrectOwner,

    #[error("caller is not owner nor approved")]
    NotApproved,

    #[error("total supply overflow")]
    SupplyOverflow,

    #[error(transparent)]
    Acl(#[from] Error),
}

/// Result type alias for token consumer operations
pub type TokenResult<T> = std::result::Result<T, TokenError>;
