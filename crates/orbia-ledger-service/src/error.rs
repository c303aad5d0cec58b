//! Service error types.
//!
//! Business rejections carry a stable [`ServiceError::reason_code`]; every
//! other failure is reported to callers as an opaque `internal_error` and its
//! details go to the log.

use orbia_ledger_core::{AccountId, IdError, LedgerError, OrderStatus};
use orbia_ledger_store::StoreError;

/// Result type for ledger workflows.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Workflow error type.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The wallet cannot cover the requested debit.
    #[error("insufficient funds: balance={balance_cents}, required={required_cents}")]
    InsufficientFunds {
        /// Wallet owner.
        account_id: AccountId,
        /// Current balance in cents.
        balance_cents: i64,
        /// Required amount in cents.
        required_cents: i64,
    },

    /// Order is not in a state that allows the requested transition.
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current state.
        from: OrderStatus,
        /// Requested state.
        to: OrderStatus,
    },

    /// Resource not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of resource.
        entity: &'static str,
        /// Its identifier.
        id: String,
    },

    /// Bad request - invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The requester may not see this resource.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The ID generator saw the clock move backwards. The node is unhealthy.
    #[error("id generator unavailable: {0}")]
    ClockRegression(#[source] IdError),

    /// A step inside a multi-step unit failed; the unit was rolled back.
    #[error("{step} failed: {source}")]
    AtomicUnit {
        /// The failing step.
        step: &'static str,
        /// What went wrong.
        #[source]
        source: Box<ServiceError>,
    },

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage failure.
    #[error("storage error: {0}")]
    Store(#[source] StoreError),

    /// Internal invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable machine-readable code for callers.
    #[must_use]
    pub const fn reason_code(&self) -> &'static str {
        match self {
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::InvalidStateTransition { .. } => "invalid_state_transition",
            Self::NotFound { .. } => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::PermissionDenied(_) => "permission_denied",
            Self::ClockRegression(_)
            | Self::AtomicUnit { .. }
            | Self::Config(_)
            | Self::Store(_)
            | Self::Internal(_) => "internal_error",
        }
    }

    /// Whether this is a business rejection rather than a failure.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        self.reason_code() != "internal_error"
    }

    /// Message safe to show to callers.
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.is_rejection() {
            self.to_string()
        } else {
            "An internal error occurred".to_string()
        }
    }

    /// Attribute a failure to a step of a multi-step unit.
    ///
    /// Business rejections pass through unchanged so callers can still match
    /// on them; everything else is wrapped in [`ServiceError::AtomicUnit`].
    #[must_use]
    pub fn in_step(step: &'static str, err: impl Into<Self>) -> Self {
        let err = err.into();
        if err.is_rejection() {
            return err;
        }

        tracing::error!(step, error = %err, "Atomic unit failed, rolling back");
        Self::AtomicUnit {
            step,
            source: Box::new(err),
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            StoreError::InsufficientFunds {
                account_id,
                balance_cents,
                balance_delta,
                ..
            } => Self::InsufficientFunds {
                account_id,
                balance_cents,
                required_cents: balance_delta.saturating_neg(),
            },
            StoreError::InvalidAdjustment { reason, .. } => Self::InvalidInput(reason),
            err @ (StoreError::Database(_)
            | StoreError::Serialization(_)
            | StoreError::Duplicate { .. }
            | StoreError::InconsistentEntry(_)) => Self::Store(err),
        }
    }
}

impl From<LedgerError> for ServiceError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidStateTransition { from, to } => {
                Self::InvalidStateTransition { from, to }
            }
            LedgerError::InvalidAmount(_)
            | LedgerError::MissingField(_)
            | LedgerError::InvalidField { .. } => Self::InvalidInput(err.to_string()),
            LedgerError::InvalidId(e) => e.into(),
            LedgerError::InconsistentEntry { .. } => Self::Internal(err.to_string()),
        }
    }
}

impl From<IdError> for ServiceError {
    fn from(err: IdError) -> Self {
        match err {
            IdError::ClockRegression { .. } => Self::ClockRegression(err),
            IdError::InvalidFormat { .. } => Self::InvalidInput(err.to_string()),
            IdError::InvalidWorkerId { .. } => Self::Config(err.to_string()),
        }
    }
}
