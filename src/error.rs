use bigdecimal::BigDecimal;

/// Failures surfaced by the ledger workflows.
///
/// Everything except `Database` is a caller-visible rejection and is rendered
/// as a typed error payload; `Database` is an infrastructure failure.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("conflict: {reason}")]
    Conflict { reason: String },

    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: BigDecimal, available: BigDecimal },

    #[error("coupon {code} expired")]
    Expired { code: String },

    #[error("coupon {code} usage limit reached")]
    LimitReached { code: String },

    #[error("invalid {field}")]
    Validation { field: &'static str },

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

impl LedgerError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict { reason: reason.into() }
    }

    pub fn validation(field: &'static str) -> Self {
        Self::Validation { field }
    }
}
