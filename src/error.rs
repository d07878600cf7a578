//! Error types for the Athena ledger.
//!
//! Every failing operation aborts with no partial state mutation and surfaces
//! one of these variants synchronously to the caller.

use thiserror::Error;

/// Result type alias for Athena operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Athena ledger
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ═══════════════════════════════════════════════════════════════════
    // Ledger Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Null identity used where a concrete holder is required
    #[error("Invalid address: the null address is not a valid holder")]
    InvalidAddress,

    /// Debit exceeds the holder's current token balance
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Requested debit
        required: u128,
        /// Current balance
        available: u128,
    },

    /// `transfer_from` exceeds the approved allowance
    #[error("Insufficient allowance: required {required}, approved {approved}")]
    InsufficientAllowance {
        /// Requested spend
        required: u128,
        /// Current allowance
        approved: u128,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Custody Errors
    // ═══════════════════════════════════════════════════════════════════

    /// External account lacks the native currency it is trying to send
    #[error("Insufficient native balance: required {required}, available {available}")]
    InsufficientNativeBalance {
        /// Requested amount
        required: u128,
        /// Account balance
        available: u128,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Authorization Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Caller is not allowed to perform this action
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    // ═══════════════════════════════════════════════════════════════════
    // Validation Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Invalid input parameter
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Amount is zero
    #[error("Amount cannot be zero")]
    ZeroAmount,

    /// Overflow in calculation
    #[error("Arithmetic overflow in {operation}")]
    Overflow {
        /// Operation that overflowed
        operation: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Protocol Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Invariant violation detected
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    // ═══════════════════════════════════════════════════════════════════
    // Serialization Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ═══════════════════════════════════════════════════════════════════
    // Internal Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Lock acquisition failed
    #[error("Failed to acquire lock")]
    Lock,

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Returns true if the caller can fix the request and resubmit
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InsufficientBalance { .. }
                | Error::InsufficientAllowance { .. }
                | Error::InsufficientNativeBalance { .. }
                | Error::ZeroAmount
        )
    }

    /// Returns true if this is a critical error requiring immediate attention
    pub fn is_critical(&self) -> bool {
        matches!(self, Error::InvariantViolation(_) | Error::Overflow { .. })
    }

    /// Returns the error code for external systems
    pub fn code(&self) -> u32 {
        match self {
            // Ledger errors: 1xxx
            Error::InvalidAddress => 1001,
            Error::InsufficientBalance { .. } => 1002,
            Error::InsufficientAllowance { .. } => 1003,

            // Custody errors: 2xxx
            Error::InsufficientNativeBalance { .. } => 2001,

            // Authorization errors: 4xxx
            Error::Unauthorized(_) => 4001,

            // Validation errors: 5xxx
            Error::InvalidParameter { .. } => 5001,
            Error::ZeroAmount => 5002,
            Error::Overflow { .. } => 5003,

            // Protocol errors: 6xxx
            Error::InvariantViolation(_) => 6004,

            // Serialization errors: 7xxx
            Error::Serialization(_) => 7001,
            Error::Deserialization(_) => 7002,

            // Internal errors: 9xxx
            Error::Lock => 9002,
            Error::Storage(_) => 9003,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_unique() {
        let codes = vec![
            Error::InvalidAddress.code(),
            Error::InsufficientBalance { required: 0, available: 0 }.code(),
            Error::InsufficientAllowance { required: 0, approved: 0 }.code(),
            Error::InsufficientNativeBalance { required: 0, available: 0 }.code(),
            Error::Unauthorized("".into()).code(),
            Error::ZeroAmount.code(),
            Error::InvariantViolation("".into()).code(),
            Error::Storage("".into()).code(),
        ];

        let mut unique_codes = codes.clone();
        unique_codes.sort();
        unique_codes.dedup();

        assert_eq!(codes.len(), unique_codes.len(), "Error codes must be unique");
    }

    #[test]
    fn test_error_display() {
        let err = Error::InsufficientBalance {
            required: 1000,
            available: 500,
        };
        assert!(err.to_string().contains("1000"));
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::ZeroAmount.is_recoverable());
        assert!(!Error::Unauthorized("withdraw".into()).is_recoverable());
    }

    #[test]
    fn test_is_critical() {
        assert!(Error::InvariantViolation("test".into()).is_critical());
        assert!(Error::Overflow { operation: "test".into() }.is_critical());
        assert!(!Error::InvalidAddress.is_critical());
    }
}
