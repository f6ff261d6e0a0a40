use serde::Serialize;

/// Predefined error payload that callers can hand back to their own clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorCode {
    pub error_code: u32,
    pub error_message: &'static str,
}

/// The transaction was already submitted on-chain, so resubmitting only costs fees
pub const ALREADY_SUBMITTED_SKIP_TRANSACTION: ErrorCode = ErrorCode {
    error_code: 1,
    error_message: "Already submitted on-chain. Skip this transaction to save your cost",
};

/// Fallback for errors without a dedicated code
pub const GENERIC_ERROR: ErrorCode = ErrorCode {
    error_code: 100,
    error_message: "Already submitted on-chain. Skip this transaction to save your cost",
};
