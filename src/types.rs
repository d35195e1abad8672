use chrono::{DateTime, Utc};

/// A decoded marginfi program event as produced by the upstream IDL decoder.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Event {
    /// IDL event name (e.g. `"LendingAccountDepositEvent"`).
    pub name: String,
    /// Decoded event fields. Shape depends on `name`.
    pub data: serde_json::Value,
}

/// Execution context of the instruction that emitted an [`Event`].
#[derive(Debug, Clone, serde::Deserialize)]
pub struct InstructionWithLogs {
    /// Block time of the transaction.
    pub timestamp: DateTime<Utc>,
    /// Version of the IDL used to decode the instruction's events.
    pub idl_version: u32,
    /// Whether the instruction was invoked through a CPI.
    pub is_cpi: bool,
    /// Transaction signature (base58).
    pub signature: String,
    /// Program the instruction targeted.
    pub program_id: String,
}

/// Decoded instruction arguments, passed through to record constructors.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct InstructionArgs {
    /// IDL instruction name (e.g. `"LendingAccountDeposit"`).
    pub name: String,
    /// Parsed instruction arguments, if available.
    pub data: Option<serde_json::Value>,
}
