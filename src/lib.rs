#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::dbg_macro,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::panic,
    )
)]

pub mod dispatch;
pub mod error;
pub mod naming;
pub mod records;
pub mod types;

pub use dispatch::{EventKind, RecordVariant, record_from_event, resolve};
pub use error::Error;
pub use records::schema::{Column, ColumnType};
pub use records::{
    AccountRecordBase, EventRecord, GroupRecordBase, LendingAccountChangeLiquidityRecord,
    LendingAccountLiquidateRecord, LendingPoolBankAccrueInterestRecord,
    LendingPoolBankCollectFeesRecord, LendingPoolBankConfigureRecord, LendingPoolBankCreateRecord,
    LendingPoolBankHandleBankruptcyRecord, Lineage, LineageHeader, LiquidityEvent,
    MarginfiAccountCreateRecord, MarginfiGroupConfigureRecord, MarginfiGroupCreateRecord, Record,
    RecordBase, RecordKind,
};
pub use types::{Event, InstructionArgs, InstructionWithLogs};
