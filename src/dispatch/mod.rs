use strum::IntoEnumIterator;

use crate::error::Error;
use crate::records::{
    EventRecord, LendingAccountChangeLiquidityRecord, LendingAccountLiquidateRecord,
    LendingPoolBankAccrueInterestRecord, LendingPoolBankCollectFeesRecord,
    LendingPoolBankConfigureRecord, LendingPoolBankCreateRecord,
    LendingPoolBankHandleBankruptcyRecord, MarginfiAccountCreateRecord,
    MarginfiGroupConfigureRecord, MarginfiGroupCreateRecord, Record, RecordKind,
};
use crate::types::{Event, InstructionArgs, InstructionWithLogs};

/// Every marginfi IDL event this crate turns into a record.
///
/// Parsing is exact and case-sensitive on the IDL event name.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::IntoStaticStr,
    strum_macros::EnumIter,
)]
pub enum EventKind {
    #[strum(serialize = "MarginfiGroupCreateEvent")]
    MarginfiGroupCreate,
    #[strum(serialize = "MarginfiGroupConfigureEvent")]
    MarginfiGroupConfigure,
    #[strum(serialize = "LendingPoolBankCreateEvent")]
    LendingPoolBankCreate,
    #[strum(serialize = "LendingPoolBankConfigureEvent")]
    LendingPoolBankConfigure,
    #[strum(serialize = "LendingPoolBankAccrueInterestEvent")]
    LendingPoolBankAccrueInterest,
    #[strum(serialize = "LendingPoolBankCollectFeesEvent")]
    LendingPoolBankCollectFees,
    #[strum(serialize = "LendingPoolBankHandleBankruptcyEvent")]
    LendingPoolBankHandleBankruptcy,
    #[strum(serialize = "MarginfiAccountCreateEvent")]
    MarginfiAccountCreate,
    #[strum(serialize = "LendingAccountDepositEvent")]
    LendingAccountDeposit,
    #[strum(serialize = "LendingAccountWithdrawEvent")]
    LendingAccountWithdraw,
    #[strum(serialize = "LendingAccountBorrowEvent")]
    LendingAccountBorrow,
    #[strum(serialize = "LendingAccountRepayEvent")]
    LendingAccountRepay,
    #[strum(serialize = "LendingAccountLiquidateEvent")]
    LendingAccountLiquidate,
}

impl EventKind {
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    /// The record variant built from this event kind.
    pub fn variant(self) -> RecordVariant {
        match self {
            Self::MarginfiGroupCreate => RecordVariant::of::<MarginfiGroupCreateRecord>(),
            Self::MarginfiGroupConfigure => RecordVariant::of::<MarginfiGroupConfigureRecord>(),
            Self::LendingPoolBankCreate => RecordVariant::of::<LendingPoolBankCreateRecord>(),
            Self::LendingPoolBankConfigure => {
                RecordVariant::of::<LendingPoolBankConfigureRecord>()
            }
            Self::LendingPoolBankAccrueInterest => {
                RecordVariant::of::<LendingPoolBankAccrueInterestRecord>()
            }
            Self::LendingPoolBankCollectFees => {
                RecordVariant::of::<LendingPoolBankCollectFeesRecord>()
            }
            Self::LendingPoolBankHandleBankruptcy => {
                RecordVariant::of::<LendingPoolBankHandleBankruptcyRecord>()
            }
            Self::MarginfiAccountCreate => RecordVariant::of::<MarginfiAccountCreateRecord>(),
            Self::LendingAccountDeposit
            | Self::LendingAccountWithdraw
            | Self::LendingAccountBorrow
            | Self::LendingAccountRepay => {
                RecordVariant::of::<LendingAccountChangeLiquidityRecord>()
            }
            Self::LendingAccountLiquidate => RecordVariant::of::<LendingAccountLiquidateRecord>(),
        }
    }
}

pub type Constructor =
    fn(&Event, &InstructionWithLogs, &InstructionArgs) -> Result<Record, Error>;

/// A resolved dispatch entry: the record kind and its constructor.
#[derive(Debug, Clone, Copy)]
pub struct RecordVariant {
    kind: RecordKind,
    construct: Constructor,
}

fn build<R>(
    event: &Event,
    instruction: &InstructionWithLogs,
    instruction_args: &InstructionArgs,
) -> Result<Record, Error>
where
    R: EventRecord,
    Record: From<R>,
{
    R::from_event(event, instruction, instruction_args).map(Record::from)
}

impl RecordVariant {
    fn of<R>() -> Self
    where
        R: EventRecord,
        Record: From<R>,
    {
        Self {
            kind: R::KIND,
            construct: build::<R>,
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn tag(&self) -> &'static str {
        self.kind.tag()
    }

    pub fn schema(&self) -> &'static str {
        self.kind.schema()
    }

    pub fn construct(
        &self,
        event: &Event,
        instruction: &InstructionWithLogs,
        instruction_args: &InstructionArgs,
    ) -> Result<Record, Error> {
        (self.construct)(event, instruction, instruction_args)
    }
}

/// Look up the record variant for an IDL event name.
pub fn resolve(event_kind: &str) -> Option<RecordVariant> {
    event_kind.parse::<EventKind>().ok().map(EventKind::variant)
}

/// Route `event` to its record variant and build the record.
///
/// Unknown event names return [`Error::UnknownEventKind`]; what to do with
/// them is up to the caller.
pub fn record_from_event(
    event: &Event,
    instruction: &InstructionWithLogs,
    instruction_args: &InstructionArgs,
) -> Result<Record, Error> {
    let Some(variant) = resolve(&event.name) else {
        tracing::trace!(
            event = %event.name,
            signature = %instruction.signature,
            "no record variant for event"
        );
        return Err(Error::UnknownEventKind {
            name: event.name.clone(),
        });
    };

    let record = variant.construct(event, instruction, instruction_args)?;
    tracing::debug!(
        event = %event.name,
        tag = record.tag(),
        signature = %instruction.signature,
        "built record"
    );
    Ok(record)
}
