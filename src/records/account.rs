use serde::{Deserialize, Serialize};

use super::schema::Column;
use super::{
    AccountEventHeader, AccountRecordBase, EventRecord, RecordKind, deserialize_pubkey,
    parse_payload,
};
use crate::naming::liquidity_operation;
use crate::error::Error;
use crate::types::{Event, InstructionArgs, InstructionWithLogs};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginfiAccountCreateRecord {
    #[serde(flatten)]
    pub header: AccountRecordBase,
}

#[derive(Deserialize)]
struct HeaderOnlyFields {
    header: AccountEventHeader,
}

impl EventRecord for MarginfiAccountCreateRecord {
    const KIND: RecordKind = RecordKind::MarginfiAccountCreate;
    const COLUMNS: &'static [Column] = &[];

    fn from_event(
        event: &Event,
        instruction: &InstructionWithLogs,
        _instruction_args: &InstructionArgs,
    ) -> Result<Self, Error> {
        let HeaderOnlyFields { header } = parse_payload(event)?;
        Ok(Self {
            header: AccountRecordBase::new(instruction, header),
        })
    }
}

/// Deposit, withdraw, borrow or repay against a single bank balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LendingAccountChangeLiquidityRecord {
    #[serde(flatten)]
    pub header: AccountRecordBase,
    /// `deposit`, `withdraw`, `borrow` or `repay`.
    pub operation: String,
    pub amount: u64,
    /// Only withdraw and repay can close a balance.
    pub balance_closed: bool,
}

/// The IDL events that build a [`LendingAccountChangeLiquidityRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::EnumString)]
pub enum LiquidityEvent {
    #[strum(serialize = "LendingAccountDepositEvent")]
    Deposit,
    #[strum(serialize = "LendingAccountWithdrawEvent")]
    Withdraw,
    #[strum(serialize = "LendingAccountBorrowEvent")]
    Borrow,
    #[strum(serialize = "LendingAccountRepayEvent")]
    Repay,
}

impl LiquidityEvent {
    pub fn can_close_balance(self) -> bool {
        matches!(self, Self::Withdraw | Self::Repay)
    }
}

#[derive(Deserialize)]
struct ChangeLiquidityFields {
    header: AccountEventHeader,
    amount: u64,
    #[serde(default)]
    close_balance: Option<bool>,
}

impl EventRecord for LendingAccountChangeLiquidityRecord {
    const KIND: RecordKind = RecordKind::LendingAccountChangeLiquidity;
    const COLUMNS: &'static [Column] = &[
        Column::string("operation"),
        Column::big_numeric("amount"),
        Column::boolean("balance_closed"),
    ];

    fn from_event(
        event: &Event,
        instruction: &InstructionWithLogs,
        _instruction_args: &InstructionArgs,
    ) -> Result<Self, Error> {
        let liquidity_event: LiquidityEvent = event
            .name
            .parse()
            .map_err(|_| Error::malformed(&event.name, "not a liquidity event"))?;
        let ChangeLiquidityFields {
            header,
            amount,
            close_balance,
        } = parse_payload(event)?;

        let balance_closed = if liquidity_event.can_close_balance() {
            close_balance
                .ok_or_else(|| Error::malformed(&event.name, "missing field `close_balance`"))?
        } else {
            false
        };

        Ok(Self {
            header: AccountRecordBase::new(instruction, header),
            operation: liquidity_operation(&event.name),
            amount,
            balance_closed,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LendingAccountLiquidateRecord {
    #[serde(flatten)]
    pub header: AccountRecordBase,
    pub liquidatee_marginfi_account: String,
    pub liquidatee_marginfi_account_authority: String,
    pub asset_bank: String,
    pub asset_mint: String,
    pub liability_bank: String,
    pub liability_mint: String,
    pub liquidatee_pre_health: f64,
    pub liquidatee_post_health: f64,
    pub liquidatee_asset_pre_balance: f64,
    pub liquidatee_liability_pre_balance: f64,
    pub liquidator_asset_pre_balance: f64,
    pub liquidator_liability_pre_balance: f64,
    pub liquidatee_asset_post_balance: f64,
    pub liquidatee_liability_post_balance: f64,
    pub liquidator_asset_post_balance: f64,
    pub liquidator_liability_post_balance: f64,
}

#[derive(Deserialize)]
struct LiquidateFields {
    header: AccountEventHeader,
    #[serde(deserialize_with = "deserialize_pubkey")]
    liquidatee_marginfi_account: String,
    #[serde(deserialize_with = "deserialize_pubkey")]
    liquidatee_marginfi_account_authority: String,
    #[serde(deserialize_with = "deserialize_pubkey")]
    asset_bank: String,
    #[serde(deserialize_with = "deserialize_pubkey")]
    asset_mint: String,
    #[serde(deserialize_with = "deserialize_pubkey")]
    liability_bank: String,
    #[serde(deserialize_with = "deserialize_pubkey")]
    liability_mint: String,
    liquidatee_pre_health: f64,
    liquidatee_post_health: f64,
    pre_balances: LiquidationBalances,
    post_balances: LiquidationBalances,
}

/// Balances of both liquidation parties at one point in time.
#[derive(Deserialize)]
struct LiquidationBalances {
    liquidatee_asset_balance: f64,
    liquidatee_liability_balance: f64,
    liquidator_asset_balance: f64,
    liquidator_liability_balance: f64,
}

impl EventRecord for LendingAccountLiquidateRecord {
    const KIND: RecordKind = RecordKind::LendingAccountLiquidate;
    const COLUMNS: &'static [Column] = &[
        Column::string("liquidatee_marginfi_account"),
        Column::string("liquidatee_marginfi_account_authority"),
        Column::string("asset_bank"),
        Column::string("asset_mint"),
        Column::string("liability_bank"),
        Column::string("liability_mint"),
        Column::big_numeric("liquidatee_pre_health"),
        Column::big_numeric("liquidatee_post_health"),
        Column::big_numeric("liquidatee_asset_pre_balance"),
        Column::big_numeric("liquidatee_liability_pre_balance"),
        Column::big_numeric("liquidator_asset_pre_balance"),
        Column::big_numeric("liquidator_liability_pre_balance"),
        Column::big_numeric("liquidatee_asset_post_balance"),
        Column::big_numeric("liquidatee_liability_post_balance"),
        Column::big_numeric("liquidator_asset_post_balance"),
        Column::big_numeric("liquidator_liability_post_balance"),
    ];

    fn from_event(
        event: &Event,
        instruction: &InstructionWithLogs,
        _instruction_args: &InstructionArgs,
    ) -> Result<Self, Error> {
        let LiquidateFields {
            header,
            liquidatee_marginfi_account,
            liquidatee_marginfi_account_authority,
            asset_bank,
            asset_mint,
            liability_bank,
            liability_mint,
            liquidatee_pre_health,
            liquidatee_post_health,
            pre_balances: pre,
            post_balances: post,
        } = parse_payload(event)?;

        Ok(Self {
            header: AccountRecordBase::new(instruction, header),
            liquidatee_marginfi_account,
            liquidatee_marginfi_account_authority,
            asset_bank,
            asset_mint,
            liability_bank,
            liability_mint,
            liquidatee_pre_health,
            liquidatee_post_health,
            liquidatee_asset_pre_balance: pre.liquidatee_asset_balance,
            liquidatee_liability_pre_balance: pre.liquidatee_liability_balance,
            liquidator_asset_pre_balance: pre.liquidator_asset_balance,
            liquidator_liability_pre_balance: pre.liquidator_liability_balance,
            liquidatee_asset_post_balance: post.liquidatee_asset_balance,
            liquidatee_liability_post_balance: post.liquidatee_liability_balance,
            liquidator_asset_post_balance: post.liquidator_asset_balance,
            liquidator_liability_post_balance: post.liquidator_liability_balance,
        })
    }
}
