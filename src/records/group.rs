use serde::{Deserialize, Serialize};

use super::schema::Column;
use super::{
    EventRecord, GroupEventHeader, GroupRecordBase, RecordKind, deserialize_optional_pubkey,
    deserialize_pubkey, parse_payload,
};
use crate::error::Error;
use crate::types::{Event, InstructionArgs, InstructionWithLogs};

const BANK_COLUMNS: [Column; 2] = [Column::string("bank"), Column::string("mint")];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginfiGroupCreateRecord {
    #[serde(flatten)]
    pub header: GroupRecordBase,
}

#[derive(Deserialize)]
struct HeaderOnlyFields {
    header: GroupEventHeader,
}

impl EventRecord for MarginfiGroupCreateRecord {
    const KIND: RecordKind = RecordKind::MarginfiGroupCreate;
    const COLUMNS: &'static [Column] = &[];

    fn from_event(
        event: &Event,
        instruction: &InstructionWithLogs,
        _instruction_args: &InstructionArgs,
    ) -> Result<Self, Error> {
        let HeaderOnlyFields { header } = parse_payload(event)?;
        Ok(Self {
            header: GroupRecordBase::new(instruction, header),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginfiGroupConfigureRecord {
    #[serde(flatten)]
    pub header: GroupRecordBase,
    /// New group admin, when the configuration changed it.
    pub admin: Option<String>,
}

#[derive(Deserialize)]
struct GroupConfigureFields {
    header: GroupEventHeader,
    config: GroupConfigFields,
}

#[derive(Deserialize)]
struct GroupConfigFields {
    #[serde(default, deserialize_with = "deserialize_optional_pubkey")]
    admin: Option<String>,
}

impl EventRecord for MarginfiGroupConfigureRecord {
    const KIND: RecordKind = RecordKind::MarginfiGroupConfigure;
    const COLUMNS: &'static [Column] = &[Column::string("admin")];

    fn from_event(
        event: &Event,
        instruction: &InstructionWithLogs,
        _instruction_args: &InstructionArgs,
    ) -> Result<Self, Error> {
        let GroupConfigureFields { header, config } = parse_payload(event)?;
        Ok(Self {
            header: GroupRecordBase::new(instruction, header),
            admin: config.admin,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LendingPoolBankCreateRecord {
    #[serde(flatten)]
    pub header: GroupRecordBase,
    pub bank: String,
    pub mint: String,
}

#[derive(Deserialize)]
struct BankFields {
    header: GroupEventHeader,
    #[serde(deserialize_with = "deserialize_pubkey")]
    bank: String,
    #[serde(deserialize_with = "deserialize_pubkey")]
    mint: String,
}

impl EventRecord for LendingPoolBankCreateRecord {
    const KIND: RecordKind = RecordKind::LendingPoolBankCreate;
    const COLUMNS: &'static [Column] = &BANK_COLUMNS;

    fn from_event(
        event: &Event,
        instruction: &InstructionWithLogs,
        _instruction_args: &InstructionArgs,
    ) -> Result<Self, Error> {
        let BankFields { header, bank, mint } = parse_payload(event)?;
        Ok(Self {
            header: GroupRecordBase::new(instruction, header),
            bank,
            mint,
        })
    }
}

/// Bank configuration change. Only the bank identity is recorded; the
/// individual config values (weights, limits, oracle, interest rate curve)
/// are not extracted yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LendingPoolBankConfigureRecord {
    #[serde(flatten)]
    pub header: GroupRecordBase,
    pub bank: String,
    pub mint: String,
}

impl EventRecord for LendingPoolBankConfigureRecord {
    const KIND: RecordKind = RecordKind::LendingPoolBankConfigure;
    const COLUMNS: &'static [Column] = &BANK_COLUMNS;

    fn from_event(
        event: &Event,
        instruction: &InstructionWithLogs,
        _instruction_args: &InstructionArgs,
    ) -> Result<Self, Error> {
        let BankFields { header, bank, mint } = parse_payload(event)?;
        Ok(Self {
            header: GroupRecordBase::new(instruction, header),
            bank,
            mint,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LendingPoolBankAccrueInterestRecord {
    #[serde(flatten)]
    pub header: GroupRecordBase,
    pub bank: String,
    pub mint: String,
    pub delta: u64,
    pub fees_collected: f64,
    pub insurance_collected: f64,
}

#[derive(Deserialize)]
struct AccrueInterestFields {
    #[serde(flatten)]
    bank: BankFields,
    delta: u64,
    fees_collected: f64,
    insurance_collected: f64,
}

impl EventRecord for LendingPoolBankAccrueInterestRecord {
    const KIND: RecordKind = RecordKind::LendingPoolBankAccrueInterest;
    const COLUMNS: &'static [Column] = &[
        BANK_COLUMNS[0],
        BANK_COLUMNS[1],
        Column::big_numeric("delta"),
        Column::big_numeric("fees_collected"),
        Column::big_numeric("insurance_collected"),
    ];

    fn from_event(
        event: &Event,
        instruction: &InstructionWithLogs,
        _instruction_args: &InstructionArgs,
    ) -> Result<Self, Error> {
        let AccrueInterestFields {
            bank: BankFields { header, bank, mint },
            delta,
            fees_collected,
            insurance_collected,
        } = parse_payload(event)?;
        Ok(Self {
            header: GroupRecordBase::new(instruction, header),
            bank,
            mint,
            delta,
            fees_collected,
            insurance_collected,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LendingPoolBankCollectFeesRecord {
    #[serde(flatten)]
    pub header: GroupRecordBase,
    pub bank: String,
    pub mint: String,
    pub group_fees_collected: f64,
    pub group_fees_outstanding: f64,
    pub insurance_fees_collected: f64,
    pub insurance_fees_outstanding: f64,
}

#[derive(Deserialize)]
struct CollectFeesFields {
    #[serde(flatten)]
    bank: BankFields,
    group_fees_collected: f64,
    group_fees_outstanding: f64,
    insurance_fees_collected: f64,
    insurance_fees_outstanding: f64,
}

impl EventRecord for LendingPoolBankCollectFeesRecord {
    const KIND: RecordKind = RecordKind::LendingPoolBankCollectFees;
    const COLUMNS: &'static [Column] = &[
        BANK_COLUMNS[0],
        BANK_COLUMNS[1],
        Column::big_numeric("group_fees_collected"),
        Column::big_numeric("group_fees_outstanding"),
        Column::big_numeric("insurance_fees_collected"),
        Column::big_numeric("insurance_fees_outstanding"),
    ];

    fn from_event(
        event: &Event,
        instruction: &InstructionWithLogs,
        _instruction_args: &InstructionArgs,
    ) -> Result<Self, Error> {
        let CollectFeesFields {
            bank: BankFields { header, bank, mint },
            group_fees_collected,
            group_fees_outstanding,
            insurance_fees_collected,
            insurance_fees_outstanding,
        } = parse_payload(event)?;
        Ok(Self {
            header: GroupRecordBase::new(instruction, header),
            bank,
            mint,
            group_fees_collected,
            group_fees_outstanding,
            insurance_fees_collected,
            insurance_fees_outstanding,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LendingPoolBankHandleBankruptcyRecord {
    #[serde(flatten)]
    pub header: GroupRecordBase,
    pub bank: String,
    pub mint: String,
    pub bad_debt: f64,
    pub covered_amount: f64,
    pub socialized_amount: f64,
}

#[derive(Deserialize)]
struct HandleBankruptcyFields {
    #[serde(flatten)]
    bank: BankFields,
    bad_debt: f64,
    covered_amount: f64,
    socialized_amount: f64,
}

impl EventRecord for LendingPoolBankHandleBankruptcyRecord {
    const KIND: RecordKind = RecordKind::LendingPoolBankHandleBankruptcy;
    const COLUMNS: &'static [Column] = &[
        BANK_COLUMNS[0],
        BANK_COLUMNS[1],
        Column::big_numeric("bad_debt"),
        Column::big_numeric("covered_amount"),
        Column::big_numeric("socialized_amount"),
    ];

    fn from_event(
        event: &Event,
        instruction: &InstructionWithLogs,
        _instruction_args: &InstructionArgs,
    ) -> Result<Self, Error> {
        let HandleBankruptcyFields {
            bank: BankFields { header, bank, mint },
            bad_debt,
            covered_amount,
            socialized_amount,
        } = parse_payload(event)?;
        Ok(Self {
            header: GroupRecordBase::new(instruction, header),
            bank,
            mint,
            bad_debt,
            covered_amount,
            socialized_amount,
        })
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "test assertions")]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const SIGNER: &str = "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4";
    const GROUP: &str = "4qp6Fx6tnZkY5Wropq9wUYgtFxXKwE6viZxFHg3rdAG8";
    const BANK: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";
    const MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    fn instruction() -> InstructionWithLogs {
        InstructionWithLogs {
            timestamp: Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap(),
            idl_version: 1,
            is_cpi: false,
            signature: "sig".to_string(),
            program_id: "MFv2hWf31Z9kbCa1snEPYctwafyhdvnV7FZnsebVacA".to_string(),
        }
    }

    fn make_event(name: &str, data: serde_json::Value) -> Event {
        Event {
            name: name.to_string(),
            data,
        }
    }

    fn header() -> serde_json::Value {
        serde_json::json!({ "signer": SIGNER, "marginfi_group": GROUP })
    }

    #[test]
    fn group_create_reads_header() {
        let ev = make_event("MarginfiGroupCreateEvent", serde_json::json!({ "header": header() }));
        let record =
            MarginfiGroupCreateRecord::from_event(&ev, &instruction(), &InstructionArgs::default())
                .unwrap();
        assert_eq!(record.header.signer.as_deref(), Some(SIGNER));
        assert_eq!(record.header.marginfi_group, GROUP);
    }

    #[test]
    fn group_configure_admin_is_optional() {
        let ev = make_event(
            "MarginfiGroupConfigureEvent",
            serde_json::json!({ "header": header(), "config": { "admin": SIGNER } }),
        );
        let record = MarginfiGroupConfigureRecord::from_event(
            &ev,
            &instruction(),
            &InstructionArgs::default(),
        )
        .unwrap();
        assert_eq!(record.admin.as_deref(), Some(SIGNER));

        let ev = make_event(
            "MarginfiGroupConfigureEvent",
            serde_json::json!({ "header": header(), "config": { "admin": null } }),
        );
        let record = MarginfiGroupConfigureRecord::from_event(
            &ev,
            &instruction(),
            &InstructionArgs::default(),
        )
        .unwrap();
        assert_eq!(record.admin, None);
    }

    #[test]
    fn group_configure_requires_config() {
        let ev = make_event(
            "MarginfiGroupConfigureEvent",
            serde_json::json!({ "header": header() }),
        );
        let err = MarginfiGroupConfigureRecord::from_event(
            &ev,
            &instruction(),
            &InstructionArgs::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, Error::MalformedPayload { event, .. } if event == "MarginfiGroupConfigureEvent"));
    }

    #[test]
    fn accrue_interest_copies_amounts() {
        let ev = make_event(
            "LendingPoolBankAccrueInterestEvent",
            serde_json::json!({
                "header": header(),
                "bank": BANK,
                "mint": MINT,
                "delta": 3600,
                "fees_collected": 12.5,
                "insurance_collected": 0.25,
            }),
        );
        let record = LendingPoolBankAccrueInterestRecord::from_event(
            &ev,
            &instruction(),
            &InstructionArgs::default(),
        )
        .unwrap();
        assert_eq!(record.bank, BANK);
        assert_eq!(record.mint, MINT);
        assert_eq!(record.delta, 3600);
        assert!((record.fees_collected - 12.5).abs() < f64::EPSILON);
        assert!((record.insurance_collected - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn bankruptcy_missing_amount_is_malformed() {
        let ev = make_event(
            "LendingPoolBankHandleBankruptcyEvent",
            serde_json::json!({
                "header": header(),
                "bank": BANK,
                "mint": MINT,
                "bad_debt": 10,
                "covered_amount": 4,
            }),
        );
        let result = LendingPoolBankHandleBankruptcyRecord::from_event(
            &ev,
            &instruction(),
            &InstructionArgs::default(),
        );
        assert!(matches!(result, Err(Error::MalformedPayload { .. })));
    }
}
