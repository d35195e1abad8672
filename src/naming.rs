use chrono::{DateTime, Utc};

/// Warehouse `TIMESTAMP` literal format.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

pub const LIQUIDITY_EVENT_PREFIX: &str = "LendingAccount";
pub const EVENT_SUFFIX: &str = "Event";

pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// `"LendingAccountWithdrawEvent"` -> `"withdraw"`.
///
/// Missing prefix or suffix is left as-is, only the case changes.
pub fn liquidity_operation(event_name: &str) -> String {
    let trimmed = event_name
        .strip_prefix(LIQUIDITY_EVENT_PREFIX)
        .unwrap_or(event_name);
    let trimmed = trimmed.strip_suffix(EVENT_SUFFIX).unwrap_or(trimmed);
    trimmed.to_lowercase()
}

/// `"LendingPoolBankCreateRecord"` -> `"lending_pool_bank_create_record"`.
///
/// A run of capitals is kept together (`"IDLVersion"` -> `"i_dlversion"`),
/// except that the leading character never gets an underscore.
pub fn pascal_to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 8);
    let mut prev_upper = false;
    for (i, c) in name.chars().enumerate() {
        let upper = c.is_ascii_uppercase();
        if upper && i > 0 && (i == 1 || !prev_upper) {
            out.push('_');
        }
        out.push(c.to_ascii_lowercase());
        prev_upper = upper;
    }
    out
}
