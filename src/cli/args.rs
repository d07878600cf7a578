//! Parsing of account and amount arguments.

use crate::utils::constants::TOKEN_DECIMALS;
use crate::utils::crypto::Address;

use super::{CliError, CliResult};

/// Keyword naming the deployed contract
pub const CONTRACT_KEYWORD: &str = "contract";

/// Resolve an account argument.
///
/// `0x`-prefixed hex is taken literally, `contract` names the deployed
/// contract, and anything else is a label hashed to a stable address.
pub fn parse_account(value: &str, contract: Address) -> CliResult<Address> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CliError::InvalidArgument("account cannot be empty".into()));
    }
    if value.eq_ignore_ascii_case(CONTRACT_KEYWORD) {
        return Ok(contract);
    }
    if value.starts_with("0x") || value.starts_with("0X") {
        return Address::from_hex(value)
            .map_err(|e| CliError::InvalidArgument(format!("{}: {}", value, e)));
    }
    Ok(Address::from_label(value))
}

/// Parse an amount into base units.
///
/// Decimal values are whole units (`1.5` is 1.5 × 10^18); a `wei` suffix
/// gives base units directly.
pub fn parse_amount(value: &str) -> CliResult<u128> {
    let value = value.trim();
    let invalid = |reason: &str| CliError::InvalidArgument(format!("amount {:?}: {}", value, reason));

    if let Some(units) = value.strip_suffix("wei") {
        return units.trim().parse().map_err(|_| invalid("not an integer"));
    }

    let (whole, frac) = match value.split_once('.') {
        Some((w, f)) => (w, f),
        None => (value, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid("empty"));
    }
    if frac.len() > TOKEN_DECIMALS as usize {
        return Err(invalid("too many decimal places"));
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid("not a number"));
    }

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid("out of range"))?
    };
    let padded = format!("{:0<width$}", frac, width = TOKEN_DECIMALS as usize);
    let frac: u128 = padded.parse().map_err(|_| invalid("bad fraction"))?;

    10u128
        .checked_pow(TOKEN_DECIMALS as u32)
        .and_then(|scale| whole.checked_mul(scale))
        .and_then(|units| units.checked_add(frac))
        .ok_or_else(|| invalid("out of range"))
}
