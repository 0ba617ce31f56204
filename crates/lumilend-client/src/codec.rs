//! Conversions between contract values (`ScVal`) and client types.
//!
//! Decoders look fields up by symbol key rather than position, so they are
//! insensitive to map ordering. Struct decoders fail loudly on shape
//! mismatches; callers on the query path decide whether to swallow that.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use stellar_xdr::curr as xdr;
use stellar_xdr::curr::{Limits, ReadXdr, WriteXdr};

use crate::amount::Amount;
use crate::error::{Error, Result};
use crate::types::{LenderInfo, Loan, LoanStatus, PoolStats};

pub fn i128_to_scval(value: i128) -> xdr::ScVal {
    xdr::ScVal::I128(xdr::Int128Parts {
        hi: (value >> 64) as i64,
        lo: value as u64,
    })
}

pub fn i128_from_scval(val: &xdr::ScVal) -> Result<i128> {
    match val {
        xdr::ScVal::I128(parts) => Ok(((parts.hi as i128) << 64) | (parts.lo as i128)),
        _ => Err(unexpected("i128")),
    }
}

pub fn u64_to_scval(value: u64) -> xdr::ScVal {
    xdr::ScVal::U64(value)
}

pub fn u64_from_scval(val: &xdr::ScVal) -> Result<u64> {
    match val {
        xdr::ScVal::U64(value) => Ok(*value),
        _ => Err(unexpected("u64")),
    }
}

pub fn u32_to_scval(value: u32) -> xdr::ScVal {
    xdr::ScVal::U32(value)
}

pub fn u32_from_scval(val: &xdr::ScVal) -> Result<u32> {
    match val {
        xdr::ScVal::U32(value) => Ok(*value),
        _ => Err(unexpected("u32")),
    }
}

pub fn symbol_to_scval(name: &str) -> Result<xdr::ScVal> {
    let sym: xdr::StringM<32> = name.try_into()?;
    Ok(xdr::ScVal::Symbol(xdr::ScSymbol(sym)))
}

/// Parses a strkey address ("G..." account or "C..." contract) into the
/// XDR address form used in contract arguments.
pub fn parse_address(address: &str) -> Result<xdr::ScAddress> {
    match stellar_strkey::Strkey::from_string(address) {
        Ok(stellar_strkey::Strkey::PublicKeyEd25519(pk)) => Ok(xdr::ScAddress::Account(
            xdr::AccountId(xdr::PublicKey::PublicKeyTypeEd25519(xdr::Uint256(pk.0))),
        )),
        Ok(stellar_strkey::Strkey::Contract(contract)) => {
            Ok(xdr::ScAddress::Contract(xdr::Hash(contract.0)))
        }
        Ok(_) => Err(Error::invalid_address(address, "unsupported strkey kind")),
        Err(_) => Err(Error::invalid_address(address, "not a valid strkey")),
    }
}

pub fn format_address(address: &xdr::ScAddress) -> String {
    match address {
        xdr::ScAddress::Account(xdr::AccountId(xdr::PublicKey::PublicKeyTypeEd25519(
            xdr::Uint256(bytes),
        ))) => stellar_strkey::Strkey::PublicKeyEd25519(stellar_strkey::ed25519::PublicKey(
            *bytes,
        ))
        .to_string(),
        xdr::ScAddress::Contract(hash) => {
            stellar_strkey::Strkey::Contract(stellar_strkey::Contract(hash.0)).to_string()
        }
    }
}

pub fn address_to_scval(address: &str) -> Result<xdr::ScVal> {
    Ok(xdr::ScVal::Address(parse_address(address)?))
}

pub fn address_from_scval(val: &xdr::ScVal) -> Result<String> {
    match val {
        xdr::ScVal::Address(address) => Ok(format_address(address)),
        _ => Err(unexpected("address")),
    }
}

/// Normalizes the two shapes the ledger emits for the status enum: the
/// keyed form `Vec[Symbol("Active")]` and the bare declaration ordinal
/// `U32(0)`. Bare symbols are accepted as well since some decoders strip
/// the vec wrapper.
pub fn loan_status_from_scval(val: &xdr::ScVal) -> Result<LoanStatus> {
    match val {
        xdr::ScVal::Vec(Some(items)) => match items.0.first() {
            Some(xdr::ScVal::Symbol(sym)) => status_from_name(&sym.0.to_utf8_string_lossy()),
            _ => Err(unexpected("loan status")),
        },
        xdr::ScVal::Symbol(sym) => status_from_name(&sym.0.to_utf8_string_lossy()),
        xdr::ScVal::U32(ordinal) => match ordinal {
            0 => Ok(LoanStatus::Active),
            1 => Ok(LoanStatus::Repaid),
            2 => Ok(LoanStatus::Defaulted),
            _ => Err(Error::Xdr(format!("unknown loan status ordinal {ordinal}"))),
        },
        _ => Err(unexpected("loan status")),
    }
}

fn status_from_name(name: &str) -> Result<LoanStatus> {
    match name {
        "Active" => Ok(LoanStatus::Active),
        "Repaid" => Ok(LoanStatus::Repaid),
        "Defaulted" => Ok(LoanStatus::Defaulted),
        other => Err(Error::Xdr(format!("unknown loan status {other:?}"))),
    }
}

pub fn pool_stats_from_scval(val: &xdr::ScVal) -> Result<PoolStats> {
    let map = as_map(val)?;
    Ok(PoolStats {
        total_deposited: amount_field(map, "total_deposited")?,
        total_lent: amount_field(map, "total_lent")?,
        available: amount_field(map, "available")?,
        interest_rate_bps: u32_from_scval(map_field(map, "interest_rate_bps")?)?,
    })
}

pub fn lender_info_from_scval(val: &xdr::ScVal) -> Result<LenderInfo> {
    let map = as_map(val)?;
    Ok(LenderInfo {
        amount: amount_field(map, "amount")?,
        deposit_timestamp: u64_from_scval(map_field(map, "deposit_timestamp")?)?,
    })
}

pub fn loan_from_scval(loan_id: u64, val: &xdr::ScVal) -> Result<Loan> {
    let map = as_map(val)?;
    Ok(Loan {
        loan_id,
        borrower: address_from_scval(map_field(map, "borrower")?)?,
        principal: amount_field(map, "principal")?,
        interest_owed: amount_field(map, "interest_owed")?,
        due_timestamp: u64_from_scval(map_field(map, "due_timestamp")?)?,
        status: loan_status_from_scval(map_field(map, "status")?)?,
    })
}

pub fn map_field<'a>(map: &'a xdr::ScMap, name: &str) -> Result<&'a xdr::ScVal> {
    for entry in map.0.iter() {
        if let xdr::ScVal::Symbol(sym) = &entry.key {
            if sym.0.to_utf8_string_lossy() == name {
                return Ok(&entry.val);
            }
        }
    }
    Err(Error::Xdr(format!("contract value is missing field {name}")))
}

fn amount_field(map: &xdr::ScMap, name: &str) -> Result<Amount> {
    Ok(Amount::from_stroops(i128_from_scval(map_field(map, name)?)?))
}

fn as_map(val: &xdr::ScVal) -> Result<&xdr::ScMap> {
    match val {
        xdr::ScVal::Map(Some(map)) => Ok(map),
        _ => Err(unexpected("map")),
    }
}

fn unexpected(wanted: &str) -> Error {
    Error::Xdr(format!("unexpected contract value shape, wanted {wanted}"))
}

pub fn scval_to_base64(val: &xdr::ScVal) -> Result<String> {
    Ok(BASE64.encode(val.to_xdr(Limits::none())?))
}

pub fn scval_from_base64(encoded: &str) -> Result<xdr::ScVal> {
    Ok(xdr::ScVal::from_xdr(BASE64.decode(encoded)?, Limits::none())?)
}
