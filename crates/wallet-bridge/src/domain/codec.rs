//! Decoding of ledger payloads.
//!
//! Transaction results are base64 JSON. The original submission is base64
//! of a hex string which itself encodes JSON. State values are base64, with
//! `AA==` (a single zero byte) standing for "nothing stored".

use crate::domain::ledger::TxRecord;
use crate::domain::outcome::ConfirmedTransaction;
use crate::error::{BridgeError, BridgeResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Encoding the ledger uses for an empty state slot.
pub const EMPTY_STATE_SENTINEL: &str = "AA==";

/// Base64-decode into UTF-8 text.
pub fn decode_base64_text(encoded: &str) -> BridgeResult<String> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| BridgeError::Decode(format!("invalid base64: {e}")))?;
    String::from_utf8(bytes).map_err(|e| BridgeError::Decode(format!("invalid utf-8: {e}")))
}

/// Decode a hex string (optionally `0x`-prefixed) into UTF-8 text.
pub fn hex_to_string(hex_text: &str) -> BridgeResult<String> {
    let trimmed = hex_text.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes =
        hex::decode(digits).map_err(|e| BridgeError::Decode(format!("invalid hex: {e}")))?;
    String::from_utf8(bytes).map_err(|e| BridgeError::Decode(format!("invalid utf-8: {e}")))
}

fn parse_json(text: &str, what: &str) -> BridgeResult<Value> {
    serde_json::from_str(text).map_err(|e| BridgeError::Decode(format!("{what} is not JSON: {e}")))
}

/// Agent-reported error marker of a response detail, if any.
pub fn agent_errors(detail: &Value) -> Option<&Value> {
    detail.get("errors").filter(|errors| !errors.is_null())
}

/// Turn a finalized ledger record into the caller-facing result.
///
/// The decoded original submission is attached to the result object under
/// `original_tx`.
pub fn decode_tx_record(tx_hash: &str, record: &TxRecord) -> BridgeResult<ConfirmedTransaction> {
    let mut result = match record.tx_result.data.as_deref() {
        None | Some("") => Value::Null,
        Some(data) => parse_json(&decode_base64_text(data)?, "transaction result")?,
    };

    let original_hex = decode_base64_text(&record.tx)?;
    let original_tx = parse_json(&hex_to_string(&original_hex)?, "original transaction")?;

    if let Value::Object(map) = &mut result {
        map.insert("original_tx".to_string(), original_tx.clone());
    }

    Ok(ConfirmedTransaction {
        hash: record.hash.clone().unwrap_or_else(|| tx_hash.to_string()),
        height: record.height.as_deref().and_then(|h| h.parse().ok()),
        code: record.tx_result.code,
        result,
        original_tx,
    })
}

/// Decode a raw state value. `None` means the slot is empty.
///
/// The empty sentinel is recognised before any decoding is attempted.
pub fn decode_state_value(value: Option<&str>) -> BridgeResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") | Some(EMPTY_STATE_SENTINEL) => Ok(None),
        Some(encoded) => decode_base64_text(encoded).map(Some),
    }
}

/// Parse a decoded balance.
///
/// Accepts a bare number, a JSON string, or the ledger's fixed-point form
/// `{"__fixed__": "1.5"}`.
pub fn parse_balance(text: &str) -> BridgeResult<Decimal> {
    let trimmed = text.trim();
    let literal = match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Number(_)) => trimmed.to_string(),
        Ok(Value::String(s)) => s,
        Ok(Value::Object(map)) => match map.get("__fixed__").and_then(Value::as_str) {
            Some(fixed) => fixed.to_string(),
            None => return Err(BridgeError::Decode(format!("unexpected balance: {trimmed}"))),
        },
        Ok(Value::Null) => return Ok(Decimal::ZERO),
        _ => trimmed.to_string(),
    };

    Decimal::from_str(&literal)
        .or_else(|_| Decimal::from_scientific(&literal))
        .map_err(|e| BridgeError::Decode(format!("invalid balance {literal:?}: {e}")))
}
