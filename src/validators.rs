//! Value-shape validators
//!
//! Validators run after injection, against decoded field values. They are
//! accumulated per invocation so a caller sees every malformed value at
//! once.

use std::net::IpAddr;
use std::sync::Arc;

use serde_json::Value;

/// A single-field validator; the error string names what was expected.
pub type Validator = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Accept only one of the expected values, compared case-insensitively.
pub fn enum_of(expected: impl IntoIterator<Item = impl Into<String>>) -> Validator {
    let expected: Vec<String> = expected.into_iter().map(Into::into).collect();
    Arc::new(move |value| {
        let got = string_of(value)?;
        if expected.iter().any(|e| e.eq_ignore_ascii_case(&got)) {
            return Ok(());
        }
        Err(format!(
            "invalid value '{}', expect '{}'",
            got,
            expected.join("' or '")
        ))
    })
}

/// Accept an IPv4 or IPv6 address.
pub fn is_ip() -> Validator {
    Arc::new(|value| {
        let got = string_of(value)?;
        got.parse::<IpAddr>()
            .map(|_| ())
            .map_err(|_| format!("invalid IP address '{}'", got))
    })
}

/// Accept an address block in CIDR notation.
pub fn is_cidr() -> Validator {
    Arc::new(|value| {
        let got = string_of(value)?;
        let err = || format!("invalid CIDR block '{}'", got);
        let (addr, prefix) = got.split_once('/').ok_or_else(err)?;
        let addr: IpAddr = addr.parse().map_err(|_| err())?;
        let prefix: u8 = prefix.parse().map_err(|_| err())?;
        let max = if addr.is_ipv4() { 32 } else { 128 };
        if prefix > max {
            return Err(err());
        }
        Ok(())
    })
}

fn string_of(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(format!("expected a string value, got {}", other)),
    }
}
