//! JSON-Cadence values.
//!
//! Transaction and script arguments travel as JSON-Cadence documents, and
//! script results come back the same way. Only the value kinds this tool
//! builds by hand get a dedicated variant; anything else decodes into
//! [`CadenceValue::Other`] and is passed through untouched.

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Value};

use crate::blockchain::types::{Address, BlockchainError, BlockchainResult};

pub const UFIX64_SCALE: u64 = 100_000_000;

#[derive(Debug, Clone, PartialEq)]
pub enum CadenceValue {
    String(String),
    Bool(bool),
    Int(i128),
    UInt8(u8),
    UInt64(u64),
    /// Fixed point with 8 decimals, stored as raw units.
    UFix64(u64),
    Address(Address),
    Optional(Option<Box<CadenceValue>>),
    Array(Vec<CadenceValue>),
    Dictionary(Vec<(CadenceValue, CadenceValue)>),
    Other(Value),
}

impl CadenceValue {
    /// Encode as a JSON-Cadence document.
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => json!({ "type": "String", "value": s }),
            Self::Bool(b) => json!({ "type": "Bool", "value": b }),
            Self::Int(i) => json!({ "type": "Int", "value": i.to_string() }),
            Self::UInt8(i) => json!({ "type": "UInt8", "value": i.to_string() }),
            Self::UInt64(i) => json!({ "type": "UInt64", "value": i.to_string() }),
            Self::UFix64(raw) => json!({ "type": "UFix64", "value": format_ufix64(*raw) }),
            Self::Address(a) => json!({ "type": "Address", "value": a.to_string() }),
            Self::Optional(inner) => json!({
                "type": "Optional",
                "value": inner.as_ref().map(|v| v.to_json()),
            }),
            Self::Array(items) => json!({
                "type": "Array",
                "value": items.iter().map(CadenceValue::to_json).collect::<Vec<_>>(),
            }),
            Self::Dictionary(entries) => json!({
                "type": "Dictionary",
                "value": entries
                    .iter()
                    .map(|(k, v)| json!({ "key": k.to_json(), "value": v.to_json() }))
                    .collect::<Vec<_>>(),
            }),
            Self::Other(raw) => raw.clone(),
        }
    }

    /// Serialized form used in transaction and script bodies.
    pub fn to_argument_bytes(&self) -> Vec<u8> {
        // Serializing a Value cannot fail.
        serde_json::to_vec(&self.to_json()).unwrap_or_default()
    }

    /// Decode a JSON-Cadence document.
    pub fn from_json(value: &Value) -> BlockchainResult<Self> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| BlockchainError::Decode("JSON-Cadence value without type".to_string()))?;
        let inner = value.get("value").unwrap_or(&Value::Null);

        let decoded = match kind {
            "String" => Self::String(expect_str(inner, kind)?.to_string()),
            "Bool" => Self::Bool(
                inner
                    .as_bool()
                    .ok_or_else(|| BlockchainError::Decode("Bool value is not a boolean".to_string()))?,
            ),
            "Int" => {
                let raw = expect_str(inner, kind)?;
                match parse_number(raw, kind) {
                    Ok(i) => Self::Int(i),
                    // Int is unbounded; keep what i128 cannot hold as the raw document.
                    Err(_) if is_integer(raw) => Self::Other(value.clone()),
                    Err(e) => return Err(e),
                }
            }
            "UInt8" => Self::UInt8(parse_number(expect_str(inner, kind)?, kind)?),
            "UInt64" => Self::UInt64(parse_number(expect_str(inner, kind)?, kind)?),
            "UFix64" => Self::UFix64(parse_ufix64(expect_str(inner, kind)?)?),
            "Address" => Self::Address(expect_str(inner, kind)?.parse()?),
            "Optional" => {
                if inner.is_null() {
                    Self::Optional(None)
                } else {
                    Self::Optional(Some(Box::new(Self::from_json(inner)?)))
                }
            }
            "Array" => {
                let items = inner
                    .as_array()
                    .ok_or_else(|| BlockchainError::Decode("Array value is not a list".to_string()))?;
                Self::Array(items.iter().map(Self::from_json).collect::<BlockchainResult<_>>()?)
            }
            "Dictionary" => {
                let entries = inner
                    .as_array()
                    .ok_or_else(|| BlockchainError::Decode("Dictionary value is not a list".to_string()))?;
                let mut out = Vec::with_capacity(entries.len());
                for entry in entries {
                    let key = entry.get("key").unwrap_or(&Value::Null);
                    let val = entry.get("value").unwrap_or(&Value::Null);
                    out.push((Self::from_json(key)?, Self::from_json(val)?));
                }
                Self::Dictionary(out)
            }
            _ => Self::Other(value.clone()),
        };
        Ok(decoded)
    }

    /// Decode from the raw bytes returned by the node.
    pub fn from_slice(bytes: &[u8]) -> BlockchainResult<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| BlockchainError::Decode(format!("invalid JSON-Cadence: {}", e)))?;
        Self::from_json(&value)
    }
}

impl FromStr for CadenceValue {
    type Err = BlockchainError;

    /// Parse the `Type:value` form used on the command line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, raw) = s
            .split_once(':')
            .ok_or_else(|| BlockchainError::Decode(format!("argument '{}' must look like Type:value", s)))?;

        match kind {
            "String" => Ok(Self::String(raw.to_string())),
            "Bool" => raw
                .parse()
                .map(Self::Bool)
                .map_err(|_| BlockchainError::Decode(format!("invalid Bool '{}'", raw))),
            "Int" => parse_number(raw, kind).map(Self::Int),
            "UInt8" => parse_number(raw, kind).map(Self::UInt8),
            "UInt64" => parse_number(raw, kind).map(Self::UInt64),
            "UFix64" => parse_ufix64(raw).map(Self::UFix64),
            "Address" => raw.parse().map(Self::Address),
            other => Err(BlockchainError::Decode(format!("unsupported argument type '{}'", other))),
        }
    }
}

impl fmt::Display for CadenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{:?}", s),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::UInt8(i) => write!(f, "{}", i),
            Self::UInt64(i) => write!(f, "{}", i),
            Self::UFix64(raw) => f.write_str(&format_ufix64(*raw)),
            Self::Address(a) => write!(f, "{}", a),
            Self::Optional(None) => f.write_str("nil"),
            Self::Optional(Some(v)) => write!(f, "{}", v),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Self::Dictionary(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
            Self::Other(raw) => write!(f, "{}", raw),
        }
    }
}

fn expect_str<'a>(value: &'a Value, kind: &str) -> BlockchainResult<&'a str> {
    value
        .as_str()
        .ok_or_else(|| BlockchainError::Decode(format!("{} value is not a string", kind)))
}

fn parse_number<T: FromStr>(raw: &str, kind: &str) -> BlockchainResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| BlockchainError::Decode(format!("invalid {} '{}'", kind, raw)))
}

fn is_digits(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit())
}

fn is_integer(raw: &str) -> bool {
    let raw = raw.trim();
    is_digits(raw.strip_prefix('-').unwrap_or(raw))
}

fn format_ufix64(raw: u64) -> String {
    format!("{}.{:08}", raw / UFIX64_SCALE, raw % UFIX64_SCALE)
}

fn parse_ufix64(raw: &str) -> BlockchainResult<u64> {
    let invalid = || BlockchainError::Decode(format!("invalid UFix64 '{}'", raw));
    let (whole, frac) = raw.trim().split_once('.').unwrap_or((raw.trim(), ""));
    if frac.len() > 8 || !is_digits(whole) || !(frac.is_empty() || is_digits(frac)) {
        return Err(invalid());
    }
    let whole: u64 = whole.parse().map_err(|_| invalid())?;
    let frac: u64 = if frac.is_empty() {
        0
    } else {
        format!("{:0<8}", frac).parse().map_err(|_| invalid())?
    };
    whole
        .checked_mul(UFIX64_SCALE)
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_encoding() {
        let value = CadenceValue::String("argument1".to_string());
        assert_eq!(value.to_json(), json!({ "type": "String", "value": "argument1" }));
    }

    #[test]
    fn test_numbers_encode_as_strings() {
        assert_eq!(
            CadenceValue::UInt64(42).to_json(),
            json!({ "type": "UInt64", "value": "42" })
        );
        assert_eq!(
            CadenceValue::UFix64(150_000_000).to_json(),
            json!({ "type": "UFix64", "value": "1.50000000" })
        );
    }

    #[test]
    fn test_cli_syntax() {
        assert_eq!(
            "String:hello".parse::<CadenceValue>().unwrap(),
            CadenceValue::String("hello".to_string())
        );
        assert_eq!("UFix64:10.5".parse::<CadenceValue>().unwrap(), CadenceValue::UFix64(1_050_000_000));
        assert_eq!("Bool:true".parse::<CadenceValue>().unwrap(), CadenceValue::Bool(true));
        assert!(matches!(
            "Address:0x01".parse::<CadenceValue>().unwrap(),
            CadenceValue::Address(_)
        ));
        // Only the first colon separates type from value.
        assert_eq!(
            "String:a:b".parse::<CadenceValue>().unwrap(),
            CadenceValue::String("a:b".to_string())
        );
        assert!("hello".parse::<CadenceValue>().is_err());
        assert!("Path:/storage/x".parse::<CadenceValue>().is_err());
    }

    #[test]
    fn test_decode_script_result() {
        let raw = br#"{"type":"Optional","value":{"type":"Array","value":[{"type":"UInt64","value":"1"},{"type":"UInt64","value":"2"}]}}"#;
        let value = CadenceValue::from_slice(raw).unwrap();
        assert_eq!(
            value,
            CadenceValue::Optional(Some(Box::new(CadenceValue::Array(vec![
                CadenceValue::UInt64(1),
                CadenceValue::UInt64(2),
            ]))))
        );
        assert_eq!(value.to_string(), "[1, 2]");
    }

    #[test]
    fn test_int_beyond_i128_is_preserved() {
        let raw = br#"{"type":"Int","value":"1000000000000000000000000000000000000000"}"#;
        let value = CadenceValue::from_slice(raw).unwrap();
        assert_eq!(
            value,
            CadenceValue::Other(json!({ "type": "Int", "value": "1000000000000000000000000000000000000000" }))
        );
        assert_eq!(value.to_json()["value"], "1000000000000000000000000000000000000000");

        let small = CadenceValue::from_slice(br#"{"type":"Int","value":"-17"}"#).unwrap();
        assert_eq!(small, CadenceValue::Int(-17));
        assert!(CadenceValue::from_slice(br#"{"type":"Int","value":"12abc"}"#).is_err());
    }

    #[test]
    fn test_ufix64_rejects_signs() {
        assert_eq!("UFix64:1.5".parse::<CadenceValue>().unwrap(), CadenceValue::UFix64(150_000_000));
        assert!("UFix64:+1.+5".parse::<CadenceValue>().is_err());
        assert!("UFix64:+1.5".parse::<CadenceValue>().is_err());
        assert!("UFix64:1.-5".parse::<CadenceValue>().is_err());
        assert!("UFix64:.5".parse::<CadenceValue>().is_err());
    }

    #[test]
    fn test_unknown_kind_is_preserved() {
        let raw = json!({ "type": "Path", "value": { "domain": "storage", "identifier": "vault" } });
        let value = CadenceValue::from_json(&raw).unwrap();
        assert_eq!(value, CadenceValue::Other(raw.clone()));
        assert_eq!(value.to_json(), raw);
    }

    #[test]
    fn test_dictionary_encoding() {
        let dict = CadenceValue::Dictionary(vec![(
            CadenceValue::String("NFT".to_string()),
            CadenceValue::String("beef".to_string()),
        )]);
        assert_eq!(
            dict.to_json(),
            json!({
                "type": "Dictionary",
                "value": [{
                    "key": { "type": "String", "value": "NFT" },
                    "value": { "type": "String", "value": "beef" }
                }]
            })
        );
    }
}
