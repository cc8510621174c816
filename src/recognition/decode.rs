//! Strict decoding of recognition-service text.
//!
//! The model is asked for JSON but answers with free text: sometimes fenced
//! in a markdown code block, sometimes with a sentence before or after. The
//! decoder cuts out the first JSON value, deserializes it into a wire shape
//! and validates it. A shape that does not fit is an [`Error::Decode`]; a
//! well-formed answer with no items is [`Error::NoDetection`]. A single line
//! whose price cannot be read is kept with no price so ingestion can report it.

use crate::{
    core::receipt::{DictatedItem, RecognizedItem, RecognizedReceipt},
    errors::{Error, Result},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReceiptWire {
    Receipt {
        #[serde(default, alias = "supermarket", alias = "supermarket_name", alias = "store_name")]
        store: Option<String>,
        #[serde(alias = "products")]
        items: Vec<ReceiptItemWire>,
    },
    Items(Vec<ReceiptItemWire>),
}

#[derive(Debug, Deserialize)]
struct ReceiptItemWire {
    #[serde(alias = "product", alias = "product_name")]
    name: String,
    #[serde(default)]
    price: Value,
    #[serde(default, alias = "supermarket", alias = "supermarket_name", alias = "store_name")]
    store: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DictationWire {
    List {
        #[serde(alias = "products")]
        items: Vec<DictationItemWire>,
    },
    Items(Vec<DictationItemWire>),
}

#[derive(Debug, Deserialize)]
struct DictationItemWire {
    #[serde(alias = "product", alias = "product_name")]
    name: String,
    #[serde(default)]
    quantity: Option<Value>,
}

fn decode_error(message: impl Into<String>) -> Error {
    Error::Decode {
        message: message.into(),
    }
}

/// Removes a surrounding markdown code fence (with or without a language tag).
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the language tag line ("```json").
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// The first JSON object or array in `text`, from its opening bracket to the
/// last matching closing bracket.
#[must_use]
pub fn extract_json(text: &str) -> Option<&str> {
    let text = strip_code_fences(text);
    let start = text.find(['{', '['])?;
    let closing = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closing)?;
    (end > start).then(|| &text[start..=end])
}

/// Reads a price that may come as a number or as text like "1,20 €".
fn parse_price(value: &Value) -> Result<f64> {
    match value {
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| decode_error(format!("price {number} is not a number"))),
        Value::String(text) => {
            let cleaned: String = text
                .trim()
                .trim_end_matches('€')
                .trim()
                .replace(',', ".");
            cleaned
                .parse::<f64>()
                .map_err(|_| decode_error(format!("price '{text}' is not a number")))
        }
        other => Err(decode_error(format!("unexpected price value {other}"))),
    }
}

/// Reads a quantity; missing or unreadable means one, anything below one is
/// raised to one.
#[allow(clippy::cast_possible_truncation)]
fn parse_quantity(value: Option<&Value>) -> i32 {
    let quantity = match value {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|f| f.round() as i64)),
        Some(Value::String(text)) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
    .unwrap_or(1);
    i32::try_from(quantity.max(1)).unwrap_or(i32::MAX)
}

fn clean_store(store: Option<String>) -> Option<String> {
    store
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Decodes a receipt answer into lines.
///
/// Lines whose price is missing or unreadable keep `price: None`.
///
/// # Errors
/// - [`Error::Decode`] if no JSON is found or it does not match the expected shape
/// - [`Error::NoDetection`] if the receipt has no lines
pub fn decode_receipt(text: &str) -> Result<RecognizedReceipt> {
    let json = extract_json(text).ok_or_else(|| decode_error("no JSON found in response"))?;
    let wire: ReceiptWire =
        serde_json::from_str(json).map_err(|e| decode_error(e.to_string()))?;

    let (store, wire_items) = match wire {
        ReceiptWire::Receipt { store, items } => (store, items),
        ReceiptWire::Items(items) => (None, items),
    };
    if wire_items.is_empty() {
        return Err(Error::NoDetection);
    }

    let items = wire_items
        .into_iter()
        .map(|item| {
            let name = item.name.trim().to_string();
            let price = parse_price(&item.price)
                .inspect_err(|e| warn!("Unreadable price on line '{}': {}", name, e))
                .ok();
            RecognizedItem {
                name,
                price,
                store_name: clean_store(item.store),
            }
        })
        .collect();

    Ok(RecognizedReceipt {
        store_name: clean_store(store),
        items,
    })
}

/// Decodes a dictation answer into list items.
///
/// # Errors
/// - [`Error::Decode`] if no JSON is found or it does not match the expected shape
/// - [`Error::NoDetection`] if no items were dictated
pub fn decode_dictation(text: &str) -> Result<Vec<DictatedItem>> {
    let json = extract_json(text).ok_or_else(|| decode_error("no JSON found in response"))?;
    let wire: DictationWire =
        serde_json::from_str(json).map_err(|e| decode_error(e.to_string()))?;

    let items = match wire {
        DictationWire::List { items } | DictationWire::Items(items) => items,
    };
    if items.is_empty() {
        return Err(Error::NoDetection);
    }

    Ok(items
        .into_iter()
        .map(|item| DictatedItem {
            name: item.name.trim().to_string(),
            quantity: parse_quantity(item.quantity.as_ref()),
        })
        .collect())
}
