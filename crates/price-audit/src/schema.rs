//! Structural schema for quote service payloads.

use price_audit_common::change_field;
use serde_json::{json, Map, Value};

/// Result of checking a payload against a generated schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaOutcome {
    Valid,
    Invalid(String),
}

impl SchemaOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, SchemaOutcome::Valid)
    }
}

/// Builds the JSON schema a payload must satisfy for the requested coins.
///
/// The payload must be an object with a key for every coin, and each
/// coin's value must be an object carrying a numeric `<currency>` field.
/// `<currency>_24h_change` is typed as a number but not required.
/// Repeated coins collapse to a single property and a single `required`
/// entry, keeping first-seen order.
pub fn generate_schema(coins: &[String], currency: &str) -> Value {
    let mut properties = Map::new();
    let mut required: Vec<&str> = Vec::with_capacity(coins.len());
    for coin in coins {
        if properties.contains_key(coin) {
            continue;
        }
        required.push(coin.as_str());
        properties.insert(
            coin.clone(),
            json!({
                "type": "object",
                "properties": {
                    (currency): { "type": "number" },
                    (change_field(currency)): { "type": "number" },
                },
                "required": [currency],
            }),
        );
    }

    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Checks a payload against a schema, reporting the first violation.
pub fn check_structure(schema: &Value, payload: &Value) -> SchemaOutcome {
    let validator = match jsonschema::validator_for(schema) {
        Ok(validator) => validator,
        Err(err) => return SchemaOutcome::Invalid(format!("schema could not be compiled: {err}")),
    };

    let first_error = validator.iter_errors(payload).next().map(|err| err.to_string());
    match first_error {
        None => SchemaOutcome::Valid,
        Some(message) => SchemaOutcome::Invalid(message),
    }
}
