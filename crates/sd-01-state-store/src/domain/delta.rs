//! # Delta Arithmetic
//!
//! Applies one `Delta` to one state record. The schema (the module's
//! declared template) decides which keys exist and whether a key is a
//! numeric field or a map of numeric fields.

use serde_json::{Map, Value};
use shared_types::{Amount, Delta, DeltaOp};

use super::StateError;

/// Apply `delta` to `record` in place.
///
/// `record` must be a JSON object. On error `record` may be partially
/// modified; callers always work on a private copy.
pub fn apply_delta(record: &mut Value, schema: &Value, delta: &Delta) -> Result<(), StateError> {
    let path = delta.path();

    if delta.amount < 0 {
        return Err(StateError::NegativeAmount {
            path,
            amount: delta.amount,
        });
    }

    let Some(field_schema) = schema.get(&delta.key) else {
        return Err(StateError::UnknownKey { path });
    };

    let Some(fields) = record.as_object_mut() else {
        return Err(StateError::NotAMap { path });
    };

    match &delta.subkey {
        None => {
            if !field_schema.is_i64() {
                return Err(StateError::NotNumeric { path });
            }
            let slot = fields
                .entry(delta.key.clone())
                .or_insert_with(|| field_schema.clone());
            let current = slot
                .as_i64()
                .ok_or_else(|| StateError::NotNumeric { path: path.clone() })?;
            *slot = Value::from(combine(current, delta.op, delta.amount, path)?);
        }
        Some(subkey) => {
            if !field_schema.is_object() {
                return Err(StateError::NotAMap { path });
            }
            let slot = fields
                .entry(delta.key.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            let entries = slot
                .as_object_mut()
                .ok_or_else(|| StateError::NotAMap { path: path.clone() })?;
            let current = match entries.get(subkey) {
                None => 0,
                Some(value) => value
                    .as_i64()
                    .ok_or_else(|| StateError::NotNumeric { path: path.clone() })?,
            };
            let next = combine(current, delta.op, delta.amount, path)?;
            entries.insert(subkey.clone(), Value::from(next));
        }
    }

    Ok(())
}

fn combine(current: Amount, op: DeltaOp, amount: Amount, path: String) -> Result<Amount, StateError> {
    match op {
        DeltaOp::Add => current
            .checked_add(amount)
            .ok_or(StateError::Overflow { path }),
        DeltaOp::Subtract => {
            if current < amount {
                return Err(StateError::Underflow {
                    path,
                    required: amount,
                    available: current,
                });
            }
            Ok(current - amount)
        }
    }
}
