//! Composite conversions: arrays, objects and tables
//!
//! Host arrays become tables keyed `1..=n`; host objects become string-keyed
//! tables. Going the other way a table has no tag, so its keys decide:
//!
//! - keys exactly `1..=n` (integral numbers, no holes) → array;
//! - anything else → object. Numeric keys are written as decimal text,
//!   string keys are used as-is, and keys of any other type are dropped.
//!
//! Two keys can name the same field, e.g. `[1]` and `["1"]`. The string key
//! wins whatever the traversal order; if two numeric keys collide the first
//! one seen is kept. Every dropped entry is logged at `warn`.
//!
//! An empty table is an empty array. Lua tables cannot hold nil, so a host
//! array with `Null` elements has holes once in Lua and comes back as an
//! object.

use super::{primitive, Marshaller};
use crate::value::HostValue;
use mlua::{Lua, Table, Value};
use std::collections::HashMap;
use tracing::warn;

/// How a table's keys classify it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableShape {
    /// Keys are exactly `1..=len`
    Array { len: usize },
    /// Anything else
    Object,
}

/// Classify a set of table keys.
///
/// Lua normalizes integral float keys to integers and keys are unique, so
/// `n` distinct indices all within `1..=n` cover the range exactly.
pub fn classify_keys<'a, I>(keys: I) -> TableShape
where
    I: IntoIterator<Item = &'a Value>,
{
    let indices: Option<Vec<usize>> = keys.into_iter().map(array_index).collect();
    match indices {
        Some(indices) if indices.iter().all(|&i| i <= indices.len()) => TableShape::Array {
            len: indices.len(),
        },
        _ => TableShape::Object,
    }
}

/// 1-based index for a positive integral numeric key
fn array_index(key: &Value) -> Option<usize> {
    match key {
        Value::Integer(i) if *i >= 1 => usize::try_from(*i).ok(),
        Value::Number(n) if *n >= 1.0 && n.fract() == 0.0 && *n <= usize::MAX as f64 => {
            Some(*n as usize)
        }
        _ => None,
    }
}

/// Object field name for a table key, or `None` when the key type cannot name
/// a field.
fn field_name(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.to_string_lossy().to_string()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Number(n) => Some(primitive::number_key_name(*n)),
        _ => None,
    }
}

impl Marshaller {
    /// Host array → table with keys `1..=n`
    pub(crate) fn array_to_table(&self, lua: &Lua, items: &[HostValue]) -> mlua::Result<Table> {
        let table = lua.create_table_with_capacity(items.len(), 0)?;
        for (index, item) in items.iter().enumerate() {
            let value = self.to_script(lua, item)?;
            table.raw_set(index + 1, value)?;
        }
        Ok(table)
    }

    /// Host object → string-keyed table
    pub(crate) fn object_to_table(
        &self,
        lua: &Lua,
        fields: &HashMap<String, HostValue>,
    ) -> mlua::Result<Table> {
        let table = lua.create_table_with_capacity(0, fields.len())?;
        for (name, field) in fields {
            let value = self.to_script(lua, field)?;
            table.raw_set(name.as_str(), value)?;
        }
        Ok(table)
    }

    /// Table → host array or object
    pub(crate) fn table_to_host(&self, table: &Table) -> mlua::Result<HostValue> {
        let mut pairs = Vec::new();
        for pair in table.pairs::<Value, Value>() {
            pairs.push(pair?);
        }

        match classify_keys(pairs.iter().map(|(key, _)| key)) {
            TableShape::Array { len } => {
                let mut items = vec![HostValue::Null; len];
                for (key, value) in &pairs {
                    if let Some(index) = array_index(key) {
                        items[index - 1] = self.to_host(value)?;
                    }
                }
                Ok(HostValue::Array(items))
            }
            TableShape::Object => {
                // field name -> (value, named by a string key)
                let mut fields: HashMap<String, (HostValue, bool)> =
                    HashMap::with_capacity(pairs.len());
                for (key, value) in &pairs {
                    let Some(name) = field_name(key) else {
                        warn!(
                            key_type = key.type_name(),
                            "table key cannot name an object field; dropping entry"
                        );
                        continue;
                    };

                    let from_string = matches!(key, Value::String(_));
                    let kept_string = fields.get(&name).map(|(_, kept)| *kept);
                    match kept_string {
                        Some(kept) if kept || !from_string => {
                            warn!(
                                field = %name,
                                key_type = key.type_name(),
                                "table keys collide on an object field; dropping entry"
                            );
                        }
                        Some(_) => {
                            warn!(
                                field = %name,
                                "table keys collide on an object field; string key replaces numeric key"
                            );
                            fields.insert(name, (self.to_host(value)?, true));
                        }
                        None => {
                            fields.insert(name, (self.to_host(value)?, from_string));
                        }
                    }
                }
                Ok(HostValue::Object(
                    fields
                        .into_iter()
                        .map(|(name, (value, _))| (name, value))
                        .collect(),
                ))
            }
        }
    }
}
