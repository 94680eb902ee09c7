//! Property access and the built-in array and string methods.

use crate::error::{range_error, type_error, EngineError, Flow};
use crate::value::{ArrayRef, ReadOnlyView, Value};
use smol_str::SmolStr;
use source_map::Span;
use uiml_script::coerce::number_to_string;

/// Converts a value to the string used as a property key.
pub(crate) fn to_property_key(value: &Value) -> SmolStr {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => SmolStr::from(number_to_string(*n)),
        other => SmolStr::from(other.to_string()),
    }
}

/// Parses a canonical array index such as `0` or `12` (not `01`).
fn array_index(key: &str) -> Option<usize> {
    let index: usize = key.parse().ok()?;
    (index.to_string() == key).then_some(index)
}

/// Arrays never grow past this many slots.
pub const MAX_ARRAY_LENGTH: usize = 1 << 24;

fn utf16(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

pub(crate) fn get_member(object: &Value, key: &str) -> Flow<Value> {
    let value = match object {
        Value::Undefined | Value::Null => {
            return Err(type_error(format!("cannot read properties of {object} (reading '{key}')")));
        }
        Value::Object(entries) => entries.borrow().get(key).cloned().unwrap_or(Value::Undefined),
        Value::Array(items) => {
            let items = items.borrow();
            if key == "length" {
                Value::Number(items.len() as f64)
            } else {
                array_index(key)
                    .and_then(|index| items.get(index).cloned())
                    .unwrap_or(Value::Undefined)
            }
        }
        Value::String(s) => {
            let units = utf16(s);
            if key == "length" {
                Value::Number(units.len() as f64)
            } else {
                array_index(key)
                    .and_then(|index| units.get(index))
                    .map(|unit| Value::from(String::from_utf16_lossy(&[*unit])))
                    .unwrap_or(Value::Undefined)
            }
        }
        Value::ReadOnly(view) => {
            let child = get_member(view.target(), key)?;
            view.child(key, child)
        }
        _ => Value::Undefined,
    };
    Ok(value)
}

pub(crate) fn set_member(object: &Value, key: &str, value: Value, span: Span) -> Flow<()> {
    match object {
        Value::Undefined | Value::Null => {
            return Err(type_error(format!("cannot set properties of {object} (setting '{key}')")));
        }
        Value::ReadOnly(view) => {
            return Err(EngineError::ReadOnly {
                path: view.child_path(key),
                span,
            }
            .into());
        }
        Value::Object(entries) => {
            entries.borrow_mut().insert(SmolStr::new(key), value);
        }
        Value::Array(items) => {
            let mut items = items.borrow_mut();
            if key == "length" {
                let length = value.to_number();
                if length < 0.0 || length.fract() != 0.0 || length > MAX_ARRAY_LENGTH as f64 {
                    return Err(range_error("invalid array length"));
                }
                items.resize(length as usize, Value::Undefined);
            } else if let Some(index) = array_index(key) {
                if index >= MAX_ARRAY_LENGTH {
                    return Err(range_error(format!("array index {index} out of range")));
                }
                if index >= items.len() {
                    items.resize(index + 1, Value::Undefined);
                }
                items[index] = value;
            }
        }
        _ => {}
    }
    Ok(())
}

/// `delete object[key]`; array slots become holes.
pub(crate) fn delete_member(object: &Value, key: &str, span: Span) -> Flow<bool> {
    match object {
        Value::Undefined | Value::Null => Err(type_error(format!("cannot delete property '{key}' of {object}"))),
        Value::ReadOnly(view) => Err(EngineError::ReadOnly {
            path: view.child_path(key),
            span,
        }
        .into()),
        Value::Object(entries) => {
            entries.borrow_mut().shift_remove(key);
            Ok(true)
        }
        Value::Array(items) => {
            let mut items = items.borrow_mut();
            if let Some(index) = array_index(key) {
                if let Some(slot) = items.get_mut(index) {
                    *slot = Value::Undefined;
                }
            }
            Ok(true)
        }
        _ => Ok(true),
    }
}

/// `key in object`
pub(crate) fn has_property(object: &Value, key: &str) -> Flow<bool> {
    match object.unwrapped() {
        Value::Object(entries) => Ok(entries.borrow().contains_key(key)),
        Value::Array(items) => Ok(key == "length" || array_index(key).is_some_and(|index| index < items.borrow().len())),
        other => Err(type_error(format!(
            "cannot use 'in' operator to search for '{key}' in {other}"
        ))),
    }
}

/// The values a `for..of` loop or a spread visits; `None` if not iterable.
pub(crate) fn iterate(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items.borrow().clone()),
        Value::String(s) => Some(s.chars().map(|c| Value::from(c.to_string())).collect()),
        Value::ReadOnly(view) => {
            let Value::Array(items) = view.target() else {
                return None;
            };
            let items = items.borrow();
            Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| view.child(&index.to_string(), item.clone()))
                    .collect(),
            )
        }
        _ => None,
    }
}

/// The keys a `for..in` loop visits.
pub(crate) fn enumerate_keys(value: &Value) -> Vec<Value> {
    match value.unwrapped() {
        Value::Object(entries) => entries.borrow().keys().map(|key| Value::String(key.clone())).collect(),
        Value::Array(items) => (0..items.borrow().len()).map(|i| Value::from(i.to_string())).collect(),
        Value::String(s) => (0..utf16(s).len()).map(|i| Value::from(i.to_string())).collect(),
        _ => Vec::new(),
    }
}

/// The own entries copied by object spread.
pub(crate) fn entries(value: &Value) -> Vec<(SmolStr, Value)> {
    match value {
        Value::Object(entries) => entries.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        Value::ReadOnly(view) => entries(view.target())
            .into_iter()
            .map(|(key, item)| {
                let item = view.child(&key, item);
                (key, item)
            })
            .collect(),
        Value::Array(_) | Value::String(_) => iterate(value)
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, item)| (SmolStr::from(index.to_string()), item))
            .collect(),
        _ => Vec::new(),
    }
}

/// Globals every script sees unless the host shadows them.
pub(crate) fn builtin_global(name: &str) -> Option<Value> {
    let value = match name {
        "NaN" => Value::Number(f64::NAN),
        "Infinity" => Value::Number(f64::INFINITY),
        "Error" | "TypeError" | "RangeError" => {
            let kind = SmolStr::new(name);
            Value::native(name, move |args| {
                let message = args.first().map(Value::to_string).unwrap_or_default();
                Ok(Value::error(&kind, message))
            })
        }
        _ => return None,
    };
    Some(value)
}

const ARRAY_METHODS: &[&str] = &["push", "pop", "shift", "includes", "indexOf", "join", "slice"];
const STRING_METHODS: &[&str] = &[
    "toUpperCase",
    "toLowerCase",
    "trim",
    "includes",
    "indexOf",
    "startsWith",
    "endsWith",
    "slice",
];

/// Returns true if `receiver.name(...)` is a built-in method call.
pub(crate) fn has_intrinsic(receiver: &Value, name: &str) -> bool {
    match receiver.unwrapped() {
        Value::Array(_) => ARRAY_METHODS.contains(&name),
        Value::String(_) => STRING_METHODS.contains(&name),
        _ => false,
    }
}

/// Calls a built-in method; `None` when `receiver` has no such method.
pub(crate) fn call_intrinsic(receiver: &Value, name: &str, args: &[Value], span: Span) -> Flow<Option<Value>> {
    match receiver {
        Value::Array(items) => array_method(items, name, args, None, span),
        Value::ReadOnly(view) => match view.target() {
            Value::Array(items) => array_method(items, name, args, Some(view), span),
            _ => Ok(None),
        },
        Value::String(s) => Ok(string_method(s, name, args)),
        _ => Ok(None),
    }
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

/// Resolves a `slice`-style position against `len`.
fn relative_index(value: &Value, len: usize, default: usize) -> usize {
    if matches!(value, Value::Undefined) {
        return default;
    }
    let n = value.to_number();
    let n = if n.is_nan() { 0.0 } else { n.trunc() };
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

fn array_method(
    items: &ArrayRef,
    name: &str,
    args: &[Value],
    view: Option<&ReadOnlyView>,
    span: Span,
) -> Flow<Option<Value>> {
    if let (Some(view), "push" | "pop" | "shift") = (view, name) {
        return Err(EngineError::ReadOnly {
            path: view.path().to_string(),
            span,
        }
        .into());
    }
    let wrap = |index: usize, item: Value| match view {
        Some(view) => view.child(&index.to_string(), item),
        None => item,
    };

    let result = match name {
        "push" => {
            let mut items = items.borrow_mut();
            items.extend(args.iter().cloned());
            Value::Number(items.len() as f64)
        }
        "pop" => items.borrow_mut().pop().unwrap_or(Value::Undefined),
        "shift" => {
            let mut items = items.borrow_mut();
            if items.is_empty() {
                Value::Undefined
            } else {
                items.remove(0)
            }
        }
        "includes" => {
            let needle = arg(args, 0);
            Value::Bool(items.borrow().iter().any(|item| item.same_value_zero(&needle)))
        }
        "indexOf" => {
            let needle = arg(args, 0);
            let position = items.borrow().iter().position(|item| item.strict_equals(&needle));
            Value::Number(position.map_or(-1.0, |index| index as f64))
        }
        "join" => {
            let separator = match arg(args, 0) {
                Value::Undefined => ",".to_string(),
                other => other.to_string(),
            };
            let parts: Vec<String> = items
                .borrow()
                .iter()
                .map(|item| if item.is_nullish() { String::new() } else { item.to_string() })
                .collect();
            Value::from(parts.join(&separator))
        }
        "slice" => {
            let items = items.borrow();
            let start = relative_index(&arg(args, 0), items.len(), 0);
            let end = relative_index(&arg(args, 1), items.len(), items.len());
            let sliced = (start..end.max(start))
                .map(|index| wrap(index, items[index].clone()))
                .collect();
            Value::array(sliced)
        }
        _ => return Ok(None),
    };
    Ok(Some(result))
}

fn string_method(s: &str, name: &str, args: &[Value]) -> Option<Value> {
    let needle = || arg(args, 0).to_string();
    let result = match name {
        "toUpperCase" => Value::from(s.to_uppercase()),
        "toLowerCase" => Value::from(s.to_lowercase()),
        "trim" => Value::from(s.trim()),
        "includes" => Value::Bool(s.contains(needle().as_str())),
        "startsWith" => Value::Bool(s.starts_with(needle().as_str())),
        "endsWith" => Value::Bool(s.ends_with(needle().as_str())),
        "indexOf" => {
            let haystack = utf16(s);
            let needle = utf16(&needle());
            let position = if needle.is_empty() {
                Some(0)
            } else {
                haystack.windows(needle.len()).position(|window| window == needle.as_slice())
            };
            Value::Number(position.map_or(-1.0, |index| index as f64))
        }
        "slice" => {
            let units = utf16(s);
            let start = relative_index(&arg(args, 0), units.len(), 0);
            let end = relative_index(&arg(args, 1), units.len(), units.len());
            Value::from(String::from_utf16_lossy(&units[start..end.max(start)]))
        }
        _ => return None,
    };
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn numbers(values: &[f64]) -> Value {
        Value::array(values.iter().copied().map(Value::Number).collect())
    }

    fn call(receiver: &Value, name: &str, args: &[Value]) -> Value {
        call_intrinsic(receiver, name, args, Span::default()).unwrap().unwrap()
    }

    #[test]
    fn test_array_methods() {
        let array = numbers(&[1.0, 2.0, 3.0]);
        assert_eq!(call(&array, "push", &[Value::Number(4.0)]), Value::Number(4.0));
        assert_eq!(call(&array, "shift", &[]), Value::Number(1.0));
        assert_eq!(call(&array, "indexOf", &[Value::Number(3.0)]), Value::Number(1.0));
        assert_eq!(call(&array, "join", &[Value::from("-")]), Value::from("2-3-4"));
        assert_eq!(call(&array, "slice", &[Value::Number(-2.0)]).to_string(), "3,4");
        assert_eq!(call(&array, "includes", &[Value::from("2")]), Value::Bool(false));
        assert_eq!(get_member(&array, "length").unwrap(), Value::Number(3.0));
    }

    #[test]
    fn test_string_methods() {
        let s = Value::from("  Hello  ");
        assert_eq!(call(&s, "trim", &[]), Value::from("Hello"));
        let s = Value::from("Hello");
        assert_eq!(call(&s, "toUpperCase", &[]), Value::from("HELLO"));
        assert_eq!(call(&s, "indexOf", &[Value::from("l")]), Value::Number(2.0));
        assert_eq!(call(&s, "slice", &[Value::Number(1.0), Value::Number(-1.0)]), Value::from("ell"));
        assert_eq!(call(&s, "startsWith", &[Value::from("He")]), Value::Bool(true));
        assert_eq!(get_member(&s, "length").unwrap(), Value::Number(5.0));
        assert!(call_intrinsic(&s, "nope", &[], Span::default()).unwrap().is_none());
    }

    #[test]
    fn test_views_protect_nested_values() {
        let inner = numbers(&[1.0]);
        let outer = Value::array(vec![inner]);
        let view = ReadOnlyView::wrap(outer, "state");
        let nested = get_member(&view, "0").unwrap();
        let Value::ReadOnly(nested_view) = &nested else {
            panic!("expected a nested view");
        };
        assert_eq!(nested_view.path(), "state[0]");

        let error = set_member(&nested, "0", Value::Null, Span::default()).unwrap_err();
        assert!(matches!(error, crate::error::Fault::Fatal(EngineError::ReadOnly { ref path, .. }) if path == "state[0][0]"));
        let error = call_intrinsic(&nested, "push", &[], Span::default()).unwrap_err();
        assert!(matches!(error, crate::error::Fault::Fatal(EngineError::ReadOnly { .. })));
        assert_eq!(call(&nested, "includes", &[Value::Number(1.0)]), Value::Bool(true));
    }

    #[test]
    fn test_member_access_on_null_throws() {
        assert!(matches!(get_member(&Value::Null, "x"), Err(crate::error::Fault::Throw(_))));
        assert_eq!(enumerate_keys(&Value::Undefined), Vec::<Value>::new());
        assert!(iterate(&Value::Number(1.0)).is_none());
    }
}
