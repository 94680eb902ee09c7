//! Runtime values.

use crate::scope::BlockRef;
use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use smol_str::SmolStr;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use uiml_script::coerce::{number_to_string, string_to_number};
use uiml_script::{ArrowFunction, LiteralValue};

/// Shared, mutable array storage.
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;

/// Shared, mutable object storage; keys keep insertion order.
pub type ObjectRef = Rc<RefCell<IndexMap<SmolStr, Value>>>;

/// The result of a host function; `Err` is thrown into the script.
pub type NativeResult = Result<Value, Value>;

/// A script value.
#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    BigInt(BigInt),
    String(SmolStr),
    Array(ArrayRef),
    Object(ObjectRef),
    /// A script function together with the block chain it closes over.
    Function(Rc<Closure>),
    /// A function supplied by the host.
    Native(Rc<NativeFunction>),
    /// A read-only window onto an array or object.
    ReadOnly(ReadOnlyView),
}

impl Value {
    /// Creates a value from a parsed literal.
    pub fn from_literal(literal: &LiteralValue) -> Self {
        match literal {
            LiteralValue::Undefined => Value::Undefined,
            LiteralValue::Null => Value::Null,
            LiteralValue::Boolean(b) => Value::Bool(*b),
            LiteralValue::Number(n) => Value::Number(*n),
            LiteralValue::BigInt(b) => Value::BigInt(b.clone()),
            LiteralValue::String(s) => Value::String(SmolStr::new(s)),
        }
    }

    /// Creates a new array.
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    /// Creates a new object.
    pub fn object(entries: IndexMap<SmolStr, Value>) -> Self {
        Value::Object(Rc::new(RefCell::new(entries)))
    }

    /// Wraps a host closure as a callable value.
    pub fn native(name: &str, func: impl Fn(&[Value]) -> NativeResult + 'static) -> Self {
        Value::Native(Rc::new(NativeFunction {
            name: SmolStr::new(name),
            func: Box::new(func),
        }))
    }

    /// Creates an error object such as the ones thrown for type errors.
    pub fn error(name: &str, message: impl Into<String>) -> Self {
        let mut entries = IndexMap::new();
        entries.insert(SmolStr::new_static("name"), Value::from(name));
        entries.insert(SmolStr::new_static("message"), Value::from(message.into()));
        Value::object(entries)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Native(_))
    }

    /// Script truthiness.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::BigInt(b) => !b.is_zero(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// The result of `typeof`.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::String(_) => "string",
            Value::Function(_) | Value::Native(_) => "function",
            Value::Null | Value::Array(_) | Value::Object(_) | Value::ReadOnly(_) => "object",
        }
    }

    /// Numeric conversion; bigints convert lossily.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::BigInt(b) => b.to_f64().unwrap_or(f64::NAN),
            Value::String(s) => string_to_number(s),
            _ => string_to_number(&self.to_display_string()),
        }
    }

    /// String conversion, as used by concatenation and templates.
    pub fn to_display_string(&self) -> String {
        self.to_string()
    }

    /// `===`
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => self.same_reference(other),
        }
    }

    /// `==`
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
            (Value::Number(a), Value::String(_)) => *a == other.to_number(),
            (Value::String(_), Value::Number(b)) => self.to_number() == *b,
            (Value::BigInt(a), Value::Number(b)) | (Value::Number(b), Value::BigInt(a)) => {
                a.to_f64().is_some_and(|a| a == *b)
            }
            (Value::BigInt(a), Value::String(s)) | (Value::String(s), Value::BigInt(a)) => {
                s.trim().parse::<BigInt>().is_ok_and(|b| &b == a)
            }
            (Value::Bool(_), _) => Value::Number(self.to_number()).loose_equals(other),
            (_, Value::Bool(_)) => self.loose_equals(&Value::Number(other.to_number())),
            (a, b) if a.is_composite() && !b.is_composite() => Value::from(a.to_string()).loose_equals(b),
            (a, b) if !a.is_composite() && b.is_composite() => a.loose_equals(&Value::from(b.to_string())),
            _ => self.strict_equals(other),
        }
    }

    /// Equality used by `includes`: like `===` but `NaN` equals itself.
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan() => true,
            _ => self.strict_equals(other),
        }
    }

    fn is_composite(&self) -> bool {
        matches!(
            self,
            Value::Array(_) | Value::Object(_) | Value::Function(_) | Value::Native(_) | Value::ReadOnly(_)
        )
    }

    /// Reference identity; a view is identical to the value it wraps.
    fn same_reference(&self, other: &Value) -> bool {
        match (self.unwrapped(), other.unwrapped()) {
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// The wrapped value for views, `self` otherwise.
    pub fn unwrapped(&self) -> &Value {
        match self {
            Value::ReadOnly(view) => view.target(),
            other => other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&number_to_string(*n)),
            Value::BigInt(b) => write!(f, "{b}"),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if !item.is_nullish() {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            Value::Object(_) => f.write_str("[object Object]"),
            Value::Function(closure) => write!(f, "function {}() {{ ... }}", closure.name()),
            Value::Native(native) => write!(f, "function {}() {{ [native code] }}", native.name),
            Value::ReadOnly(view) => write!(f, "{}", view.target),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s:?}"),
            Value::Array(items) => f.debug_list().entries(items.borrow().iter()).finish(),
            Value::Object(entries) => f.debug_map().entries(entries.borrow().iter()).finish(),
            Value::ReadOnly(view) => write!(f, "ReadOnly({}: {:?})", view.path, view.target),
            other => write!(f, "{other}"),
        }
    }
}

/// Identity for references, value equality for primitives.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::ReadOnly(a), Value::ReadOnly(b)) => a.path == b.path && a.target.strict_equals(&b.target),
            _ => self.strict_equals(other),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(SmolStr::new(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(SmolStr::from(s))
    }
}

/// A script function value.
pub struct Closure {
    pub(crate) function: Arc<ArrowFunction>,
    pub(crate) scope: BlockRef,
}

impl Closure {
    pub fn name(&self) -> &str {
        self.function.name.as_deref().unwrap_or("")
    }
}

/// A host function callable from scripts.
pub struct NativeFunction {
    name: SmolStr,
    func: Box<dyn Fn(&[Value]) -> NativeResult>,
}

impl NativeFunction {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn call(&self, args: &[Value]) -> NativeResult {
        (self.func)(args)
    }
}

/// A read-only wrapper that remembers how it was reached.
///
/// Reading through a view returns the raw primitive or a fresh view of the
/// nested array/object, so every level stays protected.
#[derive(Clone)]
pub struct ReadOnlyView {
    target: Rc<Value>,
    path: Rc<str>,
}

impl ReadOnlyView {
    /// Wraps arrays and objects; other values are returned unchanged.
    pub fn wrap(value: Value, path: &str) -> Value {
        match value {
            Value::Array(_) | Value::Object(_) => Value::ReadOnly(ReadOnlyView {
                target: Rc::new(value),
                path: Rc::from(path),
            }),
            other => other,
        }
    }

    /// The access path, e.g. `appState.items[0].name`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn target(&self) -> &Value {
        &self.target
    }

    pub(crate) fn child_path(&self, key: &str) -> String {
        if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) {
            format!("{}[{key}]", self.path)
        } else {
            format!("{}.{key}", self.path)
        }
    }

    /// Wraps a value read from `key`.
    pub(crate) fn child(&self, key: &str, value: Value) -> Value {
        match value {
            Value::Array(_) | Value::Object(_) => ReadOnlyView::wrap(value, &self.child_path(key)),
            other => other,
        }
    }
}
