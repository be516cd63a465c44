//! Dynamic values inspected by the value-level matchers.
//!
//! Matchers such as `to_be_one_of` or `to_be_primitive` reason about the
//! runtime kind of what they receive, so values are modelled as a closed
//! enum instead of generics. Composite values live behind `Rc<RefCell<..>>`:
//! they carry identity and may reference themselves.

use chrono::{DateTime, SecondsFormat, Utc};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared, mutable list storage
pub type ListRef = Rc<RefCell<Vec<Value>>>;

/// Shared, mutable keyed storage
pub type ObjectRef = Rc<RefCell<BTreeMap<String, Value>>>;

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

/// A unique atom; two symbols are equal only if they are the same symbol
#[derive(Debug, Clone)]
pub struct Symbol {
    id: u64,
    description: Option<String>,
}

impl Symbol {
    /// Create a fresh symbol
    #[must_use]
    pub fn new(description: Option<&str>) -> Self {
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description: description.map(str::to_string),
        }
    }

    /// Optional description
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// A callable, compared by identity
#[derive(Clone)]
pub struct Function {
    name: Rc<str>,
}

impl Function {
    /// Create a new callable handle
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self { name: name.into() }
    }

    /// Function name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity comparison
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.name, &other.name)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.name)
    }
}

/// Closed classification of a value's runtime kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// `null` or `undefined`
    Absent,
    /// `true` / `false`
    Boolean,
    /// Double-precision number, including NaN and infinities
    Number,
    /// Text
    String,
    /// Arbitrary-precision integer
    BigInteger,
    /// Unique atom
    Symbol,
    /// Function
    Callable,
    /// Ordered list
    List,
    /// Plain keyed object
    PlainObject,
    /// Class instances and built-in composites (dates, regexes)
    Other,
}

impl Kind {
    /// Whether values of this kind are primitives
    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::Absent
                | Self::Boolean
                | Self::Number
                | Self::String
                | Self::BigInteger
                | Self::Symbol
        )
    }
}

/// A dynamically typed value
#[derive(Clone)]
pub enum Value {
    /// The "not provided" sentinel
    Undefined,
    /// The "explicitly empty" sentinel
    Null,
    /// Boolean
    Bool(bool),
    /// Number
    Number(f64),
    /// Big integer
    BigInt(i128),
    /// String
    String(String),
    /// Symbol
    Symbol(Symbol),
    /// Function
    Function(Function),
    /// Ordered list
    List(ListRef),
    /// Plain object
    Object(ObjectRef),
    /// Date instant
    Date(DateTime<Utc>),
    /// Regular expression, kept as its source
    Regex(String),
    /// Instance of a named class
    Instance {
        /// Class name
        class: String,
        /// Own fields
        fields: ObjectRef,
    },
}

impl Value {
    /// Build a list value
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Self::List(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    /// Build a plain object value
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::Object(Rc::new(RefCell::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )))
    }

    /// Build a class instance
    pub fn instance<K: Into<String>>(
        class: impl Into<String>,
        fields: impl IntoIterator<Item = (K, Value)>,
    ) -> Self {
        Self::Instance {
            class: class.into(),
            fields: Rc::new(RefCell::new(
                fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            )),
        }
    }

    /// Build a fresh symbol
    #[must_use]
    pub fn symbol(description: &str) -> Self {
        Self::Symbol(Symbol::new(Some(description)))
    }

    /// Build a function handle
    #[must_use]
    pub fn function(name: &str) -> Self {
        Self::Function(Function::new(name))
    }

    /// Build a regex value from its source
    #[must_use]
    pub fn regex(source: &str) -> Self {
        Self::Regex(source.to_string())
    }

    /// Append to a list; returns false for non-lists
    pub fn push(&self, value: Value) -> bool {
        match self {
            Self::List(items) => {
                items.borrow_mut().push(value);
                true
            }
            _ => false,
        }
    }

    /// Set a key on an object or instance; returns false otherwise
    pub fn insert(&self, key: impl Into<String>, value: Value) -> bool {
        match self {
            Self::Object(map) | Self::Instance { fields: map, .. } => {
                map.borrow_mut().insert(key.into(), value);
                true
            }
            _ => false,
        }
    }

    /// Runtime kind classification
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Undefined | Self::Null => Kind::Absent,
            Self::Bool(_) => Kind::Boolean,
            Self::Number(_) => Kind::Number,
            Self::BigInt(_) => Kind::BigInteger,
            Self::String(_) => Kind::String,
            Self::Symbol(_) => Kind::Symbol,
            Self::Function(_) => Kind::Callable,
            Self::List(_) => Kind::List,
            Self::Object(_) => Kind::PlainObject,
            Self::Date(_) | Self::Regex(_) | Self::Instance { .. } => Kind::Other,
        }
    }

    /// Fine-grained type name used in failure messages
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::BigInt(_) => "bigint",
            Self::String(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Function(_) => "function",
            Self::List(_) => "array",
            Self::Object(_) => "object",
            Self::Date(_) => "Date",
            Self::Regex(_) => "RegExp",
            Self::Instance { class, .. } => class,
        }
    }

    /// Non-null composite (list, object, date, regex, instance)
    #[must_use]
    pub const fn is_composite(&self) -> bool {
        matches!(
            self,
            Self::List(_) | Self::Object(_) | Self::Date(_) | Self::Regex(_) | Self::Instance { .. }
        )
    }

    /// Numeric payload, if any
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// String payload, if any
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Date payload, if any
    #[must_use]
    pub const fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Equality rule used by `to_be_one_of`
    ///
    /// Composites compare structurally (object keys order-insensitive,
    /// `undefined` entries ignored). If either side turns out to be cyclic
    /// the comparison falls back to identity. Two NaNs are equal.
    #[must_use]
    pub fn loose_eq(&self, other: &Value) -> bool {
        if self.is_composite() && other.is_composite() {
            let mut left = Vec::new();
            let mut right = Vec::new();
            return match deep_eq(self, other, &mut left, &mut right) {
                Ok(equal) => equal,
                Err(Cycle) => self.same_identity(other),
            };
        }
        primitive_eq(self, other)
    }

    /// Reference identity for composites, value equality for primitives
    #[must_use]
    pub fn same_identity(&self, other: &Value) -> bool {
        match (self.storage_ptr(), other.storage_ptr()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => match (self, other) {
                (Self::Date(a), Self::Date(b)) => a == b,
                (Self::Regex(a), Self::Regex(b)) => a == b,
                _ => primitive_eq(self, other),
            },
            _ => false,
        }
    }

    fn storage_ptr(&self) -> Option<*const ()> {
        match self {
            Self::List(items) => Some(Rc::as_ptr(items).cast()),
            Self::Object(map) | Self::Instance { fields: map, .. } => Some(Rc::as_ptr(map).cast()),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Cycle;

fn primitive_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y || (x.is_nan() && y.is_nan()),
        (Value::BigInt(x), Value::BigInt(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Symbol(x), Value::Symbol(y)) => x == y,
        (Value::Function(x), Value::Function(y)) => x.same(y),
        _ => match (a.storage_ptr(), b.storage_ptr()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

/// Walks both values in lock-step; `left`/`right` hold the ancestor chain
/// of composite pointers on each side.
fn deep_eq(
    a: &Value,
    b: &Value,
    left: &mut Vec<*const ()>,
    right: &mut Vec<*const ()>,
) -> Result<bool, Cycle> {
    if let Some(ptr) = a.storage_ptr() {
        if left.contains(&ptr) {
            return Err(Cycle);
        }
    }
    if let Some(ptr) = b.storage_ptr() {
        if right.contains(&ptr) {
            return Err(Cycle);
        }
    }

    match (a, b) {
        (Value::List(xs), Value::List(ys)) => {
            left.push(Rc::as_ptr(xs).cast());
            right.push(Rc::as_ptr(ys).cast());
            let result = lists_eq(&xs.borrow(), &ys.borrow(), left, right);
            left.pop();
            right.pop();
            result
        }
        (Value::Object(xs), Value::Object(ys)) => {
            left.push(Rc::as_ptr(xs).cast());
            right.push(Rc::as_ptr(ys).cast());
            let result = maps_eq(&xs.borrow(), &ys.borrow(), left, right);
            left.pop();
            right.pop();
            result
        }
        (
            Value::Instance {
                class: ca,
                fields: xs,
            },
            Value::Instance {
                class: cb,
                fields: ys,
            },
        ) => {
            if ca != cb {
                return Ok(false);
            }
            left.push(Rc::as_ptr(xs).cast());
            right.push(Rc::as_ptr(ys).cast());
            let result = maps_eq(&xs.borrow(), &ys.borrow(), left, right);
            left.pop();
            right.pop();
            result
        }
        (Value::Date(x), Value::Date(y)) => Ok(x == y),
        (Value::Regex(x), Value::Regex(y)) => Ok(x == y),
        _ if a.is_composite() || b.is_composite() => Ok(false),
        _ => Ok(primitive_eq(a, b)),
    }
}

fn lists_eq(
    xs: &[Value],
    ys: &[Value],
    left: &mut Vec<*const ()>,
    right: &mut Vec<*const ()>,
) -> Result<bool, Cycle> {
    if xs.len() != ys.len() {
        return Ok(false);
    }
    for (x, y) in xs.iter().zip(ys) {
        if !deep_eq(x, y, left, right)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn maps_eq(
    xs: &BTreeMap<String, Value>,
    ys: &BTreeMap<String, Value>,
    left: &mut Vec<*const ()>,
    right: &mut Vec<*const ()>,
) -> Result<bool, Cycle> {
    let defined = |map: &BTreeMap<String, Value>| {
        map.iter()
            .filter(|(_, v)| !matches!(v, Value::Undefined))
            .count()
    };
    if defined(xs) != defined(ys) {
        return Ok(false);
    }
    for (key, x) in xs {
        if matches!(x, Value::Undefined) {
            continue;
        }
        match ys.get(key) {
            Some(y) if !matches!(y, Value::Undefined) => {
                if !deep_eq(x, y, left, right)? {
                    return Ok(false);
                }
            }
            _ => return Ok(false),
        }
    }
    Ok(true)
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{n}")
    }
}

impl Value {
    fn render(&self, f: &mut fmt::Formatter<'_>, seen: &mut Vec<*const ()>) -> fmt::Result {
        if let Some(ptr) = self.storage_ptr() {
            if seen.contains(&ptr) {
                return write!(f, "[Circular]");
            }
            seen.push(ptr);
        }
        let result = match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{}", format_number(*n)),
            Self::BigInt(n) => write!(f, "{n}n"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Symbol(s) => write!(f, "Symbol({})", s.description().unwrap_or_default()),
            Self::Function(func) => write!(f, "[Function {}]", func.name()),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.render(f, seen)?;
                }
                write!(f, "]")
            }
            Self::Object(map) => render_map(f, &map.borrow(), seen),
            Self::Instance { class, fields } => {
                write!(f, "{class} ")?;
                render_map(f, &fields.borrow(), seen)
            }
            Self::Date(d) => write!(f, "{}", d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Self::Regex(src) => write!(f, "/{src}/"),
        };
        if self.storage_ptr().is_some() {
            seen.pop();
        }
        result
    }
}

fn render_map(
    f: &mut fmt::Formatter<'_>,
    map: &BTreeMap<String, Value>,
    seen: &mut Vec<*const ()>,
) -> fmt::Result {
    if map.is_empty() {
        return write!(f, "{{}}");
    }
    write!(f, "{{")?;
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, " {key}: ")?;
        value.render(f, seen)?;
    }
    write!(f, " }}")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, &mut Vec::new())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i128> for Value {
    fn from(n: i128) -> Self {
        Self::BigInt(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(d)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::list(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => Self::list(items.into_iter().map(Self::from)),
            serde_json::Value::Object(map) => {
                Self::object(map.into_iter().map(|(k, v)| (k, Self::from(v))))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    mod classification {
        use super::*;

        #[test]
        fn test_kinds() {
            assert_eq!(Value::Null.kind(), Kind::Absent);
            assert_eq!(Value::Undefined.kind(), Kind::Absent);
            assert_eq!(Value::from(1.5).kind(), Kind::Number);
            assert_eq!(Value::BigInt(10).kind(), Kind::BigInteger);
            assert_eq!(Value::function("f").kind(), Kind::Callable);
            assert_eq!(Value::list([]).kind(), Kind::List);
            assert_eq!(Value::object::<&str>([]).kind(), Kind::PlainObject);
            assert_eq!(Value::regex("a+").kind(), Kind::Other);
            assert_eq!(Value::Date(Utc::now()).kind(), Kind::Other);
        }

        #[test]
        fn test_primitive_kinds() {
            assert!(Kind::Symbol.is_primitive());
            assert!(Kind::Absent.is_primitive());
            assert!(!Kind::Callable.is_primitive());
            assert!(!Kind::List.is_primitive());
        }

        #[test]
        fn test_type_name_of_instance_is_class() {
            let v = Value::instance("Point", [("x", Value::from(1))]);
            assert_eq!(v.type_name(), "Point");
        }
    }

    mod loose_eq {
        use super::*;

        #[test]
        fn test_nan_equals_nan() {
            assert!(Value::from(f64::NAN).loose_eq(&Value::from(f64::NAN)));
        }

        #[test]
        fn test_null_is_not_undefined() {
            assert!(!Value::Null.loose_eq(&Value::Undefined));
        }

        #[test]
        fn test_objects_ignore_key_order() {
            let a = Value::from(json!({"a": 1, "b": [1, 2]}));
            let b = Value::object([
                ("b", Value::list([Value::from(1), Value::from(2)])),
                ("a", Value::from(1)),
            ]);
            assert!(a.loose_eq(&b));
        }

        #[test]
        fn test_undefined_entries_are_ignored() {
            let a = Value::object([("a", Value::from(1)), ("b", Value::Undefined)]);
            let b = Value::object([("a", Value::from(1))]);
            assert!(a.loose_eq(&b));
        }

        #[test]
        fn test_list_order_matters() {
            let a = Value::from(json!([1, 2]));
            let b = Value::from(json!([2, 1]));
            assert!(!a.loose_eq(&b));
        }

        #[test]
        fn test_symbols_by_identity() {
            let s = Value::symbol("x");
            assert!(s.loose_eq(&s.clone()));
            assert!(!s.loose_eq(&Value::symbol("x")));
        }

        #[test]
        fn test_functions_by_identity() {
            let f = Value::function("handler");
            assert!(f.loose_eq(&f.clone()));
            assert!(!f.loose_eq(&Value::function("handler")));
        }

        #[test]
        fn test_cycle_falls_back_to_identity() {
            let a = Value::object([("name", Value::from("a"))]);
            a.insert("me", a.clone());
            let b = Value::object([("name", Value::from("a"))]);
            b.insert("me", b.clone());

            assert!(a.loose_eq(&a.clone()));
            assert!(!a.loose_eq(&b));
        }

        #[test]
        fn test_instances_compare_class_and_fields() {
            let a = Value::instance("Point", [("x", Value::from(1))]);
            let b = Value::instance("Point", [("x", Value::from(1))]);
            let c = Value::instance("Vec2", [("x", Value::from(1))]);
            assert!(a.loose_eq(&b));
            assert!(!a.loose_eq(&c));
        }

        #[test]
        fn test_composite_vs_primitive() {
            assert!(!Value::list([]).loose_eq(&Value::from("")));
        }
    }

    mod display {
        use super::*;

        #[test]
        fn test_render_composites() {
            let v = Value::from(json!({"a": [1, "x"], "b": null}));
            assert_eq!(v.to_string(), r#"{ a: [1, "x"], b: null }"#);
        }

        #[test]
        fn test_render_numbers() {
            assert_eq!(Value::from(42.0).to_string(), "42");
            assert_eq!(Value::from(f64::NAN).to_string(), "NaN");
            assert_eq!(Value::from(f64::NEG_INFINITY).to_string(), "-Infinity");
            assert_eq!(Value::BigInt(7).to_string(), "7n");
        }

        #[test]
        fn test_render_cycle() {
            let list = Value::list([Value::from(1)]);
            list.push(list.clone());
            assert_eq!(list.to_string(), "[1, [Circular]]");
        }
    }
}
