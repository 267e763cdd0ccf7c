//! Tagged runtime values.
//!
//! [`Value`] is the single currency of the engine: constants interned at
//! compile time, scope bindings, call arguments and render results are all
//! values. Cloning is cheap — strings, maps and functions are reference
//! counted.

use crate::function::Function;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    /// The canonical "no value" result. Every recoverable lookup or
    /// invocation failure resolves to this variant.
    Void,
    /// Boolean.
    Boolean(bool),
    /// Numeric value (IEEE 754 double).
    Number(f64),
    /// Immutable string.
    String(Arc<str>),
    /// Ordered key→value map.
    Map(MapValue),
    /// Callable value.
    Function(Arc<dyn Function>),
}

impl Value {
    /// Create a string value.
    pub fn string(text: impl Into<Arc<str>>) -> Self {
        Value::String(text.into())
    }

    /// Create a number value.
    #[inline]
    pub fn number(value: f64) -> Self {
        Value::Number(value)
    }

    /// Create a boolean value.
    #[inline]
    pub fn boolean(value: bool) -> Self {
        Value::Boolean(value)
    }

    /// Create a map value from ordered pairs.
    pub fn map(pairs: Vec<(Value, Value)>) -> Self {
        Value::Map(MapValue::from_pairs(pairs))
    }

    /// Create a callable value.
    pub fn function(function: impl Function + 'static) -> Self {
        Value::Function(Arc::new(function))
    }

    /// Check for the void variant.
    #[inline]
    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    /// Boolean coercion used by `if` and `while` conditions.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Void => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Map(m) => !m.is_empty(),
            Value::Function(_) => true,
        }
    }

    /// Display conversion used by `echo`.
    ///
    /// Void, maps and functions have no textual form and convert to the
    /// empty string; numbers print without a trailing `.0`.
    pub fn to_display(&self) -> String {
        match self {
            Value::Void | Value::Map(_) | Value::Function(_) => String::new(),
            Value::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.to_string(),
        }
    }

    /// Look up a key in the value's map view.
    ///
    /// Returns `None` for non-map values and for missing keys; the caller
    /// decides what the fallback is (the compiled unit uses void).
    pub fn field(&self, key: &Value) -> Option<Value> {
        match self {
            Value::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// The value's ordered map view, if it has one.
    pub fn fields(&self) -> Option<&MapValue> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// The value's callable view, if it has one.
    pub fn as_function(&self) -> Option<&Arc<dyn Function>> {
        match self {
            Value::Function(function) => Some(function),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    /// Raw representation used by `dump`: distinguishes kinds that display
    /// conversion erases (quoted strings, `<void>`, bracketed maps).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => f.write_str("<void>"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Map(map) => {
                f.write_str("[")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}: {:?}", key, value)?;
                }
                f.write_str("]")
            }
            Value::Function(function) => write!(f, "<function {}>", function.name()),
        }
    }
}

// =============================================================================
// Map Values
// =============================================================================

/// Hashable projection of scalar values, used to index map keys.
///
/// Floats hash by bit pattern; map- and function-typed keys are not indexed
/// and fall back to a linear scan on lookup.
#[derive(Clone, PartialEq, Eq, Hash)]
enum ValueKey {
    Void,
    Boolean(bool),
    Number(u64),
    String(Arc<str>),
}

impl ValueKey {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Void => Some(ValueKey::Void),
            Value::Boolean(b) => Some(ValueKey::Boolean(*b)),
            Value::Number(n) => Some(ValueKey::Number(n.to_bits())),
            Value::String(s) => Some(ValueKey::String(s.clone())),
            Value::Map(_) | Value::Function(_) => None,
        }
    }
}

struct MapInner {
    /// All pairs in declaration order, duplicates included.
    pairs: Box<[(Value, Value)]>,
    /// Scalar-key lookup index; the last duplicate of a key wins.
    index: FxHashMap<ValueKey, usize>,
}

/// Ordered, immutable key→value map.
///
/// Iteration yields the original pairs in declaration order; lookup resolves
/// duplicate keys to the last occurrence.
#[derive(Clone)]
pub struct MapValue {
    inner: Arc<MapInner>,
}

impl MapValue {
    /// Build a map from ordered pairs.
    pub fn from_pairs(pairs: Vec<(Value, Value)>) -> Self {
        let pairs: Box<[(Value, Value)]> = pairs.into_boxed_slice();
        let mut index = FxHashMap::default();
        for (i, (key, _)) in pairs.iter().enumerate() {
            if let Some(key) = ValueKey::from_value(key) {
                index.insert(key, i);
            }
        }
        Self {
            inner: Arc::new(MapInner { pairs, index }),
        }
    }

    /// Number of pairs, duplicates included.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.pairs.len()
    }

    /// Check whether the map has no pairs.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.pairs.is_empty()
    }

    /// Look up a key.
    pub fn get(&self, key: &Value) -> Option<Value> {
        match ValueKey::from_value(key) {
            Some(key) => self
                .inner
                .index
                .get(&key)
                .map(|&i| self.inner.pairs[i].1.clone()),
            None => self
                .inner
                .pairs
                .iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone()),
        }
    }

    /// The pair at a given position, in declaration order.
    pub fn pair(&self, index: usize) -> Option<(Value, Value)> {
        self.inner.pairs.get(index).cloned()
    }

    /// Iterate pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &(Value, Value)> {
        self.inner.pairs.iter()
    }
}

impl PartialEq for MapValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.pairs == other.inner.pairs
    }
}

impl fmt::Debug for MapValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
