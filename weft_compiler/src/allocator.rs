//! Constant pool allocation.
//!
//! Literal strings and values produced during compilation are interned into
//! two append-only sequences; generated code refers to them by index. Once
//! assigned, an index resolves to the same literal for the chunk's lifetime.
//! Allocation cannot fail and nothing is ever removed.

use rustc_hash::FxHashMap;
use std::sync::Arc;
use weft_core::Value;

/// Key type for value deduplication.
///
/// Only scalar values are deduplicated; maps and functions always get a
/// fresh slot. Deduplication is an optimization — correctness only requires
/// index stability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstantKey {
    Void,
    Boolean(bool),
    /// Float bits for exact comparison.
    Number(u64),
    String(Arc<str>),
}

impl ConstantKey {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Void => Some(ConstantKey::Void),
            Value::Boolean(b) => Some(ConstantKey::Boolean(*b)),
            Value::Number(n) => Some(ConstantKey::Number(n.to_bits())),
            Value::String(s) => Some(ConstantKey::String(s.clone())),
            Value::Map(_) | Value::Function(_) => None,
        }
    }
}

/// Growable constant pool handing out stable indices.
#[derive(Default)]
pub struct Allocator {
    strings: Vec<Arc<str>>,
    string_map: FxHashMap<Arc<str>, u32>,
    values: Vec<Value>,
    value_map: FxHashMap<ConstantKey, u32>,
}

impl Allocator {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a literal string and return its index.
    pub fn alloc_string(&mut self, literal: &str) -> u32 {
        if let Some(&index) = self.string_map.get(literal) {
            return index;
        }
        let literal: Arc<str> = literal.into();
        let index = self.strings.len() as u32;
        self.string_map.insert(literal.clone(), index);
        self.strings.push(literal);
        index
    }

    /// Intern a literal value and return its index.
    pub fn alloc_value(&mut self, literal: Value) -> u32 {
        if let Some(key) = ConstantKey::from_value(&literal) {
            if let Some(&index) = self.value_map.get(&key) {
                return index;
            }
            let index = self.values.len() as u32;
            self.values.push(literal);
            self.value_map.insert(key, index);
            index
        } else {
            let index = self.values.len() as u32;
            self.values.push(literal);
            index
        }
    }

    /// Number of interned strings.
    pub fn string_count(&self) -> usize {
        self.strings.len()
    }

    /// Number of interned values.
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// Freeze both pools into the fixed arrays shared by renders.
    pub fn freeze(self) -> (Box<[Arc<str>]>, Box<[Value]>) {
        (
            self.strings.into_boxed_slice(),
            self.values.into_boxed_slice(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_deduplication() {
        let mut allocator = Allocator::new();
        let a = allocator.alloc_string("name");
        let b = allocator.alloc_string("name");
        let c = allocator.alloc_string("other");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(allocator.string_count(), 2);
    }

    #[test]
    fn test_value_deduplication() {
        let mut allocator = Allocator::new();
        let a = allocator.alloc_value(Value::number(42.0));
        let b = allocator.alloc_value(Value::number(42.0));
        let c = allocator.alloc_value(Value::number(7.0));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_maps_are_not_deduplicated() {
        let mut allocator = Allocator::new();
        let a = allocator.alloc_value(Value::map(vec![]));
        let b = allocator.alloc_value(Value::map(vec![]));
        assert_ne!(a, b);
    }

    #[test]
    fn test_index_stability() {
        let mut allocator = Allocator::new();
        let a = allocator.alloc_string("a");
        let b = allocator.alloc_string("b");
        let (strings, _) = allocator.freeze();
        assert_eq!(&*strings[a as usize], "a");
        assert_eq!(&*strings[b as usize], "b");
    }

    #[test]
    fn test_boolean_and_number_keys_are_distinct() {
        let mut allocator = Allocator::new();
        let a = allocator.alloc_value(Value::boolean(false));
        let b = allocator.alloc_value(Value::number(0.0));
        assert_ne!(a, b);
    }
}
