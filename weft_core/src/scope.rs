//! Symbol binding environments.
//!
//! A scope is supplied by the caller for every render and mutated by `set`
//! commands, loop variables and function parameters. Frames nest: loop
//! bodies and function calls run inside a child frame and leave it on exit.

use crate::value::Value;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// The binding environment consulted and mutated during rendering.
pub trait Scope {
    /// Look up a symbol, searching from the innermost frame outward.
    fn get(&self, name: &str) -> Option<Value>;

    /// Bind a symbol in the innermost frame that already holds it, or define
    /// it in the innermost frame when no frame does.
    fn set(&mut self, name: &str, value: Value);

    /// Define a symbol in the innermost frame, shadowing any outer binding.
    fn define(&mut self, name: &str, value: Value);

    /// Enter a child frame.
    fn enter(&mut self);

    /// Leave the innermost frame, dropping its bindings.
    fn leave(&mut self);
}

/// Frame-stack scope backed by hash maps.
pub struct SimpleScope {
    frames: Vec<FxHashMap<Arc<str>, Value>>,
}

impl SimpleScope {
    /// Create a scope with a single root frame.
    pub fn new() -> Self {
        Self {
            frames: vec![FxHashMap::default()],
        }
    }

    /// Current frame depth.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

impl Default for SimpleScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope for SimpleScope {
    fn get(&self, name: &str) -> Option<Value> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name).cloned())
    }

    fn set(&mut self, name: &str, value: Value) {
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.get_mut(name) {
                *slot = value;
                return;
            }
        }
        self.define(name, value);
    }

    fn define(&mut self, name: &str, value: Value) {
        let frame = self
            .frames
            .last_mut()
            .expect("scope has no root frame");
        frame.insert(name.into(), value);
    }

    fn enter(&mut self) {
        self.frames.push(FxHashMap::default());
    }

    fn leave(&mut self) {
        // The root frame outlives every render.
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }
}
