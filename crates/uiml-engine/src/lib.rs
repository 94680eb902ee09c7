//! Statement execution engine for uiml scripts.
//!
//! Runs parsed statements on an explicit work queue instead of the Rust
//! stack. Host state is passed in through an [`EvalContext`]; names listed as
//! read-only are handed to scripts as [`ReadOnlyView`]s, and any attempt to
//! mutate them aborts evaluation.
//!
//! # Example
//!
//! ```
//! use uiml_engine::{EngineOptions, EvalContext, Thread, Value};
//! use uiml_script::{parse_statements, NodeIdGenerator};
//!
//! let statements = parse_statements("let n = 0; for (const x of [1, 2, 3]) n += x;", &NodeIdGenerator::new()).unwrap();
//! let mut thread = Thread::new(EvalContext::default(), EngineOptions::default());
//! thread.execute(&statements).unwrap();
//! assert_eq!(thread.variable("n"), Some(Value::Number(6.0)));
//! ```

mod error;
mod intrinsics;
mod operators;
mod scope;
mod thread;
mod value;

pub use error::EngineError;
pub use intrinsics::MAX_ARRAY_LENGTH;
pub use thread::{EngineDiagnostics, Thread};
pub use value::{ArrayRef, Closure, NativeFunction, NativeResult, ObjectRef, ReadOnlyView, Value};

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use std::time::Duration;

/// Limits applied to one `execute` or `evaluate` call.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Wall-clock limit.
    pub timeout: Option<Duration>,
    /// Maximum number of queue items processed.
    pub max_steps: Option<u64>,
    /// Maximum nesting of script function calls.
    pub max_call_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(1)),
            max_steps: None,
            max_call_depth: 100,
        }
    }
}

/// Host-provided globals.
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    pub globals: IndexMap<SmolStr, Value>,
    /// Globals scripts may read but never modify.
    pub read_only: FxHashSet<SmolStr>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a writable global.
    pub fn with_global(mut self, name: &str, value: Value) -> Self {
        self.globals.insert(SmolStr::new(name), value);
        self
    }

    /// Adds a global that scripts can only read.
    pub fn with_read_only(mut self, name: &str, value: Value) -> Self {
        self.read_only.insert(SmolStr::new(name));
        self.with_global(name, value)
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }
}
