//! Built-in function table.
//!
//! Function references are resolved lazily at the point of use. The
//! table is immutable once built; every entry reads time through the
//! injected clock.

use std::collections::BTreeMap;

use time::Time;

use crate::clock::Clock;
use crate::types::{EvalError, Value};

pub type Builtin = fn(&dyn Clock) -> Value;

#[derive(Clone)]
pub struct Builtins {
    table: BTreeMap<String, Builtin>,
}

impl std::fmt::Debug for Builtins {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.table.keys()).finish()
    }
}

impl Default for Builtins {
    fn default() -> Self {
        Self::standard()
    }
}

impl Builtins {
    /// An empty table.
    pub fn empty() -> Self {
        Builtins {
            table: BTreeMap::new(),
        }
    }

    /// `NOW` and `TODAY`.
    pub fn standard() -> Self {
        let mut b = Builtins::empty();
        b.register("NOW", now);
        b.register("TODAY", today);
        b
    }

    pub fn register(&mut self, name: impl Into<String>, f: Builtin) {
        self.table.insert(name.into(), f);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn call(&self, name: &str, clock: &dyn Clock) -> Result<Value, EvalError> {
        let f = self.table.get(name).ok_or_else(|| EvalError::UnknownFunction {
            name: name.to_string(),
        })?;
        Ok(f(clock))
    }
}

fn now(clock: &dyn Clock) -> Value {
    Value::DateTime(clock.now())
}

/// Midnight UTC of the clock's current day.
fn today(clock: &dyn Clock) -> Value {
    let utc = clock.now().to_offset(time::UtcOffset::UTC);
    Value::DateTime(utc.replace_time(Time::MIDNIGHT))
}
