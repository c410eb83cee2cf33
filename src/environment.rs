//! Lexically nested name-to-value scopes, shared by reference so that
//! closures can keep a scope alive past the block that created it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::warn;

use crate::value::Value;

#[derive(Debug, Default)]
struct EnvironmentData {
    values: HashMap<String, Option<Value>>,
    enclosing: Option<Environment>,
}

/// A handle to one scope in the chain. Cloning an `Environment` clones the
/// handle, not the bindings — every clone observes the same underlying
/// table, which is exactly what a closure needs.
#[derive(Debug, Clone)]
pub struct Environment(Rc<RefCell<EnvironmentData>>);

impl Environment {
    pub fn new_global() -> Self {
        Self(Rc::new(RefCell::new(EnvironmentData::default())))
    }

    pub fn new_enclosed(enclosing: &Environment) -> Self {
        Self(Rc::new(RefCell::new(EnvironmentData {
            values: HashMap::new(),
            enclosing: Some(enclosing.clone()),
        })))
    }

    /// Always writes into this scope, shadowing any outer binding of the
    /// same name. `value` is `None` for a variable declared without an
    /// initializer.
    pub fn define(&self, name: &str, value: Option<Value>) {
        self.0.borrow_mut().values.insert(name.to_string(), value);
    }

    /// Writes into the nearest scope (this one or an ancestor) that already
    /// binds `name`. If nothing binds it, logs a warning and leaves every
    /// scope untouched — source-observed lenient behavior, not a hard
    /// error.
    pub fn assign(&self, name: &str, value: Value) {
        if self.0.borrow().values.contains_key(name) {
            self.0
                .borrow_mut()
                .values
                .insert(name.to_string(), Some(value));
            return;
        }

        let enclosing = self.0.borrow().enclosing.clone();
        match enclosing {
            Some(parent) => parent.assign(name, value),
            None => warn!(
                "Can't (re-)assign undefined variable {name}. Define thus: var {name}; or var {name} = <value>;"
            ),
        }
    }

    /// Looks up `name` outward through the scope chain. Returns `Value::Nil`
    /// (logging a warning) both when the name is declared-but-uninitialized
    /// and when it is undefined entirely — preserving the lenient
    /// get-continues-anyway behavior rather than aborting the program.
    pub fn get(&self, name: &str) -> Value {
        if let Some(slot) = self.0.borrow().values.get(name) {
            return match slot {
                Some(value) => value.clone(),
                None => {
                    warn!(
                        "Can't access uninitialized/unassigned variable {name}. Initialize thus: {name} = <value>"
                    );
                    Value::Nil
                }
            };
        }

        let enclosing = self.0.borrow().enclosing.clone();
        match enclosing {
            Some(parent) => parent.get(name),
            None => {
                warn!(
                    "Can't get undefined variable {name}. Define thus: var {name}; or var {name} = <value>;"
                );
                Value::Nil
            }
        }
    }
}
