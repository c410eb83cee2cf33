//! Runtime value domain and the callable objects that back function calls.

use std::fmt::{self, Display};
use std::rc::Rc;

use crate::ast::Stmt;
use crate::environment::Environment;
use crate::interpreter::{Flow, Interpreter};
use crate::token::Token;

#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    String(String),
    Boolean(bool),
    Nil,
    Callable(Rc<dyn Callable>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Callable(a), Value::Callable(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{s}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Nil => write!(f, "nil"),
            Value::Callable(c) => write!(f, "<fn {} declared on {}>", c.name(), c.declared_line()),
        }
    }
}

/// Renders a number the way the source's `print` does: `str(float)` in the
/// host language always keeps a decimal point, so a whole number prints as
/// `7.0` rather than Rust's default `7`. This is distinct from the `+`
/// string-coercion rule (see `cast_number_to_string` in the evaluator),
/// which drops that trailing `.0`.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{n:.1}")
    } else {
        format!("{n}")
    }
}

/// Anything invocable from a `Call` expression. The only implementor today
/// is `Function`, but the trait keeps the call site (`Interpreter::evaluate`)
/// decoupled from how a callable is actually represented.
pub trait Callable: std::fmt::Debug {
    fn arity(&self) -> usize;
    fn name(&self) -> &str;
    fn declared_line(&self) -> usize;
    fn call(&self, interpreter: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Flow>;
}

/// A user-defined function: its declared parameters and body, plus the
/// environment that was current at the point of declaration. Capturing that
/// environment (not the caller's) is what makes closures work.
#[derive(Debug, Clone)]
pub struct Function {
    name: Token,
    params: Vec<Token>,
    body: Rc<Vec<Stmt>>,
    declared_line: usize,
    closure: Environment,
}

impl Function {
    pub fn new(
        name: Token,
        params: Vec<Token>,
        body: Vec<Stmt>,
        declared_line: usize,
        closure: Environment,
    ) -> Self {
        Self {
            name,
            params,
            body: Rc::new(body),
            declared_line,
            closure,
        }
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.params.len()
    }

    fn name(&self) -> &str {
        &self.name.lexeme
    }

    fn declared_line(&self) -> usize {
        self.declared_line
    }

    fn call(&self, interpreter: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Flow> {
        let call_env = Environment::new_enclosed(&self.closure);
        for (param, arg) in self.params.iter().zip(args) {
            call_env.define(&param.lexeme, Some(arg));
        }

        match interpreter.execute_block(&self.body, call_env) {
            Ok(()) => Ok(Value::Nil),
            Err(Flow::Return(value)) => Ok(value),
            Err(other) => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_numbers_print_with_a_trailing_decimal() {
        assert_eq!(Value::Number(7.0).to_string(), "7.0");
        assert_eq!(Value::Number(0.0).to_string(), "0.0");
        assert_eq!(Value::Number(-3.0).to_string(), "-3.0");
    }

    #[test]
    fn fractional_numbers_print_without_truncation() {
        assert_eq!(Value::Number(1.5).to_string(), "1.5");
        assert_eq!(Value::Number(42.25).to_string(), "42.25");
    }

    #[test]
    fn nil_and_booleans_print_as_themselves() {
        assert_eq!(Value::Nil.to_string(), "nil");
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::Boolean(false).to_string(), "false");
    }
}
