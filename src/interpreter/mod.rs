//! Tree-walking evaluator: walks the AST against a lexically scoped
//! environment chain, producing side effects (`print`) and propagating
//! non-local control flow for `return` and `break`.

use std::error::Error;
use std::fmt::{self, Display};
use std::io::Write;
use std::rc::Rc;

use log::debug;

use crate::ast::{Expr, ForClauses, Literal as AstLiteral, Stmt};
use crate::environment::Environment;
use crate::token::{Token, TokenKind};
use crate::value::{Callable, Function, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub line: usize,
    pub message: String,
}

impl RuntimeError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Error on L{}]: {}", self.line, self.message)
    }
}

impl Error for RuntimeError {}

/// The evaluator's control-flow channel. `execute`/`evaluate` return
/// `Result<_, Flow>` so that `?` threads a genuine error, a `return`, and a
/// `break` uniformly up through nested blocks; each is caught at its own
/// boundary (function call, while loop) and anything else re-propagates.
#[derive(Debug, Clone)]
pub enum Flow {
    Error(RuntimeError),
    Return(Value),
    Break(Token),
}

impl From<RuntimeError> for Flow {
    fn from(err: RuntimeError) -> Self {
        Flow::Error(err)
    }
}

type EvalResult<T> = Result<T, Flow>;

pub struct Interpreter<'out> {
    environment: Environment,
    out: &'out mut dyn Write,
}

impl<'out> Interpreter<'out> {
    pub fn new(out: &'out mut dyn Write) -> Self {
        Self {
            environment: Environment::new_global(),
            out,
        }
    }

    /// Runs a full program. Stops at the first statement that raises an
    /// unrecovered `RuntimeError` or an unmatched `break`.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        for stmt in statements {
            if let Err(flow) = self.execute(stmt) {
                return Err(self.flow_into_error(flow));
            }
        }
        Ok(())
    }

    fn flow_into_error(&self, flow: Flow) -> RuntimeError {
        match flow {
            Flow::Error(err) => err,
            Flow::Return(_) => RuntimeError::new(0, "can't return outside a function."),
            Flow::Break(keyword) => RuntimeError::new(
                keyword.line,
                "Can't use break outside loop.",
            ),
        }
    }

    // ---- statements ----

    fn execute(&mut self, stmt: &Stmt) -> EvalResult<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{value}").ok();
                Ok(())
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => Some(self.evaluate(expr)?),
                    None => None,
                };
                self.environment.define(&name.lexeme, value);
                Ok(())
            }
            Stmt::Block(statements) => {
                let block_env = Environment::new_enclosed(&self.environment);
                self.execute_block(statements, block_env)
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(cond)?) {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }
            Stmt::While {
                cond,
                body,
                for_clauses,
            } => self.execute_while(cond, body, for_clauses.as_ref()),
            Stmt::Function {
                name,
                params,
                body,
                declared_line,
            } => {
                let function = Function::new(
                    name.clone(),
                    params.clone(),
                    body.clone(),
                    *declared_line,
                    self.environment.clone(),
                );
                self.environment
                    .define(&name.lexeme, Some(Value::Callable(Rc::new(function))));
                Ok(())
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Err(Flow::Return(value))
            }
            Stmt::Break { keyword } => Err(Flow::Break(keyword.clone())),
        }
    }

    /// Runs `statements` with `env` installed as the current environment,
    /// restoring the prior environment on every exit path — normal
    /// completion, an error, or a `return`/`break` unwinding through.
    pub fn execute_block(&mut self, statements: &[Stmt], env: Environment) -> EvalResult<()> {
        let previous = std::mem::replace(&mut self.environment, env);

        let result = (|| {
            for stmt in statements {
                self.execute(stmt)?;
            }
            Ok(())
        })();

        self.environment = previous;
        result
    }

    fn execute_while(
        &mut self,
        cond: &Expr,
        body: &Stmt,
        for_clauses: Option<&ForClauses>,
    ) -> EvalResult<()> {
        if let Some(ForClauses { initializer, update }) = for_clauses {
            self.execute(initializer)?;
            while is_truthy(&self.evaluate(cond)?) {
                match self.execute(body) {
                    Err(Flow::Break(_)) => break,
                    other => other?,
                }
                self.evaluate(update)?;
            }
            return Ok(());
        }

        while is_truthy(&self.evaluate(cond)?) {
            match self.execute(body) {
                Err(Flow::Break(_)) => break,
                other => other?,
            }
        }
        Ok(())
    }

    // ---- expressions ----

    fn evaluate(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Literal(lit) => Ok(literal_to_value(lit)),
            Expr::Variable(name) => Ok(self.environment.get(&name.lexeme)),
            Expr::Group(inner) => self.evaluate(inner),
            Expr::Unary { op, right } => self.evaluate_unary(op, right),
            Expr::Binary { left, op, right } => self.evaluate_binary(left, op, right),
            Expr::Logical { left, op, right } => self.evaluate_logical(left, op, right),
            Expr::Ternary {
                cond,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(cond)?) {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }
            Expr::Assignment { name, value } => {
                let value = self.evaluate(value)?;
                self.environment.assign(&name.lexeme, value.clone());
                Ok(value)
            }
            Expr::Call {
                callee,
                paren,
                args,
            } => self.evaluate_call(callee, paren, args),
        }
    }

    fn evaluate_unary(&mut self, op: &Token, right: &Expr) -> EvalResult<Value> {
        let right = self.evaluate(right)?;
        match op.kind {
            TokenKind::Bang => Ok(Value::Boolean(!is_truthy(&right))),
            TokenKind::Minus => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(RuntimeError::new(op.line, "Operand must be a number.").into()),
            },
            _ => unreachable!("parser only produces Bang/Minus unary operators"),
        }
    }

    fn evaluate_logical(&mut self, left: &Expr, op: &Token, right: &Expr) -> EvalResult<Value> {
        let left = self.evaluate(left)?;
        match op.kind {
            TokenKind::Or => {
                if is_truthy(&left) {
                    return Ok(left);
                }
                let right = self.evaluate(right)?;
                if is_truthy(&right) {
                    Ok(right)
                } else {
                    Ok(Value::Boolean(false))
                }
            }
            TokenKind::And => {
                if !is_truthy(&left) {
                    return Ok(Value::Boolean(false));
                }
                let right = self.evaluate(right)?;
                if is_truthy(&right) {
                    // Note: returns the left operand, not the right, on a
                    // truthy `and` — a source-observed quirk, preserved.
                    Ok(left)
                } else {
                    Ok(Value::Boolean(false))
                }
            }
            _ => unreachable!("parser only produces And/Or logical operators"),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> EvalResult<Value> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        match op.kind {
            TokenKind::Pipe => {
                let (l, r) = both_numbers(&left, &right, op)?;
                Ok(Value::Number(((l as i64) | (r as i64)) as f64))
            }
            TokenKind::Ampersand => {
                let (l, r) = both_numbers(&left, &right, op)?;
                Ok(Value::Number(((l as i64) & (r as i64)) as f64))
            }
            TokenKind::Plus => self.evaluate_plus(left, right, op),
            TokenKind::Minus => {
                let (l, r) = both_numbers(&left, &right, op)?;
                Ok(Value::Number(l - r))
            }
            TokenKind::Star => {
                let (l, r) = both_numbers(&left, &right, op)?;
                Ok(Value::Number(l * r))
            }
            TokenKind::Slash => {
                let (l, r) = both_numbers(&left, &right, op)?;
                if r == 0.0 {
                    return Err(RuntimeError::new(op.line, "Division by zero.").into());
                }
                Ok(Value::Number(l / r))
            }
            TokenKind::Percent => {
                let (l, r) = both_numbers(&left, &right, op)?;
                Ok(Value::Number(l % r))
            }
            TokenKind::Caret => {
                let (l, r) = both_numbers(&left, &right, op)?;
                Ok(Value::Number(l.powf(r)))
            }
            TokenKind::EqualEqual => Ok(Value::Boolean(is_equal(&left, &right))),
            TokenKind::BangEqual => Ok(Value::Boolean(!is_equal(&left, &right))),
            TokenKind::Greater | TokenKind::GreaterEqual | TokenKind::Less | TokenKind::LessEqual => {
                self.evaluate_comparison(op, left, right)
            }
            _ => unreachable!("parser only produces binary operators handled above"),
        }
    }

    fn evaluate_plus(&self, left: Value, right: Value, op: &Token) -> EvalResult<Value> {
        match (&left, &right) {
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
            (Value::String(l), Value::String(r)) => Ok(Value::String(format!("{l}{r}"))),
            (Value::Number(n), Value::String(s)) => {
                Ok(Value::String(format!("{}{s}", cast_number_to_string(*n))))
            }
            (Value::String(s), Value::Number(n)) => {
                Ok(Value::String(format!("{s}{}", cast_number_to_string(*n))))
            }
            _ => Err(RuntimeError::new(
                op.line,
                "Operands must be two numbers, two strings, or a number and a string.",
            )
            .into()),
        }
    }

    fn evaluate_comparison(&self, op: &Token, left: Value, right: Value) -> EvalResult<Value> {
        let ordering = match (&left, &right) {
            (Value::Number(l), Value::Number(r)) => l.partial_cmp(r),
            (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
            _ => {
                return Err(RuntimeError::new(
                    op.line,
                    "Operands must be two numbers or two strings.",
                )
                .into())
            }
        };

        let Some(ordering) = ordering else {
            return Err(RuntimeError::new(op.line, "Operands are not comparable.").into());
        };

        let result = match op.kind {
            TokenKind::Greater => ordering.is_gt(),
            TokenKind::GreaterEqual => ordering.is_ge(),
            TokenKind::Less => ordering.is_lt(),
            TokenKind::LessEqual => ordering.is_le(),
            _ => unreachable!(),
        };
        Ok(Value::Boolean(result))
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, args: &[Expr]) -> EvalResult<Value> {
        let callee = self.evaluate(callee)?;

        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.evaluate(arg)?);
        }

        let Value::Callable(callable) = callee else {
            return Err(RuntimeError::new(paren.line, "Can only call functions.").into());
        };

        if arg_values.len() != callable.arity() {
            return Err(RuntimeError::new(
                paren.line,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arg_values.len()
                ),
            )
            .into());
        }

        debug!("calling {} with {} argument(s)", callable.name(), arg_values.len());
        callable.call(self, arg_values)
    }
}

fn both_numbers(left: &Value, right: &Value, op: &Token) -> Result<(f64, f64), Flow> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => Ok((*l, *r)),
        _ => Err(RuntimeError::new(op.line, "Operands must be numbers.").into()),
    }
}

/// Drops a trailing `.0` for whole-number floats so `42.0 + "x"` yields
/// `"42x"` rather than `"42.0x"`, matching the source's string coercion.
fn cast_number_to_string(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn is_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Nil, Value::Nil) => true,
        (Value::Nil, _) | (_, Value::Nil) => false,
        _ => left == right,
    }
}

/// `nil` is false, the number `0` is false, booleans are themselves,
/// everything else (including empty strings) is true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,
        Value::Number(n) => *n != 0.0,
        Value::Boolean(b) => *b,
        _ => true,
    }
}

fn literal_to_value(lit: &AstLiteral) -> Value {
    match lit {
        AstLiteral::Number(n) => Value::Number(*n),
        AstLiteral::String(s) => Value::String(s.clone()),
        AstLiteral::Boolean(b) => Value::Boolean(*b),
        AstLiteral::Nil => Value::Nil,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn run(src: &str) -> String {
        let tokens = Lexer::new(src).lex().expect("lex failed");
        let (stmts, errors) = Parser::new(tokens).parse();
        assert!(errors.is_empty(), "parse errors: {errors:?}");
        let mut buf = Vec::new();
        {
            let mut interp = Interpreter::new(&mut buf);
            interp.interpret(&stmts).expect("interpret failed");
        }
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn prints_arithmetic() {
        assert_eq!(run("print 1 + 2 * 3;"), "7.0\n");
    }

    #[test]
    fn number_string_coercion_drops_trailing_zero() {
        assert_eq!(run("print \"x\" + 1;"), "x1\n");
        assert_eq!(run("print \"x\" + 1.5;"), "x1.5\n");
    }

    #[test]
    fn while_loop_with_break() {
        assert_eq!(
            run("var i = 0; while (i < 5) { if (i == 2) break; print i; i = i + 1; }"),
            "0.0\n1.0\n"
        );
    }

    #[test]
    fn for_loop_desugars_and_runs() {
        assert_eq!(
            run("for (var i = 0; i < 3; i = i + 1) print i;"),
            "0.0\n1.0\n2.0\n"
        );
    }

    #[test]
    fn closures_capture_shared_state() {
        assert_eq!(
            run(
                "fun make() { var n = 0; fun inc() { n = n + 1; return n; } return inc; } \
                 var c = make(); print c(); print c(); print c();"
            ),
            "1.0\n2.0\n3.0\n"
        );
    }

    #[test]
    fn chained_assignment_binds_all_targets() {
        assert_eq!(run("var a = 0; var b = 0; a = b = 5; print a; print b;"), "5.0\n5.0\n");
    }

    #[test]
    fn logical_and_returns_left_operand_on_truthy() {
        assert_eq!(run("print 1 and 2;"), "1.0\n");
    }

    #[test]
    fn logical_or_short_circuits() {
        assert_eq!(run("print 1 or (1 / 0);"), "1.0\n");
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let tokens = Lexer::new("print 1 / 0;").lex().unwrap();
        let (stmts, errors) = Parser::new(tokens).parse();
        assert!(errors.is_empty());
        let mut buf = Vec::new();
        let mut interp = Interpreter::new(&mut buf);
        let err = interp.interpret(&stmts).unwrap_err();
        assert!(err.message.contains("Division by zero"));
    }

    #[test]
    fn modulo_by_zero_yields_nan_rather_than_an_error() {
        assert_eq!(run("print 1 % 0;"), "NaN\n");
    }

    #[test]
    fn break_outside_loop_is_an_error() {
        let tokens = Lexer::new("break;").lex().unwrap();
        let (stmts, errors) = Parser::new(tokens).parse();
        assert!(errors.is_empty());
        let mut buf = Vec::new();
        let mut interp = Interpreter::new(&mut buf);
        let err = interp.interpret(&stmts).unwrap_err();
        assert!(err.message.contains("Can't use break outside loop"));
    }

    #[test]
    fn ternary_picks_correct_branch() {
        assert_eq!(run("print true ? 1 : 2;"), "1.0\n");
        assert_eq!(run("print false ? 1 : 2;"), "2.0\n");
    }

    #[test]
    fn undefined_variable_read_is_lenient_and_yields_nil() {
        assert_eq!(run("print missing;"), "nil\n");
    }
}
