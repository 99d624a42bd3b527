//! Tree‑walking evaluator.
//!
//! Statements execute to a [`Completion`]: normal fall‑through, a `return`
//! carrying its value, or a `break`/`continue` signal.  Runtime errors travel
//! separately on the `Err` side of [`Result`], so a handler for one can never
//! swallow the other.  `return` is absorbed at the nearest call boundary,
//! loop signals at the nearest loop.

use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionDecl, LiteralValue, LoopControl, Stmt};
use crate::class::{LoxClass, INITIALIZER};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::function::{LoxFunction, NativeFunction};
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenType};
use crate::value::{Callable, Value};

/// Nested Lox calls allowed before the call fails with `Stack overflow.`.
pub const MAX_CALL_DEPTH: usize = 15_000;

/// How a statement finished.
#[derive(Debug)]
pub enum Completion {
    Normal,
    Return { value: Value, line: usize },
    Loop { control: LoopControl, line: usize },
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    /// Scope distances recorded by the resolver; globals are absent.
    locals: HashMap<ExprId, usize>,
    /// Entries of `locals` only needed until the current run finishes.
    transient: Vec<ExprId>,
    call_depth: usize,
    output: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn clock(_args: &[Value]) -> std::result::Result<Value, String> {
    let millis: i64 = chrono::Utc::now().timestamp_millis();

    Ok(Value::Number(millis as f64 / 1000.0))
}

impl Interpreter {
    /// An interpreter printing to stdout.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// An interpreter printing to `output`; defines the `clock` native.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Rc::new(std::cell::RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::Callable(Callable::Native(Rc::new(NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: clock,
            }))),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            transient: Vec::new(),
            call_depth: 0,
            output,
        }
    }

    /// Record that the reference `id` lives `depth` frames out.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        debug!("Noting local {:?} at depth {}", id, depth);

        self.locals.insert(id, depth);
    }

    /// Like [`resolve`](Self::resolve), for a reference outside every
    /// function body: it executes during this run only.
    pub fn resolve_transient(&mut self, id: ExprId, depth: usize) {
        self.resolve(id, depth);
        self.transient.push(id);
    }

    /// Drop recorded distances whose syntax tree will never run again.
    pub fn forget(&mut self, ids: &[ExprId]) {
        for id in ids {
            self.locals.remove(id);
        }
    }

    /// Forget every transient entry; called once a run has finished.
    pub fn release_transient(&mut self) {
        let transient: Vec<ExprId> = std::mem::take(&mut self.transient);

        debug!("Releasing {} transient resolution(s)", transient.len());
        self.forget(&transient);
    }

    /// Number of references with a recorded scope distance.
    pub fn resolved_count(&self) -> usize {
        self.locals.len()
    }

    /// Run `call` one Lox call level deeper, failing at `paren` once
    /// [`MAX_CALL_DEPTH`] is reached.
    pub fn nested_call<R>(
        &mut self,
        paren: &Token,
        call: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(LoxError::runtime(paren, "Stack overflow."));
        }

        self.call_depth += 1;
        let result = call(self);
        self.call_depth -= 1;

        result
    }

    /// Run a whole program.  A runtime error aborts the remaining statements
    /// but leaves the interpreter ready for another run.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        info!("Interpreting {} statement(s)", statements.len());

        for stmt in statements {
            match self.execute(stmt)? {
                Completion::Normal => {}
                Completion::Return { line, .. } => {
                    return Err(LoxError::runtime_at(line, "Can't return from top-level code."));
                }
                Completion::Loop { control, line } => {
                    return Err(LoxError::runtime_at(
                        line,
                        format!("Can't use '{}' outside of a loop.", control.keyword()),
                    ));
                }
            }
        }

        self.output.flush()?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Write the printable form of `value` followed by a newline.
    pub fn print_value(&mut self, value: &Value) -> Result<()> {
        writeln!(self.output, "{}", value)?;
        self.output.flush()?;
        Ok(())
    }

    // ───────────────────────────── statements ──────────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> Result<Completion> {
        ensure_sufficient_stack(|| self.execute_stmt(stmt))
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> Result<Completion> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                debug!("Printing value: {}", value);
                self.print_value(&value)?;
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}'", name.lexeme);
                self.environment.borrow_mut().define(&name.lexeme, value);
            }

            Stmt::Block(statements) => {
                let frame: EnvRef = Environment::nested(&self.environment);
                return self.execute_block(statements, frame);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(else_stmt) = else_branch {
                    return self.execute(else_stmt);
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Completion::Normal => {}
                        Completion::Loop {
                            control: LoopControl::Continue,
                            ..
                        } => continue,
                        Completion::Loop {
                            control: LoopControl::Break,
                            ..
                        } => break,
                        ret @ Completion::Return { .. } => return Ok(ret),
                    }
                }
            }

            Stmt::LoopBody { body, increment } => {
                match self.execute(body)? {
                    Completion::Normal
                    | Completion::Loop {
                        control: LoopControl::Continue,
                        ..
                    } => {}
                    other => return Ok(other),
                }

                if let Some(increment) = increment {
                    self.evaluate(increment)?;
                }
            }

            Stmt::LoopControl { control, keyword } => {
                debug!("Raising '{}' signal", control.keyword());
                return Ok(Completion::Loop {
                    control: *control,
                    line: keyword.line,
                });
            }

            Stmt::Function(declaration) => {
                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );

                debug!("Defining function '{}'", declaration.name.lexeme);
                self.environment.borrow_mut().define(
                    &declaration.name.lexeme,
                    Value::Callable(Callable::Function(Rc::new(function))),
                );
            }

            Stmt::Return { keyword, value } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                return Ok(Completion::Return {
                    value,
                    line: keyword.line,
                });
            }

            Stmt::Class {
                name,
                superclass,
                methods,
                static_methods,
            } => {
                self.execute_class(name, superclass.as_ref(), methods, static_methods)?;
            }
        }

        Ok(Completion::Normal)
    }

    /// Run `statements` with `frame` as the current frame.  The previous
    /// frame is restored on every exit path, errors included.
    pub fn execute_block(&mut self, statements: &[Stmt], frame: EnvRef) -> Result<Completion> {
        let previous: EnvRef = std::mem::replace(&mut self.environment, frame);

        let result = self.execute_sequence(statements);

        self.environment = previous;
        result
    }

    fn execute_sequence(&mut self, statements: &[Stmt]) -> Result<Completion> {
        for stmt in statements {
            let completion: Completion = self.execute(stmt)?;

            if !matches!(completion, Completion::Normal) {
                return Ok(completion);
            }
        }

        Ok(Completion::Normal)
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
        static_methods: &[Rc<FunctionDecl>],
    ) -> Result<()> {
        debug!("Declaring class '{}'", name.lexeme);

        let superclass: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Callable(Callable::Class(class)) => Some(class),
                _ => {
                    let anchor: &Token = match expr {
                        Expr::Variable { name, .. } => name,
                        _ => name,
                    };
                    return Err(LoxError::runtime(anchor, "Superclass must be a class."));
                }
            },
            None => None,
        };

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        // Methods of a subclass close over an extra frame holding `super`.
        let method_frame: EnvRef = match &superclass {
            Some(class) => {
                let frame: EnvRef = Environment::nested(&self.environment);
                frame
                    .borrow_mut()
                    .define("super", Value::Callable(Callable::Class(Rc::clone(class))));
                frame
            }
            None => Rc::clone(&self.environment),
        };

        let build = |decls: &[Rc<FunctionDecl>], allow_init: bool| -> HashMap<String, Rc<LoxFunction>> {
            decls
                .iter()
                .map(|decl| {
                    let is_initializer: bool = allow_init && decl.name.lexeme == INITIALIZER;
                    let function = LoxFunction::new(
                        Rc::clone(decl),
                        Rc::clone(&method_frame),
                        is_initializer,
                    );
                    (decl.name.lexeme.clone(), Rc::new(function))
                })
                .collect()
        };

        let class = LoxClass::new(
            name.lexeme.clone(),
            superclass,
            build(methods, true),
            build(static_methods, false),
        );

        self.environment
            .borrow_mut()
            .assign(name, Value::Callable(Callable::Class(Rc::new(class))))
    }

    // ───────────────────────────── expressions ─────────────────────────────

    /// Evaluate a single expression against the current frame.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        ensure_sufficient_stack(|| self.evaluate_expr(expr))
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::from(s.as_str()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right: Value = self.evaluate(right)?;

                match operator.token_type {
                    TokenType::MINUS => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
                    },
                    TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
                    _ => Err(LoxError::runtime(operator, "Invalid unary operator.")),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;
                let right: Value = self.evaluate(right)?;

                binary(operator, left, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;

                let short_circuit: bool = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        self.environment
                            .borrow_mut()
                            .assign_at(distance, name, value.clone())?;
                    }
                    None => {
                        self.globals.borrow_mut().assign(name, value.clone())?;
                    }
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                let callable: Callable = callee.as_callable().cloned().ok_or_else(|| {
                    LoxError::runtime(paren, "Can only call functions and classes.")
                })?;

                callable.call(self, paren, values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => instance.get(name),
                Value::Callable(Callable::Class(class)) => class.get(name),
                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;
                instance.set(name, value.clone());

                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => self.environment.borrow().get_at(distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    /// `super.method`: the superclass sits `distance` frames out and the
    /// receiver one frame closer.
    fn evaluate_super(&self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        let unresolved = || LoxError::runtime(keyword, "Can't use 'super' outside of a class.");

        let distance: usize = *self.locals.get(&id).ok_or_else(unresolved)?;
        let frame = self.environment.borrow();

        let superclass: Rc<LoxClass> = match frame.get_named_at(distance, "super") {
            Some(Value::Callable(Callable::Class(class))) => class,
            _ => return Err(unresolved()),
        };

        let instance = match frame.get_named_at(distance.saturating_sub(1), "this") {
            Some(Value::Instance(instance)) => instance,
            _ => return Err(unresolved()),
        };

        let found: Rc<LoxFunction> = superclass.find_method(&method.lexeme).ok_or_else(|| {
            LoxError::runtime(method, format!("Undefined property '{}'.", method.lexeme))
        })?;

        Ok(Value::Callable(Callable::Function(Rc::new(
            found.bind(instance),
        ))))
    }
}

/// Arithmetic, comparison, equality and `+` concatenation.
fn binary(operator: &Token, left: Value, right: Value) -> Result<Value> {
    let numbers = || match (&left, &right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(operator, "Operands must be numbers.")),
    };

    match operator.token_type {
        TokenType::PLUS => match (&left, &right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(a), Value::String(b)) => Ok(Value::from(format!("{}{}", a, b))),
            // Exactly one side is a string: stringify the other.
            (Value::String(_), _) | (_, Value::String(_)) => {
                Ok(Value::from(format!("{}{}", left, right)))
            }
            _ => Err(LoxError::runtime(
                operator,
                "Operands must be two numbers or two concatenable types (a string and a number, etc.).",
            )),
        },
        TokenType::MINUS => numbers().map(|(a, b)| Value::Number(a - b)),
        TokenType::STAR => numbers().map(|(a, b)| Value::Number(a * b)),
        TokenType::SLASH => numbers().map(|(a, b)| Value::Number(a / b)),
        TokenType::GREATER => numbers().map(|(a, b)| Value::Bool(a > b)),
        TokenType::GREATER_EQUAL => numbers().map(|(a, b)| Value::Bool(a >= b)),
        TokenType::LESS => numbers().map(|(a, b)| Value::Bool(a < b)),
        TokenType::LESS_EQUAL => numbers().map(|(a, b)| Value::Bool(a <= b)),
        TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),
        TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),
        _ => Err(LoxError::runtime(operator, "Invalid binary operator.")),
    }
}
