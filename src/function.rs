//! Callable runtime values: native functions and user closures, and the
//! shared call protocol (`arity` + `call`) over every [`Callable`] kind.

use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::class::LoxInstance;
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::interpreter::{Completion, Interpreter};
use crate::token::Token;
use crate::value::{Callable, Value};

/// A function implemented by the host.
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: fn(&[Value]) -> std::result::Result<Value, String>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

/// A user function or method paired with the frame it was declared in.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_initializer: bool,
}

impl fmt::Debug for LoxFunction {
    // The closure is left out: it can reach this very function again.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxFunction")
            .field("name", &self.declaration.name.lexeme)
            .field("arity", &self.arity())
            .field("is_initializer", &self.is_initializer)
            .finish()
    }
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// A copy of this method whose closure is a fresh frame defining `this`.
    /// Called on every property access; bound methods are never cached.
    pub fn bind(&self, instance: Rc<LoxInstance>) -> LoxFunction {
        let environment: EnvRef = Environment::nested(&self.closure);
        environment
            .borrow_mut()
            .define("this", Value::Instance(instance));

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: environment,
            is_initializer: self.is_initializer,
        }
    }

    /// The bound receiver of an initializer.
    fn this_value(&self) -> Value {
        self.closure
            .borrow()
            .get_named_at(0, "this")
            .unwrap_or(Value::Nil)
    }

    /// Run the body in a new frame whose parent is the *defining* frame.
    /// Arity has already been checked by the caller.
    pub fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!("Calling user function '{}'", self.name());

        let environment: EnvRef = Environment::nested(&self.closure);
        {
            let mut frame = environment.borrow_mut();
            for (param, argument) in self.declaration.params.iter().zip(arguments) {
                frame.define(&param.lexeme, argument);
            }
        }

        let completion: Completion = interpreter.execute_block(&self.declaration.body, environment)?;

        match completion {
            Completion::Normal if self.is_initializer => Ok(self.this_value()),
            Completion::Normal => Ok(Value::Nil),
            Completion::Return { .. } if self.is_initializer => Ok(self.this_value()),
            Completion::Return { value, .. } => Ok(value),
            // Loop signals never cross a call boundary.
            Completion::Loop { control, line } => Err(LoxError::runtime_at(
                line,
                format!("Can't use '{}' outside of a loop.", control.keyword()),
            )),
        }
    }
}

impl Callable {
    /// Exact number of arguments this callable accepts.
    pub fn arity(&self) -> usize {
        match self {
            Callable::Native(native) => native.arity,
            Callable::Function(function) => function.arity(),
            Callable::Class(class) => class.arity(),
        }
    }

    /// Invoke with already‑evaluated arguments.  `paren` anchors errors.
    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        if arguments.len() != self.arity() {
            return Err(LoxError::runtime(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    self.arity(),
                    arguments.len()
                ),
            ));
        }

        match self {
            Callable::Native(native) => {
                debug!("Calling native function '{}'", native.name);
                (native.func)(&arguments).map_err(|msg| LoxError::runtime(paren, msg))
            }
            Callable::Function(function) => {
                interpreter.nested_call(paren, |interp| function.call(interp, arguments))
            }
            Callable::Class(class) => {
                interpreter.nested_call(paren, |interp| class.instantiate(interp, arguments))
            }
        }
    }
}
