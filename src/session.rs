//! Execution entry points tying the four stages together.
//!
//! A [`Lox`] session owns one [`Interpreter`], so globals defined by one
//! [`Lox::run_line`] call stay visible to the next.

use std::io::{self, Write};

use log::{debug, info};

use crate::ast::{Expr, Stmt};
use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::tokenize;
use crate::token::Token;

/// Outcome of running one chunk of source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Ok,
    /// A lexical, syntax or resolution error; nothing was executed.
    StaticError,
    /// Execution started and was aborted by a runtime error.
    RuntimeError,
}

impl RunStatus {
    /// Conventional process exit code (`sysexits.h` style).
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Ok => 0,
            RunStatus::StaticError => 65,
            RunStatus::RuntimeError => 70,
        }
    }
}

pub struct Lox {
    interpreter: Interpreter,
    errors: Box<dyn Write>,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    /// A session printing to stdout and reporting to stderr.
    pub fn new() -> Self {
        Self::with_writers(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    pub fn with_writers(output: Box<dyn Write>, errors: Box<dyn Write>) -> Self {
        info!("Starting Lox session");

        Self {
            interpreter: Interpreter::with_output(output),
            errors,
        }
    }

    /// Batch mode: the whole source is lexed, parsed and resolved before a
    /// single statement runs.
    pub fn run(&mut self, source: &str) -> RunStatus {
        let (tokens, lex_errors) = tokenize(source);

        let status: RunStatus = self.run_tokens(&tokens, lex_errors);
        self.interpreter.release_transient();

        status
    }

    /// Interactive mode: a line holding one bare expression has its value
    /// printed; anything else goes through the batch path.
    pub fn run_line(&mut self, line: &str) -> RunStatus {
        let (tokens, lex_errors) = tokenize(line);

        let bare: Option<Expr> = if lex_errors.is_empty() {
            Parser::new(&tokens).parse_expression()
        } else {
            None
        };

        let status: RunStatus = match bare {
            Some(expr) => {
                debug!("Line parsed as a bare expression");
                self.run_expression(&expr)
            }
            None => self.run_tokens(&tokens, lex_errors),
        };

        // Only function bodies can run again on a later line.
        self.interpreter.release_transient();

        status
    }

    /// The interpreter shared by every run of this session.
    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    fn run_tokens(&mut self, tokens: &[Token], mut errors: Vec<LoxError>) -> RunStatus {
        let statements: Vec<Stmt> = match Parser::new(tokens).parse() {
            Ok(statements) => statements,
            Err(parse_errors) => {
                errors.extend(parse_errors);
                Vec::new()
            }
        };

        if !errors.is_empty() {
            self.report_all(&errors);
            return RunStatus::StaticError;
        }

        if let Err(resolve_errors) = Resolver::new(&mut self.interpreter).resolve(&statements) {
            self.report_all(&resolve_errors);
            return RunStatus::StaticError;
        }

        match self.interpreter.interpret(&statements) {
            Ok(()) => RunStatus::Ok,
            Err(e) => {
                self.report(&e.to_string());
                RunStatus::RuntimeError
            }
        }
    }

    fn run_expression(&mut self, expr: &Expr) -> RunStatus {
        if let Err(resolve_errors) = Resolver::new(&mut self.interpreter).resolve_expression(expr) {
            self.report_all(&resolve_errors);
            return RunStatus::StaticError;
        }

        let result = self
            .interpreter
            .evaluate(expr)
            .and_then(|value| self.interpreter.print_value(&value));

        match result {
            Ok(()) => RunStatus::Ok,
            Err(e) => {
                // No line suffix: the line is the one just typed.
                self.report(&e.message());
                RunStatus::RuntimeError
            }
        }
    }

    fn report_all(&mut self, errors: &[LoxError]) {
        for e in errors {
            self.report(&e.to_string());
        }
    }

    fn report(&mut self, message: &str) {
        debug!("Reporting: {}", message);

        // Nowhere left to report a failing error sink.
        let _ = writeln!(self.errors, "{}", message);
        let _ = self.errors.flush();
    }
}
