//! Static resolver pass for the **Lox** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<&str,bool>` tracking declared/defined).
//! 2. Report static errors (redeclaration, read in own initializer, misplaced
//!    `return`/`this`/`super`/`break`/`continue`, self‑inheritance).
//! 3. Tell the interpreter, for *each* variable occurrence, how many frames
//!    out its binding lives.  Names found in no scope are globals and are
//!    looked up by name at run time.
//!
//! The scopes pushed here mirror exactly the frames the interpreter creates:
//! one per block, one per call, one holding `this` per bound method and one
//! holding `super` per subclass.

use crate::ast::{Expr, ExprId, FunctionDecl, LoopControl, Stmt};
use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::stack::ensure_sufficient_stack;
use crate::token::Token;
use log::{debug, info};
use std::collections::HashMap;

/// What kind of function body are we inside?  Used to validate `return`
/// and to tell run-once references from ones inside callable bodies.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
}

/// What kind of class body are we inside?  Used to validate `this`/`super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
    StaticMethod,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances by calling back into the interpreter.
pub struct Resolver<'a, 'interp> {
    interpreter: &'interp mut Interpreter,
    scopes: Vec<HashMap<&'a str, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    loop_depth: usize,
    /// Name of the global whose initializer is being resolved, if any.
    global_initializer: Option<&'a str>,
    /// Every reference recorded in the interpreter by this pass.
    recorded: Vec<ExprId>,
    errors: Vec<LoxError>,
}

impl<'a, 'interp> Resolver<'a, 'interp> {
    /// Create a new resolver bound to the given interpreter.
    pub fn new(interpreter: &'interp mut Interpreter) -> Self {
        info!("Resolver instantiated");

        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            loop_depth: 0,
            global_initializer: None,
            recorded: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Walk all top‑level statements, returning every static error found.
    pub fn resolve(mut self, statements: &'a [Stmt]) -> Result<(), Vec<LoxError>> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }

        self.finish()
    }

    /// Resolve a lone expression (interactive mode).
    pub fn resolve_expression(mut self, expr: &'a Expr) -> Result<(), Vec<LoxError>> {
        self.resolve_expr(expr);

        self.finish()
    }

    /// A tree that failed to resolve never runs, so its recorded
    /// distances are dropped again.
    fn finish(self) -> Result<(), Vec<LoxError>> {
        if self.errors.is_empty() {
            info!("Resolved {} local reference(s)", self.recorded.len());
            Ok(())
        } else {
            info!("Resolve finished with {} error(s)", self.errors.len());
            self.interpreter.forget(&self.recorded);
            Err(self.errors)
        }
    }

    fn error(&mut self, token: &Token, message: &str) {
        self.errors.push(LoxError::resolve(token, message));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &'a Stmt) {
        ensure_sufficient_stack(|| self.resolve_stmt_inner(stmt))
    }

    fn resolve_stmt_inner(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                for s in statements {
                    self.resolve_stmt(s);
                }
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name);
                if let Some(expr) = initializer {
                    let previous = self.global_initializer;
                    if self.scopes.is_empty() {
                        self.global_initializer = Some(name.lexeme.as_str());
                    }

                    self.resolve_expr(expr);

                    self.global_initializer = previous;
                }
                self.define(name);
            }

            Stmt::Function(declaration) => {
                // the name is visible *inside* its own body (recursion)
                self.declare(&declaration.name);
                self.define(&declaration.name);
                self.resolve_function(declaration, FunctionType::Function);
            }

            Stmt::Class {
                name,
                superclass,
                methods,
                static_methods,
            } => self.resolve_class(name, superclass.as_ref(), methods, static_methods),

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);

                self.loop_depth += 1;
                self.resolve_stmt(body);
                self.loop_depth -= 1;
            }

            Stmt::LoopBody { body, increment } => {
                self.resolve_stmt(body);
                if let Some(inc) = increment {
                    self.resolve_expr(inc);
                }
            }

            Stmt::LoopControl { control, keyword } => {
                if self.loop_depth == 0 {
                    let message = match control {
                        LoopControl::Break => "Can't use 'break' outside of a loop.",
                        LoopControl::Continue => "Can't use 'continue' outside of a loop.",
                    };
                    self.error(keyword, message);
                }
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code.");
                }
                if let Some(expr) = value {
                    self.resolve_expr(expr);
                }
            }
        }
    }

    fn resolve_class(
        &mut self,
        name: &'a Token,
        superclass: Option<&'a Expr>,
        methods: &'a [std::rc::Rc<FunctionDecl>],
        static_methods: &'a [std::rc::Rc<FunctionDecl>],
    ) {
        debug!("Resolving class '{}'", name.lexeme);

        let enclosing_class: ClassType = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(name);
        self.define(name);

        if let Some(superclass) = superclass {
            if let Expr::Variable { name: super_name, .. } = superclass {
                if super_name.lexeme == name.lexeme {
                    self.error(super_name, "A class can't inherit from itself.");
                }
            }

            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass);

            self.begin_scope();
            self.scope_insert("super");
        }

        // Static methods close over the `super` frame but never see `this`.
        let class_kind: ClassType = self.current_class;
        self.current_class = ClassType::StaticMethod;
        for method in static_methods {
            self.resolve_function(method, FunctionType::Method);
        }
        self.current_class = class_kind;

        self.begin_scope();
        self.scope_insert("this");

        for method in methods {
            self.resolve_function(method, FunctionType::Method);
        }

        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &'a Expr) {
        ensure_sufficient_stack(|| self.resolve_expr_inner(expr))
    }

    fn resolve_expr_inner(&mut self, expr: &'a Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                let in_own_initializer: bool = match self.scopes.last() {
                    Some(scope) => scope.get(name.lexeme.as_str()) == Some(&false),
                    None => self.global_initializer == Some(name.lexeme.as_str()),
                };

                if in_own_initializer {
                    self.error(name, "Can't read local variable in its own initializer.");
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::This { id, keyword } => match self.current_class {
                ClassType::None => {
                    self.error(keyword, "Can't use 'this' outside of a class.");
                }
                ClassType::StaticMethod => {
                    self.error(keyword, "Can't use 'this' in a static method.");
                }
                ClassType::Class | ClassType::Subclass => self.resolve_local(*id, keyword),
            },

            Expr::Super { id, keyword, .. } => match self.current_class {
                ClassType::None => {
                    self.error(keyword, "Can't use 'super' outside of a class.");
                }
                ClassType::Class => {
                    self.error(keyword, "Can't use 'super' in a class with no superclass.");
                }
                ClassType::StaticMethod => {
                    self.error(keyword, "Can't use 'super' in a static method.");
                }
                ClassType::Subclass => self.resolve_local(*id, keyword),
            },
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function’s parameters + body.  Loop context
    /// does not leak into the body: `break` there has no loop to leave.
    fn resolve_function(&mut self, declaration: &'a FunctionDecl, kind: FunctionType) {
        debug!("Resolving {:?} '{}'", kind, declaration.name.lexeme);

        let enclosing_function: FunctionType = self.current_function;
        let enclosing_loops: usize = self.loop_depth;
        self.current_function = kind;
        self.loop_depth = 0;

        self.begin_scope();
        for param in &declaration.params {
            self.declare(param);
            self.define(param);
        }
        for stmt in &declaration.body {
            self.resolve_stmt(stmt);
        }
        self.end_scope();

        self.current_function = enclosing_function;
        self.loop_depth = enclosing_loops;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Define a name that never appears as a declaration (`this`, `super`).
    fn scope_insert(&mut self, name: &'static str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, true);
        }
    }

    /// Globals may be redeclared; local scopes may not.
    fn declare(&mut self, name: &'a Token) {
        let duplicate: bool = match self.scopes.last_mut() {
            Some(scope) => scope.insert(name.lexeme.as_str(), false).is_some(),
            None => false,
        };

        if duplicate {
            self.error(name, "Already a variable with this name in this scope.");
        }
    }

    fn define(&mut self, name: &'a Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.as_str(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at depth `d`, or leave it
    /// unrecorded (global) if not found in *any* scope.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name.lexeme.as_str()) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);

                if self.current_function == FunctionType::None {
                    self.interpreter.resolve_transient(id, depth);
                } else {
                    self.interpreter.resolve(id, depth);
                }
                self.recorded.push(id);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
