use std::collections::HashMap;

use crate::{
    parser::prelude::{Expr, ExprId, Identifier, Program, Statement},
    resolver::prelude::{Problems, ResolveError, ResolveWarning},
    utils::prelude::{ResolveWarningEmitter, SrcSpan},
};

pub enum Outcome<T, E> {
    Ok(T),
    PartialFailure(T, E),
}

/// Reference-node identity mapped to the number of environment records to
/// cross from the evaluation site to the record declaring the name. Nodes
/// with no entry resolve in the global environment at run time.
pub type Bindings = HashMap<ExprId, usize>;

#[derive(Debug)]
pub struct Resolved {
    pub program: Program,
    pub bindings: Bindings,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FunctionContext {
    None,
    Function,
}

/// One lexical scope: names flagged `false` between declaration and the end
/// of their initializer, plus the bookkeeping for unused-local warnings.
#[derive(Debug, Default)]
struct Scope {
    declarations: HashMap<String, bool>,
    usages: HashMap<String, (SrcSpan, bool)>,
}

#[derive(Debug)]
pub struct Resolver {
    problems: Problems,
    scopes: Vec<Scope>,
    bindings: Bindings,
    current_function: FunctionContext,
    inside_loop: bool,
}

impl Resolver {
    pub fn resolve(
        program: Program,
        warnings: &ResolveWarningEmitter,
    ) -> Outcome<Resolved, Vec<ResolveError>> {
        let mut resolver = Resolver {
            problems: Default::default(),
            scopes: vec![],
            bindings: HashMap::new(),
            current_function: FunctionContext::None,
            inside_loop: false,
        };

        for statement in &program.statements {
            resolver.resolve_statement(statement);
        }

        resolver.problems.sort();

        for warning in resolver.problems.take_warnings() {
            warnings.emit(warning);
        }

        let errors = resolver.problems.take_errors();
        let resolved = Resolved {
            program,
            bindings: resolver.bindings,
        };

        if errors.is_empty() {
            Outcome::Ok(resolved)
        } else {
            Outcome::PartialFailure(resolved, errors)
        }
    }

    fn resolve_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Expression(statement) => self.resolve_expression(&statement.expression),
            Statement::Print(statement) => self.resolve_expression(&statement.expression),
            Statement::Var(declaration) => {
                self.declare(&declaration.name);
                if let Some(initializer) = &declaration.initializer {
                    self.resolve_expression(initializer);
                }
                self.define(&declaration.name.value);
            },
            Statement::Dictionary(declaration) => {
                self.declare(&declaration.name);
                self.define(&declaration.name.value);
            },
            Statement::Block(block) => {
                self.begin_scope();
                for statement in &block.statements {
                    self.resolve_statement(statement);
                }
                self.end_scope();
            },
            Statement::If(conditional) => {
                self.resolve_expression(&conditional.condition);
                self.resolve_statement(&conditional.resolution);
                if let Some(alternative) = &conditional.alternative {
                    self.resolve_statement(alternative);
                }
            },
            Statement::While(loop_) => {
                let enclosing = std::mem::replace(&mut self.inside_loop, true);

                self.resolve_expression(&loop_.condition);
                self.resolve_statement(&loop_.body);

                self.inside_loop = enclosing;
            },
            Statement::Function(declaration) => {
                self.declare(&declaration.name);
                self.define(&declaration.name.value);
                self.resolve_function(&declaration.params, &declaration.body);
            },
            Statement::Return(statement) => {
                if self.current_function == FunctionContext::None {
                    self.problems.error(ResolveError::ReturnOutsideFunction {
                        location: statement.location,
                    });
                }

                if let Some(value) = &statement.value {
                    self.resolve_expression(value);
                }
            },
            Statement::Break(statement) => {
                if !self.inside_loop {
                    self.problems.error(ResolveError::BreakOutsideLoop {
                        location: statement.location,
                    });
                }
            },
            Statement::Continue(statement) => {
                if !self.inside_loop {
                    self.problems.error(ResolveError::ContinueOutsideLoop {
                        location: statement.location,
                    });
                }
            },
        }
    }

    fn resolve_expression(&mut self, expression: &Expr) {
        match expression {
            Expr::Literal(_) => {},
            Expr::Grouping(grouping) => self.resolve_expression(&grouping.expression),
            Expr::Unary(unary) => self.resolve_expression(&unary.right),
            Expr::Binary(binary) => {
                self.resolve_expression(&binary.left);
                self.resolve_expression(&binary.right);
            },
            Expr::Logical(logical) => {
                self.resolve_expression(&logical.left);
                self.resolve_expression(&logical.right);
            },
            Expr::Ternary(ternary) => {
                self.resolve_expression(&ternary.condition);
                self.resolve_expression(&ternary.resolution);
                self.resolve_expression(&ternary.alternative);
            },
            Expr::Variable(variable) => {
                if let Some(scope) = self.scopes.last() {
                    if scope.declarations.get(&variable.name.value) == Some(&false) {
                        self.problems.error(ResolveError::SelfReferencingInitializer {
                            location: variable.name.location,
                            name: variable.name.value.clone(),
                        });
                    }
                }

                self.resolve_local(variable.id, &variable.name.value);
            },
            Expr::DictionaryIndex(index) => {
                self.resolve_expression(&index.index);
                self.resolve_local(index.id, &index.name.value);
            },
            Expr::Assign(assign) => {
                self.resolve_expression(&assign.value);
                self.resolve_local(assign.id, &assign.name.value);
            },
            Expr::DictionaryAssign(assign) => {
                self.resolve_expression(&assign.value);
                self.resolve_expression(&assign.index);
                self.resolve_local(assign.id, &assign.name.value);
            },
            Expr::Call(call) => {
                self.resolve_expression(&call.callee);
                for argument in &call.arguments {
                    self.resolve_expression(argument);
                }
            },
            Expr::Lambda(lambda) => {
                self.resolve_function(&lambda.params, &lambda.body);
            },
        }
    }

    fn resolve_function(&mut self, params: &[Identifier], body: &[Statement]) {
        let enclosing_function = std::mem::replace(&mut self.current_function, FunctionContext::Function);
        // A loop outside the function does not license break/continue
        // inside it; the flag restarts per function body.
        let enclosing_loop = std::mem::replace(&mut self.inside_loop, false);

        self.begin_scope();
        for param in params {
            self.declare(param);
            self.define(&param.value);
        }
        for statement in body {
            self.resolve_statement(statement);
        }
        self.end_scope();

        self.inside_loop = enclosing_loop;
        self.current_function = enclosing_function;
    }

    fn begin_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    fn end_scope(&mut self) {
        if let Some(scope) = self.scopes.pop() {
            let mut unused = scope.usages.into_iter()
                .filter(|(_, (_, used))| !used)
                .collect::<Vec<_>>();
            unused.sort_by_key(|(_, (location, _))| location.start);

            for (name, (location, _)) in unused {
                self.problems.warning(ResolveWarning::UnusedLocal { location, name });
            }
        }
    }

    fn declare(&mut self, name: &Identifier) {
        let Some(scope) = self.scopes.last_mut() else {
            // Top level: globals are late-bound and never tracked here.
            return;
        };

        if scope.declarations.contains_key(&name.value) {
            let location_a = scope.usages.get(&name.value)
                .map(|(location, _)| *location)
                .unwrap_or(name.location);

            self.problems.error(ResolveError::DuplicateDeclaration {
                location_a,
                location_b: name.location,
                name: name.value.clone(),
            });
        }

        scope.declarations.insert(name.value.clone(), false);
        scope.usages.insert(name.value.clone(), (name.location, false));
    }

    fn define(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.declarations.insert(name.to_string(), true);
        }
    }

    fn resolve_local(&mut self, id: ExprId, name: &str) {
        for (distance, scope) in self.scopes.iter_mut().rev().enumerate() {
            if scope.declarations.contains_key(name) {
                if let Some((_, used)) = scope.usages.get_mut(name) {
                    *used = true;
                }
                self.bindings.insert(id, distance);

                return;
            }
        }

        // Not found in any lexical scope: left unresolved on purpose, the
        // interpreter falls back to the global environment.
    }
}
