#[cfg(test)]
mod tests;

pub mod error;

pub mod prelude {
    pub use super::{error::*, Execution, Interpreter};
}

use std::{cell::RefCell, io::Write, rc::Rc};

use crate::{
    environment::prelude::{DictionaryRef, Environment, Function, NativeFunction, Value},
    lexer::prelude::Token,
    parser::prelude::{
        Assign, Binary, Call, DictionaryAssign, DictionaryIndex, Expr, Literal,
        LiteralValue, Logical, Program, Statement, Unary, Variable,
    },
    resolver::prelude::Bindings,
};
use error::RuntimeError;

/// Outcome of executing one statement. `Return`, `Break` and `Continue` are
/// propagated upward by every caller until the nearest call frame or loop
/// consumes them.
#[derive(Debug, Clone, PartialEq)]
pub enum Execution {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// Tree-walking evaluator. The current environment is swapped out around
/// block and call execution; the resolver's binding table shortcuts every
/// resolved name lookup to a direct ancestor jump.
pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    bindings: Bindings,
    output: Box<dyn Write>,
}

impl Interpreter {
    pub fn new(bindings: Bindings) -> Self {
        Self::with_output(bindings, Box::new(std::io::stdout()))
    }

    pub fn with_output(bindings: Bindings, output: Box<dyn Write>) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        Self {
            environment: Rc::clone(&globals),
            globals,
            bindings,
            output,
        }
    }

    pub fn globals(&self) -> Rc<RefCell<Environment>> {
        Rc::clone(&self.globals)
    }

    /// Merges another resolver pass into the binding table. The REPL runs
    /// one pass per input line; node ids stay unique across lines as long
    /// as the parser id counter is threaded through (`Parser::with_first_id`).
    pub fn extend_bindings(&mut self, bindings: Bindings) {
        self.bindings.extend(bindings);
    }

    pub fn define_native(
        &mut self,
        name: &'static str,
        arity: usize,
        call: fn(&[Value]) -> Result<Value, String>,
    ) {
        self.globals.borrow_mut().define(
            name.to_string(),
            Value::Native(Rc::new(NativeFunction { name, arity, call })),
        );
    }

    pub fn interpret(&mut self, program: &Program) -> Result<(), RuntimeError> {
        // A program that is exactly one bare expression statement echoes its
        // value, so `1 + 2` works as a calculator line.
        if let [Statement::Expression(statement)] = program.statements.as_slice() {
            let value = self.evaluate(&statement.expression)?;

            if value != Value::Nil {
                let _ = writeln!(self.output, "{value}");
            }

            return Ok(());
        }

        for statement in &program.statements {
            self.execute_statement(statement)?;
        }

        Ok(())
    }

    fn execute_statement(&mut self, statement: &Statement) -> Result<Execution, RuntimeError> {
        match statement {
            Statement::Expression(statement) => {
                self.evaluate(&statement.expression)?;

                Ok(Execution::Normal)
            },
            Statement::Print(statement) => {
                let value = self.evaluate(&statement.expression)?;
                let _ = writeln!(self.output, "{value}");

                Ok(Execution::Normal)
            },
            Statement::Var(declaration) => {
                let value = match &declaration.initializer {
                    Some(initializer) => self.evaluate(initializer)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut()
                    .define(declaration.name.value.clone(), value);

                Ok(Execution::Normal)
            },
            Statement::Dictionary(declaration) => {
                self.environment.borrow_mut()
                    .define_dictionary(declaration.name.value.clone(), DictionaryRef::default());

                Ok(Execution::Normal)
            },
            Statement::Block(block) => {
                let environment = Environment::with_enclosing(Rc::clone(&self.environment));

                self.execute_block(&block.statements, Rc::new(RefCell::new(environment)))
            },
            Statement::If(conditional) => {
                if self.evaluate(&conditional.condition)?.is_truthy() {
                    self.execute_statement(&conditional.resolution)
                } else if let Some(alternative) = &conditional.alternative {
                    self.execute_statement(alternative)
                } else {
                    Ok(Execution::Normal)
                }
            },
            Statement::While(loop_) => {
                while self.evaluate(&loop_.condition)?.is_truthy() {
                    match self.execute_statement(&loop_.body)? {
                        Execution::Break => break,
                        Execution::Normal | Execution::Continue => {},
                        outcome @ Execution::Return(_) => return Ok(outcome),
                    }
                }

                Ok(Execution::Normal)
            },
            Statement::Function(declaration) => {
                let function = Function {
                    name: Some(declaration.name.value.clone()),
                    params: declaration.params.clone(),
                    body: Rc::clone(&declaration.body),
                    closure: Rc::clone(&self.environment),
                };

                self.environment.borrow_mut().define(
                    declaration.name.value.clone(),
                    Value::Function(Rc::new(function)),
                );

                Ok(Execution::Normal)
            },
            Statement::Return(statement) => {
                let value = match &statement.value {
                    Some(value) => self.evaluate(value)?,
                    None => Value::Nil,
                };

                Ok(Execution::Return(value))
            },
            Statement::Break(_) => Ok(Execution::Break),
            Statement::Continue(_) => Ok(Execution::Continue),
        }
    }

    /// Runs statements in the given environment, restoring the previous one
    /// on every exit path, early transfers and errors included.
    fn execute_block(
        &mut self,
        statements: &[Statement],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<Execution, RuntimeError> {
        let previous = std::mem::replace(&mut self.environment, environment);

        let mut outcome = Ok(Execution::Normal);

        for statement in statements {
            match self.execute_statement(statement) {
                Ok(Execution::Normal) => continue,
                other => {
                    outcome = other;
                    break;
                }
            }
        }

        self.environment = previous;
        outcome
    }

    fn evaluate(&mut self, expression: &Expr) -> Result<Value, RuntimeError> {
        match expression {
            Expr::Literal(literal) => Ok(literal_value(literal)),
            Expr::Grouping(grouping) => self.evaluate(&grouping.expression),
            Expr::Unary(unary) => self.eval_unary(unary),
            Expr::Binary(binary) => self.eval_binary(binary),
            Expr::Logical(logical) => self.eval_logical(logical),
            Expr::Ternary(ternary) => {
                if self.evaluate(&ternary.condition)?.is_truthy() {
                    self.evaluate(&ternary.resolution)
                } else {
                    self.evaluate(&ternary.alternative)
                }
            },
            Expr::Variable(variable) => self.look_up_variable(variable),
            Expr::DictionaryIndex(index) => self.eval_dictionary_index(index),
            Expr::Assign(assign) => self.eval_assign(assign),
            Expr::DictionaryAssign(assign) => self.eval_dictionary_assign(assign),
            Expr::Call(call) => self.eval_call(call),
            Expr::Lambda(lambda) => Ok(Value::Function(Rc::new(Function {
                name: None,
                params: lambda.params.clone(),
                body: Rc::clone(&lambda.body),
                closure: Rc::clone(&self.environment),
            }))),
        }
    }

    fn eval_unary(&mut self, unary: &Unary) -> Result<Value, RuntimeError> {
        let right = self.evaluate(&unary.right)?;

        match unary.operator {
            Token::Bang => Ok(Value::Boolean(!right.is_truthy())),
            Token::Minus => match right {
                Value::Number(value) => Ok(Value::Number(-value)),
                _ => Err(RuntimeError::ExpectedNumberOperand {
                    location: unary.location,
                    operator: unary.operator.clone(),
                }),
            },
            _ => Err(RuntimeError::InvalidUnaryOperator {
                location: unary.location,
                operator: unary.operator.clone(),
            }),
        }
    }

    fn eval_binary(&mut self, binary: &Binary) -> Result<Value, RuntimeError> {
        let left = self.evaluate(&binary.left)?;
        let right = self.evaluate(&binary.right)?;

        match &binary.operator {
            Token::EqualEqual => Ok(Value::Boolean(left == right)),
            Token::BangEqual => Ok(Value::Boolean(left != right)),
            Token::Plus => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
                (Value::String(a), Value::Number(b)) => {
                    Ok(Value::String(format!("{a}{}", Value::Number(b))))
                },
                (Value::Number(a), Value::String(b)) => {
                    Ok(Value::String(format!("{}{b}", Value::Number(a))))
                },
                _ => Err(RuntimeError::InvalidAdditionOperands { location: binary.location }),
            },
            operator => {
                let (Value::Number(a), Value::Number(b)) = (&left, &right) else {
                    return Err(RuntimeError::ExpectedNumberOperands {
                        location: binary.location,
                        operator: operator.clone(),
                    });
                };
                let (a, b) = (*a, *b);

                Ok(match operator {
                    Token::Greater => Value::Boolean(a > b),
                    Token::GreaterEqual => Value::Boolean(a >= b),
                    Token::Less => Value::Boolean(a < b),
                    Token::LessEqual => Value::Boolean(a <= b),
                    Token::Minus => Value::Number(a - b),
                    Token::Star => Value::Number(a * b),
                    Token::Slash => Value::Number(a / b),
                    Token::Percent => Value::Number(a % b),
                    _ => return Err(RuntimeError::ExpectedNumberOperands {
                        location: binary.location,
                        operator: operator.clone(),
                    }),
                })
            }
        }
    }

    fn eval_logical(&mut self, logical: &Logical) -> Result<Value, RuntimeError> {
        let left = self.evaluate(&logical.left)?;

        match logical.operator {
            Token::Or if left.is_truthy() => Ok(left),
            Token::And if !left.is_truthy() => Ok(left),
            _ => self.evaluate(&logical.right),
        }
    }

    fn look_up_variable(&self, variable: &Variable) -> Result<Value, RuntimeError> {
        match self.bindings.get(&variable.id) {
            Some(distance) => Ok(Environment::get_at(
                &self.environment,
                *distance,
                &variable.name.value,
            )),
            None => self.globals.borrow()
                .get(&variable.name.value)
                .ok_or_else(|| RuntimeError::UndefinedVariable {
                    location: variable.name.location,
                    name: variable.name.value.clone(),
                }),
        }
    }

    fn eval_dictionary_index(&mut self, index: &DictionaryIndex) -> Result<Value, RuntimeError> {
        let key = self.evaluate(&index.index)?;

        let dictionary = match self.bindings.get(&index.id) {
            Some(distance) => Environment::get_dictionary_at(
                &self.environment,
                *distance,
                &index.name.value,
            ),
            None => self.globals.borrow().get_dictionary(&index.name.value),
        };

        match dictionary {
            Some(dictionary) => {
                let value = dictionary.borrow().get(&key).cloned().unwrap_or(Value::Nil);

                Ok(value)
            },
            None => Err(RuntimeError::UndefinedDictionary {
                location: index.name.location,
                name: index.name.value.clone(),
            }),
        }
    }

    fn eval_assign(&mut self, assign: &Assign) -> Result<Value, RuntimeError> {
        let value = self.evaluate(&assign.value)?;

        match self.bindings.get(&assign.id) {
            Some(distance) => Environment::assign_at(
                &self.environment,
                *distance,
                &assign.name.value,
                value.clone(),
            ),
            None => {
                if !self.globals.borrow_mut().assign(&assign.name.value, value.clone()) {
                    return Err(RuntimeError::UndefinedVariable {
                        location: assign.name.location,
                        name: assign.name.value.clone(),
                    });
                }
            }
        }

        Ok(value)
    }

    fn eval_dictionary_assign(&mut self, assign: &DictionaryAssign) -> Result<Value, RuntimeError> {
        let value = self.evaluate(&assign.value)?;
        let key = self.evaluate(&assign.index)?;

        // The entry lands in the current record first, creating the
        // dictionary there if needed, and then in the resolved binding.
        self.environment.borrow_mut().define_dictionary_index(
            &assign.name.value,
            key.clone(),
            value.clone(),
        );

        let assigned = match self.bindings.get(&assign.id) {
            Some(distance) => Environment::assign_dictionary_at(
                &self.environment,
                *distance,
                &assign.name.value,
                key,
                value.clone(),
            ),
            None => self.globals.borrow_mut().assign_dictionary(
                &assign.name.value,
                key,
                value.clone(),
            ),
        };

        if !assigned {
            return Err(RuntimeError::UndefinedDictionary {
                location: assign.name.location,
                name: assign.name.value.clone(),
            });
        }

        Ok(value)
    }

    fn eval_call(&mut self, call: &Call) -> Result<Value, RuntimeError> {
        let callee = self.evaluate(&call.callee)?;

        let mut arguments = Vec::with_capacity(call.arguments.len());
        for argument in &call.arguments {
            arguments.push(self.evaluate(argument)?);
        }

        match callee {
            Value::Function(function) => {
                if arguments.len() != function.arity() {
                    return Err(RuntimeError::ArityMismatch {
                        location: call.paren,
                        expected: function.arity(),
                        got: arguments.len(),
                    });
                }

                self.call_function(&function, arguments)
            },
            Value::Native(native) => {
                if arguments.len() != native.arity {
                    return Err(RuntimeError::ArityMismatch {
                        location: call.paren,
                        expected: native.arity,
                        got: arguments.len(),
                    });
                }

                (native.call)(&arguments)
                    .map_err(|message| RuntimeError::Native {
                        location: call.paren,
                        message,
                    })
            },
            _ => Err(RuntimeError::NotCallable { location: call.paren }),
        }
    }

    fn call_function(
        &mut self,
        function: &Function,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        // The frame is parented at the function's captured closure, not at
        // the caller's environment.
        let mut environment = Environment::with_enclosing(Rc::clone(&function.closure));

        for (param, argument) in function.params.iter().zip(arguments) {
            // A dictionary argument is bound twice: as the whole value in
            // the scalar namespace and as an indexable name.
            if let Value::Dictionary(dictionary) = &argument {
                environment.define_dictionary(param.value.clone(), Rc::clone(dictionary));
            }

            environment.define(param.value.clone(), argument);
        }

        match self.execute_block(&function.body, Rc::new(RefCell::new(environment)))? {
            Execution::Return(value) => Ok(value),
            Execution::Normal | Execution::Break | Execution::Continue => Ok(Value::Nil),
        }
    }
}

fn literal_value(literal: &Literal) -> Value {
    match &literal.value {
        LiteralValue::Number(value) => Value::Number(*value),
        LiteralValue::String(value) => Value::String(value.clone()),
        LiteralValue::Boolean(value) => Value::Boolean(*value),
        LiteralValue::Nil => Value::Nil,
    }
}
