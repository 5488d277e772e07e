use std::{
    cell::RefCell,
    collections::HashMap,
    fmt::Display,
    hash::{Hash, Hasher},
    rc::Rc,
};

use crate::parser::prelude::{Identifier, Statement};
use super::environment::Environment;

pub type DictionaryRef = Rc<RefCell<HashMap<Value, Value>>>;

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Boolean(bool),
    Number(f64),
    String(String),
    Function(Rc<Function>),
    Native(Rc<NativeFunction>),
    Dictionary(DictionaryRef),
}

impl Value {
    /// Only `nil` and `false` are falsey; zero and the empty string are not.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Boolean(false))
    }
}

/// Value equality as the language sees it: structural for primitives,
/// identity for callables and dictionaries. Numbers compare by bit pattern,
/// which makes two NaN results equal to each other.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::Dictionary(a), Value::Dictionary(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);

        match self {
            Value::Nil => {},
            Value::Boolean(value) => value.hash(state),
            Value::Number(value) => value.to_bits().hash(state),
            Value::String(value) => value.hash(state),
            Value::Function(function) => Rc::as_ptr(function).hash(state),
            Value::Native(native) => Rc::as_ptr(native).hash(state),
            Value::Dictionary(dictionary) => Rc::as_ptr(dictionary).hash(state),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(value) => write!(f, "{value}"),
            Value::Number(value) => write!(f, "{value}"),
            Value::String(value) => write!(f, "{value}"),
            Value::Function(function) => match &function.name {
                Some(name) => write!(f, "<fn {name}>"),
                None => write!(f, "<lambda>"),
            },
            Value::Native(_) => write!(f, "<native fn>"),
            Value::Dictionary(_) => write!(f, "<dictionary>"),
        }
    }
}

/// A declared function or lambda: parameter list, shared body statements and
/// the environment captured at the point of definition.
pub struct Function {
    pub name: Option<String>,
    pub params: Vec<Identifier>,
    pub body: Rc<Vec<Statement>>,
    pub closure: Rc<RefCell<Environment>>,
}

impl Function {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

// The closure links back into environments that may hold this very
// function, so Debug stays shallow instead of chasing the cycle.
impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("arity", &self.arity())
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub call: fn(&[Value]) -> Result<Value, String>,
}
