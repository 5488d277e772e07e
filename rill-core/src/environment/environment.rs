use std::{cell::RefCell, collections::HashMap, rc::Rc};

use super::value::{DictionaryRef, Value};

/// One activation record. Scalars and dictionaries live in independent maps
/// so the same identifier can be bound in both namespaces at once. The
/// enclosing link is fixed at construction; records are never re-parented.
#[derive(Debug, Default)]
pub struct Environment {
    enclosing: Option<Rc<RefCell<Environment>>>,
    values: HashMap<String, Value>,
    dictionaries: HashMap<String, DictionaryRef>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Self {
            enclosing: Some(enclosing),
            ..Default::default()
        }
    }

    /// Always succeeds; redefining an existing name silently replaces it so
    /// top-level declarations can be re-run.
    pub fn define(&mut self, name: String, value: Value) {
        self.values.insert(name, value);
    }

    pub fn define_dictionary(&mut self, name: String, dictionary: DictionaryRef) {
        self.dictionaries.insert(name, dictionary);
    }

    /// Writes one dictionary entry, creating the named dictionary in *this*
    /// record if it does not exist yet.
    pub fn define_dictionary_index(&mut self, name: &str, key: Value, value: Value) {
        let dictionary = self.dictionaries
            .entry(name.to_string())
            .or_default();

        dictionary.borrow_mut().insert(key, value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }

        self.enclosing.as_ref()
            .and_then(|enclosing| enclosing.borrow().get(name))
    }

    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            return true;
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign(name, value),
            None => false,
        }
    }

    pub fn get_dictionary(&self, name: &str) -> Option<DictionaryRef> {
        if let Some(dictionary) = self.dictionaries.get(name) {
            return Some(Rc::clone(dictionary));
        }

        self.enclosing.as_ref()
            .and_then(|enclosing| enclosing.borrow().get_dictionary(name))
    }

    pub fn assign_dictionary(&mut self, name: &str, key: Value, value: Value) -> bool {
        if let Some(dictionary) = self.dictionaries.get(name) {
            dictionary.borrow_mut().insert(key, value);
            return true;
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign_dictionary(name, key, value),
            None => false,
        }
    }

    pub fn ancestor(
        environment: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Option<Rc<RefCell<Environment>>> {
        let mut environment = Rc::clone(environment);

        for _ in 0..distance {
            let enclosing = environment.borrow().enclosing.clone();
            environment = enclosing?;
        }

        Some(environment)
    }

    /// Direct jump to the record at exactly `distance` hops; no chain walk.
    /// A name missing from that record reads as `nil`.
    pub fn get_at(
        environment: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
    ) -> Value {
        Self::ancestor(environment, distance)
            .and_then(|record| record.borrow().values.get(name).cloned())
            .unwrap_or(Value::Nil)
    }

    pub fn assign_at(
        environment: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
    ) {
        if let Some(record) = Self::ancestor(environment, distance) {
            record.borrow_mut().values.insert(name.to_string(), value);
        }
    }

    pub fn get_dictionary_at(
        environment: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
    ) -> Option<DictionaryRef> {
        Self::ancestor(environment, distance)
            .and_then(|record| record.borrow().dictionaries.get(name).map(Rc::clone))
    }

    pub fn assign_dictionary_at(
        environment: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        key: Value,
        value: Value,
    ) -> bool {
        match Self::get_dictionary_at(environment, distance, name) {
            Some(dictionary) => {
                dictionary.borrow_mut().insert(key, value);
                true
            },
            None => false,
        }
    }
}
