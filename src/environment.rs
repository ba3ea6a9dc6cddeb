use super::value::Value;

use std::collections::BTreeMap;

// Frame 0 is the global frame and is never popped.
#[derive(Debug)]
pub struct Environment {
    values: Vec<BTreeMap<String, Value>>,
}

impl Environment {
    pub fn new() -> Environment {
        Environment {
            values: vec![BTreeMap::new()],
        }
    }
    pub fn push_frame(&mut self) {
        self.values.push(BTreeMap::new());
    }
    pub fn pop_frame(&mut self) {
        if self.values.len() > 1 {
            self.values.pop();
        }
    }
    pub fn depth(&self) -> usize {
        self.values.len()
    }
    pub fn define(&mut self, name: &str, value: Value) {
        if let Some(frame) = self.values.last_mut() {
            frame.insert(name.to_string(), value);
        }
    }
    pub fn get(&self, name: &str) -> Value {
        for cur in self.values.iter().rev() {
            if let Some(x) = cur.get(name) {
                return x.clone();
            }
        }
        Value::Nil
    }
    // Assign-or-declare.
    pub fn assign(&mut self, name: &str, value: Value) {
        for cur in self.values.iter_mut().rev() {
            if let Some(x) = cur.get_mut(name) {
                *x = value;
                return;
            }
        }
        self.define(name, value);
    }
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.values.first().and_then(|frame| frame.get(name))
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}
