use crate::ast::Statement;
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Debug)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Statement>,
}

impl Function {
    pub fn new(name: String, params: Vec<String>, body: Vec<Statement>) -> Function {
        Function { name, params, body }
    }
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[derive(Debug, Default)]
pub struct FunctionTable {
    functions: BTreeMap<String, Rc<Function>>,
}

impl FunctionTable {
    pub fn new() -> FunctionTable {
        FunctionTable::default()
    }
    pub fn declare(&mut self, function: Rc<Function>) {
        self.functions.insert(function.name.clone(), function);
    }
    pub fn get(&self, name: &str) -> Option<Rc<Function>> {
        self.functions.get(name).cloned()
    }
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
}

#[cfg(test)]
mod callable_tests {
    use super::{Function, FunctionTable};
    use std::rc::Rc;

    #[test]
    fn redeclaring_overwrites() {
        let mut table = FunctionTable::new();
        assert!(!table.contains("f"));
        table.declare(Rc::new(Function::new("f".to_string(), vec![], vec![])));
        table.declare(Rc::new(Function::new(
            "f".to_string(),
            vec!["a".to_string(), "b".to_string()],
            vec![],
        )));
        let f = table.get("f").unwrap();
        assert_eq!(f.arity(), 2);
        assert_eq!(f.name, "f");
        assert!(table.get("g").is_none());
    }
}
