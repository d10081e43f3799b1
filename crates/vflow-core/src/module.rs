use crate::function::Function;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Whole-program unit handed over by a front end: every function the build
/// and the points-to fixpoint will see. Immutable once constructed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Module {
    pub functions: IndexMap<String, Function>,
}

impl Module {
    pub fn new() -> Self {
        Self {
            functions: IndexMap::new(),
        }
    }

    pub fn add_function(&mut self, function: Function) {
        self.functions.insert(function.name.clone(), function);
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }
}
