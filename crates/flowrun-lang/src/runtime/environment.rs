use std::collections::HashMap;

use crate::error::ExecutionError;
use crate::runtime::value::Value;

/// Flat variable store shared by every block of one run. There is no
/// scoping: a name is declared once and lives until the run ends.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn declare(&mut self, name: &str, value: Value) -> Result<(), ExecutionError> {
        if self.contains(name) {
            return Err(ExecutionError::var("error.msg.var_already_defined").with("var_name", name));
        }
        self.vars.insert(name.to_string(), value);
        Ok(())
    }

    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), ExecutionError> {
        match self.vars.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(not_defined(name)),
        }
    }

    pub fn get(&self, name: &str) -> Result<&Value, ExecutionError> {
        self.vars.get(name).ok_or_else(|| not_defined(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

pub(crate) fn not_defined(name: &str) -> ExecutionError {
    ExecutionError::var("error.msg.var_not_defined").with("var_name", name)
}
