//! Variable types per lexical scope, with branch reconciliation.

use phpscope_api::type_string;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetKind {
    Scope,
    Branch,
}

#[derive(Debug, Clone)]
struct VariableSet {
    kind: SetKind,
    variables: HashMap<String, String>,
    /// Closed sibling branches waiting to be merged into this set.
    branches: Vec<VariableSet>,
}

impl VariableSet {
    fn new(kind: SetKind) -> Self {
        Self {
            kind,
            variables: HashMap::new(),
            branches: Vec::new(),
        }
    }

    fn merge_from(&mut self, other: VariableSet) {
        for (name, ty) in other.variables {
            match self.variables.get_mut(&name) {
                Some(existing) => *existing = type_string::merge(existing, &ty),
                None => {
                    self.variables.insert(name, ty);
                }
            }
        }
    }
}

/// Stack of variable sets.
///
/// A function or closure pushes a scope; lookups never cross a scope
/// boundary. Conditional constructs push one branch per arm; when the
/// construct closes the arms are merged into the enclosing set by union.
#[derive(Debug, Clone)]
pub struct VariableTable {
    stack: Vec<VariableSet>,
}

impl Default for VariableTable {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableTable {
    pub fn new() -> Self {
        Self {
            stack: vec![VariableSet::new(SetKind::Scope)],
        }
    }

    pub fn set_type(&mut self, name: &str, ty: &str) {
        if let Some(top) = self.stack.last_mut() {
            top.variables.insert(name.to_string(), ty.to_string());
        }
    }

    pub fn get_type(&self, name: &str) -> String {
        for set in self.stack.iter().rev() {
            if let Some(ty) = set.variables.get(name) {
                return ty.clone();
            }
            if set.kind == SetKind::Scope {
                break;
            }
        }
        String::new()
    }

    /// Opens a scope seeded with the current types of `carry`.
    pub fn push_scope(&mut self, carry: &[&str]) {
        let mut set = VariableSet::new(SetKind::Scope);
        for name in carry {
            let ty = self.get_type(name);
            set.variables.insert(name.to_string(), ty);
        }
        self.stack.push(set);
    }

    pub fn pop_scope(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    pub fn push_branch(&mut self) {
        self.stack.push(VariableSet::new(SetKind::Branch));
    }

    /// Closes the current branch and parks it on its parent until pruned.
    pub fn pop_branch(&mut self) {
        let is_branch = self
            .stack
            .last()
            .map(|s| s.kind == SetKind::Branch)
            .unwrap_or(false);
        if !is_branch {
            return;
        }
        if let Some(branch) = self.stack.pop() {
            if let Some(parent) = self.stack.last_mut() {
                parent.branches.push(branch);
            }
        }
    }

    /// Merges parked branches into the current set.
    pub fn prune_branches(&mut self) {
        if let Some(top) = self.stack.last_mut() {
            let branches = std::mem::take(&mut top.branches);
            for branch in branches {
                top.merge_from(branch);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branches_merge_by_union() {
        let mut t = VariableTable::new();
        t.set_type("$a", "int");

        t.push_branch();
        t.set_type("$a", "string");
        t.set_type("$b", "Foo");
        t.pop_branch();
        t.push_branch();
        assert_eq!(t.get_type("$a"), "int");
        assert_eq!(t.get_type("$b"), "");
        t.set_type("$b", "Bar");
        t.pop_branch();
        t.prune_branches();

        assert_eq!(t.get_type("$a"), "int|string");
        assert_eq!(t.get_type("$b"), "Foo|Bar");
    }

    #[test]
    fn scopes_isolate_and_carry() {
        let mut t = VariableTable::new();
        t.set_type("$outer", "Foo");
        t.set_type("$hidden", "int");
        t.push_scope(&["$outer"]);
        assert_eq!(t.get_type("$outer"), "Foo");
        assert_eq!(t.get_type("$hidden"), "");
        t.set_type("$outer", "Bar");
        t.pop_scope();
        assert_eq!(t.get_type("$outer"), "Foo");
    }
}
