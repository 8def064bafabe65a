//! Namespace and import aware name resolution.

use phpscope_api::models::{ImportContext, Symbol, SymbolKind, SymbolModifiers};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct ClassContext {
    name: String,
    base: Option<String>,
}

/// Resolves names relative to the current namespace, imports and class.
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    namespace: String,
    imports: Vec<Arc<Symbol>>,
    classes: Vec<ClassContext>,
}

impl NameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_context(ctx: ImportContext) -> Self {
        Self {
            namespace: ctx.namespace,
            imports: ctx.imports,
            classes: Vec::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Entering a namespace drops the imports of the previous one.
    pub fn set_namespace(&mut self, name: impl Into<String>) {
        self.namespace = name.into();
        self.imports.clear();
    }

    pub fn add_import(&mut self, import: Arc<Symbol>) {
        if import.modifiers.contains(SymbolModifiers::USE) {
            self.imports.push(import);
        }
    }

    pub fn push_class(&mut self, class: &Symbol) {
        let base = class
            .associated
            .iter()
            .find(|a| a.kind == SymbolKind::Class)
            .map(|a| a.name.clone());
        self.classes.push(ClassContext {
            name: class.name.clone(),
            base,
        });
    }

    pub fn pop_class(&mut self) {
        self.classes.pop();
    }

    pub fn class_name(&self) -> Option<&str> {
        self.classes.last().map(|c| c.name.as_str())
    }

    pub fn class_base_name(&self) -> Option<&str> {
        self.classes.last().and_then(|c| c.base.as_deref())
    }

    pub fn resolve_relative(&self, name: &str) -> String {
        if name.is_empty() || self.namespace.is_empty() {
            return name.to_string();
        }
        format!("{}\\{}", self.namespace, name)
    }

    /// Resolves a name that does not start with `\`.
    ///
    /// `self` and `parent` map to the current class and its base. `static` and
    /// `$this` map to the current class only with `resolve_static`, otherwise
    /// they are returned as written.
    pub fn resolve_not_fully_qualified(
        &self,
        name: &str,
        kind: SymbolKind,
        resolve_static: bool,
    ) -> String {
        if name.is_empty() {
            return String::new();
        }

        match name.to_ascii_lowercase().as_str() {
            "self" => return self.class_name().unwrap_or(name).to_string(),
            "parent" => return self.class_base_name().unwrap_or(name).to_string(),
            "static" | "$this" => {
                if resolve_static {
                    return self.class_name().unwrap_or(name).to_string();
                }
                return name.to_string();
            }
            _ => {}
        }

        if let Some(pos) = name.find('\\') {
            let (first, rest) = name.split_at(pos);
            return match self.match_import(first, SymbolKind::Class) {
                Some(target) => format!("{}{}", target, rest),
                None => self.resolve_relative(name),
            };
        }

        match self.match_import(name, kind) {
            Some(target) => target.to_string(),
            None => self.resolve_relative(name),
        }
    }

    /// Whether `name` would be resolved through an import.
    pub fn has_import(&self, name: &str, kind: SymbolKind) -> bool {
        let first = name.split('\\').next().unwrap_or(name);
        let kind = if name.contains('\\') {
            SymbolKind::Class
        } else {
            kind
        };
        self.match_import(first, kind).is_some()
    }

    /// Import matching is case-sensitive for constants only.
    fn match_import(&self, text: &str, kind: SymbolKind) -> Option<&str> {
        self.imports
            .iter()
            .filter(|i| i.kind == kind)
            .find(|i| {
                if kind == SymbolKind::Constant {
                    i.name == text
                } else {
                    i.name.eq_ignore_ascii_case(text)
                }
            })
            .and_then(|i| i.associated.first())
            .map(|a| a.name.as_str())
    }
}
