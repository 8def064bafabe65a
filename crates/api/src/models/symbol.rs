use super::position::{Location, Range};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolKind {
    File,
    Namespace,
    Class,
    Interface,
    Trait,
    Function,
    Method,
    Constructor,
    Property,
    ClassConstant,
    Constant,
    Parameter,
    Variable,
}

impl SymbolKind {
    pub fn is_class_like(self) -> bool {
        matches!(
            self,
            SymbolKind::Class | SymbolKind::Interface | SymbolKind::Trait
        )
    }

    pub fn is_member(self) -> bool {
        matches!(
            self,
            SymbolKind::Method
                | SymbolKind::Constructor
                | SymbolKind::Property
                | SymbolKind::ClassConstant
        )
    }

    /// Kinds whose names compare case-sensitively in PHP.
    pub fn is_case_sensitive(self) -> bool {
        matches!(
            self,
            SymbolKind::Property
                | SymbolKind::Variable
                | SymbolKind::Parameter
                | SymbolKind::Constant
                | SymbolKind::ClassConstant
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::File => "file",
            SymbolKind::Namespace => "namespace",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::Trait => "trait",
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Constructor => "constructor",
            SymbolKind::Property => "property",
            SymbolKind::ClassConstant => "class constant",
            SymbolKind::Constant => "constant",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Variable => "variable",
        }
    }
}

bitflags! {
    #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[serde(transparent)]
    pub struct SymbolModifiers: u32 {
        const PUBLIC = 1 << 0;
        const PROTECTED = 1 << 1;
        const PRIVATE = 1 << 2;
        const FINAL = 1 << 3;
        const ABSTRACT = 1 << 4;
        const STATIC = 1 << 5;
        const READ_ONLY = 1 << 6;
        const WRITE_ONLY = 1 << 7;
        const MAGIC = 1 << 8;
        const ANONYMOUS = 1 << 9;
        const REFERENCE = 1 << 10;
        const VARIADIC = 1 << 11;
        const USE = 1 << 12;
    }
}

impl SymbolModifiers {
    pub const VISIBILITY: SymbolModifiers = SymbolModifiers::PUBLIC
        .union(SymbolModifiers::PROTECTED)
        .union(SymbolModifiers::PRIVATE);
}

/// Reference to another symbol by kind and fully-qualified name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolIdentifier {
    pub kind: SymbolKind,
    pub name: String,
}

impl SymbolIdentifier {
    pub fn new(kind: SymbolKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct PhpDocInfo {
    pub description: String,
    #[serde(rename = "type")]
    pub type_: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    pub location: Option<Location>,
    pub modifiers: SymbolModifiers,
    pub doc: Option<PhpDocInfo>,
    /// Declared or inferred type; empty when unknown.
    #[serde(rename = "type")]
    pub type_: String,
    pub associated: Vec<SymbolIdentifier>,
    pub children: Vec<Arc<Symbol>>,
    /// Fully-qualified name of the declaring type for members.
    pub scope: Option<String>,
    pub value: Option<String>,
}

impl Symbol {
    pub fn new(kind: SymbolKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            location: None,
            modifiers: SymbolModifiers::empty(),
            doc: None,
            type_: String::new(),
            associated: Vec::new(),
            children: Vec::new(),
            scope: None,
            value: None,
        }
    }

    pub fn range(&self) -> Option<Range> {
        self.location.as_ref().map(|l| l.range)
    }

    pub fn identifier(&self) -> SymbolIdentifier {
        SymbolIdentifier::new(self.kind, self.name.clone())
    }

    pub fn is_class_like(&self) -> bool {
        self.kind.is_class_like()
    }

    pub fn is_member(&self) -> bool {
        self.kind.is_member()
    }

    pub fn has(&self, modifiers: SymbolModifiers) -> bool {
        self.modifiers.intersects(modifiers)
    }

    /// Members with no explicit visibility are public.
    pub fn is_private(&self) -> bool {
        self.modifiers.contains(SymbolModifiers::PRIVATE)
    }

    pub fn doc_has_inherit(&self) -> bool {
        self.doc
            .as_ref()
            .map(|d| d.description.to_ascii_lowercase().contains("inheritdoc"))
            .unwrap_or(false)
    }

    pub fn has_doc(&self) -> bool {
        self.doc
            .as_ref()
            .map(|d| !d.description.is_empty() || !d.type_.is_empty())
            .unwrap_or(false)
    }

    pub fn parameters(&self) -> impl Iterator<Item = &Arc<Symbol>> {
        self.children
            .iter()
            .filter(|c| c.kind == SymbolKind::Parameter)
    }

    /// Case-folded name comparison for the kinds PHP treats case-insensitively.
    pub fn name_equals(&self, name: &str) -> bool {
        if self.kind.is_case_sensitive() {
            self.name == name
        } else {
            self.name.eq_ignore_ascii_case(name)
        }
    }

    /// `(Type $a, $b = 1): Ret` for functions and methods.
    pub fn signature_string(&self) -> String {
        let params: Vec<String> = self
            .parameters()
            .map(|p| {
                let mut out = String::new();
                if !p.type_.is_empty() {
                    out.push_str(&p.type_);
                    out.push(' ');
                }
                if p.modifiers.contains(SymbolModifiers::REFERENCE) {
                    out.push('&');
                }
                if p.modifiers.contains(SymbolModifiers::VARIADIC) {
                    out.push_str("...");
                }
                out.push_str(&p.name);
                if let Some(value) = &p.value {
                    out.push_str(" = ");
                    out.push_str(value);
                }
                out
            })
            .collect();
        let mut sig = format!("({})", params.join(", "));
        if !self.type_.is_empty() {
            sig.push_str(": ");
            sig.push_str(&self.type_);
        }
        sig
    }
}

/// Last segment of a namespaced name.
pub fn not_fqn(name: &str) -> &str {
    match name.rfind('\\') {
        Some(i) => &name[i + 1..],
        None => name,
    }
}

/// Everything before the last namespace separator, or empty.
pub fn namespace_of(name: &str) -> &str {
    match name.rfind('\\') {
        Some(i) => &name[..i],
        None => "",
    }
}

/// Case-folded search keys for a symbol name.
///
/// Namespaces get only their full name. Everything else also gets its short
/// name plus a suffix starting at each word boundary, where a boundary is the
/// character after `$` or `_` or an upper-case character following a
/// non-upper-case one.
pub fn symbol_keys(kind: SymbolKind, name: &str) -> Vec<String> {
    let full = name.to_lowercase();
    if kind == SymbolKind::Namespace {
        return vec![full];
    }

    let mut keys = vec![full];
    let short = not_fqn(name);
    let chars: Vec<char> = short.chars().collect();
    let lower: Vec<char> = short.to_lowercase().chars().collect();
    push_unique(&mut keys, lower.iter().collect());

    // to_lowercase may change the char count for exotic input
    if chars.len() != lower.len() {
        return keys;
    }

    let mut n = 0;
    while n < chars.len() {
        let c = chars[n];
        if (c == '$' || c == '_') && n + 1 < chars.len() && chars[n + 1] != '_' {
            n += 1;
            push_unique(&mut keys, lower[n..].iter().collect());
        } else if n > 0 && c != lower[n] && chars[n - 1] == lower[n - 1] {
            push_unique(&mut keys, lower[n..].iter().collect());
        }
        n += 1;
    }
    keys
}

fn push_unique(keys: &mut Vec<String>, key: String) {
    if !key.is_empty() && !keys.contains(&key) {
        keys.push(key);
    }
}
