//! Tree readers producing symbol and reference tables.
//!
//! Both readers make a single depth-first pass over the parser's tree. Helpers
//! in this module decode the small phrase shapes both of them need.

pub mod references;
pub mod symbols;
pub mod variables;

pub use references::ReferenceReader;
pub use symbols::SymbolReader;
pub use variables::VariableTable;

use crate::name_resolver::NameResolver;
use phpscope_api::models::{
    ParsedDocument, PhraseKind, Symbol, SymbolIdentifier, SymbolKind, SymbolModifiers, SyntaxNode,
    TokenKind,
};
use phpscope_api::type_string;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedName {
    pub name: String,
    pub alt_name: Option<String>,
}

pub(crate) fn is_name_phrase(kind: PhraseKind) -> bool {
    matches!(
        kind,
        PhraseKind::QualifiedName
            | PhraseKind::FullyQualifiedName
            | PhraseKind::RelativeQualifiedName
    )
}

/// `__construct` declares and names a constructor; any other method name is a
/// plain method.
pub(crate) fn method_kind(name: &str) -> SymbolKind {
    if name.eq_ignore_ascii_case("__construct") {
        SymbolKind::Constructor
    } else {
        SymbolKind::Method
    }
}

/// Source text of a name with any interior whitespace removed.
pub(crate) fn name_text(doc: &ParsedDocument, node: &SyntaxNode) -> String {
    doc.node_text(node)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Text of the first token of `kind` directly under `node`.
pub(crate) fn child_token_text(
    doc: &ParsedDocument,
    node: &SyntaxNode,
    kind: TokenKind,
) -> Option<String> {
    node.child_token(kind).map(|t| doc.token_text(t).to_string())
}

pub(crate) fn resolve_name(
    doc: &ParsedDocument,
    resolver: &NameResolver,
    node: &SyntaxNode,
    kind: SymbolKind,
) -> ResolvedName {
    let text = name_text(doc, node);
    match node.phrase_kind() {
        Some(PhraseKind::FullyQualifiedName) => ResolvedName {
            name: text.trim_start_matches('\\').to_string(),
            alt_name: None,
        },
        Some(PhraseKind::RelativeQualifiedName) => {
            let rest = text
                .get("namespace\\".len()..)
                .unwrap_or_default()
                .to_string();
            ResolvedName {
                name: resolver.resolve_relative(&rest),
                alt_name: None,
            }
        }
        _ => resolve_text(resolver, &text, kind),
    }
}

/// Resolves a qualified name as written. Unqualified functions and constants
/// inside a namespace keep their written form as the global fallback.
pub(crate) fn resolve_text(resolver: &NameResolver, text: &str, kind: SymbolKind) -> ResolvedName {
    let lower = text.to_ascii_lowercase();
    if matches!(lower.as_str(), "self" | "parent" | "static") {
        return ResolvedName {
            name: resolver.resolve_not_fully_qualified(text, kind, true),
            alt_name: Some(lower),
        };
    }

    let name = resolver.resolve_not_fully_qualified(text, kind, false);
    let alt_name = if matches!(kind, SymbolKind::Function | SymbolKind::Constant)
        && !text.contains('\\')
        && !resolver.namespace().is_empty()
        && !resolver.has_import(text, kind)
    {
        Some(text.to_string())
    } else {
        None
    };
    ResolvedName { name, alt_name }
}

/// Resolves every class name in a doc-declared type.
pub(crate) fn resolve_doc_type(resolver: &NameResolver, type_string: &str) -> String {
    type_string::name_resolve(type_string, |n| {
        resolver.resolve_not_fully_qualified(n, SymbolKind::Class, false)
    })
}

/// Decodes a `TypeDeclaration` phrase into a type string.
pub(crate) fn type_declaration(
    doc: &ParsedDocument,
    resolver: &NameResolver,
    node: &SyntaxNode,
) -> String {
    let mut nullable = false;
    let mut out = String::new();
    for child in node.children() {
        let part = match child {
            SyntaxNode::Token(t) => match t.kind {
                TokenKind::Question => {
                    nullable = true;
                    continue;
                }
                TokenKind::Array | TokenKind::Callable | TokenKind::Static => {
                    doc.token_text(t).to_ascii_lowercase()
                }
                _ => continue,
            },
            SyntaxNode::Phrase(p) if is_name_phrase(p.kind) => {
                let text = name_text(doc, child);
                if type_string::is_keyword(&text) {
                    text.to_ascii_lowercase()
                } else {
                    resolve_name(doc, resolver, child, SymbolKind::Class).name
                }
            }
            SyntaxNode::Phrase(_) => continue,
        };
        out = type_string::merge(&out, &part);
    }
    if nullable && !out.is_empty() {
        out = type_string::merge(&out, "null");
    }
    out
}

/// Type of a literal initialiser, empty for anything else.
pub(crate) fn literal_type(doc: &ParsedDocument, node: &SyntaxNode) -> String {
    match node {
        SyntaxNode::Token(t) => match t.kind {
            TokenKind::IntegerLiteral => "int".into(),
            TokenKind::FloatingLiteral => "float".into(),
            TokenKind::StringLiteral => "string".into(),
            _ => String::new(),
        },
        SyntaxNode::Phrase(p) => match p.kind {
            PhraseKind::ArrayCreationExpression => "array".into(),
            PhraseKind::ConstantAccessExpression => {
                match name_text(doc, node).to_ascii_lowercase().as_str() {
                    "true" | "false" => "bool".into(),
                    "null" => "null".into(),
                    _ => String::new(),
                }
            }
            PhraseKind::UnaryExpression | PhraseKind::EncapsulatedExpression => p
                .children
                .iter()
                .rev()
                .find(|c| !c.is_token(TokenKind::CloseParenthesis))
                .map(|c| literal_type(doc, c))
                .unwrap_or_default(),
            _ => String::new(),
        },
    }
}

pub(crate) fn modifiers(node: &SyntaxNode) -> SymbolModifiers {
    let mut out = SymbolModifiers::empty();
    for t in node.children().iter().filter_map(SyntaxNode::as_token) {
        out |= match t.kind {
            TokenKind::Public | TokenKind::Var => SymbolModifiers::PUBLIC,
            TokenKind::Protected => SymbolModifiers::PROTECTED,
            TokenKind::Private => SymbolModifiers::PRIVATE,
            TokenKind::Static => SymbolModifiers::STATIC,
            TokenKind::Abstract => SymbolModifiers::ABSTRACT,
            TokenKind::Final => SymbolModifiers::FINAL,
            TokenKind::ReadOnly => SymbolModifiers::READ_ONLY,
            _ => SymbolModifiers::empty(),
        };
    }
    out
}

fn use_kind(node: &SyntaxNode) -> Option<SymbolKind> {
    if node.child_token(TokenKind::Function).is_some() {
        Some(SymbolKind::Function)
    } else if node.child_token(TokenKind::Const).is_some() {
        Some(SymbolKind::Constant)
    } else {
        None
    }
}

fn use_clause(
    doc: &ParsedDocument,
    clause: &SyntaxNode,
    kind: SymbolKind,
    prefix: &str,
) -> Option<Symbol> {
    let name = clause.child_phrase(PhraseKind::NamespaceName)?;
    let written = name_text(doc, name);
    let target = if prefix.is_empty() {
        written
    } else {
        format!("{}\\{}", prefix, written)
    };
    let alias = clause
        .child_phrase(PhraseKind::NamespaceAliasingClause)
        .and_then(|a| child_token_text(doc, a, TokenKind::Name))
        .unwrap_or_else(|| phpscope_api::models::not_fqn(&target).to_string());

    let mut symbol = Symbol::new(kind, alias);
    symbol.modifiers = SymbolModifiers::USE;
    symbol.location = Some(doc.location(doc.node_range(clause)));
    symbol.associated = vec![SymbolIdentifier::new(kind, target)];
    Some(symbol)
}

/// Import symbols declared by a `use` statement, in clause order.
pub(crate) fn read_use_declaration(doc: &ParsedDocument, node: &SyntaxNode) -> Vec<Symbol> {
    let decl_kind = use_kind(node).unwrap_or(SymbolKind::Class);

    if let Some(list) = node.child_phrase(PhraseKind::NamespaceUseClauseList) {
        return list
            .children()
            .iter()
            .filter(|c| c.is_phrase(PhraseKind::NamespaceUseClause))
            .filter_map(|c| use_clause(doc, c, decl_kind, ""))
            .collect();
    }

    let prefix = node
        .child_phrase(PhraseKind::NamespaceName)
        .map(|n| name_text(doc, n))
        .unwrap_or_default();
    match node.child_phrase(PhraseKind::NamespaceUseGroupClauseList) {
        Some(list) => list
            .children()
            .iter()
            .filter(|c| c.is_phrase(PhraseKind::NamespaceUseGroupClause))
            .filter_map(|c| {
                let kind = use_kind(c).unwrap_or(decl_kind);
                use_clause(doc, c, kind, &prefix)
            })
            .collect(),
        None => Vec::new(),
    }
}
