//! Tree to symbol table.
//!
//! Declarations open a frame on entry and are attached to the enclosing frame
//! on exit, so one traversal yields the finished, already-named tree. Headers,
//! properties, constants and imports are small enough to decode in place
//! without descending.

use super::{
    child_token_text, is_name_phrase, literal_type, method_kind, modifiers, name_text,
    read_use_declaration, resolve_doc_type, resolve_name, type_declaration,
};
use crate::name_resolver::NameResolver;
use crate::phpdoc::{PhpDoc, Tag, TagKind};
use phpscope_api::models::{
    ParsedDocument, PhpDocInfo, PhraseKind, Range, Symbol, SymbolIdentifier, SymbolKind,
    SymbolModifiers, SymbolTable, SyntaxNode, Token, TokenKind, TreeVisitor, not_fqn, walk,
};
use phpscope_api::type_string;
use std::sync::Arc;

pub const CLOSURE_NAME: &str = "{closure}";

/// Declared types that a doc type may refine.
const LOOSE_TYPES: &[&str] = &["array", "iterable", "mixed", "object", "callable", "null"];

pub struct SymbolReader<'a> {
    doc: &'a ParsedDocument,
    resolver: NameResolver,
    frames: Vec<Symbol>,
    last_doc: Option<(PhpDoc, Range)>,
}

impl<'a> SymbolReader<'a> {
    pub fn new(doc: &'a ParsedDocument) -> Self {
        let mut root = Symbol::new(SymbolKind::File, doc.uri.clone());
        root.location = Some(doc.location(doc.full_range()));
        Self {
            doc,
            resolver: NameResolver::new(),
            frames: vec![root],
            last_doc: None,
        }
    }

    pub fn read(doc: &ParsedDocument) -> SymbolTable {
        let mut reader = SymbolReader::new(doc);
        walk(&doc.tree, &mut reader);
        reader.finish()
    }

    pub fn finish(mut self) -> SymbolTable {
        while self.frames.len() > 1 {
            self.pop_frame();
        }
        let root = self
            .frames
            .pop()
            .unwrap_or_else(|| Symbol::new(SymbolKind::File, self.doc.uri.clone()));
        tracing::debug!(
            "read {} top-level symbols from {}",
            root.children.len(),
            self.doc.uri
        );
        SymbolTable::new(self.doc.uri.clone(), root)
    }

    fn location(&self, node: &SyntaxNode) -> Option<phpscope_api::models::Location> {
        Some(self.doc.location(self.doc.node_range(node)))
    }

    fn token_location(&self, token: &Token) -> Option<phpscope_api::models::Location> {
        Some(self.doc.location(self.doc.token_range(token)))
    }

    fn take_doc(&mut self) -> Option<(PhpDoc, Range)> {
        self.last_doc.take()
    }

    /// Simple name of the enclosing class-like declaration, the `scope` of
    /// every member.
    fn declaring_type(&self) -> Option<String> {
        self.resolver.class_name().map(|n| not_fqn(n).to_string())
    }

    fn add_child(&mut self, symbol: Symbol) {
        let Some(top) = self.frames.last_mut() else {
            return;
        };
        if symbol.kind == SymbolKind::Variable
            && top.children.iter().any(|c| {
                matches!(c.kind, SymbolKind::Variable | SymbolKind::Parameter)
                    && c.name == symbol.name
            })
        {
            return;
        }
        top.children.push(Arc::new(symbol));
    }

    fn pop_frame(&mut self) {
        if self.frames.len() <= 1 {
            return;
        }
        if let Some(symbol) = self.frames.pop() {
            self.add_child(symbol);
        }
    }

    fn token(&mut self, token: &Token) {
        match token.kind {
            TokenKind::DocumentComment => {
                let text = self.doc.token_text(token);
                self.last_doc = Some((PhpDoc::parse(text), self.doc.token_range(token)));
            }
            TokenKind::OpenBrace | TokenKind::CloseBrace | TokenKind::Semicolon => {
                self.last_doc = None;
            }
            _ => {}
        }
    }

    fn namespace_definition(&mut self, node: &SyntaxNode) {
        let name = node
            .child_phrase(PhraseKind::NamespaceName)
            .map(|n| name_text(self.doc, n))
            .unwrap_or_default();
        self.resolver.set_namespace(name.clone());
        let mut symbol = Symbol::new(SymbolKind::Namespace, name);
        symbol.location = self.location(node);
        if let Some(root) = self.frames.first_mut() {
            root.children.push(Arc::new(symbol));
        }
    }

    fn use_declaration(&mut self, node: &SyntaxNode) {
        for symbol in read_use_declaration(self.doc, node) {
            self.resolver.add_import(Arc::new(symbol.clone()));
            self.add_child(symbol);
        }
    }

    fn const_declaration(&mut self, node: &SyntaxNode) {
        let phpdoc = self.take_doc();
        let Some(list) = node.child_phrase(PhraseKind::ConstElementList) else {
            return;
        };
        for element in list.children() {
            if !element.is_phrase(PhraseKind::ConstElement) {
                continue;
            }
            let Some(name) = child_token_text(self.doc, element, TokenKind::Name) else {
                continue;
            };
            let mut symbol = Symbol::new(SymbolKind::Constant, self.resolver.resolve_relative(&name));
            symbol.location = self.location(element);
            self.read_initialiser(&mut symbol, element, phpdoc.as_ref().map(|d| &d.0));
            self.add_child(symbol);
        }
    }

    /// Value and type from `[name, Equals, expr]` shaped elements.
    fn read_initialiser(&self, symbol: &mut Symbol, element: &SyntaxNode, phpdoc: Option<&PhpDoc>) {
        let has_value = element.child_token(TokenKind::Equals).is_some();
        let value = element.children().last().filter(|_| has_value);
        if let Some(value) = value {
            symbol.value = Some(self.doc.node_text(value).to_string());
            symbol.type_ = literal_type(self.doc, value);
        }
        if let Some(tag) = phpdoc.and_then(|d| d.find_var(&symbol.name)) {
            let doc_type = resolve_doc_type(&self.resolver, &tag.type_string);
            symbol.type_ = choose_type(&symbol.type_, &doc_type);
            symbol.doc = Some(PhpDocInfo {
                description: tag.description.clone(),
                type_: doc_type,
            });
        } else if let Some(d) = phpdoc.filter(|d| !d.text.is_empty()) {
            symbol.doc = Some(PhpDocInfo {
                description: d.text.clone(),
                type_: String::new(),
            });
        }
    }

    fn push_function(&mut self, node: &SyntaxNode) {
        let header = node.child_phrase(PhraseKind::FunctionDeclarationHeader);
        let name = header
            .and_then(|h| child_token_text(self.doc, h, TokenKind::Name))
            .unwrap_or_default();
        let mut symbol = Symbol::new(SymbolKind::Function, self.resolver.resolve_relative(&name));
        symbol.location = self.location(node);
        let phpdoc = self.take_doc();
        self.read_signature(&mut symbol, header, phpdoc.as_ref().map(|d| &d.0));
        self.frames.push(symbol);
    }

    fn push_method(&mut self, node: &SyntaxNode) {
        let header = node.child_phrase(PhraseKind::MethodDeclarationHeader);
        let name = header
            .and_then(|h| h.child_phrase(PhraseKind::Identifier))
            .map(|i| name_text(self.doc, i))
            .unwrap_or_default();
        let mut symbol = Symbol::new(method_kind(&name), name);
        symbol.location = self.location(node);
        symbol.scope = self.declaring_type();
        symbol.modifiers = header
            .and_then(|h| h.child_phrase(PhraseKind::MemberModifierList))
            .map(modifiers)
            .unwrap_or_default();
        if !symbol.modifiers.intersects(SymbolModifiers::VISIBILITY) {
            symbol.modifiers |= SymbolModifiers::PUBLIC;
        }
        let phpdoc = self.take_doc();
        self.read_signature(&mut symbol, header, phpdoc.as_ref().map(|d| &d.0));
        self.frames.push(symbol);
    }

    fn push_closure(&mut self, node: &SyntaxNode) {
        let header = node.child_phrase(PhraseKind::AnonymousFunctionHeader);
        let mut symbol = Symbol::new(SymbolKind::Function, CLOSURE_NAME);
        symbol.location = self.location(node);
        symbol.modifiers = SymbolModifiers::ANONYMOUS;
        if header.and_then(|h| h.child_token(TokenKind::Static)).is_some() {
            symbol.modifiers |= SymbolModifiers::STATIC;
        }
        let phpdoc = self.take_doc();
        self.read_signature(&mut symbol, header, phpdoc.as_ref().map(|d| &d.0));

        let uses = header
            .and_then(|h| h.child_phrase(PhraseKind::AnonymousFunctionUseClause))
            .and_then(|u| u.child_phrase(PhraseKind::ClosureUseList));
        if let Some(list) = uses {
            for var in list.children() {
                if !var.is_phrase(PhraseKind::AnonymousFunctionUseVariable) {
                    continue;
                }
                let Some(token) = var.child_token(TokenKind::VariableName) else {
                    continue;
                };
                let mut used = Symbol::new(SymbolKind::Variable, self.doc.token_text(token));
                used.location = self.token_location(token);
                used.modifiers = SymbolModifiers::USE;
                if var.child_token(TokenKind::Ampersand).is_some() {
                    used.modifiers |= SymbolModifiers::REFERENCE;
                }
                symbol.children.push(Arc::new(used));
            }
        }
        self.frames.push(symbol);
    }

    /// Parameters, return type and doc of a function-like header.
    fn read_signature(
        &self,
        symbol: &mut Symbol,
        header: Option<&SyntaxNode>,
        phpdoc: Option<&PhpDoc>,
    ) {
        let Some(header) = header else {
            return;
        };
        if let Some(list) = header.child_phrase(PhraseKind::ParameterDeclarationList) {
            for param in list.children() {
                if param.is_phrase(PhraseKind::ParameterDeclaration) {
                    symbol.children.push(Arc::new(self.parameter(param, phpdoc)));
                }
            }
        }

        let declared = header
            .child_phrase(PhraseKind::ReturnType)
            .and_then(|r| r.child_phrase(PhraseKind::TypeDeclaration))
            .map(|t| type_declaration(self.doc, &self.resolver, t))
            .unwrap_or_default();
        let doc_type = phpdoc
            .and_then(PhpDoc::return_tag)
            .map(|t| resolve_doc_type(&self.resolver, &t.type_string))
            .unwrap_or_default();
        symbol.type_ = choose_type(&declared, &doc_type);

        if let Some(d) = phpdoc {
            symbol.doc = Some(PhpDocInfo {
                description: d.text.clone(),
                type_: doc_type,
            });
        }
    }

    fn parameter(&self, node: &SyntaxNode, phpdoc: Option<&PhpDoc>) -> Symbol {
        let name = child_token_text(self.doc, node, TokenKind::VariableName).unwrap_or_default();
        let mut symbol = Symbol::new(SymbolKind::Parameter, name);
        symbol.location = self.location(node);
        if node.child_token(TokenKind::Ampersand).is_some() {
            symbol.modifiers |= SymbolModifiers::REFERENCE;
        }
        if node.child_token(TokenKind::Ellipsis).is_some() {
            symbol.modifiers |= SymbolModifiers::VARIADIC;
        }
        if node.child_token(TokenKind::Equals).is_some() {
            symbol.value = node.children().last().map(|v| self.doc.node_text(v).to_string());
        }

        let declared = node
            .child_phrase(PhraseKind::TypeDeclaration)
            .map(|t| type_declaration(self.doc, &self.resolver, t))
            .unwrap_or_default();
        let tag = phpdoc.and_then(|d| d.find_param(&symbol.name));
        let doc_type = tag
            .map(|t| resolve_doc_type(&self.resolver, &t.type_string))
            .unwrap_or_default();
        let mut ty = choose_type(&declared, &doc_type);
        if symbol.modifiers.contains(SymbolModifiers::VARIADIC) && !ty.is_empty() {
            ty = type_string::array_reference(&ty);
        }
        symbol.type_ = ty;
        if let Some(tag) = tag {
            symbol.doc = Some(PhpDocInfo {
                description: tag.description.clone(),
                type_: doc_type,
            });
        }
        symbol
    }

    fn push_class_like(&mut self, node: &SyntaxNode) {
        let (kind, header_kind) = match node.phrase_kind() {
            Some(PhraseKind::InterfaceDeclaration) => {
                (SymbolKind::Interface, PhraseKind::InterfaceDeclarationHeader)
            }
            Some(PhraseKind::TraitDeclaration) => {
                (SymbolKind::Trait, PhraseKind::TraitDeclarationHeader)
            }
            _ => (SymbolKind::Class, PhraseKind::ClassDeclarationHeader),
        };
        let header = node.child_phrase(header_kind);
        let name = header
            .and_then(|h| child_token_text(self.doc, h, TokenKind::Name))
            .unwrap_or_default();

        let mut symbol = Symbol::new(kind, self.resolver.resolve_relative(&name));
        symbol.location = self.location(node);
        if let Some(header) = header {
            if let Some(mods) = header.child_phrase(PhraseKind::ClassModifiers) {
                symbol.modifiers = modifiers(mods);
            }
            if let Some(base) = header.child_phrase(PhraseKind::ClassBaseClause) {
                self.push_associated(&mut symbol, base, SymbolKind::Class);
            }
            if let Some(list) = header
                .child_phrase(PhraseKind::ClassInterfaceClause)
                .or_else(|| header.child_phrase(PhraseKind::InterfaceBaseClause))
                .and_then(|c| c.child_phrase(PhraseKind::QualifiedNameList))
            {
                self.push_associated(&mut symbol, list, SymbolKind::Interface);
            }
        }

        self.resolver.push_class(&symbol);

        if let Some((phpdoc, range)) = self.take_doc() {
            for tag in phpdoc.property_tags() {
                symbol.children.push(Arc::new(self.magic_property(tag, range)));
            }
            for tag in phpdoc.method_tags() {
                symbol.children.push(Arc::new(self.magic_method(tag, range)));
            }
            if !phpdoc.text.is_empty() {
                symbol.doc = Some(PhpDocInfo {
                    description: phpdoc.text.clone(),
                    type_: String::new(),
                });
            }
        }
        self.frames.push(symbol);
    }

    fn push_associated(&self, symbol: &mut Symbol, node: &SyntaxNode, kind: SymbolKind) {
        for name in node.children().iter().filter(|c| {
            c.phrase_kind().map(is_name_phrase).unwrap_or(false)
        }) {
            let resolved = resolve_name(self.doc, &self.resolver, name, SymbolKind::Class);
            symbol
                .associated
                .push(SymbolIdentifier::new(kind, resolved.name));
        }
    }

    fn magic_property(&self, tag: &Tag, range: Range) -> Symbol {
        let mut symbol = Symbol::new(SymbolKind::Property, tag.name.clone());
        symbol.location = Some(self.doc.location(range));
        symbol.scope = self.declaring_type();
        symbol.modifiers = SymbolModifiers::MAGIC | SymbolModifiers::PUBLIC;
        match tag.kind {
            TagKind::PropertyRead => symbol.modifiers |= SymbolModifiers::READ_ONLY,
            TagKind::PropertyWrite => symbol.modifiers |= SymbolModifiers::WRITE_ONLY,
            _ => {}
        }
        symbol.type_ = resolve_doc_type(&self.resolver, &tag.type_string);
        symbol.doc = Some(PhpDocInfo {
            description: tag.description.clone(),
            type_: symbol.type_.clone(),
        });
        symbol
    }

    fn magic_method(&self, tag: &Tag, range: Range) -> Symbol {
        let mut symbol = Symbol::new(SymbolKind::Method, tag.name.clone());
        symbol.location = Some(self.doc.location(range));
        symbol.scope = self.declaring_type();
        symbol.modifiers = SymbolModifiers::MAGIC | SymbolModifiers::PUBLIC;
        if tag.is_static {
            symbol.modifiers |= SymbolModifiers::STATIC;
        }
        symbol.type_ = resolve_doc_type(&self.resolver, &tag.type_string);
        symbol.doc = Some(PhpDocInfo {
            description: tag.description.clone(),
            type_: symbol.type_.clone(),
        });
        for p in &tag.parameters {
            let mut param = Symbol::new(SymbolKind::Parameter, p.name.clone());
            param.location = Some(self.doc.location(range));
            param.type_ = resolve_doc_type(&self.resolver, &p.type_string);
            param.value = p.default.clone();
            symbol.children.push(Arc::new(param));
        }
        symbol
    }

    fn property_declaration(&mut self, node: &SyntaxNode) {
        let phpdoc = self.take_doc().map(|d| d.0);
        let mut mods = node
            .child_phrase(PhraseKind::MemberModifierList)
            .map(modifiers)
            .unwrap_or_default();
        if !mods.intersects(SymbolModifiers::VISIBILITY) {
            mods |= SymbolModifiers::PUBLIC;
        }
        let declared = node
            .child_phrase(PhraseKind::TypeDeclaration)
            .map(|t| type_declaration(self.doc, &self.resolver, t))
            .unwrap_or_default();
        let Some(list) = node.child_phrase(PhraseKind::PropertyElementList) else {
            return;
        };

        for element in list.children() {
            if !element.is_phrase(PhraseKind::PropertyElement) {
                continue;
            }
            let Some(name) = child_token_text(self.doc, element, TokenKind::VariableName) else {
                continue;
            };
            let mut symbol = Symbol::new(SymbolKind::Property, name);
            symbol.location = self.location(element);
            symbol.scope = self.declaring_type();
            symbol.modifiers = mods;
            if let Some(init) = element.child_phrase(PhraseKind::PropertyInitialiser) {
                self.read_initialiser(&mut symbol, init, phpdoc.as_ref());
            } else {
                self.read_initialiser(&mut symbol, element, phpdoc.as_ref());
            }
            symbol.type_ = choose_type(&declared, &symbol.type_);
            self.add_child(symbol);
        }
    }

    fn class_const_declaration(&mut self, node: &SyntaxNode) {
        let phpdoc = self.take_doc().map(|d| d.0);
        let mut mods = node
            .child_phrase(PhraseKind::MemberModifierList)
            .map(modifiers)
            .unwrap_or_default();
        if !mods.intersects(SymbolModifiers::VISIBILITY) {
            mods |= SymbolModifiers::PUBLIC;
        }
        mods |= SymbolModifiers::STATIC;
        let Some(list) = node.child_phrase(PhraseKind::ClassConstElementList) else {
            return;
        };
        for element in list.children() {
            if !element.is_phrase(PhraseKind::ClassConstElement) {
                continue;
            }
            let name = element
                .child_phrase(PhraseKind::Identifier)
                .map(|i| name_text(self.doc, i))
                .unwrap_or_default();
            let mut symbol = Symbol::new(SymbolKind::ClassConstant, name);
            symbol.location = self.location(element);
            symbol.scope = self.declaring_type();
            symbol.modifiers = mods;
            self.read_initialiser(&mut symbol, element, phpdoc.as_ref());
            self.add_child(symbol);
        }
    }

    fn trait_use(&mut self, node: &SyntaxNode) {
        let Some(list) = node.child_phrase(PhraseKind::QualifiedNameList) else {
            return;
        };
        let traits: Vec<SymbolIdentifier> = list
            .children()
            .iter()
            .filter(|c| c.phrase_kind().map(is_name_phrase).unwrap_or(false))
            .map(|n| {
                let resolved = resolve_name(self.doc, &self.resolver, n, SymbolKind::Class);
                SymbolIdentifier::new(SymbolKind::Trait, resolved.name)
            })
            .collect();
        if let Some(top) = self.frames.last_mut() {
            if top.kind.is_class_like() {
                top.associated.extend(traits);
            }
        }
    }

    /// `define('NAME', value)` with a literal name.
    fn define(&mut self, node: &SyntaxNode) {
        let Some(callee) = node.children().first() else {
            return;
        };
        if !callee.phrase_kind().map(is_name_phrase).unwrap_or(false) {
            return;
        }
        let callee_name = name_text(self.doc, callee);
        if !callee_name.trim_start_matches('\\').eq_ignore_ascii_case("define") {
            return;
        }
        let Some(args) = node.child_phrase(PhraseKind::ArgumentExpressionList) else {
            return;
        };
        let mut args = args.children().iter().filter(|c| !c.is_token(TokenKind::Comma));
        let Some(SyntaxNode::Token(first)) = args.next() else {
            return;
        };
        if first.kind != TokenKind::StringLiteral {
            return;
        }
        let name = self
            .doc
            .token_text(first)
            .trim_matches(|c| c == '\'' || c == '"')
            .to_string();
        if name.is_empty() {
            return;
        }

        let mut symbol = Symbol::new(SymbolKind::Constant, name);
        symbol.location = self.location(node);
        if let Some(value) = args.next() {
            symbol.value = Some(self.doc.node_text(value).to_string());
            symbol.type_ = literal_type(self.doc, value);
        }
        self.add_child(symbol);
    }

    fn declare_variable(&mut self, node: &SyntaxNode, ty: &str) {
        match node {
            SyntaxNode::Phrase(p) if p.kind == PhraseKind::SimpleVariable => {
                let Some(token) = node.child_token(TokenKind::VariableName) else {
                    return;
                };
                let mut symbol = Symbol::new(SymbolKind::Variable, self.doc.token_text(token));
                symbol.location = self.token_location(token);
                symbol.type_ = ty.to_string();
                self.add_child(symbol);
            }
            // [$a, $b] = ... and list($a, $b) = ...
            SyntaxNode::Phrase(p) if p.kind == PhraseKind::ArrayCreationExpression => {
                let Some(list) = node.child_phrase(PhraseKind::ArrayInitialiserList) else {
                    return;
                };
                for element in list.children() {
                    if let Some(value) = element
                        .child_phrase(PhraseKind::ArrayValue)
                        .and_then(|v| v.children().last())
                    {
                        self.declare_variable(value, "");
                    }
                }
            }
            _ => {}
        }
    }

    fn assignment_target(&mut self, node: &SyntaxNode) {
        if let Some(target) = node.children().first() {
            self.declare_variable(target, "");
        }
    }

    fn foreach_variable(&mut self, node: &SyntaxNode) {
        if let Some(target) = node
            .children()
            .iter()
            .find(|c| !matches!(c, SyntaxNode::Token(_)))
        {
            self.declare_variable(target, "");
        }
    }

    fn catch_variable(&mut self, node: &SyntaxNode) {
        let Some(token) = node.child_token(TokenKind::VariableName) else {
            return;
        };
        let ty = node
            .child_phrase(PhraseKind::CatchNameList)
            .map(|list| {
                let names: Vec<String> = list
                    .children()
                    .iter()
                    .filter(|c| c.phrase_kind().map(is_name_phrase).unwrap_or(false))
                    .map(|n| resolve_name(self.doc, &self.resolver, n, SymbolKind::Class).name)
                    .collect();
                type_string::merge_many(names)
            })
            .unwrap_or_default();
        let mut symbol = Symbol::new(SymbolKind::Variable, self.doc.token_text(token));
        symbol.location = self.token_location(token);
        symbol.type_ = ty;
        self.add_child(symbol);
    }
}

/// Declared type unless it is loose and the doc comment is more specific.
fn choose_type(declared: &str, doc_type: &str) -> String {
    if doc_type.is_empty() {
        return declared.to_string();
    }
    if declared.is_empty() {
        return doc_type.to_string();
    }
    let loose = type_string::atomic(declared)
        .iter()
        .all(|t| LOOSE_TYPES.contains(&t.to_ascii_lowercase().as_str()));
    if loose {
        doc_type.to_string()
    } else {
        declared.to_string()
    }
}

impl TreeVisitor for SymbolReader<'_> {
    fn preorder(&mut self, node: &SyntaxNode, _spine: &[&SyntaxNode]) -> bool {
        let kind = match node {
            SyntaxNode::Token(t) => {
                self.token(t);
                return false;
            }
            SyntaxNode::Phrase(p) => p.kind,
        };

        match kind {
            PhraseKind::Error => false,
            PhraseKind::NamespaceDefinition => {
                self.namespace_definition(node);
                true
            }
            PhraseKind::NamespaceName => false,
            PhraseKind::NamespaceUseDeclaration => {
                self.use_declaration(node);
                false
            }
            PhraseKind::ConstDeclaration => {
                self.const_declaration(node);
                false
            }
            PhraseKind::FunctionDeclaration => {
                self.push_function(node);
                true
            }
            PhraseKind::ClassDeclaration
            | PhraseKind::InterfaceDeclaration
            | PhraseKind::TraitDeclaration => {
                self.push_class_like(node);
                true
            }
            PhraseKind::MethodDeclaration => {
                self.push_method(node);
                true
            }
            PhraseKind::AnonymousFunctionCreationExpression => {
                self.push_closure(node);
                true
            }
            PhraseKind::FunctionDeclarationHeader
            | PhraseKind::ClassDeclarationHeader
            | PhraseKind::InterfaceDeclarationHeader
            | PhraseKind::TraitDeclarationHeader
            | PhraseKind::MethodDeclarationHeader
            | PhraseKind::AnonymousFunctionHeader => false,
            PhraseKind::PropertyDeclaration => {
                self.property_declaration(node);
                false
            }
            PhraseKind::ClassConstDeclaration => {
                self.class_const_declaration(node);
                false
            }
            PhraseKind::TraitUseClause => {
                self.trait_use(node);
                false
            }
            PhraseKind::FunctionCallExpression => {
                self.define(node);
                true
            }
            PhraseKind::SimpleAssignmentExpression
            | PhraseKind::ByRefAssignmentExpression
            | PhraseKind::CompoundAssignmentExpression => {
                self.assignment_target(node);
                true
            }
            PhraseKind::ForeachKey | PhraseKind::ForeachValue => {
                self.foreach_variable(node);
                true
            }
            PhraseKind::CatchClause => {
                self.catch_variable(node);
                true
            }
            _ => true,
        }
    }

    fn postorder(&mut self, node: &SyntaxNode, _spine: &[&SyntaxNode]) {
        match node.phrase_kind() {
            Some(
                PhraseKind::FunctionDeclaration
                | PhraseKind::MethodDeclaration
                | PhraseKind::AnonymousFunctionCreationExpression,
            ) => self.pop_frame(),
            Some(
                PhraseKind::ClassDeclaration
                | PhraseKind::InterfaceDeclaration
                | PhraseKind::TraitDeclaration,
            ) => {
                self.pop_frame();
                self.resolver.pop_class();
            }
            Some(PhraseKind::NamespaceDefinition) => {
                if node.child_phrase(PhraseKind::CompoundStatement).is_some() {
                    self.resolver.set_namespace("");
                }
            }
            _ => {}
        }
    }
}
