//! Tree to reference table.
//!
//! Every phrase gets a frame collecting the [`Part`]s of its children. When
//! the phrase closes, its own part is computed from them and handed to the
//! parent. This is how expression types flow upwards: a method call's part
//! carries the return type of the method, which becomes the receiver type of
//! the next call in the chain.

use super::{
    is_name_phrase, method_kind, name_text, read_use_declaration, resolve_doc_type, resolve_name,
    variables::VariableTable,
};
use crate::name_resolver::NameResolver;
use crate::phpdoc::PhpDoc;
use phpscope_api::models::{
    Location, ParsedDocument, PhraseKind, Range, Reference, ReferenceTable, Scope, ScopeChild,
    Symbol, SymbolKind, SymbolModifiers, SymbolTable, SyntaxNode, Token, TokenKind, TreeVisitor,
    walk,
};
use phpscope_api::semantic::{MemberMergeStrategy, SymbolSource};
use phpscope_api::type_string;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
struct Part {
    phrase: Option<PhraseKind>,
    token: Option<TokenKind>,
    ty: String,
    text: String,
    range: Range,
    /// Set when the part is a plain variable or a subscript of one.
    variable: Option<String>,
    /// Index of the emitted reference in the current scope.
    reference: Option<usize>,
}

impl Part {
    fn typed(ty: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            ..Part::default()
        }
    }

    fn is_operator(&self) -> bool {
        self.token == Some(TokenKind::Operator)
    }
}

#[derive(Debug)]
struct Frame {
    kind: PhraseKind,
    parts: Vec<Part>,
}

impl Frame {
    fn operands(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter().filter(|p| !p.is_operator())
    }

    fn first(&self) -> Option<&Part> {
        self.operands().next()
    }

    fn find(&self, kind: PhraseKind) -> Option<&Part> {
        self.parts.iter().find(|p| p.phrase == Some(kind))
    }

    fn operator(&self) -> Option<&str> {
        self.parts
            .iter()
            .find(|p| p.is_operator())
            .map(|p| p.text.as_str())
    }
}

pub struct ReferenceReader<'a> {
    doc: &'a ParsedDocument,
    table: &'a SymbolTable,
    source: &'a dyn SymbolSource,
    resolver: NameResolver,
    variables: VariableTable,
    scopes: Vec<Scope>,
    frames: Vec<Frame>,
    contexts: Vec<Arc<Symbol>>,
    /// Type from an unnamed inline `@var`, applied to the next assignment.
    pending_var_type: Option<String>,
}

impl<'a> ReferenceReader<'a> {
    pub fn new(
        doc: &'a ParsedDocument,
        table: &'a SymbolTable,
        source: &'a dyn SymbolSource,
    ) -> Self {
        Self {
            doc,
            table,
            source,
            resolver: NameResolver::new(),
            variables: VariableTable::new(),
            scopes: vec![Scope::new(doc.location(doc.full_range()))],
            frames: Vec::new(),
            contexts: Vec::new(),
            pending_var_type: None,
        }
    }

    pub fn read(
        doc: &ParsedDocument,
        table: &SymbolTable,
        source: &dyn SymbolSource,
    ) -> ReferenceTable {
        let mut reader = ReferenceReader::new(doc, table, source);
        walk(&doc.tree, &mut reader);
        reader.finish()
    }

    pub fn finish(mut self) -> ReferenceTable {
        while self.scopes.len() > 1 {
            self.pop_scope();
        }
        let root = self
            .scopes
            .pop()
            .unwrap_or_else(|| Scope::new(self.doc.location(self.doc.full_range())));
        tracing::debug!("read references for {}", self.doc.uri);
        ReferenceTable::new(self.doc.uri.clone(), root)
    }

    fn location(&self, range: Range) -> Location {
        self.doc.location(range)
    }

    fn parent_kind(&self) -> Option<PhraseKind> {
        self.frames.last().map(|f| f.kind)
    }

    fn push_part(&mut self, part: Part) {
        if let Some(frame) = self.frames.last_mut() {
            frame.parts.push(part);
        }
    }

    fn emit(&mut self, reference: Reference) -> Option<usize> {
        let scope = self.scopes.last_mut()?;
        scope.children.push(ScopeChild::Reference(reference));
        Some(scope.children.len() - 1)
    }

    fn patch_type(&mut self, index: Option<usize>, ty: &str) {
        let Some(index) = index else {
            return;
        };
        if let Some(ScopeChild::Reference(r)) = self
            .scopes
            .last_mut()
            .and_then(|s| s.children.get_mut(index))
        {
            r.type_ = ty.to_string();
        }
    }

    fn pop_scope(&mut self) {
        if self.scopes.len() <= 1 {
            return;
        }
        if let Some(scope) = self.scopes.pop() {
            if let Some(parent) = self.scopes.last_mut() {
                parent.children.push(ScopeChild::Scope(scope));
            }
        }
    }

    fn class_name(&self) -> String {
        self.resolver.class_name().unwrap_or_default().to_string()
    }

    fn current_class(&self) -> Option<&Arc<Symbol>> {
        self.contexts.iter().rev().find(|s| s.is_class_like())
    }

    fn current_function(&self) -> Option<&Arc<Symbol>> {
        self.contexts
            .last()
            .filter(|s| {
                matches!(
                    s.kind,
                    SymbolKind::Function | SymbolKind::Method | SymbolKind::Constructor
                )
            })
    }

    /// Merged type of whatever `reference` resolves to.
    fn lookup_type(&self, reference: &Reference) -> String {
        let symbols = self
            .source
            .find_symbols_by_reference(reference, MemberMergeStrategy::Override);
        type_string::merge_many(symbols.iter().map(|s| s.type_.as_str()))
    }

    fn member_type(&self, kind: SymbolKind, name: &str) -> String {
        self.current_class()
            .and_then(|c| {
                c.children
                    .iter()
                    .find(|m| m.kind == kind && m.name == name)
                    .map(|m| m.type_.clone())
            })
            .unwrap_or_default()
    }

    fn token(&mut self, token: &Token) {
        match token.kind {
            TokenKind::DocumentComment => self.inline_doc(token),
            TokenKind::OpenBrace | TokenKind::CloseBrace | TokenKind::Semicolon => {
                self.pending_var_type = None;
            }
            TokenKind::IntegerLiteral => self.push_part(literal(token, "int")),
            TokenKind::FloatingLiteral => self.push_part(literal(token, "float")),
            TokenKind::StringLiteral => self.push_part(literal(token, "string")),
            TokenKind::Operator => {
                let part = Part {
                    token: Some(TokenKind::Operator),
                    text: self.doc.token_text(token).to_string(),
                    ..Part::default()
                };
                self.push_part(part);
            }
            TokenKind::Name => self.declaration_name(token),
            TokenKind::VariableName => self.variable_token(token),
            _ => {}
        }
    }

    fn inline_doc(&mut self, token: &Token) {
        if matches!(
            self.parent_kind(),
            Some(
                PhraseKind::ClassMemberDeclarationList
                    | PhraseKind::ClassDeclarationBody
                    | PhraseKind::InterfaceDeclarationBody
                    | PhraseKind::TraitDeclarationBody
            )
        ) {
            return;
        }
        let doc = PhpDoc::parse(self.doc.token_text(token));
        for tag in doc.var_tags() {
            let ty = resolve_doc_type(&self.resolver, &tag.type_string);
            if tag.name.is_empty() {
                self.pending_var_type = Some(ty);
            } else {
                self.variables.set_type(&tag.name, &ty);
            }
        }
    }

    /// Name tokens that name a declaration.
    fn declaration_name(&mut self, token: &Token) {
        let range = self.doc.token_range(token);
        let reference = match self.parent_kind() {
            Some(PhraseKind::FunctionDeclarationHeader) => {
                let Some(function) = self.current_function() else {
                    return;
                };
                let mut r = Reference::new(SymbolKind::Function, function.name.clone(), self.location(range));
                r.type_ = function.type_.clone();
                r
            }
            Some(
                PhraseKind::ClassDeclarationHeader
                | PhraseKind::InterfaceDeclarationHeader
                | PhraseKind::TraitDeclarationHeader,
            ) => {
                let name = self.class_name();
                let mut r = Reference::new(SymbolKind::Class, name.clone(), self.location(range));
                r.type_ = name;
                r
            }
            Some(PhraseKind::ConstElement) => {
                let name = self.resolver.resolve_relative(self.doc.token_text(token));
                let ty = self
                    .table
                    .find(|s| s.kind == SymbolKind::Constant && s.name == name)
                    .map(|s| s.type_.clone())
                    .unwrap_or_default();
                let mut r = Reference::new(SymbolKind::Constant, name, self.location(range));
                r.type_ = ty;
                r
            }
            _ => return,
        };
        self.emit(reference);
    }

    /// Variable tokens outside of `SimpleVariable` phrases.
    fn variable_token(&mut self, token: &Token) {
        let name = self.doc.token_text(token).to_string();
        let location = self.location(self.doc.token_range(token));
        let reference = match self.parent_kind() {
            Some(PhraseKind::ParameterDeclaration) => {
                let mut r = Reference::new(SymbolKind::Parameter, name.clone(), location);
                r.type_ = self.variables.get_type(&name);
                r
            }
            Some(PhraseKind::PropertyElement) => {
                let mut r = Reference::new(SymbolKind::Property, name.clone(), location);
                r.scope = self.class_name();
                r.type_ = self.member_type(SymbolKind::Property, &name);
                r
            }
            Some(PhraseKind::CatchClause) => {
                let ty = self
                    .frames
                    .last()
                    .and_then(|f| f.find(PhraseKind::CatchNameList))
                    .map(|p| p.ty.clone())
                    .unwrap_or_default();
                self.variables.set_type(&name, &ty);
                let mut r = Reference::new(SymbolKind::Variable, name.clone(), location);
                r.type_ = ty;
                r
            }
            _ => {
                let mut r = Reference::new(SymbolKind::Variable, name.clone(), location);
                r.type_ = self.variables.get_type(&name);
                r
            }
        };
        self.emit(reference);
    }

    fn simple_variable(&mut self, node: &SyntaxNode) {
        let Some(token) = node.child_token(TokenKind::VariableName) else {
            return;
        };
        let name = self.doc.token_text(token).to_string();
        let range = self.doc.token_range(token);
        let mut ty = self.variables.get_type(&name);
        if ty.is_empty() && name == "$this" {
            ty = self.class_name();
        }
        let mut r = Reference::new(SymbolKind::Variable, name.clone(), self.location(range));
        r.type_ = ty.clone();
        let index = self.emit(r);
        self.push_part(Part {
            phrase: Some(PhraseKind::SimpleVariable),
            ty,
            text: name.clone(),
            range,
            variable: Some(name),
            reference: index,
            ..Part::default()
        });
    }

    fn name_phrase(&mut self, node: &SyntaxNode) {
        let parent = self.parent_kind();
        let is_callee = self
            .frames
            .last()
            .map(|f| f.parts.is_empty())
            .unwrap_or(false);
        let kind = match parent {
            Some(PhraseKind::FunctionCallExpression) if is_callee => SymbolKind::Function,
            Some(PhraseKind::ConstantAccessExpression) => SymbolKind::Constant,
            _ => SymbolKind::Class,
        };
        let text = name_text(self.doc, node);
        let range = self.doc.node_range(node);

        if kind == SymbolKind::Class
            && parent == Some(PhraseKind::TypeDeclaration)
            && type_string::is_keyword(&text)
        {
            self.push_part(Part::typed(text.to_ascii_lowercase()));
            return;
        }
        if kind == SymbolKind::Constant {
            let builtin = match text.to_ascii_lowercase().as_str() {
                "true" | "false" => Some("bool"),
                "null" => Some("null"),
                _ => None,
            };
            if let Some(ty) = builtin {
                self.push_part(Part::typed(ty));
                return;
            }
        }

        let resolved = resolve_name(self.doc, &self.resolver, node, kind);
        let mut r = Reference::new(kind, resolved.name.clone(), self.location(range));
        r.alt_name = resolved.alt_name;
        r.type_ = match kind {
            SymbolKind::Class => resolved.name.clone(),
            _ => self.lookup_type(&r),
        };
        let ty = r.type_.clone();
        let index = self.emit(r);
        self.push_part(Part {
            phrase: node.phrase_kind(),
            ty,
            text: resolved.name,
            range,
            reference: index,
            ..Part::default()
        });
    }

    fn member_name(&mut self, node: &SyntaxNode) {
        let range = self.doc.node_range(node);
        let kind = node.phrase_kind();
        match kind {
            Some(PhraseKind::Identifier) => match self.parent_kind() {
                Some(PhraseKind::MethodDeclarationHeader) => {
                    let Some(method) = self.current_function().cloned() else {
                        return;
                    };
                    let kind = method_kind(&method.name);
                    let mut r = Reference::new(kind, method.name.clone(), self.location(range));
                    r.scope = self.class_name();
                    r.type_ = method.type_.clone();
                    self.emit(r);
                }
                Some(PhraseKind::ClassConstElement) => {
                    let name = name_text(self.doc, node);
                    let mut r = Reference::new(SymbolKind::ClassConstant, name.clone(), self.location(range));
                    r.scope = self.class_name();
                    r.type_ = self.member_type(SymbolKind::ClassConstant, &name);
                    self.emit(r);
                }
                _ => self.push_part(Part {
                    phrase: kind,
                    text: name_text(self.doc, node),
                    range,
                    ..Part::default()
                }),
            },
            Some(PhraseKind::ScopedMemberName) => {
                let text = match node.child_phrase(PhraseKind::SimpleVariable) {
                    Some(var) => name_text(self.doc, var),
                    None => node
                        .child_phrase(PhraseKind::Identifier)
                        .map(|i| name_text(self.doc, i))
                        .unwrap_or_else(|| name_text(self.doc, node)),
                };
                self.push_part(Part {
                    phrase: kind,
                    text,
                    range,
                    ..Part::default()
                });
            }
            _ => self.push_part(Part {
                phrase: kind,
                text: name_text(self.doc, node),
                range,
                ..Part::default()
            }),
        }
    }

    fn namespace_definition(&mut self, node: &SyntaxNode) {
        let name_node = node.child_phrase(PhraseKind::NamespaceName);
        let name = name_node
            .map(|n| name_text(self.doc, n))
            .unwrap_or_default();
        self.resolver.set_namespace(name.clone());
        if node.child_phrase(PhraseKind::CompoundStatement).is_some() {
            let range = self.doc.node_range(node);
            self.scopes.push(Scope::new(self.location(range)));
        }
        if let Some(name_node) = name_node {
            let range = self.doc.node_range(name_node);
            self.emit(Reference::new(SymbolKind::Namespace, name, self.location(range)));
        }
    }

    fn use_declaration(&mut self, node: &SyntaxNode) {
        for import in read_use_declaration(self.doc, node) {
            let Some(target) = import.associated.first() else {
                continue;
            };
            if let Some(location) = import.location.clone() {
                let mut r = Reference::new(import.kind, target.name.clone(), location);
                if import.kind == SymbolKind::Class {
                    r.type_ = target.name.clone();
                }
                self.emit(r);
            }
            self.resolver.add_import(Arc::new(import));
        }
    }

    fn enter_class(&mut self, node: &SyntaxNode) {
        let range = self.doc.node_range(node);
        let symbol = self
            .table
            .find(|s| s.is_class_like() && s.range() == Some(range))
            .unwrap_or_else(|| Arc::new(Symbol::new(SymbolKind::Class, "")));
        self.resolver.push_class(&symbol);
        self.contexts.push(symbol);
        self.scopes.push(Scope::new(self.location(range)));
    }

    fn exit_class(&mut self) {
        self.pop_scope();
        self.contexts.pop();
        self.resolver.pop_class();
    }

    fn enter_function(&mut self, node: &SyntaxNode) {
        let range = self.doc.node_range(node);
        let symbol = self
            .table
            .find(|s| {
                matches!(
                    s.kind,
                    SymbolKind::Function | SymbolKind::Method | SymbolKind::Constructor
                ) && s.range() == Some(range)
            })
            .unwrap_or_else(|| Arc::new(Symbol::new(SymbolKind::Function, "")));
        let is_static = symbol.modifiers.contains(SymbolModifiers::STATIC);

        let mut carry: Vec<&str> = Vec::new();
        if symbol.modifiers.contains(SymbolModifiers::ANONYMOUS) {
            carry.extend(
                symbol
                    .children
                    .iter()
                    .filter(|c| c.modifiers.contains(SymbolModifiers::USE))
                    .map(|c| c.name.as_str()),
            );
            if !is_static {
                carry.push("$this");
            }
        }
        self.variables.push_scope(&carry);
        for param in symbol.parameters() {
            self.variables.set_type(&param.name, &param.type_);
        }
        if matches!(symbol.kind, SymbolKind::Method | SymbolKind::Constructor) && !is_static {
            let class = self.class_name();
            self.variables.set_type("$this", &class);
        }

        self.contexts.push(symbol);
        self.scopes.push(Scope::new(self.location(range)));
    }

    fn exit_function(&mut self) {
        self.pop_scope();
        self.contexts.pop();
        self.variables.pop_scope();
    }

    fn assignment(&mut self, frame: &Frame) -> Part {
        let operands: Vec<&Part> = frame.operands().collect();
        let (Some(lhs), Some(rhs)) = (operands.first(), operands.last()) else {
            return Part::default();
        };
        let mut ty = if operands.len() > 1 {
            rhs.ty.clone()
        } else {
            String::new()
        };

        match (lhs.phrase, &lhs.variable) {
            (Some(PhraseKind::SimpleVariable), Some(name)) => {
                if let Some(pending) = self.pending_var_type.take() {
                    ty = pending;
                }
                self.variables.set_type(name, &ty);
                self.patch_type(lhs.reference, &ty);
            }
            (Some(PhraseKind::SubscriptExpression), Some(name)) => {
                let current = self.variables.get_type(name);
                let merged = type_string::merge(&current, &type_string::array_reference(&ty));
                self.variables.set_type(name, &merged);
            }
            _ => {}
        }
        Part::typed(ty)
    }

    fn compound_assignment(&mut self, frame: &Frame) -> Part {
        match frame.operator() {
            Some(".=") => Part::typed("string"),
            _ => Part::typed(frame.first().map(|p| p.ty.clone()).unwrap_or_default()),
        }
    }

    fn member_access(&mut self, frame: &Frame, kind: SymbolKind) -> Part {
        let receiver = frame.first().map(|p| p.ty.clone()).unwrap_or_default();
        let Some(member) = frame.find(PhraseKind::MemberName) else {
            return Part::default();
        };
        let (kind, name) = match kind {
            SymbolKind::Property => (kind, format!("${}", member.text)),
            SymbolKind::Method => (method_kind(&member.text), member.text.clone()),
            _ => (kind, member.text.clone()),
        };
        let mut r = Reference::new(kind, name, self.location(member.range));
        r.scope = receiver;
        if !r.scope.is_empty() {
            r.type_ = type_string::resolve_this_or_static(&self.lookup_type(&r), &r.scope);
        }
        let ty = r.type_.clone();
        self.emit(r);
        Part::typed(ty)
    }

    fn scoped_access(&mut self, frame: &Frame, kind: SymbolKind) -> Part {
        let scope = frame.first().map(|p| p.ty.clone()).unwrap_or_default();
        let Some(member) = frame.find(PhraseKind::ScopedMemberName) else {
            return Part::default();
        };
        if kind == SymbolKind::ClassConstant && member.text.eq_ignore_ascii_case("class") {
            return Part::typed("string");
        }
        let kind = match kind {
            SymbolKind::Method => method_kind(&member.text),
            _ => kind,
        };
        let mut r = Reference::new(kind, member.text.clone(), self.location(member.range));
        r.scope = scope;
        if !r.scope.is_empty() {
            r.type_ = type_string::resolve_this_or_static(&self.lookup_type(&r), &r.scope);
        }
        let ty = r.type_.clone();
        self.emit(r);
        Part::typed(ty)
    }

    fn relative_scope(&mut self, node: &SyntaxNode) -> Part {
        let name = self.class_name();
        let mut r = Reference::new(SymbolKind::Class, name.clone(), self.location(self.doc.node_range(node)));
        r.alt_name = Some("static".to_string());
        r.type_ = name.clone();
        self.emit(r);
        Part::typed(name)
    }

    fn binary(&self, frame: &Frame) -> Part {
        let operands: Vec<&Part> = frame.operands().collect();
        let left = operands.first().map(|p| p.ty.as_str()).unwrap_or("");
        let right = operands.last().map(|p| p.ty.as_str()).unwrap_or("");
        let ty = match frame.operator().unwrap_or("").to_ascii_lowercase().as_str() {
            "." => "string".to_string(),
            "==" | "===" | "!=" | "!==" | "<>" | "<" | ">" | "<=" | ">=" | "&&" | "||" | "and"
            | "or" | "xor" => "bool".to_string(),
            "??" => type_string::merge(left, right),
            "<=>" => "int".to_string(),
            "+" | "-" | "*" | "%" | "**" if left == "int" && right == "int" => "int".to_string(),
            "+" | "-" | "*" | "/" | "%" | "**" => {
                if left == "float" || right == "float" {
                    "float".to_string()
                } else {
                    "int|float".to_string()
                }
            }
            _ => String::new(),
        };
        Part::typed(ty)
    }

    fn instance_of(&mut self, frame: &Frame) -> Part {
        let narrows = matches!(
            self.parent_kind(),
            Some(PhraseKind::IfStatement | PhraseKind::ElseIfClause)
        );
        let target = frame.first();
        let class = frame
            .find(PhraseKind::InstanceofTypeDesignator)
            .map(|p| p.ty.clone())
            .unwrap_or_default();
        if narrows && !class.is_empty() {
            if let Some(Part {
                phrase: Some(PhraseKind::SimpleVariable),
                variable: Some(name),
                ..
            }) = target
            {
                self.variables.set_type(name, &class);
            }
        }
        Part::typed("bool")
    }

    fn foreach_value(&mut self, frame: &Frame) {
        let collection = self
            .frames
            .last()
            .and_then(|f| f.find(PhraseKind::ForeachCollection))
            .map(|p| p.ty.clone())
            .unwrap_or_default();
        let element = type_string::array_dereference(&collection);
        if let Some(Part {
            phrase: Some(PhraseKind::SimpleVariable),
            variable: Some(name),
            reference,
            ..
        }) = frame.first()
        {
            self.variables.set_type(name, &element);
            self.patch_type(*reference, &element);
        }
    }

    fn array_creation(&self, frame: &Frame) -> Part {
        match frame.find(PhraseKind::ArrayInitialiserList) {
            Some(list) if !list.ty.is_empty() => Part::typed(type_string::array_reference(&list.ty)),
            _ => Part::typed("array"),
        }
    }

    fn array_initialiser_list(&self, frame: &Frame) -> Part {
        let elements: Vec<&Part> = frame
            .parts
            .iter()
            .filter(|p| p.phrase == Some(PhraseKind::ArrayElement))
            .collect();
        let ty = if elements.iter().any(|p| p.ty.is_empty()) {
            String::new()
        } else {
            type_string::merge_many(elements.iter().map(|p| p.ty.as_str()))
        };
        Part::typed(ty)
    }

    /// Computes the part a closing phrase hands to its parent.
    fn exit(&mut self, node: &SyntaxNode, frame: Frame) -> Option<Part> {
        let part = match frame.kind {
            PhraseKind::ClassDeclaration
            | PhraseKind::InterfaceDeclaration
            | PhraseKind::TraitDeclaration => {
                self.exit_class();
                return None;
            }
            PhraseKind::FunctionDeclaration | PhraseKind::MethodDeclaration => {
                self.exit_function();
                return None;
            }
            PhraseKind::AnonymousFunctionCreationExpression => {
                self.exit_function();
                Part::typed("Closure")
            }
            PhraseKind::IfStatement | PhraseKind::SwitchStatement => {
                self.variables.pop_branch();
                self.variables.prune_branches();
                return None;
            }
            PhraseKind::NamespaceDefinition => {
                if node.child_phrase(PhraseKind::CompoundStatement).is_some() {
                    self.pop_scope();
                    self.resolver.set_namespace("");
                }
                return None;
            }
            PhraseKind::SimpleAssignmentExpression | PhraseKind::ByRefAssignmentExpression => {
                self.assignment(&frame)
            }
            PhraseKind::CompoundAssignmentExpression => self.compound_assignment(&frame),
            PhraseKind::ObjectCreationExpression => Part::typed(
                frame
                    .find(PhraseKind::ClassTypeDesignator)
                    .map(|p| p.ty.clone())
                    .unwrap_or_default(),
            ),
            PhraseKind::ClassTypeDesignator | PhraseKind::InstanceofTypeDesignator => {
                match frame.first() {
                    Some(p) if p.phrase != Some(PhraseKind::SimpleVariable) => Part::typed(p.ty.clone()),
                    _ => Part::default(),
                }
            }
            PhraseKind::RelativeScope => self.relative_scope(node),
            PhraseKind::MethodCallExpression => self.member_access(&frame, SymbolKind::Method),
            PhraseKind::PropertyAccessExpression => {
                self.member_access(&frame, SymbolKind::Property)
            }
            PhraseKind::ScopedCallExpression => self.scoped_access(&frame, SymbolKind::Method),
            PhraseKind::ScopedPropertyAccessExpression => {
                self.scoped_access(&frame, SymbolKind::Property)
            }
            PhraseKind::ClassConstantAccessExpression => {
                self.scoped_access(&frame, SymbolKind::ClassConstant)
            }
            PhraseKind::FunctionCallExpression => match frame.first() {
                Some(callee) if callee.phrase.map(is_name_phrase).unwrap_or(false) => {
                    Part::typed(callee.ty.clone())
                }
                _ => Part::default(),
            },
            PhraseKind::SubscriptExpression => {
                let base = frame.first();
                Part {
                    ty: type_string::array_dereference(
                        base.map(|p| p.ty.as_str()).unwrap_or_default(),
                    ),
                    variable: base
                        .filter(|p| p.phrase == Some(PhraseKind::SimpleVariable))
                        .and_then(|p| p.variable.clone()),
                    ..Part::default()
                }
            }
            PhraseKind::EncapsulatedExpression
            | PhraseKind::ConstantAccessExpression
            | PhraseKind::CloneExpression
            | PhraseKind::ArrayValue
            | PhraseKind::ForeachCollection => {
                Part::typed(frame.first().map(|p| p.ty.clone()).unwrap_or_default())
            }
            PhraseKind::ArrayElement => Part::typed(
                frame
                    .find(PhraseKind::ArrayValue)
                    .map(|p| p.ty.clone())
                    .unwrap_or_default(),
            ),
            PhraseKind::ArrayInitialiserList => self.array_initialiser_list(&frame),
            PhraseKind::ArrayCreationExpression => self.array_creation(&frame),
            PhraseKind::TernaryExpression => {
                let operands: Vec<&Part> = frame.operands().collect();
                let ty = match operands.as_slice() {
                    [_, then, otherwise] => type_string::merge(&then.ty, &otherwise.ty),
                    [cond, otherwise] => type_string::merge(&cond.ty, &otherwise.ty),
                    _ => String::new(),
                };
                Part::typed(ty)
            }
            PhraseKind::BinaryExpression => self.binary(&frame),
            PhraseKind::UnaryExpression => match frame.operator() {
                Some("!") => Part::typed("bool"),
                _ => Part::typed(frame.first().map(|p| p.ty.clone()).unwrap_or_default()),
            },
            PhraseKind::InstanceOfExpression => self.instance_of(&frame),
            PhraseKind::ForeachValue => {
                self.foreach_value(&frame);
                return None;
            }
            PhraseKind::CatchNameList => Part::typed(type_string::merge_many(
                frame.parts.iter().map(|p| p.ty.as_str()),
            )),
            _ => return None,
        };
        Some(Part {
            phrase: Some(frame.kind),
            ..part
        })
    }
}

fn literal(token: &Token, ty: &str) -> Part {
    Part {
        token: Some(token.kind),
        ty: ty.to_string(),
        ..Part::default()
    }
}

impl TreeVisitor for ReferenceReader<'_> {
    fn preorder(&mut self, node: &SyntaxNode, _spine: &[&SyntaxNode]) -> bool {
        let kind = match node {
            SyntaxNode::Token(t) => {
                self.token(t);
                return false;
            }
            SyntaxNode::Phrase(p) => p.kind,
        };

        match kind {
            PhraseKind::Error | PhraseKind::NamespaceName => return false,
            PhraseKind::QualifiedName
            | PhraseKind::FullyQualifiedName
            | PhraseKind::RelativeQualifiedName => {
                self.name_phrase(node);
                return false;
            }
            PhraseKind::SimpleVariable => {
                self.simple_variable(node);
                return false;
            }
            PhraseKind::MemberName | PhraseKind::ScopedMemberName | PhraseKind::Identifier => {
                self.member_name(node);
                return false;
            }
            PhraseKind::NamespaceUseDeclaration => {
                self.use_declaration(node);
                return false;
            }
            PhraseKind::NamespaceDefinition => self.namespace_definition(node),
            PhraseKind::ClassDeclaration
            | PhraseKind::InterfaceDeclaration
            | PhraseKind::TraitDeclaration => self.enter_class(node),
            PhraseKind::FunctionDeclaration
            | PhraseKind::MethodDeclaration
            | PhraseKind::AnonymousFunctionCreationExpression => self.enter_function(node),
            PhraseKind::IfStatement | PhraseKind::SwitchStatement => self.variables.push_branch(),
            PhraseKind::ElseIfClause
            | PhraseKind::ElseClause
            | PhraseKind::CaseStatement
            | PhraseKind::DefaultStatement => {
                self.variables.pop_branch();
                self.variables.push_branch();
            }
            _ => {}
        }

        self.frames.push(Frame {
            kind,
            parts: Vec::new(),
        });
        true
    }

    fn postorder(&mut self, node: &SyntaxNode, _spine: &[&SyntaxNode]) {
        if !matches!(node, SyntaxNode::Phrase(_)) {
            return;
        }
        let Some(frame) = self.frames.pop() else {
            return;
        };
        if let Some(part) = self.exit(node, frame) {
            self.push_part(part);
        }
    }
}
