//! Hand-built syntax trees for tests.
//!
//! A [`Fixture`] lays tokens over real PHP source text in document order, so
//! tests read like the code they describe and ranges come out exactly as a
//! parser would report them. Nested nodes are built through closures because
//! every token must be requested before the tokens that follow it.

use phpscope_api::models::{ParsedDocument, PhraseKind, SyntaxNode, TokenKind, TreeBuilder};

pub struct Fixture<'a> {
    builder: TreeBuilder<'a>,
}

fn phrase(kind: PhraseKind, children: Vec<SyntaxNode>) -> SyntaxNode {
    TreeBuilder::phrase(kind, children)
}

fn modifier_kind(text: &str) -> TokenKind {
    match text {
        "public" => TokenKind::Public,
        "protected" => TokenKind::Protected,
        "private" => TokenKind::Private,
        "static" => TokenKind::Static,
        "abstract" => TokenKind::Abstract,
        "final" => TokenKind::Final,
        "readonly" => TokenKind::ReadOnly,
        "var" => TokenKind::Var,
        _ => TokenKind::Unknown,
    }
}

impl<'a> Fixture<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            builder: TreeBuilder::new(text),
        }
    }

    /// Builds `<?php` followed by `statements` into a document.
    pub fn document<F>(uri: &str, text: &'a str, statements: F) -> ParsedDocument
    where
        F: FnOnce(&mut Fixture<'a>) -> Vec<SyntaxNode>,
    {
        let mut f = Fixture::new(text);
        let open = f.token(TokenKind::OpenTag, "<?php");
        let list = phrase(PhraseKind::StatementList, statements(&mut f));
        let tree = phrase(PhraseKind::SourceFile, vec![open, list]);
        ParsedDocument::new(uri, text, tree)
    }

    pub fn token(&mut self, kind: TokenKind, lexeme: &str) -> SyntaxNode {
        self.builder.token(kind, lexeme)
    }

    pub fn doc(&mut self, text: &str) -> SyntaxNode {
        self.token(TokenKind::DocumentComment, text)
    }

    pub fn namespace_name(&mut self, text: &str) -> SyntaxNode {
        let mut children = Vec::new();
        for (i, segment) in text.split('\\').enumerate() {
            if i > 0 {
                children.push(self.token(TokenKind::Backslash, "\\"));
            }
            children.push(self.token(TokenKind::Name, segment));
        }
        phrase(PhraseKind::NamespaceName, children)
    }

    /// Qualified, fully qualified or `namespace\` relative name.
    pub fn name(&mut self, text: &str) -> SyntaxNode {
        if let Some(rest) = text.strip_prefix('\\') {
            let slash = self.token(TokenKind::Backslash, "\\");
            let name = self.namespace_name(rest);
            phrase(PhraseKind::FullyQualifiedName, vec![slash, name])
        } else if let Some(rest) = text.strip_prefix("namespace\\") {
            let keyword = self.token(TokenKind::Namespace, "namespace");
            let slash = self.token(TokenKind::Backslash, "\\");
            let name = self.namespace_name(rest);
            phrase(PhraseKind::RelativeQualifiedName, vec![keyword, slash, name])
        } else {
            let name = self.namespace_name(text);
            phrase(PhraseKind::QualifiedName, vec![name])
        }
    }

    fn name_list(&mut self, names: &[&str]) -> SyntaxNode {
        let mut children = Vec::new();
        for (i, n) in names.iter().enumerate() {
            if i > 0 {
                children.push(self.token(TokenKind::Comma, ","));
            }
            children.push(self.name(n));
        }
        phrase(PhraseKind::QualifiedNameList, children)
    }

    /// `namespace Foo\Bar;`
    pub fn namespace(&mut self, name: &str) -> SyntaxNode {
        let keyword = self.token(TokenKind::Namespace, "namespace");
        let name = self.namespace_name(name);
        let semi = self.token(TokenKind::Semicolon, ";");
        phrase(PhraseKind::NamespaceDefinition, vec![keyword, name, semi])
    }

    /// `namespace Foo { ... }`
    pub fn namespace_block<F>(&mut self, name: &str, statements: F) -> SyntaxNode
    where
        F: FnOnce(&mut Self) -> Vec<SyntaxNode>,
    {
        let keyword = self.token(TokenKind::Namespace, "namespace");
        let name = self.namespace_name(name);
        let block = self.block(statements);
        phrase(PhraseKind::NamespaceDefinition, vec![keyword, name, block])
    }

    fn use_clauses(&mut self, clauses: &[&str]) -> SyntaxNode {
        let mut children = Vec::new();
        for (i, clause) in clauses.iter().enumerate() {
            if i > 0 {
                children.push(self.token(TokenKind::Comma, ","));
            }
            let (target, alias) = match clause.split_once(" as ") {
                Some((t, a)) => (t.trim(), Some(a.trim())),
                None => (clause.trim(), None),
            };
            let mut parts = vec![self.namespace_name(target)];
            if let Some(alias) = alias {
                let keyword = self.token(TokenKind::As, "as");
                let alias = self.token(TokenKind::Name, alias);
                parts.push(phrase(PhraseKind::NamespaceAliasingClause, vec![keyword, alias]));
            }
            children.push(phrase(PhraseKind::NamespaceUseClause, parts));
        }
        phrase(PhraseKind::NamespaceUseClauseList, children)
    }

    /// `use A\B, C as D;`
    pub fn use_(&mut self, clauses: &[&str]) -> SyntaxNode {
        let keyword = self.token(TokenKind::Use, "use");
        let list = self.use_clauses(clauses);
        let semi = self.token(TokenKind::Semicolon, ";");
        phrase(PhraseKind::NamespaceUseDeclaration, vec![keyword, list, semi])
    }

    /// `use function A\b;`
    pub fn use_function(&mut self, clauses: &[&str]) -> SyntaxNode {
        let keyword = self.token(TokenKind::Use, "use");
        let function = self.token(TokenKind::Function, "function");
        let list = self.use_clauses(clauses);
        let semi = self.token(TokenKind::Semicolon, ";");
        phrase(
            PhraseKind::NamespaceUseDeclaration,
            vec![keyword, function, list, semi],
        )
    }

    /// `use A\{B, C as D};`
    pub fn use_group(&mut self, prefix: &str, clauses: &[&str]) -> SyntaxNode {
        let keyword = self.token(TokenKind::Use, "use");
        let prefix = self.namespace_name(prefix);
        let slash = self.token(TokenKind::Backslash, "\\");
        let open = self.token(TokenKind::OpenBrace, "{");
        let inner = self.use_clauses(clauses);
        let groups = match inner {
            SyntaxNode::Phrase(p) => p
                .children
                .into_iter()
                .map(|c| match c {
                    SyntaxNode::Phrase(mut clause) => {
                        clause.kind = PhraseKind::NamespaceUseGroupClause;
                        SyntaxNode::Phrase(clause)
                    }
                    other => other,
                })
                .collect(),
            other => vec![other],
        };
        let close = self.token(TokenKind::CloseBrace, "}");
        let semi = self.token(TokenKind::Semicolon, ";");
        phrase(
            PhraseKind::NamespaceUseDeclaration,
            vec![
                keyword,
                prefix,
                slash,
                open,
                phrase(PhraseKind::NamespaceUseGroupClauseList, groups),
                close,
                semi,
            ],
        )
    }

    pub fn block<F>(&mut self, statements: F) -> SyntaxNode
    where
        F: FnOnce(&mut Self) -> Vec<SyntaxNode>,
    {
        let open = self.token(TokenKind::OpenBrace, "{");
        let list = phrase(PhraseKind::StatementList, statements(self));
        let close = self.token(TokenKind::CloseBrace, "}");
        phrase(PhraseKind::CompoundStatement, vec![open, list, close])
    }

    fn member_list<F>(&mut self, body: PhraseKind, members: F) -> SyntaxNode
    where
        F: FnOnce(&mut Self) -> Vec<SyntaxNode>,
    {
        let open = self.token(TokenKind::OpenBrace, "{");
        let list = phrase(PhraseKind::ClassMemberDeclarationList, members(self));
        let close = self.token(TokenKind::CloseBrace, "}");
        phrase(body, vec![open, list, close])
    }

    pub fn class<F>(&mut self, name: &str, extends: Option<&str>, implements: &[&str], members: F) -> SyntaxNode
    where
        F: FnOnce(&mut Self) -> Vec<SyntaxNode>,
    {
        self.class_with(&[], name, extends, implements, members)
    }

    /// Class with `abstract` or `final` modifiers.
    pub fn class_with<F>(
        &mut self,
        mods: &[&str],
        name: &str,
        extends: Option<&str>,
        implements: &[&str],
        members: F,
    ) -> SyntaxNode
    where
        F: FnOnce(&mut Self) -> Vec<SyntaxNode>,
    {
        let mut header = Vec::new();
        if !mods.is_empty() {
            let tokens = mods.iter().map(|m| self.token(modifier_kind(m), m)).collect();
            header.push(phrase(PhraseKind::ClassModifiers, tokens));
        }
        header.push(self.token(TokenKind::Class, "class"));
        header.push(self.token(TokenKind::Name, name));
        if let Some(base) = extends {
            let keyword = self.token(TokenKind::Extends, "extends");
            let base = self.name(base);
            header.push(phrase(PhraseKind::ClassBaseClause, vec![keyword, base]));
        }
        if !implements.is_empty() {
            let keyword = self.token(TokenKind::Implements, "implements");
            let list = self.name_list(implements);
            header.push(phrase(PhraseKind::ClassInterfaceClause, vec![keyword, list]));
        }
        let header = phrase(PhraseKind::ClassDeclarationHeader, header);
        let body = self.member_list(PhraseKind::ClassDeclarationBody, members);
        phrase(PhraseKind::ClassDeclaration, vec![header, body])
    }

    pub fn interface<F>(&mut self, name: &str, extends: &[&str], members: F) -> SyntaxNode
    where
        F: FnOnce(&mut Self) -> Vec<SyntaxNode>,
    {
        let mut header = vec![
            self.token(TokenKind::Interface, "interface"),
            self.token(TokenKind::Name, name),
        ];
        if !extends.is_empty() {
            let keyword = self.token(TokenKind::Extends, "extends");
            let list = self.name_list(extends);
            header.push(phrase(PhraseKind::InterfaceBaseClause, vec![keyword, list]));
        }
        let header = phrase(PhraseKind::InterfaceDeclarationHeader, header);
        let body = self.member_list(PhraseKind::InterfaceDeclarationBody, members);
        phrase(PhraseKind::InterfaceDeclaration, vec![header, body])
    }

    pub fn trait_<F>(&mut self, name: &str, members: F) -> SyntaxNode
    where
        F: FnOnce(&mut Self) -> Vec<SyntaxNode>,
    {
        let header = vec![
            self.token(TokenKind::Trait, "trait"),
            self.token(TokenKind::Name, name),
        ];
        let header = phrase(PhraseKind::TraitDeclarationHeader, header);
        let body = self.member_list(PhraseKind::TraitDeclarationBody, members);
        phrase(PhraseKind::TraitDeclaration, vec![header, body])
    }

    /// `use T1, T2;` inside a class body.
    pub fn use_traits(&mut self, names: &[&str]) -> SyntaxNode {
        let keyword = self.token(TokenKind::Use, "use");
        let list = self.name_list(names);
        let semi = self.token(TokenKind::Semicolon, ";");
        phrase(PhraseKind::TraitUseClause, vec![keyword, list, semi])
    }

    fn member_modifiers(&mut self, mods: &[&str]) -> Option<SyntaxNode> {
        if mods.is_empty() {
            return None;
        }
        let tokens = mods.iter().map(|m| self.token(modifier_kind(m), m)).collect();
        Some(phrase(PhraseKind::MemberModifierList, tokens))
    }

    /// `?Foo`, `int|string`, `array` and friends.
    pub fn type_decl(&mut self, text: &str) -> SyntaxNode {
        let mut children = Vec::new();
        let text = match text.strip_prefix('?') {
            Some(rest) => {
                children.push(self.token(TokenKind::Question, "?"));
                rest
            }
            None => text,
        };
        for (i, part) in text.split('|').enumerate() {
            if i > 0 {
                children.push(self.token(TokenKind::Bar, "|"));
            }
            let node = match part {
                "array" => self.token(TokenKind::Array, part),
                "callable" => self.token(TokenKind::Callable, part),
                "static" => self.token(TokenKind::Static, part),
                _ => self.name(part),
            };
            children.push(node);
        }
        phrase(PhraseKind::TypeDeclaration, children)
    }

    /// One parameter from its source form, e.g. `?Foo &$a = null` or `int ...$rest`.
    pub fn param(&mut self, text: &str) -> SyntaxNode {
        let (decl, default) = match text.split_once('=') {
            Some((d, v)) => (d.trim(), Some(v.trim())),
            None => (text.trim(), None),
        };
        let mut children = Vec::new();
        let mut words = decl.split_whitespace().peekable();
        if let Some(first) = words.peek() {
            if !first.starts_with(['$', '&', '.']) {
                let ty = self.type_decl(first);
                children.push(ty);
                words.next();
            }
        }
        let rest: String = words.collect();
        let mut var = rest.as_str();
        if let Some(r) = var.strip_prefix('&') {
            children.push(self.token(TokenKind::Ampersand, "&"));
            var = r;
        }
        if let Some(r) = var.strip_prefix("...") {
            children.push(self.token(TokenKind::Ellipsis, "..."));
            var = r;
        }
        children.push(self.token(TokenKind::VariableName, var));
        if let Some(default) = default {
            children.push(self.token(TokenKind::Equals, "="));
            children.push(self.literal(default));
        }
        phrase(PhraseKind::ParameterDeclaration, children)
    }

    fn params(&mut self, params: &[&str]) -> Vec<SyntaxNode> {
        let open = self.token(TokenKind::OpenParenthesis, "(");
        let mut out = vec![open];
        if !params.is_empty() {
            let mut list = Vec::new();
            for (i, p) in params.iter().enumerate() {
                if i > 0 {
                    list.push(self.token(TokenKind::Comma, ","));
                }
                list.push(self.param(p));
            }
            out.push(phrase(PhraseKind::ParameterDeclarationList, list));
        }
        out.push(self.token(TokenKind::CloseParenthesis, ")"));
        out
    }

    fn return_type(&mut self, ret: Option<&str>) -> Option<SyntaxNode> {
        let ret = ret?;
        let colon = self.token(TokenKind::Colon, ":");
        let ty = self.type_decl(ret);
        Some(phrase(PhraseKind::ReturnType, vec![colon, ty]))
    }

    fn method_header(&mut self, mods: &[&str], name: &str, params: &[&str], ret: Option<&str>) -> SyntaxNode {
        let mut header = Vec::new();
        header.extend(self.member_modifiers(mods));
        header.push(self.token(TokenKind::Function, "function"));
        let ident = self.token(TokenKind::Name, name);
        header.push(phrase(PhraseKind::Identifier, vec![ident]));
        header.extend(self.params(params));
        header.extend(self.return_type(ret));
        phrase(PhraseKind::MethodDeclarationHeader, header)
    }

    pub fn method<F>(
        &mut self,
        mods: &[&str],
        name: &str,
        params: &[&str],
        ret: Option<&str>,
        body: F,
    ) -> SyntaxNode
    where
        F: FnOnce(&mut Self) -> Vec<SyntaxNode>,
    {
        let header = self.method_header(mods, name, params, ret);
        let block = self.block(body);
        let body = phrase(PhraseKind::MethodDeclarationBody, vec![block]);
        phrase(PhraseKind::MethodDeclaration, vec![header, body])
    }

    /// Abstract or interface method without a body.
    pub fn method_decl(&mut self, mods: &[&str], name: &str, params: &[&str], ret: Option<&str>) -> SyntaxNode {
        let header = self.method_header(mods, name, params, ret);
        let semi = self.token(TokenKind::Semicolon, ";");
        let body = phrase(PhraseKind::MethodDeclarationBody, vec![semi]);
        phrase(PhraseKind::MethodDeclaration, vec![header, body])
    }

    pub fn property(&mut self, mods: &[&str], ty: Option<&str>, name: &str, init: Option<&str>) -> SyntaxNode {
        let mut children = Vec::new();
        children.extend(self.member_modifiers(mods));
        if let Some(ty) = ty {
            children.push(self.type_decl(ty));
        }
        let mut element = vec![self.token(TokenKind::VariableName, name)];
        if let Some(init) = init {
            let equals = self.token(TokenKind::Equals, "=");
            let value = self.literal(init);
            element.push(phrase(PhraseKind::PropertyInitialiser, vec![equals, value]));
        }
        let element = phrase(PhraseKind::PropertyElement, element);
        children.push(phrase(PhraseKind::PropertyElementList, vec![element]));
        children.push(self.token(TokenKind::Semicolon, ";"));
        phrase(PhraseKind::PropertyDeclaration, children)
    }

    pub fn class_const(&mut self, mods: &[&str], name: &str, value: &str) -> SyntaxNode {
        let mut children = Vec::new();
        children.extend(self.member_modifiers(mods));
        children.push(self.token(TokenKind::Const, "const"));
        let ident = self.token(TokenKind::Name, name);
        let ident = phrase(PhraseKind::Identifier, vec![ident]);
        let equals = self.token(TokenKind::Equals, "=");
        let value = self.literal(value);
        let element = phrase(PhraseKind::ClassConstElement, vec![ident, equals, value]);
        children.push(phrase(PhraseKind::ClassConstElementList, vec![element]));
        children.push(self.token(TokenKind::Semicolon, ";"));
        phrase(PhraseKind::ClassConstDeclaration, children)
    }

    /// `const NAME = value;` at namespace level.
    pub fn const_(&mut self, name: &str, value: &str) -> SyntaxNode {
        let keyword = self.token(TokenKind::Const, "const");
        let ident = self.token(TokenKind::Name, name);
        let equals = self.token(TokenKind::Equals, "=");
        let value = self.literal(value);
        let element = phrase(PhraseKind::ConstElement, vec![ident, equals, value]);
        let list = phrase(PhraseKind::ConstElementList, vec![element]);
        let semi = self.token(TokenKind::Semicolon, ";");
        phrase(PhraseKind::ConstDeclaration, vec![keyword, list, semi])
    }

    pub fn function<F>(&mut self, name: &str, params: &[&str], ret: Option<&str>, body: F) -> SyntaxNode
    where
        F: FnOnce(&mut Self) -> Vec<SyntaxNode>,
    {
        let mut header = vec![
            self.token(TokenKind::Function, "function"),
            self.token(TokenKind::Name, name),
        ];
        header.extend(self.params(params));
        header.extend(self.return_type(ret));
        let header = phrase(PhraseKind::FunctionDeclarationHeader, header);
        let block = self.block(body);
        let body = phrase(PhraseKind::FunctionDeclarationBody, vec![block]);
        phrase(PhraseKind::FunctionDeclaration, vec![header, body])
    }

    /// `function (params) use (uses) { body }`, optionally `static`.
    pub fn closure<F>(&mut self, is_static: bool, params: &[&str], uses: &[&str], body: F) -> SyntaxNode
    where
        F: FnOnce(&mut Self) -> Vec<SyntaxNode>,
    {
        let mut header = Vec::new();
        if is_static {
            header.push(self.token(TokenKind::Static, "static"));
        }
        header.push(self.token(TokenKind::Function, "function"));
        header.extend(self.params(params));
        if !uses.is_empty() {
            let keyword = self.token(TokenKind::Use, "use");
            let open = self.token(TokenKind::OpenParenthesis, "(");
            let mut list = Vec::new();
            for (i, u) in uses.iter().enumerate() {
                if i > 0 {
                    list.push(self.token(TokenKind::Comma, ","));
                }
                let mut var = Vec::new();
                let name = match u.strip_prefix('&') {
                    Some(rest) => {
                        var.push(self.token(TokenKind::Ampersand, "&"));
                        rest
                    }
                    None => u,
                };
                var.push(self.token(TokenKind::VariableName, name));
                list.push(phrase(PhraseKind::AnonymousFunctionUseVariable, var));
            }
            let close = self.token(TokenKind::CloseParenthesis, ")");
            header.push(phrase(
                PhraseKind::AnonymousFunctionUseClause,
                vec![keyword, open, phrase(PhraseKind::ClosureUseList, list), close],
            ));
        }
        let header = phrase(PhraseKind::AnonymousFunctionHeader, header);
        let body = self.block(body);
        phrase(PhraseKind::AnonymousFunctionCreationExpression, vec![header, body])
    }

    pub fn expr_stmt<F>(&mut self, expr: F) -> SyntaxNode
    where
        F: FnOnce(&mut Self) -> SyntaxNode,
    {
        let expr = expr(self);
        let semi = self.token(TokenKind::Semicolon, ";");
        phrase(PhraseKind::ExpressionStatement, vec![expr, semi])
    }

    pub fn return_<F>(&mut self, expr: F) -> SyntaxNode
    where
        F: FnOnce(&mut Self) -> SyntaxNode,
    {
        let keyword = self.token(TokenKind::Return, "return");
        let expr = expr(self);
        let semi = self.token(TokenKind::Semicolon, ";");
        phrase(PhraseKind::ReturnStatement, vec![keyword, expr, semi])
    }

    pub fn if_<C, T>(&mut self, cond: C, then: T) -> SyntaxNode
    where
        C: FnOnce(&mut Self) -> SyntaxNode,
        T: FnOnce(&mut Self) -> Vec<SyntaxNode>,
    {
        let mut children = self.if_head(cond);
        children.push(self.block(then));
        phrase(PhraseKind::IfStatement, children)
    }

    pub fn if_else<C, T, E>(&mut self, cond: C, then: T, otherwise: E) -> SyntaxNode
    where
        C: FnOnce(&mut Self) -> SyntaxNode,
        T: FnOnce(&mut Self) -> Vec<SyntaxNode>,
        E: FnOnce(&mut Self) -> Vec<SyntaxNode>,
    {
        let mut children = self.if_head(cond);
        children.push(self.block(then));
        let keyword = self.token(TokenKind::Else, "else");
        let block = self.block(otherwise);
        children.push(phrase(PhraseKind::ElseClause, vec![keyword, block]));
        phrase(PhraseKind::IfStatement, children)
    }

    fn if_head<C>(&mut self, cond: C) -> Vec<SyntaxNode>
    where
        C: FnOnce(&mut Self) -> SyntaxNode,
    {
        let keyword = self.token(TokenKind::If, "if");
        let open = self.token(TokenKind::OpenParenthesis, "(");
        let cond = cond(self);
        let close = self.token(TokenKind::CloseParenthesis, ")");
        vec![keyword, open, cond, close]
    }

    /// `foreach (collection as $value) { body }`
    pub fn foreach<C, B>(&mut self, collection: C, value: &str, body: B) -> SyntaxNode
    where
        C: FnOnce(&mut Self) -> SyntaxNode,
        B: FnOnce(&mut Self) -> Vec<SyntaxNode>,
    {
        let keyword = self.token(TokenKind::Foreach, "foreach");
        let open = self.token(TokenKind::OpenParenthesis, "(");
        let collection = collection(self);
        let collection = phrase(PhraseKind::ForeachCollection, vec![collection]);
        let as_ = self.token(TokenKind::As, "as");
        let var = self.var(value);
        let value = phrase(PhraseKind::ForeachValue, vec![var]);
        let close = self.token(TokenKind::CloseParenthesis, ")");
        let body = self.block(body);
        phrase(
            PhraseKind::ForeachStatement,
            vec![keyword, open, collection, as_, value, close, body],
        )
    }

    /// `try { body } catch (A|B $e) { handler }`
    pub fn try_catch<B, H>(&mut self, body: B, types: &[&str], var: &str, handler: H) -> SyntaxNode
    where
        B: FnOnce(&mut Self) -> Vec<SyntaxNode>,
        H: FnOnce(&mut Self) -> Vec<SyntaxNode>,
    {
        let keyword = self.token(TokenKind::Try, "try");
        let body = self.block(body);
        let catch = self.token(TokenKind::Catch, "catch");
        let open = self.token(TokenKind::OpenParenthesis, "(");
        let mut names = Vec::new();
        for (i, t) in types.iter().enumerate() {
            if i > 0 {
                names.push(self.token(TokenKind::Bar, "|"));
            }
            names.push(self.name(t));
        }
        let names = phrase(PhraseKind::CatchNameList, names);
        let var = self.token(TokenKind::VariableName, var);
        let close = self.token(TokenKind::CloseParenthesis, ")");
        let handler = self.block(handler);
        let clause = phrase(PhraseKind::CatchClause, vec![catch, open, names, var, close, handler]);
        phrase(PhraseKind::TryStatement, vec![keyword, body, clause])
    }

    pub fn var(&mut self, name: &str) -> SyntaxNode {
        let token = self.token(TokenKind::VariableName, name);
        phrase(PhraseKind::SimpleVariable, vec![token])
    }

    pub fn assign<L, R>(&mut self, lhs: L, rhs: R) -> SyntaxNode
    where
        L: FnOnce(&mut Self) -> SyntaxNode,
        R: FnOnce(&mut Self) -> SyntaxNode,
    {
        let lhs = lhs(self);
        let equals = self.token(TokenKind::Equals, "=");
        let rhs = rhs(self);
        phrase(PhraseKind::SimpleAssignmentExpression, vec![lhs, equals, rhs])
    }

    fn arguments<A>(&mut self, args: A) -> Vec<SyntaxNode>
    where
        A: FnOnce(&mut Self) -> Vec<SyntaxNode>,
    {
        let open = self.token(TokenKind::OpenParenthesis, "(");
        let args = args(self);
        let mut out = vec![open];
        if !args.is_empty() {
            out.push(phrase(PhraseKind::ArgumentExpressionList, args));
        }
        out.push(self.token(TokenKind::CloseParenthesis, ")"));
        out
    }

    fn scope_designator(&mut self, scope: &str) -> SyntaxNode {
        if scope == "static" {
            let token = self.token(TokenKind::Static, "static");
            phrase(PhraseKind::RelativeScope, vec![token])
        } else if scope.starts_with('$') {
            self.var(scope)
        } else {
            self.name(scope)
        }
    }

    /// `new Foo(args)`, where `class` may also be `static`.
    pub fn new_<A>(&mut self, class: &str, args: A) -> SyntaxNode
    where
        A: FnOnce(&mut Self) -> Vec<SyntaxNode>,
    {
        let keyword = self.token(TokenKind::New, "new");
        let designator = self.scope_designator(class);
        let mut children = vec![
            keyword,
            phrase(PhraseKind::ClassTypeDesignator, vec![designator]),
        ];
        children.extend(self.arguments(args));
        phrase(PhraseKind::ObjectCreationExpression, children)
    }

    pub fn method_call<R, A>(&mut self, receiver: R, name: &str, args: A) -> SyntaxNode
    where
        R: FnOnce(&mut Self) -> SyntaxNode,
        A: FnOnce(&mut Self) -> Vec<SyntaxNode>,
    {
        let receiver = receiver(self);
        let arrow = self.token(TokenKind::Arrow, "->");
        let member = self.token(TokenKind::Name, name);
        let mut children = vec![receiver, arrow, phrase(PhraseKind::MemberName, vec![member])];
        children.extend(self.arguments(args));
        phrase(PhraseKind::MethodCallExpression, children)
    }

    /// `$receiver->name`, `name` without `$`.
    pub fn prop<R>(&mut self, receiver: R, name: &str) -> SyntaxNode
    where
        R: FnOnce(&mut Self) -> SyntaxNode,
    {
        let receiver = receiver(self);
        let arrow = self.token(TokenKind::Arrow, "->");
        let member = self.token(TokenKind::Name, name);
        phrase(
            PhraseKind::PropertyAccessExpression,
            vec![receiver, arrow, phrase(PhraseKind::MemberName, vec![member])],
        )
    }

    pub fn static_call<A>(&mut self, scope: &str, name: &str, args: A) -> SyntaxNode
    where
        A: FnOnce(&mut Self) -> Vec<SyntaxNode>,
    {
        let scope = self.scope_designator(scope);
        let colons = self.token(TokenKind::ColonColon, "::");
        let ident = self.token(TokenKind::Name, name);
        let ident = phrase(PhraseKind::Identifier, vec![ident]);
        let mut children = vec![scope, colons, phrase(PhraseKind::ScopedMemberName, vec![ident])];
        children.extend(self.arguments(args));
        phrase(PhraseKind::ScopedCallExpression, children)
    }

    /// `Foo::$name`
    pub fn static_prop(&mut self, scope: &str, name: &str) -> SyntaxNode {
        let scope = self.scope_designator(scope);
        let colons = self.token(TokenKind::ColonColon, "::");
        let var = self.var(name);
        phrase(
            PhraseKind::ScopedPropertyAccessExpression,
            vec![scope, colons, phrase(PhraseKind::ScopedMemberName, vec![var])],
        )
    }

    /// `Foo::NAME`
    pub fn class_const_access(&mut self, scope: &str, name: &str) -> SyntaxNode {
        let scope = self.scope_designator(scope);
        let colons = self.token(TokenKind::ColonColon, "::");
        let ident = self.token(TokenKind::Name, name);
        let ident = phrase(PhraseKind::Identifier, vec![ident]);
        phrase(
            PhraseKind::ClassConstantAccessExpression,
            vec![scope, colons, phrase(PhraseKind::ScopedMemberName, vec![ident])],
        )
    }

    pub fn call<A>(&mut self, name: &str, args: A) -> SyntaxNode
    where
        A: FnOnce(&mut Self) -> Vec<SyntaxNode>,
    {
        let callee = self.name(name);
        let mut children = vec![callee];
        children.extend(self.arguments(args));
        phrase(PhraseKind::FunctionCallExpression, children)
    }

    pub fn string(&mut self, lexeme: &str) -> SyntaxNode {
        self.token(TokenKind::StringLiteral, lexeme)
    }

    pub fn int(&mut self, lexeme: &str) -> SyntaxNode {
        self.token(TokenKind::IntegerLiteral, lexeme)
    }

    /// `FOO`, `true`, `null`
    pub fn constant(&mut self, name: &str) -> SyntaxNode {
        let name = self.name(name);
        phrase(PhraseKind::ConstantAccessExpression, vec![name])
    }

    /// Literal from its source form.
    pub fn literal(&mut self, text: &str) -> SyntaxNode {
        if text.starts_with(['\'', '"']) {
            self.string(text)
        } else if text.parse::<i64>().is_ok() {
            self.int(text)
        } else if text.parse::<f64>().is_ok() {
            self.token(TokenKind::FloatingLiteral, text)
        } else if text == "[]" {
            self.array(|_| Vec::new())
        } else {
            self.constant(text)
        }
    }

    /// `[a, b]` with one closure per element value.
    pub fn array<F>(&mut self, items: F) -> SyntaxNode
    where
        F: FnOnce(&mut Self) -> Vec<SyntaxNode>,
    {
        let open = self.token(TokenKind::OpenBracket, "[");
        let values = items(self);
        let mut children = vec![open];
        if !values.is_empty() {
            let elements = values
                .into_iter()
                .map(|v| {
                    let value = phrase(PhraseKind::ArrayValue, vec![v]);
                    phrase(PhraseKind::ArrayElement, vec![value])
                })
                .collect();
            children.push(phrase(PhraseKind::ArrayInitialiserList, elements));
        }
        children.push(self.token(TokenKind::CloseBracket, "]"));
        phrase(PhraseKind::ArrayCreationExpression, children)
    }

    /// `base[index]`, or `base[]` when `index` is `None`.
    pub fn subscript<B>(&mut self, base: B, index: Option<&str>) -> SyntaxNode
    where
        B: FnOnce(&mut Self) -> SyntaxNode,
    {
        let base = base(self);
        let mut children = vec![base, self.token(TokenKind::OpenBracket, "[")];
        if let Some(index) = index {
            children.push(self.literal(index));
        }
        children.push(self.token(TokenKind::CloseBracket, "]"));
        phrase(PhraseKind::SubscriptExpression, children)
    }

    pub fn instanceof<L>(&mut self, lhs: L, class: &str) -> SyntaxNode
    where
        L: FnOnce(&mut Self) -> SyntaxNode,
    {
        let lhs = lhs(self);
        let keyword = self.token(TokenKind::InstanceOf, "instanceof");
        let class = self.name(class);
        let designator = phrase(PhraseKind::InstanceofTypeDesignator, vec![class]);
        phrase(PhraseKind::InstanceOfExpression, vec![lhs, keyword, designator])
    }

    pub fn paren<F>(&mut self, expr: F) -> SyntaxNode
    where
        F: FnOnce(&mut Self) -> SyntaxNode,
    {
        let open = self.token(TokenKind::OpenParenthesis, "(");
        let expr = expr(self);
        let close = self.token(TokenKind::CloseParenthesis, ")");
        phrase(PhraseKind::EncapsulatedExpression, vec![open, expr, close])
    }

    pub fn binary<L, R>(&mut self, lhs: L, op: &str, rhs: R) -> SyntaxNode
    where
        L: FnOnce(&mut Self) -> SyntaxNode,
        R: FnOnce(&mut Self) -> SyntaxNode,
    {
        let lhs = lhs(self);
        let op = self.token(TokenKind::Operator, op);
        let rhs = rhs(self);
        phrase(PhraseKind::BinaryExpression, vec![lhs, op, rhs])
    }
}
