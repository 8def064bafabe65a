//! Input model handed over by the external parser.
//!
//! The tree is immutable and has exactly two node shapes: phrases (a kind tag
//! plus ordered children) and tokens (a kind tag plus a byte span into the
//! source text). Readers never look at raw text except through [`SourceText`].

use super::position::{Location, Position, Range};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Unknown,
    EndOfFile,
    Whitespace,
    Comment,
    DocumentComment,
    OpenTag,
    Name,
    VariableName,
    StringLiteral,
    IntegerLiteral,
    FloatingLiteral,
    Backslash,
    Semicolon,
    Comma,
    Colon,
    ColonColon,
    Question,
    Ampersand,
    Ellipsis,
    Bar,
    Equals,
    FatArrow,
    Arrow,
    OpenBrace,
    CloseBrace,
    OpenParenthesis,
    CloseParenthesis,
    OpenBracket,
    CloseBracket,
    /// Any other operator punctuation (`+`, `.=`, `===`, `!` ...).
    Operator,
    Abstract,
    Array,
    As,
    Callable,
    Case,
    Catch,
    Class,
    Clone,
    Const,
    Default,
    Do,
    Echo,
    Else,
    ElseIf,
    Extends,
    Final,
    Finally,
    For,
    Foreach,
    Function,
    Global,
    If,
    Implements,
    InstanceOf,
    Interface,
    Namespace,
    New,
    Private,
    Protected,
    Public,
    ReadOnly,
    Return,
    Static,
    Switch,
    Throw,
    Trait,
    Try,
    Use,
    Var,
    While,
}

impl TokenKind {
    /// Tokens that never contribute to a node's range.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::DocumentComment
        )
    }
}

/// Phrase kinds understood by the readers. Shapes below list the expected
/// children in order; `?` marks optional children.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhraseKind {
    /// `[OpenTag?, StatementList?]`
    SourceFile,
    StatementList,
    /// `[OpenBrace, StatementList?, CloseBrace]`
    CompoundStatement,
    /// `[expr, Semicolon]`
    ExpressionStatement,
    /// `[Return, expr?, Semicolon]`
    ReturnStatement,
    EchoStatement,
    ThrowStatement,
    /// `[Namespace, NamespaceName?, Semicolon | CompoundStatement]`
    NamespaceDefinition,
    /// `[Name, (Backslash, Name)*]`
    NamespaceName,
    /// `[NamespaceName]`
    QualifiedName,
    /// `[Backslash, NamespaceName]`
    FullyQualifiedName,
    /// `[Namespace, Backslash, NamespaceName]`
    RelativeQualifiedName,
    /// `[QualifiedName, (Comma, QualifiedName)*]`
    QualifiedNameList,
    /// `[Use, (Function | Const)?, NamespaceUseClauseList, Semicolon]` or the
    /// grouped form `[Use, (Function | Const)?, NamespaceName, Backslash,
    /// OpenBrace, NamespaceUseGroupClauseList, CloseBrace, Semicolon]`
    NamespaceUseDeclaration,
    NamespaceUseClauseList,
    /// `[Backslash?, NamespaceName, NamespaceAliasingClause?]`
    NamespaceUseClause,
    NamespaceUseGroupClauseList,
    /// `[(Function | Const)?, NamespaceName, NamespaceAliasingClause?]`
    NamespaceUseGroupClause,
    /// `[As, Name]`
    NamespaceAliasingClause,
    /// `[Const, ConstElementList, Semicolon]`
    ConstDeclaration,
    ConstElementList,
    /// `[Name, Equals, expr]`
    ConstElement,
    /// `[FunctionDeclarationHeader, FunctionDeclarationBody]`
    FunctionDeclaration,
    /// `[Function, Ampersand?, Name, OpenParenthesis, ParameterDeclarationList?,
    /// CloseParenthesis, ReturnType?]`
    FunctionDeclarationHeader,
    /// `[OpenBrace, StatementList?, CloseBrace]`
    FunctionDeclarationBody,
    ParameterDeclarationList,
    /// `[TypeDeclaration?, Ampersand?, Ellipsis?, VariableName, (Equals, expr)?]`
    ParameterDeclaration,
    /// `[Question?, type, (Bar, type)*]` where a type is a qualified name
    /// phrase or one of the `Array`, `Callable`, `Static` tokens.
    TypeDeclaration,
    /// `[Colon, TypeDeclaration]`
    ReturnType,
    /// `[ClassDeclarationHeader, ClassDeclarationBody]`
    ClassDeclaration,
    /// `[ClassModifiers?, Class, Name, ClassBaseClause?, ClassInterfaceClause?]`
    ClassDeclarationHeader,
    ClassModifiers,
    /// `[Extends, QualifiedName]`
    ClassBaseClause,
    /// `[Implements, QualifiedNameList]`
    ClassInterfaceClause,
    /// `[OpenBrace, ClassMemberDeclarationList?, CloseBrace]`
    ClassDeclarationBody,
    ClassMemberDeclarationList,
    /// `[InterfaceDeclarationHeader, InterfaceDeclarationBody]`
    InterfaceDeclaration,
    /// `[Interface, Name, InterfaceBaseClause?]`
    InterfaceDeclarationHeader,
    /// `[Extends, QualifiedNameList]`
    InterfaceBaseClause,
    InterfaceDeclarationBody,
    /// `[TraitDeclarationHeader, TraitDeclarationBody]`
    TraitDeclaration,
    /// `[Trait, Name]`
    TraitDeclarationHeader,
    TraitDeclarationBody,
    /// `[Use, QualifiedNameList, Semicolon | TraitUseSpecification]`
    TraitUseClause,
    TraitUseSpecification,
    MemberModifierList,
    /// `[MemberModifierList, TypeDeclaration?, PropertyElementList, Semicolon]`
    PropertyDeclaration,
    PropertyElementList,
    /// `[VariableName, PropertyInitialiser?]`
    PropertyElement,
    /// `[Equals, expr]`
    PropertyInitialiser,
    /// `[MemberModifierList?, Const, ClassConstElementList, Semicolon]`
    ClassConstDeclaration,
    ClassConstElementList,
    /// `[Identifier, Equals, expr]`
    ClassConstElement,
    /// `[MethodDeclarationHeader, MethodDeclarationBody]`
    MethodDeclaration,
    /// `[MemberModifierList?, Function, Ampersand?, Identifier, OpenParenthesis,
    /// ParameterDeclarationList?, CloseParenthesis, ReturnType?]`
    MethodDeclarationHeader,
    /// `[CompoundStatement]` or `[Semicolon]`
    MethodDeclarationBody,
    /// `[Name]` or a single keyword token used as a name.
    Identifier,
    /// `[AnonymousFunctionHeader, FunctionDeclarationBody]`
    AnonymousFunctionCreationExpression,
    /// `[Static?, Function, Ampersand?, OpenParenthesis, ParameterDeclarationList?,
    /// CloseParenthesis, AnonymousFunctionUseClause?, ReturnType?]`
    AnonymousFunctionHeader,
    /// `[Use, OpenParenthesis, ClosureUseList, CloseParenthesis]`
    AnonymousFunctionUseClause,
    ClosureUseList,
    /// `[Ampersand?, VariableName]`
    AnonymousFunctionUseVariable,
    /// `[VariableName]`
    SimpleVariable,
    /// `[expr, Equals, expr]`
    SimpleAssignmentExpression,
    /// `[expr, Equals, Ampersand, expr]`
    ByRefAssignmentExpression,
    /// `[expr, Operator, expr]`
    CompoundAssignmentExpression,
    /// `[New, ClassTypeDesignator, (OpenParenthesis, ArgumentExpressionList?,
    /// CloseParenthesis)?]`
    ObjectCreationExpression,
    /// `[QualifiedName | FullyQualifiedName | RelativeQualifiedName |
    /// RelativeScope | SimpleVariable]`
    ClassTypeDesignator,
    /// `[Static]`
    RelativeScope,
    /// `[expr, Arrow, MemberName, OpenParenthesis, ArgumentExpressionList?,
    /// CloseParenthesis]`
    MethodCallExpression,
    /// `[expr, Arrow, MemberName]`
    PropertyAccessExpression,
    /// `[Name]`
    MemberName,
    /// `[scope, ColonColon, ScopedMemberName, OpenParenthesis,
    /// ArgumentExpressionList?, CloseParenthesis]`
    ScopedCallExpression,
    /// `[scope, ColonColon, ScopedMemberName]` with a variable member name.
    ScopedPropertyAccessExpression,
    /// `[scope, ColonColon, ScopedMemberName]` with an identifier member name.
    ClassConstantAccessExpression,
    /// `[Identifier | SimpleVariable]`
    ScopedMemberName,
    /// `[callee, OpenParenthesis, ArgumentExpressionList?, CloseParenthesis]`
    FunctionCallExpression,
    ArgumentExpressionList,
    /// `[expr, OpenBracket, expr?, CloseBracket]`
    SubscriptExpression,
    /// `[OpenParenthesis, expr, CloseParenthesis]`
    EncapsulatedExpression,
    /// `[QualifiedName | FullyQualifiedName | RelativeQualifiedName]`
    ConstantAccessExpression,
    /// `[(OpenBracket | Array OpenParenthesis), ArrayInitialiserList?,
    /// (CloseBracket | CloseParenthesis)]`
    ArrayCreationExpression,
    ArrayInitialiserList,
    /// `[ArrayKey?, ArrayValue]`
    ArrayElement,
    /// `[expr, FatArrow]`
    ArrayKey,
    /// `[Ampersand?, expr]`
    ArrayValue,
    /// `[expr, Question, expr?, Colon, expr]`
    TernaryExpression,
    BinaryExpression,
    UnaryExpression,
    /// `[expr, InstanceOf, InstanceofTypeDesignator]`
    InstanceOfExpression,
    InstanceofTypeDesignator,
    /// `[Clone, expr]`
    CloneExpression,
    /// `[If, OpenParenthesis, expr, CloseParenthesis, statement,
    /// ElseIfClauseList?, ElseClause?]`
    IfStatement,
    ElseIfClauseList,
    /// `[ElseIf, OpenParenthesis, expr, CloseParenthesis, statement]`
    ElseIfClause,
    /// `[Else, statement]`
    ElseClause,
    /// `[Switch, OpenParenthesis, expr, CloseParenthesis, OpenBrace,
    /// CaseStatementList?, CloseBrace]`
    SwitchStatement,
    CaseStatementList,
    /// `[Case, expr, Colon, StatementList?]`
    CaseStatement,
    /// `[Default, Colon, StatementList?]`
    DefaultStatement,
    WhileStatement,
    DoStatement,
    ForStatement,
    /// `[Foreach, OpenParenthesis, ForeachCollection, As, ForeachKey?,
    /// ForeachValue, CloseParenthesis, statement]`
    ForeachStatement,
    ForeachCollection,
    /// `[expr, FatArrow]`
    ForeachKey,
    /// `[Ampersand?, expr]`
    ForeachValue,
    /// `[Try, CompoundStatement, CatchClause*, FinallyClause?]`
    TryStatement,
    /// `[Catch, OpenParenthesis, CatchNameList, VariableName?, CloseParenthesis,
    /// CompoundStatement]`
    CatchClause,
    /// `[QualifiedName, (Bar, QualifiedName)*]`
    CatchNameList,
    FinallyClause,
    /// Parser recovery node wrapping whatever could not be parsed.
    Error,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: u32,
    pub length: u32,
}

impl Token {
    pub fn end(&self) -> u32 {
        self.offset + self.length
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Phrase {
    pub kind: PhraseKind,
    pub children: Vec<SyntaxNode>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum SyntaxNode {
    Phrase(Phrase),
    Token(Token),
}

impl SyntaxNode {
    pub fn phrase(kind: PhraseKind, children: Vec<SyntaxNode>) -> Self {
        SyntaxNode::Phrase(Phrase { kind, children })
    }

    pub fn phrase_kind(&self) -> Option<PhraseKind> {
        match self {
            SyntaxNode::Phrase(p) => Some(p.kind),
            SyntaxNode::Token(_) => None,
        }
    }

    pub fn token_kind(&self) -> Option<TokenKind> {
        match self {
            SyntaxNode::Token(t) => Some(t.kind),
            SyntaxNode::Phrase(_) => None,
        }
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            SyntaxNode::Token(t) => Some(t),
            SyntaxNode::Phrase(_) => None,
        }
    }

    pub fn is_phrase(&self, kind: PhraseKind) -> bool {
        self.phrase_kind() == Some(kind)
    }

    pub fn is_token(&self, kind: TokenKind) -> bool {
        self.token_kind() == Some(kind)
    }

    pub fn children(&self) -> &[SyntaxNode] {
        match self {
            SyntaxNode::Phrase(p) => &p.children,
            SyntaxNode::Token(_) => &[],
        }
    }

    pub fn child_phrase(&self, kind: PhraseKind) -> Option<&SyntaxNode> {
        self.children().iter().find(|c| c.is_phrase(kind))
    }

    pub fn child_token(&self, kind: TokenKind) -> Option<&Token> {
        self.children()
            .iter()
            .filter_map(SyntaxNode::as_token)
            .find(|t| t.kind == kind)
    }

    /// First non-trivia token in document order.
    pub fn first_token(&self) -> Option<Token> {
        match self {
            SyntaxNode::Token(t) if !t.kind.is_trivia() => Some(*t),
            SyntaxNode::Token(_) => None,
            SyntaxNode::Phrase(p) => p.children.iter().find_map(SyntaxNode::first_token),
        }
    }

    /// Last non-trivia token in document order.
    pub fn last_token(&self) -> Option<Token> {
        match self {
            SyntaxNode::Token(t) if !t.kind.is_trivia() => Some(*t),
            SyntaxNode::Token(_) => None,
            SyntaxNode::Phrase(p) => p.children.iter().rev().find_map(SyntaxNode::last_token),
        }
    }
}

/// Source buffer with precomputed line starts.
#[derive(Debug, Clone, Default)]
pub struct SourceText {
    text: String,
    line_starts: Vec<usize>,
}

impl SourceText {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { text, line_starts }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn slice(&self, start: usize, end: usize) -> &str {
        self.text.get(start..end).unwrap_or("")
    }

    pub fn token_text(&self, token: &Token) -> &str {
        self.slice(token.offset as usize, token.end() as usize)
    }

    pub fn node_text(&self, node: &SyntaxNode) -> &str {
        match (node.first_token(), node.last_token()) {
            (Some(first), Some(last)) => self.slice(first.offset as usize, last.end() as usize),
            _ => "",
        }
    }

    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line = self.line_starts.partition_point(|s| *s <= offset) - 1;
        let line_start = self.line_starts[line];
        let character = match self.text.get(line_start..offset) {
            Some(s) => s.chars().count(),
            None => offset - line_start,
        };
        Position::new(line as u32, character as u32)
    }

    pub fn offset_at(&self, pos: Position) -> usize {
        let Some(&line_start) = self.line_starts.get(pos.line as usize) else {
            return self.text.len();
        };
        let line_end = self
            .line_starts
            .get(pos.line as usize + 1)
            .copied()
            .unwrap_or(self.text.len());
        self.slice(line_start, line_end)
            .char_indices()
            .nth(pos.character as usize)
            .map(|(i, _)| line_start + i)
            .unwrap_or(line_end)
    }

    pub fn token_range(&self, token: &Token) -> Range {
        Range::new(
            self.position_at(token.offset as usize),
            self.position_at(token.end() as usize),
        )
    }

    pub fn node_range(&self, node: &SyntaxNode) -> Range {
        match (node.first_token(), node.last_token()) {
            (Some(first), Some(last)) => Range::new(
                self.position_at(first.offset as usize),
                self.position_at(last.end() as usize),
            ),
            _ => Range::default(),
        }
    }
}

/// One source file as handed over by the parser.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub uri: String,
    pub text: SourceText,
    pub tree: SyntaxNode,
}

impl ParsedDocument {
    pub fn new(uri: impl Into<String>, text: impl Into<String>, tree: SyntaxNode) -> Self {
        Self {
            uri: uri.into(),
            text: SourceText::new(text),
            tree,
        }
    }

    /// Decode a tree produced out of process.
    pub fn from_json(
        uri: impl Into<String>,
        text: impl Into<String>,
        tree_json: &str,
    ) -> serde_json::Result<Self> {
        let tree: SyntaxNode = serde_json::from_str(tree_json)?;
        Ok(Self::new(uri, text, tree))
    }

    pub fn node_range(&self, node: &SyntaxNode) -> Range {
        self.text.node_range(node)
    }

    pub fn node_text(&self, node: &SyntaxNode) -> &str {
        self.text.node_text(node)
    }

    pub fn token_text(&self, token: &Token) -> &str {
        self.text.token_text(token)
    }

    pub fn token_range(&self, token: &Token) -> Range {
        self.text.token_range(token)
    }

    pub fn location(&self, range: Range) -> Location {
        Location::new(self.uri.clone(), range)
    }

    /// Range covering the whole document.
    pub fn full_range(&self) -> Range {
        Range::new(Position::default(), self.text.position_at(self.text.len()))
    }
}

/// Depth-first traversal callbacks. `postorder` only runs for nodes whose
/// `preorder` returned `true`.
pub trait TreeVisitor {
    fn preorder(&mut self, node: &SyntaxNode, spine: &[&SyntaxNode]) -> bool;

    fn postorder(&mut self, _node: &SyntaxNode, _spine: &[&SyntaxNode]) {}
}

pub fn walk<V: TreeVisitor + ?Sized>(root: &SyntaxNode, visitor: &mut V) {
    let mut spine = Vec::new();
    walk_node(root, &mut spine, visitor);
}

fn walk_node<'a, V: TreeVisitor + ?Sized>(
    node: &'a SyntaxNode,
    spine: &mut Vec<&'a SyntaxNode>,
    visitor: &mut V,
) {
    if !visitor.preorder(node, spine) {
        return;
    }
    if let SyntaxNode::Phrase(p) = node {
        spine.push(node);
        for child in &p.children {
            walk_node(child, spine, visitor);
        }
        spine.pop();
    }
    visitor.postorder(node, spine);
}

/// Lays tokens onto a source text by scanning forward for each lexeme.
///
/// Tokens must be requested in document order. A lexeme that cannot be found
/// yields a zero-length token at the cursor, mirroring how a recovering parser
/// reports missing tokens.
#[derive(Debug)]
pub struct TreeBuilder<'a> {
    text: &'a str,
    cursor: usize,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, cursor: 0 }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn token(&mut self, kind: TokenKind, lexeme: &str) -> SyntaxNode {
        let rest = self.text.get(self.cursor..).unwrap_or("");
        let (offset, length) = match rest.find(lexeme) {
            Some(i) if !lexeme.is_empty() => (self.cursor + i, lexeme.len()),
            _ => (self.cursor, 0),
        };
        self.cursor = offset + length;
        SyntaxNode::Token(Token {
            kind,
            offset: offset as u32,
            length: length as u32,
        })
    }

    pub fn phrase(kind: PhraseKind, children: Vec<SyntaxNode>) -> SyntaxNode {
        SyntaxNode::phrase(kind, children)
    }
}
