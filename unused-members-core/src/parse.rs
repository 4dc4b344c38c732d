//! TypeScript source extraction using native tree-sitter.
//!
//! Produces the classes a file declares plus the syntactic facts the
//! reference resolver needs: imports, exports, local bindings and every
//! member access with its receiver expression.

use std::path::Path;

use tracing::warn;
use tree_sitter::{Language, Node, Parser};

use crate::error::{ScanError, ScanResult};
use crate::model::{
    Accessibility, AccessorKind, ClassDeclaration, Member, MemberEdit, MemberKind, PropertyForm,
    Span, IGNORE_MARKER,
};

/// Everything extracted from one source file.
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    /// Top-level named classes. Empty when the tree has syntax errors.
    pub classes: Vec<ClassDeclaration>,
    pub imports: Vec<Import>,
    pub exports: Vec<Export>,
    pub bindings: Vec<Binding>,
    pub accesses: Vec<Access>,
    pub has_errors: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportKind {
    /// `import { A } from` / `import { A as B } from` (imported name)
    Named(String),
    /// `import A from`
    Default,
    /// `import * as ns from`
    Namespace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub local: String,
    pub source: String,
    pub kind: ImportKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Export {
    /// `export class A`, `export { A as B }`, `export default A`
    Local { exported: String, local: String },
    /// `export { A as B } from './x'`
    From {
        exported: String,
        imported: String,
        source: String,
    },
    /// `export * from './x'`
    Star { source: String },
}

/// Expression an access goes through, before type resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    /// `this` inside an instance member of the named class
    This(String),
    /// `this` inside a static member
    StaticThis,
    /// `super` inside an instance member of the named class
    Super(String),
    Ident(String),
    /// Known type name: `new A()`, `x as A`, `const x: A`
    Typed(String),
    /// `recv.name`
    Member(Box<Receiver>, String),
    /// `recv.method()`; resolved through the method's return type
    Call(Box<Receiver>),
    Unknown,
}

/// `name` bound to the value of `source` somewhere in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub source: Receiver,
}

/// A member access: `receiver.name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Access {
    pub receiver: Receiver,
    pub name: String,
    /// Nearest enclosing named class declaration.
    pub enclosing_class: Option<String>,
    pub line: usize,
}

/// Whether the path should be parsed with the TSX grammar.
fn is_tsx(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "tsx")
}

/// Parses TypeScript source text and extracts classes and reference facts.
///
/// A tree containing syntax errors still yields its accesses (so the file's
/// references keep counting) but no classes.
pub fn parse_source(path: &Path, text: &str) -> ScanResult<ParsedFile> {
    let language: Language = if is_tsx(path) {
        tree_sitter_typescript::LANGUAGE_TSX.into()
    } else {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
    };

    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| ScanError::parse(path, format!("failed to set language: {}", e)))?;
    let tree = parser
        .parse(text, None)
        .ok_or_else(|| ScanError::parse(path, "parser produced no tree"))?;
    let root = tree.root_node();

    let mut walker = SourceWalker::new(text.as_bytes());
    walker.visit(root, Scope::top_level());

    let has_errors = root.has_error();
    let classes = if has_errors {
        warn!(path = %path.display(), "syntax errors, skipping class analysis for file");
        Vec::new()
    } else {
        walker.classes(root)
    };

    Ok(ParsedFile {
        classes,
        imports: walker.imports,
        exports: walker.exports,
        bindings: walker.bindings,
        accesses: walker.accesses,
        has_errors,
    })
}

/// What `this` refers to at a point in the tree.
#[derive(Debug, Clone, Copy)]
enum ThisCtx<'s> {
    Instance(&'s str),
    Static,
    Unknown,
}

#[derive(Debug, Clone, Copy)]
struct Scope<'s> {
    /// Nearest enclosing named class declaration.
    class: Option<&'s str>,
    this: ThisCtx<'s>,
    /// Meaning of `this` in instance members of the nearest class body.
    class_this: ThisCtx<'s>,
    /// Parameter properties visible as plain identifiers (constructor body).
    param_props: &'s [String],
}

impl Scope<'static> {
    fn top_level() -> Self {
        Scope {
            class: None,
            this: ThisCtx::Unknown,
            class_this: ThisCtx::Unknown,
            param_props: &[],
        }
    }
}

fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Anonymous keyword child such as `static`, `get`, `abstract`.
fn has_token(node: Node<'_>, token: &str) -> bool {
    children(node)
        .iter()
        .any(|c| !c.is_named() && c.kind() == token)
}

fn child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    children(node).into_iter().find(|c| c.kind() == kind)
}

fn unquote(text: &str) -> &str {
    let trimmed = text.trim();
    for quote in ['"', '\'', '`'] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    trimmed
}

fn span_of(node: Node<'_>) -> Span {
    Span::new(node.start_byte(), node.end_byte())
}

fn line_of(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

struct SourceWalker<'a> {
    src: &'a [u8],
    imports: Vec<Import>,
    exports: Vec<Export>,
    bindings: Vec<Binding>,
    accesses: Vec<Access>,
}

impl<'a> SourceWalker<'a> {
    fn new(src: &'a [u8]) -> Self {
        Self {
            src,
            imports: Vec::new(),
            exports: Vec::new(),
            bindings: Vec::new(),
            accesses: Vec::new(),
        }
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        node.utf8_text(self.src).unwrap_or("")
    }

    // ------------------------------------------------------------------
    // Reference facts
    // ------------------------------------------------------------------

    fn visit<'s>(&mut self, node: Node<'a>, scope: Scope<'s>)
    where
        'a: 's,
    {
        match node.kind() {
            "class_declaration" | "abstract_class_declaration" => {
                let inner = match node.child_by_field_name("name") {
                    Some(name) => {
                        let name = self.text(name);
                        Scope {
                            class: Some(name),
                            this: ThisCtx::Instance(name),
                            class_this: ThisCtx::Instance(name),
                            param_props: &[],
                        }
                    }
                    None => Scope {
                        this: ThisCtx::Unknown,
                        class_this: ThisCtx::Unknown,
                        param_props: &[],
                        ..scope
                    },
                };
                self.visit_children(node, inner);
                return;
            }
            "class" => {
                let inner = Scope {
                    this: ThisCtx::Unknown,
                    class_this: ThisCtx::Unknown,
                    param_props: &[],
                    ..scope
                };
                self.visit_children(node, inner);
                return;
            }
            "function_declaration"
            | "function_expression"
            | "function"
            | "generator_function"
            | "generator_function_declaration" => {
                let inner = Scope {
                    this: ThisCtx::Unknown,
                    ..scope
                };
                self.visit_children(node, inner);
                return;
            }
            "method_definition" => {
                self.visit_method(node, scope);
                return;
            }
            "public_field_definition" => {
                let this = if has_token(node, "static") {
                    ThisCtx::Static
                } else {
                    scope.class_this
                };
                self.visit_children(node, Scope { this, ..scope });
                return;
            }
            "class_static_block" => {
                let inner = Scope {
                    this: ThisCtx::Static,
                    ..scope
                };
                self.visit_children(node, inner);
                return;
            }
            "import_statement" => {
                self.record_import(node);
                return;
            }
            "export_statement" => self.record_export(node),
            "member_expression" => self.record_member_access(node, scope),
            "subscript_expression" => self.record_subscript_access(node, scope),
            "variable_declarator" => self.record_declarator(node, scope),
            "required_parameter" | "optional_parameter" => self.record_parameter(node, scope),
            "for_in_statement" => {
                if let Some(left) = node.child_by_field_name("left") {
                    self.bind_unknown(left);
                }
            }
            "catch_clause" => {
                if let Some(param) = node.child_by_field_name("parameter") {
                    self.bind_unknown(param);
                }
            }
            "arrow_function" => {
                if let Some(param) = node.child_by_field_name("parameter") {
                    if param.kind() == "identifier" {
                        self.bind(self.text(param), Receiver::Unknown);
                    }
                }
            }
            "assignment_expression" => self.record_assignment(node, scope),
            "identifier" | "shorthand_property_identifier" => {
                let name = self.text(node);
                if scope.param_props.iter().any(|p| p == name) {
                    if let ThisCtx::Instance(class) = scope.class_this {
                        self.push_access(Receiver::This(class.to_string()), name, node, scope);
                    }
                }
            }
            _ => {}
        }
        self.visit_children(node, scope);
    }

    fn visit_children<'s>(&mut self, node: Node<'a>, scope: Scope<'s>)
    where
        'a: 's,
    {
        for child in children(node) {
            self.visit(child, scope);
        }
    }

    fn visit_method<'s>(&mut self, node: Node<'a>, scope: Scope<'s>)
    where
        'a: 's,
    {
        let in_class = node.parent().is_some_and(|p| p.kind() == "class_body");
        let is_static = has_token(node, "static");
        let this = if !in_class {
            ThisCtx::Unknown
        } else if is_static {
            ThisCtx::Static
        } else {
            scope.class_this
        };
        let plain = Scope {
            this,
            param_props: &[],
            ..scope
        };

        let is_constructor = node
            .child_by_field_name("name")
            .is_some_and(|n| self.text(n) == "constructor");
        if !(in_class && is_constructor && !is_static) {
            self.visit_children(node, plain);
            return;
        }

        let props: Vec<String> = self
            .parameter_properties(node)
            .into_iter()
            .map(|m| m.name)
            .collect();
        let body = node.child_by_field_name("body").map(|b| b.id());
        let in_body = Scope {
            param_props: &props,
            ..plain
        };
        for child in children(node) {
            if Some(child.id()) == body {
                self.visit(child, in_body);
            } else {
                self.visit(child, plain);
            }
        }
    }

    fn push_access(&mut self, receiver: Receiver, name: &str, at: Node<'_>, scope: Scope<'_>) {
        self.accesses.push(Access {
            receiver,
            name: name.to_string(),
            enclosing_class: scope.class.map(str::to_string),
            line: line_of(at),
        });
    }

    fn bind(&mut self, name: &str, source: Receiver) {
        self.bindings.push(Binding {
            name: name.to_string(),
            source,
        });
    }

    fn record_member_access(&mut self, node: Node<'a>, scope: Scope<'_>) {
        let (Some(object), Some(property)) = (
            node.child_by_field_name("object"),
            node.child_by_field_name("property"),
        ) else {
            return;
        };
        if !matches!(
            property.kind(),
            "property_identifier" | "private_property_identifier"
        ) {
            return;
        }
        let receiver = self.receiver_of(object, scope);
        self.push_access(receiver, self.text(property), property, scope);
    }

    fn record_subscript_access(&mut self, node: Node<'a>, scope: Scope<'_>) {
        let (Some(object), Some(index)) = (
            node.child_by_field_name("object"),
            node.child_by_field_name("index"),
        ) else {
            return;
        };
        if index.kind() != "string" {
            return;
        }
        let receiver = self.receiver_of(object, scope);
        self.push_access(receiver, unquote(self.text(index)), index, scope);
    }

    fn record_declarator(&mut self, node: Node<'a>, scope: Scope<'_>) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        let source = match node.child_by_field_name("type") {
            Some(ty) => self
                .type_name(ty)
                .map(Receiver::Typed)
                .unwrap_or(Receiver::Unknown),
            None => node
                .child_by_field_name("value")
                .map(|v| self.receiver_of(v, scope))
                .unwrap_or(Receiver::Unknown),
        };
        match name.kind() {
            "identifier" => self.bind(self.text(name), source),
            "object_pattern" => self.destructure(name, source, scope),
            _ => self.bind_unknown(name),
        }
    }

    fn record_parameter(&mut self, node: Node<'a>, scope: Scope<'_>) {
        let Some(pattern) = node.child_by_field_name("pattern") else {
            return;
        };
        let source = node
            .child_by_field_name("type")
            .and_then(|ty| self.type_name(ty))
            .map(Receiver::Typed)
            .unwrap_or(Receiver::Unknown);
        match pattern.kind() {
            "identifier" => self.bind(self.text(pattern), source),
            "object_pattern" => self.destructure(pattern, source, scope),
            _ => self.bind_unknown(pattern),
        }
    }

    fn record_assignment(&mut self, node: Node<'a>, scope: Scope<'_>) {
        let (Some(left), Some(right)) = (
            node.child_by_field_name("left"),
            node.child_by_field_name("right"),
        ) else {
            return;
        };
        match left.kind() {
            "identifier" => {
                let source = self.receiver_of(right, scope);
                self.bind(self.text(left), source);
            }
            "object_pattern" => {
                let source = self.receiver_of(right, scope);
                self.destructure(left, source, scope);
            }
            "array_pattern" => self.bind_unknown(left),
            _ => {}
        }
    }

    /// Binds every name in `pattern` to an unknown value (array elements,
    /// rest elements, loop variables, catch parameters).
    fn bind_unknown(&mut self, pattern: Node<'a>) {
        match pattern.kind() {
            "identifier" | "shorthand_property_identifier_pattern" => {
                self.bind(self.text(pattern), Receiver::Unknown)
            }
            "assignment_pattern" | "object_assignment_pattern" => {
                if let Some(left) = pattern.child_by_field_name("left") {
                    self.bind_unknown(left);
                }
            }
            "pair_pattern" => {
                if let Some(value) = pattern.child_by_field_name("value") {
                    self.bind_unknown(value);
                }
            }
            "array_pattern" | "object_pattern" | "rest_pattern" => {
                for child in named_children(pattern) {
                    self.bind_unknown(child);
                }
            }
            _ => {}
        }
    }

    /// `const { a, b: c, d = 1 } = source` reads `a`, `b` and `d` from `source`.
    fn destructure(&mut self, pattern: Node<'a>, source: Receiver, scope: Scope<'_>) {
        for child in named_children(pattern) {
            match child.kind() {
                "shorthand_property_identifier_pattern" => {
                    let name = self.text(child);
                    self.push_access(source.clone(), name, child, scope);
                    self.bind(name, Receiver::Member(Box::new(source.clone()), name.to_string()));
                }
                "object_assignment_pattern" => {
                    let Some(left) = child.child_by_field_name("left") else {
                        continue;
                    };
                    if left.kind() == "shorthand_property_identifier_pattern" {
                        let name = self.text(left);
                        self.push_access(source.clone(), name, left, scope);
                        self.bind(name, Receiver::Member(Box::new(source.clone()), name.to_string()));
                    }
                }
                "pair_pattern" => {
                    let Some(key) = child.child_by_field_name("key") else {
                        continue;
                    };
                    let key_name = match key.kind() {
                        "property_identifier" | "number" => self.text(key),
                        "string" => unquote(self.text(key)),
                        _ => continue,
                    };
                    self.push_access(source.clone(), key_name, key, scope);
                    let member = Receiver::Member(Box::new(source.clone()), key_name.to_string());
                    match child.child_by_field_name("value") {
                        Some(value) if value.kind() == "identifier" => {
                            self.bind(self.text(value), member)
                        }
                        Some(value) if value.kind() == "object_pattern" => {
                            self.destructure(value, member, scope)
                        }
                        Some(value) => self.bind_unknown(value),
                        None => {}
                    }
                }
                "rest_pattern" => self.bind_unknown(child),
                _ => {}
            }
        }
    }

    fn record_import(&mut self, node: Node<'a>) {
        let Some(source) = node.child_by_field_name("source") else {
            return;
        };
        let source = unquote(self.text(source)).to_string();
        let Some(clause) = child_of_kind(node, "import_clause") else {
            return;
        };
        for part in named_children(clause) {
            match part.kind() {
                "identifier" => self.imports.push(Import {
                    local: self.text(part).to_string(),
                    source: source.clone(),
                    kind: ImportKind::Default,
                }),
                "namespace_import" => {
                    if let Some(ident) = child_of_kind(part, "identifier") {
                        self.imports.push(Import {
                            local: self.text(ident).to_string(),
                            source: source.clone(),
                            kind: ImportKind::Namespace,
                        });
                    }
                }
                "named_imports" => {
                    for spec in named_children(part) {
                        if spec.kind() != "import_specifier" {
                            continue;
                        }
                        let Some(name) = spec.child_by_field_name("name") else {
                            continue;
                        };
                        let imported = unquote(self.text(name)).to_string();
                        let local = spec
                            .child_by_field_name("alias")
                            .map(|a| self.text(a).to_string())
                            .unwrap_or_else(|| imported.clone());
                        self.imports.push(Import {
                            local,
                            source: source.clone(),
                            kind: ImportKind::Named(imported),
                        });
                    }
                }
                _ => {}
            }
        }
    }

    fn record_export(&mut self, node: Node<'a>) {
        let source = node
            .child_by_field_name("source")
            .map(|s| unquote(self.text(s)).to_string());
        let is_default = has_token(node, "default");

        if let Some(decl) = node.child_by_field_name("declaration") {
            match decl.kind() {
                "lexical_declaration" | "variable_declaration" => {
                    for declarator in named_children(decl) {
                        if let Some(name) = declarator
                            .child_by_field_name("name")
                            .filter(|n| n.kind() == "identifier")
                        {
                            let name = self.text(name).to_string();
                            self.exports.push(Export::Local {
                                exported: name.clone(),
                                local: name,
                            });
                        }
                    }
                }
                _ => {
                    if let Some(name) = decl.child_by_field_name("name") {
                        let local = self.text(name).to_string();
                        let exported = if is_default {
                            "default".to_string()
                        } else {
                            local.clone()
                        };
                        self.exports.push(Export::Local { exported, local });
                    }
                }
            }
        }

        if is_default {
            if let Some(value) = node
                .child_by_field_name("value")
                .filter(|v| v.kind() == "identifier")
            {
                self.exports.push(Export::Local {
                    exported: "default".to_string(),
                    local: self.text(value).to_string(),
                });
            }
        }

        let mut has_clause = false;
        for child in named_children(node) {
            match child.kind() {
                "export_clause" => {
                    has_clause = true;
                    for spec in named_children(child) {
                        if spec.kind() != "export_specifier" {
                            continue;
                        }
                        let Some(name) = spec.child_by_field_name("name") else {
                            continue;
                        };
                        let name = unquote(self.text(name)).to_string();
                        let exported = spec
                            .child_by_field_name("alias")
                            .map(|a| unquote(self.text(a)).to_string())
                            .unwrap_or_else(|| name.clone());
                        match &source {
                            Some(source) => self.exports.push(Export::From {
                                exported,
                                imported: name,
                                source: source.clone(),
                            }),
                            None => self.exports.push(Export::Local {
                                exported,
                                local: name,
                            }),
                        }
                    }
                }
                "namespace_export" => has_clause = true,
                _ => {}
            }
        }

        if let Some(source) = source {
            if !has_clause && has_token(node, "*") {
                self.exports.push(Export::Star { source });
            }
        }
    }

    /// Receiver expression of an access, as far as syntax tells.
    fn receiver_of(&self, expr: Node<'a>, scope: Scope<'_>) -> Receiver {
        match expr.kind() {
            "this" => match scope.this {
                ThisCtx::Instance(class) => Receiver::This(class.to_string()),
                ThisCtx::Static => Receiver::StaticThis,
                ThisCtx::Unknown => Receiver::Unknown,
            },
            "super" => match scope.this {
                ThisCtx::Instance(class) => Receiver::Super(class.to_string()),
                ThisCtx::Static => Receiver::StaticThis,
                ThisCtx::Unknown => Receiver::Unknown,
            },
            "identifier" => Receiver::Ident(self.text(expr).to_string()),
            "new_expression" => expr
                .child_by_field_name("constructor")
                .filter(|c| matches!(c.kind(), "identifier" | "member_expression"))
                .map(|c| Receiver::Typed(compact(self.text(c))))
                .unwrap_or(Receiver::Unknown),
            "as_expression" => {
                let target = expr.named_child(1).and_then(|ty| self.type_name(ty));
                match (target, expr.named_child(0)) {
                    (Some(ty), _) => Receiver::Typed(ty),
                    (None, Some(inner)) if expr.named_child_count() == 1 => {
                        // `x as const`
                        self.receiver_of(inner, scope)
                    }
                    _ => Receiver::Unknown,
                }
            }
            "type_assertion" => expr
                .named_child(0)
                .and_then(|args| args.named_child(0))
                .and_then(|ty| self.type_name(ty))
                .map(Receiver::Typed)
                .unwrap_or(Receiver::Unknown),
            "satisfies_expression" | "non_null_expression" | "parenthesized_expression" => expr
                .named_child(0)
                .map(|inner| self.receiver_of(inner, scope))
                .unwrap_or(Receiver::Unknown),
            "member_expression" => {
                let (Some(object), Some(property)) = (
                    expr.child_by_field_name("object"),
                    expr.child_by_field_name("property"),
                ) else {
                    return Receiver::Unknown;
                };
                if !matches!(
                    property.kind(),
                    "property_identifier" | "private_property_identifier"
                ) {
                    return Receiver::Unknown;
                }
                Receiver::Member(
                    Box::new(self.receiver_of(object, scope)),
                    self.text(property).to_string(),
                )
            }
            "call_expression" => match expr.child_by_field_name("function") {
                Some(callee) if callee.kind() == "member_expression" => {
                    Receiver::Call(Box::new(self.receiver_of(callee, scope)))
                }
                _ => Receiver::Unknown,
            },
            _ => Receiver::Unknown,
        }
    }

    /// Simple type name of a type node: `A`, `ns.A`, `A<T>` -> `A`,
    /// `A | undefined` -> `A`. Anything else is not nameable.
    fn type_name(&self, node: Node<'a>) -> Option<String> {
        match node.kind() {
            "type_annotation" | "parenthesized_type" => {
                node.named_child(0).and_then(|inner| self.type_name(inner))
            }
            "type_identifier" | "identifier" => Some(self.text(node).to_string()),
            "nested_type_identifier" => Some(compact(self.text(node))),
            "generic_type" => node
                .child_by_field_name("name")
                .and_then(|name| self.type_name(name)),
            "union_type" => {
                let mut members = Vec::new();
                self.union_members(node, &mut members);
                let mut nameable = members
                    .into_iter()
                    .filter(|m| !matches!(self.text(*m).trim(), "null" | "undefined"));
                match (nameable.next(), nameable.next()) {
                    (Some(only), None) => self.type_name(only),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn union_members(&self, node: Node<'a>, out: &mut Vec<Node<'a>>) {
        for child in named_children(node) {
            if child.kind() == "union_type" {
                self.union_members(child, out);
            } else {
                out.push(child);
            }
        }
    }

    // ------------------------------------------------------------------
    // Class declarations
    // ------------------------------------------------------------------

    fn classes(&self, root: Node<'a>) -> Vec<ClassDeclaration> {
        let mut classes = Vec::new();
        for stmt in named_children(root) {
            let (class_node, start) = match stmt.kind() {
                "class_declaration" | "abstract_class_declaration" => (stmt, stmt),
                "export_statement" => match stmt.child_by_field_name("declaration") {
                    Some(decl)
                        if matches!(
                            decl.kind(),
                            "class_declaration" | "abstract_class_declaration"
                        ) =>
                    {
                        (decl, stmt)
                    }
                    _ => continue,
                },
                _ => continue,
            };
            if let Some(class) = self.class_declaration(class_node, start) {
                classes.push(class);
            }
        }
        classes
    }

    fn class_declaration(&self, node: Node<'a>, start: Node<'a>) -> Option<ClassDeclaration> {
        let name_node = node.child_by_field_name("name")?;
        let leading_comment = self.leading_comment(start);
        let ignored = leading_comment
            .as_deref()
            .is_some_and(|c| c.contains(IGNORE_MARKER));

        let mut base = None;
        let mut implements = Vec::new();
        if let Some(heritage) = child_of_kind(node, "class_heritage") {
            for clause in named_children(heritage) {
                match clause.kind() {
                    "extends_clause" => {
                        base = clause
                            .child_by_field_name("value")
                            .or_else(|| clause.named_child(0))
                            .map(|v| compact(self.text(v)));
                    }
                    "implements_clause" => {
                        implements.extend(
                            named_children(clause)
                                .into_iter()
                                .map(|ty| compact(self.text(ty))),
                        );
                    }
                    _ => {}
                }
            }
        }

        let members = node
            .child_by_field_name("body")
            .map(|body| self.members(body))
            .unwrap_or_default();

        Some(ClassDeclaration {
            name: self.text(name_node).to_string(),
            line: line_of(name_node),
            is_abstract: node.kind() == "abstract_class_declaration",
            base,
            implements,
            leading_comment,
            ignored,
            members,
        })
    }

    fn members(&self, body: Node<'a>) -> Vec<Member> {
        let mut members = Vec::new();
        for child in named_children(body) {
            match child.kind() {
                "method_definition" => members.extend(self.method_members(child, false)),
                "abstract_method_signature" => members.extend(self.method_members(child, true)),
                "public_field_definition" => members.extend(self.field_member(child)),
                _ => {}
            }
        }
        members
    }

    /// `(name, is #private)` for nameable member names.
    fn member_name(&self, node: Node<'a>) -> Option<(String, bool)> {
        match node.kind() {
            "property_identifier" | "number" => Some((self.text(node).to_string(), false)),
            "private_property_identifier" => Some((self.text(node).to_string(), true)),
            "string" => Some((unquote(self.text(node)).to_string(), false)),
            _ => None,
        }
    }

    fn method_members(&self, node: Node<'a>, is_abstract: bool) -> Vec<Member> {
        if has_token(node, "static") {
            return Vec::new();
        }
        let Some(name_node) = node.child_by_field_name("name") else {
            return Vec::new();
        };
        let Some((name, hash_private)) = self.member_name(name_node) else {
            return Vec::new();
        };
        if name == "constructor" && !is_abstract {
            return self.parameter_properties(node);
        }

        let kind = if has_token(node, "get") {
            MemberKind::Property(PropertyForm::Accessor(AccessorKind::Get))
        } else if has_token(node, "set") {
            MemberKind::Property(PropertyForm::Accessor(AccessorKind::Set))
        } else {
            MemberKind::Method
        };

        // Decorators of methods are siblings in the class body.
        let mut start = node;
        let mut decorators = Vec::new();
        while let Some(prev) = start.prev_named_sibling().filter(|p| p.kind() == "decorator") {
            decorators.push(self.decorator_name(prev));
            start = prev;
        }
        decorators.reverse();
        decorators.extend(self.own_decorators(node));

        // Overload signatures go with the implementation.
        while let Some(prev) = start.prev_named_sibling().filter(|p| {
            p.kind() == "method_signature"
                && p.child_by_field_name("name")
                    .is_some_and(|n| unquote(self.text(n)) == name)
        }) {
            start = prev;
        }

        let declared_type = node
            .child_by_field_name("return_type")
            .and_then(|ty| self.type_name(ty));

        vec![self.build_member(
            node,
            start,
            name_node,
            name,
            kind,
            hash_private,
            is_abstract,
            decorators,
            None,
            declared_type,
        )]
    }

    fn field_member(&self, node: Node<'a>) -> Option<Member> {
        if has_token(node, "static") {
            return None;
        }
        let name_node = node.child_by_field_name("name")?;
        let (name, hash_private) = self.member_name(name_node)?;

        let mut start = node;
        let mut decorators = Vec::new();
        while let Some(prev) = start.prev_named_sibling().filter(|p| p.kind() == "decorator") {
            decorators.push(self.decorator_name(prev));
            start = prev;
        }
        decorators.reverse();
        decorators.extend(self.own_decorators(node));

        let value = node.child_by_field_name("value");
        let initializer_call = value
            .filter(|v| v.kind() == "call_expression")
            .and_then(|call| call.child_by_field_name("function"))
            .filter(|callee| callee.kind() == "identifier")
            .map(|callee| self.text(callee).to_string());
        let declared_type = match node.child_by_field_name("type") {
            Some(ty) => self.type_name(ty),
            None => value
                .filter(|v| v.kind() == "new_expression")
                .and_then(|v| v.child_by_field_name("constructor"))
                .filter(|c| matches!(c.kind(), "identifier" | "member_expression"))
                .map(|c| compact(self.text(c))),
        };

        Some(self.build_member(
            node,
            start,
            name_node,
            name,
            MemberKind::Property(PropertyForm::Field),
            hash_private,
            has_token(node, "abstract"),
            decorators,
            initializer_call,
            declared_type,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn build_member(
        &self,
        node: Node<'a>,
        start: Node<'a>,
        name_node: Node<'a>,
        name: String,
        kind: MemberKind,
        hash_private: bool,
        is_abstract: bool,
        decorators: Vec<String>,
        initializer_call: Option<String>,
        declared_type: Option<String>,
    ) -> Member {
        let leading_comment = self.leading_comment(start);
        let ignored = leading_comment
            .as_deref()
            .is_some_and(|c| c.contains(IGNORE_MARKER));

        let modifier = child_of_kind(node, "accessibility_modifier");
        let accessibility = if hash_private {
            Accessibility::Private
        } else {
            modifier
                .map(|m| Accessibility::from_keyword(self.text(m).trim()))
                .unwrap_or_default()
        };

        let mut removal_start = start.start_byte();
        if let Some(comment) = start.prev_sibling().filter(|c| c.kind() == "comment") {
            if leading_comment.is_some() && self.text(comment).starts_with("/**") {
                removal_start = comment.start_byte();
            }
        }
        let mut removal_end = node.end_byte();
        if let Some(next) = node
            .next_sibling()
            .filter(|n| !n.is_named() && matches!(n.kind(), ";" | ","))
        {
            removal_end = next.end_byte();
        }

        Member {
            name,
            kind,
            accessibility,
            is_abstract,
            decorators,
            initializer_call,
            leading_comment,
            ignored,
            line: line_of(name_node),
            declared_type,
            edit: MemberEdit {
                removal: Span::new(removal_start, removal_end),
                accessibility: modifier.map(span_of),
                insert_at: self.insert_point(node),
                modifiers: Vec::new(),
            },
        }
    }

    /// Constructor parameters declared with `public`/`private`/`protected`,
    /// `readonly` or `override`.
    fn parameter_properties(&self, ctor: Node<'a>) -> Vec<Member> {
        let Some(params) = ctor.child_by_field_name("parameters") else {
            return Vec::new();
        };
        let mut members = Vec::new();
        for param in named_children(params) {
            if !matches!(param.kind(), "required_parameter" | "optional_parameter") {
                continue;
            }
            let modifier = child_of_kind(param, "accessibility_modifier");
            let modifier_nodes: Vec<Node<'a>> = children(param)
                .into_iter()
                .filter(|c| {
                    matches!(c.kind(), "accessibility_modifier" | "override_modifier")
                        || (!c.is_named() && c.kind() == "readonly")
                })
                .collect();
            if modifier_nodes.is_empty() {
                continue;
            }
            let Some(pattern) = param
                .child_by_field_name("pattern")
                .filter(|p| p.kind() == "identifier")
            else {
                continue;
            };

            let leading_comment = self.leading_comment(param);
            let ignored = leading_comment
                .as_deref()
                .is_some_and(|c| c.contains(IGNORE_MARKER));
            let modifiers = modifier_nodes
                .iter()
                .map(|m| {
                    let end = m
                        .next_sibling()
                        .map(|n| n.start_byte())
                        .unwrap_or_else(|| m.end_byte());
                    Span::new(m.start_byte(), end)
                })
                .collect();
            let mut removal_end = param.end_byte();
            if let Some(next) = param
                .next_sibling()
                .filter(|n| !n.is_named() && n.kind() == ",")
            {
                removal_end = next.end_byte();
            }

            members.push(Member {
                name: self.text(pattern).to_string(),
                kind: MemberKind::Property(PropertyForm::Parameter),
                accessibility: modifier
                    .map(|m| Accessibility::from_keyword(self.text(m).trim()))
                    .unwrap_or_default(),
                is_abstract: false,
                decorators: self.own_decorators(param),
                initializer_call: None,
                leading_comment,
                ignored,
                line: line_of(pattern),
                declared_type: param
                    .child_by_field_name("type")
                    .and_then(|ty| self.type_name(ty)),
                edit: MemberEdit {
                    removal: Span::new(param.start_byte(), removal_end),
                    accessibility: modifier.map(span_of),
                    insert_at: self.insert_point(param),
                    modifiers,
                },
            });
        }
        members
    }

    fn own_decorators(&self, node: Node<'a>) -> Vec<String> {
        children(node)
            .into_iter()
            .filter(|c| c.kind() == "decorator")
            .map(|d| self.decorator_name(d))
            .collect()
    }

    /// `@Dec`, `@ns.Dec`, `@Dec(...)` -> `Dec` / `ns.Dec`.
    fn decorator_name(&self, decorator: Node<'a>) -> String {
        let Some(expr) = decorator.named_child(0) else {
            return String::new();
        };
        let callee = match expr.kind() {
            "call_expression" => expr.child_by_field_name("function").unwrap_or(expr),
            _ => expr,
        };
        compact(self.text(callee))
    }

    /// First byte after the decorators of a declaration.
    fn insert_point(&self, node: Node<'a>) -> usize {
        children(node)
            .into_iter()
            .find(|c| c.kind() != "decorator" && c.kind() != "comment")
            .map(|c| c.start_byte())
            .unwrap_or_else(|| node.start_byte())
    }

    /// Comment directly preceding `start`, unless it trails the previous
    /// token on the same line.
    fn leading_comment(&self, start: Node<'a>) -> Option<String> {
        let comment = start.prev_sibling().filter(|n| n.kind() == "comment")?;
        if let Some(before) = comment.prev_sibling() {
            if before.kind() != "comment"
                && before.end_position().row == comment.start_position().row
            {
                return None;
            }
        }
        Some(self.text(comment).to_string())
    }
}

/// Drops whitespace inside dotted names (`ns . A` -> `ns.A`).
fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
