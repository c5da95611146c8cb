// src/core/analyzer/syntax.rs
use std::collections::HashMap;
use tree_sitter::{Node, Parser};

use crate::error::{HexviewError, Result};
use super::super::identity::Position;

/// How a field holds the type it refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Holding {
    Value,
    Pointer,
    Many,
}

/// A named type reference, possibly package qualified
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct TypeRef {
    pub qualifier: Option<String>,
    pub name: String,
    pub holding: Holding,
}

#[derive(Debug, Clone)]
pub(super) struct FieldDecl {
    /// `None` for an embedded field
    pub name: Option<String>,
    pub position: Position,
    pub type_ref: Option<TypeRef>,
}

#[derive(Debug, Clone)]
pub(super) enum TypeShape {
    Struct(Vec<FieldDecl>),
    Interface(Vec<(String, Position)>),
    Other,
}

#[derive(Debug, Clone)]
pub(super) struct TypeDecl {
    pub name: String,
    pub position: Position,
    pub shape: TypeShape,
}

/// `name(...)` or `qualifier.name(...)`; a qualifier of `None` on a selector
/// means the operand was not a plain identifier
#[derive(Debug, Clone)]
pub(super) struct CallSite {
    pub selector: bool,
    pub qualifier: Option<String>,
    pub name: String,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub(super) struct FuncDecl {
    pub name: String,
    pub receiver: Option<String>,
    pub position: Position,
    pub calls: Vec<CallSite>,
}

/// Everything the analyzer needs from one Go file
#[derive(Debug, Clone, Default)]
pub(super) struct FileFacts {
    pub dir: String,
    pub filename: String,
    pub package: String,
    /// Import alias to import path
    pub imports: HashMap<String, String>,
    pub types: Vec<TypeDecl>,
    pub funcs: Vec<FuncDecl>,
}

/// Tree-sitter front end for Go sources
pub(super) struct GoSyntax {
    parser: Parser,
}

impl GoSyntax {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let go_language = tree_sitter_go::language();
        parser
            .set_language(&go_language)
            .map_err(|e| HexviewError::Parser(format!("Failed to set Go language: {}", e)))?;

        Ok(Self { parser })
    }

    pub fn parse(&mut self, dir: &str, filename: &str, source: &str) -> Result<FileFacts> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| HexviewError::Parser(format!("Failed to parse {}", filename)))?;

        let mut facts = FileFacts {
            dir: dir.to_string(),
            filename: filename.to_string(),
            ..FileFacts::default()
        };
        let extractor = Extractor {
            source: source.as_bytes(),
            filename,
        };
        extractor.extract(tree.root_node(), &mut facts);
        Ok(facts)
    }
}

struct Extractor<'s> {
    source: &'s [u8],
    filename: &'s str,
}

impl<'s> Extractor<'s> {
    fn extract(&self, root: Node, facts: &mut FileFacts) {
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "package_clause" => {
                    if let Some(name) = child.named_child(0) {
                        facts.package = self.text(name).to_string();
                    }
                }
                "import_declaration" => self.imports(child, &mut facts.imports),
                "type_declaration" => {
                    let mut specs = child.walk();
                    for spec in child.named_children(&mut specs) {
                        if matches!(spec.kind(), "type_spec" | "type_alias") {
                            if let Some(decl) = self.type_decl(spec) {
                                facts.types.push(decl);
                            }
                        }
                    }
                }
                "function_declaration" | "method_declaration" => {
                    if let Some(decl) = self.func_decl(child) {
                        facts.funcs.push(decl);
                    }
                }
                _ => {}
            }
        }
    }

    fn imports(&self, node: Node, imports: &mut HashMap<String, String>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "import_spec" => self.import_spec(child, imports),
                "import_spec_list" => self.imports(child, imports),
                _ => {}
            }
        }
    }

    fn import_spec(&self, spec: Node, imports: &mut HashMap<String, String>) {
        let Some(path_node) = spec.child_by_field_name("path") else {
            return;
        };
        let path = self.text(path_node).trim_matches(|c| c == '"' || c == '`');
        let alias = match spec.child_by_field_name("name") {
            Some(name) if name.kind() == "package_identifier" => self.text(name).to_string(),
            // dot and blank imports have no usable qualifier
            Some(_) => return,
            None => path.rsplit('/').next().unwrap_or(path).to_string(),
        };
        imports.insert(alias, path.to_string());
    }

    fn type_decl(&self, spec: Node) -> Option<TypeDecl> {
        let name = self.text(spec.child_by_field_name("name")?).to_string();
        if name == "_" {
            return None;
        }
        let shape = match spec.child_by_field_name("type") {
            Some(ty) if ty.kind() == "struct_type" => TypeShape::Struct(self.fields(ty)),
            Some(ty) if ty.kind() == "interface_type" => TypeShape::Interface(self.interface_methods(ty)),
            _ => TypeShape::Other,
        };
        Some(TypeDecl {
            name,
            position: self.position(spec),
            shape,
        })
    }

    fn fields(&self, struct_type: Node) -> Vec<FieldDecl> {
        let mut fields = Vec::new();
        let mut cursor = struct_type.walk();
        for list in struct_type.named_children(&mut cursor) {
            if list.kind() != "field_declaration_list" {
                continue;
            }
            let mut decls = list.walk();
            for decl in list.named_children(&mut decls) {
                if decl.kind() != "field_declaration" {
                    continue;
                }
                let type_ref = decl.child_by_field_name("type").and_then(|t| self.type_ref(t));
                let mut names = decl.walk();
                let named: Vec<Node> = decl.children_by_field_name("name", &mut names).collect();

                if named.is_empty() {
                    fields.push(FieldDecl {
                        name: None,
                        position: self.position(decl),
                        type_ref,
                    });
                    continue;
                }
                for name in named {
                    fields.push(FieldDecl {
                        name: Some(self.text(name).to_string()),
                        position: self.position(name),
                        type_ref: type_ref.clone(),
                    });
                }
            }
        }
        fields
    }

    fn interface_methods(&self, node: Node) -> Vec<(String, Position)> {
        let mut methods = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "method_elem" | "method_spec" => {
                    if let Some(name) = child.child_by_field_name("name") {
                        methods.push((self.text(name).to_string(), self.position(child)));
                    }
                }
                "method_spec_list" => methods.extend(self.interface_methods(child)),
                _ => {}
            }
        }
        methods
    }

    /// Resolve a type expression down to the named type it holds
    fn type_ref(&self, node: Node) -> Option<TypeRef> {
        match node.kind() {
            "type_identifier" => Some(TypeRef {
                qualifier: None,
                name: self.text(node).to_string(),
                holding: Holding::Value,
            }),
            "qualified_type" => Some(TypeRef {
                qualifier: Some(self.text(node.child_by_field_name("package")?).to_string()),
                name: self.text(node.child_by_field_name("name")?).to_string(),
                holding: Holding::Value,
            }),
            "generic_type" => self.type_ref(node.child_by_field_name("type")?),
            "parenthesized_type" => self.type_ref(node.named_child(0)?),
            "pointer_type" => {
                let mut inner = self.type_ref(node.named_child(0)?)?;
                if inner.holding == Holding::Value {
                    inner.holding = Holding::Pointer;
                }
                Some(inner)
            }
            "slice_type" | "array_type" => {
                let mut inner = self.type_ref(node.child_by_field_name("element")?)?;
                inner.holding = Holding::Many;
                Some(inner)
            }
            "map_type" => {
                let mut inner = self.type_ref(node.child_by_field_name("value")?)?;
                inner.holding = Holding::Many;
                Some(inner)
            }
            _ => None,
        }
    }

    fn func_decl(&self, node: Node) -> Option<FuncDecl> {
        let name = self.text(node.child_by_field_name("name")?).to_string();
        if name == "_" || name == "init" {
            return None;
        }
        let receiver = match node.child_by_field_name("receiver") {
            Some(list) => Some(self.receiver_type(list)?),
            None => None,
        };
        let calls = node
            .child_by_field_name("body")
            .map(|body| self.calls(body))
            .unwrap_or_default();

        Some(FuncDecl {
            name,
            receiver,
            position: self.position(node),
            calls,
        })
    }

    fn receiver_type(&self, list: Node) -> Option<String> {
        let mut cursor = list.walk();
        let param = list
            .named_children(&mut cursor)
            .find(|c| c.kind() == "parameter_declaration")?;
        let type_ref = self.type_ref(param.child_by_field_name("type")?)?;
        Some(type_ref.name)
    }

    /// Call expressions anywhere below `body`, in source order
    fn calls(&self, body: Node) -> Vec<CallSite> {
        let mut calls = Vec::new();
        let mut stack = vec![body];

        while let Some(node) = stack.pop() {
            if node.kind() == "call_expression" {
                if let Some(call) = node.child_by_field_name("function").and_then(|f| self.call_site(f)) {
                    calls.push(call);
                }
            }
            let mut cursor = node.walk();
            let children: Vec<Node> = node.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
        calls
    }

    fn call_site(&self, function: Node) -> Option<CallSite> {
        match function.kind() {
            "identifier" => Some(CallSite {
                selector: false,
                qualifier: None,
                name: self.text(function).to_string(),
                position: self.position(function),
            }),
            "selector_expression" => {
                let field = function.child_by_field_name("field")?;
                let qualifier = function
                    .child_by_field_name("operand")
                    .filter(|o| o.kind() == "identifier")
                    .map(|o| self.text(o).to_string());
                Some(CallSite {
                    selector: true,
                    qualifier,
                    name: self.text(field).to_string(),
                    position: self.position(field),
                })
            }
            _ => None,
        }
    }

    fn text(&self, node: Node) -> &'s str {
        node.utf8_text(self.source).unwrap_or_default()
    }

    fn position(&self, node: Node) -> Position {
        let point = node.start_position();
        Position::new(self.filename, node.start_byte(), point.row + 1, point.column + 1)
    }
}
