//! PHP class extractor
//!
//! Walks a tree-sitter-php syntax tree and collects:
//! - Namespaces and `use` imports (used to resolve every class reference)
//! - Class declarations with base class, interfaces and traits
//! - Methods with parameters, call sites and returned values
//! - Properties with literal default values
//!
//! Top-level statements are handed to the route extractor.

use super::helpers::*;
use super::models::*;
use super::routes;
use anyhow::Result;
use std::collections::BTreeMap;

const NAME_KINDS: &[&str] = &["name", "qualified_name"];

const PRIMITIVE_TYPES: &[&str] = &[
    "int", "integer", "float", "double", "string", "bool", "boolean", "array", "mixed", "void",
    "null", "callable", "iterable", "object", "never", "false", "true", "resource",
];

/// Name resolution context of a file position: current namespace, imports
/// and (inside a class body) the enclosing class.
#[derive(Debug, Clone, Default)]
pub struct FileScope {
    pub namespace: Option<String>,
    pub imports: BTreeMap<String, String>,
    pub class: Option<String>,
    pub parent: Option<String>,
}

impl FileScope {
    /// Resolve a class reference as written in source to a fully-qualified name
    pub fn resolve(&self, raw: &str) -> String {
        let raw = raw.trim();
        if let Some(absolute) = raw.strip_prefix('\\') {
            return absolute.to_string();
        }
        match raw.to_ascii_lowercase().as_str() {
            "self" | "static" => return self.class.clone().unwrap_or_else(|| raw.to_string()),
            "parent" => return self.parent.clone().unwrap_or_else(|| raw.to_string()),
            _ => {}
        }

        let (head, rest) = match raw.split_once('\\') {
            Some((head, rest)) => (head, Some(rest)),
            None => (raw, None),
        };
        if let Some(imported) = self.imports.get(head) {
            return match rest {
                Some(rest) => format!("{}\\{}", imported, rest),
                None => imported.clone(),
            };
        }

        match &self.namespace {
            Some(ns) => format!("{}\\{}", ns, raw),
            None => raw.to_string(),
        }
    }

    /// Resolve a type hint: class types are resolved, primitives and
    /// compound types are kept as written (without a leading `?`).
    pub fn resolve_type(&self, raw: &str) -> String {
        let raw = raw.trim().trim_start_matches('?');
        if raw.contains('|') || raw.contains('&') || raw.contains('(') {
            return raw.to_string();
        }
        if PRIMITIVE_TYPES.contains(&raw.to_ascii_lowercase().as_str()) {
            return raw.to_string();
        }
        self.resolve(raw)
    }
}

/// Whether a resolved type hint names a class (as opposed to a primitive)
pub fn is_class_type(type_name: &str) -> bool {
    !type_name.contains('|')
        && !type_name.contains('&')
        && !PRIMITIVE_TYPES.contains(&type_name.to_ascii_lowercase().as_str())
}

/// Extract PHP code structure
pub fn extract(root: &tree_sitter::Node, source: &str, parsed: &mut ParsedFile) -> Result<()> {
    let mut scope = FileScope::default();
    extract_statements(root, source, &mut scope, parsed)?;
    if parsed.namespace.is_none() {
        parsed.namespace = scope.namespace.clone();
    }
    parsed.imports.extend(scope.imports);
    Ok(())
}

fn extract_statements(
    node: &tree_sitter::Node,
    source: &str,
    scope: &mut FileScope,
    parsed: &mut ParsedFile,
) -> Result<()> {
    let mut cursor = node.walk();

    for child in node.children(&mut cursor) {
        match child.kind() {
            "namespace_definition" => {
                let name = get_field_text(&child, "name", source);
                if let Some(body) = child.child_by_field_name("body") {
                    let mut inner = FileScope {
                        namespace: name,
                        ..Default::default()
                    };
                    extract_statements(&body, source, &mut inner, parsed)?;
                    if parsed.namespace.is_none() {
                        parsed.namespace = inner.namespace;
                    }
                    parsed.imports.extend(inner.imports);
                } else {
                    scope.namespace = name;
                    scope.imports.clear();
                }
            }
            "namespace_use_declaration" => {
                extract_use(&child, source, scope);
            }
            "class_declaration" => {
                if let Some(class) = extract_class(&child, source, scope, &parsed.path) {
                    parsed.classes.push(class);
                }
            }
            "expression_statement" => {
                routes::extract_statement(
                    &child,
                    source,
                    scope,
                    &routes::GroupContext::default(),
                    parsed,
                );
            }
            "function_definition" | "interface_declaration" | "trait_declaration"
            | "enum_declaration" => {}
            _ => {
                extract_statements(&child, source, scope, parsed)?;
            }
        }
    }

    Ok(())
}

fn extract_use(node: &tree_sitter::Node, source: &str, scope: &mut FileScope) {
    // `use function ...;` and `use const ...;` do not import classes
    let imports_symbols = node
        .children(&mut node.walk())
        .any(|c| matches!(c.kind(), "function" | "const"));
    if imports_symbols {
        return;
    }

    let mut group_prefix: Option<String> = None;
    for child in node.named_children(&mut node.walk()) {
        match child.kind() {
            "namespace_use_clause" => add_use_clause(&child, source, None, scope),
            "namespace_name" => {
                group_prefix = get_text(&child, source).map(|s| s.trim_matches('\\').to_string());
            }
            "namespace_use_group" => {
                for clause in child.named_children(&mut child.walk()) {
                    if matches!(
                        clause.kind(),
                        "namespace_use_clause" | "namespace_use_group_clause"
                    ) {
                        add_use_clause(&clause, source, group_prefix.as_deref(), scope);
                    }
                }
            }
            _ => {}
        }
    }
}

fn add_use_clause(
    clause: &tree_sitter::Node,
    source: &str,
    prefix: Option<&str>,
    scope: &mut FileScope,
) {
    let names = named_children_of_kinds(clause, &["name", "qualified_name", "namespace_name"]);
    let Some(path) = names.first().and_then(|n| get_text(n, source)) else {
        return;
    };
    let path = path.trim_start_matches('\\');
    let full = match prefix {
        Some(prefix) => format!("{}\\{}", prefix, path),
        None => path.to_string(),
    };

    let alias = clause
        .child_by_field_name("alias")
        .and_then(|a| get_text(&a, source))
        .map(|s| s.to_string())
        .or_else(|| {
            find_child_by_kind(clause, "namespace_aliasing_clause")
                .and_then(|a| find_child_by_kind(&a, "name"))
                .and_then(|n| get_text(&n, source))
                .map(|s| s.to_string())
        })
        .or_else(|| {
            if names.len() > 1 {
                names.last().and_then(|n| get_text(n, source)).map(|s| s.to_string())
            } else {
                None
            }
        })
        .unwrap_or_else(|| short_name(&full).to_string());

    scope.imports.insert(alias, full);
}

fn extract_class(
    node: &tree_sitter::Node,
    source: &str,
    scope: &FileScope,
    file_path: &str,
) -> Option<PhpClass> {
    let name = get_field_text(node, "name", source).filter(|n| !n.trim().is_empty())?;
    let fqcn = match &scope.namespace {
        Some(ns) => format!("{}\\{}", ns, name),
        None => name.clone(),
    };

    let is_abstract = node
        .children(&mut node.walk())
        .any(|c| c.kind() == "abstract_modifier" || c.kind() == "abstract");

    let extends = find_child_by_kind(node, "base_clause")
        .and_then(|base| named_children_of_kinds(&base, NAME_KINDS).into_iter().next())
        .and_then(|n| get_text(&n, source))
        .map(|raw| scope.resolve(raw));

    let implements = find_child_by_kind(node, "class_interface_clause")
        .map(|clause| {
            named_children_of_kinds(&clause, NAME_KINDS)
                .iter()
                .filter_map(|n| get_text(n, source))
                .map(|raw| scope.resolve(raw))
                .collect()
        })
        .unwrap_or_default();

    let class_scope = FileScope {
        namespace: scope.namespace.clone(),
        imports: scope.imports.clone(),
        class: Some(fqcn.clone()),
        parent: extends.clone(),
    };

    let mut class = PhpClass {
        name,
        namespace: scope.namespace.clone(),
        fqcn,
        is_abstract,
        extends,
        implements,
        traits: Vec::new(),
        methods: Vec::new(),
        properties: Vec::new(),
        docstring: get_php_doc(node, source),
        file_path: file_path.to_string(),
        line_start: line_of(node),
        line_end: node.end_position().row as u32 + 1,
    };

    let body = node
        .child_by_field_name("body")
        .or_else(|| find_child_by_kind(node, "declaration_list"));
    if let Some(body) = body {
        extract_class_body(&body, source, &class_scope, &mut class);
    }

    Some(class)
}

fn extract_class_body(
    body: &tree_sitter::Node,
    source: &str,
    scope: &FileScope,
    class: &mut PhpClass,
) {
    for child in body.named_children(&mut body.walk()) {
        match child.kind() {
            "use_declaration" => {
                for name in named_children_of_kinds(&child, NAME_KINDS) {
                    if let Some(raw) = get_text(&name, source) {
                        class.traits.push(scope.resolve(raw));
                    }
                }
            }
            "method_declaration" => {
                if let Some(method) = extract_method(&child, source, scope) {
                    if method.name == "__construct" {
                        for param in &method.params {
                            if let Some(visibility) = param.promoted {
                                class.properties.push(PhpProperty {
                                    name: param.name.clone(),
                                    visibility,
                                    is_static: false,
                                    type_name: param.type_name.clone(),
                                    default: None,
                                });
                            }
                        }
                    }
                    class.methods.push(method);
                }
            }
            "property_declaration" => {
                extract_properties(&child, source, scope, class);
            }
            _ => {}
        }
    }
}

fn extract_method(node: &tree_sitter::Node, source: &str, scope: &FileScope) -> Option<PhpMethod> {
    let name = get_field_text(node, "name", source)?;
    let visibility = get_visibility(node, source);

    let params = node
        .child_by_field_name("parameters")
        .map(|p| extract_params(&p, source, scope))
        .unwrap_or_default();

    let return_type = node
        .child_by_field_name("return_type")
        .and_then(|r| get_text(&r, source))
        .map(|s| scope.resolve_type(s.trim_start_matches(':')));

    let (calls, returns) = match node.child_by_field_name("body") {
        Some(body) => {
            let mut calls = Vec::new();
            collect_calls(&body, source, scope, &mut calls);
            let mut returns = Vec::new();
            collect_returns(&body, source, scope, &mut returns);
            (calls, returns)
        }
        None => (Vec::new(), Vec::new()),
    };

    Some(PhpMethod {
        name,
        visibility,
        is_static: has_child_kind(node, "static_modifier"),
        is_abstract: has_child_kind(node, "abstract_modifier"),
        params,
        return_type,
        complexity: calculate_complexity(node),
        calls,
        returns,
        line_start: line_of(node),
        line_end: node.end_position().row as u32 + 1,
    })
}

fn extract_params(node: &tree_sitter::Node, source: &str, scope: &FileScope) -> Vec<PhpParam> {
    let mut params = Vec::new();

    for child in node.named_children(&mut node.walk()) {
        let promoted = match child.kind() {
            "simple_parameter" | "variadic_parameter" => None,
            "property_promotion_parameter" => Some(
                child
                    .child_by_field_name("visibility")
                    .and_then(|v| get_text(&v, source))
                    .map(Visibility::from_keyword)
                    .unwrap_or_default(),
            ),
            _ => continue,
        };

        let name = child
            .child_by_field_name("name")
            .and_then(|n| get_text(&n, source))
            .unwrap_or("_")
            .trim_start_matches('&')
            .trim_start_matches('$')
            .to_string();

        let type_name = child
            .child_by_field_name("type")
            .and_then(|t| get_text(&t, source))
            .map(|s| scope.resolve_type(s));

        params.push(PhpParam {
            name,
            type_name,
            promoted,
        });
    }

    params
}

fn extract_properties(
    node: &tree_sitter::Node,
    source: &str,
    scope: &FileScope,
    class: &mut PhpClass,
) {
    let visibility = get_visibility(node, source);
    let is_static = has_child_kind(node, "static_modifier");
    let type_name = node
        .child_by_field_name("type")
        .and_then(|t| get_text(&t, source))
        .map(|s| scope.resolve_type(s));

    for element in node.named_children(&mut node.walk()) {
        if element.kind() != "property_element" {
            continue;
        }
        let Some(name) = element
            .child_by_field_name("name")
            .or_else(|| find_child_by_kind(&element, "variable_name"))
            .and_then(|n| get_text(&n, source))
        else {
            continue;
        };

        let default = element
            .child_by_field_name("default_value")
            .or_else(|| {
                find_child_by_kind(&element, "property_initializer")
                    .and_then(|init| init.named_child(0))
            })
            .map(|value| value_of(&value, source, scope));

        class.properties.push(PhpProperty {
            name: name.trim_start_matches('$').to_string(),
            visibility,
            is_static,
            type_name: type_name.clone(),
            default,
        });
    }
}

fn get_visibility(node: &tree_sitter::Node, source: &str) -> Visibility {
    find_child_by_kind(node, "visibility_modifier")
        .and_then(|v| get_text(&v, source))
        .map(Visibility::from_keyword)
        .unwrap_or_default()
}

/// Convert an expression node into a simplified value
pub fn value_of(node: &tree_sitter::Node, source: &str, scope: &FileScope) -> PhpValue {
    let text = get_text(node, source).unwrap_or_default();
    match node.kind() {
        "string" | "encapsed_string" | "heredoc" | "nowdoc" => PhpValue::String(unquote(text)),
        "integer" | "float" => PhpValue::Number(text.to_string()),
        "boolean" => PhpValue::Bool(text.eq_ignore_ascii_case("true")),
        "null" => PhpValue::Null,
        "array_creation_expression" => {
            let items = node
                .named_children(&mut node.walk())
                .filter(|c| c.kind() == "array_element_initializer")
                .filter_map(|element| array_item(&element, source, scope))
                .collect();
            PhpValue::Array(items)
        }
        "class_constant_access_expression" => {
            let parts: Vec<_> = node.named_children(&mut node.walk()).collect();
            match (parts.first(), parts.last()) {
                (Some(scope_node), Some(constant))
                    if parts.len() == 2
                        && get_text(constant, source)
                            .map(|c| c.eq_ignore_ascii_case("class"))
                            .unwrap_or(false) =>
                {
                    let raw = get_text(scope_node, source).unwrap_or_default();
                    PhpValue::ClassRef(scope.resolve(raw))
                }
                _ => PhpValue::Expr(text.to_string()),
            }
        }
        "object_creation_expression" => match instantiated_class(node, source) {
            Some(raw) => PhpValue::New(scope.resolve(raw)),
            None => PhpValue::Expr(text.to_string()),
        },
        "anonymous_function" | "anonymous_function_creation_expression" | "arrow_function" => {
            PhpValue::Closure
        }
        "parenthesized_expression" => match node.named_child(0) {
            Some(inner) => value_of(&inner, source, scope),
            None => PhpValue::Expr(text.to_string()),
        },
        "name" if text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("false") => {
            PhpValue::Bool(text.eq_ignore_ascii_case("true"))
        }
        "name" if text.eq_ignore_ascii_case("null") => PhpValue::Null,
        _ => PhpValue::Expr(text.to_string()),
    }
}

fn array_item(element: &tree_sitter::Node, source: &str, scope: &FileScope) -> Option<ArrayItem> {
    let has_key = element.children(&mut element.walk()).any(|c| c.kind() == "=>");
    let values: Vec<_> = element
        .named_children(&mut element.walk())
        .filter(|c| c.kind() != "by_ref" && c.kind() != "comment")
        .collect();

    if has_key && values.len() >= 2 {
        Some(ArrayItem {
            key: Some(value_of(&values[0], source, scope)),
            value: value_of(&values[values.len() - 1], source, scope),
        })
    } else {
        values.first().map(|v| ArrayItem {
            key: None,
            value: value_of(v, source, scope),
        })
    }
}

fn instantiated_class<'a>(node: &tree_sitter::Node<'a>, source: &'a str) -> Option<&'a str> {
    named_children_of_kinds(node, NAME_KINDS)
        .into_iter()
        .next()
        .and_then(|n| get_text(&n, source))
}

/// Argument values of a call's `arguments` node
pub fn argument_values(
    args: Option<tree_sitter::Node>,
    source: &str,
    scope: &FileScope,
) -> Vec<PhpValue> {
    argument_nodes(args)
        .iter()
        .map(|n| value_of(n, source, scope))
        .collect()
}

/// Expression nodes of a call's `arguments` node
pub fn argument_nodes(args: Option<tree_sitter::Node>) -> Vec<tree_sitter::Node> {
    let Some(args) = args else {
        return Vec::new();
    };
    let mut nodes = Vec::new();
    for child in args.named_children(&mut args.walk()) {
        if child.kind() == "argument" {
            let named_arg = child.child_by_field_name("name").map(|n| n.id());
            let value = child
                .named_children(&mut child.walk())
                .filter(|c| Some(c.id()) != named_arg && c.kind() != "comment")
                .last();
            if let Some(value) = value {
                nodes.push(value);
            }
        } else if child.kind() != "comment" {
            nodes.push(child);
        }
    }
    nodes
}

fn collect_calls(
    node: &tree_sitter::Node,
    source: &str,
    scope: &FileScope,
    calls: &mut Vec<CallSite>,
) {
    for child in node.named_children(&mut node.walk()) {
        if let Some(call) = call_site(&child, source, scope) {
            calls.push(call);
        }
        collect_calls(&child, source, scope, calls);
    }
}

fn call_site(node: &tree_sitter::Node, source: &str, scope: &FileScope) -> Option<CallSite> {
    let args_node = node
        .child_by_field_name("arguments")
        .or_else(|| find_child_by_kind(node, "arguments"));

    let (kind, target, name) = match node.kind() {
        "function_call_expression" => {
            let function = get_field_text(node, "function", source)?;
            (CallKind::Function, None, function.trim_start_matches('\\').to_string())
        }
        "scoped_call_expression" => {
            let class = get_field_text(node, "scope", source)?;
            let name = get_field_text(node, "name", source)?;
            (CallKind::Static, Some(scope.resolve(&class)), name)
        }
        "member_call_expression" | "nullsafe_member_call_expression" => {
            let object = get_field_text(node, "object", source)?;
            let name = get_field_text(node, "name", source)?;
            (CallKind::Method, Some(object), name)
        }
        "object_creation_expression" => {
            let raw = instantiated_class(node, source)?;
            let fqcn = scope.resolve(raw);
            let name = short_name(&fqcn).to_string();
            (CallKind::New, Some(fqcn), name)
        }
        _ => return None,
    };

    Some(CallSite {
        kind,
        target,
        name,
        args: argument_values(args_node, source, scope),
        line: line_of(node),
    })
}

fn collect_returns(
    node: &tree_sitter::Node,
    source: &str,
    scope: &FileScope,
    returns: &mut Vec<PhpValue>,
) {
    for child in node.named_children(&mut node.walk()) {
        match child.kind() {
            "return_statement" => {
                if let Some(value) = child.named_child(0) {
                    returns.push(value_of(&value, source, scope));
                }
            }
            "anonymous_function"
            | "anonymous_function_creation_expression"
            | "arrow_function"
            | "function_definition" => {}
            _ => collect_returns(&child, source, scope, returns),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> FileScope {
        let mut imports = BTreeMap::new();
        imports.insert("Model".to_string(), "Illuminate\\Database\\Eloquent\\Model".to_string());
        imports.insert("Facades".to_string(), "Illuminate\\Support\\Facades".to_string());
        FileScope {
            namespace: Some("App\\Models".into()),
            imports,
            class: Some("App\\Models\\Post".into()),
            parent: Some("Illuminate\\Database\\Eloquent\\Model".into()),
        }
    }

    #[test]
    fn test_resolve_imported_name() {
        assert_eq!(scope().resolve("Model"), "Illuminate\\Database\\Eloquent\\Model");
    }

    #[test]
    fn test_resolve_same_namespace() {
        assert_eq!(scope().resolve("Comment"), "App\\Models\\Comment");
    }

    #[test]
    fn test_resolve_absolute_and_partial() {
        let scope = scope();
        assert_eq!(scope.resolve("\\Carbon\\Carbon"), "Carbon\\Carbon");
        assert_eq!(
            scope.resolve("Facades\\Cache"),
            "Illuminate\\Support\\Facades\\Cache"
        );
    }

    #[test]
    fn test_resolve_self_and_parent() {
        let scope = scope();
        assert_eq!(scope.resolve("self"), "App\\Models\\Post");
        assert_eq!(scope.resolve("static"), "App\\Models\\Post");
        assert_eq!(scope.resolve("parent"), "Illuminate\\Database\\Eloquent\\Model");
    }

    #[test]
    fn test_resolve_type_keeps_primitives() {
        let scope = scope();
        assert_eq!(scope.resolve_type("?string"), "string");
        assert_eq!(scope.resolve_type("int|null"), "int|null");
        assert_eq!(scope.resolve_type("?Comment"), "App\\Models\\Comment");
        assert!(!is_class_type("array"));
        assert!(is_class_type("App\\Models\\Comment"));
    }
}
