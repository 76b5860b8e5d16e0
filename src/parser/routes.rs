//! Route definition extractor
//!
//! Reads `Route::` facade call chains from top-level statements:
//! - HTTP verb registrations (`get`, `post`, ..., `match`, `any`)
//! - `resource` / `apiResource` expansion with `only` / `except`
//! - `view`, `redirect` and `fallback` routes
//! - `group` closures carrying `prefix`, `middleware`, `name` and `controller`

use super::helpers::*;
use super::models::*;
use super::php::{argument_nodes, value_of, FileScope};

const VERBS: &[&str] = &["get", "post", "put", "patch", "delete", "options"];

/// Chain links that register routes rather than configure them
const REGISTRARS: &[&str] = &[
    "any",
    "match",
    "resource",
    "apiresource",
    "view",
    "redirect",
    "permanentredirect",
    "fallback",
];

fn is_registrar(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    VERBS.contains(&name.as_str()) || REGISTRARS.contains(&name.as_str())
}

/// Attributes inherited from enclosing route groups
#[derive(Debug, Clone, Default)]
pub struct GroupContext {
    pub prefix: String,
    pub middleware: Vec<String>,
    pub name_prefix: String,
    pub controller: Option<String>,
}

struct Link<'a> {
    name: String,
    args: Vec<tree_sitter::Node<'a>>,
    line: u32,
}

/// Extract routes from one `expression_statement`
pub fn extract_statement(
    statement: &tree_sitter::Node,
    source: &str,
    scope: &FileScope,
    group: &GroupContext,
    parsed: &mut ParsedFile,
) {
    let Some(expr) = statement.named_child(0) else {
        return;
    };
    let Some(links) = call_chain(&expr, source) else {
        return;
    };
    extract_chain(&links, source, scope, group, parsed);
}

fn call_chain<'a>(node: &tree_sitter::Node<'a>, source: &str) -> Option<Vec<Link<'a>>> {
    match node.kind() {
        "member_call_expression" => {
            let object = node.child_by_field_name("object")?;
            let mut links = call_chain(&object, source)?;
            links.push(Link {
                name: get_field_text(node, "name", source)?,
                args: argument_nodes(node.child_by_field_name("arguments")),
                line: line_of(node),
            });
            Some(links)
        }
        "scoped_call_expression" => {
            let facade = get_field_text(node, "scope", source)?;
            if short_name(facade.trim_start_matches('\\')) != "Route" {
                return None;
            }
            Some(vec![Link {
                name: get_field_text(node, "name", source)?,
                args: argument_nodes(node.child_by_field_name("arguments")),
                line: line_of(node),
            }])
        }
        _ => None,
    }
}

fn extract_chain(
    links: &[Link],
    source: &str,
    scope: &FileScope,
    outer: &GroupContext,
    parsed: &mut ParsedFile,
) {
    if let Some(pos) = links.iter().position(|l| l.name == "group") {
        extract_group(links, pos, source, scope, outer, parsed);
        return;
    }

    // `Route::middleware('auth')->prefix('admin')->get(...)`: attributes
    // before the registrar apply to this route only
    let Some(pos) = links.iter().position(|l| is_registrar(&l.name)) else {
        return;
    };
    let mut ctx = outer.clone();
    for link in &links[..pos] {
        if let Some(arg) = link.args.first() {
            apply_group_attribute(&mut ctx, &link.name, &value_of(arg, source, scope));
        }
    }
    let group = &ctx;

    let root = &links[pos];
    let modifiers = &links[pos + 1..];
    let verb = root.name.to_ascii_lowercase();

    let mut routes: Vec<RouteDefinition> = match verb.as_str() {
        v if VERBS.contains(&v) || v == "any" || v == "match" => {
            let (methods, rest): (Vec<String>, &[tree_sitter::Node]) = if v == "match" {
                let methods = root
                    .args
                    .first()
                    .map(|n| value_of(n, source, scope).string_list())
                    .unwrap_or_default()
                    .into_iter()
                    .map(|m| m.to_ascii_uppercase())
                    .collect();
                (methods, &root.args[root.args.len().min(1)..])
            } else {
                (vec![v.to_ascii_uppercase()], &root.args[..])
            };
            let Some(uri) = rest.first().map(|n| value_of(n, source, scope).display()) else {
                return;
            };
            let mut route = new_route(methods, &uri, group, parsed, root.line);
            if let Some(action) = rest.get(1) {
                apply_action(&mut route, &value_of(action, source, scope), group);
            }
            vec![route]
        }
        "resource" | "apiresource" => resource_routes(root, modifiers, source, scope, group, parsed),
        "view" => {
            let args: Vec<PhpValue> = root.args.iter().map(|n| value_of(n, source, scope)).collect();
            let Some(uri) = args.first().map(|v| v.display()) else {
                return;
            };
            let mut route = new_route(vec!["GET".into()], &uri, group, parsed, root.line);
            route.view = args.get(1).map(|v| v.display());
            vec![route]
        }
        "redirect" | "permanentredirect" => {
            let args: Vec<PhpValue> = root.args.iter().map(|n| value_of(n, source, scope)).collect();
            let Some(uri) = args.first().map(|v| v.display()) else {
                return;
            };
            let mut route = new_route(vec!["ANY".into()], &uri, group, parsed, root.line);
            route.redirect = args.get(1).map(|v| v.display());
            vec![route]
        }
        "fallback" => {
            let mut route = new_route(vec!["GET".into()], "{fallback}", group, parsed, root.line);
            if let Some(action) = root.args.first() {
                apply_action(&mut route, &value_of(action, source, scope), group);
            }
            vec![route]
        }
        _ => return,
    };

    for link in modifiers {
        let arg = link.args.first().map(|n| value_of(n, source, scope));
        match link.name.as_str() {
            "name" => {
                if let Some(name) = arg.as_ref().and_then(|a| a.as_str()) {
                    for route in routes.iter_mut() {
                        route.name = Some(format!("{}{}", group.name_prefix, name));
                    }
                }
            }
            "middleware" => {
                if let Some(arg) = arg {
                    let extra = arg.string_list();
                    for route in routes.iter_mut() {
                        route.middleware.extend(extra.iter().cloned());
                    }
                }
            }
            _ => {}
        }
    }

    parsed.routes.extend(routes);
}

fn extract_group(
    links: &[Link],
    group_pos: usize,
    source: &str,
    scope: &FileScope,
    outer: &GroupContext,
    parsed: &mut ParsedFile,
) {
    let mut ctx = outer.clone();
    let group_link = &links[group_pos];

    // `Route::group(['prefix' => ...], function () { ... })`
    if group_pos == 0 && group_link.args.len() > 1 {
        let attributes = value_of(&group_link.args[0], source, scope);
        if let Some(items) = attributes.as_array() {
            for item in items {
                if let Some(key) = item.key.as_ref().and_then(|k| k.as_str()) {
                    apply_group_attribute(&mut ctx, key, &item.value);
                }
            }
        }
    }

    for (i, link) in links.iter().enumerate() {
        if i == group_pos {
            continue;
        }
        if let Some(arg) = link.args.first() {
            apply_group_attribute(&mut ctx, &link.name, &value_of(arg, source, scope));
        }
    }

    let Some(closure) = group_link.args.last() else {
        return;
    };
    let body = closure
        .child_by_field_name("body")
        .or_else(|| find_child_by_kind(closure, "compound_statement"));
    if let Some(body) = body {
        extract_group_body(&body, source, scope, &ctx, parsed);
    }
}

fn extract_group_body(
    body: &tree_sitter::Node,
    source: &str,
    scope: &FileScope,
    ctx: &GroupContext,
    parsed: &mut ParsedFile,
) {
    for statement in body.named_children(&mut body.walk()) {
        match statement.kind() {
            "expression_statement" => extract_statement(&statement, source, scope, ctx, parsed),
            "compound_statement" => extract_group_body(&statement, source, scope, ctx, parsed),
            _ => {}
        }
    }
}

fn apply_group_attribute(ctx: &mut GroupContext, key: &str, value: &PhpValue) {
    match key {
        "prefix" => {
            if let Some(prefix) = value.as_str() {
                ctx.prefix = join_uri(&ctx.prefix, prefix);
            }
        }
        "middleware" => ctx.middleware.extend(value.string_list()),
        "name" | "as" => {
            if let Some(name) = value.as_str() {
                ctx.name_prefix.push_str(name);
            }
        }
        "controller" => {
            if let Some(controller) = value.as_class_ref() {
                ctx.controller = Some(controller.to_string());
            }
        }
        _ => {}
    }
}

fn resource_routes(
    root: &Link,
    modifiers: &[Link],
    source: &str,
    scope: &FileScope,
    group: &GroupContext,
    parsed: &ParsedFile,
) -> Vec<RouteDefinition> {
    let args: Vec<PhpValue> = root.args.iter().map(|n| value_of(n, source, scope)).collect();
    let Some(resource) = args.first().and_then(|a| a.as_str()).map(|s| s.to_string()) else {
        return Vec::new();
    };
    let controller = args
        .get(1)
        .and_then(|a| a.as_class_ref().map(|s| s.to_string()).or_else(|| a.as_str().map(|s| s.to_string())));

    let api_only = root.name.eq_ignore_ascii_case("apiResource");
    let mut actions: Vec<&str> = if api_only {
        vec!["index", "store", "show", "update", "destroy"]
    } else {
        vec!["index", "create", "store", "show", "edit", "update", "destroy"]
    };

    for link in modifiers {
        let Some(arg) = link.args.first() else {
            continue;
        };
        let listed = value_of(arg, source, scope).string_list();
        match link.name.as_str() {
            "only" => actions.retain(|a| listed.iter().any(|l| l == a)),
            "except" => actions.retain(|a| !listed.iter().any(|l| l == a)),
            _ => {}
        }
    }

    let base = resource.replace('.', "/");
    let param = singular(resource.rsplit('.').next().unwrap_or(&resource));

    actions
        .into_iter()
        .map(|action| {
            let (methods, uri): (Vec<&str>, String) = match action {
                "index" => (vec!["GET"], base.clone()),
                "create" => (vec!["GET"], format!("{}/create", base)),
                "store" => (vec!["POST"], base.clone()),
                "show" => (vec!["GET"], format!("{}/{{{}}}", base, param)),
                "edit" => (vec!["GET"], format!("{}/{{{}}}/edit", base, param)),
                "update" => (vec!["PUT", "PATCH"], format!("{}/{{{}}}", base, param)),
                _ => (vec!["DELETE"], format!("{}/{{{}}}", base, param)),
            };
            let mut route = new_route(
                methods.into_iter().map(String::from).collect(),
                &uri,
                group,
                parsed,
                root.line,
            );
            route.controller = controller.clone();
            route.controller_method = Some(action.to_string());
            route.name = Some(format!("{}{}.{}", group.name_prefix, resource, action));
            route
        })
        .collect()
}

fn new_route(
    methods: Vec<String>,
    uri: &str,
    group: &GroupContext,
    parsed: &ParsedFile,
    line: u32,
) -> RouteDefinition {
    RouteDefinition {
        methods,
        uri: join_uri(&group.prefix, uri),
        controller: None,
        controller_method: None,
        closure: false,
        view: None,
        redirect: None,
        name: None,
        middleware: group.middleware.clone(),
        prefix: if group.prefix.is_empty() {
            None
        } else {
            Some(group.prefix.clone())
        },
        file_path: parsed.path.clone(),
        line,
    }
}

fn apply_action(route: &mut RouteDefinition, action: &PhpValue, group: &GroupContext) {
    match action {
        // [PostController::class, 'index']
        PhpValue::Array(items) => {
            route.controller = items.first().and_then(|i| i.value.as_class_ref()).map(String::from);
            route.controller_method = items.get(1).and_then(|i| i.value.as_str()).map(String::from);
        }
        // PostController::class (invokable)
        PhpValue::ClassRef(class) => {
            route.controller = Some(class.clone());
            route.controller_method = Some("__invoke".to_string());
        }
        // 'PostController@index', or 'index' inside a controller group
        PhpValue::String(text) => match text.split_once('@') {
            Some((class, method)) => {
                route.controller = Some(class.trim_start_matches('\\').to_string());
                route.controller_method = Some(method.to_string());
            }
            None => {
                if let Some(controller) = &group.controller {
                    route.controller = Some(controller.clone());
                    route.controller_method = Some(text.clone());
                }
            }
        },
        PhpValue::Closure => route.closure = true,
        _ => {}
    }
}

/// Join URI segments into a normalized `/a/b` path
pub fn join_uri(prefix: &str, uri: &str) -> String {
    let joined: Vec<&str> = prefix
        .split('/')
        .chain(uri.split('/'))
        .filter(|s| !s.is_empty())
        .collect();
    format!("/{}", joined.join("/"))
}

fn singular(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        format!("{}y", stem)
    } else if let Some(stem) = word.strip_suffix('s') {
        stem.to_string()
    } else {
        word.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_uri() {
        assert_eq!(join_uri("", "/"), "/");
        assert_eq!(join_uri("", "posts"), "/posts");
        assert_eq!(join_uri("admin", "/posts/{post}"), "/admin/posts/{post}");
        assert_eq!(join_uri("/api/", "v1/"), "/api/v1");
    }

    fn parse_routes(content: &str) -> Vec<RouteDefinition> {
        let mut parser = crate::parser::PhpParser::new().unwrap();
        parser
            .parse_file(std::path::Path::new("routes/web.php"), content)
            .unwrap()
            .routes
    }

    #[test]
    fn test_attributes_before_the_verb() {
        let routes = parse_routes(
            r#"<?php
use App\Http\Controllers\DashboardController;
use App\Http\Controllers\PhotoController;
use App\Http\Controllers\SearchController;
use App\Http\Controllers\StatsController;
use Illuminate\Support\Facades\Route;

Route::middleware('auth')->get('/dashboard', [DashboardController::class, 'index'])->name('dashboard');
Route::prefix('admin')->name('admin.')->get('/stats', [StatsController::class, 'show'])->name('stats');
Route::middleware(['auth', 'verified'])->apiResource('photos', PhotoController::class)->except(['destroy']);
Route::match(['get', 'post'], '/search', [SearchController::class, 'run'])->name('search');
Route::redirect('/home', '/dashboard');
Route::get('/outside', [SearchController::class, 'outside']);
"#,
        );
        assert_eq!(routes.len(), 9);
        let named = |name: &str| {
            routes
                .iter()
                .find(|r| r.name.as_deref() == Some(name))
                .unwrap_or_else(|| panic!("route {} not found", name))
        };

        let dashboard = named("dashboard");
        assert_eq!(dashboard.uri, "/dashboard");
        assert_eq!(dashboard.middleware, vec!["auth"]);
        assert_eq!(dashboard.controller_method.as_deref(), Some("index"));

        let stats = named("admin.stats");
        assert_eq!(stats.uri, "/admin/stats");
        assert_eq!(stats.prefix.as_deref(), Some("/admin"));

        let photos: Vec<&str> = routes
            .iter()
            .filter_map(|r| r.name.as_deref())
            .filter(|n| n.starts_with("photos."))
            .collect();
        assert_eq!(photos, vec!["photos.index", "photos.store", "photos.show", "photos.update"]);
        assert_eq!(named("photos.show").middleware, vec!["auth", "verified"]);

        assert_eq!(named("search").methods, vec!["GET", "POST"]);

        let redirect = routes.iter().find(|r| r.uri == "/home").unwrap();
        assert_eq!(redirect.methods, vec!["ANY"]);
        assert_eq!(redirect.redirect.as_deref(), Some("/dashboard"));

        // attributes of one chain do not leak into the next statement
        let outside = routes.iter().find(|r| r.uri == "/outside").unwrap();
        assert!(outside.middleware.is_empty());
        assert!(outside.prefix.is_none());
    }

    #[test]
    fn test_singular() {
        assert_eq!(singular("posts"), "post");
        assert_eq!(singular("categories"), "category");
        assert_eq!(singular("news"), "new");
        assert_eq!(singular("staff"), "staff");
    }
}
