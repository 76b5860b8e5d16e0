use super::{method_summaries, public_methods, returned_array};
use crate::mapper::flow::extract_flow;
use crate::mapper::index::ClassIndex;
use crate::mapper::models::{
    ComponentDetails, ControllerDetails, RequestDetails, ResourceDetails, ServiceDetails,
};
use crate::mapper::ClassKind;
use crate::parser::{short_name, CallKind, PhpClass, PhpValue};
use std::path::PathBuf;

/// HTTP controllers
pub struct ControllerKind;

impl ClassKind for ControllerKind {
    fn kind(&self) -> &'static str {
        "controllers"
    }

    fn default_paths(&self) -> Vec<PathBuf> {
        vec![PathBuf::from("app/Http/Controllers")]
    }

    fn qualifies(&self, class: &PhpClass, index: &ClassIndex) -> bool {
        // the application's own base controller is not a component
        if class.name == "Controller" {
            return false;
        }
        index.extends_any(class, &["Controller"]) || class.in_namespace("App\\Http\\Controllers")
    }

    fn details(&self, class: &PhpClass, index: &ClassIndex) -> ComponentDetails {
        ComponentDetails::Controller(ControllerDetails {
            actions: public_methods(class).map(|m| m.name.clone()).collect(),
            middleware: controller_middleware(class),
            flow: extract_flow(class, index),
        })
    }
}

/// `$this->middleware('auth')` in the constructor, or a static
/// `middleware()` returning a list
fn controller_middleware(class: &PhpClass) -> Vec<String> {
    let mut middleware = Vec::new();

    if let Some(ctor) = class.constructor() {
        for call in &ctor.calls {
            if call.kind == CallKind::Method
                && call.target.as_deref() == Some("$this")
                && call.name == "middleware"
            {
                if let Some(arg) = call.args.first() {
                    middleware.extend(arg.string_list());
                }
            }
        }
    }

    if let Some(method) = class.method("middleware").filter(|m| m.is_static) {
        for value in &method.returns {
            let Some(items) = value.as_array() else {
                continue;
            };
            for item in items {
                match &item.value {
                    PhpValue::String(name) => middleware.push(name.clone()),
                    PhpValue::New(class) => middleware.push(short_name(class).to_string()),
                    _ => {}
                }
            }
        }
    }

    middleware.dedup();
    middleware
}

/// HTTP middleware
pub struct MiddlewareKind;

impl ClassKind for MiddlewareKind {
    fn kind(&self) -> &'static str {
        "middleware"
    }

    fn default_paths(&self) -> Vec<PathBuf> {
        vec![PathBuf::from("app/Http/Middleware")]
    }

    fn qualifies(&self, class: &PhpClass, _index: &ClassIndex) -> bool {
        let handles_next = class
            .method("handle")
            .and_then(|m| m.params.get(1))
            .map(|next| {
                next.name == "next"
                    || next
                        .type_name
                        .as_deref()
                        .map(|t| short_name(t) == "Closure")
                        .unwrap_or(false)
            })
            .unwrap_or(false);
        handles_next || class.in_namespace("App\\Http\\Middleware")
    }

    fn details(&self, class: &PhpClass, index: &ClassIndex) -> ComponentDetails {
        ComponentDetails::Middleware(ServiceDetails {
            methods: method_summaries(class),
            flow: extract_flow(class, index),
        })
    }
}

/// Form requests
pub struct RequestKind;

impl ClassKind for RequestKind {
    fn kind(&self) -> &'static str {
        "requests"
    }

    fn default_paths(&self) -> Vec<PathBuf> {
        vec![PathBuf::from("app/Http/Requests")]
    }

    fn qualifies(&self, class: &PhpClass, index: &ClassIndex) -> bool {
        index.extends_any(class, &["FormRequest"])
    }

    fn details(&self, class: &PhpClass, _index: &ClassIndex) -> ComponentDetails {
        // a missing authorize() lets every request through
        let authorizes = class
            .method("authorize")
            .map(|m| {
                m.returns.is_empty() || m.returns.iter().any(|r| *r != PhpValue::Bool(false))
            })
            .unwrap_or(true);

        ComponentDetails::Request(RequestDetails {
            rules: returned_array(class, "rules")
                .map(|v| v.string_map())
                .unwrap_or_default(),
            authorizes,
        })
    }
}

/// API resources and resource collections
pub struct ResourceKind;

impl ClassKind for ResourceKind {
    fn kind(&self) -> &'static str {
        "resources"
    }

    fn default_paths(&self) -> Vec<PathBuf> {
        vec![PathBuf::from("app/Http/Resources")]
    }

    fn qualifies(&self, class: &PhpClass, index: &ClassIndex) -> bool {
        index.extends_any(class, &["JsonResource", "ResourceCollection"])
    }

    fn details(&self, class: &PhpClass, index: &ClassIndex) -> ComponentDetails {
        let fields = returned_array(class, "toArray")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|i| i.key.as_ref().and_then(|k| k.as_str()))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        ComponentDetails::Resource(ResourceDetails {
            is_collection: index.extends_any(class, &["ResourceCollection"]),
            fields,
        })
    }
}
