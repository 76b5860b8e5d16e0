//! Built-in mappers, one per component kind

mod app;
mod http;
mod models;
mod queue;
mod routes;

pub use app::{CommandKind, PolicyKind, RuleKind, ServiceKind};
pub use http::{ControllerKind, MiddlewareKind, RequestKind, ResourceKind};
pub use models::ModelKind;
pub use queue::{EventKind, JobKind, NotificationKind};
pub use routes::RouteMapper;

use super::models::MethodSummary;
use super::{ClassMapper, Mapper};
use crate::parser::{short_name, PhpClass, PhpMethod, Visibility};
use std::sync::Arc;

/// Every built-in mapper
pub fn default_mappers() -> Vec<Arc<dyn Mapper>> {
    vec![
        Arc::new(ClassMapper(ModelKind)),
        Arc::new(RouteMapper),
        Arc::new(ClassMapper(JobKind)),
        Arc::new(ClassMapper(ServiceKind)),
        Arc::new(ClassMapper(ControllerKind)),
        Arc::new(ClassMapper(EventKind)),
        Arc::new(ClassMapper(CommandKind)),
        Arc::new(ClassMapper(MiddlewareKind)),
        Arc::new(ClassMapper(PolicyKind)),
        Arc::new(ClassMapper(ResourceKind)),
        Arc::new(ClassMapper(NotificationKind)),
        Arc::new(ClassMapper(RequestKind)),
        Arc::new(ClassMapper(RuleKind)),
    ]
}

/// Public, non-static, non-magic methods
pub(crate) fn public_methods(class: &PhpClass) -> impl Iterator<Item = &PhpMethod> {
    class
        .methods
        .iter()
        .filter(|m| m.visibility == Visibility::Public && !m.is_static && !m.name.starts_with("__"))
}

pub(crate) fn method_summaries(class: &PhpClass) -> Vec<MethodSummary> {
    public_methods(class).map(MethodSummary::from).collect()
}

pub(crate) fn trait_names(class: &PhpClass) -> Vec<String> {
    class.traits.iter().map(|t| short_name(t).to_string()).collect()
}

/// First array literal returned by a method
pub(crate) fn returned_array<'a>(
    class: &'a PhpClass,
    method: &str,
) -> Option<&'a crate::parser::PhpValue> {
    class
        .method(method)?
        .returns
        .iter()
        .find(|v| v.as_array().is_some())
}

/// Property default rendered as text (`$queue = 'emails'` → `emails`)
pub(crate) fn property_text(class: &PhpClass, name: &str) -> Option<String> {
    class.property_value(name).map(|v| v.display())
}
