use super::{method_summaries, public_methods};
use crate::mapper::flow::extract_flow;
use crate::mapper::index::ClassIndex;
use crate::mapper::models::{
    CommandDetails, ComponentDetails, PolicyDetails, RuleDetails, ServiceDetails,
};
use crate::mapper::{injected_dependencies, ClassKind};
use crate::parser::PhpClass;
use std::path::PathBuf;

const RULE_INTERFACES: &[&str] = &[
    "Rule",
    "ValidationRule",
    "InvokableRule",
    "DataAwareRule",
    "ImplicitRule",
];

/// Application services
pub struct ServiceKind;

impl ClassKind for ServiceKind {
    fn kind(&self) -> &'static str {
        "services"
    }

    fn default_paths(&self) -> Vec<PathBuf> {
        vec![PathBuf::from("app/Services")]
    }

    fn qualifies(&self, class: &PhpClass, _index: &ClassIndex) -> bool {
        class.in_namespace("App\\Services") || class.name.ends_with("Service")
    }

    fn details(&self, class: &PhpClass, index: &ClassIndex) -> ComponentDetails {
        ComponentDetails::Service(ServiceDetails {
            methods: method_summaries(class),
            flow: extract_flow(class, index),
        })
    }
}

/// Artisan console commands
pub struct CommandKind;

impl ClassKind for CommandKind {
    fn kind(&self) -> &'static str {
        "commands"
    }

    fn default_paths(&self) -> Vec<PathBuf> {
        vec![PathBuf::from("app/Console/Commands")]
    }

    fn qualifies(&self, class: &PhpClass, index: &ClassIndex) -> bool {
        index.extends_any(class, &["Command"])
    }

    fn details(&self, class: &PhpClass, index: &ClassIndex) -> ComponentDetails {
        let text = |name: &str| {
            class
                .property_value(name)
                .and_then(|v| v.as_str())
                .map(|s| s.trim().to_string())
        };
        ComponentDetails::Command(CommandDetails {
            signature: text("signature"),
            description: text("description"),
            methods: method_summaries(class),
            flow: extract_flow(class, index),
        })
    }

    fn dependencies(&self, class: &PhpClass) -> Vec<String> {
        injected_dependencies(class, "handle")
    }
}

/// Authorization policies
pub struct PolicyKind;

impl ClassKind for PolicyKind {
    fn kind(&self) -> &'static str {
        "policies"
    }

    fn default_paths(&self) -> Vec<PathBuf> {
        vec![PathBuf::from("app/Policies")]
    }

    fn qualifies(&self, class: &PhpClass, index: &ClassIndex) -> bool {
        index.uses_any(class, &["HandlesAuthorization"]) || class.in_namespace("App\\Policies")
    }

    fn details(&self, class: &PhpClass, _index: &ClassIndex) -> ComponentDetails {
        ComponentDetails::Policy(PolicyDetails {
            abilities: public_methods(class)
                .filter(|m| m.name != "before")
                .map(|m| m.name.clone())
                .collect(),
            model: class
                .name
                .strip_suffix("Policy")
                .filter(|m| !m.is_empty())
                .map(String::from),
        })
    }
}

/// Custom validation rules
pub struct RuleKind;

impl ClassKind for RuleKind {
    fn kind(&self) -> &'static str {
        "rules"
    }

    fn default_paths(&self) -> Vec<PathBuf> {
        vec![PathBuf::from("app/Rules")]
    }

    fn qualifies(&self, class: &PhpClass, index: &ClassIndex) -> bool {
        index.implements_any(class, RULE_INTERFACES)
    }

    fn details(&self, class: &PhpClass, index: &ClassIndex) -> ComponentDetails {
        ComponentDetails::Rule(RuleDetails {
            message: class
                .method("message")
                .and_then(|m| m.returns.iter().find_map(|v| v.as_str()))
                .map(String::from),
            methods: method_summaries(class),
            flow: extract_flow(class, index),
        })
    }
}
