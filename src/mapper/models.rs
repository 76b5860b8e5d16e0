//! Component records and scan results.
//!
//! A [`ScanResult`] is what every mapper returns for its kind:
//! `{type, count, data}` on success, `{type, count: 0, error}` on failure.
//! Each entry of `data` is a [`ComponentRecord`] whose `details` carry the
//! kind-specific structure.

use crate::parser::{PhpMethod, PhpParam, Visibility};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

// ============================================================================
// Scan input
// ============================================================================

/// Options recognised by every mapper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Roots to search; empty means the kind's conventional directories
    pub paths: Vec<PathBuf>,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Project root that relative paths are resolved against
    pub root: Option<PathBuf>,
    /// Maximum directory depth below each root
    pub max_depth: Option<usize>,
    /// Also read `vendor/` and `node_modules/`
    pub include_vendors: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            recursive: true,
            root: None,
            max_depth: None,
            include_vendors: false,
        }
    }
}

impl ScanOptions {
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            ..Default::default()
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }
}

// ============================================================================
// Records
// ============================================================================

/// One discovered component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub name: String,
    pub fqcn: String,
    pub kind: String,
    pub file: Option<String>,
    pub description: Option<String>,
    /// Declared dependencies (injected class types, short names)
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub details: ComponentDetails,
}

impl ComponentRecord {
    pub fn relationships(&self) -> &[ModelRelation] {
        match &self.details {
            ComponentDetails::Model(model) => &model.relationships,
            _ => &[],
        }
    }

    pub fn actions(&self) -> &[String] {
        match &self.details {
            ComponentDetails::Controller(controller) => &controller.actions,
            _ => &[],
        }
    }

    /// `Controller@method` for routes bound to a controller action
    pub fn route_action(&self) -> Option<&str> {
        match &self.details {
            ComponentDetails::Route(route) => route.action.as_deref(),
            _ => None,
        }
    }

    pub fn flow(&self) -> Option<&FlowDetails> {
        match &self.details {
            ComponentDetails::Job(d) => Some(&d.flow),
            ComponentDetails::Event(d) => Some(&d.flow),
            ComponentDetails::Service(d) => Some(&d.flow),
            ComponentDetails::Command(d) => Some(&d.flow),
            ComponentDetails::Middleware(d) => Some(&d.flow),
            ComponentDetails::Notification(d) => Some(&d.flow),
            ComponentDetails::Rule(d) => Some(&d.flow),
            ComponentDetails::Controller(d) => Some(&d.flow),
            _ => None,
        }
    }
}

/// Kind-specific structure of a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ComponentDetails {
    Model(ModelDetails),
    Route(RouteDetails),
    Controller(ControllerDetails),
    Job(JobDetails),
    Event(EventDetails),
    Service(ServiceDetails),
    Command(CommandDetails),
    Middleware(ServiceDetails),
    Policy(PolicyDetails),
    Resource(ResourceDetails),
    Notification(NotificationDetails),
    Request(RequestDetails),
    Rule(RuleDetails),
    /// Free-form attributes for mappers registered at runtime
    Generic {
        #[serde(default)]
        attributes: BTreeMap<String, serde_json::Value>,
    },
}

/// A relation method on a model (`$this->hasMany(Comment::class)`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRelation {
    pub name: String,
    pub related: String,
    pub relation_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDetails {
    pub table: Option<String>,
    pub fillable: Vec<String>,
    pub guarded: Vec<String>,
    pub hidden: Vec<String>,
    pub casts: BTreeMap<String, String>,
    pub traits: Vec<String>,
    pub scopes: Vec<String>,
    pub relationships: Vec<ModelRelation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteDetails {
    pub uri: String,
    pub methods: Vec<String>,
    pub action: Option<String>,
    pub controller: Option<String>,
    pub route_name: Option<String>,
    pub middleware: Vec<String>,
    pub prefix: Option<String>,
    pub view: Option<String>,
    pub redirect: Option<String>,
    pub line: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerDetails {
    pub actions: Vec<String>,
    pub middleware: Vec<String>,
    pub flow: FlowDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobDetails {
    pub queue: Option<String>,
    pub tries: Option<String>,
    pub timeout: Option<String>,
    pub should_queue: bool,
    pub methods: Vec<MethodSummary>,
    pub flow: FlowDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDetails {
    pub properties: Vec<String>,
    pub broadcasts: bool,
    pub methods: Vec<MethodSummary>,
    pub flow: FlowDetails,
}

/// Shared by services and middleware
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDetails {
    pub methods: Vec<MethodSummary>,
    pub flow: FlowDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandDetails {
    pub signature: Option<String>,
    pub description: Option<String>,
    pub methods: Vec<MethodSummary>,
    pub flow: FlowDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyDetails {
    pub abilities: Vec<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceDetails {
    pub is_collection: bool,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationDetails {
    pub channels: Vec<String>,
    pub methods: Vec<MethodSummary>,
    pub flow: FlowDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestDetails {
    pub rules: BTreeMap<String, String>,
    pub authorizes: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleDetails {
    pub message: Option<String>,
    pub methods: Vec<MethodSummary>,
    pub flow: FlowDetails,
}

/// What a component's methods reach out to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowDetails {
    pub jobs: Vec<String>,
    pub events: Vec<String>,
    pub notifications: Vec<String>,
    pub models: Vec<String>,
    pub services: Vec<String>,
    pub facades: Vec<String>,
    pub classes: Vec<String>,
}

impl FlowDetails {
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
            && self.events.is_empty()
            && self.notifications.is_empty()
            && self.models.is_empty()
            && self.services.is_empty()
            && self.facades.is_empty()
            && self.classes.is_empty()
    }

    /// `(category, names)` pairs in a fixed order
    pub fn categories(&self) -> [(&'static str, &[String]); 7] {
        [
            ("jobs", &self.jobs),
            ("events", &self.events),
            ("notifications", &self.notifications),
            ("models", &self.models),
            ("services", &self.services),
            ("facades", &self.facades),
            ("classes", &self.classes),
        ]
    }
}

/// Public-facing summary of a method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSummary {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub parameters: Vec<String>,
    pub return_type: Option<String>,
    pub complexity: u32,
}

impl From<&PhpMethod> for MethodSummary {
    fn from(method: &PhpMethod) -> Self {
        Self {
            name: method.name.clone(),
            visibility: method.visibility,
            is_static: method.is_static,
            parameters: method.params.iter().map(describe_param).collect(),
            return_type: method.return_type.clone(),
            complexity: method.complexity,
        }
    }
}

fn describe_param(param: &PhpParam) -> String {
    match &param.type_name {
        Some(t) => format!("{} ${}", crate::parser::short_name(t), param.name),
        None => format!("${}", param.name),
    }
}

// ============================================================================
// Scan output
// ============================================================================

/// Result of scanning one kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    #[serde(rename = "type")]
    kind: String,
    count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<BTreeMap<String, ComponentRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ScanResult {
    /// Successful scan; `count` always equals the number of records
    pub fn new(kind: impl Into<String>, data: BTreeMap<String, ComponentRecord>) -> Self {
        Self {
            kind: kind.into(),
            count: data.len(),
            data: Some(data),
            error: None,
        }
    }

    /// Failed scan; the error replaces the data
    pub fn failed(kind: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            count: 0,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Records keyed by name; empty for failed scans
    pub fn data(&self) -> &BTreeMap<String, ComponentRecord> {
        static EMPTY: BTreeMap<String, ComponentRecord> = BTreeMap::new();
        self.data.as_ref().unwrap_or(&EMPTY)
    }

    pub fn records(&self) -> impl Iterator<Item = &ComponentRecord> {
        self.data().values()
    }

    /// Whether any record carries flow data (jobs/events/... it reaches)
    pub fn has_flow_data(&self) -> bool {
        self.records()
            .any(|r| r.flow().map(|f| !f.is_empty()).unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> ComponentRecord {
        ComponentRecord {
            name: name.to_string(),
            fqcn: format!("App\\Services\\{}", name),
            kind: "services".to_string(),
            file: None,
            description: None,
            dependencies: vec![],
            details: ComponentDetails::Service(ServiceDetails::default()),
        }
    }

    #[test]
    fn test_scan_result_count_matches_data() {
        let mut data = BTreeMap::new();
        data.insert("A".to_string(), record("A"));
        data.insert("B".to_string(), record("B"));
        let result = ScanResult::new("services", data);
        assert_eq!(result.count(), 2);
        assert_eq!(result.data().len(), 2);
        assert!(!result.is_error());
    }

    #[test]
    fn test_failed_scan_has_no_data() {
        let result = ScanResult::failed("models", "permission denied");
        assert_eq!(result.count(), 0);
        assert!(result.data().is_empty());
        assert_eq!(result.error(), Some("permission denied"));

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("data").is_none());
        assert_eq!(json["type"], "models");
    }

    #[test]
    fn test_has_flow_data() {
        let mut data = BTreeMap::new();
        data.insert("A".to_string(), record("A"));
        assert!(!ScanResult::new("services", data.clone()).has_flow_data());

        let mut with_flow = record("B");
        if let ComponentDetails::Service(ref mut details) = with_flow.details {
            details.flow.jobs.push("SendDigest".into());
        }
        data.insert("B".to_string(), with_flow);
        assert!(ScanResult::new("services", data).has_flow_data());
    }

    #[test]
    fn test_record_details_tagged() {
        let json = serde_json::to_value(record("A")).unwrap();
        assert_eq!(json["details"]["shape"], "service");
        let back: ComponentRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record("A"));
    }
}
