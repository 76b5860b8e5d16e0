//! Test helper factories and stub mappers
//!
//! Provides records with sensible defaults and in-memory mappers that return
//! canned results, so manager and analysis logic can be tested without PHP
//! fixtures.
#![allow(dead_code)]

use crate::error::{AtlasError, Result};
use crate::mapper::models::*;
use crate::mapper::Mapper;
use std::collections::BTreeMap;
use std::path::PathBuf;

// ============================================================================
// Record factories
// ============================================================================

pub fn model_record(name: &str, relations: &[(&str, &str, &str)]) -> ComponentRecord {
    ComponentRecord {
        name: name.to_string(),
        fqcn: format!("App\\Models\\{}", name),
        kind: "models".to_string(),
        file: None,
        description: None,
        dependencies: vec![],
        details: ComponentDetails::Model(ModelDetails {
            relationships: relations
                .iter()
                .map(|(method, related, relation_type)| ModelRelation {
                    name: method.to_string(),
                    related: related.to_string(),
                    relation_type: relation_type.to_string(),
                })
                .collect(),
            ..Default::default()
        }),
    }
}

pub fn controller_record(name: &str, actions: &[&str], dependencies: &[&str]) -> ComponentRecord {
    ComponentRecord {
        name: name.to_string(),
        fqcn: format!("App\\Http\\Controllers\\{}", name),
        kind: "controllers".to_string(),
        file: None,
        description: None,
        dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
        details: ComponentDetails::Controller(ControllerDetails {
            actions: actions.iter().map(|a| a.to_string()).collect(),
            ..Default::default()
        }),
    }
}

pub fn route_record(name: &str, action: Option<&str>) -> ComponentRecord {
    ComponentRecord {
        name: name.to_string(),
        fqcn: name.to_string(),
        kind: "routes".to_string(),
        file: None,
        description: None,
        dependencies: vec![],
        details: ComponentDetails::Route(RouteDetails {
            uri: format!("/{}", name.replace('.', "/")),
            methods: vec!["GET".to_string()],
            action: action.map(String::from),
            route_name: Some(name.to_string()),
            ..Default::default()
        }),
    }
}

pub fn service_record(name: &str, jobs: &[&str]) -> ComponentRecord {
    ComponentRecord {
        name: name.to_string(),
        fqcn: format!("App\\Services\\{}", name),
        kind: "services".to_string(),
        file: None,
        description: None,
        dependencies: vec![],
        details: ComponentDetails::Service(ServiceDetails {
            flow: FlowDetails {
                jobs: jobs.iter().map(|j| j.to_string()).collect(),
                ..Default::default()
            },
            ..Default::default()
        }),
    }
}

pub fn records(items: Vec<ComponentRecord>) -> BTreeMap<String, ComponentRecord> {
    items.into_iter().map(|r| (r.name.clone(), r)).collect()
}

// ============================================================================
// Stub mappers
// ============================================================================

/// Returns `count` generic records named `<kind>-<n>`
pub struct StubMapper {
    kind: String,
    data: BTreeMap<String, ComponentRecord>,
}

impl StubMapper {
    pub fn new(kind: &str, count: usize) -> Self {
        let data = (0..count)
            .map(|i| {
                let name = format!("{}-{}", kind, i);
                let record = ComponentRecord {
                    name: name.clone(),
                    fqcn: name.clone(),
                    kind: kind.to_string(),
                    file: None,
                    description: None,
                    dependencies: vec![],
                    details: ComponentDetails::Generic {
                        attributes: BTreeMap::new(),
                    },
                };
                (name, record)
            })
            .collect();
        Self {
            kind: kind.to_string(),
            data,
        }
    }

    pub fn with_records(kind: &str, records: Vec<ComponentRecord>) -> Self {
        Self {
            kind: kind.to_string(),
            data: self::records(records),
        }
    }
}

impl Mapper for StubMapper {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn default_paths(&self) -> Vec<PathBuf> {
        vec![]
    }

    fn scan(&self, _options: &ScanOptions) -> Result<ScanResult> {
        Ok(ScanResult::new(self.kind.clone(), self.data.clone()))
    }
}

/// Always fails with a `ScanFailure`
pub struct FailingMapper {
    pub kind: String,
    pub message: String,
}

impl FailingMapper {
    pub fn new(kind: &str, message: &str) -> Self {
        Self {
            kind: kind.to_string(),
            message: message.to_string(),
        }
    }
}

impl Mapper for FailingMapper {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn default_paths(&self) -> Vec<PathBuf> {
        vec![]
    }

    fn scan(&self, _options: &ScanOptions) -> Result<ScanResult> {
        Err(AtlasError::scan(&self.kind, &self.message))
    }
}
