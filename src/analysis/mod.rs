//! Cross-kind relationship analysis
//!
//! Loads every registered kind through the manager, then derives:
//! - a per-kind summary (errors kept inline, never propagated)
//! - relationships: model → model from declared relations, controller →
//!   route by action prefix and controller → model by dependency name
//! - a dependency graph keyed by component name
//! - placeholder pattern, metric and recommendation sections

pub mod models;

pub use models::*;

use crate::manager::AtlasManager;
use crate::mapper::{ScanOptions, ScanResult};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Kind-name → scan result for one analysis run
pub type ComponentData = BTreeMap<String, ScanResult>;

pub struct AnalysisEngine<'a> {
    manager: &'a AtlasManager,
}

impl<'a> AnalysisEngine<'a> {
    pub fn new(manager: &'a AtlasManager) -> Self {
        Self { manager }
    }

    /// Analyze every registered kind under `paths` (empty means each
    /// kind's conventional directories)
    pub fn analyze_component_relationships(&self, paths: &[PathBuf]) -> AnalysisReport {
        self.analyze_with(&ScanOptions::with_paths(paths.to_vec()))
    }

    pub fn analyze_with(&self, options: &ScanOptions) -> AnalysisReport {
        let data = self.load(options);
        Self::report(&data)
    }

    /// Scan every kind, converting failures into error records
    pub fn load(&self, options: &ScanOptions) -> ComponentData {
        let mut data = ComponentData::new();
        for kind in self.manager.kinds() {
            let result = match self.manager.scan(&kind, options) {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!("Analysis: scanning {} failed: {}", kind, e);
                    ScanResult::failed(kind.clone(), e.to_string())
                }
            };
            data.insert(kind, result);
        }
        data
    }

    /// Build the report from already-loaded data
    pub fn report(data: &ComponentData) -> AnalysisReport {
        let component_summary = summarize(data);
        let relationships = relate(data);
        let dependency_graph = dependency_graph(data);

        tracing::info!(
            "Analysis complete: {} kinds, {} components, {} relationship entries",
            data.len(),
            dependency_graph.len(),
            relationships.len()
        );

        AnalysisReport {
            component_summary,
            relationships,
            complexity_metrics: ComplexityMetrics {
                total_components: dependency_graph.len(),
                coupling_score: "moderate".to_string(),
            },
            dependency_graph,
            architecture_patterns: ArchitecturePatterns::default(),
            recommendations: Vec::new(),
        }
    }
}

fn summarize(data: &ComponentData) -> BTreeMap<String, KindSummary> {
    data.iter()
        .map(|(kind, result)| {
            let summary = match result.error() {
                Some(error) => KindSummary::failed(error),
                None => {
                    let mut summary = KindSummary {
                        count: result.count(),
                        ..Default::default()
                    };
                    match kind.as_str() {
                        "models" => {
                            summary.with_relationships = Some(
                                result
                                    .records()
                                    .filter(|r| !r.relationships().is_empty())
                                    .count(),
                            )
                        }
                        "controllers" => {
                            summary.total_actions =
                                Some(result.records().map(|r| r.actions().len()).sum())
                        }
                        _ => {}
                    }
                    summary
                }
            };
            (kind.clone(), summary)
        })
        .collect()
}

fn relate(data: &ComponentData) -> BTreeMap<String, RelationshipEntry> {
    let mut relationships = BTreeMap::new();
    let models = data.get("models");
    let routes = data.get("routes");

    if let Some(models) = models {
        for model in models.records() {
            let relates_to = model
                .relationships()
                .iter()
                .map(|r| RelatedComponent {
                    name: r.related.clone(),
                    kind: "model".to_string(),
                    relation: Some(r.relation_type.clone()),
                })
                .collect();
            relationships.insert(
                model.name.clone(),
                RelationshipEntry {
                    kind: "model".to_string(),
                    relates_to,
                },
            );
        }
    }

    let model_names: BTreeSet<&str> = models
        .map(|m| m.records().map(|r| r.name.as_str()).collect())
        .unwrap_or_default();

    if let Some(controllers) = data.get("controllers") {
        for controller in controllers.records() {
            let mut relates_to = Vec::new();

            if let Some(routes) = routes {
                for route in routes.records() {
                    let matches = route
                        .route_action()
                        .map(|action| action.starts_with(controller.name.as_str()))
                        .unwrap_or(false);
                    if matches {
                        relates_to.push(RelatedComponent::new(route.name.clone(), "route"));
                    }
                }
            }

            for dependency in &controller.dependencies {
                if model_names.contains(dependency.as_str()) {
                    relates_to.push(RelatedComponent::new(dependency.clone(), "model"));
                }
            }

            if !relates_to.is_empty() {
                relationships.insert(
                    controller.name.clone(),
                    RelationshipEntry {
                        kind: "controller".to_string(),
                        relates_to,
                    },
                );
            }
        }
    }

    relationships
}

/// One node per component; a name shared by two kinds keeps the kind
/// processed last
fn dependency_graph(data: &ComponentData) -> BTreeMap<String, DependencyGraphNode> {
    let mut graph = BTreeMap::new();
    for (kind, result) in data {
        for record in result.records() {
            let node = DependencyGraphNode {
                component: record.name.clone(),
                kind: kind.clone(),
                dependencies: record.dependencies.clone(),
                dependency_count: record.dependencies.len(),
            };
            if let Some(previous) = graph.insert(record.name.clone(), node) {
                tracing::debug!(
                    "Dependency graph: {} ({}) replaced by {}",
                    record.name,
                    previous.kind,
                    kind
                );
            }
        }
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::{MapperRegistry, ScanResult};
    use crate::test_helpers::*;
    use std::sync::Arc;

    fn manager_with(mappers: Vec<Arc<dyn crate::mapper::Mapper>>) -> AtlasManager {
        let mut registry = MapperRegistry::new();
        for mapper in mappers {
            registry.register(mapper);
        }
        AtlasManager::with_registry(registry, ".")
    }

    #[test]
    fn test_controller_relates_to_routes_and_models() {
        let manager = manager_with(vec![
            Arc::new(StubMapper::with_records(
                "models",
                vec![
                    model_record("PostService", &[]),
                    model_record("Post", &[("comments", "Comment", "hasMany")]),
                ],
            )),
            Arc::new(StubMapper::with_records(
                "controllers",
                vec![
                    controller_record("PostController", &["index"], &["PostService"]),
                    controller_record("HomeController", &["show"], &["Mailer"]),
                ],
            )),
            Arc::new(StubMapper::with_records(
                "routes",
                vec![
                    route_record("posts.index", Some("PostController@index")),
                    route_record("home", Some("HomeController@show")),
                    route_record("about", None),
                ],
            )),
        ]);

        let report = AnalysisEngine::new(&manager).analyze_component_relationships(&[]);

        let entry = &report.relationships["PostController"];
        assert_eq!(entry.kind, "controller");
        assert!(entry
            .relates_to
            .contains(&RelatedComponent::new("posts.index", "route")));
        assert!(entry
            .relates_to
            .contains(&RelatedComponent::new("PostService", "model")));

        // every model gets an entry, related or not
        assert_eq!(report.relationships["PostService"].kind, "model");
        assert!(report.relationships["PostService"].relates_to.is_empty());
        assert_eq!(report.relationships["Post"].relates_to[0].name, "Comment");

        assert_eq!(report.component_summary["models"].with_relationships, Some(1));
        assert_eq!(report.component_summary["controllers"].total_actions, Some(2));
        assert_eq!(report.component_summary["routes"].with_relationships, None);
    }

    #[test]
    fn test_failing_kind_is_contained() {
        let manager = manager_with(vec![
            Arc::new(StubMapper::new("services", 2)),
            Arc::new(FailingMapper::new("jobs", "queue config unreadable")),
        ]);
        let report = AnalysisEngine::new(&manager).analyze_component_relationships(&[]);

        assert_eq!(report.component_summary["services"].count, 2);
        assert!(report.component_summary["services"].error.is_none());

        let jobs = &report.component_summary["jobs"];
        assert_eq!(jobs.count, 0);
        assert!(jobs.error.as_deref().unwrap().contains("queue config unreadable"));

        assert_eq!(report.dependency_graph.len(), 2);
        assert_eq!(report.complexity_metrics.total_components, 2);
    }

    #[test]
    fn test_graph_name_collision_keeps_last_kind() {
        let mut data = ComponentData::new();
        data.insert(
            "models".into(),
            ScanResult::new("models", records(vec![model_record("Post", &[])])),
        );
        let mut resource = model_record("Post", &[]);
        resource.kind = "resources".into();
        resource.dependencies = vec!["Post".into()];
        data.insert("resources".into(), ScanResult::new("resources", records(vec![resource])));

        let report = AnalysisEngine::report(&data);
        assert_eq!(report.dependency_graph.len(), 1);
        assert_eq!(report.dependency_graph["Post"].kind, "resources");
        assert_eq!(report.dependency_graph["Post"].dependency_count, 1);
    }

    #[test]
    fn test_placeholders_and_json_round_trip() {
        let manager = manager_with(vec![Arc::new(StubMapper::new("services", 1))]);
        let report = AnalysisEngine::new(&manager).analyze_component_relationships(&[]);

        assert!(report.architecture_patterns.detected.is_empty());
        assert_eq!(report.architecture_patterns.confidence, "low");
        assert_eq!(report.architecture_patterns.status, "not_detected");
        assert_eq!(report.complexity_metrics.coupling_score, "moderate");
        assert!(report.recommendations.is_empty());

        let json = serde_json::to_string(&report).unwrap();
        let back: AnalysisReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
