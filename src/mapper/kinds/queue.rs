use super::{method_summaries, property_text};
use crate::mapper::flow::extract_flow;
use crate::mapper::index::ClassIndex;
use crate::mapper::models::{ComponentDetails, EventDetails, JobDetails, NotificationDetails};
use crate::mapper::{injected_dependencies, ClassKind};
use crate::parser::{PhpClass, Visibility};
use std::path::PathBuf;

const BROADCAST_INTERFACES: &[&str] = &["ShouldBroadcast", "ShouldBroadcastNow"];

/// Queueable jobs
pub struct JobKind;

impl ClassKind for JobKind {
    fn kind(&self) -> &'static str {
        "jobs"
    }

    fn default_paths(&self) -> Vec<PathBuf> {
        vec![PathBuf::from("app/Jobs")]
    }

    fn qualifies(&self, class: &PhpClass, index: &ClassIndex) -> bool {
        (index.implements_any(class, &["ShouldQueue"])
            && index.uses_any(class, &["Dispatchable", "Queueable"]))
            || class.in_namespace("App\\Jobs")
    }

    fn details(&self, class: &PhpClass, index: &ClassIndex) -> ComponentDetails {
        ComponentDetails::Job(JobDetails {
            queue: property_text(class, "queue"),
            tries: property_text(class, "tries"),
            timeout: property_text(class, "timeout"),
            should_queue: index.implements_any(class, &["ShouldQueue"]),
            methods: method_summaries(class),
            flow: extract_flow(class, index),
        })
    }

    fn dependencies(&self, class: &PhpClass) -> Vec<String> {
        injected_dependencies(class, "handle")
    }
}

/// Domain and broadcast events
pub struct EventKind;

impl ClassKind for EventKind {
    fn kind(&self) -> &'static str {
        "events"
    }

    fn default_paths(&self) -> Vec<PathBuf> {
        vec![PathBuf::from("app/Events")]
    }

    fn qualifies(&self, class: &PhpClass, index: &ClassIndex) -> bool {
        class.in_namespace("App\\Events")
            || index.implements_any(class, BROADCAST_INTERFACES)
            || (index.uses_any(class, &["Dispatchable"])
                && !index.uses_any(class, &["Queueable"])
                && !class.in_namespace("App\\Jobs"))
    }

    fn details(&self, class: &PhpClass, index: &ClassIndex) -> ComponentDetails {
        ComponentDetails::Event(EventDetails {
            properties: class
                .properties
                .iter()
                .filter(|p| p.visibility == Visibility::Public && !p.is_static)
                .map(|p| p.name.clone())
                .collect(),
            broadcasts: index.implements_any(class, BROADCAST_INTERFACES),
            methods: method_summaries(class),
            flow: extract_flow(class, index),
        })
    }
}

/// Notifications
pub struct NotificationKind;

impl ClassKind for NotificationKind {
    fn kind(&self) -> &'static str {
        "notifications"
    }

    fn default_paths(&self) -> Vec<PathBuf> {
        vec![PathBuf::from("app/Notifications")]
    }

    fn qualifies(&self, class: &PhpClass, index: &ClassIndex) -> bool {
        index.extends_any(class, &["Notification"])
    }

    fn details(&self, class: &PhpClass, index: &ClassIndex) -> ComponentDetails {
        let mut channels: Vec<String> = class
            .method("via")
            .map(|m| m.returns.iter().flat_map(|v| v.string_list()).collect())
            .unwrap_or_default();
        channels.dedup();

        ComponentDetails::Notification(NotificationDetails {
            channels,
            methods: method_summaries(class),
            flow: extract_flow(class, index),
        })
    }
}
