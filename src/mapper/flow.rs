//! Flow extraction: which jobs, events, notifications, models, services,
//! facades and other classes a component's methods reach.

use super::index::ClassIndex;
use super::kinds::ServiceKind;
use super::models::FlowDetails;
use super::ClassKind;
use crate::parser::{short_name, CallKind, PhpClass, PhpMethod, PhpValue};
use std::collections::BTreeMap;

const FACADES: &[&str] = &[
    "App", "Artisan", "Auth", "Blade", "Broadcast", "Bus", "Cache", "Config", "Cookie", "Crypt",
    "DB", "Event", "File", "Gate", "Hash", "Http", "Lang", "Log", "Mail", "Notification",
    "Password", "Queue", "RateLimiter", "Redirect", "Redis", "Request", "Response", "Route",
    "Schema", "Session", "Storage", "URL", "Validator", "View",
];

const DISPATCH_METHODS: &[&str] = &[
    "dispatch",
    "dispatchSync",
    "dispatchNow",
    "dispatchIf",
    "dispatchUnless",
    "dispatchAfterResponse",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Job,
    Event,
    Notification,
    Model,
    Service,
    Facade,
    Class,
}

fn namespace_of(fqcn: &str) -> Option<&str> {
    fqcn.rsplit_once('\\').map(|(ns, _)| ns)
}

/// `*Service` names, indexed classes the services mapper accepts, and
/// `Services` classes imported from another namespace. A bare name that only
/// resolves into the caller's own namespace is not a service.
fn is_service(fqcn: &str, from: &PhpClass, index: &ClassIndex) -> bool {
    if short_name(fqcn).ends_with("Service") {
        return true;
    }
    if let Some(class) = index.get(fqcn) {
        return ServiceKind.qualifies(class, index);
    }
    fqcn.contains("\\Services\\") && namespace_of(fqcn) != from.namespace.as_deref()
}

/// Categorize a class referenced from `from` by its conventional location
fn category_of(fqcn: &str, from: &PhpClass, index: &ClassIndex) -> Option<Category> {
    let short = short_name(fqcn);
    if fqcn.starts_with("Illuminate\\Support\\Facades\\")
        || (!fqcn.contains('\\') && FACADES.contains(&short))
    {
        return Some(Category::Facade);
    }
    if fqcn.contains("\\Models\\")
        || index
            .get(fqcn)
            .map(|c| index.extends_any(c, &["Model", "Authenticatable", "Pivot"]))
            .unwrap_or(false)
    {
        return Some(Category::Model);
    }
    if fqcn.contains("\\Jobs\\") {
        return Some(Category::Job);
    }
    if fqcn.contains("\\Events\\") {
        return Some(Category::Event);
    }
    if fqcn.contains("\\Notifications\\") {
        return Some(Category::Notification);
    }
    if is_service(fqcn, from, index) {
        return Some(Category::Service);
    }
    None
}

/// Collects categorized references; explicit call-site evidence
/// (`dispatch`, `event`, `notify`) wins over location-based guesses.
#[derive(Default)]
struct FlowCollector {
    seen: BTreeMap<String, Category>,
}

impl FlowCollector {
    fn explicit(&mut self, fqcn: &str, category: Category) {
        self.seen.insert(short_name(fqcn).to_string(), category);
    }

    fn inferred(&mut self, fqcn: &str, category: Category) {
        self.seen
            .entry(short_name(fqcn).to_string())
            .or_insert(category);
    }

    fn finish(self) -> FlowDetails {
        let mut flow = FlowDetails::default();
        for (name, category) in self.seen {
            let bucket = match category {
                Category::Job => &mut flow.jobs,
                Category::Event => &mut flow.events,
                Category::Notification => &mut flow.notifications,
                Category::Model => &mut flow.models,
                Category::Service => &mut flow.services,
                Category::Facade => &mut flow.facades,
                Category::Class => &mut flow.classes,
            };
            bucket.push(name);
        }
        flow
    }
}

fn first_new(args: &[PhpValue]) -> Option<&str> {
    args.iter().find_map(|a| match a {
        PhpValue::New(class) => Some(class.as_str()),
        _ => None,
    })
}

/// Extract the flow of every method of a class
pub fn extract_flow(class: &PhpClass, index: &ClassIndex) -> FlowDetails {
    extract_flow_from(class, class.methods.iter(), index)
}

/// Extract the flow of a subset of a class's methods
pub fn extract_flow_from<'a>(
    class: &PhpClass,
    methods: impl Iterator<Item = &'a PhpMethod>,
    index: &ClassIndex,
) -> FlowDetails {
    let mut collector = FlowCollector::default();
    let is_self = |target: &str| target == class.fqcn || Some(target) == class.extends.as_deref();

    for method in methods {
        for call in &method.calls {
            match call.kind {
                CallKind::Function => match call.name.as_str() {
                    "dispatch" | "dispatch_sync" | "dispatch_now" => {
                        if let Some(job) = first_new(&call.args) {
                            let category = match category_of(job, class, index) {
                                Some(Category::Event) => Category::Event,
                                _ => Category::Job,
                            };
                            collector.explicit(job, category);
                        }
                    }
                    "event" | "broadcast" => {
                        if let Some(event) = first_new(&call.args) {
                            collector.explicit(event, Category::Event);
                        }
                    }
                    _ => {}
                },
                CallKind::Static => {
                    let Some(target) = call.target.as_deref() else {
                        continue;
                    };
                    if is_self(target) {
                        continue;
                    }
                    let category = category_of(target, class, index);
                    match (category, call.name.as_str()) {
                        (Some(Category::Facade), "send" | "sendNow")
                            if short_name(target) == "Notification" =>
                        {
                            if let Some(n) = first_new(&call.args) {
                                collector.explicit(n, Category::Notification);
                            }
                        }
                        (Some(Category::Facade), "dispatch") => {
                            if let Some(inner) = first_new(&call.args) {
                                let inner_category = if short_name(target) == "Event" {
                                    Category::Event
                                } else {
                                    Category::Job
                                };
                                collector.explicit(inner, inner_category);
                            }
                        }
                        (Some(Category::Event), name) if DISPATCH_METHODS.contains(&name) => {
                            collector.explicit(target, Category::Event);
                        }
                        (None | Some(Category::Job), name) if DISPATCH_METHODS.contains(&name) => {
                            collector.explicit(target, Category::Job);
                        }
                        _ => {}
                    }
                    collector.inferred(target, category.unwrap_or(Category::Class));
                }
                CallKind::Method => match call.name.as_str() {
                    "notify" | "notifyNow" => {
                        if let Some(n) = first_new(&call.args) {
                            collector.explicit(n, Category::Notification);
                        }
                    }
                    "dispatch" => {
                        if let Some(job) = first_new(&call.args) {
                            collector.explicit(job, Category::Job);
                        }
                    }
                    _ => {}
                },
                CallKind::New => {
                    let Some(target) = call.target.as_deref() else {
                        continue;
                    };
                    if is_self(target) {
                        continue;
                    }
                    collector.inferred(target, category_of(target, class, index).unwrap_or(Category::Class));
                }
            }
        }
    }

    collector.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PhpParser;
    use std::path::Path;

    fn parse(content: &str) -> PhpClass {
        let mut parser = PhpParser::new().unwrap();
        let parsed = parser.parse_file(Path::new("X.php"), content).unwrap();
        parsed.classes.into_iter().next().unwrap()
    }

    #[test]
    fn test_flow_categories() {
        let class = parse(
            r#"<?php
namespace App\Services;

use App\Events\PostPublished;
use App\Jobs\SendNewsletter;
use App\Models\Post;
use App\Notifications\PostApproved;
use Illuminate\Support\Facades\Cache;
use Illuminate\Support\Facades\Log;

class PublishingService
{
    public function publish(Post $post)
    {
        $post = Post::findOrFail($post->id);
        Cache::forget('posts');
        Log::info('published');
        SendNewsletter::dispatch($post);
        event(new PostPublished($post));
        $post->author->notify(new PostApproved($post));
        $slugger = new Slugger();
    }
}
"#,
        );
        let flow = extract_flow(&class, &ClassIndex::default());

        assert_eq!(flow.models, vec!["Post"]);
        assert_eq!(flow.facades, vec!["Cache", "Log"]);
        assert_eq!(flow.jobs, vec!["SendNewsletter"]);
        assert_eq!(flow.events, vec!["PostPublished"]);
        assert_eq!(flow.notifications, vec!["PostApproved"]);
        assert_eq!(flow.classes, vec!["Slugger"]);
        assert!(flow.services.is_empty());
    }

    #[test]
    fn test_services_by_import_index_or_suffix() {
        let class = parse(
            r#"<?php
namespace App\Http\Controllers;

use App\Services\Billing\Gateway;

class CheckoutController
{
    public function store()
    {
        Gateway::charge();
        $mailer = new NewsletterService();
        $helper = new Formatter();
    }
}
"#,
        );
        let flow = extract_flow(&class, &ClassIndex::default());
        assert_eq!(flow.services, vec!["Gateway", "NewsletterService"]);
        assert_eq!(flow.classes, vec!["Formatter"]);

        // same-namespace reference that the index knows to be a service
        let caller = parse(
            r#"<?php
namespace App\Services;

class ReportService
{
    public function build()
    {
        return (new Exporter())->run();
    }
}
"#,
        );
        let exporter = parse("<?php\nnamespace App\\Services;\n\nclass Exporter {}\n");
        let index = ClassIndex::from_classes(vec![exporter]);
        let flow = extract_flow(&caller, &index);
        assert_eq!(flow.services, vec!["Exporter"]);
        assert!(flow.classes.is_empty());
    }

    #[test]
    fn test_dispatch_helper_marks_job_even_outside_jobs_namespace() {
        let class = parse(
            r#"<?php
class Scheduler
{
    public function run()
    {
        dispatch(new RebuildIndex());
    }
}
"#,
        );
        let flow = extract_flow(&class, &ClassIndex::default());
        assert_eq!(flow.jobs, vec!["RebuildIndex"]);
        assert!(flow.classes.is_empty());
    }
}
