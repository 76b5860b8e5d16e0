use crate::error::Result;
use crate::mapper::models::{ComponentDetails, ComponentRecord, RouteDetails, ScanOptions, ScanResult};
use crate::mapper::{build_index, Mapper};
use crate::parser::{short_name, RouteDefinition};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Routes registered in `routes/*.php` through the `Route` facade
pub struct RouteMapper;

impl RouteMapper {
    /// Record key: the route name, else `"<METHODS> <uri>"`
    pub fn route_key(route: &RouteDefinition) -> String {
        match &route.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("{} {}", route.methods.join("|"), route.uri),
        }
    }

    pub fn record(route: &RouteDefinition) -> ComponentRecord {
        let key = Self::route_key(route);
        let controller = route.controller.as_deref().map(short_name);

        let action = match (controller, route.controller_method.as_deref()) {
            (Some(c), Some(m)) => Some(format!("{}@{}", c, m)),
            (Some(c), None) => Some(format!("{}@__invoke", c)),
            _ if route.closure => Some("Closure".to_string()),
            _ => None,
        };

        ComponentRecord {
            name: key.clone(),
            fqcn: route.controller.clone().unwrap_or(key),
            kind: "routes".to_string(),
            file: Some(route.file_path.clone()),
            description: None,
            dependencies: controller.map(|c| vec![c.to_string()]).unwrap_or_default(),
            details: ComponentDetails::Route(RouteDetails {
                uri: route.uri.clone(),
                methods: route.methods.clone(),
                action,
                controller: controller.map(String::from),
                route_name: route.name.clone(),
                middleware: route.middleware.clone(),
                prefix: route.prefix.clone(),
                view: route.view.clone(),
                redirect: route.redirect.clone(),
                line: route.line,
            }),
        }
    }
}

impl Mapper for RouteMapper {
    fn kind(&self) -> &str {
        "routes"
    }

    fn default_paths(&self) -> Vec<PathBuf> {
        vec![PathBuf::from("routes")]
    }

    fn scan(&self, options: &ScanOptions) -> Result<ScanResult> {
        let index = build_index(self.kind(), &self.default_paths(), options)?;

        let mut data = BTreeMap::new();
        for route in index.routes() {
            let record = Self::record(route);
            if data.insert(record.name.clone(), record).is_some() {
                tracing::warn!(
                    "Route {} registered more than once, keeping the last ({}:{})",
                    Self::route_key(route),
                    route.file_path,
                    route.line
                );
            }
        }

        tracing::info!("Scanned routes: {} routes", data.len());
        Ok(ScanResult::new(self.kind(), data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_route_scan_from_routes_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("routes")).unwrap();
        fs::write(
            dir.path().join("routes/web.php"),
            r#"<?php
use App\Http\Controllers\PostController;
use App\Http\Controllers\ShowDashboard;
use Illuminate\Support\Facades\Route;

Route::get('/', function () {
    return view('welcome');
});
Route::get('/dashboard', ShowDashboard::class)->name('dashboard');
Route::resource('posts', PostController::class)->only(['index', 'show']);
Route::view('/about', 'pages.about');
"#,
        )
        .unwrap();

        let result = RouteMapper
            .scan(&ScanOptions::default().with_root(dir.path()))
            .unwrap();

        assert_eq!(result.count(), 5);
        let data = result.data();
        assert_eq!(
            data["dashboard"].route_action(),
            Some("ShowDashboard@__invoke")
        );
        assert_eq!(data["posts.index"].route_action(), Some("PostController@index"));
        assert_eq!(data["posts.show"].route_action(), Some("PostController@show"));
        assert_eq!(data["GET /"].route_action(), Some("Closure"));

        let ComponentDetails::Route(about) = &data["GET /about"].details else {
            panic!("expected route details");
        };
        assert_eq!(about.view.as_deref(), Some("pages.about"));
        assert!(about.action.is_none());
    }

    #[test]
    fn test_missing_routes_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let result = RouteMapper
            .scan(&ScanOptions::default().with_root(dir.path()))
            .unwrap();
        assert_eq!(result.count(), 0);
        assert!(!result.is_error());
    }
}
