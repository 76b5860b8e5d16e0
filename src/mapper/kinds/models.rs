use super::trait_names;
use crate::mapper::index::ClassIndex;
use crate::mapper::models::{ComponentDetails, ModelDetails, ModelRelation};
use crate::mapper::ClassKind;
use crate::parser::{short_name, CallKind, PhpClass};
use std::path::PathBuf;

const MODEL_BASES: &[&str] = &["Model", "Authenticatable", "Pivot", "MorphPivot"];

const RELATION_METHODS: &[&str] = &[
    "hasOne",
    "hasMany",
    "belongsTo",
    "belongsToMany",
    "hasOneThrough",
    "hasManyThrough",
    "morphTo",
    "morphOne",
    "morphMany",
    "morphToMany",
    "morphedByMany",
];

/// Eloquent models
pub struct ModelKind;

impl ClassKind for ModelKind {
    fn kind(&self) -> &'static str {
        "models"
    }

    fn default_paths(&self) -> Vec<PathBuf> {
        vec![PathBuf::from("app/Models")]
    }

    fn qualifies(&self, class: &PhpClass, index: &ClassIndex) -> bool {
        index.extends_any(class, MODEL_BASES) || class.in_namespace("App\\Models")
    }

    fn details(&self, class: &PhpClass, _index: &ClassIndex) -> ComponentDetails {
        let list = |name: &str| {
            class
                .property_value(name)
                .map(|v| v.string_list())
                .unwrap_or_default()
        };

        let mut casts = class
            .property_value("casts")
            .map(|v| v.string_map())
            .unwrap_or_default();
        if let Some(returned) = super::returned_array(class, "casts") {
            casts.extend(returned.string_map());
        }

        let scopes = class
            .methods
            .iter()
            .filter_map(|m| m.name.strip_prefix("scope"))
            .filter(|rest| rest.starts_with(|c: char| c.is_ascii_uppercase()))
            .map(lower_first)
            .collect();

        ComponentDetails::Model(ModelDetails {
            table: class
                .property_value("table")
                .and_then(|v| v.as_str())
                .map(String::from),
            fillable: list("fillable"),
            guarded: list("guarded"),
            hidden: list("hidden"),
            casts,
            traits: trait_names(class),
            scopes,
            relationships: relationships(class),
        })
    }
}

/// `$this->hasMany(Comment::class)` style relation methods
pub fn relationships(class: &PhpClass) -> Vec<ModelRelation> {
    let mut relations = Vec::new();
    for method in &class.methods {
        let relation = method.calls.iter().find(|c| {
            c.kind == CallKind::Method
                && c.target.as_deref() == Some("$this")
                && RELATION_METHODS.contains(&c.name.as_str())
        });
        let Some(call) = relation else {
            continue;
        };
        // morphTo has no related class argument
        let related = call
            .args
            .first()
            .and_then(|a| a.as_class_ref().or_else(|| a.as_str()))
            .map(|r| short_name(r).to_string())
            .unwrap_or_else(|| "polymorphic".to_string());
        relations.push(ModelRelation {
            name: method.name.clone(),
            related,
            relation_type: call.name.clone(),
        });
    }
    relations
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PhpParser;
    use std::path::Path;

    fn parse(content: &str) -> PhpClass {
        let mut parser = PhpParser::new().unwrap();
        parser
            .parse_file(Path::new("Model.php"), content)
            .unwrap()
            .classes
            .remove(0)
    }

    #[test]
    fn test_model_details() {
        let class = parse(
            r#"<?php
namespace App\Models;

use Illuminate\Database\Eloquent\Model;

class Post extends Model
{
    protected $table = 'blog_posts';
    protected $fillable = ['title', 'body'];
    protected $hidden = ['secret'];

    protected function casts(): array
    {
        return ['published_at' => 'datetime'];
    }

    public function scopePublished($query)
    {
        return $query->whereNotNull('published_at');
    }

    public function author()
    {
        return $this->belongsTo(User::class, 'user_id');
    }

    public function commentable()
    {
        return $this->morphTo();
    }
}
"#,
        );
        let index = ClassIndex::from_classes(vec![class.clone()]);
        assert!(ModelKind.qualifies(&class, &index));

        let ComponentDetails::Model(details) = ModelKind.details(&class, &index) else {
            panic!("expected model details");
        };
        assert_eq!(details.table.as_deref(), Some("blog_posts"));
        assert_eq!(details.fillable, vec!["title", "body"]);
        assert_eq!(details.hidden, vec!["secret"]);
        assert_eq!(details.casts.get("published_at").map(String::as_str), Some("datetime"));
        assert_eq!(details.scopes, vec!["published"]);
        assert_eq!(
            details.relationships,
            vec![
                ModelRelation {
                    name: "author".into(),
                    related: "User".into(),
                    relation_type: "belongsTo".into(),
                },
                ModelRelation {
                    name: "commentable".into(),
                    related: "polymorphic".into(),
                    relation_type: "morphTo".into(),
                },
            ]
        );
    }

    #[test]
    fn test_plain_class_outside_models_is_not_a_model() {
        let class = parse("<?php namespace App\\Support; class Money {}");
        let index = ClassIndex::from_classes(vec![class.clone()]);
        assert!(!ModelKind.qualifies(&class, &index));
    }
}
