//! Structural metadata extracted from PHP source

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Visibility of a class member
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn from_keyword(text: &str) -> Self {
        match text.to_ascii_lowercase().as_str() {
            "protected" => Self::Protected,
            "private" => Self::Private,
            _ => Self::Public,
        }
    }
}

/// A simplified PHP value, enough to read configuration-like class members
/// (`$fillable`, `$casts`, `rules()` arrays) and call arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PhpValue {
    String(String),
    Number(String),
    Bool(bool),
    Null,
    Array(Vec<ArrayItem>),
    /// `Foo::class`, resolved to a fully-qualified name
    ClassRef(String),
    /// `new Foo(...)`, resolved to a fully-qualified name
    New(String),
    Closure,
    /// Anything else, kept as raw source text
    Expr(String),
}

/// One element of a PHP array literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayItem {
    pub key: Option<PhpValue>,
    pub value: PhpValue,
}

impl PhpValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_class_ref(&self) -> Option<&str> {
        match self {
            Self::ClassRef(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ArrayItem]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// String elements of a list-like array (`['a', 'b']`)
    pub fn string_list(&self) -> Vec<String> {
        match self {
            Self::Array(items) => items
                .iter()
                .filter_map(|i| i.value.as_str().map(|s| s.to_string()))
                .collect(),
            Self::String(s) => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    /// Key/value pairs of a map-like array (`['a' => 'b']`), values rendered as text
    pub fn string_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        if let Self::Array(items) = self {
            for item in items {
                if let Some(key) = item.key.as_ref().and_then(|k| k.as_str()) {
                    map.insert(key.to_string(), item.value.display());
                }
            }
        }
        map
    }

    /// Human-readable rendering used when a value is stored as text
    pub fn display(&self) -> String {
        match self {
            Self::String(s) | Self::Number(s) | Self::Expr(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
            Self::Null => "null".to_string(),
            Self::ClassRef(c) => format!("{}::class", short_name(c)),
            Self::New(c) => format!("new {}", short_name(c)),
            Self::Closure => "Closure".to_string(),
            Self::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|i| match &i.key {
                        Some(k) => format!("{} => {}", k.display(), i.value.display()),
                        None => i.value.display(),
                    })
                    .collect();
                parts.join("|")
            }
        }
    }
}

/// How a call site was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    /// `dispatch(...)`
    Function,
    /// `Foo::bar(...)`
    Static,
    /// `$x->bar(...)`
    Method,
    /// `new Foo(...)`
    New,
}

/// A call found inside a method body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSite {
    pub kind: CallKind,
    /// Resolved class for static calls and instantiations, raw receiver text
    /// (`$this`, `$user`) for method calls, `None` for plain functions
    pub target: Option<String>,
    /// Function or method name; the class short name for `New`
    pub name: String,
    pub args: Vec<PhpValue>,
    pub line: u32,
}

/// A function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhpParam {
    pub name: String,
    /// Resolved class name, or the primitive / compound type as written
    pub type_name: Option<String>,
    pub promoted: Option<Visibility>,
}

/// A method declared in a class body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhpMethod {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub params: Vec<PhpParam>,
    pub return_type: Option<String>,
    pub complexity: u32,
    pub calls: Vec<CallSite>,
    pub returns: Vec<PhpValue>,
    pub line_start: u32,
    pub line_end: u32,
}

/// A property declared in a class body (constructor-promoted ones included)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhpProperty {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub type_name: Option<String>,
    pub default: Option<PhpValue>,
}

/// A class declaration with resolved names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhpClass {
    pub name: String,
    pub namespace: Option<String>,
    pub fqcn: String,
    pub is_abstract: bool,
    pub extends: Option<String>,
    pub implements: Vec<String>,
    pub traits: Vec<String>,
    pub methods: Vec<PhpMethod>,
    pub properties: Vec<PhpProperty>,
    pub docstring: Option<String>,
    pub file_path: String,
    pub line_start: u32,
    pub line_end: u32,
}

impl PhpClass {
    pub fn method(&self, name: &str) -> Option<&PhpMethod> {
        self.methods
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    pub fn property(&self, name: &str) -> Option<&PhpProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Default value of a declared property, if any
    pub fn property_value(&self, name: &str) -> Option<&PhpValue> {
        self.property(name).and_then(|p| p.default.as_ref())
    }

    pub fn constructor(&self) -> Option<&PhpMethod> {
        self.method("__construct")
    }

    pub fn implements_named(&self, short: &str) -> bool {
        self.implements.iter().any(|i| short_name(i) == short)
    }

    pub fn uses_trait(&self, short: &str) -> bool {
        self.traits.iter().any(|t| short_name(t) == short)
    }

    pub fn in_namespace(&self, prefix: &str) -> bool {
        self.namespace
            .as_deref()
            .map(|ns| ns == prefix || ns.starts_with(&format!("{}\\", prefix)))
            .unwrap_or(false)
    }
}

/// A route registered through the `Route` facade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDefinition {
    pub methods: Vec<String>,
    pub uri: String,
    pub controller: Option<String>,
    pub controller_method: Option<String>,
    pub closure: bool,
    pub view: Option<String>,
    pub redirect: Option<String>,
    pub name: Option<String>,
    pub middleware: Vec<String>,
    pub prefix: Option<String>,
    pub file_path: String,
    pub line: u32,
}

/// Result of parsing one PHP file
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub path: String,
    pub namespace: Option<String>,
    pub imports: BTreeMap<String, String>,
    pub classes: Vec<PhpClass>,
    pub routes: Vec<RouteDefinition>,
}

/// Last segment of a backslash-separated class name
pub fn short_name(fqcn: &str) -> &str {
    fqcn.rsplit('\\').next().unwrap_or(fqcn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name() {
        assert_eq!(short_name("App\\Models\\Post"), "Post");
        assert_eq!(short_name("Post"), "Post");
    }

    #[test]
    fn test_string_list_and_map() {
        let list = PhpValue::Array(vec![
            ArrayItem {
                key: None,
                value: PhpValue::String("title".into()),
            },
            ArrayItem {
                key: None,
                value: PhpValue::String("body".into()),
            },
        ]);
        assert_eq!(list.string_list(), vec!["title", "body"]);

        let map = PhpValue::Array(vec![ArrayItem {
            key: Some(PhpValue::String("published_at".into())),
            value: PhpValue::String("datetime".into()),
        }]);
        assert_eq!(
            map.string_map().get("published_at").map(String::as_str),
            Some("datetime")
        );
    }

    #[test]
    fn test_display_nested_rules() {
        let rules = PhpValue::Array(vec![
            ArrayItem {
                key: None,
                value: PhpValue::String("required".into()),
            },
            ArrayItem {
                key: None,
                value: PhpValue::String("max:255".into()),
            },
        ]);
        assert_eq!(rules.display(), "required|max:255");
    }

    #[test]
    fn test_visibility_from_keyword() {
        assert_eq!(Visibility::from_keyword("protected"), Visibility::Protected);
        assert_eq!(Visibility::from_keyword("PRIVATE"), Visibility::Private);
        assert_eq!(Visibility::from_keyword("public"), Visibility::Public);
    }
}
