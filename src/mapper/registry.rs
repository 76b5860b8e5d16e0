//! Kind → mapper lookup table

use super::kinds::default_mappers;
use super::Mapper;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Registered mappers keyed by kind, iterated in sorted order
#[derive(Clone, Default)]
pub struct MapperRegistry {
    mappers: BTreeMap<String, Arc<dyn Mapper>>,
}

impl MapperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in mappers for every supported kind
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for mapper in default_mappers() {
            registry.register(mapper);
        }
        registry
    }

    /// Register under the mapper's own kind; a later registration wins
    pub fn register(&mut self, mapper: Arc<dyn Mapper>) {
        let kind = mapper.kind().to_string();
        self.insert(kind, mapper);
    }

    /// Register under an explicit key
    pub fn insert(&mut self, kind: impl Into<String>, mapper: Arc<dyn Mapper>) {
        let kind = kind.into();
        if self.mappers.insert(kind.clone(), mapper).is_some() {
            tracing::debug!("Replaced mapper for {}", kind);
        }
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn Mapper>> {
        self.mappers.get(kind).cloned()
    }

    pub fn all(&self) -> impl Iterator<Item = (&str, &Arc<dyn Mapper>)> {
        self.mappers.iter().map(|(k, m)| (k.as_str(), m))
    }

    pub fn kinds(&self) -> Vec<String> {
        self.mappers.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.mappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }
}

impl std::fmt::Debug for MapperRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapperRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
