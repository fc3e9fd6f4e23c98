//! Separator registry
//!
//! Maps `--model` names to separator instances.

use std::collections::HashMap;
use std::sync::Arc;

use super::demucs::{DemucsSeparator, DEMUCS_MODELS};
use super::mock::MockSeparator;
use super::model::StemSeparator;
use crate::config::Config;
use crate::error::{Result, UnmixError};

/// Registry of available separation models
pub struct SeparatorRegistry {
    separators: HashMap<String, Arc<dyn StemSeparator>>,
}

impl SeparatorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            separators: HashMap::new(),
        }
    }

    /// Create a registry with every Demucs model plus the mock
    pub fn with_defaults(config: &Config) -> Result<Self> {
        let mut registry = Self::new();
        for model in DEMUCS_MODELS {
            registry.register(Arc::new(DemucsSeparator::from_config(model, config)?));
        }
        registry.register(Arc::new(MockSeparator::new()));
        Ok(registry)
    }

    /// Register a separator under its own name
    pub fn register(&mut self, separator: Arc<dyn StemSeparator>) {
        self.separators
            .insert(separator.name().to_string(), separator);
    }

    /// Get a separator by name
    pub fn get(&self, name: &str) -> Result<Arc<dyn StemSeparator>> {
        self.separators
            .get(name)
            .cloned()
            .ok_or_else(|| UnmixError::UnknownModel {
                model: name.to_string(),
            })
    }

    /// Check if a model is registered
    pub fn has_model(&self, name: &str) -> bool {
        self.separators.contains_key(name)
    }

    /// Registered model names, sorted
    pub fn list_models(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.separators.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for SeparatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_models() {
        let registry = SeparatorRegistry::with_defaults(&Config::default()).unwrap();
        assert_eq!(
            registry.list_models(),
            vec!["hdemucs_mmi", "htdemucs", "htdemucs_ft", "mock"]
        );
        assert_eq!(registry.get("htdemucs").unwrap().name(), "htdemucs");
        assert_eq!(registry.get("mock").unwrap().name(), "mock");
    }

    #[test]
    fn test_unknown_model() {
        let registry = SeparatorRegistry::with_defaults(&Config::default()).unwrap();
        match registry.get("spleeter") {
            Err(UnmixError::UnknownModel { model }) => assert_eq!(model, "spleeter"),
            Err(e) => panic!("Expected UnknownModel, got {:?}", e),
            Ok(_) => panic!("Expected UnknownModel"),
        }
        assert!(!registry.has_model("spleeter"));
    }

    #[test]
    fn test_empty_registry() {
        let registry = SeparatorRegistry::default();
        assert!(registry.list_models().is_empty());
        assert!(registry.get("mock").is_err());
    }
}
