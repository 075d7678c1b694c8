//! Strategy registry: builds configured strategies by name.

use std::collections::HashMap;

use thiserror::Error;
use tracing::warn;

use crate::config::EngineConfig;

use super::price_action::PriceActionStrategy;
use super::Strategy;

/// Name the registry falls back to.
pub const DEFAULT_STRATEGY: &str = "price_action";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),
}

type Constructor = Box<dyn Fn(&EngineConfig) -> Box<dyn Strategy> + Send + Sync>;

/// Factory for creating strategies by name.
pub struct StrategyRegistry {
    constructors: HashMap<String, Constructor>,
}

impl StrategyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Registry with the built-in strategies and their legacy aliases.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(DEFAULT_STRATEGY, |config| {
            Box::new(PriceActionStrategy::named(DEFAULT_STRATEGY, config))
        });
        registry.register("smart_trend_catcher", |config| {
            Box::new(PriceActionStrategy::named("smart_trend_catcher", config))
        });
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&EngineConfig) -> Box<dyn Strategy> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Box::new(constructor));
    }

    pub fn create(
        &self,
        name: &str,
        config: &EngineConfig,
    ) -> Result<Box<dyn Strategy>, RegistryError> {
        self.constructors
            .get(name)
            .map(|ctor| ctor(config))
            .ok_or_else(|| RegistryError::UnknownStrategy(name.to_string()))
    }

    /// Create by name, falling back to the default strategy for unknown names.
    pub fn create_or_default(
        &self,
        name: &str,
        config: &EngineConfig,
    ) -> Result<Box<dyn Strategy>, RegistryError> {
        match self.create(name, config) {
            Ok(strategy) => Ok(strategy),
            Err(RegistryError::UnknownStrategy(_)) => {
                warn!(requested = name, fallback = DEFAULT_STRATEGY, "strategy not found");
                self.create(DEFAULT_STRATEGY, config)
            }
        }
    }

    /// Registered names, sorted.
    pub fn list_strategies(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
