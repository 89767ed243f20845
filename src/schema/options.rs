//! Option providers
//!
//! Long enumerations (countries, IANA time zones) are supplied by
//! collaborators rather than written inline. A provider only has to return
//! the key -> label map an option field uses as its options. Configuration
//! refers to providers by name through `options_from`.

use std::collections::HashMap;
use std::sync::Arc;

use super::types::OptionMap;

/// Source of key -> label pairs for option fields.
pub trait OptionProvider: Send + Sync {
    fn options(&self) -> OptionMap;
}

/// Fixed, in-memory option list.
#[derive(Debug, Clone, Default)]
pub struct StaticOptions {
    options: OptionMap,
}

impl StaticOptions {
    pub fn new<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            options: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl OptionProvider for StaticOptions {
    fn options(&self) -> OptionMap {
        self.options.clone()
    }
}

impl<F> OptionProvider for F
where
    F: Fn() -> OptionMap + Send + Sync,
{
    fn options(&self) -> OptionMap {
        self()
    }
}

/// Named providers available to the loader.
#[derive(Clone, Default)]
pub struct OptionRegistry {
    providers: HashMap<String, Arc<dyn OptionProvider>>,
}

impl OptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `provider` under `name`, replacing any earlier one.
    pub fn register(&mut self, name: impl Into<String>, provider: impl OptionProvider + 'static) {
        self.providers.insert(name.into(), Arc::new(provider));
    }

    pub fn with(mut self, name: impl Into<String>, provider: impl OptionProvider + 'static) -> Self {
        self.register(name, provider);
        self
    }

    /// Resolves `name` to its options, if registered.
    pub fn resolve(&self, name: &str) -> Option<OptionMap> {
        self.providers.get(name).map(|p| p.options())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }
}

impl std::fmt::Debug for OptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.providers.keys().collect();
        names.sort();
        f.debug_struct("OptionRegistry").field("providers", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_options_keep_order() {
        let provider = StaticOptions::new([("US", "United States"), ("CA", "Canada")]);
        let keys: Vec<_> = provider.options().keys().cloned().collect();
        assert_eq!(keys, vec!["US", "CA"]);
    }

    #[test]
    fn test_registry_resolves_by_name() {
        let registry = OptionRegistry::new()
            .with("countries", StaticOptions::new([("CA", "Canada")]))
            .with("zones", || {
                let mut map = OptionMap::new();
                map.insert("America/Toronto".into(), "America/Toronto".into());
                map
            });

        assert!(registry.contains("countries"));
        assert_eq!(registry.resolve("countries").unwrap()["CA"], "Canada");
        assert_eq!(registry.resolve("zones").unwrap().len(), 1);
        assert!(registry.resolve("currencies").is_none());
    }
}
