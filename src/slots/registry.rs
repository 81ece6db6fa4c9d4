//! Name-resolved slot parser registry.
//!
//! Slot types resolve to parser implementations by name. Construction is
//! lazy: a parser is built the first time its type is needed and cached for
//! the engine's lifetime. A factory failure is cached too, traced once, and
//! fails only the classifications that need that type.

use super::parsers::{DigitsParser, EntityParser, IntegerParser};
use super::SlotParser;
use crate::context::NluContext;
use crate::result::NluError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Builds one parser instance; construction may fail.
pub type ParserFactory = Box<dyn Fn() -> Result<Box<dyn SlotParser>, String> + Send + Sync>;

/// Lazily constructed, cached slot parsers resolved by type name.
pub struct ParserRegistry {
    factories: HashMap<String, ParserFactory>,
    bindings: HashMap<String, String>,
    cache: Mutex<HashMap<String, Result<Arc<dyn SlotParser>, String>>>,
    context: Arc<NluContext>,
}

impl ParserRegistry {
    /// Create a registry with the built-in parsers and the configured
    /// slot-type to parser-name bindings.
    pub fn new(bindings: HashMap<String, String>, context: Arc<NluContext>) -> Self {
        let mut factories: HashMap<String, ParserFactory> = HashMap::new();
        factories.insert("entity".into(), Box::new(|| Ok(Box::new(EntityParser))));
        factories.insert("integer".into(), Box::new(|| Ok(Box::new(IntegerParser))));
        factories.insert("digits".into(), Box::new(|| Ok(Box::new(DigitsParser))));
        Self {
            factories,
            bindings,
            cache: Mutex::new(HashMap::new()),
            context,
        }
    }

    /// Register a factory under `name`, replacing any previous entry
    /// (including a built-in).
    pub fn register(&mut self, name: impl Into<String>, factory: ParserFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Resolve the parser for a slot type, constructing it on first use.
    ///
    /// Unbound types resolve to the factory of the same name. The outcome,
    /// success or failure, is cached; a failure is dispatched as an error
    /// trace event exactly once, at construction time.
    pub fn resolve(&self, slot_type: &str) -> Result<Arc<dyn SlotParser>, NluError> {
        let name = self
            .bindings
            .get(slot_type)
            .map(String::as_str)
            .unwrap_or(slot_type);

        let mut cache = self.cache.lock();
        if let Some(cached) = cache.get(name) {
            return cached.clone().map_err(NluError::ParserResolution);
        }

        let built = match self.factories.get(name) {
            Some(factory) => factory().map(Arc::from).map_err(|e| {
                format!("parser {} failed to construct: {}", name, e)
            }),
            None => Err(format!("no parser registered under {}", name)),
        };
        if let Err(reason) = &built {
            self.context
                .trace_error(&format!("Error loading slot parser: {}", reason));
        }
        cache.insert(name.to_string(), built.clone());
        built.map_err(NluError::ParserResolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TraceLevel;
    use crate::metadata::SlotMeta;
    use crate::slots::SlotValue;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_context() -> (Arc<NluContext>, Arc<AtomicUsize>) {
        let context = Arc::new(NluContext::new());
        let errors = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&errors);
        context.add_trace_listener(Box::new(move |level, _| {
            if level == TraceLevel::Error {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        }));
        (context, errors)
    }

    #[test]
    fn test_resolves_builtins() {
        let (context, _) = counting_context();
        let registry = ParserRegistry::new(HashMap::new(), context);
        let parser = registry.resolve("integer").unwrap();
        let metadata = SlotMeta {
            name: "n".into(),
            slot_type: "integer".into(),
            facets: None,
        };
        let value = parser.parse(&metadata, "3", &mut HashMap::new()).unwrap();
        assert_eq!(value, Some(SlotValue::Integer(3)));
    }

    #[test]
    fn test_caches_instances() {
        let (context, _) = counting_context();
        let registry = ParserRegistry::new(HashMap::new(), context);
        let first = registry.resolve("entity").unwrap();
        let second = registry.resolve("entity").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_unknown_type_fails_and_traces_once() {
        let (context, errors) = counting_context();
        let registry = ParserRegistry::new(HashMap::new(), context);
        assert!(matches!(
            registry.resolve("temperature"),
            Err(NluError::ParserResolution(_))
        ));
        assert!(registry.resolve("temperature").is_err());
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failing_factory_traces_once() {
        let (context, errors) = counting_context();
        let mut registry = ParserRegistry::new(HashMap::new(), context);
        registry.register("broken", Box::new(|| Err("no init".into())));
        assert!(registry.resolve("broken").is_err());
        assert!(registry.resolve("broken").is_err());
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        // other types keep resolving
        assert!(registry.resolve("entity").is_ok());
    }

    #[test]
    fn test_bindings_redirect_types() {
        let (context, _) = counting_context();
        let bindings = HashMap::from([("number".to_string(), "integer".to_string())]);
        let registry = ParserRegistry::new(bindings, context);
        let parser = registry.resolve("number").unwrap();
        let metadata = SlotMeta {
            name: "n".into(),
            slot_type: "number".into(),
            facets: None,
        };
        let value = parser.parse(&metadata, "12", &mut HashMap::new()).unwrap();
        assert_eq!(value, Some(SlotValue::Integer(12)));
    }
}
