//! Named logger lookup
//!
//! A [`LoggerRegistry`] is created once by the application and passed to the
//! code that needs to look loggers up. Separate registries are independent.

use super::{error::Result, logger::Logger};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Name of the logger every registry starts with
pub const ROOT_LOGGER_NAME: &str = "root";

/// Maps logger names to shared loggers; always holds a default logger
///
/// # Example
///
/// ```
/// use rust_log_relay::prelude::*;
///
/// let registry = LoggerRegistry::new().unwrap();
/// let svc = registry.register(Logger::builder("svc").build().unwrap());
///
/// assert!(registry.contains("svc"));
/// assert_eq!(registry.get("svc").unwrap().name(), svc.name());
/// assert_eq!(registry.default_logger().name(), "root");
/// ```
pub struct LoggerRegistry {
    default_logger: Arc<Logger>,
    loggers: Mutex<HashMap<String, Arc<Logger>>>,
}

impl LoggerRegistry {
    /// Create a registry whose default is a synchronous console logger named `root`
    pub fn new() -> Result<Self> {
        Ok(Self::with_default(Logger::builder(ROOT_LOGGER_NAME).build()?))
    }

    /// Create a registry around a caller-built default logger
    pub fn with_default(logger: Logger) -> Self {
        let default_logger = Arc::new(logger);
        let mut loggers = HashMap::new();
        loggers.insert(default_logger.name().to_string(), Arc::clone(&default_logger));
        Self {
            default_logger,
            loggers: Mutex::new(loggers),
        }
    }

    /// Register `logger` under its name.
    ///
    /// The first registration of a name wins: a later logger with the same
    /// name is dropped and the existing one is returned.
    pub fn register(&self, logger: Logger) -> Arc<Logger> {
        let mut loggers = self.loggers.lock();
        if let Some(existing) = loggers.get(logger.name()) {
            return Arc::clone(existing);
        }
        let logger = Arc::new(logger);
        loggers.insert(logger.name().to_string(), Arc::clone(&logger));
        logger
    }

    pub fn get(&self, name: &str) -> Option<Arc<Logger>> {
        self.loggers.lock().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.loggers.lock().contains_key(name)
    }

    pub fn default_logger(&self) -> Arc<Logger> {
        Arc::clone(&self.default_logger)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loggers.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{log_level::LogLevel, sink::MemorySink};

    #[test]
    fn test_new_registry_has_root() {
        let registry = LoggerRegistry::new().unwrap();
        assert!(registry.contains(ROOT_LOGGER_NAME));
        assert_eq!(registry.names(), vec!["root".to_string()]);
        assert!(Arc::ptr_eq(
            &registry.default_logger(),
            &registry.get(ROOT_LOGGER_NAME).unwrap()
        ));
    }

    #[test]
    fn test_first_registration_wins() {
        let registry = LoggerRegistry::new().unwrap();
        let first = MemorySink::new();
        let second = MemorySink::new();

        let kept = registry.register(
            Logger::builder("svc")
                .pattern("%m%n")
                .sink(first.clone())
                .build()
                .unwrap(),
        );
        let returned = registry.register(
            Logger::builder("svc")
                .min_level(LogLevel::Error)
                .sink(second.clone())
                .build()
                .unwrap(),
        );

        assert!(Arc::ptr_eq(&kept, &returned));
        registry.get("svc").unwrap().info("to first").unwrap();
        assert_eq!(first.lines(), vec!["to first"]);
        assert!(second.contents().is_empty());
    }

    #[test]
    fn test_registries_are_independent() {
        let a = LoggerRegistry::new().unwrap();
        let b = LoggerRegistry::new().unwrap();
        a.register(Logger::builder("only-a").build().unwrap());
        assert!(a.contains("only-a"));
        assert!(!b.contains("only-a"));
        assert!(b.get("only-a").is_none());
    }

    #[test]
    fn test_with_default_uses_given_logger() {
        let registry = LoggerRegistry::with_default(Logger::builder("main").build().unwrap());
        assert_eq!(registry.default_logger().name(), "main");
        assert!(registry.contains("main"));
    }
}
