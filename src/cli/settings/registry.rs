//! Registry of setting handlers.

use std::collections::HashMap;

use super::handlers::{
    api_url_handler, backend_url_handler, connect_timeout_handler, development_handler,
    read_timeout_handler, DefaultModeHandler, GreetingHandler,
};
use super::SettingHandler;

/// Registry of all available setting handlers.
pub struct SettingRegistry {
    handlers: HashMap<&'static str, Box<dyn SettingHandler>>,
    /// Keys in display order for `datachat set` output.
    display_order: Vec<&'static str>,
}

impl SettingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
            display_order: Vec::new(),
        };

        registry.register(Box::new(api_url_handler()));
        registry.register(Box::new(backend_url_handler()));
        registry.register(Box::new(development_handler()));
        registry.register(Box::new(DefaultModeHandler));
        registry.register(Box::new(connect_timeout_handler()));
        registry.register(Box::new(read_timeout_handler()));
        registry.register(Box::new(GreetingHandler));

        registry
    }

    fn register(&mut self, handler: Box<dyn SettingHandler>) {
        let key = handler.key();
        self.display_order.push(key);
        self.handlers.insert(key, handler);
    }

    pub fn get(&self, key: &str) -> Option<&dyn SettingHandler> {
        self.handlers.get(key).map(|h| h.as_ref())
    }

    pub fn keys_display_order(&self) -> &[&'static str] {
        &self.display_order
    }
}

impl Default for SettingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
