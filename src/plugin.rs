//! The plugin loader (spec.md §1: named-only external collaborator) and
//! the query-string parsing the Dynamic Responder (C5) needs before it can
//! call into one.
//!
//! Only the interface is specified; no `dlopen`/`dlsym` implementation is
//! in scope. `StaticPluginLoader` below is a test double, in the spirit of
//! the teacher's own `Context` trait (`server/context.rs`) having one
//! default implementation usable directly in tests.

use std::collections::HashMap;

/// Parsed query string (spec.md §4.5): split on `&`, each pair split on
/// the first `=`; a pair without `=` gets an empty value.
pub type ArgsMap = HashMap<Vec<u8>, Vec<u8>>;

pub fn parse_query(query: &[u8]) -> ArgsMap {
    let mut args = ArgsMap::new();
    if query.is_empty() {
        return args;
    }
    for pair in query.split(|&b| b == b'&') {
        if pair.is_empty() {
            continue;
        }
        match pair.iter().position(|&b| b == b'=') {
            Some(pos) => {
                args.insert(pair[..pos].to_vec(), pair[pos + 1..].to_vec());
            }
            None => {
                args.insert(pair.to_vec(), Vec::new());
            }
        }
    }
    args
}

quick_error! {
    #[derive(Debug)]
    pub enum PluginError {
        NotFound {
            description("no plugin at the requested path")
        }
        Load(message: String) {
            description("plugin failed to load")
            display(me) -> ("{}: {}", me.description(), message)
        }
    }
}

/// A loaded dynamic handler (spec.md §1, §4.5).
pub trait Handler {
    fn respond_get(&self, args: &ArgsMap) -> Vec<u8>;
    fn respond_post(&self, body: &[u8]) -> Vec<u8>;
}

/// Opens a handler for a resolved plugin path. Implemented outside this
/// crate in production (the shared-object loader is explicitly out of
/// scope, spec.md §1); this trait only names the contract the Dynamic
/// Responder (C5) depends on.
pub trait PluginLoader {
    fn open(&self, path: &str) -> Result<Box<Handler>, PluginError>;
}

/// A `PluginLoader` backed by a fixed table of factories, keyed by path.
/// Each `open()` calls the matching factory to produce a fresh handler
/// instance, the way spec.md §4.5 describes a real loader constructing one
/// "via the plugin-provided factory". Useful for tests and for embedding a
/// handful of built-in handlers without a real shared-object loader.
pub struct StaticPluginLoader {
    factories: HashMap<String, Box<Fn() -> Box<Handler>>>,
}

impl StaticPluginLoader {
    pub fn new() -> StaticPluginLoader {
        StaticPluginLoader { factories: HashMap::new() }
    }

    pub fn register<F>(&mut self, path: &str, factory: F)
        where F: Fn() -> Box<Handler> + 'static
    {
        self.factories.insert(path.to_string(), Box::new(factory));
    }
}

impl PluginLoader for StaticPluginLoader {
    fn open(&self, path: &str) -> Result<Box<Handler>, PluginError> {
        match self.factories.get(path) {
            Some(factory) => Ok(factory()),
            None => Err(PluginError::NotFound),
        }
    }
}
