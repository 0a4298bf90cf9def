//! In-process script engine backed by Rust closures.
//!
//! A "script" is identified by its source text. Every function registered
//! under that text becomes defined once the source is evaluated. Built-in
//! content and tests use this engine to give abilities and effects behavior
//! without an external interpreter.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use super::{ScriptContext, ScriptEngine, ScriptError, ScriptValue};
use crate::world::World;

/// A native script function: world handle first, then caller arguments.
pub type NativeFn =
    Arc<dyn Fn(&mut World, &[ScriptValue]) -> Result<ScriptValue, ScriptError> + Send + Sync>;

type Module = HashMap<String, NativeFn>;

#[derive(Default)]
pub struct NativeScriptEngine {
    modules: RwLock<HashMap<String, Module>>,
    evaluations: AtomicUsize,
}

impl NativeScriptEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` as a function of the script whose text is `source`.
    pub fn define<F>(&self, source: impl Into<String>, name: impl Into<String>, function: F)
    where
        F: Fn(&mut World, &[ScriptValue]) -> Result<ScriptValue, ScriptError>
            + Send
            + Sync
            + 'static,
    {
        self.modules
            .write()
            .entry(source.into())
            .or_default()
            .insert(name.into(), Arc::new(function));
    }

    /// Registers a script with no functions.
    pub fn define_empty(&self, source: impl Into<String>) {
        self.modules.write().entry(source.into()).or_default();
    }

    /// Number of source evaluations performed so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for NativeScriptEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeScriptEngine")
            .field("modules", &self.modules.read().len())
            .field("evaluations", &self.evaluations())
            .finish()
    }
}

impl ScriptEngine for NativeScriptEngine {
    fn context(&self) -> Box<dyn ScriptContext + '_> {
        Box::new(NativeContext {
            engine: self,
            functions: HashMap::new(),
        })
    }
}

struct NativeContext<'a> {
    engine: &'a NativeScriptEngine,
    functions: Module,
}

impl ScriptContext for NativeContext<'_> {
    fn eval(&mut self, source: &str, location: &str) -> Result<(), ScriptError> {
        self.engine.evaluations.fetch_add(1, Ordering::Relaxed);
        if source.trim().is_empty() {
            return Ok(());
        }

        let modules = self.engine.modules.read();
        let module = modules.get(source).ok_or_else(|| ScriptError::Eval {
            location: location.to_string(),
            reason: "no native module registered for this source".to_string(),
        })?;
        self.functions
            .extend(module.iter().map(|(name, f)| (name.clone(), Arc::clone(f))));
        Ok(())
    }

    fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    fn invoke_function(
        &mut self,
        name: &str,
        world: &mut World,
        args: &[ScriptValue],
    ) -> Result<ScriptValue, ScriptError> {
        // Cloned out so no engine lock is held while the function runs; native
        // functions routinely dispatch other scripts.
        let function = self
            .functions
            .get(name)
            .cloned()
            .ok_or_else(|| ScriptError::MissingFunction(name.to_string()))?;
        function(world, args)
    }
}
