use std::sync::Arc;

use strum::IntoEnumIterator;
use tracing::{debug, error};

use super::{
    ResourceLoader, ScriptEngine, ScriptError, ScriptFunction, ScriptFunctions, ScriptValue,
};
use crate::world::World;

/// Script source paired with the callbacks it defines.
///
/// The defined set is computed once, at construction, by evaluating the
/// source in a throwaway context. Dispatch re-evaluates the source in a
/// fresh context on every call, so no interpreter state survives between
/// callbacks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scriptable {
    contents: String,
    location: String,
    inline: bool,
    functions: ScriptFunctions,
}

impl Scriptable {
    /// Builds from script text that is stored with its owner.
    pub fn inline(
        engine: &dyn ScriptEngine,
        contents: impl Into<String>,
        location: impl Into<String>,
    ) -> Result<Self, ScriptError> {
        Self::scan(engine, contents.into(), location.into(), true)
    }

    /// Builds from a script resource; only the location is persisted.
    pub fn from_location(
        engine: &dyn ScriptEngine,
        loader: &dyn ResourceLoader,
        location: impl Into<String>,
    ) -> Result<Self, ScriptError> {
        let location = location.into();
        let contents = loader.script_source(&location)?;
        Self::scan(engine, contents, location, false)
    }

    fn scan(
        engine: &dyn ScriptEngine,
        contents: String,
        location: String,
        inline: bool,
    ) -> Result<Self, ScriptError> {
        let mut context = engine.context();
        context.eval(&contents, &location)?;

        let functions = ScriptFunction::iter()
            .filter(|f| context.has_function(f.name()))
            .fold(ScriptFunctions::empty(), |set, f| set | f.flag());
        context.release();

        debug!(
            target: "tactics::script",
            location = %location,
            functions = ?functions,
            "scanned script"
        );

        Ok(Self {
            contents,
            location,
            inline,
            functions,
        })
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn is_inline(&self) -> bool {
        self.inline
    }

    pub fn functions(&self) -> ScriptFunctions {
        self.functions
    }

    pub fn has_function(&self, function: ScriptFunction) -> bool {
        self.functions.has(function)
    }

    /// True if at least one recognized callback is defined.
    pub fn has_any_function(&self) -> bool {
        !self.functions.is_empty()
    }

    /// Dispatches a recognized callback.
    ///
    /// Returns `None` without touching the engine when the script does not
    /// define `function`, and `None` (after logging) when evaluation or
    /// invocation fails.
    pub fn execute_function(
        &self,
        engine: &dyn ScriptEngine,
        world: &mut World,
        function: ScriptFunction,
        args: &[ScriptValue],
    ) -> Option<ScriptValue> {
        if !self.has_function(function) {
            return None;
        }
        self.execute_named(engine, world, function.name(), args)
    }

    /// Dispatches by name, whether or not the name is a recognized callback.
    pub fn execute_named(
        &self,
        engine: &dyn ScriptEngine,
        world: &mut World,
        name: &str,
        args: &[ScriptValue],
    ) -> Option<ScriptValue> {
        let mut context = engine.context();
        let result = context
            .eval(&self.contents, &self.location)
            .and_then(|()| context.invoke_function(name, world, args));
        context.release();

        match result {
            Ok(value) => Some(value),
            Err(err) => {
                error!(
                    target: "tactics::script",
                    location = %self.location,
                    function = name,
                    error = %err,
                    "script function failed"
                );
                None
            }
        }
    }
}

/// Runs `function` on a shared script using the world's own engine.
pub(crate) fn dispatch(
    world: &mut World,
    script: &Arc<Scriptable>,
    function: ScriptFunction,
    args: &[ScriptValue],
) -> Option<ScriptValue> {
    let engine = Arc::clone(world.engine());
    script.execute_function(engine.as_ref(), world, function, args)
}

/// Runs a named function on a shared script using the world's own engine.
pub(crate) fn dispatch_named(
    world: &mut World,
    script: &Arc<Scriptable>,
    name: &str,
    args: &[ScriptValue],
) -> Option<ScriptValue> {
    let engine = Arc::clone(world.engine());
    script.execute_named(engine.as_ref(), world, name, args)
}
