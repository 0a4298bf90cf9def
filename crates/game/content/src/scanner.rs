//! Declaration-only script engine.
//!
//! [`DeclarationScanner`] understands just enough script syntax to find
//! top-level `function name(` declarations and to reject sources whose
//! braces do not balance. It cannot run anything: invoking a declared
//! function reports [`ScriptError::Unsupported`]. Content tools use it to
//! build a full [`tactics_core::Ruleset`] and report each ability's callback
//! set without an interpreter.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use tactics_core::{ScriptContext, ScriptEngine, ScriptError, ScriptValue, World};

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*function\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*\(")
        .expect("declaration pattern is valid")
});

#[derive(Clone, Copy, Debug, Default)]
pub struct DeclarationScanner;

impl DeclarationScanner {
    pub fn new() -> Self {
        Self
    }

    /// Function names declared in `source`, in order of first appearance.
    pub fn declarations(source: &str) -> Vec<String> {
        let mut seen = BTreeSet::new();
        DECLARATION
            .captures_iter(source)
            .filter_map(|caps| caps.get(1))
            .map(|name| name.as_str().to_string())
            .filter(|name| seen.insert(name.clone()))
            .collect()
    }
}

impl ScriptEngine for DeclarationScanner {
    fn context(&self) -> Box<dyn ScriptContext + '_> {
        Box::new(ScannerContext::default())
    }
}

#[derive(Default)]
struct ScannerContext {
    declared: BTreeSet<String>,
}

impl ScriptContext for ScannerContext {
    fn eval(&mut self, source: &str, location: &str) -> Result<(), ScriptError> {
        check_braces(source).map_err(|reason| ScriptError::Eval {
            location: location.to_string(),
            reason,
        })?;
        self.declared.extend(DeclarationScanner::declarations(source));
        Ok(())
    }

    fn has_function(&self, name: &str) -> bool {
        self.declared.contains(name)
    }

    fn invoke_function(
        &mut self,
        name: &str,
        _world: &mut World,
        _args: &[ScriptValue],
    ) -> Result<ScriptValue, ScriptError> {
        if self.declared.contains(name) {
            Err(ScriptError::Unsupported)
        } else {
            Err(ScriptError::MissingFunction(name.to_string()))
        }
    }
}

/// Brace balance outside string literals and comments.
fn check_braces(source: &str) -> Result<(), String> {
    let mut depth: i64 = 0;
    let mut line = 1;
    let mut chars = source.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
        }
        if let Some(q) = quote {
            match c {
                '\\' => {
                    chars.next();
                }
                _ if c == q => quote = None,
                _ => {}
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '/' if chars.peek() == Some(&'/') => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        line += 1;
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        line += 1;
                    }
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    prev = skipped;
                }
            }
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err(format!("unexpected `}}` on line {line}"));
                }
            }
            _ => {}
        }
    }

    if quote.is_some() {
        return Err("unterminated string literal".to_string());
    }
    if depth > 0 {
        return Err(format!("{depth} unclosed `{{`"));
    }
    Ok(())
}
