//! Data-driven ability content and loaders.
//!
//! This crate reads the files a game ships with and turns them into
//! `tactics-core` values:
//! - Ability definitions (JSON or RON catalogs) into a [`tactics_core::Ruleset`]
//! - Rules configuration (TOML) into a [`tactics_core::RulesConfig`]
//! - Script files, resolved by resource location
//!
//! It also provides [`DeclarationScanner`], a script engine that only
//! discovers function declarations. Tools use it to validate content without
//! running an interpreter.

pub mod scanner;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use scanner::DeclarationScanner;

#[cfg(feature = "loaders")]
pub use loaders::{
    AbilityCatalog, AbilityLoader, ConfigLoader, ContentFactory, FileResourceLoader, LoadFailure,
};
