//! Command implementations
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod inspect_save;
mod show;
mod validate;

pub use inspect_save::InspectSave;
pub use show::Show;
pub use validate::Validate;

#[derive(Clone, Copy, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable summary
    Summary,
    /// JSON output
    Json,
}
