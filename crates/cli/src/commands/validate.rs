//! Validate a content directory.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use console::style;
use tactics_content::{ContentFactory, DeclarationScanner};

/// Load every ability in a data directory and report failures
#[derive(Parser)]
pub struct Validate {
    /// Data directory containing config.toml, abilities/ and scripts/
    #[arg(value_name = "DIR")]
    data_dir: PathBuf,
}

impl Validate {
    pub fn execute(self) -> Result<()> {
        let factory = ContentFactory::new(&self.data_dir);
        let config = factory.load_config()?;
        let catalog = factory.load_abilities(&DeclarationScanner::new())?;

        println!(
            "{} {}",
            style("Content:").bold(),
            factory.data_dir().display()
        );
        println!(
            "  AP per round {}, tile size {}, player faction {}",
            tactics_core::RulesConfig::display_action_points(config.action_points_per_round),
            config.tile_size,
            config.player_faction
        );
        println!(
            "  {} abilities loaded",
            style(catalog.ruleset.len()).green()
        );

        if catalog.is_clean() {
            println!("{}", style("No problems found.").green());
            return Ok(());
        }

        println!();
        for failure in &catalog.failures {
            let name = failure.ability.as_deref().unwrap_or("<file>");
            println!(
                "{} {} ({})",
                style("✗").red(),
                style(name).bold(),
                failure.path.display()
            );
            for cause in failure.error.chain() {
                println!("    {cause}");
            }
        }

        anyhow::bail!("{} ability definition(s) failed", catalog.failures.len())
    }
}
