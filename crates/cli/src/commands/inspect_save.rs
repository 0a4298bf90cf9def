//! Summarize a saved world record.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use tactics_core::persist::EntityEffectSetRecord;
use tactics_core::{RulesConfig, WorldRecord};

use super::OutputFormat;

/// Summarize a saved world record
#[derive(Parser)]
pub struct InspectSave {
    /// Save file (JSON)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

impl InspectSave {
    pub fn execute(self) -> Result<()> {
        let text = std::fs::read_to_string(&self.file)
            .with_context(|| format!("Failed to read save file: {}", self.file.display()))?;
        let record = WorldRecord::from_json(&text)
            .with_context(|| format!("Failed to parse save file: {}", self.file.display()))?;

        match self.format {
            OutputFormat::Json => println!("{}", record.to_json()?),
            OutputFormat::Summary => print_summary(&record),
        }
        Ok(())
    }
}

fn print_summary(record: &WorldRecord) {
    let threshold = RulesConfig::DEFAULT_INDEFINITE_DISPLAY_THRESHOLD;

    for creature in &record.creatures {
        println!("{} {}", style("Creature").bold(), creature.entity);
        for slot in &creature.slots {
            let ability = slot.ability_id.as_deref().unwrap_or("<empty>");
            let mut line = format!("  slot {} [{}] {}", slot.reference, slot.slot_type, ability);
            if slot.active {
                let left = slot.active_rounds_left.unwrap_or_default().label(threshold);
                line.push_str(&format!(", active {left}"));
            }
            if let Some(cooldown) = slot.cooldown_rounds_left.filter(|c| !c.is_zero()) {
                line.push_str(&format!(", cooldown {}", cooldown.label(threshold)));
            }
            println!("{line}");
        }
        print_effects(&creature.effects);
    }

    if !record.area_effects.is_empty() {
        println!("{}", style("Area").bold());
        print_effects(&record.area_effects);
    }
}

fn print_effects(set: &EntityEffectSetRecord) {
    for effect in set.effects() {
        let title = effect.title.as_deref().unwrap_or("effect");
        let kind = if effect.is_aura { "aura" } else { "effect" };
        let duration = if effect.duration == 0 {
            "until deactivated".to_string()
        } else {
            format!("{} rounds", effect.duration)
        };
        println!(
            "  {kind} {} {title}: {duration}, {} bonuses",
            effect.reference,
            effect.bonuses.len()
        );
    }
}
