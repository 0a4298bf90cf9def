//! Show one ability.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use serde_json::json;
use tactics_content::{ContentFactory, DeclarationScanner};
use tactics_core::{Ability, ActionPointCost, RulesConfig};

use super::OutputFormat;

/// Show one ability as the engine sees it
#[derive(Parser)]
pub struct Show {
    /// Data directory containing abilities/ and scripts/
    #[arg(value_name = "DIR")]
    data_dir: PathBuf,

    /// Ability id
    #[arg(value_name = "ID")]
    id: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

impl Show {
    pub fn execute(self) -> Result<()> {
        let factory = ContentFactory::new(&self.data_dir);
        let catalog = factory.load_abilities(&DeclarationScanner::new())?;
        let ability = catalog
            .ruleset
            .get(&self.id)
            .with_context(|| format!("Ability `{}` not found in {}", self.id, self.data_dir.display()))?;

        match self.format {
            OutputFormat::Summary => print_summary(ability),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&to_json(ability))?),
        }
        Ok(())
    }
}

fn ap_cost_label(cost: &ActionPointCost) -> String {
    match cost {
        ActionPointCost::Fixed(cost) => RulesConfig::display_action_points(*cost).to_string(),
        ActionPointCost::Described(text) => text.clone(),
    }
}

fn callbacks(ability: &Ability) -> Vec<&'static str> {
    ability
        .script()
        .map(|script| script.functions().functions().map(|f| f.name()).collect())
        .unwrap_or_default()
}

fn print_summary(ability: &Ability) {
    println!("{} ({})", style(ability.name()).bold(), ability.id());
    println!("  Type:      {}", ability.slot_type());
    if !ability.description().is_empty() {
        println!("  {}", ability.description());
    }
    println!("  Flags:     {:?}", ability.flags());
    println!("  Cooldown:  {}", ability.cooldown());
    println!("  AP cost:   {}", ap_cost_label(ability.ap_cost()));
    println!(
        "  Action:    {} / {} / {}",
        ability.action_type(),
        ability.group_type(),
        ability.range_type()
    );
    if let Some(spell) = ability.spell() {
        println!(
            "  Spell:     level {}{}",
            spell.level,
            if spell.spell_resistance_applies {
                ""
            } else {
                ", ignores spell resistance"
            }
        );
    }
    for prereq in ability.prereqs() {
        println!("  Requires:  {prereq:?}");
    }
    for upgrade in ability.upgrades() {
        println!("  Upgrade:   {} {}", upgrade.ability_id, upgrade.description);
    }
    match ability.script() {
        Some(script) => println!(
            "  Script:    {} [{}]",
            script.location(),
            callbacks(ability).join(", ")
        ),
        None => println!("  Script:    {}", style("none").dim()),
    }
}

fn to_json(ability: &Ability) -> serde_json::Value {
    json!({
        "id": ability.id(),
        "name": ability.name(),
        "type": ability.slot_type(),
        "description": ability.description(),
        "fixed": ability.is_fixed(),
        "activateable": ability.is_activateable(),
        "mode": ability.is_mode(),
        "cancelable": ability.is_cancelable(),
        "cooldown": ability.cooldown(),
        "apCost": ap_cost_label(ability.ap_cost()),
        "actionType": ability.action_type().to_string(),
        "groupType": ability.group_type().to_string(),
        "rangeType": ability.range_type().to_string(),
        "spellLevel": ability.spell().map(|s| s.level),
        "prereqs": ability.prereqs(),
        "script": ability.script().map(|s| s.location()),
        "callbacks": callbacks(ability),
    })
}
