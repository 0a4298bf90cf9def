//! Save records. Everything is referenced by save-local `ref` numbers, never
//! by runtime ids.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::EntityId;
use crate::rounds::Rounds;
use crate::script::ScriptValue;
use crate::stats::Bonus;

fn is_false(value: &bool) -> bool {
    !*value
}

/// Where an effect's script comes from: inline text, or a resource location.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptableRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_contents: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_location: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectRecord {
    #[serde(rename = "ref")]
    pub reference: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub icons: Vec<String>,
    pub duration: u32,
    pub remove_on_deactivate: bool,
    pub has_description: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bonuses: Vec<Bonus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub animations: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub script_state: BTreeMap<String, ScriptValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<ScriptableRecord>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_aura: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_radius: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_radius: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilitySlotRecord {
    #[serde(rename = "ref")]
    pub reference: u32,
    #[serde(rename = "type")]
    pub slot_type: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub fixed: bool,
    #[serde(rename = "abilityID", default, skip_serializing_if = "Option::is_none")]
    pub ability_id: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_rounds_left: Option<Rounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_rounds_left: Option<Rounds>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<u32>,
}

/// A host's effects. Permanent effects that are not remove-on-deactivate are
/// left out; their owners recreate them from templates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityEffectSetRecord {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub no_active_script: Vec<EffectRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub with_active_script: Vec<EffectRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auras: Vec<u32>,
}

impl EntityEffectSetRecord {
    pub fn is_empty(&self) -> bool {
        self.no_active_script.is_empty() && self.with_active_script.is_empty()
    }

    pub fn effects(&self) -> impl Iterator<Item = &EffectRecord> {
        self.no_active_script.iter().chain(&self.with_active_script)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatureRecord {
    pub entity: EntityId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slots: Vec<AbilitySlotRecord>,
    #[serde(default)]
    pub effects: EntityEffectSetRecord,
}

/// Ability state of a whole world.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldRecord {
    #[serde(default)]
    pub creatures: Vec<CreatureRecord>,
    #[serde(default)]
    pub area_effects: EntityEffectSetRecord,
}
