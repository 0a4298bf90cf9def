//! Resource form of an ability and its validation into [`Ability`].

use std::str::FromStr;
use std::sync::Arc;

use tracing::warn;

use super::{
    Ability, AbilityFlags, AbilityUpgrade, ActionPointCost, ActionType, AiProfile, GroupType,
    Prerequisite, RangeType, SpellData,
};
use crate::error::DefinitionError;
use crate::script::{ResourceLoader, ScriptEngine, Scriptable};

/// Ability as written in a resource file.
///
/// Classification fields are kept as text so that an unknown value is
/// reported as a [`DefinitionError`] naming the field, rather than a generic
/// parse failure.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct AbilityDefinition {
    pub id: String,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub slot_type: String,
    pub description: String,
    pub icon: Option<String>,
    pub is_fixed: bool,
    pub is_activateable: bool,
    pub is_mode: bool,
    pub is_cancelable: bool,
    pub can_activate_outside_combat: bool,
    pub cooldown: i64,
    pub action_point_cost: Option<ApCostDefinition>,
    pub action_type: Option<String>,
    pub group_type: Option<String>,
    pub range_type: Option<String>,
    pub ai: AiDefinition,
    pub prereqs: Vec<Prerequisite>,
    pub restrictions: Vec<Prerequisite>,
    pub upgrades: Vec<UpgradeDefinition>,
    /// Inline script text.
    pub script: Option<String>,
    pub script_location: Option<String>,
    pub is_spell: bool,
    pub spell_level: u32,
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub spell_resistance_applies: bool,
}

#[cfg(feature = "serde")]
fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ApCostDefinition {
    Fixed(i32),
    Described(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AiDefinition {
    pub power: i32,
    pub priority: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UpgradeDefinition {
    #[cfg_attr(feature = "serde", serde(rename = "abilityID"))]
    pub ability_id: String,
    pub description: String,
    #[cfg_attr(feature = "serde", serde(rename = "override"))]
    pub overrides: bool,
}

fn parse_enum<T: FromStr>(
    field: &'static str,
    value: Option<&str>,
    default: T,
) -> Result<T, DefinitionError> {
    match value {
        None => Ok(default),
        Some(text) => T::from_str(text).map_err(|_| DefinitionError::unknown(field, text)),
    }
}

fn required(field: &'static str, value: &str) -> Result<(), DefinitionError> {
    if value.trim().is_empty() {
        return Err(DefinitionError::MissingField { field });
    }
    Ok(())
}

impl Ability {
    /// Validates a definition and builds the shared ability.
    ///
    /// Inline scripts take precedence over `scriptLocation`.
    pub fn from_definition(
        def: AbilityDefinition,
        engine: &dyn ScriptEngine,
        loader: &dyn ResourceLoader,
    ) -> Result<Ability, DefinitionError> {
        required("id", &def.id)?;
        required("name", &def.name)?;
        required("type", &def.slot_type)?;

        let cooldown = u32::try_from(def.cooldown)
            .map_err(|_| DefinitionError::invalid("cooldown", "must be a non-negative round count"))?;

        let action_type = parse_enum("actionType", def.action_type.as_deref(), ActionType::Tactical)?;
        let group_type = parse_enum("groupType", def.group_type.as_deref(), GroupType::Single)?;
        let range_type = parse_enum("rangeType", def.range_type.as_deref(), RangeType::Personal)?;

        let ap_cost = match def.action_point_cost {
            None => ActionPointCost::Fixed(0),
            Some(ApCostDefinition::Fixed(cost)) if cost < 0 => {
                return Err(DefinitionError::invalid(
                    "actionPointCost",
                    format!("negative cost {cost}"),
                ));
            }
            Some(ApCostDefinition::Fixed(cost)) => ActionPointCost::Fixed(cost),
            Some(ApCostDefinition::Described(text)) => ActionPointCost::Described(text),
        };

        let mut flags = AbilityFlags::empty();
        flags.set(AbilityFlags::FIXED, def.is_fixed);
        flags.set(AbilityFlags::ACTIVATEABLE, def.is_activateable);
        flags.set(AbilityFlags::MODE, def.is_mode);
        flags.set(AbilityFlags::CANCELABLE, def.is_cancelable);
        flags.set(AbilityFlags::OUTSIDE_COMBAT, def.can_activate_outside_combat);

        if def.is_mode && !def.is_activateable {
            warn!(
                target: "tactics::ability",
                ability = %def.id,
                "mode ability is not activateable"
            );
        }
        if def.is_cancelable && !def.is_mode {
            warn!(
                target: "tactics::ability",
                ability = %def.id,
                "cancelable ability is not a mode"
            );
        }

        let script = match (def.script, def.script_location) {
            (Some(contents), _) => Some(Scriptable::inline(engine, contents, def.id.clone())),
            (None, Some(location)) => Some(Scriptable::from_location(engine, loader, location)),
            (None, None) => None,
        }
        .transpose()
        .map_err(|err| DefinitionError::Script {
            location: def.id.clone(),
            reason: err.to_string(),
        })?
        .map(Arc::new);

        let spell = def.is_spell.then_some(SpellData {
            level: def.spell_level,
            spell_resistance_applies: def.spell_resistance_applies,
        });

        let upgrades = def
            .upgrades
            .into_iter()
            .map(|upgrade| {
                required("upgrades.abilityID", &upgrade.ability_id)?;
                Ok(AbilityUpgrade {
                    ability_id: upgrade.ability_id,
                    description: upgrade.description,
                    overrides: upgrade.overrides,
                })
            })
            .collect::<Result<Vec<_>, DefinitionError>>()?;

        Ok(Ability {
            id: def.id,
            name: def.name,
            slot_type: def.slot_type,
            description: def.description,
            icon: def.icon,
            flags,
            cooldown,
            ap_cost,
            action_type,
            group_type,
            range_type,
            ai: AiProfile {
                power: def.ai.power,
                priority: def.ai.priority,
            },
            prereqs: def.prereqs,
            restrictions: def.restrictions,
            upgrades,
            script,
            spell,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{NativeScriptEngine, ScriptError, ScriptFunction, ScriptValue};

    struct NoResources;

    impl ResourceLoader for NoResources {
        fn script_source(&self, location: &str) -> Result<String, ScriptError> {
            Err(ScriptError::ResourceNotFound(location.to_string()))
        }
    }

    fn definition() -> AbilityDefinition {
        AbilityDefinition {
            id: "Fireball".into(),
            name: "Fireball".into(),
            slot_type: "Spell".into(),
            is_activateable: true,
            cooldown: 3,
            action_point_cost: Some(ApCostDefinition::Fixed(600)),
            action_type: Some("Damage".into()),
            group_type: Some("Multiple".into()),
            range_type: Some("Long".into()),
            is_spell: true,
            spell_level: 3,
            spell_resistance_applies: true,
            ..AbilityDefinition::default()
        }
    }

    #[test]
    fn builds_a_spell() {
        let engine = NativeScriptEngine::new();
        let ability = Ability::from_definition(definition(), &engine, &NoResources).unwrap();

        assert!(ability.is_spell());
        assert_eq!(ability.spell_level(), 3);
        assert_eq!(ability.cooldown(), 3);
        assert_eq!(ability.ap_cost().fixed(), 600);
        assert_eq!(ability.range_type(), RangeType::Long);
        assert!(ability.is_activateable());
        assert!(!ability.is_mode());
    }

    #[test]
    fn unknown_enum_value_names_the_field() {
        let engine = NativeScriptEngine::new();
        let mut def = definition();
        def.action_type = Some("Explode".into());

        let err = Ability::from_definition(def, &engine, &NoResources).unwrap_err();
        assert_eq!(err, DefinitionError::unknown("actionType", "Explode"));
    }

    #[test]
    fn missing_name_and_negative_cooldown_are_rejected() {
        let engine = NativeScriptEngine::new();

        let mut def = definition();
        def.name = String::new();
        assert_eq!(
            Ability::from_definition(def, &engine, &NoResources).unwrap_err(),
            DefinitionError::MissingField { field: "name" }
        );

        let mut def = definition();
        def.cooldown = -1;
        assert!(matches!(
            Ability::from_definition(def, &engine, &NoResources).unwrap_err(),
            DefinitionError::InvalidValue { field: "cooldown", .. }
        ));
    }

    #[test]
    fn inline_script_is_scanned() {
        let engine = NativeScriptEngine::new();
        engine.define("fireball()", "onActivate", |_, _| Ok(ScriptValue::Null));

        let mut def = definition();
        def.script = Some("fireball()".into());
        let ability = Ability::from_definition(def, &engine, &NoResources).unwrap();

        let script = ability.script().unwrap();
        assert!(script.is_inline());
        assert!(script.has_function(ScriptFunction::OnActivate));
    }

    #[test]
    fn missing_script_resource_is_a_definition_error() {
        let engine = NativeScriptEngine::new();
        let mut def = definition();
        def.script_location = Some("scripts/fireball.js".into());

        let err = Ability::from_definition(def, &engine, &NoResources).unwrap_err();
        assert!(matches!(err, DefinitionError::Script { .. }));
    }
}
