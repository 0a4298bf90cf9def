use std::path::Path;
use std::sync::Arc;

use tactics_content::{AbilityLoader, ContentFactory, DeclarationScanner};
use tactics_core::{
    ActionPointCost, ActionType, Area, AreaDimensions, GroupType, Prerequisite, RangeType,
    ScriptEngine, ScriptFunction,
};

fn shipped() -> ContentFactory {
    ContentFactory::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("data"))
}

#[test]
fn shipped_content_loads_cleanly() {
    let catalog = shipped().load_abilities(&DeclarationScanner::new()).unwrap();

    assert!(catalog.is_clean(), "failures: {:?}", catalog.failures);
    let ids: Vec<_> = catalog.ruleset.ids().collect();
    assert_eq!(
        ids,
        vec!["Bless", "DefensiveStance", "Fireball", "ImprovedStance", "Toughness"]
    );

    let stance = catalog.ruleset.get("DefensiveStance").unwrap();
    assert!(stance.is_mode() && stance.is_cancelable());
    assert_eq!(stance.cooldown(), 2);
    assert_eq!(stance.ap_cost(), &ActionPointCost::Fixed(300));
    assert_eq!(stance.prereqs(), &[Prerequisite::MinLevel { level: 2 }]);
    let script = stance.script().unwrap();
    assert!(!script.is_inline());
    assert_eq!(script.location(), "scripts/abilities/stance.js");
    assert!(script.has_function(ScriptFunction::CanActivate));
    assert!(script.has_function(ScriptFunction::OnDeactivate));

    let fireball = catalog.ruleset.get("Fireball").unwrap();
    assert_eq!(fireball.spell_level(), 3);
    assert_eq!(fireball.action_type(), ActionType::Damage);
    assert_eq!(fireball.group_type(), GroupType::Multiple);
    assert_eq!(fireball.range_type(), RangeType::Long);
    let fireball_script = fireball.script().unwrap();
    assert!(fireball_script.has_function(ScriptFunction::OnTargetSelect));
    assert!(fireball_script.has_function(ScriptFunction::OnTargetCancel));

    let bless = catalog.ruleset.get("Bless").unwrap();
    assert!(!bless.spell().unwrap().spell_resistance_applies);

    assert!(catalog.ruleset.get("Toughness").unwrap().is_fixed());
}

#[test]
fn factory_builds_world_from_shipped_data() {
    let engine: Arc<dyn ScriptEngine> = Arc::new(DeclarationScanner::new());
    let (world, failures) = shipped()
        .build_world(Area::new(AreaDimensions::new(8, 8)), engine)
        .unwrap();

    assert!(failures.is_empty());
    assert_eq!(world.ruleset().len(), 5);
    assert_eq!(world.config().action_points_per_round, 1000);
}

#[test]
fn bad_definitions_are_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let abilities = dir.path().join("abilities");
    std::fs::create_dir_all(&abilities).unwrap();

    std::fs::write(
        abilities.join("a.json"),
        r#"[
            { "id": "Good", "name": "Good", "type": "Feat" },
            { "id": "Negative", "name": "Negative", "type": "Feat", "cooldown": -1 },
            { "id": "Strange", "name": "Strange", "type": "Feat", "actionType": "Dance" },
            { "id": "Lost", "name": "Lost", "type": "Feat", "scriptLocation": "scripts/none.js" },
            { "id": "Good", "name": "Again", "type": "Feat" }
        ]"#,
    )
    .unwrap();
    std::fs::write(abilities.join("b.json"), "{ not json").unwrap();
    std::fs::write(abilities.join("notes.txt"), "ignored").unwrap();

    let factory = ContentFactory::new(dir.path());
    let catalog = factory.load_abilities(&DeclarationScanner::new()).unwrap();

    assert_eq!(catalog.ruleset.len(), 1);
    assert_eq!(catalog.ruleset.get("Good").unwrap().name(), "Good");

    let failed: Vec<_> = catalog
        .failures
        .iter()
        .map(|f| f.ability.clone().unwrap_or_default())
        .collect();
    assert_eq!(failed, vec!["Negative", "Strange", "Lost", "Good", ""]);

    let negative = format!("{:#}", catalog.failures[0].error);
    assert!(negative.contains("ability `Negative`"), "{negative}");
    assert!(negative.contains("cooldown"), "{negative}");
}

#[test]
fn unknown_extension_is_rejected() {
    let err = AbilityLoader::read_definitions(Path::new("abilities.yaml")).unwrap_err();
    assert!(err.to_string().contains("Unsupported"));
}
