use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tactics_content::FileResourceLoader;
use tactics_core::targeter::MouseActionCondition;
use tactics_core::{
    Ability, AbilityDefinition, Area, AreaDimensions, Creature, EntityId, NativeScriptEngine,
    Position, RulesConfig, Ruleset, ScriptError, ScriptFunction, ScriptValue, Scriptable, SlotId,
    SlotState, TargetRef, Targeter, World,
};
use tactics_runtime::{
    AbilityEvent, Event, FeedbackEvent, RuntimeConfig, Session, TargetingEvent, Topic,
};
use tokio::sync::broadcast;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(2);

struct Scene {
    world: World,
    engine: Arc<NativeScriptEngine>,
    hero: EntityId,
    goblin: EntityId,
    slot: SlotId,
    picked: Arc<Mutex<Vec<EntityId>>>,
}

/// Aldo owns a "Bolt" spell whose `onActivate` queues a radius-1 circle
/// targeter; the select callback records the creatures it hit.
fn scene() -> Scene {
    let engine = Arc::new(NativeScriptEngine::new());
    engine.define("bolt", "onActivate", |world: &mut World, args: &[ScriptValue]| {
        let slot = args[0].as_slot().ok_or_else(|| ScriptError::invocation("onActivate", "no slot"))?;
        let owner = args[1]
            .as_entity()
            .ok_or_else(|| ScriptError::invocation("onActivate", "no owner"))?;
        let script = world
            .ruleset()
            .get("Bolt")
            .and_then(|ability| ability.script().cloned())
            .ok_or_else(|| ScriptError::invocation("onActivate", "no script"))?;
        world
            .targeters()
            .activate(Targeter::circle(owner, 1).with_slot(slot).with_script(script));
        Ok(ScriptValue::Null)
    });

    let picked = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&picked);
    engine.define("bolt", "onTargetSelect", move |_, args: &[ScriptValue]| {
        if let Some(selection) = args.first().and_then(|value| value.as_selection()) {
            sink.lock().extend(selection.creatures.iter().copied());
        }
        Ok(ScriptValue::Null)
    });

    let definition = AbilityDefinition {
        id: "Bolt".into(),
        name: "Bolt".into(),
        slot_type: "Spell".into(),
        is_activateable: true,
        can_activate_outside_combat: true,
        cooldown: 1,
        is_spell: true,
        spell_level: 1,
        script: Some("bolt".into()),
        ..AbilityDefinition::default()
    };
    let ability = Ability::from_definition(definition, &*engine, &FileResourceLoader::new(".")).unwrap();
    let ruleset: Ruleset = std::iter::once(ability).collect();

    let mut world = World::new(
        RulesConfig::default(),
        Area::new(AreaDimensions::new(10, 10)),
        Arc::new(ruleset),
        engine.clone(),
    );
    let hero = world.add_creature(Creature::new("Aldo", "Npc", Position::new(2, 2)));
    let goblin = world.add_creature(Creature::new("Grik", "Monsters", Position::new(6, 6)));
    let slot = world.add_slot(hero, "Spell").unwrap();
    world.set_slot_ability(slot, Some("Bolt")).unwrap();

    Scene {
        world,
        engine,
        hero,
        goblin,
        slot,
        picked,
    }
}

fn fast_config() -> RuntimeConfig {
    RuntimeConfig {
        poll_interval: Duration::from_millis(5),
        file_logging: false,
        ..RuntimeConfig::default()
    }
}

async fn next_matching(
    rx: &mut broadcast::Receiver<Event>,
    mut want: impl FnMut(&Event) -> bool,
) -> Event {
    timeout(WAIT, async {
        loop {
            let event = rx.recv().await.unwrap();
            if want(&event) {
                return event;
            }
        }
    })
    .await
    .expect("event not published in time")
}

#[tokio::test]
async fn fire_target_select_and_cool_down() {
    let Scene {
        world,
        goblin,
        slot,
        picked,
        ..
    } = scene();
    let session = Session::builder(world).config(fast_config()).spawn();
    let handle = session.handle();
    let mut feedback = handle.subscribe(Topic::Feedback);
    let mut targeting = handle.subscribe(Topic::Targeting);
    let mut ability = handle.subscribe(Topic::Ability);

    assert!(handle.fire_slot(slot).await.unwrap());
    assert_eq!(
        next_matching(&mut ability, |_| true).await,
        Event::Ability(AbilityEvent::SlotFired { slot })
    );
    assert_eq!(
        next_matching(&mut feedback, |_| true).await,
        Event::Feedback(FeedbackEvent::Message {
            text: "Aldo casts Bolt.".into()
        })
    );

    // The worker promotes the queued targeter on its next poll.
    next_matching(&mut targeting, |e| {
        matches!(e, Event::Targeting(TargetingEvent::Changed { current: Some(_) }))
    })
    .await;

    let (x, y) = Position::new(6, 6).screen_center(RulesConfig::DEFAULT_TILE_SIZE);
    handle.mouse_moved(x, y).await.unwrap();
    assert_eq!(handle.click().await.unwrap(), MouseActionCondition::TargetSelect);

    next_matching(&mut targeting, |e| {
        matches!(e, Event::Targeting(TargetingEvent::Selected { .. }))
    })
    .await;
    assert_eq!(*picked.lock(), vec![goblin]);

    // Cooling down: a second fire is refused until a round passes.
    assert!(!handle.fire_slot(slot).await.unwrap());
    handle.elapse_rounds(1).await.unwrap();
    let state = handle
        .with_world(move |world| world.slot(slot).map(|s| s.state()))
        .await
        .unwrap();
    assert_eq!(state, Some(SlotState::Readied));

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn blocking_cancel_is_resolved_by_the_worker() {
    let Scene { world, hero, .. } = scene();
    let session = Session::builder(world).config(fast_config()).spawn();
    let handle = session.handle();
    let mut targeting = handle.subscribe(Topic::Targeting);

    let targeter = handle
        .with_world(move |world| {
            world
                .targeters()
                .activate(Targeter::point(hero).cancelable(false))
        })
        .await
        .unwrap();
    let id = targeter.id();

    // Not cancelable by the user.
    next_matching(&mut targeting, |e| {
        matches!(e, Event::Targeting(TargetingEvent::Changed { current: Some(_) }))
    })
    .await;
    assert!(!handle.cancel_targeting().await.unwrap());

    assert!(handle.cancel_targeter(targeter, WAIT).await.unwrap());
    next_matching(&mut targeting, |e| {
        *e == Event::Targeting(TargetingEvent::Canceled { targeter: id })
    })
    .await;

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn queued_and_delayed_dispatch() {
    let Scene { world, engine, .. } = scene();
    let count = Arc::new(Mutex::new(0_i64));
    let counter = Arc::clone(&count);
    engine.define("tick", "onRoundElapsed", move |_, _| {
        let mut count = counter.lock();
        *count += 1;
        Ok(ScriptValue::Int(*count))
    });
    let script = Arc::new(Scriptable::inline(&*engine, "tick", "tick").unwrap());

    let session = Session::builder(world).config(fast_config()).spawn();
    let handle = session.handle();

    let result = handle
        .call(script.clone(), ScriptFunction::OnRoundElapsed, vec![])
        .await
        .unwrap();
    assert_eq!(result, Some(ScriptValue::Int(1)));
    // Undefined callbacks never reach the engine.
    let result = handle
        .call(script.clone(), ScriptFunction::OnDeactivate, vec![])
        .await
        .unwrap();
    assert_eq!(result, None);

    let mut scripts = handle.subscribe(Topic::Script);
    let delayed = handle.dispatch_after(
        Duration::from_millis(20),
        script.clone(),
        ScriptFunction::OnRoundElapsed,
        vec![],
    );
    assert!(delayed.join().await.unwrap());
    let Event::Script(event) = next_matching(&mut scripts, |_| true).await else {
        panic!("expected a script event");
    };
    assert_eq!(event.location, "tick");
    assert_eq!(event.function, "onRoundElapsed");
    assert_eq!(event.result, Some(ScriptValue::Int(2)));

    let mut canceled = handle.dispatch_after(
        Duration::from_secs(30),
        script.clone(),
        ScriptFunction::OnRoundElapsed,
        vec![],
    );
    assert!(canceled.cancel());
    assert!(!canceled.join().await.unwrap());
    assert_eq!(*count.lock(), 2);

    // Fire-and-forget runs before anything queued after it.
    handle
        .dispatch(script, ScriptFunction::OnRoundElapsed, vec![])
        .await
        .unwrap();
    handle.with_world(|_| ()).await.unwrap();
    assert_eq!(*count.lock(), 3);

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn save_and_reload_through_the_session() {
    let Scene { world, hero, .. } = scene();
    let session = Session::builder(world).config(fast_config()).spawn();
    let handle = session.handle();

    handle
        .with_world(move |world| {
            let effect = world.create_effect(None);
            if let Some(effect) = world.effect_mut(effect) {
                effect.set_duration(3);
            }
            world.apply_effect(effect, TargetRef::Creature(hero))
        })
        .await
        .unwrap()
        .unwrap();

    let record = handle.save().await.unwrap();
    let saved = record
        .creatures
        .iter()
        .find(|c| c.entity == hero)
        .expect("hero saved");
    assert_eq!(saved.effects.effects().count(), 1);
    assert_eq!(saved.slots.len(), 1);

    let report = handle.load(record).await.unwrap();
    assert_eq!(report.slots, 1);
    assert_eq!(report.effects, 1);
    assert_eq!(report.skipped, 0);

    let world = session.shutdown().await.unwrap();
    let effects = world
        .effect_set(TargetRef::Creature(hero))
        .map(|set| set.len())
        .unwrap_or_default();
    assert_eq!(effects, 1);
}
