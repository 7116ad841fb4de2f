use pacing_core::emergence::MomentType;
use pacing_core::memory::MemoryType;
use pacing_core::session::MemoryNote;
use pacing_core::{
    EngineConfig, Genre, OrchestratorAction, SessionRegistry, SessionSnapshot, TurnInput, TurnInterpretation,
};
use story_state::{CharacterId, Scene, StoryCharacter, StoryTime, TimeOfDay, Weather};

const CONFIG: &str = r#"
genre = "horror"

[orchestrator.cooldowns]
reveal_thread = 6
"#;

fn manor() -> Scene {
    Scene::new("Blackwood Manor")
        .with_time(TimeOfDay::Night)
        .with_weather(Weather::Stormy)
}

fn at(turn: u64) -> StoryTime {
    StoryTime::at_minutes(turn, turn * 3)
}

/// Four committed turns: arrivals, a frightening beat with a shared promise,
/// then two silent turns.
fn play_opening(registry: &mut SessionRegistry) -> story_state::SessionId {
    let id = registry.create(manor(), None);

    let first = registry
        .process_turn(
            id,
            TurnInput::new("Hello? Is anyone here?", at(1))
                .arriving(StoryCharacter::new("Mira"))
                .arriving(StoryCharacter::new("Tom")),
        )
        .unwrap();
    assert!(first
        .moments
        .iter()
        .any(|m| m.moment == MomentType::FirstImpression));
    assert!(first
        .ranked
        .iter()
        .any(|r| r.action == OrchestratorAction::IncreaseTension));
    registry.commit(first.next);

    let scare = TurnInterpretation::new("Something scratches inside the walls.")
        .with_tone("dread", 6)
        .with_event("threat-introduced")
        .with_memory(MemoryNote {
            characters: vec!["Mira".into(), "Tom".into()],
            memory_type: MemoryType::Promise,
            content: "promised not to split up".into(),
            topics: vec!["walls".into()],
            ..MemoryNote::default()
        });
    let second = registry
        .process_turn(id, TurnInput::new("Stay close", at(2)).with_interpretation(scare))
        .unwrap();
    registry.commit(second.next);

    for turn in 3..=4 {
        let quiet = registry.process_turn(id, TurnInput::new("", at(turn))).unwrap();
        registry.commit(quiet.next);
    }
    id
}

#[test]
fn test_story_session_end_to_end() {
    let config = EngineConfig::from_toml_str(CONFIG).unwrap();
    assert_eq!(config.genre, Genre::Horror);
    assert_eq!(config.orchestrator.cooldowns.reveal_thread, 6);

    let mut registry = SessionRegistry::new(config);
    let id = play_opening(&mut registry);
    let session = registry.get(id).unwrap();

    assert_eq!(session.state.current_turn(), 4);
    assert_eq!(session.state.present_characters.len(), 2);
    assert_eq!(session.tension.genre(), Genre::Horror);
    assert_eq!(session.tension.tension(), 35);
    assert_eq!(session.state.tension(), 35);
    assert_eq!(session.emotion.catharsis_debt(), 12);
    assert_eq!(session.memory.shared_memories().len(), 1);
    assert_eq!(session.memory.memory_count(&CharacterId::new("mira")), 1);
    assert_eq!(session.reader_silent_turns(), 2);
    // Two reader lines and one narrator line; silent turns add nothing.
    assert_eq!(session.state.conversation.len(), 3);
    assert!(session.last_recommendation().is_some());
}

#[test]
fn test_restored_session_recommends_the_same() {
    let config = EngineConfig::from_toml_str(CONFIG).unwrap();
    let mut registry = SessionRegistry::new(config.clone());
    let id = play_opening(&mut registry);

    let json = registry.snapshot(id).unwrap().to_json().unwrap();
    let mut elsewhere = SessionRegistry::new(config);
    let restored_id = elsewhere.restore(&SessionSnapshot::from_json(&json).unwrap(), None);
    assert_eq!(restored_id, id);

    let input = TurnInput::new("Did you hear that?", at(5)).surprised();
    let original = registry.process_turn(id, input.clone()).unwrap();
    let restored = elsewhere.process_turn(id, input).unwrap();

    assert_eq!(original.recommendation, restored.recommendation);
    assert_eq!(original.ranked, restored.ranked);
    assert_eq!(original.bundle, restored.bundle);
}

#[test]
fn test_corrupt_blobs_reset_only_their_tracker() {
    let mut registry = SessionRegistry::new(EngineConfig::from_toml_str(CONFIG).unwrap());
    let id = play_opening(&mut registry);

    let mut snapshot = registry.snapshot(id).unwrap();
    snapshot.emotion = Some(serde_json::json!("not an emotion tracker"));
    snapshot.tension = Some(serde_json::json!({ "tension": "very high" }));
    snapshot.threads = None;

    let restored = snapshot.restore(registry.config().clone(), None);
    assert_eq!(restored.id(), id);
    assert_eq!(restored.emotion.catharsis_debt(), 0);
    // A fresh tension tracker picks its level up from the adventure state.
    assert_eq!(restored.tension.tension(), 35);
    assert_eq!(restored.tension.genre(), Genre::Horror);
    assert_eq!(restored.memory.shared_memories().len(), 1);
    assert_eq!(restored.reader_silent_turns(), 2);

    let outcome = restored.process_turn(TurnInput::new("Let's go", at(5)));
    assert_eq!(outcome.next.state.current_turn(), 5);
}
