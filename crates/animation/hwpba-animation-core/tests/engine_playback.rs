use hwpba_animation_core::{
    parse_manifest_json, Config, CoreEvent, Engine, Inputs, LoopMode, Manifest, PlaybackState,
    PlayerCommand, PlayerId,
};

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

fn walker() -> Manifest {
    let json = hwpba_test_fixtures::manifests::json("walker").expect("walker fixture");
    parse_manifest_json(&json).expect("walker manifest parses")
}

fn setup() -> (Engine, PlayerId) {
    let mut eng = Engine::new(Config::default());
    let ch = eng.load_character(&walker()).unwrap();
    let p = eng.create_player("P", ch).unwrap();
    (eng, p)
}

fn play(player: PlayerId, clip: &str, mode: LoopMode) -> Inputs {
    Inputs::with(PlayerCommand::Play {
        player,
        clip: clip.into(),
        mode: Some(mode),
    })
}

fn body_y(eng: &mut Engine, player: PlayerId, dt: f32) -> f32 {
    let out = eng.update(dt, Inputs::none());
    out.pose_of(player, "Body").expect("Body pose").position[1]
}

/// it should interpolate positions and rotations inside a segment
#[test]
fn samples_mid_segment() {
    let (mut eng, p) = setup();
    let out = eng.update(0.5, play(p, "Walk", LoopMode::Loop));
    assert!(out
        .events
        .iter()
        .any(|e| matches!(e, CoreEvent::PlaybackStarted { clip, .. } if clip == "Walk")));

    let body = out.pose_of(p, "Body").unwrap();
    assert!(approx(body.position[1], 1.5));

    // Halfway between identity and 90 degrees about z is 45 degrees.
    let arm = out.pose_of(p, "Arm").unwrap();
    assert!(approx(arm.rotation[2], 0.382_683), "{:?}", arm.rotation);
    assert!(approx(arm.rotation[3], 0.923_880), "{:?}", arm.rotation);
    // Rotation-only track keeps its rest position.
    assert_eq!(arm.position, [0.5, 1.0, 0.0]);

    // Parts the clip does not animate are emitted at rest.
    let foot = out.pose_of(p, "Foot").unwrap();
    assert_eq!(foot.position, [0.0, 0.1, 0.0]);
    assert_eq!(foot.rotation, [0.0, 0.0, 0.0, 1.0]);
}

/// it should wrap looping clips and report the wrap
#[test]
fn loop_wraps_and_emits_looped() {
    let (mut eng, p) = setup();
    eng.update(0.0, play(p, "Walk", LoopMode::Loop));
    let out = eng.update(2.5, Inputs::none());
    assert!(out.events.iter().any(|e| matches!(e, CoreEvent::Looped { .. })));
    assert!(approx(out.pose_of(p, "Body").unwrap().position[1], 1.5));

    let snap = eng.player_state(p).unwrap();
    assert_eq!(snap.state, PlaybackState::Playing);
    assert!(approx(snap.time, 0.5));
    assert!(snap.clip_id.is_some());
}

/// it should clamp once clips at the end and emit PlaybackEnded exactly once
#[test]
fn once_clamps_and_ends_once() {
    let (mut eng, p) = setup();
    eng.update(0.0, play(p, "Walk", LoopMode::Once));
    let out = eng.update(3.0, Inputs::none());
    let ended = out
        .events
        .iter()
        .filter(|e| matches!(e, CoreEvent::PlaybackEnded { .. }))
        .count();
    assert_eq!(ended, 1);
    assert!(approx(out.pose_of(p, "Body").unwrap().position[1], 1.0));
    assert_eq!(eng.player_state(p).unwrap().state, PlaybackState::Finished);

    let out = eng.update(1.0, Inputs::none());
    assert!(out.events.is_empty());
    // The final pose is still held.
    assert!(approx(out.pose_of(p, "Body").unwrap().position[1], 1.0));
}

/// it should reflect time in ping-pong mode
#[test]
fn ping_pong_reflects_time() {
    let (mut eng, p) = setup();
    eng.update(0.0, play(p, "Walk", LoopMode::PingPong));
    // 3.0s into a 2s clip: forward to 2.0, back to 1.0.
    assert!(approx(body_y(&mut eng, p, 3.0), 2.0));
    assert!(approx(eng.player_state(p).unwrap().time, 1.0));
    assert!(approx(body_y(&mut eng, p, 0.5), 1.5));
}

/// it should honour negative speed by playing backwards
#[test]
fn negative_speed_plays_backwards() {
    let (mut eng, p) = setup();
    let inputs = Inputs {
        player_cmds: vec![
            PlayerCommand::SetSpeed { player: p, speed: -1.0 },
            PlayerCommand::Play {
                player: p,
                clip: "Walk".into(),
                mode: Some(LoopMode::Once),
            },
        ],
    };
    let out = eng.update(0.5, inputs);
    // Starts from the end (t = 2.0) and moves back to 1.5.
    assert!(approx(out.pose_of(p, "Body").unwrap().position[1], 1.5));
}

/// it should start a reversed loop on its last key without a spurious wrap
#[test]
fn reversed_loop_starts_at_the_end() {
    let (mut eng, p) = setup();
    let inputs = Inputs {
        player_cmds: vec![
            PlayerCommand::SetSpeed { player: p, speed: -1.0 },
            PlayerCommand::Play {
                player: p,
                clip: "Walk".into(),
                mode: Some(LoopMode::Loop),
            },
        ],
    };
    eng.update(0.0, inputs);
    assert!(approx(eng.player_state(p).unwrap().time, 2.0));

    let out = eng.update(0.5, Inputs::none());
    assert!(!out.events.iter().any(|e| matches!(e, CoreEvent::Looped { .. })));
    assert!(approx(eng.player_state(p).unwrap().time, 1.5));

    let out = eng.update(1.6, Inputs::none());
    assert!(out.events.iter().any(|e| matches!(e, CoreEvent::Looped { .. })));
    assert!(approx(eng.player_state(p).unwrap().time, 1.9));
}

/// it should not advance while paused and resume from the same time
#[test]
fn pause_and_resume() {
    let (mut eng, p) = setup();
    eng.update(0.25, play(p, "Walk", LoopMode::Loop));
    eng.update(0.0, Inputs::with(PlayerCommand::Pause { player: p }));
    assert!(approx(body_y(&mut eng, p, 1.0), 1.25));
    assert_eq!(eng.player_state(p).unwrap().state, PlaybackState::Paused);

    let out = eng.update(0.25, Inputs::with(PlayerCommand::Resume { player: p }));
    assert!(approx(out.pose_of(p, "Body").unwrap().position[1], 1.5));
}

/// it should jump on seek and report the old and new times
#[test]
fn seek_reports_time_change() {
    let (mut eng, p) = setup();
    eng.update(0.5, play(p, "Walk", LoopMode::Loop));
    let out = eng.update(0.0, Inputs::with(PlayerCommand::Seek { player: p, time: 1.5 }));
    let changed = out.events.iter().find_map(|e| match e {
        CoreEvent::TimeChanged {
            old_time, new_time, ..
        } => Some((*old_time, *new_time)),
        _ => None,
    });
    let (old, new) = changed.expect("TimeChanged event");
    assert!(approx(old, 0.5));
    assert!(approx(new, 1.5));
    assert!(approx(out.pose_of(p, "Body").unwrap().position[1], 1.5));
}

/// it should blend the outgoing and incoming clips during a cross-fade
#[test]
fn cross_fade_blends_then_finishes() {
    let (mut eng, p) = setup();
    eng.update(0.0, play(p, "Walk", LoopMode::Loop));

    let fade = Inputs::with(PlayerCommand::CrossFade {
        player: p,
        clip: "Idle".into(),
        duration: 1.0,
        mode: None,
    });
    let out = eng.update(0.5, fade);
    assert!(out
        .events
        .iter()
        .any(|e| matches!(e, CoreEvent::CrossFadeStarted { from, to, .. } if from == "Walk" && to == "Idle")));
    // Walk at 0.5 has Body y = 1.5, Idle holds y = 1.0; half way through the fade.
    assert!(approx(out.pose_of(p, "Body").unwrap().position[1], 1.25));
    let q = out.pose_of(p, "Arm").unwrap().rotation;
    let len = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
    assert!(approx(len, 1.0));
    assert!(eng.player_state(p).unwrap().fading);

    let out = eng.update(0.5, Inputs::none());
    assert!(out
        .events
        .iter()
        .any(|e| matches!(e, CoreEvent::CrossFadeFinished { clip, .. } if clip == "Idle")));
    assert!(approx(out.pose_of(p, "Body").unwrap().position[1], 1.0));
    assert!(!eng.player_state(p).unwrap().fading);
}

/// it should finish a cross-fade into a once clip that ends before the fade does
#[test]
fn cross_fade_into_short_once_clip_completes() {
    let (mut eng, p) = setup();
    eng.update(0.0, play(p, "Walk", LoopMode::Loop));

    let fade = Inputs::with(PlayerCommand::CrossFade {
        player: p,
        clip: "Idle".into(),
        duration: 1.0,
        mode: Some(LoopMode::Once),
    });
    let out = eng.update(0.5, fade);
    assert!(out
        .events
        .iter()
        .any(|e| matches!(e, CoreEvent::PlaybackEnded { clip, .. } if clip == "Idle")));
    assert!(approx(out.pose_of(p, "Body").unwrap().position[1], 1.25));
    assert_eq!(eng.player_state(p).unwrap().state, PlaybackState::Finished);

    let out = eng.update(0.5, Inputs::none());
    assert!(out
        .events
        .iter()
        .any(|e| matches!(e, CoreEvent::CrossFadeFinished { clip, .. } if clip == "Idle")));
    assert!(approx(out.pose_of(p, "Body").unwrap().position[1], 1.0));

    for _ in 0..8 {
        assert!(approx(body_y(&mut eng, p, 0.5), 1.0));
    }
    let snap = eng.player_state(p).unwrap();
    assert_eq!(snap.state, PlaybackState::Finished);
    assert!(!snap.fading);
}

/// it should ignore non-finite times instead of panicking
#[test]
fn non_finite_times_are_rejected() {
    let (mut eng, p) = setup();
    eng.update(0.5, play(p, "Walk", LoopMode::Loop));

    let out = eng.update(0.0, Inputs::with(PlayerCommand::Seek { player: p, time: f32::NAN }));
    assert!(out
        .events
        .iter()
        .any(|e| matches!(e, CoreEvent::Error { message } if message.contains("seek"))));
    assert!(approx(out.pose_of(p, "Body").unwrap().position[1], 1.5));

    assert!(approx(body_y(&mut eng, p, f32::NAN), 1.5));
    assert!(approx(eng.player_state(p).unwrap().time, 0.5));

    let ch = eng.player(p).unwrap().character;
    let pose = eng.pose_at(ch, "Walk", f32::NAN, LoopMode::Once).unwrap();
    let body = pose.iter().find(|(part, _)| part == "Body").unwrap();
    assert!(approx(body.1.position[1], 1.0));
}

/// it should return every part to rest once on stop
#[test]
fn stop_emits_rest_pose_once() {
    let (mut eng, p) = setup();
    eng.update(0.5, play(p, "Walk", LoopMode::Loop));
    let out = eng.update(0.5, Inputs::with(PlayerCommand::Stop { player: p }));
    assert!(out
        .events
        .iter()
        .any(|e| matches!(e, CoreEvent::PlaybackStopped { .. })));
    assert_eq!(out.changes.len(), 3);
    assert_eq!(out.pose_of(p, "Body").unwrap().position, [0.0, 1.0, 0.0]);
    assert_eq!(out.pose_of(p, "Arm").unwrap().rotation, [0.0, 0.0, 0.0, 1.0]);

    let out = eng.update(0.5, Inputs::none());
    assert!(out.is_empty());
    assert_eq!(eng.player_state(p).unwrap().state, PlaybackState::Idle);
}

/// it should report unknown clips and players as error events
#[test]
fn unknown_targets_become_error_events() {
    let (mut eng, p) = setup();
    let out = eng.update(0.1, play(p, "Run", LoopMode::Loop));
    assert!(out
        .events
        .iter()
        .any(|e| matches!(e, CoreEvent::Error { message } if message.contains("Run"))));
    assert!(out.changes.is_empty());

    let out = eng.update(0.1, Inputs::with(PlayerCommand::Pause { player: PlayerId(99) }));
    assert!(out
        .events
        .iter()
        .any(|e| matches!(e, CoreEvent::Error { message } if message.contains("99"))));
}

/// it should refuse players for characters that were never loaded
#[test]
fn create_player_requires_character() {
    let mut eng = Engine::new(Config::default());
    let err = eng
        .create_player("P", hwpba_animation_core::CharacterId(5))
        .unwrap_err();
    assert!(err.to_string().contains("character not found"));
}

/// it should sample a clip statelessly for tooling
#[test]
fn pose_at_is_stateless() {
    let mut eng = Engine::new(Config::default());
    let ch = eng.load_character(&walker()).unwrap();
    let pose = eng.pose_at(ch, "Walk", 2.5, LoopMode::Loop).unwrap();
    let body = pose.iter().find(|(p, _)| p == "Body").unwrap();
    assert!(approx(body.1.position[1], 1.5));
    assert!(eng.pose_at(ch, "Run", 0.0, LoopMode::Once).is_err());
}
