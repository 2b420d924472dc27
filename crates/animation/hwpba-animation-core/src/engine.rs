//! Engine: character/clip ownership, player state machine and per-tick output.
//!
//! Methods:
//! - new, load_character, create_player, prebind (resolver), update (commands → advance → sample → blend)

use hwpba_manifest::Manifest;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::accumulate::Accumulator;
use crate::binding::{resolve_part, BindingTable, PartResolver};
use crate::clip::Clip;
use crate::config::Config;
use crate::error::AnimationError;
use crate::ids::{CharacterId, ClipId, IdAllocator, PlayerId};
use crate::inputs::{Inputs, LoopMode, PlayerCommand};
use crate::outputs::{Change, CoreEvent, Outputs, PartPose};
use crate::sampling::sample_clip;

/// A loaded manifest: compiled clips plus each part's rest pose.
#[derive(Debug)]
pub struct Character {
    pub id: CharacterId,
    pub name_prefix: String,
    pub clips: Vec<Clip>,
    /// Rest pose of every part, in manifest order.
    pub rest: IndexMap<String, PartPose>,
}

impl Character {
    pub fn clip_index(&self, name: &str) -> Option<usize> {
        self.clips.iter().position(|c| c.name == name)
    }

    pub fn clip(&self, name: &str) -> Option<&Clip> {
        self.clips.iter().find(|c| c.name == name)
    }

    pub fn parts(&self) -> impl Iterator<Item = &str> {
        self.rest.keys().map(String::as_str)
    }

    pub fn rest_pose(&self, part: &str) -> PartPose {
        self.rest.get(part).copied().unwrap_or_default()
    }

    /// Full-body pose at local time `t` of clip `idx`; parts the clip does not
    /// animate stay at rest.
    fn pose(&self, idx: usize, t: f32) -> IndexMap<String, PartPose> {
        let mut out = self.rest.clone();
        if let Some(clip) = self.clips.get(idx) {
            for (part, pose) in sample_clip(clip, t, |p| self.rest_pose(p)) {
                out.insert(part.to_string(), pose);
            }
        }
        out
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    /// A `Once` clip reached its end and holds the final pose.
    Finished,
}

#[derive(Clone, Debug)]
struct ActiveClip {
    clip: usize,
    mode: LoopMode,
    /// Raw clip time; mapped into [0, duration] by the loop mode.
    time: f32,
    ended: bool,
}

#[derive(Clone, Debug)]
struct Fade {
    from: ActiveClip,
    elapsed: f32,
    duration: f32,
}

/// Per-character playback controller.
#[derive(Debug)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub character: CharacterId,
    pub speed: f32,
    pub state: PlaybackState,
    active: Option<ActiveClip>,
    fade: Option<Fade>,
    rest_pending: bool,
}

impl Player {
    fn new(id: PlayerId, name: String, character: CharacterId) -> Self {
        Self {
            id,
            name,
            character,
            speed: 1.0,
            state: PlaybackState::Idle,
            active: None,
            fade: None,
            rest_pending: false,
        }
    }
}

/// Read-only view of a player for hosts and tooling.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub state: PlaybackState,
    pub clip: Option<String>,
    pub clip_id: Option<ClipId>,
    pub mode: Option<LoopMode>,
    /// Local clip time in seconds.
    pub time: f32,
    pub duration: f32,
    pub speed: f32,
    pub fading: bool,
}

fn fmod(a: f32, b: f32) -> f32 {
    if b == 0.0 {
        return 0.0;
    }
    let m = a % b;
    if m < 0.0 {
        m + b
    } else {
        m
    }
}

/// Reflect t into [0, span] with ping-pong behavior.
fn ping_pong(t: f32, span: f32) -> f32 {
    if span <= 0.0 {
        return 0.0;
    }
    let m = fmod(t, 2.0 * span);
    if m <= span {
        m
    } else {
        2.0 * span - m
    }
}

fn local_time(raw: f32, duration: f32, mode: LoopMode) -> f32 {
    if duration <= 0.0 {
        return 0.0;
    }
    match mode {
        LoopMode::Once => raw.clamp(0.0, duration),
        // A reversed loop starts on its end key before the first wrap.
        LoopMode::Loop if raw == duration => duration,
        LoopMode::Loop => fmod(raw, duration),
        LoopMode::PingPong => ping_pong(raw, duration),
    }
}

/// Whether moving from `from` by `delta` crosses a multiple of `span`. Leaving
/// a boundary does not count; arriving on one does.
fn crosses_boundary(from: f32, delta: f32, span: f32) -> bool {
    let (a, b) = (from / span, (from + delta) / span);
    if delta >= 0.0 {
        a.floor() != b.floor()
    } else {
        a.ceil() != b.ceil()
    }
}

enum Boundary {
    None,
    Ended,
    Wrapped,
}

/// Advance raw clip time by `delta` (already speed-scaled).
fn advance(active: &mut ActiveClip, delta: f32, duration: f32) -> Boundary {
    if delta == 0.0 {
        return Boundary::None;
    }
    let next = active.time + delta;
    match active.mode {
        LoopMode::Once => {
            active.time = next.clamp(0.0, duration.max(0.0));
            let hit_end = (delta > 0.0 && next >= duration) || (delta < 0.0 && next <= 0.0);
            if hit_end && !active.ended {
                active.ended = true;
                Boundary::Ended
            } else {
                Boundary::None
            }
        }
        LoopMode::Loop => {
            if duration <= 0.0 {
                active.time = 0.0;
                return Boundary::None;
            }
            let wrapped = crosses_boundary(active.time, delta, duration);
            active.time = fmod(next, duration);
            if wrapped {
                Boundary::Wrapped
            } else {
                Boundary::None
            }
        }
        LoopMode::PingPong => {
            if duration <= 0.0 {
                active.time = 0.0;
                return Boundary::None;
            }
            let bounced = crosses_boundary(active.time, delta, duration);
            active.time = fmod(next, 2.0 * duration);
            if bounced {
                Boundary::Wrapped
            } else {
                Boundary::None
            }
        }
    }
}

/// Engine (core); host handles are opaque `PartHandle`s.
#[derive(Debug)]
pub struct Engine {
    cfg: Config,
    ids: IdAllocator,
    characters: Vec<Character>,
    players: Vec<Player>,
    binds: BindingTable,
    outputs: Outputs,
}

impl Engine {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            ids: IdAllocator::new(),
            characters: Vec::new(),
            players: Vec::new(),
            binds: BindingTable::new(),
            outputs: Outputs::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Validate and load a manifest as a character.
    pub fn load_character(&mut self, manifest: &Manifest) -> Result<CharacterId, AnimationError> {
        manifest.validate()?;
        let id = self.ids.alloc_character();

        let mut rest = IndexMap::new();
        for part in manifest.part_names() {
            let pose = match manifest.initial_positions.get(&part) {
                Some(p) => PartPose::at(*p),
                None => {
                    warn!("part '{part}' has no initial position; resting at origin");
                    PartPose::default()
                }
            };
            rest.insert(part, pose);
        }

        let clips = manifest
            .animations
            .iter()
            .map(|(name, entry)| {
                let mut clip = Clip::from_manifest(name, entry);
                clip.id = Some(self.ids.alloc_clip());
                clip
            })
            .collect::<Vec<_>>();

        debug!(
            "loaded character {:?}: {} clip(s), {} part(s)",
            id,
            clips.len(),
            rest.len()
        );
        self.characters.push(Character {
            id,
            name_prefix: manifest.name_prefix.clone(),
            clips,
            rest,
        });
        Ok(id)
    }

    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    pub fn create_player(
        &mut self,
        name: &str,
        character: CharacterId,
    ) -> Result<PlayerId, AnimationError> {
        if self.character(character).is_none() {
            return Err(AnimationError::CharacterNotFound { id: character.0 });
        }
        let pid = self.ids.alloc_player();
        self.players
            .push(Player::new(pid, name.to_string(), character));
        Ok(pid)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_state(&self, id: PlayerId) -> Option<PlayerSnapshot> {
        let p = self.player(id)?;
        let ch = self.character(p.character)?;
        let clip = p.active.as_ref().and_then(|a| ch.clips.get(a.clip));
        let duration = clip.map(Clip::duration).unwrap_or(0.0);
        Some(PlayerSnapshot {
            id: p.id,
            name: p.name.clone(),
            state: p.state,
            clip: clip.map(|c| c.name.clone()),
            clip_id: clip.and_then(|c| c.id),
            mode: p.active.as_ref().map(|a| a.mode),
            time: p
                .active
                .as_ref()
                .map(|a| local_time(a.time, duration, a.mode))
                .unwrap_or(0.0),
            duration,
            speed: p.speed,
            fading: p.fade.is_some(),
        })
    }

    /// One-time binding of every character's parts against a host resolver.
    pub fn prebind(&mut self, resolver: &mut dyn PartResolver) {
        for ch in &self.characters {
            self.binds.clear_character(ch.id);
            for part in ch.rest.keys() {
                match resolve_part(resolver, &ch.name_prefix, part) {
                    Some(handle) => self.binds.upsert(ch.id, part, handle),
                    None => warn!(
                        "part '{part}' (prefix '{}') not found on host; it will not move",
                        ch.name_prefix
                    ),
                }
            }
        }
    }

    /// Stateless pose of `clip` at local `time` under `mode`.
    pub fn pose_at(
        &self,
        character: CharacterId,
        clip: &str,
        time: f32,
        mode: LoopMode,
    ) -> Result<Vec<(String, PartPose)>, AnimationError> {
        let ch = self
            .character(character)
            .ok_or(AnimationError::CharacterNotFound { id: character.0 })?;
        let idx = ch
            .clip_index(clip)
            .ok_or_else(|| AnimationError::ClipNotFound {
                name: clip.to_string(),
            })?;
        let t = local_time(time, ch.clips[idx].duration(), mode);
        Ok(ch.pose(idx, t).into_iter().collect())
    }

    fn apply_command(&mut self, cmd: PlayerCommand) {
        let pid = cmd.player();
        let Some(p) = self.players.iter_mut().find(|p| p.id == pid) else {
            warn!("command for unknown player {pid:?} ignored");
            self.outputs.push_event(CoreEvent::Error {
                message: format!("player not found: {}", pid.0),
            });
            return;
        };
        let Some(ch) = self.characters.iter().find(|c| c.id == p.character) else {
            return;
        };

        match cmd {
            PlayerCommand::Play { clip, mode, .. } => {
                let Some(idx) = ch.clip_index(&clip) else {
                    warn!("player {pid:?}: clip '{clip}' not found");
                    self.outputs.push_event(CoreEvent::Error {
                        message: format!("clip not found: {clip}"),
                    });
                    return;
                };
                let duration = ch.clips[idx].duration();
                p.active = Some(ActiveClip {
                    clip: idx,
                    mode: mode.unwrap_or(self.cfg.default_loop_mode),
                    time: if p.speed < 0.0 { duration } else { 0.0 },
                    ended: false,
                });
                p.fade = None;
                p.state = PlaybackState::Playing;
                self.outputs
                    .push_event(CoreEvent::PlaybackStarted { player: pid, clip });
            }
            PlayerCommand::CrossFade {
                clip,
                duration,
                mode,
                ..
            } => {
                let Some(idx) = ch.clip_index(&clip) else {
                    warn!("player {pid:?}: clip '{clip}' not found");
                    self.outputs.push_event(CoreEvent::Error {
                        message: format!("clip not found: {clip}"),
                    });
                    return;
                };
                let from = p.active.take();
                let to_duration = ch.clips[idx].duration();
                p.active = Some(ActiveClip {
                    clip: idx,
                    mode: mode.unwrap_or(self.cfg.default_loop_mode),
                    time: if p.speed < 0.0 { to_duration } else { 0.0 },
                    ended: false,
                });
                p.state = PlaybackState::Playing;
                match from {
                    Some(from) if duration > 0.0 => {
                        let from_name = ch.clips[from.clip].name.clone();
                        p.fade = Some(Fade {
                            from,
                            elapsed: 0.0,
                            duration,
                        });
                        self.outputs.push_event(CoreEvent::CrossFadeStarted {
                            player: pid,
                            from: from_name,
                            to: clip,
                            duration,
                        });
                    }
                    _ => {
                        p.fade = None;
                        self.outputs
                            .push_event(CoreEvent::PlaybackStarted { player: pid, clip });
                    }
                }
            }
            PlayerCommand::Pause { .. } => {
                if p.state == PlaybackState::Playing {
                    p.state = PlaybackState::Paused;
                    self.outputs
                        .push_event(CoreEvent::PlaybackPaused { player: pid });
                }
            }
            PlayerCommand::Resume { .. } => {
                if p.state == PlaybackState::Paused {
                    p.state = PlaybackState::Playing;
                    self.outputs
                        .push_event(CoreEvent::PlaybackResumed { player: pid });
                }
            }
            PlayerCommand::Stop { .. } => {
                p.active = None;
                p.fade = None;
                p.state = PlaybackState::Idle;
                p.rest_pending = true;
                self.outputs
                    .push_event(CoreEvent::PlaybackStopped { player: pid });
            }
            PlayerCommand::Seek { time, .. } => {
                if !time.is_finite() {
                    warn!("player {pid:?}: ignoring seek to non-finite time {time}");
                    self.outputs.push_event(CoreEvent::Error {
                        message: format!("invalid seek time: {time}"),
                    });
                    return;
                }
                if let Some(a) = p.active.as_mut() {
                    let duration = ch.clips[a.clip].duration();
                    let old_time = local_time(a.time, duration, a.mode);
                    a.time = match a.mode {
                        LoopMode::Once => time.clamp(0.0, duration),
                        LoopMode::Loop => fmod(time, duration),
                        LoopMode::PingPong => fmod(time, 2.0 * duration),
                    };
                    a.ended = false;
                    if p.state == PlaybackState::Finished {
                        p.state = PlaybackState::Paused;
                    }
                    self.outputs.push_event(CoreEvent::TimeChanged {
                        player: pid,
                        old_time,
                        new_time: local_time(a.time, duration, a.mode),
                    });
                }
            }
            PlayerCommand::SetSpeed { speed, .. } => {
                p.speed = if speed.is_finite() { speed } else { 0.0 };
            }
            PlayerCommand::SetLoopMode { mode, .. } => {
                if let Some(a) = p.active.as_mut() {
                    let duration = ch.clips[a.clip].duration();
                    a.time = local_time(a.time, duration, a.mode);
                    a.mode = mode;
                    a.ended = false;
                }
                if p.state == PlaybackState::Finished && mode != LoopMode::Once {
                    p.state = PlaybackState::Playing;
                }
            }
        }
    }

    /// Step by `dt` seconds with the given inputs, producing outputs.
    /// A non-finite `dt` is treated as zero.
    pub fn update(&mut self, dt: f32, inputs: Inputs) -> &Outputs {
        self.outputs.clear();
        let dt = if dt.is_finite() {
            dt
        } else {
            warn!("non-finite dt {dt}; treating as 0");
            0.0
        };

        // 1) Apply player commands in order
        for cmd in inputs.player_cmds {
            self.apply_command(cmd);
        }

        // 2) Advance playing players; a fade keeps running after a Once clip ends
        for p in &mut self.players {
            let playing = p.state == PlaybackState::Playing;
            let fading = p.fade.is_some()
                && matches!(p.state, PlaybackState::Playing | PlaybackState::Finished);
            if !playing && !fading {
                continue;
            }
            let Some(ch) = self.characters.iter().find(|c| c.id == p.character) else {
                continue;
            };
            let delta = dt * p.speed;

            if let Some(a) = p.active.as_mut().filter(|_| playing) {
                let clip = &ch.clips[a.clip];
                match advance(a, delta, clip.duration()) {
                    Boundary::Ended => {
                        p.state = PlaybackState::Finished;
                        self.outputs.push_event(CoreEvent::PlaybackEnded {
                            player: p.id,
                            clip: clip.name.clone(),
                        });
                    }
                    Boundary::Wrapped => self.outputs.push_event(CoreEvent::Looped {
                        player: p.id,
                        clip: clip.name.clone(),
                    }),
                    Boundary::None => {}
                }
            }

            if let Some(fade) = p.fade.as_mut().filter(|_| fading) {
                fade.elapsed += dt.abs();
                let from_duration = ch.clips[fade.from.clip].duration();
                advance(&mut fade.from, delta, from_duration);
                if fade.elapsed >= fade.duration {
                    p.fade = None;
                    if let Some(a) = p.active.as_ref() {
                        self.outputs.push_event(CoreEvent::CrossFadeFinished {
                            player: p.id,
                            clip: ch.clips[a.clip].name.clone(),
                        });
                    }
                }
            }
        }

        // 3) Sample → blend → emit changes
        for p in &mut self.players {
            let Some(ch) = self.characters.iter().find(|c| c.id == p.character) else {
                continue;
            };

            let poses: Vec<(String, PartPose)> = match (&p.active, &p.fade) {
                (Some(a), None) => {
                    let t = local_time(a.time, ch.clips[a.clip].duration(), a.mode);
                    ch.pose(a.clip, t).into_iter().collect()
                }
                (Some(a), Some(f)) => {
                    let w = (f.elapsed / f.duration.max(f32::EPSILON)).clamp(0.0, 1.0);
                    let to_t = local_time(a.time, ch.clips[a.clip].duration(), a.mode);
                    let from_t = local_time(
                        f.from.time,
                        ch.clips[f.from.clip].duration(),
                        f.from.mode,
                    );
                    let mut accum = Accumulator::new();
                    for (part, pose) in ch.pose(f.from.clip, from_t) {
                        accum.add(&part, &pose, 1.0 - w);
                    }
                    for (part, pose) in ch.pose(a.clip, to_t) {
                        accum.add(&part, &pose, w);
                    }
                    accum.finalize()
                }
                (None, _) if p.rest_pending => {
                    p.rest_pending = false;
                    ch.rest.iter().map(|(k, v)| (k.clone(), *v)).collect()
                }
                (None, _) => continue,
            };

            for (part, pose) in poses {
                let handle = self.binds.get(ch.id, &part);
                self.outputs.push_change(Change {
                    player: p.id,
                    part,
                    handle,
                    pose,
                });
            }
        }

        if self.outputs.events.len() > self.cfg.max_events_per_tick {
            warn!(
                "dropping {} event(s) over the per-tick limit",
                self.outputs.events.len() - self.cfg.max_events_per_tick
            );
            self.outputs.events.truncate(self.cfg.max_events_per_tick);
        }

        &self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_pong_reflects() {
        assert_eq!(ping_pong(0.5, 1.0), 0.5);
        assert_eq!(ping_pong(1.5, 1.0), 0.5);
        assert_eq!(ping_pong(2.25, 1.0), 0.25);
        assert_eq!(ping_pong(1.0, 0.0), 0.0);
    }

    #[test]
    fn loop_wrap_is_detected() {
        let mut a = ActiveClip {
            clip: 0,
            mode: LoopMode::Loop,
            time: 0.75,
            ended: false,
        };
        assert!(matches!(advance(&mut a, 0.5, 1.0), Boundary::Wrapped));
        assert!((a.time - 0.25).abs() < 1e-6);
        assert!(matches!(advance(&mut a, 0.5, 1.0), Boundary::None));
    }

    #[test]
    fn once_ends_only_once() {
        let mut a = ActiveClip {
            clip: 0,
            mode: LoopMode::Once,
            time: 0.0,
            ended: false,
        };
        assert!(matches!(advance(&mut a, 2.0, 1.0), Boundary::Ended));
        assert_eq!(a.time, 1.0);
        assert!(matches!(advance(&mut a, 2.0, 1.0), Boundary::None));
    }

    #[test]
    fn reversed_loop_starts_on_end_without_wrapping() {
        let mut a = ActiveClip {
            clip: 0,
            mode: LoopMode::Loop,
            time: 2.0,
            ended: false,
        };
        assert_eq!(local_time(a.time, 2.0, LoopMode::Loop), 2.0);
        assert!(matches!(advance(&mut a, -0.5, 2.0), Boundary::None));
        assert!((a.time - 1.5).abs() < 1e-6);
        assert!(matches!(advance(&mut a, -1.6, 2.0), Boundary::Wrapped));
        assert!((a.time - 1.9).abs() < 1e-5);
    }
}
