//! Animated component lifecycle.
//!
//! Behaviours that drive a character share an `AnimatedBase`. The base needs
//! the scene to bind parts, so it initialises in `pre_start` rather than at
//! construction. Implementors put their own setup in `on_pre_start`, which the
//! provided `pre_start` calls after the base is ready. Implementors that
//! override `pre_start` itself must call `AnimatedBase::init` first.

use hwpba_manifest::Manifest;
use log::debug;

use crate::config::Config;
use crate::engine::{Engine, PlayerSnapshot};
use crate::error::AnimationError;
use crate::ids::{CharacterId, PlayerId};
use crate::inputs::{Inputs, LoopMode, PlayerCommand};
use crate::outputs::CoreEvent;
use crate::scaling::ScalingBase;
use crate::scene::{EntityId, SceneGraph, SceneResolver};

#[derive(Debug)]
struct Running {
    engine: Engine,
    character: CharacterId,
    player: PlayerId,
    root: EntityId,
}

#[derive(Debug)]
pub struct AnimatedBase {
    manifest: Manifest,
    cfg: Config,
    scaling: Option<(EntityId, ScalingBase)>,
    running: Option<Running>,
    pending: Inputs,
    events: Vec<CoreEvent>,
}

impl AnimatedBase {
    pub fn new(manifest: Manifest, cfg: Config) -> Self {
        Self {
            manifest,
            cfg,
            scaling: None,
            running: None,
            pending: Inputs::none(),
            events: Vec::new(),
        }
    }

    /// Parent the character under a scaling entity; applied during `init`.
    pub fn with_scaling(mut self, base: EntityId, scaling: ScalingBase) -> Self {
        self.scaling = Some((base, scaling));
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.running.is_some()
    }

    /// Load the manifest, create the player and bind parts under `root`.
    pub fn init(&mut self, scene: &mut SceneGraph, root: EntityId) -> Result<(), AnimationError> {
        if scene.get(root).is_none() {
            return Err(AnimationError::EntityNotFound { id: root.0 });
        }
        let mut engine = Engine::new(self.cfg.clone());
        let character = engine.load_character(&self.manifest)?;
        let player = engine.create_player("component", character)?;
        engine.prebind(&mut SceneResolver {
            scene: &*scene,
            root,
        });

        if let Some((base, scaling)) = self.scaling.as_mut() {
            if let Some(ch) = engine.character(character) {
                scaling.ground_to(ch);
            }
            scaling.apply(scene, *base, root)?;
        }

        debug!("animated component initialised on entity {}", root.0);
        self.running = Some(Running {
            engine,
            character,
            player,
            root,
        });
        Ok(())
    }

    fn running(&self) -> Result<&Running, AnimationError> {
        self.running.as_ref().ok_or(AnimationError::NotInitialized)
    }

    fn queue(&mut self, cmd: impl FnOnce(PlayerId) -> PlayerCommand) -> Result<(), AnimationError> {
        let player = self.running()?.player;
        self.pending.player_cmds.push(cmd(player));
        Ok(())
    }

    pub fn play(&mut self, clip: &str, mode: Option<LoopMode>) -> Result<(), AnimationError> {
        self.queue(|player| PlayerCommand::Play {
            player,
            clip: clip.to_string(),
            mode,
        })
    }

    /// Cross-fade into `clip`; `None` uses the configured default duration.
    pub fn cross_fade(&mut self, clip: &str, duration: Option<f32>) -> Result<(), AnimationError> {
        let duration = duration.unwrap_or(self.cfg.default_cross_fade);
        self.queue(|player| PlayerCommand::CrossFade {
            player,
            clip: clip.to_string(),
            duration,
            mode: None,
        })
    }

    pub fn stop(&mut self) -> Result<(), AnimationError> {
        self.queue(|player| PlayerCommand::Stop { player })
    }

    pub fn command(&mut self, cmd: PlayerCommand) -> Result<(), AnimationError> {
        self.running()?;
        self.pending.player_cmds.push(cmd);
        Ok(())
    }

    /// Step the engine and write poses into `scene`. Returns entities touched.
    pub fn tick(&mut self, scene: &mut SceneGraph, dt: f32) -> Result<usize, AnimationError> {
        let running = self
            .running
            .as_mut()
            .ok_or(AnimationError::NotInitialized)?;
        let inputs = std::mem::take(&mut self.pending);
        let follow = running.engine.config().colliders_follow_parts;
        let out = running.engine.update(dt, inputs);
        self.events = out.events.clone();
        Ok(scene.apply(out, follow))
    }

    /// Events emitted by the most recent tick.
    pub fn events(&self) -> &[CoreEvent] {
        &self.events
    }

    pub fn state(&self) -> Result<PlayerSnapshot, AnimationError> {
        let running = self.running()?;
        running
            .engine
            .player_state(running.player)
            .ok_or(AnimationError::PlayerNotFound {
                id: running.player.0,
            })
    }

    pub fn root(&self) -> Option<EntityId> {
        self.running.as_ref().map(|r| r.root)
    }

    pub fn character(&self) -> Option<CharacterId> {
        self.running.as_ref().map(|r| r.character)
    }
}

pub trait AnimatedComponent {
    fn base(&self) -> &AnimatedBase;
    fn base_mut(&mut self) -> &mut AnimatedBase;

    /// Initialise the base, then run the implementor's hook.
    fn pre_start(&mut self, scene: &mut SceneGraph, root: EntityId) -> Result<(), AnimationError> {
        self.base_mut().init(scene, root)?;
        self.on_pre_start(scene)
    }

    fn on_pre_start(&mut self, _scene: &mut SceneGraph) -> Result<(), AnimationError> {
        Ok(())
    }

    fn update(&mut self, scene: &mut SceneGraph, dt: f32) -> Result<usize, AnimationError> {
        self.base_mut().tick(scene, dt)
    }
}
