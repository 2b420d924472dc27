//! Input contracts for the core engine.
//!
//! Per-player commands, applied in order at the start of `Engine::update()`.

use serde::{Deserialize, Serialize};

use crate::ids::PlayerId;

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Inputs {
    #[serde(default)]
    pub player_cmds: Vec<PlayerCommand>,
}

impl Inputs {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with(cmd: PlayerCommand) -> Self {
        Self {
            player_cmds: vec![cmd],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum PlayerCommand {
    /// Start `clip` from its beginning, replacing whatever was playing.
    Play {
        player: PlayerId,
        clip: String,
        #[serde(default)]
        mode: Option<LoopMode>,
    },
    /// Blend from the current clip into `clip` over `duration` seconds.
    CrossFade {
        player: PlayerId,
        clip: String,
        duration: f32,
        #[serde(default)]
        mode: Option<LoopMode>,
    },
    Pause {
        player: PlayerId,
    },
    Resume {
        player: PlayerId,
    },
    /// Stop playback and return every part to its rest pose.
    Stop {
        player: PlayerId,
    },
    Seek {
        player: PlayerId,
        time: f32,
    },
    SetSpeed {
        player: PlayerId,
        speed: f32,
    },
    SetLoopMode {
        player: PlayerId,
        mode: LoopMode,
    },
}

impl PlayerCommand {
    pub fn player(&self) -> PlayerId {
        match self {
            PlayerCommand::Play { player, .. }
            | PlayerCommand::CrossFade { player, .. }
            | PlayerCommand::Pause { player }
            | PlayerCommand::Resume { player }
            | PlayerCommand::Stop { player }
            | PlayerCommand::Seek { player, .. }
            | PlayerCommand::SetSpeed { player, .. }
            | PlayerCommand::SetLoopMode { player, .. } => *player,
        }
    }
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum LoopMode {
    Once,
    Loop,
    PingPong,
}

impl std::str::FromStr for LoopMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "once" => Ok(LoopMode::Once),
            "loop" => Ok(LoopMode::Loop),
            "pingpong" | "ping-pong" | "ping_pong" => Ok(LoopMode::PingPong),
            other => Err(format!("unknown loop mode '{other}' (once|loop|pingpong)")),
        }
    }
}
