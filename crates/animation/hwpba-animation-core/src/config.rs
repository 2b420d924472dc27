//! Runtime configuration.

use serde::{Deserialize, Serialize};

use crate::inputs::LoopMode;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Loop mode used by `Play`/`CrossFade` when the command does not carry one.
    pub default_loop_mode: LoopMode,
    /// Cross-fade length used by hosts that do not specify one (seconds).
    pub default_cross_fade: f32,
    /// Move collider siblings together with their part.
    pub colliders_follow_parts: bool,
    /// Events beyond this count are dropped for the tick.
    pub max_events_per_tick: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_loop_mode: LoopMode::Loop,
            default_cross_fade: 0.25,
            colliders_follow_parts: true,
            max_events_per_tick: 1024,
        }
    }
}
