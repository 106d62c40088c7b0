//! Core configuration for vizij-timing-core.

use serde::{Deserialize, Serialize};

use crate::error::TimingError;

/// Configuration for engine sizing and timing defaults.
/// Keep this minimal; missing fields in a document fall back to defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initial capacity of the timeline walker's node/index stacks.
    pub walker_stack_capacity: usize,

    /// Natural duration (seconds) of an animation whose duration is `Automatic`.
    pub default_animation_duration: f64,

    /// Initial capacity hint for the per-frame registration queue.
    pub frame_queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            walker_stack_capacity: 10,
            default_animation_duration: 1.0,
            frame_queue_capacity: 64,
        }
    }
}

impl Config {
    /// Parse a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, TimingError> {
        Ok(serde_json::from_str(json)?)
    }
}
