//! Gameplay constants shared by every peer of a match.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::RewardKind;

/// Every adjustable gameplay constant.
///
/// Durations are stored in seconds so the struct reads naturally from TOML;
/// use the accessor methods to obtain [`Duration`] values. Missing fields
/// fall back to [`Tuning::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Side length of a tile in world units.
    pub tile_size: f32,
    /// Base movement speed of a fresh avatar.
    pub initial_speed: f32,
    /// Multiplier applied to the current speed while immune after a hit.
    pub damage_debuff: f32,
    /// Length of the immunity window after spawning or being hit, in seconds.
    pub immunity_secs: f32,
    /// Blast force of a fresh avatar.
    pub initial_force: u32,
    /// Maximum concurrent bombs of a fresh avatar.
    pub initial_max_bombs: u32,
    /// Lives of a fresh avatar.
    pub lives: u32,
    /// Countdown between placement and detonation, in seconds.
    pub bomb_fuse_secs: f32,
    /// Visual lifetime of an explosion segment, in seconds.
    pub explosion_lifetime_secs: f32,
    /// Portion of a segment's lifetime during which it hurts, in seconds.
    pub explosion_lethal_secs: f32,
    /// Length of an animated destructible's destruction, in seconds.
    pub destruction_secs: f32,
    /// Probability that a reward-eligible destructible leaves a reward.
    pub reward_probability: f64,
    /// Weighted distribution of reward kinds.
    pub reward_weights: RewardWeights,
    /// Added to the maximum bomb count by an extra-bomb reward.
    pub bomb_increase: u32,
    /// Added to the base speed by a speed-boost reward.
    pub speed_increase: f32,
    /// Added to the blast force by an extra-range reward.
    pub range_increase: u32,
    /// Interval between attribute broadcasts, in seconds.
    pub attribute_interval_secs: f32,
    /// Interval between lobby readiness pings, in seconds.
    pub ping_interval_secs: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            tile_size: 64.0,
            initial_speed: 2.5,
            damage_debuff: 0.5,
            immunity_secs: 2.0,
            initial_force: 1,
            initial_max_bombs: 1,
            lives: 3,
            bomb_fuse_secs: 2.0,
            explosion_lifetime_secs: 0.5,
            explosion_lethal_secs: 0.15,
            destruction_secs: 1.0 / 3.0,
            reward_probability: 0.5,
            reward_weights: RewardWeights::default(),
            bomb_increase: 1,
            speed_increase: 0.1,
            range_increase: 1,
            attribute_interval_secs: 0.1,
            ping_interval_secs: 0.5,
        }
    }
}

impl Tuning {
    /// Immunity window after spawning or being hit.
    #[must_use]
    pub fn immunity(&self) -> Duration {
        seconds(self.immunity_secs)
    }

    /// Countdown between placement and detonation.
    #[must_use]
    pub fn bomb_fuse(&self) -> Duration {
        seconds(self.bomb_fuse_secs)
    }

    /// Visual lifetime of an explosion segment.
    #[must_use]
    pub fn explosion_lifetime(&self) -> Duration {
        seconds(self.explosion_lifetime_secs)
    }

    /// Portion of a segment's lifetime during which it hurts.
    #[must_use]
    pub fn explosion_lethal(&self) -> Duration {
        seconds(self.explosion_lethal_secs)
    }

    /// Length of an animated destructible's destruction.
    #[must_use]
    pub fn destruction(&self) -> Duration {
        seconds(self.destruction_secs)
    }

    /// Interval between attribute broadcasts.
    #[must_use]
    pub fn attribute_interval(&self) -> Duration {
        seconds(self.attribute_interval_secs)
    }

    /// Interval between lobby readiness pings.
    #[must_use]
    pub fn ping_interval(&self) -> Duration {
        seconds(self.ping_interval_secs)
    }
}

/// Relative weights of each reward kind. The weights should sum to one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    /// Weight of [`RewardKind::ExtraBomb`].
    pub extra_bomb: f64,
    /// Weight of [`RewardKind::SpeedBoost`].
    pub speed_boost: f64,
    /// Weight of [`RewardKind::ExtraRange`].
    pub extra_range: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            extra_bomb: 0.5,
            speed_boost: 0.25,
            extra_range: 0.25,
        }
    }
}

impl RewardWeights {
    /// Ordered `(kind, weight)` pairs walked by weighted selection.
    #[must_use]
    pub fn entries(&self) -> [(RewardKind, f64); 3] {
        [
            (RewardKind::ExtraBomb, self.extra_bomb),
            (RewardKind::SpeedBoost, self.speed_boost),
            (RewardKind::ExtraRange, self.extra_range),
        ]
    }
}

fn seconds(value: f32) -> Duration {
    Duration::try_from_secs_f32(value).unwrap_or(Duration::ZERO)
}
