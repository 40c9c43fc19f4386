//! Player avatars: the local one is simulated, remote ones are mirrors.

use std::time::Duration;

use blastgrid_core::{AttributeDelta, PlayerAttributes, Position, Tuning};

#[derive(Clone, Debug)]
pub(crate) struct Player {
    pub(crate) color: String,
    pub(crate) local: bool,
    pub(crate) position: Position,
    pub(crate) lives: u32,
    pub(crate) speed: f32,
    pub(crate) cur_speed: f32,
    pub(crate) force: u32,
    pub(crate) immune: bool,
    pub(crate) immune_until: Duration,
    pub(crate) max_bombs: u32,
    pub(crate) current_bombs: u32,
}

impl Player {
    /// Creates a fresh avatar that starts immune until `immune_until`.
    pub(crate) fn spawn(
        tuning: &Tuning,
        color: String,
        local: bool,
        position: Position,
        immune_until: Duration,
    ) -> Self {
        Self {
            color,
            local,
            position,
            lives: tuning.lives,
            speed: tuning.initial_speed,
            cur_speed: tuning.initial_speed * tuning.damage_debuff,
            force: tuning.initial_force,
            immune: true,
            immune_until,
            max_bombs: tuning.initial_max_bombs,
            current_bombs: 0,
        }
    }

    pub(crate) fn attributes(&self) -> PlayerAttributes {
        PlayerAttributes {
            immune: self.immune,
            lives: self.lives,
            speed: self.speed,
            cur_speed: self.cur_speed,
            force: self.force,
            position: self.position,
        }
    }

    /// Overwrites the mirrored fields with a snapshot from the owning peer.
    pub(crate) fn mirror(&mut self, attributes: &PlayerAttributes) {
        self.immune = attributes.immune;
        self.lives = attributes.lives;
        self.speed = attributes.speed;
        self.cur_speed = attributes.cur_speed;
        self.force = attributes.force;
        self.position = attributes.position;
    }

    /// Applies a blast hit and returns the remaining lives.
    pub(crate) fn hit(&mut self, tuning: &Tuning, immune_until: Duration) -> u32 {
        self.lives = self.lives.saturating_sub(1);
        self.immune = true;
        self.immune_until = immune_until;
        self.cur_speed = self.speed * tuning.damage_debuff;
        self.lives
    }

    /// Ends immunity when its deadline passed. Returns whether it changed.
    pub(crate) fn expire_immunity(&mut self, now: Duration) -> bool {
        if !self.immune || now < self.immune_until {
            return false;
        }
        self.immune = false;
        self.cur_speed = self.speed;
        true
    }

    pub(crate) fn collect(&mut self, delta: AttributeDelta) {
        self.max_bombs = self.max_bombs.saturating_add(delta.bombs);
        self.force = self.force.saturating_add(delta.force);
        self.speed += delta.speed;
        if !self.immune {
            self.cur_speed = self.speed;
        }
    }
}
