//! Kinematic player body.
//!
//! Stands in for the physics engine: turns a movement intent into velocity,
//! integrates gravity and jumping, and rests the body on a ground probe. The
//! world core never writes to this; it only reads the resulting position.

use glam::{Vec2, Vec3};

use crate::noise_field::NoiseGenerator;
use crate::terrain::{height_at, WATER_FLOOR};

/// Horizontal walking speed (world units per second)
pub const WALK_SPEED: f32 = 5.0;
/// Vertical velocity applied by a jump
pub const JUMP_VELOCITY: f32 = 5.0;
/// Gravity along Y
pub const GRAVITY: f32 = -9.8;
/// Vertical speed below which the body counts as resting
pub const GROUNDED_EPSILON: f32 = 0.05;
/// Where a fresh body appears
pub const SPAWN_POSITION: Vec3 = Vec3::new(0.0, 5.0, 0.0);

/// Abstract input for one frame: what the player wants to do, not which keys
/// are held.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MovementIntent {
    /// +1 forward (towards -Z), -1 backward
    pub forward: f32,
    /// +1 right (towards +X), -1 left
    pub strafe: f32,
    pub jump: bool,
}

impl MovementIntent {
    /// Desired horizontal velocity, normalized to walking speed.
    pub fn horizontal_velocity(&self) -> Vec2 {
        let dir = Vec2::new(self.strafe, -self.forward);
        dir.normalize_or_zero() * WALK_SPEED
    }
}

/// Ground height under a horizontal position
pub trait GroundProbe {
    fn ground_height(&self, x: f32, z: f32) -> f32;
}

/// Infinite flat plane, by default at the water floor
#[derive(Clone, Copy, Debug)]
pub struct FlatGround {
    pub height: f32,
}

impl Default for FlatGround {
    fn default() -> Self {
        Self { height: WATER_FLOOR }
    }
}

impl GroundProbe for FlatGround {
    fn ground_height(&self, _x: f32, _z: f32) -> f32 {
        self.height
    }
}

/// Follows the generated terrain surface
#[derive(Clone, Debug)]
pub struct TerrainGround {
    noise: NoiseGenerator,
}

impl TerrainGround {
    pub fn new(terrain_seed: u64) -> Self {
        Self {
            noise: NoiseGenerator::new(terrain_seed),
        }
    }
}

impl GroundProbe for TerrainGround {
    fn ground_height(&self, x: f32, z: f32) -> f32 {
        height_at(&self.noise, x as f64, z as f64)
    }
}

/// Player body state
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerBody {
    pub position: Vec3,
    pub velocity: Vec3,
}

impl Default for PlayerBody {
    fn default() -> Self {
        Self {
            position: SPAWN_POSITION,
            velocity: Vec3::ZERO,
        }
    }
}

impl PlayerBody {
    pub fn is_grounded(&self) -> bool {
        self.velocity.y.abs() < GROUNDED_EPSILON
    }

    /// Advance the body by `dt` seconds.
    pub fn step(&mut self, intent: &MovementIntent, ground: &impl GroundProbe, dt: f32) {
        let horizontal = intent.horizontal_velocity();
        self.velocity.x = horizontal.x;
        self.velocity.z = horizontal.y;

        if intent.jump && self.is_grounded() {
            self.velocity.y = JUMP_VELOCITY;
        }

        self.velocity.y += GRAVITY * dt;
        self.position += self.velocity * dt;

        let floor = ground.ground_height(self.position.x, self.position.z);
        if self.position.y <= floor {
            self.position.y = floor;
            self.velocity.y = 0.0;
        }
    }

    /// Put the body back at spawn, standing on the ground
    pub fn respawn(&mut self, ground: &impl GroundProbe) {
        let floor = ground.ground_height(SPAWN_POSITION.x, SPAWN_POSITION.z);
        self.position = Vec3::new(SPAWN_POSITION.x, floor.max(SPAWN_POSITION.y), SPAWN_POSITION.z);
        self.velocity = Vec3::ZERO;
    }
}
