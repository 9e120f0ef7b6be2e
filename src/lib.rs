//! Terrain sandbox library
//!
//! Procedural terrain tile, biome classification, prop scattering and player
//! tracking, plus the collaborators (player kinematics, journal, terminal
//! explorer) used by the binaries.

pub mod biomes;
pub mod config;
pub mod coords;
pub mod error;
pub mod explorer;
pub mod journal;
pub mod noise_field;
pub mod player;
pub mod props;
pub mod seeds;
pub mod terrain;
pub mod tilemap;
pub mod tracker;
pub mod world;
