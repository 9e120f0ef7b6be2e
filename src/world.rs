//! World state controller
//!
//! Owns the current seed and the snapshot built from it, and runs the
//! per-frame tracking against that snapshot. A regeneration builds a complete
//! new snapshot and swaps it in; nothing is updated incrementally.

use std::sync::Arc;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::biomes::Biome;
use crate::config::SandboxConfig;
use crate::props::{scatter_props, PropSet, ScatterParams};
use crate::seeds::WorldSeeds;
use crate::terrain::{generate_terrain, TerrainGrid, TerrainParams};
use crate::tracker::{BiomeTracker, MineEntered, MineTrigger};

/// Narrative line emitted when a mine swallows the player
pub const EMERGED_MESSAGE: &str = "I've emerged from the caverns into a new land...";

/// Everything generated from one seed
#[derive(Clone, Debug)]
pub struct WorldSnapshot {
    pub seeds: WorldSeeds,
    pub terrain: Arc<TerrainGrid>,
    pub props: Arc<PropSet>,
    /// Incremented on every regeneration
    pub generation: u64,
}

impl WorldSnapshot {
    pub fn build(seed: u64, terrain: &TerrainParams, props: &ScatterParams, generation: u64) -> Self {
        let seeds = WorldSeeds::from_master(seed);
        Self {
            seeds,
            terrain: Arc::new(generate_terrain(&seeds, terrain)),
            props: Arc::new(scatter_props(&seeds, props)),
            generation,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seeds.master
    }
}

/// Outcome of one [`WorldController::update`]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickReport {
    /// New biome under the player, if it changed
    pub biome_changed: Option<Biome>,
    /// Mine that triggered a reset on this tick
    pub mine_entered: Option<MineEntered>,
    /// Seed of the world generated by the reset
    pub new_seed: Option<u64>,
}

impl TickReport {
    pub fn was_reset(&self) -> bool {
        self.new_seed.is_some()
    }
}

/// Seed owner and reset orchestrator.
pub struct WorldController {
    terrain_params: TerrainParams,
    scatter_params: ScatterParams,
    seed_source: ChaCha8Rng,
    snapshot: WorldSnapshot,
    tracker: BiomeTracker,
    trigger: MineTrigger,
    /// Last position handed to `update` or `place_player`
    last_position: Option<Vec3>,
}

impl WorldController {
    /// Start with a seed drawn from the session seed source.
    pub fn new(config: &SandboxConfig) -> Self {
        let mut seed_source = match config.session_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let seed = seed_source.gen();
        Self::build(config, seed_source, seed)
    }

    /// Start from an explicit world seed.
    pub fn with_seed(config: &SandboxConfig, seed: u64) -> Self {
        let seed_source = match config.session_seed {
            Some(session) => ChaCha8Rng::seed_from_u64(session),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::build(config, seed_source, seed)
    }

    fn build(config: &SandboxConfig, seed_source: ChaCha8Rng, seed: u64) -> Self {
        let snapshot = WorldSnapshot::build(seed, &config.terrain, &config.props, 0);
        let trigger = MineTrigger::new(&snapshot.props);
        info!(seed, generation = 0, "world created");
        Self {
            terrain_params: config.terrain,
            scatter_params: config.props,
            seed_source,
            snapshot,
            tracker: BiomeTracker::default(),
            trigger,
            last_position: None,
        }
    }

    pub fn seed(&self) -> u64 {
        self.snapshot.seed()
    }

    pub fn generation(&self) -> u64 {
        self.snapshot.generation
    }

    pub fn snapshot(&self) -> &WorldSnapshot {
        &self.snapshot
    }

    pub fn terrain(&self) -> &TerrainGrid {
        &self.snapshot.terrain
    }

    pub fn props(&self) -> &PropSet {
        &self.snapshot.props
    }

    pub fn current_biome(&self) -> Biome {
        self.tracker.current()
    }

    /// Draw a fresh seed and rebuild the world. The new seed always differs
    /// from the current one.
    pub fn regenerate(&mut self) -> u64 {
        let mut seed = self.seed_source.gen();
        while seed == self.seed() {
            seed = self.seed_source.gen();
        }
        self.regenerate_with(seed);
        seed
    }

    /// Rebuild the world from `seed`.
    ///
    /// Mines of the new world that already contain the player's last known
    /// position count as entered, so a regeneration never fires a reset by
    /// itself on the next update.
    pub fn regenerate_with(&mut self, seed: u64) {
        let generation = self.snapshot.generation + 1;
        self.snapshot = WorldSnapshot::build(seed, &self.terrain_params, &self.scatter_params, generation);
        self.trigger.rearm(&self.snapshot.props);
        if let Some(position) = self.last_position {
            let _ = self.trigger.check(position);
        }
        info!(seed, generation, "world regenerated");
    }

    /// Put the player at `position` without crossing any mine boundary
    /// (spawn, respawn, teleport). Returns the biome if it changed.
    pub fn place_player(&mut self, position: Vec3) -> Option<Biome> {
        self.last_position = Some(position);
        let _ = self.trigger.check(position);
        self.tracker.update(&self.snapshot.terrain, position.x, position.z)
    }

    /// Reset the world after the player entered a mine. Returns the narrative
    /// line for the journal.
    pub fn on_mine_entered(&mut self) -> &'static str {
        let seed = self.regenerate();
        info!(seed, "{}", EMERGED_MESSAGE);
        EMERGED_MESSAGE
    }

    /// Per-frame tracking for the player at `position`.
    pub fn update(&mut self, position: Vec3) -> TickReport {
        self.last_position = Some(position);
        let mut report = TickReport {
            biome_changed: self.tracker.update(&self.snapshot.terrain, position.x, position.z),
            ..TickReport::default()
        };

        if let Some(entered) = self.trigger.check(position) {
            info!(mine = entered.mine, distance = entered.distance, "player entered mine");
            self.on_mine_entered();
            report.biome_changed = self
                .tracker
                .update(&self.snapshot.terrain, position.x, position.z)
                .or(report.biome_changed);
            report.mine_entered = Some(entered);
            report.new_seed = Some(self.seed());
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::PropKind;
    use crate::tracker::MINE_TRIGGER_RADIUS;

    fn small_config() -> SandboxConfig {
        let mut config = SandboxConfig::default();
        config.terrain.segments = 16;
        config.props.count = 2000;
        config.session_seed = Some(99);
        config
    }

    #[test]
    fn test_same_session_same_seeds() {
        let config = small_config();
        let mut a = WorldController::new(&config);
        let mut b = WorldController::new(&config);
        assert_eq!(a.seed(), b.seed());
        assert_eq!(a.regenerate(), b.regenerate());
    }

    #[test]
    fn test_regenerate_changes_seed_and_generation() {
        let mut world = WorldController::with_seed(&small_config(), 42);
        let old = world.seed();
        let new = world.regenerate();
        assert_ne!(old, new);
        assert_eq!(world.seed(), new);
        assert_eq!(world.generation(), 1);
    }

    #[test]
    fn test_seed_change_isolation() {
        let config = small_config();
        let mut world = WorldController::with_seed(&config, 7);
        let first = world.snapshot().clone();

        world.regenerate_with(8);
        // The old snapshot is untouched by the swap.
        assert_eq!(first.seed(), 7);
        assert_ne!(first.terrain.heights(), world.terrain().heights());

        world.regenerate_with(7);
        assert_eq!(first.terrain.heights(), world.terrain().heights());
        assert_eq!(first.terrain.biome_map(), world.terrain().biome_map());
        assert_eq!(*first.props, *world.props());
    }

    #[test]
    fn test_mine_entry_resets_once() {
        let config = small_config();
        let mut world = (0u64..200)
            .map(|seed| WorldController::with_seed(&config, seed))
            .find(|w| w.props().count(PropKind::Mine) > 0)
            .expect("some seed places a mine");

        let old_seed = world.seed();
        let mine = world.props().mines().next().unwrap().position;

        let far = world.update(Vec3::new(0.0, 1000.0, 0.0));
        assert!(!far.was_reset());

        let hit = world.update(mine);
        assert!(hit.was_reset());
        assert_ne!(world.seed(), old_seed);
        assert_eq!(hit.new_seed, Some(world.seed()));
        assert_eq!(world.generation(), 1);

        // Standing still afterwards never chains another reset.
        for _ in 0..5 {
            assert!(!world.update(mine).was_reset());
        }
        assert_eq!(world.generation(), 1);
    }

    /// A seed whose props include a mine, and that mine's position.
    fn seed_with_mine(config: &SandboxConfig) -> (u64, Vec3) {
        (0u64..200)
            .find_map(|seed| {
                let snapshot = WorldSnapshot::build(seed, &config.terrain, &config.props, 0);
                let mine = snapshot.props.mines().next()?.position;
                Some((seed, mine))
            })
            .expect("some seed places a mine")
    }

    /// A world with no mine within trigger range of `spot`.
    fn world_clear_of(config: &SandboxConfig, spot: Vec3) -> WorldController {
        (0u64..200)
            .map(|seed| WorldController::with_seed(config, seed))
            .find(|w| w.props().mines().all(|m| m.position.distance(spot) >= MINE_TRIGGER_RADIUS))
            .expect("some seed leaves the spot clear")
    }

    #[test]
    fn test_manual_regenerate_onto_mine_does_not_reset() {
        let config = small_config();
        let (mined_seed, spot) = seed_with_mine(&config);
        let mut world = world_clear_of(&config, spot);

        assert!(!world.update(spot).was_reset());
        world.regenerate_with(mined_seed);
        let generation = world.generation();

        // The player did not walk into the mine; the mine appeared around them.
        let report = world.update(spot);
        assert!(!report.was_reset());
        assert_eq!(world.seed(), mined_seed);
        assert_eq!(world.generation(), generation);

        // Leaving and walking back in is a real entry.
        assert!(!world.update(spot + Vec3::new(0.0, 1000.0, 0.0)).was_reset());
        assert!(world.update(spot).was_reset());
    }

    #[test]
    fn test_place_player_does_not_reset() {
        let config = small_config();
        let (mined_seed, spot) = seed_with_mine(&config);
        let mut world = WorldController::with_seed(&config, mined_seed);

        world.place_player(spot);
        if let Some(biome) = world.terrain().biome_at_world(spot.x as f64, spot.z as f64) {
            assert_eq!(world.current_biome(), biome);
        }
        assert!(!world.update(spot).was_reset());
        assert_eq!(world.generation(), 0);
    }

    #[test]
    fn test_on_mine_entered_message() {
        let mut world = WorldController::with_seed(&small_config(), 3);
        assert_eq!(world.on_mine_entered(), EMERGED_MESSAGE);
        assert_ne!(world.seed(), 3);
    }

    #[test]
    fn test_biome_tracks_player() {
        let mut world = WorldController::with_seed(&small_config(), 42);
        world.update(Vec3::ZERO);
        assert_eq!(Some(world.current_biome()), world.terrain().biome_at_world(0.0, 0.0));
    }
}
