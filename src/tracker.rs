//! Per-frame tracking of the player against the current world snapshot.
//!
//! Two independent jobs: keep the current biome in sync with the player's grid
//! cell, and detect when the player walks into a mine. Mine detection is
//! edge-triggered: each mine carries an "inside" latch and only the
//! outside → inside transition produces an event.

use glam::Vec3;
use tracing::debug;

use crate::biomes::Biome;
use crate::coords::GridIndex;
use crate::props::{PropInstance, PropSet};
use crate::terrain::TerrainGrid;

/// Distance (world units) at which a mine swallows the player
pub const MINE_TRIGGER_RADIUS: f32 = 2.5;

/// Emitted once when the player enters a mine's trigger radius
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MineEntered {
    /// Index of the mine among the world's mines
    pub mine: usize,
    pub position: Vec3,
    pub distance: f32,
}

// =============================================================================
// BIOME LOOKUP
// =============================================================================

/// Tracks the biome under the player.
#[derive(Clone, Debug)]
pub struct BiomeTracker {
    current: Biome,
    cell: Option<GridIndex>,
}

impl Default for BiomeTracker {
    fn default() -> Self {
        Self::new(Biome::default())
    }
}

impl BiomeTracker {
    pub fn new(initial: Biome) -> Self {
        Self {
            current: initial,
            cell: None,
        }
    }

    /// Last known biome
    pub fn current(&self) -> Biome {
        self.current
    }

    /// Grid cell of the last in-range lookup
    pub fn cell(&self) -> Option<GridIndex> {
        self.cell
    }

    /// Look up the biome at `(x, z)`.
    ///
    /// Returns `Some(biome)` only when the biome changed. Off-tile positions
    /// leave the last known biome untouched.
    pub fn update(&mut self, terrain: &TerrainGrid, x: f32, z: f32) -> Option<Biome> {
        let index = terrain.mapping.world_to_grid(x as f64, z as f64)?;
        let biome = *terrain.biome_map().try_get(index.i, index.j)?;
        self.cell = Some(index);

        if biome == self.current {
            return None;
        }
        debug!(from = %self.current, to = %biome, cell = %index, "biome changed");
        self.current = biome;
        Some(biome)
    }
}

// =============================================================================
// MINE PROXIMITY
// =============================================================================

/// Edge-triggered proximity check against the mines of one prop set.
#[derive(Clone, Debug, Default)]
pub struct MineTrigger {
    mines: Vec<Vec3>,
    inside: Vec<bool>,
    radius: f32,
}

impl MineTrigger {
    pub fn new(props: &PropSet) -> Self {
        Self::with_radius(props.mines(), MINE_TRIGGER_RADIUS)
    }

    pub fn with_radius<'a>(mines: impl IntoIterator<Item = &'a PropInstance>, radius: f32) -> Self {
        let mines: Vec<Vec3> = mines.into_iter().map(|m| m.position).collect();
        let inside = vec![false; mines.len()];
        Self { mines, inside, radius }
    }

    /// Re-arm for a new prop set. Latches of the old set are discarded.
    pub fn rearm(&mut self, props: &PropSet) {
        *self = Self::with_radius(props.mines(), self.radius);
    }

    pub fn mine_count(&self) -> usize {
        self.mines.len()
    }

    pub fn is_inside(&self, mine: usize) -> bool {
        self.inside.get(mine).copied().unwrap_or(false)
    }

    /// Update every latch for the new player position.
    ///
    /// Returns the first mine whose latch flipped to inside on this call.
    /// Latches are updated for all mines regardless, so a player standing in
    /// two overlapping radii does not get a second event next frame.
    pub fn check(&mut self, player: Vec3) -> Option<MineEntered> {
        let mut entered = None;

        for (idx, (&mine, inside)) in self.mines.iter().zip(self.inside.iter_mut()).enumerate() {
            let distance = player.distance(mine);
            let now_inside = distance < self.radius;

            if now_inside && !*inside && entered.is_none() {
                entered = Some(MineEntered {
                    mine: idx,
                    position: mine,
                    distance,
                });
            }
            *inside = now_inside;
        }

        entered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::PropKind;
    use crate::seeds::WorldSeeds;
    use crate::terrain::{generate_terrain, TerrainParams};

    fn mine_at(x: f32, y: f32, z: f32) -> PropInstance {
        PropInstance {
            kind: PropKind::Mine,
            position: Vec3::new(x, y, z),
        }
    }

    #[test]
    fn test_fires_once_per_entry() {
        let mines = [mine_at(10.0, 3.0, 10.0)];
        let mut trigger = MineTrigger::with_radius(mines.iter(), MINE_TRIGGER_RADIUS);

        // Walk in, linger for several ticks, walk out, walk back in.
        let path = [
            (Vec3::new(0.0, 3.0, 10.0), false),
            (Vec3::new(8.0, 3.0, 10.0), true),
            (Vec3::new(9.0, 3.0, 10.0), false),
            (Vec3::new(10.0, 3.0, 10.0), false),
            (Vec3::new(11.0, 3.0, 10.0), false),
            (Vec3::new(20.0, 3.0, 10.0), false),
            (Vec3::new(10.5, 3.0, 10.0), true),
            (Vec3::new(10.4, 3.0, 10.0), false),
        ];

        let fired: Vec<bool> = path.iter().map(|(p, _)| trigger.check(*p).is_some()).collect();
        let expected: Vec<bool> = path.iter().map(|(_, e)| *e).collect();
        assert_eq!(fired, expected);
    }

    #[test]
    fn test_radius_is_exclusive_and_3d() {
        let mines = [mine_at(0.0, 0.0, 0.0)];
        let mut trigger = MineTrigger::with_radius(mines.iter(), MINE_TRIGGER_RADIUS);

        assert!(trigger.check(Vec3::new(2.5, 0.0, 0.0)).is_none());
        // Horizontally on top of the mine but too high above it.
        assert!(trigger.check(Vec3::new(0.0, 3.0, 0.0)).is_none());
        let hit = trigger.check(Vec3::new(1.5, 1.5, 0.0)).unwrap();
        assert_eq!(hit.mine, 0);
        assert!(hit.distance < MINE_TRIGGER_RADIUS);
    }

    #[test]
    fn test_overlapping_mines_fire_once() {
        let mines = [mine_at(0.0, 0.0, 0.0), mine_at(1.0, 0.0, 0.0)];
        let mut trigger = MineTrigger::with_radius(mines.iter(), MINE_TRIGGER_RADIUS);

        let first = trigger.check(Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(first.map(|e| e.mine), Some(0));
        assert!(trigger.is_inside(0) && trigger.is_inside(1));
        assert!(trigger.check(Vec3::new(0.6, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_rearm_clears_latches() {
        let seeds = WorldSeeds::from_master(1);
        let mines = [mine_at(0.0, 0.0, 0.0)];
        let mut trigger = MineTrigger::with_radius(mines.iter(), MINE_TRIGGER_RADIUS);
        trigger.check(Vec3::ZERO);
        assert!(trigger.is_inside(0));

        let props = crate::props::scatter_props(&seeds, &crate::props::ScatterParams::default());
        trigger.rearm(&props);
        assert_eq!(trigger.mine_count(), props.count(PropKind::Mine));
        assert!((0..trigger.mine_count()).all(|m| !trigger.is_inside(m)));
    }

    #[test]
    fn test_biome_lookup_matches_map() {
        let terrain = generate_terrain(&WorldSeeds::from_master(64), &TerrainParams::default());
        let mut tracker = BiomeTracker::default();

        for (i, j, &biome) in terrain.biome_map().iter().step_by(97) {
            let (x, z) = terrain.mapping.grid_to_world(GridIndex::new(i, j));
            tracker.update(&terrain, x as f32, z as f32);
            assert_eq!(tracker.current(), biome);
            assert_eq!(tracker.cell(), Some(GridIndex::new(i, j)));
        }
    }

    #[test]
    fn test_out_of_range_keeps_last_biome() {
        let terrain = generate_terrain(&WorldSeeds::from_master(64), &TerrainParams::default());
        let mut tracker = BiomeTracker::default();
        tracker.update(&terrain, 0.0, 0.0);
        let before = tracker.current();

        assert!(tracker.update(&terrain, 5000.0, 0.0).is_none());
        assert!(tracker.update(&terrain, 0.0, -5000.0).is_none());
        assert!(tracker.update(&terrain, f32::NAN, 0.0).is_none());
        assert_eq!(tracker.current(), before);
    }

    #[test]
    fn test_update_reports_changes_only() {
        let terrain = generate_terrain(&WorldSeeds::from_master(64), &TerrainParams::default());
        let mut tracker = BiomeTracker::new(Biome::Snow);
        let origin_biome = terrain.biome_at_world(0.0, 0.0).unwrap();

        let first = tracker.update(&terrain, 0.0, 0.0);
        if origin_biome == Biome::Snow {
            assert!(first.is_none());
        } else {
            assert_eq!(first, Some(origin_biome));
        }
        assert!(tracker.update(&terrain, 0.0, 0.0).is_none());
    }
}
