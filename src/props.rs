//! Prop scattering: mines, trees and animals placed over the terrain.
//!
//! Props are not snapped to the vertex grid. Each trial draws a free world
//! position and reads its elevation from [`crate::terrain::height_at`], the
//! same function the terrain mesh is built from, so props sit on the surface.
//!
//! The random source is passed in explicitly. The world controller seeds it
//! from the world's prop sub-seed, which makes placement reproducible per seed.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::noise_field::NoiseGenerator;
use crate::seeds::WorldSeeds;
use crate::terrain::height_at;

/// Kind of scattered prop
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropKind {
    /// Entrance that resets the world when the player walks into it
    Mine,
    Tree,
    Animal,
}

impl PropKind {
    pub fn name(&self) -> &'static str {
        match self {
            PropKind::Mine => "Mine",
            PropKind::Tree => "Tree",
            PropKind::Animal => "Animal",
        }
    }

    /// Glyph used on the terminal map
    pub fn glyph(&self) -> char {
        match self {
            PropKind::Mine => 'M',
            PropKind::Tree => 'T',
            PropKind::Animal => 'a',
        }
    }
}

/// A placed prop
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropInstance {
    pub kind: PropKind,
    pub position: Vec3,
}

/// Scatter tuning. Thresholds apply to a single uniform draw in `[0, 1)` per
/// trial and are tested in order mine, tree, animal; the first match wins.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterParams {
    /// Number of trials (not number of props)
    pub count: usize,
    /// Trials are drawn from `[-range, range]` on both axes
    pub range: f32,
    /// Mine needs a draw above this...
    pub mine_threshold: f32,
    /// ...and elevation above this
    pub mine_min_height: f32,
    /// Tree needs a draw above this...
    pub tree_threshold: f32,
    /// ...and elevation strictly inside this band
    pub tree_height_band: (f32, f32),
    /// Animal needs a draw below this...
    pub animal_threshold: f32,
    /// ...and elevation above this
    pub animal_min_height: f32,
}

impl Default for ScatterParams {
    fn default() -> Self {
        Self {
            count: 60,
            range: 80.0,
            mine_threshold: 0.95,
            mine_min_height: 2.0,
            tree_threshold: 0.6,
            tree_height_band: (1.0, 12.0),
            animal_threshold: 0.1,
            animal_min_height: 1.0,
        }
    }
}

impl ScatterParams {
    /// Category for one trial, or `None` when nothing is placed.
    pub fn classify(&self, draw: f32, height: f32) -> Option<PropKind> {
        let (tree_min, tree_max) = self.tree_height_band;
        if draw > self.mine_threshold && height > self.mine_min_height {
            Some(PropKind::Mine)
        } else if draw > self.tree_threshold && height > tree_min && height < tree_max {
            Some(PropKind::Tree)
        } else if draw < self.animal_threshold && height > self.animal_min_height {
            Some(PropKind::Animal)
        } else {
            None
        }
    }
}

/// All props of one world
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropSet {
    pub seed: u64,
    instances: Vec<PropInstance>,
}

impl PropSet {
    pub fn instances(&self) -> &[PropInstance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn of_kind(&self, kind: PropKind) -> impl Iterator<Item = &PropInstance> {
        self.instances.iter().filter(move |p| p.kind == kind)
    }

    pub fn mines(&self) -> impl Iterator<Item = &PropInstance> {
        self.of_kind(PropKind::Mine)
    }

    pub fn trees(&self) -> impl Iterator<Item = &PropInstance> {
        self.of_kind(PropKind::Tree)
    }

    pub fn animals(&self) -> impl Iterator<Item = &PropInstance> {
        self.of_kind(PropKind::Animal)
    }

    pub fn count(&self, kind: PropKind) -> usize {
        self.of_kind(kind).count()
    }
}

/// Run `params.count` scatter trials with the given random source.
///
/// Each trial draws x, then z, then (only for points above water) the category
/// draw. Underwater points (`y < 0`) are skipped. A range that is not a
/// positive finite number spans no area and places nothing.
pub fn scatter<R: Rng>(noise: &NoiseGenerator, params: &ScatterParams, rng: &mut R) -> Vec<PropInstance> {
    let mut out = Vec::new();
    if !params.range.is_finite() || params.range <= 0.0 {
        warn!(range = params.range, "empty scatter range, no props placed");
        return out;
    }

    for _ in 0..params.count {
        let x = rng.gen_range(-params.range..params.range);
        let z = rng.gen_range(-params.range..params.range);

        let y = height_at(noise, x as f64, z as f64);
        if y < 0.0 {
            continue;
        }

        let draw: f32 = rng.gen();
        if let Some(kind) = params.classify(draw, y) {
            out.push(PropInstance {
                kind,
                position: Vec3::new(x, y, z),
            });
        }
    }

    out
}

/// Scatter the props of a world, seeded from its prop sub-seed.
pub fn scatter_props(seeds: &WorldSeeds, params: &ScatterParams) -> PropSet {
    let noise = NoiseGenerator::new(seeds.terrain);
    let mut rng = ChaCha8Rng::seed_from_u64(seeds.props);
    let instances = scatter(&noise, params, &mut rng);

    let set = PropSet {
        seed: seeds.master,
        instances,
    };
    info!(
        seed = seeds.master,
        mines = set.count(PropKind::Mine),
        trees = set.count(PropKind::Tree),
        animals = set.count(PropKind::Animal),
        "scattered props"
    );
    set
}
