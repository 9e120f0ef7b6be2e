//! Elevation-banded biome classification.
//!
//! A single table maps elevation to a biome and a display color. Terrain
//! generation uses it to paint vertices and build the biome map, and the
//! player tracker reads the biome map back at runtime, so both always agree.

use serde::{Deserialize, Serialize};

/// Biome types available on the sandbox tile
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Biome {
    Ocean,
    Beach,
    Grassland,
    Forest,
    Mountain,
    Snow,
}

impl Biome {
    /// Every biome, ordered from lowest to highest elevation band
    pub const ALL: [Biome; 6] = [
        Biome::Ocean,
        Biome::Beach,
        Biome::Grassland,
        Biome::Forest,
        Biome::Mountain,
        Biome::Snow,
    ];

    /// Label shown by the UI
    pub fn display_name(&self) -> &'static str {
        match self {
            Biome::Ocean => "Ocean",
            Biome::Beach => "Beach",
            Biome::Grassland => "Grassland",
            Biome::Forest => "Forest",
            Biome::Mountain => "Mountain",
            Biome::Snow => "Snow",
        }
    }

    /// Glyph used by the terminal map and debug dumps
    pub fn glyph(&self) -> char {
        match self {
            Biome::Ocean => '~',
            Biome::Beach => '.',
            Biome::Grassland => '"',
            Biome::Forest => 'f',
            Biome::Mountain => '^',
            Biome::Snow => '*',
        }
    }

    /// Representative color. Ocean uses the shallow water tone; the deep tone
    /// only appears on vertices sitting on the water floor.
    pub fn color(&self) -> TerrainColor {
        match self {
            Biome::Ocean => palette::WATER,
            Biome::Beach => palette::SAND,
            Biome::Grassland => palette::GRASS,
            Biome::Forest => palette::FOREST,
            Biome::Mountain => palette::ROCK,
            Biome::Snow => palette::SNOW,
        }
    }

    pub fn is_water(&self) -> bool {
        matches!(self, Biome::Ocean)
    }
}

impl Default for Biome {
    fn default() -> Self {
        Biome::Grassland
    }
}

impl std::fmt::Display for Biome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// 8-bit sRGB vertex color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TerrainColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl TerrainColor {
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }

    /// Normalized channels for vertex color buffers
    pub fn to_f32(&self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }

    pub fn to_rgb(&self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }
}

/// Terrain palette
pub mod palette {
    use super::TerrainColor;

    pub const DEEP_WATER: TerrainColor = TerrainColor::from_hex(0x1e40af);
    pub const WATER: TerrainColor = TerrainColor::from_hex(0x3b82f6);
    pub const SAND: TerrainColor = TerrainColor::from_hex(0xfcd34d);
    pub const GRASS: TerrainColor = TerrainColor::from_hex(0x4ade80);
    pub const FOREST: TerrainColor = TerrainColor::from_hex(0x15803d);
    pub const ROCK: TerrainColor = TerrainColor::from_hex(0x57534e);
    pub const SNOW: TerrainColor = TerrainColor::from_hex(0xf3f4f6);
}

// =============================================================================
// ELEVATION BANDS
// =============================================================================

/// Elevation at or below which water is drawn with the deep tone.
/// Terrain generation clamps to this value, so it is also the water floor.
pub const DEEP_WATER_LEVEL: f32 = -2.0;
/// Sea level: the shallow ocean band ends here
pub const SEA_LEVEL: f32 = 0.0;
/// Lower bound (inclusive) of the grassland band
pub const GRASSLAND_LEVEL: f32 = 1.5;
/// Lower bound (inclusive) of the forest band
pub const FOREST_LEVEL: f32 = 6.0;
/// Lower bound (inclusive) of the mountain band
pub const MOUNTAIN_LEVEL: f32 = 12.0;
/// Lower bound (inclusive) of the snow band
pub const SNOW_LEVEL: f32 = 18.0;

/// Classify an elevation into its biome and vertex color.
///
/// Total over all `f32` inputs. Bands are half-open with the lower bound
/// inclusive, except the deep water band which closes at `DEEP_WATER_LEVEL`.
/// NaN fails every comparison and lands in the open-ended snow band.
pub fn classify(elevation: f32) -> (Biome, TerrainColor) {
    if elevation <= DEEP_WATER_LEVEL {
        (Biome::Ocean, palette::DEEP_WATER)
    } else if elevation < SEA_LEVEL {
        (Biome::Ocean, palette::WATER)
    } else if elevation < GRASSLAND_LEVEL {
        (Biome::Beach, palette::SAND)
    } else if elevation < FOREST_LEVEL {
        (Biome::Grassland, palette::GRASS)
    } else if elevation < MOUNTAIN_LEVEL {
        (Biome::Forest, palette::FOREST)
    } else if elevation < SNOW_LEVEL {
        (Biome::Mountain, palette::ROCK)
    } else {
        (Biome::Snow, palette::SNOW)
    }
}

/// Biome only, for callers that do not need the color
pub fn classify_biome(elevation: f32) -> Biome {
    classify(elevation).0
}
