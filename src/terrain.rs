use crate::config::MapStyle;
use crate::noise::NoiseGrid;
use image::{ImageBuffer, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Полоса высот/биом клетки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    DeepOcean,
    Ocean,
    Shallow,
    Sand,
    Grass,
    Forest,
    Mountain,
    Snow,
}

impl Band {
    /// Классифицирует высоту относительно уровня океана.
    ///
    /// Пороги упорядочены; первая подходящая полоса побеждает.
    #[must_use]
    pub fn classify(value: f64, ocean_depth: f64) -> Self {
        if value < ocean_depth - 0.15 {
            Band::DeepOcean
        } else if value < ocean_depth - 0.05 {
            Band::Ocean
        } else if value < ocean_depth {
            Band::Shallow
        } else if value < ocean_depth + 0.03 {
            Band::Sand
        } else if value < ocean_depth + 0.30 {
            Band::Grass
        } else if value < ocean_depth + 0.45 {
            Band::Forest
        } else if value < ocean_depth + 0.60 {
            Band::Mountain
        } else {
            Band::Snow
        }
    }

    #[must_use]
    pub fn is_water(self) -> bool {
        matches!(self, Band::DeepOcean | Band::Ocean | Band::Shallow)
    }

    #[must_use]
    pub fn base_color(self, style: MapStyle) -> [u8; 3] {
        match style {
            MapStyle::Color => match self {
                Band::DeepOcean => [10, 30, 70],
                Band::Ocean => [65, 105, 170],
                Band::Shallow => [100, 142, 190],
                Band::Sand => [238, 214, 175],
                Band::Grass => [124, 184, 104],
                Band::Forest => [80, 140, 80],
                Band::Mountain => [150, 142, 134],
                Band::Snow => [245, 245, 245],
            },
            MapStyle::Parchment => match self {
                Band::DeepOcean => [180, 170, 140],
                Band::Ocean => [200, 190, 160],
                Band::Shallow => [210, 200, 170],
                Band::Sand => [225, 210, 180],
                Band::Grass => [205, 195, 170],
                Band::Forest => [190, 185, 160],
                Band::Mountain => [170, 165, 155],
                Band::Snow => [230, 230, 225],
            },
        }
    }
}

/// Классифицированный рельеф: полоса и итоговый цвет каждой клетки
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainMap {
    pub width: u32,
    pub height: u32,
    pub bands: Vec<Band>,
    pub colors: Vec<[u8; 3]>,
}

/// Назначает полосы по высоте и слегка смещает цвет по шуму детализации.
///
/// Шум детализации влияет только на цвет: сдвиг не больше `influence * 25` на канал.
pub fn classify_terrain(
    elevation: &NoiseGrid,
    detail: &NoiseGrid,
    ocean_depth: f64,
    style: MapStyle,
) -> TerrainMap {
    debug_assert_eq!(elevation.data.len(), detail.data.len());
    let influence = style.detail_influence();

    let (bands, colors) = elevation
        .data
        .iter()
        .zip(&detail.data)
        .map(|(&value, &detail_value)| {
            let band = Band::classify(value, ocean_depth);
            let shift = (detail_value - 0.5) * influence * 50.0;
            let color = band
                .base_color(style)
                .map(|c| (f64::from(c) + shift).clamp(0.0, 255.0) as u8);
            (band, color)
        })
        .unzip();

    TerrainMap {
        width: elevation.width,
        height: elevation.height,
        bands,
        colors,
    }
}

impl TerrainMap {
    /// Доля клеток суши
    #[must_use]
    pub fn land_ratio(&self) -> f64 {
        if self.bands.is_empty() {
            return 0.0;
        }
        let land = self.bands.iter().filter(|b| !b.is_water()).count();
        land as f64 / self.bands.len() as f64
    }

    /// Непрозрачная основа для отрисовки
    #[must_use]
    pub fn to_rgba_image(&self) -> RgbaImage {
        ImageBuffer::from_fn(self.width, self.height, |x, y| {
            let [r, g, b] = self.colors[y as usize * self.width as usize + x as usize];
            Rgba([r, g, b, 255])
        })
    }
}
