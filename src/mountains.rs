use crate::noise::NoiseGrid;
use serde::Serialize;
use std::f64::consts::TAU;

/// Шаг сканирования сетки для гор
pub const MOUNTAIN_STRIDE: usize = 3;
/// Выше этой высоты глиф не ставится: пик уходит под снежную шапку
pub const MOUNTAIN_CEILING: f64 = 0.95;

/// Один горный глиф
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MountainGlyph {
    pub x: u32,
    pub y: u32,
    pub base_size: f64,
    pub peak_height: f64,
    /// Наклон вершины в радианах
    pub angle: f64,
    /// Значение шума детализации в клетке, для оттенка
    pub shade: f64,
}

/// Снежная шапка над вершиной
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnowCap {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MountainLayer {
    pub glyphs: Vec<MountainGlyph>,
    pub snow_caps: Vec<SnowCap>,
}

/// Размещает горы по хребтовому шуму.
///
/// Форма и наклон берутся из шума детализации, так что слой полностью
/// определяется сетками и не потребляет случайных чисел.
pub fn place_mountains(
    elevation: &NoiseGrid,
    ridge: &NoiseGrid,
    detail: &NoiseGrid,
    ocean_depth: f64,
    mountain_density: f64,
) -> MountainLayer {
    let mut layer = MountainLayer::default();
    let foothill = ocean_depth + 0.4;
    let snow_line = ocean_depth + 0.55;
    let ridge_threshold = 0.8 - mountain_density * 0.4;

    for y in (0..elevation.height).step_by(MOUNTAIN_STRIDE) {
        for x in (0..elevation.width).step_by(MOUNTAIN_STRIDE) {
            let i = elevation.index(x, y);
            let value = elevation.data[i];
            let ridge_value = ridge.data[i];
            let detail_value = detail.data[i];

            let base_size = 3.0 + ((value - foothill) * 25.0).floor();
            let peak_height = base_size * (1.5 + detail_value * 1.5);

            if value > foothill && value < MOUNTAIN_CEILING && ridge_value > ridge_threshold {
                layer.glyphs.push(MountainGlyph {
                    x,
                    y,
                    base_size,
                    peak_height,
                    angle: detail_value * TAU,
                    shade: detail_value,
                });
            }

            if value > snow_line + detail_value * 0.1 {
                layer.snow_caps.push(SnowCap {
                    x: f64::from(x),
                    y: f64::from(y) - peak_height * 0.7,
                    radius: (base_size * (value - snow_line) * 5.0).max(1.0),
                });
            }
        }
    }

    tracing::debug!(
        target: "fantasy_mapgen::mountains",
        glyphs = layer.glyphs.len(),
        snow_caps = layer.snow_caps.len(),
        ridge_threshold,
        "mountains.placed"
    );
    layer
}
