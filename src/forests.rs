use crate::noise::NoiseGrid;
use rand::Rng;
use serde::Serialize;

/// Шаг сканирования сетки для лесов
pub const FOREST_STRIDE: usize = 4;
/// Отступ сканирования от краёв карты
const FOREST_MARGIN: u32 = 5;

/// Отдельное дерево: центр и радиус маркера
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tree {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

/// Роща из 2–6 деревьев вокруг клетки сетки
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForestClump {
    pub x: u32,
    pub y: u32,
    pub trees: Vec<Tree>,
}

/// Размещает рощи на равнинах и холмах.
///
/// Решение «быть ли роще» и число деревьев берутся из шума. Смещения и размеры
/// деревьев декоративны и идут из `jitter`, который тоже засеян от сида карты.
pub fn place_forests<R: Rng>(
    elevation: &NoiseGrid,
    forest: &NoiseGrid,
    tree_detail: &NoiseGrid,
    ocean_depth: f64,
    forest_density: f64,
    jitter: &mut R,
) -> Vec<ForestClump> {
    let mut clumps = Vec::new();
    let low = ocean_depth + 0.04; // чуть выше песка
    let high = ocean_depth + 0.45;
    let threshold = 0.65 - forest_density * 0.3;

    let x_end = elevation.width.saturating_sub(FOREST_MARGIN);
    let y_end = elevation.height.saturating_sub(FOREST_MARGIN);

    for y in (FOREST_MARGIN..y_end).step_by(FOREST_STRIDE) {
        for x in (FOREST_MARGIN..x_end).step_by(FOREST_STRIDE) {
            let i = elevation.index(x, y);
            let value = elevation.data[i];
            let forest_value = forest.data[i];

            if value <= low || value >= high || forest_value <= threshold {
                continue;
            }

            let clump_size = 2.0 + (forest_value * 5.0).floor();
            let tree_count = 2 + (tree_detail.data[i] * 4.0).floor() as usize;
            let spread = clump_size * 1.5;

            let trees = (0..tree_count)
                .map(|_| Tree {
                    x: f64::from(x) + (jitter.gen_range(0.0..1.0) - 0.5) * spread,
                    y: f64::from(y) + (jitter.gen_range(0.0..1.0) - 0.5) * spread,
                    size: 1.5 + jitter.gen_range(0.0..1.0) * 2.5,
                })
                .collect();

            clumps.push(ForestClump { x, y, trees });
        }
    }

    tracing::debug!(
        target: "fantasy_mapgen::forests",
        clumps = clumps.len(),
        threshold,
        "forests.placed"
    );
    clumps
}
