// src/pipeline.rs
//! Конвейер генерации карты
//!
//! `generate(seed, config)` является чистой функцией: одинаковые сид и конфигурация
//! дают побитово одинаковый [`WorldMap`]. Порядок этапов:
//!
//! 1. шесть сеток шума (независимы друг от друга);
//! 2. классификация рельефа;
//! 3. горы, леса, реки и города; они только читают неизменяемые сетки;
//! 4. дороги и подписи, после городов.
//!
//! С фичей `parallel` независимые шаги выполняются через `rayon::join`.
//! Каждый этап получает собственный поток случайных чисел, поэтому порядок
//! выполнения на результат не влияет.

use crate::config::{ConfigError, GenerationConfig, NoiseParams, layers};
use crate::forests::{ForestClump, place_forests};
use crate::labels::{LabelAssignment, place_labels};
use crate::mountains::{MountainLayer, place_mountains};
use crate::noise::NoiseGrid;
use crate::rivers::{RiverPath, trace_rivers};
use crate::rng::{StageSeeds, offsets};
use crate::roads::{RoadNetwork, build_road_network};
use crate::settlements::{Settlement, place_settlements};
use crate::terrain::{TerrainMap, classify_terrain};
use serde::Serialize;
use std::time::Instant;

/// Результат одного запуска генерации.
///
/// Создаётся заново при каждом вызове [`generate`] и после этого не меняется.
/// Плотные сетки в JSON не попадают.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldMap {
    pub seed: u64,
    pub config: GenerationConfig,
    #[serde(skip)]
    pub elevation: NoiseGrid,
    #[serde(skip)]
    pub terrain: TerrainMap,
    pub mountains: MountainLayer,
    pub forests: Vec<ForestClump>,
    pub rivers: Vec<RiverPath>,
    pub settlements: Vec<Settlement>,
    pub roads: RoadNetwork,
    pub labels: Vec<LabelAssignment>,
}

struct NoiseGrids {
    elevation: NoiseGrid,
    detail: NoiseGrid,
    ridge: NoiseGrid,
    mountain_detail: NoiseGrid,
    forest: NoiseGrid,
    tree_detail: NoiseGrid,
}

#[cfg(feature = "parallel")]
fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    rayon::join(a, b)
}

#[cfg(not(feature = "parallel"))]
fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA,
    B: FnOnce() -> RB,
{
    (a(), b())
}

fn build_noise_grids(config: &GenerationConfig, seeds: StageSeeds) -> Result<NoiseGrids, ConfigError> {
    let layer = |offset: u64, params: &NoiseParams| {
        NoiseGrid::generate(config.width, config.height, seeds.stage(offset), params)
    };

    let ((elevation, detail), ((ridge, mountain_detail), (forest, tree_detail))) = join(
        || {
            join(
                || layer(offsets::TERRAIN, &layers::TERRAIN),
                || layer(offsets::DETAIL, &layers::DETAIL),
            )
        },
        || {
            join(
                || {
                    join(
                        || layer(offsets::MOUNTAIN_RIDGE, &layers::MOUNTAIN_RIDGE),
                        || layer(offsets::MOUNTAIN_DETAIL, &layers::MOUNTAIN_DETAIL),
                    )
                },
                || {
                    join(
                        || layer(offsets::FOREST, &layers::FOREST),
                        || layer(offsets::TREE_DETAIL, &layers::TREE_DETAIL),
                    )
                },
            )
        },
    );

    Ok(NoiseGrids {
        elevation: elevation?,
        detail: detail?,
        ridge: ridge?,
        mountain_detail: mountain_detail?,
        forest: forest?,
        tree_detail: tree_detail?,
    })
}

/// Генерирует карту мира.
///
/// # Ошибки
/// Только [`ConfigError`] от проверки конфигурации, до начала любой работы.
/// Нехватка мест для рек, городов или имён ошибкой не является: результат
/// просто содержит меньше объектов.
///
/// # Пример
/// ```
/// use fantasy_mapgen::{GenerationConfig, generate};
///
/// let config = GenerationConfig { width: 120, height: 90, ..Default::default() };
/// let a = generate(42, &config).unwrap();
/// let b = generate(42, &config).unwrap();
/// assert_eq!(a, b);
/// ```
pub fn generate(seed: u64, config: &GenerationConfig) -> Result<WorldMap, ConfigError> {
    config.validate()?;
    let seeds = StageSeeds::from_master(seed);
    let started = Instant::now();

    tracing::info!(
        target: "fantasy_mapgen::pipeline",
        seed,
        width = config.width,
        height = config.height,
        style = ?config.style,
        "pipeline.start"
    );

    let stage = Instant::now();
    let grids = build_noise_grids(config, seeds)?;
    tracing::debug!(
        target: "fantasy_mapgen::pipeline",
        elapsed_ms = stage.elapsed().as_millis() as u64,
        "pipeline.noise"
    );

    let stage = Instant::now();
    let terrain = classify_terrain(&grids.elevation, &grids.detail, config.ocean_depth, config.style);
    tracing::debug!(
        target: "fantasy_mapgen::pipeline",
        elapsed_ms = stage.elapsed().as_millis() as u64,
        land_ratio = terrain.land_ratio(),
        "pipeline.terrain"
    );

    let stage = Instant::now();
    let d = config.ocean_depth;
    let ((mountains, forests), (rivers, settlements)) = join(
        || {
            join(
                || {
                    place_mountains(
                        &grids.elevation,
                        &grids.ridge,
                        &grids.mountain_detail,
                        d,
                        config.mountain_density,
                    )
                },
                || {
                    place_forests(
                        &grids.elevation,
                        &grids.forest,
                        &grids.tree_detail,
                        d,
                        config.forest_density,
                        &mut seeds.jitter_rng(offsets::TREE_JITTER),
                    )
                },
            )
        },
        || {
            join(
                || {
                    trace_rivers(
                        &grids.elevation,
                        d,
                        config.river_count,
                        &mut seeds.rng(offsets::RIVERS),
                        &mut seeds.jitter_rng(offsets::RIVER_JITTER),
                    )
                },
                || {
                    place_settlements(
                        &grids.elevation,
                        d,
                        config.city_count,
                        &mut seeds.rng(offsets::SETTLEMENTS),
                    )
                },
            )
        },
    );
    tracing::debug!(
        target: "fantasy_mapgen::pipeline",
        elapsed_ms = stage.elapsed().as_millis() as u64,
        "pipeline.features"
    );

    let roads = if config.include_roads {
        build_road_network(&settlements, &mut seeds.jitter_rng(offsets::ROAD_JITTER))
    } else {
        RoadNetwork::default()
    };

    let labels = if config.include_labels {
        place_labels(&grids.elevation, &settlements, d, &mut seeds.rng(offsets::NAMES))
    } else {
        Vec::new()
    };

    tracing::info!(
        target: "fantasy_mapgen::pipeline",
        elapsed_ms = started.elapsed().as_millis() as u64,
        mountains = mountains.glyphs.len(),
        forests = forests.len(),
        rivers = rivers.len(),
        settlements = settlements.len(),
        roads = roads.edges.len(),
        labels = labels.len(),
        "pipeline.done"
    );

    Ok(WorldMap {
        seed,
        config: config.clone(),
        elevation: grids.elevation,
        terrain,
        mountains,
        forests,
        rivers,
        settlements,
        roads,
        labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> GenerationConfig {
        GenerationConfig {
            width: 160,
            height: 120,
            ..GenerationConfig::default()
        }
    }

    #[test]
    fn invalid_config_fails_fast() {
        let config = GenerationConfig {
            width: 0,
            ..small()
        };
        assert!(matches!(
            generate(1, &config),
            Err(ConfigError::InvalidDimensions { width: 0, .. })
        ));

        let config = GenerationConfig {
            ocean_depth: 1.5,
            ..small()
        };
        assert!(matches!(
            generate(1, &config),
            Err(ConfigError::OutOfRange { field: "ocean_depth", .. })
        ));

        let config = GenerationConfig {
            width: 64,
            height: 48,
            city_count: usize::MAX / 10,
            ..small()
        };
        assert!(matches!(
            generate(1, &config),
            Err(ConfigError::TooMany { field: "city_count", .. })
        ));

        let config = GenerationConfig {
            width: 64,
            height: 48,
            river_count: usize::MAX,
            ..small()
        };
        assert!(matches!(
            generate(1, &config),
            Err(ConfigError::TooMany { field: "river_count", .. })
        ));
    }

    #[test]
    fn grids_match_config_dimensions() {
        let map = generate(5, &small()).unwrap();
        assert_eq!(map.elevation.data.len(), 160 * 120);
        assert_eq!(map.terrain.bands.len(), 160 * 120);
        assert!(map.elevation.data.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn disabled_roads_and_labels_stay_empty() {
        let config = GenerationConfig {
            include_roads: false,
            include_labels: false,
            ocean_depth: 0.2,
            ..small()
        };
        let map = generate(9, &config).unwrap();
        assert!(map.roads.edges.is_empty());
        assert!(map.labels.is_empty());
    }

    #[test]
    fn json_skips_dense_grids() {
        let map = generate(3, &small()).unwrap();
        let json = serde_json::to_value(&map).unwrap();
        assert!(json.get("elevation").is_none());
        assert!(json.get("terrain").is_none());
        assert!(json.get("settlements").is_some());
        assert_eq!(json["seed"], 3);
    }
}
