use crate::noise::NoiseGrid;
use crate::rng::SeededRng;
use crate::settlements::{Settlement, inset_span};
use serde::Serialize;
use std::collections::HashSet;

/// Имена городов
pub const SETTLEMENT_NAMES: [&str; 24] = [
    "Silverhaven",
    "Ironwood",
    "Stormcliff",
    "Moonbright",
    "Shadowfen",
    "Goldcrest",
    "Riverbend",
    "Oakhaven",
    "Dragonspyre",
    "Frostford",
    "Sunstone",
    "Mistvale",
    "Stonebridge",
    "Windhelm",
    "Deepwood",
    "Starfall",
    "Winterpeak",
    "Emberglow",
    "Whisperwind",
    "Ravenrock",
    "Clearwater",
    "Barrowdown",
    "Greyfang",
    "Seacliff",
];

/// Имена регионов
pub const REGION_NAMES: [&str; 15] = [
    "The Whispering Plains",
    "Mountains of Echoes",
    "Emerald Forest",
    "Sea of Lost Souls",
    "Frozen Expanse",
    "Sunken Kingdom",
    "Dragon's Tooth Peaks",
    "The Twilight Marsh",
    "Crystal Canyons",
    "Fields of Renewal",
    "The Jagged Coast",
    "Vale of Ancients",
    "Barren Wastes",
    "Shadowlands",
    "Isles of Mist",
];

/// Смещение подписи города под значок
const SETTLEMENT_LABEL_OFFSET: f64 = 14.0;
const REGION_MARGIN_X: u32 = 100;
const REGION_MARGIN_Y: u32 = 50;
const REGION_ANCHOR_ATTEMPTS: usize = 50;

/// Тип местности под подписью региона
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RegionTerrain {
    Water,
    Mountain,
    Land,
}

impl RegionTerrain {
    #[must_use]
    pub fn classify(value: f64, ocean_depth: f64) -> Self {
        if value < ocean_depth - 0.05 {
            RegionTerrain::Water
        } else if value > ocean_depth + 0.5 {
            RegionTerrain::Mountain
        } else {
            RegionTerrain::Land
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LabelKind {
    /// Подпись города с индексом `index` в списке городов
    Settlement { index: usize },
    Region { terrain: RegionTerrain },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelAssignment {
    pub text: String,
    pub anchor: (f64, f64),
    pub kind: LabelKind,
}

/// Берёт из пула имя, которое ещё не использовано.
///
/// Делает до `2 × pool.len()` попыток. Если свободного имени так и не нашлось,
/// возвращает `None`: подпись пропускается, а не дублируется.
fn draw_unique<'a>(
    pool: &[&'a str],
    used: &mut HashSet<&'a str>,
    rng: &mut SeededRng,
) -> Option<&'a str> {
    for _ in 0..pool.len() * 2 {
        let name = pool[rng.next_index(pool.len())];
        if used.insert(name) {
            return Some(name);
        }
    }
    None
}

fn find_region_anchor(elevation: &NoiseGrid, rng: &mut SeededRng) -> Option<(u32, u32, f64)> {
    let (x0, x_span) = inset_span(elevation.width, REGION_MARGIN_X);
    let (y0, y_span) = inset_span(elevation.height, REGION_MARGIN_Y);

    for _ in 0..REGION_ANCHOR_ATTEMPTS {
        let x = (x0 + (rng.next_f64() * f64::from(x_span)).floor() as u32).min(elevation.width - 1);
        let y = (y0 + (rng.next_f64() * f64::from(y_span)).floor() as u32).min(elevation.height - 1);
        let value = elevation.get(x, y);
        // Нулевая высота — край шума, подпись туда не ставим
        if value > 0.0 {
            return Some((x, y, value));
        }
    }
    None
}

/// Подписывает города и от 4 до 6 регионов.
///
/// Сначала именуются города (по порядку), затем из того же потока берутся
/// число регионов, их якоря и имена. Имена уникальны в пределах своего пула.
pub fn place_labels(
    elevation: &NoiseGrid,
    settlements: &[Settlement],
    ocean_depth: f64,
    rng: &mut SeededRng,
) -> Vec<LabelAssignment> {
    let mut labels = Vec::with_capacity(settlements.len() + 6);
    let mut skipped = 0;

    let mut used = HashSet::new();
    for (index, settlement) in settlements.iter().enumerate() {
        let Some(name) = draw_unique(&SETTLEMENT_NAMES, &mut used, rng) else {
            skipped += 1;
            continue;
        };
        labels.push(LabelAssignment {
            text: name.to_owned(),
            anchor: (
                f64::from(settlement.x),
                f64::from(settlement.y) + SETTLEMENT_LABEL_OFFSET,
            ),
            kind: LabelKind::Settlement { index },
        });
    }

    let region_count = 4 + rng.next_index(3);
    let mut used = HashSet::new();
    for _ in 0..region_count {
        let Some((x, y, value)) = find_region_anchor(elevation, rng) else {
            skipped += 1;
            continue;
        };
        let Some(name) = draw_unique(&REGION_NAMES, &mut used, rng) else {
            skipped += 1;
            continue;
        };
        labels.push(LabelAssignment {
            text: name.to_owned(),
            anchor: (f64::from(x), f64::from(y)),
            kind: LabelKind::Region {
                terrain: RegionTerrain::classify(value, ocean_depth),
            },
        });
    }

    if skipped > 0 {
        tracing::info!(
            target: "fantasy_mapgen::labels",
            skipped,
            placed = labels.len(),
            "labels.pool_exhausted"
        );
    }
    tracing::debug!(
        target: "fantasy_mapgen::labels",
        settlements = settlements.len(),
        regions = region_count,
        labels = labels.len(),
        "labels.placed"
    );
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(width: u32, height: u32, value: f64) -> NoiseGrid {
        NoiseGrid::from_raw(width, height, vec![value; (width * height) as usize])
    }

    fn grid_of_towns(count: u32) -> Vec<Settlement> {
        (0..count)
            .map(|i| Settlement {
                x: 40 + (i % 10) * 40,
                y: 40 + (i / 10) * 40,
                size: 0.7,
            })
            .collect()
    }

    fn region_labels(labels: &[LabelAssignment]) -> Vec<&LabelAssignment> {
        labels
            .iter()
            .filter(|l| matches!(l.kind, LabelKind::Region { .. }))
            .collect()
    }

    #[test]
    fn names_are_unique_per_kind() {
        let grid = flat(600, 400, 0.5);
        let towns = grid_of_towns(12);
        let labels = place_labels(&grid, &towns, 0.4, &mut SeededRng::new(12345 + 8));

        let mut seen = HashSet::new();
        for label in labels.iter().filter(|l| matches!(l.kind, LabelKind::Settlement { .. })) {
            assert!(seen.insert(label.text.as_str()), "duplicate {}", label.text);
            assert!(SETTLEMENT_NAMES.contains(&label.text.as_str()));
        }
        let mut seen = HashSet::new();
        for label in region_labels(&labels) {
            assert!(seen.insert(label.text.as_str()), "duplicate {}", label.text);
            assert!(REGION_NAMES.contains(&label.text.as_str()));
        }
    }

    #[test]
    fn settlement_labels_sit_below_markers() {
        let grid = flat(600, 400, 0.5);
        let towns = grid_of_towns(5);
        let labels = place_labels(&grid, &towns, 0.4, &mut SeededRng::new(7));
        for label in &labels {
            if let LabelKind::Settlement { index } = label.kind {
                let town = &towns[index];
                assert_eq!(label.anchor, (f64::from(town.x), f64::from(town.y) + 14.0));
            }
        }
    }

    #[test]
    fn four_to_six_regions_without_settlements() {
        let grid = flat(800, 600, 0.5);
        for seed in 0..50 {
            let labels = place_labels(&grid, &[], 0.4, &mut SeededRng::new(seed));
            assert!((4..=6).contains(&labels.len()), "seed {seed}");
            for label in &labels {
                assert!(!label.text.is_empty());
                let (x, y) = label.anchor;
                assert!((100.0..700.0).contains(&x));
                assert!((50.0..550.0).contains(&y));
            }
        }
    }

    #[test]
    fn region_terrain_classification() {
        assert_eq!(RegionTerrain::classify(0.5, 0.65), RegionTerrain::Water);
        assert_eq!(RegionTerrain::classify(0.62, 0.65), RegionTerrain::Land);
        assert_eq!(RegionTerrain::classify(0.9, 0.3), RegionTerrain::Mountain);

        let labels = place_labels(&flat(400, 300, 0.1), &[], 0.5, &mut SeededRng::new(3));
        assert!(labels.iter().all(|l| l.kind == LabelKind::Region {
            terrain: RegionTerrain::Water
        }));
    }

    #[test]
    fn exhausted_pool_skips_instead_of_duplicating() {
        let grid = flat(600, 400, 0.5);
        let towns = grid_of_towns(30);
        let labels = place_labels(&grid, &towns, 0.4, &mut SeededRng::new(11));
        let settlement_labels = labels
            .iter()
            .filter(|l| matches!(l.kind, LabelKind::Settlement { .. }))
            .count();
        assert!(settlement_labels <= SETTLEMENT_NAMES.len());
        let unique: HashSet<_> = labels
            .iter()
            .filter(|l| matches!(l.kind, LabelKind::Settlement { .. }))
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(unique.len(), settlement_labels);
    }

    #[test]
    fn zero_elevation_map_has_no_region_anchor() {
        let labels = place_labels(&flat(300, 200, 0.0), &[], 0.5, &mut SeededRng::new(5));
        assert!(labels.is_empty());
    }

    #[test]
    fn labels_are_reproducible() {
        let grid = flat(500, 400, 0.5);
        let towns = grid_of_towns(7);
        let a = place_labels(&grid, &towns, 0.4, &mut SeededRng::new(99));
        let b = place_labels(&grid, &towns, 0.4, &mut SeededRng::new(99));
        assert_eq!(a, b);
    }
}
