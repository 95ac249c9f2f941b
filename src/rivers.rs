// src/rivers.rs
//! Прокладка рек методом наискорейшего спуска
//!
//! Река стартует на холмах во внутренних 80% карты и на каждом шаге уходит
//! в самого низкого из 8 соседей, который строго ниже текущей клетки.
//! Любая неудача (нет старта, яма сразу у истока) не прерывает конвейер:
//! река просто выходит короче или не появляется вовсе.

use crate::config::MAX_FEATURE_COUNT;
use crate::noise::NoiseGrid;
use crate::rng::SeededRng;
use rand::Rng;
use serde::Serialize;

/// Предел шагов одной реки
pub const MAX_RIVER_STEPS: usize = 1500;
/// Сколько случайных точек перебрать в поисках истока
pub const MAX_START_ATTEMPTS: usize = 200;

const RIVER_WIDTH_STEP: f64 = 0.2;
const RIVER_MAX_WIDTH: f64 = 4.0;
const RIVER_WIDTH_INTERVAL: usize = 50;

const NEIGHBORS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Почему река остановилась
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiverTermination {
    /// Дошла до уровня океана
    ReachedSea,
    /// Застряла в локальном минимуме
    Pit,
    /// Исчерпала лимит шагов
    StepCap,
}

/// Путь реки от истока вниз по склону
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiverPath {
    pub cells: Vec<(u32, u32)>,
    pub termination: RiverTermination,
    /// Начальная толщина штриха (декоративная)
    pub base_width: f64,
}

impl RiverPath {
    /// Количество сделанных шагов
    #[must_use]
    pub fn steps(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }

    /// Толщина штриха на шаге `step`: +0.2 каждые 50 шагов, пока меньше 4.0
    #[must_use]
    pub fn width_at(&self, step: usize) -> f64 {
        let mut width = self.base_width;
        for _ in 0..=step / RIVER_WIDTH_INTERVAL {
            if width >= RIVER_MAX_WIDTH {
                break;
            }
            width += RIVER_WIDTH_STEP;
        }
        width
    }
}

/// Ищет исток во внутренних 80% карты на высоте `(d + 0.3, d + 0.55)`.
fn find_source(elevation: &NoiseGrid, ocean_depth: f64, rng: &mut SeededRng) -> Option<(u32, u32)> {
    let w = f64::from(elevation.width);
    let h = f64::from(elevation.height);
    let (low, high) = (ocean_depth + 0.3, ocean_depth + 0.55);

    for _ in 0..MAX_START_ATTEMPTS {
        let x = ((rng.next_f64() * (w * 0.8)).floor() + w * 0.1).floor() as u32;
        let y = ((rng.next_f64() * (h * 0.8)).floor() + h * 0.1).floor() as u32;
        let x = x.min(elevation.width - 1);
        let y = y.min(elevation.height - 1);
        let value = elevation.get(x, y);
        if value > low && value < high {
            return Some((x, y));
        }
    }
    None
}

/// Следует по склону от `start`, пока не дойдёт до моря, ямы или лимита шагов.
///
/// Соседи просматриваются построчно; среди строго более низких выбирается самый
/// низкий, при равенстве — первый по порядку просмотра. Клетка, из которой река
/// только что пришла, исключается.
#[must_use]
pub fn trace_river(
    elevation: &NoiseGrid,
    start: (u32, u32),
    ocean_depth: f64,
    base_width: f64,
) -> RiverPath {
    let width = elevation.width as i32;
    let height = elevation.height as i32;
    let mut cells = vec![start];
    let (mut x, mut y) = start;
    let mut current = elevation.get(x, y);
    let mut steps = 0;

    let termination = loop {
        if current <= ocean_depth {
            break RiverTermination::ReachedSea;
        }
        if steps >= MAX_RIVER_STEPS {
            break RiverTermination::StepCap;
        }

        let previous = cells.len().checked_sub(2).map(|i| cells[i]);
        let next = NEIGHBORS
            .iter()
            .filter_map(|&(dx, dy)| {
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                if nx < 0 || ny < 0 || nx >= width || ny >= height {
                    return None;
                }
                let cell = (nx as u32, ny as u32);
                if previous == Some(cell) {
                    return None;
                }
                let value = elevation.get(cell.0, cell.1);
                (value < current).then_some((cell, value))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1));

        let Some((cell, value)) = next else {
            break RiverTermination::Pit;
        };

        (x, y) = cell;
        current = value;
        cells.push(cell);
        steps += 1;
    };

    RiverPath {
        cells,
        termination,
        base_width,
    }
}

/// Прокладывает до `river_count` рек.
///
/// `rng` решает, где реки начинаются; `jitter` задаёт только начальную толщину штриха.
pub fn trace_rivers<R: Rng>(
    elevation: &NoiseGrid,
    ocean_depth: f64,
    river_count: usize,
    rng: &mut SeededRng,
    jitter: &mut R,
) -> Vec<RiverPath> {
    let mut rivers = Vec::with_capacity(river_count.min(MAX_FEATURE_COUNT));

    for index in 0..river_count {
        let Some(start) = find_source(elevation, ocean_depth, rng) else {
            tracing::debug!(
                target: "fantasy_mapgen::rivers",
                index,
                attempts = MAX_START_ATTEMPTS,
                "rivers.no_start"
            );
            continue;
        };

        let base_width = 0.5 + jitter.gen_range(0.0..1.0) * 1.5;
        let river = trace_river(elevation, start, ocean_depth, base_width);
        tracing::debug!(
            target: "fantasy_mapgen::rivers",
            index,
            sx = start.0,
            sy = start.1,
            steps = river.steps(),
            termination = ?river.termination,
            "rivers.traced"
        );
        rivers.push(river);
    }

    tracing::info!(
        target: "fantasy_mapgen::rivers",
        requested = river_count,
        traced = rivers.len(),
        "rivers.done"
    );
    rivers
}
