use crate::config::MAX_FEATURE_COUNT;
use crate::noise::NoiseGrid;
use crate::rng::SeededRng;
use serde::Serialize;

/// Минимальное расстояние между городами в клетках
pub const MIN_SETTLEMENT_DISTANCE: f64 = 40.0;
/// Попыток на один запрошенный город
pub const ATTEMPTS_PER_SETTLEMENT: usize = 20;
/// Отступ области поиска от краёв карты
const EDGE_MARGIN: u32 = 30;

/// Город; идентифицируется индексом в списке
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settlement {
    pub x: u32,
    pub y: u32,
    /// Коэффициент размера в `[0.5, 1.1)`
    pub size: f64,
}

impl Settlement {
    #[must_use]
    pub fn distance_to(&self, other: &Settlement) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.hypot(dy)
    }

    /// Радиус значка города на карте
    #[must_use]
    pub fn marker_radius(&self) -> f64 {
        4.0 + (self.size * 5.0).floor()
    }
}

/// Отступ и ширина области поиска вдоль одной оси.
///
/// На картах уже двух отступов отступ сжимается до четверти размера.
pub(crate) fn inset_span(extent: u32, margin: u32) -> (u32, u32) {
    if extent > margin * 2 {
        (margin, extent - margin * 2)
    } else {
        let margin = extent / 4;
        (margin, extent - margin * 2)
    }
}

/// Размещает города выборкой с отклонением.
///
/// Кандидат принимается на пригодной суше `(d + 0.02, d + 0.5)` и не ближе
/// [`MIN_SETTLEMENT_DISTANCE`] к уже принятым. После `city_count × 20` попыток
/// поиск прекращается, и городов может оказаться меньше запрошенного.
pub fn place_settlements(
    elevation: &NoiseGrid,
    ocean_depth: f64,
    city_count: usize,
    rng: &mut SeededRng,
) -> Vec<Settlement> {
    let mut settlements: Vec<Settlement> = Vec::with_capacity(city_count.min(MAX_FEATURE_COUNT));
    let max_attempts = city_count.saturating_mul(ATTEMPTS_PER_SETTLEMENT);
    let (x0, x_span) = inset_span(elevation.width, EDGE_MARGIN);
    let (y0, y_span) = inset_span(elevation.height, EDGE_MARGIN);
    let (low, high) = (ocean_depth + 0.02, ocean_depth + 0.5);

    let mut attempts = 0;
    while settlements.len() < city_count && attempts < max_attempts {
        attempts += 1;
        let x = x0 + (rng.next_f64() * f64::from(x_span)).floor() as u32;
        let y = y0 + (rng.next_f64() * f64::from(y_span)).floor() as u32;
        if x >= elevation.width || y >= elevation.height {
            continue;
        }

        let value = elevation.get(x, y);
        if value <= low || value >= high {
            continue;
        }

        let candidate = Settlement { x, y, size: 0.0 };
        if settlements
            .iter()
            .any(|s| s.distance_to(&candidate) < MIN_SETTLEMENT_DISTANCE)
        {
            continue;
        }

        settlements.push(Settlement {
            size: rng.next_f64() * 0.6 + 0.5,
            ..candidate
        });
    }

    if settlements.len() < city_count {
        tracing::info!(
            target: "fantasy_mapgen::settlements",
            requested = city_count,
            placed = settlements.len(),
            attempts,
            "settlements.quota_unmet"
        );
    } else {
        tracing::debug!(
            target: "fantasy_mapgen::settlements",
            placed = settlements.len(),
            attempts,
            "settlements.placed"
        );
    }
    settlements
}
