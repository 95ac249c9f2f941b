// src/rng.rs
//! Детерминированные источники случайности
//!
//! Вся генерация карты опирается на два вида потоков:
//! - [`SeededRng`] — линейный конгруэнтный генератор, через который проходят все
//!   структурные решения (градиенты шума, старты рек, города, имена);
//! - [`StageSeeds::jitter_rng`] — `ChaCha8Rng` для чисто декоративного разброса
//!   (деревья, изгибы дорог, толщина рек).
//!
//! Каждый этап получает собственный сид `seed + смещение`, поэтому этапы
//! можно переставлять или выполнять параллельно без потери воспроизводимости.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const LCG_MULTIPLIER: u64 = 9301;
const LCG_INCREMENT: u64 = 49297;
const LCG_MODULUS: u64 = 233_280;

/// Линейный конгруэнтный генератор: `state = (state·9301 + 49297) mod 233280`.
///
/// Два экземпляра с одинаковым сидом выдают одинаковые последовательности.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    /// Создаёт поток из сида.
    ///
    /// Сид сразу приводится по модулю 233280: рекуррентность от этого не меняется,
    /// а умножение остаётся в пределах `u64`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed % LCG_MODULUS,
        }
    }

    /// Следующее значение в `[0, 1)`
    pub fn next_f64(&mut self) -> f64 {
        self.state = (self.state * LCG_MULTIPLIER + LCG_INCREMENT) % LCG_MODULUS;
        self.state as f64 / LCG_MODULUS as f64
    }

    /// Случайный индекс в `0..len` (`len > 0`)
    pub fn next_index(&mut self, len: usize) -> usize {
        ((self.next_f64() * len as f64) as usize).min(len.saturating_sub(1))
    }
}

/// Фиксированные смещения сидов для этапов конвейера
pub mod offsets {
    pub const TERRAIN: u64 = 0;
    pub const DETAIL: u64 = 1;
    pub const MOUNTAIN_RIDGE: u64 = 2;
    pub const MOUNTAIN_DETAIL: u64 = 3;
    pub const FOREST: u64 = 4;
    pub const TREE_DETAIL: u64 = 5;
    pub const RIVERS: u64 = 6;
    pub const SETTLEMENTS: u64 = 7;
    pub const NAMES: u64 = 8;
    pub const TEXTURE: u64 = 9;
    pub const TREE_JITTER: u64 = 10;
    pub const RIVER_JITTER: u64 = 11;
    pub const ROAD_JITTER: u64 = 12;

    pub const ALL: [u64; 13] = [
        TERRAIN,
        DETAIL,
        MOUNTAIN_RIDGE,
        MOUNTAIN_DETAIL,
        FOREST,
        TREE_DETAIL,
        RIVERS,
        SETTLEMENTS,
        NAMES,
        TEXTURE,
        TREE_JITTER,
        RIVER_JITTER,
        ROAD_JITTER,
    ];
}

/// Сиды всех этапов, выведенные из одного мастер-сида
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSeeds {
    pub master: u64,
}

impl StageSeeds {
    #[must_use]
    pub fn from_master(master: u64) -> Self {
        Self { master }
    }

    /// Сид этапа: `master + offset`
    #[must_use]
    pub fn stage(self, offset: u64) -> u64 {
        self.master.wrapping_add(offset)
    }

    /// Структурный LCG-поток этапа
    #[must_use]
    pub fn rng(self, offset: u64) -> SeededRng {
        SeededRng::new(self.stage(offset))
    }

    /// Декоративный поток этапа
    #[must_use]
    pub fn jitter_rng(self, offset: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.stage(offset))
    }
}
