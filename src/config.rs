// src/config.rs
//! Конфигурация генерации карты
//!
//! Этот модуль определяет все параметры, управляющие процедурной генерацией:
//! - Размеры карты и стиль оформления
//! - Плотность гор и лесов, уровень океана
//! - Количество рек и городов, включение дорог и подписей
//! - Параметры слоёв шума
//!
//! Все структуры поддерживают сериализацию в TOML/JSON для удобной настройки через конфигурационные файлы.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Ошибки конфигурации: единственный класс ошибок, который видит вызывающая сторона.
///
/// Нехватка мест для рек, городов или имён ошибкой не считается.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("map dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("{field} must lie in [0, 1], got {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("{field} must not exceed {max}, got {value}")]
    TooMany {
        field: &'static str,
        value: usize,
        max: usize,
    },
    #[error("noise parameter {field} must be positive and finite, got {value}")]
    InvalidNoise { field: &'static str, value: f64 },
    #[error("failed to read config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Верхний предел `river_count` и `city_count`
pub const MAX_FEATURE_COUNT: usize = 10_000;

/// Стиль оформления карты
///
/// Влияет только на палитру и силу цветового шума, но не на классификацию рельефа.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MapStyle {
    /// Приглушённые тона старого пергамента
    #[default]
    Parchment,
    /// Полноцветная карта
    Color,
}

impl MapStyle {
    /// Сила влияния шума детализации на цвет клетки.
    ///
    /// # Примеры
    /// ```
    /// use fantasy_mapgen::config::MapStyle;
    /// assert_eq!(MapStyle::Color.detail_influence(), 0.1);
    /// assert_eq!(MapStyle::Parchment.detail_influence(), 0.05);
    /// ```
    #[must_use]
    pub fn detail_influence(self) -> f64 {
        match self {
            MapStyle::Color => 0.1,
            MapStyle::Parchment => 0.05, // на пергаменте вариации слабее
        }
    }
}

/// Параметры одного слоя градиентного шума
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseParams {
    /// Масштаб в клетках: чем больше, тем крупнее формы
    pub scale: f64,
    /// Количество октав
    pub octaves: u32,
    /// Множитель амплитуды на каждую октаву
    pub persistence: f64,
    /// Множитель частоты на каждую октаву
    pub lacunarity: f64,
}

impl NoiseParams {
    #[must_use]
    pub const fn new(scale: f64, octaves: u32, persistence: f64, lacunarity: f64) -> Self {
        Self {
            scale,
            octaves,
            persistence,
            lacunarity,
        }
    }

    /// Проверяет, что все параметры положительны и конечны
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("scale", self.scale),
            ("persistence", self.persistence),
            ("lacunarity", self.lacunarity),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidNoise { field, value });
            }
        }
        if self.octaves == 0 {
            return Err(ConfigError::InvalidNoise {
                field: "octaves",
                value: 0.0,
            });
        }
        Ok(())
    }
}

/// Слои шума, используемые конвейером
pub mod layers {
    use super::NoiseParams;

    /// Основной рельеф
    pub const TERRAIN: NoiseParams = NoiseParams::new(100.0, 8, 0.5, 2.0);
    /// Цветовые вариации рельефа
    pub const DETAIL: NoiseParams = NoiseParams::new(50.0, 6, 0.6, 2.2);
    /// Горные хребты
    pub const MOUNTAIN_RIDGE: NoiseParams = NoiseParams::new(150.0, 4, 0.6, 2.1);
    /// Форма отдельных вершин
    pub const MOUNTAIN_DETAIL: NoiseParams = NoiseParams::new(30.0, 5, 0.5, 2.0);
    /// Плотность лесных массивов
    pub const FOREST: NoiseParams = NoiseParams::new(60.0, 5, 0.55, 2.1);
    /// Размер отдельных рощ
    pub const TREE_DETAIL: NoiseParams = NoiseParams::new(15.0, 4, 0.6, 2.0);
}

/// Основные параметры генерации карты
///
/// Неизменяемы в течение одного запуска генерации.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Ширина карты в клетках (по умолчанию 800)
    #[serde(default = "default_width")]
    pub width: u32,

    /// Высота карты в клетках (по умолчанию 600)
    #[serde(default = "default_height")]
    pub height: u32,

    /// Плотность гор: `0.0` — редкие одиночные пики, `1.0` — сплошные хребты
    #[serde(default = "default_mountain_density")]
    pub mountain_density: f64,

    /// Плотность лесов: `0.0` — почти без лесов, `1.0` — густые леса
    #[serde(default = "default_forest_density")]
    pub forest_density: f64,

    /// Уровень океана: всё, что ниже, считается водой
    #[serde(default = "default_ocean_depth")]
    pub ocean_depth: f64,

    /// Сколько рек попытаться проложить
    #[serde(default = "default_river_count")]
    pub river_count: usize,

    /// Сколько городов попытаться разместить
    #[serde(default = "default_city_count")]
    pub city_count: usize,

    /// Строить ли дороги между городами
    #[serde(default = "default_true")]
    pub include_roads: bool,

    /// Подписывать ли города и регионы
    #[serde(default = "default_true")]
    pub include_labels: bool,

    /// Стиль оформления (по умолчанию пергамент)
    #[serde(default)]
    pub style: MapStyle,
}

fn default_width() -> u32 {
    800
}
fn default_height() -> u32 {
    600
}
fn default_mountain_density() -> f64 {
    0.5
}
fn default_forest_density() -> f64 {
    0.6
}
fn default_ocean_depth() -> f64 {
    0.65
}
fn default_river_count() -> usize {
    5
}
fn default_city_count() -> usize {
    7
}
fn default_true() -> bool {
    true
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            mountain_density: 0.5,
            forest_density: 0.6,
            ocean_depth: 0.65,
            river_count: 5,
            city_count: 7,
            include_roads: true,
            include_labels: true,
            style: MapStyle::Parchment,
        }
    }
}

impl GenerationConfig {
    /// Проверяет конфигурацию до начала любой генерации
    ///
    /// # Ошибки
    /// - нулевая ширина или высота;
    /// - плотности или уровень океана вне `[0, 1]`;
    /// - рек или городов больше [`MAX_FEATURE_COUNT`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        for (field, value) in [
            ("mountain_density", self.mountain_density),
            ("forest_density", self.forest_density),
            ("ocean_depth", self.ocean_depth),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }
        for (field, value) in [
            ("river_count", self.river_count),
            ("city_count", self.city_count),
        ] {
            if value > MAX_FEATURE_COUNT {
                return Err(ConfigError::TooMany {
                    field,
                    value,
                    max: MAX_FEATURE_COUNT,
                });
            }
        }
        Ok(())
    }
}

/// Файл описания мира: сид плюс параметры генерации
///
/// # Пример
/// ```toml
/// # world.toml
/// seed = 42
/// width = 1024
/// height = 512
/// city_count = 12
/// style = "Color"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldFile {
    /// Сид генератора случайных чисел (детерминированная генерация)
    #[serde(default)]
    pub seed: u64,

    #[serde(flatten)]
    pub config: GenerationConfig,
}

impl WorldFile {
    /// Загружает описание мира из TOML-файла
    ///
    /// # Ошибки
    /// Возвращает ошибку, если файл не найден или содержит недопустимый формат.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Разбирает описание мира из строки TOML
    ///
    /// ```
    /// use fantasy_mapgen::config::{MapStyle, WorldFile};
    /// let world = WorldFile::from_toml_str("seed = 7\nstyle = \"Color\"").unwrap();
    /// assert_eq!(world.seed, 7);
    /// assert_eq!(world.config.style, MapStyle::Color);
    /// assert_eq!(world.config.width, 800);
    /// ```
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let world: Self = toml::from_str(contents)?;
        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(GenerationConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_dimensions_rejected() {
        let config = GenerationConfig {
            width: 0,
            ..GenerationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDimensions { width: 0, .. })
        ));
    }

    #[test]
    fn densities_out_of_range_rejected() {
        let config = GenerationConfig {
            forest_density: 1.5,
            ..GenerationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                field: "forest_density",
                ..
            })
        ));

        let config = GenerationConfig {
            ocean_depth: f64::NAN,
            ..GenerationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn huge_feature_counts_rejected() {
        let config = GenerationConfig {
            city_count: usize::MAX / 10,
            ..GenerationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooMany {
                field: "city_count",
                ..
            })
        ));

        let config = GenerationConfig {
            river_count: MAX_FEATURE_COUNT + 1,
            ..GenerationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooMany {
                field: "river_count",
                ..
            })
        ));

        let config = GenerationConfig {
            city_count: MAX_FEATURE_COUNT,
            river_count: MAX_FEATURE_COUNT,
            ..GenerationConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn noise_params_validation() {
        assert!(layers::TERRAIN.validate().is_ok());
        assert!(NoiseParams::new(0.0, 4, 0.5, 2.0).validate().is_err());
        assert!(NoiseParams::new(-3.0, 4, 0.5, 2.0).validate().is_err());
        assert!(NoiseParams::new(10.0, 0, 0.5, 2.0).validate().is_err());
        assert!(NoiseParams::new(10.0, 4, f64::INFINITY, 2.0).validate().is_err());
    }

    #[test]
    fn toml_fills_defaults() {
        let world = WorldFile::from_toml_str(
            r#"
            seed = 12345
            river_count = 0
            include_roads = false
            "#,
        )
        .unwrap();
        assert_eq!(world.seed, 12345);
        assert_eq!(world.config.river_count, 0);
        assert!(!world.config.include_roads);
        assert!(world.config.include_labels);
        assert_eq!(world.config.city_count, 7);
        assert_eq!(world.config.style, MapStyle::Parchment);
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = WorldFile::from_toml_str("seed = \"abc\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = WorldFile::from_toml_file("/nonexistent/world.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
