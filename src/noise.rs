// src/noise.rs
//! Многооктавный градиентный шум
//!
//! Одна сетка строится один раз на кортеж `(сид, масштаб, октавы, persistence, lacunarity)`
//! и дальше только читается. Одинаковые параметры всегда дают побитово одинаковую сетку.

use crate::config::{ConfigError, NoiseParams};
use crate::rng::SeededRng;
use image::{ImageBuffer, Luma};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::f64::consts::TAU;

/// Классический градиентный шум на сетке с таблицей перестановок
#[derive(Debug, Clone)]
pub struct GradientNoise {
    gradients: [[f64; 2]; 256],
    perm: [u8; 512], // 256 значений, продублированных
}

impl GradientNoise {
    /// Строит градиенты и таблицу перестановок из одного LCG-потока.
    ///
    /// Порядок вызовов генератора фиксирован: сначала 256 углов градиентов,
    /// затем перемешивание Фишера–Йетса.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut rng = SeededRng::new(seed);

        let mut gradients = [[0.0; 2]; 256];
        for g in &mut gradients {
            let angle = rng.next_f64() * TAU;
            *g = [angle.cos(), angle.sin()];
        }

        let mut p: [u8; 256] = std::array::from_fn(|i| i as u8);
        for i in (1..256).rev() {
            let j = (rng.next_f64() * (i + 1) as f64) as usize;
            p.swap(i, j);
        }

        // Удвоенная таблица: индексы до 511 без взятия по модулю
        let perm = std::array::from_fn(|i| p[i & 255]);

        Self { gradients, perm }
    }

    // 6t^5 − 15t^4 + 10t^3: первая и вторая производные равны нулю на концах
    #[inline]
    fn fade(t: f64) -> f64 {
        t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
    }

    #[inline]
    fn lerp(t: f64, a: f64, b: f64) -> f64 {
        a + t * (b - a)
    }

    #[inline]
    fn grad(&self, hash: u8, x: f64, y: f64) -> f64 {
        let g = self.gradients[hash as usize];
        g[0] * x + g[1] * y
    }

    /// Одна октава шума в точке `(x, y)`, примерно в `[-1, 1]`
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let fx = x.floor();
        let fy = y.floor();
        let xi = (fx as i64 & 255) as usize;
        let yi = (fy as i64 & 255) as usize;
        let xf = x - fx;
        let yf = y - fy;

        let u = Self::fade(xf);
        let v = Self::fade(yf);

        let a = self.perm[xi] as usize + yi;
        let b = self.perm[xi + 1] as usize + yi;
        let aa = self.perm[a];
        let ab = self.perm[a + 1];
        let ba = self.perm[b];
        let bb = self.perm[b + 1];

        Self::lerp(
            v,
            Self::lerp(u, self.grad(aa, xf, yf), self.grad(ba, xf - 1.0, yf)),
            Self::lerp(
                u,
                self.grad(ab, xf, yf - 1.0),
                self.grad(bb, xf - 1.0, yf - 1.0),
            ),
        )
    }

    /// Сумма октав в клетке `(x, y)`, нормированная в `[0, 1]`
    #[must_use]
    pub fn fractal(&self, x: f64, y: f64, params: &NoiseParams) -> f64 {
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut total = 0.0;
        let mut max_amplitude = 0.0;

        for _ in 0..params.octaves {
            let sx = x / params.scale * frequency;
            let sy = y / params.scale * frequency;
            total += self.sample(sx, sy) * amplitude;
            max_amplitude += amplitude;
            amplitude *= params.persistence;
            frequency *= params.lacunarity;
        }

        ((total / max_amplitude + 1.0) / 2.0).clamp(0.0, 1.0)
    }
}

/// Плотная двумерная сетка значений шума в `[0, 1]`, индекс `y * width + x`
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseGrid {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f64>,
}

impl NoiseGrid {
    /// Генерирует сетку шума.
    ///
    /// # Ошибки
    /// [`ConfigError`] при нулевых размерах или некорректных параметрах шума.
    pub fn generate(
        width: u32,
        height: u32,
        seed: u64,
        params: &NoiseParams,
    ) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidDimensions { width, height });
        }
        params.validate()?;

        let noise = GradientNoise::new(seed);
        let row_len = width as usize;
        let mut data = vec![0.0; row_len * height as usize];

        let fill_row = |(y, row): (usize, &mut [f64])| {
            for (x, cell) in row.iter_mut().enumerate() {
                *cell = noise.fractal(x as f64, y as f64, params);
            }
        };

        // Строки независимы, результат не зависит от порядка вычисления
        #[cfg(feature = "parallel")]
        data.par_chunks_mut(row_len).enumerate().for_each(fill_row);
        #[cfg(not(feature = "parallel"))]
        data.chunks_mut(row_len).enumerate().for_each(fill_row);

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Оборачивает готовые данные (например, синтетический рельеф в тестах)
    ///
    /// # Паника
    /// Если длина `data` не равна `width * height`.
    #[must_use]
    pub fn from_raw(width: u32, height: u32, data: Vec<f64>) -> Self {
        assert_eq!(
            data.len(),
            width as usize * height as usize,
            "grid data length must equal width * height"
        );
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    #[must_use]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> f64 {
        self.data[self.index(x, y)]
    }

    #[must_use]
    pub fn to_grayscale_image(&self) -> Vec<u8> {
        self.data
            .iter()
            .map(|&v| (v.clamp(0.0, 1.0) * 255.0) as u8)
            .collect()
    }

    pub fn save_as_png(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let img: ImageBuffer<Luma<u8>, Vec<u8>> =
            ImageBuffer::from_raw(self.width, self.height, self.to_grayscale_image())
                .ok_or("Failed to create image buffer")?;
        img.save(path)?;
        Ok(())
    }
}
