// src/render.rs
//! Эталонный растровый рендерер карты
//!
//! Рендерер не входит в ядро генерации: он только читает готовый [`WorldMap`]
//! и рисует его через `imageproc`. Полупрозрачные заливки идут через
//! [`Blend`], толстые линии (реки, дороги) сначала штампуются кругами в маску,
//! а затем накладываются одним цветом, чтобы перекрытия не темнели.
//! Подписи не растеризуются.

use crate::config::MapStyle;
use crate::forests::ForestClump;
use crate::mountains::MountainLayer;
use crate::pipeline::WorldMap;
use crate::rivers::RiverPath;
use crate::rng::{SeededRng, StageSeeds, offsets};
use crate::roads::RoadNetwork;
use crate::settlements::Settlement;
use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::drawing::{Blend, draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;

const PARCHMENT_OVERLAY: [u8; 3] = [227, 217, 187];
const PARCHMENT_BORDER: [u8; 3] = [0x7A, 0x6A, 0x5A];
const TEXTURE_STRENGTH: f64 = 15.0;
const ROAD_DASH: f64 = 2.0;

fn rgba(rgb: [u8; 3], alpha: f64) -> Rgba<u8> {
    Rgba([rgb[0], rgb[1], rgb[2], (alpha.clamp(0.0, 1.0) * 255.0).round() as u8])
}

/// Цвета объектов для стиля оформления
struct Palette {
    snow: Rgba<u8>,
    highlight: Rgba<u8>,
    tree: Rgba<u8>,
    river: ([u8; 3], f64),
    road: [u8; 3],
    road_radius: i32,
    city_fill: Rgba<u8>,
    city_outline: Rgba<u8>,
    city_center: Rgba<u8>,
}

impl Palette {
    fn for_style(style: MapStyle) -> Self {
        match style {
            MapStyle::Color => Self {
                snow: rgba([245, 245, 245], 0.8),
                highlight: rgba([200, 200, 195], 0.6),
                tree: rgba([0x3A, 0x61, 0x3A], 1.0),
                river: ([65, 105, 170], 0.9),
                road: [0xB8, 0x86, 0x0B],
                road_radius: 1,
                city_fill: rgba([0xA0, 0x52, 0x2D], 1.0),
                city_outline: rgba([0x40, 0x25, 0x10], 1.0),
                city_center: rgba([0xD2, 0xB4, 0x8C], 1.0),
            },
            MapStyle::Parchment => Self {
                snow: rgba([230, 230, 225], 0.7),
                highlight: rgba([210, 210, 205], 0.5),
                tree: rgba([0x6A, 0x78, 0x5A], 1.0),
                river: ([150, 140, 110], 0.8),
                road: [0xA0, 0x52, 0x2D],
                road_radius: 0,
                city_fill: rgba([0x8B, 0x45, 0x13], 1.0),
                city_outline: rgba([0x30, 0x1A, 0x0A], 1.0),
                city_center: rgba([0xC1, 0xA8, 0x7C], 1.0),
            },
        }
    }

    fn mountain(style: MapStyle, shade: f64) -> Rgba<u8> {
        match style {
            MapStyle::Color => {
                let lift = shade * 20.0;
                rgba(
                    [(100.0 + lift) as u8, (90.0 + lift) as u8, (80.0 + lift) as u8],
                    0.6,
                )
            }
            MapStyle::Parchment => rgba([80, 75, 70], 0.3 + shade * 0.3),
        }
    }
}

/// Заливает многоугольник, пропуская вырожденные.
///
/// `draw_polygon_mut` паникует, если первая точка совпадает с последней.
fn fill_polygon(canvas: &mut Blend<RgbaImage>, points: &[(f64, f64)], color: Rgba<u8>) {
    let mut poly: Vec<Point<i32>> = Vec::with_capacity(points.len());
    for &(x, y) in points {
        let p = Point::new(x.round() as i32, y.round() as i32);
        if poly.last() != Some(&p) {
            poly.push(p);
        }
    }
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    if poly.len() >= 3 {
        draw_polygon_mut(canvas, &poly, color);
    }
}

/// Штампует отрезок толщиной `2·radius + 1` в маску
fn stamp_segment(mask: &mut GrayImage, from: (f64, f64), to: (f64, f64), radius: i32) {
    let length = (to.0 - from.0).hypot(to.1 - from.1);
    let steps = length.ceil().max(1.0) as usize;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let x = from.0 + (to.0 - from.0) * t;
        let y = from.1 + (to.1 - from.1) * t;
        draw_filled_circle_mut(mask, (x.round() as i32, y.round() as i32), radius, Luma([255]));
    }
}

/// Накладывает цвет по маске
fn composite_mask(image: &mut RgbaImage, mask: &GrayImage, rgb: [u8; 3], alpha: f64) {
    for (pixel, coverage) in image.pixels_mut().zip(mask.pixels()) {
        if coverage[0] > 0 {
            mix(pixel, rgb, alpha * f64::from(coverage[0]) / 255.0);
        }
    }
}

fn mix(pixel: &mut Rgba<u8>, rgb: [u8; 3], alpha: f64) {
    for (channel, target) in pixel.0.iter_mut().zip(rgb) {
        let value = f64::from(*channel) * (1.0 - alpha) + f64::from(target) * alpha;
        *channel = value.round().clamp(0.0, 255.0) as u8;
    }
}

fn paint_mountains(canvas: &mut Blend<RgbaImage>, layer: &MountainLayer, style: MapStyle, palette: &Palette) {
    for glyph in &layer.glyphs {
        let (x, y) = (f64::from(glyph.x), f64::from(glyph.y));
        let reach = glyph.base_size * 0.6;
        let (a, h) = (glyph.angle, glyph.peak_height);
        fill_polygon(
            canvas,
            &[
                (x, y),
                (x + reach * (a - 0.5).cos(), y - h * (a - 0.5).sin()),
                (x - reach * (a + 0.5).cos(), y - h * (a + 0.5).sin()),
            ],
            Palette::mountain(style, glyph.shade),
        );
        draw_line_segment_mut(
            canvas,
            (x as f32, y as f32),
            (
                (x + glyph.base_size * 0.3 * (a - 0.5).cos()) as f32,
                (y - h * 0.8 * (a - 0.5).sin()) as f32,
            ),
            palette.highlight,
        );
    }
    for cap in &layer.snow_caps {
        draw_filled_circle_mut(
            canvas,
            (cap.x.round() as i32, cap.y.round() as i32),
            cap.radius.round() as i32,
            palette.snow,
        );
    }
}

fn paint_forests(canvas: &mut Blend<RgbaImage>, forests: &[ForestClump], style: MapStyle, palette: &Palette) {
    for tree in forests.iter().flat_map(|clump| &clump.trees) {
        match style {
            MapStyle::Parchment => draw_filled_circle_mut(
                canvas,
                (tree.x.round() as i32, tree.y.round() as i32),
                tree.size.round() as i32,
                palette.tree,
            ),
            MapStyle::Color => fill_polygon(
                canvas,
                &[
                    (tree.x, tree.y - tree.size),
                    (tree.x - tree.size / 1.5, tree.y + tree.size / 2.0),
                    (tree.x + tree.size / 1.5, tree.y + tree.size / 2.0),
                ],
                palette.tree,
            ),
        }
    }
}

fn paint_rivers(image: &mut RgbaImage, rivers: &[RiverPath], palette: &Palette) {
    let mut mask = GrayImage::new(image.width(), image.height());
    for river in rivers {
        for (step, pair) in river.cells.windows(2).enumerate() {
            let radius = (river.width_at(step) / 2.0).round() as i32;
            stamp_segment(
                &mut mask,
                (f64::from(pair[0].0), f64::from(pair[0].1)),
                (f64::from(pair[1].0), f64::from(pair[1].1)),
                radius,
            );
        }
    }
    let (rgb, alpha) = palette.river;
    composite_mask(image, &mask, rgb, alpha);
}

fn paint_roads(image: &mut RgbaImage, roads: &RoadNetwork, palette: &Palette) {
    let mut mask = GrayImage::new(image.width(), image.height());
    for curve in &roads.curves {
        let chord = (curve.to.0 - curve.from.0).hypot(curve.to.1 - curve.from.1);
        let samples = (chord * 2.0).ceil().max(1.0) as usize;
        let mut travelled = 0.0;
        let mut previous = curve.from;
        for i in 1..=samples {
            let point = curve.sample(i as f64 / samples as f64);
            let seg = (point.0 - previous.0).hypot(point.1 - previous.1);
            // Штрих 2, пробел 2
            if (travelled % (ROAD_DASH * 2.0)) < ROAD_DASH {
                stamp_segment(&mut mask, previous, point, palette.road_radius);
            }
            travelled += seg;
            previous = point;
        }
    }
    composite_mask(image, &mask, palette.road, 1.0);
}

fn paint_settlements(canvas: &mut Blend<RgbaImage>, settlements: &[Settlement], palette: &Palette) {
    for settlement in settlements {
        let center = (settlement.x as i32, settlement.y as i32);
        let radius = settlement.marker_radius() as i32;
        draw_filled_circle_mut(canvas, center, radius + 1, palette.city_outline);
        draw_filled_circle_mut(canvas, center, radius, palette.city_fill);
        draw_filled_circle_mut(canvas, center, radius / 2, palette.city_center);
    }
}

/// Закрашивает полосу шириной `thickness` вдоль всех краёв
fn paint_frame(image: &mut RgbaImage, thickness: u32, rgb: [u8; 3], alpha: f64) {
    let (w, h) = image.dimensions();
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        if x < thickness || y < thickness || x + thickness >= w || y + thickness >= h {
            mix(pixel, rgb, alpha);
        }
    }
}

fn apply_parchment_finish(image: &mut RgbaImage, seed: u64) {
    for pixel in image.pixels_mut() {
        mix(pixel, PARCHMENT_OVERLAY, 0.25);
    }

    let mut texture: SeededRng = StageSeeds::from_master(seed).rng(offsets::TEXTURE);
    for pixel in image.pixels_mut() {
        let grain = (texture.next_f64() - 0.5) * TEXTURE_STRENGTH;
        for channel in &mut pixel.0[..3] {
            *channel = (f64::from(*channel) + grain).round().clamp(0.0, 255.0) as u8;
        }
    }

    paint_frame(image, 12, PARCHMENT_BORDER, 1.0);

    let (w, h) = image.dimensions();
    let (cx, cy) = (f64::from(w) / 2.0, f64::from(h) / 2.0);
    let inner = f64::from(w.min(h)) * 0.3;
    let outer = f64::from(w.max(h)) * 0.7;
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let distance = (f64::from(x) - cx).hypot(f64::from(y) - cy);
        let t = ((distance - inner) / (outer - inner)).clamp(0.0, 1.0);
        if t > 0.0 {
            mix(pixel, [0, 0, 0], 0.15 * t);
        }
    }
}

/// Рисует карту целиком.
///
/// Результат детерминирован: зерно пергамента берётся из сида карты.
#[must_use]
pub fn render_map(map: &WorldMap) -> RgbaImage {
    let style = map.config.style;
    let palette = Palette::for_style(style);

    let mut canvas = Blend(map.terrain.to_rgba_image());
    paint_mountains(&mut canvas, &map.mountains, style, &palette);
    paint_forests(&mut canvas, &map.forests, style, &palette);
    let mut image = canvas.0;

    paint_rivers(&mut image, &map.rivers, &palette);

    let mut canvas = Blend(image);
    paint_settlements(&mut canvas, &map.settlements, &palette);
    let mut image = canvas.0;

    paint_roads(&mut image, &map.roads, &palette);

    match style {
        MapStyle::Parchment => apply_parchment_finish(&mut image, map.seed),
        MapStyle::Color => paint_frame(&mut image, 4, [0, 0, 0], 0.5),
    }

    tracing::debug!(
        target: "fantasy_mapgen::render",
        width = image.width(),
        height = image.height(),
        style = ?style,
        "render.done"
    );
    image
}
