//! Anti-aliased rasterization of a [`Scene`]

use std::f32::consts::PI;

use image::imageops::{self, FilterType};
use image::RgbaImage;

use super::RenderError;
use super::layout::{Radii, Rect, Scene, Shape};
use crate::color::{Rgba, parse_hex_color};
use crate::config::style::{Fill, Gradient, GradientType, Paint};

/// Gradient axis in canvas coordinates, matching how the browser engine
/// stretches a rotated linear gradient across its box
pub fn linear_axis(rotation: f32, b: &Rect) -> (f32, f32, f32, f32) {
    let r = rotation.rem_euclid(2.0 * PI);
    let (cx, cy) = (b.x + b.w / 2.0, b.y + b.h / 2.0);
    let (hw, hh) = (b.w / 2.0, b.h / 2.0);
    let t = r.tan();
    let (mut x0, mut y0, mut x1, mut y1) = (cx, cy, cx, cy);
    if r <= 0.25 * PI || r > 1.75 * PI {
        x0 -= hw;
        y0 -= hh * t;
        x1 += hw;
        y1 += hh * t;
    } else if r <= 0.75 * PI {
        y0 -= hh;
        x0 -= hw / t;
        y1 += hh;
        x1 += hw / t;
    } else if r <= 1.25 * PI {
        x0 += hw;
        y0 += hh * t;
        x1 -= hw;
        y1 -= hh * t;
    } else {
        y0 += hh;
        x0 += hw / t;
        y1 -= hh;
        x1 -= hw / t;
    }
    (x0, y0, x1, y1)
}

#[derive(Debug, Clone)]
enum Sampler {
    Solid(Rgba),
    Linear { stops: Vec<(f32, Rgba)>, x0: f32, y0: f32, dx: f32, dy: f32, len2: f32 },
    Radial { stops: Vec<(f32, Rgba)>, cx: f32, cy: f32, radius: f32 },
}

impl Sampler {
    fn new(paint: &Paint, paint_box: &Rect) -> Result<Self, RenderError> {
        match paint.effective() {
            Fill::Solid(c) => Ok(Sampler::Solid(parse_hex_color(c)?)),
            Fill::Gradient(g) => Self::gradient(g, paint_box),
        }
    }

    fn gradient(g: &Gradient, b: &Rect) -> Result<Self, RenderError> {
        let mut stops = g
            .color_stops
            .iter()
            .map(|s| Ok((s.offset.clamp(0.0, 1.0), parse_hex_color(&s.color)?)))
            .collect::<Result<Vec<_>, RenderError>>()?;
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));
        if stops.is_empty() {
            return Ok(Sampler::Solid(Rgba::CLEAR));
        }

        Ok(match g.kind {
            GradientType::Linear => {
                let (x0, y0, x1, y1) = linear_axis(g.rotation, b);
                let (dx, dy) = (x1 - x0, y1 - y0);
                Sampler::Linear { stops, x0, y0, dx, dy, len2: (dx * dx + dy * dy).max(f32::EPSILON) }
            }
            GradientType::Radial => Sampler::Radial {
                stops,
                cx: b.x + b.w / 2.0,
                cy: b.y + b.h / 2.0,
                radius: (b.w.max(b.h) / 2.0).max(f32::EPSILON),
            },
        })
    }

    fn sample(&self, x: f32, y: f32) -> Rgba {
        match self {
            Sampler::Solid(c) => *c,
            Sampler::Linear { stops, x0, y0, dx, dy, len2 } => {
                let t = ((x - x0) * dx + (y - y0) * dy) / len2;
                interpolate(stops, t)
            }
            Sampler::Radial { stops, cx, cy, radius } => {
                let t = (x - cx).hypot(y - cy) / radius;
                interpolate(stops, t)
            }
        }
    }
}

fn interpolate(stops: &[(f32, Rgba)], t: f32) -> Rgba {
    let t = t.clamp(0.0, 1.0);
    let (first, last) = (stops[0], stops[stops.len() - 1]);
    if t <= first.0 {
        return first.1;
    }
    if t >= last.0 {
        return last.1;
    }
    for pair in stops.windows(2) {
        let ((o0, c0), (o1, c1)) = (pair[0], pair[1]);
        if t >= o0 && t <= o1 {
            let span = (o1 - o0).max(f32::EPSILON);
            return c0.lerp(c1, (t - o0) / span);
        }
    }
    last.1
}

/// Signed distance from a point to a rectangle with per-corner radii
fn rounded_rect_distance(px: f32, py: f32, rect: &Rect, radii: &Radii) -> f32 {
    let (hw, hh) = (rect.w / 2.0, rect.h / 2.0);
    let (dx, dy) = (px - (rect.x + hw), py - (rect.y + hh));
    let r = match (dx >= 0.0, dy >= 0.0) {
        (false, false) => radii[0],
        (true, false) => radii[1],
        (true, true) => radii[2],
        (false, true) => radii[3],
    }
    .min(hw.min(hh));
    let qx = dx.abs() - hw + r;
    let qy = dy.abs() - hh + r;
    qx.max(0.0).hypot(qy.max(0.0)) + qx.max(qy).min(0.0) - r
}

fn coverage(px: f32, py: f32, shape: &Shape) -> f32 {
    let mut d = rounded_rect_distance(px, py, &shape.rect, &shape.radii);
    if let Some((hole, radii)) = &shape.hole {
        d = d.max(-rounded_rect_distance(px, py, hole, radii));
    }
    (0.5 - d).clamp(0.0, 1.0)
}

/// Source-over blend of a straight-alpha color scaled by `coverage`
pub fn blend(dst: &mut image::Rgba<u8>, src: Rgba, coverage: f32) {
    let sa = src.a as f32 / 255.0 * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let mix = |s: u8, d: u8| {
        ((s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a).round().clamp(0.0, 255.0) as u8
    };
    dst.0 = [
        mix(src.r, dst.0[0]),
        mix(src.g, dst.0[1]),
        mix(src.b, dst.0[2]),
        (out_a * 255.0).round() as u8,
    ];
}

fn fill_shape(canvas: &mut RgbaImage, shape: &Shape, sampler: &Sampler) {
    let (w, h) = canvas.dimensions();
    let x_start = shape.rect.x.floor().max(0.0) as u32;
    let y_start = shape.rect.y.floor().max(0.0) as u32;
    let x_end = ((shape.rect.x + shape.rect.w).ceil().max(0.0) as u32).min(w);
    let y_end = ((shape.rect.y + shape.rect.h).ceil().max(0.0) as u32).min(h);

    for py in y_start..y_end {
        for px in x_start..x_end {
            let (cx, cy) = (px as f32 + 0.5, py as f32 + 0.5);
            let cov = coverage(cx, cy, shape);
            if cov > 0.0 {
                blend(canvas.get_pixel_mut(px, py), sampler.sample(cx, cy), cov);
            }
        }
    }
}

/// Rasterize a scene; `logo` must be the decoded image the scene was laid out for
pub fn rasterize(scene: &Scene, logo: Option<&RgbaImage>) -> Result<RgbaImage, RenderError> {
    let mut canvas = RgbaImage::new(scene.width, scene.height);
    let full = Rect::new(0.0, 0.0, scene.width as f32, scene.height as f32);

    let background = Sampler::new(&scene.background, &full)?;
    if !matches!(background, Sampler::Solid(c) if c.a == 0) {
        let whole = Shape { rect: full, radii: [0.0; 4], hole: None };
        fill_shape(&mut canvas, &whole, &background);
    }

    for group in &scene.groups {
        let sampler = Sampler::new(&group.paint, &group.paint_box)?;
        for shape in &group.shapes {
            fill_shape(&mut canvas, shape, &sampler);
        }
    }

    if let (Some(place), Some(image)) = (&scene.logo, logo) {
        let (w, h) = (place.rect.w.round() as u32, place.rect.h.round() as u32);
        if w > 0 && h > 0 {
            let scaled = imageops::resize(image, w, h, FilterType::Triangle);
            let (ox, oy) = (place.rect.x.round() as i64, place.rect.y.round() as i64);
            for (x, y, pixel) in scaled.enumerate_pixels() {
                let (cx, cy) = (ox + x as i64, oy + y as i64);
                if cx < 0 || cy < 0 || cx >= scene.width as i64 || cy >= scene.height as i64 {
                    continue;
                }
                let [r, g, b, a] = pixel.0;
                blend(canvas.get_pixel_mut(cx as u32, cy as u32), Rgba { r, g, b, a }, place.opacity);
            }
        }
    }

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::style::{Gradient, Paint};
    use crate::render::layout::ShapeGroup;

    fn scene(background: &str, groups: Vec<ShapeGroup>) -> Scene {
        Scene { width: 20, height: 20, background: Paint::solid(background), groups, logo: None }
    }

    #[test]
    fn test_transparent_background_stays_clear() {
        let img = rasterize(&scene("transparent", vec![]), None).unwrap();
        assert!(img.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_square_fill_is_crisp() {
        let group = ShapeGroup {
            paint: Paint::solid("#FF0000"),
            paint_box: Rect::new(0.0, 0.0, 20.0, 20.0),
            shapes: vec![Shape { rect: Rect::new(5.0, 5.0, 10.0, 10.0), radii: [0.0; 4], hole: None }],
        };
        let img = rasterize(&scene("#FFFFFF", vec![group]), None).unwrap();
        assert_eq!(img.get_pixel(5, 5).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(14, 14).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(4, 5).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(15, 15).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_ring_has_hole() {
        let outer = Rect::new(0.0, 0.0, 14.0, 14.0);
        let group = ShapeGroup {
            paint: Paint::solid("#000000"),
            paint_box: outer,
            shapes: vec![Shape { rect: outer, radii: [0.0; 4], hole: Some((outer.inset(2.0), [0.0; 4])) }],
        };
        let img = rasterize(&scene("#FFFFFF", vec![group]), None).unwrap();
        assert_eq!(img.get_pixel(0, 7).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(7, 7).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_circle_corners_are_empty() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let shape = Shape { rect, radii: [5.0; 4], hole: None };
        assert_eq!(coverage(0.5, 0.5, &shape), 0.0);
        assert_eq!(coverage(5.0, 5.0, &shape), 1.0);
    }

    #[test]
    fn test_horizontal_gradient_runs_left_to_right() {
        let b = Rect::new(0.0, 0.0, 100.0, 100.0);
        let sampler = Sampler::gradient(&Gradient::linear(0.0, "#000000", "#FFFFFF"), &b).unwrap();
        assert_eq!(sampler.sample(0.0, 50.0), Rgba::BLACK);
        assert_eq!(sampler.sample(100.0, 50.0), Rgba::WHITE);
        assert_eq!(sampler.sample(50.0, 10.0).r, 128);

        let (x0, y0, x1, y1) = linear_axis(PI / 2.0, &b);
        assert!((x0 - x1).abs() < 1e-3);
        assert!(y0 < y1);
    }

    #[test]
    fn test_invalid_color_is_an_error() {
        let group = ShapeGroup {
            paint: Paint::solid("purple-ish"),
            paint_box: Rect::new(0.0, 0.0, 1.0, 1.0),
            shapes: vec![],
        };
        assert!(matches!(rasterize(&scene("#FFFFFF", vec![group]), None), Err(RenderError::Color(_))));
    }

    #[test]
    fn test_blend_over_transparent_keeps_source() {
        let mut px = image::Rgba([0, 0, 0, 0]);
        blend(&mut px, Rgba::opaque(10, 20, 30), 1.0);
        assert_eq!(px.0, [10, 20, 30, 255]);
    }
}
