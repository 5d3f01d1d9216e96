//! Scene layout: module grid → shapes grouped by paint
//!
//! Coordinates are canvas pixels. Every shape is a rectangle with per-corner
//! radii (top-left, top-right, bottom-right, bottom-left), optionally with a
//! rectangular hole, which covers squares, circles and finder rings.

use crate::config::style::{CornerDotType, CornerSquareType, DotType, Paint, StyleConfig};
use crate::constants::render::{EC_RECOVERY, FINDER_MODULES, IMAGE_AXIS_RESERVED};

use super::matrix::QrMatrix;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn inset(&self, by: f32) -> Self {
        Self::new(self.x + by, self.y + by, self.w - 2.0 * by, self.h - 2.0 * by)
    }
}

/// Corner radii in order top-left, top-right, bottom-right, bottom-left
pub type Radii = [f32; 4];

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub rect: Rect,
    pub radii: Radii,
    pub hole: Option<(Rect, Radii)>,
}

impl Shape {
    fn solid(rect: Rect, radii: Radii) -> Self {
        Self { rect, radii, hole: None }
    }
}

/// Shapes sharing one paint; gradients span `paint_box`
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeGroup {
    pub paint: Paint,
    pub paint_box: Rect,
    pub shapes: Vec<Shape>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogoPlacement {
    pub rect: Rect,
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub background: Paint,
    pub groups: Vec<ShapeGroup>,
    pub logo: Option<LogoPlacement>,
}

/// Region of modules hidden behind the logo, in module counts
#[derive(Debug, Clone, Copy, PartialEq)]
struct LogoSize {
    width: f32,
    height: f32,
    hide_x: usize,
    hide_y: usize,
}

/// Fit a logo of the given aspect into the error-correction budget
fn fit_logo(
    original: (u32, u32),
    max_hidden_dots: usize,
    max_hidden_axis_dots: usize,
    dot: f32,
) -> Option<LogoSize> {
    let (ow, oh) = original;
    if ow == 0 || oh == 0 || max_hidden_dots == 0 || dot <= 0.0 {
        return None;
    }
    let k = oh as f32 / ow as f32;

    let mut hide_x = ((max_hidden_dots as f32 / k).sqrt().floor() as usize).max(1);
    if max_hidden_axis_dots > 0 && max_hidden_axis_dots < hide_x {
        hide_x = max_hidden_axis_dots;
    }
    if hide_x % 2 == 0 {
        hide_x -= 1;
    }
    let mut width = hide_x as f32 * dot;
    let mut hide_y = 1 + 2 * ((hide_x as f32 * k - 1.0) / 2.0).ceil().max(0.0) as usize;
    let mut height = (width * k).round();

    let axis_overflow = max_hidden_axis_dots > 0 && max_hidden_axis_dots < hide_y;
    if hide_y * hide_x > max_hidden_dots || axis_overflow {
        if axis_overflow {
            hide_y = max_hidden_axis_dots;
            if hide_y % 2 == 0 {
                hide_y -= 1;
            }
        } else {
            hide_y = hide_y.saturating_sub(2).max(1);
        }
        height = hide_y as f32 * dot;
        hide_x = 1 + 2 * ((hide_y as f32 / k - 1.0) / 2.0).ceil().max(0.0) as usize;
        width = (height / k).round();
    }

    Some(LogoSize { width, height, hide_x, hide_y })
}

/// Radii for one module given which orthogonal neighbours are dark
fn dot_radii(kind: DotType, size: f32, left: bool, top: bool, right: bool, bottom: bool) -> Radii {
    let half = size / 2.0;
    let rounded = |r: f32| -> Radii {
        [
            if !left && !top { r } else { 0.0 },
            if !top && !right { r } else { 0.0 },
            if !right && !bottom { r } else { 0.0 },
            if !bottom && !left { r } else { 0.0 },
        ]
    };
    match kind {
        DotType::Square => [0.0; 4],
        DotType::Dots => [half; 4],
        DotType::Rounded => rounded(size * 0.3),
        DotType::ExtraRounded => rounded(half),
        DotType::Classy => {
            let r = rounded(half);
            [r[0], 0.0, r[2], 0.0]
        }
    }
}

fn is_finder(x: usize, y: usize, count: usize) -> bool {
    let f = FINDER_MODULES;
    (x < f && y < f) || (x >= count - f && y < f) || (x < f && y >= count - f)
}

pub fn build_scene(matrix: &QrMatrix, style: &StyleConfig, logo_dims: Option<(u32, u32)>) -> Scene {
    let count = matrix.size();
    let min_side = style.width.min(style.height) as f32;
    let draw_side = (min_side - 2.0 * style.margin as f32).max(0.0);
    let dot = (draw_side / count as f32).floor().max(1.0);
    let x0 = ((style.width as f32 - count as f32 * dot) / 2.0).floor();
    let y0 = ((style.height as f32 - count as f32 * dot) / 2.0).floor();

    let logo = logo_dims.and_then(|dims| {
        let budget = style.image_options.image_size
            * EC_RECOVERY[style.qr_options.error_correction_level.index()];
        let max_hidden = (budget * (count * count) as f32).floor() as usize;
        fit_logo(dims, max_hidden, count.saturating_sub(IMAGE_AXIS_RESERVED), dot)
    });

    let hidden = |x: usize, y: usize| -> bool {
        match logo {
            Some(l) if style.image_options.hide_background_dots => {
                let (fx, fy, c) = (x as f32, y as f32, count as f32);
                fx >= (c - l.hide_x as f32) / 2.0
                    && fx < (c + l.hide_x as f32) / 2.0
                    && fy >= (c - l.hide_y as f32) / 2.0
                    && fy < (c + l.hide_y as f32) / 2.0
            }
            _ => false,
        }
    };

    let mut dots = Vec::new();
    for y in 0..count {
        for x in 0..count {
            let (ix, iy) = (x as isize, y as isize);
            if !matrix.is_dark(ix, iy) || is_finder(x, y, count) || hidden(x, y) {
                continue;
            }
            let neighbour = |dx: isize, dy: isize| {
                let (nx, ny) = (ix + dx, iy + dy);
                nx >= 0
                    && ny >= 0
                    && matrix.is_dark(nx, ny)
                    && !is_finder(nx as usize, ny as usize, count)
                    && !hidden(nx as usize, ny as usize)
            };
            let radii = dot_radii(
                style.dots.kind,
                dot,
                neighbour(-1, 0),
                neighbour(0, -1),
                neighbour(1, 0),
                neighbour(0, 1),
            );
            let rect = Rect::new(x0 + x as f32 * dot, y0 + y as f32 * dot, dot, dot);
            dots.push(Shape::solid(rect, radii));
        }
    }

    let canvas = Rect::new(0.0, 0.0, style.width as f32, style.height as f32);
    let mut groups = vec![ShapeGroup {
        paint: style.dots.paint.clone(),
        paint_box: canvas,
        shapes: dots,
    }];

    let finder = FINDER_MODULES as f32 * dot;
    let far = (count - FINDER_MODULES) as f32 * dot;
    for (fx, fy) in [(0.0, 0.0), (far, 0.0), (0.0, far)] {
        let outer = Rect::new(x0 + fx, y0 + fy, finder, finder);
        let inner = outer.inset(dot);
        let (outer_r, inner_r) = match style.corners_square.kind {
            CornerSquareType::Square => (0.0, 0.0),
            CornerSquareType::Dot => (finder / 2.0, inner.w / 2.0),
            CornerSquareType::ExtraRounded => (dot * 2.5, dot * 1.5),
        };
        groups.push(ShapeGroup {
            paint: style.corners_square.paint.clone(),
            paint_box: outer,
            shapes: vec![Shape {
                rect: outer,
                radii: [outer_r; 4],
                hole: Some((inner, [inner_r; 4])),
            }],
        });

        let pupil = outer.inset(2.0 * dot);
        let pupil_r = match style.corners_dot.kind {
            CornerDotType::Square => 0.0,
            CornerDotType::Dot => pupil.w / 2.0,
        };
        groups.push(ShapeGroup {
            paint: style.corners_dot.paint.clone(),
            paint_box: pupil,
            shapes: vec![Shape::solid(pupil, [pupil_r; 4])],
        });
    }

    let logo = logo.map(|l| {
        let margin = style.image_options.margin as f32;
        let grid = count as f32 * dot;
        LogoPlacement {
            rect: Rect::new(
                x0 + margin + (grid - l.width) / 2.0,
                y0 + margin + (grid - l.height) / 2.0,
                (l.width - 2.0 * margin).max(0.0),
                (l.height - 2.0 * margin).max(0.0),
            ),
            opacity: style.image_options.opacity.clamp(0.0, 1.0),
        }
    });

    Scene {
        width: style.width,
        height: style.height,
        background: style.background.paint.clone(),
        groups,
        logo,
    }
}
