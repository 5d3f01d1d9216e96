//! SVG serialization of a [`Scene`]

use std::fmt::Write as _;

use super::RenderError;
use super::layout::{Radii, Rect, Scene, Shape};
use super::raster::linear_axis;
use crate::color::{Rgba, parse_hex_color};
use crate::config::style::{Fill, GradientType, Paint};

/// Path data for a rectangle with per-corner radii, clockwise from top-left
fn rounded_rect_path(out: &mut String, r: &Rect, radii: &Radii) {
    let cap = (r.w / 2.0).min(r.h / 2.0);
    let [tl, tr, br, bl] = radii.map(|v| v.min(cap).max(0.0));
    let (x, y, w, h) = (r.x, r.y, r.w, r.h);
    let _ = write!(out, "M{},{}", x + tl, y);
    let _ = write!(out, "H{}", x + w - tr);
    if tr > 0.0 {
        let _ = write!(out, "A{tr},{tr} 0 0 1 {},{}", x + w, y + tr);
    }
    let _ = write!(out, "V{}", y + h - br);
    if br > 0.0 {
        let _ = write!(out, "A{br},{br} 0 0 1 {},{}", x + w - br, y + h);
    }
    let _ = write!(out, "H{}", x + bl);
    if bl > 0.0 {
        let _ = write!(out, "A{bl},{bl} 0 0 1 {},{}", x, y + h - bl);
    }
    let _ = write!(out, "V{}", y + tl);
    if tl > 0.0 {
        let _ = write!(out, "A{tl},{tl} 0 0 1 {},{}", x + tl, y);
    }
    out.push('Z');
}

fn shape_path(out: &mut String, shape: &Shape) {
    rounded_rect_path(out, &shape.rect, &shape.radii);
    if let Some((hole, radii)) = &shape.hole {
        rounded_rect_path(out, hole, radii);
    }
}

fn color_attrs(c: Rgba) -> String {
    if c.a == 255 {
        format!("fill=\"rgb({},{},{})\"", c.r, c.g, c.b)
    } else {
        format!("fill=\"rgb({},{},{})\" fill-opacity=\"{:.3}\"", c.r, c.g, c.b, c.a as f32 / 255.0)
    }
}

/// Emit a gradient definition if needed and return the fill attributes
fn paint_ref(defs: &mut String, id: usize, paint: &Paint, b: &Rect) -> Result<Option<String>, RenderError> {
    match paint.effective() {
        Fill::Solid(c) => {
            let c = parse_hex_color(c)?;
            Ok((c.a > 0).then(|| color_attrs(c)))
        }
        Fill::Gradient(g) => {
            let gid = format!("g{id}");
            match g.kind {
                GradientType::Linear => {
                    let (x1, y1, x2, y2) = linear_axis(g.rotation, b);
                    let _ = write!(
                        defs,
                        "<linearGradient id=\"{gid}\" gradientUnits=\"userSpaceOnUse\" x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\">"
                    );
                }
                GradientType::Radial => {
                    let (cx, cy, r) = (b.x + b.w / 2.0, b.y + b.h / 2.0, b.w.max(b.h) / 2.0);
                    let _ = write!(
                        defs,
                        "<radialGradient id=\"{gid}\" gradientUnits=\"userSpaceOnUse\" cx=\"{cx}\" cy=\"{cy}\" r=\"{r}\">"
                    );
                }
            }
            for stop in &g.color_stops {
                let c = parse_hex_color(&stop.color)?;
                let _ = write!(
                    defs,
                    "<stop offset=\"{}\" stop-color=\"rgb({},{},{})\" stop-opacity=\"{:.3}\"/>",
                    stop.offset,
                    c.r,
                    c.g,
                    c.b,
                    c.a as f32 / 255.0
                );
            }
            defs.push_str(match g.kind {
                GradientType::Linear => "</linearGradient>",
                GradientType::Radial => "</radialGradient>",
            });
            Ok(Some(format!("fill=\"url(#{gid})\"")))
        }
    }
}

/// Serialize a scene; `logo_url` is the data URL the scene's logo came from
pub fn to_svg(scene: &Scene, logo_url: Option<&str>) -> Result<String, RenderError> {
    let mut defs = String::new();
    let mut body = String::new();
    let full = Rect::new(0.0, 0.0, scene.width as f32, scene.height as f32);

    if let Some(fill) = paint_ref(&mut defs, 0, &scene.background, &full)? {
        let _ = write!(
            body,
            "<rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" {fill}/>",
            scene.width, scene.height
        );
    }

    for (i, group) in scene.groups.iter().enumerate() {
        if group.shapes.is_empty() {
            continue;
        }
        let Some(fill) = paint_ref(&mut defs, i + 1, &group.paint, &group.paint_box)? else {
            continue;
        };
        let mut d = String::new();
        for shape in &group.shapes {
            shape_path(&mut d, shape);
        }
        let _ = write!(body, "<path fill-rule=\"evenodd\" {fill} d=\"{d}\"/>");
    }

    if let (Some(place), Some(url)) = (&scene.logo, logo_url) {
        let _ = write!(
            body,
            "<image href=\"{url}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" opacity=\"{}\" preserveAspectRatio=\"xMidYMid meet\"/>",
            place.rect.x, place.rect.y, place.rect.w, place.rect.h, place.opacity
        );
    }

    Ok(format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\"><defs>{defs}</defs>{body}</svg>",
        w = scene.width,
        h = scene.height
    ))
}
