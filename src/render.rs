use std::path::Path;

use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use rayon::prelude::*;

use crate::board::{Board, CellKind};
use crate::error::Result;
use crate::grid::Coord;
use crate::history::History;
use crate::policy::PolicyGrid;
use crate::rng::splitmix32;
use crate::transition::Action;
use crate::utility::UtilityGrid;

// Diverging palette for utilities
const UTIL_LOW: [u8; 4] = [180, 40, 40, 255];
const UTIL_MID: [u8; 4] = [245, 245, 240, 255];
const UTIL_HIGH: [u8; 4] = [40, 110, 190, 255];
const WALL: [u8; 4] = [40, 40, 40, 255];
const TERMINAL: [u8; 4] = [230, 190, 60, 255];
const ARROW: [u8; 4] = [20, 20, 30, 255];

// Policy backgrounds
const ACTION_UP: [u8; 4] = [150, 200, 230, 255];
const ACTION_DOWN: [u8; 4] = [230, 170, 150, 255];
const ACTION_LEFT: [u8; 4] = [170, 220, 160, 255];
const ACTION_RIGHT: [u8; 4] = [210, 180, 230, 255];

const PLOT_BG: [u8; 4] = [255, 255, 255, 255];
const PLOT_AXIS: [u8; 4] = [90, 90, 90, 255];

/// An RGBA8 image.
pub struct Image {
    pub rgba: Vec<u8>,
    pub w: usize,
    pub h: usize,
}

#[inline]
fn lerp_color(a: [u8; 4], b: [u8; 4], t: f64) -> [u8; 4] {
    let t = t.clamp(0.0, 1.0);
    [
        (a[0] as f64 + (b[0] as f64 - a[0] as f64) * t).round() as u8,
        (a[1] as f64 + (b[1] as f64 - a[1] as f64) * t).round() as u8,
        (a[2] as f64 + (b[2] as f64 - a[2] as f64) * t).round() as u8,
        255,
    ]
}

/// Cell (row, col) covering pixel (px, py) at `cell_px` pixels per cell.
#[inline]
fn cell_at(px: usize, py: usize, cell_px: usize) -> Coord {
    Coord::new((py / cell_px) as i32, (px / cell_px) as i32)
}

/// Utility heatmap: red below zero, blue above, scaled by the largest
/// magnitude. Walls dark, terminals outlined in gold.
pub fn render_utility(board: &Board, u: &UtilityGrid, cell_px: usize) -> Image {
    let cell_px = cell_px.max(1);
    let w = u.cols * cell_px;
    let h = u.rows * cell_px;
    let scale = u.data.iter().fold(0.0f64, |m, v| m.max(v.abs())).max(1e-12);
    let mut rgba = vec![0u8; w * h * 4];

    rgba.par_chunks_mut(w * 4).enumerate().for_each(|(py, row)| {
        for px in 0..w {
            let c = cell_at(px, py, cell_px);
            let edge = px % cell_px == 0 || py % cell_px == 0;
            let color = match board.kind(c) {
                CellKind::Wall => WALL,
                CellKind::Terminal if edge => TERMINAL,
                _ => {
                    let v = u.at(c).unwrap_or(0.0) / scale;
                    if v < 0.0 {
                        lerp_color(UTIL_MID, UTIL_LOW, -v)
                    } else {
                        lerp_color(UTIL_MID, UTIL_HIGH, v)
                    }
                }
            };
            row[px * 4..px * 4 + 4].copy_from_slice(&color);
        }
    });

    Image { rgba, w, h }
}

/// Policy map: one background colour per action with a stroke from the
/// cell centre toward the chosen direction.
pub fn render_policy(board: &Board, policy: &PolicyGrid, cell_px: usize) -> Image {
    let cell_px = cell_px.max(4);
    let w = policy.cols * cell_px;
    let h = policy.rows * cell_px;
    let half = cell_px / 2;
    let stroke = (cell_px / 10).max(1);
    let mut rgba = vec![0u8; w * h * 4];

    rgba.par_chunks_mut(w * 4).enumerate().for_each(|(py, row)| {
        for px in 0..w {
            let c = cell_at(px, py, cell_px);
            let (lx, ly) = (px % cell_px, py % cell_px);
            let color = match (board.kind(c), policy.at(c).flatten()) {
                (CellKind::Wall, _) => WALL,
                (CellKind::Terminal, _) | (_, None) => TERMINAL,
                (_, Some(a)) => {
                    let on_stroke = match a {
                        Action::Up => lx.abs_diff(half) < stroke && ly <= half,
                        Action::Down => lx.abs_diff(half) < stroke && ly >= half,
                        Action::Left => ly.abs_diff(half) < stroke && lx <= half,
                        Action::Right => ly.abs_diff(half) < stroke && lx >= half,
                    };
                    if on_stroke {
                        ARROW
                    } else {
                        match a {
                            Action::Up => ACTION_UP,
                            Action::Down => ACTION_DOWN,
                            Action::Left => ACTION_LEFT,
                            Action::Right => ACTION_RIGHT,
                        }
                    }
                }
            };
            row[px * 4..px * 4 + 4].copy_from_slice(&color);
        }
    });

    Image { rgba, w, h }
}

/// Stable colour per state.
fn series_color(c: Coord) -> [u8; 4] {
    let h = splitmix32((c.row as u32).wrapping_mul(7919) ^ (c.col as u32).wrapping_mul(104729));
    [
        (h & 0xBF) as u8,
        ((h >> 8) & 0xBF) as u8,
        ((h >> 16) & 0xBF) as u8,
        255,
    ]
}

fn put(rgba: &mut [u8], w: usize, h: usize, x: i64, y: i64, color: [u8; 4]) {
    if x < 0 || y < 0 || x as usize >= w || y as usize >= h {
        return;
    }
    let i = (y as usize * w + x as usize) * 4;
    rgba[i..i + 4].copy_from_slice(&color);
}

/// Bresenham line.
fn draw_line(rgba: &mut [u8], w: usize, h: usize, from: (i64, i64), to: (i64, i64), color: [u8; 4]) {
    let (mut x0, mut y0) = from;
    let (x1, y1) = to;
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put(rgba, w, h, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Utility trajectories: x is the iteration, y the utility, one polyline
/// per state. Axes sit on the left edge and on y = 0 when it is in range.
pub fn render_history(history: &History, w: usize, h: usize) -> Image {
    let (w, h) = (w.max(16), h.max(16));
    let mut rgba = PLOT_BG.repeat(w * h);
    let margin = 8i64;
    let (pw, ph) = (w as i64 - 2 * margin, h as i64 - 2 * margin);

    let Some((lo, hi)) = history.bounds() else {
        return Image { rgba, w, h };
    };
    let span = (hi - lo).max(1e-12);
    let steps = history.len().saturating_sub(1).max(1) as f64;
    let to_px = |i: usize, v: f64| -> (i64, i64) {
        let x = margin + (i as f64 / steps * pw as f64).round() as i64;
        let y = margin + ph - ((v - lo) / span * ph as f64).round() as i64;
        (x, y)
    };

    draw_line(&mut rgba, w, h, (margin, margin), (margin, margin + ph), PLOT_AXIS);
    if lo <= 0.0 && hi >= 0.0 {
        let (_, y0) = to_px(0, 0.0);
        draw_line(&mut rgba, w, h, (margin, y0), (margin + pw, y0), PLOT_AXIS);
    }

    for (c, values) in history.iter() {
        let color = series_color(c);
        for (i, pair) in values.windows(2).enumerate() {
            draw_line(&mut rgba, w, h, to_px(i, pair[0]), to_px(i + 1, pair[1]), color);
        }
        if let [only] = values {
            let (x, y) = to_px(0, *only);
            put(&mut rgba, w, h, x, y, color);
        }
    }

    Image { rgba, w, h }
}

/// PNG bytes for an image.
pub fn encode_png(img: &Image) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(
        &img.rgba,
        img.w as u32,
        img.h as u32,
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(buf)
}

pub fn save_png(path: &Path, img: &Image) -> Result<()> {
    image::save_buffer(path, &img.rgba, img.w as u32, img.h as u32, image::ColorType::Rgba8)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utility::zeros;

    fn pixel(img: &Image, x: usize, y: usize) -> [u8; 4] {
        let i = (y * img.w + x) * 4;
        [img.rgba[i], img.rgba[i + 1], img.rgba[i + 2], img.rgba[i + 3]]
    }

    #[test]
    fn utility_heatmap_dimensions_and_colours() {
        let board = Board::new(vec![vec![0.0, 0.0, 0.0]], [Coord::new(0, 2)], []).unwrap();
        let mut u = zeros(&board);
        u.set(0, 0, -1.0);
        u.set(0, 1, 1.0);
        let img = render_utility(&board, &u, 4);
        assert_eq!((img.w, img.h), (12, 4));
        assert_eq!(img.rgba.len(), 12 * 4 * 4);
        assert_eq!(pixel(&img, 1, 1), UTIL_LOW);
        assert_eq!(pixel(&img, 5, 1), UTIL_HIGH);
        assert_eq!(pixel(&img, 9, 1), WALL);
    }

    #[test]
    fn policy_stroke_points_the_right_way() {
        let board = Board::new(vec![vec![0.0]], [], []).unwrap();
        let mut policy: PolicyGrid = crate::grid::Grid::new(1, 1);
        policy.set(0, 0, Some(Action::Right));
        let img = render_policy(&board, &policy, 20);
        assert_eq!(pixel(&img, 18, 10), ARROW);
        assert_eq!(pixel(&img, 2, 10), ACTION_RIGHT);
    }

    #[test]
    fn history_plot_draws_series() {
        let board = Board::new(vec![vec![0.0, 0.0]], [], []).unwrap();
        let mut u = zeros(&board);
        let mut history = History::new();
        for step in 0..5 {
            u.set(0, 0, step as f64);
            u.set(0, 1, -(step as f64));
            history.record(&board, &u);
        }
        let img = render_history(&history, 64, 48);
        assert_eq!(img.rgba.len(), 64 * 48 * 4);
        let inked = img.rgba.chunks(4).filter(|p| *p != PLOT_BG).count();
        assert!(inked > 48);
        assert!(!encode_png(&img).unwrap().is_empty());
    }

    #[test]
    fn empty_history_is_blank() {
        let img = render_history(&History::new(), 32, 32);
        assert!(img.rgba.chunks(4).all(|p| p == PLOT_BG));
    }
}
