use crate::sketch::model::{Point, Rgba};

const WIDE_STROKE_THRESHOLD: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl DirtyRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_points(a: Point, b: Point, pad: i32) -> Self {
        let min_x = a.0.min(b.0).saturating_sub(pad);
        let max_x = a.0.max(b.0).saturating_add(pad);
        let min_y = a.1.min(b.1).saturating_sub(pad);
        let max_y = a.1.max(b.1).saturating_add(pad);
        Self {
            x: min_x,
            y: min_y,
            width: max_x.saturating_sub(min_x).saturating_add(1).max(1),
            height: max_y.saturating_sub(min_y).saturating_add(1).max(1),
        }
    }

    /// Square of side `size` centered on `center`.
    pub fn centered_square(center: Point, size: u32) -> Self {
        let size = size.max(1) as i32;
        Self {
            x: center.0.saturating_sub(size / 2),
            y: center.1.saturating_sub(size / 2),
            width: size,
            height: size,
        }
    }

    pub fn clamp(self, width: u32, height: u32) -> Option<DirtyRect> {
        let max_w = width as i32;
        let max_h = height as i32;
        let x0 = self.x.clamp(0, max_w);
        let y0 = self.y.clamp(0, max_h);
        let x1 = self.x.saturating_add(self.width).clamp(0, max_w);
        let y1 = self.y.saturating_add(self.height).clamp(0, max_h);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(DirtyRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbaBuffer {
    pub fn new(width: u32, height: u32, fill: Rgba) -> Self {
        let mut pixels = vec![0u8; (width as usize) * (height as usize) * 4];
        for chunk in pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&fill.to_array());
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn transparent(width: u32, height: u32) -> Self {
        Self::new(width, height, Rgba::TRANSPARENT)
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        assert_eq!(pixels.len(), (width as usize) * (height as usize) * 4);
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let idx = self.index(x, y);
        Rgba::from_slice(&self.pixels[idx..idx + 4])
    }

    pub fn fill(&mut self, color: Rgba) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&color.to_array());
        }
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Number of pixels with non-zero alpha.
    pub fn painted_pixel_count(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|px| px[3] != 0).count()
    }

    /// Reallocates to the new extent, keeping pixels in the overlapping area
    /// at the same coordinates. Newly exposed area is transparent.
    pub fn resize_preserving(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        let mut next = RgbaBuffer::transparent(width, height);
        let copy_w = self.width.min(width) as usize;
        let copy_h = self.height.min(height);
        for y in 0..copy_h {
            let src = self.index(0, y);
            let dst = next.index(0, y);
            next.pixels[dst..dst + copy_w * 4].copy_from_slice(&self.pixels[src..src + copy_w * 4]);
        }
        *self = next;
    }

    pub fn crop(&self, rect: DirtyRect) -> Option<RgbaBuffer> {
        let rect = rect.clamp(self.width, self.height)?;
        let mut out = RgbaBuffer::transparent(rect.width as u32, rect.height as u32);
        let row_len = rect.width as usize * 4;
        for row in 0..rect.height as u32 {
            let src = self.index(rect.x as u32, rect.y as u32 + row);
            let dst = out.index(0, row);
            out.pixels[dst..dst + row_len].copy_from_slice(&self.pixels[src..src + row_len]);
        }
        Some(out)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + x as usize) * 4
    }

    /// Source-over blend of `color` onto one pixel. Out-of-bounds writes are dropped.
    fn blend_pixel_at(&mut self, x: i32, y: i32, color: Rgba) -> bool {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return false;
        }
        let idx = self.index(x as u32, y as u32);
        let blended = blend_pixel(Rgba::from_slice(&self.pixels[idx..idx + 4]), color);
        self.pixels[idx..idx + 4].copy_from_slice(&blended.to_array());
        true
    }
}

/// Paints a round-capped segment from `start` to `end`.
pub fn draw_segment(
    buffer: &mut RgbaBuffer,
    start: Point,
    end: Point,
    color: Rgba,
    stroke_width: u32,
) -> Option<DirtyRect> {
    let stroke_width = stroke_width.max(1);
    if stroke_width >= WIDE_STROKE_THRESHOLD && start != end {
        draw_segment_capsule(buffer, start, end, color, stroke_width);
    } else {
        draw_segment_dense_stamped(buffer, start, end, color, stroke_width);
    }
    segment_dirty_bounds(start, end, stroke_width).clamp(buffer.width, buffer.height)
}

/// Resets a `size`-wide square centered on `center` to transparent.
pub fn clear_square(buffer: &mut RgbaBuffer, center: Point, size: u32) -> Option<DirtyRect> {
    let rect = DirtyRect::centered_square(center, size).clamp(buffer.width, buffer.height)?;
    let row_len = rect.width as usize * 4;
    for y in rect.y..(rect.y + rect.height) {
        let idx = buffer.index(rect.x as u32, y as u32);
        buffer.pixels[idx..idx + row_len].fill(0);
    }
    Some(rect)
}

pub fn segment_dirty_bounds(start: Point, end: Point, stroke_width: u32) -> DirtyRect {
    let pad = (stroke_width / 2) as i32 + 1;
    DirtyRect::from_points(start, end, pad)
}

pub fn blend_in_place(base: &mut RgbaBuffer, top: &RgbaBuffer) {
    assert_eq!(base.width, top.width);
    assert_eq!(base.height, top.height);

    for (dst, src) in base
        .pixels
        .chunks_exact_mut(4)
        .zip(top.pixels.chunks_exact(4))
    {
        let blended = blend_pixel(Rgba::from_slice(dst), Rgba::from_slice(src));
        dst.copy_from_slice(&blended.to_array());
    }
}

pub fn blend_pixel(bottom: Rgba, top: Rgba) -> Rgba {
    if top.a == 255 {
        return top;
    }
    if top.a == 0 {
        return bottom;
    }
    let sa = top.a as f32 / 255.0;
    let da = bottom.a as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    if out_a <= f32::EPSILON {
        return Rgba::TRANSPARENT;
    }

    let blend = |s: u8, d: u8| -> u8 {
        (((s as f32 * sa) + (d as f32 * da * (1.0 - sa))) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };

    Rgba {
        r: blend(top.r, bottom.r),
        g: blend(top.g, bottom.g),
        b: blend(top.b, bottom.b),
        a: (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    }
}

fn draw_segment_dense_stamped(
    buffer: &mut RgbaBuffer,
    start: Point,
    end: Point,
    color: Rgba,
    stroke_width: u32,
) {
    let radius = (stroke_width.saturating_sub(1) / 2) as i32;
    let Some((start, end)) = clip_segment_to_surface(buffer, start, end, radius + 1) else {
        return;
    };
    let mut x0 = start.0;
    let mut y0 = start.1;
    let (x1, y1) = end;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        draw_brush(buffer, (x0, y0), color, stroke_width);
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

/// Clips a segment to the surface grown by `margin` on every side so the walk
/// only visits points whose brush can reach a pixel. Returns `None` when the
/// segment misses that area entirely.
fn clip_segment_to_surface(
    buffer: &RgbaBuffer,
    start: Point,
    end: Point,
    margin: i32,
) -> Option<(Point, Point)> {
    let margin = margin as f64;
    let (min_x, min_y) = (-margin, -margin);
    let max_x = buffer.width as f64 - 1.0 + margin;
    let max_y = buffer.height as f64 - 1.0 + margin;

    let (x0, y0) = (start.0 as f64, start.1 as f64);
    let dx = end.0 as f64 - x0;
    let dy = end.1 as f64 - y0;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    // Liang-Barsky: each edge is a (direction, distance) pair.
    for (p, q) in [
        (-dx, x0 - min_x),
        (dx, max_x - x0),
        (-dy, y0 - min_y),
        (dy, max_y - y0),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let at = |t: f64| -> Point {
        if t <= 0.0 {
            return start;
        }
        if t >= 1.0 {
            return end;
        }
        ((x0 + dx * t).round() as i32, (y0 + dy * t).round() as i32)
    };
    Some((at(t0), at(t1)))
}

fn draw_segment_capsule(
    buffer: &mut RgbaBuffer,
    start: Point,
    end: Point,
    color: Rgba,
    stroke_width: u32,
) {
    let radius = (stroke_width.saturating_sub(1) / 2) as f64;
    let pad = radius.ceil() as i32 + 1;
    let Some(clip) = DirtyRect::from_points(start, end, pad).clamp(buffer.width, buffer.height)
    else {
        return;
    };

    let radius_sq = radius * radius;
    for y in clip.y..(clip.y + clip.height) {
        for x in clip.x..(clip.x + clip.width) {
            if point_segment_distance_sq((x, y), start, end) <= radius_sq {
                buffer.blend_pixel_at(x, y, color);
            }
        }
    }
}

fn draw_brush(buffer: &mut RgbaBuffer, center: Point, color: Rgba, stroke_width: u32) {
    let radius = (stroke_width.saturating_sub(1) / 2) as i32;
    for y in (center.1 - radius)..=(center.1 + radius) {
        for x in (center.0 - radius)..=(center.0 + radius) {
            let dx = x - center.0;
            let dy = y - center.1;
            if dx * dx + dy * dy <= radius * radius {
                buffer.blend_pixel_at(x, y, color);
            }
        }
    }
}

fn point_segment_distance_sq(point: Point, start: Point, end: Point) -> f64 {
    let px = point.0 as f64;
    let py = point.1 as f64;
    let x0 = start.0 as f64;
    let y0 = start.1 as f64;
    let vx = end.0 as f64 - x0;
    let vy = end.1 as f64 - y0;
    let wx = px - x0;
    let wy = py - y0;
    let len_sq = vx * vx + vy * vy;
    if len_sq <= f64::EPSILON {
        return wx * wx + wy * wy;
    }
    let t = ((wx * vx + wy * vy) / len_sq).clamp(0.0, 1.0);
    let dx = px - (x0 + vx * t);
    let dy = py - (y0 + vy * t);
    dx * dx + dy * dy
}
