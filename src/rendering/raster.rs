//! Software rasterizer: paint commands -> RGBA pixmap -> PNG.
//!
//! The pixmap starts fully transparent; commands are composited source-over.
//! Command coordinates are CSS pixels and are multiplied by the device scale.

use super::layout::GLYPH;
use super::paint::PaintCommand;
use super::style::Rgba;
use crate::rendering::Screenshot;
use crate::{Error, Result};
use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};

pub const MAX_SCALE: u32 = 16;
const MAX_DEVICE_EDGE: u32 = 8192;

#[derive(Debug, Clone)]
pub struct Pixmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Pixmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        Some((self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]))
    }

    fn blend(&mut self, x: i64, y: i64, src: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 || src.3 == 0 {
            return;
        }
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4;
        if src.3 == 255 {
            self.data[i..i + 4].copy_from_slice(&[src.0, src.1, src.2, 255]);
            return;
        }
        let sa = src.3 as f32 / 255.0;
        let da = self.data[i + 3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        let mix = |s: u8, d: u8| -> u8 {
            ((s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a).round() as u8
        };
        self.data[i] = mix(src.0, self.data[i]);
        self.data[i + 1] = mix(src.1, self.data[i + 1]);
        self.data[i + 2] = mix(src.2, self.data[i + 2]);
        self.data[i + 3] = (out_a * 255.0).round() as u8;
    }

    /// Device-space rectangle fill, clipped to the pixmap
    pub fn fill_rect(&mut self, x: i64, y: i64, w: u32, h: u32, rgba: Rgba) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w as i64).min(self.width as i64);
        let y1 = (y + h as i64).min(self.height as i64);
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py, rgba);
            }
        }
    }

    pub fn fill_rounded_rect(&mut self, x: i64, y: i64, w: u32, h: u32, radius: u32, rgba: Rgba) {
        let r = radius.min(w / 2).min(h / 2) as f32;
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w as i64).min(self.width as i64);
        let y1 = (y + h as i64).min(self.height as i64);
        for py in y0..y1 {
            for px in x0..x1 {
                // Sample at pixel centre, local to the rectangle
                let lx = (px - x) as f32 + 0.5;
                let ly = (py - y) as f32 + 0.5;
                let cx = lx.clamp(r, w as f32 - r);
                let cy = ly.clamp(r, h as f32 - r);
                let (ddx, ddy) = (lx - cx, ly - cy);
                if ddx * ddx + ddy * ddy <= r * r {
                    self.blend(px, py, rgba);
                }
            }
        }
    }

    pub fn fill_circle(&mut self, x: i64, y: i64, diameter: u32, rgba: Rgba) {
        let r = diameter as f32 / 2.0;
        let (cx, cy) = (x as f32 + r, y as f32 + r);
        for py in y.max(0)..(y + diameter as i64).min(self.height as i64) {
            for px in x.max(0)..(x + diameter as i64).min(self.width as i64) {
                let ddx = px as f32 + 0.5 - cx;
                let ddy = py as f32 + 0.5 - cy;
                if ddx * ddx + ddy * ddy <= r * r {
                    self.blend(px, py, rgba);
                }
            }
        }
    }

    /// Draw one line of 8x8 bitmap text. `unit` is the device size of one
    /// font pixel. Characters without a glyph still advance the pen.
    pub fn draw_text(&mut self, x: i64, y: i64, text: &str, unit: u32, rgba: Rgba, mirrored: bool) {
        let chars: Vec<char> = text.chars().collect();
        let advance = (GLYPH * unit) as i64;
        for (i, ch) in chars.iter().enumerate() {
            let Some(glyph) = glyph(*ch) else {
                continue;
            };
            let slot = if mirrored { chars.len() - 1 - i } else { i };
            let gx = x + slot as i64 * advance;
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..8u32 {
                    if bits & (1 << col) == 0 {
                        continue;
                    }
                    let col = if mirrored { 7 - col } else { col };
                    self.fill_rect(
                        gx + (col * unit) as i64,
                        y + (row as u32 * unit) as i64,
                        unit,
                        unit,
                        rgba,
                    );
                }
            }
        }
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut buf, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder
                .write_header()
                .map_err(|e| Error::RasterizationFailure(format!("PNG header: {}", e)))?;
            writer
                .write_image_data(&self.data)
                .map_err(|e| Error::RasterizationFailure(format!("PNG data: {}", e)))?;
            writer
                .finish()
                .map_err(|e| Error::RasterizationFailure(format!("PNG finish: {}", e)))?;
        }
        Ok(buf)
    }
}

/// Execute paint commands on a `width` x `height` CSS-pixel canvas at
/// `scale` device pixels per CSS pixel.
pub fn paint_pixmap(commands: &[PaintCommand], width: u32, height: u32, scale: u32) -> Result<Pixmap> {
    if scale == 0 || scale > MAX_SCALE {
        return Err(Error::RasterizationFailure(format!(
            "scale {} outside 1..={}",
            scale, MAX_SCALE
        )));
    }
    if width == 0 || height == 0 || width.saturating_mul(scale) > MAX_DEVICE_EDGE
        || height.saturating_mul(scale) > MAX_DEVICE_EDGE {
        return Err(Error::RasterizationFailure(format!(
            "canvas {}x{} at scale {} is not rasterizable",
            width, height, scale
        )));
    }

    let s = scale as i64;
    let mut pixmap = Pixmap::new(width * scale, height * scale);
    for cmd in commands {
        match cmd {
            PaintCommand::SolidRect { x, y, width, height, rgba } => {
                pixmap.fill_rect(*x as i64 * s, *y as i64 * s, width * scale, height * scale, *rgba)
            }
            PaintCommand::RoundedRect { x, y, width, height, radius, rgba } => pixmap.fill_rounded_rect(
                *x as i64 * s,
                *y as i64 * s,
                width * scale,
                height * scale,
                radius * scale,
                *rgba,
            ),
            PaintCommand::Circle { x, y, diameter, rgba } => {
                pixmap.fill_circle(*x as i64 * s, *y as i64 * s, diameter * scale, *rgba)
            }
            PaintCommand::Text { x, y, text, scale: text_scale, rgba, mirrored } => pixmap.draw_text(
                *x as i64 * s,
                *y as i64 * s,
                text,
                *text_scale as u32 * scale,
                *rgba,
                *mirrored,
            ),
        }
    }
    Ok(pixmap)
}

pub fn rasterize(commands: &[PaintCommand], width: u32, height: u32, scale: u32) -> Result<Screenshot> {
    let pixmap = paint_pixmap(commands, width, height, scale)?;
    Ok(Screenshot {
        width: pixmap.width(),
        height: pixmap.height(),
        png_data: pixmap.encode_png()?,
    })
}

/// The font has no ornamental or curly quotes, so they draw as `"`
fn glyph(ch: char) -> Option<[u8; 8]> {
    let ch = match ch {
        '\u{275D}' | '\u{275E}' | '\u{201C}' | '\u{201D}' => '"',
        other => other,
    };
    BASIC_FONTS.get(ch).or_else(|| LATIN_FONTS.get(ch))
}
