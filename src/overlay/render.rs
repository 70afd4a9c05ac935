use crate::geometry::{Rect, Size};
use crate::overlay::input::{HitAction, HitRegion};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Colours used when painting the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayStyle {
    /// Painted over the whole surface. Layered windows pass clicks through
    /// fully transparent pixels, so this must keep a non-zero alpha.
    pub floor: Rgba,
    pub close_highlight: Rgba,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            floor: Rgba::new(0, 0, 0, 3),
            close_highlight: Rgba::new(255, 0, 0, 160),
        }
    }
}

/// Straight-alpha RGBA pixels, row-major, top-down.
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
            chunk.copy_from_slice(&[fill.r, fill.g, fill.b, fill.a]);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let idx = ((y * self.width + x) * 4) as usize;
        Rgba {
            r: self.pixels[idx],
            g: self.pixels[idx + 1],
            b: self.pixels[idx + 2],
            a: self.pixels[idx + 3],
        }
    }

    /// Overwrite `rect`, clipped to the buffer.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        let x0 = rect.x.clamp(0, self.width as i32) as u32;
        let y0 = rect.y.clamp(0, self.height as i32) as u32;
        let x1 = rect.right().clamp(0, self.width as i32) as u32;
        let y1 = rect.bottom().clamp(0, self.height as i32) as u32;
        for y in y0..y1 {
            let row = (y * self.width) as usize * 4;
            for x in x0..x1 {
                let idx = row + x as usize * 4;
                self.pixels[idx..idx + 4].copy_from_slice(&[color.r, color.g, color.b, color.a]);
            }
        }
    }

    /// Premultiplied BGRA, the layout `UpdateLayeredWindow` expects.
    pub fn to_premultiplied_bgra(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len());
        for px in self.pixels.chunks_exact(4) {
            let alpha = px[3] as u16;
            let scale = |channel: u8| ((channel as u16 * alpha + 127) / 255) as u8;
            out.extend_from_slice(&[scale(px[2]), scale(px[1]), scale(px[0]), px[3]]);
        }
        out
    }
}

pub fn render_overlay(
    size: Size,
    regions: &[HitRegion],
    hovered: Option<HitAction>,
    style: OverlayStyle,
) -> RgbaBuffer {
    let mut frame = RgbaBuffer::new(
        size.width.max(0) as u32,
        size.height.max(0) as u32,
        style.floor,
    );
    if let Some(hovered) = hovered {
        for region in regions.iter().filter(|region| region.action == hovered) {
            let color = match region.action {
                HitAction::Close => style.close_highlight,
            };
            frame.fill_rect(region.rect, color);
        }
    }
    frame
}
