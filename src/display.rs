// AccelWatch — Monochrome Framebuffer
//
// 1 bpp buffer in SSD1306 page order: each byte is a vertical strip of 8
// pixels, LSB at the top, pages laid out left to right. The device driver
// streams `as_bytes()` straight to the panel; the host simulation prints it.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

use crate::config::*;

pub struct Framebuffer {
    width: u32,
    height: u32,
    buffer: Vec<u8>,
}

impl Framebuffer {
    /// `height` is rounded up to a whole page.
    pub fn new(width: u32, height: u32) -> Self {
        let pages = (height as usize + 7) / 8;
        Self {
            width,
            height,
            buffer: vec![0; width as usize * pages],
        }
    }

    pub fn oled() -> Self {
        let fb = Self::new(SCREEN_WIDTH, SCREEN_HEIGHT);
        debug_assert_eq!(fb.buffer.len(), DISPLAY_BUFFER_SIZE);
        fb
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn pixel(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let (index, bit) = self.locate(x, y);
        self.buffer[index] & bit != 0
    }

    pub fn lit_pixels(&self) -> usize {
        self.buffer.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Count of lit pixels inside a rectangle (clipped to the buffer).
    pub fn lit_in(&self, x: u32, y: u32, w: u32, h: u32) -> usize {
        (y..y.saturating_add(h))
            .flat_map(|py| (x..x.saturating_add(w)).map(move |px| (px, py)))
            .filter(|&(px, py)| self.pixel(px, py))
            .count()
    }

    /// One text line per pixel row, `#` for lit pixels.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((self.width as usize + 1) * self.height as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                out.push(if self.pixel(x, y) { '#' } else { '.' });
            }
            out.push('\n');
        }
        out
    }

    fn locate(&self, x: u32, y: u32) -> (usize, u8) {
        let index = (y as usize / 8) * self.width as usize + x as usize;
        (index, 1 << (y % 8))
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Framebuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as u32, point.y as u32);
            if x >= self.width || y >= self.height {
                continue;
            }
            let (index, bit) = self.locate(x, y);
            match color {
                BinaryColor::On => self.buffer[index] |= bit,
                BinaryColor::Off => self.buffer[index] &= !bit,
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let fill = match color {
            BinaryColor::On => 0xFF,
            BinaryColor::Off => 0x00,
        };
        self.buffer.fill(fill);
        Ok(())
    }
}
