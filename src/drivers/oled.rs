// AccelWatch — SSD1306 OLED Driver
//
// 128x64 panel on the shared I2C bus. Drawing happens in a host-side
// `Framebuffer`; `flush` streams it to the panel in horizontal addressing
// mode.

use accelwatch::config::*;
use accelwatch::display::Framebuffer;

use super::{lock_bus, SharedBus};

const CONTROL_COMMAND: u8 = 0x00;
const CONTROL_DATA: u8 = 0x40;
const FLUSH_CHUNK: usize = 32;

const INIT_SEQUENCE: &[u8] = &[
    0xAE,       // display off
    0xD5, 0x80, // clock divide
    0xA8, 0x3F, // multiplex 64
    0xD3, 0x00, // display offset 0
    0x40,       // start line 0
    0x8D, 0x14, // charge pump on
    0x20, 0x00, // horizontal addressing
    0xA1,       // segment remap
    0xC8,       // COM scan descending
    0xDA, 0x12, // COM pins
    0x81, 0x7F, // contrast
    0xD9, 0xF1, // pre-charge
    0xDB, 0x40, // VCOMH deselect
    0xA4,       // resume from RAM
    0xA6,       // normal (not inverted)
    0xAF,       // display on
];

pub struct OledDisplay {
    bus: SharedBus,
    framebuffer: Framebuffer,
}

impl OledDisplay {
    pub fn new(bus: SharedBus) -> Self {
        Self { bus, framebuffer: Framebuffer::oled() }
    }

    pub fn is_connected(&self) -> bool {
        let mut bus = lock_bus(self.bus);
        bus.write(I2C_ADDR_OLED, &[CONTROL_COMMAND, 0xE3], I2C_TIMEOUT_TICKS).is_ok() // NOP
    }

    pub fn init(&mut self) -> anyhow::Result<()> {
        self.command(INIT_SEQUENCE)?;
        self.flush()?;
        log::info!("SSD1306 initialised ({}x{})", SCREEN_WIDTH, SCREEN_HEIGHT);
        Ok(())
    }

    pub fn framebuffer_mut(&mut self) -> &mut Framebuffer {
        &mut self.framebuffer
    }

    /// Push the whole framebuffer to the panel.
    pub fn flush(&mut self) -> anyhow::Result<()> {
        let last_page = (SCREEN_HEIGHT / 8 - 1) as u8;
        let last_column = (SCREEN_WIDTH - 1) as u8;
        self.command(&[0x21, 0, last_column, 0x22, 0, last_page])?;

        let mut bus = lock_bus(self.bus);
        let mut packet = [0u8; FLUSH_CHUNK + 1];
        packet[0] = CONTROL_DATA;
        for chunk in self.framebuffer.as_bytes().chunks(FLUSH_CHUNK) {
            packet[1..=chunk.len()].copy_from_slice(chunk);
            bus.write(I2C_ADDR_OLED, &packet[..=chunk.len()], I2C_TIMEOUT_TICKS)?;
        }
        Ok(())
    }

    fn command(&self, bytes: &[u8]) -> anyhow::Result<()> {
        let mut bus = lock_bus(self.bus);
        for &byte in bytes {
            bus.write(I2C_ADDR_OLED, &[CONTROL_COMMAND, byte], I2C_TIMEOUT_TICKS)?;
        }
        Ok(())
    }
}
