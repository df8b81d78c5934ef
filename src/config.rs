// AccelWatch — Hardware & System Configuration
// Target: Seeed Studio Xiao ESP32-C3 (RISC-V) with MPU6050 + SSD1306.
// The host simulation uses the same values.

// ---------------------------------------------------------------------------
// GPIO Pin Definitions (Xiao ESP32-C3 pinout)
// ---------------------------------------------------------------------------
pub const PIN_I2C_SDA: i32 = 6;     // D4    — I2C data line
pub const PIN_I2C_SCL: i32 = 7;     // D5    — I2C clock line
pub const PIN_BATTERY_ADC: u32 = 2; // D0/A0 — Battery voltage (ADC)
pub const PIN_USB_DETECT: i32 = 5;  // D3    — VBUS sense (HIGH when plugged)

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_ADDR_MPU6050: u8 = 0x68;
pub const I2C_ADDR_OLED: u8 = 0x3C;
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks

// ---------------------------------------------------------------------------
// Display (SSD1306 OLED)
// ---------------------------------------------------------------------------
pub const SCREEN_WIDTH: u32 = 128;
pub const SCREEN_HEIGHT: u32 = 64;
pub const DISPLAY_BUFFER_SIZE: usize = (SCREEN_WIDTH as usize * SCREEN_HEIGHT as usize) / 8; // 1024
pub const CLOCK_24H: bool = true;

// ---------------------------------------------------------------------------
// Task Stack Sizes (bytes)
// ---------------------------------------------------------------------------
pub const STACK_SENSOR: usize = 4096;
pub const STACK_FACE: usize = 8192;
pub const STACK_POWER: usize = 4096;

// ---------------------------------------------------------------------------
// Sampling & cadence
// ---------------------------------------------------------------------------
pub const SAMPLING_RATE_HZ: u32 = 10;
pub const SAMPLES_PER_BATCH: usize = 10;                // one batch per second
pub const REDRAW_EVERY_BATCHES: u32 = 4;
pub const ROTATE_EVERY_BATCHES: u32 = 5;
pub const BATTERY_CHECK_INTERVAL_MS: u64 = 10_000;     // 10 seconds

// ---------------------------------------------------------------------------
// Accelerometer
// ---------------------------------------------------------------------------
/// Normalised magnitude of 1 g. Sample axes are expressed in these units.
pub const ACCEL_MAX: i32 = 1000;
pub const ACCEL_SCALE_8G: i32 = 4096;   // LSB/g at ±8 g

// ---------------------------------------------------------------------------
// Log channel
// ---------------------------------------------------------------------------
pub const LOG_CHANNEL_ID: u32 = 1234;
/// x, y, z (i16 LE) + vibrate flag (u8) + timestamp (u64 LE).
pub const SAMPLE_RECORD_SIZE: usize = 15;
pub const LOG_RESUMABLE: bool = true;
pub const MEMORY_CHANNEL_CAPACITY: usize = 600;         // records per session

/// Identity of the append-only log channel. Passed through unchanged on
/// every rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    pub id: u32,
    pub record_size: usize,
    pub resumable: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            id: LOG_CHANNEL_ID,
            record_size: SAMPLE_RECORD_SIZE,
            resumable: LOG_RESUMABLE,
        }
    }
}

/// Fires every `every`-th event. A zero period never fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub every: u32,
}

impl Cadence {
    pub const fn new(every: u32) -> Self {
        Self { every }
    }

    pub fn is_due(&self, count: u32) -> bool {
        self.every != 0 && count % self.every == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceConfig {
    pub channel: ChannelConfig,
    pub redraw: Cadence,
    pub rotation: Cadence,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            channel: ChannelConfig::default(),
            redraw: Cadence::new(REDRAW_EVERY_BATCHES),
            rotation: Cadence::new(ROTATE_EVERY_BATCHES),
        }
    }
}
