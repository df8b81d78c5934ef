use std::sync::Mutex;

use esp_idf_hal::i2c::I2cDriver;

pub mod imu;
pub mod oled;

/// Thread-safe handle to a shared I2C bus.
pub type SharedBus = &'static Mutex<I2cDriver<'static>>;

/// Lock the bus, recovering it if a task panicked while holding it.
pub fn lock_bus(bus: SharedBus) -> std::sync::MutexGuard<'static, I2cDriver<'static>> {
    bus.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
