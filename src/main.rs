// AccelWatch — Firmware Entry Point
//
// Device boot sequence (ESP-IDF):
//   1. Bring up the shared I2C bus.
//   2. Initialise the OLED and run the component self-test (OLED + MPU6050).
//   3. Spawn the sensor, power and face tasks.
//
// All watch face state lives in the face task; the sensor and power tasks
// only feed it events over a channel.
//
// Built for any other target, the binary runs the same face against
// synthetic samples and prints the last rendered frame.

#[cfg(target_os = "espidf")]
mod drivers;
#[cfg(target_os = "espidf")]
mod tasks;

// ---------------------------------------------------------------------------
// Utility: milliseconds since boot (wraps at ~49 days — fine for timestamps)
// ---------------------------------------------------------------------------
#[cfg(target_os = "espidf")]
pub fn now_ms() -> u32 {
    unsafe { (esp_idf_sys::esp_timer_get_time() / 1000) as u32 }
}

// ---------------------------------------------------------------------------
// Device
// ---------------------------------------------------------------------------
#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use std::sync::mpsc;
    use std::sync::Mutex;
    use std::thread;

    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::prelude::*;

    use accelwatch::config::*;

    use crate::drivers::imu::Mpu6050;
    use crate::drivers::oled::OledDisplay;

    // Link esp-idf-sys runtime patches and initialise logging.
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("AccelWatch firmware starting…");

    // ---- Peripherals ------------------------------------------------------
    let peripherals = Peripherals::take()?;

    // ---- I2C bus (shared between OLED and MPU6050) ------------------------
    let i2c_config = I2cConfig::new().baudrate(400u32.kHz().into());
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio6, // SDA
        peripherals.pins.gpio7, // SCL
        &i2c_config,
    )?;
    // SAFETY: The I2C peripheral is a singleton obtained from `Peripherals::take()`.
    // It will live for the entire programme duration (embedded firmware never exits).
    let i2c_bus: &'static Mutex<I2cDriver<'static>> =
        Box::leak(Box::new(Mutex::new(unsafe { core::mem::transmute(i2c) })));

    // ---- Self-test --------------------------------------------------------
    let mut display = OledDisplay::new(i2c_bus);
    display.init()?;

    let oled_ok = display.is_connected();
    let imu_ok = Mpu6050::new(i2c_bus).is_connected();
    if !oled_ok || !imu_ok {
        log::error!("Boot check FAILED — OLED:{} IMU:{}", oled_ok, imu_ok);
        // Continue anyway so we can still debug via serial.
    }
    log::info!(
        "Boot complete — {} Hz sampling, {} samples/batch, log channel {}",
        SAMPLING_RATE_HZ,
        SAMPLES_PER_BATCH,
        LOG_CHANNEL_ID
    );

    // ---- Channel ----------------------------------------------------------
    let (face_tx, face_rx) = mpsc::channel();

    // ---- Spawn tasks (map to FreeRTOS tasks via std::thread) ---------------

    // Sensor task — tightest timing.
    let sensor_tx = face_tx.clone();
    thread::Builder::new()
        .name("sensor".into())
        .stack_size(STACK_SENSOR)
        .spawn(move || {
            tasks::sensor::sensor_task(i2c_bus, sensor_tx);
        })?;

    // Power task
    thread::Builder::new()
        .name("power".into())
        .stack_size(STACK_POWER)
        .spawn(move || {
            tasks::power::power_task(face_tx);
        })?;

    // Face task — sole owner of the averaged reading, status and log channel.
    let face = thread::Builder::new()
        .name("face".into())
        .stack_size(STACK_FACE)
        .spawn(move || tasks::face::face_task(display, face_rx))?;

    match face.join() {
        Ok(Ok(())) => log::warn!("Face task exited"),
        Ok(Err(e)) => log::error!("Face task failed: {}", e),
        Err(_) => log::error!("Face task panicked"),
    }

    // Nothing can recover the log channel from here — start over.
    log::error!("Restarting");
    unsafe { esp_idf_sys::esp_restart() }
}

// ---------------------------------------------------------------------------
// Host simulation
// ---------------------------------------------------------------------------
#[cfg(not(target_os = "espidf"))]
const SIM_BATCHES: u32 = 40;

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    use accelwatch::channel::MemoryChannel;
    use accelwatch::config::*;
    use accelwatch::display::Framebuffer;
    use accelwatch::events::BatteryState;
    use accelwatch::render::WatchRenderer;
    use accelwatch::WatchFace;
    use embedded_graphics::prelude::*;

    accelwatch::logger::init_logger();
    log::info!("AccelWatch simulation starting…");

    let mut face = WatchFace::new(FaceConfig::default(), MemoryChannel::new(MEMORY_CHANNEL_CAPACITY))?;
    let renderer = WatchRenderer::new(Size::new(SCREEN_WIDTH, SCREEN_HEIGHT));
    let mut framebuffer = Framebuffer::oled();
    let battery = BatteryState { charge_percent: 76, is_charging: false, is_plugged: false };
    let start = chrono::Local::now().naive_local();

    for n in 0..SIM_BATCHES {
        // Another writer holds the channel now and then; the face should
        // keep showing the last real status change.
        face.channel_mut().set_busy(n % 7 == 3);

        let now = start + chrono::Duration::seconds(i64::from(n));
        let outcome = face.on_batch(&synthetic_batch(n), now)?;

        if outcome.rotated {
            let mut console = std::io::stdout().lock();
            for session in face.channel_mut().take_finished() {
                session.write_export(&mut console)?;
            }
        }

        if outcome.redraw {
            let frame = face.frame(now, battery, CLOCK_24H);
            renderer.render(&mut framebuffer, &frame)?;
            log::info!(
                "Redraw #{}: avg ({}, {}, {}) status {}",
                face.batch_count() / REDRAW_EVERY_BATCHES,
                outcome.reading.x,
                outcome.reading.y,
                outcome.reading.z,
                outcome.status
            );
        }
    }

    face.shutdown();
    println!("{}", framebuffer.to_ascii());
    Ok(())
}

/// Slowly tilting wrist with a little per-sample jitter.
#[cfg(not(target_os = "espidf"))]
fn synthetic_batch(n: u32) -> Vec<accelwatch::Sample> {
    use accelwatch::config::{SAMPLES_PER_BATCH, SAMPLING_RATE_HZ};

    let tilt = (n as i32 * 37) % 800 - 400;
    (0..SAMPLES_PER_BATCH as i32)
        .map(|i| {
            let jitter = (i * 13 + n as i32 * 7) % 21 - 10;
            let timestamp_ms = u64::from(n) * 1000 + (i as u64) * 1000 / u64::from(SAMPLING_RATE_HZ);
            accelwatch::Sample::new(
                (tilt + jitter) as i16,
                (-tilt / 2 - jitter) as i16,
                (1000 - tilt.abs() / 3 + jitter) as i16,
            )
            .at(timestamp_ms)
        })
        .collect()
}
