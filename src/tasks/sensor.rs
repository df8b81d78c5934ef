// AccelWatch — Sensor Task
//
// Samples the accelerometer at SAMPLING_RATE_HZ and hands a batch of
// SAMPLES_PER_BATCH readings to the face task at a time.

use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use accelwatch::config::*;
use accelwatch::events::{FaceEvent, Sample};

use crate::drivers::imu::Mpu6050;
use crate::drivers::SharedBus;

pub fn sensor_task(bus: SharedBus, face_tx: Sender<FaceEvent>) {
    log::info!("Sensor task started");

    let imu = Mpu6050::new(bus);
    if let Err(e) = imu.init() {
        log::error!("MPU6050 init failed in sensor task: {}", e);
        return;
    }

    let interval = Duration::from_millis(1000 / u64::from(SAMPLING_RATE_HZ));
    let mut batch: Vec<Sample> = Vec::with_capacity(SAMPLES_PER_BATCH);

    loop {
        let tick_start = Instant::now();

        match imu.read_sample(u64::from(crate::now_ms())) {
            Ok(sample) => batch.push(sample),
            Err(e) => log::warn!("IMU read error: {}", e),
        }

        if batch.len() >= SAMPLES_PER_BATCH {
            let full = std::mem::replace(&mut batch, Vec::with_capacity(SAMPLES_PER_BATCH));
            if face_tx.send(FaceEvent::Batch(full)).is_err() {
                // Receiver dropped — face task has exited. Shut down cleanly.
                log::warn!("Face channel closed — exiting sensor task");
                return;
            }
        }

        // Sleep for the remainder of the sampling interval.
        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }
}
