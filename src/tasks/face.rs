// AccelWatch — Face Task
//
// The only thread that touches the watch face state. Consumes sample
// batches and battery updates in arrival order, redraws the OLED on the
// redraw cadence and streams each sealed log session to the serial console
// (stdout) after a rotation, one `LOG ...` hex line per session.

use std::io::Write;
use std::sync::mpsc::Receiver;

use accelwatch::channel::MemoryChannel;
use accelwatch::config::*;
use accelwatch::events::{BatteryState, FaceEvent};
use accelwatch::render::WatchRenderer;
use accelwatch::{WatchError, WatchFace};
use embedded_graphics::prelude::*;

use crate::drivers::oled::OledDisplay;

pub fn face_task(mut display: OledDisplay, face_rx: Receiver<FaceEvent>) -> anyhow::Result<()> {
    log::info!("Face task started");

    let mut face = WatchFace::new(FaceConfig::default(), MemoryChannel::new(MEMORY_CHANNEL_CAPACITY))?;
    let renderer = WatchRenderer::new(Size::new(SCREEN_WIDTH, SCREEN_HEIGHT));
    let mut battery = BatteryState::default();

    while let Ok(event) = face_rx.recv() {
        match event {
            FaceEvent::Battery(state) => battery = state,

            FaceEvent::Batch(batch) => {
                let now = chrono::Local::now().naive_local();
                let outcome = match face.on_batch(&batch, now) {
                    Ok(outcome) => outcome,
                    Err(WatchError::InvalidInput(msg)) => {
                        log::warn!("Dropping batch: {}", msg);
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };

                if outcome.rotated {
                    let mut console = std::io::stdout().lock();
                    for session in face.channel_mut().take_finished() {
                        log::info!(
                            "Log session {}#{} sealed ({} records)",
                            session.channel_id,
                            session.sequence,
                            session.records
                        );
                        if let Err(e) = session.write_export(&mut console) {
                            log::warn!("Session export failed: {}", e);
                        }
                    }
                    let _ = console.flush();
                }

                if outcome.redraw {
                    let frame = face.frame(now, battery, CLOCK_24H);
                    if renderer.render(display.framebuffer_mut(), &frame)? {
                        if let Err(e) = display.flush() {
                            log::error!("Display error: {}", e);
                        }
                    }
                }
            }
        }
    }

    log::warn!("Face channel closed — exiting face task");
    face.shutdown();
    Ok(())
}
