// AccelWatch — Power Task
//
// Polls the battery divider and the USB sense pin, and tells the face task
// whenever the resulting BatteryState changes.

use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use accelwatch::config::*;
use accelwatch::events::{BatteryState, FaceEvent};
use esp_idf_sys as sys;

/// One-shot ADC1 reader on the battery pin (GPIO2, 11 dB, 12 bit).
struct BatteryAdc {
    handle: sys::adc_oneshot_unit_handle_t,
    channel: sys::adc_channel_t,
}

impl BatteryAdc {
    fn new() -> anyhow::Result<Self> {
        let mut handle: sys::adc_oneshot_unit_handle_t = core::ptr::null_mut();
        let channel = sys::adc_channel_t_ADC_CHANNEL_2;

        // SAFETY: plain ESP-IDF driver calls with valid, initialised config structs.
        unsafe {
            let unit_cfg = sys::adc_oneshot_unit_init_cfg_t {
                unit_id: sys::adc_unit_t_ADC_UNIT_1,
                ulp_mode: sys::adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
                ..core::mem::zeroed()
            };
            sys::esp!(sys::adc_oneshot_new_unit(&unit_cfg, &mut handle))?;

            let chan_cfg = sys::adc_oneshot_chan_cfg_t {
                atten: sys::adc_atten_t_ADC_ATTEN_DB_11,
                bitwidth: sys::adc_bitwidth_t_ADC_BITWIDTH_12,
            };
            sys::esp!(sys::adc_oneshot_config_channel(handle, channel, &chan_cfg))?;

            sys::esp!(sys::gpio_set_direction(PIN_USB_DETECT, sys::gpio_mode_t_GPIO_MODE_INPUT))?;
        }

        Ok(Self { handle, channel })
    }

    fn read(&self) -> anyhow::Result<BatteryState> {
        let mut raw: i32 = 0;
        // SAFETY: handle and channel were configured in `new`.
        let plugged = unsafe {
            sys::esp!(sys::adc_oneshot_read(self.handle, self.channel, &mut raw))?;
            sys::gpio_get_level(PIN_USB_DETECT) != 0
        };
        Ok(battery_state(raw, plugged))
    }
}

pub fn power_task(face_tx: Sender<FaceEvent>) {
    log::info!("Power task started (ADC pin {})", PIN_BATTERY_ADC);

    let adc = match BatteryAdc::new() {
        Ok(adc) => adc,
        Err(e) => {
            log::error!("Battery ADC init failed: {}", e);
            return;
        }
    };

    let check_interval = Duration::from_millis(BATTERY_CHECK_INTERVAL_MS);
    let mut last: Option<BatteryState> = None;

    loop {
        match adc.read() {
            Ok(state) if last != Some(state) => {
                log::debug!("Battery {}% plugged:{}", state.charge_percent, state.is_plugged);
                if face_tx.send(FaceEvent::Battery(state)).is_err() {
                    log::warn!("Face channel closed — exiting power task");
                    return;
                }
                last = Some(state);
            }
            Ok(_) => {}
            Err(e) => log::warn!("Battery read error: {}", e),
        }

        thread::sleep(check_interval);
    }
}

/// Convert a 12-bit ADC reading to a charge percentage.
fn battery_state(raw: i32, plugged: bool) -> BatteryState {
    // 1:2 divider in front of the ADC; LiPo 3.3 V = 0 %, 4.2 V = 100 %.
    let voltage = (raw as f32 / 4095.0) * 3.3 * 2.0;
    let level = ((voltage - 3.3) / (4.2 - 3.3) * 100.0).clamp(0.0, 100.0) as u8;

    BatteryState {
        charge_percent: level,
        // The charger has no status line; treat "plugged and not full" as charging.
        is_charging: plugged && level < 100,
        is_plugged: plugged,
    }
}
