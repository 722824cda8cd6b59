//! ESP32 time adapter.
//!
//! Provides the monotonic millisecond clock the engines run on and the
//! local wall time the clock keeper consumes.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` and the
//!   SNTP-disciplined `gettimeofday()`.
//! - **`not(target_os = "espidf")`**: uses `std::time` for host-side
//!   simulation.

use crate::clock::WallTime;

/// Wall times before 2020-01-01 mean the clock was never synchronised.
const EPOCH_2020: i64 = 1_577_836_800;

/// Time adapter for the ESP32-S3 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Milliseconds since boot.  Wraps after ~49.7 days; every consumer
    /// treats a backwards step as a rollover.
    #[cfg(target_os = "espidf")]
    pub fn uptime_ms(&self) -> u32 {
        ((unsafe { esp_idf_svc::sys::esp_timer_get_time() }) / 1000) as u32
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }

    /// UTC seconds and milliseconds since the Unix epoch, `None` before the
    /// first sync.
    #[cfg(target_os = "espidf")]
    fn unix_now(&self) -> Option<(i64, u16)> {
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return None;
        }
        Some((tv.tv_sec as i64, (tv.tv_usec / 1000) as u16))
    }

    #[cfg(not(target_os = "espidf"))]
    fn unix_now(&self) -> Option<(i64, u16)> {
        let d = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .ok()?;
        Some((d.as_secs() as i64, d.subsec_millis() as u16))
    }

    /// Local wall time at a whole-hour UTC offset.
    pub fn local_time(&self, tz_hours: i16) -> Option<WallTime> {
        let (secs, millis) = self.unix_now()?;
        if secs < EPOCH_2020 {
            return None;
        }
        Some(wall_from_unix(secs + i64::from(tz_hours) * 3600, millis))
    }
}

/// Break Unix seconds down into a calendar date and time of day.
pub fn wall_from_unix(secs: i64, millis: u16) -> WallTime {
    let days = secs.div_euclid(86_400);
    let tod = secs.rem_euclid(86_400);

    // Civil-from-days over 400-year eras.
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);

    WallTime {
        year: year as u16,
        month: month as u8,
        day: day as u8,
        hour: (tod / 3600) as u8,
        minute: (tod % 3600 / 60) as u8,
        second: (tod % 60) as u8,
        millis,
    }
}
