use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        /// Seconds on the page's monotonic `performance.now()` timeline.
        pub fn now_seconds() -> f64 {
            web_sys::window()
                .and_then(|w| w.performance())
                .map(|p| p.now() / 1000.0)
                .unwrap_or(0.0)
        }
    } else {
        use once_cell::sync::Lazy;
        use std::time::Instant;

        static EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

        /// Seconds since the first call in this process.
        pub fn now_seconds() -> f64 {
            EPOCH.elapsed().as_secs_f64()
        }
    }
}

/// Elapsed-time source for the frame updater. Started once, never reset.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    start: f64,
}

impl Clock {
    pub fn start() -> Self {
        Self::starting_at(now_seconds())
    }

    pub fn starting_at(now: f64) -> Self {
        Self { start: now }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed_at(now_seconds())
    }

    /// Elapsed seconds at timestamp `now`; never negative.
    pub fn elapsed_at(&self, now: f64) -> f32 {
        (now - self.start).max(0.0) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_is_measured_from_start() {
        let clock = Clock::starting_at(10.0);
        assert_eq!(clock.elapsed_at(10.0), 0.0);
        assert!((clock.elapsed_at(12.5) - 2.5).abs() < 1e-6);
    }

    #[test]
    fn elapsed_never_goes_negative() {
        let clock = Clock::starting_at(10.0);
        assert_eq!(clock.elapsed_at(9.0), 0.0);
    }

    #[test]
    fn native_now_is_monotonic() {
        let a = now_seconds();
        let b = now_seconds();
        assert!(b >= a);
    }
}
