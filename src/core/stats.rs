//! Thread-local counters for the handful of quantities the error model
//! cares about. Workers flush into the global summary when they finish; a
//! barrier at shutdown is unnecessary because the render loop joins its
//! threads before reporting.

// std
use std::cell::Cell;
use std::sync::Mutex;

#[derive(Debug, Default, Copy, Clone)]
pub struct RenderStats {
    pub rays: u64,
    pub shadow_rays: u64,
    pub dropped_samples: u64,
    pub virtual_lights: u64,
}

impl RenderStats {
    fn merge(&mut self, other: &RenderStats) {
        self.rays += other.rays;
        self.shadow_rays += other.shadow_rays;
        self.dropped_samples += other.dropped_samples;
        self.virtual_lights += other.virtual_lights;
    }
}

lazy_static! {
    static ref GLOBAL_STATS: Mutex<RenderStats> = Mutex::new(RenderStats::default());
}

thread_local! {
    static LOCAL_STATS: Cell<RenderStats> = Cell::new(RenderStats::default());
}

fn update<F: FnOnce(&mut RenderStats)>(f: F) {
    LOCAL_STATS.with(|cell| {
        let mut stats = cell.get();
        f(&mut stats);
        cell.set(stats);
    });
}

pub fn record_ray() {
    update(|s| s.rays += 1);
}

pub fn record_shadow_ray() {
    update(|s| s.shadow_rays += 1);
}

pub fn record_dropped_sample() {
    update(|s| s.dropped_samples += 1);
}

pub fn record_virtual_light() {
    update(|s| s.virtual_lights += 1);
}

/// Fold this thread's counters into the global summary; called by each
/// worker when its tile queue runs dry.
pub fn flush_thread_stats() {
    LOCAL_STATS.with(|cell| {
        let stats = cell.get();
        cell.set(RenderStats::default());
        GLOBAL_STATS.lock().unwrap().merge(&stats);
    });
}

pub fn global_summary() -> RenderStats {
    *GLOBAL_STATS.lock().unwrap()
}

pub fn log_summary() {
    let s = global_summary();
    log::info!(
        "rays traced: {} (shadow {}), dropped samples: {}, virtual lights: {}",
        s.rays,
        s.shadow_rays,
        s.dropped_samples,
        s.virtual_lights
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_accumulates() {
        let before = global_summary().dropped_samples;
        record_dropped_sample();
        record_dropped_sample();
        flush_thread_stats();
        let after = global_summary().dropped_samples;
        assert!(after >= before + 2);
    }
}
