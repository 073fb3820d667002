//! Companion settings and preferences
//!
//! Persisted in LocalStorage on wasm; plain defaults elsewhere. The core
//! treats these as read-only input re-read on demand.

use serde::{Deserialize, Serialize};

/// User-tunable behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Weight messages by time-of-day/day-of-week context
    pub contextual_messages: bool,
    /// Central horizontal band (fraction margin from each edge) within which
    /// messages may display
    pub safe_zone_margin: f32,
    /// Per-second chance of an autonomous jump while resting
    pub jump_probability: f32,
    /// Bounds for the randomized delay between scheduled messages (ms)
    pub message_min_interval_ms: f64,
    pub message_max_interval_ms: f64,

    // === Accessibility ===
    /// Reduced motion (suppress the landing shake)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            contextual_messages: true,
            safe_zone_margin: 0.15,
            jump_probability: 0.08,
            message_min_interval_ms: 20_000.0,
            message_max_interval_ms: 45_000.0,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Message interval bounds, sanitized so a bad configuration degrades to
    /// something usable instead of breaking the scheduler.
    pub fn message_interval_ms(&self) -> (f64, f64) {
        let defaults = Settings::default();
        let mut min = self.message_min_interval_ms;
        let mut max = self.message_max_interval_ms;
        if !min.is_finite() || min < 1_000.0 {
            min = defaults.message_min_interval_ms;
        }
        if !max.is_finite() || max < min {
            max = min.max(defaults.message_max_interval_ms);
        }
        (min, max)
    }

    /// Safe-zone margin clamped to a sane fraction.
    pub fn effective_safe_zone(&self) -> f32 {
        if self.safe_zone_margin.is_finite() {
            self.safe_zone_margin.clamp(0.0, 0.45)
        } else {
            Settings::default().safe_zone_margin
        }
    }

    /// Jump probability clamped to [0, 1].
    pub fn effective_jump_probability(&self) -> f32 {
        if self.jump_probability.is_finite() {
            self.jump_probability.clamp(0.0, 1.0)
        } else {
            Settings::default().jump_probability
        }
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "pixel_pal_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
