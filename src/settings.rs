//! User preferences
//!
//! Three values, each persisted under its own key as a JSON scalar.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::consts::*;
use crate::persistence::KeyValueStore;

/// Clamp any stored or requested ball count into the supported range
pub fn clamp_ball_count(count: i64) -> u32 {
    count.clamp(BALL_COUNT_MIN as i64, BALL_COUNT_MAX as i64) as u32
}

/// Toy settings/preferences
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Balls spawned on start and on every reset
    pub ball_count: u32,
    /// Collision and countdown sounds
    pub sound_enabled: bool,
    /// Haptic pulses on collisions and countdown
    pub vibration_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ball_count: BALL_COUNT_DEFAULT,
            sound_enabled: true,
            vibration_enabled: true,
        }
    }
}

impl Settings {
    /// Storage keys
    pub const BALL_COUNT_KEY: &'static str = "tilt_balls.ball_count";
    pub const SOUND_KEY: &'static str = "tilt_balls.sound";
    pub const VIBRATION_KEY: &'static str = "tilt_balls.vibration";

    pub fn set_ball_count(&mut self, count: i64) {
        self.ball_count = clamp_ball_count(count);
    }

    /// Load settings, falling back to defaults for anything missing or unreadable
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let defaults = Self::default();

        let ball_count = read::<f64>(store, Self::BALL_COUNT_KEY)
            .filter(|n| n.is_finite())
            .map(|n| clamp_ball_count(n.round() as i64))
            .unwrap_or(defaults.ball_count);
        let sound_enabled = read(store, Self::SOUND_KEY).unwrap_or(defaults.sound_enabled);
        let vibration_enabled =
            read(store, Self::VIBRATION_KEY).unwrap_or(defaults.vibration_enabled);

        let settings = Self {
            ball_count,
            sound_enabled,
            vibration_enabled,
        };
        log::info!("Loaded settings: {:?}", settings);
        settings
    }

    /// Persist settings; failures are logged and otherwise ignored
    pub fn save(&self, store: &mut dyn KeyValueStore) {
        write(store, Self::BALL_COUNT_KEY, &self.ball_count);
        write(store, Self::SOUND_KEY, &self.sound_enabled);
        write(store, Self::VIBRATION_KEY, &self.vibration_enabled);
        log::info!("Settings saved");
    }
}

fn read<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    match store.get(key) {
        Ok(Some(raw)) => match serde_json::from_str(raw.trim()) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Ignoring unreadable setting {}={:?}: {}", key, raw, e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            log::warn!("Could not read setting {}: {}", key, e);
            None
        }
    }
}

fn write<T: Serialize>(store: &mut dyn KeyValueStore, key: &str, value: &T) {
    let Ok(json) = serde_json::to_string(value) else {
        return;
    };
    if let Err(e) = store.set(key, &json) {
        log::warn!("Could not save setting {}: {}", key, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStore, StoreError};
    use proptest::prelude::*;

    #[test]
    fn test_defaults_when_empty() {
        let store = MemoryStore::new();
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let settings = Settings {
            ball_count: 20,
            sound_enabled: false,
            vibration_enabled: true,
        };
        settings.save(&mut store);
        assert_eq!(store.get(Settings::BALL_COUNT_KEY).unwrap().as_deref(), Some("20"));
        assert_eq!(store.get(Settings::SOUND_KEY).unwrap().as_deref(), Some("false"));
        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn test_stored_ball_count_is_clamped() {
        let mut store = MemoryStore::new();
        store.set(Settings::BALL_COUNT_KEY, "99").unwrap();
        assert_eq!(Settings::load(&store).ball_count, BALL_COUNT_MAX);
        store.set(Settings::BALL_COUNT_KEY, "-4").unwrap();
        assert_eq!(Settings::load(&store).ball_count, BALL_COUNT_MIN);
        store.set(Settings::BALL_COUNT_KEY, "7.6").unwrap();
        assert_eq!(Settings::load(&store).ball_count, 8);
    }

    #[test]
    fn test_garbage_values_fall_back() {
        let mut store = MemoryStore::new();
        store.set(Settings::BALL_COUNT_KEY, "lots").unwrap();
        store.set(Settings::SOUND_KEY, "yes please").unwrap();
        store.set(Settings::VIBRATION_KEY, "false").unwrap();
        let s = Settings::load(&store);
        assert_eq!(s.ball_count, BALL_COUNT_DEFAULT);
        assert!(s.sound_enabled);
        assert!(!s.vibration_enabled);
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable)
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Rejected("quota".into()))
        }
    }

    #[test]
    fn test_broken_storage_is_not_fatal() {
        let mut store = BrokenStore;
        let s = Settings::load(&store);
        assert_eq!(s, Settings::default());
        s.save(&mut store);
    }

    proptest! {
        #[test]
        fn prop_any_stored_count_is_clamped(raw in ".*") {
            let mut store = MemoryStore::new();
            store.set(Settings::BALL_COUNT_KEY, &raw).unwrap();
            let count = Settings::load(&store).ball_count;
            prop_assert!((BALL_COUNT_MIN..=BALL_COUNT_MAX).contains(&count));
        }

        #[test]
        fn prop_any_numeric_count_is_clamped(n in any::<i64>()) {
            let mut store = MemoryStore::new();
            store.set(Settings::BALL_COUNT_KEY, &n.to_string()).unwrap();
            let count = Settings::load(&store).ball_count;
            prop_assert!((BALL_COUNT_MIN..=BALL_COUNT_MAX).contains(&count));
            prop_assert_eq!(count, clamp_ball_count(n));
        }
    }
}
