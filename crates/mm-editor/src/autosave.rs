//! Auto-save scheduler.
//!
//! Polling design: the owner calls [`AutoSave::tick`] on a fixed cadence
//! ([`AutoSaveSettings::tick`]). Each tick checks the gates in order and only
//! invokes the save callback when all of them pass:
//!
//! 1. auto-save is enabled,
//! 2. a mind-map name is set,
//! 3. `now - lastSaveTime >= interval`,
//! 4. there is an unsaved edit no older than the staleness ceiling.
//!
//! A failed save leaves `lastSaveTime` untouched, so the next tick retries.

use mm_core::record::AutoSaveConfig;
use std::time::Duration;

/// Scheduler cadence. User-facing knobs live in [`AutoSaveConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoSaveSettings {
    /// How often the owner polls [`AutoSave::tick`]. Default: **5 s**.
    pub tick: Duration,
    /// Edits older than this are not worth an automatic save. Default: **60 s**.
    pub staleness_ceiling: Duration,
}

impl Default for AutoSaveSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(5),
            staleness_ceiling: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoSaveState {
    Disabled,
    Armed,
    Saving,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Disabled,
    NoName,
    /// Interval since the last save has not elapsed.
    Waiting,
    /// No unsaved edit recent enough.
    Idle,
    Saved,
    Failed,
}

#[derive(Debug)]
pub struct AutoSave {
    config: AutoSaveConfig,
    settings: AutoSaveSettings,
    state: AutoSaveState,
    last_edit: Option<u64>,
    unsaved: bool,
}

impl AutoSave {
    pub fn new(config: AutoSaveConfig, settings: AutoSaveSettings) -> Self {
        Self {
            state: if config.enabled {
                AutoSaveState::Armed
            } else {
                AutoSaveState::Disabled
            },
            config,
            settings,
            last_edit: None,
            unsaved: false,
        }
    }

    pub fn config(&self) -> &AutoSaveConfig {
        &self.config
    }

    pub fn settings(&self) -> &AutoSaveSettings {
        &self.settings
    }

    pub fn state(&self) -> AutoSaveState {
        self.state
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
        self.state = if enabled {
            AutoSaveState::Armed
        } else {
            AutoSaveState::Disabled
        };
        log::info!("auto-save {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Change the interval. `lastSaveTime` is deliberately left alone.
    pub fn set_interval(&mut self, interval_ms: u64) {
        self.config.interval = interval_ms;
        log::info!("auto-save interval set to {interval_ms} ms");
    }

    /// A graph edit happened at `now`.
    pub fn note_edit(&mut self, now: u64) {
        self.last_edit = Some(now);
        self.unsaved = true;
    }

    /// A save (manual or automatic) completed at `now`.
    pub fn mark_saved(&mut self, now: u64) {
        self.config.last_save_time = now;
        self.unsaved = false;
    }

    /// Drop edit tracking; used when another mind map is opened.
    pub fn reset_activity(&mut self) {
        self.last_edit = None;
        self.unsaved = false;
    }

    /// Enabled and the interval since the last save has elapsed.
    pub fn should_auto_save(&self, now: u64) -> bool {
        self.config.enabled && now.saturating_sub(self.config.last_save_time) >= self.config.interval
    }

    /// An unsaved edit exists and is not older than the staleness ceiling.
    pub fn has_recent_activity(&self, now: u64) -> bool {
        let ceiling = u64::try_from(self.settings.staleness_ceiling.as_millis()).unwrap_or(u64::MAX);
        self.unsaved
            && self
                .last_edit
                .is_some_and(|at| now.saturating_sub(at) <= ceiling)
    }

    /// Run one poll. `save` performs the write and reports success.
    pub fn tick(&mut self, now: u64, has_name: bool, save: impl FnOnce() -> bool) -> TickOutcome {
        if !self.config.enabled {
            return TickOutcome::Disabled;
        }
        if !has_name {
            return TickOutcome::NoName;
        }
        if !self.should_auto_save(now) {
            return TickOutcome::Waiting;
        }
        if !self.has_recent_activity(now) {
            return TickOutcome::Idle;
        }

        self.state = AutoSaveState::Saving;
        let ok = save();
        self.state = AutoSaveState::Armed;
        if ok {
            self.mark_saved(now);
            log::info!("auto-saved at {now}");
            TickOutcome::Saved
        } else {
            log::warn!("auto-save failed at {now}; retrying next tick");
            TickOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: u64 = 1_700_000_000_000;

    fn armed(interval: u64) -> AutoSave {
        AutoSave::new(
            AutoSaveConfig {
                enabled: true,
                interval,
                last_save_time: T,
            },
            AutoSaveSettings::default(),
        )
    }

    #[test]
    fn interval_gate_is_inclusive_of_elapsed_time() {
        let mut auto = armed(5000);
        auto.note_edit(T + 4000);

        let mut writes = 0;
        assert_eq!(
            auto.tick(T + 4999, true, || {
                writes += 1;
                true
            }),
            TickOutcome::Waiting
        );
        assert_eq!(
            auto.tick(T + 5001, true, || {
                writes += 1;
                true
            }),
            TickOutcome::Saved
        );
        assert_eq!(writes, 1);
        assert_eq!(auto.config().last_save_time, T + 5001);
    }

    #[test]
    fn no_edit_means_no_save() {
        let mut auto = armed(5000);
        assert_eq!(auto.tick(T + 6000, true, || true), TickOutcome::Idle);
    }

    #[test]
    fn stale_edit_is_not_saved() {
        let mut auto = armed(5000);
        auto.note_edit(T);
        assert_eq!(auto.tick(T + 60_001, true, || true), TickOutcome::Idle);

        let mut fresh = armed(5000);
        fresh.note_edit(T);
        assert_eq!(fresh.tick(T + 59_000, true, || true), TickOutcome::Saved);
    }

    #[test]
    fn saved_edit_is_not_saved_again() {
        let mut auto = armed(5000);
        auto.note_edit(T + 1000);
        assert_eq!(auto.tick(T + 5000, true, || true), TickOutcome::Saved);
        assert_eq!(auto.tick(T + 10_000, true, || true), TickOutcome::Idle);
    }

    #[test]
    fn missing_name_or_disabled_short_circuits() {
        let mut auto = armed(0);
        auto.note_edit(T);
        assert_eq!(auto.tick(T + 1, false, || true), TickOutcome::NoName);
        auto.set_enabled(false);
        assert_eq!(auto.state(), AutoSaveState::Disabled);
        assert_eq!(auto.tick(T + 1, true, || true), TickOutcome::Disabled);
    }

    #[test]
    fn failed_save_is_retried() {
        let mut auto = armed(5000);
        auto.note_edit(T + 4000);
        assert_eq!(auto.tick(T + 5000, true, || false), TickOutcome::Failed);
        assert_eq!(auto.config().last_save_time, T);
        assert_eq!(auto.state(), AutoSaveState::Armed);
        assert_eq!(auto.tick(T + 10_000, true, || true), TickOutcome::Saved);
    }

    #[test]
    fn interval_change_keeps_last_save_time() {
        let mut auto = armed(5000);
        auto.set_interval(20_000);
        assert_eq!(auto.config().last_save_time, T);
        auto.note_edit(T + 9000);
        assert_eq!(auto.tick(T + 10_000, true, || true), TickOutcome::Waiting);
        assert_eq!(auto.tick(T + 20_000, true, || true), TickOutcome::Saved);
    }

    #[test]
    fn disabled_by_default() {
        let auto = AutoSave::new(AutoSaveConfig::default(), AutoSaveSettings::default());
        assert_eq!(auto.state(), AutoSaveState::Disabled);
        assert!(!auto.should_auto_save(u64::MAX));
    }
}
