//! Grandfather-Father-Son keep-set selection.

use std::collections::HashSet;

use chrono::Datelike;
use uuid::Uuid;

use crate::catalog::Backup;

/// Slot budgets for each GFS granularity. Zero disables a class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GfsSlots {
    /// One slot per distinct hour.
    pub hours: u32,
    /// One slot per distinct day.
    pub days: u32,
    /// One slot per distinct ISO-8601 week.
    pub weeks: u32,
    /// One slot per distinct month.
    pub months: u32,
    /// One slot per distinct year.
    pub years: u32,
}

impl GfsSlots {
    /// True when every class budget is zero.
    pub fn is_empty(&self) -> bool {
        self.hours == 0 && self.days == 0 && self.weeks == 0 && self.months == 0 && self.years == 0
    }
}

struct SlotClass {
    budget: u32,
    kept: u32,
    seen: HashSet<String>,
}

impl SlotClass {
    fn new(budget: u32) -> Self {
        Self {
            budget,
            kept: 0,
            seen: HashSet::new(),
        }
    }

    fn try_fill(&mut self, key: String) -> bool {
        if self.budget == 0 || self.kept >= self.budget || self.seen.contains(&key) {
            return false;
        }
        self.seen.insert(key);
        self.kept += 1;
        true
    }
}

/// Selects the backups retained under GFS rotation.
///
/// `backups` must be sorted newest-first. Each slot class keeps at most one
/// backup per distinct bucket key (the newest one), up to its budget. A
/// single backup can fill several classes at once: the newest backup of a
/// year also fills the monthly, weekly, daily, and hourly slot.
///
/// The week bucket uses ISO-8601 week-year semantics: a week belongs to the
/// year that contains its Thursday, so early-January backups can land in the
/// previous week-year.
pub fn build_gfs_keep_set(backups: &[Backup], slots: GfsSlots) -> HashSet<Uuid> {
    let mut keep = HashSet::new();

    let mut hours = SlotClass::new(slots.hours);
    let mut days = SlotClass::new(slots.days);
    let mut weeks = SlotClass::new(slots.weeks);
    let mut months = SlotClass::new(slots.months);
    let mut years = SlotClass::new(slots.years);

    for backup in backups {
        let t = backup.created_at;
        let iso = t.iso_week();

        if hours.try_fill(t.format("%Y-%m-%d-%H").to_string()) {
            keep.insert(backup.id);
        }
        if days.try_fill(t.format("%Y-%m-%d").to_string()) {
            keep.insert(backup.id);
        }
        if weeks.try_fill(format!("{}-W{:02}", iso.year(), iso.week())) {
            keep.insert(backup.id);
        }
        if months.try_fill(t.format("%Y-%m").to_string()) {
            keep.insert(backup.id);
        }
        if years.try_fill(t.format("%Y").to_string()) {
            keep.insert(backup.id);
        }
    }

    keep
}
