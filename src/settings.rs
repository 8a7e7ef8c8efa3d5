use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::models::MealSlot;

/// Display theme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeSettings {
    pub dark_mode: bool,
}

/// Per-slot reminder times. Delivering the notifications is left to the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealReminders {
    pub enabled: bool,
    pub breakfast: Option<NaiveTime>,
    pub lunch: Option<NaiveTime>,
    pub dinner: Option<NaiveTime>,
}

impl MealReminders {
    pub fn time_for(&self, slot: MealSlot) -> Option<NaiveTime> {
        match slot {
            MealSlot::Breakfast => self.breakfast,
            MealSlot::Lunch => self.lunch,
            MealSlot::Dinner => self.dinner,
        }
    }

    pub fn set_time(&mut self, slot: MealSlot, time: Option<NaiveTime>) {
        match slot {
            MealSlot::Breakfast => self.breakfast = time,
            MealSlot::Lunch => self.lunch = time,
            MealSlot::Dinner => self.dinner = time,
        }
    }

    /// Slots with a time set, in slot order. Empty while reminders are off.
    pub fn scheduled(&self) -> Vec<(MealSlot, NaiveTime)> {
        if !self.enabled {
            return Vec::new();
        }
        MealSlot::ALL
            .into_iter()
            .filter_map(|slot| self.time_for(slot).map(|time| (slot, time)))
            .collect()
    }
}
