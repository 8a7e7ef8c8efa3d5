//! Versioned persistence records.
//!
//! Every stored value is written as `{"version": N, "data": ...}`. A value
//! without a `version` field predates versioning (version 0) and is converted
//! by the record's [`Versioned::from_legacy`] when it is loaded; the upgraded
//! form is written back straight away.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::calculator::round_half_up;
use crate::error::{Error, Result};
use crate::ledger::LedgerState;
use crate::models::{
    ActivityLevel, CalorieBudget, EntryId, LoggedMeal, MealSlot, ProfileRecord, Sex, UserProfile,
};
use crate::settings::{MealReminders, ThemeSettings};
use crate::store::{
    KeyValueStore, ADDED_MEALS_KEY, MEAL_SETTINGS_KEY, THEME_SETTINGS_KEY, USER_DETAILS_KEY,
};

pub const CURRENT_VERSION: u64 = 1;

/// A record stored under a fixed key.
pub trait Versioned: Serialize + DeserializeOwned {
    const KEY: &'static str;

    /// Convert the unversioned layout into the current one.
    fn from_legacy(value: Value) -> Result<Self>;
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: u64,
    data: &'a T,
}

#[derive(Deserialize)]
struct Envelope {
    version: u64,
    data: Value,
}

pub fn encode<T: Versioned>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(&EnvelopeRef {
        version: CURRENT_VERSION,
        data: value,
    })?)
}

/// Decode a stored value. The flag is `true` when a migration ran.
pub fn decode<T: Versioned>(raw: &str) -> Result<(T, bool)> {
    let value: Value = serde_json::from_str(raw)?;
    let versioned = value
        .as_object()
        .is_some_and(|obj| obj.get("version").is_some_and(Value::is_u64) && obj.contains_key("data"));
    if !versioned {
        return Ok((T::from_legacy(value)?, true));
    }

    let envelope: Envelope = serde_json::from_value(value)?;
    match envelope.version {
        CURRENT_VERSION => Ok((serde_json::from_value(envelope.data)?, false)),
        0 => Ok((T::from_legacy(envelope.data)?, true)),
        newer => Err(Error::Migration(format!(
            "{} is version {newer}, newest supported is {CURRENT_VERSION}",
            T::KEY
        ))),
    }
}

/// Read and decode `T`, upgrading the stored copy if it was migrated.
pub async fn load<T, S>(store: &S) -> Result<Option<T>>
where
    T: Versioned,
    S: KeyValueStore + ?Sized,
{
    let Some(raw) = store.get(T::KEY).await? else {
        return Ok(None);
    };
    let (value, migrated) = decode::<T>(&raw)?;
    if migrated {
        info!(key = T::KEY, version = CURRENT_VERSION, "migrated stored record");
        if let Err(e) = save(store, &value).await {
            warn!(key = T::KEY, error = %e, "could not write back migrated record");
        }
    }
    Ok(Some(value))
}

pub async fn save<T, S>(store: &S, value: &T) -> Result<()>
where
    T: Versioned,
    S: KeyValueStore + ?Sized,
{
    store.set(T::KEY, &encode(value)?).await
}

/// Numbers in the legacy blobs were often stored as form strings.
fn legacy_number(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .filter(|v| v.is_finite())
}

fn legacy_field<'a>(value: &'a Value, key: &str) -> Result<&'a Value> {
    value
        .get(key)
        .ok_or_else(|| Error::Migration(format!("legacy record missing `{key}`")))
}

impl Versioned for ProfileRecord {
    const KEY: &'static str = USER_DETAILS_KEY;

    /// `{age, gender, height, weight, activityLevel, totalCalories}` with
    /// numbers as strings or numbers. Numeric fields are truncated to integers.
    fn from_legacy(value: Value) -> Result<Self> {
        let number = |key: &str| -> Result<f64> {
            legacy_number(legacy_field(&value, key)?)
                .map(f64::trunc)
                .filter(|v| *v > 0.0)
                .ok_or_else(|| Error::Migration(format!("legacy `{key}` is not a positive number")))
        };

        let sex = value
            .get("gender")
            .and_then(Value::as_str)
            .map(Sex::from_key)
            .ok_or_else(|| Error::Migration("legacy record missing `gender`".to_string()))?;
        let activity_level: ActivityLevel = legacy_field(&value, "activityLevel")?
            .as_str()
            .unwrap_or_default()
            .parse()?;

        let profile = UserProfile {
            age: number("age")? as u32,
            sex,
            height_cm: number("height")?,
            weight_kg: number("weight")?,
            activity_level,
        };
        let budget = match value.get("totalCalories").and_then(legacy_number) {
            Some(total) => CalorieBudget {
                total_calories: round_half_up(total),
            },
            None => CalorieBudget::for_profile(&profile)?,
        };
        Ok(ProfileRecord { profile, budget })
    }
}

impl Versioned for LedgerState {
    const KEY: &'static str = ADDED_MEALS_KEY;

    /// `{ "<slot>": [{ name, nutrients: { calories } }] }`. Calories that are
    /// missing or not numeric (the old "N/A") become 0; unknown slots are
    /// dropped. Ids are assigned in slot order.
    fn from_legacy(value: Value) -> Result<Self> {
        let Value::Object(slots) = value else {
            return Err(Error::Migration("legacy meals are not an object".to_string()));
        };

        let mut by_slot: BTreeMap<MealSlot, Vec<Value>> = BTreeMap::new();
        for (key, meals) in slots {
            let Ok(slot) = key.parse::<MealSlot>() else {
                warn!(slot = %key, "dropping meals logged under unknown slot");
                continue;
            };
            let Value::Array(meals) = meals else {
                return Err(Error::Migration(format!("legacy `{key}` is not a list")));
            };
            by_slot.entry(slot).or_default().extend(meals);
        }

        let mut state = LedgerState::default();
        for (slot, meals) in by_slot {
            let mut logged = Vec::with_capacity(meals.len());
            for meal in meals {
                let name = meal
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let calories = meal
                    .get("nutrients")
                    .and_then(|n| n.get("calories"))
                    .and_then(legacy_number)
                    .filter(|c| *c > 0.0)
                    .unwrap_or(0.0);
                logged.push(LoggedMeal {
                    id: EntryId(state.next_id),
                    name,
                    calories,
                });
                state.next_id += 1;
            }
            state.meals.insert(slot, logged);
        }
        Ok(state.normalize())
    }
}

impl Versioned for ThemeSettings {
    const KEY: &'static str = THEME_SETTINGS_KEY;

    /// `{ darkMode }`
    fn from_legacy(value: Value) -> Result<Self> {
        Ok(ThemeSettings {
            dark_mode: value
                .get("darkMode")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }
}

impl Versioned for MealReminders {
    const KEY: &'static str = MEAL_SETTINGS_KEY;

    /// `{ mealReminderSwitch, mealReminders: { breakfast, lunch, dinner } }`
    /// with ISO-8601 timestamps; only the local wall-clock time is kept.
    fn from_legacy(value: Value) -> Result<Self> {
        let times = value.get("mealReminders");
        let time = |key: &str| -> Option<NaiveTime> {
            let raw = times?.get(key)?.as_str()?;
            match DateTime::parse_from_rfc3339(raw) {
                Ok(at) => Some(at.with_timezone(&Local).time()),
                Err(e) => {
                    warn!(slot = key, error = %e, "dropping unreadable reminder time");
                    None
                }
            }
        };

        Ok(MealReminders {
            enabled: value
                .get("mealReminderSwitch")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            breakfast: time("breakfast"),
            lunch: time("lunch"),
            dinner: time("dinner"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn legacy_profile_with_string_numbers() {
        let raw = json!({
            "age": "25",
            "gender": "male",
            "height": "180",
            "weight": "75.9",
            "activityLevel": "moderatelyActive",
            "totalCalories": 2759
        })
        .to_string();

        let (record, migrated) = decode::<ProfileRecord>(&raw).unwrap();
        assert!(migrated);
        assert_eq!(record.profile.age, 25);
        assert_eq!(record.profile.sex, Sex::Male);
        assert_eq!(record.profile.weight_kg, 75.0);
        assert_eq!(record.budget.total_calories, 2759);
    }

    #[test]
    fn legacy_profile_without_total_is_recomputed() {
        let raw = json!({
            "age": 25,
            "gender": "male",
            "height": 180,
            "weight": 75,
            "activityLevel": "moderatelyActive"
        })
        .to_string();

        let (record, _) = decode::<ProfileRecord>(&raw).unwrap();
        assert_eq!(record.budget.total_calories, 2813);
    }

    #[test]
    fn legacy_total_rounds_half_up() {
        let raw = json!({
            "age": 30, "gender": "female", "height": 165, "weight": 60,
            "activityLevel": "sedentary", "totalCalories": "-1659.5"
        })
        .to_string();
        let (record, _) = decode::<ProfileRecord>(&raw).unwrap();
        assert_eq!(record.budget.total_calories, -1659);

        let raw = json!({
            "age": 30, "gender": "female", "height": 165, "weight": 60,
            "activityLevel": "sedentary", "totalCalories": 1659.5
        })
        .to_string();
        let (record, _) = decode::<ProfileRecord>(&raw).unwrap();
        assert_eq!(record.budget.total_calories, 1660);
    }

    #[test]
    fn legacy_profile_with_bad_activity_fails() {
        let raw = json!({
            "age": 25, "gender": "female", "height": 160, "weight": 60,
            "activityLevel": "athlete"
        })
        .to_string();
        assert!(matches!(
            decode::<ProfileRecord>(&raw),
            Err(Error::UnknownActivityLevel(_))
        ));
    }

    #[test]
    fn legacy_meals_are_converted_with_ids() {
        let raw = json!({
            "Lunch": [{"name": "Salad", "nutrients": {"calories": 200}}],
            "Breakfast": [
                {"name": "Oatmeal", "nutrients": {"calories": "150"}},
                {"name": "Coffee", "nutrients": {"calories": "N/A"}}
            ],
            "Dinner": [],
            "Snack": [{"name": "Chips", "nutrients": {"calories": 300}}]
        })
        .to_string();

        let (state, migrated) = decode::<LedgerState>(&raw).unwrap();
        assert!(migrated);
        assert_eq!(state.meals.len(), 2);

        let breakfast = &state.meals[&MealSlot::Breakfast];
        assert_eq!(breakfast[0].id, EntryId(1));
        assert_eq!(breakfast[0].calories, 150.0);
        assert_eq!(breakfast[1].name, "Coffee");
        assert_eq!(breakfast[1].calories, 0.0);
        assert_eq!(state.meals[&MealSlot::Lunch][0].id, EntryId(3));
        assert_eq!(state.next_id, 4);
    }

    #[test]
    fn current_version_round_trips() {
        let settings = ThemeSettings { dark_mode: true };
        let raw = encode(&settings).unwrap();
        assert!(raw.contains("\"version\":1"));
        let (decoded, migrated) = decode::<ThemeSettings>(&raw).unwrap();
        assert_eq!(decoded, settings);
        assert!(!migrated);
    }

    #[test]
    fn newer_versions_are_refused() {
        let raw = json!({"version": 7, "data": {"dark_mode": true}}).to_string();
        assert!(matches!(
            decode::<ThemeSettings>(&raw),
            Err(Error::Migration(_))
        ));
    }

    #[test]
    fn legacy_reminders_keep_times() {
        let raw = json!({
            "mealReminderSwitch": true,
            "mealReminders": {
                "breakfast": "2024-03-01T07:30:00.000Z",
                "lunch": null,
                "dinner": "not a date"
            }
        })
        .to_string();

        let (reminders, _) = decode::<MealReminders>(&raw).unwrap();
        assert!(reminders.enabled);
        assert!(reminders.breakfast.is_some());
        assert_eq!(reminders.lunch, None);
        assert_eq!(reminders.dinner, None);
    }

    #[tokio::test]
    async fn load_writes_back_the_upgraded_record() {
        let store = MemoryStore::new();
        store
            .set(THEME_SETTINGS_KEY, r#"{"darkMode":true}"#)
            .await
            .unwrap();

        let loaded = load::<ThemeSettings, _>(&store).await.unwrap();
        assert_eq!(loaded, Some(ThemeSettings { dark_mode: true }));

        let stored = store.get(THEME_SETTINGS_KEY).await.unwrap().unwrap();
        let (_, migrated) = decode::<ThemeSettings>(&stored).unwrap();
        assert!(!migrated);
    }
}
