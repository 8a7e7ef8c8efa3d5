//! Application state: everything a session owns, loaded once and persisted
//! on every change.

use std::sync::Arc;

use chrono::NaiveTime;
use tracing::{info, warn};

use crate::client::FoodSource;
use crate::error::Result;
use crate::ledger::{DailySummary, MealLedger};
use crate::migrate;
use crate::models::{
    CalorieBudget, EntryId, FoodDetails, FoodSummary, MealSlot, ProfileRecord, UserProfile,
};
use crate::onboarding::ProfileForm;
use crate::settings::{MealReminders, ThemeSettings};
use crate::store::{KeyValueStore, USER_DETAILS_KEY};

pub struct AppState<S, F> {
    store: Arc<S>,
    foods: F,
    profile: Option<ProfileRecord>,
    ledger: MealLedger<S>,
    theme: ThemeSettings,
    reminders: MealReminders,
}

impl<S: KeyValueStore, F: FoodSource> AppState<S, F> {
    /// Load every persisted record from `store`.
    pub async fn init(store: Arc<S>, foods: F) -> Result<Self> {
        let profile = migrate::load::<ProfileRecord, _>(store.as_ref()).await?;
        let ledger = MealLedger::load(Arc::clone(&store)).await?;
        let theme = migrate::load::<ThemeSettings, _>(store.as_ref())
            .await?
            .unwrap_or_default();
        let reminders = migrate::load::<MealReminders, _>(store.as_ref())
            .await?
            .unwrap_or_default();

        info!(
            onboarded = profile.is_some(),
            consumed = ledger.consumed_calories(),
            "app state loaded"
        );
        Ok(Self {
            store,
            foods,
            profile,
            ledger,
            theme,
            reminders,
        })
    }

    pub fn is_onboarded(&self) -> bool {
        self.profile.is_some()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref().map(|record| &record.profile)
    }

    pub fn budget(&self) -> Option<CalorieBudget> {
        self.profile.as_ref().map(|record| record.budget)
    }

    /// Validate the form, compute the budget and persist both.
    pub async fn onboard(&mut self, form: &ProfileForm) -> Result<CalorieBudget> {
        let profile = form.validate()?;
        let budget = CalorieBudget::for_profile(&profile)?;
        let record = ProfileRecord { profile, budget };

        migrate::save(self.store.as_ref(), &record).await?;
        info!(total_calories = budget.total_calories, "onboarding complete");
        self.profile = Some(record);
        Ok(budget)
    }

    /// Forget the profile; logged meals are kept.
    pub async fn reset_profile(&mut self) -> Result<()> {
        self.store.remove(USER_DETAILS_KEY).await?;
        self.profile = None;
        info!("profile reset");
        Ok(())
    }

    pub fn ledger(&self) -> &MealLedger<S> {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut MealLedger<S> {
        &mut self.ledger
    }

    /// `None` until onboarding has produced a budget.
    pub fn summary(&self) -> Option<DailySummary> {
        self.budget().map(|budget| self.ledger.summary(budget))
    }

    /// Search the food database. Lookup failures come back as no results.
    pub async fn search_foods(&self, query: &str) -> Vec<FoodSummary> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        match self.foods.search(query).await {
            Ok(results) => results,
            Err(e) => {
                warn!(query, error = %e, "food search failed");
                Vec::new()
            }
        }
    }

    /// Full record for one food, `None` if the lookup fails.
    pub async fn food_details(&self, fdc_id: u64) -> Option<FoodDetails> {
        match self.foods.fetch_details(fdc_id).await {
            Ok(details) => Some(details),
            Err(e) => {
                warn!(fdc_id, error = %e, "food details lookup failed");
                None
            }
        }
    }

    /// Look up `fdc_id` and log it against `slot`. `Ok(None)` when the lookup
    /// fails; storage failures are returned.
    pub async fn log_food(&mut self, slot: MealSlot, fdc_id: u64) -> Result<Option<EntryId>> {
        let Some(details) = self.food_details(fdc_id).await else {
            return Ok(None);
        };
        let id = self.ledger.add_meal(slot, details.to_record()).await?;
        Ok(Some(id))
    }

    pub fn theme(&self) -> ThemeSettings {
        self.theme
    }

    /// Flip dark mode; returns the new setting.
    pub async fn toggle_dark_mode(&mut self) -> Result<bool> {
        let next = ThemeSettings {
            dark_mode: !self.theme.dark_mode,
        };
        migrate::save(self.store.as_ref(), &next).await?;
        self.theme = next;
        Ok(next.dark_mode)
    }

    pub fn reminders(&self) -> MealReminders {
        self.reminders
    }

    pub async fn set_reminder(&mut self, slot: MealSlot, time: Option<NaiveTime>) -> Result<()> {
        let mut next = self.reminders;
        next.set_time(slot, time);
        self.save_reminders(next).await
    }

    pub async fn set_reminders_enabled(&mut self, enabled: bool) -> Result<()> {
        let next = MealReminders {
            enabled,
            ..self.reminders
        };
        self.save_reminders(next).await
    }

    async fn save_reminders(&mut self, next: MealReminders) -> Result<()> {
        migrate::save(self.store.as_ref(), &next).await?;
        self.reminders = next;
        Ok(())
    }
}
