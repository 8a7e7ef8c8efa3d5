//! The meal ledger: logged meals by slot and the calorie accounting on top.
//!
//! Every mutation is applied to a copy of the current state, the copy is
//! written to the store, and only then does it replace the in-memory state.
//! A failed write leaves the ledger exactly as it was.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::migrate;
use crate::models::{CalorieBudget, EntryId, FoodRecord, LoggedMeal, MealSlot};
use crate::store::{KeyValueStore, ADDED_MEALS_KEY};

/// Persisted form of the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    pub next_id: u64,
    pub meals: BTreeMap<MealSlot, Vec<LoggedMeal>>,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            next_id: 1,
            meals: BTreeMap::new(),
        }
    }
}

impl LedgerState {
    fn allocate_id(&mut self) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Drop empty slots and make sure `next_id` is past every stored id.
    pub(crate) fn normalize(mut self) -> Self {
        self.meals.retain(|_, meals| !meals.is_empty());
        let max_id = self
            .meals
            .values()
            .flatten()
            .map(|meal| meal.id.0)
            .max()
            .unwrap_or(0);
        self.next_id = self.next_id.max(max_id + 1);
        self
    }

    fn consumed(&self) -> f64 {
        self.meals.values().flatten().map(|meal| meal.calories).sum()
    }
}

/// Consumed and remaining calories against a budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub total_calories: i64,
    pub consumed_calories: f64,
    /// Never below zero.
    pub remaining_calories: f64,
}

/// Result of a successful paste.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PasteOutcome {
    pub target: MealSlot,
    pub pasted: usize,
    /// Calories the target slot held before it was overwritten.
    pub replaced_calories: f64,
}

#[derive(Debug, Clone)]
struct Clipboard {
    source: MealSlot,
    records: Vec<FoodRecord>,
}

/// Logged meals plus a copy/paste clipboard.
///
/// Copy takes an independent snapshot: pasting never touches the slot the
/// meals were copied from.
pub struct MealLedger<S> {
    store: Arc<S>,
    state: LedgerState,
    clipboard: Option<Clipboard>,
}

impl<S: KeyValueStore> MealLedger<S> {
    /// Load the ledger from `store`, migrating older layouts.
    pub async fn load(store: Arc<S>) -> Result<Self> {
        let state = migrate::load::<LedgerState, _>(store.as_ref())
            .await?
            .unwrap_or_default()
            .normalize();
        debug!(
            slots = state.meals.len(),
            consumed = state.consumed(),
            "loaded meal ledger"
        );
        Ok(Self {
            store,
            state,
            clipboard: None,
        })
    }

    pub fn meals(&self, slot: MealSlot) -> &[LoggedMeal] {
        self.state
            .meals
            .get(&slot)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Non-empty slots, Breakfast first.
    pub fn slots(&self) -> impl Iterator<Item = (MealSlot, &[LoggedMeal])> {
        self.state
            .meals
            .iter()
            .filter(|(_, meals)| !meals.is_empty())
            .map(|(slot, meals)| (*slot, meals.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.state.meals.values().all(Vec::is_empty)
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn slot_calories(&self, slot: MealSlot) -> f64 {
        self.meals(slot).iter().map(|meal| meal.calories).sum()
    }

    pub fn consumed_calories(&self) -> f64 {
        self.state.consumed()
    }

    /// `total - consumed`, clamped at zero.
    pub fn remaining_calories(&self, budget: CalorieBudget) -> f64 {
        (budget.total_calories as f64 - self.consumed_calories()).max(0.0)
    }

    pub fn summary(&self, budget: CalorieBudget) -> DailySummary {
        DailySummary {
            total_calories: budget.total_calories,
            consumed_calories: self.consumed_calories(),
            remaining_calories: self.remaining_calories(budget),
        }
    }

    /// Append `record` to `slot`. Negative and non-finite calories are
    /// logged as 0.
    pub async fn add_meal(&mut self, slot: MealSlot, record: FoodRecord) -> Result<EntryId> {
        let record = FoodRecord::new(record.name, record.calories);
        let mut draft = self.state.clone();
        let id = draft.allocate_id();
        draft.meals.entry(slot).or_default().push(LoggedMeal {
            id,
            name: record.name,
            calories: record.calories,
        });

        self.commit(draft).await?;
        info!(%slot, %id, consumed = self.consumed_calories(), "meal added");
        Ok(id)
    }

    /// Remove the first meal in `slot` named `name`. `None` when nothing matches.
    pub async fn remove_meal(&mut self, slot: MealSlot, name: &str) -> Result<Option<LoggedMeal>> {
        self.remove_where(slot, |meal| meal.name == name).await
    }

    /// Remove the meal with `id` from `slot`. `None` when it is not there.
    pub async fn remove_entry(&mut self, slot: MealSlot, id: EntryId) -> Result<Option<LoggedMeal>> {
        self.remove_where(slot, |meal| meal.id == id).await
    }

    async fn remove_where<F>(&mut self, slot: MealSlot, matches: F) -> Result<Option<LoggedMeal>>
    where
        F: Fn(&LoggedMeal) -> bool,
    {
        let Some(index) = self.meals(slot).iter().position(matches) else {
            debug!(%slot, "no matching meal to remove");
            return Ok(None);
        };

        let mut draft = self.state.clone();
        let meals = draft.meals.entry(slot).or_default();
        let removed = meals.remove(index);
        if meals.is_empty() {
            draft.meals.remove(&slot);
        }

        self.commit(draft).await?;
        info!(%slot, id = %removed.id, consumed = self.consumed_calories(), "meal removed");
        Ok(Some(removed))
    }

    /// Drop every meal in `slot`; returns the calories removed.
    pub async fn clear_slot(&mut self, slot: MealSlot) -> Result<f64> {
        let removed = self.slot_calories(slot);
        if !self.state.meals.contains_key(&slot) {
            return Ok(0.0);
        }

        let mut draft = self.state.clone();
        draft.meals.remove(&slot);
        self.commit(draft).await?;
        info!(%slot, removed, "slot cleared");
        Ok(removed)
    }

    /// Discard the whole ledger; returns the calories removed.
    pub async fn clear_all(&mut self) -> Result<f64> {
        let removed = self.consumed_calories();
        self.store.remove(ADDED_MEALS_KEY).await.inspect_err(|e| {
            warn!(error = %e, "failed to clear meal ledger");
        })?;
        self.state = LedgerState::default();
        info!(removed, "meal ledger cleared");
        Ok(removed)
    }

    /// Snapshot `slot` into the clipboard. `false` when there is nothing to copy.
    pub fn copy_slot(&mut self, slot: MealSlot) -> bool {
        let records: Vec<FoodRecord> = self.meals(slot).iter().map(LoggedMeal::record).collect();
        if records.is_empty() {
            debug!(%slot, "nothing to copy");
            return false;
        }
        debug!(%slot, count = records.len(), "slot copied");
        self.clipboard = Some(Clipboard {
            source: slot,
            records,
        });
        true
    }

    /// Slot the clipboard was filled from, if it holds anything.
    pub fn copied_from(&self) -> Option<MealSlot> {
        self.clipboard.as_ref().map(|clip| clip.source)
    }

    /// Replace `target` with the clipboard contents and empty the clipboard.
    /// `None` when the clipboard is empty.
    pub async fn paste_slot(&mut self, target: MealSlot) -> Result<Option<PasteOutcome>> {
        let Some(clipboard) = self.clipboard.as_ref() else {
            debug!(%target, "clipboard empty, nothing to paste");
            return Ok(None);
        };

        let replaced_calories = self.slot_calories(target);
        let mut draft = self.state.clone();
        let pasted: Vec<LoggedMeal> = clipboard
            .records
            .iter()
            .map(|record| LoggedMeal {
                id: draft.allocate_id(),
                name: record.name.clone(),
                calories: record.calories,
            })
            .collect();
        let count = pasted.len();
        draft.meals.insert(target, pasted);

        self.commit(draft).await?;
        self.clipboard = None;
        info!(%target, count, replaced_calories, "clipboard pasted");
        Ok(Some(PasteOutcome {
            target,
            pasted: count,
            replaced_calories,
        }))
    }

    async fn commit(&mut self, draft: LedgerState) -> Result<()> {
        migrate::save(self.store.as_ref(), &draft)
            .await
            .inspect_err(|e| warn!(error = %e, "meal ledger write failed"))?;
        self.state = draft;
        Ok(())
    }
}
