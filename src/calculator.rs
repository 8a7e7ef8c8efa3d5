//! Daily calorie budget from biometrics.
//!
//! BMR uses the revised Harris-Benedict equations; the budget is BMR times a
//! fixed activity factor. Neither function checks ranges: the onboarding form
//! does that before calling in.

use crate::error::{Error, Result};
use crate::models::{ActivityLevel, CalorieBudget, Sex, UserProfile};

/// Basal Metabolic Rate in kcal/day. Not rounded.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if height or weight is not finite.
pub fn compute_bmr(age: u32, sex: Sex, height_cm: f64, weight_kg: f64) -> Result<f64> {
    if !height_cm.is_finite() {
        return Err(Error::InvalidInput(format!("height is not finite: {height_cm}")));
    }
    if !weight_kg.is_finite() {
        return Err(Error::InvalidInput(format!("weight is not finite: {weight_kg}")));
    }

    let age = f64::from(age);
    let bmr = match sex {
        Sex::Male => 88.362 + 13.397 * weight_kg + 4.799 * height_cm - 5.677 * age,
        Sex::Female => 447.593 + 9.247 * weight_kg + 3.098 * height_cm - 4.330 * age,
    };
    Ok(bmr)
}

/// Daily calorie target for `bmr` at the activity level named by `activity_level`.
///
/// # Errors
///
/// Returns [`Error::UnknownActivityLevel`] for a key outside the factor table
/// and [`Error::InvalidInput`] for a non-finite `bmr`.
pub fn compute_total_calories(bmr: f64, activity_level: &str) -> Result<i64> {
    let level: ActivityLevel = activity_level.parse()?;
    total_for_level(bmr, level)
}

pub(crate) fn total_for_level(bmr: f64, level: ActivityLevel) -> Result<i64> {
    if !bmr.is_finite() {
        return Err(Error::InvalidInput(format!("bmr is not finite: {bmr}")));
    }
    Ok(round_half_up(bmr * level.factor()))
}

/// The one rounding rule used for calorie totals: halves go up.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

impl CalorieBudget {
    /// # Errors
    ///
    /// Fails if the profile holds non-finite measurements.
    pub fn for_profile(profile: &UserProfile) -> Result<Self> {
        let bmr = compute_bmr(
            profile.age,
            profile.sex,
            profile.height_cm,
            profile.weight_kg,
        )?;
        let total_calories = total_for_level(bmr, profile.activity_level)?;
        Ok(Self { total_calories })
    }
}
