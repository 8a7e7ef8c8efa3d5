//! Turns raw onboarding form input into a [`UserProfile`].

use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, Result};
use crate::models::{ActivityLevel, Sex, UserProfile};

/// Values as typed into the onboarding form. `None` and blank strings both
/// count as missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileForm {
    pub age: Option<String>,
    pub sex: Option<String>,
    pub height_cm: Option<String>,
    pub weight_kg: Option<String>,
    pub activity_level: Option<String>,
}

impl ProfileForm {
    /// Validate the form.
    ///
    /// Checks run in order: missing numeric fields, non-numeric values,
    /// non-positive values, then the two selections. The first failing check
    /// is reported.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Profile`] for form problems and
    /// [`crate::Error::UnknownActivityLevel`] for an activity key outside the table.
    pub fn validate(&self) -> Result<UserProfile> {
        let age = filled(&self.age);
        let height = filled(&self.height_cm);
        let weight = filled(&self.weight_kg);

        let missing: Vec<&'static str> = [("age", age), ("height", height), ("weight", weight)]
            .into_iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name)
            .collect();
        let (Some(age), Some(height), Some(weight)) = (age, height, weight) else {
            return Err(ProfileError::MissingFields(missing).into());
        };

        let age: i64 = age.parse().map_err(|_| ProfileError::NonNumeric("age"))?;
        let height_cm = parse_number("height", height)?;
        let weight_kg = parse_number("weight", weight)?;

        if age <= 0 {
            return Err(ProfileError::NonPositive("age").into());
        }
        if height_cm <= 0.0 {
            return Err(ProfileError::NonPositive("height").into());
        }
        if weight_kg <= 0.0 {
            return Err(ProfileError::NonPositive("weight").into());
        }
        let age = u32::try_from(age).map_err(|_| ProfileError::NonNumeric("age"))?;

        let sex = filled(&self.sex)
            .map(Sex::from_key)
            .ok_or(ProfileError::SexNotSelected)?;
        let activity_level: ActivityLevel = filled(&self.activity_level)
            .ok_or(ProfileError::ActivityLevelNotSelected)?
            .parse()?;

        Ok(UserProfile {
            age,
            sex,
            height_cm,
            weight_kg,
            activity_level,
        })
    }
}

fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64, ProfileError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(ProfileError::NonNumeric(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn form(age: &str, sex: &str, height: &str, weight: &str, activity: &str) -> ProfileForm {
        let opt = |s: &str| Some(s.to_string());
        ProfileForm {
            age: opt(age),
            sex: opt(sex),
            height_cm: opt(height),
            weight_kg: opt(weight),
            activity_level: opt(activity),
        }
    }

    fn profile_error(form: ProfileForm) -> ProfileError {
        match form.validate() {
            Err(Error::Profile(err)) => err,
            other => panic!("expected profile error, got {other:?}"),
        }
    }

    #[test]
    fn complete_form_validates() {
        let profile = form("25", "male", "180", "75.5", "moderatelyActive")
            .validate()
            .unwrap();
        assert_eq!(profile.age, 25);
        assert_eq!(profile.sex, Sex::Male);
        assert_eq!(profile.height_cm, 180.0);
        assert_eq!(profile.weight_kg, 75.5);
        assert_eq!(profile.activity_level, ActivityLevel::ModeratelyActive);
    }

    #[test]
    fn missing_fields_are_listed() {
        let err = profile_error(form("", "male", " ", "70", "sedentary"));
        assert_eq!(err, ProfileError::MissingFields(vec!["age", "height"]));
        assert_eq!(err.to_string(), "Missing fields: age, height");
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        assert_eq!(
            profile_error(form("twenty", "male", "180", "75", "sedentary")),
            ProfileError::NonNumeric("age")
        );
        assert_eq!(
            profile_error(form("25.5", "male", "180", "75", "sedentary")),
            ProfileError::NonNumeric("age")
        );
        assert_eq!(
            profile_error(form("25", "male", "180", "heavy", "sedentary")),
            ProfileError::NonNumeric("weight")
        );
    }

    #[test]
    fn non_positive_values_are_rejected() {
        assert_eq!(
            profile_error(form("0", "male", "180", "75", "sedentary")),
            ProfileError::NonPositive("age")
        );
        assert_eq!(
            profile_error(form("25", "female", "-160", "60", "sedentary")),
            ProfileError::NonPositive("height")
        );
    }

    #[test]
    fn selections_are_required() {
        let mut no_sex = form("25", "", "180", "75", "sedentary");
        no_sex.sex = None;
        assert_eq!(profile_error(no_sex), ProfileError::SexNotSelected);
        assert_eq!(
            profile_error(form("25", "female", "180", "75", "")),
            ProfileError::ActivityLevelNotSelected
        );
    }

    #[test]
    fn unknown_activity_key_is_reported() {
        let err = form("25", "female", "165", "60", "athlete")
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::UnknownActivityLevel(_)));
    }
}
