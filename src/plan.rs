//! Weekly workout plan: weekday → category → ordered exercises, plus the
//! exercise → asset table.
//!
//! Plans are TOML files (see `plans/default.toml`). Everything is validated
//! once at load time so lookups never fail afterwards.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::models::ExerciseDefinition;
use crate::types::canonical_weekday;

const BUILTIN_PLAN: &str = include_str!("../plans/default.toml");

#[derive(Debug, Deserialize)]
struct PlanToml {
    #[serde(default)]
    days: BTreeMap<String, String>,
    #[serde(default)]
    category: Vec<CategoryToml>,
    #[serde(default)]
    assets: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct CategoryToml {
    name: String,
    exercises: Vec<ExerciseDefinition>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub name: String,
    pub exercises: Vec<ExerciseDefinition>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutPlan {
    days: BTreeMap<String, String>,
    categories: Vec<Category>,
    assets: HashMap<String, String>,
    default_asset: String,
}

impl WorkoutPlan {
    /// The plan compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_PLAN).context("built-in plan is invalid")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let toml_str = std::fs::read_to_string(path)
            .with_context(|| format!("reading plan `{}`", path.display()))?;
        Self::from_toml_str(&toml_str).with_context(|| format!("loading plan `{}`", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let raw: PlanToml = toml::from_str(s).context("parsing plan TOML")?;
        Ok(Self::validate(raw)?)
    }

    fn validate(raw: PlanToml) -> Result<Self, PlanError> {
        let mut names = HashSet::new();
        let mut category_names = HashSet::new();
        for c in &raw.category {
            if c.name.trim().is_empty() {
                return Err(PlanError::EmptyCategory);
            }
            if !category_names.insert(c.name.as_str()) {
                return Err(PlanError::DuplicateCategory(c.name.clone()));
            }
            for e in &c.exercises {
                if e.sets == 0 {
                    return Err(PlanError::ZeroSets(e.name.clone()));
                }
                names.insert(e.name.as_str());
            }
        }

        let mut days = BTreeMap::new();
        for (day, category) in &raw.days {
            let key = canonical_weekday(day).ok_or_else(|| PlanError::UnknownWeekday(day.clone()))?;
            if !raw.category.iter().any(|c| &c.name == category) {
                return Err(PlanError::UnknownCategory {
                    day: day.clone(),
                    category: category.clone(),
                });
            }
            if days.insert(key.to_string(), category.clone()).is_some() {
                return Err(PlanError::DuplicateWeekday(key.to_string()));
            }
        }

        let mut assets = raw.assets;
        let default_asset = assets.remove("default").ok_or(PlanError::MissingDefaultAsset)?;
        if let Some(unknown) = assets.keys().find(|k| !names.contains(k.as_str())) {
            return Err(PlanError::UnknownAssetExercise(unknown.clone()));
        }

        let categories = raw
            .category
            .into_iter()
            .map(|c| Category {
                name: c.name,
                exercises: c.exercises,
            })
            .collect();

        Ok(Self {
            days,
            categories,
            assets,
            default_asset,
        })
    }

    /// Category scheduled on `day`, or `None` on a rest day.
    pub fn category_for(&self, day: &str) -> Option<&str> {
        let key = canonical_weekday(day)?;
        self.days.get(key).map(String::as_str)
    }

    pub fn exercises_for(&self, category: &str) -> &[ExerciseDefinition] {
        self.categories
            .iter()
            .find(|c| c.name == category)
            .map(|c| c.exercises.as_slice())
            .unwrap_or(&[])
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Weekday keys with their categories, Monday first.
    pub fn schedule(&self) -> Vec<(&'static str, Option<&str>)> {
        use chrono::Weekday::*;
        [Mon, Tue, Wed, Thu, Fri, Sat, Sun]
            .into_iter()
            .map(|d| {
                let key = crate::types::weekday_key(d);
                (key, self.days.get(key).map(String::as_str))
            })
            .collect()
    }

    /// Case-insensitive lookup across every category.
    pub fn find_exercise(&self, name: &str) -> Option<&ExerciseDefinition> {
        self.categories
            .iter()
            .flat_map(|c| c.exercises.iter())
            .find(|e| e.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn exercise_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.categories
            .iter()
            .flat_map(|c| c.exercises.iter())
            .map(|e| e.name.as_str())
            .filter(|n| seen.insert(*n))
            .collect()
    }

    /// Asset reference for `exercise`, falling back to the `default` entry.
    pub fn asset_for(&self, exercise: &str) -> &str {
        self.assets
            .get(exercise)
            .map(String::as_str)
            .unwrap_or(&self.default_asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEKDAY_PLAN: &str = r#"
        [days]
        Monday = "Chest"
        tuesday = "Back"

        [[category]]
        name = "Chest"
        exercises = [
            { name = "Push-ups", sets = 4, reps = 12, bodyweight = true },
            { name = "Bench press", sets = 4, reps = 10 },
        ]

        [[category]]
        name = "Back"
        exercises = [{ name = "Row", sets = 3, reps = 12 }]

        [assets]
        default = "placeholder.png"
        "Push-ups" = "push-ups.png"
    "#;

    fn plan_error(s: &str) -> PlanError {
        let err = WorkoutPlan::from_toml_str(s).unwrap_err();
        err.downcast::<PlanError>().expect("expected a PlanError")
    }

    #[test]
    fn test_builtin_plan_is_valid() {
        let plan = WorkoutPlan::builtin().unwrap();
        assert_eq!(plan.category_for("monday"), Some("Chest & Triceps"));
        assert_eq!(plan.exercises_for("Chest & Triceps").len(), 6);
        assert_eq!(plan.category_for("sunday"), None);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let plan = WorkoutPlan::from_toml_str(WEEKDAY_PLAN).unwrap();
        assert_eq!(plan.category_for("MONDAY"), Some("Chest"));
        assert_eq!(plan.category_for("Tuesday"), Some("Back"));
        assert_eq!(plan.category_for("saturday"), None);
        assert_eq!(plan.category_for("not a day"), None);
        assert!(plan.find_exercise("bench PRESS").is_some());
    }

    #[test]
    fn test_asset_fallback() {
        let plan = WorkoutPlan::from_toml_str(WEEKDAY_PLAN).unwrap();
        assert_eq!(plan.asset_for("Push-ups"), "push-ups.png");
        assert_eq!(plan.asset_for("Bench press"), "placeholder.png");
    }

    #[test]
    fn test_schedule_covers_the_week() {
        let plan = WorkoutPlan::from_toml_str(WEEKDAY_PLAN).unwrap();
        let schedule = plan.schedule();
        assert_eq!(schedule.len(), 7);
        assert_eq!(schedule[0], ("monday", Some("Chest")));
        assert_eq!(schedule[6], ("sunday", None));
    }

    #[test]
    fn test_rejects_dangling_category() {
        let err = plan_error(
            r#"
            [days]
            monday = "Arms"
            [[category]]
            name = "Chest"
            exercises = []
            [assets]
            default = "x.png"
        "#,
        );
        assert_eq!(
            err,
            PlanError::UnknownCategory {
                day: "monday".to_string(),
                category: "Arms".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_unknown_asset_and_missing_default() {
        let err = plan_error(
            r#"
            [[category]]
            name = "Chest"
            exercises = [{ name = "Push-ups", sets = 4, reps = 12 }]
            [assets]
            default = "x.png"
            "Pushups" = "p.png"
        "#,
        );
        assert_eq!(err, PlanError::UnknownAssetExercise("Pushups".to_string()));

        let err = plan_error(
            r#"
            [[category]]
            name = "Chest"
            exercises = [{ name = "Push-ups", sets = 4, reps = 12 }]
        "#,
        );
        assert_eq!(err, PlanError::MissingDefaultAsset);
    }

    #[test]
    fn test_rejects_duplicate_category_and_weekday() {
        let err = plan_error(
            r#"
            [[category]]
            name = "Chest"
            exercises = [{ name = "Push-ups", sets = 4, reps = 12 }]
            [[category]]
            name = "Chest"
            exercises = [{ name = "Bench press", sets = 4, reps = 10 }]
            [assets]
            default = "x.png"
        "#,
        );
        assert_eq!(err, PlanError::DuplicateCategory("Chest".to_string()));

        let err = plan_error(
            r#"
            [days]
            Monday = "Chest"
            monday = "Back"
            [[category]]
            name = "Chest"
            exercises = []
            [[category]]
            name = "Back"
            exercises = []
            [assets]
            default = "x.png"
        "#,
        );
        assert_eq!(err, PlanError::DuplicateWeekday("monday".to_string()));
    }

    #[test]
    fn test_rejects_bad_weekday_and_zero_sets() {
        let err = plan_error(
            r#"
            [days]
            caturday = "Chest"
            [[category]]
            name = "Chest"
            exercises = []
            [assets]
            default = "x.png"
        "#,
        );
        assert_eq!(err, PlanError::UnknownWeekday("caturday".to_string()));

        let err = plan_error(
            r#"
            [[category]]
            name = "Chest"
            exercises = [{ name = "Push-ups", sets = 0, reps = 12 }]
            [assets]
            default = "x.png"
        "#,
        );
        assert_eq!(err, PlanError::ZeroSets("Push-ups".to_string()));
    }
}
