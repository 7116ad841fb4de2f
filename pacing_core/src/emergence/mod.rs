//! Emergent-Moment Matcher - finds story beats that only exist when several
//! independent conditions line up, and keeps them from repeating too often.

mod condition;
mod recipe;

pub use condition::*;
pub use recipe::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use story_state::BoundedLog;
use tracing::{debug, info};

/// Tunables for the matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergenceConfig {
    /// Candidates below this priority are not offered.
    pub min_priority: u32,
    /// Turns after any trigger during which nothing else may fire.
    pub global_cooldown: u32,
    pub history_limit: usize,
}

impl Default for EmergenceConfig {
    fn default() -> Self {
        Self {
            min_priority: 20,
            global_cooldown: 3,
            history_limit: 20,
        }
    }
}

/// A recipe that matches the current conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentCandidate {
    pub moment: MomentType,
    pub description: String,
    pub priority: u32,
    pub conditions_met: usize,
    pub intensity: IntensityTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggeredMoment {
    pub moment: MomentType,
    pub turn: u64,
}

/// Matches the recipe library against the active condition set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergenceMatcher {
    conditions: ConditionSet,
    /// Remaining cooldown turns per recipe.
    cooldowns: BTreeMap<MomentType, u32>,
    global_cooldown: u32,
    history: BoundedLog<TriggeredMoment>,
    turn: u64,
    /// Persisted so custom recipes survive a restore. Blobs without it load the library.
    #[serde(default = "Recipe::library")]
    recipes: Vec<Recipe>,
    #[serde(skip)]
    config: EmergenceConfig,
}

impl Default for EmergenceMatcher {
    fn default() -> Self {
        Self::with_config(EmergenceConfig::default())
    }
}

impl EmergenceMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EmergenceConfig) -> Self {
        Self {
            conditions: ConditionSet::new(),
            cooldowns: BTreeMap::new(),
            global_cooldown: 0,
            history: BoundedLog::new(config.history_limit),
            turn: 0,
            recipes: Recipe::library(),
            config,
        }
    }

    pub fn set_config(&mut self, config: EmergenceConfig) {
        self.history.set_capacity(config.history_limit);
        self.config = config;
    }

    pub fn config(&self) -> &EmergenceConfig {
        &self.config
    }

    /// Add or replace a recipe.
    pub fn add_recipe(&mut self, recipe: Recipe) {
        self.recipes.retain(|r| r.moment != recipe.moment);
        self.recipes.push(recipe);
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn set_conditions(&mut self, conditions: ConditionSet) {
        self.conditions = conditions;
    }

    /// Set conditions from keys. Unknown keys are skipped.
    pub fn set_condition_keys<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) {
        let mut set = ConditionSet::new();
        for key in keys {
            match Condition::from_key(key) {
                Some(condition) => {
                    set.insert(condition);
                }
                None => debug!(key, "unknown condition, ignoring"),
            }
        }
        self.conditions = set;
    }

    pub fn conditions(&self) -> &ConditionSet {
        &self.conditions
    }

    pub fn cooldown_remaining(&self, moment: MomentType) -> u32 {
        self.cooldowns.get(&moment).copied().unwrap_or(0)
    }

    pub fn global_cooldown_remaining(&self) -> u32 {
        self.global_cooldown
    }

    pub fn history(&self) -> &BoundedLog<TriggeredMoment> {
        &self.history
    }

    /// Matching recipes, highest priority first.
    ///
    /// Empty while the global cooldown runs. Recipes on their own cooldown
    /// and candidates under the minimum priority are left out.
    pub fn check_for_moments(&self) -> Vec<MomentCandidate> {
        if self.global_cooldown > 0 {
            return Vec::new();
        }

        let mut candidates: Vec<MomentCandidate> = self
            .recipes
            .iter()
            .filter(|r| self.cooldown_remaining(r.moment) == 0)
            .filter_map(|r| {
                let met = r.evaluate(&self.conditions)?;
                Some(MomentCandidate {
                    moment: r.moment,
                    description: r.description.clone(),
                    priority: r.priority(met),
                    conditions_met: met,
                    intensity: r.intensity,
                })
            })
            .filter(|c| c.priority >= self.config.min_priority)
            .collect();

        candidates.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.moment.cmp(&b.moment)));
        candidates
    }

    /// Fire a moment, starting its cooldown and the global cooldown.
    ///
    /// Refused while either cooldown is running or the moment has no recipe.
    pub fn trigger(&mut self, moment: MomentType) -> bool {
        if self.global_cooldown > 0 || self.cooldown_remaining(moment) > 0 {
            debug!(moment = %moment, "moment on cooldown");
            return false;
        }
        let Some(cooldown) = self.recipes.iter().find(|r| r.moment == moment).map(|r| r.cooldown) else {
            return false;
        };

        if cooldown > 0 {
            self.cooldowns.insert(moment, cooldown);
        }
        self.global_cooldown = self.config.global_cooldown;
        self.history.push(TriggeredMoment {
            moment,
            turn: self.turn,
        });
        info!(moment = %moment, turn = self.turn, cooldown, "Emergent moment triggered");
        true
    }

    /// Trigger by key. Unknown keys are a no-op.
    pub fn trigger_key(&mut self, key: &str) -> bool {
        match MomentType::from_key(key) {
            Some(moment) => self.trigger(moment),
            None => {
                debug!(key, "unknown moment, ignoring");
                false
            }
        }
    }

    /// Count down every cooldown by one turn. Call once per turn.
    pub fn tick(&mut self) {
        self.turn += 1;
        self.global_cooldown = self.global_cooldown.saturating_sub(1);
        for remaining in self.cooldowns.values_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        self.cooldowns.retain(|_, remaining| *remaining > 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_meeting() -> ConditionSet {
        [Condition::FirstMeeting, Condition::NewLocation].into_iter().collect()
    }

    #[test]
    fn test_check_ranks_candidates() {
        let mut matcher = EmergenceMatcher::new();
        matcher.set_conditions(
            [
                Condition::CharactersAlone,
                Condition::RelationshipHigh,
                Condition::NightTime,
                Condition::TensionLow,
                Condition::FirstMeeting,
            ]
            .into_iter()
            .collect(),
        );

        let candidates = matcher.check_for_moments();
        let moments: Vec<MomentType> = candidates.iter().map(|c| c.moment).collect();
        // Confession 40 + 10 + 16, laughter 30 + 0 + 8, first impression 20 + 5 + 6.
        assert_eq!(
            moments,
            vec![MomentType::QuietConfession, MomentType::StolenLaughter, MomentType::FirstImpression]
        );
        assert_eq!(candidates[0].priority, 66);
        assert!(candidates.windows(2).all(|w| w[0].priority >= w[1].priority));
    }

    #[test]
    fn test_cooldown_excludes_triggered_moment() {
        let mut matcher = EmergenceMatcher::with_config(EmergenceConfig {
            global_cooldown: 0,
            ..EmergenceConfig::default()
        });
        matcher.set_conditions(first_meeting());
        assert!(matcher.trigger(MomentType::FirstImpression));
        assert_eq!(matcher.cooldown_remaining(MomentType::FirstImpression), 3);

        for _ in 0..2 {
            assert!(matcher
                .check_for_moments()
                .iter()
                .all(|c| c.moment != MomentType::FirstImpression));
            matcher.tick();
        }
        assert!(matcher.check_for_moments().iter().all(|c| c.moment != MomentType::FirstImpression));
        matcher.tick();
        assert_eq!(matcher.check_for_moments()[0].moment, MomentType::FirstImpression);
    }

    #[test]
    fn test_global_cooldown_blocks_everything() {
        let mut matcher = EmergenceMatcher::new();
        matcher.set_conditions(
            [Condition::FirstMeeting, Condition::TensionLow, Condition::CharactersAlone]
                .into_iter()
                .collect(),
        );
        assert!(matcher.trigger(MomentType::StolenLaughter));
        assert!(matcher.check_for_moments().is_empty());
        assert!(!matcher.trigger(MomentType::FirstImpression));

        for _ in 0..3 {
            matcher.tick();
        }
        assert_eq!(matcher.global_cooldown_remaining(), 0);
        assert!(matcher.trigger(MomentType::FirstImpression));
        assert_eq!(matcher.history().len(), 2);
    }

    #[test]
    fn test_min_priority_filter() {
        let mut matcher = EmergenceMatcher::with_config(EmergenceConfig {
            min_priority: 60,
            ..EmergenceConfig::default()
        });
        matcher.set_conditions(first_meeting());
        assert!(matcher.check_for_moments().is_empty());
    }

    #[test]
    fn test_unknown_keys_are_no_ops() {
        let mut matcher = EmergenceMatcher::new();
        matcher.set_condition_keys(["first-meeting", "blood-moon"]);
        assert_eq!(matcher.conditions().len(), 1);
        assert!(!matcher.trigger_key("dance-off"));
        assert!(matcher.trigger_key("first_impression"));
    }

    #[test]
    fn test_restore_brings_back_library() {
        let mut matcher = EmergenceMatcher::new();
        matcher.trigger(MomentType::FirstImpression);
        let json = serde_json::to_string(&matcher).unwrap();
        let restored: EmergenceMatcher = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.recipes().len(), 10);
        assert_eq!(restored.cooldown_remaining(MomentType::FirstImpression), 3);
    }

    #[test]
    fn test_custom_recipe_survives_restore() {
        let mut matcher = EmergenceMatcher::new();
        matcher.add_recipe(
            Recipe::new(MomentType::FirstImpression, "A stranger sizes the reader up")
                .requires(&[Condition::FirstMeeting])
                .cooldown(9),
        );
        let json = serde_json::to_string(&matcher).unwrap();
        let restored: EmergenceMatcher = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.recipes().len(), 10);
        let custom = restored
            .recipes()
            .iter()
            .find(|r| r.moment == MomentType::FirstImpression)
            .unwrap();
        assert_eq!(custom.description, "A stranger sizes the reader up");
        assert_eq!(custom.cooldown, 9);
    }

    #[test]
    fn test_blob_without_recipes_loads_library() {
        let mut value = serde_json::to_value(EmergenceMatcher::new()).unwrap();
        if let Some(fields) = value.as_object_mut() {
            fields.remove("recipes");
        }
        let restored: EmergenceMatcher = serde_json::from_value(value).unwrap();
        assert_eq!(restored.recipes(), Recipe::library().as_slice());
    }
}
