//! Growth dimensions, milestones and arc patterns.

use serde::{Deserialize, Serialize};

/// An axis along which a character can grow or regress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrowthDimension {
    Courage,
    Trust,
    SelfWorth,
    Vulnerability,
    Openness,
    Compassion,
    Independence,
    Honesty,
    Hope,
}

impl GrowthDimension {
    pub const ALL: [GrowthDimension; 9] = [
        GrowthDimension::Courage,
        GrowthDimension::Trust,
        GrowthDimension::SelfWorth,
        GrowthDimension::Vulnerability,
        GrowthDimension::Openness,
        GrowthDimension::Compassion,
        GrowthDimension::Independence,
        GrowthDimension::Honesty,
        GrowthDimension::Hope,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            GrowthDimension::Courage => "courage",
            GrowthDimension::Trust => "trust",
            GrowthDimension::SelfWorth => "self-worth",
            GrowthDimension::Vulnerability => "vulnerability",
            GrowthDimension::Openness => "openness",
            GrowthDimension::Compassion => "compassion",
            GrowthDimension::Independence => "independence",
            GrowthDimension::Honesty => "honesty",
            GrowthDimension::Hope => "hope",
        }
    }

    pub fn from_key(key: &str) -> Option<GrowthDimension> {
        let normalized = key.trim().to_lowercase().replace(['_', ' '], "-");
        GrowthDimension::ALL.into_iter().find(|d| d.key() == normalized)
    }
}

impl std::fmt::Display for GrowthDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Thresholds whose crossing marks a turning point for a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Milestone {
    FirstGrowth,
    Breakthrough,
    Transformation,
    CrisisPoint,
    RockBottom,
}

impl Milestone {
    pub const ALL: [Milestone; 5] = [
        Milestone::FirstGrowth,
        Milestone::Breakthrough,
        Milestone::Transformation,
        Milestone::CrisisPoint,
        Milestone::RockBottom,
    ];

    pub fn threshold(&self) -> f32 {
        match self {
            Milestone::FirstGrowth => 55.0,
            Milestone::Breakthrough => 75.0,
            Milestone::Transformation => 90.0,
            Milestone::CrisisPoint => 30.0,
            Milestone::RockBottom => 10.0,
        }
    }

    /// Whether the milestone is reached by rising through the threshold.
    pub fn is_rising(&self) -> bool {
        matches!(
            self,
            Milestone::FirstGrowth | Milestone::Breakthrough | Milestone::Transformation
        )
    }

    /// Whether moving from `previous` to `current` crosses the threshold
    /// in this milestone's direction.
    pub fn crossed(&self, previous: f32, current: f32) -> bool {
        let threshold = self.threshold();
        if self.is_rising() {
            previous < threshold && current >= threshold
        } else {
            previous > threshold && current <= threshold
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Milestone::FirstGrowth => "first-growth",
            Milestone::Breakthrough => "breakthrough",
            Milestone::Transformation => "transformation",
            Milestone::CrisisPoint => "crisis-point",
            Milestone::RockBottom => "rock-bottom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Trend {
    Rising,
    Falling,
}

/// A higher-level trajectory inferred from correlated dimension trends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArcPattern {
    Healing,
    Redemption,
    ComingOfAge,
    Corruption,
    Hardening,
    /// Two or more dimensions falling at once.
    Fall,
}

impl ArcPattern {
    pub const ALL: [ArcPattern; 6] = [
        ArcPattern::Healing,
        ArcPattern::Redemption,
        ArcPattern::ComingOfAge,
        ArcPattern::Corruption,
        ArcPattern::Hardening,
        ArcPattern::Fall,
    ];

    /// The co-occurring trends that make up the arc. Empty for `Fall`,
    /// which is detected by counting falling dimensions instead.
    pub fn signals(&self) -> &'static [(GrowthDimension, Trend)] {
        use GrowthDimension::*;
        match self {
            ArcPattern::Healing => &[
                (Trust, Trend::Rising),
                (Vulnerability, Trend::Rising),
                (Openness, Trend::Rising),
            ],
            ArcPattern::Redemption => &[
                (Honesty, Trend::Rising),
                (Compassion, Trend::Rising),
                (SelfWorth, Trend::Rising),
            ],
            ArcPattern::ComingOfAge => &[
                (Courage, Trend::Rising),
                (Independence, Trend::Rising),
                (SelfWorth, Trend::Rising),
            ],
            ArcPattern::Corruption => &[(Compassion, Trend::Falling), (Honesty, Trend::Falling)],
            ArcPattern::Hardening => &[
                (Trust, Trend::Falling),
                (Vulnerability, Trend::Falling),
                (Openness, Trend::Falling),
            ],
            ArcPattern::Fall => &[],
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            ArcPattern::Healing => "healing",
            ArcPattern::Redemption => "redemption",
            ArcPattern::ComingOfAge => "coming-of-age",
            ArcPattern::Corruption => "corruption",
            ArcPattern::Hardening => "hardening",
            ArcPattern::Fall => "fall",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_milestone_crossing_direction() {
        assert!(Milestone::FirstGrowth.crossed(50.0, 56.0));
        assert!(!Milestone::FirstGrowth.crossed(56.0, 50.0));
        assert!(Milestone::CrisisPoint.crossed(35.0, 30.0));
        assert!(!Milestone::CrisisPoint.crossed(25.0, 35.0));
    }

    #[test]
    fn test_dimension_keys() {
        assert_eq!(GrowthDimension::from_key("self_worth"), Some(GrowthDimension::SelfWorth));
        assert_eq!(GrowthDimension::from_key("charisma"), None);
    }

    #[test]
    fn test_arc_signals() {
        assert_eq!(ArcPattern::Healing.signals().len(), 3);
        assert!(ArcPattern::Fall.signals().is_empty());
    }
}
