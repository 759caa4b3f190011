use serde::{Deserialize, Serialize};

use crate::core::config::ProgressionConfig;

/// Level and experience
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progression {
    pub level: u32,
    pub experience: f32,
    /// Set while level-up rewards are being handed out
    #[serde(skip)]
    pub leveling: bool,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            level: 1,
            experience: 0.0,
            leveling: false,
        }
    }
}

impl Progression {
    /// XP needed to advance from `level`
    pub fn xp_to_next(level: u32, config: &ProgressionConfig) -> f32 {
        config.xp_per_level_base * (level as f32).powf(config.growth_exponent)
    }

    /// Bank experience, returning how many levels were gained
    pub fn add_experience(&mut self, amount: f32, config: &ProgressionConfig) -> u32 {
        if amount <= 0.0 || self.level >= config.max_level {
            return 0;
        }

        self.experience += amount;
        let mut gained = 0;
        while self.level < config.max_level {
            let needed = Self::xp_to_next(self.level, config);
            if self.experience < needed {
                break;
            }
            self.experience -= needed;
            self.level += 1;
            gained += 1;
        }
        if self.level >= config.max_level {
            self.experience = 0.0;
        }
        gained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_level_needs_base_xp() {
        let config = ProgressionConfig::default();
        let mut prog = Progression::default();
        assert_eq!(prog.add_experience(99.0, &config), 0);
        assert_eq!(prog.add_experience(1.0, &config), 1);
        assert_eq!(prog.level, 2);
        assert!(prog.experience.abs() < 1e-3);
    }

    #[test]
    fn test_curve_grows() {
        let config = ProgressionConfig::default();
        assert!(Progression::xp_to_next(10, &config) > Progression::xp_to_next(9, &config));
        // 100 * 2^1.2
        assert!((Progression::xp_to_next(2, &config) - 229.7).abs() < 0.1);
    }

    #[test]
    fn test_level_cap() {
        let config = ProgressionConfig {
            max_level: 3,
            ..Default::default()
        };
        let mut prog = Progression::default();
        assert_eq!(prog.add_experience(1.0e6, &config), 2);
        assert_eq!(prog.level, 3);
        assert_eq!(prog.add_experience(500.0, &config), 0);
    }
}
