use super::Ability;

/// Extra data carried by spell abilities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpellData {
    pub level: u32,
    /// Target spell resistance shortens effects of this spell.
    pub spell_resistance_applies: bool,
}

impl SpellData {
    /// Duration of an effect of this spell once attached to a target with
    /// `spell_resistance` percent resistance.
    ///
    /// Permanent effects stay permanent and a timed effect never drops below
    /// one round.
    pub fn resisted_duration(&self, duration: u32, spell_resistance: i32) -> u32 {
        if duration == 0 || !self.spell_resistance_applies {
            return duration;
        }

        let resistance = u64::from(spell_resistance.clamp(0, 100).unsigned_abs());
        let shortened = u64::from(duration) * (100 - resistance) / 100;
        // Never exceeds `duration`, so it fits back into u32.
        u32::try_from(shortened).unwrap_or(duration).max(1)
    }
}

impl Ability {
    /// Feedback line shown when this ability is used.
    pub fn activation_message(&self, user: &str) -> String {
        if self.is_spell() {
            format!("{user} casts {}.", self.name)
        } else {
            format!("{user} uses {}.", self.name)
        }
    }

    /// Adjusts an effect's duration for its target; only spells are affected.
    pub fn spell_duration(&self, duration: u32, spell_resistance: i32) -> u32 {
        match &self.spell {
            Some(spell) => spell.resisted_duration(duration, spell_resistance),
            None => duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::tests::ability;

    fn spell(applies: bool) -> SpellData {
        SpellData {
            level: 2,
            spell_resistance_applies: applies,
        }
    }

    #[test]
    fn resistance_shortens_with_floor_of_one() {
        assert_eq!(spell(true).resisted_duration(10, 50), 5);
        assert_eq!(spell(true).resisted_duration(3, 90), 1);
        assert_eq!(spell(true).resisted_duration(3, 100), 1);
    }

    #[test]
    fn very_long_durations_do_not_overflow() {
        assert_eq!(spell(true).resisted_duration(50_000_000, 10), 45_000_000);
        assert_eq!(spell(true).resisted_duration(u32::MAX, 0), u32::MAX);
        assert_eq!(spell(true).resisted_duration(u32::MAX, 50), u32::MAX / 2);
    }

    #[test]
    fn permanent_and_unresisted_durations_are_untouched() {
        assert_eq!(spell(true).resisted_duration(0, 50), 0);
        assert_eq!(spell(false).resisted_duration(10, 50), 10);
    }

    #[test]
    fn spells_have_their_own_message() {
        let mut bolt = ability("Bolt");
        assert_eq!(bolt.activation_message("Ayla"), "Ayla uses Bolt.");
        assert_eq!(bolt.spell_duration(10, 50), 10);

        bolt.spell = Some(spell(true));
        assert_eq!(bolt.activation_message("Ayla"), "Ayla casts Bolt.");
        assert_eq!(bolt.spell_duration(10, 50), 5);
    }
}
