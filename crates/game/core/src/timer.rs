use crate::config::RulesConfig;

/// Per-creature action point pool, stored at [`RulesConfig::AP_SCALE`] resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RoundTimer {
    ap: i32,
    per_round: i32,
}

impl RoundTimer {
    pub fn new(per_round: i32) -> Self {
        Self {
            ap: per_round,
            per_round,
        }
    }

    pub fn from_config(config: &RulesConfig) -> Self {
        Self::new(config.action_points_per_round)
    }

    pub fn ap(&self) -> i32 {
        self.ap
    }

    pub fn per_round(&self) -> i32 {
        self.per_round
    }

    pub fn set_ap(&mut self, ap: i32) {
        self.ap = ap;
    }

    pub fn can_perform(&self, cost: i32) -> bool {
        self.ap >= cost
    }

    /// Charges `cost`. Returns false, leaving the pool untouched, if it cannot be paid.
    pub fn perform(&mut self, cost: i32) -> bool {
        if !self.can_perform(cost) {
            return false;
        }
        self.ap -= cost;
        true
    }

    /// Refills the pool at the start of a round.
    pub fn reset(&mut self) {
        self.ap = self.per_round;
    }
}

impl Default for RoundTimer {
    fn default() -> Self {
        Self::new(RulesConfig::DEFAULT_ACTION_POINTS_PER_ROUND)
    }
}
