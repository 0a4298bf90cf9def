/// Rules configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct RulesConfig {
    /// Action points restored to every creature at the start of a round,
    /// in stored units (see [`RulesConfig::AP_SCALE`]).
    pub action_points_per_round: i32,

    /// Round counts above this value are displayed as an infinity glyph.
    pub indefinite_display_threshold: u32,

    /// How far a creature can see, in hexes, when validating targets.
    pub sight_radius: u32,

    /// Hex size in pixels used for screen/grid conversions.
    pub tile_size: f32,

    /// Faction name of player-controlled creatures.
    pub player_faction: String,
}

impl RulesConfig {
    // ===== compile-time constants =====
    /// Action points are stored at 100x display resolution.
    pub const AP_SCALE: i32 = 100;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_ACTION_POINTS_PER_ROUND: i32 = 10 * Self::AP_SCALE;
    pub const DEFAULT_INDEFINITE_DISPLAY_THRESHOLD: u32 = 9_999;
    pub const DEFAULT_SIGHT_RADIUS: u32 = 12;
    pub const DEFAULT_TILE_SIZE: f32 = 36.0;
    pub const DEFAULT_PLAYER_FACTION: &'static str = "Player";

    pub fn new() -> Self {
        Self {
            action_points_per_round: Self::DEFAULT_ACTION_POINTS_PER_ROUND,
            indefinite_display_threshold: Self::DEFAULT_INDEFINITE_DISPLAY_THRESHOLD,
            sight_radius: Self::DEFAULT_SIGHT_RADIUS,
            tile_size: Self::DEFAULT_TILE_SIZE,
            player_faction: Self::DEFAULT_PLAYER_FACTION.to_string(),
        }
    }

    /// Converts stored action points to the value shown to players.
    pub fn display_action_points(stored: i32) -> i32 {
        stored / Self::AP_SCALE
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self::new()
    }
}
