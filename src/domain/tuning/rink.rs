/// Gameplay tuning for the rink, stones and shots.
///
/// Keep this separate from runtime/server configuration (tick rates, buffer sizes, etc.).
/// Distances are canvas pixels and velocities are pixels per tick.
#[derive(Debug, Clone, Copy)]
pub struct RinkTuning {
    /// Side length of the square playing surface.
    pub rink_size: f32,

    /// Stone disc radius.
    pub stone_radius: f32,

    /// Center of the scoring house.
    pub house_x: f32,
    pub house_y: f32,

    /// Stones at or within this distance of the house center score.
    pub house_radius: f32,

    /// Per-tick velocity multiplier.
    pub friction: f32,

    /// Stones slower than this come to rest.
    pub min_speed: f32,

    /// Fraction of velocity kept on wall and stone impacts.
    pub restitution: f32,

    /// Where every new stone is placed.
    pub launch_x: f32,
    pub launch_y: f32,

    /// Scale from the drag vector to launch velocity.
    pub power_factor: f32,

    /// Stones each team may throw in a match.
    pub stones_per_team: u32,
}

impl RinkTuning {
    pub fn stone_diameter(&self) -> f32 {
        self.stone_radius * 2.0
    }
}

impl Default for RinkTuning {
    fn default() -> Self {
        Self {
            rink_size: 600.0,
            stone_radius: 15.0,
            house_x: 300.0,
            house_y: 300.0,
            house_radius: 100.0,
            friction: 0.985,
            min_speed: 0.1,
            restitution: 0.8,
            launch_x: 300.0,
            launch_y: 550.0,
            power_factor: 0.2,
            stones_per_team: 4,
        }
    }
}
