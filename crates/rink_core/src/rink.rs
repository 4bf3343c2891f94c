//! Rink geometry: ice lines, zones and faceoff dots.
//!
//! The long axis of the rink is `z`, with the Blue end at negative `z`.
//! Five boundary lines split the ice into six zones plus [`Zone::None`]
//! for positions that cannot be classified.
//!
//! # Hysteresis
//!
//! Each line is a band `[start, end]` rather than a single coordinate.
//! While an object is inside a band, [`classify`] keeps reporting the zone
//! it was in before, as long as that zone borders the band. Small jitter
//! across a line therefore never flips the zone back and forth.

use serde::{Deserialize, Serialize};

use crate::types::{Team, Vec3};

/// A boundary band along the long axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IceLine {
    /// Long-axis coordinate where the band begins (Blue side).
    pub start: f32,
    /// Long-axis coordinate where the band ends (Red side).
    pub end: f32,
}

impl IceLine {
    /// Create a new line band.
    #[must_use]
    pub const fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    /// Midpoint of the band.
    #[must_use]
    pub fn midpoint(self) -> f32 {
        (self.start + self.end) / 2.0
    }
}

/// Named ice lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IceLineName {
    /// Goal line at the Blue end.
    BlueGoalLine,
    /// Blue line at the Blue end.
    BlueBlueLine,
    /// Red line at center ice.
    CenterLine,
    /// Blue line at the Red end.
    RedBlueLine,
    /// Goal line at the Red end.
    RedGoalLine,
}

/// An ice region.
///
/// Variants are declared in long-axis order, so the derived `Ord` matches
/// the physical order from the Blue end to the Red end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Zone {
    /// Unclassifiable position.
    #[default]
    None,
    /// Behind Blue's goal line.
    BlueBehindGoalLine,
    /// Blue's defensive zone.
    BlueZone,
    /// Blue's half of the neutral zone.
    BlueCenter,
    /// Red's half of the neutral zone.
    RedCenter,
    /// Red's defensive zone.
    RedZone,
    /// Behind Red's goal line.
    RedBehindGoalLine,
}

impl Zone {
    /// The team whose half of the ice this zone is in.
    #[must_use]
    pub const fn owner(self) -> Team {
        match self {
            Self::BlueBehindGoalLine | Self::BlueZone | Self::BlueCenter => Team::Blue,
            Self::RedCenter | Self::RedZone | Self::RedBehindGoalLine => Team::Red,
            Self::None => Team::None,
        }
    }

    /// The area behind `team`'s goal line.
    #[must_use]
    pub const fn behind_goal_line(team: Team) -> Self {
        match team {
            Team::Blue => Self::BlueBehindGoalLine,
            Team::Red => Self::RedBehindGoalLine,
            Team::None => Self::None,
        }
    }

    /// `team`'s defensive zone.
    #[must_use]
    pub const fn defensive_zone(team: Team) -> Self {
        match team {
            Team::Blue => Self::BlueZone,
            Team::Red => Self::RedZone,
            Team::None => Self::None,
        }
    }

    /// `team`'s half of the neutral zone.
    #[must_use]
    pub const fn center(team: Team) -> Self {
        match team {
            Team::Blue => Self::BlueCenter,
            Team::Red => Self::RedCenter,
            Team::None => Self::None,
        }
    }

    /// Whether this zone is `team`'s defensive zone or behind its goal line.
    ///
    /// These are the two zones an opposing attacker can be offside in.
    #[must_use]
    pub fn is_defensive_end_of(self, team: Team) -> bool {
        team.is_playing()
            && (self == Self::defensive_zone(team) || self == Self::behind_goal_line(team))
    }

    /// Whether this zone is anywhere on `team`'s half, center included.
    #[must_use]
    pub fn is_half_of(self, team: Team) -> bool {
        team.is_playing() && self.owner() == team
    }

    /// Whether this zone is one of the two neutral-zone halves.
    #[must_use]
    pub const fn is_center(self) -> bool {
        matches!(self, Self::BlueCenter | Self::RedCenter)
    }
}

/// Boundary table for the five ice lines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineTable {
    /// Goal line at the Blue end.
    pub blue_goal_line: IceLine,
    /// Blue line at the Blue end.
    pub blue_blue_line: IceLine,
    /// Red line at center ice.
    pub center_line: IceLine,
    /// Blue line at the Red end.
    pub red_blue_line: IceLine,
    /// Goal line at the Red end.
    pub red_goal_line: IceLine,
}

impl Default for LineTable {
    fn default() -> Self {
        Self {
            blue_goal_line: IceLine::new(-40.2, -39.8),
            blue_blue_line: IceLine::new(-13.3, -12.7),
            center_line: IceLine::new(-0.3, 0.3),
            red_blue_line: IceLine::new(12.7, 13.3),
            red_goal_line: IceLine::new(39.8, 40.2),
        }
    }
}

impl LineTable {
    /// Look up a line by name.
    #[must_use]
    pub const fn line(&self, name: IceLineName) -> IceLine {
        match name {
            IceLineName::BlueGoalLine => self.blue_goal_line,
            IceLineName::BlueBlueLine => self.blue_blue_line,
            IceLineName::CenterLine => self.center_line,
            IceLineName::RedBlueLine => self.red_blue_line,
            IceLineName::RedGoalLine => self.red_goal_line,
        }
    }

    /// Lines in long-axis order with the zones on either side.
    #[must_use]
    pub const fn bands(&self) -> [(IceLine, Zone, Zone); 5] {
        [
            (
                self.blue_goal_line,
                Zone::BlueBehindGoalLine,
                Zone::BlueZone,
            ),
            (self.blue_blue_line, Zone::BlueZone, Zone::BlueCenter),
            (self.center_line, Zone::BlueCenter, Zone::RedCenter),
            (self.red_blue_line, Zone::RedCenter, Zone::RedZone),
            (self.red_goal_line, Zone::RedZone, Zone::RedBehindGoalLine),
        ]
    }

    /// Check that every band is well formed and that bands do not overlap.
    ///
    /// Returns the name of the first offending line.
    #[must_use]
    pub fn first_malformed(&self) -> Option<IceLineName> {
        const NAMES: [IceLineName; 5] = [
            IceLineName::BlueGoalLine,
            IceLineName::BlueBlueLine,
            IceLineName::CenterLine,
            IceLineName::RedBlueLine,
            IceLineName::RedGoalLine,
        ];

        let mut previous_end = f32::NEG_INFINITY;
        for name in NAMES {
            let line = self.line(name);
            if !line.start.is_finite() || !line.end.is_finite() {
                return Some(name);
            }
            if line.start > line.end || line.start <= previous_end {
                return Some(name);
            }
            previous_end = line.end;
        }
        None
    }
}

/// Classify a position into a zone.
///
/// `radius` extends the object along the long axis toward the Red end, so an
/// object reaches the next band as soon as its leading edge does. Inside a
/// band the previous zone wins if it borders that band; otherwise the
/// object's centre against the band midpoint decides the side.
///
/// This is a pure function: the same inputs always yield the same zone.
#[must_use]
pub fn classify(lines: &LineTable, position: Vec3, old_zone: Zone, radius: f32) -> Zone {
    if !position.is_finite() || !radius.is_finite() {
        return Zone::None;
    }

    let z_max = position.z + radius;
    for (line, near, far) in lines.bands() {
        if z_max < line.start {
            return near;
        }
        if z_max <= line.end {
            if old_zone == near || old_zone == far {
                return old_zone;
            }
            return if position.z < line.midpoint() {
                near
            } else {
                far
            };
        }
    }

    Zone::RedBehindGoalLine
}

/// Side of the rink across the cross axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RinkSide {
    /// Negative `x`.
    Left,
    /// Zero or positive `x`.
    Right,
}

impl RinkSide {
    /// Side of a cross-axis coordinate.
    #[must_use]
    pub fn of(x: f32) -> Self {
        if x < 0.0 {
            Self::Left
        } else {
            Self::Right
        }
    }
}

/// The nine faceoff dots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FaceoffSpot {
    /// Center ice.
    #[default]
    Center,
    /// Neutral-zone dot outside Blue's blue line, left side.
    BlueBluelineLeft,
    /// Neutral-zone dot outside Blue's blue line, right side.
    BlueBluelineRight,
    /// Blue's defensive-zone dot, left side.
    BlueDefensiveLeft,
    /// Blue's defensive-zone dot, right side.
    BlueDefensiveRight,
    /// Neutral-zone dot outside Red's blue line, left side.
    RedBluelineLeft,
    /// Neutral-zone dot outside Red's blue line, right side.
    RedBluelineRight,
    /// Red's defensive-zone dot, left side.
    RedDefensiveLeft,
    /// Red's defensive-zone dot, right side.
    RedDefensiveRight,
}

impl FaceoffSpot {
    /// `team`'s defensive-zone dot on `side`. Center for `Team::None`.
    #[must_use]
    pub const fn defensive(team: Team, side: RinkSide) -> Self {
        match (team, side) {
            (Team::Blue, RinkSide::Left) => Self::BlueDefensiveLeft,
            (Team::Blue, RinkSide::Right) => Self::BlueDefensiveRight,
            (Team::Red, RinkSide::Left) => Self::RedDefensiveLeft,
            (Team::Red, RinkSide::Right) => Self::RedDefensiveRight,
            (Team::None, _) => Self::Center,
        }
    }

    /// Neutral-zone dot outside `team`'s blue line on `side`.
    #[must_use]
    pub const fn blueline(team: Team, side: RinkSide) -> Self {
        match (team, side) {
            (Team::Blue, RinkSide::Left) => Self::BlueBluelineLeft,
            (Team::Blue, RinkSide::Right) => Self::BlueBluelineRight,
            (Team::Red, RinkSide::Left) => Self::RedBluelineLeft,
            (Team::Red, RinkSide::Right) => Self::RedBluelineRight,
            (Team::None, _) => Self::Center,
        }
    }
}

/// Coordinates of the faceoff dots. The layout is mirror-symmetric, so only
/// the magnitudes are stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceoffDots {
    /// Center ice dot.
    pub center: Vec3,
    /// Cross-axis offset of the defensive-zone dots.
    pub defensive_x: f32,
    /// Long-axis distance of the defensive-zone dots from center.
    pub defensive_z: f32,
    /// Cross-axis offset of the neutral-zone dots.
    pub blueline_x: f32,
    /// Long-axis distance of the neutral-zone dots from center.
    pub blueline_z: f32,
}

impl Default for FaceoffDots {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            defensive_x: 9.5,
            defensive_z: 31.5,
            blueline_x: 9.5,
            blueline_z: 10.5,
        }
    }
}

impl FaceoffDots {
    /// World position of a dot.
    #[must_use]
    pub fn position(&self, spot: FaceoffSpot) -> Vec3 {
        let (x, z) = match spot {
            FaceoffSpot::Center => return self.center,
            FaceoffSpot::BlueBluelineLeft => (-self.blueline_x, -self.blueline_z),
            FaceoffSpot::BlueBluelineRight => (self.blueline_x, -self.blueline_z),
            FaceoffSpot::BlueDefensiveLeft => (-self.defensive_x, -self.defensive_z),
            FaceoffSpot::BlueDefensiveRight => (self.defensive_x, -self.defensive_z),
            FaceoffSpot::RedBluelineLeft => (-self.blueline_x, self.blueline_z),
            FaceoffSpot::RedBluelineRight => (self.blueline_x, self.blueline_z),
            FaceoffSpot::RedDefensiveLeft => (-self.defensive_x, self.defensive_z),
            FaceoffSpot::RedDefensiveRight => (self.defensive_x, self.defensive_z),
        };
        Vec3::new(x, self.center.y, z)
    }
}

/// Complete rink geometry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RinkGeometry {
    /// Line bands.
    pub lines: LineTable,
    /// Faceoff dot coordinates.
    pub dots: FaceoffDots,
}
