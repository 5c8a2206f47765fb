//! Unit stat blocks, kinds, lifecycle states and turn phases.

use serde::{Deserialize, Serialize};

/// Base stats carried by every unit.
///
/// Only hit points, `movement` and `jump` are consumed by this engine; the
/// remaining figures are stored for combat logic that lives elsewhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatBlock {
    /// Experience level.
    pub level: u32,
    /// Accumulated experience points.
    pub exp: u32,
    /// Current hit points.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Physical attack power.
    pub patk: u32,
    /// Magical attack power.
    pub matk: u32,
    /// Physical defense.
    pub def: u32,
    /// Magical defense.
    pub res: u32,
    /// Agility.
    pub agi: u32,
    /// Critical chance for physical attacks.
    pub skill: u32,
    /// Resistance to status effects and critical hits.
    pub luck: u32,
    /// Critical chance for magical attacks.
    pub wis: u32,
    /// Maximum number of cell-to-cell steps per move.
    pub movement: u32,
    /// Upward height budget per move and ceiling on total height change.
    pub jump: u32,
}

/// Closed set of unit archetypes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Melee front-liner.
    Warrior,
    /// Ranged physical attacker.
    Archer,
    /// Ranged magical attacker.
    Mage,
    /// Support caster.
    Healer,
    /// Mobile skirmisher.
    Rogue,
}

impl UnitKind {
    /// Every unit kind in declaration order.
    pub const ALL: [UnitKind; 5] = [
        Self::Warrior,
        Self::Archer,
        Self::Mage,
        Self::Healer,
        Self::Rogue,
    ];

    /// Level-one stat block for the kind.
    #[must_use]
    pub const fn base_stats(self) -> StatBlock {
        match self {
            Self::Warrior => WARRIOR_STATS,
            Self::Archer => ARCHER_STATS,
            Self::Mage => MAGE_STATS,
            Self::Healer => HEALER_STATS,
            Self::Rogue => ROGUE_STATS,
        }
    }

    /// Lower-case label used in catalogs and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Warrior => "warrior",
            Self::Archer => "archer",
            Self::Mage => "mage",
            Self::Healer => "healer",
            Self::Rogue => "rogue",
        }
    }
}

const WARRIOR_STATS: StatBlock = StatBlock {
    level: 1,
    exp: 0,
    hp: 120,
    max_hp: 120,
    patk: 14,
    matk: 2,
    def: 12,
    res: 4,
    agi: 6,
    skill: 5,
    luck: 4,
    wis: 2,
    movement: 4,
    jump: 1,
};

const ARCHER_STATS: StatBlock = StatBlock {
    level: 1,
    exp: 0,
    hp: 90,
    max_hp: 90,
    patk: 12,
    matk: 3,
    def: 6,
    res: 5,
    agi: 9,
    skill: 10,
    luck: 6,
    wis: 3,
    movement: 5,
    jump: 2,
};

const MAGE_STATS: StatBlock = StatBlock {
    level: 1,
    exp: 0,
    hp: 75,
    max_hp: 75,
    patk: 3,
    matk: 15,
    def: 4,
    res: 11,
    agi: 6,
    skill: 4,
    luck: 5,
    wis: 10,
    movement: 3,
    jump: 1,
};

const HEALER_STATS: StatBlock = StatBlock {
    level: 1,
    exp: 0,
    hp: 80,
    max_hp: 80,
    patk: 4,
    matk: 12,
    def: 5,
    res: 12,
    agi: 7,
    skill: 4,
    luck: 8,
    wis: 9,
    movement: 4,
    jump: 1,
};

const ROGUE_STATS: StatBlock = StatBlock {
    level: 1,
    exp: 0,
    hp: 85,
    max_hp: 85,
    patk: 11,
    matk: 3,
    def: 6,
    res: 5,
    agi: 12,
    skill: 11,
    luck: 9,
    wis: 3,
    movement: 6,
    jump: 3,
};

/// Lifecycle state of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    /// Waiting for orders.
    Idle,
    /// Travelling between cells.
    Moving,
    /// Preparing or performing an ability.
    Acting,
    /// Hit points reached zero; the unit no longer occupies the battlefield.
    Defeated,
}

/// Side a player fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    /// Human-controlled side.
    Player,
    /// Opposing side.
    Enemy,
    /// Uninvolved side.
    Neutral,
}

/// Sub-stage of a player's turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Units may be selected and moved.
    Movement,
    /// An ability is being chosen or performed.
    Action,
    /// The player is wrapping up the turn.
    End,
}
