//! Read-only reference tables for abilities and unit templates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{AbilityId, CatalogError, UnitKind};

/// Resource an ability consumes when used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostKind {
    /// Magic points.
    Mp,
    /// Skill points.
    Sp,
    /// Hit points.
    Hp,
    /// Free to use.
    None,
}

/// Elemental alignment of an ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Affinity {
    /// No element.
    Neutral,
    /// Fire element.
    Fire,
    /// Water element.
    Water,
    /// Earth element.
    Earth,
    /// Wind element.
    Wind,
    /// Lightning element.
    Lightning,
}

/// What an ability may be aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Opposing units.
    Enemy,
    /// Friendly units.
    Ally,
    /// The caster only.
    #[serde(rename = "self")]
    Caster,
    /// An empty cell.
    Tile,
}

/// Definition of an ability shared by every unit that knows it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityTemplate {
    /// Catalog key.
    pub id: AbilityId,
    /// Display name.
    pub name: String,
    /// Player-facing description.
    pub description: String,
    /// Resource consumed on use.
    pub cost_kind: CostKind,
    /// Amount of the resource consumed.
    pub cost_value: u32,
    /// Reach in cells.
    pub range: u32,
    /// Radius of the affected area; zero hits a single cell.
    pub area: u32,
    /// Elemental alignment.
    pub affinity: Affinity,
    /// Valid target class.
    pub target: TargetKind,
    /// Effect identifiers resolved by combat logic.
    pub effects: Vec<String>,
    /// Turns before the ability may be used again.
    pub cooldown: u32,
    /// Level at which units unlock the ability.
    pub unlock_level: u32,
}

/// Blueprint for spawning a unit of a given kind with a fixed ability roster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTemplate {
    /// Catalog key.
    pub id: String,
    /// Default display name.
    pub name: String,
    /// Archetype that supplies the base stat block.
    pub kind: UnitKind,
    /// Abilities granted to spawned units.
    pub abilities: Vec<AbilityId>,
}

/// Serialized form of a catalog as loaded from configuration files.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Ability templates.
    #[serde(default)]
    pub abilities: Vec<AbilityTemplate>,
    /// Unit templates.
    #[serde(default)]
    pub units: Vec<UnitTemplate>,
}

/// Immutable lookup tables supplied at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Catalog {
    abilities: BTreeMap<AbilityId, AbilityTemplate>,
    units: BTreeMap<String, UnitTemplate>,
}

impl Catalog {
    /// Builds a catalog, checking that identifiers are unique and every unit
    /// template only references known abilities.
    pub fn new(document: CatalogDocument) -> Result<Self, CatalogError> {
        let mut abilities = BTreeMap::new();
        for ability in document.abilities {
            let key = ability.id.clone();
            if abilities.insert(key.clone(), ability).is_some() {
                return Err(CatalogError::DuplicateAbility(key.as_str().to_owned()));
            }
        }

        let mut units = BTreeMap::new();
        for template in document.units {
            if let Some(missing) = template
                .abilities
                .iter()
                .find(|ability| !abilities.contains_key(*ability))
            {
                return Err(CatalogError::UnknownAbility {
                    template: template.id.clone(),
                    ability: missing.as_str().to_owned(),
                });
            }
            let key = template.id.clone();
            if units.insert(key.clone(), template).is_some() {
                return Err(CatalogError::DuplicateTemplate(key));
            }
        }

        Ok(Self { abilities, units })
    }

    /// Tables shipped with the engine.
    #[must_use]
    pub fn builtin() -> Self {
        let document = builtin_document();
        Self {
            abilities: document
                .abilities
                .into_iter()
                .map(|ability| (ability.id.clone(), ability))
                .collect(),
            units: document
                .units
                .into_iter()
                .map(|template| (template.id.clone(), template))
                .collect(),
        }
    }

    /// Looks up an ability template.
    #[must_use]
    pub fn ability(&self, id: &AbilityId) -> Option<&AbilityTemplate> {
        self.abilities.get(id)
    }

    /// Looks up a unit template.
    #[must_use]
    pub fn unit_template(&self, id: &str) -> Option<&UnitTemplate> {
        self.units.get(id)
    }

    /// Iterator over every ability template ordered by identifier.
    pub fn abilities(&self) -> impl Iterator<Item = &AbilityTemplate> {
        self.abilities.values()
    }

    /// Iterator over every unit template ordered by identifier.
    pub fn unit_templates(&self) -> impl Iterator<Item = &UnitTemplate> {
        self.units.values()
    }

    /// Abilities sharing the provided affinity.
    pub fn abilities_by_affinity(
        &self,
        affinity: Affinity,
    ) -> impl Iterator<Item = &AbilityTemplate> {
        self.abilities
            .values()
            .filter(move |ability| ability.affinity == affinity)
    }

    /// Abilities a unit of the provided level has unlocked.
    pub fn abilities_unlocked_at(&self, level: u32) -> impl Iterator<Item = &AbilityTemplate> {
        self.abilities
            .values()
            .filter(move |ability| ability.unlock_level <= level)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

struct AbilityRow {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    cost_kind: CostKind,
    cost_value: u32,
    range: u32,
    area: u32,
    affinity: Affinity,
    target: TargetKind,
    effects: &'static [&'static str],
    cooldown: u32,
    unlock_level: u32,
}

const BUILTIN_ABILITIES: [AbilityRow; 15] = [
    AbilityRow {
        id: "basic_attack",
        name: "Attack",
        description: "A basic attack that deals physical damage based on PATK.",
        cost_kind: CostKind::Sp,
        cost_value: 5,
        range: 1,
        area: 0,
        affinity: Affinity::Neutral,
        target: TargetKind::Enemy,
        effects: &["deal_physical_damage"],
        cooldown: 0,
        unlock_level: 1,
    },
    AbilityRow {
        id: "shield_bash",
        name: "Shield Bash",
        description: "Strikes an enemy with your shield, dealing moderate damage and stunning them for 1 turn.",
        cost_kind: CostKind::Sp,
        cost_value: 15,
        range: 1,
        area: 0,
        affinity: Affinity::Earth,
        target: TargetKind::Enemy,
        effects: &["deal_physical_damage", "apply_stun"],
        cooldown: 3,
        unlock_level: 3,
    },
    AbilityRow {
        id: "provoke",
        name: "Provoke",
        description: "Taunts nearby enemies, forcing them to target you for 2 turns.",
        cost_kind: CostKind::Sp,
        cost_value: 10,
        range: 0,
        area: 2,
        affinity: Affinity::Neutral,
        target: TargetKind::Enemy,
        effects: &["apply_taunt"],
        cooldown: 4,
        unlock_level: 5,
    },
    AbilityRow {
        id: "precise_shot",
        name: "Precise Shot",
        description: "A carefully aimed shot that deals high damage with increased critical hit chance.",
        cost_kind: CostKind::Sp,
        cost_value: 12,
        range: 5,
        area: 0,
        affinity: Affinity::Wind,
        target: TargetKind::Enemy,
        effects: &["deal_physical_damage", "increased_crit"],
        cooldown: 2,
        unlock_level: 2,
    },
    AbilityRow {
        id: "multishot",
        name: "Multishot",
        description: "Fires multiple arrows at nearby enemies, dealing damage to all targets in the area.",
        cost_kind: CostKind::Sp,
        cost_value: 20,
        range: 4,
        area: 1,
        affinity: Affinity::Wind,
        target: TargetKind::Enemy,
        effects: &["deal_physical_damage"],
        cooldown: 3,
        unlock_level: 5,
    },
    AbilityRow {
        id: "fireball",
        name: "Fireball",
        description: "Launches a ball of fire that deals magical damage and can burn the target.",
        cost_kind: CostKind::Mp,
        cost_value: 10,
        range: 3,
        area: 1,
        affinity: Affinity::Fire,
        target: TargetKind::Enemy,
        effects: &["deal_magical_damage", "apply_burn"],
        cooldown: 2,
        unlock_level: 1,
    },
    AbilityRow {
        id: "lightning_bolt",
        name: "Lightning Bolt",
        description: "Calls down a bolt of lightning, dealing high magical damage to a single target.",
        cost_kind: CostKind::Mp,
        cost_value: 15,
        range: 4,
        area: 0,
        affinity: Affinity::Lightning,
        target: TargetKind::Enemy,
        effects: &["deal_magical_damage"],
        cooldown: 3,
        unlock_level: 4,
    },
    AbilityRow {
        id: "ice_shard",
        name: "Ice Shard",
        description: "Launches a shard of ice that deals magical damage and can slow the target.",
        cost_kind: CostKind::Mp,
        cost_value: 12,
        range: 3,
        area: 0,
        affinity: Affinity::Water,
        target: TargetKind::Enemy,
        effects: &["deal_magical_damage", "apply_slow"],
        cooldown: 2,
        unlock_level: 3,
    },
    AbilityRow {
        id: "heal",
        name: "Heal",
        description: "Restores HP to a single ally based on MATK.",
        cost_kind: CostKind::Mp,
        cost_value: 10,
        range: 3,
        area: 0,
        affinity: Affinity::Water,
        target: TargetKind::Ally,
        effects: &["restore_hp"],
        cooldown: 1,
        unlock_level: 1,
    },
    AbilityRow {
        id: "mass_heal",
        name: "Mass Heal",
        description: "Restores HP to all allies in an area based on MATK.",
        cost_kind: CostKind::Mp,
        cost_value: 20,
        range: 3,
        area: 2,
        affinity: Affinity::Water,
        target: TargetKind::Ally,
        effects: &["restore_hp"],
        cooldown: 4,
        unlock_level: 8,
    },
    AbilityRow {
        id: "revive",
        name: "Revive",
        description: "Resurrects a fallen ally with 50% HP.",
        cost_kind: CostKind::Mp,
        cost_value: 30,
        range: 2,
        area: 0,
        affinity: Affinity::Neutral,
        target: TargetKind::Ally,
        effects: &["revive"],
        cooldown: 6,
        unlock_level: 10,
    },
    AbilityRow {
        id: "protect",
        name: "Protect",
        description: "Creates a barrier around an ally, reducing damage taken by 30% for 3 turns.",
        cost_kind: CostKind::Mp,
        cost_value: 15,
        range: 3,
        area: 0,
        affinity: Affinity::Neutral,
        target: TargetKind::Ally,
        effects: &["apply_barrier"],
        cooldown: 3,
        unlock_level: 3,
    },
    AbilityRow {
        id: "backstab",
        name: "Backstab",
        description: "Strikes an enemy from behind, dealing high damage with guaranteed critical hit if attacking from behind.",
        cost_kind: CostKind::Sp,
        cost_value: 15,
        range: 1,
        area: 0,
        affinity: Affinity::Neutral,
        target: TargetKind::Enemy,
        effects: &["deal_physical_damage", "positional_bonus"],
        cooldown: 2,
        unlock_level: 2,
    },
    AbilityRow {
        id: "poison_strike",
        name: "Poison Strike",
        description: "Attacks with a poisoned weapon, dealing damage over time for 3 turns.",
        cost_kind: CostKind::Sp,
        cost_value: 12,
        range: 1,
        area: 0,
        affinity: Affinity::Neutral,
        target: TargetKind::Enemy,
        effects: &["deal_physical_damage", "apply_poison"],
        cooldown: 3,
        unlock_level: 4,
    },
    AbilityRow {
        id: "shadow_step",
        name: "Shadow Step",
        description: "Teleports to a nearby location, allowing you to move through obstacles.",
        cost_kind: CostKind::Sp,
        cost_value: 18,
        range: 3,
        area: 0,
        affinity: Affinity::Neutral,
        target: TargetKind::Tile,
        effects: &["teleport"],
        cooldown: 4,
        unlock_level: 6,
    },
];

const BUILTIN_UNITS: [(&str, &str, UnitKind, &[&str]); 5] = [
    (
        "warrior",
        "Warrior",
        UnitKind::Warrior,
        &["basic_attack", "shield_bash", "provoke"],
    ),
    (
        "archer",
        "Archer",
        UnitKind::Archer,
        &["basic_attack", "precise_shot", "multishot"],
    ),
    (
        "mage",
        "Mage",
        UnitKind::Mage,
        &["basic_attack", "fireball", "lightning_bolt", "ice_shard"],
    ),
    (
        "healer",
        "Healer",
        UnitKind::Healer,
        &["basic_attack", "heal", "mass_heal", "revive", "protect"],
    ),
    (
        "rogue",
        "Rogue",
        UnitKind::Rogue,
        &["basic_attack", "backstab", "poison_strike", "shadow_step"],
    ),
];

fn builtin_document() -> CatalogDocument {
    let abilities = BUILTIN_ABILITIES
        .iter()
        .map(|row| AbilityTemplate {
            id: AbilityId::new(row.id),
            name: row.name.to_owned(),
            description: row.description.to_owned(),
            cost_kind: row.cost_kind,
            cost_value: row.cost_value,
            range: row.range,
            area: row.area,
            affinity: row.affinity,
            target: row.target,
            effects: row.effects.iter().map(|effect| (*effect).to_owned()).collect(),
            cooldown: row.cooldown,
            unlock_level: row.unlock_level,
        })
        .collect();
    let units = BUILTIN_UNITS
        .iter()
        .map(|(id, name, kind, abilities)| UnitTemplate {
            id: (*id).to_owned(),
            name: (*name).to_owned(),
            kind: *kind,
            abilities: abilities.iter().map(|ability| AbilityId::new(*ability)).collect(),
        })
        .collect();
    CatalogDocument { abilities, units }
}
