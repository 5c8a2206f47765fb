//! Units, players and the roster that owns them.

use std::collections::BTreeMap;

use ridgeline_core::{
    AbilityId, CellCoord, Faction, PlayerId, StatBlock, UnitId, UnitKind, UnitState,
};
use ridgeline_system_movement::MovementProfile;

/// Combatant placed on the battlefield.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Unit {
    id: UnitId,
    player: PlayerId,
    name: String,
    kind: UnitKind,
    template: Option<String>,
    position: CellCoord,
    stats: StatBlock,
    abilities: Vec<AbilityId>,
    state: UnitState,
}

impl Unit {
    /// Identifier of the unit.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Player owning the unit.
    #[must_use]
    pub const fn player(&self) -> PlayerId {
        self.player
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Archetype of the unit.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Catalog template the unit was spawned from, if any.
    #[must_use]
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    /// Cell the unit stands on, or last stood on when defeated.
    #[must_use]
    pub const fn position(&self) -> CellCoord {
        self.position
    }

    /// Current stat block.
    #[must_use]
    pub const fn stats(&self) -> &StatBlock {
        &self.stats
    }

    /// Abilities the unit knows.
    #[must_use]
    pub fn abilities(&self) -> &[AbilityId] {
        &self.abilities
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> UnitState {
        self.state
    }

    /// Reports whether the unit's hit points reached zero.
    #[must_use]
    pub fn is_defeated(&self) -> bool {
        self.state == UnitState::Defeated
    }

    /// Movement budget derived from the stat block.
    #[must_use]
    pub const fn movement_profile(&self) -> MovementProfile {
        MovementProfile::from_stats(&self.stats)
    }

    pub(crate) fn knows(&self, ability: &AbilityId) -> bool {
        self.abilities.contains(ability)
    }

    pub(crate) fn relocate(&mut self, cell: CellCoord) {
        self.position = cell;
    }

    pub(crate) fn set_state(&mut self, state: UnitState) {
        self.state = state;
    }

    /// Applies a signed hit point change clamped into `[0, max_hp]`.
    pub(crate) fn adjust_hp(&mut self, delta: i32) -> u32 {
        let current = i64::from(self.stats.hp) + i64::from(delta);
        let clamped = current.clamp(0, i64::from(self.stats.max_hp));
        self.stats.hp = u32::try_from(clamped).unwrap_or(0);
        self.stats.hp
    }
}

/// Participant in the turn rotation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Player {
    id: PlayerId,
    name: String,
    faction: Faction,
    units: Vec<UnitId>,
}

impl Player {
    /// Identifier of the player.
    #[must_use]
    pub const fn id(&self) -> PlayerId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Side the player fights for.
    #[must_use]
    pub const fn faction(&self) -> Faction {
        self.faction
    }

    /// Units owned by the player in spawn order, defeated ones included.
    #[must_use]
    pub fn units(&self) -> &[UnitId] {
        &self.units
    }
}

/// Everything needed to place a unit once the spawn request was validated.
#[derive(Debug)]
pub(crate) struct UnitDraft {
    pub(crate) player: PlayerId,
    pub(crate) name: String,
    pub(crate) kind: UnitKind,
    pub(crate) template: Option<String>,
    pub(crate) position: CellCoord,
    pub(crate) stats: StatBlock,
    pub(crate) abilities: Vec<AbilityId>,
}

/// Players in registration order and every unit they own.
#[derive(Debug, Default)]
pub(crate) struct Roster {
    players: BTreeMap<PlayerId, Player>,
    units: BTreeMap<UnitId, Unit>,
    next_player: u32,
    next_unit: u32,
}

impl Roster {
    pub(crate) fn register_player(&mut self, name: String, faction: Faction) -> PlayerId {
        let id = PlayerId::new(self.next_player);
        self.next_player = self.next_player.saturating_add(1);
        let previous = self.players.insert(
            id,
            Player {
                id,
                name,
                faction,
                units: Vec::new(),
            },
        );
        debug_assert!(previous.is_none(), "player ids are never reused");
        id
    }

    /// Creates a unit and appends it to its owner's roster.
    ///
    /// Returns `None` when the owner is unknown.
    pub(crate) fn add_unit(&mut self, draft: UnitDraft) -> Option<UnitId> {
        let owner = self.players.get_mut(&draft.player)?;
        let id = UnitId::new(self.next_unit);
        self.next_unit = self.next_unit.saturating_add(1);
        owner.units.push(id);
        let previous = self.units.insert(
            id,
            Unit {
                id,
                player: draft.player,
                name: draft.name,
                kind: draft.kind,
                template: draft.template,
                position: draft.position,
                stats: draft.stats,
                abilities: draft.abilities,
                state: UnitState::Idle,
            },
        );
        debug_assert!(previous.is_none(), "unit ids are never reused");
        Some(id)
    }

    /// Removes every unit while keeping the players registered.
    pub(crate) fn clear_units(&mut self) {
        self.units.clear();
        for player in self.players.values_mut() {
            player.units.clear();
        }
    }

    pub(crate) fn contains_player(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    pub(crate) fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub(crate) fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Player registered after `current`, wrapping around; the first player
    /// when no turn is active.
    pub(crate) fn next_player(&self, current: Option<PlayerId>) -> Option<PlayerId> {
        let first = self.players.keys().next().copied();
        let Some(current) = current else {
            return first;
        };
        self.players
            .range(current..)
            .map(|(id, _)| *id)
            .find(|id| *id != current)
            .or(first)
    }

    pub(crate) fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub(crate) fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    pub(crate) fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(player: PlayerId) -> UnitDraft {
        UnitDraft {
            player,
            name: "Scout".to_owned(),
            kind: UnitKind::Rogue,
            template: None,
            position: CellCoord::new(0, 0, 0),
            stats: UnitKind::Rogue.base_stats(),
            abilities: Vec::new(),
        }
    }

    #[test]
    fn rotation_wraps_in_registration_order() {
        let mut roster = Roster::default();
        let first = roster.register_player("Ada".to_owned(), Faction::Player);
        let second = roster.register_player("Bo".to_owned(), Faction::Enemy);

        assert_eq!(roster.next_player(None), Some(first));
        assert_eq!(roster.next_player(Some(first)), Some(second));
        assert_eq!(roster.next_player(Some(second)), Some(first));
    }

    #[test]
    fn units_require_a_registered_owner() {
        let mut roster = Roster::default();
        assert_eq!(roster.add_unit(draft(PlayerId::new(3))), None);

        let owner = roster.register_player("Ada".to_owned(), Faction::Player);
        let unit = roster.add_unit(draft(owner)).expect("owner exists");
        assert_eq!(roster.player(owner).map(Player::units), Some(&[unit][..]));
    }

    #[test]
    fn hp_changes_are_clamped() {
        let mut roster = Roster::default();
        let owner = roster.register_player("Ada".to_owned(), Faction::Player);
        let id = roster.add_unit(draft(owner)).expect("owner exists");
        let unit = roster.unit_mut(id).expect("unit exists");
        let max_hp = unit.stats().max_hp;

        assert_eq!(unit.adjust_hp(50), max_hp);
        assert_eq!(unit.adjust_hp(-10), max_hp - 10);
        assert_eq!(unit.adjust_hp(i32::MIN), 0);
    }
}
