//! Turn rotation, phase and selection bookkeeping.

use ridgeline_core::{AbilityId, CellCoord, Phase, PlayerId, UnitId};
use ridgeline_system_movement::{Path, ReachableSet};

/// Turn and selection state of a battle.
#[derive(Clone, Debug)]
pub struct TurnState {
    current: Option<PlayerId>,
    phase: Phase,
    selected_unit: Option<UnitId>,
    selected_ability: Option<AbilityId>,
    reachable: Option<(UnitId, ReachableSet)>,
    path: Option<(UnitId, Path)>,
}

impl Default for TurnState {
    fn default() -> Self {
        Self {
            current: None,
            phase: Phase::Movement,
            selected_unit: None,
            selected_ability: None,
            reachable: None,
            path: None,
        }
    }
}

impl TurnState {
    /// Player whose turn is active, if any turn started yet.
    #[must_use]
    pub const fn current_player(&self) -> Option<PlayerId> {
        self.current
    }

    /// Informational phase of the active turn.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Currently selected unit.
    #[must_use]
    pub const fn selected_unit(&self) -> Option<UnitId> {
        self.selected_unit
    }

    /// Currently selected ability of the selected unit.
    #[must_use]
    pub fn selected_ability(&self) -> Option<&AbilityId> {
        self.selected_ability.as_ref()
    }

    /// Last computed reachable set and the unit it belongs to.
    #[must_use]
    pub fn reachable(&self) -> Option<(UnitId, &ReachableSet)> {
        self.reachable.as_ref().map(|(unit, set)| (*unit, set))
    }

    /// Last found path and the unit it belongs to.
    #[must_use]
    pub fn path(&self) -> Option<(UnitId, &Path)> {
        self.path.as_ref().map(|(unit, path)| (*unit, path))
    }

    /// Reports whether `target` belongs to the reachable set computed for `unit`.
    #[must_use]
    pub fn can_reach(&self, unit: UnitId, target: CellCoord) -> bool {
        matches!(&self.reachable, Some((owner, set)) if *owner == unit && set.contains(target))
    }

    /// Hands the turn to `player` in the movement phase with nothing selected.
    pub(crate) fn begin(&mut self, player: PlayerId) -> Option<UnitId> {
        self.current = Some(player);
        self.phase = Phase::Movement;
        self.clear_selection()
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Selects `unit` together with its freshly computed reachable set.
    pub(crate) fn select(&mut self, unit: UnitId, reachable: ReachableSet) -> Option<UnitId> {
        let previous = self.clear_selection();
        self.selected_unit = Some(unit);
        self.reachable = Some((unit, reachable));
        previous
    }

    /// Clears selection, ability, reachable set and path. Returns the unit
    /// that was selected.
    pub(crate) fn clear_selection(&mut self) -> Option<UnitId> {
        self.selected_ability = None;
        self.clear_plans();
        self.selected_unit.take()
    }

    /// Drops the reachable set and path while keeping the selection.
    pub(crate) fn clear_plans(&mut self) {
        self.reachable = None;
        self.path = None;
    }

    pub(crate) fn set_ability(&mut self, ability: Option<AbilityId>) {
        self.selected_ability = ability;
    }

    pub(crate) fn store_path(&mut self, unit: UnitId, path: Path) {
        self.path = Some((unit, path));
    }

    pub(crate) fn clear_path(&mut self) {
        self.path = None;
    }
}
