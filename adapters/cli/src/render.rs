//! Text rendering of battlefields for terminal output.

use std::collections::HashMap;

use ridgeline_core::{Cell, Grid, TerrainKind};

/// What the first glyph of every column shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Layer {
    /// Stack height of the column in base 36.
    Height,
    /// Terrain tag of the column top.
    Terrain,
}

/// Glyphs drawn to the right of individual columns.
#[derive(Debug, Default)]
pub(crate) struct Overlay {
    marks: HashMap<(i32, i32), char>,
}

impl Overlay {
    /// Marks the `(x, z)` column, replacing an earlier mark.
    pub(crate) fn mark(&mut self, x: i32, z: i32, glyph: char) {
        let _ = self.marks.insert((x, z), glyph);
    }

    fn glyph(&self, x: i32, z: i32) -> char {
        self.marks.get(&(x, z)).copied().unwrap_or(' ')
    }
}

/// Renders one row per z coordinate with two characters per column.
///
/// Missing columns render blank. Trailing whitespace is trimmed.
pub(crate) fn render(grid: &Grid, layer: Layer, overlay: &Overlay) -> String {
    let Some((min_x, max_x, min_z, max_z)) = extents(grid) else {
        return String::new();
    };
    let base = -(i64::from(grid.config().max_height) / 2);

    let mut out = String::new();
    for z in min_z..=max_z {
        let mut row = String::new();
        for x in min_x..=max_x {
            match grid.column_top(x, z) {
                Some(top) => {
                    row.push(match layer {
                        Layer::Height => height_glyph(top, base),
                        Layer::Terrain => terrain_glyph(top.terrain()),
                    });
                    row.push(overlay.glyph(x, z));
                }
                None => row.push_str("  "),
            }
        }
        out.push_str(row.trim_end());
        out.push('\n');
    }
    out
}

fn extents(grid: &Grid) -> Option<(i32, i32, i32, i32)> {
    grid.traversable_cells()
        .map(Cell::coord)
        .fold(None, |bounds, coord| {
            let (x, z) = (coord.x(), coord.z());
            Some(match bounds {
                None => (x, x, z, z),
                Some((min_x, max_x, min_z, max_z)) => {
                    (min_x.min(x), max_x.max(x), min_z.min(z), max_z.max(z))
                }
            })
        })
}

fn height_glyph(top: &Cell, base: i64) -> char {
    let level = i64::from(top.coord().y()) - base + 1;
    u32::try_from(level)
        .ok()
        .and_then(|level| char::from_digit(level % 36, 36))
        .unwrap_or('?')
}

const fn terrain_glyph(terrain: TerrainKind) -> char {
    match terrain {
        TerrainKind::Water => '~',
        TerrainKind::Grass => '.',
        TerrainKind::Forest => 'T',
        TerrainKind::Mountain => 'A',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridgeline_core::{BattlefieldConfig, Column};

    fn grid() -> Grid {
        let columns = [
            (0, 0, 1, TerrainKind::Water),
            (1, 0, 3, TerrainKind::Forest),
            (0, 1, 2, TerrainKind::Grass),
            (1, 1, 4, TerrainKind::Mountain),
        ]
        .into_iter()
        .map(|(x, z, height, terrain)| Column {
            x,
            z,
            base: -2,
            height,
            terrain,
        });
        Grid::from_columns(BattlefieldConfig::new(2, 4, 2, 10.0), 0, columns)
            .expect("columns are disjoint")
    }

    #[test]
    fn heights_are_drawn_row_by_row() {
        let map = render(&grid(), Layer::Height, &Overlay::default());
        assert_eq!(map, "1 3\n2 4\n");
    }

    #[test]
    fn terrain_layer_uses_tags() {
        let map = render(&grid(), Layer::Terrain, &Overlay::default());
        assert_eq!(map, "~ T\n. A\n");
    }

    #[test]
    fn overlay_marks_follow_the_column() {
        let mut overlay = Overlay::default();
        overlay.mark(0, 0, '@');
        overlay.mark(1, 1, '*');
        let map = render(&grid(), Layer::Height, &overlay);
        assert_eq!(map, "1@3\n2 4*\n");
    }

    #[test]
    fn missing_columns_stay_blank() {
        let columns = [(0, 0), (2, 0)].into_iter().map(|(x, z)| Column {
            x,
            z,
            base: 0,
            height: 1,
            terrain: TerrainKind::Grass,
        });
        let grid = Grid::from_columns(BattlefieldConfig::new(3, 1, 1, 10.0), 0, columns)
            .expect("columns are disjoint");
        assert_eq!(render(&grid, Layer::Height, &Overlay::default()), "1   1\n");
    }
}
