use serde::{Deserialize, Serialize};

use crate::error::DashError;
use crate::tile::Tile;

/// (row, col)
pub type Position = (usize, usize);

/// Immutable layout parsed from map rows. Never mutated after construction.
/// Serialized as its row strings; deserializing re-runs `parse`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct GridMap {
    rows: usize,
    cols: usize,
    tiles: Vec<Tile>,
    start: Position,
    goal: Position,
}

impl GridMap {
    /// Parse equal-length rows over `S G F H W V`. Exactly one start is
    /// allowed; the first goal in row-major order is canonical.
    pub fn parse<S: AsRef<str>>(desc: &[S]) -> Result<Self, DashError> {
        let (rows, cols, tiles) = parse_tiles(desc)?;
        let find = |wanted: Tile| tiles.iter().position(|&t| t == wanted).map(|i| (i / cols, i % cols));
        let start = find(Tile::Start).ok_or_else(|| DashError::InvalidMap("map must contain a start 'S'".into()))?;
        let goal = find(Tile::Goal).ok_or_else(|| DashError::InvalidMap("map must contain at least one goal 'G'".into()))?;
        let starts = tiles.iter().filter(|&&t| t == Tile::Start).count();
        if starts > 1 {
            return Err(DashError::InvalidMap(format!("map has {starts} starts, expected exactly one")));
        }
        Ok(Self { rows, cols, tiles, start, goal })
    }

    pub fn rows(&self) -> usize { self.rows }
    pub fn cols(&self) -> usize { self.cols }
    pub fn start(&self) -> Position { self.start }
    pub fn goal(&self) -> Position { self.goal }
    pub fn n_states(&self) -> usize { self.rows * self.cols }

    #[inline]
    pub fn in_bounds(&self, row: isize, col: isize) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.rows && (col as usize) < self.cols
    }

    pub fn tile(&self, row: usize, col: usize) -> Result<Tile, DashError> {
        check_bounds(row, col, self.rows, self.cols)?;
        Ok(self.tiles[row * self.cols + col])
    }

    #[inline]
    pub(crate) fn tile_at(&self, (row, col): Position) -> Tile {
        self.tiles[row * self.cols + col]
    }

    /// Single-integer state index: `row * cols + col`.
    #[inline]
    pub fn encode(&self, (row, col): Position) -> usize {
        row * self.cols + col
    }

    pub fn decode(&self, index: usize) -> Option<Position> {
        (index < self.n_states()).then(|| (index / self.cols, index % self.cols))
    }

    /// Rows as they were given to `parse`.
    pub fn row_strings(&self) -> Vec<String> {
        rows_of(&self.tiles, self.cols)
    }

    pub fn fresh_state(&self) -> MapState {
        MapState { rows: self.rows, cols: self.cols, tiles: self.tiles.clone() }
    }
}

/// Per-episode overlay that records ice degradation. Same shape as the
/// `GridMap` it was copied from. Serialized as row strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct MapState {
    rows: usize,
    cols: usize,
    tiles: Vec<Tile>,
}

impl MapState {
    pub fn rows(&self) -> usize { self.rows }
    pub fn cols(&self) -> usize { self.cols }

    pub fn tile(&self, row: usize, col: usize) -> Result<Tile, DashError> {
        check_bounds(row, col, self.rows, self.cols)?;
        Ok(self.tiles[row * self.cols + col])
    }

    #[inline]
    pub(crate) fn get(&self, (row, col): Position) -> Tile {
        self.tiles[row * self.cols + col]
    }

    #[inline]
    pub(crate) fn set(&mut self, (row, col): Position, tile: Tile) {
        self.tiles[row * self.cols + col] = tile;
    }

    /// Overwrite in place from `grid`, reusing the allocation.
    pub fn restore(&mut self, grid: &GridMap) {
        self.rows = grid.rows;
        self.cols = grid.cols;
        self.tiles.clone_from(&grid.tiles);
    }

    pub fn count(&self, tile: Tile) -> usize {
        self.tiles.iter().filter(|&&t| t == tile).count()
    }

    pub fn row_strings(&self) -> Vec<String> {
        rows_of(&self.tiles, self.cols)
    }

    /// One line per row using map symbols.
    pub fn grid_text(&self) -> String {
        self.row_strings().join("\n")
    }
}

impl TryFrom<Vec<String>> for GridMap {
    type Error = DashError;

    fn try_from(rows: Vec<String>) -> Result<Self, Self::Error> {
        Self::parse(rows.as_slice())
    }
}

impl From<GridMap> for Vec<String> {
    fn from(grid: GridMap) -> Self {
        grid.row_strings()
    }
}

impl TryFrom<Vec<String>> for MapState {
    type Error = DashError;

    /// Shape and symbols are checked; landmarks are not, since a degraded
    /// overlay is only meaningful next to the grid it came from.
    fn try_from(rows: Vec<String>) -> Result<Self, Self::Error> {
        let (rows, cols, tiles) = parse_tiles(rows.as_slice())?;
        Ok(Self { rows, cols, tiles })
    }
}

impl From<MapState> for Vec<String> {
    fn from(map: MapState) -> Self {
        map.row_strings()
    }
}

/// Rectangular tile grid from row strings, row-major.
fn parse_tiles<S: AsRef<str>>(desc: &[S]) -> Result<(usize, usize, Vec<Tile>), DashError> {
    let rows = desc.len();
    if rows == 0 {
        return Err(DashError::InvalidMap("map has no rows".into()));
    }
    let cols = desc[0].as_ref().chars().count();
    if cols == 0 {
        return Err(DashError::InvalidMap("map has an empty row".into()));
    }
    let mut tiles = Vec::with_capacity(rows * cols);
    for (r, line) in desc.iter().enumerate() {
        let before = tiles.len();
        for (c, symbol) in line.as_ref().chars().enumerate() {
            let tile = Tile::from_symbol(symbol)
                .ok_or_else(|| DashError::InvalidMap(format!("unknown tile '{symbol}' at ({r}, {c})")))?;
            tiles.push(tile);
        }
        if tiles.len() - before != cols {
            return Err(DashError::InvalidMap(format!("row {r} has {} cells, expected {cols}", tiles.len() - before)));
        }
    }
    Ok((rows, cols, tiles))
}

fn check_bounds(row: usize, col: usize, rows: usize, cols: usize) -> Result<(), DashError> {
    if row < rows && col < cols {
        Ok(())
    } else {
        Err(DashError::OutOfBounds { row, col, rows, cols })
    }
}

fn rows_of(tiles: &[Tile], cols: usize) -> Vec<String> {
    tiles.chunks(cols).map(|row| row.iter().map(|t| t.symbol()).collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dimensions_and_landmarks() {
        let g = GridMap::parse(&["FFG", "SFF", "FGF"]).unwrap();
        assert_eq!((g.rows(), g.cols()), (3, 3));
        assert_eq!(g.start(), (1, 0));
        assert_eq!(g.goal(), (0, 2));
        assert_eq!(g.tile(2, 1).unwrap(), Tile::Goal);
        assert_eq!(g.row_strings(), vec!["FFG", "SFF", "FGF"]);
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = GridMap::parse(&["SFG", "FF"]).unwrap_err();
        assert!(matches!(err, DashError::InvalidMap(_)));
    }

    #[test]
    fn rejects_missing_start_or_goal() {
        assert!(matches!(GridMap::parse(&["FFG"]), Err(DashError::InvalidMap(_))));
        assert!(matches!(GridMap::parse(&["SFF"]), Err(DashError::InvalidMap(_))));
        let empty: [&str; 0] = [];
        assert!(matches!(GridMap::parse(&empty), Err(DashError::InvalidMap(_))));
    }

    #[test]
    fn rejects_multiple_starts() {
        let err = GridMap::parse(&["SGS"]).unwrap_err();
        assert_eq!(err, DashError::InvalidMap("map has 2 starts, expected exactly one".into()));
        assert!(GridMap::parse(&["SF", "GG"]).is_ok());
    }

    #[test]
    fn rejects_unknown_symbols() {
        let err = GridMap::parse(&["SXG"]).unwrap_err();
        assert_eq!(err, DashError::InvalidMap("unknown tile 'X' at (0, 1)".into()));
    }

    #[test]
    fn tile_lookup_is_bounds_checked() {
        let g = GridMap::parse(&["SF", "FG"]).unwrap();
        assert_eq!(g.tile(2, 0), Err(DashError::OutOfBounds { row: 2, col: 0, rows: 2, cols: 2 }));
        assert!(g.tile(0, 2).is_err());
        assert!(g.fresh_state().tile(5, 5).is_err());
    }

    #[test]
    fn encode_decode_inverts() {
        let g = GridMap::parse(&["SFFF", "FFFG", "HHHH"]).unwrap();
        for idx in 0..g.n_states() {
            let pos = g.decode(idx).unwrap();
            assert_eq!(g.encode(pos), idx);
        }
        assert_eq!(g.decode(g.n_states()), None);
        assert_eq!(g.encode((1, 3)), 7);
    }

    #[test]
    fn fresh_state_copies_layout_and_restore_rewinds() {
        let g = GridMap::parse(&["SF", "FG"]).unwrap();
        let mut m = g.fresh_state();
        assert_eq!(m.grid_text(), "SF\nFG");
        m.set((0, 1), Tile::Hole);
        assert_eq!(m.count(Tile::Hole), 1);
        assert_eq!(g.tile(0, 1).unwrap(), Tile::Ice);
        m.restore(&g);
        assert_eq!(m, g.fresh_state());
    }

    #[test]
    fn serializes_as_row_strings() {
        let g = GridMap::parse(&["SF", "FG"]).unwrap();
        let mut m = g.fresh_state();
        m.set((0, 1), Tile::WeakIce);
        assert_eq!(serde_json::to_value(&g).unwrap(), serde_json::json!(["SF", "FG"]));
        assert_eq!(serde_json::to_value(&m).unwrap(), serde_json::json!(["SW", "FG"]));

        let back: MapState = serde_json::from_value(serde_json::json!(["SW", "FG"])).unwrap();
        assert_eq!(back, m);
        let back: GridMap = serde_json::from_str(r#"["SF","FG"]"#).unwrap();
        assert_eq!(back, g);
    }

    #[test]
    fn deserializing_validates_shape() {
        assert!(serde_json::from_str::<MapState>(r#"["SF","F"]"#).is_err());
        assert!(serde_json::from_str::<MapState>(r#"[]"#).is_err());
        assert!(serde_json::from_str::<MapState>(r#"{"rows":2,"cols":2,"tiles":["S"]}"#).is_err());
        assert!(serde_json::from_str::<GridMap>(r#"["SGS"]"#).is_err());
        assert!(serde_json::from_str::<GridMap>(r#"["FFG"]"#).is_err());

        let m: MapState = serde_json::from_str(r#"["FW","VH"]"#).unwrap();
        assert_eq!(m.tile(1, 1), Ok(Tile::Hole));
        assert!(m.tile(2, 0).is_err());
    }
}
