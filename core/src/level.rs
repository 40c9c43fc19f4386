//! ASCII level layouts.

use thiserror::Error;

use crate::{DestructiblePolicy, TileCoord};

/// Arena shipped with the game: 25 columns by 9 rows.
pub const DEFAULT_LEVEL: [&str; 9] = [
    "=========================",
    "=  +++  +   +   +  +++  =",
    "= =+=+= = = = = = =+=+= =",
    "=  +++  +  +++  +  +++  =",
    "=+=+=+=+=+=+=+=+=+=+=+=+=",
    "=  +++  +  +++  +  +++  =",
    "= =+=+= = = = = = =+=+= =",
    "=  +++  +   +   +  +++  =",
    "=========================",
];

const WALL_SYMBOL: char = '=';
const CRATE_SYMBOL: char = '+';
const BRUSH_SYMBOL: char = '~';
const FLOOR_SYMBOL: char = ' ';

/// Static content of a single tile in a layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LevelTile {
    /// Walkable empty tile.
    Floor,
    /// Indestructible wall.
    Wall,
    /// Destructible object with the given policy.
    Destructible(DestructiblePolicy),
}

/// Errors raised while parsing an ASCII layout.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LevelError {
    /// The layout contained no rows or only empty rows.
    #[error("level layout is empty")]
    Empty,
    /// A row's width differs from the first row.
    #[error("row {row} has {found} columns, expected {expected}")]
    Ragged {
        /// Zero-based index of the offending row.
        row: u32,
        /// Width of the first row.
        expected: u32,
        /// Width of the offending row.
        found: u32,
    },
    /// A symbol outside the level alphabet was found.
    #[error("unknown level symbol '{symbol}' at ({column}, {row})")]
    UnknownSymbol {
        /// Offending character.
        symbol: char,
        /// Column of the character.
        column: u32,
        /// Row of the character.
        row: u32,
    },
}

/// Rectangular grid of static tiles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelLayout {
    columns: u32,
    rows: u32,
    tiles: Vec<LevelTile>,
}

impl LevelLayout {
    /// Parses an ASCII layout, one string per row.
    ///
    /// `=` is a wall, `+` a crate, `~` brush and a space is floor.
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Result<Self, LevelError> {
        let expected = lines
            .first()
            .map(|line| line.as_ref().chars().count())
            .unwrap_or(0);
        if expected == 0 {
            return Err(LevelError::Empty);
        }

        let mut tiles = Vec::with_capacity(expected * lines.len());
        for (row, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            let found = line.chars().count();
            if found != expected {
                return Err(LevelError::Ragged {
                    row: row as u32,
                    expected: expected as u32,
                    found: found as u32,
                });
            }

            for (column, symbol) in line.chars().enumerate() {
                let tile = match symbol {
                    WALL_SYMBOL => LevelTile::Wall,
                    CRATE_SYMBOL => LevelTile::Destructible(DestructiblePolicy::CRATE),
                    BRUSH_SYMBOL => LevelTile::Destructible(DestructiblePolicy::BRUSH),
                    FLOOR_SYMBOL => LevelTile::Floor,
                    symbol => {
                        return Err(LevelError::UnknownSymbol {
                            symbol,
                            column: column as u32,
                            row: row as u32,
                        })
                    }
                };
                tiles.push(tile);
            }
        }

        Ok(Self {
            columns: expected as u32,
            rows: lines.len() as u32,
            tiles,
        })
    }

    /// Parses [`DEFAULT_LEVEL`].
    pub fn arena() -> Result<Self, LevelError> {
        Self::parse(&DEFAULT_LEVEL)
    }

    /// Creates a layout made only of floor tiles.
    #[must_use]
    pub fn open(columns: u32, rows: u32) -> Self {
        let capacity = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        Self {
            columns,
            rows,
            tiles: vec![LevelTile::Floor; capacity],
        }
    }

    /// Returns a copy of the layout with one tile replaced.
    ///
    /// Tiles outside the layout are ignored.
    #[must_use]
    pub fn with_tile(mut self, tile: TileCoord, content: LevelTile) -> Self {
        if let Some(index) = self.index(tile) {
            self.tiles[index] = content;
        }
        self
    }

    /// Number of columns in the layout.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the layout.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Returns the static content of a tile, or `None` outside the layout.
    #[must_use]
    pub fn tile(&self, tile: TileCoord) -> Option<LevelTile> {
        self.index(tile).map(|index| self.tiles[index])
    }

    /// Iterates over every tile coordinate with its content in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (TileCoord, LevelTile)> + '_ {
        let columns = self.columns.max(1);
        self.tiles.iter().enumerate().map(move |(index, tile)| {
            let index = index as u32;
            (TileCoord::new(index % columns, index / columns), *tile)
        })
    }

    /// Resolves a lobby start position index to one of the four inner corners.
    ///
    /// Index 0 is the top-left corner, 1 top-right, 2 bottom-left and
    /// 3 bottom-right. Layouts smaller than 3x3 have no corners.
    #[must_use]
    pub fn start_tile(&self, position: u32) -> Option<TileCoord> {
        if self.columns < 3 || self.rows < 3 {
            return None;
        }
        let left = 1;
        let top = 1;
        let right = self.columns - 2;
        let bottom = self.rows - 2;
        match position {
            0 => Some(TileCoord::new(left, top)),
            1 => Some(TileCoord::new(right, top)),
            2 => Some(TileCoord::new(left, bottom)),
            3 => Some(TileCoord::new(right, bottom)),
            _ => None,
        }
    }

    fn index(&self, tile: TileCoord) -> Option<usize> {
        if tile.column() < self.columns && tile.row() < self.rows {
            let row = usize::try_from(tile.row()).ok()?;
            let column = usize::try_from(tile.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}
