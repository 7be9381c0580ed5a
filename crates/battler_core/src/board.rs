//! Board geometry: grid cells, world coordinates and the player/enemy split.
//!
//! The grid-to-world mapping is the only source of truth for where a
//! unit stands. A board unit's world position is always recomputed from
//! its cell, never integrated.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed, Vec3Fixed};

/// Default board width in cells.
pub const DEFAULT_BOARD_WIDTH: i32 = 8;

/// Default board height in cells.
pub const DEFAULT_BOARD_HEIGHT: i32 = 8;

/// A cell on the board grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    /// Column, `0..width`.
    pub x: i32,
    /// Row, `0..height`. Low rows belong to the player.
    pub y: i32,
}

impl GridCoord {
    /// Create a grid coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset this cell by a step.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Rectangular board of square tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    width: i32,
    height: i32,
    #[serde(with = "fixed_serde")]
    tile_size: Fixed,
}

impl Board {
    /// Create a board. Dimensions and tile size are validated by the rules.
    #[must_use]
    pub const fn new(width: i32, height: i32, tile_size: Fixed) -> Self {
        Self {
            width,
            height,
            tile_size,
        }
    }

    /// Board width in cells.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Board height in cells.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Edge length of one tile in world units.
    #[must_use]
    pub const fn tile_size(&self) -> Fixed {
        self.tile_size
    }

    /// Whether a cell lies on the board.
    #[must_use]
    pub const fn in_bounds(&self, cell: GridCoord) -> bool {
        cell.x >= 0 && cell.x < self.width && cell.y >= 0 && cell.y < self.height
    }

    /// World-space center of a cell: `((gx + 0.5) * tile, 0, (gy + 0.5) * tile)`.
    #[must_use]
    pub fn grid_to_world(&self, cell: GridCoord) -> Vec3Fixed {
        let half = Fixed::from_num(0.5);
        Vec3Fixed::new(
            (Fixed::from_num(cell.x) + half) * self.tile_size,
            Fixed::ZERO,
            (Fixed::from_num(cell.y) + half) * self.tile_size,
        )
    }

    /// Cell containing a world position, or `None` when it falls off the board.
    ///
    /// Positions too far away to divide by the tile size are off the board.
    #[must_use]
    pub fn world_to_grid(&self, position: Vec3Fixed) -> Option<GridCoord> {
        let column = position.x.checked_div(self.tile_size)?.floor();
        let row = position.z.checked_div(self.tile_size)?.floor();
        let cell = GridCoord::new(column.to_num::<i32>(), row.to_num::<i32>());
        self.in_bounds(cell).then_some(cell)
    }

    /// Whether a row belongs to the player's placement zone (`gy < H/2`).
    #[must_use]
    pub const fn is_on_player_side(&self, gy: i32) -> bool {
        gy < self.height / 2
    }

    /// Iterate every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = GridCoord> {
        let (width, height) = (self.width, self.height);
        (0..height).flat_map(move |y| (0..width).map(move |x| GridCoord::new(x, y)))
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(DEFAULT_BOARD_WIDTH, DEFAULT_BOARD_HEIGHT, Fixed::ONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_to_world_tile_center() {
        let board = Board::default();
        let world = board.grid_to_world(GridCoord::new(3, 2));
        assert_eq!(
            world,
            Vec3Fixed::new(Fixed::from_num(3.5), Fixed::ZERO, Fixed::from_num(2.5))
        );
    }

    #[test]
    fn test_world_to_grid_roundtrip_all_cells() {
        let board = Board::default();
        for cell in board.cells() {
            assert_eq!(board.world_to_grid(board.grid_to_world(cell)), Some(cell));
        }
    }

    #[test]
    fn test_world_to_grid_out_of_bounds() {
        let board = Board::default();
        let negative = Vec3Fixed::new(Fixed::from_num(-0.5), Fixed::ZERO, Fixed::from_num(1));
        assert_eq!(board.world_to_grid(negative), None);

        let beyond = Vec3Fixed::new(Fixed::from_num(2), Fixed::ZERO, Fixed::from_num(8));
        assert_eq!(board.world_to_grid(beyond), None);
    }

    #[test]
    fn test_scaled_tiles() {
        let board = Board::new(4, 4, Fixed::from_num(2));
        let world = board.grid_to_world(GridCoord::new(1, 0));
        assert_eq!(world.x, Fixed::from_num(3));
        assert_eq!(world.z, Fixed::from_num(1));
        assert_eq!(board.world_to_grid(world), Some(GridCoord::new(1, 0)));
    }

    #[test]
    fn test_world_to_grid_far_position_with_small_tiles() {
        let board = Board::new(8, 8, Fixed::from_num(1.0 / 1024.0));
        let far = Vec3Fixed::new(Fixed::from_num(1_000_000), Fixed::ZERO, Fixed::from_num(-1_000_000));
        assert_eq!(board.world_to_grid(far), None);
    }

    #[test]
    fn test_world_to_grid_zero_tile_is_off_board() {
        let board = Board::new(8, 8, Fixed::ZERO);
        let point = Vec3Fixed::new(Fixed::ONE, Fixed::ZERO, Fixed::ONE);
        assert_eq!(board.world_to_grid(point), None);
    }

    #[test]
    fn test_player_side_split() {
        let board = Board::default();
        assert!(board.is_on_player_side(0));
        assert!(board.is_on_player_side(3));
        assert!(!board.is_on_player_side(4));
        assert!(!board.is_on_player_side(7));
    }

    #[test]
    fn test_cells_count() {
        assert_eq!(Board::default().cells().count(), 64);
    }
}
