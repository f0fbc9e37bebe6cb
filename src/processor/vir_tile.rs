use crate::processor::{FLIP_X_BIT, FLIP_Y_BIT};

/// One placement of a canonical tile with its flip state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VirTile {
    pub tile_index: usize,
    pub flip_x: bool,
    pub flip_y: bool,
}

impl VirTile {
    pub fn new(tile_index: usize, flip_x: bool, flip_y: bool) -> Self {
        VirTile {
            tile_index,
            flip_x,
            flip_y,
        }
    }

    /// Tile index with the flip bits; also the output word.
    pub fn bits(&self) -> u16 {
        let mut bits = self.tile_index as u16;
        if self.flip_x {
            bits |= FLIP_X_BIT;
        }
        if self.flip_y {
            bits |= FLIP_Y_BIT;
        }
        bits
    }
}
