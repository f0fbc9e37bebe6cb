//! Tiles: grids of virtual characters, and the canonicalizer that folds
//! duplicate and mirrored tiles onto one catalog entry.

use crate::model::Project;
use crate::processor::Catalog;
use crate::processor::vir_char::VirChar;
use crate::processor::vir_tile::VirTile;

/// `width × height` virtual characters, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    width: usize,
    height: usize,
    cells: Vec<VirChar>,
}

impl Tile {
    /// Copy the virtual characters named by `slots` (row-major) into a new tile.
    pub fn from_slots(width: usize, height: usize, slots: &[u16], vir_chars: &[VirChar]) -> Self {
        debug_assert_eq!(slots.len(), width * height);
        Tile {
            width,
            height,
            cells: slots.iter().map(|&s| vir_chars[s as usize]).collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell(&self, row: usize, col: usize) -> &VirChar {
        &self.cells[row * self.width + col]
    }

    /// Row-major iteration over the cells.
    pub fn cells(&self) -> impl Iterator<Item = &VirChar> {
        self.cells.iter()
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut VirChar> {
        self.cells.iter_mut()
    }

    /// Every cell equivalent to the cell at the same position in `other`.
    pub fn is_equivalent(&self, other: &Tile) -> bool {
        self.width == other.width
            && self.height == other.height
            && self
                .cells
                .iter()
                .zip(&other.cells)
                .all(|(a, b)| a.is_equivalent(b))
    }
}

/// A tile under trial flips. Kept apart from catalog tiles so a comparison
/// never sees half-flipped catalog state.
#[derive(Debug, Clone)]
pub struct ScratchTile {
    grid: Tile,
}

impl ScratchTile {
    pub fn new(grid: Tile) -> Self {
        ScratchTile { grid }
    }

    /// Swap rows top to bottom and toggle every cell's y flip.
    pub fn flip_y(&mut self) {
        let (w, h) = (self.grid.width, self.grid.height);
        for row in 0..h / 2 {
            for col in 0..w {
                self.grid.cells.swap(row * w + col, (h - 1 - row) * w + col);
            }
        }
        for cell in self.grid.cells.iter_mut() {
            cell.flip_y = !cell.flip_y;
        }
    }

    /// Swap columns left to right and toggle every cell's x flip.
    pub fn flip_x(&mut self) {
        let w = self.grid.width;
        for row in self.grid.cells.chunks_mut(w.max(1)) {
            row.reverse();
        }
        for cell in self.grid.cells.iter_mut() {
            cell.flip_x = !cell.flip_x;
        }
    }

    /// First catalog tile equivalent to the scratch grid in its current state.
    pub fn find_in(&self, tiles: &[Tile]) -> Option<usize> {
        tiles.iter().position(|t| t.is_equivalent(&self.grid))
    }
}

/// Build the unique tile catalog and one virtual tile per source tile.
///
/// Uses the same match order as characters: as is, flipped in y, flipped
/// in y and x, flipped in x only, else insert the unflipped tile.
pub fn canonicalize(project: &Project, catalog: &mut Catalog) {
    let (w, h) = (project.tile_width as usize, project.tile_height as usize);
    catalog.tiles.clear();
    catalog.vir_tiles.clear();

    for index in 0..project.num_tiles() {
        let slots = project.tile(index);
        let mut scratch = ScratchTile::new(Tile::from_slots(w, h, slots, &catalog.vir_chars));

        let mut found = scratch.find_in(&catalog.tiles).map(|i| (i, false, false));
        if found.is_none() {
            scratch.flip_y();
            found = scratch.find_in(&catalog.tiles).map(|i| (i, false, true));
        }
        if found.is_none() {
            scratch.flip_x();
            found = scratch.find_in(&catalog.tiles).map(|i| (i, true, true));
        }
        if found.is_none() {
            scratch.flip_y();
            found = scratch.find_in(&catalog.tiles).map(|i| (i, true, false));
        }

        let (tile_index, flip_x, flip_y) = found.unwrap_or_else(|| {
            catalog
                .tiles
                .push(Tile::from_slots(w, h, slots, &catalog.vir_chars));
            (catalog.tiles.len() - 1, false, false)
        });

        catalog.vir_tiles.push(VirTile::new(tile_index, flip_x, flip_y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::project;
    use crate::processor::chars;

    const A: [u8; 8] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80];
    const B: [u8; 8] = [0xc0, 0x30, 0, 0, 0, 0, 0, 0x01];

    fn catalog_for(p: &Project) -> Catalog {
        let mut catalog = Catalog::default();
        chars::canonicalize(p, &mut catalog);
        canonicalize(p, &mut catalog);
        catalog
    }

    #[test]
    fn flip_y_swaps_rows_and_toggles_flags() {
        let p = project(vec![A, B], (1, 3), vec![0, 1, 1], (1, 1), vec![0]);
        let catalog = catalog_for(&p);
        let mut scratch = ScratchTile::new(catalog.tiles[0].clone());
        scratch.flip_y();

        let grid = &scratch.grid;
        assert_eq!(grid.cell(0, 0).char_index, 1);
        assert_eq!(grid.cell(2, 0).char_index, 0);
        assert!(grid.cells().all(|c| c.flip_y), "middle row toggled too");
    }

    #[test]
    fn mirrored_tile_becomes_flipped_vir_tile() {
        // tile 1 swaps the cells of tile 0 but only mirrors the B cell
        let p = project(
            vec![A, B, B.map(chars::flip_byte_multicolor)],
            (2, 1),
            vec![0, 1, 2, 0],
            (2, 1),
            vec![0, 1],
        );
        let catalog = catalog_for(&p);

        assert_eq!(catalog.tiles.len(), 2);

        // mirroring both cells makes it an exact x flip of tile 0
        let p = project(
            vec![A, B, B.map(chars::flip_byte_multicolor), A.map(chars::flip_byte_multicolor)],
            (2, 1),
            vec![0, 1, 2, 3],
            (2, 1),
            vec![0, 1],
        );
        let catalog = catalog_for(&p);
        assert_eq!(catalog.tiles.len(), 1);
        assert_eq!(catalog.vir_tiles[1], VirTile::new(0, true, false));
    }

    fn mirror_y(data: [u8; 8]) -> [u8; 8] {
        let mut out = data;
        out.reverse();
        out
    }

    fn mirror_xy(data: [u8; 8]) -> [u8; 8] {
        mirror_y(data.map(chars::flip_byte_multicolor))
    }

    #[test]
    fn vertically_mirrored_tile_matches_on_flip_y() {
        // 1×2 tile [A / B], then [B' / A'] with both cells mirrored vertically
        let p = project(
            vec![A, B, mirror_y(B), mirror_y(A)],
            (1, 2),
            vec![0, 1, 2, 3],
            (2, 1),
            vec![0, 1],
        );
        let catalog = catalog_for(&p);

        assert_eq!(catalog.tiles.len(), 1);
        assert_eq!(catalog.vir_tiles[1], VirTile::new(0, false, true));
    }

    #[test]
    fn rotated_tile_matches_on_flip_y_then_x() {
        const C: [u8; 8] = [0x01, 0x02, 0, 0, 0, 0, 0, 0];
        const D: [u8; 8] = [0, 0, 0, 0x10, 0, 0, 0, 0x20];
        // [A B / C D] turned half way round, every cell mirrored both ways
        let p = project(
            vec![A, B, C, D, mirror_xy(D), mirror_xy(C), mirror_xy(B), mirror_xy(A)],
            (2, 2),
            vec![0, 1, 2, 3, 4, 5, 6, 7],
            (2, 1),
            vec![0, 1],
        );
        let catalog = catalog_for(&p);

        assert_eq!(catalog.chars.len(), 4);
        assert_eq!(catalog.tiles.len(), 1);
        assert_eq!(catalog.vir_tiles[1], VirTile::new(0, true, true));
    }

    #[test]
    fn catalog_tiles_are_pairwise_distinct() {
        let p = project(
            vec![A, B, [0; 8]],
            (2, 2),
            vec![
                0, 1, 2, 2, //
                0, 1, 2, 2, //
                2, 2, 0, 1, //
                1, 0, 2, 2,
            ],
            (2, 2),
            vec![0, 1, 2, 3],
        );
        let catalog = catalog_for(&p);

        assert_eq!(catalog.vir_tiles.len(), 4);
        for (i, a) in catalog.tiles.iter().enumerate() {
            for b in &catalog.tiles[i + 1..] {
                assert!(!a.is_equivalent(b));
            }
        }
        assert_eq!(catalog.vir_tiles[1], VirTile::new(0, false, false));
    }

    #[test]
    fn new_tiles_are_stored_unflipped() {
        let p = project(vec![A, B], (2, 1), vec![0, 1, 1, 1], (1, 1), vec![0]);
        let catalog = catalog_for(&p);
        assert_eq!(catalog.tiles.len(), 2);
        assert!(
            catalog
                .tiles
                .iter()
                .flat_map(|t| t.cells())
                .all(|c| !c.flip_x && !c.flip_y)
        );
    }
}
