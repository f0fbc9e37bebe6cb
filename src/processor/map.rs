//! The tile map: a grid of virtual tile indices.

use crate::model::Project;

/// `width × height` virtual tile indices, row-major.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileMap {
    width: usize,
    height: usize,
    cells: Vec<usize>,
}

impl TileMap {
    pub fn new(width: usize, height: usize, cells: Vec<usize>) -> Self {
        debug_assert_eq!(cells.len(), width * height, "map cell count");
        TileMap {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, row: usize, col: usize) -> usize {
        self.cells[row * self.width + col]
    }

    /// All cells, row-major.
    pub fn cells(&self) -> &[usize] {
        &self.cells
    }

    /// Cells of column `col`, top to bottom.
    pub fn column(&self, col: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.height).map(move |row| self.get(row, col))
    }

    /// Replace every cell `v` with `old_to_new[v]`.
    pub fn remap(&mut self, old_to_new: &[usize]) {
        for cell in self.cells.iter_mut() {
            *cell = old_to_new[*cell];
        }
    }
}

/// Reshape the linear map data into the 2D grid. No transformation.
pub fn build(project: &Project) -> TileMap {
    TileMap::new(
        project.map_width as usize,
        project.map_height as usize,
        project.map_data.iter().map(|&v| v as usize).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::project;

    #[test]
    fn keeps_row_major_layout() {
        // 3×2 map
        let p = project(vec![[0; 8]], (1, 1), vec![0; 6], (3, 2), vec![0, 1, 2, 3, 4, 5]);
        let map = build(&p);

        assert_eq!((map.width(), map.height()), (3, 2));
        assert_eq!(map.get(0, 2), 2);
        assert_eq!(map.get(1, 0), 3);
        assert_eq!(map.column(1).collect::<Vec<_>>(), vec![1, 4]);
    }

    #[test]
    fn remap_rewrites_every_cell() {
        let mut map = TileMap::new(2, 2, vec![0, 1, 1, 2]);
        map.remap(&[2, 0, 1]);
        assert_eq!(map.cells(), &[2, 0, 0, 1]);
    }
}
