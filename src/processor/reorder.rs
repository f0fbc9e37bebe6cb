//! Renumber characters, virtual characters and virtual tiles so that
//! symmetric characters form contiguous ranges and virtual entities are
//! numbered in order of first use.

use serde::Serialize;
use tracing::debug;

use crate::error::ConvertError;
use crate::processor::chars::Char;
use crate::processor::{Catalog, MAX_SYMMETRY_BOUND, MAX_VIR_CHARS};

/// Character index ranges by symmetry, valid after [`sort_chars_by_symmetry`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SymmetryRanges {
    /// `[x_hires_start, x_hires_end)` are symmetric under bit reversal.
    pub x_hires_start: u8,
    pub x_hires_end: u8,
    /// `[x_start, x_end)` are symmetric under bit-pair reversal.
    pub x_start: u8,
    pub x_end: u8,
    /// No character at or above this index is vertically symmetric.
    pub y_end: u8,
}

impl SymmetryRanges {
    /// Exclusive upper bound of every symmetry range.
    pub fn end(&self) -> u8 {
        self.x_hires_end.max(self.x_end).max(self.y_end)
    }
}

/// Sort key: hires-x symmetric first (hires-only before hires+multicolour),
/// then multicolour-x symmetric, then the rest; y symmetric first within
/// each class; otherwise original order.
fn symmetry_rank(c: &Char) -> (bool, bool, bool) {
    let s = c.symmetry();
    (!s.x_hires, if s.x_hires { s.x } else { !s.x }, !s.y)
}

fn bound(what: &'static str, value: usize) -> Result<u8, ConvertError> {
    ConvertError::check_limit(what, value, MAX_SYMMETRY_BOUND)?;
    Ok(value as u8)
}

fn find_ranges(chars: &[Char]) -> Result<SymmetryRanges, ConvertError> {
    let x_hires_end = chars
        .iter()
        .take_while(|c| c.symmetry().x_hires)
        .count();

    // multicolour symmetric chars sit at the tail of the hires block and
    // run on past it
    let prefix: Vec<bool> = chars
        .iter()
        .map(|c| c.symmetry())
        .take_while(|s| s.x || s.x_hires)
        .map(|s| s.x)
        .collect();
    let x_start = prefix.iter().position(|&x| x).unwrap_or(0);
    let x_count = prefix.iter().filter(|&&x| x).count();

    let y_end = chars
        .iter()
        .rposition(|c| c.symmetry().y)
        .map_or(0, |i| i + 1);

    Ok(SymmetryRanges {
        x_hires_start: 0,
        x_hires_end: bound("hires x symmetric chars", x_hires_end)?,
        x_start: bound("x symmetric chars", x_start)?,
        x_end: bound("x symmetric chars", x_start + x_count)?,
        y_end: bound("y symmetric chars", y_end)?,
    })
}

/// Stable sort of the characters by symmetry class; tile cells follow.
pub fn sort_chars_by_symmetry(catalog: &mut Catalog) -> Result<SymmetryRanges, ConvertError> {
    let mut order: Vec<usize> = (0..catalog.chars.len()).collect();
    order.sort_by_key(|&i| symmetry_rank(&catalog.chars[i]));

    let mut old_to_new = vec![0; order.len()];
    for (new, &old) in order.iter().enumerate() {
        old_to_new[old] = new;
    }
    catalog.chars = order.iter().map(|&old| catalog.chars[old].clone()).collect();

    for cell in catalog.tiles.iter_mut().flat_map(|t| t.cells_mut()) {
        cell.char_index = old_to_new[cell.char_index];
    }

    let ranges = find_ranges(&catalog.chars)?;
    debug!("Symmetry ranges: {:?}", ranges);
    Ok(ranges)
}

/// Rebuild the virtual characters from the tiles, first occurrence first,
/// keyed by their bit encoding.
pub fn relinearize_vir_chars(catalog: &mut Catalog) -> Result<(), ConvertError> {
    catalog.vir_chars.clear();
    catalog.vir_char_lookup.clear();

    for cell in catalog.tiles.iter().flat_map(|t| t.cells()) {
        let bits = cell.char_bits_with_color(&catalog.chars);
        if !catalog.vir_char_lookup.contains_key(&bits) {
            catalog.vir_char_lookup.insert(bits, catalog.vir_chars.len());
            catalog.vir_chars.push(*cell);
        }
    }

    ConvertError::check_limit("vir chars", catalog.vir_chars.len(), MAX_VIR_CHARS)
}

/// Renumber virtual tiles by first occurrence walking the map column by
/// column, top to bottom.
pub fn relinearize_vir_tiles(catalog: &mut Catalog) {
    const UNSEEN: usize = usize::MAX;
    let mut old_to_new = vec![UNSEEN; catalog.vir_tiles.len()];
    let mut vir_tiles = Vec::with_capacity(catalog.vir_tiles.len());

    for col in 0..catalog.map.width() {
        for old in catalog.map.column(col) {
            if old_to_new[old] == UNSEEN {
                old_to_new[old] = vir_tiles.len();
                vir_tiles.push(catalog.vir_tiles[old]);
            }
        }
    }

    catalog.vir_tiles = vir_tiles;
    catalog.map.remap(&old_to_new);
}

/// Symmetry sort, then virtual character and virtual tile renumbering.
pub fn run(catalog: &mut Catalog) -> Result<SymmetryRanges, ConvertError> {
    let ranges = sort_chars_by_symmetry(catalog)?;
    relinearize_vir_chars(catalog)?;
    relinearize_vir_tiles(catalog);
    Ok(ranges)
}
