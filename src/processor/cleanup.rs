//! Drop duplicate and unreachable catalog entries, renumbering every
//! dependent index as we go.

use tracing::debug;

use crate::error::ConvertError;
use crate::processor::vir_tile::VirTile;
use crate::processor::{Catalog, MAX_CHARS, MAX_TILES, MAX_VIR_TILES};

/// Remap entry for a removed, unreferenced slot.
pub const REMOVED: usize = usize::MAX;

/// Keep `items[i]` where `used[i]`, preserving order.
/// Returns the survivors and the old→new index table.
pub fn retain_used<T>(items: Vec<T>, used: &[bool]) -> (Vec<T>, Vec<usize>) {
    let mut old_to_new = vec![REMOVED; items.len()];
    let mut kept = Vec::with_capacity(items.len());
    for (old, item) in items.into_iter().enumerate() {
        if used[old] {
            old_to_new[old] = kept.len();
            kept.push(item);
        }
    }
    (kept, old_to_new)
}

fn dedup_vir_tiles(catalog: &mut Catalog) {
    let mut kept: Vec<VirTile> = Vec::with_capacity(catalog.vir_tiles.len());
    let old_to_new: Vec<usize> = catalog
        .vir_tiles
        .iter()
        .map(|vt| {
            kept.iter().position(|k| k == vt).unwrap_or_else(|| {
                kept.push(*vt);
                kept.len() - 1
            })
        })
        .collect();

    debug!("Duplicate vir tiles removed: {}", catalog.vir_tiles.len() - kept.len());
    catalog.vir_tiles = kept;
    catalog.map.remap(&old_to_new);
}

fn remove_unused_vir_tiles(catalog: &mut Catalog) {
    let mut used = vec![false; catalog.vir_tiles.len()];
    for &v in catalog.map.cells() {
        used[v] = true;
    }

    let (kept, old_to_new) = retain_used(std::mem::take(&mut catalog.vir_tiles), &used);
    catalog.vir_tiles = kept;
    catalog.map.remap(&old_to_new);
}

fn remove_unused_tiles(catalog: &mut Catalog) {
    let mut used = vec![false; catalog.tiles.len()];
    for vt in &catalog.vir_tiles {
        used[vt.tile_index] = true;
    }

    let (kept, old_to_new) = retain_used(std::mem::take(&mut catalog.tiles), &used);
    catalog.tiles = kept;
    for vt in catalog.vir_tiles.iter_mut() {
        vt.tile_index = old_to_new[vt.tile_index];
    }
}

fn remove_unused_chars(catalog: &mut Catalog) {
    let mut used = vec![false; catalog.chars.len()];
    for cell in catalog.tiles.iter().flat_map(|t| t.cells()) {
        used[cell.char_index] = true;
    }

    let (kept, old_to_new) = retain_used(std::mem::take(&mut catalog.chars), &used);
    catalog.chars = kept;
    for cell in catalog.tiles.iter_mut().flat_map(|t| t.cells_mut()) {
        cell.char_index = old_to_new[cell.char_index];
    }
}

/// Run the four cleanup steps in order. Afterwards every character, tile
/// and virtual tile is reachable from the map.
///
/// The source virtual characters are left alone; the reorder pass rebuilds
/// them from the tiles.
pub fn run(catalog: &mut Catalog) -> Result<(), ConvertError> {
    dedup_vir_tiles(catalog);
    remove_unused_vir_tiles(catalog);
    ConvertError::check_limit("vir tiles", catalog.vir_tiles.len(), MAX_VIR_TILES)?;

    remove_unused_tiles(catalog);
    ConvertError::check_limit("tiles", catalog.tiles.len(), MAX_TILES)?;

    remove_unused_chars(catalog);
    ConvertError::check_limit("chars", catalog.chars.len(), MAX_CHARS)?;

    debug!(
        "After cleanup: {} chars, {} tiles, {} vir tiles",
        catalog.chars.len(),
        catalog.tiles.len(),
        catalog.vir_tiles.len()
    );
    Ok(())
}
