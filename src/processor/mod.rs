//! The conversion pipeline.
//!
//! Characters and tiles are folded into catalogs under mirror symmetry,
//! unreachable entries dropped, everything renumbered for the decoder, and
//! finally primes allocated so each tile and map column can be addressed
//! through one base and byte offsets.
pub mod chars;
pub mod cleanup;
pub mod map;
pub mod primes;
pub mod reorder;
pub mod tiles;
pub mod validate;
pub mod vir_char;
pub mod vir_tile;

use std::collections::HashMap;

use tracing::info;

use crate::error::ConvertError;
use crate::model::{COLOR_TABLE_LEN, Project};
use chars::Char;
use map::TileMap;
use primes::PrimeTable;
use reorder::SymmetryRanges;
use tiles::Tile;
use validate::ValidationReport;
use vir_char::VirChar;
use vir_tile::VirTile;

/// Visible screen width in characters.
pub const SCREEN_WIDTH: usize = 40;

/// Bits 0..10 of a table word hold the index.
pub const MAX_INDEX_BITS: u32 = 10;
pub const FLIP_X_BIT: u16 = 1 << MAX_INDEX_BITS;
pub const FLIP_Y_BIT: u16 = 1 << (MAX_INDEX_BITS + 1);
/// Only in validator keys, where the colour is not part of the word.
pub const FLIP_X_HIRES_BIT: u16 = 1 << (MAX_INDEX_BITS + 2);
pub const COLOR_SHIFT: u32 = MAX_INDEX_BITS + 2;

pub const MAX_CHARS: usize = 1 << MAX_INDEX_BITS;
pub const MAX_TILES: usize = 1 << MAX_INDEX_BITS;
pub const MAX_VIR_CHARS: usize = 16 * 256;
pub const MAX_VIR_TILES: usize = 16 * 256;
pub const MAX_SYMMETRY_BOUND: usize = 255;

/// Per-screen budgets checked by the validator.
pub const MAX_PHYSICAL_CHARS: usize = 256;
pub const MAX_COLOR_SHIFTS: usize = 256;

/// Colours 0..8 draw in high resolution, 8..16 in multicolour.
pub fn is_hires_color(color: u8) -> bool {
    color < 8
}

/// Everything the stages build up and rewrite.
#[derive(Debug, Default)]
pub struct Catalog {
    pub chars: Vec<Char>,
    pub vir_chars: Vec<VirChar>,
    pub tiles: Vec<Tile>,
    pub vir_tiles: Vec<VirTile>,
    pub map: TileMap,
    /// `char_bits_with_color` → virtual character index.
    pub vir_char_lookup: HashMap<u16, usize>,
}

/// Read-only result handed to the writers.
#[derive(Debug)]
pub struct ProcessedProject {
    pub catalog: Catalog,
    pub symmetry: SymmetryRanges,
    pub vir_char_primes: PrimeTable,
    pub vir_tile_primes: PrimeTable,
    pub validation: ValidationReport,
    pub colors: [u8; COLOR_TABLE_LEN],
    pub tile_width: usize,
    pub tile_height: usize,
}

/// Runs every processing pass and returns a read-only structure for writers.
pub fn run(project: &Project) -> Result<ProcessedProject, ConvertError> {
    let (tile_width, tile_height) = (project.tile_width as usize, project.tile_height as usize);
    let mut catalog = Catalog::default();

    chars::canonicalize(project, &mut catalog);
    info!(
        "Chars: {} -> {} unique",
        project.num_chars(),
        catalog.chars.len()
    );

    tiles::canonicalize(project, &mut catalog);
    info!(
        "Tiles: {} -> {} unique",
        project.num_tiles(),
        catalog.tiles.len()
    );

    catalog.map = map::build(project);
    cleanup::run(&mut catalog)?;
    let symmetry = reorder::run(&mut catalog)?;
    info!(
        "Catalog: {} chars, {} vir chars, {} tiles, {} vir tiles",
        catalog.chars.len(),
        catalog.vir_chars.len(),
        catalog.tiles.len(),
        catalog.vir_tiles.len()
    );

    let vir_char_primes = primes::allocate_vir_char_primes(&catalog)?;
    let vir_tile_primes = primes::allocate_vir_tile_primes(&catalog)?;
    info!(
        "Primes: {} vir chars', {} vir tiles'",
        vir_char_primes.num_primes(),
        vir_tile_primes.num_primes()
    );

    let validation = validate::run(&catalog, tile_width, tile_height);
    info!(
        "Max physical chars {}, max color shifts {}",
        validation.max_physical_chars, validation.max_color_shifts
    );

    Ok(ProcessedProject {
        catalog,
        symmetry,
        vir_char_primes,
        vir_tile_primes,
        validation,
        colors: project.colors,
        tile_width,
        tile_height,
    })
}
