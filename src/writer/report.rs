//! Conversion statistics as JSON.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::processor::ProcessedProject;
use crate::processor::reorder::SymmetryRanges;
use crate::processor::validate::ValidationReport;

#[derive(Debug, Serialize)]
pub struct Stats<'a> {
    pub chars: usize,
    pub vir_chars: usize,
    pub vir_char_primes: usize,
    pub tiles: usize,
    pub vir_tiles: usize,
    pub vir_tile_primes: usize,
    pub map_width: usize,
    pub map_height: usize,
    pub symmetry: SymmetryRanges,
    pub validation: &'a ValidationReport,
}

impl<'a> Stats<'a> {
    pub fn of(project: &'a ProcessedProject) -> Self {
        let catalog = &project.catalog;
        Stats {
            chars: catalog.chars.len(),
            vir_chars: catalog.vir_chars.len(),
            vir_char_primes: project.vir_char_primes.num_primes(),
            tiles: catalog.tiles.len(),
            vir_tiles: catalog.vir_tiles.len(),
            vir_tile_primes: project.vir_tile_primes.num_primes(),
            map_width: catalog.map.width(),
            map_height: catalog.map.height(),
            symmetry: project.symmetry,
            validation: &project.validation,
        }
    }
}

pub fn write<W: Write>(project: &ProcessedProject, w: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *w, &Stats::of(project))?;
    writeln!(w)
}

pub fn emit(project: &ProcessedProject, path: &Path) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write(project, &mut out)?;
    out.flush()
}
