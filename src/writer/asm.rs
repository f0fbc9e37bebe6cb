//! Emit the engine tables as KickAssembler source.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::processor::ProcessedProject;
use crate::processor::primes::PrimeTable;

pub fn emit(project: &ProcessedProject, path: &Path) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write(project, &mut out)?;
    out.flush()
}

/// `.byte` line of `$xx` values.
fn byte_line(values: impl IntoIterator<Item = u8>) -> String {
    let items: Vec<String> = values.into_iter().map(|v| format!("${v:02x}")).collect();
    format!(".byte {}", items.join(", "))
}

pub fn write<W: Write>(project: &ProcessedProject, w: &mut W) -> io::Result<()> {
    write_header(project, w)?;
    write_chars(project, w)?;
    write_vir_chars(project, w)?;
    write_tiles(project, w)?;
    write_vir_tiles(project, w)?;
    write_map(project, w)
}

fn write_header<W: Write>(project: &ProcessedProject, w: &mut W) -> io::Result<()> {
    let catalog = &project.catalog;
    let sym = &project.symmetry;
    let validation = &project.validation;

    writeln!(w, "//\n// Auto-generated by CTMConverter tool.\n//\n")?;
    writeln!(w, "// Max number of color shifts = {}", validation.max_color_shifts)?;
    writeln!(w, "// Max number of active physical chars = {}", validation.max_physical_chars)?;
    writeln!(w, "// Number of chars = {}", catalog.chars.len())?;
    writeln!(w, "// Number of vir chars = {}", catalog.vir_chars.len())?;
    writeln!(w, "// Number of vir chars' = {}", project.vir_char_primes.num_primes())?;
    writeln!(w, "// Number of tiles = {}", catalog.tiles.len())?;
    writeln!(w, "// Number of vir tiles = {}", catalog.vir_tiles.len())?;
    writeln!(w, "// Number of vir tiles' = {}", project.vir_tile_primes.num_primes())?;
    writeln!(
        w,
        "// X symmetry (hires) char range = [{}, {})",
        sym.x_hires_start, sym.x_hires_end
    )?;
    writeln!(w, "// X symmetry char range = [{}, {})", sym.x_start, sym.x_end)?;
    writeln!(w, "// Y symmetry end char = {}", sym.y_end)?;

    writeln!(w, "\n.filenamespace CharTileMap\n")?;

    writeln!(w, ".label kMaxPhysicalChars = {}", validation.max_physical_chars)?;
    writeln!(w, ".label kMaxColorShifts = {}", validation.max_color_shifts)?;
    writeln!(w, ".label kCharSymmetryXHiresStart = ${:02x}", sym.x_hires_start)?;
    writeln!(w, ".label kCharSymmetryXHiresEnd = ${:02x}", sym.x_hires_end)?;
    writeln!(w, ".label kCharSymmetryXStart = ${:02x}", sym.x_start)?;
    writeln!(w, ".label kCharSymmetryXEnd = ${:02x}", sym.x_end)?;
    writeln!(w, ".label kCharSymmetryYEnd = ${:02x}", sym.y_end)?;
    writeln!(w, ".label kCharSymmetryEnd = ${:02x}", sym.end())?;
    writeln!(w, ".label kTileSize = {}", project.tile_width)?;
    writeln!(w, ".label kTileMapWidth = {}", catalog.map.width())?;
    writeln!(w, ".label kTileMapHeight = {}", catalog.map.height())?;
    writeln!(w, ".label kBackgroundColor = ${:02x}", project.colors[0])?;
    writeln!(w, ".label kMulticolor1 = ${:02x}", project.colors[1])?;
    writeln!(w, ".label kMulticolor2 = ${:02x}", project.colors[2])?;

    writeln!(w, "\n.align 8\n")
}

fn write_chars<W: Write>(project: &ProcessedProject, w: &mut W) -> io::Result<()> {
    let chars = &project.catalog.chars;

    writeln!(w, "CharData:")?;
    for (i, c) in chars.iter().enumerate() {
        writeln!(w, "{} // ${:03x}", byte_line(c.data().iter().copied()), i)?;
    }
    writeln!(w)?;

    // one bit per char, LSB first
    let y_end = project.symmetry.y_end as usize;
    writeln!(w, "CharDataSymmetricY:")?;
    for (block, group) in chars[..y_end].chunks(8).enumerate() {
        let bits = group
            .iter()
            .enumerate()
            .filter(|(_, c)| c.symmetry().y)
            .fold(0u8, |acc, (bit, _)| acc | 1 << bit);
        let first = block * 8;
        writeln!(w, ".byte %{:08b} // ${:03x} - ${:03x}", bits, first, first + 7)?;
    }
    writeln!(w)
}

fn write_vir_chars<W: Write>(project: &ProcessedProject, w: &mut W) -> io::Result<()> {
    let catalog = &project.catalog;

    writeln!(w, "VirCharData:")?;
    for (prime, &v) in project.vir_char_primes.prime_to_virtual.iter().enumerate() {
        let bits = catalog.vir_chars[v].char_bits_with_color(&catalog.chars);
        writeln!(w, ".word ${:04x} // ${:03x} (${:03x})", bits, prime, v)?;
    }
    writeln!(w)
}

/// Offset byte for `virtual_index` inside `group`. Groups are built from the
/// same data they are looked up with, so a miss is a broken catalog.
fn offset(table: &PrimeTable, group: usize, virtual_index: usize) -> io::Result<u8> {
    table.offset(group, virtual_index).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("group {group} has no prime for {virtual_index}"),
        )
    })
}

fn write_tiles<W: Write>(project: &ProcessedProject, w: &mut W) -> io::Result<()> {
    let catalog = &project.catalog;
    let table = &project.vir_char_primes;

    writeln!(w, "TileData:")?;
    for (t, tile) in catalog.tiles.iter().enumerate() {
        // column by column, top to bottom
        for col in 0..tile.width() {
            let offsets = (0..tile.height())
                .map(|row| {
                    let bits = tile.cell(row, col).char_bits_with_color(&catalog.chars);
                    offset(table, t, catalog.vir_char_lookup[&bits])
                })
                .collect::<io::Result<Vec<u8>>>()?;
            if col == 0 {
                writeln!(w, "{} // ${:03x}", byte_line(offsets), t)?;
            } else {
                writeln!(w, "{}", byte_line(offsets))?;
            }
        }
        writeln!(w, "{}", byte_line([table.base_byte(t)]))?;
    }
    writeln!(w)
}

fn write_vir_tiles<W: Write>(project: &ProcessedProject, w: &mut W) -> io::Result<()> {
    writeln!(w, "VirTileData:")?;
    for (prime, &v) in project.vir_tile_primes.prime_to_virtual.iter().enumerate() {
        let bits = project.catalog.vir_tiles[v].bits();
        writeln!(w, ".word ${:04x} // ${:03x}", bits, prime)?;
    }
    writeln!(w)
}

fn write_map<W: Write>(project: &ProcessedProject, w: &mut W) -> io::Result<()> {
    let map = &project.catalog.map;
    let table = &project.vir_tile_primes;

    writeln!(w, "TileMapData:")?;
    for col in 0..map.width() {
        let mut bytes = map
            .column(col)
            .map(|v| offset(table, col, v))
            .collect::<io::Result<Vec<u8>>>()?;
        bytes.push(table.base_byte(col));
        writeln!(w, "{} // ${:03x}", byte_line(bytes), col)?;
    }
    Ok(())
}
