use std::io::{BufRead, Cursor, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use tracing::debug;

use crate::error::LoadError;
use crate::model::{
    CHAR_BYTES, COLOR_TABLE_LEN, CharData, ColorMethod, EXPANDED_DATA_FLAG, Project, SIGNATURE,
    SUPPORTED_VERSION, ScreenMode, TILE_SYSTEM_FLAG,
};

/// Read and parse the project file at `path`.
pub fn load(path: &Path) -> Result<Project, LoadError> {
    let bytes = std::fs::read(path)?;
    debug!("File loaded, size: {} bytes", bytes.len());
    parse(&bytes)
}

/// Decode a stored element count.
///
/// The editor stores `count - 1`, but only non-negative values are
/// incremented; negative values are passed through untouched.
pub fn decode_count(stored: i16) -> i32 {
    let stored = i32::from(stored);
    if stored >= 0 { stored + 1 } else { stored }
}

/// Parse a whole project file held in memory.
///
/// Layout: header, then marker-prefixed blocks (characters, attributes,
/// and when the tile system is enabled tiles, optional tile colours, tags
/// and names), then the map.
pub fn parse(bytes: &[u8]) -> Result<Project, LoadError> {
    let mut r = Cursor::new(bytes);

    let mut signature = [0u8; 3];
    r.read_exact(&mut signature)?;
    if &signature != SIGNATURE {
        return Err(LoadError::BadSignature { found: signature });
    }

    let version = r.read_u8()?;
    if version != SUPPORTED_VERSION {
        return Err(LoadError::UnsupportedVersion {
            found: version,
            expected: SUPPORTED_VERSION,
        });
    }

    let mut colors = [0u8; COLOR_TABLE_LEN];
    r.read_exact(&mut colors)?;
    let color_method = ColorMethod::try_from(r.read_u8()?)?;
    let screen_mode = ScreenMode::try_from(r.read_u8()?)?;
    if screen_mode == ScreenMode::ExtendedColor {
        return Err(LoadError::ExtendedColorMode);
    }
    let flags = r.read_u8()?;
    if flags & EXPANDED_DATA_FLAG != 0 {
        return Err(LoadError::ExpandedData);
    }
    let has_tiles = flags & TILE_SYSTEM_FLAG != 0;

    debug!(
        "Header: version {}, {:?}, {:?}, tile system {}",
        version, color_method, screen_mode, has_tiles
    );

    // ── Characters ───────────────────────────────────────────────────
    skip_marker(&mut r)?;
    let num_chars = read_count(&mut r, "character")?;
    if num_chars == 0 {
        return Err(LoadError::NoCharData);
    }
    let mut chars = Vec::<CharData>::with_capacity(num_chars);
    for _ in 0..num_chars {
        let mut data = [0u8; CHAR_BYTES];
        r.read_exact(&mut data)?;
        chars.push(data);
    }

    skip_marker(&mut r)?;
    let mut char_attributes = vec![0u8; num_chars];
    r.read_exact(&mut char_attributes)?;

    // ── Tiles ────────────────────────────────────────────────────────
    let (tile_width, tile_height, tile_data, tile_colors, tile_tags, tile_names) = if has_tiles {
        skip_marker(&mut r)?;
        let num_tiles = read_count(&mut r, "tile")?;
        let width = r.read_u8()?;
        let height = r.read_u8()?;
        let data = read_u16s(&mut r, num_tiles * width as usize * height as usize)?;

        let colors = if color_method == ColorMethod::PerTile {
            skip_marker(&mut r)?;
            let mut colors = vec![0u8; num_tiles];
            r.read_exact(&mut colors)?;
            Some(colors)
        } else {
            None
        };

        skip_marker(&mut r)?;
        let mut tags = vec![0u8; num_tiles];
        r.read_exact(&mut tags)?;

        skip_marker(&mut r)?;
        let names = (0..num_tiles)
            .map(|index| read_name(&mut r, index))
            .collect::<Result<Vec<_>, _>>()?;

        (width, height, data, colors, tags, names)
    } else {
        // Map cells index characters directly; model each one as a 1×1 tile.
        (1, 1, (0..num_chars as u16).collect(), None, Vec::new(), Vec::new())
    };

    // ── Map ──────────────────────────────────────────────────────────
    skip_marker(&mut r)?;
    let map_width = r.read_u16::<LittleEndian>()?;
    let map_height = r.read_u16::<LittleEndian>()?;
    let map_data = read_u16s(&mut r, map_width as usize * map_height as usize)?;

    let project = Project {
        version,
        colors,
        color_method,
        screen_mode,
        flags,
        chars,
        char_attributes,
        tile_width,
        tile_height,
        tile_data,
        tile_colors,
        tile_tags,
        tile_names,
        map_width,
        map_height,
        map_data,
    };
    check_indices(&project)?;

    debug!(
        "Parsed {} chars, {} tiles ({}x{}), map {}x{}",
        project.num_chars(),
        project.num_tiles(),
        project.tile_width,
        project.tile_height,
        project.map_width,
        project.map_height
    );
    Ok(project)
}

/// Block markers carry a running block id; neither byte is validated.
fn skip_marker<R: Read>(r: &mut R) -> Result<(), LoadError> {
    let mut marker = [0u8; 2];
    r.read_exact(&mut marker)?;
    Ok(())
}

fn read_count<R: Read>(r: &mut R, what: &'static str) -> Result<usize, LoadError> {
    let count = decode_count(r.read_i16::<LittleEndian>()?);
    usize::try_from(count).map_err(|_| LoadError::NegativeCount { what, count })
}

/// Read `len` little-endian words. The length comes from the file, so it is
/// checked against the bytes actually left before anything is allocated.
fn read_u16s(r: &mut Cursor<&[u8]>, len: usize) -> Result<Vec<u16>, LoadError> {
    let remaining = r.get_ref().len() as u64 - r.position().min(r.get_ref().len() as u64);
    if (len as u64).saturating_mul(2) > remaining {
        return Err(LoadError::Io(std::io::ErrorKind::UnexpectedEof.into()));
    }
    let mut values = Vec::with_capacity(len);
    for _ in 0..len {
        values.push(r.read_u16::<LittleEndian>()?);
    }
    Ok(values)
}

fn read_name<R: BufRead>(r: &mut R, index: usize) -> Result<String, LoadError> {
    let mut raw = Vec::new();
    r.read_until(0, &mut raw)?;
    if raw.pop() != Some(0) {
        return Err(LoadError::Io(std::io::ErrorKind::UnexpectedEof.into()));
    }
    if !raw.is_ascii() {
        return Err(LoadError::BadTileName { index });
    }
    String::from_utf8(raw).map_err(|_| LoadError::BadTileName { index })
}

fn check_indices(project: &Project) -> Result<(), LoadError> {
    let num_chars = project.num_chars();
    let tile_size = project.tile_size().max(1);
    if let Some((i, &value)) = project
        .tile_data
        .iter()
        .enumerate()
        .find(|&(_, &c)| c as usize >= num_chars)
    {
        return Err(LoadError::IndexOutOfRange {
            what: "tile",
            index: i / tile_size,
            target: "character",
            value,
            len: num_chars,
        });
    }

    let num_tiles = project.num_tiles();
    if let Some((i, &value)) = project
        .map_data
        .iter()
        .enumerate()
        .find(|&(_, &t)| t as usize >= num_tiles)
    {
        return Err(LoadError::IndexOutOfRange {
            what: "map cell",
            index: i,
            target: "tile",
            value,
            len: num_tiles,
        });
    }
    Ok(())
}
