//! Write a project back out in the binary project format.

use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::model::{BLOCK_ID_BASE, BLOCK_MARKER, ColorMethod, Project, SIGNATURE};

/// Inverse of [`crate::parser::decode_count`] for real (non-empty) counts.
pub fn encode_count(count: usize) -> io::Result<i16> {
    if count == 0 || count > 1 << 15 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("count {count} cannot be stored"),
        ));
    }
    Ok((count - 1) as i16)
}

pub fn write<W: Write>(project: &Project, w: &mut W) -> io::Result<()> {
    w.write_all(SIGNATURE)?;
    w.write_u8(project.version)?;
    w.write_all(&project.colors)?;
    w.write_u8(project.color_method.into())?;
    w.write_u8(project.screen_mode.into())?;
    w.write_u8(project.flags)?;

    let mut blocks = Blocks { next: 0 };

    blocks.marker(w)?;
    w.write_i16::<LittleEndian>(encode_count(project.num_chars())?)?;
    for data in &project.chars {
        w.write_all(data)?;
    }

    blocks.marker(w)?;
    w.write_all(&project.char_attributes)?;

    if project.has_tile_system() {
        blocks.marker(w)?;
        w.write_i16::<LittleEndian>(encode_count(project.num_tiles())?)?;
        w.write_u8(project.tile_width)?;
        w.write_u8(project.tile_height)?;
        write_u16s(w, &project.tile_data)?;

        if project.color_method == ColorMethod::PerTile {
            blocks.marker(w)?;
            let colors = project.tile_colors.as_deref().unwrap_or_default();
            w.write_all(colors)?;
        }

        blocks.marker(w)?;
        w.write_all(&project.tile_tags)?;

        blocks.marker(w)?;
        for name in &project.tile_names {
            w.write_all(name.as_bytes())?;
            w.write_u8(0)?;
        }
    }

    blocks.marker(w)?;
    w.write_u16::<LittleEndian>(project.map_width)?;
    w.write_u16::<LittleEndian>(project.map_height)?;
    write_u16s(w, &project.map_data)
}

struct Blocks {
    next: u8,
}

impl Blocks {
    fn marker<W: Write>(&mut self, w: &mut W) -> io::Result<()> {
        w.write_all(&[BLOCK_MARKER, BLOCK_ID_BASE + self.next])?;
        self.next += 1;
        Ok(())
    }
}

fn write_u16s<W: Write>(w: &mut W, values: &[u16]) -> io::Result<()> {
    for &v in values {
        w.write_u16::<LittleEndian>(v)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::decode_count;

    #[test]
    fn encode_count_inverts_decode() {
        for count in [1usize, 2, 256, 1024, 32768] {
            let stored = encode_count(count).unwrap();
            assert_eq!(decode_count(stored), count as i32);
        }
        assert!(encode_count(0).is_err());
        assert!(encode_count(32769).is_err());
    }
}
