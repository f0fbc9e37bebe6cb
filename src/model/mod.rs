use crate::error::LoadError;

// file-format constants
pub const SIGNATURE: &[u8; 3] = b"CTM";
pub const SUPPORTED_VERSION: u8 = 7;
pub const COLOR_TABLE_LEN: usize = 6;

pub const BLOCK_MARKER: u8 = 0xda;
pub const BLOCK_ID_BASE: u8 = 0xb0;

pub const TILE_SYSTEM_FLAG: u8 = 1 << 0;
pub const EXPANDED_DATA_FLAG: u8 = 1 << 1;

/// Bytes per character bitmap (one per pixel row).
pub const CHAR_BYTES: usize = 8;

pub type CharData = [u8; CHAR_BYTES];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMethod {
    Global,
    PerTile,
    PerChar,
}

impl TryFrom<u8> for ColorMethod {
    type Error = LoadError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ColorMethod::Global),
            1 => Ok(ColorMethod::PerTile),
            2 => Ok(ColorMethod::PerChar),
            other => Err(LoadError::UnknownColorMethod(other)),
        }
    }
}

impl From<ColorMethod> for u8 {
    fn from(method: ColorMethod) -> u8 {
        match method {
            ColorMethod::Global => 0,
            ColorMethod::PerTile => 1,
            ColorMethod::PerChar => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenMode {
    Hires,
    Multicolor,
    ExtendedColor,
}

impl TryFrom<u8> for ScreenMode {
    type Error = LoadError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ScreenMode::Hires),
            1 => Ok(ScreenMode::Multicolor),
            2 => Ok(ScreenMode::ExtendedColor),
            other => Err(LoadError::UnknownScreenMode(other)),
        }
    }
}

impl From<ScreenMode> for u8 {
    fn from(mode: ScreenMode) -> u8 {
        match mode {
            ScreenMode::Hires => 0,
            ScreenMode::Multicolor => 1,
            ScreenMode::ExtendedColor => 2,
        }
    }
}

/// Entire project as it comes out of the binary loader.
///
/// Everything is kept in “raw” form; the processor decides what it needs.
/// When the file has no tile system the loader synthesises one 1×1 tile per
/// character, so `tile_data` and `map_data` are always meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub version: u8,
    pub colors: [u8; COLOR_TABLE_LEN],
    pub color_method: ColorMethod,
    pub screen_mode: ScreenMode,
    pub flags: u8,

    pub chars: Vec<CharData>,
    /// Low nibble colour, high nibble material. One per character.
    pub char_attributes: Vec<u8>,

    pub tile_width: u8,
    pub tile_height: u8,
    /// `num_tiles × tile_width × tile_height` character indices, row-major per tile.
    pub tile_data: Vec<u16>,
    pub tile_colors: Option<Vec<u8>>,
    pub tile_tags: Vec<u8>,
    pub tile_names: Vec<String>,

    pub map_width: u16,
    pub map_height: u16,
    /// `map_width × map_height` tile indices, row-major.
    pub map_data: Vec<u16>,
}

impl Project {
    pub fn has_tile_system(&self) -> bool {
        self.flags & TILE_SYSTEM_FLAG != 0
    }

    pub fn num_chars(&self) -> usize {
        self.chars.len()
    }

    pub fn tile_size(&self) -> usize {
        self.tile_width as usize * self.tile_height as usize
    }

    pub fn num_tiles(&self) -> usize {
        match self.tile_size() {
            0 => 0,
            size => self.tile_data.len() / size,
        }
    }

    /// Character indices of tile `index`, row-major.
    pub fn tile(&self, index: usize) -> &[u16] {
        let size = self.tile_size();
        &self.tile_data[index * size..(index + 1) * size]
    }

    pub fn char_color(&self, index: usize) -> u8 {
        self.char_attributes[index] & 0x0f
    }

    pub fn char_material(&self, index: usize) -> u8 {
        (self.char_attributes[index] >> 4) & 0x0f
    }

    /// Place `other` to the right of `self`.
    ///
    /// Characters and tiles of `other` are appended after ours, its tile
    /// cells are shifted by our character count and its map cells by our
    /// tile count (or character count when there is no tile system).
    pub fn append(&self, other: &Project) -> Result<Project, LoadError> {
        if (self.tile_width, self.tile_height) != (other.tile_width, other.tile_height) {
            return Err(LoadError::Incompatible(format!(
                "tile size {}x{} vs {}x{}",
                self.tile_width, self.tile_height, other.tile_width, other.tile_height
            )));
        }
        if self.map_height != other.map_height {
            return Err(LoadError::Incompatible(format!(
                "map height {} vs {}",
                self.map_height, other.map_height
            )));
        }

        if self.color_method != other.color_method {
            return Err(LoadError::Incompatible(format!(
                "color method {:?} vs {:?}",
                self.color_method, other.color_method
            )));
        }

        let char_offset = index_offset("characters", self.num_chars(), other.num_chars())?;
        let tile_offset = index_offset("tiles", self.num_tiles(), other.num_tiles())?;
        let map_width = self.map_width.checked_add(other.map_width).ok_or_else(|| {
            LoadError::Incompatible(format!(
                "joined map width {} + {} does not fit in 16 bits",
                self.map_width, other.map_width
            ))
        })?;

        let mut chars = self.chars.clone();
        chars.extend_from_slice(&other.chars);
        let mut char_attributes = self.char_attributes.clone();
        char_attributes.extend_from_slice(&other.char_attributes);

        let mut tile_data = self.tile_data.clone();
        tile_data.extend(other.tile_data.iter().map(|&c| c + char_offset));

        let tile_colors = match (&self.tile_colors, &other.tile_colors) {
            (Some(a), Some(b)) => Some(a.iter().chain(b).copied().collect()),
            _ => None,
        };
        let mut tile_tags = self.tile_tags.clone();
        tile_tags.extend_from_slice(&other.tile_tags);
        let mut tile_names = self.tile_names.clone();
        tile_names.extend(other.tile_names.iter().cloned());

        let mut map_data = Vec::with_capacity(map_width as usize * self.map_height as usize);
        for row in 0..self.map_height as usize {
            let left = row * self.map_width as usize;
            let right = row * other.map_width as usize;
            map_data.extend_from_slice(&self.map_data[left..left + self.map_width as usize]);
            map_data.extend(
                other.map_data[right..right + other.map_width as usize]
                    .iter()
                    .map(|&t| t + tile_offset),
            );
        }

        Ok(Project {
            version: self.version,
            colors: self.colors,
            color_method: self.color_method,
            screen_mode: self.screen_mode,
            flags: self.flags,
            chars,
            char_attributes,
            tile_width: self.tile_width,
            tile_height: self.tile_height,
            tile_data,
            tile_colors,
            tile_tags,
            tile_names,
            map_width,
            map_height: self.map_height,
            map_data,
        })
    }
}

/// Offset added to the second project's indices. Every shifted index must
/// still fit the 16-bit fields of the file format.
fn index_offset(what: &str, left: usize, right: usize) -> Result<u16, LoadError> {
    if left + right > usize::from(u16::MAX) + 1 {
        return Err(LoadError::Incompatible(format!(
            "{left} + {right} {what} cannot be indexed in 16 bits"
        )));
    }
    Ok(left as u16)
}


#[cfg(test)]
mod tests {
    use super::fixtures::project;
    use super::*;

    #[test]
    fn attribute_nibbles() {
        let mut p = project(vec![[0; 8]], (1, 1), vec![0], (1, 1), vec![0]);
        p.char_attributes[0] = 0x3d;
        assert_eq!(p.char_color(0), 0x0d);
        assert_eq!(p.char_material(0), 0x03);
    }

    #[test]
    fn append_offsets_second_project() {
        let a = project(vec![[1; 8], [2; 8]], (1, 1), vec![0, 1], (2, 1), vec![1, 0]);
        let b = project(vec![[3; 8]], (1, 1), vec![0], (1, 1), vec![0]);

        let joined = a.append(&b).unwrap();
        assert_eq!(joined.num_chars(), 3);
        assert_eq!(joined.tile_data, vec![0, 1, 2]);
        assert_eq!((joined.map_width, joined.map_height), (3, 1));
        assert_eq!(joined.map_data, vec![1, 0, 2]);
        assert_eq!(joined.tile_names.len(), 3);
    }

    #[test]
    fn append_rejects_different_tile_size() {
        let a = project(vec![[1; 8]], (1, 1), vec![0], (1, 1), vec![0]);
        let b = project(vec![[1; 8]], (2, 1), vec![0, 0], (1, 1), vec![0]);
        assert!(matches!(a.append(&b), Err(LoadError::Incompatible(_))));
    }

    #[test]
    fn append_rejects_joined_width_past_16_bits() {
        let a = project(vec![[1; 8]], (1, 1), vec![0], (40_000, 1), vec![0; 40_000]);
        let b = project(vec![[2; 8]], (1, 1), vec![0], (30_000, 1), vec![0; 30_000]);
        assert!(matches!(a.append(&b), Err(LoadError::Incompatible(_))));
    }

    #[test]
    fn append_rejects_indices_past_16_bits() {
        let a = project(vec![[1; 8]; 40_000], (1, 1), vec![0], (1, 1), vec![0]);
        let b = project(vec![[2; 8]; 30_000], (1, 1), vec![0], (1, 1), vec![0]);
        assert!(matches!(a.append(&b), Err(LoadError::Incompatible(_))));

        // exactly 65536 characters still index fine
        let c = project(vec![[2; 8]; 25_536], (1, 1), vec![25_535], (1, 1), vec![0]);
        let joined = a.append(&c).unwrap();
        assert_eq!(joined.tile_data, vec![0, u16::MAX]);
    }

    #[test]
    fn append_rejects_different_color_methods() {
        let mut a = project(vec![[1; 8]], (1, 1), vec![0], (1, 1), vec![0]);
        a.color_method = ColorMethod::PerTile;
        a.tile_colors = Some(vec![5]);
        let b = project(vec![[2; 8]], (1, 1), vec![0], (1, 1), vec![0]);
        assert!(matches!(a.append(&b), Err(LoadError::Incompatible(_))));
    }
}
