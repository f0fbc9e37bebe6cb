//! Characters: the 8×8 bitmaps, their mirror symmetries and the
//! canonicalizer that folds flipped duplicates onto one catalog entry.

use std::collections::HashMap;

use serde::Serialize;

use crate::model::{CHAR_BYTES, CharData, Project};
use crate::processor::vir_char::VirChar;
use crate::processor::{Catalog, is_hires_color};

/// Which mirror operations leave a character unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Symmetry {
    /// Horizontal flip in multicolour mode (bit pairs reversed).
    pub x: bool,
    /// Vertical flip.
    pub y: bool,
    /// Horizontal flip in high resolution mode (bits reversed).
    pub x_hires: bool,
}

impl Symmetry {
    pub fn of(data: &CharData) -> Self {
        Symmetry {
            x: data.iter().all(|&row| row == flip_byte_multicolor(row)),
            y: (0..CHAR_BYTES / 2).all(|i| data[i] == data[CHAR_BYTES - 1 - i]),
            x_hires: data.iter().all(|&row| row == flip_byte(row)),
        }
    }

    /// Horizontal symmetry under the pixel encoding selected by `color`.
    pub fn x_for_color(&self, color: u8) -> bool {
        if is_hires_color(color) {
            self.x_hires
        } else {
            self.x
        }
    }
}

/// A canonical character. Content is fixed once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Char {
    data: CharData,
    hash: u64,
    symmetry: Symmetry,
}

impl Char {
    pub fn new(data: CharData) -> Self {
        Char {
            data,
            hash: hash(&data),
            symmetry: Symmetry::of(&data),
        }
    }

    pub fn data(&self) -> &CharData {
        &self.data
    }

    /// The bitmap reinterpreted as an integer; equal hashes mean equal bitmaps.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn symmetry(&self) -> Symmetry {
        self.symmetry
    }
}

/// Trial-flip buffer used while matching. Never stored in the catalog.
#[derive(Debug, Clone, Copy)]
pub struct CharScratch {
    data: CharData,
}

impl CharScratch {
    pub fn new(data: CharData) -> Self {
        CharScratch { data }
    }

    pub fn hash(&self) -> u64 {
        hash(&self.data)
    }

    pub fn flip_x(&mut self, hires: bool) {
        for row in self.data.iter_mut() {
            *row = if hires {
                flip_byte(*row)
            } else {
                flip_byte_multicolor(*row)
            };
        }
    }

    pub fn flip_y(&mut self) {
        self.data.reverse();
    }
}

pub fn hash(data: &CharData) -> u64 {
    u64::from_le_bytes(*data)
}

/// Mirror a high resolution row: one bit per pixel.
pub fn flip_byte(row: u8) -> u8 {
    row.reverse_bits()
}

/// Mirror a multicolour row: two bits per pixel, so bit pairs swap places.
pub fn flip_byte_multicolor(row: u8) -> u8 {
    (0..4).fold(0, |acc, pair| {
        let pixel = (row >> (pair * 2)) & 0b11;
        acc | pixel << (6 - pair * 2)
    })
}

/// Hash → catalog index for the characters inserted so far.
#[derive(Debug, Default)]
struct CharIndex {
    by_hash: HashMap<u64, usize>,
}

impl CharIndex {
    fn find(&self, scratch: &CharScratch) -> Option<usize> {
        self.by_hash.get(&scratch.hash()).copied()
    }
}

/// Build the unique character catalog and one virtual character per
/// source character slot.
///
/// Match order: as is, flipped in y, flipped in y and x, flipped in x only.
/// The first hit decides the recorded flip flags; without a hit the
/// unflipped bitmap becomes a new catalog entry.
pub fn canonicalize(project: &Project, catalog: &mut Catalog) {
    let mut index = CharIndex::default();
    catalog.chars.clear();
    catalog.vir_chars.clear();

    for (slot, data) in project.chars.iter().enumerate() {
        let color = project.char_color(slot);
        let hires = is_hires_color(color);
        let mut scratch = CharScratch::new(*data);

        let mut found = index.find(&scratch).map(|i| (i, false, false));
        if found.is_none() {
            scratch.flip_y();
            found = index.find(&scratch).map(|i| (i, false, true));
        }
        if found.is_none() {
            scratch.flip_x(hires);
            found = index.find(&scratch).map(|i| (i, true, true));
        }
        if found.is_none() {
            scratch.flip_y();
            found = index.find(&scratch).map(|i| (i, true, false));
        }

        let (char_index, flip_x, flip_y) = found.unwrap_or_else(|| {
            let new_char = Char::new(*data);
            let i = catalog.chars.len();
            index.by_hash.insert(new_char.hash(), i);
            catalog.chars.push(new_char);
            (i, false, false)
        });

        let symmetry = catalog.chars[char_index].symmetry();
        catalog
            .vir_chars
            .push(VirChar::new(char_index, color, flip_x, flip_y, symmetry));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::project;

    const A: CharData = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80];

    fn mirror_y(data: CharData) -> CharData {
        let mut out = data;
        out.reverse();
        out
    }

    #[test]
    fn flips_rows() {
        assert_eq!(flip_byte(0b1000_0001), 0b1000_0001);
        assert_eq!(flip_byte(0b1100_0000), 0b0000_0011);
        assert_eq!(flip_byte_multicolor(0b11_10_01_00), 0b00_01_10_11);
        assert_eq!(flip_byte_multicolor(0b10_00_00_00), 0b00_00_00_10);
    }

    #[test]
    fn detects_symmetry() {
        let solid = Symmetry::of(&[0xff; 8]);
        assert!(solid.x && solid.y && solid.x_hires);

        // 01 10 10 01 is a palindrome in pairs but not in bits
        let pairs = Symmetry::of(&[0b01_10_10_01; 8]);
        assert!(pairs.x && pairs.y && !pairs.x_hires);

        let diagonal = Symmetry::of(&A);
        assert_eq!(diagonal, Symmetry::default());
    }

    #[test]
    fn hash_is_exact_bitmap() {
        assert_eq!(hash(&[1, 0, 0, 0, 0, 0, 0, 0]), 1);
        assert_eq!(hash(&[0, 0, 0, 0, 0, 0, 0, 1]), 1 << 56);
    }

    #[test]
    fn vertical_mirror_reuses_char() {
        let p = project(vec![A, mirror_y(A)], (2, 1), vec![0, 1], (1, 1), vec![0]);
        let mut catalog = Catalog::default();
        canonicalize(&p, &mut catalog);

        assert_eq!(catalog.chars.len(), 1);
        assert_eq!(catalog.vir_chars.len(), 2);
        let mirrored = &catalog.vir_chars[1];
        assert_eq!(mirrored.char_index, 0);
        assert!(mirrored.flip_y);
        assert!(!mirrored.flip_x);
    }

    #[test]
    fn vertical_match_wins_when_both_mirrors_agree() {
        // rows 0 and 7 are multicolour mirrors of each other, so flipping
        // vertically and flipping horizontally give the same bitmap
        const X: CharData = [0x01, 0, 0, 0, 0, 0, 0, 0x40];
        let mirrored = mirror_y(X);
        assert_eq!(mirrored, X.map(flip_byte_multicolor));

        let p = project(vec![X, mirrored], (2, 1), vec![0, 1], (1, 1), vec![0]);
        let mut catalog = Catalog::default();
        canonicalize(&p, &mut catalog);

        assert_eq!(catalog.chars.len(), 1);
        let vir_char = &catalog.vir_chars[1];
        assert_eq!(vir_char.char_index, 0);
        assert!(vir_char.flip_y);
        assert!(!vir_char.flip_x);
    }

    #[test]
    fn horizontal_flip_follows_color_encoding() {
        const B: CharData = [0b1100_0000, 0b0011_0000, 0, 0, 0, 0, 0, 0b0000_0001];
        let hires_mirror: CharData = B.map(flip_byte);
        let mc_mirror: CharData = B.map(flip_byte_multicolor);
        assert_ne!(hires_mirror, mc_mirror);

        let mut p = project(
            vec![B, hires_mirror, mc_mirror],
            (3, 1),
            vec![0, 1, 2],
            (1, 1),
            vec![0],
        );
        p.char_attributes = vec![1, 1, 9];

        let mut catalog = Catalog::default();
        canonicalize(&p, &mut catalog);

        assert_eq!(catalog.chars.len(), 1);
        for vir_char in &catalog.vir_chars[1..] {
            assert_eq!(vir_char.char_index, 0);
            assert!(vir_char.flip_x);
            assert!(!vir_char.flip_y);
        }
    }

    #[test]
    fn catalog_holds_unique_bitmaps() {
        let chars = vec![A, [0; 8], A, [0xff; 8], [0; 8], mirror_y(A)];
        let n = chars.len() as u16;
        let p = project(chars, (1, 1), (0..n).collect(), (1, 1), vec![0]);
        let mut catalog = Catalog::default();
        canonicalize(&p, &mut catalog);

        assert_eq!(catalog.chars.len(), 3);
        for (i, a) in catalog.chars.iter().enumerate() {
            for b in &catalog.chars[i + 1..] {
                assert_ne!(a.data(), b.data());
            }
        }
        assert_eq!(catalog.vir_chars.len(), 6);
    }
}
