use crate::processor::chars::{Char, Symmetry};
use crate::processor::{COLOR_SHIFT, FLIP_X_BIT, FLIP_Y_BIT, is_hires_color};

/// One placement of a canonical character: colour plus flip state.
///
/// Tiles own their virtual characters by value so a tile can be flipped
/// without touching anything shared. The symmetry flags are a copy of the
/// referenced character's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirChar {
    pub char_index: usize,
    pub color: u8,
    pub flip_x: bool,
    pub flip_y: bool,
    pub symmetry: Symmetry,
}

impl VirChar {
    pub fn new(char_index: usize, color: u8, flip_x: bool, flip_y: bool, symmetry: Symmetry) -> Self {
        VirChar {
            char_index,
            color,
            flip_x,
            flip_y,
            symmetry,
        }
    }

    pub fn is_hires(&self) -> bool {
        is_hires_color(self.color)
    }

    /// Same rendered result: same character and colour, and each flip either
    /// matches or is invisible because the character is symmetric under it.
    pub fn is_equivalent(&self, other: &VirChar) -> bool {
        self.char_index == other.char_index
            && self.color == other.color
            && (self.flip_x == other.flip_x || self.symmetry.x_for_color(self.color))
            && (self.flip_y == other.flip_y || self.symmetry.y)
    }

    /// Character index plus the flip bits that actually change the output,
    /// after composing with an outer (tile) flip. Symmetry is looked up in
    /// the current character catalog.
    pub fn char_bits(&self, outer_flip_x: bool, outer_flip_y: bool, chars: &[Char]) -> u16 {
        let symmetry = chars[self.char_index].symmetry();
        let flip_x = self.flip_x ^ outer_flip_x;
        let flip_y = self.flip_y ^ outer_flip_y;

        let mut bits = self.char_index as u16;
        if flip_x && !symmetry.x_for_color(self.color) {
            bits |= FLIP_X_BIT;
        }
        if flip_y && !symmetry.y {
            bits |= FLIP_Y_BIT;
        }
        bits
    }

    /// [`Self::char_bits`] with the colour in the top nibble. This is both
    /// the identity of a virtual character and its output word.
    pub fn char_bits_with_color(&self, chars: &[Char]) -> u16 {
        self.char_bits(false, false, chars) | (self.color as u16) << COLOR_SHIFT
    }
}
