//! Prime allocation.
//!
//! Every group (a tile, or a map column) must address all of its virtual
//! entities through one base plus an 8-bit offset. A virtual entity used by
//! several groups may therefore need several copies ("primes") in the
//! output table. The allocator picks, per group, one prime per member so
//! that the group's primes span at most [`PRIME_WINDOW`], reusing earlier
//! primes where it can and backtracking when a choice leads nowhere.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::ConvertError;
use crate::processor::Catalog;

/// Group bases are stored as `base / PRIME_BLOCK` in one byte, so this must
/// be a power of two for the decoder's shift.
pub const PRIME_BLOCK: usize = 16;

/// Largest allowed `max - min` within a group. Rounding the base down to a
/// block adds at most `PRIME_BLOCK - 1`, which keeps every offset below 256.
pub const PRIME_WINDOW: usize = (255 / PRIME_BLOCK) * PRIME_BLOCK;

/// Result of allocating primes for one family of groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimeTable {
    /// Sorted distinct virtual indices per group.
    pub groups: Vec<Vec<usize>>,
    /// Prime chosen for each entry of `groups`, same shape.
    pub primes: Vec<Vec<usize>>,
    /// Virtual index for every prime, in prime order.
    pub prime_to_virtual: Vec<usize>,
}

impl PrimeTable {
    pub fn num_primes(&self) -> usize {
        self.prime_to_virtual.len()
    }

    /// Lowest prime of `group` rounded down to a block boundary.
    pub fn base(&self, group: usize) -> usize {
        let min = self.primes[group].iter().copied().min().unwrap_or(0);
        min / PRIME_BLOCK * PRIME_BLOCK
    }

    /// The base as written to the output (`base / PRIME_BLOCK`).
    pub fn base_byte(&self, group: usize) -> u8 {
        (self.base(group) / PRIME_BLOCK) as u8
    }

    /// Offset from the group base to the prime chosen for `virtual_index`,
    /// or `None` if the group does not contain it.
    pub fn offset(&self, group: usize, virtual_index: usize) -> Option<u8> {
        let pos = self.groups[group].binary_search(&virtual_index).ok()?;
        let offset = self.primes[group][pos] - self.base(group);
        u8::try_from(offset).ok()
    }

    /// Every group base must fit in one byte.
    fn check_bases(&self, kind: &'static str) -> Result<(), ConvertError> {
        for group in 0..self.groups.len() {
            let base = self.base(group) / PRIME_BLOCK;
            if base > u8::MAX as usize {
                return Err(ConvertError::PrimeBase { kind, group, base });
            }
        }
        Ok(())
    }
}

/// Allocation state shared across the groups of one family.
#[derive(Debug)]
pub struct PrimeAllocator {
    window: usize,
    next_prime: usize,
    /// Primes handed out so far for each virtual, in allocation order.
    primes_per_virtual: Vec<Vec<usize>>,
}

impl PrimeAllocator {
    pub fn new(num_virtuals: usize, window: usize) -> Self {
        PrimeAllocator {
            window,
            next_prime: 0,
            primes_per_virtual: vec![Vec::new(); num_virtuals],
        }
    }

    /// Choose a prime for every member of `group` (sorted, distinct).
    /// `None` if no assignment fits the window.
    pub fn allocate_group(&mut self, group: &[usize]) -> Option<Vec<usize>> {
        let mut chosen = Vec::with_capacity(group.len());
        self.solve(group, None, &mut chosen).then_some(chosen)
    }

    /// Window after adding `prime`, if it still fits.
    fn widen(&self, bounds: Option<(usize, usize)>, prime: usize) -> Option<(usize, usize)> {
        let (lo, hi) = bounds.map_or((prime, prime), |(lo, hi)| (lo.min(prime), hi.max(prime)));
        (hi - lo <= self.window).then_some((lo, hi))
    }

    fn solve(&mut self, rest: &[usize], bounds: Option<(usize, usize)>, chosen: &mut Vec<usize>) -> bool {
        let Some((&virtual_index, tail)) = rest.split_first() else {
            return true;
        };

        // Reuse a prime this virtual already owns.
        for i in 0..self.primes_per_virtual[virtual_index].len() {
            let prime = self.primes_per_virtual[virtual_index][i];
            if let Some(widened) = self.widen(bounds, prime) {
                chosen.push(prime);
                if self.solve(tail, Some(widened), chosen) {
                    return true;
                }
                chosen.pop();
            }
        }

        // Otherwise hand out the next fresh one.
        let prime = self.next_prime;
        if let Some(widened) = self.widen(bounds, prime) {
            self.next_prime += 1;
            self.primes_per_virtual[virtual_index].push(prime);
            chosen.push(prime);
            if self.solve(tail, Some(widened), chosen) {
                return true;
            }
            chosen.pop();
            self.primes_per_virtual[virtual_index].pop();
            self.next_prime -= 1;
        }

        false
    }

    /// Invert the per-virtual allocation lists into prime order.
    pub fn prime_to_virtual(&self) -> Vec<usize> {
        let mut table = vec![0; self.next_prime];
        for (virtual_index, primes) in self.primes_per_virtual.iter().enumerate() {
            for &p in primes {
                table[p] = virtual_index;
            }
        }
        table
    }
}

/// Allocate primes for each group in order.
pub fn allocate(
    kind: &'static str,
    num_virtuals: usize,
    groups: Vec<Vec<usize>>,
) -> Result<PrimeTable, ConvertError> {
    let mut allocator = PrimeAllocator::new(num_virtuals, PRIME_WINDOW);
    let mut primes = Vec::with_capacity(groups.len());

    for (group, members) in groups.iter().enumerate() {
        let chosen = allocator
            .allocate_group(members)
            .ok_or(ConvertError::PrimeAllocation { kind, group })?;
        primes.push(chosen);
    }

    let table = PrimeTable {
        groups,
        primes,
        prime_to_virtual: allocator.prime_to_virtual(),
    };
    table.check_bases(kind)?;

    debug!("{} primes: {} for {} virtuals", kind, table.num_primes(), num_virtuals);
    Ok(table)
}

fn sorted_distinct(values: impl Iterator<Item = usize>) -> Vec<usize> {
    values.collect::<BTreeSet<_>>().into_iter().collect()
}

/// Per tile, the sorted distinct virtual characters its cells use.
pub fn vir_chars_per_tile(catalog: &Catalog) -> Vec<Vec<usize>> {
    catalog
        .tiles
        .iter()
        .map(|tile| {
            sorted_distinct(
                tile.cells()
                    .map(|c| catalog.vir_char_lookup[&c.char_bits_with_color(&catalog.chars)]),
            )
        })
        .collect()
}

/// Per map column, the sorted distinct virtual tiles it uses.
pub fn vir_tiles_per_column(catalog: &Catalog) -> Vec<Vec<usize>> {
    (0..catalog.map.width())
        .map(|col| sorted_distinct(catalog.map.column(col)))
        .collect()
}

pub fn allocate_vir_char_primes(catalog: &Catalog) -> Result<PrimeTable, ConvertError> {
    allocate("vir char", catalog.vir_chars.len(), vir_chars_per_tile(catalog))
}

pub fn allocate_vir_tile_primes(catalog: &Catalog) -> Result<PrimeTable, ConvertError> {
    allocate("vir tile", catalog.vir_tiles.len(), vir_tiles_per_column(catalog))
}
