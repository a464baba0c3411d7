//! Packing and unpacking of a register integer into fixed-width cells.
//!
//! Cell `i` occupies bits `[i*r, (i+1)*r)` of the state, so cell 0 is the
//! least-significant one.

use num_bigint::BigUint;
use num_traits::Zero;

/// Mask of `r` low bits. `r` must lie in `1..=128`.
#[inline]
pub fn cell_mask(r: usize) -> u128 {
    debug_assert!((1..=128).contains(&r));
    u128::MAX >> (128 - r)
}

/// Low 128 bits of `value`.
#[inline]
pub fn low_u128(value: &BigUint) -> u128 {
    let mut digits = value.iter_u64_digits();
    let lo = digits.next().unwrap_or(0) as u128;
    let hi = digits.next().unwrap_or(0) as u128;
    (hi << 64) | lo
}

/// Value of cell `index` of `state`; 0 for cells past the end of the state.
#[inline]
pub fn cell_value(state: &BigUint, r: usize, index: usize) -> u128 {
    match r.checked_mul(index) {
        Some(shift) if (shift as u64) < state.bits() => low_u128(&(state >> shift)) & cell_mask(r),
        _ => 0,
    }
}

/// Values of the cells named by `positions`, in the order given.
pub fn cell_values(state: &BigUint, r: usize, positions: &[usize]) -> Vec<u128> {
    positions
        .iter()
        .map(|&p| cell_value(state, r, p))
        .collect()
}

/// All `n` cells of `state`, cell 0 first.
pub fn unpack(state: &BigUint, r: usize, n: usize) -> Vec<u128> {
    let mask = cell_mask(r);
    let mut rest = state.clone();
    let mut cells = Vec::with_capacity(n);
    for _ in 0..n {
        cells.push(low_u128(&rest) & mask);
        rest >>= r;
    }
    cells
}

/// Inverse of [`unpack`]. Each cell is truncated to `r` bits.
pub fn pack(cells: &[u128], r: usize) -> BigUint {
    let mask = cell_mask(r);
    cells.iter().rev().fold(BigUint::zero(), |acc, &c| {
        (acc << r) | BigUint::from(c & mask)
    })
}
