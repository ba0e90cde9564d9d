//! Per-kind id allocation.
//!
//! Ids are positive integers written in base 36 (`1`, `2`, ... `z`, `10`).
//! Each kind keeps a cached next candidate. Allocation starts from that
//! candidate and probes forward past ids that are already taken, so after a
//! restart the first allocation rescans from `1`.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Encodes a number in lowercase base 36.
#[must_use]
pub fn encode_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::with_capacity(13);
    while value > 0 {
        buf.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    buf.reverse();
    buf.into_iter().map(char::from).collect()
}

/// Decodes a lowercase or uppercase base-36 number.
///
/// Returns `None` for empty input, foreign characters or overflow.
#[cfg(test)]
fn decode_base36(text: &str) -> Option<u64> {
    if text.is_empty() {
        return None;
    }
    text.chars().try_fold(0u64, |acc, c| {
        let digit = c.to_digit(36)?;
        acc.checked_mul(36)?.checked_add(u64::from(digit))
    })
}

/// Hands out fresh ids per kind.
///
/// The allocator owns only the cached counters. Whether a candidate is
/// taken is decided by the caller's probe, typically an existence check
/// on `<base>/<kind>/<candidate>`. Allocation for one kind is serialized
/// by a per-kind lock held across the whole probe loop, so two threads can
/// never observe the same free candidate. Different kinds allocate in
/// parallel.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: Mutex<HashMap<String, Arc<Mutex<u64>>>>,
}

impl IdAllocator {
    /// Creates an allocator with no cached counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next id of `kind` for which `is_taken` returns false.
    pub fn allocate<F>(&self, kind: &str, mut is_taken: F) -> String
    where
        F: FnMut(&str) -> bool,
    {
        let slot = self.slot(kind);
        let mut next = slot.lock();

        let mut candidate = *next;
        let mut id = encode_base36(candidate);
        while is_taken(&id) {
            candidate += 1;
            id = encode_base36(candidate);
        }

        *next = candidate + 1;
        id
    }

    /// Returns the cached next candidate for `kind`, if any.
    #[cfg(test)]
    pub(crate) fn peek(&self, kind: &str) -> Option<u64> {
        let map = self.next.lock();
        map.get(kind).map(|slot| *slot.lock())
    }

    /// Forgets the cached counter of `kind`; the next allocation rescans
    /// from `1`.
    ///
    /// Only safe while nothing else allocates for `kind` and no allocated
    /// id is still waiting to be stored.
    #[cfg(test)]
    pub(crate) fn reset(&self, kind: &str) {
        self.next.lock().remove(kind);
    }

    fn slot(&self, kind: &str) -> Arc<Mutex<u64>> {
        let mut map = self.next.lock();
        Arc::clone(
            map.entry(kind.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(1))),
        )
    }
}
