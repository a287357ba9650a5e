//! Token markings over the places of a net.

/// A 0/1 token assignment over the places of a net.
///
/// Stored as a packed bitset. Markings are plain values: every search branch
/// owns its own copy, and firing returns a new marking.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Marking {
    bits: Vec<u64>,
    len: usize,
}

impl Marking {
    /// A marking with no tokens over `len` places.
    #[must_use]
    pub fn empty(len: usize) -> Self {
        Self {
            bits: vec![0; len.div_ceil(64)],
            len,
        }
    }

    /// Number of places.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the net has no places.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `place` holds a token.
    #[must_use]
    pub fn get(&self, place: usize) -> bool {
        if place >= self.len {
            return false;
        }
        (self.bits[place / 64] >> (place % 64)) & 1 == 1
    }

    /// Put a token on `place`.
    pub fn set(&mut self, place: usize) {
        if place >= self.len {
            return;
        }
        self.bits[place / 64] |= 1_u64 << (place % 64);
    }

    /// Remove the token from `place`.
    pub fn clear(&mut self, place: usize) {
        if place >= self.len {
            return;
        }
        self.bits[place / 64] &= !(1_u64 << (place % 64));
    }

    /// Whether every token of `other` is also present here.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        self.bits
            .iter()
            .zip(other.bits.iter())
            .all(|(a, b)| a & b == *b)
    }

    /// `(self - consume) | produce`.
    #[must_use]
    pub fn fire(&self, consume: &Self, produce: &Self) -> Self {
        let bits = self
            .bits
            .iter()
            .zip(consume.bits.iter())
            .zip(produce.bits.iter())
            .map(|((m, c), p)| (m & !c) | p)
            .collect();
        Self {
            bits,
            len: self.len,
        }
    }

    /// Number of marked places.
    #[must_use]
    pub fn count(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Indices of marked places, ascending.
    pub fn marked(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(|&p| self.get(p))
    }
}
