//! Permutations of finite sets.
//!
//! A permutation rearranges the elements of a finite set. In this crate these
//! sets are always {0, ..., n-1} for some n of the integer type [`El`], and
//! every permutation is implicitly extended to the set of all [`El`] by
//! fixing the points past its support. This means that every permutation can
//! be applied to any [`El`] and any two permutations can be composed.
//!
//! Internally a permutation is stored in one of several encodings picked by
//! the largest moved point: permutations moving only points below 16 pack
//! into a single machine word, points below 32 into three words, and larger
//! supports fall back to an image table whose cell width follows the domain
//! size. All encodings have identical semantics; construction and every
//! operation normalize to the narrowest legal encoding, so equal
//! permutations always have equal representations.

use std::fmt;
use std::hash::{Hash, Hasher};

use num_integer::Integer;
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::El;

/// Whether points in textual input and output are 0-based or 1-based.
///
/// Internally points are always 0-based; this toggle only affects cycle
/// construction helpers and cycle notation display.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Indexing {
    /// Points are written as 0, 1, 2, ...
    #[default]
    ZeroBased,
    /// Points are written as 1, 2, 3, ...
    OneBased,
}

impl Indexing {
    fn offset(self) -> El {
        match self {
            Indexing::ZeroBased => 0,
            Indexing::OneBased => 1,
        }
    }

    fn to_internal(self, point: El) -> Result<El> {
        point
            .checked_sub(self.offset())
            .ok_or_else(|| Error::InvalidPermutation {
                reason: format!("point {point} is below the {:?} convention", self),
            })
    }
}

/// The storage class of a permutation, exposed for inspection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// Moves nothing.
    Identity,
    /// Largest moved point at most 15; one 64-bit word.
    Packed16,
    /// Largest moved point at most 31; three 64-bit words.
    Packed32,
    /// Image table with 8-bit cells.
    Array8,
    /// Image table with 16-bit cells.
    Array16,
    /// Image table with 32-bit cells.
    Array32,
}

/// A permutation of a finite prefix of the non-negative integers.
///
/// `Perm` is a value type: operations return fresh permutations and two
/// permutations compare equal iff they agree as functions on every point,
/// regardless of how either was built.
///
/// Composition is written in right-action convention: `k` under
/// [`g.op(h)`][Perm::op] is `(k · g) · h`.
#[derive(Clone, Debug, Default)]
pub enum Perm {
    /// The identity permutation.
    #[default]
    Id,
    /// Bit-packed, largest moved point at most 15.
    P16(Perm16),
    /// Bit-packed, largest moved point at most 31.
    P32(Perm32),
    /// Image-table backed, for larger supports.
    Array(ArrayPerm),
}

/// Bit-packed permutation with support in `0..=15`.
///
/// The word holds 16 slots of 4 bits; slot `k` stores
/// `(image(k) - k) mod 16`, so a fixed point's slot is zero and a zero word
/// would be the identity (which is excluded: the narrowest encoding for the
/// identity is [`Perm::Id`]).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Perm16 {
    word: u64,
}

/// Bit-packed permutation with support in `0..=31`.
///
/// Three words of 5-bit slots holding `(image(k) - k) mod 32`, laid out
/// 12/12/8: word 0 covers points 0..12, word 1 points 12..24, word 2
/// points 24..32.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Perm32 {
    words: [u64; 3],
}

/// Image-table permutation for supports past the packed range.
///
/// Cells are 8, 16 or 32 bits wide depending on the domain size. The table
/// is trimmed: its last entry is always a moved point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayPerm {
    images: Images,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Images {
    U8(Box<[u8]>),
    U16(Box<[u16]>),
    U32(Box<[u32]>),
}

impl Perm16 {
    /// Largest point this encoding can move.
    pub const MAX_POINT: El = 15;

    const WIDTH: u32 = 4;
    const MASK: u64 = 0xF;

    fn pack(images: &[El]) -> Perm16 {
        debug_assert!(!images.is_empty() && images.len() <= 16);
        let mut word = 0u64;
        for (k, &image) in images.iter().enumerate() {
            let delta = (image.wrapping_sub(k as El) as u64) & Self::MASK;
            word |= delta << (Self::WIDTH * k as u32);
        }
        debug_assert_ne!(word, 0, "identity must use the Id encoding");
        Perm16 { word }
    }

    fn image(&self, k: El) -> El {
        if k > Self::MAX_POINT {
            return k;
        }
        let delta = (self.word >> (Self::WIDTH * k)) & Self::MASK;
        (k as u64 + delta) as El & Self::MASK as El
    }

    fn support_min(&self) -> El {
        self.word.trailing_zeros() / Self::WIDTH
    }

    fn support_max(&self) -> El {
        (63 - self.word.leading_zeros()) / Self::WIDTH
    }
}

impl Perm32 {
    /// Largest point this encoding can move.
    pub const MAX_POINT: El = 31;

    const WIDTH: u32 = 5;
    const MASK: u64 = 0x1F;
    /// Points per word in the 12/12/8 slot layout.
    const SLOTS: El = 12;

    fn pack(images: &[El]) -> Perm32 {
        debug_assert!(images.len() > 16 && images.len() <= 32);
        let mut words = [0u64; 3];
        for (k, &image) in images.iter().enumerate() {
            let delta = (image.wrapping_sub(k as El) as u64) & Self::MASK;
            words[k / Self::SLOTS as usize] |=
                delta << (Self::WIDTH * (k as u32 % Self::SLOTS as u32));
        }
        Perm32 { words }
    }

    fn image(&self, k: El) -> El {
        if k > Self::MAX_POINT {
            return k;
        }
        let word = self.words[(k / Self::SLOTS) as usize];
        let delta = (word >> (Self::WIDTH * (k % Self::SLOTS))) & Self::MASK;
        (k as u64 + delta) as El & Self::MASK as El
    }

    fn support_min(&self) -> El {
        for (i, &word) in self.words.iter().enumerate() {
            if word != 0 {
                return i as El * Self::SLOTS + word.trailing_zeros() / Self::WIDTH;
            }
        }
        unreachable!("identity must use the Id encoding")
    }

    fn support_max(&self) -> El {
        for (i, &word) in self.words.iter().enumerate().rev() {
            if word != 0 {
                return i as El * Self::SLOTS + (63 - word.leading_zeros()) / Self::WIDTH;
            }
        }
        unreachable!("identity must use the Id encoding")
    }
}

impl ArrayPerm {
    fn pack(images: &[El]) -> ArrayPerm {
        debug_assert!(images.len() > 32);
        debug_assert_eq!(
            images.last().map(|&p| p != images.len() as El - 1),
            Some(true),
            "trailing fixed points must be trimmed"
        );
        let images = if images.len() <= 1 << 8 {
            Images::U8(images.iter().map(|&p| p as u8).collect())
        } else if images.len() <= 1 << 16 {
            Images::U16(images.iter().map(|&p| p as u16).collect())
        } else {
            Images::U32(images.iter().copied().collect())
        };
        ArrayPerm { images }
    }

    fn len(&self) -> usize {
        match &self.images {
            Images::U8(t) => t.len(),
            Images::U16(t) => t.len(),
            Images::U32(t) => t.len(),
        }
    }

    fn image(&self, k: El) -> El {
        match &self.images {
            Images::U8(t) => t.get(k as usize).map_or(k, |&p| p as El),
            Images::U16(t) => t.get(k as usize).map_or(k, |&p| p as El),
            Images::U32(t) => t.get(k as usize).map_or(k, |&p| p),
        }
    }

    fn support_min(&self) -> El {
        (0..self.len() as El)
            .find(|&k| self.image(k) != k)
            .expect("array encoding always moves a point")
    }

    fn support_max(&self) -> El {
        // Trimmed: the last entry is moved.
        self.len() as El - 1
    }
}

impl Perm {
    /// The identity permutation.
    pub fn identity() -> Perm {
        Perm::Id
    }

    /// Creates a permutation from a table containing the images of `0..n`.
    ///
    /// Fails with [`Error::InvalidPermutation`] unless the table is a
    /// permutation of `0..n`, and with [`Error::DomainOverflow`] when `n`
    /// exceeds the point type's range.
    pub fn from_images(images: &[El]) -> Result<Perm> {
        if images.len() > El::MAX as usize {
            return Err(Error::DomainOverflow {
                point: images.len() as u64 - 1,
                capacity: El::MAX,
            });
        }
        let mut seen = vec![false; images.len()];
        for &image in images {
            match seen.get_mut(image as usize) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => {
                    return Err(Error::InvalidPermutation {
                        reason: format!("image {image} occurs twice"),
                    })
                }
                None => {
                    return Err(Error::InvalidPermutation {
                        reason: format!("image {image} is outside 0..{}", images.len()),
                    })
                }
            }
        }
        Ok(Self::from_images_unchecked(images))
    }

    /// Builds the narrowest encoding for a table already known to be a
    /// permutation of `0..images.len()`.
    pub(crate) fn from_images_unchecked(images: &[El]) -> Perm {
        let mut n = images.len();
        while n > 0 && images[n - 1] == (n - 1) as El {
            n -= 1;
        }
        let images = &images[..n];
        match n {
            0 => Perm::Id,
            1..=16 => Perm::P16(Perm16::pack(images)),
            17..=32 => Perm::P32(Perm32::pack(images)),
            _ => Perm::Array(ArrayPerm::pack(images)),
        }
    }

    /// Creates the permutation described by a single cycle of points.
    ///
    /// A cycle of fewer than two points is the identity. Fails when the
    /// cycle repeats a point.
    pub fn from_cycle(cycle: &[El]) -> Result<Perm> {
        Self::from_cycles(&[cycle])
    }

    /// Creates a permutation by composing cycles left-to-right.
    ///
    /// Each subsequent cycle is multiplied on the right, so cycles need not
    /// be disjoint: `from_cycles(&[&[0, 2, 1], &[0, 1]])` first applies
    /// `(0 2 1)`, then `(0 1)`.
    pub fn from_cycles<C: AsRef<[El]>>(cycles: &[C]) -> Result<Perm> {
        let mut product = Perm::Id;
        for cycle in cycles {
            product = product.op(&Self::cycle(cycle.as_ref())?);
        }
        Ok(product)
    }

    /// [`from_cycles`][Perm::from_cycles] with points read in the given
    /// convention; 1-based input must not contain the point 0.
    pub fn from_cycles_with<C: AsRef<[El]>>(indexing: Indexing, cycles: &[C]) -> Result<Perm> {
        let mut product = Perm::Id;
        let mut shifted: SmallVec<[El; 16]> = SmallVec::new();
        for cycle in cycles {
            shifted.clear();
            for &point in cycle.as_ref() {
                shifted.push(indexing.to_internal(point)?);
            }
            product = product.op(&Self::cycle(&shifted)?);
        }
        Ok(product)
    }

    fn cycle(cycle: &[El]) -> Result<Perm> {
        for (i, &p) in cycle.iter().enumerate() {
            if cycle[..i].contains(&p) {
                return Err(Error::InvalidPermutation {
                    reason: format!("point {p} occurs twice in a cycle"),
                });
            }
        }
        if cycle.len() < 2 {
            return Ok(Perm::Id);
        }
        let degree = *cycle.iter().max().expect("cycle is non-empty") as usize + 1;
        let mut images: Vec<El> = (0..degree as El).collect();
        for (i, &p) in cycle.iter().enumerate() {
            images[p as usize] = cycle[(i + 1) % cycle.len()];
        }
        Ok(Self::from_images_unchecked(&images))
    }

    /// Returns whether this is the identity permutation.
    pub fn is_identity(&self) -> bool {
        matches!(self, Perm::Id)
    }

    /// The image of a point. Points past the support are fixed.
    pub fn image(&self, k: El) -> El {
        match self {
            Perm::Id => k,
            Perm::P16(p) => p.image(k),
            Perm::P32(p) => p.image(k),
            Perm::Array(p) => p.image(k),
        }
    }

    /// The preimage of a point. Points past the support are fixed.
    ///
    /// Runs in time linear in the degree; where both directions are needed
    /// repeatedly, keep an explicit [`inverse`][Perm::inverse].
    pub fn inv_image(&self, k: El) -> El {
        if k as usize >= self.degree() {
            return k;
        }
        (0..self.degree() as El)
            .find(|&j| self.image(j) == k)
            .unwrap_or(k)
    }

    /// One past the largest moved point; 0 for the identity.
    pub fn degree(&self) -> usize {
        match self.support_max() {
            Some(max) => max as usize + 1,
            None => 0,
        }
    }

    /// The smallest moved point, or `None` for the identity.
    pub fn support_min(&self) -> Option<El> {
        match self {
            Perm::Id => None,
            Perm::P16(p) => Some(p.support_min()),
            Perm::P32(p) => Some(p.support_min()),
            Perm::Array(p) => Some(p.support_min()),
        }
    }

    /// The largest moved point, or `None` for the identity.
    pub fn support_max(&self) -> Option<El> {
        match self {
            Perm::Id => None,
            Perm::P16(p) => Some(p.support_max()),
            Perm::P32(p) => Some(p.support_max()),
            Perm::Array(p) => Some(p.support_max()),
        }
    }

    /// The largest point the current encoding could move.
    pub fn support_max_element(&self) -> El {
        match self {
            Perm::Id => 0,
            Perm::P16(_) => Perm16::MAX_POINT,
            Perm::P32(_) => Perm32::MAX_POINT,
            Perm::Array(_) => El::MAX,
        }
    }

    /// Iterates over the moved points in increasing order.
    pub fn support(&self) -> impl Iterator<Item = El> + '_ {
        (0..self.degree() as El).filter(move |&k| self.image(k) != k)
    }

    /// Iterates over the images of `0..n`.
    pub fn images(&self, n: usize) -> impl Iterator<Item = El> + '_ {
        (0..n as El).map(move |k| self.image(k))
    }

    /// The storage class currently in use.
    pub fn encoding(&self) -> Encoding {
        match self {
            Perm::Id => Encoding::Identity,
            Perm::P16(_) => Encoding::Packed16,
            Perm::P32(_) => Encoding::Packed32,
            Perm::Array(p) => match &p.images {
                Images::U8(_) => Encoding::Array8,
                Images::U16(_) => Encoding::Array16,
                Images::U32(_) => Encoding::Array32,
            },
        }
    }

    /// Composition in right-action convention: `k · (g.op(h)) = (k · g) · h`.
    ///
    /// The result uses the narrowest encoding for its actual support, so the
    /// product of two wide permutations that collapses into the packed range
    /// comes back packed.
    pub fn op(&self, other: &Perm) -> Perm {
        if self.is_identity() {
            return other.clone();
        }
        if other.is_identity() {
            return self.clone();
        }
        let n = self.degree().max(other.degree());
        let images: SmallVec<[El; 32]> = (0..n as El).map(|k| other.image(self.image(k))).collect();
        Self::from_images_unchecked(&images)
    }

    /// The group inverse.
    pub fn inverse(&self) -> Perm {
        if self.is_identity() {
            return Perm::Id;
        }
        let n = self.degree();
        let mut images: SmallVec<[El; 32]> = smallvec::smallvec![0; n];
        for k in 0..n as El {
            images[self.image(k) as usize] = k;
        }
        Self::from_images_unchecked(&images)
    }

    /// A power of this permutation, by squaring; negative exponents invert.
    pub fn pow<E>(&self, exponent: E) -> Perm
    where
        E: Integer + Clone,
    {
        if exponent < E::zero() {
            return self.inverse().pow(E::zero() - exponent);
        }
        let two = E::one() + E::one();
        let mut result = Perm::Id;
        let mut base = self.clone();
        let mut exp = exponent;
        while exp > E::zero() {
            let (half, rem) = exp.div_rem(&two);
            if rem == E::one() {
                result = result.op(&base);
            }
            base = base.op(&base);
            exp = half;
        }
        result
    }

    /// The sign of the permutation: +1 for an even product of
    /// transpositions, -1 for an odd one.
    pub fn sign(&self) -> i32 {
        let Some(min) = self.support_min() else {
            return 1;
        };
        let max = self.support_max().expect("non-identity has a support max");
        let mut seen = vec![false; (max - min + 1) as usize];
        let mut odd = false;
        for start in min..=max {
            if seen[(start - min) as usize] || self.image(start) == start {
                continue;
            }
            let mut k = start;
            loop {
                seen[(k - min) as usize] = true;
                k = self.image(k);
                if k == start {
                    break;
                }
                odd = !odd;
            }
        }
        if odd {
            -1
        } else {
            1
        }
    }

    /// Returns the cycle of this permutation through a point.
    ///
    /// Yields a 1-cycle when the point is not in the support.
    pub fn cycle_at(&self, el: El) -> CycleIter<'_> {
        CycleIter {
            perm: self,
            pos: Some(el),
            start: el,
        }
    }

    /// Iterates over the proper cycles (length at least 2) of this
    /// permutation.
    pub fn cycles(&self) -> CyclesIter<'_> {
        CyclesIter {
            perm: self,
            seen: vec![false; self.degree()],
            pos: 0,
        }
    }

    /// Renders the permutation as a product of disjoint cycles in the given
    /// convention; fixed points are omitted and the identity is `()`.
    pub fn display_as(&self, indexing: Indexing) -> CycleNotation<'_> {
        CycleNotation {
            perm: self,
            indexing,
        }
    }
}

impl PartialEq for Perm {
    fn eq(&self, other: &Perm) -> bool {
        // Encodings are canonical, so equal functions have equal storage,
        // but comparing as functions keeps the contract self-evident.
        let n = self.degree();
        n == other.degree() && self.images(n).eq(other.images(n))
    }
}

impl Eq for Perm {}

impl Hash for Perm {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for image in self.images(self.degree()) {
            image.hash(state);
        }
    }
}

/// Iterator over the points of one cycle.
#[derive(Clone)]
pub struct CycleIter<'a> {
    perm: &'a Perm,
    pos: Option<El>,
    start: El,
}

impl Iterator for CycleIter<'_> {
    type Item = El;

    fn next(&mut self) -> Option<El> {
        self.pos.map(|pos| {
            let next = self.perm.image(pos);
            self.pos = if next == self.start { None } else { Some(next) };
            pos
        })
    }
}

/// Iterator over the proper cycles of a permutation.
#[derive(Clone)]
pub struct CyclesIter<'a> {
    perm: &'a Perm,
    seen: Vec<bool>,
    pos: El,
}

impl<'a> Iterator for CyclesIter<'a> {
    type Item = CycleIter<'a>;

    fn next(&mut self) -> Option<CycleIter<'a>> {
        loop {
            if self.pos as usize >= self.seen.len() {
                return None;
            } else if self.seen[self.pos as usize] || self.perm.image(self.pos) == self.pos {
                self.pos += 1;
            } else {
                let cycle = self.perm.cycle_at(self.pos);
                for el in cycle.clone() {
                    self.seen[el as usize] = true;
                }
                return Some(cycle);
            }
        }
    }
}

/// Displays a permutation as a product of disjoint cycles.
pub struct CycleNotation<'a> {
    perm: &'a Perm,
    indexing: Indexing,
}

impl fmt::Display for CycleNotation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let offset = self.indexing.offset();
        let mut empty = true;
        for cycle in self.perm.cycles() {
            empty = false;
            let mut first = true;
            for el in cycle {
                f.write_str(if first { "(" } else { " " })?;
                first = false;
                fmt::Display::fmt(&(el + offset), f)?;
            }
            f.write_str(")")?;
        }
        if empty {
            f.write_str("()")?;
        }
        Ok(())
    }
}

impl fmt::Display for Perm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.display_as(Indexing::ZeroBased), f)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use proptest::prelude::*;

    pub(crate) fn random_perm(max_degree: El) -> impl Strategy<Value = Perm> {
        (0..max_degree)
            .prop_map(|n| (0..n).collect::<Vec<_>>())
            .prop_shuffle()
            .prop_map(|images| Perm::from_images(&images).unwrap())
    }

    #[test]
    fn fmt_identity() {
        assert_eq!(format!("{}", Perm::identity()), "()");
        assert_eq!(
            format!("{}", Perm::identity().display_as(Indexing::OneBased)),
            "()"
        );
    }

    #[test]
    fn fmt_perms() {
        let g = Perm::from_images(&[4, 1, 5, 2, 3, 0]).unwrap();
        assert_eq!(format!("{g}"), "(0 4 3 2 5)");
        let g = Perm::from_images(&[2, 3, 1, 0, 5, 4]).unwrap();
        assert_eq!(format!("{g}"), "(0 2 1 3)(4 5)");
        assert_eq!(
            format!("{}", g.display_as(Indexing::OneBased)),
            "(1 3 2 4)(5 6)"
        );
    }

    #[test]
    fn composition_order() {
        let a = Perm::from_images(&[1, 0]).unwrap();
        let b = Perm::from_images(&[2, 3, 0, 1]).unwrap();

        // k · (a.op(b)) applies a first.
        assert_eq!(a.op(&b), Perm::from_images(&[3, 2, 0, 1]).unwrap());
        assert_eq!(b.op(&a), Perm::from_images(&[2, 3, 1, 0]).unwrap());
    }

    #[test]
    fn from_images_rejects_non_bijections() {
        assert!(matches!(
            Perm::from_images(&[0, 0]),
            Err(Error::InvalidPermutation { .. })
        ));
        assert!(matches!(
            Perm::from_images(&[1, 2]),
            Err(Error::InvalidPermutation { .. })
        ));
    }

    #[test]
    fn cycles_reject_repeats() {
        assert!(matches!(
            Perm::from_cycle(&[0, 1, 0]),
            Err(Error::InvalidPermutation { .. })
        ));
    }

    #[test]
    fn one_based_cycle_application() {
        // (1 3 2) · (1 2) in 1-based notation.
        let g = Perm::from_cycles_with(Indexing::OneBased, &[&[1u32, 3, 2][..], &[1, 2]]).unwrap();
        // Point 1 (internal 0) maps to 3 (internal 2).
        assert_eq!(g.image(0), 2);
        assert_eq!(g.inverse().image(2), 0);
        assert!(matches!(
            Perm::from_cycles_with(Indexing::OneBased, &[&[0u32, 1]]),
            Err(Error::InvalidPermutation { .. })
        ));
    }

    #[test]
    fn narrowest_encoding_on_construction() {
        assert_eq!(
            Perm::from_images(&(0..20).collect::<Vec<_>>())
                .unwrap()
                .encoding(),
            Encoding::Identity
        );
        assert_eq!(
            Perm::from_cycle(&[0, 15]).unwrap().encoding(),
            Encoding::Packed16
        );
        assert_eq!(
            Perm::from_cycle(&[0, 16]).unwrap().encoding(),
            Encoding::Packed32
        );
        assert_eq!(
            Perm::from_cycle(&[0, 31]).unwrap().encoding(),
            Encoding::Packed32
        );
        assert_eq!(
            Perm::from_cycle(&[0, 32]).unwrap().encoding(),
            Encoding::Array8
        );
        assert_eq!(
            Perm::from_cycle(&[0, 300]).unwrap().encoding(),
            Encoding::Array16
        );
    }

    #[test]
    fn product_with_inverse_shrinks_to_identity() {
        let mut images: Vec<El> = (0..21).collect();
        images.swap(0, 20);
        images.swap(3, 7);
        let g = Perm::from_images(&images).unwrap();
        assert_eq!(g.encoding(), Encoding::Packed32);
        let product = g.op(&g.inverse());
        assert_eq!(product, Perm::identity());
        assert_eq!(product.encoding(), Encoding::Identity);
    }

    #[test]
    fn narrows_below_first_word() {
        // A wide permutation whose support collapses entirely below the
        // first 12-slot word boundary must come back bit-packed small.
        let wide = Perm::from_cycles(&[&[3u32, 4][..], &[16, 17]]).unwrap();
        let tail = Perm::from_cycle(&[16, 17]).unwrap();
        assert_eq!(wide.encoding(), Encoding::Packed32);
        let small = wide.op(&tail);
        assert_eq!(small, Perm::from_cycle(&[3, 4]).unwrap());
        assert_eq!(small.encoding(), Encoding::Packed16);
    }

    #[test]
    fn signs() {
        assert_eq!(Perm::identity().sign(), 1);
        assert_eq!(Perm::from_cycle(&[0, 1]).unwrap().sign(), -1);
        assert_eq!(Perm::from_cycle(&[0, 1, 2]).unwrap().sign(), 1);
        assert_eq!(Perm::from_cycle(&[4, 17, 40]).unwrap().sign(), 1);
    }

    #[test]
    fn support_extrema_across_encodings() {
        for (cycle, min, max) in [
            (&[2u32, 9][..], 2, 9),
            (&[5, 25], 5, 25),
            (&[13, 20], 13, 20),
            (&[1, 100], 1, 100),
        ] {
            let g = Perm::from_cycle(cycle).unwrap();
            assert_eq!(g.support_min(), Some(min));
            assert_eq!(g.support_max(), Some(max));
            assert_eq!(g.support().collect::<Vec<_>>(), cycle.to_vec());
        }
        assert_eq!(Perm::identity().support_min(), None);
        assert_eq!(Perm::identity().support_max(), None);
    }

    proptest! {
        #[test]
        fn image_inv_image_roundtrip(g in random_perm(200), k in 0..300u32) {
            prop_assert_eq!(g.image(g.inv_image(k)), k);
            prop_assert_eq!(g.inv_image(g.image(k)), k);
        }

        #[test]
        fn images_roundtrip(g in random_perm(200)) {
            let images: Vec<El> = g.images(g.degree()).collect();
            prop_assert_eq!(Perm::from_images(&images).unwrap(), g);
        }

        #[test]
        fn op_associates_on_points(
            g in random_perm(60),
            h in random_perm(60),
            k in 0..100u32,
        ) {
            prop_assert_eq!(g.op(&h).image(k), h.image(g.image(k)));
        }

        #[test]
        fn inverse_cancels(g in random_perm(200)) {
            prop_assert_eq!(g.op(&g.inverse()), Perm::identity());
            prop_assert_eq!(g.inverse().op(&g), Perm::identity());
        }

        #[test]
        fn sign_of_inverse(g in random_perm(100)) {
            prop_assert_eq!(g.sign() * g.inverse().sign(), 1);
        }

        #[test]
        fn narrowest_encoding_is_canonical(g in random_perm(100)) {
            let expected = match g.support_max() {
                None => Encoding::Identity,
                Some(max) if max <= Perm16::MAX_POINT => Encoding::Packed16,
                Some(max) if max <= Perm32::MAX_POINT => Encoding::Packed32,
                Some(_) => Encoding::Array8,
            };
            prop_assert_eq!(g.encoding(), expected);
        }

        #[test]
        fn adding_exponents(g in random_perm(60), a in 0..200isize, b in -200..200isize) {
            prop_assert_eq!(g.pow(a).op(&g.pow(b)), g.pow(a + b));
        }

        #[test]
        fn equal_hash(g in random_perm(60)) {
            use std::collections::hash_map::DefaultHasher;
            // Rebuilding from an oversized image table with trailing fixed
            // points lands on the same value and hash.
            let images: Vec<El> = g.images(g.degree() + 7).collect();
            let h = Perm::from_images(&images).unwrap();
            prop_assert_eq!(&g, &h);
            let hash = |p: &Perm| {
                let mut state = DefaultHasher::new();
                p.hash(&mut state);
                state.finish()
            };
            prop_assert_eq!(hash(&g), hash(&h));
        }

        #[test]
        fn cycles_compose_back(g in random_perm(100)) {
            let cycles: Vec<Vec<El>> = g.cycles().map(|c| c.collect()).collect();
            prop_assert_eq!(Perm::from_cycles(&cycles).unwrap(), g);
        }
    }
}
