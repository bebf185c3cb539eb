//! Orbits of points under a set of generators.

use bitvec::vec::BitVec;

use crate::perm::Perm;
use crate::El;

/// The orbit of a point under a generator set, stored as a bit set.
///
/// Invariants: the starting point is a member, and the member set is closed
/// under every generator it was built with.
#[derive(Clone, Debug)]
pub struct Orbit {
    beta: El,
    members: BitVec,
    len: usize,
}

impl Orbit {
    /// Computes the smallest set containing `beta` and closed under `gens`.
    pub fn close(beta: El, gens: &[Perm]) -> Orbit {
        let mut orbit = Orbit {
            beta,
            members: BitVec::new(),
            len: 0,
        };
        orbit.insert(beta);
        orbit.close_under(gens, vec![beta]);
        orbit
    }

    /// The starting point.
    pub fn beta(&self) -> El {
        self.beta
    }

    /// The number of points in the orbit.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false: an orbit contains at least its starting point.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether a point lies in the orbit.
    pub fn contains(&self, point: El) -> bool {
        self.members.get(point as usize).map_or(false, |bit| *bit)
    }

    /// Iterates over the orbit's points in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = El> + '_ {
        self.members.iter_ones().map(|index| index as El)
    }

    /// Extends the orbit after the generator set grew.
    ///
    /// Two phases: first apply only `new_gens` to the existing members, then
    /// close the expanded set under `all_gens`. When the first phase reaches
    /// no new point the set was already closed under `all_gens` before the
    /// call, so the closure phase is skipped.
    pub fn extend(&mut self, new_gens: &[Perm], all_gens: &[Perm]) {
        let mut frontier = Vec::new();
        let existing: Vec<El> = self.iter().collect();
        for &alpha in &existing {
            for g in new_gens {
                let image = g.image(alpha);
                if self.insert(image) {
                    frontier.push(image);
                }
            }
        }
        if frontier.is_empty() {
            return;
        }
        self.close_under(all_gens, frontier);
    }

    fn insert(&mut self, point: El) -> bool {
        let index = point as usize;
        if index >= self.members.len() {
            self.members.resize(index + 1, false);
        }
        if self.members[index] {
            false
        } else {
            self.members.set(index, true);
            self.len += 1;
            true
        }
    }

    fn close_under(&mut self, gens: &[Perm], mut frontier: Vec<El>) {
        while let Some(alpha) = frontier.pop() {
            for g in gens {
                let image = g.image(alpha);
                if self.insert(image) {
                    frontier.push(image);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use crate::perm::tests::random_perm;

    #[test]
    fn single_cycle_orbit() {
        let gens = vec![Perm::from_cycle(&[0, 1, 2]).unwrap()];
        let orbit = Orbit::close(0, &gens);
        assert_eq!(orbit.beta(), 0);
        assert_eq!(orbit.iter().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(!orbit.contains(3));
    }

    #[test]
    fn fixed_point_orbit_is_singleton() {
        let gens = vec![Perm::from_cycle(&[1, 2]).unwrap()];
        let orbit = Orbit::close(5, &gens);
        assert_eq!(orbit.len(), 1);
        assert!(orbit.contains(5));
    }

    proptest! {
        #[test]
        fn closed_under_generators(
            gens in proptest::collection::vec(random_perm(40), 1..4),
            beta in 0..40u32,
        ) {
            let orbit = Orbit::close(beta, &gens);
            prop_assert!(orbit.contains(beta));
            for alpha in orbit.iter() {
                for g in &gens {
                    prop_assert!(orbit.contains(g.image(alpha)));
                }
            }
        }

        #[test]
        fn two_phase_extend_matches_fresh_closure(
            gens in proptest::collection::vec(random_perm(40), 2..5),
            beta in 0..40u32,
        ) {
            let (head, tail) = gens.split_at(1);
            let mut grown = Orbit::close(beta, head);
            grown.extend(tail, &gens);
            let fresh = Orbit::close(beta, &gens);
            prop_assert_eq!(grown.len(), fresh.len());
            prop_assert!(grown.iter().eq(fresh.iter()));
        }
    }
}
