//! Coset representative tables for one base point.

use rustc_hash::FxHashMap;

use crate::perm::Perm;
use crate::El;

/// Coset representatives for the orbit of a base point.
///
/// Maps every point `α` in the orbit of `β` under the chain's generators to
/// a representative `u(α)` with `β · u(α) = α`, and to its inverse. The
/// representatives of `β` itself are the identity.
#[derive(Clone, Debug)]
pub struct Transversal {
    beta: El,
    /// Orbit points in discovery order; the first entry is `beta`.
    points: Vec<El>,
    reps: FxHashMap<El, (Perm, Perm)>,
}

impl Transversal {
    /// The transversal of an untouched base point: orbit `{β}`, identity
    /// representatives.
    pub fn trivial(beta: El) -> Transversal {
        let mut reps = FxHashMap::default();
        reps.insert(beta, (Perm::identity(), Perm::identity()));
        Transversal {
            beta,
            points: vec![beta],
            reps,
        }
    }

    /// Builds the transversal of `beta` under a generator set.
    pub fn close(beta: El, gens: &[Perm]) -> Transversal {
        let mut transversal = Self::trivial(beta);
        transversal.extend(gens, gens);
        transversal
    }

    /// The base point.
    pub fn beta(&self) -> El {
        self.beta
    }

    /// The orbit size.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false: the orbit contains at least the base point.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether a point lies in the orbit of the base point.
    pub fn contains(&self, alpha: El) -> bool {
        self.reps.contains_key(&alpha)
    }

    /// The orbit points in discovery order, starting with the base point.
    pub fn orbit_points(&self) -> &[El] {
        &self.points
    }

    /// The representative carrying `β` to `α`, if `α` is in the orbit.
    pub fn u(&self, alpha: El) -> Option<&Perm> {
        self.reps.get(&alpha).map(|(u, _)| u)
    }

    /// The inverse representative, carrying `α` back to `β`.
    pub fn u_inv(&self, alpha: El) -> Option<&Perm> {
        self.reps.get(&alpha).map(|(_, u_inv)| u_inv)
    }

    /// Extends the table after the generator set grew.
    ///
    /// Follows the orbit's two-phase discipline: reach new points by
    /// applying only `new_gens` to the known orbit, then close under
    /// `all_gens`. A point reached as `α · s` is recorded with
    /// `u(α·s) = u(α) · s` and `u_inv(α·s) = s⁻¹ · u_inv(α)`.
    pub fn extend(&mut self, new_gens: &[Perm], all_gens: &[Perm]) {
        let new_pairs: Vec<(&Perm, Perm)> = new_gens.iter().map(|s| (s, s.inverse())).collect();
        let mut frontier = Vec::new();
        let existing = self.points.len();
        for index in 0..existing {
            let alpha = self.points[index];
            for (s, s_inv) in &new_pairs {
                if let Some(image) = self.record(alpha, s, s_inv) {
                    frontier.push(image);
                }
            }
        }
        if frontier.is_empty() {
            return;
        }
        let all_pairs: Vec<(&Perm, Perm)> = all_gens.iter().map(|s| (s, s.inverse())).collect();
        while let Some(alpha) = frontier.pop() {
            for (s, s_inv) in &all_pairs {
                if let Some(image) = self.record(alpha, s, s_inv) {
                    frontier.push(image);
                }
            }
        }
    }

    fn record(&mut self, alpha: El, s: &Perm, s_inv: &Perm) -> Option<El> {
        let image = s.image(alpha);
        if self.contains(image) {
            return None;
        }
        let (u, u_inv) = &self.reps[&alpha];
        let entry = (u.op(s), s_inv.op(u_inv));
        debug_assert_eq!(entry.0.image(self.beta), image);
        debug_assert_eq!(entry.1.image(image), self.beta);
        self.reps.insert(image, entry);
        self.points.push(image);
        Some(image)
    }

    /// Conjugates the table by `f`: the base point becomes `β · f` and each
    /// entry `(α, u, u_inv)` becomes `(α·f, f⁻¹·u·f, f⁻¹·u_inv·f)`.
    pub fn conjugate(&mut self, f: &Perm, f_inv: &Perm) {
        self.beta = f.image(self.beta);
        let mut reps = FxHashMap::default();
        reps.reserve(self.reps.len());
        for point in &mut self.points {
            let (u, u_inv) = self
                .reps
                .remove(point)
                .expect("every orbit point has a representative");
            *point = f.image(*point);
            reps.insert(*point, (f_inv.op(&u).op(f), f_inv.op(&u_inv).op(f)));
        }
        self.reps = reps;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use crate::perm::tests::random_perm;

    #[test]
    fn trivial_maps_beta_to_identity() {
        let t = Transversal::trivial(3);
        assert_eq!(t.beta(), 3);
        assert_eq!(t.len(), 1);
        assert_eq!(t.u(3), Some(&Perm::identity()));
        assert_eq!(t.u_inv(3), Some(&Perm::identity()));
        assert_eq!(t.u(4), None);
    }

    #[test]
    fn transitive_generators_reach_everything() {
        let gens = vec![
            Perm::from_cycle(&[0, 1]).unwrap(),
            Perm::from_cycle(&[0, 1, 2, 3, 4]).unwrap(),
        ];
        let t = Transversal::close(2, &gens);
        assert_eq!(t.len(), 5);
        for alpha in 0..5 {
            assert_eq!(t.u(alpha).unwrap().image(2), alpha);
            assert_eq!(t.u_inv(alpha).unwrap().image(alpha), 2);
        }
    }

    proptest! {
        #[test]
        fn representatives_carry_beta(
            gens in proptest::collection::vec(random_perm(30), 1..4),
            beta in 0..30u32,
        ) {
            let t = Transversal::close(beta, &gens);
            for &alpha in t.orbit_points() {
                prop_assert_eq!(t.u(alpha).unwrap().image(beta), alpha);
                prop_assert_eq!(t.u_inv(alpha).unwrap().image(alpha), beta);
                prop_assert_eq!(
                    &t.u(alpha).unwrap().op(t.u_inv(alpha).unwrap()),
                    &Perm::identity()
                );
            }
        }

        #[test]
        fn conjugation_preserves_invariants(
            gens in proptest::collection::vec(random_perm(20), 1..3),
            f in random_perm(20),
            beta in 0..20u32,
        ) {
            let mut t = Transversal::close(beta, &gens);
            let f_inv = f.inverse();
            t.conjugate(&f, &f_inv);
            prop_assert_eq!(t.beta(), f.image(beta));
            for &alpha in t.orbit_points() {
                prop_assert_eq!(t.u(alpha).unwrap().image(t.beta()), alpha);
                prop_assert_eq!(t.u_inv(alpha).unwrap().image(alpha), t.beta());
            }
        }
    }
}
