//! Backtracking subgroup search.
//!
//! One generic driver walks a chain depth-first to find the subgroup
//! `H = { g ∈ G : P(g) }` for a predicate packaged as a
//! [`SubgroupDefinition`]. The definition contributes three things: the
//! final membership check, an optional base guide that re-bases the chain so
//! pruning bites early, and a per-level [`SearchTest`] whose successors
//! carry the invariants established by the prefix chosen so far.
//!
//! The driver composes partial products while descending, so the test sees
//! the true image of each base point under any completion of the prefix and
//! the leaf check runs on the fully assembled element.

use tracing::{debug, instrument};

use crate::base_change::{self, BaseGuide};
use crate::cancel::{self, CancelToken};
use crate::chain::{Chain, ChainNode, MutableChain};
use crate::error::Result;
use crate::orbit::Orbit;
use crate::perm::Perm;
use crate::schreier;
use crate::El;

/// Per-level pruning state of a subgroup search.
///
/// A test is immutable; accepting a step produces the successor state for
/// the next level. Returning `None` prunes the subtree, which must be sound:
/// no extension of the rejected prefix may lie in the subgroup.
pub trait SearchTest: Sized {
    /// Judges extending the current prefix at this level.
    ///
    /// `orbit_point` is the chosen point of the level's orbit and
    /// `orbit_image` its image under the partial product, i.e. the image of
    /// the level's base point under every completion of the prefix.
    fn test(
        &self,
        orbit_point: El,
        orbit_image: El,
        partial: &Perm,
        node: &ChainNode,
    ) -> Option<Self>;
}

/// A subgroup of a chain's group, described by a predicate with pruning
/// support.
pub trait SubgroupDefinition {
    /// The pruning state threaded through the search.
    type Test: SearchTest;

    /// An optional guide advising a base change that accelerates pruning.
    fn base_guide(&self) -> Option<Box<dyn BaseGuide>> {
        None
    }

    /// The root test, seeded with invariants derived from the whole chain.
    fn first_level_test(&self, chain: &Chain) -> Self::Test;

    /// The final check on a fully determined element.
    fn in_subgroup(&self, g: &Perm) -> bool;
}

/// A test that accepts everything; searching with it enumerates the group.
pub struct AcceptAll;

impl SearchTest for AcceptAll {
    fn test(&self, _: El, _: El, _: &Perm, _: &ChainNode) -> Option<Self> {
        Some(AcceptAll)
    }
}

/// Partitions the base into maximal contiguous runs lying in the same block
/// of an external structure.
///
/// `block_of` reports the block id of a point, or `None` for points outside
/// the structure; those form singleton runs. The returned ranges index
/// chain levels and concatenate to `0..chain.len()`.
pub fn base_point_groups(
    chain: &Chain,
    block_of: impl Fn(El) -> Option<usize>,
) -> Vec<std::ops::Range<usize>> {
    let base = chain.base();
    let mut groups = Vec::new();
    let mut start = 0;
    while start < base.len() {
        let block = block_of(base[start]);
        let mut end = start + 1;
        if block.is_some() {
            while end < base.len() && block_of(base[end]) == block {
                end += 1;
            }
        }
        groups.push(start..end);
        start = end;
    }
    groups
}

/// Finds the subgroup a definition describes, returning its chain.
///
/// The walk explores each level's orbit in increasing point order, prunes
/// with the definition's tests, folds every accepted element into the
/// growing subgroup chain, and skips first-level images that are not
/// minimal in their orbit under the subgroup found so far (their cosets are
/// already covered).
#[instrument(skip_all)]
pub fn subgroup_search<D: SubgroupDefinition>(
    chain: &Chain,
    definition: &D,
    cancel: Option<&CancelToken>,
) -> Result<Chain> {
    let rebased;
    let chain = match definition.base_guide() {
        Some(mut guide) => {
            rebased = base_change::base_change(chain, guide.as_mut(), cancel)?;
            &rebased
        }
        None => chain,
    };

    let mut found = MutableChain::new();
    let root = definition.first_level_test(chain);
    descend(
        chain,
        definition,
        0,
        &Perm::identity(),
        &root,
        &mut found,
        cancel,
    )?;
    debug!(order = found.order(), "subgroup search finished");
    found.validate()?;
    Ok(found.freeze())
}

fn descend<D: SubgroupDefinition>(
    chain: &Chain,
    definition: &D,
    level: usize,
    partial: &Perm,
    test: &D::Test,
    found: &mut MutableChain,
    cancel: Option<&CancelToken>,
) -> Result<()> {
    cancel::check(cancel)?;
    if level == chain.len() {
        if !found.sifts(partial) && definition.in_subgroup(partial) {
            debug!(element = %partial, "subgroup element found");
            schreier::extend_with_element(found, partial, cancel)?;
        }
        return Ok(());
    }

    let node = chain.node(level);
    let mut points: Vec<El> = node.transversal().orbit_points().to_vec();
    points.sort_unstable();

    for b in points {
        cancel::check(cancel)?;
        let orbit_image = partial.image(b);
        if level == 0 && !minimal_in_found_orbit(found, orbit_image) {
            continue;
        }
        let Some(next_test) = test.test(b, orbit_image, partial, node) else {
            continue;
        };
        let u = node
            .transversal()
            .u(b)
            .expect("orbit point has a representative");
        let next_partial = u.op(partial);
        descend(
            chain,
            definition,
            level + 1,
            &next_partial,
            &next_test,
            found,
            cancel,
        )?;
    }
    Ok(())
}

/// Whether a first-level image is the smallest point of its orbit under the
/// subgroup found so far. Exploring only minimal images is sound: an
/// element with a larger image is a product of an already-found element and
/// one with a smaller image.
fn minimal_in_found_orbit(found: &MutableChain, image: El) -> bool {
    let gens = found.level_gens(0);
    if gens.is_empty() {
        return true;
    }
    let orbit = Orbit::close(image, &gens);
    let result = orbit.iter().next() == Some(image);
    result
}

/// The intersection `G ∩ H` as a subgroup definition over `G`'s chain.
///
/// `other` must share its base prefix with the searched chain (arrange this
/// with a prescribed base change before constructing the definition). Each
/// test level advances a sift of the prospective element through `other`'s
/// chain: the image of the level's base point, translated by the peeled
/// coset representatives, must stay inside `other`'s orbits.
pub struct IntersectionDefinition<'a> {
    other: &'a Chain,
}

impl<'a> IntersectionDefinition<'a> {
    /// Defines the intersection with the group of `other`.
    pub fn new(other: &'a Chain) -> IntersectionDefinition<'a> {
        IntersectionDefinition { other }
    }
}

/// Pruning state of an intersection search: a partially peeled sift through
/// the other chain.
pub struct IntersectionTest<'a> {
    other: &'a Chain,
    /// Product of the inverse representatives peeled so far.
    peeled: Perm,
    /// The level of `other` the sift has reached.
    level: usize,
}

impl SearchTest for IntersectionTest<'_> {
    fn test(&self, _b: El, orbit_image: El, _partial: &Perm, node: &ChainNode) -> Option<Self> {
        if self.level >= self.other.len() {
            // The sift is exhausted: the only candidate left is the inverse
            // of the peeled product, which pins every remaining image.
            if orbit_image == self.peeled.inv_image(node.beta()) {
                return Some(IntersectionTest {
                    other: self.other,
                    peeled: self.peeled.clone(),
                    level: self.level,
                });
            }
            return None;
        }
        let other_node = self.other.node(self.level);
        debug_assert_eq!(other_node.beta(), node.beta());
        let translated = self.peeled.image(orbit_image);
        let u_inv = other_node.transversal().u_inv(translated)?;
        Some(IntersectionTest {
            other: self.other,
            peeled: self.peeled.op(u_inv),
            level: self.level + 1,
        })
    }
}

impl<'a> SubgroupDefinition for IntersectionDefinition<'a> {
    type Test = IntersectionTest<'a>;

    fn first_level_test(&self, _chain: &Chain) -> IntersectionTest<'a> {
        IntersectionTest {
            other: self.other,
            peeled: Perm::identity(),
            level: 0,
        }
    }

    fn in_subgroup(&self, g: &Perm) -> bool {
        self.other.contains(g)
    }
}

/// The setwise stabilizer `{ g ∈ G : S·g = S }` as a subgroup definition.
///
/// Unlike an unordered partition stabilizer with blocks `S` and its
/// complement, the set may not trade places with the complement even when
/// the sizes happen to match.
pub struct SetwiseStabilizer {
    member: Vec<bool>,
    points: Vec<El>,
}

impl SetwiseStabilizer {
    /// Defines the stabilizer of the given set of points.
    pub fn new(set: &[El]) -> SetwiseStabilizer {
        let size = set.iter().map(|&p| p as usize + 1).max().unwrap_or(0);
        let mut member = vec![false; size];
        let mut points: Vec<El> = set.to_vec();
        points.sort_unstable();
        points.dedup();
        for &p in &points {
            member[p as usize] = true;
        }
        SetwiseStabilizer { member, points }
    }

    fn contains(&self, p: El) -> bool {
        self.member.get(p as usize).copied().unwrap_or(false)
    }
}

/// Pruning state of a setwise stabilizer search: membership of each base
/// image must match the membership of its base point.
pub struct SetwiseStabilizerTest<'a> {
    definition: &'a SetwiseStabilizer,
}

impl SearchTest for SetwiseStabilizerTest<'_> {
    fn test(&self, _b: El, orbit_image: El, _partial: &Perm, node: &ChainNode) -> Option<Self> {
        if self.definition.contains(node.beta()) == self.definition.contains(orbit_image) {
            Some(SetwiseStabilizerTest {
                definition: self.definition,
            })
        } else {
            None
        }
    }
}

impl<'a> SubgroupDefinition for &'a SetwiseStabilizer {
    type Test = SetwiseStabilizerTest<'a>;

    fn base_guide(&self) -> Option<Box<dyn BaseGuide>> {
        Some(Box::new(base_change::PreferredPointsGuide::new(
            self.points.clone(),
        )))
    }

    fn first_level_test(&self, _chain: &Chain) -> SetwiseStabilizerTest<'a> {
        SetwiseStabilizerTest { definition: self }
    }

    fn in_subgroup(&self, g: &Perm) -> bool {
        self.points.iter().all(|&p| self.contains(g.image(p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::base_change::PrescribedBaseGuide;

    fn build(gens: &[Perm]) -> Chain {
        schreier::deterministic(gens, None).unwrap()
    }

    struct EvenOnly;

    impl SubgroupDefinition for EvenOnly {
        type Test = AcceptAll;

        fn first_level_test(&self, _chain: &Chain) -> AcceptAll {
            AcceptAll
        }

        fn in_subgroup(&self, g: &Perm) -> bool {
            g.sign() == 1
        }
    }

    #[test]
    fn even_subgroup_of_sym4() {
        let chain = build(&[
            Perm::from_cycle(&[0, 1]).unwrap(),
            Perm::from_cycle(&[0, 1, 2, 3]).unwrap(),
        ]);
        let alt = subgroup_search(&chain, &EvenOnly, None).unwrap();
        assert_eq!(alt.order(), 12);
        assert!(alt.contains(&Perm::from_cycle(&[0, 1, 2]).unwrap()));
        assert!(!alt.contains(&Perm::from_cycle(&[0, 1]).unwrap()));
    }

    #[test]
    fn intersection_of_two_subgroups_of_sym4() {
        let g = build(&[
            Perm::from_cycle(&[0, 1]).unwrap(),
            Perm::from_cycle(&[0, 1, 2, 3]).unwrap(),
        ]);
        // ⟨(0 1 2)⟩ has order 3; its intersection with ⟨(0 1 2), (0 1)⟩
        // (Sym({0,1,2})) is itself, and with ⟨(1 2 3)⟩ is trivial.
        let c3 = build(&[Perm::from_cycle(&[0, 1, 2]).unwrap()]);
        let c3_rebased = base_change::base_change(
            &c3,
            &mut PrescribedBaseGuide::new(g.base()),
            None,
        )
        .unwrap();
        let met = subgroup_search(&g, &IntersectionDefinition::new(&c3_rebased), None).unwrap();
        assert_eq!(met.order(), 3);
        assert!(met.contains(&Perm::from_cycle(&[0, 1, 2]).unwrap()));
    }

    #[test]
    fn base_point_groups_splits_on_blocks() {
        let chain = build(&[
            Perm::from_cycle(&[0, 1]).unwrap(),
            Perm::from_cycle(&[0, 1, 2, 3]).unwrap(),
        ]);
        let rebased = base_change::base_change(
            &chain,
            &mut PrescribedBaseGuide::new([0, 1, 2]),
            None,
        )
        .unwrap();
        // Blocks {0,1} and {2,3}: the base [0,1,2,...] groups as [0,1] then
        // the rest.
        let groups = base_point_groups(&rebased, |p| if p < 4 { Some(p as usize / 2) } else { None });
        assert_eq!(groups[0], 0..2);
        assert!(groups.iter().map(|r| r.len()).sum::<usize>() == rebased.len());
    }
}
