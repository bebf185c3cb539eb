//! The user-facing group handle.

use rand::{Rng, RngCore};

use crate::base_change::{self, PrescribedBaseGuide};
use crate::cancel::CancelToken;
use crate::chain::Chain;
use crate::error::Result;
use crate::partition::{Partition, UnorderedPartitionStabilizer};
use crate::perm::Perm;
use crate::schreier;
use crate::search::{self, IntersectionDefinition, SetwiseStabilizer};
use crate::El;

/// A permutation group, held as a generating set plus a frozen stabilizer
/// chain.
///
/// All operations are value-level: derived groups (stabilizers,
/// intersections) are fresh handles built through their own chains, and an
/// existing handle is never mutated. A frozen handle is safe to share
/// across threads for reading.
#[derive(Clone, Debug)]
pub struct Grp {
    generators: Vec<Perm>,
    chain: Chain,
}

impl Grp {
    /// The trivial group.
    pub fn trivial() -> Grp {
        Grp {
            generators: Vec::new(),
            chain: Chain::trivial(),
        }
    }

    /// Builds a group from a generating set by the deterministic
    /// Schreier–Sims algorithm.
    pub fn from_generators(generators: Vec<Perm>) -> Result<Grp> {
        Self::from_generators_cancellable(generators, None)
    }

    /// [`from_generators`][Grp::from_generators] with a cancellation token.
    pub fn from_generators_cancellable(
        generators: Vec<Perm>,
        cancel: Option<&CancelToken>,
    ) -> Result<Grp> {
        let chain = schreier::deterministic(&generators, cancel)?;
        Ok(Grp { generators, chain })
    }

    /// Builds a group whose order is known in advance; disagreement between
    /// the claim and the built chain fails with
    /// [`Error::IncompleteChain`][crate::Error::IncompleteChain].
    pub fn from_generators_and_order(generators: Vec<Perm>, order: u128) -> Result<Grp> {
        let chain = schreier::deterministic_with_order(&generators, order, None)?;
        Ok(Grp { generators, chain })
    }

    /// Builds a group of known order by the randomized Schreier–Sims
    /// algorithm, drawing elements from the supplied oracle.
    ///
    /// The oracle's bias decides termination; use
    /// [`from_generators_and_order`][Grp::from_generators_and_order] when a
    /// verified construction matters more than speed.
    pub fn from_random_elements<F>(
        generators: Vec<Perm>,
        order: u128,
        oracle: F,
        rng: &mut dyn RngCore,
    ) -> Result<Grp>
    where
        F: FnMut(&mut dyn RngCore) -> Perm,
    {
        let chain = schreier::randomized(&generators, order, oracle, rng, None)?;
        Ok(Grp { generators, chain })
    }

    /// Wraps an already-built chain, keeping its strong generators as the
    /// handle's generating set.
    fn from_chain(chain: Chain) -> Grp {
        Grp {
            generators: chain.strong_generators().cloned().collect(),
            chain,
        }
    }

    /// The group order.
    pub fn order(&self) -> u128 {
        self.chain.order()
    }

    /// Whether this is the trivial group.
    pub fn is_trivial(&self) -> bool {
        self.chain.is_empty()
    }

    /// The generating set the handle was built from.
    pub fn generators(&self) -> &[Perm] {
        &self.generators
    }

    /// The base of the underlying chain.
    pub fn base(&self) -> Vec<El> {
        self.chain.base()
    }

    /// The underlying stabilizer chain.
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Membership test by sifting through the chain.
    pub fn contains(&self, g: &Perm) -> bool {
        self.chain.contains(g)
    }

    /// A uniformly distributed element, using the caller's randomness.
    pub fn random_element<R: Rng + ?Sized>(&self, rng: &mut R) -> Perm {
        self.chain.random_element(rng)
    }

    /// The pointwise stabilizer of a sequence of points: the subgroup
    /// fixing every one of them.
    ///
    /// Computed by changing the base to start with the points and cutting
    /// the corresponding chain prefix.
    pub fn point_stabilizer(&self, points: &[El]) -> Result<Grp> {
        self.point_stabilizer_cancellable(points, None)
    }

    /// [`point_stabilizer`][Grp::point_stabilizer] with a cancellation
    /// token.
    pub fn point_stabilizer_cancellable(
        &self,
        points: &[El],
        cancel: Option<&CancelToken>,
    ) -> Result<Grp> {
        let mut wanted: Vec<El> = Vec::new();
        for &p in points {
            if !wanted.contains(&p) {
                wanted.push(p);
            }
        }
        let mut guide = PrescribedBaseGuide::new(wanted.iter().copied());
        let rebased = base_change::base_change(&self.chain, &mut guide, cancel)?;
        Ok(Grp::from_chain(rebased.tail(wanted.len())))
    }

    /// The setwise stabilizer `{ g : S·g = S }` of a set of points.
    pub fn set_stabilizer(&self, set: &[El]) -> Result<Grp> {
        self.set_stabilizer_cancellable(set, None)
    }

    /// [`set_stabilizer`][Grp::set_stabilizer] with a cancellation token.
    pub fn set_stabilizer_cancellable(
        &self,
        set: &[El],
        cancel: Option<&CancelToken>,
    ) -> Result<Grp> {
        let definition = SetwiseStabilizer::new(set);
        let chain = search::subgroup_search(&self.chain, &&definition, cancel)?;
        Ok(Grp::from_chain(chain))
    }

    /// The subgroup permuting the blocks of a partition among themselves.
    pub fn unordered_partition_stabilizer(&self, partition: &Partition) -> Result<Grp> {
        self.unordered_partition_stabilizer_cancellable(partition, None)
    }

    /// [`unordered_partition_stabilizer`][Grp::unordered_partition_stabilizer]
    /// with a cancellation token.
    pub fn unordered_partition_stabilizer_cancellable(
        &self,
        partition: &Partition,
        cancel: Option<&CancelToken>,
    ) -> Result<Grp> {
        let definition = UnorderedPartitionStabilizer::new(partition);
        let chain = search::subgroup_search(&self.chain, &definition, cancel)?;
        Ok(Grp::from_chain(chain))
    }

    /// The intersection with another group.
    pub fn intersection(&self, other: &Grp) -> Result<Grp> {
        self.intersection_cancellable(other, None)
    }

    /// [`intersection`][Grp::intersection] with a cancellation token.
    ///
    /// The other group's chain is re-based onto this group's base so the
    /// search can sift both chains in lockstep.
    pub fn intersection_cancellable(
        &self,
        other: &Grp,
        cancel: Option<&CancelToken>,
    ) -> Result<Grp> {
        let mut guide = PrescribedBaseGuide::new(self.chain.base());
        let rebased = base_change::base_change(&other.chain, &mut guide, cancel)?;
        let definition = IntersectionDefinition::new(&rebased);
        let chain = search::subgroup_search(&self.chain, &definition, cancel)?;
        Ok(Grp::from_chain(chain))
    }
}
