//! Stabilizer chains: the BSGS data model.
//!
//! A chain factors a permutation group along a sequence of base points
//! `β₁, …, β_r`: level `i` holds the orbit and coset representatives of
//! `β_i` under the subgroup fixing all earlier base points, together with
//! the strong generators that first move at this level. The trivial group
//! past the last level is implicit.
//!
//! Chains come in two states. A [`MutableChain`] is owned by exactly one
//! in-progress builder (Schreier–Sims, base change) and never escapes it;
//! [`freeze`][MutableChain::freeze] publishes it as an immutable [`Chain`],
//! which is safe to share and whose observable behavior is deterministic
//! given its inputs. The transition is monotone: a frozen chain is never
//! mutated again, only rebuilt through a fresh builder.

use rand::Rng;
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::perm::Perm;
use crate::transversal::Transversal;
use crate::El;

/// One level of a stabilizer chain.
#[derive(Clone, Debug)]
pub struct ChainNode {
    pub(crate) beta: El,
    pub(crate) transversal: Transversal,
    /// Strong generators that fix all earlier base points and move `beta`.
    pub(crate) own_gens: SmallVec<[Perm; 4]>,
}

impl ChainNode {
    pub(crate) fn trivial(beta: El) -> ChainNode {
        ChainNode {
            beta,
            transversal: Transversal::trivial(beta),
            own_gens: SmallVec::new(),
        }
    }

    /// The base point of this level.
    pub fn beta(&self) -> El {
        self.beta
    }

    /// The coset representative table of this level.
    pub fn transversal(&self) -> &Transversal {
        &self.transversal
    }

    /// The strong generators introduced at this level.
    pub fn own_gens(&self) -> &[Perm] {
        &self.own_gens
    }

    /// The orbit size of this level, one factor of the group order.
    pub fn orbit_len(&self) -> usize {
        self.transversal.len()
    }
}

/// The result of sifting an element through a chain.
#[derive(Clone, Debug)]
pub struct Sift {
    /// How many levels were peeled off before the walk halted.
    pub consumed: usize,
    /// What remains of the element after the peeled levels.
    pub residue: Perm,
}

fn sift_over(nodes: &[ChainNode], g: &Perm) -> Sift {
    let mut residue = g.clone();
    for (i, node) in nodes.iter().enumerate() {
        if residue.is_identity() {
            break;
        }
        let image = residue.image(node.beta);
        let Some(u_inv) = node.transversal.u_inv(image) else {
            return Sift {
                consumed: i,
                residue,
            };
        };
        residue = residue.op(u_inv);
    }
    Sift {
        consumed: nodes.len(),
        residue,
    }
}

/// A frozen, shareable stabilizer chain.
#[derive(Clone, Debug)]
pub struct Chain {
    nodes: Vec<ChainNode>,
}

impl Chain {
    /// The chain of the trivial group.
    pub fn trivial() -> Chain {
        Chain { nodes: Vec::new() }
    }

    /// The number of levels.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the chain describes the trivial group.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The levels in base order.
    pub fn nodes(&self) -> &[ChainNode] {
        &self.nodes
    }

    /// The level at a given depth.
    pub fn node(&self, level: usize) -> &ChainNode {
        &self.nodes[level]
    }

    /// The base: the sequence of base points in chain order.
    pub fn base(&self) -> Vec<El> {
        self.nodes.iter().map(|node| node.beta).collect()
    }

    /// The group order: the product of the orbit sizes.
    pub fn order(&self) -> u128 {
        self.nodes
            .iter()
            .map(|node| node.orbit_len() as u128)
            .product()
    }

    /// Iterates over the strong generating set, the union of every level's
    /// own generators.
    pub fn strong_generators(&self) -> impl Iterator<Item = &Perm> {
        self.nodes.iter().flat_map(|node| node.own_gens.iter())
    }

    /// Reduces an element through the chain, peeling one coset
    /// representative per level.
    ///
    /// At each level, if the image of the level's base point lies in the
    /// level's orbit the matching inverse representative is multiplied on
    /// and the walk advances; otherwise it halts with the partial residue.
    pub fn sift(&self, g: &Perm) -> Sift {
        sift_over(&self.nodes, g)
    }

    /// Whether an element sifts to the identity, i.e. lies in the group.
    pub fn sifts(&self, g: &Perm) -> bool {
        let sift = self.sift(g);
        sift.consumed == self.len() && sift.residue.is_identity()
    }

    /// Membership test; alias of [`sifts`][Chain::sifts].
    pub fn contains(&self, g: &Perm) -> bool {
        self.sifts(g)
    }

    /// Whether every strong generator of the chain fixes a point.
    pub fn is_fixed(&self, k: El) -> bool {
        self.strong_generators().all(|g| g.image(k) == k)
    }

    /// Draws a uniformly distributed element by picking a uniform coset
    /// representative at every level and composing them deepest-first.
    pub fn random_element<R: Rng + ?Sized>(&self, rng: &mut R) -> Perm {
        let mut g = Perm::identity();
        for node in &self.nodes {
            let points = node.transversal.orbit_points();
            let alpha = points[rng.gen_range(0..points.len())];
            let u = node
                .transversal
                .u(alpha)
                .expect("orbit points always have representatives");
            g = u.op(&g);
        }
        g
    }

    /// The sub-chain from a level down: the chain of the subgroup fixing
    /// the first `level` base points.
    pub(crate) fn tail(&self, level: usize) -> Chain {
        Chain {
            nodes: self.nodes[level..].to_vec(),
        }
    }

    /// Reopens a copy of the chain for mutation by a builder.
    pub(crate) fn to_mutable(&self) -> MutableChain {
        MutableChain {
            nodes: self.nodes.clone(),
        }
    }
}

/// A chain under construction, owned by exactly one builder.
#[derive(Debug, Default)]
pub struct MutableChain {
    pub(crate) nodes: Vec<ChainNode>,
}

impl MutableChain {
    /// An empty chain describing the trivial group.
    pub(crate) fn new() -> MutableChain {
        MutableChain::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn node(&self, level: usize) -> &ChainNode {
        &self.nodes[level]
    }

    pub(crate) fn order(&self) -> u128 {
        self.nodes
            .iter()
            .map(|node| node.orbit_len() as u128)
            .product()
    }

    pub(crate) fn sift(&self, g: &Perm) -> Sift {
        sift_over(&self.nodes, g)
    }

    pub(crate) fn sifts(&self, g: &Perm) -> bool {
        let sift = self.sift(g);
        sift.consumed == self.len() && sift.residue.is_identity()
    }

    /// Sifts through the sub-chain starting at a level; `consumed` in the
    /// result is an absolute level.
    pub(crate) fn sift_from(&self, level: usize, g: &Perm) -> Sift {
        let mut sift = sift_over(&self.nodes[level..], g);
        sift.consumed += level;
        sift
    }

    /// The generators of the stabilizer subgroup at a level: all own
    /// generators introduced at this level or deeper.
    pub(crate) fn level_gens(&self, level: usize) -> Vec<Perm> {
        self.nodes[level..]
            .iter()
            .flat_map(|node| node.own_gens.iter().cloned())
            .collect()
    }

    /// Whether every own generator at this level or deeper fixes a point.
    pub(crate) fn is_fixed_from(&self, level: usize, k: El) -> bool {
        self.nodes[level..]
            .iter()
            .all(|node| node.own_gens.iter().all(|g| g.image(k) == k))
    }

    /// Inserts a trivial level at a position.
    ///
    /// Sound only when every own generator at `level` or deeper fixes
    /// `beta`, so the new level's orbit is genuinely `{beta}`.
    pub(crate) fn insert_trivial_level(&mut self, level: usize, beta: El) {
        debug_assert!(self.is_fixed_from(level, beta));
        self.nodes.insert(level, ChainNode::trivial(beta));
    }

    /// Appends a new base point with a trivial level at the end.
    pub(crate) fn append_base_point(&mut self, beta: El) {
        debug_assert!(
            self.nodes.iter().all(|node| node.beta != beta),
            "base points must be distinct"
        );
        self.nodes.push(ChainNode::trivial(beta));
    }

    /// Installs a strong generator at a level and extends the orbits of
    /// this level and every level above it.
    ///
    /// The generator must fix all base points before `level` and move the
    /// base point at `level`.
    pub(crate) fn add_generator(&mut self, level: usize, g: Perm) {
        debug_assert!(self.nodes[..level].iter().all(|n| g.image(n.beta) == n.beta));
        debug_assert_ne!(g.image(self.nodes[level].beta), self.nodes[level].beta);
        self.nodes[level].own_gens.push(g.clone());
        for i in (0..=level).rev() {
            let all_gens = self.level_gens(i);
            self.nodes[i]
                .transversal
                .extend(std::slice::from_ref(&g), &all_gens);
        }
    }

    /// Recomputes a level's transversal from scratch from the current
    /// generators of its stabilizer subgroup.
    pub(crate) fn rebuild_transversal(&mut self, level: usize) {
        let gens = self.level_gens(level);
        let beta = self.nodes[level].beta;
        self.nodes[level].transversal = Transversal::close(beta, &gens);
    }

    /// Conjugates the whole chain by `f`: base points, transversals and
    /// strong generators.
    pub(crate) fn conjugate(&mut self, f: &Perm, f_inv: &Perm) {
        if f.is_identity() {
            return;
        }
        for node in &mut self.nodes {
            node.transversal.conjugate(f, f_inv);
            node.beta = node.transversal.beta();
            for g in &mut node.own_gens {
                *g = f_inv.op(g).op(f);
            }
        }
    }

    /// Drops trailing levels that contribute nothing (orbit of size one,
    /// no own generators), keeping at least the first `keep` levels.
    pub(crate) fn cut_redundant_tail(&mut self, keep: usize) {
        while self.nodes.len() > keep {
            let last = self.nodes.last().expect("length checked above");
            if last.orbit_len() == 1 && last.own_gens.is_empty() {
                self.nodes.pop();
            } else {
                break;
            }
        }
    }

    /// Structural invariant check, run before publication.
    ///
    /// Failures indicate a builder bug and surface as
    /// [`Error::InvariantViolation`]; the chain is discarded, not repaired.
    pub(crate) fn validate(&self) -> Result<()> {
        for (i, node) in self.nodes.iter().enumerate() {
            if self.nodes[..i].iter().any(|n| n.beta == node.beta) {
                return Err(Error::InvariantViolation {
                    reason: format!("duplicate base point {}", node.beta),
                });
            }
            for g in &node.own_gens {
                if g.image(node.beta) == node.beta {
                    return Err(Error::InvariantViolation {
                        reason: format!("own generator at level {i} fixes its base point"),
                    });
                }
                if let Some(n) = self.nodes[..i].iter().find(|n| g.image(n.beta) != n.beta) {
                    return Err(Error::InvariantViolation {
                        reason: format!(
                            "own generator at level {i} moves earlier base point {}",
                            n.beta
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Publishes the chain. The builder is consumed; the result is
    /// immutable from here on.
    pub(crate) fn freeze(self) -> Chain {
        Chain { nodes: self.nodes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sym3_chain() -> MutableChain {
        let mut chain = MutableChain::new();
        chain.append_base_point(0);
        chain.add_generator(0, Perm::from_cycle(&[0, 1, 2]).unwrap());
        chain.add_generator(0, Perm::from_cycle(&[0, 1]).unwrap());
        chain.append_base_point(1);
        chain.add_generator(1, Perm::from_cycle(&[1, 2]).unwrap());
        chain
    }

    #[test]
    fn trivial_chain() {
        let chain = Chain::trivial();
        assert_eq!(chain.order(), 1);
        assert!(chain.contains(&Perm::identity()));
        assert!(!chain.contains(&Perm::from_cycle(&[0, 1]).unwrap()));
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(chain.random_element(&mut rng), Perm::identity());
    }

    #[test]
    fn sym3_by_hand() {
        let chain = sym3_chain();
        assert!(chain.validate().is_ok());
        let chain = chain.freeze();
        assert_eq!(chain.order(), 6);
        assert_eq!(chain.base(), vec![0, 1]);
        assert_eq!(chain.strong_generators().count(), 3);

        for cycles in [vec![vec![0u32, 1]], vec![vec![1, 2]], vec![vec![0, 1, 2]]] {
            assert!(chain.contains(&Perm::from_cycles(&cycles).unwrap()));
        }
        assert!(!chain.contains(&Perm::from_cycle(&[2, 3]).unwrap()));
    }

    #[test]
    fn sift_reports_the_failing_level() {
        let chain = sym3_chain().freeze();
        let outside = Perm::from_cycle(&[0, 3]).unwrap();
        let sift = chain.sift(&outside);
        assert_eq!(sift.consumed, 0);
        assert_eq!(sift.residue, outside);
    }

    #[test]
    fn is_fixed_tracks_strong_generators() {
        let chain = sym3_chain().freeze();
        assert!(!chain.is_fixed(0));
        assert!(!chain.is_fixed(2));
        assert!(chain.is_fixed(3));
        assert!(chain.is_fixed(17));
    }

    #[test]
    fn random_elements_are_members() {
        let chain = sym3_chain().freeze();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            assert!(chain.contains(&chain.random_element(&mut rng)));
        }
    }

    #[test]
    fn validate_rejects_fixing_own_generator() {
        let mut chain = MutableChain::new();
        chain.append_base_point(0);
        chain.nodes[0]
            .own_gens
            .push(Perm::from_cycle(&[1, 2]).unwrap());
        assert!(matches!(
            chain.validate(),
            Err(Error::InvariantViolation { .. })
        ));
    }
}
