//! Reshaping a chain's base: guided base change and the adjacent base swap.
//!
//! A base change transforms a chain so that its base starts with the points
//! a [`BaseGuide`] advises, without changing the group. The default strategy
//! walks the chain with a running conjugator: a wanted point that is already
//! in the current level's orbit costs one transversal lookup folded into the
//! conjugator, and only wanted points outside the orbit trigger actual
//! surgery (inserting the point below and bubbling it up by adjacent
//! swaps). Rebuilding from scratch with a prescribed base remains available
//! as the slow, obviously correct cross-check.

use tracing::{debug, instrument};

use crate::cancel::{self, CancelToken};
use crate::chain::{Chain, MutableChain};
use crate::error::{Error, Result};
use crate::perm::Perm;
use crate::schreier;
use crate::El;

/// Advises base points for a base change, one level at a time.
///
/// At each level the guide is shown the `easy` candidates (the base points
/// of the remaining chain, whose choice costs no surgery) and a predicate
/// telling which points the remaining chain fixes (choosing one adds only a
/// trivial level). Returning `None` ends the walk and keeps the rest of the
/// chain as it stands.
pub trait BaseGuide {
    /// The next wanted base point.
    fn advise(&mut self, easy: &[El], is_fixed: &mut dyn FnMut(El) -> bool) -> Option<El>;
}

/// Guide that demands an exact base prefix, point by point.
pub struct PrescribedBaseGuide {
    base: std::vec::IntoIter<El>,
}

impl PrescribedBaseGuide {
    /// Guide advising exactly the given points, in order.
    pub fn new(base: impl IntoIterator<Item = El>) -> PrescribedBaseGuide {
        PrescribedBaseGuide {
            base: base.into_iter().collect::<Vec<_>>().into_iter(),
        }
    }
}

impl BaseGuide for PrescribedBaseGuide {
    fn advise(&mut self, _easy: &[El], _is_fixed: &mut dyn FnMut(El) -> bool) -> Option<El> {
        self.base.next()
    }
}

/// Guide that works through an ordered queue of preferred points, skipping
/// points the remaining chain fixes.
///
/// This is the guide behind the partition stabilizer: queue the points
/// block by block and the rebuilt base groups each block's points together.
pub struct PreferredPointsGuide {
    queue: std::vec::IntoIter<El>,
}

impl PreferredPointsGuide {
    /// Guide preferring the given points in order.
    pub fn new(points: impl IntoIterator<Item = El>) -> PreferredPointsGuide {
        PreferredPointsGuide {
            queue: points.into_iter().collect::<Vec<_>>().into_iter(),
        }
    }
}

impl BaseGuide for PreferredPointsGuide {
    fn advise(&mut self, _easy: &[El], is_fixed: &mut dyn FnMut(El) -> bool) -> Option<El> {
        self.queue.find(|&point| !is_fixed(point))
    }
}

/// Exchanges the base points of two adjacent levels in place, preserving
/// the group.
///
/// Everything above `level` is untouched. The two affected transversals are
/// rebuilt, and a sufficient set of elements fixing the new upper base
/// point is discovered from products of the old coset representatives;
/// candidates that already sift through the lower chain are dropped as
/// redundant.
fn swap_adjacent(chain: &mut MutableChain, level: usize) -> Result<()> {
    let beta1 = chain.node(level).beta();
    let beta2 = chain.node(level + 1).beta();
    let old_product = (chain.node(level).orbit_len() * chain.node(level + 1).orbit_len()) as u128;

    let t1 = chain.node(level).transversal().clone();
    let t2 = chain.node(level + 1).transversal().clone();

    // Elements of this level's subgroup fixing beta2: for b in the first
    // orbit, c := beta2 · u(b)⁻¹; when c lies in the second orbit,
    // u₂(c) · u₁(b) fixes beta2. Together with the levels below, these
    // generate the full stabilizer of beta2 at this level.
    let mut candidates = Vec::new();
    for &b in t1.orbit_points() {
        if b == beta1 {
            continue;
        }
        let u1 = t1.u(b).expect("orbit point has a representative");
        let c = t1
            .u_inv(b)
            .expect("orbit point has a representative")
            .image(beta2);
        if let Some(u2) = t2.u(c) {
            let g = u2.op(u1);
            debug_assert_eq!(g.image(beta2), beta2);
            if g.image(beta1) != beta1 {
                candidates.push(g);
            }
        }
    }

    // Swap the base points and redistribute the two levels' own generators:
    // everything moving the new upper point stays at `level`, the rest
    // (fixing it but moving beta1) drops a level.
    let pool: Vec<Perm> = {
        let nodes = &mut chain.nodes;
        let mut pool: Vec<Perm> = nodes[level].own_gens.drain(..).collect();
        pool.extend(nodes[level + 1].own_gens.drain(..));
        nodes[level].beta = beta2;
        nodes[level + 1].beta = beta1;
        pool
    };
    for g in pool {
        if g.image(beta2) != beta2 {
            chain.nodes[level].own_gens.push(g);
        } else {
            chain.nodes[level + 1].own_gens.push(g);
        }
    }
    chain.rebuild_transversal(level);
    chain.rebuild_transversal(level + 1);

    for g in candidates {
        if !sifts_from(chain, level + 1, &g) {
            chain.add_generator(level + 1, g);
        }
    }

    let new_product = (chain.node(level).orbit_len() * chain.node(level + 1).orbit_len()) as u128;
    if new_product != old_product {
        return Err(Error::InvariantViolation {
            reason: format!(
                "base swap at level {level} changed the orbit product from {old_product} to {new_product}"
            ),
        });
    }
    Ok(())
}

fn sifts_from(chain: &MutableChain, level: usize, g: &Perm) -> bool {
    let sift = chain.sift_from(level, g);
    sift.consumed == chain.len() && sift.residue.is_identity()
}

/// Rebuilds a chain so that its base starts with the points the guide
/// advises, by the conjugation-first strategy.
///
/// The group is unchanged: the result describes exactly the same set of
/// permutations, only factored along a different base.
#[instrument(skip_all)]
pub fn base_change(
    chain: &Chain,
    guide: &mut dyn BaseGuide,
    cancel: Option<&CancelToken>,
) -> Result<Chain> {
    let mut mchain = chain.to_mutable();
    let mut conj = Perm::identity();
    let mut conj_inv = Perm::identity();

    let mut level = 0;
    loop {
        cancel::check(cancel)?;
        // The guide speaks in the coordinates of the final, conjugated
        // chain; translate its answer back through the conjugator.
        let easy: Vec<El> = mchain.nodes[level..]
            .iter()
            .map(|node| conj.image(node.beta()))
            .collect();
        let Some(wanted) = guide.advise(&easy, &mut |p| {
            mchain.is_fixed_from(level, conj_inv.image(p))
        }) else {
            break;
        };
        let wanted_pre = conj_inv.image(wanted);

        if mchain.nodes[..level].iter().any(|n| n.beta() == wanted_pre) {
            // Already pinned at an earlier level; advising it again is a
            // no-op.
            continue;
        }

        if level == mchain.len() {
            // Past the chain's end the remaining group is trivial; honor
            // the advice with a trivial level.
            mchain.append_base_point(wanted_pre);
            level += 1;
            continue;
        }

        if mchain.node(level).beta() == wanted_pre {
            level += 1;
            continue;
        }

        if let Some(u) = mchain.node(level).transversal().u(wanted_pre) {
            // The wanted point is in this level's orbit: fold the coset
            // representative into the conjugator and leave the chain alone.
            let u = u.clone();
            debug!(level, wanted, "shifting base point via conjugation");
            conj = u.op(&conj);
            conj_inv = conj_inv.op(&u.inverse());
            level += 1;
            continue;
        }

        // Hard case: insert the wanted point at the deepest position whose
        // remaining generators all fix it, then bubble it up with adjacent
        // swaps.
        let insert_at = (level..mchain.len())
            .rev()
            .find(|&i| {
                mchain.node(i)
                    .own_gens()
                    .iter()
                    .any(|g| g.image(wanted_pre) != wanted_pre)
            })
            .map_or(level, |i| i + 1);
        debug!(level, wanted, insert_at, "inserting base point for swap");
        mchain.insert_trivial_level(insert_at, wanted_pre);
        for i in (level..insert_at).rev() {
            cancel::check(cancel)?;
            swap_adjacent(&mut mchain, i)?;
        }
        level += 1;
    }

    // Swapping can strand trivial levels below the guided prefix; drop
    // them, keeping every advised level.
    mchain.cut_redundant_tail(level);
    mchain.conjugate(&conj, &conj_inv);
    mchain.validate()?;
    Ok(mchain.freeze())
}

/// Base change by rebuilding from scratch: collect the advised base and run
/// the deterministic Schreier–Sims again with the base pre-seeded.
///
/// Correct but expensive; kept as the cross-check for
/// [`base_change`].
pub fn base_change_rebuild(
    chain: &Chain,
    guide: &mut dyn BaseGuide,
    cancel: Option<&CancelToken>,
) -> Result<Chain> {
    let easy = chain.base();
    let mut base = Vec::new();
    while let Some(point) = guide.advise(&easy, &mut |p| chain.is_fixed(p)) {
        if !base.contains(&point) {
            base.push(point);
        }
    }
    let gens: Vec<Perm> = chain.strong_generators().cloned().collect();
    schreier::deterministic_with_base(&gens, &base, cancel)
}
