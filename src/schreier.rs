//! Chain construction: the deterministic and randomized Schreier–Sims
//! algorithms.
//!
//! Both builders share one output contract: a chain whose order equals the
//! product of its orbit sizes and through which every generator sifts to
//! the identity. The deterministic builder proves completeness by checking
//! every Schreier generator; the randomized builder trades proof for speed
//! and relies on a known target order to decide when it is done.

use rand::RngCore;
use tracing::{debug, instrument};

use crate::cancel::{self, CancelToken};
use crate::chain::{Chain, MutableChain};
use crate::error::{Error, Result};
use crate::perm::Perm;
use crate::El;

/// Sifts an element from a level down and, when it does not reduce to the
/// identity, installs the residue at the level where sifting halted,
/// appending a new base point when the residue fixes the whole base.
///
/// Returns whether the chain grew.
fn install_residue(chain: &mut MutableChain, from_level: usize, g: &Perm) -> bool {
    let sift = chain.sift_from(from_level, g);
    if sift.residue.is_identity() {
        return false;
    }
    let level = sift.consumed;
    if level == chain.len() {
        let beta = sift
            .residue
            .support_min()
            .expect("a non-identity residue moves a point");
        debug!(level, beta, "appending base point");
        chain.append_base_point(beta);
    }
    debug!(level, residue = %sift.residue, "installing strong generator");
    chain.add_generator(level, sift.residue);
    true
}

/// Folds one element into a chain under construction, keeping it a complete
/// BSGS: the element is sift-installed, then the chain is re-closed under
/// its Schreier generators. Returns whether the chain grew.
pub(crate) fn extend_with_element(
    chain: &mut MutableChain,
    g: &Perm,
    cancel: Option<&CancelToken>,
) -> Result<bool> {
    if !install_residue(chain, 0, g) {
        return Ok(false);
    }
    close_under_schreier_generators(chain, cancel)?;
    Ok(true)
}

/// Verifies the chain bottom-up by sifting every Schreier generator
/// `u(α) · s · u_inv(α·s)` through the tail below its level, extending the
/// chain with every residue that fails, until a full pass is clean.
fn close_under_schreier_generators(
    chain: &mut MutableChain,
    cancel: Option<&CancelToken>,
) -> Result<()> {
    loop {
        cancel::check(cancel)?;
        let mut changed = false;
        for level in (0..chain.len()).rev() {
            // A snapshot goes stale as soon as the chain grows, so restart
            // this level until it verifies cleanly.
            'level: loop {
                cancel::check(cancel)?;
                let gens = chain.level_gens(level);
                let points: Vec<El> = chain.node(level).transversal().orbit_points().to_vec();
                for &alpha in &points {
                    for s in &gens {
                        let image = s.image(alpha);
                        let transversal = chain.node(level).transversal();
                        let u = transversal
                            .u(alpha)
                            .expect("orbit point has a representative");
                        let u_inv = transversal
                            .u_inv(image)
                            .expect("orbit is closed under the level's generators");
                        let schreier = u.op(s).op(u_inv);
                        if schreier.is_identity() {
                            continue;
                        }
                        if install_residue(chain, level + 1, &schreier) {
                            changed = true;
                            continue 'level;
                        }
                    }
                }
                break;
            }
        }
        if !changed {
            return Ok(());
        }
    }
}

/// Builds a chain from a generating set by the deterministic Schreier–Sims
/// algorithm.
#[instrument(skip_all, fields(generators = gens.len()))]
pub fn deterministic(gens: &[Perm], cancel: Option<&CancelToken>) -> Result<Chain> {
    let mut chain = MutableChain::new();
    for g in gens {
        cancel::check(cancel)?;
        if !g.is_identity() {
            install_residue(&mut chain, 0, g);
        }
    }
    close_under_schreier_generators(&mut chain, cancel)?;
    chain.validate()?;
    debug!(order = chain.order(), levels = chain.len(), "chain complete");
    Ok(chain.freeze())
}

/// [`deterministic`] with the base pre-seeded: the chain starts from trivial
/// levels at the given points, so the finished base begins with them.
///
/// Points the group does not move stay behind as trivial levels; points the
/// base needs beyond the seed are appended as usual.
#[instrument(skip_all, fields(generators = gens.len(), base = base.len()))]
pub fn deterministic_with_base(
    gens: &[Perm],
    base: &[El],
    cancel: Option<&CancelToken>,
) -> Result<Chain> {
    let mut chain = MutableChain::new();
    for &beta in base {
        chain.append_base_point(beta);
    }
    for g in gens {
        cancel::check(cancel)?;
        if !g.is_identity() {
            install_residue(&mut chain, 0, g);
        }
    }
    close_under_schreier_generators(&mut chain, cancel)?;
    chain.validate()?;
    Ok(chain.freeze())
}

/// [`deterministic`] plus a final order check: a mismatch between the claimed
/// order and the built chain fails with [`Error::IncompleteChain`].
pub fn deterministic_with_order(
    gens: &[Perm],
    order: u128,
    cancel: Option<&CancelToken>,
) -> Result<Chain> {
    let chain = deterministic(gens, cancel)?;
    if chain.order() != order {
        return Err(Error::IncompleteChain {
            claimed: order,
            actual: chain.order(),
        });
    }
    Ok(chain)
}

/// Builds a chain by sifting elements drawn from a random-element oracle
/// until the chain's order reaches the known group order.
///
/// The generators are installed first so the strong generating set is sound
/// even for a poor oracle. Termination is not guaranteed when the oracle is
/// biased away from part of the group; callers wanting a verified result use
/// the deterministic path as fallback, and the cancellation token bounds the
/// wait.
#[instrument(skip_all, fields(generators = gens.len(), order))]
pub fn randomized<F>(
    gens: &[Perm],
    order: u128,
    mut oracle: F,
    rng: &mut dyn RngCore,
    cancel: Option<&CancelToken>,
) -> Result<Chain>
where
    F: FnMut(&mut dyn RngCore) -> Perm,
{
    let mut chain = MutableChain::new();
    for g in gens {
        cancel::check(cancel)?;
        if !g.is_identity() {
            install_residue(&mut chain, 0, g);
        }
    }
    while chain.order() < order {
        cancel::check(cancel)?;
        let g = oracle(rng);
        install_residue(&mut chain, 0, &g);
    }
    if chain.order() != order {
        // The oracle produced elements outside the claimed group.
        return Err(Error::IncompleteChain {
            claimed: order,
            actual: chain.order(),
        });
    }
    chain.validate()?;
    debug!(levels = chain.len(), "randomized chain complete");
    Ok(chain.freeze())
}

/// A cheap random-element oracle: bounded-length random words in the
/// generators.
///
/// Good enough to feed [`randomized`] for well-mixing generating sets; the
/// verified constructors fall back to [`deterministic`] regardless.
pub fn random_word_oracle(gens: &[Perm]) -> impl '_ + FnMut(&mut dyn RngCore) -> Perm {
    use rand::Rng;
    move |rng| {
        if gens.is_empty() {
            return Perm::identity();
        }
        let length = rng.gen_range(8..24);
        let mut g = Perm::identity();
        for _ in 0..length {
            g = g.op(&gens[rng.gen_range(0..gens.len())]);
        }
        g
    }
}
