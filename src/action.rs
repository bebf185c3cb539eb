//! Group actions on integer points.

use crate::perm::Perm;
use crate::El;

/// A group element acting on non-negative integer points.
///
/// `act` is the right action `k · g`; `act_inv` is the corresponding left
/// action, that is, the action of the inverse element. Implementations must
/// be bijective on `0..=support_max_element()` and the identity past it.
pub trait PermutationAction {
    /// The image `k · g` of a point under the right action.
    fn act(&self, k: El) -> El;

    /// The preimage of a point, i.e. `k · g⁻¹`.
    fn act_inv(&self, k: El) -> El;

    /// The largest point the element's representation could move.
    fn support_max_element(&self) -> El;

    /// Whether the element moves a point.
    fn moves(&self, k: El) -> bool {
        self.act(k) != k
    }

    /// The smallest moved point, or `None` when nothing moves.
    fn support_min(&self) -> Option<El>;

    /// The largest moved point, or `None` when nothing moves.
    fn support_max(&self) -> Option<El>;

    /// The number of moved points.
    fn support_len(&self) -> usize {
        match (self.support_min(), self.support_max()) {
            (Some(min), Some(max)) => (min..=max).filter(|&k| self.moves(k)).count(),
            _ => 0,
        }
    }

    /// The sign of the element: +1 when it is an even product of
    /// transpositions, -1 otherwise.
    ///
    /// The default walks the cycle decomposition: peel off a cycle by
    /// following images until returning to the start, flipping parity at
    /// each step.
    fn sign(&self) -> i32 {
        let (Some(min), Some(max)) = (self.support_min(), self.support_max()) else {
            return 1;
        };
        let mut seen = vec![false; (max - min + 1) as usize];
        let mut odd = false;
        for start in min..=max {
            if seen[(start - min) as usize] || !self.moves(start) {
                continue;
            }
            let mut k = start;
            loop {
                seen[(k - min) as usize] = true;
                k = self.act(k);
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
}

/// A faithful action: two elements are equal iff they agree on all points.
///
/// Marker used by code that deduplicates elements through their images.
pub trait FaithfulPermutationAction: PermutationAction {}

impl PermutationAction for Perm {
    fn act(&self, k: El) -> El {
        self.image(k)
    }

    fn act_inv(&self, k: El) -> El {
        self.inv_image(k)
    }

    fn support_max_element(&self) -> El {
        Perm::support_max_element(self)
    }

    fn support_min(&self) -> Option<El> {
        Perm::support_min(self)
    }

    fn support_max(&self) -> Option<El> {
        Perm::support_max(self)
    }
}

impl FaithfulPermutationAction for Perm {}
