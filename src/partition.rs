//! Partitions of an integer interval and the unordered partition
//! stabilizer.

use crate::base_change::{BaseGuide, PreferredPointsGuide};
use crate::chain::{Chain, ChainNode};
use crate::error::{Error, Result};
use crate::perm::Perm;
use crate::search::{SearchTest, SubgroupDefinition};
use crate::El;

/// A partition of `0..n` into disjoint non-empty blocks.
///
/// Stored as three parallel arrays: the block id of every point, a
/// canonical starting point per block, and a link from each point to the
/// next point of its block.
#[derive(Clone, Debug)]
pub struct Partition {
    /// Block id of each point.
    index: Vec<u32>,
    /// Canonical (smallest) point of each block.
    start: Vec<El>,
    /// Next point in the same block, in increasing order.
    link: Vec<Option<El>>,
    /// Size of each block.
    block_len: Vec<usize>,
}

impl Partition {
    /// Builds a partition of `0..n` from explicit blocks.
    ///
    /// Every point of the domain must occur in exactly one block.
    pub fn from_blocks(n: usize, blocks: &[Vec<El>]) -> Result<Partition> {
        let mut index = vec![u32::MAX; n];
        for (b, block) in blocks.iter().enumerate() {
            if block.is_empty() {
                return Err(Error::InvalidPartition {
                    domain: n,
                    reason: format!("block {b} is empty"),
                });
            }
            for &p in block {
                let slot =
                    index
                        .get_mut(p as usize)
                        .ok_or_else(|| Error::InvalidPartition {
                            domain: n,
                            reason: format!("point {p} is outside the domain"),
                        })?;
                if *slot != u32::MAX {
                    return Err(Error::InvalidPartition {
                        domain: n,
                        reason: format!("point {p} occurs in two blocks"),
                    });
                }
                *slot = b as u32;
            }
        }
        if let Some(p) = index.iter().position(|&b| b == u32::MAX) {
            return Err(Error::InvalidPartition {
                domain: n,
                reason: format!("point {p} is not covered"),
            });
        }
        Ok(Self::from_index_unchecked(index, blocks.len()))
    }

    /// Builds a partition from the block id of every point.
    ///
    /// Block ids must form a gap-free range `0..k`.
    pub fn from_index_array(index: &[u32]) -> Result<Partition> {
        let blocks = match index.iter().max() {
            Some(&max) => max as usize + 1,
            None => 0,
        };
        let mut seen = vec![false; blocks];
        for &b in index {
            seen[b as usize] = true;
        }
        if let Some(b) = seen.iter().position(|&s| !s) {
            return Err(Error::InvalidPartition {
                domain: index.len(),
                reason: format!("block id {b} is unused"),
            });
        }
        Ok(Self::from_index_unchecked(index.to_vec(), blocks))
    }

    fn from_index_unchecked(index: Vec<u32>, blocks: usize) -> Partition {
        let mut start = vec![El::MAX; blocks];
        let mut link = vec![None; index.len()];
        let mut last: Vec<Option<El>> = vec![None; blocks];
        let mut block_len = vec![0usize; blocks];
        for (p, &b) in index.iter().enumerate() {
            let b = b as usize;
            block_len[b] += 1;
            match last[b] {
                None => start[b] = p as El,
                Some(prev) => link[prev as usize] = Some(p as El),
            }
            last[b] = Some(p as El);
        }
        Partition {
            index,
            start,
            link,
            block_len,
        }
    }

    /// The size of the partitioned domain.
    pub fn domain_len(&self) -> usize {
        self.index.len()
    }

    /// The number of blocks.
    pub fn block_count(&self) -> usize {
        self.start.len()
    }

    /// The block id of a point, or `None` for points outside the domain.
    pub fn block_of(&self, p: El) -> Option<usize> {
        self.index.get(p as usize).map(|&b| b as usize)
    }

    /// The canonical (smallest) point of a block.
    pub fn start(&self, block: usize) -> El {
        self.start[block]
    }

    /// The number of points in a block.
    pub fn block_len(&self, block: usize) -> usize {
        self.block_len[block]
    }

    /// The points of a block in increasing order, following the links.
    pub fn block_points(&self, block: usize) -> impl Iterator<Item = El> + '_ {
        let mut next = Some(self.start[block]);
        std::iter::from_fn(move || {
            let p = next?;
            next = self.link[p as usize];
            Some(p)
        })
    }

    /// Whether a permutation permutes the blocks among themselves.
    ///
    /// For every block, the image of its canonical point picks the required
    /// image block; every other point of the block must map into the same
    /// block, and no point may leave the domain.
    pub fn is_invariant(&self, g: &Perm) -> bool {
        for block in 0..self.block_count() {
            let Some(target) = self.block_of(g.image(self.start(block))) else {
                return false;
            };
            for p in self.block_points(block).skip(1) {
                if self.block_of(g.image(p)) != Some(target) {
                    return false;
                }
            }
        }
        true
    }

    /// All points in block-major order: block 0's points first, then block
    /// 1's, and so on. This is the preferred base order for the stabilizer
    /// search.
    pub fn points_block_major(&self) -> Vec<El> {
        (0..self.block_count())
            .flat_map(|b| self.block_points(b).collect::<Vec<_>>())
            .collect()
    }
}

/// The subgroup leaving a partition invariant as an unordered set of
/// blocks, packaged for the subgroup search driver.
pub struct UnorderedPartitionStabilizer<'a> {
    partition: &'a Partition,
}

impl<'a> UnorderedPartitionStabilizer<'a> {
    /// Defines the stabilizer of the given partition.
    pub fn new(partition: &'a Partition) -> UnorderedPartitionStabilizer<'a> {
        UnorderedPartitionStabilizer { partition }
    }
}

/// Pruning state: a partial map from blocks to their image blocks.
pub struct PartitionStabilizerTest<'a> {
    partition: &'a Partition,
    block_images: Vec<Option<u32>>,
}

impl SearchTest for PartitionStabilizerTest<'_> {
    fn test(&self, _b: El, orbit_image: El, _partial: &Perm, node: &ChainNode) -> Option<Self> {
        let from = self.partition.block_of(node.beta());
        let to = self.partition.block_of(orbit_image);
        match (from, to) {
            (None, None) => Some(PartitionStabilizerTest {
                partition: self.partition,
                block_images: self.block_images.clone(),
            }),
            (Some(from), Some(to)) => {
                match self.block_images[from] {
                    Some(required) if required as usize != to => None,
                    Some(_) => Some(PartitionStabilizerTest {
                        partition: self.partition,
                        block_images: self.block_images.clone(),
                    }),
                    None => {
                        // A bijection maps a block onto a block of the same
                        // size, and two blocks cannot share an image.
                        if self.partition.block_len(from) != self.partition.block_len(to) {
                            return None;
                        }
                        if self.block_images.contains(&Some(to as u32)) {
                            return None;
                        }
                        let mut block_images = self.block_images.clone();
                        block_images[from] = Some(to as u32);
                        Some(PartitionStabilizerTest {
                            partition: self.partition,
                            block_images,
                        })
                    }
                }
            }
            _ => None,
        }
    }
}

impl<'a> SubgroupDefinition for UnorderedPartitionStabilizer<'a> {
    type Test = PartitionStabilizerTest<'a>;

    fn base_guide(&self) -> Option<Box<dyn BaseGuide>> {
        Some(Box::new(PreferredPointsGuide::new(
            self.partition.points_block_major(),
        )))
    }

    fn first_level_test(&self, _chain: &Chain) -> PartitionStabilizerTest<'a> {
        PartitionStabilizerTest {
            partition: self.partition,
            block_images: vec![None; self.partition.block_count()],
        }
    }

    fn in_subgroup(&self, g: &Perm) -> bool {
        self.partition.is_invariant(g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrays_describe_the_blocks() {
        let partition = Partition::from_blocks(5, &[vec![0, 3], vec![1, 2], vec![4]]).unwrap();
        assert_eq!(partition.domain_len(), 5);
        assert_eq!(partition.block_count(), 3);
        assert_eq!(partition.block_of(3), Some(0));
        assert_eq!(partition.block_of(7), None);
        assert_eq!(partition.start(1), 1);
        assert_eq!(partition.block_points(0).collect::<Vec<_>>(), vec![0, 3]);
        assert_eq!(partition.block_points(1).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(partition.points_block_major(), vec![0, 3, 1, 2, 4]);
    }

    #[test]
    fn malformed_partitions_are_rejected() {
        assert!(matches!(
            Partition::from_blocks(4, &[vec![0, 1], vec![1, 2, 3]]),
            Err(Error::InvalidPartition { .. })
        ));
        assert!(matches!(
            Partition::from_blocks(4, &[vec![0, 1], vec![2]]),
            Err(Error::InvalidPartition { .. })
        ));
        assert!(matches!(
            Partition::from_blocks(2, &[vec![0, 1], vec![]]),
            Err(Error::InvalidPartition { .. })
        ));
        assert!(matches!(
            Partition::from_blocks(2, &[vec![0, 1, 5]]),
            Err(Error::InvalidPartition { .. })
        ));
    }

    #[test]
    fn index_array_roundtrip() {
        let partition = Partition::from_index_array(&[0, 0, 1, 1]).unwrap();
        assert_eq!(partition.block_points(1).collect::<Vec<_>>(), vec![2, 3]);
        assert!(matches!(
            Partition::from_index_array(&[0, 2]),
            Err(Error::InvalidPartition { .. })
        ));
    }

    #[test]
    fn invariance_of_the_pair_partition() {
        let partition = Partition::from_blocks(4, &[vec![0, 1], vec![2, 3]]).unwrap();
        // Swapping the blocks wholesale is fine; splitting them is not.
        assert!(partition.is_invariant(&Perm::from_cycles(&[&[0u32, 2], &[1, 3]]).unwrap()));
        assert!(partition.is_invariant(&Perm::from_cycle(&[0, 1]).unwrap()));
        assert!(partition.is_invariant(&Perm::identity()));
        assert!(!partition.is_invariant(&Perm::from_cycle(&[0, 2]).unwrap()));
        assert!(!partition.is_invariant(&Perm::from_cycle(&[1, 2]).unwrap()));
        // Leaving the domain breaks invariance.
        assert!(!partition.is_invariant(&Perm::from_cycle(&[3, 4]).unwrap()));
    }
}
