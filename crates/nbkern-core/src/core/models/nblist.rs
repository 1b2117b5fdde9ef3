use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum NeighborListError {
    #[error("Per-entry arrays have mismatched lengths: {outer} outer, {shifts} shifts, {groups} groups")]
    EntryArrays {
        outer: usize,
        shifts: usize,
        groups: usize,
    },
    #[error("Offsets array has length {found}, expected {expected}")]
    OffsetsLength { expected: usize, found: usize },
    #[error("Offsets must start at 0 and end at {inner_len}, found [{first}, .., {last}]")]
    OffsetsBounds {
        first: usize,
        last: usize,
        inner_len: usize,
    },
    #[error("Offsets decrease at entry {entry}")]
    OffsetsNotMonotonic { entry: usize },
    #[error("Entry {entry} refers to particle {particle}, but group of {sites} sites exceeds {n_particles} particles")]
    ParticleOutOfRange {
        entry: usize,
        particle: usize,
        sites: usize,
        n_particles: usize,
    },
    #[error("Entry {entry} uses shift {shift}, but only {n_shifts} shifts exist")]
    ShiftOutOfRange {
        entry: usize,
        shift: usize,
        n_shifts: usize,
    },
    #[error("Entry {entry} uses energy group {group}, but only {n_groups} groups exist")]
    GroupOutOfRange {
        entry: usize,
        group: usize,
        n_groups: usize,
    },
    #[error("Entry {entry} lists particle {inner} which overlaps its own outer group at {outer}")]
    SelfInteraction {
        entry: usize,
        outer: usize,
        inner: usize,
    },
    #[error("Entry {entry} lists inner particle {inner} more than once")]
    DuplicateInner { entry: usize, inner: usize },
}

/// Bounds a list must respect before a kernel may consume it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListLimits {
    pub n_particles: usize,
    pub n_shifts: usize,
    pub n_groups: usize,
    pub outer_sites: usize,
    pub inner_sites: usize,
}

/// A built neighbor list in compressed layout.
///
/// Entry `k` pairs outer group `outer[k]` (placed in periodic image `shift[k]`, accumulating
/// energies into group `group[k]`) with the inner groups `inner[offsets[k]..offsets[k + 1]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborList {
    outer: Vec<usize>,
    shift: Vec<usize>,
    group: Vec<usize>,
    offsets: Vec<usize>,
    inner: Vec<usize>,
}

impl Default for NeighborList {
    fn default() -> Self {
        Self::new()
    }
}

impl NeighborList {
    pub fn new() -> Self {
        Self {
            outer: Vec::new(),
            shift: Vec::new(),
            group: Vec::new(),
            offsets: vec![0],
            inner: Vec::new(),
        }
    }

    /// Wraps externally built arrays after checking their structural consistency.
    pub fn from_raw_parts(
        outer: Vec<usize>,
        shift: Vec<usize>,
        group: Vec<usize>,
        offsets: Vec<usize>,
        inner: Vec<usize>,
    ) -> Result<Self, NeighborListError> {
        if outer.len() != shift.len() || outer.len() != group.len() {
            return Err(NeighborListError::EntryArrays {
                outer: outer.len(),
                shifts: shift.len(),
                groups: group.len(),
            });
        }
        if offsets.len() != outer.len() + 1 {
            return Err(NeighborListError::OffsetsLength {
                expected: outer.len() + 1,
                found: offsets.len(),
            });
        }
        let first = offsets[0];
        let last = offsets[offsets.len() - 1];
        if first != 0 || last != inner.len() {
            return Err(NeighborListError::OffsetsBounds {
                first,
                last,
                inner_len: inner.len(),
            });
        }
        if let Some(entry) = offsets.windows(2).position(|w| w[1] < w[0]) {
            return Err(NeighborListError::OffsetsNotMonotonic { entry });
        }
        Ok(Self {
            outer,
            shift,
            group,
            offsets,
            inner,
        })
    }

    pub fn push_entry<I>(&mut self, outer: usize, shift: usize, group: usize, inner: I)
    where
        I: IntoIterator<Item = usize>,
    {
        self.outer.push(outer);
        self.shift.push(shift);
        self.group.push(group);
        self.inner.extend(inner);
        self.offsets.push(self.inner.len());
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.outer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.outer.is_empty()
    }

    /// Total number of outer/inner group pairs.
    #[inline]
    pub fn inner_len(&self) -> usize {
        self.inner.len()
    }

    pub fn entry(&self, index: usize) -> OuterEntry<'_> {
        self.view().entry(index)
    }

    pub fn view(&self) -> NeighborListView<'_> {
        NeighborListView {
            outer: &self.outer,
            shift: &self.shift,
            group: &self.group,
            offsets: &self.offsets,
            inner: &self.inner,
        }
    }

    /// Checks every precondition the kernels rely on but never test themselves.
    pub fn validate(&self, limits: &ListLimits) -> Result<(), NeighborListError> {
        let mut seen = HashSet::new();
        for (index, entry) in self.view().iter().enumerate() {
            if entry.particle + limits.outer_sites > limits.n_particles {
                return Err(NeighborListError::ParticleOutOfRange {
                    entry: index,
                    particle: entry.particle,
                    sites: limits.outer_sites,
                    n_particles: limits.n_particles,
                });
            }
            if entry.shift >= limits.n_shifts {
                return Err(NeighborListError::ShiftOutOfRange {
                    entry: index,
                    shift: entry.shift,
                    n_shifts: limits.n_shifts,
                });
            }
            if entry.group >= limits.n_groups {
                return Err(NeighborListError::GroupOutOfRange {
                    entry: index,
                    group: entry.group,
                    n_groups: limits.n_groups,
                });
            }

            let outer_range = entry.particle..entry.particle + limits.outer_sites;
            seen.clear();
            for &inner in entry.inner {
                if inner + limits.inner_sites > limits.n_particles {
                    return Err(NeighborListError::ParticleOutOfRange {
                        entry: index,
                        particle: inner,
                        sites: limits.inner_sites,
                        n_particles: limits.n_particles,
                    });
                }
                let inner_range = inner..inner + limits.inner_sites;
                if inner_range.start < outer_range.end && outer_range.start < inner_range.end {
                    return Err(NeighborListError::SelfInteraction {
                        entry: index,
                        outer: entry.particle,
                        inner,
                    });
                }
                if !seen.insert(inner) {
                    return Err(NeighborListError::DuplicateInner {
                        entry: index,
                        inner,
                    });
                }
            }
        }
        Ok(())
    }
}

/// One outer entry as seen by a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OuterEntry<'a> {
    pub particle: usize,
    pub shift: usize,
    pub group: usize,
    pub inner: &'a [usize],
}

/// Borrowed, splittable window onto a contiguous run of entries of a [`NeighborList`].
#[derive(Debug, Clone, Copy)]
pub struct NeighborListView<'a> {
    outer: &'a [usize],
    shift: &'a [usize],
    group: &'a [usize],
    offsets: &'a [usize],
    inner: &'a [usize],
}

impl<'a> NeighborListView<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        self.outer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.outer.is_empty()
    }

    /// Number of outer/inner group pairs covered by this view.
    #[inline]
    pub fn inner_len(&self) -> usize {
        self.offsets[self.outer.len()] - self.offsets[0]
    }

    #[inline]
    pub fn entry(&self, index: usize) -> OuterEntry<'a> {
        OuterEntry {
            particle: self.outer[index],
            shift: self.shift[index],
            group: self.group[index],
            inner: &self.inner[self.offsets[index]..self.offsets[index + 1]],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = OuterEntry<'a>> + use<'a> {
        let view = *self;
        (0..view.len()).map(move |i| view.entry(i))
    }

    pub fn split_at(&self, mid: usize) -> (Self, Self) {
        let (outer_l, outer_r) = self.outer.split_at(mid);
        let (shift_l, shift_r) = self.shift.split_at(mid);
        let (group_l, group_r) = self.group.split_at(mid);
        (
            Self {
                outer: outer_l,
                shift: shift_l,
                group: group_l,
                offsets: &self.offsets[..=mid],
                inner: self.inner,
            },
            Self {
                outer: outer_r,
                shift: shift_r,
                group: group_r,
                offsets: &self.offsets[mid..],
                inner: self.inner,
            },
        )
    }

    /// Splits the view into consecutive windows of at most `entries` outer entries.
    pub fn chunks(&self, entries: usize) -> Vec<Self> {
        let entries = entries.max(1);
        let mut chunks = Vec::with_capacity(self.len().div_ceil(entries));
        let mut rest = *self;
        while rest.len() > entries {
            let (head, tail) = rest.split_at(entries);
            chunks.push(head);
            rest = tail;
        }
        if !rest.is_empty() {
            chunks.push(rest);
        }
        chunks
    }
}

/// Index of the energy-group pair `(a, b)` in a symmetric `n_groups x n_groups` matrix folded to
/// its upper triangle, so `(a, b)` and `(b, a)` share one slot.
pub fn energy_group_pair(a: usize, b: usize, n_groups: usize) -> usize {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    lo * n_groups - lo * (lo + 1) / 2 + hi
}

/// Number of slots produced by [`energy_group_pair`] for `n_groups` groups.
pub fn n_group_pairs(n_groups: usize) -> usize {
    n_groups * (n_groups + 1) / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(n_particles: usize, outer_sites: usize) -> ListLimits {
        ListLimits {
            n_particles,
            n_shifts: 1,
            n_groups: 1,
            outer_sites,
            inner_sites: 1,
        }
    }

    fn sample_list() -> NeighborList {
        let mut list = NeighborList::new();
        list.push_entry(0, 0, 0, [1, 2, 3]);
        list.push_entry(1, 0, 0, []);
        list.push_entry(2, 0, 0, [3]);
        list
    }

    #[test]
    fn push_entry_builds_compressed_ranges() {
        let list = sample_list();
        assert_eq!(list.len(), 3);
        assert_eq!(list.inner_len(), 4);
        assert_eq!(list.entry(0).inner, &[1, 2, 3]);
        assert!(list.entry(1).inner.is_empty());
        assert_eq!(list.entry(2).inner, &[3]);
    }

    #[test]
    fn from_raw_parts_accepts_consistent_arrays() {
        let list = NeighborList::from_raw_parts(
            vec![0, 1],
            vec![0, 0],
            vec![0, 0],
            vec![0, 2, 2],
            vec![1, 2],
        )
        .unwrap();
        assert_eq!(list, {
            let mut l = NeighborList::new();
            l.push_entry(0, 0, 0, [1, 2]);
            l.push_entry(1, 0, 0, []);
            l
        });
    }

    #[test]
    fn from_raw_parts_rejects_decreasing_offsets() {
        let result = NeighborList::from_raw_parts(
            vec![0, 1],
            vec![0, 0],
            vec![0, 0],
            vec![0, 2, 1],
            vec![1],
        );
        assert!(matches!(
            result,
            Err(NeighborListError::OffsetsBounds { .. })
                | Err(NeighborListError::OffsetsNotMonotonic { .. })
        ));

        let result = NeighborList::from_raw_parts(
            vec![0, 1, 2],
            vec![0, 0, 0],
            vec![0, 0, 0],
            vec![0, 2, 1, 2],
            vec![1, 2],
        );
        assert_eq!(
            result,
            Err(NeighborListError::OffsetsNotMonotonic { entry: 1 })
        );
    }

    #[test]
    fn from_raw_parts_rejects_wrong_offsets_length() {
        let result = NeighborList::from_raw_parts(vec![0], vec![0], vec![0], vec![0], vec![]);
        assert_eq!(
            result,
            Err(NeighborListError::OffsetsLength {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn validate_accepts_well_formed_list() {
        assert_eq!(sample_list().validate(&limits(4, 1)), Ok(()));
    }

    #[test]
    fn validate_detects_self_interaction_within_multi_site_group() {
        let mut list = NeighborList::new();
        list.push_entry(0, 0, 0, [2]);
        let result = list.validate(&limits(4, 3));
        assert_eq!(
            result,
            Err(NeighborListError::SelfInteraction {
                entry: 0,
                outer: 0,
                inner: 2
            })
        );
    }

    #[test]
    fn validate_detects_out_of_range_indices() {
        let mut list = NeighborList::new();
        list.push_entry(0, 0, 0, [4]);
        assert!(matches!(
            list.validate(&limits(4, 1)),
            Err(NeighborListError::ParticleOutOfRange { particle: 4, .. })
        ));

        let mut list = NeighborList::new();
        list.push_entry(0, 1, 0, [1]);
        assert!(matches!(
            list.validate(&limits(4, 1)),
            Err(NeighborListError::ShiftOutOfRange { shift: 1, .. })
        ));

        let mut list = NeighborList::new();
        list.push_entry(0, 0, 2, [1]);
        assert!(matches!(
            list.validate(&limits(4, 1)),
            Err(NeighborListError::GroupOutOfRange { group: 2, .. })
        ));
    }

    #[test]
    fn validate_detects_duplicate_inner_particles() {
        let mut list = NeighborList::new();
        list.push_entry(0, 0, 0, [1, 1]);
        assert_eq!(
            list.validate(&limits(2, 1)),
            Err(NeighborListError::DuplicateInner { entry: 0, inner: 1 })
        );
    }

    #[test]
    fn split_views_cover_all_entries_once() {
        let list = sample_list();
        let (left, right) = list.view().split_at(1);
        assert_eq!(left.len(), 1);
        assert_eq!(right.len(), 2);
        assert_eq!(left.inner_len() + right.inner_len(), list.inner_len());
        assert_eq!(right.entry(1).inner, &[3]);
    }

    #[test]
    fn chunks_partition_the_view() {
        let list = sample_list();
        let chunks = list.view().chunks(2);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 2);
        assert_eq!(chunks[1].len(), 1);
        let particles: Vec<_> = chunks
            .iter()
            .flat_map(|c| c.iter().map(|e| e.particle).collect::<Vec<_>>())
            .collect();
        assert_eq!(particles, vec![0, 1, 2]);
    }

    #[test]
    fn chunks_of_empty_view_is_empty() {
        let list = NeighborList::new();
        assert!(list.view().chunks(4).is_empty());
        assert_eq!(list.view().inner_len(), 0);
    }

    #[test]
    fn energy_group_pairs_are_symmetric_and_dense() {
        let n = 3;
        let mut seen = vec![false; n_group_pairs(n)];
        for a in 0..n {
            for b in a..n {
                let id = energy_group_pair(a, b, n);
                assert_eq!(id, energy_group_pair(b, a, n));
                assert!(!seen[id]);
                seen[id] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }
}
