use crate::core::util::even_split::even_split;

/// The rows `[start_row, end_row)` one rank owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPartition {
    pub rank: usize,
    pub start_row: u32,
    pub end_row: u32,
}

impl RowPartition {
    /// Every rank derives its own slice from `(rank, n_ranks, height)` alone,
    /// so no communication is needed for all ranks to agree.
    #[must_use]
    pub fn for_rank(rank: usize, n_ranks: usize, height: u32) -> Self {
        let rows = even_split(rank, n_ranks.max(1), height as usize);

        Self {
            rank,
            start_row: rows.start as u32,
            end_row: rows.end as u32,
        }
    }

    #[must_use]
    pub fn all(n_ranks: usize, height: u32) -> Vec<Self> {
        (0..n_ranks.max(1))
            .map(|rank| Self::for_rank(rank, n_ranks, height))
            .collect()
    }

    #[must_use]
    pub fn rows(&self) -> u32 {
        self.end_row - self.start_row
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows() == 0
    }

    /// Ranks with no rows sit out the halo exchange entirely.
    #[must_use]
    pub fn has_predecessor(&self) -> bool {
        !self.is_empty() && self.start_row > 0
    }

    #[must_use]
    pub fn has_successor(&self, height: u32) -> bool {
        !self.is_empty() && self.end_row < height
    }

    /// Byte offset and length of the owned rows inside the assembled image.
    #[must_use]
    pub fn byte_span(&self, row_bytes: usize) -> std::ops::Range<usize> {
        self.start_row as usize * row_bytes..self.end_row as usize * row_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_rows_over_three_ranks() {
        let parts = RowPartition::all(3, 10);

        let ranges: Vec<(u32, u32)> = parts.iter().map(|p| (p.start_row, p.end_row)).collect();
        assert_eq!(ranges, vec![(0, 4), (4, 7), (7, 10)]);
    }

    #[test]
    fn test_partitions_cover_height_for_many_shapes() {
        for height in 1..50 {
            for n_ranks in 1..20 {
                let parts = RowPartition::all(n_ranks, height);
                let mut next = 0;

                for part in &parts {
                    assert_eq!(part.start_row, next);
                    next = part.end_row;
                }

                assert_eq!(next, height);
                let longest = parts.iter().map(|p| p.rows()).max().unwrap();
                let shortest = parts.iter().map(|p| p.rows()).min().unwrap();
                assert!(longest - shortest <= 1);
            }
        }
    }

    #[test]
    fn test_neighbours() {
        let parts = RowPartition::all(3, 10);

        assert!(!parts[0].has_predecessor());
        assert!(parts[0].has_successor(10));
        assert!(parts[1].has_predecessor() && parts[1].has_successor(10));
        assert!(parts[2].has_predecessor());
        assert!(!parts[2].has_successor(10));
    }

    #[test]
    fn test_empty_ranks_have_no_neighbours() {
        let parts = RowPartition::all(5, 3);

        assert!(parts[3].is_empty());
        assert!(!parts[3].has_predecessor());
        assert!(!parts[3].has_successor(3));
        // the last populated rank has nobody below it
        assert!(!parts[2].has_successor(3));
    }

    #[test]
    fn test_byte_span() {
        let part = RowPartition::for_rank(1, 3, 10);

        assert_eq!(part.byte_span(8), 32..56);
    }
}
