//! Success/failure split of a processed table.

use super::Table;

/// The two subsets of a processed table. Both keep the original row order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partitioned {
    /// Rows with a stored image.
    pub success: Table,
    /// Rows without one (failed, or never processed).
    pub failure: Table,
}

impl Table {
    /// Splits the table into disjoint success and failure tables.
    pub fn partition(self) -> Partitioned {
        let mut success = self.empty_like();
        let mut failure = self.empty_like();
        for row in self.into_rows() {
            if row.is_success() {
                success.push(row);
            } else {
                failure.push(row);
            }
        }
        Partitioned { success, failure }
    }
}
