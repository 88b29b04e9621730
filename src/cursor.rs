//! A position within the table, expressed as a (page, cell) coordinate.
//!
//! Grounded on the teacher's `storage/cursor.rs`, trimmed to the shapes this
//! core supports: a single leaf root, or (after the one permitted split) an
//! internal root with exactly two leaf children. There is no deeper
//! internal-node descent.

use crate::errors::{Error, InternalError};
use crate::node::{self, NodeType};
use crate::record::Record;
use crate::table::Table;

pub struct Cursor<'a> {
    table: &'a mut Table,
    pub page_num: u32,
    pub cell_num: u32,
    /// The right leaf sibling to hop to once the current leaf is exhausted,
    /// set only when the cursor started under an internal root.
    next_leaf: Option<u32>,
    pub end_of_table: bool,
}

impl<'a> Cursor<'a> {
    /// A cursor positioned at the first cell of the table. If the root has
    /// already been split into an internal node, starts at its left leaf
    /// child and queues the right child as `next_leaf`.
    pub fn table_start(table: &'a mut Table) -> Result<Self, Error> {
        let root_page_num = table.root_page_num;
        let root_type = {
            let page = table.pager.get_page(root_page_num)?;
            node::node_type(page)?
        };

        let (page_num, next_leaf) = match root_type {
            NodeType::Leaf => (root_page_num, None),
            NodeType::Internal => {
                let page = table.pager.get_page(root_page_num)?;
                let left_child = node::internal_child(page, 0);
                let right_child = node::internal_right_child(page);
                (left_child, Some(right_child))
            }
        };

        let num_cells = {
            let page = table.pager.get_page(page_num)?;
            node::leaf_num_cells(page)
        };
        Ok(Cursor {
            table,
            page_num,
            cell_num: 0,
            end_of_table: num_cells == 0 && next_leaf.is_none(),
            next_leaf,
        })
    }

    /// A cursor positioned at `key` if present, else at the position where
    /// it would be inserted.
    pub fn table_find(table: &'a mut Table, key: u32) -> Result<Self, Error> {
        let root_page_num = table.root_page_num;
        let root_type = {
            let page = table.pager.get_page(root_page_num)?;
            node::node_type(page)?
        };
        match root_type {
            NodeType::Leaf => Self::leaf_find(table, root_page_num, key),
            NodeType::Internal => Err(InternalError::InternalNodeSearchUnsupported.into()),
        }
    }

    /// Binary search within a single leaf page for `key`.
    pub fn leaf_find(table: &'a mut Table, page_num: u32, key: u32) -> Result<Self, Error> {
        let num_cells = {
            let page = table.pager.get_page(page_num)?;
            node::leaf_num_cells(page)
        };

        let mut lo = 0u32;
        let mut hi = num_cells;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let page = table.pager.get_page(page_num)?;
            let mid_key = node::leaf_key(page, mid);
            if mid_key == key {
                return Ok(Cursor {
                    table,
                    page_num,
                    cell_num: mid,
                    next_leaf: None,
                    end_of_table: false,
                });
            } else if key < mid_key {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }

        Ok(Cursor {
            table,
            page_num,
            cell_num: lo,
            next_leaf: None,
            end_of_table: false,
        })
    }

    /// The decoded record at the cursor's current cell.
    pub fn value(&mut self) -> Result<Record, Error> {
        let page = self.table.pager.get_page(self.page_num)?;
        let num_cells = node::leaf_num_cells(page);
        if self.cell_num >= num_cells {
            return Err(InternalError::CellOutOfBounds {
                cell_num: self.cell_num,
                num_cells,
            }
            .into());
        }
        Ok(node::leaf_value(page, self.cell_num))
    }

    /// Whether `cell_num` names an existing cell (as opposed to an
    /// insertion point past the last occupied slot).
    pub fn is_at_existing_cell(&mut self) -> Result<bool, Error> {
        let page = self.table.pager.get_page(self.page_num)?;
        Ok(self.cell_num < node::leaf_num_cells(page))
    }

    /// Advances to the next cell, setting `end_of_table` once the current
    /// leaf is exhausted and there's no queued sibling; otherwise hops to
    /// `next_leaf`.
    pub fn advance(&mut self) -> Result<(), Error> {
        self.cell_num += 1;
        let page = self.table.pager.get_page(self.page_num)?;
        if self.cell_num >= node::leaf_num_cells(page) {
            match self.next_leaf.take() {
                Some(next_page_num) => {
                    self.page_num = next_page_num;
                    self.cell_num = 0;
                }
                None => self.end_of_table = true,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn table_start_is_end_of_table_when_empty() {
        let tmp = NamedTempFile::new().unwrap();
        let mut table = Table::db_open(tmp.path()).unwrap();
        let cursor = Cursor::table_start(&mut table).unwrap();
        assert!(cursor.end_of_table);
    }

    #[test]
    fn table_find_locates_insertion_point_in_empty_leaf() {
        let tmp = NamedTempFile::new().unwrap();
        let mut table = Table::db_open(tmp.path()).unwrap();
        let cursor = Cursor::table_find(&mut table, 5).unwrap();
        assert_eq!(cursor.cell_num, 0);
    }
}
