//! The table facade: root page identity, insert/select dispatch, and the
//! leaf split / root-creation hook.
//!
//! Grounded on the teacher's `storage/table.rs`, with `internal_node_insert`
//! and multi-level internal-node splitting left out: this core supports
//! exactly one level of internal node, created the first time the root
//! leaf overflows.

use std::path::Path;

use tracing::{info, warn};

use crate::cursor::Cursor;
use crate::errors::{Error, InternalError};
use crate::node::{self, NodeType, LEAF_NODE_LEFT_SPLIT_COUNT, LEAF_NODE_MAX_CELLS, LEAF_NODE_RIGHT_SPLIT_COUNT};
use crate::pager::{Pager, TABLE_MAX_PAGES};
use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    Success,
    DuplicateKey,
    TableFull,
}

pub struct Table {
    pub(crate) pager: Pager,
    pub root_page_num: u32,
}

impl Table {
    /// Opens (or creates) the database file at `path`. A freshly created
    /// file gets page 0 materialized as an initialized leaf root.
    pub fn db_open(path: &Path) -> Result<Self, Error> {
        let mut pager = if path.exists() {
            Pager::open(path)?
        } else {
            Pager::create(path)?
        };

        let root_page_num = 0;
        if pager.num_pages() == 0 {
            let root = pager.get_page(root_page_num)?;
            node::initialize_leaf(root);
            node::set_root(root, true);
            info!(path = %path.display(), "initialized new database file");
        }

        Ok(Table { pager, root_page_num })
    }

    /// Flushes every resident page and syncs the file.
    pub fn db_close(mut self) -> Result<(), Error> {
        self.pager.close()
    }

    pub fn execute_insert(&mut self, record: Record) -> Result<InsertResult, Error> {
        let key = record.id;
        let mut cursor = Cursor::table_find(self, key)?;

        if cursor.is_at_existing_cell()? {
            let page = self.pager.get_page(cursor.page_num)?;
            if node::leaf_key(page, cursor.cell_num) == key {
                return Ok(InsertResult::DuplicateKey);
            }
        }

        let page_num = cursor.page_num;
        let cell_num = cursor.cell_num;

        let will_split = {
            let page = self.pager.get_page(page_num)?;
            node::leaf_num_cells(page) as usize >= LEAF_NODE_MAX_CELLS
        };
        // A split allocates the new right sibling (leaf_split_and_insert)
        // and, since only the root ever splits in this core, the left-child
        // copy create_new_root also allocates: two pages, not one.
        const SPLIT_PAGE_COST: usize = 2;
        if will_split && self.pager.num_pages() as usize + SPLIT_PAGE_COST > TABLE_MAX_PAGES {
            return Ok(InsertResult::TableFull);
        }

        self.leaf_insert(page_num, cell_num, key, &record)?;
        Ok(InsertResult::Success)
    }

    pub fn execute_select(&mut self) -> Result<Vec<Record>, Error> {
        let mut records = Vec::new();
        let mut cursor = Cursor::table_start(self)?;
        while !cursor.end_of_table {
            records.push(cursor.value()?);
            cursor.advance()?;
        }
        Ok(records)
    }

    fn leaf_insert(&mut self, page_num: u32, cell_num: u32, key: u32, record: &Record) -> Result<(), Error> {
        let num_cells = {
            let page = self.pager.get_page(page_num)?;
            node::leaf_num_cells(page)
        };

        if num_cells as usize >= LEAF_NODE_MAX_CELLS {
            return self.leaf_split_and_insert(page_num, cell_num, key, record);
        }

        let page = self.pager.get_page(page_num)?;
        for i in (cell_num..num_cells).rev() {
            node::copy_leaf_cell_in_place(page, i, i + 1);
        }
        node::set_leaf_key(page, cell_num, key);
        node::set_leaf_value(page, cell_num, record);
        node::set_leaf_num_cells(page, num_cells + 1);
        Ok(())
    }

    fn leaf_split_and_insert(&mut self, old_page_num: u32, cursor_cell: u32, key: u32, record: &Record) -> Result<(), Error> {
        let was_root = {
            let old = self.pager.get_page(old_page_num)?;
            node::is_root(old)
        };

        let new_page_num = self.pager.get_unused_page_num();
        {
            let new_page = self.pager.get_page(new_page_num)?;
            node::initialize_leaf(new_page);
        }

        for i in (0..=LEAF_NODE_MAX_CELLS as u32).rev() {
            let dest_in_new = i >= LEAF_NODE_LEFT_SPLIT_COUNT as u32;
            let dest_cell = i % LEAF_NODE_LEFT_SPLIT_COUNT as u32;

            if i == cursor_cell {
                if dest_in_new {
                    let new_page = self.pager.get_page(new_page_num)?;
                    node::set_leaf_key(new_page, dest_cell, key);
                    node::set_leaf_value(new_page, dest_cell, record);
                } else {
                    let old_page = self.pager.get_page(old_page_num)?;
                    node::set_leaf_key(old_page, dest_cell, key);
                    node::set_leaf_value(old_page, dest_cell, record);
                }
            } else {
                let src_cell = if i > cursor_cell { i - 1 } else { i };
                if dest_in_new {
                    let old_bytes = *self.pager.get_page(old_page_num)?;
                    let new_page = self.pager.get_page(new_page_num)?;
                    node::copy_leaf_cell(&old_bytes, src_cell, new_page, dest_cell);
                } else {
                    let old_page = self.pager.get_page(old_page_num)?;
                    node::copy_leaf_cell_in_place(old_page, src_cell, dest_cell);
                }
            }
        }

        {
            let old_page = self.pager.get_page(old_page_num)?;
            node::set_leaf_num_cells(old_page, LEAF_NODE_LEFT_SPLIT_COUNT as u32);
        }
        {
            let new_page = self.pager.get_page(new_page_num)?;
            node::set_leaf_num_cells(new_page, LEAF_NODE_RIGHT_SPLIT_COUNT as u32);
        }

        if was_root {
            self.create_new_root(old_page_num, new_page_num)
        } else {
            warn!(page_num = old_page_num, "split of non-root leaf requested");
            Err(InternalError::NonRootSplitUnsupported.into())
        }
    }

    /// Converts the root leaf, now the left child, into the single
    /// supported internal-node shape: one key (the left child's max key)
    /// and two children.
    fn create_new_root(&mut self, old_page_num: u32, new_page_num: u32) -> Result<(), Error> {
        let left_child_page_num = self.pager.get_unused_page_num();
        let old_bytes = *self.pager.get_page(old_page_num)?;
        {
            let left_child = self.pager.get_page(left_child_page_num)?;
            *left_child = old_bytes;
            node::set_root(left_child, false);
        }

        let left_max_key = {
            let left_child = self.pager.get_page(left_child_page_num)?;
            let num_cells = node::leaf_num_cells(left_child);
            node::leaf_key(left_child, num_cells - 1)
        };

        {
            let new_child = self.pager.get_page(new_page_num)?;
            node::set_parent_page_num(new_child, old_page_num);
        }
        {
            let left_child = self.pager.get_page(left_child_page_num)?;
            node::set_parent_page_num(left_child, old_page_num);
        }

        let root = self.pager.get_page(old_page_num)?;
        node::initialize_internal(root);
        node::set_root(root, true);
        node::set_internal_num_keys(root, 1);
        node::set_internal_child(root, 0, left_child_page_num);
        node::set_internal_key(root, 0, left_max_key);
        node::set_internal_right_child(root, new_page_num);

        info!(
            left_child_page_num,
            new_page_num, left_max_key, "promoted leaf root to internal root"
        );
        Ok(())
    }

    /// Prints the leaf cells of `page_num` (cell count, then each index and
    /// key). If `page_num` names an internal node, recurses one level into
    /// its children instead, matching the single root-promotion shape this
    /// core supports.
    pub fn print_leaf(&mut self, page_num: u32) -> Result<String, Error> {
        self.print_node(page_num, 0)
    }

    fn print_node(&mut self, page_num: u32, depth: usize) -> Result<String, Error> {
        let indent = "  ".repeat(depth);
        let page = *self.pager.get_page(page_num)?;

        match node::node_type(&page)? {
            NodeType::Leaf => {
                let num_cells = node::leaf_num_cells(&page);
                let mut out = format!("{indent}leaf (size {num_cells})\n");
                for i in 0..num_cells {
                    out.push_str(&format!("{indent}  - {i} : {}\n", node::leaf_key(&page, i)));
                }
                Ok(out)
            }
            NodeType::Internal => {
                let num_keys = node::internal_num_keys(&page);
                let children: Vec<u32> = (0..num_keys).map(|i| node::internal_child(&page, i)).collect();
                let keys: Vec<u32> = (0..num_keys).map(|i| node::internal_key(&page, i)).collect();
                let right_child = node::internal_right_child(&page);

                let mut out = format!("{indent}internal (size {num_keys})\n");
                for (i, child) in children.into_iter().enumerate() {
                    out.push_str(&self.print_node(child, depth + 1)?);
                    out.push_str(&format!("{indent}- key {}\n", keys[i]));
                }
                out.push_str(&self.print_node(right_child, depth + 1)?);
                Ok(out)
            }
        }
    }

    pub fn print_constants() -> String {
        format!(
            "RECORD_SIZE: {}\nLEAF_NODE_MAX_CELLS: {}\nLEAF_NODE_LEFT_SPLIT_COUNT: {}\nLEAF_NODE_RIGHT_SPLIT_COUNT: {}\nPAGE_SIZE: {}",
            crate::record::RECORD_SIZE,
            LEAF_NODE_MAX_CELLS,
            LEAF_NODE_LEFT_SPLIT_COUNT,
            LEAF_NODE_RIGHT_SPLIT_COUNT,
            node::PAGE_SIZE,
        )
    }

    pub(crate) fn root_node_type(&mut self) -> Result<NodeType, Error> {
        let page = self.pager.get_page(self.root_page_num)?;
        node::node_type(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn record(id: u32) -> Record {
        Record::new(id, format!("user{id}"), format!("user{id}@example.com")).unwrap()
    }

    #[test]
    fn insert_then_select_round_trips() {
        let tmp = NamedTempFile::new().unwrap();
        let mut table = Table::db_open(tmp.path()).unwrap();
        assert_eq!(table.execute_insert(record(1)).unwrap(), InsertResult::Success);
        let rows = table.execute_select().unwrap();
        assert_eq!(rows, vec![record(1)]);
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let tmp = NamedTempFile::new().unwrap();
        let mut table = Table::db_open(tmp.path()).unwrap();
        table.execute_insert(record(1)).unwrap();
        let second = Record::new(1, "other", "other@example.com").unwrap();
        assert_eq!(table.execute_insert(second).unwrap(), InsertResult::DuplicateKey);
        assert_eq!(table.execute_select().unwrap(), vec![record(1)]);
    }

    #[test]
    fn out_of_order_inserts_scan_in_ascending_key_order() {
        let tmp = NamedTempFile::new().unwrap();
        let mut table = Table::db_open(tmp.path()).unwrap();
        for id in [3, 1, 2] {
            table.execute_insert(record(id)).unwrap();
        }
        let rows = table.execute_select().unwrap();
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn fourteenth_insert_splits_the_root_and_survives_reopen() {
        let tmp = NamedTempFile::new().unwrap();
        {
            let mut table = Table::db_open(tmp.path()).unwrap();
            for id in 1..=14u32 {
                assert_eq!(table.execute_insert(record(id)).unwrap(), InsertResult::Success);
            }
            assert_eq!(table.root_node_type().unwrap(), NodeType::Internal);
            table.db_close().unwrap();
        }
        {
            let mut table = Table::db_open(tmp.path()).unwrap();
            // The root is now internal; select descends into both leaf
            // children and still returns every row in key order.
            let keys: Vec<u32> = table.execute_select().unwrap().iter().map(|r| r.id).collect();
            assert_eq!(keys, (1..=14).collect::<Vec<u32>>());
        }
    }

    #[test]
    fn close_then_reopen_preserves_scan_order() {
        let tmp = NamedTempFile::new().unwrap();
        {
            let mut table = Table::db_open(tmp.path()).unwrap();
            for id in [5, 2, 8] {
                table.execute_insert(record(id)).unwrap();
            }
            table.db_close().unwrap();
        }
        let mut table = Table::db_open(tmp.path()).unwrap();
        let rows = table.execute_select().unwrap();
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 5, 8]);
    }
}
