//! Page layout: a thin accessor layer over a raw `[u8; PAGE_SIZE]` buffer.
//!
//! Modeled on the teacher's `storage/btree.rs` node codec, but the page is
//! kept as a plain byte array with offset-based accessors rather than a
//! wrapper struct, and the node-type tag is the opposite polarity from the
//! teacher's `NodeType` (`0 = internal, 1 = leaf` here, matching the layout
//! this engine's on-disk format commits to).

use crate::errors::InternalError;
use crate::record::{self, Record, RECORD_SIZE};

pub const PAGE_SIZE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Internal,
    Leaf,
}

impl NodeType {
    fn to_byte(self) -> u8 {
        match self {
            NodeType::Internal => 0,
            NodeType::Leaf => 1,
        }
    }

    fn from_byte(b: u8) -> Result<Self, InternalError> {
        match b {
            0 => Ok(NodeType::Internal),
            1 => Ok(NodeType::Leaf),
            other => Err(InternalError::InvalidNodeType(other)),
        }
    }
}

// Common node header.
const NODE_TYPE_OFFSET: usize = 0;
const NODE_TYPE_SIZE: usize = 1;
const IS_ROOT_OFFSET: usize = NODE_TYPE_OFFSET + NODE_TYPE_SIZE;
const IS_ROOT_SIZE: usize = 1;
const PARENT_POINTER_OFFSET: usize = IS_ROOT_OFFSET + IS_ROOT_SIZE;
const PARENT_POINTER_SIZE: usize = 4;
const COMMON_NODE_HEADER_SIZE: usize = PARENT_POINTER_OFFSET + PARENT_POINTER_SIZE;

// Leaf node header.
const LEAF_NODE_NUM_CELLS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
const LEAF_NODE_NUM_CELLS_SIZE: usize = 4;
const LEAF_NODE_HEADER_SIZE: usize = LEAF_NODE_NUM_CELLS_OFFSET + LEAF_NODE_NUM_CELLS_SIZE;

// Leaf cell layout.
const LEAF_NODE_KEY_SIZE: usize = 4;
const LEAF_NODE_VALUE_SIZE: usize = RECORD_SIZE;
const LEAF_NODE_CELL_SIZE: usize = LEAF_NODE_KEY_SIZE + LEAF_NODE_VALUE_SIZE;
const LEAF_NODE_SPACE_FOR_CELLS: usize = PAGE_SIZE - LEAF_NODE_HEADER_SIZE;

/// Maximum number of cells a leaf page can hold.
pub const LEAF_NODE_MAX_CELLS: usize = LEAF_NODE_SPACE_FOR_CELLS / LEAF_NODE_CELL_SIZE;

/// On a split, the right node gets the ceiling half and the left the floor
/// half, matching the teacher's `leaf_node_split_and_insert` split point.
pub const LEAF_NODE_RIGHT_SPLIT_COUNT: usize = (LEAF_NODE_MAX_CELLS + 1) / 2;
pub const LEAF_NODE_LEFT_SPLIT_COUNT: usize = LEAF_NODE_MAX_CELLS + 1 - LEAF_NODE_RIGHT_SPLIT_COUNT;

/// Internal node header, used only by the single root-promotion hook.
const INTERNAL_NODE_NUM_KEYS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
const INTERNAL_NODE_NUM_KEYS_SIZE: usize = 4;
const INTERNAL_NODE_RIGHT_CHILD_OFFSET: usize =
    INTERNAL_NODE_NUM_KEYS_OFFSET + INTERNAL_NODE_NUM_KEYS_SIZE;
const INTERNAL_NODE_RIGHT_CHILD_SIZE: usize = 4;
const INTERNAL_NODE_HEADER_SIZE: usize =
    INTERNAL_NODE_RIGHT_CHILD_OFFSET + INTERNAL_NODE_RIGHT_CHILD_SIZE;
const INTERNAL_NODE_CHILD_SIZE: usize = 4;
const INTERNAL_NODE_KEY_SIZE: usize = 4;
const INTERNAL_NODE_CELL_SIZE: usize = INTERNAL_NODE_CHILD_SIZE + INTERNAL_NODE_KEY_SIZE;

pub type Page = [u8; PAGE_SIZE];

pub fn new_page() -> Page {
    [0u8; PAGE_SIZE]
}

pub fn node_type(page: &Page) -> Result<NodeType, InternalError> {
    NodeType::from_byte(page[NODE_TYPE_OFFSET])
}

pub fn set_node_type(page: &mut Page, node_type: NodeType) {
    page[NODE_TYPE_OFFSET] = node_type.to_byte();
}

pub fn is_root(page: &Page) -> bool {
    page[IS_ROOT_OFFSET] != 0
}

pub fn set_root(page: &mut Page, is_root: bool) {
    page[IS_ROOT_OFFSET] = is_root as u8;
}

pub fn parent_page_num(page: &Page) -> u32 {
    read_u32(page, PARENT_POINTER_OFFSET)
}

pub fn set_parent_page_num(page: &mut Page, n: u32) {
    write_u32(page, PARENT_POINTER_OFFSET, n);
}

pub fn leaf_num_cells(page: &Page) -> u32 {
    read_u32(page, LEAF_NODE_NUM_CELLS_OFFSET)
}

pub fn set_leaf_num_cells(page: &mut Page, n: u32) {
    write_u32(page, LEAF_NODE_NUM_CELLS_OFFSET, n);
}

fn leaf_cell_offset(cell_num: u32) -> usize {
    LEAF_NODE_HEADER_SIZE + cell_num as usize * LEAF_NODE_CELL_SIZE
}

pub fn leaf_key(page: &Page, cell_num: u32) -> u32 {
    read_u32(page, leaf_cell_offset(cell_num))
}

pub fn set_leaf_key(page: &mut Page, cell_num: u32, key: u32) {
    write_u32(page, leaf_cell_offset(cell_num), key);
}

pub fn leaf_value(page: &Page, cell_num: u32) -> Record {
    let offset = leaf_cell_offset(cell_num) + LEAF_NODE_KEY_SIZE;
    Record::decode(&page[offset..offset + record::RECORD_SIZE])
}

pub fn set_leaf_value(page: &mut Page, cell_num: u32, record: &Record) {
    let offset = leaf_cell_offset(cell_num) + LEAF_NODE_KEY_SIZE;
    record
        .encode(&mut page[offset..offset + record::RECORD_SIZE])
        .expect("record length validated by caller before reaching the node codec");
}

/// Copies one whole cell (key + value bytes) from one leaf page/slot to
/// another, without decoding the record in between.
pub fn copy_leaf_cell(src: &Page, src_cell: u32, dst: &mut Page, dst_cell: u32) {
    let src_off = leaf_cell_offset(src_cell);
    let dst_off = leaf_cell_offset(dst_cell);
    let cell = src[src_off..src_off + LEAF_NODE_CELL_SIZE].to_vec();
    dst[dst_off..dst_off + LEAF_NODE_CELL_SIZE].copy_from_slice(&cell);
}

/// Same as [`copy_leaf_cell`] but within a single page, for moves that
/// don't cross the old/new page boundary during a split.
pub fn copy_leaf_cell_in_place(page: &mut Page, src_cell: u32, dst_cell: u32) {
    let src_off = leaf_cell_offset(src_cell);
    let dst_off = leaf_cell_offset(dst_cell);
    let cell: [u8; LEAF_NODE_CELL_SIZE] = page[src_off..src_off + LEAF_NODE_CELL_SIZE]
        .try_into()
        .expect("fixed-size cell slice");
    page[dst_off..dst_off + LEAF_NODE_CELL_SIZE].copy_from_slice(&cell);
}

pub fn initialize_leaf(page: &mut Page) {
    *page = new_page();
    set_node_type(page, NodeType::Leaf);
    set_root(page, false);
    set_leaf_num_cells(page, 0);
}

pub fn initialize_internal(page: &mut Page) {
    *page = new_page();
    set_node_type(page, NodeType::Internal);
    set_root(page, false);
    set_internal_num_keys(page, 0);
}

pub fn internal_num_keys(page: &Page) -> u32 {
    read_u32(page, INTERNAL_NODE_NUM_KEYS_OFFSET)
}

pub fn set_internal_num_keys(page: &mut Page, n: u32) {
    write_u32(page, INTERNAL_NODE_NUM_KEYS_OFFSET, n);
}

pub fn internal_right_child(page: &Page) -> u32 {
    read_u32(page, INTERNAL_NODE_RIGHT_CHILD_OFFSET)
}

pub fn set_internal_right_child(page: &mut Page, n: u32) {
    write_u32(page, INTERNAL_NODE_RIGHT_CHILD_OFFSET, n);
}

fn internal_cell_offset(cell_num: u32) -> usize {
    INTERNAL_NODE_HEADER_SIZE + cell_num as usize * INTERNAL_NODE_CELL_SIZE
}

pub fn internal_child(page: &Page, cell_num: u32) -> u32 {
    read_u32(page, internal_cell_offset(cell_num))
}

pub fn set_internal_child(page: &mut Page, cell_num: u32, child: u32) {
    write_u32(page, internal_cell_offset(cell_num), child);
}

pub fn internal_key(page: &Page, cell_num: u32) -> u32 {
    read_u32(page, internal_cell_offset(cell_num) + INTERNAL_NODE_CHILD_SIZE)
}

pub fn set_internal_key(page: &mut Page, cell_num: u32, key: u32) {
    write_u32(page, internal_cell_offset(cell_num) + INTERNAL_NODE_CHILD_SIZE, key);
}

fn read_u32(page: &Page, offset: usize) -> u32 {
    u32::from_le_bytes(page[offset..offset + 4].try_into().expect("4-byte slice"))
}

fn write_u32(page: &mut Page, offset: usize, value: u32) {
    page[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_cells_matches_canonical_record_width() {
        assert_eq!(LEAF_NODE_MAX_CELLS, 13);
    }

    #[test]
    fn split_counts_sum_to_max_plus_one() {
        assert_eq!(
            LEAF_NODE_LEFT_SPLIT_COUNT + LEAF_NODE_RIGHT_SPLIT_COUNT,
            LEAF_NODE_MAX_CELLS + 1
        );
    }

    #[test]
    fn leaf_header_round_trips() {
        let mut page = new_page();
        initialize_leaf(&mut page);
        set_root(&mut page, true);
        set_parent_page_num(&mut page, 42);
        set_leaf_num_cells(&mut page, 3);

        assert_eq!(node_type(&page).unwrap(), NodeType::Leaf);
        assert!(is_root(&page));
        assert_eq!(parent_page_num(&page), 42);
        assert_eq!(leaf_num_cells(&page), 3);
    }

    #[test]
    fn leaf_cell_round_trips() {
        let mut page = new_page();
        initialize_leaf(&mut page);
        let record = Record::new(5, "bob", "bob@example.com").unwrap();
        set_leaf_key(&mut page, 0, 5);
        set_leaf_value(&mut page, 0, &record);

        assert_eq!(leaf_key(&page, 0), 5);
        assert_eq!(leaf_value(&page, 0), record);
    }

    #[test]
    fn invalid_node_type_byte_is_rejected() {
        let mut page = new_page();
        page[NODE_TYPE_OFFSET] = 9;
        assert!(matches!(
            node_type(&page),
            Err(InternalError::InvalidNodeType(9))
        ));
    }

    #[test]
    fn copy_leaf_cell_preserves_key_and_value() {
        let mut src = new_page();
        initialize_leaf(&mut src);
        let record = Record::new(1, "a", "b").unwrap();
        set_leaf_key(&mut src, 0, 1);
        set_leaf_value(&mut src, 0, &record);

        let mut dst = new_page();
        initialize_leaf(&mut dst);
        copy_leaf_cell(&src, 0, &mut dst, 2);

        assert_eq!(leaf_key(&dst, 2), 1);
        assert_eq!(leaf_value(&dst, 2), record);
    }

    #[test]
    fn internal_header_round_trips() {
        let mut page = new_page();
        initialize_internal(&mut page);
        set_internal_num_keys(&mut page, 1);
        set_internal_right_child(&mut page, 7);
        set_internal_child(&mut page, 0, 3);
        set_internal_key(&mut page, 0, 100);

        assert_eq!(node_type(&page).unwrap(), NodeType::Internal);
        assert_eq!(internal_num_keys(&page), 1);
        assert_eq!(internal_right_child(&page), 7);
        assert_eq!(internal_child(&page, 0), 3);
        assert_eq!(internal_key(&page, 0), 100);
    }
}
