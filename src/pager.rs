//! File-backed fixed-size page cache.
//!
//! Grounded on the teacher's `storage/table.rs` pager, stripped of its
//! bincode-encoded tablespace/page headers: this format has no metadata
//! page, so `num_pages` is derived purely from file length.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};

use tracing::{debug, trace};

use crate::errors::{Error, InternalError};
use crate::node::{Page, PAGE_SIZE};

pub const TABLE_MAX_PAGES: usize = 100;

/// The resident page slots. Bounded at compile time by `TABLE_MAX_PAGES`,
/// matching the spec's "TABLE_MAX_PAGES bounds total memory" invariant
/// directly in the type rather than as a runtime-checked `Vec`.
type PageSlots = heapless::Vec<Option<Box<Page>>, TABLE_MAX_PAGES>;

pub struct Pager {
    file: File,
    pages: PageSlots,
    /// Pages known to exist on disk at open time, i.e. `file_len / PAGE_SIZE`.
    pages_on_disk: u32,
    num_pages: u32,
}

fn empty_page_slots() -> PageSlots {
    let mut pages = PageSlots::new();
    pages
        .resize(TABLE_MAX_PAGES, None)
        .expect("TABLE_MAX_PAGES is the slot array's own capacity");
    pages
}

impl Pager {
    /// Opens an existing file read-write. The file must already exist and
    /// its length must be an exact multiple of `PAGE_SIZE`; anything else
    /// is reported as a corrupt file rather than silently truncated or
    /// zero-extended.
    pub fn open(path: &std::path::Path) -> Result<Self, Error> {
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = file.seek(SeekFrom::End(0))?;
        if len % PAGE_SIZE as u64 != 0 {
            return Err(InternalError::CorruptFile {
                len,
                page_size: PAGE_SIZE,
            }
            .into());
        }
        let pages_on_disk = (len / PAGE_SIZE as u64) as u32;
        debug!(pages_on_disk, "opened pager");

        Ok(Pager {
            file,
            pages: empty_page_slots(),
            pages_on_disk,
            num_pages: pages_on_disk,
        })
    }

    /// Creates a brand new, empty (zero-page) database file.
    pub fn create(path: &std::path::Path) -> Result<Self, Error> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Pager {
            file,
            pages: empty_page_slots(),
            pages_on_disk: 0,
            num_pages: 0,
        })
    }

    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    /// Returns a mutable reference to the in-memory buffer for `page_num`,
    /// loading it from disk (or zero-initializing it) on first access.
    pub fn get_page(&mut self, page_num: u32) -> Result<&mut Page, Error> {
        if page_num as usize >= TABLE_MAX_PAGES {
            return Err(InternalError::PageOutOfBounds {
                page_num,
                max: TABLE_MAX_PAGES as u32 - 1,
            }
            .into());
        }

        let slot = page_num as usize;
        if self.pages[slot].is_none() {
            let mut page = Box::new([0u8; PAGE_SIZE]);
            if page_num < self.pages_on_disk {
                trace!(page_num, "reading page from disk");
                self.file.seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
                self.file.read_exact(page.as_mut_slice())?;
            }
            self.pages[slot] = Some(page);
            if page_num >= self.num_pages {
                self.num_pages = page_num + 1;
            }
        }

        Ok(self.pages[slot].as_mut().expect("just inserted").as_mut())
    }

    /// Returns the page number to use for the next page allocated by a
    /// split. Allocation is append-only: there is no free list.
    pub fn get_unused_page_num(&self) -> u32 {
        self.num_pages
    }

    /// Writes the full `PAGE_SIZE` bytes of `page_num` back to its file
    /// offset. The slot must already be resident.
    pub fn flush(&mut self, page_num: u32) -> Result<(), Error> {
        let slot = page_num as usize;
        let page = self.pages[slot]
            .as_ref()
            .ok_or(InternalError::FlushEmptySlot(page_num))?;
        self.file.seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
        self.file.write_all(page.as_slice())?;
        Ok(())
    }

    /// Flushes every resident page and syncs the underlying file.
    pub fn close(&mut self) -> Result<(), Error> {
        for page_num in 0..self.num_pages {
            if self.pages[page_num as usize].is_some() {
                self.flush(page_num)?;
            }
        }
        self.file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{initialize_leaf, set_leaf_num_cells};
    use tempfile::NamedTempFile;

    #[test]
    fn create_then_reopen_preserves_pages() {
        let tmp = NamedTempFile::new().unwrap();
        {
            let mut pager = Pager::create(tmp.path()).unwrap();
            let page = pager.get_page(0).unwrap();
            initialize_leaf(page);
            set_leaf_num_cells(page, 5);
            pager.close().unwrap();
        }
        {
            let mut pager = Pager::open(tmp.path()).unwrap();
            assert_eq!(pager.num_pages(), 1);
            let page = pager.get_page(0).unwrap();
            assert_eq!(crate::node::leaf_num_cells(page), 5);
        }
    }

    #[test]
    fn open_rejects_truncated_file() {
        let tmp = NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), vec![0u8; 100]).unwrap();
        let err = Pager::open(tmp.path()).unwrap_err();
        assert!(matches!(
            err,
            Error::Internal(InternalError::CorruptFile { .. })
        ));
    }

    #[test]
    fn get_page_rejects_out_of_bounds() {
        let tmp = NamedTempFile::new().unwrap();
        let mut pager = Pager::create(tmp.path()).unwrap();
        let err = pager.get_page(TABLE_MAX_PAGES as u32).unwrap_err();
        assert!(matches!(
            err,
            Error::Internal(InternalError::PageOutOfBounds { .. })
        ));
    }

    #[test]
    fn get_unused_page_num_tracks_allocation() {
        let tmp = NamedTempFile::new().unwrap();
        let mut pager = Pager::create(tmp.path()).unwrap();
        assert_eq!(pager.get_unused_page_num(), 0);
        pager.get_page(0).unwrap();
        assert_eq!(pager.get_unused_page_num(), 1);
    }
}
