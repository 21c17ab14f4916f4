//! Active item context and post-data setup
//!
//! One `ActiveItemContext` exists per request. Loop cursors write it when
//! they advance or restore; everything else only reads it.

use std::cell::RefCell;
use std::rc::Rc;

use super::cursor::LoopId;
use crate::domain::ContentItem;

/// Marker that splits a body into sub-pages
pub const PAGE_BREAK: &str = "<!--nextpage-->";

/// Handle to the request's context, shared between cursors and listeners
pub type SharedContext = Rc<RefCell<ActiveItemContext>>;

/// The current item plus its derived render state
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActiveItemContext {
    current: Option<Rc<ContentItem>>,
    owner: Option<LoopId>,
    pages: Vec<String>,
    page: u32,
    total_pages: u32,
    is_multi_page: bool,
    show_full: Option<bool>,
    requested_page: Option<u32>,
}

impl ActiveItemContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `item` current and derive its post-data.
    ///
    /// Idempotent for a given item as long as the requested page and the
    /// show-full flag are not changed in between.
    pub fn setup(&mut self, item: Rc<ContentItem>, owner: LoopId) {
        self.pages = split_pages(&item.body);
        self.total_pages = self.pages.len() as u32;
        self.is_multi_page = self.total_pages > 1;
        self.page = self.requested_page.unwrap_or(1).clamp(1, self.total_pages.max(1));
        if self.show_full.is_none() {
            self.show_full = Some(true);
        }
        self.current = Some(item);
        self.owner = Some(owner);
    }

    /// Request a sub-page; clamped into range on the next setup.
    pub fn set_page(&mut self, page: u32) {
        self.requested_page = Some(page);
    }

    /// Set the display-mode flag for the rest of the request.
    pub fn set_show_full(&mut self, show_full: bool) {
        self.show_full = Some(show_full);
    }

    pub fn current(&self) -> Option<&Rc<ContentItem>> {
        self.current.as_ref()
    }

    /// Loop that last populated this context
    pub fn owner(&self) -> Option<LoopId> {
        self.owner
    }

    /// 1-based sub-page of the current item; 0 when nothing is current
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn is_multi_page(&self) -> bool {
        self.is_multi_page
    }

    /// Defaults to showing full content until a caller says otherwise
    pub fn show_full(&self) -> bool {
        self.show_full.unwrap_or(true)
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    /// Body segment for the current sub-page
    pub fn page_content(&self) -> Option<&str> {
        let index = self.page.checked_sub(1)? as usize;
        self.pages.get(index).map(String::as_str)
    }
}

/// Split a body on `PAGE_BREAK`.
///
/// Newlines hugging a marker belong to the marker, and a marker at the very
/// start does not produce an empty first page. A body without markers is a
/// single page.
pub fn split_pages(body: &str) -> Vec<String> {
    if !body.contains(PAGE_BREAK) {
        return vec![body.to_string()];
    }

    let normalized = body
        .replace(&format!("\n{}\n", PAGE_BREAK), PAGE_BREAK)
        .replace(&format!("\n{}", PAGE_BREAK), PAGE_BREAK)
        .replace(&format!("{}\n", PAGE_BREAK), PAGE_BREAK);
    let normalized = normalized.strip_prefix(PAGE_BREAK).unwrap_or(&normalized);

    normalized.split(PAGE_BREAK).map(str::to_string).collect()
}
