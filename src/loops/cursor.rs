//! Loop cursor
//!
//! A `LoopCursor` walks the items of one query result. Advancing publishes
//! the item into the request's `ActiveItemContext` and fires the loop
//! lifecycle hooks:
//!
//! - `loop_start(loop)` once, before the first item
//! - `the_post(item, loop)` for every item
//! - `loop_end(loop)` once, the first time `has_next` comes back false
//!
//! Cursors are forgiving: advancing past the end or restoring from an outer
//! loop with no position are no-ops. Hook failures propagate.

use log::debug;
use std::rc::Rc;

use crate::domain::ContentItem;
use crate::error::Result;
use crate::hooks::{HookValue, LOOP_END, LOOP_START, THE_POST};
use crate::request::Request;

/// Per-request identifier of a loop
pub type LoopId = u64;

/// Where a cursor is in its traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    /// Nothing advanced yet (index -1)
    BeforeStart,
    /// On an item with more after it
    InProgress,
    /// On the last item, end not yet observed
    AtLast,
    /// `has_next` returned false and `loop_end` fired
    Exhausted,
}

/// Read-only view of a loop handed to hook listeners
#[derive(Debug, Clone, PartialEq)]
pub struct LoopSnapshot {
    pub loop_id: LoopId,
    /// -1 before the first advance
    pub cursor_index: isize,
    pub item_count: usize,
    pub phase: LoopPhase,
    pub in_the_loop: bool,
    pub current: Option<Rc<ContentItem>>,
}

#[derive(Debug, Clone)]
pub struct LoopCursor {
    id: LoopId,
    items: Vec<Rc<ContentItem>>,
    index: Option<usize>,
    ended: bool,
    in_the_loop: bool,
}

impl LoopCursor {
    pub fn new(id: LoopId, items: Vec<Rc<ContentItem>>) -> Self {
        Self {
            id,
            items,
            index: None,
            ended: false,
            in_the_loop: false,
        }
    }

    pub fn id(&self) -> LoopId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Rc<ContentItem>] {
        &self.items
    }

    /// Position of the current item, -1 before the first advance
    pub fn cursor_index(&self) -> isize {
        self.index.map_or(-1, |i| i as isize)
    }

    pub fn current(&self) -> Option<&Rc<ContentItem>> {
        self.index.and_then(|i| self.items.get(i))
    }

    /// True between `loop_start` and `loop_end`
    pub fn in_the_loop(&self) -> bool {
        self.in_the_loop
    }

    pub fn phase(&self) -> LoopPhase {
        match self.index {
            None => LoopPhase::BeforeStart,
            Some(_) if self.ended => LoopPhase::Exhausted,
            Some(i) if i + 1 >= self.items.len() => LoopPhase::AtLast,
            Some(_) => LoopPhase::InProgress,
        }
    }

    pub fn snapshot(&self) -> LoopSnapshot {
        LoopSnapshot {
            loop_id: self.id,
            cursor_index: self.cursor_index(),
            item_count: self.items.len(),
            phase: self.phase(),
            in_the_loop: self.in_the_loop,
            current: self.current().cloned(),
        }
    }

    fn next_index(&self) -> usize {
        self.index.map_or(0, |i| i + 1)
    }

    /// Whether another item is available.
    ///
    /// The first `false` of a traversal fires `loop_end`; later calls just
    /// return `false`. A loop that never had items never started, so it
    /// never ends either.
    pub fn has_next(&mut self, request: &Request) -> Result<bool> {
        if self.next_index() < self.items.len() {
            return Ok(true);
        }

        if !self.ended && !self.items.is_empty() {
            self.ended = true;
            self.in_the_loop = false;
            debug!("Loop {} exhausted after {} items", self.id, self.items.len());
            request.hooks().do_action(LOOP_END, &[self.snapshot().into()])?;
        }
        Ok(false)
    }

    /// Move to the next item and make it the request's current item.
    ///
    /// Returns the new current item, or `None` (and does nothing) when the
    /// loop is empty or already on its last item.
    pub fn advance(&mut self, request: &Request) -> Result<Option<Rc<ContentItem>>> {
        let next = self.next_index();
        if self.ended || next >= self.items.len() {
            debug!("Loop {} advance ignored at index {}", self.id, self.cursor_index());
            return Ok(None);
        }

        self.in_the_loop = true;
        if next == 0 {
            request.hooks().do_action(LOOP_START, &[self.snapshot().into()])?;
        }

        self.index = Some(next);
        let item = self.items[next].clone();
        self.publish(item.clone(), request)?;
        Ok(Some(item))
    }

    /// Rewind to before the first item and re-arm `loop_end`.
    pub fn rewind(&mut self) {
        self.index = None;
        self.ended = false;
        self.in_the_loop = false;
    }

    /// Hand the request context back to an enclosing loop.
    ///
    /// When `outer` is on an item, this cursor is rewound and the context is
    /// repopulated from the outer item the same way `advance` populates it,
    /// without moving `outer`. Returns `false` and changes nothing when
    /// `outer` has no current item.
    pub fn restore_outer(&mut self, outer: &LoopCursor, request: &Request) -> Result<bool> {
        self.restore_from(&outer.snapshot(), request)
    }

    /// Same as `restore_outer`, from a snapshot of the enclosing loop.
    ///
    /// A `the_post` listener gets the snapshot as its second argument while
    /// the outer cursor itself is still borrowed by whoever drives it.
    pub fn restore_from(&mut self, outer: &LoopSnapshot, request: &Request) -> Result<bool> {
        let Some(item) = outer.current.clone() else {
            debug!("Loop {} has no outer position to restore from loop {}", self.id, outer.loop_id);
            return Ok(false);
        };

        self.rewind();
        debug!("Loop {} restored context to loop {} at index {}", self.id, outer.loop_id, outer.cursor_index);

        request.context_mut().setup(item.clone(), outer.loop_id);
        request.hooks().do_action(THE_POST, &[item.into(), outer.clone().into()])?;
        Ok(true)
    }

    fn publish(&self, item: Rc<ContentItem>, request: &Request) -> Result<()> {
        request.context_mut().setup(item.clone(), self.id);
        request.hooks().do_action(THE_POST, &[HookValue::Item(item), self.snapshot().into()])
    }
}
