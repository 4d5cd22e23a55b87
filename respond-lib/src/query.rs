//! Live media queries: the `matchMedia`-style handle and its listeners.

use crate::error::{ListenerError, RespondError, Result};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

type Listener = Rc<RefCell<dyn FnMut(&MediaQueryList) -> std::result::Result<(), ListenerError>>>;

/// Handle returned by [`add_listener`](MediaQueryList::add_listener).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

/// A condition that is re-evaluated on every pass, with change listeners.
///
/// Clones share state; equality is identity.
#[derive(Clone)]
pub struct MediaQueryList {
    inner: Rc<QueryState>,
}

struct QueryState {
    media: String,
    /// Value exposed to callers. Only changes when listeners are notified.
    matches: Cell<bool>,
    /// Value at the end of the previous notification round.
    previous_matches: Cell<bool>,
    /// Accumulated during an evaluation pass, reset at its start.
    pass_matches: Cell<bool>,
    /// Removed listeners leave a `None` slot so indices stay stable while
    /// a notification round is iterating.
    listeners: RefCell<Vec<Option<Listener>>>,
}

impl MediaQueryList {
    pub(crate) fn new(media: &str) -> Self {
        MediaQueryList {
            inner: Rc::new(QueryState {
                media: media.to_string(),
                matches: Cell::new(false),
                previous_matches: Cell::new(false),
                pass_matches: Cell::new(false),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    /// The query text this list was created from.
    pub fn media(&self) -> &str {
        &self.inner.media
    }

    pub fn matches(&self) -> bool {
        self.inner.matches.get()
    }

    /// Registers a callback invoked with this query whenever `matches` flips.
    ///
    /// Listeners run in registration order. One returning `Err` aborts the
    /// rest of the notification round.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: FnMut(&MediaQueryList) -> std::result::Result<(), ListenerError> + 'static,
    {
        let listener: Listener = Rc::new(RefCell::new(listener));
        let mut listeners = self.inner.listeners.borrow_mut();
        listeners.push(Some(listener));
        ListenerId(listeners.len() - 1)
    }

    /// Unregisters a listener. Safe to call from inside a listener; a removed
    /// listener that has not run yet in the current round will not run.
    ///
    /// Returns false when the id was unknown or already removed.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        match self.inner.listeners.borrow_mut().get_mut(id.0) {
            Some(slot) => slot.take().is_some(),
            None => false,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().iter().flatten().count()
    }

    pub(crate) fn begin_pass(&self) {
        self.inner.pass_matches.set(false);
    }

    pub(crate) fn record_match(&self, active: bool) {
        if active {
            self.inner.pass_matches.set(true);
        }
    }

    /// Commits this pass's result. Returns true when the state changed.
    fn commit_pass(&self) -> bool {
        let current = self.inner.pass_matches.get();
        if current == self.inner.previous_matches.get() {
            return false;
        }
        self.inner.previous_matches.set(current);
        self.inner.matches.set(current);
        true
    }

    fn notify_listeners(&self) -> Result<()> {
        // Listeners added during the round wait for the next change.
        let count = self.inner.listeners.borrow().len();
        for index in 0..count {
            let listener = self.inner.listeners.borrow().get(index).cloned().flatten();
            let Some(listener) = listener else {
                continue;
            };
            let mut callback = listener.borrow_mut();
            (&mut *callback)(self).map_err(|source| RespondError::Listener {
                media: self.inner.media.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

impl PartialEq for MediaQueryList {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for MediaQueryList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaQueryList")
            .field("media", &self.inner.media)
            .field("matches", &self.inner.matches.get())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Commits the pass result of each query and notifies listeners of those
/// whose state changed, in the order given.
///
/// The first listener error is returned immediately; queries after it keep
/// their uncommitted state and are picked up by the next pass.
pub(crate) fn dispatch_changes<'a>(
    queries: impl IntoIterator<Item = &'a MediaQueryList>,
) -> Result<()> {
    for query in queries {
        if query.commit_pass() {
            log::debug!("media query `{}` now {}", query.media(), query.matches());
            query.notify_listeners()?;
        }
    }
    Ok(())
}
