//! Navigations and the history they are applied to.

use tracing::debug;

use crate::{IntendedDestination, Location};

/// One navigation request: where to go, how, and what to carry along.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub to: Location,
    /// Replace the current history entry instead of pushing a new one.
    pub replace: bool,
    /// Transient state for the target screen.
    pub state: Option<IntendedDestination>,
}

impl Navigation {
    pub fn push(to: impl Into<Location>) -> Self {
        Self {
            to: to.into(),
            replace: false,
            state: None,
        }
    }

    pub fn replace(to: impl Into<Location>) -> Self {
        Self {
            replace: true,
            ..Self::push(to)
        }
    }

    pub fn with_intended(mut self, intended: IntendedDestination) -> Self {
        self.state = Some(intended);
        self
    }
}

/// Something that can apply navigations: a browser history, a TUI's
/// screen stack, or [`MemoryHistory`] in tests.
pub trait Navigator {
    fn navigate(&mut self, navigation: Navigation);

    fn location(&self) -> &Location;

    /// The intended destination attached to the current entry. Handed
    /// out once; later calls return `None`.
    fn take_intended(&mut self) -> Option<IntendedDestination>;
}

#[derive(Debug, Clone)]
struct Entry {
    location: Location,
    state: Option<IntendedDestination>,
}

/// An in-memory history stack.
///
/// # Concurrency note
///
/// Not thread-safe by itself: a history belongs to one UI, and whoever
/// owns that UI wraps it if it must be shared.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<Entry>,
    index: usize,
}

impl MemoryHistory {
    pub fn new(initial: impl Into<Location>) -> Self {
        Self {
            entries: vec![Entry {
                location: initial.into(),
                state: None,
            }],
            index: 0,
        }
    }

    /// Goes back one entry. Returns `false` at the start of history.
    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Goes forward one entry. Returns `false` at the end of history.
    pub fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Every location in the stack, oldest first.
    pub fn locations(&self) -> Vec<&Location> {
        self.entries.iter().map(|e| &e.location).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn current(&self) -> &Entry {
        &self.entries[self.index]
    }
}

impl Navigator for MemoryHistory {
    fn navigate(&mut self, navigation: Navigation) {
        debug!(to = %navigation.to, replace = navigation.replace, "navigate");
        let entry = Entry {
            location: navigation.to,
            state: navigation.state,
        };
        if navigation.replace {
            self.entries[self.index] = entry;
        } else {
            self.entries.truncate(self.index + 1);
            self.entries.push(entry);
            self.index += 1;
        }
    }

    fn location(&self) -> &Location {
        &self.current().location
    }

    fn take_intended(&mut self) -> Option<IntendedDestination> {
        self.entries[self.index].state.take()
    }
}
