//! Page-load state machine for an incrementally loaded list.
//!
//! The controller never performs I/O itself. [`LoadController::dispatch`]
//! turns a [`Trigger`] into at most one [`PageRequest`], and the caller hands
//! the outcome back through [`LoadController::complete`]. That keeps the
//! machine runnable headlessly and lets the TUI run fetches on background
//! tasks. [`LoadController::drive`] glues both halves together for callers
//! that just want to await a load.

use serde::Deserialize;
use tracing::{debug, info};

use crate::accumulator::ListAccumulator;
use crate::error::FetchError;
use crate::fetcher::PageFetcher;
use crate::types::{Item, Page};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    InitialLoading,
    Refreshing,
    LoadingMore,
    Error,
}

/// External event asking for a load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Mount,
    Refresh,
    EndReached,
}

/// What to do with the cursor after a page shorter than `page_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndOfListPolicy {
    /// Keep requesting the next page on every end-of-list trigger.
    #[default]
    AlwaysAdvance,
    /// Stop requesting once a short page has been applied, until the next
    /// successful mount or refresh.
    StopOnShortPage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub page_size: u32,
    pub end_policy: EndOfListPolicy,
    /// Record load-more failures in [`LoadController::error`] instead of
    /// dropping them.
    pub report_load_more_errors: bool,
}

impl LoadOptions {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            end_policy: EndOfListPolicy::default(),
            report_load_more_errors: false,
        }
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::new(20)
    }
}

/// A page load the caller must perform and report back with `load_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub load_id: u64,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    load_id: u64,
    trigger: Trigger,
    page: u32,
}

#[derive(Debug)]
pub struct LoadController<T> {
    options: LoadOptions,
    phase: Phase,
    cursor: u32,
    list: ListAccumulator<T>,
    error: Option<FetchError>,
    exhausted: bool,
    in_flight: Option<InFlight>,
    next_load_id: u64,
    mounted: bool,
    /// A first page has been applied at least once
    loaded: bool,
}

impl<T> LoadController<T> {
    pub fn new(options: LoadOptions) -> Self {
        Self {
            options,
            phase: Phase::Idle,
            cursor: 1,
            list: ListAccumulator::new(),
            error: None,
            exhausted: false,
            in_flight: None,
            next_load_id: 0,
            mounted: true,
            loaded: false,
        }
    }

    /// Accept or drop `trigger`. Anything arriving while a load is in flight
    /// is dropped, so at most one page request is outstanding at a time.
    pub fn dispatch(&mut self, trigger: Trigger) -> Option<PageRequest> {
        if !self.mounted {
            debug!(?trigger, "dropping trigger after unmount");
            return None;
        }

        let (phase, page) = match (self.phase, trigger) {
            (Phase::Idle | Phase::Error, Trigger::Mount) => (Phase::InitialLoading, 1),
            (Phase::Idle | Phase::Error, Trigger::Refresh) => (Phase::Refreshing, 1),
            (Phase::Idle, Trigger::EndReached) => {
                if self.exhausted {
                    debug!(cursor = self.cursor, "end of list reached, not loading more");
                    return None;
                }
                (Phase::LoadingMore, self.next_page())
            }
            (current, _) => {
                debug!(?trigger, phase = ?current, "dropping trigger");
                return None;
            }
        };

        self.next_load_id += 1;
        let load_id = self.next_load_id;
        self.in_flight = Some(InFlight {
            load_id,
            trigger,
            page,
        });
        self.phase = phase;

        Some(PageRequest {
            load_id,
            page,
            page_size: self.options.page_size,
        })
    }

    /// Apply the outcome of the request tagged `load_id`. Returns false when
    /// the result was ignored (stale id, nothing in flight, or unmounted).
    pub fn complete(&mut self, load_id: u64, result: Result<Page<T>, FetchError>) -> bool {
        if !self.mounted {
            debug!(load_id, "ignoring page after unmount");
            return false;
        }

        let in_flight = match self.in_flight {
            Some(in_flight) if in_flight.load_id == load_id => in_flight,
            _ => {
                debug!(load_id, "ignoring stale page result");
                return false;
            }
        };
        self.in_flight = None;

        match (in_flight.trigger, result) {
            (Trigger::Mount | Trigger::Refresh, Ok(page)) => {
                self.exhausted = self.short_page_ends_list(&page);
                self.list.reset(page);
                self.cursor = 1;
                self.error = None;
                self.loaded = true;
                self.phase = Phase::Idle;
            }
            (Trigger::Mount, Err(err)) => {
                info!(error = %err, "initial load failed");
                self.error = Some(err);
                self.phase = Phase::Error;
            }
            (Trigger::Refresh, Err(err)) => {
                info!(error = %err, "refresh failed");
                self.error = Some(err);
                // Without a first page there is nothing to load more onto.
                self.phase = if self.loaded { Phase::Idle } else { Phase::Error };
            }
            (Trigger::EndReached, Ok(page)) => {
                debug!(page = in_flight.page, items = page.len(), "appending page");
                self.exhausted = self.short_page_ends_list(&page);
                self.list.append(page);
                self.cursor = in_flight.page;
                self.error = None;
                self.phase = Phase::Idle;
            }
            (Trigger::EndReached, Err(err)) => {
                debug!(page = in_flight.page, error = %err, "load more failed");
                if self.options.report_load_more_errors {
                    self.error = Some(err);
                }
                self.phase = Phase::Idle;
            }
        }

        true
    }

    /// Detach from the screen. Later dispatches and completions are no-ops.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.in_flight = None;
    }

    fn short_page_ends_list(&self, page: &Page<T>) -> bool {
        self.options.end_policy == EndOfListPolicy::StopOnShortPage
            && page.is_short(self.options.page_size)
    }

    pub fn items(&self) -> &[T] {
        self.list.items()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Last page applied to the list
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn next_page(&self) -> u32 {
        self.cursor + 1
    }

    /// Initial load or load-more in flight
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::InitialLoading | Phase::LoadingMore)
    }

    pub fn is_refreshing(&self) -> bool {
        self.phase == Phase::Refreshing
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl LoadController<Item> {
    /// Dispatch `trigger` and, if accepted, await the fetch and apply it.
    /// Returns whether a result was applied.
    pub async fn drive(&mut self, fetcher: &dyn PageFetcher, trigger: Trigger) -> bool {
        let Some(request) = self.dispatch(trigger) else {
            return false;
        };
        let result = fetcher.fetch(request.page, request.page_size).await;
        self.complete(request.load_id, result)
    }
}
