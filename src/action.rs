use crate::error::FetchError;
use crate::types::{Item, Page};

#[derive(Debug, Clone)]
pub enum Action {
    Quit,
    Back,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    GoToTop,
    GoToBottom,
    Select,
    Resize(u16),

    // Load triggers
    Mount,
    Refresh,
    LoadMore,

    // Fetch completion, tagged with the controller's load id
    PageLoaded {
        load_id: u64,
        result: Result<Page<Item>, FetchError>,
    },

    OpenInBrowser,

    None,
}
