use std::io::Write;

use tracing::info;

use crate::controller::{LoadController, LoadOptions, Phase, Trigger};
use crate::error::{PagewalkError, Result};
use crate::fetcher::PageFetcher;
use crate::types::Item;

/// Load up to `pages` pages headlessly (one mount plus `pages - 1`
/// end-of-list triggers) and write every accumulated item as a JSON line.
/// Returns the number of items written.
pub async fn run<W: Write>(
    fetcher: &dyn PageFetcher,
    options: LoadOptions,
    pages: u32,
    out: &mut W,
) -> Result<usize> {
    let mut controller: LoadController<Item> = LoadController::new(options);

    controller.drive(fetcher, Trigger::Mount).await;
    if let (Phase::Error, Some(err)) = (controller.phase(), controller.error()) {
        return Err(PagewalkError::Fetch(err.clone()));
    }

    // A failed or dropped load-more ends the run; the page is not retried.
    for _ in 1..pages.max(1) {
        let before = controller.cursor();
        let applied = controller.drive(fetcher, Trigger::EndReached).await;
        if !applied || controller.cursor() == before {
            break;
        }
    }

    info!(
        items = controller.items().len(),
        last_page = controller.cursor(),
        "dump finished"
    );

    for item in controller.items() {
        serde_json::to_writer(&mut *out, item).map_err(std::io::Error::from)?;
        writeln!(out)?;
    }
    out.flush()?;

    Ok(controller.items().len())
}
