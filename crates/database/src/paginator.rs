use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::client::TableClient;
use crate::error::StorageError;
use crate::filter::ListFilter;
use crate::query::check_ident;

/// One page of a filtered listing plus the exact total across all pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: i64,
    pub page_size: i64,
    pub total_items: u64,
    pub total_pages: i64,
    pub next_page: bool,
}

/// Fetches one page of `resource` and an exact count of every row matching
/// `filter`, as a single logical operation. The two queries are dispatched
/// concurrently; a failure on either aborts the whole call with no partial
/// result and no retry.
///
/// `page` is 1-based and clamped to 1; a `page_size` below 1 is rejected
/// outright. The row range is zero-indexed and inclusive on both ends:
/// `from = (page - 1) * page_size`, `to = from + page_size - 1`.
pub async fn paginate<T, C>(
    client: &C,
    resource: &str,
    page: i64,
    page_size: i64,
    filter: &ListFilter,
) -> Result<Page<T>, StorageError>
where
    T: DeserializeOwned,
    C: TableClient + ?Sized,
{
    check_ident(resource)?;
    if page_size < 1 {
        return Err(StorageError::QueryConstruction(format!(
            "page_size must be at least 1, got {page_size}"
        )));
    }
    let current_page = page.max(1);
    let from = (current_page - 1) * page_size;
    let to = from + page_size - 1;

    let data_query = filter.build_query(Some((from, to)));
    let count_query = filter.build_count_query();
    let (rows, total_items) = futures::try_join!(
        client.fetch(resource, &data_query),
        client.count(resource, &count_query),
    )?;

    let items = rows
        .into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|e| {
                StorageError::remote(format!("failed to decode row from \"{resource}\": {e}"))
            })
        })
        .collect::<Result<Vec<T>, StorageError>>()?;

    let total_pages = total_items.div_ceil(page_size as u64) as i64;
    Ok(Page {
        items,
        current_page,
        page_size,
        total_items,
        total_pages,
        next_page: current_page < total_pages,
    })
}
