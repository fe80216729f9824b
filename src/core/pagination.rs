//! Batch pagination for the legend services.
//!
//! BRT legends come back in fixed-size batches. The caller sends the id of
//! the last record it received and the service answers with the next batch;
//! completion is signalled by `ESITO = 100`, never by a short or empty batch.

use crate::core::mapper;
use crate::core::status::{self, Outcome};
use crate::utils::error::{BrtError, Result};
use serde_json::Value;
use std::fmt::Debug;
use std::future::Future;

pub const STATUS_LEGEND_PAGE_SIZE: usize = 20;
pub const EVENT_LEGEND_PAGE_SIZE: usize = 200;
/// The event legend expects a blank placeholder of this width as the first cursor.
pub const EVENT_LEGEND_INITIAL_CURSOR: &str = "   ";

#[derive(Debug, Clone)]
pub struct LegendSpec<C> {
    pub name: &'static str,
    pub initial_cursor: C,
    pub page_size: usize,
}

impl LegendSpec<i64> {
    pub fn status_legend() -> Self {
        Self {
            name: "legenda_esiti",
            initial_cursor: 0,
            page_size: STATUS_LEGEND_PAGE_SIZE,
        }
    }
}

impl LegendSpec<String> {
    pub fn event_legend() -> Self {
        Self {
            name: "legenda_eventi",
            initial_cursor: EVENT_LEGEND_INITIAL_CURSOR.to_string(),
            page_size: EVENT_LEGEND_PAGE_SIZE,
        }
    }
}

/// Cursor for the next request: key of the last row received in this
/// page, looking no further than `page_size` rows into it. `None` when
/// that row has no usable key.
pub fn next_cursor<R, C>(
    rows: &[R],
    page_size: usize,
    key_of: impl Fn(&R) -> Option<C>,
) -> Option<C> {
    let last = rows.len().min(page_size).checked_sub(1)?;
    key_of(&rows[last])
}

/// Drives `fetch_page` until the service reports end of data.
///
/// `fetch_page` gets the current cursor and must gate and issue exactly one
/// remote call. The cursor is taken from the raw rows, so a row that
/// `parse_row` rejects still moves it. Any failure aborts the whole legend:
/// partial pages are dropped, never returned.
pub async fn collect_legend<T, C, F, Fut, P, K>(
    spec: LegendSpec<C>,
    mut fetch_page: F,
    parse_row: P,
    key_of: K,
) -> Result<Vec<T>>
where
    C: Clone + PartialEq + Debug,
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Result<Value>>,
    P: Fn(&Value) -> Option<T>,
    K: Fn(&Value) -> Option<C>,
{
    let mut cursor = spec.initial_cursor.clone();
    let mut records = Vec::new();
    let mut pages = 0usize;

    loop {
        let response = fetch_page(cursor.clone()).await?;
        pages += 1;

        let outcome = status::check(&response, true)?;
        let rows = mapper::legend_rows(&response);
        let next = next_cursor(&rows, spec.page_size, &key_of);

        tracing::debug!(
            legend = spec.name,
            page = pages,
            rows = rows.len(),
            cursor = ?cursor,
            "Legend page received"
        );
        records.extend(rows.iter().filter_map(&parse_row));

        if outcome == Outcome::Continuation {
            break;
        }

        // Same cursor twice means the next request would repeat this one forever.
        match next {
            Some(next) if next != cursor => cursor = next,
            _ => {
                return Err(BrtError::PaginationStalled {
                    legend: spec.name.to_string(),
                    cursor: format!("{:?}", cursor),
                })
            }
        }
    }

    tracing::info!(
        legend = spec.name,
        pages,
        records = records.len(),
        "Legend fetched"
    );
    Ok(records)
}
