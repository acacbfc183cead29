// crates/engine/src/stream.rs

use domain::setting::StreamSettings;
use domain::{Query, Record};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use crate::fault::guarded_eval;
use crate::page::{Cursor, Page};
use crate::Error;

/// Filter an asynchronous sequence of records on a spawned task.
///
/// One task consumes `input` strictly in arrival order, so matches come out
/// as an order-preserving subsequence of the input. A panicking predicate
/// only costs its own record: the panic is reported on the error stream, the
/// record counts as a non-match, and the task moves on.
///
/// Pagination follows [`crate::filter`]. Once the limit is reached the task
/// returns and drops `input`, which closes a channel-backed producer instead
/// of leaving it blocked. It also stops when the output stream is dropped.
///
/// Both returned streams are bounded (see [`StreamSettings`]); drain them
/// concurrently or the task will wait on whichever one is full.
///
/// Must be called from within a tokio runtime.
pub fn filter_stream<S>(
    input: S,
    query: Option<Query>,
    page: Page,
    settings: &StreamSettings,
) -> (ReceiverStream<S::Item>, ReceiverStream<Error>)
where
    S: Stream + Send + 'static,
    S::Item: Record + Send + 'static,
{
    let (tx_out, rx_out) = mpsc::channel(settings.buffer.max(1));
    let (tx_err, rx_err) = mpsc::channel(settings.error_buffer.max(1));

    tokio::spawn(filter_task(input, query, page, tx_out, tx_err));

    (ReceiverStream::new(rx_out), ReceiverStream::new(rx_err))
}

#[tracing::instrument(skip_all, fields(skip = page.skip, limit = ?page.limit))]
async fn filter_task<S>(
    input: S,
    query: Option<Query>,
    page: Page,
    tx_out: mpsc::Sender<S::Item>,
    tx_err: mpsc::Sender<Error>,
) where
    S: Stream + Send + 'static,
    S::Item: Record + Send + 'static,
{
    let mut input = Box::pin(input);
    let mut cursor = Cursor::new(page);
    let mut index = 0usize;

    if cursor.is_done() {
        debug!("empty page; not consuming input");
        return;
    }

    while let Some(item) = input.next().await {
        let at = index;
        index += 1;

        let hit = match &query {
            None => true,
            Some(q) => match guarded_eval(q, &item, at) {
                Ok(hit) => hit,
                Err(err) => {
                    warn!(%err, "record skipped");
                    if tx_err.send(err).await.is_err() {
                        debug!("error receiver dropped");
                    }
                    false
                }
            },
        };

        if !hit || !cursor.admit() {
            continue;
        }

        if tx_out.send(item).await.is_err() {
            debug!(consumed = index, "output receiver dropped; stopping");
            return;
        }

        if cursor.is_done() {
            debug!(consumed = index, "limit reached; releasing input");
            return;
        }
    }

    debug!(consumed = index, matched = cursor.matched(), "input exhausted");
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::ops::gt;
    use domain::Value;
    use futures::stream;
    use std::time::Duration;
    use tokio::time::timeout;

    const TEST_TIMEOUT: Duration = Duration::from_secs(3);

    fn nums(range: std::ops::RangeInclusive<i64>) -> Vec<Value> {
        range.map(|n| Value::from(serde_json::json!({ "n": n }))).collect()
    }

    fn n_of(v: &Value) -> i64 {
        match v.resolve("n").as_deref() {
            Some(Value::Int(n)) => *n,
            other => panic!("record without n: {other:?}"),
        }
    }

    async fn drain(
        out: ReceiverStream<Value>,
        errs: ReceiverStream<Error>,
    ) -> (Vec<i64>, Vec<Error>) {
        let (out, errs) = timeout(TEST_TIMEOUT, async {
            tokio::join!(out.collect::<Vec<_>>(), errs.collect::<Vec<_>>())
        })
        .await
        .expect("stream filter timed out");
        (out.iter().map(n_of).collect(), errs)
    }

    // ─────────────────────────────────────────────
    // 1. Plain matching preserves order.
    // ─────────────────────────────────────────────

    #[tokio::test(flavor = "current_thread")]
    async fn emits_matches_in_arrival_order() {
        let input = stream::iter(nums(1..=6));
        let q = Query::field("n", gt(3));
        let (out, errs) = filter_stream(input, Some(q), Page::all(), &StreamSettings::default());

        let (got, errors) = drain(out, errs).await;
        assert_eq!(got, vec![4, 5, 6]);
        assert!(errors.is_empty());
    }

    // ─────────────────────────────────────────────
    // 2. Nil query passes everything through, paginated.
    // ─────────────────────────────────────────────

    #[tokio::test(flavor = "current_thread")]
    async fn nil_query_only_paginates() {
        let input = stream::iter(nums(1..=5));
        let (out, errs) = filter_stream(input, None, Page::new(1, 2), &StreamSettings::default());

        let (got, errors) = drain(out, errs).await;
        assert_eq!(got, vec![2, 3]);
        assert!(errors.is_empty());
    }

    // ─────────────────────────────────────────────
    // 3. A panicking item is isolated.
    // ─────────────────────────────────────────────

    #[tokio::test(flavor = "current_thread")]
    async fn panicking_item_is_reported_and_skipped() {
        let input = stream::iter(nums(1..=3));
        let q = Query::field(
            "n",
            Query::predicate(|v| match v {
                Some(Value::Int(2)) => panic!("item two is poisoned"),
                _ => true,
            }),
        );
        let (out, errs) = filter_stream(input, Some(q), Page::all(), &StreamSettings::default());

        let (got, errors) = drain(out, errs).await;
        assert_eq!(got, vec![1, 3]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].index(), 1);
    }

    // ─────────────────────────────────────────────
    // 4. Reaching the limit releases the producer.
    // ─────────────────────────────────────────────

    #[tokio::test(flavor = "current_thread")]
    async fn limit_closes_channel_backed_input() {
        let (tx_in, rx_in) = mpsc::channel::<Value>(1);
        let (out, errs) = filter_stream(
            ReceiverStream::new(rx_in),
            Some(Query::field("n", gt(0))),
            Page::new(0, 2),
            &StreamSettings::default(),
        );

        // The producer would block forever on a full channel if the stage
        // kept its receiver alive after the limit.
        let producer = tokio::spawn(async move {
            let mut sent = 0;
            for v in nums(1..=100) {
                if tx_in.send(v).await.is_err() {
                    break;
                }
                sent += 1;
            }
            sent
        });

        let (got, errors) = drain(out, errs).await;
        assert_eq!(got, vec![1, 2]);
        assert!(errors.is_empty());

        let sent = timeout(TEST_TIMEOUT, producer)
            .await
            .expect("producer stayed blocked")
            .expect("producer panicked");
        assert!(sent < 100, "producer delivered everything: {sent}");
    }

    // ─────────────────────────────────────────────
    // 5. Dropping the output stops the stage.
    // ─────────────────────────────────────────────

    #[tokio::test(flavor = "current_thread")]
    async fn dropped_output_stops_the_stage() {
        let (tx_in, rx_in) = mpsc::channel::<Value>(1);
        let settings = StreamSettings {
            buffer: 1,
            error_buffer: 1,
        };
        let (out, errs) = filter_stream(ReceiverStream::new(rx_in), None, Page::all(), &settings);
        drop(out);
        drop(errs);

        let producer = tokio::spawn(async move {
            for v in nums(1..=10) {
                if tx_in.send(v).await.is_err() {
                    return true;
                }
            }
            false
        });

        let closed = timeout(TEST_TIMEOUT, producer)
            .await
            .expect("producer stayed blocked")
            .expect("producer panicked");
        assert!(closed);
    }
}
