//! Push-stream decoding: SSE framing, event classification, delta aggregation.

pub mod aggregator;
pub mod decoder;
pub mod sse;

pub use aggregator::{AggregatedContent, AggregatedMessage, DeltaAggregator};
pub use decoder::{Decoded, StreamDecoder};
pub use sse::{SseEvent, SseParser};

use futures::stream::BoxStream;
use futures::{Stream, StreamExt};

use crate::error::RunError;
use crate::types::StreamUpdate;

/// Turn a raw byte feed into typed updates, preserving arrival order.
///
/// The returned stream ends at the `done` event, at the end of the feed, or
/// after the first error.
pub fn decode_byte_stream<S, B, E>(bytes: S) -> BoxStream<'static, Result<StreamUpdate, RunError>>
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<RunError> + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut parser = SseParser::new();
        let decoder = StreamDecoder::new();
        futures::pin_mut!(bytes);

        'feed: loop {
            let (events, finished) = match bytes.next().await {
                Some(Ok(chunk)) => (parser.push(chunk.as_ref()), false),
                Some(Err(e)) => {
                    let error: RunError = e.into();
                    yield Err(error);
                    break;
                }
                None => (parser.finish().into_iter().collect::<Vec<_>>(), true),
            };

            for event in events {
                match decoder.decode(&event) {
                    Ok(Decoded::Update(update)) => {
                        yield Ok(update);
                    }
                    Ok(Decoded::Skipped) => {}
                    Ok(Decoded::Done) => break 'feed,
                    Err(e) => {
                        yield Err(e);
                        break 'feed;
                    }
                }
            }

            if finished {
                break;
            }
        }
    };
    Box::pin(stream)
}

