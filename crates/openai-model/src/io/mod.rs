mod sse;

#[cfg(test)]
use std::collections::VecDeque;

use bytes::Bytes;
use reqwest::Response;
pub use sse::{Sse, SseError};

/// Where the raw body bytes come from: a live response, or a prepared queue
/// in tests.
pub enum Chunks {
    Response(Response),
    #[cfg(test)]
    Queue(VecDeque<Bytes>),
}

impl Chunks {
    #[inline]
    pub fn from_response(response: Response) -> Self {
        Chunks::Response(response)
    }

    #[cfg(test)]
    pub fn from_vec_deque(queue: VecDeque<Bytes>) -> Self {
        Chunks::Queue(queue)
    }

    async fn next_chunk(&mut self) -> Result<Option<Bytes>, SseError> {
        match self {
            Chunks::Response(response) => response
                .chunk()
                .await
                .map_err(|err| SseError::Read(err.to_string())),
            #[cfg(test)]
            Chunks::Queue(queue) => Ok(queue.pop_front()),
        }
    }
}
