//! Chat completions client
//!
//! Unlike [`HttpClient`], non-success responses are errors here: a check
//! calling [`ChatClient::create`] expects a completion back.

use futures_util::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};
use reqwest::Method;
use serde_json::Value;
use std::pin::Pin;
use tracing::debug;

use super::http::{HttpClient, HttpResponse};
use super::sse::SseDecoder;
use super::types::{ChatRequest, Chunk, Completion};
use super::ClientError;

const MODELS_PATH: &str = "/v1/models";
const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Lazy, finite stream of parsed chunks
///
/// The stream ends after `[DONE]`, at end of body, or right after the first
/// error it yields.
pub type ChunkStream = BoxStream<'static, Result<Chunk, ClientError>>;

/// Client for the OpenAI-style chat API
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: HttpClient,
}

impl ChatClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// The underlying raw client
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// `GET /v1/models`, returning the `data` array
    pub async fn list_models(&self) -> Result<Vec<Value>, ClientError> {
        let response = self.http.get(MODELS_PATH).await?;
        let body = success_json(&response)?;
        match body.get("data") {
            Some(Value::Array(models)) => Ok(models.clone()),
            _ => Err(ClientError::Decode(
                "models response has no 'data' array".to_string(),
            )),
        }
    }

    /// Create a non-streaming completion
    pub async fn create(&self, request: &ChatRequest) -> Result<Completion, ClientError> {
        let response = self.http.post_json(COMPLETIONS_PATH, request).await?;
        success_json(&response).map(Completion)
    }

    /// Create a streaming completion
    ///
    /// `stream` is forced on. The HTTP status is checked before any chunk is
    /// read.
    pub async fn create_stream(&self, request: &ChatRequest) -> Result<ChunkStream, ClientError> {
        let request = request.clone().stream(true);
        let response = self
            .http
            .request(Method::POST, COMPLETIONS_PATH, Some(&request))
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let url = response.url().to_string();
            let text = response
                .text()
                .await
                .map_err(|source| ClientError::Transport { url, source })?;
            return Err(ClientError::from_api_response(status, &text));
        }

        debug!(status, model = %request.model, "Streaming completion started");
        Ok(decode_chunks(response.bytes_stream()))
    }

    /// Create a streaming completion and read it to the end
    pub async fn create_stream_collected(
        &self,
        request: &ChatRequest,
    ) -> Result<Vec<Chunk>, ClientError> {
        collect(self.create_stream(request).await?).await
    }
}

/// Drain a chunk stream, stopping at the first error
pub async fn collect(stream: ChunkStream) -> Result<Vec<Chunk>, ClientError> {
    stream.try_collect().await
}

fn success_json(response: &HttpResponse) -> Result<Value, ClientError> {
    if !response.is_success() {
        return Err(ClientError::from_api_response(response.status, &response.body));
    }
    response.json()
}

struct DecodeState<S> {
    bytes: Pin<Box<S>>,
    decoder: SseDecoder,
    eof: bool,
    failed: bool,
}

/// Turn a body byte stream into a stream of chunks
pub(crate) fn decode_chunks<S, B>(bytes: S) -> ChunkStream
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + 'static,
    B: AsRef<[u8]> + Send,
{
    let state = DecodeState {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        eof: false,
        failed: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.failed {
            return None;
        }
        loop {
            if let Some(event) = state.decoder.next_event() {
                let item = parse_chunk(&event.data);
                state.failed = item.is_err();
                return Some((item, state));
            }
            if state.decoder.is_done() {
                return None;
            }
            if state.eof {
                let event = state.decoder.finish()?;
                let item = parse_chunk(&event.data);
                state.failed = item.is_err();
                return Some((item, state));
            }

            match state.bytes.next().await {
                Some(Ok(data)) => state.decoder.push(data.as_ref()),
                Some(Err(e)) => {
                    state.failed = true;
                    return Some((Err(ClientError::Stream(e.to_string())), state));
                }
                None => state.eof = true,
            }
        }
    })
    .boxed()
}

fn parse_chunk(data: &str) -> Result<Chunk, ClientError> {
    serde_json::from_str(data)
        .map(Chunk)
        .map_err(|e| ClientError::Decode(format!("invalid chunk {:?}: {}", data, e)))
}
