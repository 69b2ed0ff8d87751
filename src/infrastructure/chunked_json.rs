// Chunked JSON streaming utilities
use crate::application::streaming_service::StreamFrame;
use crate::infrastructure::http_response::brotli_compress;
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;

/// Wrap a frame stream into a chunked response where every chunk is a
/// 4-byte big-endian length followed by a JSON (optionally Brotli) payload.
pub fn chunked_json_stream<S>(stream: S, compress: bool) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = StreamFrame> + Send + 'static,
{
    let byte_stream = stream.then(move |frame| async move { encode_frame(&frame, compress).await });

    // Frames are compressed individually, so no Content-Encoding header here.
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::TRANSFER_ENCODING, "chunked")
        .body(Body::from_stream(byte_stream))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

async fn encode_frame(frame: &StreamFrame, compress: bool) -> std::io::Result<Bytes> {
    let json = serde_json::to_vec(frame)?;
    let payload = if compress {
        brotli_compress(&json).await?
    } else {
        json
    };

    let mut chunk = BytesMut::with_capacity(4 + payload.len());
    chunk.put_u32(payload.len() as u32);
    chunk.put_slice(&payload);
    Ok(chunk.freeze())
}

pub fn stream_from_receiver(
    mut rx: tokio::sync::mpsc::Receiver<StreamFrame>,
    compress: bool,
) -> impl IntoResponse {
    let stream = async_stream::stream! {
        while let Some(frame) = rx.recv().await {
            yield frame;
        }
    };

    match chunked_json_stream(stream, compress) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
