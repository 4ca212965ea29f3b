//! Streaming file responses that own their workspace
//!
//! The response body holds the [`Workspace`] the file lives in. The workspace
//! is removed once the body has been fully read, fails, or is dropped
//! because the client went away, whichever happens first.

use crate::error::{Error, Result};
use crate::types::PackagedResult;
use crate::utils::content_disposition;
use crate::workspace::Workspace;
use axum::{
    body::{Body, Bytes},
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_util::io::ReaderStream;
use tracing::debug;

/// File body stream that releases its workspace when it ends
struct WorkspaceStream {
    inner: ReaderStream<tokio::fs::File>,
    workspace: Option<Workspace>,
}

impl WorkspaceStream {
    fn release(&mut self) {
        let Some(workspace) = self.workspace.take() else {
            return;
        };
        debug!(request_id = %workspace.owner(), "response finished, releasing workspace");

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || drop(workspace));
            }
            Err(_) => drop(workspace),
        }
    }
}

impl Stream for WorkspaceStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let poll = Pin::new(&mut self.inner).poll_next(cx);
        if matches!(poll, Poll::Ready(None) | Poll::Ready(Some(Err(_)))) {
            self.release();
        }
        poll
    }
}

impl Drop for WorkspaceStream {
    fn drop(&mut self) {
        self.release();
    }
}

/// Build an attachment response streaming `result` out of `workspace`
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened; the workspace has been
/// removed by then.
pub async fn file_response(workspace: Workspace, result: &PackagedResult) -> Result<Response> {
    let opened = async {
        let file = tokio::fs::File::open(result.path()).await?;
        let len = file.metadata().await?.len();
        Ok::<_, std::io::Error>((file, len))
    }
    .await;

    let (file, len) = match opened {
        Ok(opened) => opened,
        Err(e) => {
            workspace.destroy_async().await;
            return Err(Error::Io(e));
        }
    };

    let disposition = match HeaderValue::from_str(&content_disposition(result.suggested_name())) {
        Ok(value) => value,
        Err(e) => {
            workspace.destroy_async().await;
            return Err(Error::Internal(format!("invalid content-disposition: {}", e)));
        }
    };

    let stream = WorkspaceStream {
        inner: ReaderStream::new(file),
        workspace: Some(workspace),
    };

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(result.content_type()),
    );
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));

    Ok(response)
}
