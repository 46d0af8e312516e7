use std::future::Future;

use tokio::io::AsyncWrite;

use crate::http::request::Request;
use crate::http::writer::ResponseWriter;

/// Application callback invoked once per successfully parsed request.
///
/// The handler must drive `writer` through status line, headers, and body
/// before returning. The server does not check that it did; once `handle`
/// returns (or fails) the connection is closed.
pub trait Handler: Send + Sync + 'static {
    fn handle<W>(
        &self,
        writer: &mut ResponseWriter<W>,
        request: &Request,
    ) -> impl Future<Output = anyhow::Result<()>> + Send
    where
        W: AsyncWrite + Unpin + Send;
}
