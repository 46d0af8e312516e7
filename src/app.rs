//! Demo application served by the `httpfromtcp` binary.
//!
//! Routes:
//! - `/yourproblem` → 400
//! - `/myproblem` → 500
//! - `/video` → the configured video file as `video/mp4` (404 if unreadable)
//! - `/chunked/<n>` → `n` lines streamed as chunks, with `X-Content-SHA256`
//!   and `X-Content-Length` trailers
//! - anything else → 200

use std::path::PathBuf;

use sha2::{Digest, Sha256};
use tokio::io::AsyncWrite;

use crate::http::{default_headers, Handler, Headers, Request, ResponseWriter, StatusCode};

pub const DEFAULT_VIDEO_PATH: &str = "assets/vim.mp4";
const MAX_STREAMED_LINES: usize = 1000;

const BAD_REQUEST_PAGE: &str = "<html>
<head>
<title>400 Bad Request</title>
</head>
<body>
<h1>Bad Request</h1>
<p>Your request honestly kinda sucked.</p>
</body>
</html>
";

const INTERNAL_ERROR_PAGE: &str = "<html>
<head>
<title>500 Internal Server Error</title>
</head>
<body>
<h1>Internal Server Error</h1>
<p>Okay, you know what? This one is on me.</p>
</body>
</html>
";

const OK_PAGE: &str = "<html>
<head>
<title>200 OK</title>
</head>
<body>
<h1>Success!</h1>
<p>Your request was an absolute banger.</p>
</body>
</html>
";

const NOT_FOUND_PAGE: &str = "<html>
<head>
<title>404 Not Found</title>
</head>
<body>
<h1>Not Found</h1>
<p>Nothing to see here.</p>
</body>
</html>
";

pub struct DemoHandler {
    video_path: PathBuf,
}

impl DemoHandler {
    pub fn new(video_path: impl Into<PathBuf>) -> Self {
        Self {
            video_path: video_path.into(),
        }
    }
}

impl Default for DemoHandler {
    fn default() -> Self {
        Self::new(DEFAULT_VIDEO_PATH)
    }
}

impl Handler for DemoHandler {
    async fn handle<W>(&self, writer: &mut ResponseWriter<W>, request: &Request) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let target = request.target();

        if target == "/yourproblem" {
            return write_html(writer, StatusCode::BadRequest, BAD_REQUEST_PAGE).await;
        }
        if target == "/myproblem" {
            return write_html(writer, StatusCode::InternalServerError, INTERNAL_ERROR_PAGE).await;
        }
        if target == "/video" {
            return self.write_video(writer).await;
        }
        if let Some(count) = target.strip_prefix("/chunked/") {
            return match count.parse::<usize>() {
                Ok(n) if n <= MAX_STREAMED_LINES => write_stream(writer, n).await,
                _ => write_html(writer, StatusCode::BadRequest, BAD_REQUEST_PAGE).await,
            };
        }

        write_html(writer, StatusCode::Ok, OK_PAGE).await
    }
}

impl DemoHandler {
    async fn write_video<W>(&self, writer: &mut ResponseWriter<W>) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let data = match tokio::fs::read(&self.video_path).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(path = %self.video_path.display(), error = %e, "Video unavailable");
                return write_html(writer, StatusCode::NotFound, NOT_FOUND_PAGE).await;
            }
        };

        let mut headers = default_headers(data.len());
        headers.replace("Content-Type", "video/mp4")?;

        writer.write_status_line(StatusCode::Ok).await?;
        writer.write_headers(&headers).await?;
        writer.write_body(&data).await?;
        Ok(())
    }
}

async fn write_html<W>(writer: &mut ResponseWriter<W>, status: StatusCode, page: &str) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    let mut headers = default_headers(page.len());
    headers.replace("Content-Type", "text/html")?;

    writer.write_status_line(status).await?;
    writer.write_headers(&headers).await?;
    writer.write_body(page.as_bytes()).await?;
    Ok(())
}

async fn write_stream<W>(writer: &mut ResponseWriter<W>, lines: usize) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    let mut headers = default_headers(0);
    headers.remove("Content-Length");
    headers.replace("Transfer-Encoding", "chunked")?;
    headers.replace("Trailer", "X-Content-SHA256, X-Content-Length")?;

    writer.write_status_line(StatusCode::Ok).await?;
    writer.write_headers(&headers).await?;

    let mut hasher = Sha256::new();
    let mut total = 0;
    for i in 0..lines {
        let line = format!("line {}\n", i);
        writer.write_chunked_body(line.as_bytes()).await?;
        hasher.update(line.as_bytes());
        total += line.len();
    }

    let mut trailers = Headers::new();
    trailers.set("X-Content-SHA256", &format!("{:x}", hasher.finalize()))?;
    trailers.set("X-Content-Length", &total.to_string())?;
    writer.write_trailers(&trailers).await?;

    tracing::debug!(lines, bytes = total, "Streamed chunked response");
    Ok(())
}
