//! Envelope transport over stdio: one inbound envelope per input line, one
//! outbound envelope per output line.

mod io;

use std::path::Path;

use tokio::io::{AsyncBufRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::{error::AppResult, gateway::Gateway};

pub use io::NdjsonIo;

pub async fn run(gateway: Gateway) -> AppResult<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    serve(&gateway, stdin, tokio::io::stdout()).await?;
    Ok(())
}

/// Answers every non-blank line until end of input and hands the writer back.
pub async fn serve<R, W>(gateway: &Gateway, reader: R, writer: W) -> AppResult<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut io = NdjsonIo::new(reader, writer);
    let mut handled = 0usize;

    loop {
        let Some(line) = io.read_line().await? else { break };
        if line.trim().is_empty() {
            continue;
        }
        let raw = line.to_string();

        let resp = gateway.handle_raw(&raw).await;
        io.write_json_line(&resp).await?;
        handled += 1;
    }

    tracing::info!(handled, "input closed");
    Ok(io.into_writer())
}

/// Handles the single envelope stored at `path` ("-" for stdin).
pub async fn run_once(gateway: &Gateway, path: &Path) -> AppResult<()> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf
    } else {
        tokio::fs::read_to_string(path).await?
    };

    let resp = gateway.handle_raw(&raw).await;
    let mut out = serde_json::to_vec(&resp)?;
    out.push(b'\n');

    let mut stdout = tokio::io::stdout();
    stdout.write_all(&out).await?;
    stdout.flush().await?;
    Ok(())
}
