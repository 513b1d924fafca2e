//! Interactive session loop bridging the console to a remote process.
//!
//! The loop multiplexes two event sources: the exec output stream (frames
//! of remote stdout/stderr) and console input lines. Output frames are
//! written to the console as they arrive; console lines are forwarded to
//! the remote stdin with a newline appended and flushed immediately. The
//! literal line `exit` is the sentinel: it is forwarded, then the input
//! side closes and the remaining output is drained to stream end.

use bollard::container::LogOutput;
use futures::{Stream, StreamExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::error::SessionError;

/// Console line that ends the input side of a session.
pub const SENTINEL: &str = "exit";

/// Result of a completed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    /// Exit code of the remote process, when the daemon reported one.
    pub exit_code: Option<i64>,
}

/// Drives an interactive session to completion.
///
/// Returns when the output stream ends (the remote process terminated or
/// the daemon closed the attachment). Console EOF behaves like the
/// sentinel: the input side closes and output drains to stream end.
///
/// # Errors
///
/// - `SessionError::Stream` if the output stream yields an error;
/// - `SessionError::InputClosed` if forwarding a line fails, e.g. after
///   the remote process already exited;
/// - `SessionError::Console` on console read/write failures.
pub async fn bridge<S, W, R, C>(
    mut output: S,
    mut input: W,
    console_in: R,
    mut console_out: C,
) -> Result<(), SessionError>
where
    S: Stream<Item = Result<LogOutput, bollard::errors::Error>> + Unpin,
    W: AsyncWrite + Unpin,
    R: AsyncBufRead + Unpin,
    C: AsyncWrite + Unpin,
{
    let mut lines = console_in.lines();
    let mut input_open = true;

    loop {
        tokio::select! {
            frame = output.next() => match frame {
                Some(Ok(frame)) => forward_output(frame, &mut console_out).await?,
                Some(Err(e)) => return Err(SessionError::Stream(e.to_string())),
                None => break,
            },
            line = lines.next_line(), if input_open => match line? {
                Some(line) => {
                    forward_line(&line, &mut input).await?;
                    if line == SENTINEL {
                        debug!("sentinel received, closing input side");
                        let _ = input.shutdown().await;
                        input_open = false;
                    }
                }
                None => {
                    debug!("console EOF, closing input side");
                    let _ = input.shutdown().await;
                    input_open = false;
                }
            },
        }
    }

    Ok(())
}

/// Writes one output frame to the console, flushed so the user sees it
/// before the remote process blocks on its next read.
async fn forward_output<C>(frame: LogOutput, console_out: &mut C) -> Result<(), SessionError>
where
    C: AsyncWrite + Unpin,
{
    match frame {
        LogOutput::StdOut { message }
        | LogOutput::StdErr { message }
        | LogOutput::Console { message } => {
            console_out.write_all(&message).await?;
            console_out.flush().await?;
        }
        LogOutput::StdIn { .. } => {}
    }

    Ok(())
}

/// Forwards one console line to the remote stdin, newline appended and
/// flushed so the remote process observes it without buffering delay.
async fn forward_line<W>(line: &str, input: &mut W) -> Result<(), SessionError>
where
    W: AsyncWrite + Unpin,
{
    let write = async {
        input.write_all(line.as_bytes()).await?;
        input.write_all(b"\n").await?;
        input.flush().await
    };

    write
        .await
        .map_err(|e| SessionError::InputClosed(e.to_string()))
}
