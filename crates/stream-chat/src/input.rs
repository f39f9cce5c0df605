use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};

/// Reads the user's messages one line at a time.
///
/// The same buffer is kept for the whole session, so lines that arrive
/// together, as with piped input, are all delivered in order.
#[derive(Debug)]
pub struct LineReader<R> {
    lines: Lines<BufReader<R>>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// Creates a reader over `reader`.
    #[inline]
    pub fn new(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
        }
    }

    /// Returns the next line without its line ending, or `None` at the end
    /// of input.
    pub async fn next_line(&mut self) -> Option<String> {
        match self.lines.next_line().await {
            Ok(line) => line,
            Err(err) => {
                tracing::error!("error reading input: {err}");
                None
            }
        }
    }
}
