use std::io::{self, Write};

use owo_colors::OwoColorize;
use stream_chat_core::{Speaker, Transcript, Turn};

const BAR_CHAR: &str = "▎";

/// Prints a transcript to a terminal while it grows.
///
/// Every call prints only what has been added since the last call. The bot
/// turn that is still receiving text is printed without a line break, so the
/// next fragments continue on the same line.
///
/// User turns are not printed, since the terminal has already echoed them.
#[derive(Debug, Default)]
pub struct TranscriptPrinter {
    styled: bool,
    printed_turns: usize,
    // Bytes of the open turn that have been printed.
    printed_len: usize,
}

impl TranscriptPrinter {
    /// Creates a printer, `styled` enables colors.
    #[inline]
    pub fn new(styled: bool) -> Self {
        Self {
            styled,
            ..Default::default()
        }
    }

    /// Prints the turns that are new since the last call.
    ///
    /// `open_bot_turn` is the index of the bot turn that may still grow, as
    /// returned by [`stream_chat_core::ChatSession::open_bot_turn`].
    pub fn print<W: Write>(
        &mut self,
        transcript: &Transcript,
        open_bot_turn: Option<usize>,
        out: &mut W,
    ) -> io::Result<()> {
        while let Some(turn) = transcript.get(self.printed_turns) {
            let is_open = open_bot_turn == Some(self.printed_turns);
            match turn.speaker() {
                Speaker::User => {}
                Speaker::Bot => {
                    self.print_bot_text(turn, out)?;
                    if is_open {
                        return out.flush();
                    }
                    writeln!(out)?;
                }
                Speaker::Failure(kind) => {
                    let line = format!("⚠️  {kind:?}: {}", turn.text());
                    if self.styled {
                        writeln!(
                            out,
                            "{}{}",
                            BAR_CHAR.bright_red(),
                            line.bright_red()
                        )?;
                    } else {
                        writeln!(out, "{BAR_CHAR}{line}")?;
                    }
                }
            }
            self.printed_turns += 1;
            self.printed_len = 0;
        }
        out.flush()
    }

    fn print_bot_text<W: Write>(
        &mut self,
        turn: &Turn,
        out: &mut W,
    ) -> io::Result<()> {
        if self.printed_len == 0 {
            if self.styled {
                write!(out, "{}🤖 ", BAR_CHAR.bright_cyan())?;
            } else {
                write!(out, "{BAR_CHAR}🤖 ")?;
            }
        }
        // Bot turns only ever grow at the end.
        let text = turn.text().get(self.printed_len..).unwrap_or_default();
        if self.styled {
            write!(out, "{}", text.bright_white())?;
        } else {
            out.write_all(text.as_bytes())?;
        }
        self.printed_len = turn.text().len();
        Ok(())
    }
}
