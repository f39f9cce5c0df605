//! Transcript-related types.

use std::slice;

use crate::error::ExchangeErrorKind;

/// Who a turn in the transcript comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Speaker {
    /// The person typing into the session.
    User,
    /// The chat endpoint.
    Bot,
    /// An exchange that failed, with the reason.
    Failure(ExchangeErrorKind),
}

/// A turn in the transcript.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Turn {
    speaker: Speaker,
    text: String,
}

impl Turn {
    /// Creates a user turn.
    #[inline]
    pub fn user<S: Into<String>>(text: S) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    /// Creates a bot turn.
    #[inline]
    pub fn bot<S: Into<String>>(text: S) -> Self {
        Self {
            speaker: Speaker::Bot,
            text: text.into(),
        }
    }

    /// Creates a failure turn.
    #[inline]
    pub fn failure<S: Into<String>>(kind: ExchangeErrorKind, text: S) -> Self {
        Self {
            speaker: Speaker::Failure(kind),
            text: text.into(),
        }
    }

    /// Returns who this turn comes from.
    #[inline]
    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    /// Returns the text of this turn.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// The ordered turns of a session.
///
/// Turns are kept in conversation order. They are never reordered or
/// removed, and only the owning [`crate::ChatSession`] can add turns or
/// extend the open bot turn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Returns the number of turns.
    #[inline]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns `true` if no turn has been added yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Returns the turn at `idx`.
    #[inline]
    pub fn get(&self, idx: usize) -> Option<&Turn> {
        self.turns.get(idx)
    }

    /// Iterates over the turns in conversation order.
    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, Turn> {
        self.turns.iter()
    }

    /// Returns all turns as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[Turn] {
        &self.turns
    }

    /// Appends a turn and returns its index.
    #[inline]
    pub(crate) fn push(&mut self, turn: Turn) -> usize {
        self.turns.push(turn);
        self.turns.len() - 1
    }

    /// Extends the text of the turn at `idx`.
    #[inline]
    pub(crate) fn append_text(&mut self, idx: usize, fragment: &str) {
        if let Some(turn) = self.turns.get_mut(idx) {
            turn.text.push_str(fragment);
        }
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Turn;
    type IntoIter = slice::Iter<'a, Turn>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}
