//! Token stash for payloads that must survive markdown conversion.
//!
//! A payload (an SVG document, for example) is stored under an opaque
//! [`Token`]. The token is what goes into the markdown text; after
//! conversion [`Stash::apply`] puts the payload back in place of the token.

use std::fmt;

use uuid::Uuid;

/// Opaque placeholder for a stashed payload.
///
/// Fresh tokens are the 32 lowercase hex digits of a random v4 UUID, which
/// contain nothing markdown would interpret.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// Generate a fresh random token.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Token {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Insertion-ordered mapping from tokens to raw payloads.
#[derive(Clone, Debug, Default)]
pub struct Stash {
    entries: Vec<(Token, String)>,
}

impl Stash {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `payload` under `token`.
    ///
    /// Putting an existing token replaces its payload and keeps its position.
    pub fn put(&mut self, token: Token, payload: impl Into<String>) {
        let payload = payload.into();
        match self.entries.iter_mut().find(|(t, _)| *t == token) {
            Some(entry) => entry.1 = payload,
            None => self.entries.push((token, payload)),
        }
    }

    /// Store `payload` under a fresh token and return the token.
    pub fn stash(&mut self, payload: impl Into<String>) -> Token {
        let token = Token::new();
        self.put(token.clone(), payload);
        token
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Token, &str)> {
        self.entries.iter().map(|(t, p)| (t, p.as_str()))
    }

    /// Tokens that do not occur in `text`.
    pub fn unused<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a Token> {
        self.entries
            .iter()
            .map(|(t, _)| t)
            .filter(move |t| !text.contains(t.as_str()))
    }

    /// Replace every occurrence of every token with its payload.
    ///
    /// Runs in a single left-to-right pass: at each position the leftmost
    /// occurrence wins, ties go to the token inserted first, and inserted
    /// payloads are never scanned again. Empty tokens never match.
    #[must_use]
    pub fn apply(&self, text: &str) -> String {
        let entries: Vec<_> = self
            .entries
            .iter()
            .filter(|(t, _)| !t.0.is_empty())
            .collect();
        if entries.is_empty() {
            return text.to_owned();
        }

        // Next occurrence of each token at or after `pos`
        let mut next: Vec<Option<usize>> = entries
            .iter()
            .map(|(t, _)| text.find(t.as_str()))
            .collect();

        let mut result = String::with_capacity(text.len());
        let mut pos = 0;

        loop {
            let mut best: Option<(usize, usize)> = None;
            for (idx, found) in next.iter().enumerate() {
                if let Some(at) = *found
                    && best.is_none_or(|(best_at, _)| at < best_at)
                {
                    best = Some((at, idx));
                }
            }
            let Some((at, idx)) = best else {
                break;
            };

            let (token, payload) = entries[idx];
            result.push_str(&text[pos..at]);
            result.push_str(payload);
            pos = at + token.0.len();

            // Occurrences overlapping the replaced token are skipped
            for (slot, (t, _)) in next.iter_mut().zip(&entries) {
                if slot.is_some_and(|found| found < pos) {
                    *slot = text[pos..].find(t.as_str()).map(|i| pos + i);
                }
            }
        }

        result.push_str(&text[pos..]);
        result
    }
}
