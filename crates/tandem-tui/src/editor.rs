// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Single-line prompt editing with history recall.
//!
//! The cursor is a *character* index, never a byte offset, so multi-byte
//! input cannot split a code point.

use std::collections::VecDeque;

/// Bounded list of submitted prompts, oldest first.
#[derive(Debug, Clone)]
pub struct PromptHistory {
    entries: VecDeque<String>,
    limit: usize,
}

impl PromptHistory {
    pub fn new(limit: usize) -> Self {
        Self { entries: VecDeque::new(), limit: limit.max(1) }
    }

    /// Record a submitted line.  Blank lines and an exact repeat of the most
    /// recent entry are skipped; the oldest entry is dropped past the limit.
    pub fn push(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || self.entries.back().map(String::as_str) == Some(line) {
            return;
        }
        self.entries.push_back(line.to_string());
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

/// Where we are while walking history, plus the in-progress text that was
/// on the line when navigation started.
#[derive(Debug, Clone)]
struct HistoryNav {
    index: usize,
    draft: String,
}

#[derive(Debug, Clone)]
pub struct PromptEditor {
    text: String,
    cursor: usize,
    history: PromptHistory,
    nav: Option<HistoryNav>,
}

impl PromptEditor {
    pub fn new(history_limit: usize) -> Self {
        Self { text: String::new(), cursor: 0, history: PromptHistory::new(history_limit), nav: None }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn history(&self) -> &PromptHistory {
        &self.history
    }

    pub fn is_navigating_history(&self) -> bool {
        self.nav.is_some()
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_index(&self, char_pos: usize) -> usize {
        self.text.char_indices().nth(char_pos).map(|(i, _)| i).unwrap_or(self.text.len())
    }

    // ── Editing ───────────────────────────────────────────────────────────────
    //
    // Any edit while a recalled entry is shown makes that text the new draft:
    // navigation ends and the saved snapshot is dropped.

    pub fn insert_char(&mut self, c: char) {
        self.nav = None;
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        self.nav = None;
        let at = self.byte_index(self.cursor);
        self.text.insert_str(at, s);
        self.cursor += s.chars().count();
    }

    /// Delete the character before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.nav = None;
        let at = self.byte_index(self.cursor - 1);
        self.text.remove(at);
        self.cursor -= 1;
    }

    /// Delete the character under the cursor.
    pub fn delete(&mut self) {
        if self.cursor >= self.char_len() {
            return;
        }
        self.nav = None;
        let at = self.byte_index(self.cursor);
        self.text.remove(at);
    }

    pub fn clear(&mut self) {
        self.nav = None;
        self.text.clear();
        self.cursor = 0;
    }

    /// Replace the whole line, cursor at the end.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.nav = None;
        self.text = text.into();
        self.cursor = self.char_len();
    }

    // ── Cursor ────────────────────────────────────────────────────────────────

    /// Move by `delta` characters, clamped to `0..=len`.
    pub fn move_by(&mut self, delta: isize) {
        let target = self.cursor.saturating_add_signed(delta);
        self.cursor = target.min(self.char_len());
    }

    pub fn move_left(&mut self) {
        self.move_by(-1);
    }

    pub fn move_right(&mut self) {
        self.move_by(1);
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    // ── History ───────────────────────────────────────────────────────────────

    /// Step to the previous (older) entry.  The first step saves the current
    /// line so that walking forward past the newest entry restores it.
    pub fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let index = match &self.nav {
            None => {
                let draft = std::mem::take(&mut self.text);
                let index = self.history.len() - 1;
                self.nav = Some(HistoryNav { index, draft });
                index
            }
            Some(nav) => nav.index.saturating_sub(1),
        };
        self.show_entry(index);
    }

    /// Step to the next (newer) entry, or back to the saved draft.
    pub fn history_next(&mut self) {
        let Some(nav) = &self.nav else {
            return;
        };
        if nav.index + 1 < self.history.len() {
            let index = nav.index + 1;
            self.show_entry(index);
        } else if let Some(nav) = self.nav.take() {
            self.text = nav.draft;
            self.cursor = self.char_len();
        }
    }

    fn show_entry(&mut self, index: usize) {
        if let Some(nav) = self.nav.as_mut() {
            nav.index = index;
        }
        self.text = self.history.get(index).unwrap_or_default().to_string();
        self.cursor = self.char_len();
    }

    /// Record a submitted line and leave navigation.
    pub fn push_history(&mut self, line: &str) {
        self.nav = None;
        self.history.push(line);
    }
}

impl Default for PromptEditor {
    fn default() -> Self {
        Self::new(50)
    }
}

// ─── Unit tests ───────────────────────────────────────────────────────────────
