//! Command history.
//!
//! Each client executable gets its own bounded recall list. Completed cooked
//! lines are appended; the arrow keys and the history popup recall them.

use crate::wchar::prelude::*;
use std::collections::HashMap;
use std::collections::VecDeque;

pub const DEFAULT_HISTORY_SIZE: usize = 50;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RecallDirection {
    Previous,
    Next,
}

/// How appends treat a line equal to the most recent entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DedupMode {
    KeepDuplicates,
    /// Drop the append when it repeats the newest entry.
    SuppressRepeated,
}

#[derive(Default)]
pub struct CommandHistory {
    items: VecDeque<WString>,
    /// Recall position; `items.len()` means "past the newest entry".
    index: usize,
    max_items: usize,
}

impl CommandHistory {
    fn new(max_items: usize) -> Self {
        CommandHistory {
            items: VecDeque::new(),
            index: 0,
            max_items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn at(&self, index: usize) -> Option<&wstr> {
        self.items.get(index).map(|s| s.as_utfstr())
    }

    pub fn newest(&self) -> Option<&wstr> {
        self.items.back().map(|s| s.as_utfstr())
    }

    pub fn append(&mut self, line: &wstr, dedup: DedupMode) {
        if line.is_empty() {
            return;
        }
        if dedup == DedupMode::SuppressRepeated && self.newest() == Some(line) {
            self.index = self.items.len();
            return;
        }
        if self.items.len() == self.max_items {
            self.items.pop_front();
        }
        self.items.push_back(line.to_owned());
        self.index = self.items.len();
    }

    /// Walk the list. `Previous` moves toward the oldest entry and sticks
    /// there; `Next` moves toward the newest.
    pub fn recall(&mut self, direction: RecallDirection) -> Option<&wstr> {
        if self.items.is_empty() {
            return None;
        }
        match direction {
            RecallDirection::Previous => {
                self.index = self.index.saturating_sub(1);
            }
            RecallDirection::Next => {
                if self.index + 1 < self.items.len() {
                    self.index += 1;
                } else {
                    self.index = self.items.len() - 1;
                }
            }
        }
        self.at(self.index)
    }

    /// Jump to the oldest or newest entry.
    pub fn recall_oldest(&mut self) -> Option<&wstr> {
        self.index = 0;
        self.at(0)
    }

    pub fn recall_newest(&mut self) -> Option<&wstr> {
        if self.items.is_empty() {
            return None;
        }
        self.index = self.items.len() - 1;
        self.at(self.index)
    }

    /// Find the next older entry starting with `prefix`, wrapping around.
    pub fn search_backward(&mut self, prefix: &wstr) -> Option<&wstr> {
        let n = self.items.len();
        if n == 0 {
            return None;
        }
        let mut probe = self.index;
        for _ in 0..n {
            probe = if probe == 0 { n - 1 } else { probe - 1 };
            if self.items[probe].as_utfstr().starts_with(prefix) {
                self.index = probe;
                return self.at(probe);
            }
        }
        None
    }
}

/// The per-console set of recall lists, keyed by executable name.
pub struct HistorySet {
    lists: HashMap<WString, CommandHistory>,
    max_items: usize,
}

fn fold_case(s: &wstr) -> WString {
    s.as_char_slice()
        .iter()
        .flat_map(|c| c.to_uppercase())
        .collect()
}

impl HistorySet {
    pub fn new(max_items: usize) -> Self {
        HistorySet {
            lists: HashMap::new(),
            max_items,
        }
    }

    pub fn for_exe(&mut self, exe: &wstr) -> &mut CommandHistory {
        let max = self.max_items;
        self.lists
            .entry(fold_case(exe))
            .or_insert_with(|| CommandHistory::new(max))
    }

    pub fn get(&self, exe: &wstr) -> Option<&CommandHistory> {
        self.lists.get(&fold_case(exe))
    }
}

impl Default for HistorySet {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}
