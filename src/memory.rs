use std::collections::VecDeque;

use serde::Serialize;

use crate::{executor::ResultTable, nlp::Intent};

/// One question and the answer given to it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Turn {
    pub question: String,
    pub answer: String,
    pub intent: Intent,
    pub table: Option<ResultTable>,
}

/// Most recent turns of a conversation, oldest first.
#[derive(Debug)]
pub struct ConversationMemory {
    turns: VecDeque<Turn>,
    capacity: usize,
}

impl ConversationMemory {
    /// A capacity of zero keeps nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn add_turn(&mut self, turn: Turn) {
        if self.capacity == 0 {
            return;
        }
        while self.turns.len() >= self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    pub fn turns(&self) -> impl DoubleEndedIterator<Item = &Turn> {
        self.turns.iter()
    }

    /// Table of the latest turn that recorded one.
    pub fn last_answer_table(&self) -> Option<&ResultTable> {
        self.turns.iter().rev().find_map(|turn| turn.table.as_ref())
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
