use std::collections::VecDeque;

use buildstamp::record::{PickItem, PromptError, PromptSource};

/// A canned answer to one prompt.
#[derive(Debug, Clone)]
pub enum Answer {
    Pick(usize),
    Text(String),
    Cancel,
}

pub fn text(value: &str) -> Answer {
    Answer::Text(value.to_string())
}

/// Prompt source that replays answers in order and records every question.
pub struct ScriptedPrompts {
    answers: VecDeque<Answer>,
    pub asked: Vec<String>,
}

impl ScriptedPrompts {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl PromptSource for ScriptedPrompts {
    fn pick(&mut self, title: &str, items: &[PickItem]) -> Result<Option<usize>, PromptError> {
        self.asked.push(title.to_string());
        match self.answers.pop_front() {
            Some(Answer::Pick(index)) if index < items.len() => Ok(Some(index)),
            Some(Answer::Cancel) => Ok(None),
            other => panic!("pick prompt '{title}' got {other:?}"),
        }
    }

    fn input(&mut self, prompt: &str, _initial: &str) -> Result<Option<String>, PromptError> {
        self.asked.push(prompt.to_string());
        match self.answers.pop_front() {
            Some(Answer::Text(value)) => Ok(Some(value)),
            Some(Answer::Cancel) => Ok(None),
            other => panic!("input prompt '{prompt}' got {other:?}"),
        }
    }
}
