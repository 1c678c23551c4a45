//! Scripted confirmation dialog.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::Confirm;

#[derive(Default)]
struct Script {
    answers: VecDeque<bool>,
    fallback: bool,
    prompts: Vec<String>,
}

/// Answers prompts from a queue, falling back to a fixed answer once the
/// queue is empty. Clones share the queue, so a driver can enqueue the user's
/// reply right before the question is asked.
#[derive(Clone, Default)]
pub struct ScriptedConfirm {
    script: Arc<Mutex<Script>>,
}

impl ScriptedConfirm {
    pub fn always(answer: bool) -> Self {
        let confirm = Self::default();
        confirm.lock().fallback = answer;
        confirm
    }

    pub fn push_answer(&self, answer: bool) {
        self.lock().answers.push_back(answer);
    }

    /// Prompts asked so far.
    pub fn prompts(&self) -> Vec<String> {
        self.lock().prompts.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        let mut script = self.lock();
        script.prompts.push(prompt.to_owned());
        let fallback = script.fallback;
        script.answers.pop_front().unwrap_or(fallback)
    }
}
