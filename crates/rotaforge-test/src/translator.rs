//! A scripted translation service.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use rotaforge_core::{ProblemSpecification, TranslationError, Translator};

/// Separator between a phrase and the error text appended on resubmission.
const RETRY_SEPARATOR: &str = "\n\n";

/// Answers translation requests from per-phrase queues.
///
/// Requests are matched on the phrase before any appended error text. Each request
/// pops the next queued response; the last one is repeated once the queue is
/// down to a single entry. Every request is recorded verbatim.
#[derive(Debug, Default)]
pub struct ScriptedTranslator {
    scripts: Mutex<HashMap<String, VecDeque<Result<String, TranslationError>>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `code` as the next answer for `phrase`.
    pub fn with_response(self, phrase: impl Into<String>, code: impl Into<String>) -> Self {
        self.push(phrase, Ok(code.into()));
        self
    }

    /// Queues several answers for `phrase`, in order.
    pub fn with_responses<I, S>(self, phrase: impl Into<String>, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let phrase = phrase.into();
        for code in codes {
            self.push(phrase.clone(), Ok(code.into()));
        }
        self
    }

    /// Queues a service failure for `phrase`.
    pub fn with_failure(self, phrase: impl Into<String>, message: impl Into<String>) -> Self {
        self.push(phrase, Err(TranslationError::new(message)));
        self
    }

    pub fn push(&self, phrase: impl Into<String>, response: Result<String, TranslationError>) {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(phrase.into())
            .or_default()
            .push_back(response);
    }

    /// Every request received, including appended error text.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of requests received for `phrase`.
    pub fn calls_for(&self, phrase: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| base_phrase(c) == phrase)
            .count()
    }
}

fn base_phrase(request: &str) -> &str {
    request.split(RETRY_SEPARATOR).next().unwrap_or(request)
}

impl Translator for ScriptedTranslator {
    fn translate(&self, phrase: &str, _spec: &ProblemSpecification) -> Result<String, TranslationError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(phrase.to_string());

        let mut scripts = self.scripts.lock().unwrap_or_else(PoisonError::into_inner);
        let queue = scripts
            .get_mut(base_phrase(phrase))
            .filter(|q| !q.is_empty())
            .ok_or_else(|| TranslationError::new(format!("no scripted response for '{}'", base_phrase(phrase))))?;
        if queue.len() > 1 {
            queue
                .pop_front()
                .unwrap_or_else(|| Err(TranslationError::new("empty script")))
        } else {
            queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(TranslationError::new("empty script")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specs;

    #[test]
    fn test_queue_then_sticky_last() {
        let spec = specs::three_by_two_by_two();
        let t = ScriptedTranslator::new().with_responses("p", ["a", "b"]);

        assert_eq!(t.translate("p", &spec).unwrap(), "a");
        assert_eq!(t.translate("p\n\nThe previous code failed with error:\nboom", &spec).unwrap(), "b");
        assert_eq!(t.translate("p", &spec).unwrap(), "b");
        assert_eq!(t.calls_for("p"), 3);
    }

    #[test]
    fn test_unknown_phrase_fails() {
        let spec = specs::three_by_two_by_two();
        let t = ScriptedTranslator::new().with_failure("down", "service unavailable");

        assert!(t.translate("other", &spec).is_err());
        assert_eq!(t.translate("down", &spec).unwrap_err().0, "service unavailable");
    }
}
