//! Scripted `CompletionModel` for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{CompletionModel, LlmError};

/// One canned reply from the scripted model.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Overloaded,
    Fail { status: u16, message: String },
}

impl Reply {
    pub fn text(s: &str) -> Self {
        Reply::Text(s.to_string())
    }

    fn into_result(self) -> Result<String, LlmError> {
        match self {
            Reply::Text(text) => Ok(text),
            Reply::Overloaded => Err(LlmError::Api {
                status: 503,
                message: "The model is overloaded. Please try again later.".to_string(),
            }),
            Reply::Fail { status, message } => Err(LlmError::Api { status, message }),
        }
    }
}

/// Plays back replies in order; the last reply repeats once the script runs out.
/// Records the tokio clock and prompt of every call.
pub struct ScriptedModel {
    script: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    calls: Mutex<Vec<(Instant, String)>>,
}

impl ScriptedModel {
    pub fn new(script: Vec<Reply>) -> Self {
        let fallback = script
            .last()
            .cloned()
            .unwrap_or(Reply::Fail {
                status: 500,
                message: "empty script".to_string(),
            });
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always(reply: Reply) -> Self {
        Self::new(vec![reply])
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.calls.lock().unwrap().last().map(|(_, p)| p.clone())
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((Instant::now(), prompt.to_string()));
        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        reply.into_result()
    }
}
