//! Shared test helpers: a scripted model client and small tools.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use sleuth::error::SleuthError;
use sleuth::provider::{ModelClient, ModelRequest, ModelResponse};
use sleuth::tools::{FnTool, Tool, ToolOutput, ToolParameters, ToolRegistry};

/// A model client that replays queued responses and records every request.
///
/// When the queue is empty it answers with the fallback, if one is set.
#[derive(Default)]
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Result<ModelResponse, SleuthError>>>,
    fallback: Mutex<Option<ModelResponse>>,
    requests: Mutex<Vec<ModelRequest>>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: ModelResponse) -> Self {
        self.responses.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn fail(self, error: SleuthError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Answer with `response` once the queue runs dry.
    pub fn otherwise(self, response: ModelResponse) -> Self {
        *self.fallback.lock().unwrap() = Some(response);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn send(&self, request: &ModelRequest) -> Result<ModelResponse, SleuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if let Some(next) = self.responses.lock().unwrap().pop_front() {
            return next;
        }
        self.fallback
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SleuthError::InvalidState("script exhausted".into()))
    }
}

/// `Echo(text) -> text`
pub fn echo_tool() -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        "Echo",
        "Echo text back",
        ToolParameters::object().string("text", "Text to echo", true).build(),
        |args, _ctx| async move {
            Ok::<_, SleuthError>(ToolOutput::Text(args.get_str("text")?.to_string()))
        },
    ))
}

/// `Done(summary) -> summary`
pub fn done_tool() -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        "Done",
        "Finish the episode",
        ToolParameters::object()
            .string("summary", "Final summary", true)
            .build(),
        |args, _ctx| async move {
            Ok::<_, SleuthError>(ToolOutput::Text(args.get_str("summary")?.to_string()))
        },
    ))
}

/// A tool that always fails.
pub fn broken_tool() -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        "Broken",
        "Always fails",
        ToolParameters::empty(),
        |_args, _ctx| async move {
            Err::<ToolOutput, _>(SleuthError::tool_execution("Broken", "boom"))
        },
    ))
}

/// A tool that never finishes on its own.
pub fn slow_tool() -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        "Slow",
        "Sleeps for an hour",
        ToolParameters::empty(),
        |_args, _ctx| async move {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            Ok::<_, SleuthError>(ToolOutput::Text("late".into()))
        },
    ))
}

pub fn registry() -> Arc<ToolRegistry> {
    Arc::new(
        ToolRegistry::new(vec![echo_tool(), done_tool(), broken_tool(), slow_tool()]).unwrap(),
    )
}
