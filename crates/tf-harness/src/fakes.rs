//! In-memory executor fake (testing only)
//!
//! `ScriptedExecutor` stands in for the terraform binary. Responses are
//! queued per subcommand and consumed in order; an empty queue answers with a
//! successful run and empty stdout. Every invocation is recorded.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::runner::{CommandExecutor, ExecContext, Invocation, ProcessOutput, Subcommand};
use crate::Result;

type Responder = Box<dyn Fn(&Invocation) -> ProcessOutput + Send + Sync>;

/// Scripted terraform stand-in.
#[derive(Default)]
pub struct ScriptedExecutor {
    queued: Mutex<HashMap<Subcommand, VecDeque<ProcessOutput>>>,
    responders: Mutex<HashMap<Subcommand, Responder>>,
    calls: Mutex<Vec<Invocation>>,
}

impl std::fmt::Debug for ScriptedExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedExecutor")
            .field("calls", &self.calls.lock().unwrap().len())
            .finish_non_exhaustive()
    }
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one response for the next `subcommand` invocation.
    pub fn push(&self, subcommand: Subcommand, output: ProcessOutput) {
        self.queued
            .lock()
            .unwrap()
            .entry(subcommand)
            .or_default()
            .push_back(output);
    }

    /// Queue a successful `output -json` carrying `document`.
    pub fn push_outputs(&self, document: serde_json::Value) {
        self.push(
            Subcommand::Output,
            ProcessOutput::ok(Subcommand::Output, document.to_string()),
        );
    }

    /// Answer every `subcommand` invocation with `responder` once the queue
    /// for it is empty.
    pub fn respond_with<F>(&self, subcommand: Subcommand, responder: F)
    where
        F: Fn(&Invocation) -> ProcessOutput + Send + Sync + 'static,
    {
        self.responders
            .lock()
            .unwrap()
            .insert(subcommand, Box::new(responder));
    }

    /// All invocations so far, oldest first.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Invocations of one subcommand.
    pub fn invocations_of(&self, subcommand: Subcommand) -> Vec<Invocation> {
        self.invocations()
            .into_iter()
            .filter(|i| i.subcommand == subcommand)
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn execute(&self, invocation: &Invocation, _ctx: &ExecContext) -> Result<ProcessOutput> {
        self.calls.lock().unwrap().push(invocation.clone());

        let queued = self
            .queued
            .lock()
            .unwrap()
            .get_mut(&invocation.subcommand)
            .and_then(VecDeque::pop_front);
        if let Some(output) = queued {
            return Ok(output);
        }

        let responders = self.responders.lock().unwrap();
        if let Some(responder) = responders.get(&invocation.subcommand) {
            return Ok(responder(invocation));
        }

        Ok(ProcessOutput::ok(invocation.subcommand, ""))
    }
}
