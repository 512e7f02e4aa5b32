//! Scripted command runner shared by this crate's tests.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::command::{CommandOutput, CommandRunner, MediaCommand};
use crate::error::MediaResult;

type Handler = Box<dyn Fn(&MediaCommand) -> CommandOutput + Send + Sync>;

/// Runner that answers from a scripted handler and records every command.
pub(crate) struct ScriptedRunner {
    handler: Handler,
    calls: Mutex<Vec<MediaCommand>>,
}

impl ScriptedRunner {
    pub(crate) fn new(
        handler: impl Fn(&MediaCommand) -> CommandOutput + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Runner whose every command succeeds with empty output.
    pub(crate) fn always_ok() -> Self {
        Self::new(|_| CommandOutput::ok(""))
    }

    /// Every command recorded so far, in invocation order.
    pub(crate) fn commands(&self) -> Vec<MediaCommand> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &MediaCommand) -> MediaResult<CommandOutput> {
        self.calls.lock().unwrap().push(command.clone());
        Ok((self.handler)(command))
    }
}
