//! Strategy interface: the inbound port the engine dispatches events to
//! (§6, §9). Named but not specified by the distilled spec beyond
//! `handle_event`/`register_execution_engine`; this module is its home.
//!
//! Modeled as a registry to avoid the mutual-reference cycle the source
//! exhibits (§9, REDESIGN FLAG #3): the engine owns
//! `StrategyId -> Box<dyn StrategyHandler>`, and a strategy holds only an
//! [`EngineHandle`] — a narrow command-submission surface — rather than a
//! reference back to the engine itself.

use std::sync::mpsc::{SendError, SyncSender};

use crate::client::Command;
use crate::errors::EngineError;
use crate::events::Event;
use crate::identifiers::StrategyId;

/// The narrow surface a strategy is given to submit commands. Cloning is
/// cheap (it wraps a channel sender) so a strategy may hand copies to any
/// internal workers it spawns.
#[derive(Clone)]
pub struct EngineHandle {
    commands: SyncSender<Command>,
}

impl EngineHandle {
    pub fn new(commands: SyncSender<Command>) -> Self {
        Self { commands }
    }

    pub fn submit(&self, command: Command) -> Result<(), EngineError> {
        self.commands
            .send(command)
            .map_err(|SendError(_)| EngineError::ChannelClosed)
    }
}

/// Inbound port implemented by every strategy registered with the engine.
pub trait StrategyHandler {
    fn identifier(&self) -> StrategyId;

    /// Called by the engine once, at registration, with a handle the
    /// strategy uses for every subsequent command submission.
    fn register_execution_engine(&mut self, engine: EngineHandle);

    /// Called by the engine for every event addressed to this strategy —
    /// order events for its own orders, position events for positions it
    /// owns, and `OrderCancelReject` for its own rejected modify/cancel
    /// commands.
    fn handle_event(&mut self, event: &Event);
}
