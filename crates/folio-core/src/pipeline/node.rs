use std::future::Future;

use super::PipelineError;
use super::state::{ConversationState, StateUpdate};

/// One stage of the controller. Reads the current state and returns the
/// fields it wants to change; the controller merges them.
pub trait Node: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(
        &self,
        state: &ConversationState,
    ) -> impl Future<Output = Result<StateUpdate, PipelineError>> + Send;
}
