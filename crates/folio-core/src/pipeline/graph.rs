use super::PipelineError;
use super::node::Node;
use super::state::ConversationState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Retrieve,
    Generate,
    End,
}

impl Stage {
    /// Fixed transitions; there is no edge back from any stage.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Start => Some(Self::Retrieve),
            Self::Retrieve => Some(Self::Generate),
            Self::Generate => Some(Self::End),
            Self::End => None,
        }
    }
}

/// Runs `retrieve` then `generate`, merging each node's update into the
/// state before the next stage starts. A node error ends the run.
pub struct Graph<R, G> {
    retrieve: R,
    generate: G,
}

impl<R: Node, G: Node> Graph<R, G> {
    #[must_use]
    pub fn new(retrieve: R, generate: G) -> Self {
        Self { retrieve, generate }
    }

    /// # Errors
    ///
    /// Returns the first node failure unchanged.
    pub async fn run(
        &self,
        mut state: ConversationState,
    ) -> Result<ConversationState, PipelineError> {
        let mut stage = Stage::Start;
        while let Some(next) = stage.next() {
            stage = next;
            let (name, update) = match stage {
                Stage::Retrieve => (self.retrieve.name(), self.retrieve.run(&state).await?),
                Stage::Generate => (self.generate.name(), self.generate.run(&state).await?),
                Stage::Start | Stage::End => continue,
            };
            state.apply(update);
            tracing::debug!(node = name, "node complete");
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use folio_llm::Message;

    use super::*;
    use crate::pipeline::StateUpdate;
    use crate::profile::UserProfile;

    struct Recording {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        update: StateUpdate,
        fail: bool,
    }

    impl Node for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn run(&self, state: &ConversationState) -> Result<StateUpdate, PipelineError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, state.context.get()));
            if self.fail {
                return Err(PipelineError::NoQuery);
            }
            Ok(self.update.clone())
        }
    }

    fn node(name: &'static str, log: &Arc<Mutex<Vec<String>>>, update: StateUpdate) -> Recording {
        Recording {
            name,
            log: Arc::clone(log),
            update,
            fail: false,
        }
    }

    fn state() -> ConversationState {
        ConversationState::new(UserProfile::default(), vec![Message::user("q")])
    }

    #[test]
    fn stages_advance_linearly() {
        assert_eq!(Stage::Start.next(), Some(Stage::Retrieve));
        assert_eq!(Stage::Retrieve.next(), Some(Stage::Generate));
        assert_eq!(Stage::Generate.next(), Some(Stage::End));
        assert_eq!(Stage::End.next(), None);
    }

    #[tokio::test]
    async fn generate_sees_retrieve_update() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let graph = Graph::new(
            node(
                "retrieve",
                &log,
                StateUpdate {
                    context: Some("ctx".into()),
                    ..StateUpdate::default()
                },
            ),
            node(
                "generate",
                &log,
                StateUpdate {
                    messages: vec![Message::assistant("reply")],
                    ..StateUpdate::default()
                },
            ),
        );

        let out = graph.run(state()).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["retrieve:", "generate:ctx"]);
        assert_eq!(out.last_reply(), Some("reply"));
        assert_eq!(out.messages.as_slice().len(), 2);
    }

    #[tokio::test]
    async fn retrieve_failure_skips_generate() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut retrieve = node("retrieve", &log, StateUpdate::default());
        retrieve.fail = true;
        let graph = Graph::new(retrieve, node("generate", &log, StateUpdate::default()));

        assert!(matches!(
            graph.run(state()).await,
            Err(PipelineError::NoQuery)
        ));
        assert_eq!(*log.lock().unwrap(), vec!["retrieve:"]);
    }
}
