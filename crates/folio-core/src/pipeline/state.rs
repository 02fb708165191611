use folio_llm::{Message, Role};

use crate::profile::UserProfile;

/// How a state field absorbs an update.
pub trait Merge {
    type Update;

    fn merge(&mut self, update: Self::Update);
}

/// Accumulating field: updates are appended in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Append<T>(Vec<T>);

impl<T> Default for Append<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> Append<T> {
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        Self(items)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T> Merge for Append<T> {
    type Update = Vec<T>;

    fn merge(&mut self, update: Vec<T>) {
        self.0.extend(update);
    }
}

/// Last-write-wins field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replace<T>(T);

impl<T> Replace<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn get(&self) -> &T {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Merge for Replace<T> {
    type Update = T;

    fn merge(&mut self, update: T) {
        self.0 = update;
    }
}

/// Per-invocation state threaded through the controller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    pub messages: Append<Message>,
    pub context: Replace<String>,
    pub user_profile: Replace<UserProfile>,
    pub missing_skills: Replace<Vec<String>>,
}

/// Fields a node wants changed. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub messages: Vec<Message>,
    pub context: Option<String>,
    pub user_profile: Option<UserProfile>,
    pub missing_skills: Option<Vec<String>>,
}

impl ConversationState {
    #[must_use]
    pub fn new(user_profile: UserProfile, messages: Vec<Message>) -> Self {
        Self {
            messages: Append::new(messages),
            user_profile: Replace::new(user_profile),
            ..Self::default()
        }
    }

    pub fn apply(&mut self, update: StateUpdate) {
        self.messages.merge(update.messages);
        if let Some(context) = update.context {
            self.context.merge(context);
        }
        if let Some(profile) = update.user_profile {
            self.user_profile.merge(profile);
        }
        if let Some(missing) = update.missing_skills {
            self.missing_skills.merge(missing);
        }
    }

    #[must_use]
    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages
            .as_slice()
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
    }

    /// Content of the most recent assistant message.
    #[must_use]
    pub fn last_reply(&self) -> Option<&str> {
        self.messages
            .as_slice()
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }
}
