//! Orchestration of one post-generation session.
//!
//! The workflow owns the session snapshot (state, topic, post, last error)
//! and publishes every change through a `tokio::sync::watch` channel, so a
//! presentation layer only needs to subscribe and render. Remote failures are
//! never returned raw: they become a [`GenerationError`] on the snapshot and
//! an outcome value for the caller.
//!
//! The generation cycle is strictly sequential: the image prompt is derived
//! from the post text, so text must exist before the image call starts. An
//! image failure keeps the text that was already produced.

use crate::ai::GenerationService;
use crate::models::{
    GenerationError, GenerationRequest, PostArtifact, Stage, WorkflowState,
};
use crate::Error;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Everything the presentation layer can observe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub state: WorkflowState,
    pub topic: String,
    pub post: PostArtifact,
    pub error: Option<GenerationError>,
    pub suggestion_in_flight: bool,
}

impl Session {
    fn new(topic: String) -> Self {
        Self {
            state: WorkflowState::Idle,
            topic,
            post: PostArtifact::default(),
            error: None,
            suggestion_in_flight: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The held topic is blank.
    EmptyTopic,
    /// A cycle (or a suggestion started from idle) is still running.
    Busy,
    /// Regenerate was requested before any cycle finished.
    NothingToRegenerate,
    /// Edits are only accepted on a finished cycle.
    NotEditable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Done,
    Failed,
    Rejected(Rejection),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestOutcome {
    Suggested(String),
    Failed,
    /// Another suggestion is already in flight.
    Rejected,
}

pub struct Workflow {
    service: Arc<dyn GenerationService>,
    session: watch::Sender<Session>,
}

impl Workflow {
    pub fn new(service: Arc<dyn GenerationService>, topic: impl Into<String>) -> Self {
        let (session, _) = watch::channel(Session::new(topic.into()));
        Self { service, session }
    }

    /// Receiver that is notified on every session change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    pub fn snapshot(&self) -> Session {
        self.session.borrow().clone()
    }

    pub fn state(&self) -> WorkflowState {
        self.session.borrow().state
    }

    pub fn topic(&self) -> String {
        self.session.borrow().topic.clone()
    }

    pub fn post(&self) -> PostArtifact {
        self.session.borrow().post.clone()
    }

    pub fn error(&self) -> Option<GenerationError> {
        self.session.borrow().error.clone()
    }

    /// Replace the held topic. An in-flight cycle keeps the topic it was
    /// dispatched with.
    pub fn set_topic(&self, topic: impl Into<String>) {
        let topic = topic.into();
        self.session.send_if_modified(|s| {
            if s.topic == topic {
                return false;
            }
            s.topic = topic;
            true
        });
    }

    /// Ask the provider for a topic idea and hold it as the current topic.
    ///
    /// Runs independently of the generation cycle; only one suggestion may be
    /// in flight at a time.
    pub async fn suggest(&self) -> SuggestOutcome {
        let mut admitted = false;
        self.session.send_if_modified(|s| {
            if s.suggestion_in_flight {
                return false;
            }
            s.suggestion_in_flight = true;
            s.error = None;
            if s.state == WorkflowState::Idle {
                s.state = WorkflowState::SuggestingTopic;
            }
            admitted = true;
            true
        });

        if !admitted {
            debug!("Suggestion already in flight, ignoring request");
            return SuggestOutcome::Rejected;
        }

        let result = self.service.suggest_topic().await;

        let outcome = match &result {
            Ok(topic) => SuggestOutcome::Suggested(topic.clone()),
            Err(err) => {
                error!("Topic suggestion failed: {}", err);
                SuggestOutcome::Failed
            }
        };

        self.session.send_modify(|s| {
            s.suggestion_in_flight = false;
            if s.state == WorkflowState::SuggestingTopic {
                s.state = WorkflowState::Idle;
            }
            match result {
                // Overwrites whatever the user typed in the meantime.
                Ok(topic) => s.topic = topic,
                Err(err) => s.error = Some(GenerationError::new(Stage::Suggestion, &err)),
            }
        });

        outcome
    }

    /// Run one generation cycle for the held topic.
    pub async fn generate(&self) -> CycleOutcome {
        let request = match self.admit() {
            Ok(request) => request,
            Err(rejection) => return CycleOutcome::Rejected(rejection),
        };

        info!("Generating post for topic: {}", request.topic());

        let text = match self.service.generate_post_text(request.topic()).await {
            Ok(text) => text,
            Err(err) => {
                self.fail(Stage::Post, &err);
                return CycleOutcome::Failed;
            }
        };

        self.session.send_modify(|s| {
            s.post.text = text.clone();
            s.state = WorkflowState::GeneratingImage;
        });

        match self.service.generate_image(&text).await {
            Ok(image) => {
                self.session.send_modify(|s| {
                    s.post.image_data = Some(image);
                    s.state = WorkflowState::Done;
                });
                info!("Post generation completed");
                CycleOutcome::Done
            }
            Err(err) => {
                self.fail(Stage::Image, &err);
                CycleOutcome::Failed
            }
        }
    }

    /// Start a new cycle for the same held topic, replacing the finished post.
    pub async fn regenerate(&self) -> CycleOutcome {
        match self.state() {
            WorkflowState::Done | WorkflowState::Failed => {}
            state if state.is_busy() => return CycleOutcome::Rejected(Rejection::Busy),
            _ => return CycleOutcome::Rejected(Rejection::NothingToRegenerate),
        }
        self.generate().await
    }

    /// Replace the post text of a finished cycle. Never calls the provider.
    pub fn edit_post(&self, text: impl Into<String>) -> Result<(), Rejection> {
        let text = text.into();
        let mut accepted = false;
        self.session.send_if_modified(|s| {
            if !matches!(s.state, WorkflowState::Done | WorkflowState::Failed) {
                return false;
            }
            accepted = true;
            if s.post.text == text {
                return false;
            }
            s.post.text = text;
            true
        });

        if accepted {
            Ok(())
        } else {
            Err(Rejection::NotEditable)
        }
    }

    /// Check the guard and move to `GeneratingPost` in one step.
    fn admit(&self) -> Result<GenerationRequest, Rejection> {
        let mut admitted = Err(Rejection::Busy);
        self.session.send_if_modified(|s| {
            if !s.state.accepts_submission() {
                return false;
            }
            match GenerationRequest::new(&s.topic) {
                Ok(request) => {
                    s.state = WorkflowState::GeneratingPost;
                    s.post = PostArtifact::default();
                    s.error = None;
                    admitted = Ok(request);
                }
                Err(err) => {
                    s.error = Some(GenerationError::new(Stage::Topic, &err));
                    admitted = Err(Rejection::EmptyTopic);
                }
            }
            true
        });

        if let Err(rejection) = admitted {
            warn!("Generation request rejected: {:?}", rejection);
        }
        admitted
    }

    fn fail(&self, stage: Stage, err: &Error) {
        error!("{:?} stage failed: {}", stage, err);
        self.session.send_modify(|s| {
            s.state = WorkflowState::Failed;
            s.error = Some(GenerationError::new(stage, err));
        });
    }
}
