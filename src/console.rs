//! Interactive terminal session.
//!
//! Commands are read line by line from stdin. Generation and suggestion run in
//! background tasks while a subscriber task prints progress for every state
//! transition, so the prompt stays responsive and the busy guard is visible.
//! Leaving the session waits for every dispatched task to finish.

use crate::ai::mime::decode_data_uri;
use crate::app::App;
use crate::models::{PostArtifact, WorkflowState};
use crate::output::save_post;
use crate::share::share_post;
use crate::workflow::{CycleOutcome, Rejection, Session, SuggestOutcome, Workflow};
use crate::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::{oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

const EDIT_TERMINATOR: &str = ".";

const HELP: &str = "\
Commands:
  topic <text>   set the post topic
  suggest        ask the model for a post idea
  generate       write the post and its image for the current topic
  regenerate     write a new version for the same topic
  edit           replace the post text (finish with a line containing only '.')
  show           print the current post
  share          copy the post and open LinkedIn
  save           write the post and image to the output directory
  status         print the current state and topic
  help           show this message
  quit           leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Topic(String),
    Suggest,
    Generate,
    Regenerate,
    Edit,
    Show,
    Share,
    Save,
    Status,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "topic" => Command::Topic(rest.to_string()),
            "suggest" => Command::Suggest,
            "generate" | "gen" => Command::Generate,
            "regenerate" | "regen" => Command::Regenerate,
            "edit" => Command::Edit,
            "show" => Command::Show,
            "share" => Command::Share,
            "save" => Command::Save,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            _ => Command::Unknown(word.to_string()),
        };
        Some(command)
    }
}

pub fn rejection_message(rejection: Rejection) -> &'static str {
    match rejection {
        Rejection::EmptyTopic => "Please enter a topic for the post.",
        Rejection::Busy => "A generation is already running. Please wait.",
        Rejection::NothingToRegenerate => "Generate a post first.",
        Rejection::NotEditable => "There is no finished post to edit.",
    }
}

/// Short description of an image data URI, e.g. `image/png, 68 bytes`.
pub fn describe_image(data_uri: &str) -> String {
    match decode_data_uri(data_uri) {
        Ok((mime, bytes)) => format!("{}, {} bytes", mime, bytes.len()),
        Err(_) => "unreadable image data".to_string(),
    }
}

pub fn format_post(post: &PostArtifact) -> String {
    if post.is_empty() {
        return "No post yet.".to_string();
    }

    let image = match &post.image_data {
        Some(uri) => describe_image(uri),
        None => "none".to_string(),
    };
    format!(
        "{}\n\n[{} characters | image: {}]",
        post.text,
        post.char_count(),
        image
    )
}

pub fn format_status(session: &Session) -> String {
    let mut status = format!("State: {:?}\nTopic: {}", session.state, session.topic);
    if session.suggestion_in_flight && session.state != WorkflowState::SuggestingTopic {
        status.push_str("\nA topic suggestion is in flight.");
    }
    if let Some(error) = &session.error {
        status.push_str(&format!("\nLast error: {}", error.user_message));
    }
    status
}

/// Lines to print for the move from `previous` to `current`.
pub fn transition_messages(previous: &Session, current: &Session) -> Vec<String> {
    let mut messages = Vec::new();

    if current.state != previous.state {
        if let Some(progress) = current.state.progress_message() {
            messages.push(progress.to_string());
        }
        if current.state == WorkflowState::Done {
            messages.push("Post ready. Type `show` to read it or `share` to publish.".to_string());
        }
    }

    if current.error != previous.error {
        if let Some(error) = &current.error {
            messages.push(format!("Error: {}", error.user_message));
        }
    }

    messages
}

fn print_transitions(rx: &mut watch::Receiver<Session>, previous: &mut Session) {
    let current = rx.borrow_and_update().clone();
    for message in transition_messages(previous, &current) {
        println!("{}", message);
    }
    *previous = current;
}

/// Prints transitions until `shutdown` fires, then flushes the last one.
fn spawn_progress_printer(
    mut rx: watch::Receiver<Session>,
    mut shutdown: oneshot::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut previous = rx.borrow_and_update().clone();
        loop {
            tokio::select! {
                biased;
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    print_transitions(&mut rx, &mut previous);
                }
                _ = &mut shutdown => {
                    print_transitions(&mut rx, &mut previous);
                    break;
                }
            }
        }
    })
}

fn spawn_cycle(tasks: &mut JoinSet<()>, workflow: Arc<Workflow>, regenerate: bool) {
    tasks.spawn(async move {
        let outcome = if regenerate {
            workflow.regenerate().await
        } else {
            workflow.generate().await
        };
        match outcome {
            // Recorded on the snapshot and printed by the subscriber.
            CycleOutcome::Rejected(Rejection::EmptyTopic) => {}
            CycleOutcome::Rejected(rejection) => println!("{}", rejection_message(rejection)),
            outcome => debug!("Cycle finished: {:?}", outcome),
        }
    });
}

fn spawn_suggestion(tasks: &mut JoinSet<()>, workflow: Arc<Workflow>) {
    tasks.spawn(async move {
        match workflow.suggest().await {
            SuggestOutcome::Suggested(topic) => println!("Suggested topic: {}", topic),
            SuggestOutcome::Rejected => println!("A suggestion is already on its way."),
            SuggestOutcome::Failed => {}
        }
    });
}

async fn drain(tasks: &mut JoinSet<()>) {
    if !tasks.is_empty() {
        println!("Waiting for the running requests to finish...");
    }
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!("Background task ended abnormally: {}", e);
        }
    }
}

async fn read_edit<R>(lines: &mut Lines<R>) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut body = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if line.trim_end() == EDIT_TERMINATOR {
            return Ok(Some(body.join("\n")));
        }
        body.push(line);
    }
    Ok(None)
}

/// Run the interactive session until `quit` or end of input.
pub async fn run<R>(app: App, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let workflow = Arc::clone(&app.workflow);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let printer = spawn_progress_printer(workflow.subscribe(), shutdown_rx);
    let mut tasks = JoinSet::new();
    let mut lines = input.lines();

    println!("LinkedIn post generator. Type `help` for commands.");
    println!("Topic: {}", workflow.topic());

    while let Some(line) = lines.next_line().await? {
        while let Some(joined) = tasks.try_join_next() {
            if let Err(e) = joined {
                warn!("Background task ended abnormally: {}", e);
            }
        }

        let Some(command) = Command::parse(&line) else {
            continue;
        };

        match command {
            Command::Topic(topic) => {
                workflow.set_topic(topic);
                println!("Topic: {}", workflow.topic());
            }
            Command::Suggest => spawn_suggestion(&mut tasks, Arc::clone(&workflow)),
            Command::Generate => spawn_cycle(&mut tasks, Arc::clone(&workflow), false),
            Command::Regenerate => spawn_cycle(&mut tasks, Arc::clone(&workflow), true),
            Command::Edit => {
                if !matches!(workflow.state(), WorkflowState::Done | WorkflowState::Failed) {
                    println!("{}", rejection_message(Rejection::NotEditable));
                    continue;
                }
                println!("Enter the new post text. Finish with a line containing only '.'");
                let Some(text) = read_edit(&mut lines).await? else {
                    break;
                };
                match workflow.edit_post(text) {
                    Ok(()) => println!("Post updated ({} characters).", workflow.post().char_count()),
                    Err(rejection) => println!("{}", rejection_message(rejection)),
                }
            }
            Command::Show => println!("{}", format_post(&workflow.post())),
            Command::Share => {
                let post = workflow.post();
                if !post.is_shareable() {
                    println!("Generate a post with its image before sharing.");
                    continue;
                }
                let status = share_post(
                    &post.text,
                    app.clipboard.as_ref(),
                    app.opener.as_ref(),
                    &app.share_url,
                )
                .await;
                println!("{}", status.message());
            }
            Command::Save => match save_post(&workflow.post(), &app.output_dir) {
                Ok(saved) => println!("Saved to {}", saved.dir.display()),
                Err(e) => println!("Could not save the post: {}", e),
            },
            Command::Status => println!("{}", format_status(&workflow.snapshot())),
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
            Command::Unknown(word) => println!("Unknown command `{}`. Type `help`.", word),
        }
    }

    drain(&mut tasks).await;

    let _ = shutdown_tx.send(());
    if let Err(e) = printer.await {
        warn!("Progress printer ended abnormally: {}", e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::mime::to_data_uri;
    use crate::ai::mock::TINY_PNG;
    use crate::error::Error;
    use crate::ai::{GenerationService, MockGenerationClient};
    use crate::app::AppServices;
    use crate::models::{Config, GenerationError, Stage};
    use crate::share::{SystemClipboard, SystemLinkOpener};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tokio::io::BufReader;

    /// Answers every call after a delay, like a remote model would.
    struct SlowService {
        inner: MockGenerationClient,
        delay: Duration,
    }

    #[async_trait]
    impl GenerationService for SlowService {
        async fn suggest_topic(&self) -> Result<String> {
            tokio::time::sleep(self.delay).await;
            self.inner.suggest_topic().await
        }

        async fn generate_post_text(&self, topic: &str) -> Result<String> {
            tokio::time::sleep(self.delay).await;
            self.inner.generate_post_text(topic).await
        }

        async fn generate_image(&self, post_text: &str) -> Result<String> {
            tokio::time::sleep(self.delay).await;
            self.inner.generate_image(post_text).await
        }
    }

    fn slow_app(mock: &MockGenerationClient) -> App {
        let config =
            Config::from_lookup(|key| (key == "GEMINI_API_KEY").then(|| "k".to_string()))
                .unwrap();
        App::with_services(
            AppServices {
                generation: Arc::new(SlowService {
                    inner: mock.clone(),
                    delay: Duration::from_millis(50),
                }),
                clipboard: Box::new(SystemClipboard),
                opener: Box::new(SystemLinkOpener),
            },
            &config,
        )
    }

    fn session(state: WorkflowState) -> Session {
        Session {
            state,
            topic: "IA".to_string(),
            post: PostArtifact::default(),
            error: None,
            suggestion_in_flight: false,
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("topic  IA para pymes "),
            Some(Command::Topic("IA para pymes".to_string()))
        );
        assert_eq!(Command::parse("topic"), Some(Command::Topic(String::new())));
        assert_eq!(Command::parse("GENERATE"), Some(Command::Generate));
        assert_eq!(Command::parse("regen"), Some(Command::Regenerate));
        assert_eq!(Command::parse("exit"), Some(Command::Quit));
        assert_eq!(
            Command::parse("publish now"),
            Some(Command::Unknown("publish".to_string()))
        );
        assert_eq!(Command::parse("   "), None);
    }

    #[test]
    fn test_format_post() {
        assert_eq!(format_post(&PostArtifact::default()), "No post yet.");

        let post = PostArtifact {
            text: "Hola".to_string(),
            image_data: Some(to_data_uri(TINY_PNG)),
        };
        let rendered = format_post(&post);
        assert!(rendered.starts_with("Hola\n\n"));
        assert!(rendered.contains("4 characters"));
        assert!(rendered.contains(&format!("image/png, {} bytes", TINY_PNG.len())));
    }

    #[test]
    fn test_describe_image_handles_garbage() {
        assert_eq!(describe_image("not a uri"), "unreadable image data");
    }

    #[test]
    fn test_transition_messages_for_cycle() {
        let idle = session(WorkflowState::Idle);
        let post = session(WorkflowState::GeneratingPost);
        let done = session(WorkflowState::Done);

        assert_eq!(
            transition_messages(&idle, &post),
            vec![WorkflowState::GeneratingPost.progress_message().unwrap()]
        );
        assert!(transition_messages(&post, &done)[0].starts_with("Post ready"));
        assert!(transition_messages(&done, &done).is_empty());
    }

    #[test]
    fn test_transition_messages_report_new_error() {
        let before = session(WorkflowState::GeneratingImage);
        let mut after = session(WorkflowState::Failed);
        after.error = Some(GenerationError::new(
            Stage::Image,
            &Error::AiProvider("boom".to_string()),
        ));

        assert_eq!(
            transition_messages(&before, &after),
            vec!["Error: Could not generate an image for the post."]
        );
    }

    #[test]
    fn test_format_status_mentions_background_suggestion() {
        let mut s = session(WorkflowState::Done);
        s.suggestion_in_flight = true;
        let status = format_status(&s);
        assert!(status.contains("State: Done"));
        assert!(status.contains("suggestion is in flight"));
    }

    #[tokio::test]
    async fn test_read_edit_stops_at_terminator() {
        let input: &[u8] = b"Primera linea\n\nTercera\n.\nshow\n";
        let mut lines = BufReader::new(input).lines();

        let text = read_edit(&mut lines).await.unwrap();

        assert_eq!(text.as_deref(), Some("Primera linea\n\nTercera"));
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("show"));
    }

    #[tokio::test]
    async fn test_read_edit_without_terminator_is_none() {
        let input: &[u8] = b"sin fin\n";
        let mut lines = BufReader::new(input).lines();
        assert_eq!(read_edit(&mut lines).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_end_of_input_waits_for_running_cycle() {
        let mock = MockGenerationClient::new().with_post("Post terminado");
        let app = slow_app(&mock);
        let workflow = Arc::clone(&app.workflow);
        let input: &[u8] = b"generate\n";

        run(app, BufReader::new(input)).await.unwrap();

        assert_eq!(mock.image_calls(), 1);
        assert_eq!(workflow.state(), WorkflowState::Done);
        assert_eq!(workflow.post().text, "Post terminado");
    }

    #[tokio::test]
    async fn test_quit_waits_for_running_suggestion() {
        let mock = MockGenerationClient::new().with_topic("Tema nuevo");
        let app = slow_app(&mock);
        let workflow = Arc::clone(&app.workflow);
        let input: &[u8] = b"suggest\nquit\nshow\n";

        run(app, BufReader::new(input)).await.unwrap();

        assert_eq!(mock.topic_calls(), 1);
        assert_eq!(workflow.topic(), "Tema nuevo");
        let session = workflow.snapshot();
        assert!(!session.suggestion_in_flight);
        assert_eq!(session.state, WorkflowState::Idle);
    }
}
