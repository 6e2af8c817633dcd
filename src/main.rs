use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use model_advisor_lib::chat::{ConversationStore, HistoryOutcome, SendOutcome, UploadOutcome};
use model_advisor_lib::client::{AssistantBackend, HttpBackend};
use model_advisor_lib::config::{load_config, AdvisorConfig, PartialAdvisorConfig};
use model_advisor_lib::error::ValidationError;
use model_advisor_lib::events::{
    ClientEvent, HintChangedPayload, LoadingChangedPayload, MessageAppendedPayload,
    RecommendationExtractedPayload, SessionEndedPayload, UploadStatusPayload, EVENT_CHAT_RESET,
    EVENT_HINT_CHANGED, EVENT_HISTORY_LOADED, EVENT_LOADING_CHANGED, EVENT_MESSAGE_APPENDED,
    EVENT_RECOMMENDATION_EXTRACTED, EVENT_SESSION_ENDED, EVENT_UPLOAD_STATUS_CHANGED,
};
use model_advisor_lib::session::{EndReason, IdentityStore};
use model_advisor_lib::shutdown::{
    register_signal_handlers, ShutdownHandler, ShutdownResult, SIGNAL_EXIT_CODE,
};
use model_advisor_lib::{AdvisorClient, ChatMessage, ModelRecommendation, Sender, UploadStatus};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio::task::JoinSet;

/// Model Advisor - chat with the model selection assistant from the terminal
#[derive(Parser, Debug)]
#[command(name = "model-advisor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Assistant service URL
    #[arg(long, global = true, env = "MODEL_ADVISOR_BASE_URL")]
    base_url: Option<String>,

    /// Directory holding the persisted session
    #[arg(long, global = true, env = "MODEL_ADVISOR_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Config file (defaults to ~/.model-advisor/config.toml)
    #[arg(long, global = true, env = "MODEL_ADVISOR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and persist the session
    Login {
        #[arg(long)]
        email: String,
        /// Prompted for when omitted
        #[arg(long, env = "MODEL_ADVISOR_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "MODEL_ADVISOR_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Start the interactive chat
    Chat {
        /// Start a session for this identity instead of restoring one
        #[arg(long)]
        identity: Option<String>,
    },
    /// End the persisted session
    Logout,
    /// Print the stored conversation
    History,
    /// Show configuration, session and service health
    Status,
}

/// Why the chat loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShellExit {
    /// stdin closed: the client is going away
    Eof,
    /// `/logout` already ended the session
    Logout,
    /// `/detach`: leave the session persisted for the next run
    Detach,
}

/// One line of chat input
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Empty,
    Message(String),
    Alternative,
    History,
    Clear,
    Upload(PathBuf),
    SendFile,
    Logout,
    Detach,
    Help,
    Unknown(String),
}

fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Empty;
    }
    if !trimmed.starts_with('/') {
        return Input::Message(line.to_string());
    }

    let (command, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (trimmed, ""),
    };

    match command {
        "/alt" => Input::Alternative,
        "/history" => Input::History,
        "/clear" => Input::Clear,
        "/upload" if !arg.is_empty() => Input::Upload(PathBuf::from(arg)),
        "/send-file" => Input::SendFile,
        "/logout" => Input::Logout,
        "/detach" => Input::Detach,
        "/help" => Input::Help,
        _ => Input::Unknown(trimmed.to_string()),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(PartialAdvisorConfig::default_path);
    let config = load_config(
        &config_path,
        PartialAdvisorConfig {
            base_url: cli.base_url.clone(),
            request_timeout_secs: cli.timeout,
            state_dir: cli.state_dir.clone(),
            shutdown_grace_ms: None,
        },
    )?;
    log::debug!("Effective config: {:?}", config);

    let backend: Arc<dyn AssistantBackend> =
        Arc::new(HttpBackend::new(&config.base_url, config.request_timeout())?);
    let client = AdvisorClient::new(backend.clone(), IdentityStore::new(&config.state_dir));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let result = runtime.block_on(dispatch(cli.command, client, backend, config));
    // Do not wait on a stdin read that may still be parked on the blocking pool
    runtime.shutdown_background();
    result
}

async fn dispatch(
    command: Command,
    client: AdvisorClient,
    backend: Arc<dyn AssistantBackend>,
    config: AdvisorConfig,
) -> Result<i32> {
    match command {
        Command::Login { email, password } => {
            let password = resolve_password(password)?;
            client.session.restore();
            let identity = client.session.login(&email, &password).await?;
            println!("Logged in as {}", identity);
            Ok(0)
        }
        Command::Signup {
            name,
            email,
            password,
        } => {
            let password = resolve_password(password)?;
            client.session.signup(&name, &email, &password).await?;
            println!(
                "Account created. Log in with `model-advisor login --email {}`.",
                email.trim()
            );
            Ok(0)
        }
        Command::Chat { identity } => run_chat(client, &config, identity).await,
        Command::Logout => match client.session.restore() {
            Some(identity) => {
                client.session.end(EndReason::UserInitiated).await;
                println!("Logged out {}", identity);
                Ok(0)
            }
            None => {
                println!("No active session");
                Ok(0)
            }
        },
        Command::History => {
            require_session(&client)?;
            match client.history.load_history().await {
                HistoryOutcome::Loaded(_) => {
                    let identity = client.session.current().identity;
                    for message in client.conversation.messages() {
                        println!("{}", format_message(&message, &identity));
                    }
                    Ok(0)
                }
                HistoryOutcome::Rejected(e) => Err(anyhow!(e)),
                HistoryOutcome::Failed(e) => Err(anyhow!(e)),
            }
        }
        Command::Status => {
            println!("Service:    {}", config.base_url);
            println!("State dir:  {}", config.state_dir.display());
            match client.session.restore() {
                Some(identity) => println!("Session:    {}", identity),
                None => println!("Session:    none"),
            }
            match backend.health().await {
                Ok(health) if health.is_healthy() => println!("Health:     healthy"),
                Ok(health) => println!("Health:     {}", health.status),
                Err(e) => println!("Health:     unreachable ({})", e),
            }
            Ok(0)
        }
    }
}

fn resolve_password(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    print!("Password: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn require_session(client: &AdvisorClient) -> Result<String> {
    client.session.restore().ok_or_else(|| {
        anyhow!("No active session. Run `model-advisor login --email <email>` first.")
    })
}

async fn run_chat(
    client: AdvisorClient,
    config: &AdvisorConfig,
    identity: Option<String>,
) -> Result<i32> {
    let restored = client.session.restore();
    match identity {
        Some(identity) => client.session.start(&identity)?,
        None if restored.is_some() => {}
        None => bail!(
            "No active session. Run `model-advisor login --email <email>` or pass --identity."
        ),
    }
    let identity = client.session.current().identity;

    let handler = ShutdownHandler::new();
    let grace = config.shutdown_grace();
    {
        let session = client.session.clone();
        let handler = handler.clone();
        if let Err(e) = register_signal_handlers(move || {
            let ended = handler.handle_shutdown(|| ShutdownResult::new(session.terminate()));
            if ended.is_some() {
                // Give the detached notice a chance to leave the process
                std::thread::sleep(grace);
                std::process::exit(SIGNAL_EXIT_CODE);
            }
        }) {
            log::warn!("Failed to register signal handlers: {}", e);
        }
    }

    let mut renderer = tokio::spawn(render_events(
        client.events.subscribe(),
        client.conversation.clone(),
        identity.clone(),
    ));

    println!("Chatting as {}. Type /help for commands.", identity);

    // Requests issued from the prompt; an orderly exit lets them finish
    let mut tasks: JoinSet<()> = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let exit = loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break ShellExit::Eof,
            Err(e) => {
                log::warn!("Failed to read input: {}", e);
                break ShellExit::Eof;
            }
        };

        match parse_input(&line) {
            Input::Empty => {}
            Input::Message(text) => {
                let pipeline = client.pipeline.clone();
                tasks.spawn(async move { report_send(&pipeline.send(&text, false).await) });
            }
            Input::Alternative => {
                let pipeline = client.pipeline.clone();
                tasks.spawn(async move { report_send(&pipeline.request_alternative().await) });
            }
            Input::History => {
                let history = client.history.clone();
                tasks.spawn(async move {
                    if let HistoryOutcome::Failed(e) = history.load_history().await {
                        println!("Could not load history: {}", e);
                    }
                });
            }
            Input::Clear => client.history.reset(),
            Input::Upload(path) => match client.uploads.select(&path) {
                Ok(_) => spawn_upload(&client, &mut tasks),
                Err(e) => println!("Upload failed: {}", e),
            },
            Input::SendFile => spawn_upload(&client, &mut tasks),
            Input::Logout => break ShellExit::Logout,
            Input::Detach => break ShellExit::Detach,
            Input::Help => print_help(),
            Input::Unknown(command) => {
                println!("Unknown command '{}'. Type /help for commands.", command)
            }
        }
    };

    drain_in_flight(&mut tasks, config.request_timeout()).await;

    match exit {
        ShellExit::Eof => {
            let result =
                handler.handle_shutdown(|| ShutdownResult::new(client.session.terminate()));
            if matches!(result, Some(ref r) if r.session_ended) {
                tokio::time::sleep(grace).await;
            }
        }
        ShellExit::Logout => {
            client.session.end(EndReason::UserInitiated).await;
        }
        ShellExit::Detach => {}
    }

    // The renderer stops by itself once it has shown the session end
    if tokio::time::timeout(grace, &mut renderer).await.is_err() {
        renderer.abort();
    }
    match exit {
        ShellExit::Eof => {}
        ShellExit::Logout => println!("Logged out."),
        ShellExit::Detach => println!("Detached. The session stays active for the next run."),
    }
    Ok(0)
}

/// Wait for in-flight requests, abandoning whatever is still running after `limit`
async fn drain_in_flight(tasks: &mut JoinSet<()>, limit: Duration) {
    if tasks.is_empty() {
        return;
    }

    let drained = tokio::time::timeout(limit, async {
        while tasks.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        log::warn!(
            "Abandoning {} in-flight request(s) after {:?}",
            tasks.len(),
            limit
        );
        tasks.abort_all();
    }
}

/// One-line notice for a send the pipeline refused
fn send_notice(outcome: &SendOutcome) -> Option<String> {
    match outcome {
        SendOutcome::Rejected(ValidationError::SendInFlight) => {
            Some("Still waiting for the assistant; message not sent.".to_string())
        }
        SendOutcome::Rejected(e) => Some(format!("Message not sent: {}", e)),
        SendOutcome::Replied(_) | SendOutcome::Failed(_) => None,
    }
}

fn report_send(outcome: &SendOutcome) {
    if let Some(notice) = send_notice(outcome) {
        println!("{}", notice);
    }
}

fn spawn_upload(client: &AdvisorClient, tasks: &mut JoinSet<()>) {
    let uploads = client.uploads.clone();
    tasks.spawn(async move {
        if let UploadOutcome::Rejected(e) = uploads.upload().await {
            println!("Upload failed: {}", e);
        }
    });
}

fn print_help() {
    println!("Commands:");
    println!("  /alt            ask for a different model");
    println!("  /history        reload the stored conversation");
    println!("  /clear          clear the conversation on screen");
    println!("  /upload <path>  select a file and upload it");
    println!("  /send-file      retry the selected upload");
    println!("  /logout         end the session and quit");
    println!("  /detach         quit and keep the session");
    println!("Anything else is sent to the assistant. Ctrl+D quits and ends the session.");
}

async fn render_events(
    mut rx: broadcast::Receiver<ClientEvent>,
    conversation: ConversationStore,
    identity: String,
) {
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                log::warn!("Renderer skipped {} events", skipped);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };
        render_event(&event, &conversation, &identity);
        if event.event == EVENT_SESSION_ENDED {
            break;
        }
    }
}

fn render_event(
    event: &ClientEvent,
    conversation: &ConversationStore,
    identity: &str,
) {
    match event.event.as_str() {
        EVENT_MESSAGE_APPENDED => {
            if let Some(payload) = event.payload_as::<MessageAppendedPayload>() {
                // The user's own line is already on screen
                if !payload.message.is_owned_by(identity) {
                    println!("{}", format_message(&payload.message, identity));
                }
            }
        }
        EVENT_LOADING_CHANGED => {
            if let Some(LoadingChangedPayload { loading: true }) = event.payload_as() {
                println!("... waiting for the assistant");
            }
        }
        EVENT_HINT_CHANGED => {
            if let Some(payload) = event.payload_as::<HintChangedPayload>() {
                println!("[current model] {}", payload.model_name);
            }
        }
        EVENT_RECOMMENDATION_EXTRACTED => {
            if let Some(payload) = event.payload_as::<RecommendationExtractedPayload>() {
                println!("{}", format_recommendation(&payload.recommendation));
            }
        }
        EVENT_CHAT_RESET => println!("Conversation cleared."),
        EVENT_HISTORY_LOADED => {
            for message in conversation.messages() {
                println!("{}", format_message(&message, identity));
            }
        }
        EVENT_SESSION_ENDED => {
            if let Some(payload) = event.payload_as::<SessionEndedPayload>() {
                log::debug!("Session ended ({})", payload.reason);
            }
        }
        EVENT_UPLOAD_STATUS_CHANGED => {
            if let Some(payload) = event.payload_as::<UploadStatusPayload>() {
                match payload.status {
                    UploadStatus::Selected => println!("Selected {}", payload.file),
                    UploadStatus::Uploading => println!("Uploading {}...", payload.file),
                    UploadStatus::Done => println!("File uploaded successfully!"),
                    UploadStatus::Failed => println!(
                        "Upload failed: {}. Retry with /send-file.",
                        payload.error.unwrap_or_default()
                    ),
                }
            }
        }
        _ => {}
    }
}

fn format_message(message: &ChatMessage, identity: &str) -> String {
    match message.sender {
        Sender::User if message.is_owned_by(identity) => {
            format!("{:>60}", format!("you> {}", message.text))
        }
        Sender::User => format!("user> {}", message.text),
        Sender::Assistant => format!("assistant> {}", message.text),
    }
}

fn format_recommendation(rec: &ModelRecommendation) -> String {
    let field = |value: &str| {
        if value.is_empty() {
            "-".to_string()
        } else {
            value.to_string()
        }
    };

    [
        "+-- Recommended model ------------------".to_string(),
        format!("| Model Name : {}", field(&rec.model_name)),
        format!("| Price      : {}", field(&rec.price)),
        format!("| Speed      : {}", field(&rec.speed)),
        format!("| Accuracy   : {} %", rec.accuracy),
        format!("| Cloud      : {}", field(&rec.cloud)),
        format!("| Region     : {}", field(&rec.region)),
        format!("| Reason     : {}", field(&rec.reason)),
        "+---------------------------------------".to_string(),
    ]
    .join("\n")
}
