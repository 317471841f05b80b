mod local;

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Args, Parser, Subcommand};
use reqwest::multipart::{Form, Part};
use serde_json::{Map, Value};

use local::{HistoryEntry, LocalError, LocalState};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("not logged in; run `login --remember` or set DOUBT_TOKEN")]
    MissingSessionToken,
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("cannot read {path}: {source}")]
    ReadImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error(transparent)]
    Local(#[from] LocalError),
}

#[derive(Parser, Debug)]
#[command(name = "doubt-cli", about = "Doubt Solver API client")]
struct Cli {
    #[arg(long, env = "DOUBT_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    /// Session token; overrides the remembered one.
    #[arg(long, env = "DOUBT_TOKEN")]
    token: Option<String>,

    /// Local state file; defaults to the platform config directory.
    #[arg(long, env = "DOUBT_STATE_FILE")]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

struct CliContext {
    base_url: String,
    token: Option<String>,
    state_path: PathBuf,
    state: LocalState,
}

#[derive(Subcommand, Debug)]
enum Command {
    Ping,
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "DOUBT_PASSWORD")]
        password: String,
        #[arg(long, default_value_t = false)]
        remember: bool,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "DOUBT_PASSWORD")]
        password: String,
        #[arg(long, default_value_t = false)]
        remember: bool,
    },
    Logout,
    Profile,
    Keys(KeysCommand),
    Solve {
        image: PathBuf,
        #[arg(long, default_value = "general")]
        subject: String,
    },
    History,
}

#[derive(Args, Debug)]
struct KeysCommand {
    #[command(subcommand)]
    command: KeysSubcommand,
}

#[derive(Subcommand, Debug)]
enum KeysSubcommand {
    Show,
    Set(KeysSetArgs),
}

/// Omitted flags leave a key untouched; an empty value clears it.
#[derive(Args, Debug)]
struct KeysSetArgs {
    #[arg(long)]
    gemini: Option<String>,
    #[arg(long)]
    anthropic: Option<String>,
    #[arg(long)]
    openai: Option<String>,
    #[arg(long)]
    other: Option<String>,
}

impl KeysSetArgs {
    fn pairs(&self) -> Vec<(&str, &str)> {
        [
            ("gemini", &self.gemini),
            ("anthropic", &self.anthropic),
            ("openai", &self.openai),
            ("other", &self.other),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let state_path = match cli.state_file {
        Some(path) => path,
        None => local::default_path()?,
    };
    let state = LocalState::load(&state_path)?;
    let mut ctx = CliContext {
        base_url: cli.base_url,
        token: cli.token.or_else(|| state.token.clone()),
        state_path,
        state,
    };

    match cli.command {
        Command::Ping => run_ping(&ctx).await,
        Command::Register { name, email, password, remember } => {
            let body = serde_json::json!({ "name": name, "email": email, "password": password });
            run_auth(&mut ctx, "/auth/register", body, remember).await
        }
        Command::Login { email, password, remember } => {
            let body = serde_json::json!({ "email": email, "password": password });
            run_auth(&mut ctx, "/auth/login", body, remember).await
        }
        Command::Logout => run_logout(&mut ctx).await,
        Command::Profile => {
            let json = api_request(&ctx, reqwest::Method::GET, "/auth/profile", None).await?;
            print_json(&json)
        }
        Command::Keys(keys) => match keys.command {
            KeysSubcommand::Show => run_keys_show(&ctx).await,
            KeysSubcommand::Set(args) => run_keys_set(&mut ctx, &args).await,
        },
        Command::Solve { image, subject } => run_solve(&mut ctx, &image, &subject).await,
        Command::History => run_history(&ctx).await,
    }
}

async fn run_ping(cli: &CliContext) -> Result<(), CliError> {
    let url = format!("{}/healthz", cli.base_url.trim_end_matches('/'));
    let status = reqwest::Client::new().get(url).send().await?.status();
    if !status.is_success() {
        return Err(CliError::ServerError { status: status.as_u16(), message: "health check failed".to_owned() });
    }
    println!("ok");
    Ok(())
}

async fn run_auth(cli: &mut CliContext, path: &str, body: Value, remember: bool) -> Result<(), CliError> {
    let json = send(cli, reqwest::Method::POST, path, Some(body), false).await?;
    if let Some(message) = json.get("message").and_then(Value::as_str) {
        println!("{message}");
    }

    let token = json.get("token").and_then(Value::as_str).unwrap_or_default();
    if remember && !token.is_empty() {
        let user = json.get("user").cloned().unwrap_or(Value::Null);
        cli.state.remember_session(token, user);
        cli.state.save(&cli.state_path)?;
        eprintln!("session remembered in {}", cli.state_path.display());
    } else if !token.is_empty() {
        println!("token: {token}");
    }
    Ok(())
}

async fn run_logout(cli: &mut CliContext) -> Result<(), CliError> {
    let result = api_request(cli, reqwest::Method::POST, "/auth/logout", None).await;

    // Forget the local session even if the server call failed.
    cli.state.forget_session();
    cli.state.save(&cli.state_path)?;

    let json = result?;
    if let Some(message) = json.get("message").and_then(Value::as_str) {
        println!("{message}");
    }
    Ok(())
}

async fn run_keys_show(cli: &CliContext) -> Result<(), CliError> {
    if cli.token.is_some() {
        match api_request(cli, reqwest::Method::GET, "/api-keys", None).await {
            Ok(json) => return print_json(&json),
            Err(e) => eprintln!("could not fetch keys from server, showing local keys: {e}"),
        }
    }
    print_json(&serde_json::json!({ "apiKeys": masked_keys(&cli.state) }))
}

async fn run_keys_set(cli: &mut CliContext, args: &KeysSetArgs) -> Result<(), CliError> {
    let pairs = args.pairs();
    if cli.token.is_some() {
        let keys: Map<String, Value> =
            pairs.iter().map(|(name, key)| ((*name).to_owned(), Value::String((*key).to_owned()))).collect();
        let body = serde_json::json!({ "apiKeys": keys });
        match api_request(cli, reqwest::Method::POST, "/api-keys", Some(body)).await {
            Ok(json) => {
                if let Some(message) = json.get("message").and_then(Value::as_str) {
                    println!("{message}");
                }
            }
            Err(e) => eprintln!("could not save keys to server, saving locally: {e}"),
        }
    }

    cli.state.set_keys(pairs);
    cli.state.save(&cli.state_path)?;
    println!("local keys: {}", cli.state.api_keys.keys().cloned().collect::<Vec<_>>().join(", "));
    Ok(())
}

async fn run_solve(cli: &mut CliContext, image: &Path, subject: &str) -> Result<(), CliError> {
    let bytes = std::fs::read(image).map_err(|source| CliError::ReadImage { path: image.to_owned(), source })?;
    let filename = image
        .file_name()
        .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());

    let part = Part::bytes(bytes).file_name(filename.clone()).mime_str(media_type_for(image))?;
    let form = Form::new()
        .part("image", part)
        .text("subject", subject.to_owned())
        .text("apiKeys", cli.state.api_keys_json());

    let url = format!("{}/solve", cli.base_url.trim_end_matches('/'));
    let mut request = reqwest::Client::new().post(url).multipart(form);
    if let Some(token) = &cli.token {
        request = request.bearer_auth(token);
    }
    let json = read_response(request.send().await?).await?;

    let provider = json.get("provider").and_then(Value::as_str).unwrap_or("unknown");
    let sections = json.get("sections").cloned().unwrap_or(Value::Null);
    println!("{}", render_sections(&sections));
    println!("Powered by {provider}");

    cli.state.push_history(HistoryEntry {
        filename,
        subject: subject.to_owned(),
        provider: provider.to_owned(),
        answer: sections
            .pointer("/finalAnswer/text")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned),
        solution: json.get("solution").and_then(Value::as_str).unwrap_or_default().to_owned(),
        time_ms: now_ms(),
    });
    cli.state.save(&cli.state_path)?;
    Ok(())
}

async fn run_history(cli: &CliContext) -> Result<(), CliError> {
    if cli.token.is_some() {
        match api_request(cli, reqwest::Method::GET, "/history", None).await {
            Ok(json) => return print_json(&json),
            Err(e) => eprintln!("could not fetch history from server, showing local history: {e}"),
        }
    }
    if cli.state.history.is_empty() {
        println!("No past doubts found");
        return Ok(());
    }
    for entry in &cli.state.history {
        println!(
            "{} [{}] via {} at {}: {}",
            entry.filename,
            entry.subject,
            entry.provider,
            entry.time_ms,
            entry.answer.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

async fn api_request(
    cli: &CliContext,
    method: reqwest::Method,
    path: &str,
    body: Option<Value>,
) -> Result<Value, CliError> {
    send(cli, method, path, body, true).await
}

async fn send(
    cli: &CliContext,
    method: reqwest::Method,
    path: &str,
    body: Option<Value>,
    authenticated: bool,
) -> Result<Value, CliError> {
    let url = format!("{}{}", cli.base_url.trim_end_matches('/'), path);
    let mut request = reqwest::Client::new().request(method, &url);
    if authenticated {
        let token = cli.token.as_deref().ok_or(CliError::MissingSessionToken)?;
        request = request.bearer_auth(token);
    }
    if let Some(json) = body {
        request = request.json(&json);
    }
    read_response(request.send().await?).await
}

async fn read_response(response: reqwest::Response) -> Result<Value, CliError> {
    let status = response.status();
    let value = response.json::<Value>().await.unwrap_or(Value::Null);
    if !status.is_success() {
        let message = value
            .get("error")
            .and_then(Value::as_str)
            .map_or_else(|| value.to_string(), ToOwned::to_owned);
        return Err(CliError::ServerError { status: status.as_u16(), message });
    }
    Ok(value)
}

/// Declared content type by file extension. Unknown extensions are sent as
/// octet-stream and treated as JPEG by the server.
fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

fn masked_keys(state: &LocalState) -> Map<String, Value> {
    state
        .api_keys
        .iter()
        .map(|(name, key)| {
            let tail: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
            (name.clone(), Value::String(format!("****{tail}")))
        })
        .collect()
}

/// Plain-text rendering of the `sections` object returned by `/solve`.
fn render_sections(sections: &Value) -> String {
    let lines = |key: &str| -> Vec<String> {
        sections
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).map(ToOwned::to_owned).collect())
            .unwrap_or_default()
    };

    let mut out = String::new();
    for paragraph in lines("introduction") {
        out.push_str(&paragraph);
        out.push_str("\n\n");
    }

    let mut n = 0_usize;
    for run in sections.get("steps").and_then(Value::as_array).into_iter().flatten() {
        for step in run.as_array().into_iter().flatten().filter_map(Value::as_str) {
            n += 1;
            out.push_str(&format!("  {n}. {step}\n"));
        }
    }
    if n > 0 {
        out.push('\n');
    }

    for paragraph in lines("explanation") {
        out.push_str(&paragraph);
        out.push_str("\n\n");
    }
    if let Some(answer) = sections.pointer("/finalAnswer/text").and_then(Value::as_str) {
        out.push_str(&format!("Final Answer: {answer}\n\n"));
    }
    for paragraph in lines("summary") {
        out.push_str(&format!("Summary: {paragraph}\n"));
    }
    out.trim_end().to_owned()
}

fn now_ms() -> i64 {
    let Ok(duration) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(duration.as_millis()).unwrap_or(0)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
