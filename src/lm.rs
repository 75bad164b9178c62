//! Model completion backends.
//!
//! Two backends implement `CompletionModel`:
//!
//! - `OpenAiClient` posts to an OpenAI-compatible `/chat/completions` endpoint.
//! - `CommandModel` runs a local command (parsed with shell-words), writes
//!   the system and user prompt to its stdin, and reads the reply from
//!   stdout. The requested model name is exported as `JOBSCOUT_MODEL`.
//!
//! `JOBSCOUT_LM_COMMAND` selects the command backend; otherwise
//! `OPENAI_API_KEY` (and optionally `OPENAI_BASE_URL`) select the HTTP one.
use crate::error::{ScoutError, ScoutResult};
use serde::Deserialize;
use serde_json::json;
use std::env;
use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

pub const LM_COMMAND_ENV: &str = "JOBSCOUT_LM_COMMAND";
pub const MODEL_NAME_ENV: &str = "JOBSCOUT_MODEL";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHEAP_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_EXPENSIVE_MODEL: &str = "gpt-4.1-mini";
pub const MODEL_TIMEOUT: Duration = Duration::from_secs(120);
pub const SYSTEM_PROMPT: &str =
    "You are a careful assistant that follows the prompt instructions exactly.";

const COLLABORATOR: &str = "model";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// Triage model used by `analyze`.
    Cheap,
    /// Writing model used by `draft`.
    Expensive,
}

impl ModelTier {
    /// `--model` wins, then the tier's environment variable, then the default.
    pub fn resolve(self, flag: Option<&str>) -> String {
        let (var, default) = match self {
            ModelTier::Cheap => ("OPENAI_CHEAP_MODEL", DEFAULT_CHEAP_MODEL),
            ModelTier::Expensive => ("OPENAI_EXPENSIVE_MODEL", DEFAULT_EXPENSIVE_MODEL),
        };
        flag.map(str::to_string)
            .or_else(|| env::var(var).ok())
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| default.to_string())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
}

pub trait CompletionModel {
    fn complete(&self, request: &CompletionRequest<'_>) -> ScoutResult<String>;
}

/// Pick a backend from the environment.
pub fn model_from_env() -> ScoutResult<Box<dyn CompletionModel>> {
    if let Some(command) = env::var(LM_COMMAND_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
    {
        return Ok(Box::new(CommandModel::parse(&command, MODEL_TIMEOUT)?));
    }
    let api_key = env::var("OPENAI_API_KEY")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            ScoutError::Config(format!(
                "no model backend configured (set OPENAI_API_KEY or {LM_COMMAND_ENV})"
            ))
        })?;
    let base_url = env::var("OPENAI_BASE_URL")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    Ok(Box::new(OpenAiClient::new(base_url, api_key, MODEL_TIMEOUT)))
}

pub struct OpenAiClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

impl CompletionModel for OpenAiClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> ScoutResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": request.model,
            "temperature": request.temperature,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.prompt},
            ],
        });
        let start = Instant::now();
        let mut response = self
            .agent
            .post(&url)
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(&body)
            .map_err(|err| ScoutError::collaborator(COLLABORATOR, err))?;
        let parsed: ChatResponse = response
            .body_mut()
            .read_json()
            .map_err(|err| ScoutError::collaborator(COLLABORATOR, format!("decode reply: {err}")))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ScoutError::collaborator(COLLABORATOR, "reply has no message content"))?;
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            model = request.model,
            prompt_bytes = request.prompt.len(),
            response_bytes = content.len(),
            "model completion"
        );
        Ok(content)
    }
}

/// A local command acting as the model.
#[derive(Debug, Clone)]
pub struct CommandModel {
    argv: Vec<String>,
    timeout: Duration,
}

impl CommandModel {
    pub fn parse(command: &str, timeout: Duration) -> ScoutResult<Self> {
        let argv = shell_words::split(command).map_err(|err| {
            ScoutError::Config(format!("parse {LM_COMMAND_ENV} {command:?}: {err}"))
        })?;
        if argv.is_empty() {
            return Err(ScoutError::Config(format!("{LM_COMMAND_ENV} is empty")));
        }
        Ok(Self { argv, timeout })
    }
}

impl CompletionModel for CommandModel {
    fn complete(&self, request: &CompletionRequest<'_>) -> ScoutResult<String> {
        let program = &self.argv[0];
        let start = Instant::now();
        let mut child = Command::new(program)
            .args(&self.argv[1..])
            .env(MODEL_NAME_ENV, request.model)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| ScoutError::collaborator(COLLABORATOR, format!("spawn {program}: {err}")))?;

        let input = format!("{}\n\n{}", request.system, request.prompt);
        let stdin = child.stdin.take();
        let writer = thread::spawn(move || {
            if let Some(mut stdin) = stdin {
                // A command that exits without reading its input is not an error.
                let _ = stdin.write_all(input.as_bytes());
            }
        });
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let status = wait_with_deadline(&mut child, self.timeout)?;
        let Some(status) = status else {
            return Err(ScoutError::collaborator(
                COLLABORATOR,
                format!("{program} timed out after {} s", self.timeout.as_secs_f32()),
            ));
        };
        let _ = writer.join();
        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            model = request.model,
            prompt_bytes = request.prompt.len(),
            response_bytes = stdout.len(),
            "model command complete"
        );

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(ScoutError::collaborator(
                COLLABORATOR,
                format!("{program} failed with {status}: {}", stderr.trim()),
            ));
        }
        String::from_utf8(stdout).map_err(|err| {
            ScoutError::collaborator(COLLABORATOR, format!("decode {program} stdout: {err}"))
        })
    }
}

fn spawn_reader<R: Read + Send + 'static>(source: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut bytes = Vec::new();
        if let Some(mut source) = source {
            let _ = source.read_to_end(&mut bytes);
        }
        bytes
    })
}

/// Wait for `child`, killing it once `timeout` passes. `None` means timed out.
fn wait_with_deadline(
    child: &mut Child,
    timeout: Duration,
) -> ScoutResult<Option<std::process::ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        let polled = child
            .try_wait()
            .map_err(|err| ScoutError::collaborator(COLLABORATOR, format!("wait: {err}")))?;
        if let Some(status) = polled {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(Duration::from_millis(20));
    }
}
