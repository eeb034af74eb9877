//! Command-line front end for the API client.
//!
//! Commands map one-to-one onto [`ApiClient`] operations and produce a JSON
//! document for stdout. Failures keep the [`ApiError`] shape so scripts can
//! branch on `code`.

mod session_handler;

pub use session_handler::TerminalSessionExpiredHandler;

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::domain::ports::{MultipartForm, TokenStoreError};
use crate::domain::{ApiClient, ApiError};

/// `erp-client` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "erp-client",
    about = "Call the School ERP API with the stored session",
    version
)]
pub struct Cli {
    /// Operation to perform.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Inspect or modify the stored session.
    #[command(subcommand)]
    Session(SessionCommand),
    /// `GET` a resource.
    Get {
        /// Path below the API base URL, e.g. `/students`.
        path: String,
        /// Query parameter as `key=value`; repeatable.
        #[arg(long = "query", value_name = "key=value", value_parser = parse_pair)]
        query: Vec<(String, String)>,
        /// Print the whole envelope instead of its `data`.
        #[arg(long)]
        meta: bool,
    },
    /// `POST` a JSON body.
    Post(BodyArgs),
    /// `PUT` a JSON body.
    Put(BodyArgs),
    /// `DELETE` a resource.
    Delete {
        /// Path below the API base URL.
        path: String,
    },
    /// `POST` a multipart form.
    Upload {
        /// Path below the API base URL.
        path: String,
        /// Text field as `name=value`; repeatable.
        #[arg(long = "field", value_name = "name=value", value_parser = parse_pair)]
        fields: Vec<(String, String)>,
        /// File field as `name=path`; repeatable.
        #[arg(long = "file", value_name = "name=path", value_parser = parse_pair)]
        files: Vec<(String, String)>,
    },
}

/// Arguments shared by body-carrying verbs.
#[derive(Debug, Clone, Args)]
pub struct BodyArgs {
    /// Path below the API base URL.
    pub path: String,
    /// JSON request body; omitted means no body.
    #[arg(long, value_name = "json", value_parser = parse_json)]
    pub json: Option<Value>,
}

/// Session subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum SessionCommand {
    /// Store a session after signing in elsewhere.
    Set {
        /// Bearer token.
        #[arg(long)]
        token: String,
        /// Role name stored alongside the token.
        #[arg(long)]
        role: Option<String>,
        /// User object as JSON.
        #[arg(long = "user-data", value_name = "json", value_parser = parse_json)]
        user_data: Option<Value>,
    },
    /// Remove the stored session.
    Clear,
    /// Report whether the stored session is usable.
    Status,
    /// Fold legacy `authToken` / `userRole` keys into the primary keys.
    Migrate,
}

/// Failures surfaced by [`run`].
#[derive(Debug, Error)]
pub enum CliError {
    /// The API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The session store failed outside an API call.
    #[error(transparent)]
    Storage(#[from] TokenStoreError),
    /// A file named by `--file` could not be read.
    #[error("failed to read upload {path}: {source}")]
    Upload {
        /// Path as given on the command line.
        path: Utf8PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: io::Error,
    },
}

impl CliError {
    /// JSON document describing the failure.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Api(error) => json!(error),
            Self::Storage(error) => json!({
                "message": error.to_string(),
                "code": "STORAGE_ERROR",
            }),
            Self::Upload { .. } => json!({
                "message": self.to_string(),
                "code": "UPLOAD_ERROR",
            }),
        }
    }
}

/// Snapshot printed by `session status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    /// A usable, unexpired token is stored.
    pub authenticated: bool,
    /// Role claim of the token.
    pub role: Option<String>,
    /// School claim of the token.
    pub school_id: Option<i64>,
}

/// Execute `command` against `client` and return the JSON to print.
///
/// # Errors
///
/// Returns [`CliError::Api`] for failed calls, [`CliError::Storage`]
/// when session commands cannot update storage and [`CliError::Upload`]
/// when an upload file cannot be read.
pub async fn run(client: &ApiClient, command: Command) -> Result<Value, CliError> {
    let output = match command {
        Command::Session(action) => run_session(client, action)?,
        Command::Get { path, query, meta } => {
            let pairs: Vec<(&str, &str)> = query
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str()))
                .collect();
            if meta {
                let path = with_query(&path, &pairs);
                json!(client.get_with_meta::<Value>(&path).await?)
            } else if pairs.is_empty() {
                client.get::<Value>(&path).await?
            } else {
                client.get_with_query::<Value>(&path, &pairs).await?
            }
        }
        Command::Post(BodyArgs { path, json }) => match json {
            Some(body) => client.post::<Value, _>(&path, &body).await?,
            None => client.post_empty::<Value>(&path).await?,
        },
        Command::Put(BodyArgs { path, json }) => match json {
            Some(body) => client.put::<Value, _>(&path, &body).await?,
            None => client.put_empty::<Value>(&path).await?,
        },
        Command::Delete { path } => client.delete::<Value>(&path).await?,
        Command::Upload {
            path,
            fields,
            files,
        } => {
            let form = build_form(fields, files)?;
            client.post_form_data::<Value>(&path, form).await?
        }
    };
    Ok(output)
}

fn run_session(client: &ApiClient, action: SessionCommand) -> Result<Value, CliError> {
    let output = match action {
        SessionCommand::Set {
            token,
            role,
            user_data,
        } => {
            client.store_session(&token, role.as_deref(), user_data.as_ref())?;
            json!({ "stored": true })
        }
        SessionCommand::Clear => {
            client.logout()?;
            json!({ "cleared": true })
        }
        SessionCommand::Status => json!(SessionStatus {
            authenticated: client.is_authenticated(),
            role: client.role(),
            school_id: client.school_id(),
        }),
        SessionCommand::Migrate => {
            let report = client.migrate_legacy_keys()?;
            json!({
                "tokenMigrated": report.token_migrated,
                "roleMigrated": report.role_migrated,
            })
        }
    };
    Ok(output)
}

fn with_query(path: &str, pairs: &[(&str, &str)]) -> String {
    if pairs.is_empty() {
        return path.to_owned();
    }
    let encoded = pairs
        .iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&");
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}{encoded}")
}

fn encode_component(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

fn build_form(
    fields: Vec<(String, String)>,
    files: Vec<(String, String)>,
) -> Result<MultipartForm, CliError> {
    let form = fields
        .into_iter()
        .fold(MultipartForm::new(), |form, (name, value)| form.text(name, value));
    files.into_iter().try_fold(form, |form, (name, raw_path)| {
        let path = Utf8PathBuf::from(raw_path);
        let bytes = match read_upload(&path) {
            Ok(bytes) => bytes,
            Err(source) => return Err(CliError::Upload { path, source }),
        };
        let file_name = path.file_name().unwrap_or(path.as_str()).to_owned();
        Ok(match content_type_for(&path) {
            Some(mime) => form.file_with_type(name, file_name, mime, bytes),
            None => form.file(name, file_name, bytes),
        })
    })
}

fn read_upload(path: &Utf8Path) -> io::Result<Vec<u8>> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "upload path must be a file"))?;
    let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
    directory.read(file_name)
}

fn content_type_for(path: &Utf8Path) -> Option<&'static str> {
    let extension = path.extension()?.to_ascii_lowercase();
    match extension.as_str() {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "csv" => Some("text/csv"),
        "xlsx" => Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        _ => None,
    }
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("key must not be empty in {raw:?}"));
    }
    Ok((key.to_owned(), value.to_owned()))
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|error| format!("invalid JSON: {error}"))
}

#[cfg(test)]
mod tests;
