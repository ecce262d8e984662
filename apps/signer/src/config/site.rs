//! The site file: the signer plus the stages that consume its token.
//!
//! Two formats are accepted. Files ending in `.json` hold the JSON form:
//!
//! ```json
//! {
//!   "jwt_signer": { "duration": "15m", "secret": "{env.SECRET}", "claims": { "sub": "{http.request.header.X-User}" } },
//!   "headers": { "Authorization": "Bearer {http.jwt_signer.digest_str}" },
//!   "redir": { "target": "https://app.example.com/?token={http.jwt_signer.digest_str}" }
//! }
//! ```
//!
//! Anything else is read as directives (see [`super::directive`]):
//!
//! ```text
//! jwt_signer 15m {env.SECRET} {
//!     sub {http.request.header.X-User}
//! }
//! header Authorization "Bearer {http.jwt_signer.digest_str}"
//! redir "https://app.example.com/?token={http.jwt_signer.digest_str}" 302
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use actix_web::http::header::HeaderName;
use actix_web::http::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};

use super::directive::Dispenser;
use super::signer::SignerConfig;
use crate::AppError;

/// A response header whose value is expanded per request.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderTemplate {
    pub name: HeaderName,
    pub value: String,
}

/// What the pipeline answers once the token has been issued.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminal {
    Redirect { target: String, status: StatusCode },
    Respond { body: String, status: StatusCode },
    NoContent,
}

#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub signer: Arc<SignerConfig>,
    pub headers: Arc<Vec<HeaderTemplate>>,
    pub terminal: Terminal,
}

impl SiteConfig {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("reading {}: {e}", path.display())))?;

        let config = if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&text)?
        } else {
            let file = path.file_name().map_or_else(
                || path.display().to_string(),
                |name| name.to_string_lossy().into_owned(),
            );
            Self::from_directives(&file, &text)?
        };

        info!(
            path = %path.display(),
            claims = config.signer.claims.len(),
            headers = config.headers.len(),
            "Site config loaded"
        );
        Ok(config)
    }

    pub fn from_directives(file: &str, input: &str) -> Result<Self, AppError> {
        let mut d = Dispenser::parse(file, input)?;

        let mut signer = None;
        let mut headers = Vec::new();
        let mut terminal = None;

        while d.next() {
            let directive = d.val().to_string();
            debug!(%directive, line = d.line(), "Parsing directive");

            match directive.as_str() {
                "jwt_signer" => {
                    if signer.is_some() {
                        return Err(d.err("jwt_signer may only be declared once"));
                    }
                    signer = Some(SignerConfig::from_dispenser(&mut d)?);
                }
                "header" => {
                    let [name, value] =
                        <[String; 2]>::try_from(d.remaining_args()).map_err(|_| d.arg_err())?;
                    headers.push(header_template(&name, value).map_err(|e| d.err(e.detail()))?);
                }
                "redir" | "respond" => {
                    if terminal.is_some() {
                        return Err(d.err("only one of redir or respond may be declared"));
                    }
                    let args = d.remaining_args();
                    let (template, status) = match args.as_slice() {
                        [template] => (template.clone(), None),
                        [template, status] => (template.clone(), Some(status.as_str())),
                        _ => return Err(d.arg_err()),
                    };
                    let status = status
                        .map(|s| {
                            s.parse::<u16>()
                                .map_err(|_| d.err(format!("invalid status code: {s}")))
                        })
                        .transpose()?;

                    terminal = Some(if directive == "redir" {
                        redirect(template, status)
                    } else {
                        respond(template, status)
                    }
                    .map_err(|e| d.err(e.detail()))?);
                }
                other => return Err(d.err(format!("unrecognized directive: {other}"))),
            }
        }

        let signer = signer.ok_or_else(|| AppError::config(format!("{file}: missing jwt_signer directive")))?;

        Ok(Self {
            signer: Arc::new(signer),
            headers: Arc::new(headers),
            terminal: terminal.unwrap_or(Terminal::NoContent),
        })
    }

    pub fn from_json_str(input: &str) -> Result<Self, AppError> {
        let raw: RawSiteConfig =
            serde_json::from_str(input).map_err(|e| AppError::config(format!("invalid site config: {e}")))?;
        raw.try_into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSiteConfig {
    jwt_signer: SignerConfig,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    redir: Option<RawRedirect>,
    respond: Option<RawRespond>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRedirect {
    target: String,
    status: Option<u16>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRespond {
    #[serde(default)]
    body: String,
    status: Option<u16>,
}

impl TryFrom<RawSiteConfig> for SiteConfig {
    type Error = AppError;

    fn try_from(raw: RawSiteConfig) -> Result<Self, Self::Error> {
        raw.jwt_signer.validate()?;

        let headers = raw
            .headers
            .into_iter()
            .map(|(name, value)| header_template(&name, value))
            .collect::<Result<Vec<_>, _>>()?;

        let terminal = match (raw.redir, raw.respond) {
            (Some(_), Some(_)) => {
                return Err(AppError::config("only one of redir or respond may be declared"))
            }
            (Some(r), None) => redirect(r.target, r.status)?,
            (None, Some(r)) => respond(r.body, r.status)?,
            (None, None) => Terminal::NoContent,
        };

        Ok(Self {
            signer: Arc::new(raw.jwt_signer),
            headers: Arc::new(headers),
            terminal,
        })
    }
}

fn header_template(name: &str, value: String) -> Result<HeaderTemplate, AppError> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| AppError::config(format!("invalid header name: {name}")))?;
    Ok(HeaderTemplate { name, value })
}

fn redirect(target: String, status: Option<u16>) -> Result<Terminal, AppError> {
    if target.is_empty() {
        return Err(AppError::config("redir: target is empty"));
    }
    let status = status_code(status.unwrap_or(302))?;
    if !status.is_redirection() {
        return Err(AppError::config(format!(
            "redir: status {} is not a redirect",
            status.as_u16()
        )));
    }
    Ok(Terminal::Redirect { target, status })
}

fn respond(body: String, status: Option<u16>) -> Result<Terminal, AppError> {
    let status = status_code(status.unwrap_or(200))?;
    Ok(Terminal::Respond { body, status })
}

fn status_code(code: u16) -> Result<StatusCode, AppError> {
    StatusCode::from_u16(code).map_err(|_| AppError::config(format!("invalid status code: {code}")))
}
