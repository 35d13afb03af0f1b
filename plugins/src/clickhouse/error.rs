use std::fmt;

use clicktest_core::api::ClientError;
use reqwest::header::HeaderMap;

const BODY_PREVIEW_LIMIT: usize = 512;

pub(crate) const HEADER_EXCEPTION_CODE: &str = "X-ClickHouse-Exception-Code";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransportKind {
    Connect,
    Request,
    Body,
    Decode,
    Unknown,
}

impl TransportKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Request => "request",
            Self::Body => "body",
            Self::Decode => "decode",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a reqwest failure onto the client error taxonomy. Timeouts are
/// deadline signals; everything else is a transport failure.
pub(crate) fn from_reqwest(err: reqwest::Error, url: &str) -> ClientError {
    if err.is_timeout() {
        return ClientError::DeadlineExceeded;
    }
    let kind = if err.is_connect() {
        TransportKind::Connect
    } else if err.is_request() {
        TransportKind::Request
    } else if err.is_body() {
        TransportKind::Body
    } else if err.is_decode() {
        TransportKind::Decode
    } else {
        TransportKind::Unknown
    };
    ClientError::Transport(format!("kind={kind} url={url}: {err}"))
}

/// Builds a `Database` error from a non-2xx response. The code comes from
/// the exception header, falling back to the `Code: N.` prefix of the body.
pub(crate) fn status_error(status: u16, headers: &HeaderMap, body: &str) -> ClientError {
    let code = headers
        .get(HEADER_EXCEPTION_CODE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i32>().ok())
        .or_else(|| code_from_body(body))
        .unwrap_or(0);
    let message = if body.trim().is_empty() {
        format!("http status {status}")
    } else {
        preview_body(body)
    };
    ClientError::database(code, message)
}

fn code_from_body(body: &str) -> Option<i32> {
    let rest = body.trim_start().strip_prefix("Code:")?.trim_start();
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

pub(crate) fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    let mut out = String::new();
    let mut truncated = false;
    for (idx, ch) in trimmed.chars().enumerate() {
        if idx >= BODY_PREVIEW_LIMIT {
            truncated = true;
            break;
        }
        out.push(ch);
    }

    if truncated {
        out.push_str("...");
    }

    out
}
