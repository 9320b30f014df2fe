//
//  codeship
//  logging.rs
//

//! Verbose request/response logging.
//!
//! When a [`Client`](crate::Client) is built with `verbose(true)`, the
//! request pipeline dumps every outgoing request and incoming response as
//! pre-formatted text lines to a [`RequestLogger`] sink. The default sink
//! forwards to `tracing` at debug level under the `codeship::http` target;
//! applications that want the dumps somewhere else (a file, a test buffer)
//! can supply their own sink.

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};

/// A sink for pre-formatted request/response dump lines.
///
/// Implementations must be cheap to call and must not fail; logging is a
/// diagnostic aid, never part of the request outcome.
pub trait RequestLogger: Send + Sync {
    /// Writes one pre-formatted multi-line dump.
    fn log(&self, text: &str);
}

/// Default sink: forwards dumps to `tracing::debug!` under the
/// `codeship::http` target.
#[derive(Debug, Default)]
pub struct TracingLogger;

impl RequestLogger for TracingLogger {
    fn log(&self, text: &str) {
        tracing::debug!(target: "codeship::http", "{text}");
    }
}

/// Renders an outgoing request in a wire-like textual form.
///
/// The body is included only when the caller supplied a payload; an empty
/// body line would misleadingly suggest an encoded empty object.
pub(crate) fn dump_request(method: &Method, url: &str, headers: &HeaderMap, body: Option<&[u8]>) -> String {
    let mut out = format!("> {method} {url}\n");
    append_headers(&mut out, "> ", headers);
    if let Some(body) = body {
        out.push_str("> \n");
        out.push_str(&String::from_utf8_lossy(body));
        out.push('\n');
    }
    out
}

/// Renders an incoming response, body always included.
pub(crate) fn dump_response(status: StatusCode, headers: &HeaderMap, body: &[u8]) -> String {
    let mut out = format!("< {status}\n");
    append_headers(&mut out, "< ", headers);
    out.push_str("< \n");
    out.push_str(&String::from_utf8_lossy(body));
    out.push('\n');
    out
}

fn append_headers(out: &mut String, prefix: &str, headers: &HeaderMap) {
    for (name, value) in headers {
        // Header values are almost always ASCII; opaque bytes are dumped lossily.
        out.push_str(prefix);
        out.push_str(name.as_str());
        out.push_str(": ");
        out.push_str(&String::from_utf8_lossy(value.as_bytes()));
        out.push('\n');
    }
}
