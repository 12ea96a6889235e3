//! Multi-token CTCP scanning (§4.C `stripctcp`/`parsectcp`).
//!
//! `slirc_proto::ctcp::Ctcp::parse` only understands one `\x01…\x01`-wrapped
//! string at a time; a `PRIVMSG`/`NOTICE` body can interleave plain text and
//! several CTCP tokens in one line. [`scan`] splits the body into an
//! ordered list of [`Segment`]s so the client state machine can rewrite DCC
//! tokens in place while leaving everything else byte-identical.

use slirc_proto::ctcp::CtcpOwned;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Ctcp(CtcpOwned),
}

/// Split a message body into ordered text/CTCP segments. Tolerates a
/// missing trailing `\x01` on the final token, as real clients sometimes
/// send (mirrored from `slirc_proto::ctcp::Ctcp::parse`'s own tolerance).
pub fn scan(body: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = body;

    while let Some(start) = rest.find('\x01') {
        if start > 0 {
            segments.push(Segment::Text(rest[..start].to_string()));
        }
        let after = &rest[start + 1..];
        match after.find('\x01') {
            Some(end) => {
                let token = &after[..end];
                segments.push(parse_token(token));
                rest = &after[end + 1..];
            }
            None => {
                segments.push(parse_token(after));
                rest = "";
            }
        }
    }

    if !rest.is_empty() {
        segments.push(Segment::Text(rest.to_string()));
    }
    segments
}

fn parse_token(token: &str) -> Segment {
    let wrapped = format!("\x01{token}\x01");
    match CtcpOwned::parse(&wrapped) {
        Some(ctcp) => Segment::Ctcp(ctcp),
        // An empty `\x01\x01` token parses to nothing; preserve the bytes.
        None => Segment::Text(format!("\x01{token}\x01")),
    }
}

/// Reassemble segments back into a message body, preserving order.
pub fn reassemble(segments: &[Segment]) -> String {
    segments.iter().map(segment_to_string).collect()
}

fn segment_to_string(segment: &Segment) -> String {
    match segment {
        Segment::Text(text) => text.clone(),
        Segment::Ctcp(ctcp) => ctcp.to_string(),
    }
}
