use moviebot_models::MovieId;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Button payloads are opaque, user-supplied strings; anything longer is rejected outright
const MAX_PAYLOAD_LEN: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed callback payload: {0:?}")]
pub struct MalformedCallback(pub String);

/// Decoded inline-button payload.
///
/// Wire shapes: `m:<id>`, `w:add:<id>`, `w:del:<id>`, `menu`, `cancel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Select(MovieId),
    WatchAdd(MovieId),
    WatchRemove(MovieId),
    Menu,
    Cancel,
    Unknown,
}

impl CallbackAction {
    /// Lossy decode used at the transport boundary: malformed payloads become `Unknown`
    pub fn decode(payload: &str) -> Self {
        payload.parse().unwrap_or_else(|e: MalformedCallback| {
            debug!(error = %e, "Ignoring callback payload");
            CallbackAction::Unknown
        })
    }

    /// Wire form, `None` for `Unknown` which is never put on a button
    pub fn encode(&self) -> Option<String> {
        match self {
            CallbackAction::Select(id) => Some(format!("m:{}", id)),
            CallbackAction::WatchAdd(id) => Some(format!("w:add:{}", id)),
            CallbackAction::WatchRemove(id) => Some(format!("w:del:{}", id)),
            CallbackAction::Menu => Some("menu".to_string()),
            CallbackAction::Cancel => Some("cancel".to_string()),
            CallbackAction::Unknown => None,
        }
    }
}

fn parse_movie_id(raw: &str, payload: &str) -> Result<MovieId, MalformedCallback> {
    // u64 parsing accepts a leading '+', which never appears in payloads we emit
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MalformedCallback(payload.to_string()));
    }
    match raw.parse::<MovieId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(MalformedCallback(payload.to_string())),
    }
}

impl FromStr for CallbackAction {
    type Err = MalformedCallback;

    fn from_str(payload: &str) -> Result<Self, Self::Err> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(MalformedCallback(payload.chars().take(MAX_PAYLOAD_LEN).collect()));
        }

        let parts: Vec<&str> = payload.split(':').collect();
        match parts.as_slice() {
            ["menu"] => Ok(CallbackAction::Menu),
            ["cancel"] => Ok(CallbackAction::Cancel),
            ["m", id] => parse_movie_id(id, payload).map(CallbackAction::Select),
            ["w", "add", id] => parse_movie_id(id, payload).map(CallbackAction::WatchAdd),
            ["w", "del", id] => parse_movie_id(id, payload).map(CallbackAction::WatchRemove),
            _ => Err(MalformedCallback(payload.to_string())),
        }
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.encode() {
            Some(wire) => write!(f, "{}", wire),
            None => write!(f, "<unknown>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_payloads() {
        assert_eq!("m:157336".parse::<CallbackAction>(), Ok(CallbackAction::Select(157336)));
        assert_eq!("w:add:42".parse::<CallbackAction>(), Ok(CallbackAction::WatchAdd(42)));
        assert_eq!("w:del:42".parse::<CallbackAction>(), Ok(CallbackAction::WatchRemove(42)));
        assert_eq!("menu".parse::<CallbackAction>(), Ok(CallbackAction::Menu));
        assert_eq!("cancel".parse::<CallbackAction>(), Ok(CallbackAction::Cancel));
    }

    #[test]
    fn test_malformed_payloads_are_rejected() {
        for payload in [
            "", "m", "m:", "m:abc", "m:-5", "m:+5", "m:0", "m:1:2", "w:add", "w:add:", "w:put:1",
            "w:add:1x", "menu:1", "MENU", "m:99999999999999999999999",
        ] {
            assert!(
                payload.parse::<CallbackAction>().is_err(),
                "expected {payload:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_oversized_payload_is_rejected() {
        let payload = format!("m:{}", "1".repeat(200));
        let err = payload.parse::<CallbackAction>().unwrap_err();
        assert_eq!(err.0.len(), MAX_PAYLOAD_LEN);
    }

    #[test]
    fn test_decode_is_lossy() {
        assert_eq!(CallbackAction::decode("w:del:7"), CallbackAction::WatchRemove(7));
        assert_eq!(CallbackAction::decode("garbage"), CallbackAction::Unknown);
    }

    #[test]
    fn test_encode_matches_parse() {
        let actions = [
            CallbackAction::Select(1),
            CallbackAction::WatchAdd(157336),
            CallbackAction::WatchRemove(157336),
            CallbackAction::Menu,
            CallbackAction::Cancel,
        ];
        for action in actions {
            let wire = action.encode().unwrap();
            assert_eq!(CallbackAction::decode(&wire), action);
        }
        assert_eq!(CallbackAction::Unknown.encode(), None);
    }
}
