#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unknown event kind: {name}")]
    UnknownEventKind { name: String },

    #[error("malformed {event} payload: {reason}")]
    MalformedPayload { event: String, reason: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn malformed(event: &str, reason: impl std::fmt::Display) -> Self {
        Self::MalformedPayload {
            event: event.to_string(),
            reason: reason.to_string(),
        }
    }

    /// `true` when dispatch found no record variant for the event name.
    ///
    /// New event kinds can ship before this crate learns about them, so callers
    /// usually skip these instead of aborting.
    pub fn is_unknown_event_kind(&self) -> bool {
        matches!(self, Self::UnknownEventKind { .. })
    }
}
