use serde_json::Value;
use threadlink_core::{IngressError, InboundEvent, MessageEvent};

const INVALID_EVENT: &str = "Event type not valid or lack of payload";

/// Classifies a decoded webhook payload.
///
/// A `challenge` key wins over everything else (URL verification). Otherwise
/// the payload must carry an `event` object with non-empty `text` plus the
/// `user` and `ts` strings needed to process it.
pub fn validate(payload: &Value) -> Result<InboundEvent, IngressError> {
    if let Some(challenge) = payload.get("challenge") {
        return match challenge.as_str() {
            Some(token) => Ok(InboundEvent::Handshake { challenge: token.to_owned() }),
            None => Err(IngressError::Validation("challenge must be a string".to_owned())),
        };
    }

    let Some(event) = payload.get("event").filter(|event| event.is_object()) else {
        return Err(IngressError::Validation(INVALID_EVENT.to_owned()));
    };

    let text = string_field(event, "text")
        .filter(|text| !text.is_empty())
        .ok_or_else(|| IngressError::Validation(INVALID_EVENT.to_owned()))?;
    let user = string_field(event, "user")
        .ok_or_else(|| IngressError::Validation("event.user is missing".to_owned()))?;
    let ts = string_field(event, "ts")
        .ok_or_else(|| IngressError::Validation("event.ts is missing".to_owned()))?;

    // Any present `thread_ts` marks a reply; only a string one is usable.
    let thread_ts = match event.get("thread_ts") {
        None => None,
        Some(Value::String(thread_ts)) => Some(thread_ts.clone()),
        Some(other) => {
            return Err(IngressError::Validation(format!(
                "event.thread_ts must be a string, got {other}"
            )))
        }
    };

    Ok(InboundEvent::Message(MessageEvent {
        user,
        text,
        ts,
        thread_ts,
        channel: string_field(event, "channel"),
    }))
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_owned)
}
