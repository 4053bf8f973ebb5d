//! Normalization of capability callbacks into typed events.
//!
//! Engines deliver callbacks as a name plus a loosely shaped JSON payload.
//! They are converted once, at the boundary, into [`CapabilityEvent`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EventError;

/// Phase of a continuous gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureState {
    Start,
    Move,
    End,
}

impl GestureState {
    /// Engines number gesture phases 1 (start), 2 (move), 3 (end).
    pub fn from_code(code: u8) -> Result<Self, EventError> {
        match code {
            1 => Ok(Self::Start),
            2 => Ok(Self::Move),
            3 => Ok(Self::End),
            other => Err(EventError::GestureState(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityEvent {
    LoadStart,
    LoadEnd,
    LoadError { message: String },
    AnchorFound,
    AnchorUpdated,
    AnchorRemoved,
    /// `factor` is relative to the scale at gesture start.
    Pinch { state: GestureState, factor: f32 },
    /// `degrees` is the total yaw change since gesture start, as the engine
    /// reports it; the controller turns it into per-event deltas.
    Rotate { state: GestureState, degrees: f32 },
}

/// A callback as delivered by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCapabilityEvent {
    pub name:    String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PinchPayload {
    pinch_state:  u8,
    scale_factor: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RotatePayload {
    rotate_state:    u8,
    rotation_factor: f32,
}

impl RawCapabilityEvent {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    pub fn normalize(&self) -> Result<CapabilityEvent, EventError> {
        let event = match self.name.as_str() {
            "onLoadStart" => CapabilityEvent::LoadStart,
            "onLoadEnd" => CapabilityEvent::LoadEnd,
            "onError" => CapabilityEvent::LoadError {
                message: error_message(&self.payload),
            },
            "onAnchorFound" => CapabilityEvent::AnchorFound,
            "onAnchorUpdated" => CapabilityEvent::AnchorUpdated,
            "onAnchorRemoved" => CapabilityEvent::AnchorRemoved,
            "onPinch" => {
                let p: PinchPayload = self.parse()?;
                CapabilityEvent::Pinch {
                    state:  GestureState::from_code(p.pinch_state)?,
                    factor: p.scale_factor,
                }
            }
            "onRotate" => {
                let p: RotatePayload = self.parse()?;
                CapabilityEvent::Rotate {
                    state:   GestureState::from_code(p.rotate_state)?,
                    degrees: p.rotation_factor,
                }
            }
            other => return Err(EventError::Unknown(other.to_string())),
        };
        Ok(event)
    }

    fn parse<T: DeserializeOwned>(&self) -> Result<T, EventError> {
        serde_json::from_value(self.payload.clone()).map_err(|source| EventError::Payload {
            name: self.name.clone(),
            source,
        })
    }
}

impl TryFrom<RawCapabilityEvent> for CapabilityEvent {
    type Error = EventError;

    fn try_from(raw: RawCapabilityEvent) -> Result<Self, Self::Error> {
        raw.normalize()
    }
}

/// Engines nest the message differently; take the first string found.
fn error_message(payload: &Value) -> String {
    ["/nativeEvent/error", "/error", "/message"]
        .iter()
        .find_map(|pointer| payload.pointer(pointer).and_then(Value::as_str))
        .or_else(|| payload.as_str())
        .unwrap_or("unknown load error")
        .to_string()
}
