// Inbound events: push channel, viewport interactions and operator controls
use serde::Deserialize;
use serde_json::Value;

/// A temperature reading pushed by the device bridge.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingEvent {
    #[serde(default, alias = "sensor")]
    pub sensor_id: Option<String>,
    #[serde(default, alias = "valor")]
    pub value: Option<f64>,
    /// ISO-8601; receipt time is used when absent.
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    Online,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityEvent {
    pub status: Connectivity,
    #[serde(default, alias = "device_id")]
    pub device_id: Option<String>,
}

/// Tag attached to every programmatic projection. Surfaces echo it back on
/// the relayout notifications those projections cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct ProjectionTag(pub u64);

/// Relayout notification from the rendering surface.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InteractionEvent {
    #[serde(default, rename = "xaxis.range[0]")]
    pub range_start: Option<Value>,
    #[serde(default, rename = "xaxis.range[1]")]
    pub range_end: Option<Value>,
    #[serde(default, rename = "xaxis.range")]
    pub range: Option<Value>,
    #[serde(default, rename = "xaxis.autorange")]
    pub autorange: Option<bool>,
    /// Set when the notification was caused by one of our own projections.
    #[serde(default)]
    pub echo: Option<ProjectionTag>,
}

impl InteractionEvent {
    pub fn pan(start: impl Into<Value>, end: impl Into<Value>) -> Self {
        Self {
            range_start: Some(start.into()),
            range_end: Some(end.into()),
            ..Self::default()
        }
    }

    /// True when the operator moved the visible range or switched autorange off.
    pub fn changes_range(&self) -> bool {
        self.range_start.is_some()
            || self.range_end.is_some()
            || self.range.is_some()
            || self.autorange == Some(false)
    }
}

/// Operator actions from the dashboard controls.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ControlCommand {
    /// Resume live mode, re-reading the window control when present.
    GoLive {
        #[serde(default)]
        window: Option<Value>,
    },
    SetWindow {
        value: Value,
    },
    ApplyFilter {
        start: String,
        end: String,
        #[serde(default, alias = "sensor", alias = "sensorId")]
        sensor_id: Option<String>,
    },
    ToggleVisibility {
        #[serde(alias = "sensor", alias = "sensorId")]
        sensor_id: String,
    },
}

/// Raw text of a form control, whether it arrived as a string or a number.
/// Integral floats such as `5.0` read as `5`.
pub fn control_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// One NDJSON line on the inbound channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum InboundMessage {
    #[serde(alias = "nova_temperatura", alias = "nova_calibragem")]
    Reading(ReadingEvent),
    #[serde(alias = "esp32_status", alias = "device_status_update")]
    Connectivity(ConnectivityEvent),
    Interaction(InteractionEvent),
    Control(ControlCommand),
}
