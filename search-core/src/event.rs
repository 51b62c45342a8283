use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;

use crate::suggestion::Coordinates;
use crate::suggestion::Suggestion;
use crate::suggestion::SuggestionKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraMove {
    pub center: Coordinates,
    pub zoom: f64,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

/// Messages the search box sends to the rest of the application. Using a
/// channel keeps the map, router, and panels out of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchEvent {
    /// Move the map camera.
    FlyTo(CameraMove),

    /// An address was picked.
    LocationSelected {
        coordinates: Coordinates,
        label: String,
        metadata: serde_json::Value,
    },

    /// An internal entity was picked; the overlay layer shows its popup.
    EntityFocused {
        id: String,
        name: String,
        category: Option<String>,
        coordinates: Coordinates,
    },

    /// Go to another page of the app.
    Navigate { path: String },

    /// Open the side panel for a suggestion that has no map location.
    DetailPanelRequested {
        kind: SuggestionKind,
        payload: Suggestion,
    },

    /// Directory search was attempted without a signed-in viewer.
    SignInRequested,
}

#[derive(Clone, Debug)]
pub struct SearchEventSender {
    tx: UnboundedSender<SearchEvent>,
}

impl SearchEventSender {
    pub fn new(tx: UnboundedSender<SearchEvent>) -> Self {
        Self { tx }
    }

    /// Creates a connected sender/receiver pair.
    pub fn channel() -> (Self, UnboundedReceiver<SearchEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn send(&self, event: SearchEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::error!("failed to send search event: {e}");
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
