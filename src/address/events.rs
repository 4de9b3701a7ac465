//! Structured parse events and the observer hook that receives them.

use parking_lot::Mutex;

use super::AddressRecord;

/// How a house-number part was recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HousePartKind {
    /// The whole fragment is a number with an optional letter ("25", "14а")
    BareNumber,
    /// The fragment carries a building qualifier ("стр 1", "корп. 2")
    Qualified,
}

/// Why a fragment was left out of the street name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    StreetType,
    HousePart,
    BareNumber,
    Qualifier,
}

/// One decision taken while parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseEvent {
    /// A fragment was empty after normalization and dropped
    FragmentDropped { original: String },
    /// Normalization changed a fragment
    FragmentNormalized { original: String, normalized: String },
    /// Letters split by spaces inside one fragment were rejoined
    IntraFragmentRepaired { before: String, after: String },
    /// Adjacent fragments were merged into one word
    FragmentsMerged { parts: Vec<String>, merged: String },
    /// A street type was found; `fragment_index` is `None` for the combined-text fallback
    StreetTypeDetected {
        token: String,
        fragment_index: Option<usize>,
    },
    HousePartDetected {
        fragment_index: usize,
        part: String,
        kind: HousePartKind,
    },
    FragmentSkipped {
        fragment_index: usize,
        text: String,
        reason: SkipReason,
    },
    /// A trailing number was split off the street name
    TrailingNumberAccepted { number: String },
    /// A trailing number was too large to be a house number
    TrailingNumberRejected { number: String },
    StreetTypeBackfilled { token: String },
    Completed { record: AddressRecord },
}

/// Receives parse events. Implementations must be cheap; they run inline.
pub trait ParseObserver: Send + Sync {
    fn on_event(&self, event: &ParseEvent);
}

/// Forwards events to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ParseObserver for TracingObserver {
    fn on_event(&self, event: &ParseEvent) {
        match event {
            ParseEvent::Completed { record } => tracing::debug!(
                target: "address_parser",
                street_type = %record.street_type,
                street_name = %record.street_name,
                house_number = %record.house_number,
                "Address parsed"
            ),
            other => tracing::debug!(target: "address_parser", event = ?other, "Parse decision"),
        }
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ParseEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far
    pub fn events(&self) -> Vec<ParseEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl ParseObserver for RecordingObserver {
    fn on_event(&self, event: &ParseEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Value produced by a parse stage together with the events it generated.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutput<T> {
    pub value: T,
    pub events: Vec<ParseEvent>,
}

impl<T> StageOutput<T> {
    pub fn new(value: T, events: Vec<ParseEvent>) -> Self {
        Self { value, events }
    }
}
