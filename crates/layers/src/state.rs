/// Conservation condition of a wall segment, worst first.
///
/// `Unknown` is a rendering fallback only and never appears in the legend.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConservationState {
    Critical,
    Poor,
    Good,
    Excellent,
    Unknown,
}

impl ConservationState {
    /// The selectable states in legend order.
    pub const CANONICAL: [ConservationState; 4] = [
        ConservationState::Critical,
        ConservationState::Poor,
        ConservationState::Good,
        ConservationState::Excellent,
    ];

    /// Dataset label, `None` for `Unknown`.
    pub fn label(self) -> Option<&'static str> {
        match self {
            ConservationState::Critical => Some("pessimo"),
            ConservationState::Poor => Some("mediocre"),
            ConservationState::Good => Some("buono"),
            ConservationState::Excellent => Some("ottimo"),
            ConservationState::Unknown => None,
        }
    }

    pub fn is_known(self) -> bool {
        self != ConservationState::Unknown
    }
}

/// Maps a raw status attribute to a state. Total: anything unrecognized,
/// including absent or blank input, is `Unknown`.
pub fn classify(raw: Option<&str>) -> ConservationState {
    let normalized = raw.unwrap_or_default().trim().to_lowercase();
    ConservationState::CANONICAL
        .into_iter()
        .find(|s| s.label() == Some(normalized.as_str()))
        .unwrap_or(ConservationState::Unknown)
}
