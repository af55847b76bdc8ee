use foundation::GeoPoint;

use crate::engine::{ControlHandle, FeatureHandle, GroupHandle};

/// Raw input captured on a floating control's container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlInput {
    Click,
    /// `KeyboardEvent.key` as reported by the host.
    Key(String),
    Wheel,
}

/// User interaction delivered by the engine host to the view.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    HoverEnter(FeatureHandle),
    HoverExit(FeatureHandle),
    Control {
        control: ControlHandle,
        input: ControlInput,
    },
    /// Click on an external element bound with `MapEngine::bind_external_toggle`.
    ExternalToggle(String),
    /// The engine's layer control shown or hid a group on its own.
    LayerVisibility { group: GroupHandle, visible: bool },
    MapClick(GeoPoint),
}

/// Whether the host should let the event reach the map underneath.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Propagation {
    Continue,
    Stop,
}
