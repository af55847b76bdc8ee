//! Layer-visibility control state and the external button that shows/hides it.

use render::{
    ControlHandle, GroupHandle, LayerControlSpec, MapEngine, TileSource, ToggleAffordance,
};

pub const TITLE_HIDE: &str = "Nascondi livelli";
pub const TITLE_SHOW: &str = "Mostra livelli";

/// Mutually exclusive base maps. Exactly one is visible at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseMaps {
    entries: Vec<(String, GroupHandle)>,
    active: usize,
}

impl BaseMaps {
    /// Adds every source as a tile layer; only the first starts visible.
    pub fn install<E: MapEngine>(engine: &mut E, sources: &[TileSource]) -> Self {
        let entries = sources
            .iter()
            .enumerate()
            .map(|(i, source)| (source.name.clone(), engine.add_tile_layer(source, i == 0)))
            .collect();
        Self { entries, active: 0 }
    }

    pub fn entries(&self) -> &[(String, GroupHandle)] {
        &self.entries
    }

    pub fn active_name(&self) -> Option<&str> {
        self.entries.get(self.active).map(|(name, _)| name.as_str())
    }

    pub fn select<E: MapEngine>(&mut self, engine: &mut E, name: &str) -> bool {
        let Some(index) = self.entries.iter().position(|(n, _)| n == name) else {
            tracing::debug!(name, "unknown base map");
            return false;
        };
        // The engine's own control may already have switched layers, so every
        // entry is set, not just the previously active one.
        for (i, (_, group)) in self.entries.iter().enumerate() {
            engine.set_group_visible(*group, i == index);
        }
        self.active = index;
        true
    }

    /// Records a base-map switch made inside the engine. Returns whether
    /// `group` is one of ours.
    pub fn note_selected(&mut self, group: GroupHandle) -> bool {
        match self.entries.iter().position(|(_, g)| *g == group) {
            Some(index) => {
                self.active = index;
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub name: String,
    pub group: GroupHandle,
    pub visible: bool,
}

/// Independently toggleable overlays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlays {
    entries: Vec<Overlay>,
}

impl Overlays {
    pub fn push(&mut self, name: impl Into<String>, group: GroupHandle) {
        self.entries.push(Overlay {
            name: name.into(),
            group,
            visible: true,
        });
    }

    pub fn entries(&self) -> &[Overlay] {
        &self.entries
    }

    pub fn is_visible(&self, name: &str) -> Option<bool> {
        self.entries
            .iter()
            .find(|o| o.name == name)
            .map(|o| o.visible)
    }

    pub fn set_visible<E: MapEngine>(&mut self, engine: &mut E, name: &str, visible: bool) -> bool {
        let Some(overlay) = self.entries.iter_mut().find(|o| o.name == name) else {
            tracing::debug!(name, "unknown overlay");
            return false;
        };
        engine.set_group_visible(overlay.group, visible);
        overlay.visible = visible;
        true
    }

    /// Records a visibility change made inside the engine. Returns whether
    /// `group` belongs to an overlay.
    pub fn note_visible(&mut self, group: GroupHandle, visible: bool) -> bool {
        match self.entries.iter_mut().find(|o| o.group == group) {
            Some(overlay) => {
                overlay.visible = visible;
                true
            }
            None => false,
        }
    }
}

pub fn layer_control_spec(base: &BaseMaps, overlays: &Overlays) -> LayerControlSpec {
    LayerControlSpec {
        base_layers: base.entries().to_vec(),
        overlays: overlays
            .entries()
            .iter()
            .map(|o| (o.name.clone(), o.group))
            .collect(),
        collapsed: false,
    }
}

/// External button bound to the layer control container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlToggle {
    element_id: String,
    control: ControlHandle,
    visible: bool,
}

impl ControlToggle {
    /// Returns `None` when the host has no such element.
    pub fn bind<E: MapEngine>(
        engine: &mut E,
        element_id: &str,
        control: ControlHandle,
    ) -> Option<Self> {
        let toggle = Self {
            element_id: element_id.to_string(),
            control,
            visible: true,
        };
        if !engine.bind_external_toggle(element_id, control, &toggle.affordance()) {
            tracing::debug!(element_id, "layer toggle element not found, skipping");
            return None;
        }
        Some(toggle)
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn affordance(&self) -> ToggleAffordance {
        ToggleAffordance {
            pressed: self.visible,
            title: if self.visible { TITLE_HIDE } else { TITLE_SHOW }.to_string(),
        }
    }

    /// Flips container visibility and the button state together.
    pub fn flip<E: MapEngine>(&mut self, engine: &mut E) -> bool {
        self.visible = !self.visible;
        engine.set_control_visible(self.control, self.visible);
        engine.update_external_toggle(&self.element_id, &self.affordance());
        self.visible
    }
}
