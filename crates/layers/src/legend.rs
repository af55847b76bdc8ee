//! Collapsible legend for the conservation-state palette.
//!
//! The legend is a two-state machine. Rendering is a pure function of the
//! state, so hosts repaint the whole container on every transition.

use render::{ControlContent, ControlInput, Corner};

use crate::state::ConservationState;
use crate::symbology::state_color;

pub const LEGEND_CORNER: Corner = Corner::BottomLeft;
pub const LEGEND_CLASS: &str = "info legend";

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum LegendState {
    #[default]
    Compact,
    Expanded,
}

impl LegendState {
    pub fn toggled(self) -> Self {
        match self {
            LegendState::Compact => LegendState::Expanded,
            LegendState::Expanded => LegendState::Compact,
        }
    }

    pub fn is_expanded(self) -> bool {
        self == LegendState::Expanded
    }

    fn max_size(self) -> (&'static str, &'static str) {
        match self {
            LegendState::Compact => ("190px", "160px"),
            LegendState::Expanded => ("720px", "380px"),
        }
    }
}

/// Keyboard activation keys for a `role=button` element.
pub fn is_toggle_key(key: &str) -> bool {
    matches!(key, "Enter" | " ")
}

struct Entry {
    state: ConservationState,
    short: &'static str,
    heading: &'static str,
    description: &'static str,
}

const ENTRIES: [Entry; 4] = [
    Entry {
        state: ConservationState::Critical,
        short: "Pessimo",
        heading: "Stato pessimo/crollato (gravemente compromesso)",
        description: "Struttura gravemente compromessa o totalmente crollata, con perdita della funzione originaria, frequentemente dovuta a crolli strutturali, interventi incongrui o abbandono prolungato.",
    },
    Entry {
        state: ConservationState::Poor,
        short: "Mediocre",
        heading: "Stato mediocre/critico (parzialmente compromesso)",
        description: "Struttura caratterizzata da cedimenti parziali, disallineamenti delle pietre o perdita locale di ammorsamento, spesso associati a interventi impropri o assenza di manutenzione.",
    },
    Entry {
        state: ConservationState::Good,
        short: "Buono",
        heading: "Stato buono/discreto (integro con interventi non conformi ai canoni tradizionali)",
        description: "Struttura integra e stabile, priva di dissesti strutturali significativi, ma interessata da interventi di ripristino o manutenzione non pienamente conformi ai canoni costruttivi tradizionali della pietra a secco.",
    },
    Entry {
        state: ConservationState::Excellent,
        short: "Ottimo",
        heading: "Stato ottimo (integro o recentemente ristrutturato secondo i canoni tradizionali)",
        description: "Struttura integra, stabile e correttamente ammorsata, oppure recentemente ristrutturata secondo i canoni costruttivi tradizionali della pietra a secco e nel rispetto dei criteri di tutela paesaggistica.",
    },
];

pub const COMPACT_TITLE: &str = "Stato muretto";
pub const COMPACT_HINT: &str = "(clicca)";
pub const EXPANDED_TITLE: &str =
    "Classificazione dello stato di conservazione delle strutture a secco";
pub const EXPANDED_HINT: &str = "(clicca per chiudere)";

fn swatch(color: &str) -> String {
    format!(
        r#"<span style="display:inline-block;width:12px;height:12px;background:{color};margin-right:6px;border:1px solid #999;border-radius:2px;"></span>"#
    )
}

fn compact_html() -> String {
    let mut html = format!(
        r#"<b>{COMPACT_TITLE}</b> <span style="opacity:.65;font-size:12px;">{COMPACT_HINT}</span><br>"#
    );
    for entry in &ENTRIES {
        html.push_str(&swatch(state_color(entry.state)));
        html.push_str(entry.short);
        html.push_str("<br>");
    }
    html
}

fn expanded_html() -> String {
    let mut html = String::from(r#"<div style="font-size:15px;line-height:20px;">"#);
    html.push_str(
        r#"<div style="display:flex;align-items:baseline;gap:8px;justify-content:space-between;">"#,
    );
    html.push_str(&format!(
        r#"<b>{EXPANDED_TITLE}</b><span style="opacity:.65;font-size:13px;">{EXPANDED_HINT}</span></div>"#
    ));
    html.push_str(r#"<div style="margin-top:8px;">"#);
    for (i, entry) in ENTRIES.iter().enumerate() {
        // Last entry has no bottom margin.
        if i + 1 < ENTRIES.len() {
            html.push_str(r#"<div style="margin-bottom:8px;">"#);
        } else {
            html.push_str("<div>");
        }
        html.push_str(&format!(
            r#"{}<b>{}</b><div style="opacity:.85;font-size:14px;">{}</div></div>"#,
            swatch(state_color(entry.state)),
            entry.heading,
            entry.description
        ));
    }
    html.push_str("</div></div>");
    html
}

pub fn render(state: LegendState) -> ControlContent {
    let (max_width, max_height) = state.max_size();
    let styles = [
        ("background", "white"),
        ("padding", "10px"),
        ("border-radius", "12px"),
        ("box-shadow", "0 2px 10px rgba(0,0,0,0.15)"),
        ("font-family", "sans-serif"),
        ("font-size", "14px"),
        ("line-height", "18px"),
        ("cursor", "pointer"),
        ("user-select", "none"),
        (
            "transition",
            "max-width 180ms ease, max-height 180ms ease, padding 180ms ease",
        ),
        ("max-width", max_width),
        ("max-height", max_height),
    ];
    let attributes = [
        ("role", "button"),
        ("tabindex", "0"),
        ("aria-expanded", if state.is_expanded() { "true" } else { "false" }),
    ];

    ControlContent {
        class_name: LEGEND_CLASS.to_string(),
        html: match state {
            LegendState::Compact => compact_html(),
            LegendState::Expanded => expanded_html(),
        },
        attributes: attributes
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        styles: styles
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LegendController {
    state: LegendState,
}

impl LegendController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LegendState {
        self.state
    }

    pub fn toggle(&mut self) -> LegendState {
        self.state = self.state.toggled();
        tracing::debug!(expanded = self.state.is_expanded(), "legend toggled");
        self.state
    }

    /// Applies raw input from the legend container. Returns `true` when the
    /// state changed and the container must be repainted.
    pub fn handle(&mut self, input: &ControlInput) -> bool {
        match input {
            ControlInput::Click => {
                self.toggle();
                true
            }
            ControlInput::Key(key) if is_toggle_key(key) => {
                self.toggle();
                true
            }
            ControlInput::Key(_) | ControlInput::Wheel => false,
        }
    }

    pub fn content(&self) -> ControlContent {
        render(self.state)
    }
}
