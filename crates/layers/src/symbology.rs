use render::{DivIcon, StrokeStyle};

use crate::state::ConservationState;

pub const LINE_OPACITY: f64 = 0.95;
pub const BASE_LINE_WEIGHT: f64 = 4.0;
pub const HIGHLIGHT_LINE_WEIGHT: f64 = 7.0;
pub const UNKNOWN_COLOR: &str = "#2b83ba";

pub const DEFAULT_MARKER_COLOR: &str = "#3388ff";
pub const DEFAULT_MARKER_DIAMETER: f64 = 14.0;
/// Extra pixels around the dot so its border and shadow are not clipped.
pub const MARKER_PADDING: f64 = 8.0;
pub const MARKER_OPACITY: f64 = 1.0;

/// Concrete visual encoding. `size` is the stroke weight for lines and the dot
/// diameter for points.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDescriptor {
    pub color: String,
    pub size: f64,
    pub opacity: f64,
}

impl StyleDescriptor {
    pub fn stroke(&self) -> StrokeStyle {
        StrokeStyle {
            color: self.color.clone(),
            weight: self.size,
            opacity: self.opacity,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StateStyle {
    pub state: ConservationState,
    pub color: &'static str,
    pub weight: f64,
}

/// State -> base line style. Shared by the line resolver and the legend.
pub const STATE_STYLES: [StateStyle; 5] = [
    StateStyle {
        state: ConservationState::Critical,
        color: "#d7191c",
        weight: 6.0,
    },
    StateStyle {
        state: ConservationState::Poor,
        color: "#fdae61",
        weight: BASE_LINE_WEIGHT,
    },
    StateStyle {
        state: ConservationState::Good,
        color: "#ffff66",
        weight: BASE_LINE_WEIGHT,
    },
    StateStyle {
        state: ConservationState::Excellent,
        color: "#1a9641",
        weight: 3.0,
    },
    StateStyle {
        state: ConservationState::Unknown,
        color: UNKNOWN_COLOR,
        weight: BASE_LINE_WEIGHT,
    },
];

pub fn state_style(state: ConservationState) -> StateStyle {
    STATE_STYLES
        .iter()
        .copied()
        .find(|s| s.state == state)
        .unwrap_or(StateStyle {
            state,
            color: UNKNOWN_COLOR,
            weight: BASE_LINE_WEIGHT,
        })
}

pub fn state_color(state: ConservationState) -> &'static str {
    state_style(state).color
}

/// Keeps an override only when it is a finite, strictly positive number.
pub fn positive_override(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Keeps a color override only when it is safe to drop into an inline style.
pub fn color_override(value: Option<&str>) -> Option<&str> {
    let v = value?.trim();
    if v.is_empty() || v.contains([';', '"', '\'', '<', '>', '{', '}']) {
        return None;
    }
    Some(v)
}

pub fn resolve_line_style(
    state: ConservationState,
    override_weight: Option<f64>,
) -> StyleDescriptor {
    let base = state_style(state);
    StyleDescriptor {
        color: base.color.to_string(),
        size: positive_override(override_weight).unwrap_or(base.weight),
        opacity: LINE_OPACITY,
    }
}

/// Transient pointer state of a rendered line.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum LineInteraction {
    #[default]
    Idle,
    Hovered,
}

/// Line style as a function of state, override and pointer state.
/// Hover replaces the weight only; color and opacity stay state-driven.
pub fn line_style(
    state: ConservationState,
    override_weight: Option<f64>,
    interaction: LineInteraction,
) -> StyleDescriptor {
    let mut style = resolve_line_style(state, override_weight);
    if interaction == LineInteraction::Hovered {
        style.size = HIGHLIGHT_LINE_WEIGHT;
    }
    style
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointStyle {
    pub descriptor: StyleDescriptor,
    /// Edge length of the square icon box.
    pub footprint: f64,
}

impl PointStyle {
    pub fn diameter(&self) -> f64 {
        self.descriptor.size
    }

    pub fn icon(&self) -> DivIcon {
        let half = self.footprint / 2.0;
        DivIcon {
            class_name: "poi-div-icon".to_string(),
            html: format!(
                r#"<span class="poi-dot" style="--poi-size:{}px;--poi-color:{};"></span>"#,
                self.descriptor.size, self.descriptor.color
            ),
            size: [self.footprint, self.footprint],
            anchor: [half, half],
            popup_anchor: [0.0, -half],
        }
    }
}

/// Point styling does not depend on conservation state.
pub fn resolve_point_style(
    override_color: Option<&str>,
    override_size: Option<f64>,
) -> PointStyle {
    let diameter = positive_override(override_size).unwrap_or(DEFAULT_MARKER_DIAMETER);
    let color = color_override(override_color).unwrap_or(DEFAULT_MARKER_COLOR);
    PointStyle {
        descriptor: StyleDescriptor {
            color: color.to_string(),
            size: diameter,
            opacity: MARKER_OPACITY,
        },
        footprint: diameter + MARKER_PADDING,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SEMANTIC_COLORS: [&str; 4] = ["#d7191c", "#fdae61", "#ffff66", "#1a9641"];

    #[test]
    fn canonical_states_use_semantic_colors() {
        for (state, color) in ConservationState::CANONICAL.into_iter().zip(SEMANTIC_COLORS) {
            let style = resolve_line_style(state, None);
            assert_eq!(style.color, color);
            assert_ne!(style.color, UNKNOWN_COLOR);
        }
        let unknown = resolve_line_style(ConservationState::Unknown, None);
        assert_eq!(unknown.color, UNKNOWN_COLOR);
        assert!(!SEMANTIC_COLORS.contains(&unknown.color.as_str()));
    }

    #[test]
    fn state_weights() {
        let w = |s| resolve_line_style(s, None).size;
        assert_eq!(w(ConservationState::Critical), 6.0);
        assert_eq!(w(ConservationState::Poor), 4.0);
        assert_eq!(w(ConservationState::Good), 4.0);
        assert_eq!(w(ConservationState::Excellent), 3.0);
        assert_eq!(w(ConservationState::Unknown), 4.0);
    }

    #[test]
    fn positive_override_wins_for_every_state() {
        for state in STATE_STYLES.iter().map(|s| s.state) {
            for weight in [0.5, 1.0, 10.0, 123.25] {
                assert_eq!(resolve_line_style(state, Some(weight)).size, weight);
            }
        }
    }

    #[test]
    fn degenerate_overrides_fall_back() {
        for bad in [0.0, -0.0, -3.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(
                resolve_line_style(ConservationState::Critical, Some(bad)).size,
                6.0,
                "{bad}"
            );
        }
    }

    #[test]
    fn opacity_is_constant() {
        for state in STATE_STYLES.iter().map(|s| s.state) {
            assert_eq!(resolve_line_style(state, Some(2.0)).opacity, LINE_OPACITY);
        }
    }

    #[test]
    fn hover_forces_highlight_weight() {
        let hovered = line_style(ConservationState::Excellent, Some(12.0), LineInteraction::Hovered);
        assert_eq!(hovered.size, HIGHLIGHT_LINE_WEIGHT);
        assert_eq!(hovered.color, "#1a9641");
        let idle = line_style(ConservationState::Excellent, Some(12.0), LineInteraction::Idle);
        assert_eq!(idle.size, 12.0);
    }

    #[test]
    fn critical_with_override_example() {
        let style = resolve_line_style(crate::classify(Some("PESSIMO ")), Some(10.0));
        assert_eq!(
            style,
            StyleDescriptor {
                color: "#d7191c".to_string(),
                size: 10.0,
                opacity: 0.95,
            }
        );
    }

    #[test]
    fn point_defaults_and_footprint() {
        let style = resolve_point_style(None, Some(-5.0));
        assert_eq!(style.diameter(), 14.0);
        assert_eq!(style.footprint, 22.0);
        assert_eq!(style.descriptor.color, DEFAULT_MARKER_COLOR);

        let icon = style.icon();
        assert_eq!(icon.size, [22.0, 22.0]);
        assert_eq!(icon.anchor, [11.0, 11.0]);
        assert_eq!(icon.popup_anchor, [0.0, -11.0]);
        assert_eq!(
            icon.html,
            r#"<span class="poi-dot" style="--poi-size:14px;--poi-color:#3388ff;"></span>"#
        );
    }

    #[test]
    fn point_overrides() {
        let style = resolve_point_style(Some("  #ff0000 "), Some(20.0));
        assert_eq!(style.descriptor.color, "#ff0000");
        assert_eq!(style.footprint, 28.0);

        assert_eq!(resolve_point_style(Some("   "), None).descriptor.color, DEFAULT_MARKER_COLOR);
        assert_eq!(
            resolve_point_style(Some("red;background:url(x)"), None).descriptor.color,
            DEFAULT_MARKER_COLOR
        );
        assert_eq!(resolve_point_style(None, Some(0.0)).diameter(), 14.0);
        assert_eq!(resolve_point_style(None, Some(f64::NAN)).diameter(), 14.0);
    }
}
