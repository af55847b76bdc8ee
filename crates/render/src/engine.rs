use foundation::{GeoBounds, GeoPoint};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureHandle(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupHandle(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlHandle(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
}

/// Marker drawn from an HTML snippet instead of an image.
#[derive(Debug, Clone, PartialEq)]
pub struct DivIcon {
    pub class_name: String,
    pub html: String,
    /// Width, height in pixels.
    pub size: [f64; 2],
    /// Pixel inside the icon placed on the marker position.
    pub anchor: [f64; 2],
    /// Popup tip offset relative to the anchor.
    pub popup_anchor: [f64; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileSource {
    pub name: String,
    pub url_template: String,
    pub attribution: String,
    pub max_zoom: f64,
}

/// Entries of a layer-visibility control. Base layers are mutually exclusive,
/// overlays toggle independently.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerControlSpec {
    pub base_layers: Vec<(String, GroupHandle)>,
    pub overlays: Vec<(String, GroupHandle)>,
    pub collapsed: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub fn as_str(self) -> &'static str {
        match self {
            Corner::TopLeft => "topleft",
            Corner::TopRight => "topright",
            Corner::BottomLeft => "bottomleft",
            Corner::BottomRight => "bottomright",
        }
    }
}

/// Everything a host needs to (re)paint a floating control container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlContent {
    pub class_name: String,
    pub html: String,
    pub attributes: Vec<(String, String)>,
    /// Inline CSS properties, kebab-case names.
    pub styles: Vec<(String, String)>,
}

impl ControlContent {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn style(&self, name: &str) -> Option<&str> {
        self.styles
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Pressed/label state mirrored onto an external toggle button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleAffordance {
    pub pressed: bool,
    pub title: String,
}

/// Capabilities consumed from the map rendering engine.
///
/// Implementations own projection, tiles and pan/zoom. Everything is driven
/// from a single thread; interaction events come back to the caller as
/// [`crate::Interaction`] values.
pub trait MapEngine {
    fn set_view(&mut self, center: GeoPoint, zoom: f64);
    fn center(&self) -> GeoPoint;
    fn zoom(&self) -> f64;
    fn set_zoom(&mut self, zoom: f64);
    fn min_zoom(&self) -> f64;
    fn view_bounds(&self) -> GeoBounds;
    /// Fits the view to `bounds` and returns the zoom the fit settles at, or
    /// `None` for empty bounds. Engines that animate may report the old zoom
    /// from [`MapEngine::zoom`] until the animation ends; the returned value
    /// never lags.
    fn fit_bounds(&mut self, bounds: &GeoBounds) -> Option<f64>;

    fn add_tile_layer(&mut self, source: &TileSource, visible: bool) -> GroupHandle;
    fn create_group(&mut self) -> GroupHandle;
    fn set_group_visible(&mut self, group: GroupHandle, visible: bool);
    fn group_bounds(&self, group: GroupHandle) -> GeoBounds;

    fn add_polyline(
        &mut self,
        group: GroupHandle,
        paths: &[Vec<GeoPoint>],
        style: &StrokeStyle,
    ) -> FeatureHandle;
    fn set_stroke_style(&mut self, feature: FeatureHandle, style: &StrokeStyle);
    fn add_marker(&mut self, group: GroupHandle, at: GeoPoint, icon: &DivIcon) -> FeatureHandle;
    fn bind_popup(&mut self, feature: FeatureHandle, html: &str);
    /// Asks the host to report pointer enter/leave on `feature`.
    fn watch_hover(&mut self, feature: FeatureHandle);

    fn add_layer_control(&mut self, spec: &LayerControlSpec) -> ControlHandle;
    fn add_floating_control(&mut self, corner: Corner, content: &ControlContent) -> ControlHandle;
    fn update_control(&mut self, control: ControlHandle, content: &ControlContent);
    /// Stops click and wheel events on the control from reaching the map.
    fn isolate_control_events(&mut self, control: ControlHandle);
    fn set_control_visible(&mut self, control: ControlHandle, visible: bool);

    /// Attaches an element living outside the map to `control`.
    ///
    /// Returns `false` when the element does not exist; callers skip the toggle then.
    fn bind_external_toggle(
        &mut self,
        element_id: &str,
        control: ControlHandle,
        state: &ToggleAffordance,
    ) -> bool;
    fn update_external_toggle(&mut self, element_id: &str, state: &ToggleAffordance);
}
