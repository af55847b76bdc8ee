use std::collections::{BTreeMap, BTreeSet};

use foundation::math::{
    Vec2, bounds_zoom, inverse_mercator_lat_deg, inverse_mercator_lon_deg, project,
    projected_center, scale_px_per_m,
};
use foundation::{GeoBounds, GeoPoint};

use crate::engine::{
    ControlContent, ControlHandle, Corner, DivIcon, FeatureHandle, GroupHandle,
    LayerControlSpec, MapEngine, StrokeStyle, TileSource, ToggleAffordance,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Drawn {
    Polyline {
        paths: Vec<Vec<GeoPoint>>,
        style: StrokeStyle,
    },
    Marker {
        at: GeoPoint,
        icon: DivIcon,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessFeature {
    pub group: GroupHandle,
    pub drawn: Drawn,
    pub popup: Option<String>,
    pub hover_watched: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessGroup {
    pub visible: bool,
    pub tiles: Option<TileSource>,
    pub features: Vec<FeatureHandle>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlKind {
    Layers(LayerControlSpec),
    Floating {
        corner: Corner,
        content: ControlContent,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessControl {
    pub kind: ControlKind,
    pub visible: bool,
    pub isolated: bool,
}

/// Mutating calls in the order they reached the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    SetView { center: GeoPoint, zoom: f64 },
    FitBounds(GeoBounds),
    SetZoom(f64),
    AddTileLayer(GroupHandle),
    CreateGroup(GroupHandle),
    SetGroupVisible(GroupHandle, bool),
    AddPolyline(FeatureHandle),
    SetStrokeStyle(FeatureHandle),
    AddMarker(FeatureHandle),
    BindPopup(FeatureHandle),
    AddControl(ControlHandle),
    UpdateControl(ControlHandle),
    SetControlVisible(ControlHandle, bool),
    BindToggle(String),
    UpdateToggle(String),
}

/// In-memory [`MapEngine`] with slippy-map view math and no drawing.
///
/// Used by tests and by hosts that only need the composed state.
#[derive(Debug)]
pub struct HeadlessMap {
    viewport_px: Vec2,
    min_zoom: f64,
    max_zoom: f64,
    center: GeoPoint,
    zoom: f64,
    groups: Vec<HeadlessGroup>,
    features: Vec<HeadlessFeature>,
    controls: Vec<HeadlessControl>,
    elements: BTreeSet<String>,
    toggles: BTreeMap<String, (ControlHandle, ToggleAffordance)>,
    deferred_fit: bool,
    commands: Vec<RenderCommand>,
}

impl HeadlessMap {
    pub fn new(viewport_px: Vec2, min_zoom: f64, max_zoom: f64) -> Self {
        Self {
            viewport_px,
            min_zoom,
            max_zoom,
            center: GeoPoint::new(0.0, 0.0),
            zoom: min_zoom,
            groups: Vec::new(),
            features: Vec::new(),
            controls: Vec::new(),
            elements: BTreeSet::new(),
            toggles: BTreeMap::new(),
            deferred_fit: false,
            commands: Vec::new(),
        }
    }

    /// Declares an element that exists outside the map (e.g. a toolbar button).
    pub fn with_element(mut self, id: impl Into<String>) -> Self {
        self.elements.insert(id.into());
        self
    }

    /// Leaves center and zoom untouched on `fit_bounds`, like an engine whose
    /// fit is still animating when the caller reads the view back.
    pub fn with_deferred_fit(mut self) -> Self {
        self.deferred_fit = true;
        self
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn feature(&self, handle: FeatureHandle) -> Option<&HeadlessFeature> {
        self.features.get(handle.0 as usize)
    }

    pub fn features(&self) -> &[HeadlessFeature] {
        &self.features
    }

    pub fn group(&self, handle: GroupHandle) -> Option<&HeadlessGroup> {
        self.groups.get(handle.0 as usize)
    }

    pub fn control(&self, handle: ControlHandle) -> Option<&HeadlessControl> {
        self.controls.get(handle.0 as usize)
    }

    pub fn controls(&self) -> &[HeadlessControl] {
        &self.controls
    }

    pub fn toggle(&self, element_id: &str) -> Option<&(ControlHandle, ToggleAffordance)> {
        self.toggles.get(element_id)
    }

    pub fn stroke_style(&self, handle: FeatureHandle) -> Option<&StrokeStyle> {
        match &self.feature(handle)?.drawn {
            Drawn::Polyline { style, .. } => Some(style),
            Drawn::Marker { .. } => None,
        }
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.max(self.min_zoom).min(self.max_zoom)
    }

    fn push_feature(&mut self, group: GroupHandle, drawn: Drawn) -> FeatureHandle {
        let handle = FeatureHandle(self.features.len() as u32);
        self.features.push(HeadlessFeature {
            group,
            drawn,
            popup: None,
            hover_watched: false,
        });
        if let Some(g) = self.groups.get_mut(group.0 as usize) {
            g.features.push(handle);
        }
        handle
    }

    fn push_control(&mut self, kind: ControlKind) -> ControlHandle {
        let handle = ControlHandle(self.controls.len() as u32);
        self.controls.push(HeadlessControl {
            kind,
            visible: true,
            isolated: false,
        });
        self.commands.push(RenderCommand::AddControl(handle));
        handle
    }
}

impl MapEngine for HeadlessMap {
    fn set_view(&mut self, center: GeoPoint, zoom: f64) {
        self.center = center;
        self.zoom = self.clamp_zoom(zoom);
        self.commands.push(RenderCommand::SetView {
            center,
            zoom: self.zoom,
        });
    }

    fn center(&self) -> GeoPoint {
        self.center
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.zoom = self.clamp_zoom(zoom);
        self.commands.push(RenderCommand::SetZoom(self.zoom));
    }

    fn min_zoom(&self) -> f64 {
        self.min_zoom
    }

    fn view_bounds(&self) -> GeoBounds {
        let c = project(self.center);
        let inv_scale = 1.0 / scale_px_per_m(self.zoom);
        let half_w = 0.5 * self.viewport_px.x * inv_scale;
        let half_h = 0.5 * self.viewport_px.y * inv_scale;
        GeoBounds::from_corners(
            GeoPoint::new(
                inverse_mercator_lat_deg(c.y - half_h),
                inverse_mercator_lon_deg(c.x - half_w),
            ),
            GeoPoint::new(
                inverse_mercator_lat_deg(c.y + half_h),
                inverse_mercator_lon_deg(c.x + half_w),
            ),
        )
    }

    fn fit_bounds(&mut self, bounds: &GeoBounds) -> Option<f64> {
        let Some(center) = projected_center(bounds) else {
            tracing::debug!("fit_bounds ignored: empty bounds");
            return None;
        };
        let zoom = bounds_zoom(bounds, self.viewport_px, self.min_zoom, self.max_zoom);
        if !self.deferred_fit {
            self.center = center;
            self.zoom = zoom;
        }
        self.commands.push(RenderCommand::FitBounds(*bounds));
        Some(zoom)
    }

    fn add_tile_layer(&mut self, source: &TileSource, visible: bool) -> GroupHandle {
        let handle = GroupHandle(self.groups.len() as u32);
        self.groups.push(HeadlessGroup {
            visible,
            tiles: Some(source.clone()),
            features: Vec::new(),
        });
        self.commands.push(RenderCommand::AddTileLayer(handle));
        handle
    }

    fn create_group(&mut self) -> GroupHandle {
        let handle = GroupHandle(self.groups.len() as u32);
        self.groups.push(HeadlessGroup {
            visible: true,
            tiles: None,
            features: Vec::new(),
        });
        self.commands.push(RenderCommand::CreateGroup(handle));
        handle
    }

    fn set_group_visible(&mut self, group: GroupHandle, visible: bool) {
        if let Some(g) = self.groups.get_mut(group.0 as usize) {
            g.visible = visible;
            self.commands
                .push(RenderCommand::SetGroupVisible(group, visible));
        }
    }

    fn group_bounds(&self, group: GroupHandle) -> GeoBounds {
        let Some(g) = self.group(group) else {
            return GeoBounds::empty();
        };
        let mut out = GeoBounds::empty();
        for handle in &g.features {
            match self.feature(*handle).map(|f| &f.drawn) {
                Some(Drawn::Polyline { paths, .. }) => {
                    paths.iter().flatten().for_each(|p| out.extend(*p))
                }
                Some(Drawn::Marker { at, .. }) => out.extend(*at),
                None => {}
            }
        }
        out
    }

    fn add_polyline(
        &mut self,
        group: GroupHandle,
        paths: &[Vec<GeoPoint>],
        style: &StrokeStyle,
    ) -> FeatureHandle {
        let handle = self.push_feature(
            group,
            Drawn::Polyline {
                paths: paths.to_vec(),
                style: style.clone(),
            },
        );
        self.commands.push(RenderCommand::AddPolyline(handle));
        handle
    }

    fn set_stroke_style(&mut self, feature: FeatureHandle, style: &StrokeStyle) {
        if let Some(HeadlessFeature {
            drawn: Drawn::Polyline { style: current, .. },
            ..
        }) = self.features.get_mut(feature.0 as usize)
        {
            *current = style.clone();
            self.commands.push(RenderCommand::SetStrokeStyle(feature));
        }
    }

    fn add_marker(&mut self, group: GroupHandle, at: GeoPoint, icon: &DivIcon) -> FeatureHandle {
        let handle = self.push_feature(
            group,
            Drawn::Marker {
                at,
                icon: icon.clone(),
            },
        );
        self.commands.push(RenderCommand::AddMarker(handle));
        handle
    }

    fn bind_popup(&mut self, feature: FeatureHandle, html: &str) {
        if let Some(f) = self.features.get_mut(feature.0 as usize) {
            f.popup = Some(html.to_string());
            self.commands.push(RenderCommand::BindPopup(feature));
        }
    }

    fn watch_hover(&mut self, feature: FeatureHandle) {
        if let Some(f) = self.features.get_mut(feature.0 as usize) {
            f.hover_watched = true;
        }
    }

    fn add_layer_control(&mut self, spec: &LayerControlSpec) -> ControlHandle {
        self.push_control(ControlKind::Layers(spec.clone()))
    }

    fn add_floating_control(&mut self, corner: Corner, content: &ControlContent) -> ControlHandle {
        self.push_control(ControlKind::Floating {
            corner,
            content: content.clone(),
        })
    }

    fn update_control(&mut self, control: ControlHandle, content: &ControlContent) {
        if let Some(HeadlessControl {
            kind: ControlKind::Floating { content: current, .. },
            ..
        }) = self.controls.get_mut(control.0 as usize)
        {
            *current = content.clone();
            self.commands.push(RenderCommand::UpdateControl(control));
        }
    }

    fn isolate_control_events(&mut self, control: ControlHandle) {
        if let Some(c) = self.controls.get_mut(control.0 as usize) {
            c.isolated = true;
        }
    }

    fn set_control_visible(&mut self, control: ControlHandle, visible: bool) {
        if let Some(c) = self.controls.get_mut(control.0 as usize) {
            c.visible = visible;
            self.commands
                .push(RenderCommand::SetControlVisible(control, visible));
        }
    }

    fn bind_external_toggle(
        &mut self,
        element_id: &str,
        control: ControlHandle,
        state: &ToggleAffordance,
    ) -> bool {
        if !self.elements.contains(element_id) {
            return false;
        }
        self.toggles
            .insert(element_id.to_string(), (control, state.clone()));
        self.commands
            .push(RenderCommand::BindToggle(element_id.to_string()));
        true
    }

    fn update_external_toggle(&mut self, element_id: &str, state: &ToggleAffordance) {
        if let Some((_, current)) = self.toggles.get_mut(element_id) {
            *current = state.clone();
            self.commands
                .push(RenderCommand::UpdateToggle(element_id.to_string()));
        }
    }
}
