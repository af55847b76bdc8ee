use foundation::{GeoBounds, GeoPoint};
use render::{
    ControlContent, ControlHandle, ControlInput, Corner, DivIcon, FeatureHandle, GroupHandle,
    Interaction, LayerControlSpec, MapEngine, StrokeStyle, TileSource, ToggleAffordance,
};
use serde::Deserialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::fault::FaultLatch;

// Leaflet objects stay on the JS side; Rust only holds their indices.
#[wasm_bindgen(inline_js = "
let map = null;
let dispatch = null;
const groups = [];
const features = [];
const controls = [];

export function lf_create_map(elementId, minZoom, maxZoom, onEvent) {
    if (typeof L === 'undefined') throw new Error('Leaflet not loaded');
    map = L.map(elementId, { minZoom, maxZoom });
    dispatch = onEvent;
    map.on('click', (e) => dispatch({ kind: 'map_click', lat: e.latlng.lat, lng: e.latlng.lng }));
    const layerChange = (visible) => (e) =>
        dispatch({ kind: 'layer_visibility', group: groups.indexOf(e.layer), visible });
    map.on('overlayadd', layerChange(true));
    map.on('overlayremove', layerChange(false));
    map.on('baselayerchange', layerChange(true));
}

export function lf_set_view(lat, lng, zoom) { map.setView([lat, lng], zoom, { animate: false }); }
export function lf_center() { const c = map.getCenter(); return new Float64Array([c.lat, c.lng]); }
export function lf_zoom() { return map.getZoom(); }
export function lf_set_zoom(zoom) { map.setZoom(zoom, { animate: false }); }
export function lf_min_zoom() { return map.getMinZoom(); }
export function lf_view_bounds() {
    const b = map.getBounds();
    return new Float64Array([b.getSouth(), b.getWest(), b.getNorth(), b.getEast()]);
}
export function lf_fit_bounds(s, w, n, e) {
    const b = L.latLngBounds([s, w], [n, e]);
    const zoom = map.getBoundsZoom(b);
    map.fitBounds(b, { animate: false });
    return zoom;
}

export function lf_add_tile_layer(url, attribution, maxZoom, visible) {
    const layer = L.tileLayer(url, { maxZoom, attribution });
    if (visible) layer.addTo(map);
    groups.push(layer);
    return groups.length - 1;
}
export function lf_create_group() {
    groups.push(L.featureGroup().addTo(map));
    return groups.length - 1;
}
export function lf_set_group_visible(h, visible) {
    const g = groups[h];
    if (!g) return;
    if (visible) g.addTo(map); else map.removeLayer(g);
}
export function lf_group_bounds(h) {
    const g = groups[h];
    if (!g || !g.getBounds) return new Float64Array(0);
    const b = g.getBounds();
    if (!b.isValid()) return new Float64Array(0);
    return new Float64Array([b.getSouth(), b.getWest(), b.getNorth(), b.getEast()]);
}

export function lf_add_polyline(group, coords, lengths, color, weight, opacity) {
    const latlngs = [];
    let i = 0;
    for (const n of lengths) {
        const path = [];
        for (let k = 0; k < n; k++, i += 2) path.push([coords[i], coords[i + 1]]);
        latlngs.push(path);
    }
    const line = L.polyline(latlngs, { color, weight, opacity });
    groups[group].addLayer(line);
    features.push(line);
    return features.length - 1;
}
export function lf_set_stroke_style(h, color, weight, opacity) {
    if (features[h]) features[h].setStyle({ color, weight, opacity });
}
export function lf_add_marker(group, lat, lng, className, html, size, anchor, popupAnchor) {
    const icon = L.divIcon({
        className, html,
        iconSize: [size[0], size[1]],
        iconAnchor: [anchor[0], anchor[1]],
        popupAnchor: [popupAnchor[0], popupAnchor[1]],
    });
    const marker = L.marker([lat, lng], { icon });
    groups[group].addLayer(marker);
    features.push(marker);
    return features.length - 1;
}
export function lf_bind_popup(h, html) { if (features[h]) features[h].bindPopup(html); }
export function lf_watch_hover(h) {
    const f = features[h];
    if (!f) return;
    f.on('mouseover', () => dispatch({ kind: 'hover_enter', handle: h }));
    f.on('mouseout', () => dispatch({ kind: 'hover_exit', handle: h }));
}

export function lf_add_layer_control(baseNames, baseHandles, overlayNames, overlayHandles, collapsed) {
    const base = {};
    baseNames.forEach((n, i) => { base[n] = groups[baseHandles[i]]; });
    const overlays = {};
    overlayNames.forEach((n, i) => { overlays[n] = groups[overlayHandles[i]]; });
    controls.push(L.control.layers(base, overlays, { collapsed }).addTo(map));
    return controls.length - 1;
}
export function lf_add_floating_control(position, className) {
    const index = controls.length;
    const control = L.control({ position });
    control.onAdd = () => {
        const div = L.DomUtil.create('div', className);
        div.addEventListener('click', () => dispatch({ kind: 'control', control: index, input: 'click' }));
        div.addEventListener('wheel', () => dispatch({ kind: 'control', control: index, input: 'wheel' }));
        div.addEventListener('keydown', (e) => {
            if (dispatch({ kind: 'control', control: index, input: 'key', key: e.key })) e.preventDefault();
        });
        return div;
    };
    controls.push(control);
    control.addTo(map);
    return index;
}
export function lf_update_control(h, className, html, attrs, styles) {
    const div = controls[h] && controls[h].getContainer();
    if (!div) return;
    div.className = className;
    div.innerHTML = html;
    for (let i = 0; i + 1 < attrs.length; i += 2) div.setAttribute(attrs[i], attrs[i + 1]);
    for (let i = 0; i + 1 < styles.length; i += 2) div.style.setProperty(styles[i], styles[i + 1]);
}
export function lf_isolate_control_events(h) {
    const div = controls[h] && controls[h].getContainer();
    if (!div) return;
    L.DomEvent.disableClickPropagation(div);
    L.DomEvent.disableScrollPropagation(div);
}
export function lf_set_control_visible(h, visible) {
    const div = controls[h] && controls[h].getContainer();
    if (div) div.style.display = visible ? '' : 'none';
}
")]
extern "C" {
    #[wasm_bindgen(catch)]
    fn lf_create_map(
        element_id: &str,
        min_zoom: f64,
        max_zoom: f64,
        on_event: &js_sys::Function,
    ) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    fn lf_set_view(lat: f64, lng: f64, zoom: f64) -> Result<(), JsValue>;
    #[wasm_bindgen(catch)]
    fn lf_center() -> Result<Vec<f64>, JsValue>;
    #[wasm_bindgen(catch)]
    fn lf_zoom() -> Result<f64, JsValue>;
    #[wasm_bindgen(catch)]
    fn lf_set_zoom(zoom: f64) -> Result<(), JsValue>;
    #[wasm_bindgen(catch)]
    fn lf_min_zoom() -> Result<f64, JsValue>;
    #[wasm_bindgen(catch)]
    fn lf_view_bounds() -> Result<Vec<f64>, JsValue>;
    #[wasm_bindgen(catch)]
    fn lf_fit_bounds(south: f64, west: f64, north: f64, east: f64) -> Result<f64, JsValue>;

    #[wasm_bindgen(catch)]
    fn lf_add_tile_layer(
        url: &str,
        attribution: &str,
        max_zoom: f64,
        visible: bool,
    ) -> Result<u32, JsValue>;
    #[wasm_bindgen(catch)]
    fn lf_create_group() -> Result<u32, JsValue>;
    #[wasm_bindgen(catch)]
    fn lf_set_group_visible(group: u32, visible: bool) -> Result<(), JsValue>;
    #[wasm_bindgen(catch)]
    fn lf_group_bounds(group: u32) -> Result<Vec<f64>, JsValue>;

    #[wasm_bindgen(catch)]
    fn lf_add_polyline(
        group: u32,
        coords: &[f64],
        lengths: &[u32],
        color: &str,
        weight: f64,
        opacity: f64,
    ) -> Result<u32, JsValue>;
    #[wasm_bindgen(catch)]
    fn lf_set_stroke_style(
        feature: u32,
        color: &str,
        weight: f64,
        opacity: f64,
    ) -> Result<(), JsValue>;
    #[wasm_bindgen(catch)]
    fn lf_add_marker(
        group: u32,
        lat: f64,
        lng: f64,
        class_name: &str,
        html: &str,
        size: &[f64],
        anchor: &[f64],
        popup_anchor: &[f64],
    ) -> Result<u32, JsValue>;
    #[wasm_bindgen(catch)]
    fn lf_bind_popup(feature: u32, html: &str) -> Result<(), JsValue>;
    #[wasm_bindgen(catch)]
    fn lf_watch_hover(feature: u32) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    fn lf_add_layer_control(
        base_names: js_sys::Array,
        base_handles: &[u32],
        overlay_names: js_sys::Array,
        overlay_handles: &[u32],
        collapsed: bool,
    ) -> Result<u32, JsValue>;
    #[wasm_bindgen(catch)]
    fn lf_add_floating_control(position: &str, class_name: &str) -> Result<u32, JsValue>;
    #[wasm_bindgen(catch)]
    fn lf_update_control(
        control: u32,
        class_name: &str,
        html: &str,
        attrs: js_sys::Array,
        styles: js_sys::Array,
    ) -> Result<(), JsValue>;
    #[wasm_bindgen(catch)]
    fn lf_isolate_control_events(control: u32) -> Result<(), JsValue>;
    #[wasm_bindgen(catch)]
    fn lf_set_control_visible(control: u32, visible: bool) -> Result<(), JsValue>;
}

/// Event payload posted by the JS shim.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostEvent {
    HoverEnter {
        handle: u32,
    },
    HoverExit {
        handle: u32,
    },
    Control {
        control: u32,
        input: String,
        #[serde(default)]
        key: Option<String>,
    },
    /// Emitted by Leaflet's layer control; `group` is -1 for layers the
    /// shim does not track.
    LayerVisibility {
        group: i64,
        visible: bool,
    },
    MapClick {
        lat: f64,
        lng: f64,
    },
}

impl HostEvent {
    pub fn into_interaction(self) -> Option<Interaction> {
        Some(match self {
            HostEvent::HoverEnter { handle } => Interaction::HoverEnter(FeatureHandle(handle)),
            HostEvent::HoverExit { handle } => Interaction::HoverExit(FeatureHandle(handle)),
            HostEvent::Control {
                control,
                input,
                key,
            } => {
                let input = match input.as_str() {
                    "click" => ControlInput::Click,
                    "wheel" => ControlInput::Wheel,
                    "key" => ControlInput::Key(key.unwrap_or_default()),
                    _ => return None,
                };
                Interaction::Control {
                    control: ControlHandle(control),
                    input,
                }
            }
            HostEvent::LayerVisibility { group, visible } => Interaction::LayerVisibility {
                group: GroupHandle(u32::try_from(group).ok()?),
                visible,
            },
            HostEvent::MapClick { lat, lng } => Interaction::MapClick(GeoPoint::new(lat, lng)),
        })
    }
}

fn bounds_from(values: &[f64]) -> GeoBounds {
    match values {
        [south, west, north, east] => GeoBounds {
            south: *south,
            west: *west,
            north: *north,
            east: *east,
        },
        _ => GeoBounds::empty(),
    }
}

fn string_array<'a>(items: impl IntoIterator<Item = &'a str>) -> js_sys::Array {
    items.into_iter().map(JsValue::from_str).collect()
}

fn flat_pairs(pairs: &[(String, String)]) -> js_sys::Array {
    string_array(pairs.iter().flat_map(|(k, v)| [k.as_str(), v.as_str()]))
}

fn document() -> Option<web_sys::Document> {
    web_sys::window()?.document()
}

fn apply_toggle(element: &web_sys::Element, state: &ToggleAffordance) {
    let pressed = if state.pressed { "true" } else { "false" };
    if element.set_attribute("aria-pressed", pressed).is_err()
        || element.set_attribute("title", &state.title).is_err()
    {
        tracing::warn!(id = %element.id(), "could not update layer toggle");
    }
}

/// Best-effort text of a thrown JS value.
pub(crate) fn js_message(err: &JsValue) -> String {
    err.dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{err:?}"))
}

/// [`MapEngine`] backed by the page's Leaflet instance.
///
/// A call that throws is logged and recorded in the engine's [`FaultLatch`];
/// it then yields an empty value so the caller can finish its step. The host
/// checks [`LeafletEngine::take_fault`] after each initialization step.
#[derive(Debug)]
pub struct LeafletEngine {
    faults: FaultLatch,
}

impl LeafletEngine {
    pub fn create(
        element_id: &str,
        min_zoom: f64,
        max_zoom: f64,
        on_event: &js_sys::Function,
    ) -> Result<Self, JsValue> {
        lf_create_map(element_id, min_zoom, max_zoom, on_event)?;
        Ok(Self {
            faults: FaultLatch::default(),
        })
    }

    /// First failure since the last call, if any.
    pub fn take_fault(&self) -> Option<String> {
        self.faults.take()
    }

    fn checked<T: Default>(&self, call: &str, result: Result<T, JsValue>) -> T {
        result.unwrap_or_else(|err| {
            self.faults.record(call, &js_message(&err));
            T::default()
        })
    }
}

impl MapEngine for LeafletEngine {
    fn set_view(&mut self, center: GeoPoint, zoom: f64) {
        self.checked("setView", lf_set_view(center.lat_deg, center.lon_deg, zoom));
    }

    fn center(&self) -> GeoPoint {
        match self.checked("getCenter", lf_center()).as_slice() {
            [lat, lng] => GeoPoint::new(*lat, *lng),
            _ => GeoPoint::new(0.0, 0.0),
        }
    }

    fn zoom(&self) -> f64 {
        self.checked("getZoom", lf_zoom())
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.checked("setZoom", lf_set_zoom(zoom));
    }

    fn min_zoom(&self) -> f64 {
        self.checked("getMinZoom", lf_min_zoom())
    }

    fn view_bounds(&self) -> GeoBounds {
        bounds_from(&self.checked("getBounds", lf_view_bounds()))
    }

    fn fit_bounds(&mut self, bounds: &GeoBounds) -> Option<f64> {
        if !bounds.is_valid() {
            return None;
        }
        lf_fit_bounds(bounds.south, bounds.west, bounds.north, bounds.east)
            .map_err(|err| self.faults.record("fitBounds", &js_message(&err)))
            .ok()
    }

    fn add_tile_layer(&mut self, source: &TileSource, visible: bool) -> GroupHandle {
        GroupHandle(self.checked(
            "tileLayer",
            lf_add_tile_layer(
                &source.url_template,
                &source.attribution,
                source.max_zoom,
                visible,
            ),
        ))
    }

    fn create_group(&mut self) -> GroupHandle {
        GroupHandle(self.checked("featureGroup", lf_create_group()))
    }

    fn set_group_visible(&mut self, group: GroupHandle, visible: bool) {
        self.checked("setGroupVisible", lf_set_group_visible(group.0, visible));
    }

    fn group_bounds(&self, group: GroupHandle) -> GeoBounds {
        bounds_from(&self.checked("getBounds", lf_group_bounds(group.0)))
    }

    fn add_polyline(
        &mut self,
        group: GroupHandle,
        paths: &[Vec<GeoPoint>],
        style: &StrokeStyle,
    ) -> FeatureHandle {
        let coords: Vec<f64> = paths
            .iter()
            .flatten()
            .flat_map(|p| [p.lat_deg, p.lon_deg])
            .collect();
        let lengths: Vec<u32> = paths.iter().map(|p| p.len() as u32).collect();
        FeatureHandle(self.checked(
            "polyline",
            lf_add_polyline(
                group.0,
                &coords,
                &lengths,
                &style.color,
                style.weight,
                style.opacity,
            ),
        ))
    }

    fn set_stroke_style(&mut self, feature: FeatureHandle, style: &StrokeStyle) {
        self.checked(
            "setStyle",
            lf_set_stroke_style(feature.0, &style.color, style.weight, style.opacity),
        );
    }

    fn add_marker(&mut self, group: GroupHandle, at: GeoPoint, icon: &DivIcon) -> FeatureHandle {
        FeatureHandle(self.checked(
            "marker",
            lf_add_marker(
                group.0,
                at.lat_deg,
                at.lon_deg,
                &icon.class_name,
                &icon.html,
                &icon.size,
                &icon.anchor,
                &icon.popup_anchor,
            ),
        ))
    }

    fn bind_popup(&mut self, feature: FeatureHandle, html: &str) {
        self.checked("bindPopup", lf_bind_popup(feature.0, html));
    }

    fn watch_hover(&mut self, feature: FeatureHandle) {
        self.checked("on(mouseover)", lf_watch_hover(feature.0));
    }

    fn add_layer_control(&mut self, spec: &LayerControlSpec) -> ControlHandle {
        let names = |entries: &[(String, GroupHandle)]| {
            string_array(entries.iter().map(|(n, _)| n.as_str()))
        };
        let handles = |entries: &[(String, GroupHandle)]| -> Vec<u32> {
            entries.iter().map(|(_, g)| g.0).collect()
        };
        ControlHandle(self.checked(
            "control.layers",
            lf_add_layer_control(
                names(&spec.base_layers),
                &handles(&spec.base_layers),
                names(&spec.overlays),
                &handles(&spec.overlays),
                spec.collapsed,
            ),
        ))
    }

    fn add_floating_control(&mut self, corner: Corner, content: &ControlContent) -> ControlHandle {
        let control = ControlHandle(self.checked(
            "control",
            lf_add_floating_control(corner.as_str(), &content.class_name),
        ));
        self.update_control(control, content);
        control
    }

    fn update_control(&mut self, control: ControlHandle, content: &ControlContent) {
        self.checked(
            "updateControl",
            lf_update_control(
                control.0,
                &content.class_name,
                &content.html,
                flat_pairs(&content.attributes),
                flat_pairs(&content.styles),
            ),
        );
    }

    fn isolate_control_events(&mut self, control: ControlHandle) {
        self.checked("disablePropagation", lf_isolate_control_events(control.0));
    }

    fn set_control_visible(&mut self, control: ControlHandle, visible: bool) {
        self.checked("setControlVisible", lf_set_control_visible(control.0, visible));
    }
    fn bind_external_toggle(
        &mut self,
        element_id: &str,
        _control: ControlHandle,
        state: &ToggleAffordance,
    ) -> bool {
        let Some(element) = document().and_then(|d| d.get_element_by_id(element_id)) else {
            return false;
        };
        apply_toggle(&element, state);

        let id = element_id.to_string();
        let on_click = Closure::<dyn FnMut()>::new(move || {
            crate::dispatch(Interaction::ExternalToggle(id.clone()));
        });
        if element
            .add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())
            .is_err()
        {
            return false;
        }
        // Lives as long as the page.
        on_click.forget();
        true
    }

    fn update_external_toggle(&mut self, element_id: &str, state: &ToggleAffordance) {
        if let Some(element) = document().and_then(|d| d.get_element_by_id(element_id)) {
            apply_toggle(&element, state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn layer_control_events_map_to_groups() {
        let shown = HostEvent::LayerVisibility {
            group: 3,
            visible: true,
        };
        assert_eq!(
            shown.into_interaction(),
            Some(Interaction::LayerVisibility {
                group: GroupHandle(3),
                visible: true,
            })
        );
        let untracked = HostEvent::LayerVisibility {
            group: -1,
            visible: false,
        };
        assert_eq!(untracked.into_interaction(), None);
    }

    #[test]
    fn unknown_control_input_is_ignored() {
        let event = HostEvent::Control {
            control: 0,
            input: "dblclick".to_string(),
            key: None,
        };
        assert_eq!(event.into_interaction(), None);
    }
}
