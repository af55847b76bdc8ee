use formats::{FeatureCollection, LoadError};
use layers::legend::{LEGEND_CORNER, LegendController, LegendState};
use layers::vector::{LineLayer, PointLayer};
use layers::Layer;
use render::{ControlHandle, Interaction, MapEngine, Propagation};

use crate::config::ViewerConfig;
use crate::control::{BaseMaps, ControlToggle, Overlays, layer_control_spec};
use crate::error::InitError;

/// Everything that only exists once both collections have loaded.
#[derive(Debug)]
struct Composed {
    lines: LineLayer,
    points: PointLayer,
    overlays: Overlays,
    layer_control: ControlHandle,
    toggle: Option<ControlToggle>,
    legend_control: ControlHandle,
}

/// Owns the map engine, both interactive layers and the legend for the
/// lifetime of the page.
#[derive(Debug)]
pub struct ViewComposer<E: MapEngine> {
    engine: E,
    config: ViewerConfig,
    base_maps: BaseMaps,
    legend: LegendController,
    composed: Option<Composed>,
}

impl<E: MapEngine> ViewComposer<E> {
    /// Sets the initial view and installs the base maps. Overlays come later,
    /// in [`ViewComposer::compose`].
    pub fn new(mut engine: E, config: ViewerConfig) -> Result<Self, InitError> {
        config.validate()?;
        engine.set_view(config.initial_center(), config.initial_zoom);
        let sources: Vec<_> = config.base_maps.iter().map(|b| b.tile_source()).collect();
        let base_maps = BaseMaps::install(&mut engine, &sources);
        Ok(Self {
            engine,
            config,
            base_maps,
            legend: LegendController::new(),
            composed: None,
        })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn is_composed(&self) -> bool {
        self.composed.is_some()
    }

    pub fn legend_state(&self) -> LegendState {
        self.legend.state()
    }

    pub fn lines(&self) -> Option<&LineLayer> {
        self.composed.as_ref().map(|c| &c.lines)
    }

    pub fn lines_mut(&mut self) -> Option<&mut LineLayer> {
        self.composed.as_mut().map(|c| &mut c.lines)
    }

    pub fn points(&self) -> Option<&PointLayer> {
        self.composed.as_ref().map(|c| &c.points)
    }

    pub fn base_maps(&self) -> &BaseMaps {
        &self.base_maps
    }

    pub fn overlays(&self) -> Option<&Overlays> {
        self.composed.as_ref().map(|c| &c.overlays)
    }

    pub fn layer_control(&self) -> Option<ControlHandle> {
        self.composed.as_ref().map(|c| c.layer_control)
    }

    pub fn legend_control(&self) -> Option<ControlHandle> {
        self.composed.as_ref().map(|c| c.legend_control)
    }

    pub fn control_toggle(&self) -> Option<&ControlToggle> {
        self.composed.as_ref().and_then(|c| c.toggle.as_ref())
    }

    /// Builds the overlays, fits the view and registers the controls.
    ///
    /// Both loads must have succeeded; otherwise the engine is left exactly as
    /// [`ViewComposer::new`] set it up.
    pub fn compose(
        &mut self,
        lines: Result<FeatureCollection, LoadError>,
        points: Result<FeatureCollection, LoadError>,
    ) -> Result<(), InitError> {
        if self.composed.is_some() {
            return Err(InitError::AlreadyComposed);
        }
        let (lines, points) = match (lines, points) {
            (Ok(lines), Ok(points)) => (lines, points),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!(locator = e.locator(), error = %e, "map initialization aborted");
                return Err(InitError::Load(e));
            }
        };

        let engine = &mut self.engine;
        let lines = LineLayer::build(engine, self.config.lines_overlay_name.as_str(), lines);
        let points = PointLayer::build(engine, self.config.points_overlay_name.as_str(), points);

        self.fit_to_data(&lines, &points);

        let mut overlays = Overlays::default();
        overlays.push(lines.name(), lines.group());
        overlays.push(points.name(), points.group());
        let layer_control = self
            .engine
            .add_layer_control(&layer_control_spec(&self.base_maps, &overlays));
        let toggle =
            ControlToggle::bind(&mut self.engine, &self.config.toggle_element_id, layer_control);

        let legend_control = self
            .engine
            .add_floating_control(LEGEND_CORNER, &self.legend.content());
        self.engine.isolate_control_events(legend_control);

        tracing::info!(
            lines = lines.len(),
            points = points.len(),
            zoom = self.engine.zoom(),
            "map composed"
        );
        self.composed = Some(Composed {
            lines,
            points,
            overlays,
            layer_control,
            toggle,
            legend_control,
        });
        Ok(())
    }

    /// Fits the padded union of both layers, then backs off by the configured
    /// offset. Returns the final zoom, or `None` when there is nothing to fit.
    fn fit_to_data(&mut self, lines: &LineLayer, points: &PointLayer) -> Option<f64> {
        let extent = self
            .engine
            .group_bounds(lines.group())
            .union(&self.engine.group_bounds(points.group()));
        if !extent.is_valid() {
            tracing::debug!("no geometry to fit, keeping initial view");
            return None;
        }
        let fitted = self.engine.fit_bounds(&extent.pad(self.config.fit_padding))?;
        let target = (fitted - self.config.zoom_offset).max(self.engine.min_zoom());
        self.engine.set_zoom(target);
        tracing::info!(fitted, zoom = target, "view fitted to data");
        Some(target)
    }

    pub fn set_overlay_visible(&mut self, name: &str, visible: bool) -> bool {
        match self.composed.as_mut() {
            Some(c) => c.overlays.set_visible(&mut self.engine, name, visible),
            None => false,
        }
    }

    pub fn select_base_map(&mut self, name: &str) -> bool {
        self.base_maps.select(&mut self.engine, name)
    }

    /// Routes one host event. The returned value tells the host whether the
    /// event may continue to the map.
    pub fn handle(&mut self, interaction: Interaction) -> Propagation {
        let Some(composed) = self.composed.as_mut() else {
            return Propagation::Continue;
        };
        match interaction {
            Interaction::HoverEnter(feature) => {
                composed.lines.hover_enter(&mut self.engine, feature);
                Propagation::Continue
            }
            Interaction::HoverExit(feature) => {
                composed.lines.hover_exit(&mut self.engine, feature);
                Propagation::Continue
            }
            Interaction::Control { control, input } if control == composed.legend_control => {
                if self.legend.handle(&input) {
                    self.engine.update_control(control, &self.legend.content());
                }
                Propagation::Stop
            }
            Interaction::Control { .. } => Propagation::Continue,
            Interaction::ExternalToggle(element_id) => {
                if let Some(toggle) = composed
                    .toggle
                    .as_mut()
                    .filter(|t| t.element_id() == element_id)
                {
                    toggle.flip(&mut self.engine);
                }
                Propagation::Continue
            }
            Interaction::LayerVisibility { group, visible } => {
                if visible && self.base_maps.note_selected(group) {
                    tracing::debug!(base = ?self.base_maps.active_name(), "base map switched");
                } else if composed.overlays.note_visible(group, visible) {
                    tracing::debug!(?group, visible, "overlay toggled");
                }
                Propagation::Continue
            }
            Interaction::MapClick(_) => Propagation::Continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundation::GeoPoint;
    use foundation::math::Vec2;
    use formats::{Feature, Geometry};
    use layers::keys;
    use pretty_assertions::assert_eq;
    use render::headless::{ControlKind, RenderCommand};
    use render::{ControlInput, HeadlessMap};

    fn engine(width: f64, height: f64) -> HeadlessMap {
        HeadlessMap::new(Vec2::new(width, height), 0.0, 19.0).with_element("layers-toggle-btn")
    }

    fn walls() -> FeatureCollection {
        FeatureCollection::new(vec![
            Feature::new(Geometry::LineString(vec![
                GeoPoint::new(41.0, 12.0),
                GeoPoint::new(41.5, 12.4),
            ]))
            .with_property(keys::STATE, "PESSIMO ")
            .with_property(keys::WEIGHT, 10),
            Feature::new(Geometry::LineString(vec![
                GeoPoint::new(41.6, 12.5),
                GeoPoint::new(41.8, 12.7),
            ]))
            .with_property(keys::STATE, "ottimo"),
        ])
    }

    fn pois() -> FeatureCollection {
        FeatureCollection::new(vec![
            Feature::new(Geometry::Point(GeoPoint::new(42.0, 13.0)))
                .with_property(keys::SIZE, -5),
        ])
    }

    fn composed(width: f64, height: f64) -> ViewComposer<HeadlessMap> {
        let mut view =
            ViewComposer::new(engine(width, height), ViewerConfig::default()).expect("config");
        view.compose(Ok(walls()), Ok(pois())).expect("compose");
        view
    }

    #[test]
    fn fits_padded_extent_then_backs_off() {
        let view = composed(1024.0, 768.0);
        let fit = view
            .engine()
            .commands()
            .iter()
            .find_map(|c| match c {
                RenderCommand::FitBounds(b) => Some(*b),
                _ => None,
            })
            .expect("fitted");
        let close = |a: f64, b: f64| (a - b).abs() < 1e-9;
        let (sw, ne) = (fit.south_west(), fit.north_east());
        assert!(close(sw.lat_deg, 40.9) && close(sw.lon_deg, 11.9), "{sw:?}");
        assert!(close(ne.lat_deg, 42.1) && close(ne.lon_deg, 13.1), "{ne:?}");
        assert!(view.engine().commands().contains(&RenderCommand::SetZoom(6.0)));
        assert_eq!(view.engine().zoom(), 6.0);
    }

    #[test]
    fn back_off_uses_fitted_zoom_when_engine_view_lags() {
        let mut view = ViewComposer::new(
            engine(1024.0, 768.0).with_deferred_fit(),
            ViewerConfig::default(),
        )
        .expect("config");
        view.compose(Ok(walls()), Ok(pois())).expect("compose");
        assert!(view.engine().commands().contains(&RenderCommand::SetZoom(6.0)));
        assert_eq!(view.engine().zoom(), 6.0);
        assert!(!view.engine().commands().contains(&RenderCommand::SetZoom(3.0)));
    }

    #[test]
    fn back_off_is_floored_at_min_zoom() {
        let view = composed(4.0, 4.0);
        assert_eq!(view.engine().zoom(), 0.0);
    }

    #[test]
    fn failed_load_leaves_no_overlay_state() {
        let mut view =
            ViewComposer::new(engine(1024.0, 768.0), ViewerConfig::default()).expect("config");
        let before = view.engine().commands().to_vec();
        let err = view
            .compose(
                Ok(walls()),
                Err(LoadError::Status {
                    locator: "./data/poi.geojson".to_string(),
                    status: 404,
                }),
            )
            .expect_err("must abort");
        assert_eq!(err.to_string(), "Errore caricamento ./data/poi.geojson: 404");
        assert_eq!(view.engine().commands(), before.as_slice());
        assert!(view.engine().features().is_empty());
        assert!(view.engine().controls().is_empty());
        assert!(!view.is_composed());
        assert_eq!(view.engine().zoom(), 6.0);
    }

    #[test]
    fn initial_view_and_base_maps_precede_data() {
        let view =
            ViewComposer::new(engine(1024.0, 768.0), ViewerConfig::default()).expect("config");
        assert_eq!(view.engine().center(), GeoPoint::new(41.9, 12.5));
        assert_eq!(view.engine().zoom(), 6.0);
        assert_eq!(view.base_maps().active_name(), Some("OpenStreetMap"));
        assert_eq!(view.base_maps().entries().len(), 2);
    }

    #[test]
    fn composes_controls() {
        let view = composed(1024.0, 768.0);
        let layer_control = view.layer_control().expect("layer control");
        match &view.engine().control(layer_control).expect("control").kind {
            ControlKind::Layers(spec) => {
                assert!(!spec.collapsed);
                let bases: Vec<_> = spec.base_layers.iter().map(|(n, _)| n.as_str()).collect();
                assert_eq!(bases, vec!["OpenStreetMap", "Satellite (Esri)"]);
                let overlays: Vec<_> = spec.overlays.iter().map(|(n, _)| n.as_str()).collect();
                assert_eq!(overlays, vec!["Muretti a secco", "POI"]);
            }
            other => panic!("unexpected control {other:?}"),
        }

        let legend = view.legend_control().expect("legend");
        let legend_ctl = view.engine().control(legend).expect("control");
        assert!(legend_ctl.isolated);
        assert!(matches!(
            &legend_ctl.kind,
            ControlKind::Floating { corner, .. } if corner.as_str() == "bottomleft"
        ));
        assert!(view.control_toggle().is_some());
    }

    #[test]
    fn second_compose_is_rejected() {
        let mut view = composed(1024.0, 768.0);
        assert_eq!(
            view.compose(Ok(walls()), Ok(pois())),
            Err(InitError::AlreadyComposed)
        );
    }

    #[test]
    fn legend_toggles_on_click_and_keys() {
        let mut view = composed(1024.0, 768.0);
        let legend = view.legend_control().expect("legend");
        let send = |view: &mut ViewComposer<HeadlessMap>, input| {
            view.handle(Interaction::Control {
                control: legend,
                input,
            })
        };

        assert_eq!(send(&mut view, ControlInput::Click), Propagation::Stop);
        assert_eq!(view.legend_state(), LegendState::Expanded);
        let content = match &view.engine().control(legend).expect("legend").kind {
            ControlKind::Floating { content, .. } => content.clone(),
            other => panic!("unexpected control {other:?}"),
        };
        assert_eq!(content.attribute("aria-expanded"), Some("true"));

        send(&mut view, ControlInput::Click);
        assert_eq!(view.legend_state(), LegendState::Compact);
        send(&mut view, ControlInput::Key("Enter".to_string()));
        assert_eq!(view.legend_state(), LegendState::Expanded);
        send(&mut view, ControlInput::Key(" ".to_string()));
        assert_eq!(view.legend_state(), LegendState::Compact);

        let updates = view.engine().commands().len();
        assert_eq!(
            send(&mut view, ControlInput::Key("Tab".to_string())),
            Propagation::Stop
        );
        assert_eq!(view.engine().commands().len(), updates);
        assert_eq!(view.legend_state(), LegendState::Compact);
    }

    #[test]
    fn map_click_changes_nothing() {
        let mut view = composed(1024.0, 768.0);
        let legend = view.legend_control().expect("legend");
        view.handle(Interaction::Control {
            control: legend,
            input: ControlInput::Click,
        });
        let (center, zoom) = (view.engine().center(), view.engine().zoom());
        let commands = view.engine().commands().len();

        assert_eq!(
            view.handle(Interaction::MapClick(GeoPoint::new(41.2, 12.2))),
            Propagation::Continue
        );
        assert_eq!(view.legend_state(), LegendState::Expanded);
        assert_eq!(view.engine().center(), center);
        assert_eq!(view.engine().zoom(), zoom);
        assert_eq!(view.engine().commands().len(), commands);
    }

    #[test]
    fn hover_routes_to_line_layer() {
        let mut view = composed(1024.0, 768.0);
        let handle = view.lines().expect("lines").features()[0].handle;

        view.handle(Interaction::HoverEnter(handle));
        assert_eq!(view.engine().stroke_style(handle).map(|s| s.weight), Some(7.0));

        view.lines_mut()
            .and_then(|l| l.feature_mut(handle))
            .expect("feature")
            .set_property(keys::WEIGHT, 2);
        view.handle(Interaction::HoverExit(handle));
        assert_eq!(view.engine().stroke_style(handle).map(|s| s.weight), Some(2.0));
    }

    #[test]
    fn external_toggle_hides_and_shows_layer_control() {
        let mut view = composed(1024.0, 768.0);
        let control = view.layer_control().expect("control");
        view.handle(Interaction::ExternalToggle("layers-toggle-btn".to_string()));
        assert_eq!(view.engine().control(control).map(|c| c.visible), Some(false));
        let (_, state) = view.engine().toggle("layers-toggle-btn").expect("bound");
        assert!(!state.pressed);
        assert_eq!(state.title, "Mostra livelli");

        view.handle(Interaction::ExternalToggle("other".to_string()));
        assert_eq!(view.engine().control(control).map(|c| c.visible), Some(false));

        view.handle(Interaction::ExternalToggle("layers-toggle-btn".to_string()));
        assert_eq!(view.engine().control(control).map(|c| c.visible), Some(true));
    }

    #[test]
    fn overlay_and_base_map_visibility() {
        let mut view = composed(1024.0, 768.0);
        let points_group = view.points().expect("points").group();
        assert!(view.set_overlay_visible("POI", false));
        assert_eq!(view.engine().group(points_group).map(|g| g.visible), Some(false));
        assert_eq!(view.overlays().and_then(|o| o.is_visible("Muretti a secco")), Some(true));

        assert!(view.select_base_map("Satellite (Esri)"));
        assert_eq!(view.base_maps().active_name(), Some("Satellite (Esri)"));
        assert!(!view.select_base_map("Topo"));
    }

    #[test]
    fn requests_apply_after_engine_side_layer_changes() {
        let mut view = composed(1024.0, 768.0);
        let points_group = view.points().expect("points").group();
        let (osm, sat) = (view.base_maps().entries()[0].1, view.base_maps().entries()[1].1);

        // Switched in the engine's own control with no event delivered.
        view.engine_mut().set_group_visible(points_group, false);
        view.engine_mut().set_group_visible(osm, false);
        view.engine_mut().set_group_visible(sat, true);

        assert!(view.set_overlay_visible("POI", true));
        assert_eq!(view.engine().group(points_group).map(|g| g.visible), Some(true));
        assert!(view.select_base_map("OpenStreetMap"));
        assert_eq!(view.engine().group(osm).map(|g| g.visible), Some(true));
        assert_eq!(view.engine().group(sat).map(|g| g.visible), Some(false));
    }

    #[test]
    fn engine_layer_events_keep_state_in_sync() {
        let mut view = composed(1024.0, 768.0);
        let points_group = view.points().expect("points").group();
        let sat = view.base_maps().entries()[1].1;

        let hide = Interaction::LayerVisibility {
            group: points_group,
            visible: false,
        };
        assert_eq!(view.handle(hide), Propagation::Continue);
        assert_eq!(view.overlays().and_then(|o| o.is_visible("POI")), Some(false));

        view.handle(Interaction::LayerVisibility {
            group: sat,
            visible: true,
        });
        assert_eq!(view.base_maps().active_name(), Some("Satellite (Esri)"));
    }

    #[test]
    fn empty_collections_keep_initial_view() {
        let mut view =
            ViewComposer::new(engine(1024.0, 768.0), ViewerConfig::default()).expect("config");
        view.compose(Ok(FeatureCollection::default()), Ok(FeatureCollection::default()))
            .expect("compose");
        assert_eq!(view.engine().zoom(), 6.0);
        assert_eq!(view.engine().center(), GeoPoint::new(41.9, 12.5));
        assert!(view.layer_control().is_some());
    }
}
