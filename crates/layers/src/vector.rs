use std::collections::BTreeMap;

use formats::{Feature, FeatureCollection};
use render::{FeatureHandle, GroupHandle, MapEngine};

use crate::keys;
use crate::layer::Layer;
use crate::popup::{line_popup, point_popup};
use crate::state::{ConservationState, classify};
use crate::symbology::{
    LineInteraction, PointStyle, StyleDescriptor, line_style, resolve_point_style,
};

pub fn feature_state(feature: &Feature) -> ConservationState {
    classify(feature.text(keys::STATE).as_deref())
}

/// Current style of a wall segment, read from its live attributes.
pub fn feature_line_style(feature: &Feature, interaction: LineInteraction) -> StyleDescriptor {
    line_style(
        feature_state(feature),
        feature.number(keys::WEIGHT),
        interaction,
    )
}

pub fn feature_point_style(feature: &Feature) -> PointStyle {
    resolve_point_style(
        feature.text(keys::COLOR).as_deref(),
        feature.number(keys::SIZE),
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineFeature {
    pub feature: Feature,
    pub handle: FeatureHandle,
    pub interaction: LineInteraction,
    pub popup: String,
}

impl LineFeature {
    pub fn style(&self) -> StyleDescriptor {
        feature_line_style(&self.feature, self.interaction)
    }
}

/// Wall segments drawn as styled polylines with hover highlight.
#[derive(Debug, Clone, PartialEq)]
pub struct LineLayer {
    name: String,
    group: GroupHandle,
    features: Vec<LineFeature>,
    by_handle: BTreeMap<FeatureHandle, usize>,
}

impl LineLayer {
    pub fn build<E: MapEngine>(
        engine: &mut E,
        name: impl Into<String>,
        collection: FeatureCollection,
    ) -> Self {
        let name = name.into();
        let group = engine.create_group();
        let mut features = Vec::with_capacity(collection.len());
        let mut by_handle = BTreeMap::new();

        for (index, feature) in collection.features.into_iter().enumerate() {
            let paths = feature
                .geometry
                .as_ref()
                .map(|g| g.paths())
                .unwrap_or_default();
            if paths.is_empty() {
                tracing::debug!(layer = %name, index, "skipping feature without linear geometry");
                continue;
            }
            if !feature_state(&feature).is_known() {
                tracing::warn!(
                    layer = %name,
                    index,
                    raw = ?feature.property(keys::STATE),
                    "unrecognized conservation state, using fallback color"
                );
            }

            let style = feature_line_style(&feature, LineInteraction::Idle);
            let handle = engine.add_polyline(group, &paths, &style.stroke());
            let popup = line_popup(&feature);
            engine.bind_popup(handle, &popup);
            engine.watch_hover(handle);

            by_handle.insert(handle, features.len());
            features.push(LineFeature {
                feature,
                handle,
                interaction: LineInteraction::Idle,
                popup,
            });
        }

        tracing::info!(layer = %name, rendered = features.len(), "line layer built");
        Self {
            name,
            group,
            features,
            by_handle,
        }
    }

    pub fn features(&self) -> &[LineFeature] {
        &self.features
    }

    pub fn contains(&self, handle: FeatureHandle) -> bool {
        self.by_handle.contains_key(&handle)
    }

    pub fn get(&self, handle: FeatureHandle) -> Option<&LineFeature> {
        self.features.get(*self.by_handle.get(&handle)?)
    }

    /// Mutable access to a feature's attributes; the next style recomputation
    /// picks up any change.
    pub fn feature_mut(&mut self, handle: FeatureHandle) -> Option<&mut Feature> {
        let index = *self.by_handle.get(&handle)?;
        self.features.get_mut(index).map(|f| &mut f.feature)
    }

    pub fn style_of(&self, handle: FeatureHandle) -> Option<StyleDescriptor> {
        self.get(handle).map(LineFeature::style)
    }

    pub fn hover_enter<E: MapEngine>(&mut self, engine: &mut E, handle: FeatureHandle) -> bool {
        self.set_interaction(engine, handle, LineInteraction::Hovered)
    }

    pub fn hover_exit<E: MapEngine>(&mut self, engine: &mut E, handle: FeatureHandle) -> bool {
        self.set_interaction(engine, handle, LineInteraction::Idle)
    }

    fn set_interaction<E: MapEngine>(
        &mut self,
        engine: &mut E,
        handle: FeatureHandle,
        interaction: LineInteraction,
    ) -> bool {
        let Some(index) = self.by_handle.get(&handle).copied() else {
            return false;
        };
        let line = &mut self.features[index];
        line.interaction = interaction;
        engine.set_stroke_style(handle, &line.style().stroke());
        true
    }
}

impl Layer for LineLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn group(&self) -> GroupHandle {
        self.group
    }

    fn len(&self) -> usize {
        self.features.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointMarker {
    pub handle: FeatureHandle,
    /// Index into the layer's feature list; multi-point features share one.
    pub feature: usize,
    pub style: PointStyle,
}

/// Points of interest drawn as colored dots. No hover behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLayer {
    name: String,
    group: GroupHandle,
    features: Vec<Feature>,
    markers: Vec<PointMarker>,
}

impl PointLayer {
    pub fn build<E: MapEngine>(
        engine: &mut E,
        name: impl Into<String>,
        collection: FeatureCollection,
    ) -> Self {
        let name = name.into();
        let group = engine.create_group();
        let mut features = Vec::with_capacity(collection.len());
        let mut markers = Vec::with_capacity(collection.len());

        for (index, feature) in collection.features.into_iter().enumerate() {
            let points = feature
                .geometry
                .as_ref()
                .map(|g| g.points())
                .unwrap_or_default();
            if points.is_empty() {
                tracing::debug!(layer = %name, index, "skipping feature without point geometry");
                continue;
            }

            let style = feature_point_style(&feature);
            let icon = style.icon();
            let popup = point_popup(&feature);
            for at in points {
                let handle = engine.add_marker(group, at, &icon);
                engine.bind_popup(handle, &popup);
                markers.push(PointMarker {
                    handle,
                    feature: features.len(),
                    style: style.clone(),
                });
            }
            features.push(feature);
        }

        tracing::info!(layer = %name, rendered = markers.len(), "point layer built");
        Self {
            name,
            group,
            features,
            markers,
        }
    }

    pub fn markers(&self) -> &[PointMarker] {
        &self.markers
    }

    pub fn feature_of(&self, handle: FeatureHandle) -> Option<&Feature> {
        let marker = self.markers.iter().find(|m| m.handle == handle)?;
        self.features.get(marker.feature)
    }

    pub fn style_of(&self, handle: FeatureHandle) -> Option<&PointStyle> {
        self.markers
            .iter()
            .find(|m| m.handle == handle)
            .map(|m| &m.style)
    }
}

impl Layer for PointLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn group(&self) -> GroupHandle {
        self.group
    }

    fn len(&self) -> usize {
        self.markers.len()
    }
}
