use foundation::GeoPoint;
use render::TileSource;
use serde::Deserialize;
use tracing::Level;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BaseMapConfig {
    pub name: String,
    pub url_template: String,
    #[serde(default)]
    pub attribution: String,
    #[serde(default = "default_tile_max_zoom")]
    pub max_zoom: f64,
}

fn default_tile_max_zoom() -> f64 {
    19.0
}

impl BaseMapConfig {
    pub fn tile_source(&self) -> TileSource {
        TileSource {
            name: self.name.clone(),
            url_template: self.url_template.clone(),
            attribution: self.attribution.clone(),
            max_zoom: self.max_zoom,
        }
    }
}

/// Viewer settings. Every field has a default, so `{}` is a complete config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub lines_url: String,
    pub points_url: String,
    /// `[lat, lon]` in degrees.
    pub initial_center: [f64; 2],
    pub initial_zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Fraction of the data extent added on every side before fitting.
    pub fit_padding: f64,
    /// Zoom levels pulled back after fitting, to show surrounding context.
    pub zoom_offset: f64,
    /// First entry is the active base map.
    pub base_maps: Vec<BaseMapConfig>,
    pub lines_overlay_name: String,
    pub points_overlay_name: String,
    pub map_element_id: String,
    pub toggle_element_id: String,
    /// `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            lines_url: "./data/muretti.geojson".to_string(),
            points_url: "./data/poi.geojson".to_string(),
            initial_center: [41.9, 12.5],
            initial_zoom: 6.0,
            min_zoom: 0.0,
            max_zoom: 19.0,
            fit_padding: 0.1,
            zoom_offset: 3.0,
            base_maps: vec![
                BaseMapConfig {
                    name: "OpenStreetMap".to_string(),
                    url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
                    attribution: "&copy; OpenStreetMap contributors".to_string(),
                    max_zoom: 19.0,
                },
                BaseMapConfig {
                    name: "Satellite (Esri)".to_string(),
                    url_template: "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}".to_string(),
                    attribution: "Tiles &copy; Esri &mdash; Source: Esri, i-cubed, USDA, USGS, AEX, GeoEye, Getmapping, Aerogrid, IGN, IGP, UPR-EGP, and the GIS User Community".to_string(),
                    max_zoom: 19.0,
                },
            ],
            lines_overlay_name: "Muretti a secco".to_string(),
            points_overlay_name: "POI".to_string(),
            map_element_id: "map".to_string(),
            toggle_element_id: "layers-toggle-btn".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ViewerConfig {
    /// Parses a JSON override. Blank input yields the defaults.
    pub fn from_json(payload: &str) -> Result<Self, ConfigError> {
        if payload.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_json::from_str(payload).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid =
            |msg: &str| -> Result<(), ConfigError> { Err(ConfigError::Invalid(msg.to_string())) };
        if !(self.min_zoom.is_finite() && self.max_zoom.is_finite()) || self.min_zoom > self.max_zoom
        {
            return invalid("min_zoom must not exceed max_zoom");
        }
        if !self.initial_zoom.is_finite() {
            return invalid("initial_zoom must be finite");
        }
        if !self.initial_center.iter().all(|v| v.is_finite()) {
            return invalid("initial_center must be finite");
        }
        if !self.fit_padding.is_finite() || self.fit_padding < 0.0 {
            return invalid("fit_padding must be a non-negative number");
        }
        if !self.zoom_offset.is_finite() || self.zoom_offset < 0.0 {
            return invalid("zoom_offset must be a non-negative number");
        }
        if self.base_maps.is_empty() {
            return invalid("at least one base map is required");
        }
        if self.log_level.parse::<Level>().is_err() {
            return invalid("log_level must be one of error, warn, info, debug, trace");
        }
        Ok(())
    }

    /// Console verbosity. Falls back to `INFO` for an unparsable value.
    pub fn log_level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }

    pub fn initial_center(&self) -> GeoPoint {
        GeoPoint::new(self.initial_center[0], self.initial_center[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn blank_and_empty_object_mean_defaults() {
        assert_eq!(ViewerConfig::from_json("").unwrap(), ViewerConfig::default());
        assert_eq!(ViewerConfig::from_json("  \n").unwrap(), ViewerConfig::default());
        assert_eq!(ViewerConfig::from_json("{}").unwrap(), ViewerConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let cfg = ViewerConfig::from_json(
            r#"{"lines_url": "/walls.geojson", "zoom_offset": 2,
                "base_maps": [{"name": "Topo", "url_template": "https://t/{z}/{x}/{y}.png"}]}"#,
        )
        .unwrap();
        assert_eq!(cfg.lines_url, "/walls.geojson");
        assert_eq!(cfg.zoom_offset, 2.0);
        assert_eq!(cfg.points_url, "./data/poi.geojson");
        assert_eq!(cfg.base_maps.len(), 1);
        assert_eq!(cfg.base_maps[0].max_zoom, 19.0);
        assert_eq!(cfg.base_maps[0].tile_source().name, "Topo");
    }

    #[test]
    fn rejects_bad_json_and_bad_values() {
        assert!(matches!(
            ViewerConfig::from_json("{not json"),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            ViewerConfig::from_json(r#"{"min_zoom": 10, "max_zoom": 4}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ViewerConfig::from_json(r#"{"base_maps": []}"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn default_view_is_italy() {
        let cfg = ViewerConfig::default();
        assert_eq!(cfg.initial_center(), GeoPoint::new(41.9, 12.5));
        assert_eq!(cfg.initial_zoom, 6.0);
        assert_eq!(cfg.base_maps[0].name, "OpenStreetMap");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn log_level_defaults_to_info_and_is_overridable() {
        assert_eq!(ViewerConfig::default().log_level(), Level::INFO);
        let cfg = ViewerConfig::from_json(r#"{"log_level": "DEBUG"}"#).unwrap();
        assert_eq!(cfg.log_level(), Level::DEBUG);
        assert!(matches!(
            ViewerConfig::from_json(r#"{"log_level": "chatty"}"#),
            Err(ConfigError::Invalid(_))
        ));
    }
}
