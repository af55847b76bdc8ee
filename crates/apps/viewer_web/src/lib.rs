use gloo_net::http::Request;
use std::cell::RefCell;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use formats::{FeatureCollection, LoadError, collection_from_response};
use layers::legend::is_toggle_key;
use render::{ControlInput, Interaction, Propagation};
use view::{InitError, ViewComposer, ViewerConfig};

mod fault;
mod leaflet;
mod logging;
use leaflet::{HostEvent, LeafletEngine, js_message};

thread_local! {
    static COMPOSER: RefCell<Option<ViewComposer<LeafletEngine>>> = const { RefCell::new(None) };
}

/// Failure while bringing the page up.
#[derive(Debug)]
pub enum HostError {
    Init(InitError),
    /// The page lacks something the viewer needs (Leaflet, the map element).
    Page(String),
    /// Leaflet threw while the map was being built.
    Engine(String),
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::Init(e) => write!(f, "{e}"),
            HostError::Page(msg) | HostError::Engine(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for HostError {}

impl From<InitError> for HostError {
    fn from(e: InitError) -> Self {
        HostError::Init(e)
    }
}

impl From<view::ConfigError> for HostError {
    fn from(e: view::ConfigError) -> Self {
        HostError::Init(InitError::Config(e))
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    std::panic::set_hook(Box::new(|info| {
        console_error_panic_hook::hook(info);
        notify_failure(&info.to_string());
    }));
    Ok(())
}

/// Routes one interaction to the composer. Events that arrive while the
/// composer is busy (re-entrant engine callbacks) are dropped.
pub(crate) fn dispatch(interaction: Interaction) -> Propagation {
    COMPOSER.with(|cell| match cell.try_borrow_mut() {
        Ok(mut composer) => composer
            .as_mut()
            .map(|c| c.handle(interaction))
            .unwrap_or(Propagation::Continue),
        Err(_) => {
            tracing::debug!(?interaction, "event dropped, composer busy");
            Propagation::Continue
        }
    })
}

/// Decodes a shim event and returns whether the browser default action must
/// be suppressed.
fn on_host_event(raw: JsValue) -> bool {
    let event: HostEvent = match serde_wasm_bindgen::from_value(raw) {
        Ok(event) => event,
        Err(err) => {
            tracing::debug!(error = %err, "unrecognized host event");
            return false;
        }
    };
    let Some(interaction) = event.into_interaction() else {
        return false;
    };
    let activates = matches!(
        &interaction,
        Interaction::Control { input: ControlInput::Key(key), .. } if is_toggle_key(key)
    );
    dispatch(interaction) == Propagation::Stop && activates
}

fn notify_failure(message: &str) {
    if let Some(window) = web_sys::window() {
        if window.alert_with_message(message).is_err() {
            tracing::warn!("could not show failure notification");
        }
    }
}

/// Boots the viewer. `config_json` may override any [`ViewerConfig`] field.
#[wasm_bindgen]
pub fn init_map(config_json: Option<String>) {
    spawn_local(async move {
        if let Err(err) = init_map_inner(config_json).await {
            tracing::error!(error = %err, "map initialization failed");
            notify_failure(&err.to_string());
        }
    });
}

async fn init_map_inner(config_json: Option<String>) -> Result<(), HostError> {
    let parsed = ViewerConfig::from_json(config_json.as_deref().unwrap_or_default());
    logging::init(parsed.as_ref().map_or(tracing::Level::INFO, ViewerConfig::log_level));
    let config = parsed?;

    let on_event = Closure::<dyn FnMut(JsValue) -> bool>::new(on_host_event);
    let engine = LeafletEngine::create(
        &config.map_element_id,
        config.min_zoom,
        config.max_zoom,
        on_event.as_ref().unchecked_ref(),
    )
    .map_err(|e| HostError::Page(js_message(&e)))?;
    on_event.forget();

    let composer = ViewComposer::new(engine, config.clone())?;
    engine_fault(&composer)?;
    COMPOSER.with(|cell| *cell.borrow_mut() = Some(composer));

    let lines = fetch_collection(&config.lines_url).await;
    let points = match &lines {
        Ok(_) => fetch_collection(&config.points_url).await,
        // Nothing will be drawn anyway; skip the second request.
        Err(_) => Ok(FeatureCollection::default()),
    };

    COMPOSER.with(|cell| match cell.borrow_mut().as_mut() {
        Some(composer) => {
            composer.compose(lines, points)?;
            engine_fault(composer)
        }
        None => Err(HostError::Page("viewer not initialized".to_string())),
    })
}

fn engine_fault(composer: &ViewComposer<LeafletEngine>) -> Result<(), HostError> {
    match composer.engine().take_fault() {
        Some(message) => Err(HostError::Engine(message)),
        None => Ok(()),
    }
}

async fn fetch_collection(url: &str) -> Result<FeatureCollection, LoadError> {
    let transport = |e: gloo_net::Error| LoadError::Transport {
        locator: url.to_string(),
        message: e.to_string(),
    };
    let resp = Request::get(url).send().await.map_err(transport)?;
    let status = resp.status();
    let body = resp.text().await.map_err(transport)?;
    collection_from_response(url, status, &body)
}

#[wasm_bindgen]
pub fn set_overlay_visible(name: &str, visible: bool) -> bool {
    COMPOSER.with(|cell| {
        cell.borrow_mut()
            .as_mut()
            .is_some_and(|c| c.set_overlay_visible(name, visible))
    })
}

#[wasm_bindgen]
pub fn select_base_map(name: &str) -> bool {
    COMPOSER.with(|cell| {
        cell.borrow_mut()
            .as_mut()
            .is_some_and(|c| c.select_base_map(name))
    })
}

#[wasm_bindgen]
pub fn legend_expanded() -> bool {
    COMPOSER.with(|cell| {
        cell.borrow()
            .as_ref()
            .is_some_and(|c| c.legend_state().is_expanded())
    })
}
