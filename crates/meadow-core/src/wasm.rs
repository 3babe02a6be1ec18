//! WebAssembly bindings for the session engine.
//!
//! This module exposes a single session to JavaScript through wasm-bindgen.
//! Structured values cross the boundary as JSON strings.

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
use crate::actions::SessionEvent;
#[cfg(feature = "wasm")]
use crate::bot::{Bot, BotDifficulty};
#[cfg(feature = "wasm")]
use crate::catalog::Catalog;
#[cfg(feature = "wasm")]
use crate::config::SessionConfig;
#[cfg(feature = "wasm")]
use crate::coord::Coord;
#[cfg(feature = "wasm")]
use crate::record::SessionRecord;
#[cfg(feature = "wasm")]
use crate::session::{create_session, GameSession, SessionError};

/// Initialize panic hook for better error messages in browser console
#[cfg(feature = "wasm")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

#[cfg(feature = "wasm")]
fn to_js(error: SessionError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

#[cfg(feature = "wasm")]
fn events_json(events: &[SessionEvent]) -> String {
    serde_json::to_string(events).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(feature = "wasm")]
fn parse_config(config_json: &str) -> Result<SessionConfig, JsValue> {
    if config_json.trim().is_empty() {
        return Ok(SessionConfig::default());
    }
    SessionConfig::from_json(config_json).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// WASM-exposed session wrapper using the standard deck
#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub struct WasmSession {
    session: GameSession,
}

#[cfg(feature = "wasm")]
#[wasm_bindgen]
impl WasmSession {
    /// Create a fresh session. An empty config string uses the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, purchased_extension: bool) -> Result<WasmSession, JsValue> {
        let config = parse_config(config_json)?;
        let session =
            create_session(config, Catalog::standard(), purchased_extension).map_err(to_js)?;
        Ok(WasmSession { session })
    }

    /// Resume from a saved record
    #[wasm_bindgen(js_name = fromRecord)]
    pub fn from_record(
        config_json: &str,
        record_json: &str,
        purchased_extension: bool,
    ) -> Result<WasmSession, JsValue> {
        let config = parse_config(config_json)?;
        let record = SessionRecord::from_json(record_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid record JSON: {}", e)))?;
        let session =
            GameSession::from_record(config, Catalog::standard(), &record, purchased_extension)
                .map_err(to_js)?;
        Ok(WasmSession { session })
    }

    #[wasm_bindgen(js_name = beginPlay)]
    pub fn begin_play(&mut self) -> Result<String, JsValue> {
        self.session.begin_play().map(|e| events_json(&e)).map_err(to_js)
    }

    /// Advance the clock by `delta` seconds
    pub fn tick(&mut self, delta: f64) -> String {
        events_json(&self.session.tick(delta))
    }

    #[wasm_bindgen(js_name = placeHandTile)]
    pub fn place_hand_tile(&mut self, x: i32, y: i32) -> Result<String, JsValue> {
        self.session
            .place_hand_tile(Coord::new(x, y))
            .map(|e| events_json(&e))
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = rotateHandTile)]
    pub fn rotate_hand_tile(&mut self) -> Result<String, JsValue> {
        self.session.rotate_hand_tile().map(|e| events_json(&e)).map_err(to_js)
    }

    #[wasm_bindgen(js_name = moveHandTile)]
    pub fn move_hand_tile(&mut self, x: i32, y: i32) -> Result<String, JsValue> {
        self.session
            .move_hand_tile(Coord::new(x, y))
            .map(|e| events_json(&e))
            .map_err(to_js)
    }

    pub fn abort(&mut self) -> Result<String, JsValue> {
        self.session.abort().map(|e| events_json(&e)).map_err(to_js)
    }

    /// Get the session snapshot as JSON
    #[wasm_bindgen(js_name = getSnapshot)]
    pub fn get_snapshot(&self) -> String {
        serde_json::to_string(&self.session.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Get the persisted record as JSON
    #[wasm_bindgen(js_name = getRecord)]
    pub fn get_record(&self) -> String {
        self.session
            .to_record()
            .to_json()
            .unwrap_or_else(|_| "null".to_string())
    }

    /// Placed tiles as JSON, for rendering
    #[wasm_bindgen(js_name = getPlacedTiles)]
    pub fn get_placed_tiles(&self) -> String {
        let placed: Vec<_> = self.session.grid().iter().collect();
        serde_json::to_string(&placed).unwrap_or_else(|_| "[]".to_string())
    }

    /// Open cells as JSON
    #[wasm_bindgen(js_name = getOpenCoordinates)]
    pub fn get_open_coordinates(&self) -> String {
        serde_json::to_string(&self.session.open_coordinates()).unwrap_or_else(|_| "[]".to_string())
    }

    /// A legal placement for the hand tile as JSON, or `null`
    #[wasm_bindgen(js_name = getHint)]
    pub fn get_hint(&self) -> String {
        match self.session.hint() {
            Some(hint) => serde_json::to_string(&hint).unwrap_or_else(|_| "null".to_string()),
            None => "null".to_string(),
        }
    }

    /// Get a bot's suggested placement
    /// difficulty: "Easy" or "Medium"
    #[wasm_bindgen(js_name = getBotPlacement)]
    pub fn get_bot_placement(&self, difficulty: &str) -> String {
        let diff = match difficulty {
            "Easy" => BotDifficulty::Easy,
            _ => BotDifficulty::Medium,
        };

        let mut bot = Bot::new(diff);
        match bot.choose_placement(&self.session) {
            Some(p) => serde_json::to_string(&p).unwrap_or_else(|_| "null".to_string()),
            None => "null".to_string(),
        }
    }

    #[wasm_bindgen(js_name = isFinished)]
    pub fn is_finished(&self) -> bool {
        self.session.is_finished()
    }

    /// Get the final result as JSON, or `null` while the game runs
    #[wasm_bindgen(js_name = getResult)]
    pub fn get_result(&self) -> String {
        match self.session.result() {
            Some(result) => serde_json::to_string(result).unwrap_or_else(|_| "null".to_string()),
            None => "null".to_string(),
        }
    }
}
