//! `GeocoinClient` — the primary wasm-bindgen export.
//!
//! ## JavaScript usage
//!
//! ```js
//! import init, { GeocoinClient } from './pkg/geocoin_world_wasm.js';
//!
//! await init();
//!
//! const game = new GeocoinClient(null); // null → default world config
//!
//! game.onCacheShown((cache) => drawCache(cache));    // { cell, position, far_corner, coins }
//! game.onCacheHidden((i, j) => removeCache(i, j));
//! game.onCacheUpdated((cache) => rebuildPopup(cache));
//! game.onPlayerMoved((lat, lng) => marker.setLatLng([lat, lng]));
//! game.onInventoryChanged((inventory) => renderInventory(inventory));
//!
//! game.start();                       // restore from localStorage, fire initial events
//!
//! document.getElementById('north').onclick = () => game.moveDir('north');
//! navigator.geolocation.watchPosition((p) => game.moveTo(p.coords.latitude, p.coords.longitude));
//! ```

use wasm_bindgen::prelude::*;

use geocoin_world::{
    CellCoord, CoinId, Direction, GeocacheService, LatLng, MoveReport, StateStore, WorldConfig,
};

use crate::events::{events_for_move, events_for_transfer, ClientEvent};
use crate::storage::{LocalStorageStore, DEFAULT_KEY};

// ---------------------------------------------------------------------------
// GeocoinClient
// ---------------------------------------------------------------------------

/// Primary Wasm API object.
///
/// Instantiate with `new GeocoinClient(configJson | null)`, register
/// callbacks, then call `start()` once.
#[wasm_bindgen]
pub struct GeocoinClient {
    service: GeocacheService,
    store: LocalStorageStore,

    // JS callback storage (Option<js_sys::Function>)
    on_cache_shown: Option<js_sys::Function>,
    on_cache_hidden: Option<js_sys::Function>,
    on_cache_updated: Option<js_sys::Function>,
    on_player_moved: Option<js_sys::Function>,
    on_inventory_changed: Option<js_sys::Function>,
}

#[wasm_bindgen]
impl GeocoinClient {
    // -----------------------------------------------------------------------
    // Constructor
    // -----------------------------------------------------------------------

    /// Create a new client.
    ///
    /// @param configJson - optional JSON `WorldConfig`; missing keys take defaults
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<GeocoinClient, JsValue> {
        let config = match config_json {
            Some(json) => serde_json::from_str::<WorldConfig>(&json).map_err(to_js)?,
            None => WorldConfig::default(),
        };
        let service = GeocacheService::new(config).map_err(to_js)?;

        Ok(Self {
            service,
            store: LocalStorageStore::new(DEFAULT_KEY),
            on_cache_shown: None,
            on_cache_hidden: None,
            on_cache_updated: None,
            on_player_moved: None,
            on_inventory_changed: None,
        })
    }

    /// Restore the saved session (or start fresh) and fire the initial
    /// display events.
    #[wasm_bindgen]
    pub fn start(&mut self) {
        let blob = match self.store.load() {
            Ok(blob) => blob,
            Err(e) => {
                log::warn!("[client] {}", e);
                None
            }
        };
        let report = self.service.restore_or_fresh(blob.as_deref());
        self.dispatch_move(&report);
        self.fire(ClientEvent::InventoryChanged);
    }

    // -----------------------------------------------------------------------
    // Callback registration
    // -----------------------------------------------------------------------

    /// `callback(cache: {cell, position, far_corner, coins})`
    #[wasm_bindgen(js_name = onCacheShown)]
    pub fn on_cache_shown(&mut self, cb: js_sys::Function) {
        self.on_cache_shown = Some(cb);
    }

    /// `callback(i: number, j: number)`
    #[wasm_bindgen(js_name = onCacheHidden)]
    pub fn on_cache_hidden(&mut self, cb: js_sys::Function) {
        self.on_cache_hidden = Some(cb);
    }

    /// `callback(cache: {cell, position, far_corner, coins})`
    #[wasm_bindgen(js_name = onCacheUpdated)]
    pub fn on_cache_updated(&mut self, cb: js_sys::Function) {
        self.on_cache_updated = Some(cb);
    }

    /// `callback(lat: number, lng: number)`
    #[wasm_bindgen(js_name = onPlayerMoved)]
    pub fn on_player_moved(&mut self, cb: js_sys::Function) {
        self.on_player_moved = Some(cb);
    }

    /// `callback(inventory: {[coinId: string]: number})`
    #[wasm_bindgen(js_name = onInventoryChanged)]
    pub fn on_inventory_changed(&mut self, cb: js_sys::Function) {
        self.on_inventory_changed = Some(cb);
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Step one cell: `"north"`, `"south"`, `"east"` or `"west"`.
    #[wasm_bindgen(js_name = moveDir)]
    pub fn move_dir(&mut self, direction: &str) -> Result<(), JsValue> {
        let direction: Direction = direction.parse().map_err(|e: String| JsValue::from_str(&e))?;
        let report = self.service.move_player(direction).map_err(to_js)?;
        self.dispatch_move(&report);
        self.save();
        Ok(())
    }

    /// Jump to a geolocation fix.
    #[wasm_bindgen(js_name = moveTo)]
    pub fn move_to(&mut self, lat: f64, lng: f64) -> Result<(), JsValue> {
        let report = self.service.move_to(LatLng::new(lat, lng)).map_err(to_js)?;
        self.dispatch_move(&report);
        self.save();
        Ok(())
    }

    /// Take `coinId` (`"i:j#serial"`) from the cache at `(i, j)`.
    ///
    /// Returns `false` if the cache no longer held the coin.
    #[wasm_bindgen]
    pub fn collect(&mut self, i: i32, j: i32, coin_id: &str) -> Result<bool, JsValue> {
        let cell = CellCoord::new(i, j);
        let coin: CoinId = coin_id.parse().map_err(to_js)?;
        let outcome = self.service.collect(cell, &coin).map_err(to_js)?;
        if outcome.collected {
            self.dispatch_transfer(cell);
        }
        Ok(outcome.collected)
    }

    /// Give the first inventory coin to the cache at `(i, j)`.
    ///
    /// Returns the deposited coin id, or `undefined` with an empty inventory.
    #[wasm_bindgen]
    pub fn deposit(&mut self, i: i32, j: i32) -> Result<Option<String>, JsValue> {
        let cell = CellCoord::new(i, j);
        let coin = self.service.deposit(cell).map_err(to_js)?;
        if coin.is_some() {
            self.dispatch_transfer(cell);
        }
        Ok(coin.map(|c| c.to_string()))
    }

    /// Back to origin with an empty inventory and a fresh world.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        let report = self.service.reset();
        self.dispatch_move(&report);
        self.fire(ClientEvent::InventoryChanged);
        self.save();
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Visible caches as a JSON array.
    #[wasm_bindgen(js_name = visibleCaches)]
    pub fn visible_caches(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.service.visible_caches()).map_err(to_js)
    }

    /// Inventory as a JSON object `{coinId: count}`.
    #[wasm_bindgen]
    pub fn inventory(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.service.inventory().counts()).map_err(to_js)
    }

    /// Movement history as a flat `[lat0, lng0, lat1, lng1, …]` array.
    #[wasm_bindgen]
    pub fn history(&self) -> Vec<f64> {
        self.service
            .history()
            .iter()
            .flat_map(|p| [p.lat, p.lng])
            .collect()
    }

    /// World statistics as JSON.
    #[wasm_bindgen]
    pub fn stats(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.service.stats()).map_err(to_js)
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

impl GeocoinClient {
    fn dispatch_move(&self, report: &MoveReport) {
        for event in events_for_move(report, &self.service) {
            self.fire(event);
        }
    }

    fn dispatch_transfer(&mut self, cell: CellCoord) {
        for event in events_for_transfer(cell, &self.service) {
            self.fire(event);
        }
        self.save();
    }

    /// Fire the registered JS callback for a single event.
    fn fire(&self, event: ClientEvent) {
        match event {
            ClientEvent::PlayerMoved { position } => call_fn(
                &self.on_player_moved,
                &[JsValue::from(position.lat), JsValue::from(position.lng)],
            ),
            ClientEvent::CacheShown(view) => {
                call_fn(&self.on_cache_shown, &[json_value(&view)]);
            }
            ClientEvent::CacheHidden { cell } => call_fn(
                &self.on_cache_hidden,
                &[JsValue::from(cell.i), JsValue::from(cell.j)],
            ),
            ClientEvent::CacheUpdated(view) => {
                call_fn(&self.on_cache_updated, &[json_value(&view)]);
            }
            ClientEvent::InventoryChanged => call_fn(
                &self.on_inventory_changed,
                &[json_value(self.service.inventory().counts())],
            ),
        }
    }

    fn save(&mut self) {
        let result = geocoin_world::persistence::encode_state(&self.service.snapshot())
            .and_then(|blob| self.store.save(&blob));
        if let Err(e) = result {
            log::warn!("[client] Failed to save: {}", e);
        }
    }
}

// ---------------------------------------------------------------------------
// JS helpers
// ---------------------------------------------------------------------------

fn call_fn(f: &Option<js_sys::Function>, args: &[JsValue]) {
    if let Some(func) = f {
        let this = JsValue::NULL;
        let arr = js_sys::Array::new();
        for a in args {
            arr.push(a);
        }
        if let Err(e) = func.apply(&this, &arr) {
            log::warn!("[client] Callback error: {:?}", e);
        }
    }
}

/// Serialise to a plain JS object via JSON.
fn json_value<T: serde::Serialize>(value: &T) -> JsValue {
    match serde_json::to_string(value) {
        Ok(json) => js_sys::JSON::parse(&json).unwrap_or(JsValue::NULL),
        Err(e) => {
            log::warn!("[client] Failed to serialise event: {}", e);
            JsValue::NULL
        }
    }
}

fn to_js<E: std::fmt::Display>(e: E) -> JsValue {
    JsValue::from_str(&e.to_string())
}
