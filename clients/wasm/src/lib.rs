//! Geocoin World WASM client — crate root.
//!
//! Compile with:
//!
//! ```bash
//! wasm-pack build --target web --release
//! ```
//!
//! Or for development (faster, includes debug info):
//!
//! ```bash
//! wasm-pack build --target web --dev
//! ```

// Improve WASM panic messages in the browser console.
pub use console_error_panic_hook::set_once as set_panic_hook;

pub mod client;
pub mod events;
pub mod storage;

// Re-export the primary public type so consumers can do:
//   `use geocoin_world_wasm::GeocoinClient;`
pub use client::GeocoinClient;

use wasm_bindgen::prelude::*;

/// Called automatically by the generated JS glue on `init()`.
///
/// Sets up the panic hook and initialises `console_log` so that Rust
/// `log::info!` / `log::warn!` calls (including the engine's) appear in the
/// browser DevTools console.
#[wasm_bindgen(start)]
pub fn wasm_main() {
    set_panic_hook();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("geocoin-world-wasm initialised");
}
