//! Display events delivered from the engine to the JS layer.
//!
//! The engine reports what changed as a [`MoveReport`]; this module flattens
//! reports into the per-cache events the map widget draws from. Kept free of
//! JS types so the mapping is testable natively.

use geocoin_world::{CacheView, CellCoord, GeocacheService, LatLng, MoveReport};

#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The player marker moved.
    PlayerMoved { position: LatLng },
    /// A cache came into view; draw its rectangle and popup.
    CacheShown(CacheView),
    /// A cache left view; remove its rectangle. The cache itself persists.
    CacheHidden { cell: CellCoord },
    /// A visible cache's coins changed; rebuild its popup.
    CacheUpdated(CacheView),
    /// The inventory changed.
    InventoryChanged,
}

/// Events for a move, in draw order: hides, shows, then the player marker.
pub fn events_for_move(report: &MoveReport, service: &GeocacheService) -> Vec<ClientEvent> {
    let mut events: Vec<ClientEvent> = report
        .hidden
        .iter()
        .map(|&cell| ClientEvent::CacheHidden { cell })
        .collect();

    events.extend(
        report
            .shown
            .iter()
            .filter_map(|&cell| service.cache_view(cell))
            .map(ClientEvent::CacheShown),
    );

    events.push(ClientEvent::PlayerMoved {
        position: report.position,
    });
    events
}

/// Events after a coin transfer touching the cache at `cell`.
pub fn events_for_transfer(cell: CellCoord, service: &GeocacheService) -> Vec<ClientEvent> {
    let mut events = Vec::with_capacity(2);
    if let Some(view) = service.cache_view(cell) {
        events.push(ClientEvent::CacheUpdated(view));
    }
    events.push(ClientEvent::InventoryChanged);
    events
}
