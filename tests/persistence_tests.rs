//! Save / restore tests

#[cfg(test)]
mod tests {
    use geocoin_world::persistence::{decode_state, encode_state};
    use geocoin_world::{
        CellCoord, CoinId, Direction, FileStore, GeocacheService, LatLng, MemoryStore,
        SavedCache, SavedState, StateStore, WorldConfig, WorldError,
    };
    use std::collections::BTreeMap;

    fn config() -> WorldConfig {
        WorldConfig {
            seed: "persistence".into(),
            origin: LatLng::new(10.0, 20.0),
            spawn_probability: 1.0,
            neighborhood_radius: 2,
            visible_distance: 1.5e-4,
            ..Default::default()
        }
    }

    fn played_service() -> GeocacheService {
        let mut svc = GeocacheService::new(config()).unwrap();
        let cell = CellCoord::new(0, 0);
        for coin in svc.cache_view(cell).unwrap().coins {
            svc.collect(cell, &coin).unwrap();
        }
        svc.move_player(Direction::East).unwrap();
        svc.move_player(Direction::East).unwrap();
        svc
    }

    /// Per coin id: inventory count plus occurrences across every cache.
    fn coin_totals(svc: &GeocacheService) -> BTreeMap<CoinId, u64> {
        let mut totals = BTreeMap::new();
        for (coin, n) in svc.inventory().iter() {
            *totals.entry(*coin).or_insert(0) += u64::from(n);
        }
        for cache in svc.store().caches() {
            for coin in cache.coins() {
                *totals.entry(*coin).or_insert(0) += 1;
            }
        }
        totals
    }

    // -----------------------------------------------------------------------
    // Snapshot / restore
    // -----------------------------------------------------------------------

    #[test]
    fn snapshot_is_a_pure_read() {
        let svc = played_service();
        let stats = svc.stats();
        assert_eq!(svc.snapshot(), svc.snapshot());
        assert_eq!(svc.stats(), stats);
    }

    #[test]
    fn restore_reinstates_player_inventory_and_history() {
        let saved = played_service().snapshot();
        assert_eq!(saved.history.len(), 2);

        let mut svc = GeocacheService::new(config()).unwrap();
        let report = svc.restore(saved.clone()).unwrap();

        assert_eq!(report.cell, CellCoord::new(0, 2));
        assert!(!report.shown.is_empty());
        assert_eq!(svc.snapshot(), saved);
        assert_eq!(svc.player_cell(), Some(CellCoord::new(0, 2)));
        assert_eq!(svc.stats().checked_cells, 25);
    }

    #[test]
    fn restored_world_matches_a_fresh_walk() {
        let walked = played_service();
        let mut restored = GeocacheService::new(config()).unwrap();
        restored.restore(walked.snapshot()).unwrap();

        // Caches not touched before saving come back identical.
        let far = CellCoord::new(1, 3);
        assert_eq!(walked.cache_view(far), restored.cache_view(far));
    }

    #[test]
    fn coins_are_conserved_across_save_and_restore() {
        let mut walked = played_service();
        let here = CellCoord::new(0, 2);
        let deposited = walked.deposit(here).unwrap().expect("inventory not empty");
        let before = coin_totals(&walked);

        let blob = encode_state(&walked.snapshot()).unwrap();
        let mut restored = GeocacheService::new(config()).unwrap();
        restored.restore(decode_state(&blob).unwrap()).unwrap();
        // Walk back so the restored store covers the same cells.
        restored.move_player(Direction::West).unwrap();
        restored.move_player(Direction::West).unwrap();

        assert_eq!(coin_totals(&restored), before);
        assert!(restored.cache_view(CellCoord::new(0, 0)).unwrap().coins.is_empty());
        assert!(restored.cache_view(here).unwrap().coins.contains(&deposited));
    }

    #[test]
    fn snapshot_lists_only_changed_caches() {
        let saved = played_service().snapshot();
        assert_eq!(
            saved.caches,
            vec![SavedCache {
                cell: CellCoord::new(0, 0),
                coins: vec![],
            }]
        );
        assert!(GeocacheService::new(config()).unwrap().snapshot().caches.is_empty());
    }

    #[test]
    fn restore_rejects_non_finite_position() {
        let mut svc = GeocacheService::new(config()).unwrap();
        let before = svc.snapshot();
        let bad = SavedState {
            player: LatLng::new(f64::INFINITY, 0.0),
            inventory: Default::default(),
            history: vec![],
            caches: vec![],
        };
        assert!(svc.restore(bad).is_err());
        assert_eq!(svc.snapshot(), before);
    }

    // -----------------------------------------------------------------------
    // Blobs
    // -----------------------------------------------------------------------

    #[test]
    fn blob_round_trip_through_memory_store() {
        let svc = played_service();
        let mut store = MemoryStore::new();
        assert_eq!(store.load().unwrap(), None);

        store.save(&encode_state(&svc.snapshot()).unwrap()).unwrap();
        let blob = store.load().unwrap().unwrap();
        assert!(blob.contains("\"0:0#0\""));

        let mut fresh = GeocacheService::new(config()).unwrap();
        fresh.restore_or_fresh(Some(&blob));
        assert_eq!(fresh.snapshot(), svc.snapshot());

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn corrupt_or_missing_blob_starts_at_origin() {
        for blob in [
            None,
            Some(""),
            Some("not json"),
            Some(r#"{"player":{"lat":1.0}}"#),
            Some(r#"{"player":{"lat":1.0,"lng":2.0},"inventory":{"bogus":1}}"#),
        ] {
            let mut svc = played_service();
            let report = svc.restore_or_fresh(blob);
            assert_eq!(report.position, LatLng::new(10.0, 20.0), "blob {:?}", blob);
            assert!(svc.inventory().is_empty());
            assert!(svc.history().is_empty());
        }
    }

    #[test]
    fn decode_reports_typed_errors() {
        assert!(matches!(
            decode_state("[]"),
            Err(WorldError::CorruptState(_))
        ));
        // serde_json refuses to write non-finite floats, so build the blob by hand.
        let blob = r#"{"player":{"lat":0.0,"lng":0.0},"history":[{"lat":1e999,"lng":0.0}]}"#;
        assert!(matches!(decode_state(blob), Err(WorldError::CorruptState(_))));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let state = decode_state(r#"{"player":{"lat":10.0,"lng":20.0}}"#).unwrap();
        assert!(state.inventory.is_empty());
        assert!(state.history.is_empty());
        assert!(state.caches.is_empty());
    }

    // -----------------------------------------------------------------------
    // File store
    // -----------------------------------------------------------------------

    #[test]
    fn file_store_treats_missing_file_as_empty() {
        let dir = std::env::temp_dir().join(format!("geocoin-test-{}", std::process::id()));
        let path = dir.join("save.json");
        let mut store = FileStore::new(&path);
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);

        store.save("{\"x\":1}").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("{\"x\":1}"));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
