//! GeocacheService tests

#[cfg(test)]
mod tests {
    use geocoin_world::{
        CellCoord, CoinId, Command, CommandOutcome, Direction, GeocacheService, GridMapper,
        LatLng, WorldConfig, WorldError,
    };
    use std::collections::BTreeMap;

    const STEP: f64 = 1e-4;

    fn make_service(spawn_probability: f64, radius: i32, visible_distance: f64) -> GeocacheService {
        let config = WorldConfig {
            seed: "service-tests".into(),
            origin: LatLng::new(0.0, 0.0),
            step: STEP,
            neighborhood_radius: radius,
            spawn_probability,
            max_coins_per_cache: 3,
            visible_distance,
        };
        GeocacheService::new(config).unwrap()
    }

    /// Every cell spawns; caches within ~1.5 cells are in reach.
    fn dense_service() -> GeocacheService {
        make_service(1.0, 2, 1.5e-4)
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
    // Start-up
    // -----------------------------------------------------------------------

    #[test]
    fn starts_at_origin_with_generated_neighborhood() {
        let svc = make_service(0.1, 8, 8e-4);
        assert_eq!(svc.player(), LatLng::new(0.0, 0.0));
        assert_eq!(svc.player_cell(), Some(CellCoord::new(0, 0)));
        assert!(svc.history().is_empty());

        let stats = svc.stats();
        assert_eq!(stats.checked_cells, 17 * 17);
        assert_eq!(stats.total_moves, 0);
        assert_eq!(stats.inventory_coins, 0);
    }

    #[test]
    fn rejects_invalid_config() {
        let config = WorldConfig {
            step: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            GeocacheService::new(config),
            Err(WorldError::InvalidConfig(_))
        ));
    }

    #[test]
    fn identical_configs_produce_identical_worlds() {
        let a = make_service(0.1, 8, 8e-4);
        let b = make_service(0.1, 8, 8e-4);
        assert_eq!(a.visible_caches(), b.visible_caches());
        assert_eq!(a.stats(), b.stats());
    }

    // -----------------------------------------------------------------------
    // Movement
    // -----------------------------------------------------------------------

    #[test]
    fn east_step_rescans_neighborhood() {
        let mut svc = make_service(0.1, 8, 8e-4);
        let report = svc.move_player(Direction::East).unwrap();
        assert_eq!(report.cell, CellCoord::new(0, 1));
        assert!(report.cell_changed);

        for i in -8..=8 {
            for j in -7..=9 {
                assert!(svc.store().is_checked(&CellCoord::new(i, j)));
            }
        }
        assert_eq!(svc.history().len(), 1);
        assert_eq!(svc.stats().total_moves, 1);
    }

    #[test]
    fn sub_cell_move_skips_spawn_pass_but_refreshes_visibility() {
        let mut svc = make_service(1.0, 2, 1.5e-4);
        let report = svc.move_to(LatLng::new(0.4e-4, 0.4e-4)).unwrap();
        assert!(!report.cell_changed);
        assert!(report.spawned.is_empty());
        assert_eq!(svc.stats().checked_cells, 25);

        // Closer to (1, 1), farther from (-1, -1).
        assert!(svc.cache_view(CellCoord::new(-1, -1)).is_some());
        assert!(report.hidden.contains(&CellCoord::new(-1, -1)));
    }

    #[test]
    fn walking_in_a_loop_returns_to_the_same_cell() {
        let mut svc = make_service(0.1, 4, 4e-4);
        for dir in [Direction::West, Direction::West, Direction::South] {
            svc.move_player(dir).unwrap();
        }
        assert_eq!(svc.player_cell(), Some(CellCoord::new(-1, -2)));
        for dir in [Direction::North, Direction::East, Direction::East] {
            svc.move_player(dir).unwrap();
        }
        assert_eq!(svc.player_cell(), Some(CellCoord::new(0, 0)));
        assert_eq!(svc.history().len(), 6);
    }

    #[test]
    fn long_walks_stay_on_cell_corners() {
        let mut svc = GeocacheService::new(WorldConfig {
            neighborhood_radius: 1,
            ..Default::default()
        })
        .unwrap();
        let origin = svc.config().origin;
        let grid = GridMapper::new(origin, svc.config().step);

        for n in 1..=650 {
            let report = svc.move_player(Direction::East).unwrap();
            assert_eq!(report.cell, CellCoord::new(0, n));
            assert_eq!(report.position, grid.position_of(report.cell));
            assert_eq!(grid.cell_of(report.position).unwrap(), report.cell);
        }
        for _ in 0..650 {
            svc.move_player(Direction::West).unwrap();
        }
        svc.move_player(Direction::South).unwrap();
        svc.move_player(Direction::North).unwrap();

        assert_eq!(svc.player_cell(), Some(CellCoord::new(0, 0)));
        assert_eq!(svc.player(), origin);
    }

    #[test]
    fn steps_keep_the_offset_within_the_cell() {
        let mut svc = dense_service();
        svc.move_to(LatLng::new(0.25e-4, 0.75e-4)).unwrap();
        let report = svc.move_player(Direction::North).unwrap();
        assert_eq!(report.cell, CellCoord::new(1, 0));
        assert!((report.position.lat - 1.25e-4).abs() < 1e-12);
        assert!((report.position.lng - 0.75e-4).abs() < 1e-12);
    }

    #[test]
    fn non_finite_move_leaves_state_untouched() {
        let mut svc = dense_service();
        let before = svc.snapshot();
        assert!(matches!(
            svc.move_to(LatLng::new(f64::NAN, 0.0)),
            Err(WorldError::NonFiniteCoordinate { .. })
        ));
        assert_eq!(svc.snapshot(), before);
    }

    // -----------------------------------------------------------------------
    // Collect / deposit
    // -----------------------------------------------------------------------

    #[test]
    fn collect_then_deposit_round_trip() {
        let mut svc = dense_service();
        let cell = CellCoord::new(0, 0);
        let coin = svc.cache_view(cell).unwrap().coins[0];

        let outcome = svc.collect(cell, &coin).unwrap();
        assert!(outcome.collected);
        assert_eq!(svc.inventory().count(&coin), 1);
        assert!(!svc.cache_view(cell).unwrap().coins.contains(&coin));

        assert_eq!(svc.deposit(cell).unwrap(), Some(coin));
        assert_eq!(svc.inventory().count(&coin), 0);
        assert!(svc.inventory().is_empty());
        assert!(svc.cache_view(cell).unwrap().coins.contains(&coin));
    }

    #[test]
    fn double_collect_is_a_no_op() {
        let mut svc = dense_service();
        let cell = CellCoord::new(1, 0);
        let coin = svc.cache_view(cell).unwrap().coins[0];

        assert!(svc.collect(cell, &coin).unwrap().collected);
        let second = svc.collect(cell, &coin).unwrap();
        assert!(!second.collected);
        assert_eq!(second.held, 1);
        assert_eq!(svc.inventory().total(), 1);
    }

    #[test]
    fn deposit_with_empty_inventory_is_a_no_op() {
        let mut svc = dense_service();
        let cell = CellCoord::new(0, 0);
        let before = svc.cache_view(cell).unwrap();
        assert_eq!(svc.deposit(cell).unwrap(), None);
        assert_eq!(svc.cache_view(cell).unwrap(), before);
    }

    #[test]
    fn deposits_are_not_capped() {
        let mut svc = make_service(1.0, 2, 1.5e-4);
        let target = CellCoord::new(0, 0);
        let mut collected = 0;
        for cell in [CellCoord::new(1, 0), CellCoord::new(0, 1), CellCoord::new(-1, -1)] {
            for coin in svc.cache_view(cell).unwrap().coins {
                svc.collect(cell, &coin).unwrap();
                collected += 1;
            }
        }
        let start = svc.cache_view(target).unwrap().coins.len();
        while svc.deposit(target).unwrap().is_some() {}

        let end = svc.cache_view(target).unwrap().coins.len();
        assert_eq!(end, start + collected);
        assert!(end > svc.config().max_coins_per_cache as usize);
    }

    #[test]
    fn coins_are_conserved() {
        let mut svc = dense_service();
        let before = coin_totals(&svc);
        let cells = [
            CellCoord::new(0, 0),
            CellCoord::new(1, 1),
            CellCoord::new(-1, 0),
        ];

        for (n, cell) in cells.iter().cycle().take(12).enumerate() {
            if n % 3 == 2 {
                svc.deposit(*cell).unwrap();
            } else if let Some(coin) = svc.cache_view(*cell).unwrap().coins.first().copied() {
                svc.collect(*cell, &coin).unwrap();
            }
        }
        // Collecting a coin that is somewhere else entirely changes nothing.
        let stray = CoinId::new(CellCoord::new(99, 99), 0);
        assert!(!svc.collect(cells[0], &stray).unwrap().collected);

        assert_eq!(coin_totals(&svc), before);
    }

    #[test]
    fn transfers_require_a_known_cache_in_reach() {
        let mut svc = dense_service();
        let coin = CoinId::new(CellCoord::new(2, 2), 0);

        assert!(matches!(
            svc.collect(CellCoord::new(500, 500), &coin),
            Err(WorldError::UnknownCache(_))
        ));
        // (2, 2) exists but its corner is ~2.8 cells away.
        assert!(matches!(
            svc.collect(CellCoord::new(2, 2), &coin),
            Err(WorldError::CacheOutOfReach(_))
        ));
        assert!(matches!(
            svc.deposit(CellCoord::new(2, 2)),
            Err(WorldError::CacheOutOfReach(_))
        ));
        assert!(svc.inventory().is_empty());
    }

    #[test]
    fn caches_keep_contents_while_out_of_view() {
        let mut svc = dense_service();
        let cell = CellCoord::new(0, 0);
        let coin = svc.cache_view(cell).unwrap().coins[0];
        svc.collect(cell, &coin).unwrap();
        let held = svc.cache_view(cell).unwrap().coins;

        svc.move_to(LatLng::new(0.5, 0.5)).unwrap();
        assert!(svc.visible_caches().iter().all(|v| v.cell != cell));
        svc.move_to(LatLng::new(0.0, 0.0)).unwrap();

        let view = svc
            .visible_caches()
            .into_iter()
            .find(|v| v.cell == cell)
            .expect("cache back in view");
        assert_eq!(view.coins, held);
    }

    // -----------------------------------------------------------------------
    // Reset
    // -----------------------------------------------------------------------

    #[test]
    fn reset_clears_player_state_and_regenerates_world() {
        let mut svc = dense_service();
        let cell = CellCoord::new(0, 0);
        let original = svc.cache_view(cell).unwrap();
        svc.collect(cell, &original.coins[0]).unwrap();
        svc.move_player(Direction::North).unwrap();

        let report = svc.reset();
        assert_eq!(report.position, LatLng::new(0.0, 0.0));
        assert_eq!(svc.player_cell(), Some(cell));
        assert!(svc.inventory().is_empty());
        assert!(svc.history().is_empty());
        assert_eq!(svc.cache_view(cell).unwrap(), original);
        assert_eq!(svc.stats().total_moves, 0);
    }

    // -----------------------------------------------------------------------
    // Command API
    // -----------------------------------------------------------------------

    #[test]
    fn commands_decode_from_json_and_apply() {
        let mut svc = dense_service();
        let coin = svc.cache_view(CellCoord::new(0, 0)).unwrap().coins[0];

        let json = format!(
            r#"{{"type":"collect","cell":{{"i":0,"j":0}},"coin":"{}"}}"#,
            coin
        );
        let command: Command = serde_json::from_str(&json).unwrap();
        match svc.apply(command).unwrap() {
            CommandOutcome::Collected(c) => assert!(c.collected),
            other => panic!("unexpected outcome {:?}", other),
        }

        let step: Command = serde_json::from_str(r#"{"type":"move","direction":"south"}"#).unwrap();
        match svc.apply(step).unwrap() {
            CommandOutcome::Moved(report) => assert_eq!(report.cell, CellCoord::new(-1, 0)),
            other => panic!("unexpected outcome {:?}", other),
        }

        match svc.apply(Command::Deposit { cell: CellCoord::new(-1, 0) }).unwrap() {
            CommandOutcome::Deposited { coin: deposited } => assert_eq!(deposited, Some(coin)),
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}
