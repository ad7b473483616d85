//! End-to-end tests of the fit engine on synthetic wire scans.

mod common;

use std::time::{Duration, Instant};

use approx::assert_relative_eq;
use common::{grid, key, noisy_profile, sampled_profile};
use wirefit::global_opt::satisfaction;
use wirefit::guess::initial_guess;
use wirefit::preprocess::cut_below;
use wirefit::{
    CancelToken, Direction, FitConfig, FitEngine, FitModel, ModelKind, ProfileShape,
    ResultStore, SimulatedAnnealing, StopReason, TwoGaussian, TwoSuperGaussian, WireFitError,
};

fn seeded(seed: u64) -> FitConfig {
    FitConfig {
        seed: Some(seed),
        ..FitConfig::default()
    }
}

#[test]
fn test_two_gaussian_round_trip() {
    let truth = TwoGaussian {
        amp1: 10.0,
        amp2: 5.0,
        sigma1: 8.0,
        sigma2: 4.0,
        center: 50.0,
        offset: 0.0,
    };
    let data = sampled_profile(key("WS20", Direction::H), &truth, grid(0.0, 100.0, 200));

    let result = FitEngine::with_config(seeded(17))
        .fit(&data, ModelKind::TwoGaussian, Duration::from_secs(2))
        .unwrap();

    let fitted = match result.parameters() {
        FitModel::TwoGaussian(m) => *m,
        other => panic!("unexpected model {:?}", other),
    };
    assert_relative_eq!(fitted.amp1, truth.amp1, max_relative = 0.05);
    assert_relative_eq!(fitted.amp2, truth.amp2, max_relative = 0.05);
    assert_relative_eq!(fitted.sigma1, truth.sigma1, max_relative = 0.05);
    assert_relative_eq!(fitted.sigma2, truth.sigma2, max_relative = 0.10);
    assert!((fitted.center - truth.center).abs() < 1.0);

    let diagnostics = result.diagnostics().unwrap();
    assert!(diagnostics.evaluations > 1);
    assert_relative_eq!(
        diagnostics.satisfaction,
        satisfaction(diagnostics.score),
        max_relative = 1e-9
    );
    assert_eq!(result.source(), &data);
}

#[test]
fn test_single_sided_super_gaussian() {
    let truth = TwoSuperGaussian {
        amp1: 4.0,
        amp2: 0.0,
        sigma1: 6.0,
        sigma2: 0.0,
        center: 10.0,
        offset: 0.0,
        n1: 4,
        n2: 0,
    };
    let data = sampled_profile(key("WS21", Direction::V), &truth, grid(-20.0, 40.0, 150));

    let result = FitEngine::with_config(seeded(5))
        .fit(
            &data,
            ModelKind::TwoSuperGaussianSingleSided,
            Duration::from_secs(3),
        )
        .unwrap();

    let fitted = match result.parameters() {
        FitModel::TwoSuperGaussian(m) => *m,
        other => panic!("unexpected model {:?}", other),
    };
    assert_eq!(fitted.amp2, 0.0);
    assert_eq!(fitted.sigma2, 0.0);
    assert_eq!(fitted.n2, 0);
    assert!(fitted.is_single_sided());
    assert!((fitted.center - 10.0).abs() < 0.5);
    assert_relative_eq!(fitted.amp1, 4.0, max_relative = 0.1);
    assert!(result.rms() > 0.0);
}

#[test]
fn test_two_sided_super_gaussian() {
    let truth = TwoSuperGaussian {
        amp1: 6.0,
        amp2: 2.0,
        sigma1: 8.0,
        sigma2: 4.0,
        center: 5.0,
        offset: 0.0,
        n1: 4,
        n2: 2,
    };
    let data = sampled_profile(key("WS22", Direction::H), &truth, grid(-25.0, 35.0, 150));

    let config = FitConfig {
        seed: Some(11),
        time_budget_secs: Some(30.0),
        max_evaluations: Some(20_000),
        ..FitConfig::default()
    };
    let result = FitEngine::with_config(config)
        .fit_default(&data, ModelKind::TwoSuperGaussian)
        .unwrap();

    let fitted = match result.parameters() {
        FitModel::TwoSuperGaussian(m) => *m,
        other => panic!("unexpected model {:?}", other),
    };
    assert!((fitted.center - truth.center).abs() < 2.0);
    assert!((1..=10).contains(&fitted.n1));
    assert!((1..=10).contains(&fitted.n2));

    // The search only accepts improvements, so it never ends worse than its seed.
    let seed = initial_guess(&data, ModelKind::TwoSuperGaussian).unwrap();
    let seed_score = data
        .samples()
        .map(|(x, y)| (y - seed.value(x)).powi(2))
        .sum::<f64>()
        .sqrt();
    let diagnostics = result.diagnostics().unwrap();
    assert!(diagnostics.score <= seed_score);
    assert!(diagnostics.evaluations <= 20_000);
    assert!(matches!(
        diagnostics.stop_reason,
        StopReason::EvaluationLimit | StopReason::Satisfied
    ));
}

#[test]
fn test_frozen_offset_stays_zero() {
    let truth = TwoGaussian {
        amp1: 3.0,
        amp2: 0.0,
        sigma1: 5.0,
        sigma2: 2.0,
        center: 0.0,
        offset: 0.05,
    };
    let data = sampled_profile(key("WS22", Direction::H), &truth, grid(-30.0, 30.0, 120));
    let config = FitConfig {
        fit_offset: false,
        time_budget_secs: Some(0.5),
        ..seeded(3)
    };

    let result = FitEngine::with_config(config)
        .fit_default(&data, ModelKind::TwoGaussian)
        .unwrap();
    assert_eq!(result.parameters().offset(), 0.0);
}

#[test]
fn test_empty_cut_is_insufficient_data() {
    let truth = TwoGaussian {
        amp1: 2.0,
        amp2: 0.0,
        sigma1: 3.0,
        sigma2: 1.0,
        center: 0.0,
        offset: 0.0,
    };
    let data = sampled_profile(key("WS20", Direction::H), &truth, grid(-10.0, 10.0, 50));

    let empty = cut_below(&data, 100.0);
    assert!(empty.is_empty());

    let engine = FitEngine::new();
    let err = engine
        .fit(&empty, ModelKind::TwoGaussian, Duration::from_secs(2))
        .unwrap_err();
    assert!(matches!(err, WireFitError::InsufficientData(_)));

    // The configured threshold is applied before seeding.
    let thresholded = FitEngine::with_config(FitConfig {
        threshold: Some(100.0),
        ..FitConfig::default()
    });
    assert!(matches!(
        thresholded.fit(&data, ModelKind::TwoGaussian, Duration::from_secs(2)),
        Err(WireFitError::InsufficientData(_))
    ));
}

#[test]
fn test_cancel_aborts_fit() {
    let truth = TwoGaussian {
        amp1: 6.0,
        amp2: 1.0,
        sigma1: 5.0,
        sigma2: 2.0,
        center: 20.0,
        offset: 0.0,
    };
    // The noise keeps the satisfaction target out of reach.
    let data = noisy_profile(
        key("WS23", Direction::H),
        &truth,
        grid(0.0, 40.0, 200),
        0.2,
        99,
    );

    let token = CancelToken::new();
    let canceller = token.clone();
    let start = Instant::now();

    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        canceller.cancel();
    });
    let result = FitEngine::new().fit_cancellable(
        &data,
        ModelKind::TwoGaussian,
        Duration::from_secs(30),
        &token,
    );
    handle.join().unwrap();

    assert!(matches!(result, Err(WireFitError::Cancelled)));
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[test]
fn test_noisy_fit_finds_center() {
    let truth = TwoGaussian {
        amp1: 8.0,
        amp2: 2.0,
        sigma1: 6.0,
        sigma2: 3.0,
        center: -12.0,
        offset: 0.0,
    };
    let data = noisy_profile(
        key("WS24", Direction::V),
        &truth,
        grid(-50.0, 30.0, 200),
        0.05,
        7,
    );

    let result = FitEngine::with_config(seeded(11))
        .fit(&data, ModelKind::TwoGaussian, Duration::from_secs(2))
        .unwrap();

    assert!((result.parameters().center() - truth.center).abs() < 1.0);
    let diagnostics = result.diagnostics().unwrap();
    assert!(diagnostics.satisfaction < 0.999);
}

#[test]
fn test_fit_all_keeps_input_order() {
    let wires = ["WS20", "WS21", "WS22", "WS23"];
    let profiles: Vec<_> = wires
        .iter()
        .enumerate()
        .map(|(i, wire)| {
            let curve = TwoGaussian {
                amp1: 2.0 + i as f64,
                amp2: 0.0,
                sigma1: 4.0,
                sigma2: 2.0,
                center: 5.0 * i as f64,
                offset: 0.0,
            };
            sampled_profile(key(wire, Direction::H), &curve, grid(-20.0, 40.0, 100))
        })
        .collect();

    let engine = FitEngine::with_config(FitConfig {
        time_budget_secs: Some(0.3),
        ..seeded(1)
    });
    let results = engine.fit_all(&profiles, ModelKind::TwoGaussian);

    assert_eq!(results.len(), wires.len());
    for (wire, result) in wires.iter().zip(&results) {
        assert_eq!(result.as_ref().unwrap().key().wire, *wire);
    }
}

#[test]
fn test_fit_and_store_upserts() {
    let curve = TwoGaussian {
        amp1: 3.0,
        amp2: 0.0,
        sigma1: 4.0,
        sigma2: 2.0,
        center: 1.0,
        offset: 0.0,
    };
    let data = sampled_profile(key("WS20", Direction::H), &curve, grid(-20.0, 20.0, 80));
    let engine = FitEngine::with_config(FitConfig {
        time_budget_secs: Some(0.2),
        ..seeded(2)
    });

    let mut store = ResultStore::new();
    engine
        .fit_and_store(&mut store, &data, ModelKind::TwoGaussian)
        .unwrap();
    let second = engine
        .fit_and_store(&mut store, &data, ModelKind::TwoGaussian)
        .unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(store.get(data.label()), Some(&second));
}

#[test]
fn test_simulated_annealing_engine() {
    let curve = TwoGaussian {
        amp1: 5.0,
        amp2: 0.0,
        sigma1: 6.0,
        sigma2: 3.0,
        center: 30.0,
        offset: 0.0,
    };
    let data = sampled_profile(key("WS25", Direction::H), &curve, grid(0.0, 60.0, 120));

    let optimizer = SimulatedAnnealing::with_params(1.0, 0.995, 0.005).with_seed(5);
    let config = FitConfig {
        time_budget_secs: Some(1.0),
        ..FitConfig::default()
    };
    let engine = FitEngine::with_optimizer(optimizer, config);

    let result = engine.fit_default(&data, ModelKind::TwoGaussian).unwrap();
    assert_eq!(engine.optimizer().seed, Some(5));
    assert!((result.parameters().center() - 30.0).abs() < 3.0);
}
