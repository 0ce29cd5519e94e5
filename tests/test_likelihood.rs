#![allow(non_snake_case)]

//! Log-likelihood of the Kalman and Chandrasekhar filters.
//!
//! Both filters are checked against the joint Gaussian density of a local level series and
//! against each other on stationary systems.

mod systems;

use approx::assert_relative_eq;
use nalgebra::{DMatrix, DVector};

use statespace_estimate::{
    log_likelihood_chandrasekhar, log_likelihood_kalman, ChandrasekharFilter, FilterError, FilterOptions,
    KalmanFilter, KalmanSmoother, LikelihoodExt, StateSpaceSystem,
};
use systems::*;

const LOCAL_LEVEL_Y: [f64; 5] = [0.5, -0.3, 1.2, 0.0, 0.7];

#[test]
fn test_local_level_matches_joint_density() {
    let expect = local_level_joint_log_density(&LOCAL_LEVEL_Y, 1., 1., 1.);
    assert!(expect.is_finite());

    let y = series(&LOCAL_LEVEL_Y);
    let system = local_level();
    let kalman = KalmanFilter::default().run(&y, &system).unwrap();
    let smoother = KalmanSmoother::default().run(&y, &system).unwrap();

    assert_relative_eq!(kalman, expect, epsilon = 1e-6);
    assert_relative_eq!(smoother.log_likelihood, expect, epsilon = 1e-6);
}

#[test]
fn test_local_level_scalar_recursion() {
    // F_0 = P0 + H = 2, v_0 = 0.5; the first term is the N(0, 2) log density
    let y = series(&LOCAL_LEVEL_Y[..1]);
    let loglh = KalmanFilter::default().run(&y, &local_level()).unwrap();
    let ln_2pi = (2. * std::f64::consts::PI).ln();
    assert_relative_eq!(loglh, -0.5 * (ln_2pi + 2f64.ln() + 0.25 / 2.), epsilon = 1e-12);
}

#[test]
fn test_entry_point_matches_components() {
    let system = var3();
    let y = random_series(40, 2, 11);
    let expect = KalmanFilter::new(FilterOptions::new(2)).run(&y, &system).unwrap();
    let loglh = log_likelihood_kalman(
        y.as_matrix(),
        system.TT(),
        system.RR(),
        system.QQ(),
        system.DD(),
        system.ZZ(),
        system.HH(),
        system.P0(),
        2,
    )
    .unwrap();
    assert_eq!(loglh, expect);
}

#[test]
fn test_chandrasekhar_agrees_with_kalman() {
    for (system, ny, seed) in vec![(var3(), 2, 1u64), (wide(), 1, 2u64)] {
        let y = random_series(150, ny, seed);
        let kalman = KalmanFilter::default().run(&y, &system).unwrap();
        let chand = ChandrasekharFilter::default().run(&y, &system).unwrap();
        assert_relative_eq!(chand, kalman, max_relative = 1e-6);
    }
}

#[test]
fn test_chandrasekhar_agrees_with_kalman_after_burn_in() {
    let system = var3();
    let y = random_series(80, 2, 5);
    let options = FilterOptions::new(10);
    let kalman = KalmanFilter::new(options).run(&y, &system).unwrap();
    let chand = ChandrasekharFilter::new(options).run(&y, &system).unwrap();
    assert_relative_eq!(chand, kalman, max_relative = 1e-6);
}

#[test]
fn test_chandrasekhar_entry_point() {
    let system = wide();
    let y = random_series(60, 1, 3);
    let kalman = log_likelihood_kalman(
        y.as_matrix(),
        system.TT(),
        system.RR(),
        system.QQ(),
        system.DD(),
        system.ZZ(),
        system.HH(),
        system.P0(),
        0,
    )
    .unwrap();
    let chand = log_likelihood_chandrasekhar(
        y.as_matrix(),
        system.TT(),
        system.RR(),
        system.QQ(),
        system.DD(),
        system.ZZ(),
        system.HH(),
        system.P0(),
        0,
    )
    .unwrap();
    assert_relative_eq!(chand, kalman, max_relative = 1e-6);
}

#[test]
fn test_chandrasekhar_rejects_missing_data() {
    let y = with_missing(&random_series(20, 2, 4), &[(7, 1)]);
    let res = ChandrasekharFilter::default().run(&y, &var3());
    assert!(matches!(res, Err(FilterError::Precondition(_))));
}

#[test]
fn test_deterministic() {
    let system = var3();
    let y = with_missing(&random_series(50, 2, 9), &[(3, 0), (4, 0), (4, 1), (20, 1)]);
    let first = KalmanFilter::default().run(&y, &system).unwrap();
    let second = KalmanFilter::default().run(&y, &system).unwrap();
    assert_eq!(first.to_bits(), second.to_bits());

    let complete = random_series(50, 2, 9);
    let first = ChandrasekharFilter::default().run(&complete, &system).unwrap();
    let second = ChandrasekharFilter::default().run(&complete, &system).unwrap();
    assert_eq!(first.to_bits(), second.to_bits());
}

#[test]
fn test_burn_in_excludes_first_contributions() {
    let system = var3();
    let y = with_missing(&random_series(30, 2, 21), &[(1, 0), (2, 0), (2, 1)]);
    let all = KalmanSmoother::default().run(&y, &system).unwrap();

    for &b in &[0usize, 1, 3, 12] {
        let burnt = KalmanFilter::new(FilterOptions::new(b)).run(&y, &system).unwrap();
        let head: f64 = all.log_likelihoods.rows(0, b).sum();
        assert_relative_eq!(burnt, all.log_likelihood - head, epsilon = 1e-9);
    }
}

#[test]
fn test_missing_coordinates_match_reduced_series() {
    // A fully decoupled model observed with missing values is two scalar models
    let TT = DMatrix::from_row_slice(2, 2, &[0.9, 0., 0., 0.5]);
    let QQ = DMatrix::from_row_slice(2, 2, &[0.1, 0., 0., 0.2]);
    let HH = DMatrix::from_row_slice(2, 2, &[0.3, 0., 0., 0.4]);
    let system = StateSpaceSystem::new(
        TT,
        DMatrix::identity(2, 2),
        QQ,
        DVector::zeros(2),
        DMatrix::identity(2, 2),
        HH,
        DMatrix::identity(2, 2),
    )
    .unwrap();
    let y = with_missing(&random_series(6, 2, 8), &[(1, 0), (3, 1), (4, 0), (4, 1)]);
    let loglh = KalmanFilter::default().run(&y, &system).unwrap();

    let scalar_system = |T: f64, Q: f64, H: f64| {
        StateSpaceSystem::new(scalar(T), scalar(1.), scalar(Q), DVector::zeros(1), scalar(1.), scalar(H), scalar(1.))
            .unwrap()
    };
    let column = |i: usize| {
        let values: Vec<f64> = (0..6).map(|t| y.as_matrix()[(t, i)]).collect();
        series(&values)
    };
    let first = KalmanFilter::default().run(&column(0), &scalar_system(0.9, 0.1, 0.3)).unwrap();
    let second = KalmanFilter::default().run(&column(1), &scalar_system(0.5, 0.2, 0.4)).unwrap();
    assert_relative_eq!(loglh, first + second, epsilon = 1e-10);
}

#[test]
fn test_singular_innovation_is_numerical() {
    // Nothing loads on the observable and there is no measurement error: F = 0
    let system = StateSpaceSystem::new(
        scalar(0.5),
        scalar(1.),
        scalar(1.),
        DVector::zeros(1),
        scalar(0.),
        scalar(0.),
        scalar(1.),
    )
    .unwrap();
    let y = series(&LOCAL_LEVEL_Y);

    let res = KalmanFilter::default().run(&y, &system);
    match &res {
        Err(FilterError::Numerical { period, .. }) => assert_eq!(*period, Some(0)),
        other => panic!("expected numerical error, got {:?}", other),
    }
    assert_eq!(res.or_neg_infinity(), Ok(f64::NEG_INFINITY));

    assert!(ChandrasekharFilter::default().run(&y, &system).unwrap_err().is_numerical());
    assert!(KalmanSmoother::default().run(&y, &system).unwrap_err().is_numerical());
}

#[test]
fn test_innovation_covariance_singular_after_first_period() {
    // Two states driven by one shock and observed without error: F_0 = P0 is regular but F_1 = RQR'
    // has rank one.
    let system = StateSpaceSystem::with_stationary_covariance(
        DMatrix::from_row_slice(2, 2, &[0.5, 0., 0., 0.3]),
        DMatrix::from_element(2, 1, 1.),
        scalar(1.),
        DVector::zeros(2),
        DMatrix::identity(2, 2),
        DMatrix::zeros(2, 2),
    )
    .unwrap();
    let y = random_series(10, 2, 13);
    let options = FilterOptions::default().with_min_rcond(1e-10);

    let expect_period_1 = |res: statespace_estimate::Result<f64>| match res {
        Err(FilterError::Numerical { period, .. }) => assert_eq!(period, Some(1)),
        other => panic!("expected numerical error at period 1, got {:?}", other),
    };
    expect_period_1(ChandrasekharFilter::new(options).run(&y, &system));
    expect_period_1(KalmanFilter::new(options).run(&y, &system));
    expect_period_1(KalmanSmoother::new(options).run(&y, &system).map(|result| result.log_likelihood));

    // The first period alone is regular
    let first = random_series(1, 2, 13);
    let kalman = KalmanFilter::new(options).run(&first, &system).unwrap();
    let chand = ChandrasekharFilter::new(options).run(&first, &system).unwrap();
    assert_relative_eq!(chand, kalman, max_relative = 1e-12);
}

#[test]
fn test_usage_errors() {
    let system = local_level();
    let y = series(&LOCAL_LEVEL_Y);

    let res = KalmanFilter::new(FilterOptions::new(5)).run(&y, &system);
    assert!(matches!(res, Err(FilterError::Precondition(_))));

    let wrong_width = random_series(5, 2, 1);
    let res = KalmanFilter::default().run(&wrong_width, &system);
    assert!(matches!(res, Err(FilterError::Shape(_))));

    let res = log_likelihood_kalman(
        y.as_matrix(),
        &scalar(1.),
        &scalar(1.),
        &scalar(1.),
        &DVector::zeros(2),
        &scalar(1.),
        &scalar(1.),
        &scalar(1.),
        0,
    );
    assert!(matches!(res, Err(FilterError::Shape(_))));
    // usage errors are not scored as impossible draws
    assert!(res.or_neg_infinity().is_err());
}
