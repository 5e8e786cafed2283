use approx::assert_abs_diff_eq;
use ndarray::{array, concatenate, s, Array, Array1, Array2, Axis};
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::{StandardNormal, Uniform};
use ndarray_rand::RandomExt;
use rand_isaac::Isaac64Rng;
use sprs::CsMat;

use glmnet::prelude::*;
use glmnet::progress::LogProgress;

/// Geometric lambda sequence, so that early stopping can not cut paths differently
fn lambda_grid(n: usize) -> Array1<f64> {
    Array1::logspace(10., 0., -3., n)
}

/// Tight coordinate descent threshold for comparing two fits of the same problem
fn tight_control() -> FastNetControl {
    FastNetControl {
        thresh: 1e-14,
        ..FastNetControl::default()
    }
}

fn gaussian_data(nobs: usize, nvars: usize, seed: u64) -> (Array2<f64>, Array1<f64>) {
    let mut rng = Isaac64Rng::seed_from_u64(seed);
    let x = Array::<f64, _>::random_using((nobs, nvars), StandardNormal, &mut rng);
    let beta = Array1::from_shape_fn(nvars, |j| if j % 3 == 0 { 1.5 - j as f64 * 0.1 } else { 0. });
    let noise = Array::<f64, _>::random_using(nobs, StandardNormal, &mut rng);
    let y = x.dot(&beta) + noise * 0.5 + 1.;
    (x, y)
}

#[test]
fn gaussian_path_with_default_settings() {
    let (x, y) = gaussian_data(100, 10, 42);
    let model = FastNet::gaussian()
        .alpha(0.5)
        .fit(&GlmData::single(&x, y))
        .unwrap();

    let path = model.coef_path();
    let nfits = path.nlambda();
    assert!(nfits > 2 && nfits <= 100);
    assert_eq!(path.coefs().shape(), &[nfits, 10, 1]);
    assert_eq!(path.intercepts().shape(), &[nfits, 1]);
    assert_eq!(model.nlambda(), 100);

    let lambdas = path.lambda_values();
    assert!(lambdas.iter().all(|l| *l > 0.));
    assert!(lambdas[0] >= lambdas[1]);
    for m in 2..nfits {
        assert!(lambdas[m] <= lambdas[m - 1]);
    }
    assert_eq!(model.lambda_max(), Some(lambdas[0]));
    assert_abs_diff_eq!(lambdas[0], lambdas[1] * lambdas[1] / lambdas[2], epsilon = 1e-12);

    let summary = model.summary();
    assert_eq!(summary.degrees_of_freedom[0], 0);
    assert_eq!(summary.degrees_of_freedom.len(), nfits);
    assert_eq!(summary.lambda, lambdas);
    assert!(path.coefs().index_axis(Axis(0), 0).iter().all(|c| *c == 0.));
    assert!(summary.fraction_deviance_explained[nfits - 1] > 0.5);
    assert!(model.solver_note().is_none());
    assert_eq!(path.feature_names()[9], "X9");
}

#[test]
fn inactive_variables_are_exactly_zero() {
    let (x, y) = gaussian_data(100, 10, 3);
    let model = FastNet::gaussian().fit(&GlmData::single(&x, y)).unwrap();
    let coefs = model.coef_path().univariate_coefs().unwrap();
    let df = &model.summary().degrees_of_freedom;

    for m in 1..coefs.nrows() {
        let nonzero = coefs.row(m).iter().filter(|c| **c != 0.).count();
        assert_eq!(nonzero, df[m]);
    }
}

#[test]
fn user_supplied_lambdas() {
    let (x, y) = gaussian_data(100, 10, 7);
    let model = FastNet::gaussian()
        .lambda_values(vec![0.01, 0.5, 0.1])
        .fit(&GlmData::single(&x, y))
        .unwrap();

    assert_eq!(model.coef_path().lambda_values(), array![0.5, 0.1, 0.01]);
    assert_eq!(model.lambda_max(), Some(0.5));
    assert_eq!(model.nlambda(), 3);
    assert_eq!(model.summary().degrees_of_freedom[0], 0);
}

#[test]
fn excluded_variables_stay_zero() {
    let (x, y) = gaussian_data(100, 10, 11);
    let model = FastNet::gaussian()
        .exclude(vec![2, 5])
        .fit(&GlmData::single(&x, y))
        .unwrap();
    let coefs = model.coef_path().univariate_coefs().unwrap();

    assert!(coefs.column(2).iter().all(|c| *c == 0.));
    assert!(coefs.column(5).iter().all(|c| *c == 0.));
    assert!(coefs.column(0).iter().any(|c| *c != 0.));
}

#[test]
fn invalid_limits_are_rejected() {
    let (x, y) = gaussian_data(20, 3, 1);
    let data = GlmData::single(&x, y);

    let res = FastNet::gaussian().lower_limits(0.1).fit(&data);
    assert!(matches!(res, Err(GlmnetError::InvalidLowerLimit { .. })));

    let res = FastNet::gaussian()
        .upper_limits(array![1., -1., 1.])
        .fit(&data);
    assert!(matches!(
        res,
        Err(GlmnetError::InvalidUpperLimit { index: 1, .. })
    ));

    let res = FastNet::gaussian()
        .upper_limits(array![1., 1.])
        .fit(&data);
    assert!(matches!(res, Err(GlmnetError::ShapeMismatch { .. })));

    let res = FastNet::gaussian().lambda_values(vec![0.1, -0.1]).fit(&data);
    assert!(matches!(res, Err(GlmnetError::NegativeLambda(_))));

    let res = FastNet::gaussian().exclude(vec![3]).fit(&data);
    assert!(matches!(res, Err(GlmnetError::ExcludedOutOfRange { .. })));
}

#[test]
fn coefficients_respect_their_limits() {
    let (x, y) = gaussian_data(100, 6, 5);
    let model = FastNet::gaussian()
        .lower_limits(0.)
        .upper_limits(0.5)
        .fit(&GlmData::single(&x, y))
        .unwrap();
    let coefs = model.coef_path().univariate_coefs().unwrap();

    assert!(coefs.iter().all(|c| *c >= -1e-10 && *c <= 0.5 + 1e-10));
    // the strongest variable ends up at its upper limit
    assert_abs_diff_eq!(coefs[[coefs.nrows() - 1, 0]], 0.5, epsilon = 1e-8);
}

#[test]
fn zero_limits_disable_deviance_stopping() {
    let (x, y) = gaussian_data(40, 4, 53);
    let data = GlmData::single(&x, y);

    let unbounded = FastNet::gaussian()
        .control(tight_control())
        .fit(&data)
        .unwrap();
    assert!(unbounded.coef_path().nlambda() < 100);

    let bounded = FastNet::gaussian()
        .lower_limits(0.)
        .control(tight_control())
        .fit(&data)
        .unwrap();
    assert_eq!(bounded.coef_path().nlambda(), 100);
    assert!(bounded.solver_note().is_none());
    assert!(bounded.coef_path().coefs().iter().all(|c| *c >= 0.));
}

#[test]
fn sparse_and_dense_designs_agree() {
    let (mut x, _) = gaussian_data(80, 6, 9);
    x.mapv_inplace(|v| if v.abs() < 0.6 { 0. } else { v });
    let y = x.dot(&array![1., 0., -2., 0., 0.5, 0.]) + 0.3;
    let sparse = CsMat::csr_from_dense(x.view(), 0.).to_csc();

    let params = FastNet::gaussian()
        .alpha(0.8)
        .lambda_values(lambda_grid(30))
        .control(tight_control());
    let dense = params.fit(&GlmData::single(&x, y.clone())).unwrap();
    let sparse = params
        .fit(&GlmData::single(Design::sparse(sparse.view()).unwrap(), y))
        .unwrap();

    let (dense, sparse) = (dense.coef_path(), sparse.coef_path());
    assert_eq!(dense.nlambda(), sparse.nlambda());
    assert_abs_diff_eq!(dense.lambda_values(), sparse.lambda_values(), epsilon = 1e-10);
    assert_abs_diff_eq!(dense.coefs(), sparse.coefs(), epsilon = 1e-6);
    assert_abs_diff_eq!(dense.intercepts(), sparse.intercepts(), epsilon = 1e-6);
}

#[test]
fn observation_weights_act_like_duplicates() {
    let (x, y) = gaussian_data(40, 4, 13);
    let weights = Array1::from_shape_fn(40, |i| if i < 10 { 2. } else { 1. });
    let x_dup = concatenate![Axis(0), x, x.slice(s![..10, ..])];
    let y_dup = concatenate![Axis(0), y, y.slice(s![..10])];

    let params = FastNet::gaussian()
        .lambda_values(lambda_grid(20))
        .control(tight_control());
    let weighted = params
        .fit(&GlmData::single(&x, y).with_weights(weights))
        .unwrap();
    let duplicated = params.fit(&GlmData::single(&x_dup, y_dup)).unwrap();

    assert_abs_diff_eq!(
        weighted.coef_path().coefs(),
        duplicated.coef_path().coefs(),
        epsilon = 1e-6
    );
    assert_abs_diff_eq!(
        weighted.coef_path().lambda_values(),
        duplicated.coef_path().lambda_values(),
        epsilon = 1e-10
    );
}

#[test]
fn interpolation_on_the_fitted_path() {
    let (x, y) = gaussian_data(100, 5, 17);
    let model = FastNet::gaussian()
        .nlambda(25)
        .fit(&GlmData::single(&x, y))
        .unwrap();
    let path = model.coef_path();
    let lambdas = path.lambda_values().to_owned();
    let n = lambdas.len();

    let at_fits = model
        .interpolate_coefs(&InterpolationGrid::Lambda(lambdas.clone()))
        .unwrap();
    assert_eq!(at_fits.coefs(), path.coefs());
    assert_eq!(at_fits.intercepts(), path.intercepts());

    let outside = model
        .interpolate_coefs(&InterpolationGrid::Lambda(array![
            lambdas[0] * 10.,
            lambdas[n - 1] / 10.
        ]))
        .unwrap();
    assert_eq!(outside.coefs().index_axis(Axis(0), 0), path.coefs().index_axis(Axis(0), 0));
    assert_eq!(
        outside.coefs().index_axis(Axis(0), 1),
        path.coefs().index_axis(Axis(0), n - 1)
    );

    // halfway on the log scale
    let mid = (lambdas[3] * lambdas[4]).sqrt();
    let between = model
        .interpolate_coefs(&InterpolationGrid::Lambda(array![mid]))
        .unwrap();
    for j in 0..5 {
        let c = between.coefs()[[0, j, 0]];
        let (a, b) = (path.coefs()[[3, j, 0]], path.coefs()[[4, j, 0]]);
        assert_abs_diff_eq!(c, (a + b) / 2., epsilon = 1e-12);
    }
}

#[test]
fn interpolation_grid_option() {
    let (x, y) = gaussian_data(60, 4, 19);
    let grid = array![1., 0.5, 0.1, 0.01];
    let model = FastNet::gaussian()
        .interpolation_grid(InterpolationGrid::Fraction(grid.clone()))
        .fit(&GlmData::single(&x, y))
        .unwrap();

    let lambda_max = model.lambda_max().unwrap();
    assert_abs_diff_eq!(
        model.coef_path().lambda_values(),
        grid * lambda_max,
        epsilon = 1e-12
    );
    assert_eq!(model.coef_path().coefs().shape(), &[4, 4, 1]);
}

#[test]
fn multi_response_predictions_are_padded() {
    let mut rng = Isaac64Rng::seed_from_u64(23);
    let x = Array::<f64, _>::random_using((60, 4), StandardNormal, &mut rng);
    let noise = Array::<f64, _>::random_using((60, 2), StandardNormal, &mut rng);
    let y = x.dot(&array![[2., -1.], [0., 0.], [1., 1.], [0., 0.]]) + noise * 1e-3;

    let model = FastNet::multi_gaussian()
        .fit(&GlmData::new(&x, y))
        .unwrap();
    let path = model.coef_path();
    let nfits = path.nlambda();
    assert!(nfits < 100);
    assert_eq!(path.coefs().shape(), &[nfits, 4, 2]);
    assert!(path.univariate_coefs().is_err());

    // variables enter for both responses at once
    for m in 0..nfits {
        for j in 0..4 {
            assert_eq!(path.coefs()[[m, j, 0]] == 0., path.coefs()[[m, j, 1]] == 0.);
        }
    }

    let design = Design::from(&x);
    let predicted = model
        .predict(&design, None, PredictionType::Link)
        .unwrap();
    assert_eq!(predicted.shape(), &[60, 100, 2]);
    let last = predicted.index_axis(Axis(1), nfits - 1);
    for m in nfits..100 {
        assert_eq!(predicted.index_axis(Axis(1), m), last);
    }

    let direct = x.dot(&path.coefs().index_axis(Axis(0), nfits - 1))
        + &path.intercepts().row(nfits - 1);
    assert_abs_diff_eq!(last, direct, epsilon = 1e-10);
    assert_abs_diff_eq!(
        last,
        x.dot(&array![[2., -1.], [0., 0.], [1., 1.], [0., 0.]]),
        epsilon = 0.5
    );
}

#[test]
fn logistic_regression_path() {
    let mut rng = Isaac64Rng::seed_from_u64(29);
    let x = Array::<f64, _>::random_using((200, 5), StandardNormal, &mut rng);
    let eta = x.dot(&array![1.5, -1., 0., 0., 0.5]);
    let u = Array::<f64, _>::random_using(200, Uniform::new(0., 1.), &mut rng);
    let y = Array1::from_iter(
        eta.iter()
            .zip(u.iter())
            .map(|(e, u)| if *u < 1. / (1. + (-e).exp()) { 1. } else { 0. }),
    );

    let model = FastNet::binomial()
        .nlambda(30)
        .fit(&GlmData::single(&x, y))
        .unwrap();
    let summary = model.summary();
    let nfits = summary.lambda.len();
    assert!(nfits > 5);
    assert_eq!(summary.degrees_of_freedom[0], 0);
    assert!(summary.fraction_deviance_explained[nfits - 1] > 0.1);
    assert!(model.null_deviance() > 0.);

    let coefs = model.coef_path().univariate_coefs().unwrap();
    assert!(coefs[[nfits - 1, 0]] > 0.5);
    assert!(coefs[[nfits - 1, 1]] < -0.3);

    let mu = model
        .predict(&Design::from(&x), None, PredictionType::Response)
        .unwrap();
    assert!(mu.iter().all(|p| *p > 0. && *p < 1.));
    let eta = model
        .predict(&Design::from(&x), None, PredictionType::Link)
        .unwrap();
    assert_abs_diff_eq!(mu, eta.mapv(|e| 1. / (1. + (-e).exp())), epsilon = 1e-12);
}

#[test]
fn poisson_regression_with_exposure() {
    let mut rng = Isaac64Rng::seed_from_u64(31);
    let x = Array::<f64, _>::random_using((150, 3), Uniform::new(-1., 1.), &mut rng);
    let exposure = Array::<f64, _>::random_using(150, Uniform::new(1., 3.), &mut rng);
    let mu = (x.dot(&array![0.8, 0., -0.5]) + exposure.mapv(f64::ln)).mapv(f64::exp);
    let y = mu.mapv(f64::round);
    let offset = exposure.mapv(f64::ln).insert_axis(Axis(1));

    let model = FastNet::poisson()
        .nlambda(20)
        .fit(&GlmData::single(&x, y).with_offset(offset))
        .unwrap();
    let coefs = model.coef_path().univariate_coefs().unwrap();
    let nfits = coefs.nrows();
    assert!(coefs[[nfits - 1, 0]] > 0.4);
    assert!(coefs[[nfits - 1, 2]] < -0.2);
    assert_eq!(model.link(), glmnet::link::Link::Log);
}

#[test]
fn invalid_responses_are_rejected() {
    let x = array![[1., 0.], [0., 1.], [1., 1.]];
    let res = FastNet::binomial().fit(&GlmData::single(&x, array![0., 1., 2.]));
    assert!(matches!(res, Err(GlmnetError::InvalidResponse(_))));

    let res = FastNet::poisson().fit(&GlmData::single(&x, array![0., -1., 2.]));
    assert!(matches!(res, Err(GlmnetError::InvalidResponse(_))));

    let res = FastNet::gaussian().fit(&GlmData::new(&x, Array2::zeros((3, 2))));
    assert!(matches!(res, Err(GlmnetError::MultipleTargets)));

    let res = FastNet::gaussian().fit(&GlmData::single(&x, array![1., 2.]));
    assert!(matches!(res, Err(GlmnetError::ShapeMismatch { .. })));

    let res = FastNet::gaussian().fit(&GlmData::single(&x, array![1., 2., 3.]).with_weights(array![1.]));
    assert!(matches!(res, Err(GlmnetError::ShapeMismatch { .. })));
}

#[test]
fn constant_design_is_a_fatal_solver_error() {
    let x = Array2::<f64>::ones((10, 3));
    let y = Array1::linspace(0., 1., 10);
    match FastNet::gaussian().fit(&GlmData::single(&x, y)) {
        Err(GlmnetError::SolverFatal { code, msg }) => {
            assert_eq!(code, 7777);
            assert!(msg.starts_with("Error code 7777"));
        }
        other => panic!("expected a fatal solver error, got {:?}", other),
    }
}

#[test]
fn exhausted_budget_returns_the_partial_path() {
    let (x, y) = gaussian_data(100, 10, 37);
    let control = FastNetControl {
        maxit: 30,
        ..FastNetControl::default()
    };
    let model = FastNet::gaussian()
        .control(control)
        .fit(&GlmData::single(&x, y))
        .unwrap();

    let note = model.solver_note().expect("budget should run out");
    assert!(note.code < 0);
    assert!(note.msg.contains("maxit=30"));
    assert_eq!(model.coef_path().nlambda(), note.lambda_index - 1);
}

#[test]
fn empty_model_is_returned_with_a_note() {
    let (x, y) = gaussian_data(100, 10, 47);
    let control = FastNetControl {
        maxit: 1,
        ..FastNetControl::default()
    };
    let model = FastNet::gaussian()
        .lambda_values(vec![0.01, 0.001])
        .interpolation_grid(InterpolationGrid::Fraction(array![1., 0.5]))
        .control(control)
        .fit(&GlmData::single(&x, y))
        .unwrap();

    assert_eq!(model.coef_path().nlambda(), 0);
    assert_eq!(model.summary().lambda.len(), 0);
    assert_eq!(model.lambda_max(), None);
    let note = model.solver_note().unwrap();
    assert_eq!(note.code, -1);
    assert_eq!(note.lambda_index, 1);

    let res = model.predict(&Design::from(&x), None, PredictionType::Link);
    assert!(matches!(res, Err(GlmnetError::EmptyLambdaSequence)));
}

#[test]
fn unpenalized_variables_enter_immediately() {
    let (x, y) = gaussian_data(100, 5, 41);
    let model = FastNet::gaussian()
        .penalty_factor(array![1., 1., 0., 1., 1.])
        .fit(&GlmData::single(&x, y))
        .unwrap();
    let coefs = model.coef_path().univariate_coefs().unwrap();
    assert!(coefs.column(2).iter().skip(1).all(|c| *c != 0.));
}

#[test]
fn progress_is_reported_per_lambda() {
    let (x, y) = gaussian_data(50, 4, 43);
    let mut progress = LogProgress::default();
    let model = FastNet::gaussian()
        .nlambda(15)
        .check_unwrap()
        .fit_with_progress(&GlmData::single(&x, y), &mut progress)
        .unwrap();
    assert_eq!(progress.done(), model.coef_path().nlambda());
}
