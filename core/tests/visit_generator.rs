//! Poisson calibration: empirical mean and variance of both samplers
//! converge to the rate.

use plansim_core::{
    rng::RngBank,
    visits::{KnuthSampler, PoissonSampler, VisitGenerator, VisitRate},
};

const DRAWS: usize = 20_000;
const RATES: [f64; 5] = [0.0, 0.2, 1.0, 5.0, 12.0];

fn moments(generator: &dyn VisitGenerator, rate: f64, seed: u64) -> (f64, f64) {
    let mut rng = RngBank::new(seed).for_user(1);
    let rate = VisitRate::new("test", rate).unwrap();
    let draws: Vec<f64> = (0..DRAWS)
        .map(|_| generator.sample(rate, &mut rng) as f64)
        .collect();
    let mean = draws.iter().sum::<f64>() / DRAWS as f64;
    let var = draws.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (DRAWS - 1) as f64;
    (mean, var)
}

fn assert_calibrated(generator: &dyn VisitGenerator, seed: u64) {
    for rate in RATES {
        let (mean, var) = moments(generator, rate, seed);
        // 6 standard errors of the mean, and of the sample variance.
        let mean_tol = 6.0 * (rate / DRAWS as f64).sqrt() + 1e-12;
        let var_tol = 6.0 * ((rate + 2.0 * rate * rate) / DRAWS as f64).sqrt() + 1e-12;
        assert!(
            (mean - rate).abs() <= mean_tol,
            "{}: mean {mean:.4} too far from λ={rate} (tol {mean_tol:.4})",
            generator.name()
        );
        assert!(
            (var - rate).abs() <= var_tol,
            "{}: variance {var:.4} too far from λ={rate} (tol {var_tol:.4})",
            generator.name()
        );
    }
}

#[test]
fn poisson_sampler_is_calibrated() {
    assert_calibrated(&PoissonSampler, 11);
}

#[test]
fn knuth_sampler_is_calibrated() {
    assert_calibrated(&KnuthSampler, 13);
}

#[test]
fn samplers_agree_on_distribution_not_bits() {
    let (ma, _) = moments(&PoissonSampler, 5.0, 17);
    let (mb, _) = moments(&KnuthSampler, 5.0, 17);
    assert!((ma - mb).abs() < 0.15, "sampler means differ: {ma:.3} vs {mb:.3}");
}
