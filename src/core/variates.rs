use super::types::Tick;
use rand::Rng;
use rand_distr::{Distribution, Exp};

/// How customer service durations are sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum ServiceTimeModel {
    /// Correct negative-exponential sampling: inverse-CDF `-mean * ln(1 - u)`,
    /// drawn through [`rand_distr::Exp`]. Samples have the configured mean and
    /// the full exponential spread.
    #[default]
    Exponential,
    /// The legacy transform `mean * (1 - u * (1 - e^(-mean)))`.
    ///
    /// This is NOT an exponential inverse-CDF: for any realistic mean the
    /// `e^(-mean)` term vanishes and the result is uniform on `(0, mean]`,
    /// biased toward `mean` instead of exponentially spread. Kept so runs
    /// recorded under the legacy sampler stay reproducible.
    LegacyBiased,
}

/// Uniformly-distributed value in `[0, 1)`.
pub fn uniform<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen::<f64>()
}

/// Poisson-distributed count with the given mean.
///
/// Small means use Knuth's direct-multiplication method; means of 30 and
/// above switch to a ratio-of-uniforms rejection sampler whose accept test
/// compares a log-acceptance bound against `ln Γ`. Both branches converge to
/// mean == variance == `mean` over large sample counts.
pub fn poisson<R: Rng + ?Sized>(rng: &mut R, mean: f64) -> u64 {
    if mean < 30.0 {
        poisson_small(rng, mean)
    } else {
        poisson_large(rng, mean)
    }
}

/// Knuth's 1969 algorithm: multiply uniforms until the product drops below
/// `e^(-mean)`. O(mean) draws per sample, fine for small means.
fn poisson_small<R: Rng + ?Sized>(rng: &mut R, mean: f64) -> u64 {
    let limit = (-mean).exp();
    let mut product = 1.0;
    let mut count: u64 = 0;
    loop {
        count += 1;
        product *= rng.gen::<f64>();
        if product <= limit {
            return count - 1;
        }
    }
}

/// Rejection sampler for large means, after the transformed-rejection scheme
/// in Atkinson via johndcook.com's Poisson notes.
fn poisson_large<R: Rng + ?Sized>(rng: &mut R, mean: f64) -> u64 {
    let c = 0.767 - 3.36 / mean;
    let beta = std::f64::consts::PI / (3.0 * mean).sqrt();
    let alpha = beta * mean;
    let k = c.ln() - mean - beta.ln();

    loop {
        let u = rng.gen::<f64>();
        let x = (alpha - ((1.0 - u) / u).ln()) / beta;
        let n = (x + 0.5).floor();
        if n < 0.0 {
            continue;
        }
        let v = rng.gen::<f64>();
        let y = alpha - beta * x;
        let temp = 1.0 + y.exp();
        let lhs = y + (v / (temp * temp)).ln();
        // ln(n!) == ln Γ(n + 1)
        let rhs = k + n * mean.ln() - ln_gamma(n + 1.0);
        if lhs <= rhs {
            return n as u64;
        }
    }
}

/// Stirling-series approximation of `ln Γ(z)` for z > 0.
///
/// Arguments below 10 are shifted up through `Γ(z + 1) = z Γ(z)` first, which
/// keeps the truncated series well inside the precision this sampler needs.
fn ln_gamma(mut z: f64) -> f64 {
    let mut shift = 0.0;
    while z < 10.0 {
        shift -= z.ln();
        z += 1.0;
    }
    let inv = 1.0 / z;
    let inv2 = inv * inv;
    (z - 0.5) * z.ln() - z + 0.5 * (2.0 * std::f64::consts::PI).ln()
        + inv * (1.0 / 12.0 - inv2 * (1.0 / 360.0 - inv2 / 1260.0))
        + shift
}

/// Sample one customer's service duration with the given expected mean.
///
/// The statistical shape depends on `model`; see [`ServiceTimeModel`] for the
/// known defect in the legacy transform and why both are offered. `mean`
/// must be positive, which [`SimulationConfig`](super::config::SimulationConfig)
/// validation guarantees.
pub fn service_duration<R: Rng + ?Sized>(rng: &mut R, mean: Tick, model: ServiceTimeModel) -> Tick {
    let mean = mean as f64;
    let sample = match model {
        ServiceTimeModel::Exponential => {
            let exp = Exp::new(1.0 / mean).expect("config validation rejects a zero mean");
            exp.sample(rng)
        }
        ServiceTimeModel::LegacyBiased => {
            let u = uniform(rng);
            mean * (1.0 - u * (1.0 - (-mean).exp()))
        }
    };
    sample.round() as Tick
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn mean_and_variance(samples: &[f64]) -> (f64, f64) {
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        (mean, variance)
    }

    #[test]
    fn uniform_stays_in_unit_interval() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let u = uniform(&mut rng);
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn poisson_small_branch_matches_mean_and_variance() {
        let mut rng = StdRng::seed_from_u64(11);
        let target = 5.0;
        let samples: Vec<f64> = (0..50_000)
            .map(|_| poisson(&mut rng, target) as f64)
            .collect();
        let (mean, variance) = mean_and_variance(&samples);
        assert!((mean - target).abs() < 0.05 * target, "mean {}", mean);
        assert!(
            (variance - target).abs() < 0.05 * target,
            "variance {}",
            variance
        );
    }

    #[test]
    fn poisson_large_branch_matches_mean_and_variance() {
        let mut rng = StdRng::seed_from_u64(13);
        let target = 100.0;
        let samples: Vec<f64> = (0..50_000)
            .map(|_| poisson(&mut rng, target) as f64)
            .collect();
        let (mean, variance) = mean_and_variance(&samples);
        assert!((mean - target).abs() < 0.05 * target, "mean {}", mean);
        assert!(
            (variance - target).abs() < 0.05 * target,
            "variance {}",
            variance
        );
    }

    #[test]
    fn poisson_of_zero_mean_is_always_zero() {
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..100 {
            assert_eq!(poisson(&mut rng, 0.0), 0);
        }
    }

    #[test]
    fn ln_gamma_matches_known_factorials() {
        // ln Γ(n + 1) == ln(n!)
        let cases = [
            (1.0, 0.0),
            (2.0, 0.0),
            (5.0, 24.0f64.ln()),
            (11.0, 3_628_800.0f64.ln()),
        ];
        for (z, expected) in cases {
            assert!((ln_gamma(z) - expected).abs() < 1e-6, "ln_gamma({})", z);
        }
    }

    #[test]
    fn exponential_service_times_average_to_the_mean() {
        let mut rng = StdRng::seed_from_u64(19);
        let mean: Tick = 375;
        let total: u64 = (0..50_000)
            .map(|_| service_duration(&mut rng, mean, ServiceTimeModel::Exponential))
            .sum();
        let empirical = total as f64 / 50_000.0;
        assert!((empirical - mean as f64).abs() < 0.05 * mean as f64);
    }

    #[test]
    fn legacy_service_times_stay_in_the_biased_range() {
        let mut rng = StdRng::seed_from_u64(23);
        let mean: Tick = 375;
        for _ in 0..10_000 {
            let sample = service_duration(&mut rng, mean, ServiceTimeModel::LegacyBiased);
            assert!(sample <= mean);
        }
    }
}
