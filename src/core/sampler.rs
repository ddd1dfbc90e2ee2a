//! Straight-through Gumbel-softmax sampling of new infections.
//!
//! Every agent draws from the two-outcome distribution `{infected, not infected}`. The forward
//! value is the hard one-hot decision of the Gumbel-max trick; the tangent is the one of the
//! relaxed softmax at the sampler's temperature.

use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::{Distribution, Gumbel};

use super::dual::DualArray;
use super::passing::OutcomeProbabilities;
use crate::errors::{DiffJuneError, Result};

pub const DEFAULT_TEMPERATURE: f64 = 0.1;
pub const DEFAULT_EPSILON: f64 = 1e-15;

#[derive(Clone, Debug)]
pub struct InfectionSampler {
    temperature: f64,
    epsilon: f64,
    noise: Gumbel<f64>,
}

impl InfectionSampler {
    pub fn new(temperature: f64, epsilon: f64) -> Result<Self> {
        if !(temperature.is_finite() && temperature > 0.) {
            return Err(DiffJuneError::ParameterError(format!(
                "sampling temperature must be positive, got {temperature}"
            )));
        }
        if !(epsilon > 0. && epsilon < 0.5) {
            return Err(DiffJuneError::ParameterError(format!(
                "probability floor must lie in (0, 0.5), got {epsilon}"
            )));
        }
        let noise = Gumbel::new(0., 1.)
            .map_err(|err| DiffJuneError::ParameterError(format!("{err}")))?;
        Ok(Self {
            temperature,
            epsilon,
            noise,
        })
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Sample the new-infection indicator of every agent.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        probabilities: &OutcomeProbabilities,
        rng: &mut R,
    ) -> DualArray {
        let OutcomeProbabilities {
            infected,
            not_infected,
        } = probabilities;
        let n_agents = not_infected.len();
        let mut value = Array1::zeros(n_agents);
        let mut tangent = Array2::zeros((n_agents, not_infected.n_params()));

        for agent in 0..n_agents {
            let (log_infected, d_infected) = self.floored_log(infected.value[agent]);
            let (log_not_infected, d_not_infected) = self.floored_log(not_infected.value[agent]);

            let gumbel_infected = self.noise.sample(rng);
            let gumbel_not_infected = self.noise.sample(rng);

            // softmax over two classes reduces to a sigmoid of the logit difference
            let z = ((log_infected + gumbel_infected) - (log_not_infected + gumbel_not_infected))
                / self.temperature;
            value[agent] = if z > 0. { 1. } else { 0. };

            let slope = sigmoid_derivative(z) / self.temperature;
            let mut row = tangent.row_mut(agent);
            row.scaled_add(slope * d_infected, &infected.tangent.row(agent));
            row.scaled_add(-slope * d_not_infected, &not_infected.tangent.row(agent));
        }

        DualArray { value, tangent }
    }

    /// `ln(max(p, epsilon))` and its derivative with respect to `p`.
    fn floored_log(&self, probability: f64) -> (f64, f64) {
        if probability > self.epsilon {
            (probability.ln(), 1. / probability)
        } else {
            (self.epsilon.ln(), 0.)
        }
    }
}

/// `s(z) * (1 - s(z))` without cancellation for large `|z|`.
fn sigmoid_derivative(z: f64) -> f64 {
    let e = (-z.abs()).exp();
    e / ((1. + e) * (1. + e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Outcome probabilities with `not_infected` as the single parameter.
    fn probabilities(values: Vec<f64>) -> OutcomeProbabilities {
        let mut not_infected = DualArray::constant(Array1::from(values), 1);
        not_infected.tangent.fill(1.);
        let infected = not_infected.complement();
        OutcomeProbabilities {
            infected,
            not_infected,
        }
    }

    #[test]
    fn outputs_are_hard() {
        let sampler = InfectionSampler::new(DEFAULT_TEMPERATURE, DEFAULT_EPSILON).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let sample = sampler.sample(&probabilities(vec![0.5; 200]), &mut rng);
        assert!(sample.value.iter().all(|&v| v == 0. || v == 1.));
        let infected = sample.value.sum();
        assert!(infected > 50. && infected < 150.);
    }

    #[test]
    fn certain_outcomes() {
        let sampler = InfectionSampler::new(DEFAULT_TEMPERATURE, DEFAULT_EPSILON).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let sample = sampler.sample(&probabilities(vec![1.; 100]), &mut rng);
        assert_eq!(sample.value.sum(), 0.);
        let sample = sampler.sample(&probabilities(vec![0.; 100]), &mut rng);
        assert_eq!(sample.value.sum(), 100.);
    }

    #[test]
    fn gradient_points_against_safety() {
        // a larger probability to stay uninfected can only lower the relaxed infection
        let sampler = InfectionSampler::new(1., DEFAULT_EPSILON).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let sample = sampler.sample(&probabilities(vec![0.3, 0.6, 0.9]), &mut rng);
        assert!(sample.tangent.iter().all(|&d| d < 0.));
    }

    #[test]
    fn relaxed_tangent_matches_sigmoid() {
        let sampler = InfectionSampler::new(0.5, DEFAULT_EPSILON).unwrap();
        let p: f64 = 0.4;
        let mut rng = StdRng::seed_from_u64(13);
        let mut replay = rng.clone();
        let sample = sampler.sample(&probabilities(vec![p]), &mut rng);

        let noise = Gumbel::new(0., 1.).unwrap();
        let g_infected: f64 = noise.sample(&mut replay);
        let g_not_infected: f64 = noise.sample(&mut replay);
        let relaxed = |p: f64| {
            let z = ((1. - p).ln() + g_infected - p.ln() - g_not_infected) / 0.5;
            1. / (1. + (-z).exp())
        };

        let h = 1e-7;
        let numeric = (relaxed(p + h) - relaxed(p - h)) / (2. * h);
        approx::assert_relative_eq!(sample.tangent[[0, 0]], numeric, max_relative = 1e-5);
        assert_eq!(sample.value[0], relaxed(p).round());
    }

    #[test]
    fn floored_probabilities_do_not_explode() {
        let sampler = InfectionSampler::new(DEFAULT_TEMPERATURE, DEFAULT_EPSILON).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let sample = sampler.sample(&probabilities(vec![1., 0.]), &mut rng);
        assert!(sample.tangent.iter().all(|d| d.is_finite()));
    }

    #[test]
    fn rare_infections_keep_their_gradient() {
        // 1 - 1e-20 rounds to 1, the infection probability must not be recovered from it
        let sampler = InfectionSampler::new(1., 1e-30).unwrap();
        let mut rng = StdRng::seed_from_u64(17);
        let probabilities = OutcomeProbabilities {
            infected: DualArray {
                value: Array1::from(vec![1e-20]),
                tangent: Array2::from_elem((1, 1), 1e-20),
            },
            not_infected: DualArray {
                value: Array1::from(vec![1.]),
                tangent: Array2::from_elem((1, 1), -1e-20),
            },
        };
        let sample = sampler.sample(&probabilities, &mut rng);
        assert_eq!(sample.value[0], 0.);
        assert!(sample.tangent[[0, 0]] > 0.);
    }

    #[test]
    fn sigmoid_derivative_keeps_tails() {
        assert!(sigmoid_derivative(300.) > 0.);
        assert!(sigmoid_derivative(-300.) > 0.);
        assert_eq!(sigmoid_derivative(0.), 0.25);
    }

    #[test]
    fn invalid_settings_fail() {
        assert!(InfectionSampler::new(0., DEFAULT_EPSILON).is_err());
        assert!(InfectionSampler::new(0.1, 0.).is_err());
    }
}
