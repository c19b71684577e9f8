//! Derivative-free minimisation for model parameter estimation

use serde::{Deserialize, Serialize};

/// Settings for the Nelder-Mead simplex search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NelderMeadConfig {
    /// Maximum number of simplex iterations
    pub max_iter: usize,
    /// Stop once the spread of objective values across the simplex drops below this
    pub tolerance: f64,
    /// Reflection coefficient
    pub alpha: f64,
    /// Expansion coefficient
    pub gamma: f64,
    /// Contraction coefficient
    pub rho: f64,
    /// Shrink coefficient
    pub sigma: f64,
    /// Relative size of the initial simplex
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 2000,
            tolerance: 1e-10,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Outcome of a simplex search
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// Best point found
    pub optimal_point: Vec<f64>,
    /// Objective value at `optimal_point`
    pub optimal_value: f64,
    /// Iterations performed
    pub iterations: usize,
    /// Whether the tolerance was reached before `max_iter`
    pub converged: bool,
}

/// Minimise `objective` starting from `initial`.
///
/// `bounds`, when given, holds one `(min, max)` pair per dimension and every
/// trial point is clamped into the box before evaluation. Non-finite objective
/// values are treated as `+inf` so the simplex moves away from them.
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    let eval = |point: &[f64]| {
        let value = objective(point);
        if value.is_finite() {
            value
        } else {
            f64::INFINITY
        }
    };

    if n == 0 {
        return NelderMeadResult {
            optimal_point: Vec::new(),
            optimal_value: eval(initial),
            iterations: 0,
            converged: true,
        };
    }

    let start = clamp(initial, bounds);
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(start.clone());
    for i in 0..n {
        let mut vertex = start.clone();
        let step = if vertex[i].abs() > 1e-8 {
            config.initial_step * vertex[i].abs()
        } else {
            config.initial_step
        };
        vertex[i] += step;
        let vertex = clamp(&vertex, bounds);
        // a vertex clamped back onto the start would collapse the simplex
        let vertex = if vertex == start {
            let mut flipped = start.clone();
            flipped[i] -= step;
            clamp(&flipped, bounds)
        } else {
            vertex
        };
        simplex.push(vertex);
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        let best = order[0];
        let worst = order[n];
        let second_worst = order[n - 1];

        if (values[worst] - values[best]).abs() < config.tolerance
            || (values[worst].is_infinite() && values[best].is_infinite())
        {
            converged = values[best].is_finite();
            break;
        }

        let centroid = centroid_excluding(&simplex, worst);

        let reflected = clamp(&blend(&centroid, &simplex[worst], -config.alpha), bounds);
        let reflected_value = eval(&reflected);

        if reflected_value < values[best] {
            let expanded = clamp(&blend(&centroid, &reflected, config.gamma), bounds);
            let expanded_value = eval(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        if reflected_value < values[second_worst] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        let (contracted, contracted_value) = if reflected_value < values[worst] {
            let point = clamp(&blend(&centroid, &reflected, config.rho), bounds);
            let value = eval(&point);
            (point, value)
        } else {
            let point = clamp(&blend(&centroid, &simplex[worst], config.rho), bounds);
            let value = eval(&point);
            (point, value)
        };

        if contracted_value < values[worst].min(reflected_value) {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        // shrink toward the best vertex
        let anchor = simplex[best].clone();
        for i in 0..=n {
            if i == best {
                continue;
            }
            let shrunk = clamp(&blend(&anchor, &simplex[i], config.sigma), bounds);
            values[i] = eval(&shrunk);
            simplex[i] = shrunk;
        }
    }

    let best = (0..=n)
        .min_by(|&a, &b| values[a].total_cmp(&values[b]))
        .unwrap_or(0);

    NelderMeadResult {
        optimal_point: simplex[best].clone(),
        optimal_value: values[best],
        iterations,
        converged,
    }
}

/// `origin + factor * (target - origin)`
fn blend(origin: &[f64], target: &[f64], factor: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(target)
        .map(|(o, t)| o + factor * (t - o))
        .collect()
}

fn centroid_excluding(simplex: &[Vec<f64>], excluded: usize) -> Vec<f64> {
    let n = simplex[0].len();
    let count = (simplex.len() - 1) as f64;
    let mut centroid = vec![0.0; n];
    for (i, vertex) in simplex.iter().enumerate() {
        if i == excluded {
            continue;
        }
        for (c, v) in centroid.iter_mut().zip(vertex) {
            *c += v;
        }
    }
    centroid.iter_mut().for_each(|c| *c /= count);
    centroid
}

fn clamp(point: &[f64], bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    match bounds {
        Some(bounds) => point
            .iter()
            .zip(bounds)
            .map(|(&x, &(lo, hi))| x.max(lo).min(hi))
            .collect(),
        None => point.to_vec(),
    }
}
