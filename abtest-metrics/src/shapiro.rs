//! Royston's approximation of the Shapiro-Wilk coefficients and p-value
//! (Applied Statistics algorithm AS R94).

use abtest_core::Result;
use statrs::distribution::ContinuousCDF;

use crate::statistical::standard_normal;

// Polynomial coefficients, lowest order first
const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &ci| acc * x + ci)
}

/// Coefficients a_1..a_{n/2} applied to x_(n+1-i) - x_(i). Requires n >= 4.
pub(crate) fn coefficients(n: usize) -> Result<Vec<f64>> {
    let normal = standard_normal()?;
    let half = n / 2;
    let nf = n as f64;

    // Blom scores of the lower half of the expected normal order statistics
    let m: Vec<f64> = (1..=half)
        .map(|i| normal.inverse_cdf((i as f64 - 0.375) / (nf + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / nf.sqrt();

    let a1 = poly(&C1, rsn) - m[0] / ssumm2;
    let mut a = vec![0.0; half];

    if n <= 5 {
        let fac = ((summ2 - 2.0 * m[0] * m[0]) / (1.0 - 2.0 * a1 * a1)).sqrt();
        a[0] = a1;
        for i in 1..half {
            a[i] = -m[i] / fac;
        }
    } else {
        let a2 = poly(&C2, rsn) - m[1] / ssumm2;
        let fac = ((summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1])
            / (1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2))
            .sqrt();
        a[0] = a1;
        a[1] = a2;
        for i in 2..half {
            a[i] = -m[i] / fac;
        }
    }

    Ok(a)
}

/// W statistic of ascending-sorted, non-constant data
pub(crate) fn w_statistic(sorted: &[f64], a: &[f64]) -> f64 {
    let n = sorted.len();
    let numerator: f64 = a
        .iter()
        .enumerate()
        .map(|(i, ai)| ai * (sorted[n - 1 - i] - sorted[i]))
        .sum();

    let mean = sorted.iter().sum::<f64>() / n as f64;
    let ss: f64 = sorted.iter().map(|x| (x - mean).powi(2)).sum();

    numerator * numerator / ss
}

/// Upper-tail p-value of W via Royston's normalising transformation
pub(crate) fn p_value(w: f64, n: usize) -> Result<f64> {
    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return Ok(1.0);
    }

    let nf = n as f64;
    let y = w1.ln();

    let z = if n <= 11 {
        let gamma = poly(&G, nf);
        if y >= gamma {
            return Ok(0.0);
        }
        let y = -(gamma - y).ln();
        (y - poly(&C3, nf)) / poly(&C4, nf).exp()
    } else {
        let ln_n = nf.ln();
        (y - poly(&C5, ln_n)) / poly(&C6, ln_n).exp()
    };

    Ok(standard_normal()?.sf(z))
}
