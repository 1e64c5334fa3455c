// DragonSim: BGP Network Simulator with DRAGON route aggregation written in Rust
// Copyright (C) 2022-2023 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Module containing the delay distributions used for link and processing delays.

use crate::types::ConfigError;

use rand::prelude::*;
use rand_distr::{Distribution, Exp, Normal, Pareto, Weibull};
use serde::{Deserialize, Serialize};

/// Delay distribution in seconds. Sampled values are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Delay {
    /// Always the same value.
    Deterministic {
        /// The delay
        value: f64,
    },
    /// Uniformly distributed in `[low, high]`.
    Uniform {
        /// Lower bound
        low: f64,
        /// Upper bound
        high: f64,
    },
    /// Normal distribution
    Normal {
        /// Mean
        mean: f64,
        /// Standard deviation
        std_dev: f64,
    },
    /// Exponential distribution
    Exponential {
        /// Rate parameter
        lambda: f64,
    },
    /// Pareto distribution with scale 1.
    Pareto {
        /// Shape parameter
        alpha: f64,
    },
    /// Weibull distribution
    Weibull {
        /// Scale parameter
        alpha: f64,
        /// Shape parameter
        beta: f64,
    },
}

impl Delay {
    /// Default link delay, uniformly distributed between 10ms and 100ms.
    pub const DEFAULT_LINK: Delay = Delay::Uniform {
        low: 0.01,
        high: 0.1,
    };

    /// Default processing delay, uniformly distributed between 1ms and 10ms.
    pub const DEFAULT_PROCESSING: Delay = Delay::Uniform {
        low: 0.001,
        high: 0.01,
    };

    /// Parse a distribution from its textual form, like `uniform 0.01 0.1`.
    pub fn parse(args: &[&str]) -> Result<Self, ConfigError> {
        let (name, params) = args
            .split_first()
            .ok_or(ConfigError::MissingArgument("delay distribution"))?;
        let params = params
            .iter()
            .map(|x| {
                x.parse::<f64>()
                    .map_err(|_| ConfigError::InvalidNumber(x.to_string()))
            })
            .collect::<Result<Vec<f64>, ConfigError>>()?;
        let arg = |i: usize| -> Result<f64, ConfigError> {
            params
                .get(i)
                .copied()
                .ok_or_else(|| ConfigError::InvalidDistribution(name.to_string()))
        };
        let delay = match *name {
            "deterministic" => Self::Deterministic { value: arg(0)? },
            "uniform" => Self::Uniform {
                low: arg(0)?,
                high: arg(1)?,
            },
            "normal" => Self::Normal {
                mean: arg(0)?,
                std_dev: arg(1)?,
            },
            "exponential" => Self::Exponential { lambda: arg(0)? },
            "pareto" => Self::Pareto { alpha: arg(0)? },
            "weibull" => Self::Weibull {
                alpha: arg(0)?,
                beta: arg(1)?,
            },
            x => return Err(ConfigError::UnsupportedDistribution(x.to_string())),
        };
        delay.validate()?;
        Ok(delay)
    }

    /// Check that the parameters describe a valid distribution.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid = match *self {
            Self::Deterministic { value } => value.is_finite(),
            Self::Uniform { low, high } => low.is_finite() && high.is_finite() && low <= high,
            Self::Normal { mean, std_dev } => Normal::new(mean, std_dev).is_ok(),
            Self::Exponential { lambda } => Exp::new(lambda).is_ok(),
            Self::Pareto { alpha } => Pareto::new(1.0, alpha).is_ok(),
            Self::Weibull { alpha, beta } => Weibull::new(alpha, beta).is_ok(),
        };
        if valid {
            Ok(())
        } else {
            Err(ConfigError::InvalidDistribution(self.name().to_string()))
        }
    }

    /// Name of the distribution
    pub fn name(&self) -> &'static str {
        match self {
            Self::Deterministic { .. } => "deterministic",
            Self::Uniform { .. } => "uniform",
            Self::Normal { .. } => "normal",
            Self::Exponential { .. } => "exponential",
            Self::Pareto { .. } => "pareto",
            Self::Weibull { .. } => "weibull",
        }
    }

    /// Draw a sample from the distribution. Negative samples are clamped to zero, and invalid
    /// parameters yield zero.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        let x = match *self {
            Self::Deterministic { value } => value,
            Self::Uniform { low, high } if low < high => rng.gen_range(low..high),
            Self::Uniform { low, .. } => low,
            Self::Normal { mean, std_dev } => {
                Normal::new(mean, std_dev).map_or(mean, |d| d.sample(rng))
            }
            Self::Exponential { lambda } => Exp::new(lambda).map_or(0.0, |d| d.sample(rng)),
            Self::Pareto { alpha } => Pareto::new(1.0, alpha).map_or(0.0, |d| d.sample(rng)),
            Self::Weibull { alpha, beta } => {
                Weibull::new(alpha, beta).map_or(0.0, |d| d.sample(rng))
            }
        };
        if x.is_finite() {
            x.max(0.0)
        } else {
            0.0
        }
    }
}

impl std::fmt::Display for Delay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deterministic { value } => write!(f, "deterministic {value}"),
            Self::Uniform { low, high } => write!(f, "uniform {low} {high}"),
            Self::Normal { mean, std_dev } => write!(f, "normal {mean} {std_dev}"),
            Self::Exponential { lambda } => write!(f, "exponential {lambda}"),
            Self::Pareto { alpha } => write!(f, "pareto {alpha}"),
            Self::Weibull { alpha, beta } => write!(f, "weibull {alpha} {beta}"),
        }
    }
}

/// Create a random number generator whose seed only depends on the name of the entity (router,
/// session or link) and on the randomization key of the run.
pub fn seeded_rng(entity: &str, key: &str) -> StdRng {
    // FNV-1a
    let seed = entity
        .bytes()
        .chain(key.bytes())
        .fold(0xcbf29ce484222325u64, |h, b| {
            (h ^ b as u64).wrapping_mul(0x100000001b3)
        });
    StdRng::seed_from_u64(seed)
}

/// Parse a bandwidth like `100M`, `10k` or `1G` into bits per second.
pub fn parse_bandwidth(s: &str) -> Result<f64, ConfigError> {
    let (num, factor) = match s.chars().last() {
        Some('M' | 'm') => (&s[..s.len() - 1], 1e6),
        Some('K' | 'k') => (&s[..s.len() - 1], 1e3),
        Some('G' | 'g') => (&s[..s.len() - 1], 1e9),
        _ => (s, 1.0),
    };
    num.parse::<f64>()
        .map(|x| x * factor)
        .map_err(|_| ConfigError::InvalidNumber(s.to_string()))
}
