// Fixed 3×3 convolution kernels and the closed set of filter names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HaloError;

// ── Kernel ────────────────────────────────────────────────────────────────────

/// Immutable 3×3 weight grid, indexed `weights[row][col]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kernel {
    pub weights: [[f32; 3]; 3],
}

impl Kernel {
    pub const fn new(weights: [[f32; 3]; 3]) -> Self {
        Self { weights }
    }
}

pub const SMOOTH: Kernel = Kernel::new([
    [1.0 / 9.0, 1.0 / 9.0, 1.0 / 9.0],
    [1.0 / 9.0, 1.0 / 9.0, 1.0 / 9.0],
    [1.0 / 9.0, 1.0 / 9.0, 1.0 / 9.0],
]);

pub const BLUR: Kernel = Kernel::new([
    [1.0 / 16.0, 2.0 / 16.0, 1.0 / 16.0],
    [2.0 / 16.0, 4.0 / 16.0, 2.0 / 16.0],
    [1.0 / 16.0, 2.0 / 16.0, 1.0 / 16.0],
]);

pub const SHARPEN: Kernel = Kernel::new([
    [0.0 / 3.0, -2.0 / 3.0, 0.0 / 3.0],
    [-2.0 / 3.0, 11.0 / 3.0, -2.0 / 3.0],
    [0.0 / 3.0, -2.0 / 3.0, 0.0 / 3.0],
]);

pub const MEAN: Kernel = Kernel::new([
    [-1.0, -1.0, -1.0],
    [-1.0, 9.0, -1.0],
    [-1.0, -1.0, -1.0],
]);

pub const EMBOSS: Kernel = Kernel::new([
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0],
    [0.0, -1.0, 0.0],
]);

// ── Filter kind ───────────────────────────────────────────────────────────────

/// Named filter selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Smooth,
    Blur,
    Sharpen,
    Mean,
    Emboss,
}

impl FilterKind {
    pub const ALL: [FilterKind; 5] = [
        Self::Smooth,
        Self::Blur,
        Self::Sharpen,
        Self::Mean,
        Self::Emboss,
    ];

    pub fn kernel(&self) -> &'static Kernel {
        match self {
            Self::Smooth  => &SMOOTH,
            Self::Blur    => &BLUR,
            Self::Sharpen => &SHARPEN,
            Self::Mean    => &MEAN,
            Self::Emboss  => &EMBOSS,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Smooth  => "smooth",
            Self::Blur    => "blur",
            Self::Sharpen => "sharpen",
            Self::Mean    => "mean",
            Self::Emboss  => "emboss",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = HaloError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| HaloError::UnknownFilter(s.to_string()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
