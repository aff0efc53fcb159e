use crate::error::{TransportError, TransportResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate axis used as the depth direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    #[default]
    Z,
}

impl Axis {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Energy deposited per depth bin: the data behind a Bragg curve.
///
/// Depth is the coordinate along `axis`. Bin `i` covers
/// `[i * bin_width, (i + 1) * bin_width)` mm. Deposits at negative depth or
/// beyond the last bin are summed in `outside` so the tally total always
/// matches the energy scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthDoseTally {
    pub axis: Axis,
    /// Bin width in mm
    pub bin_width: f64,
    /// Deposited energy per bin, MeV
    bins: Vec<f64>,
    /// Energy deposited outside the binned range, MeV
    outside: f64,
}

impl DepthDoseTally {
    pub fn new(axis: Axis, bin_width: f64, n_bins: usize) -> TransportResult<Self> {
        if !bin_width.is_finite() || bin_width <= 0.0 {
            return Err(TransportError::invalid(format!(
                "depth-dose bin width must be finite and positive, got {}",
                bin_width
            )));
        }
        if n_bins == 0 {
            return Err(TransportError::invalid("depth-dose tally needs at least one bin"));
        }
        Ok(Self {
            axis,
            bin_width,
            bins: vec![0.0; n_bins],
            outside: 0.0,
        })
    }

    /// Bin index for a depth in mm, `None` outside the binned range
    pub fn get_bin(&self, depth: f64) -> Option<usize> {
        let index = (depth / self.bin_width).floor();
        if index >= 0.0 && index < self.bins.len() as f64 {
            Some(index as usize)
        } else {
            None
        }
    }

    /// Score `energy` MeV deposited at `depth` mm
    pub fn score(&mut self, depth: f64, energy: f64) {
        match self.get_bin(depth) {
            Some(i) => self.bins[i] += energy,
            None => self.outside += energy,
        }
    }

    /// Score the energy lost over one step, attributed to the step's
    /// starting position.
    pub fn score_step(&mut self, start: [f64; 3], energy: f64) {
        self.score(start[self.axis.index()], energy);
    }

    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    pub fn outside(&self) -> f64 {
        self.outside
    }

    /// Centre depth of every bin, mm
    pub fn depths(&self) -> Vec<f64> {
        (0..self.bins.len())
            .map(|i| (i as f64 + 0.5) * self.bin_width)
            .collect()
    }

    /// Total energy scored, in or out of range
    pub fn total(&self) -> f64 {
        self.bins.iter().sum::<f64>() + self.outside
    }

    /// Depth (bin centre) and energy of the fullest bin.
    ///
    /// `None` while nothing has been scored in range.
    pub fn bragg_peak(&self) -> Option<(f64, f64)> {
        let (index, energy) = self
            .bins
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, &e)| match best {
                Some((_, b)) if b >= e => best,
                _ => Some((i, e)),
            })?;
        (energy > 0.0).then(|| ((index as f64 + 0.5) * self.bin_width, energy))
    }

    /// Add another tally with the same binning into this one.
    pub fn merge(&mut self, other: &DepthDoseTally) -> TransportResult<()> {
        if other.axis != self.axis || other.bin_width != self.bin_width || other.bins.len() != self.bins.len() {
            return Err(TransportError::invalid(
                "cannot merge depth-dose tallies with different binning",
            ));
        }
        for (mine, theirs) in self.bins.iter_mut().zip(&other.bins) {
            *mine += theirs;
        }
        self.outside += other.outside;
        Ok(())
    }

    /// Same binning, zeroed contents
    pub fn empty_like(&self) -> Self {
        Self {
            axis: self.axis,
            bin_width: self.bin_width,
            bins: vec![0.0; self.bins.len()],
            outside: 0.0,
        }
    }
}

impl fmt::Display for DepthDoseTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Depth-dose tally along {:?}", self.axis)?;
        writeln!(f, "  Bins: {} x {} mm", self.bins.len(), self.bin_width)?;
        writeln!(f, "  Total deposited: {:.6} MeV", self.total())?;
        writeln!(f, "  Outside range: {:.6} MeV", self.outside)?;
        match self.bragg_peak() {
            Some((depth, energy)) => write!(f, "  Bragg peak: {:.3} MeV at {:.3} mm", energy, depth),
            None => write!(f, "  Bragg peak: none"),
        }
    }
}
