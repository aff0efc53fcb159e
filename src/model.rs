use crate::error::TransportResult;
use crate::geometry::Geometry;
use crate::particle::Particle;
use crate::settings::Settings;
use crate::stepper::Stepper;
use crate::tally::DepthDoseTally;
use rand::Rng;
use rand_pcg::Pcg64;
use rayon::prelude::*;
use serde::Serialize;

/// How a history ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HistoryFate {
    /// All kinetic energy was deposited
    Stopped,
    /// Left the voxel grid while `kill_on_exit` was set
    Escaped,
    /// Still alive after `max_steps` steps
    StepBudgetExhausted,
}

/// Outcome of transporting one source particle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    pub index: usize,
    pub fate: HistoryFate,
    pub steps: usize,
    pub initial_energy: f64,
    pub deposited_energy: f64,
    pub final_position: [f64; 3],
    pub track_length: f64,
}

/// Results of [`Model::run`], histories in source order
#[derive(Debug, Clone, Serialize)]
pub struct RunResults {
    pub histories: Vec<HistorySummary>,
    pub depth_dose: Option<DepthDoseTally>,
}

impl RunResults {
    pub fn total_deposited(&self) -> f64 {
        self.histories.iter().map(|h| h.deposited_energy).sum()
    }

    pub fn count(&self, fate: HistoryFate) -> usize {
        self.histories.iter().filter(|h| h.fate == fate).count()
    }

    /// Mean path length of the histories that stopped, mm
    pub fn mean_stopped_track_length(&self) -> Option<f64> {
        let stopped: Vec<f64> = self
            .histories
            .iter()
            .filter(|h| h.fate == HistoryFate::Stopped)
            .map(|h| h.track_length)
            .collect();
        if stopped.is_empty() {
            None
        } else {
            Some(stopped.iter().sum::<f64>() / stopped.len() as f64)
        }
    }
}

/// Geometry + settings: drives the stepper over every history of a run.
#[derive(Debug, Clone)]
pub struct Model {
    pub geometry: Geometry,
    pub settings: Settings,
    /// Binning for the depth-dose tally; `None` disables it
    pub depth_dose: Option<DepthDoseTally>,
    stepper: Stepper,
}

impl Model {
    pub fn new(geometry: Geometry, settings: Settings) -> TransportResult<Self> {
        settings.validate()?;
        Ok(Model {
            geometry,
            settings,
            depth_dose: None,
            stepper: Stepper::new(),
        })
    }

    pub fn with_depth_dose(mut self, tally: DepthDoseTally) -> Self {
        self.depth_dose = Some(tally.empty_like());
        self
    }

    /// Random stream of history `index`: PCG64 seeded with the run seed on
    /// stream `index`, independent of which thread runs the history.
    pub fn history_rng(&self, index: usize) -> Pcg64 {
        Pcg64::new(self.settings.seed as u128, index as u128)
    }

    /// Step `particle` until it stops, escapes (with `kill_on_exit`) or the
    /// step budget runs out.
    ///
    /// The material is looked up at the particle's position before every
    /// step. Energy lost in a step is scored into `tally` at the step's
    /// starting position.
    ///
    /// # Returns
    /// The fate of the history and the number of steps taken
    pub fn transport<R: Rng + ?Sized>(
        &self,
        particle: &mut Particle,
        rng: &mut R,
        mut tally: Option<&mut DepthDoseTally>,
    ) -> TransportResult<(HistoryFate, usize)> {
        let step_length = self.settings.step_length;
        let mut steps = 0;
        while particle.is_alive() {
            if steps >= self.settings.max_steps {
                return Ok((HistoryFate::StepBudgetExhausted, steps));
            }
            let start = particle.position();
            if self.settings.kill_on_exit && !self.geometry.contains(start) {
                return Ok((HistoryFate::Escaped, steps));
            }
            let material = self.geometry.material_at(start);
            let deposited_before = particle.deposited_energy();
            self.stepper.advance(particle, material, step_length, rng)?;
            steps += 1;
            if let Some(tally) = tally.as_deref_mut() {
                tally.score_step(start, particle.deposited_energy() - deposited_before);
            }
        }
        Ok((HistoryFate::Stopped, steps))
    }

    fn run_history(&self, index: usize) -> TransportResult<(HistorySummary, Option<DepthDoseTally>)> {
        let mut rng = self.history_rng(index);
        let mut particle = self.settings.source.sample(&mut rng)?;
        let mut tally = self.depth_dose.as_ref().map(DepthDoseTally::empty_like);

        let (fate, steps) = self.transport(&mut particle, &mut rng, tally.as_mut())?;

        match fate {
            HistoryFate::StepBudgetExhausted => log::warn!(
                "history {} still alive after {} steps with {:.4} MeV left",
                index,
                steps,
                particle.energy()
            ),
            _ => log::debug!(
                "history {} {:?} after {} steps at {:?}, deposited {:.4} MeV",
                index,
                fate,
                steps,
                particle.position(),
                particle.deposited_energy()
            ),
        }

        let summary = HistorySummary {
            index,
            fate,
            steps,
            initial_energy: particle.initial_energy(),
            deposited_energy: particle.deposited_energy(),
            final_position: particle.position(),
            track_length: particle.track_length(),
        };
        Ok((summary, tally))
    }

    /// Transport `settings.particles` histories from the source.
    ///
    /// Histories run on the rayon pool when `settings.parallel` is set.
    /// Results are identical either way for a given seed: every history has
    /// its own random stream and tallies are summed in history order.
    pub fn run(&self) -> TransportResult<RunResults> {
        log::info!(
            "transporting {} histories of {} MeV {:?} with {} mm steps",
            self.settings.particles,
            self.settings.source.energy,
            self.settings.source.kind,
            self.settings.step_length
        );

        let outcomes: Vec<(HistorySummary, Option<DepthDoseTally>)> = if self.settings.parallel {
            (0..self.settings.particles)
                .into_par_iter()
                .map(|i| self.run_history(i))
                .collect::<TransportResult<Vec<_>>>()?
        } else {
            (0..self.settings.particles)
                .map(|i| self.run_history(i))
                .collect::<TransportResult<Vec<_>>>()?
        };

        let mut depth_dose = self.depth_dose.as_ref().map(DepthDoseTally::empty_like);
        let mut histories = Vec::with_capacity(outcomes.len());
        for (summary, tally) in outcomes {
            if let (Some(total), Some(tally)) = (depth_dose.as_mut(), tally.as_ref()) {
                total.merge(tally)?;
            }
            histories.push(summary);
        }

        let results = RunResults {
            histories,
            depth_dose,
        };
        log::info!(
            "run finished: {} stopped, {} escaped, {} over budget, {:.4} MeV deposited",
            results.count(HistoryFate::Stopped),
            results.count(HistoryFate::Escaped),
            results.count(HistoryFate::StepBudgetExhausted),
            results.total_deposited()
        );
        Ok(results)
    }
}
