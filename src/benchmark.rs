use std::{
    fmt,
    time::{Duration, Instant},
};

use tracing::warn;

use crate::model::VoxelModel;

/// Timed pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Carving,
    Coloring,
    PostProcessing,
    MarchingCubes,
    Overall,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Carving,
        Stage::Coloring,
        Stage::PostProcessing,
        Stage::MarchingCubes,
        Stage::Overall,
    ];

    fn slot(self) -> usize {
        self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Carving => "carving",
            Stage::Coloring => "coloring",
            Stage::PostProcessing => "postprocessing",
            Stage::MarchingCubes => "marching cubes",
            Stage::Overall => "overall",
        }
    }
}

/// Grid dimensions and voxel size a run was made with.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModelSize {
    pub x: usize,
    pub y: usize,
    pub z: usize,
    pub voxel_size: f32,
}

impl ModelSize {
    pub fn new(x: usize, y: usize, z: usize, voxel_size: f32) -> Self {
        Self {
            x,
            y,
            z,
            voxel_size,
        }
    }
}

impl From<&VoxelModel> for ModelSize {
    fn from(model: &VoxelModel) -> Self {
        let (x, y, z) = model.dim();
        Self::new(x, y, z, model.voxel_size())
    }
}

/// Start and stop instants of one stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct Performance {
    pub start: Option<Instant>,
    pub end: Option<Instant>,
}

impl Performance {
    /// Elapsed time, if the stage was both started and stopped.
    pub fn elapsed(&self) -> Option<Duration> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(end.saturating_duration_since(start)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunTiming {
    pub name: String,
    pub size: ModelSize,
    stages: [Performance; 5],
}

impl RunTiming {
    pub fn stage(&self, stage: Stage) -> &Performance {
        &self.stages[stage.slot()]
    }

    pub fn elapsed(&self, stage: Stage) -> Option<Duration> {
        self.stage(stage).elapsed()
    }
}

/// Append-only list of timed runs. Stage timings always go to the most recent run.
///
/// ```
/// use voxcarve::benchmark::{Benchmark, ModelSize, Stage};
///
/// let mut benchmark = Benchmark::new();
/// benchmark.next_run("exhaustive 32", ModelSize::new(32, 32, 32, 0.01));
/// let sum = benchmark.measure(Stage::Carving, || (0..100).sum::<u32>());
/// assert_eq!(sum, 4950);
/// assert!(benchmark.runs()[0].elapsed(Stage::Carving).is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Benchmark {
    runs: Vec<RunTiming>,
}

impl Benchmark {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new run. Later stage timings are recorded against it.
    pub fn next_run<S: Into<String>>(&mut self, name: S, size: ModelSize) {
        self.runs.push(RunTiming {
            name: name.into(),
            size,
            stages: Default::default(),
        });
    }

    pub fn runs(&self) -> &[RunTiming] {
        &self.runs
    }

    pub fn current(&self) -> Option<&RunTiming> {
        self.runs.last()
    }

    fn current_stage(&mut self, stage: Stage) -> Option<&mut Performance> {
        let performance = self
            .runs
            .last_mut()
            .map(|run| &mut run.stages[stage.slot()]);
        if performance.is_none() {
            warn!(stage = stage.name(), "no open benchmark run, timing ignored");
        }
        performance
    }

    pub fn start(&mut self, stage: Stage) {
        if let Some(performance) = self.current_stage(stage) {
            performance.start = Some(Instant::now());
            performance.end = None;
        }
    }

    pub fn stop(&mut self, stage: Stage) {
        if let Some(performance) = self.current_stage(stage) {
            performance.end = Some(Instant::now());
        }
    }

    /// Times `f` as `stage` of the current run.
    pub fn measure<T, F: FnOnce() -> T>(&mut self, stage: Stage, f: F) -> T {
        self.start(stage);
        let result = f();
        self.stop(stage);
        result
    }
}

impl fmt::Display for Benchmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Benchmark (all times in milliseconds)")?;
        write!(f, "{:<24} | {:<22}", "Name", "Model size (x,y,z, voxel size)")?;
        for stage in Stage::ALL {
            write!(f, " | {:>14}", stage.name())?;
        }
        writeln!(f)?;
        writeln!(f, "{}", "-".repeat(24 + 3 + 22 + Stage::ALL.len() * 17))?;

        for run in &self.runs {
            let size = format!(
                "{}x{}x{}, {}",
                run.size.x, run.size.y, run.size.z, run.size.voxel_size
            );
            write!(f, "{:<24} | {:<22}", run.name, size)?;
            for stage in Stage::ALL {
                match run.elapsed(stage) {
                    Some(elapsed) => {
                        write!(f, " | {:>14.3}", elapsed.as_secs_f64() * 1000.0)?
                    }
                    None => write!(f, " | {:>14}", "-")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_open_run_is_ignored() {
        let mut benchmark = Benchmark::new();
        benchmark.start(Stage::Carving);
        benchmark.stop(Stage::Carving);
        assert_eq!(benchmark.measure(Stage::Overall, || 3), 3);
        assert!(benchmark.runs().is_empty());
        assert!(benchmark.current().is_none());
    }

    #[test]
    fn test_stages_go_to_latest_run() {
        let mut benchmark = Benchmark::new();
        benchmark.next_run("first", ModelSize::new(8, 8, 8, 1.0));
        benchmark.measure(Stage::Carving, || std::thread::sleep(Duration::from_millis(2)));

        benchmark.next_run("second", ModelSize::from(&VoxelModel::new(4, 5, 6, 0.5)));
        benchmark.start(Stage::Coloring);
        benchmark.stop(Stage::Coloring);

        let runs = benchmark.runs();
        assert_eq!(runs.len(), 2);
        assert!(runs[0].elapsed(Stage::Carving).unwrap() >= Duration::from_millis(2));
        assert!(runs[0].elapsed(Stage::Coloring).is_none());
        assert!(runs[1].elapsed(Stage::Carving).is_none());
        assert!(runs[1].elapsed(Stage::Coloring).is_some());
        assert_eq!(runs[1].size, ModelSize::new(4, 5, 6, 0.5));
    }

    #[test]
    fn test_restart_clears_stop() {
        let mut benchmark = Benchmark::new();
        benchmark.next_run("run", ModelSize::default());
        benchmark.start(Stage::Overall);
        benchmark.stop(Stage::Overall);
        benchmark.start(Stage::Overall);
        assert!(benchmark.current().unwrap().elapsed(Stage::Overall).is_none());
    }

    #[test]
    fn test_display() {
        let mut benchmark = Benchmark::new();
        benchmark.next_run("flood_fill 16", ModelSize::new(16, 16, 16, 0.01));
        benchmark.measure(Stage::Carving, || ());

        let table = benchmark.to_string();
        let lines = table.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("milliseconds"));
        assert!(lines[1].contains("carving") && lines[1].contains("overall"));
        assert!(lines[3].starts_with("flood_fill 16"));
        assert!(lines[3].contains("16x16x16, 0.01"));
        assert_eq!(lines[3].matches('-').count(), 4);
    }
}
