//! Run controller
//!
//! Drives validation, numbering, per-case solution, combinations, modal
//! extraction and the summary scan, recording progress on an [`AnalysisRun`].
//! The record has a single writer (the controller); observers read snapshots.
//!
//! Progress checkpoints: 5 after validation, 10 once the structure is
//! prepared, 10..80 across load cases, 80..90 across combinations, 95 after
//! modal extraction and 100 on completion.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use log::{error, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::assembly::assemble_stiffness;
use super::combination::combine;
use super::config::{AnalysisConfig, AnalysisType, Precision};
use super::dof::DofMap;
use super::element::Element;
use super::modal::run_modal;
use super::recovery::recover_case;
use super::statics::{solve_linear_case, solve_p_delta_case, ReducedSystem};
use super::summary::summarize;
use super::validate::validate_model;
use crate::error::{AnalysisError, AnalysisResult, ErrorKind};
use crate::model::StructuralModel;
use crate::results::{AnalysisSummary, LoadResult, ModalResults};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Failure recorded on a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&AnalysisError> for RunError {
    fn from(err: &AnalysisError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// State and results of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRun {
    pub id: Uuid,
    pub project_id: String,
    pub status: RunStatus,
    /// Percent complete, never decreasing
    pub progress: f64,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<RunError>,
    /// Per load case, in model declaration order
    pub load_cases: Vec<LoadResult>,
    /// Per combination, in model declaration order
    pub combinations: Vec<LoadResult>,
    pub modal: Option<ModalResults>,
    pub summary: Option<AnalysisSummary>,
}

impl AnalysisRun {
    pub fn new(project_id: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id: project_id.to_string(),
            status: RunStatus::Pending,
            progress: 0.0,
            started_at: None,
            finished_at: None,
            error: None,
            load_cases: Vec::new(),
            combinations: Vec::new(),
            modal: None,
            summary: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Load case or combination result by name
    pub fn result(&self, name: &str) -> Option<&LoadResult> {
        self.load_cases
            .iter()
            .chain(self.combinations.iter())
            .find(|r| r.name == name)
    }
}

/// Notification pushed to subscribers at every checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub run_id: Uuid,
    pub project_id: String,
    pub status: RunStatus,
    pub progress: f64,
}

/// Receiver of progress notifications
pub trait ProgressSink: Send + Sync {
    fn notify(&self, event: &ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn notify(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn notify(&self, _event: &ProgressEvent) {}
}

/// Forwards events into an unbounded tokio channel
#[cfg(feature = "runtime")]
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: tokio::sync::mpsc::UnboundedSender<ProgressEvent>,
}

#[cfg(feature = "runtime")]
impl ChannelSink {
    pub fn channel() -> (Self, tokio::sync::mpsc::UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[cfg(feature = "runtime")]
impl ProgressSink for ChannelSink {
    fn notify(&self, event: &ProgressEvent) {
        // A dropped receiver only means nobody is listening
        let _ = self.sender.send(event.clone());
    }
}

/// Cooperative cancellation flag, checked between load cases and combinations
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

fn read(record: &RwLock<AnalysisRun>) -> RwLockReadGuard<'_, AnalysisRun> {
    record.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write(record: &RwLock<AnalysisRun>) -> RwLockWriteGuard<'_, AnalysisRun> {
    record.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Sole writer of a run record
struct Controller<'a> {
    record: &'a RwLock<AnalysisRun>,
    sink: &'a dyn ProgressSink,
    cancel: &'a CancellationToken,
}

impl Controller<'_> {
    fn emit(&self) {
        let event = {
            let run = read(self.record);
            ProgressEvent {
                run_id: run.id,
                project_id: run.project_id.clone(),
                status: run.status,
                progress: run.progress,
            }
        };
        self.sink.notify(&event);
    }

    fn start(&self) {
        {
            let mut run = write(self.record);
            run.status = RunStatus::Running;
            run.started_at = Some(Utc::now());
        }
        self.emit();
    }

    fn progress(&self, value: f64) {
        {
            let mut run = write(self.record);
            run.progress = run.progress.max(value.clamp(0.0, 100.0));
        }
        self.emit();
    }

    fn check_cancelled(&self) -> AnalysisResult<()> {
        if self.cancel.is_cancelled() {
            Err(AnalysisError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn complete(&self, outputs: RunOutputs) {
        {
            let mut run = write(self.record);
            run.load_cases = outputs.load_cases;
            run.combinations = outputs.combinations;
            run.modal = outputs.modal;
            run.summary = Some(outputs.summary);
            run.progress = 100.0;
            run.status = RunStatus::Completed;
            run.finished_at = Some(Utc::now());
            info!("Run {} completed", run.id);
        }
        self.emit();
    }

    fn fail(&self, err: &AnalysisError) {
        {
            let mut run = write(self.record);
            error!("Run {} failed: {}", run.id, err);
            run.error = Some(RunError::from(err));
            run.status = RunStatus::Failed;
            run.finished_at = Some(Utc::now());
        }
        self.emit();
    }

    fn drive(&self, model: &StructuralModel, config: &AnalysisConfig) {
        self.start();
        match execute(model, config, self) {
            Ok(outputs) => self.complete(outputs),
            Err(err) => self.fail(&err),
        }
    }
}

struct RunOutputs {
    load_cases: Vec<LoadResult>,
    combinations: Vec<LoadResult>,
    modal: Option<ModalResults>,
    summary: AnalysisSummary,
}

/// Reject options without a formulation and names missing from the model
fn check_config(model: &StructuralModel, config: &AnalysisConfig) -> AnalysisResult<()> {
    match config.analysis_type {
        AnalysisType::Static | AnalysisType::Modal => {}
        other => {
            return Err(AnalysisError::UnsupportedFeature(format!("{:?} analysis", other)));
        }
    }
    if config.effects.large_displacement {
        return Err(AnalysisError::UnsupportedFeature("large displacement analysis".to_string()));
    }
    if config.precision == Precision::Single {
        return Err(AnalysisError::UnsupportedFeature("single precision".to_string()));
    }
    for case in &config.load_cases {
        if model.load_case(case).is_none() {
            return Err(AnalysisError::Reference(format!("load case '{}' does not exist", case)));
        }
    }
    for combination in &config.load_combinations {
        if model.load_combination(combination).is_none() {
            return Err(AnalysisError::Reference(format!(
                "load combination '{}' does not exist",
                combination
            )));
        }
    }
    Ok(())
}

/// Requested combinations, and the cases they need on top of the requested ones,
/// both in model declaration order
fn selection<'m>(model: &'m StructuralModel, config: &AnalysisConfig) -> (Vec<&'m str>, Vec<&'m str>) {
    fn wanted(list: &[String], id: &str) -> bool {
        list.is_empty() || list.iter().any(|x| x == id)
    }

    let combinations: Vec<&str> = model
        .load_combinations
        .iter()
        .filter(|c| wanted(&config.load_combinations, &c.id))
        .map(|c| c.id.as_str())
        .collect();

    let cases = model
        .load_cases
        .iter()
        .filter(|case| {
            wanted(&config.load_cases, &case.id)
                || model
                    .load_combinations
                    .iter()
                    .filter(|c| combinations.contains(&c.id.as_str()))
                    .any(|c| c.includes(&case.id))
        })
        .map(|c| c.id.as_str())
        .collect();

    (cases, combinations)
}

fn execute(model: &StructuralModel, config: &AnalysisConfig, ctl: &Controller<'_>) -> AnalysisResult<RunOutputs> {
    check_config(model, config)?;
    validate_model(model, config)?;
    ctl.progress(5.0);

    let dofs = DofMap::new(model);
    let elements = Element::build_all(model, &dofs, config)?;
    info!(
        "Structure prepared: {} DOFs ({} free), {} elements",
        dofs.total(),
        dofs.num_free(),
        elements.len()
    );
    ctl.progress(10.0);

    let (cases, combinations) = selection(model, config);

    // One factorization serves every case unless P-Delta changes K per case
    let linear = if config.effects.p_delta || cases.is_empty() {
        None
    } else {
        let stiffness = assemble_stiffness(&elements, &dofs, None);
        // A failing shared factorization surfaces while the first case is processed
        let system = ReducedSystem::prepare(&stiffness, &dofs, &config.solver).map_err(|e| e.in_case(cases[0]))?;
        Some((stiffness, system))
    };

    let mut load_cases = Vec::with_capacity(cases.len());
    for (i, case) in cases.iter().enumerate() {
        ctl.check_cancelled()?;
        let solution = match &linear {
            Some((stiffness, system)) => solve_linear_case(model, &elements, &dofs, stiffness, system, case)?,
            None => solve_p_delta_case(model, &elements, &dofs, config, case)?,
        };
        load_cases.push(recover_case(model, &elements, &dofs, &solution, config.stations)?);
        info!("Load case '{}' solved", case);
        ctl.progress(10.0 + 70.0 * (i + 1) as f64 / cases.len() as f64);
    }

    let by_name: HashMap<&str, &LoadResult> = load_cases.iter().map(|r| (r.name.as_str(), r)).collect();
    let mut combined = Vec::with_capacity(combinations.len());
    for (i, id) in combinations.iter().enumerate() {
        ctl.check_cancelled()?;
        let combination = model
            .load_combination(id)
            .ok_or_else(|| AnalysisError::LoadCombinationNotFound(id.to_string()))?;
        combined.push(combine(combination, &by_name)?);
        ctl.progress(80.0 + 10.0 * (i + 1) as f64 / combinations.len() as f64);
    }

    let modal = if config.analysis_type == AnalysisType::Modal {
        ctl.check_cancelled()?;
        let results = run_modal(model, &elements, &dofs, config)?;
        for mode in &results.modes {
            info!("Mode {}: {:.4} Hz", mode.mode, mode.frequency);
        }
        ctl.progress(95.0);
        Some(results)
    } else {
        None
    };

    let summary = summarize(model, &dofs, load_cases.iter().chain(combined.iter()));

    Ok(RunOutputs {
        load_cases,
        combinations: combined,
        modal,
        summary,
    })
}

/// Analyse `model` synchronously and return the finished run record
pub fn run(model: &StructuralModel, config: &AnalysisConfig) -> AnalysisRun {
    run_with(model, config, &NullSink, &CancellationToken::new())
}

/// Like [`run`], reporting progress to `sink` and honouring `cancel`
pub fn run_with(
    model: &StructuralModel,
    config: &AnalysisConfig,
    sink: &dyn ProgressSink,
    cancel: &CancellationToken,
) -> AnalysisRun {
    let record = RwLock::new(AnalysisRun::new(&model.project_id));
    Controller {
        record: &record,
        sink,
        cancel,
    }
    .drive(model, config);
    record.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A run executing on the tokio blocking pool
#[cfg(feature = "runtime")]
#[derive(Debug)]
pub struct RunHandle {
    record: Arc<RwLock<AnalysisRun>>,
    cancel: CancellationToken,
    join: tokio::task::JoinHandle<()>,
}

#[cfg(feature = "runtime")]
impl RunHandle {
    pub fn id(&self) -> Uuid {
        read(&self.record).id
    }

    /// Current state of the record
    pub fn snapshot(&self) -> AnalysisRun {
        read(&self.record).clone()
    }

    /// Request cancellation at the next checkpoint
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the run to finish and return the final record
    pub async fn wait(self) -> AnalysisRun {
        if let Err(err) = self.join.await {
            let mut run = write(&self.record);
            if !run.status.is_terminal() {
                run.status = RunStatus::Failed;
                run.error = Some(RunError {
                    kind: ErrorKind::Internal,
                    message: format!("analysis worker stopped: {}", err),
                });
                run.finished_at = Some(Utc::now());
            }
        }
        let run = read(&self.record).clone();
        run
    }
}

/// Start a run in the background and return immediately
///
/// The model and configuration are copied at submission, so later edits do
/// not reach the run. Must be called from within a tokio runtime.
#[cfg(feature = "runtime")]
pub fn submit(model: &StructuralModel, config: &AnalysisConfig, sink: Arc<dyn ProgressSink>) -> RunHandle {
    let model = model.clone();
    let config = config.clone();
    let record = Arc::new(RwLock::new(AnalysisRun::new(&model.project_id)));
    let cancel = CancellationToken::new();

    let worker_record = Arc::clone(&record);
    let worker_cancel = cancel.clone();
    let join = tokio::task::spawn_blocking(move || {
        Controller {
            record: &worker_record,
            sink: sink.as_ref(),
            cancel: &worker_cancel,
        }
        .drive(&model, &config);
    });

    RunHandle { record, cancel, join }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Beam, Material, Node, Restraint, Section};
    use crate::loads::{CombinationCategory, LoadCase, LoadCombination, NodeLoad};
    use std::sync::Mutex;

    fn frame() -> StructuralModel {
        let mut model = StructuralModel::new("demo");
        model.load_cases.push(LoadCase::dead());
        model.load_cases.push(LoadCase::live());
        model.load_combinations.push(
            LoadCombination::new("1.2D+1.6L", CombinationCategory::Ultimate)
                .with_case("Dead", 1.2)
                .with_case("Live", 1.6),
        );
        model.materials.push(Material::steel("S"));
        model.sections.push(Section::rectangular("R", "S", 0.2, 0.3));
        model
            .nodes
            .push(Node::new("A", 0.0, 0.0, 0.0).with_restraint(Restraint::fixed()));
        model.nodes.push(
            Node::new("B", 3.0, 0.0, 0.0)
                .with_load(NodeLoad::fy(-10.0, "Dead"))
                .with_load(NodeLoad::fy(-5.0, "Live")),
        );
        model.beams.push(Beam::new("B1", "A", "B", "R"));
        model
    }

    #[test]
    fn test_run_completes_with_all_results() {
        let run = run(&frame(), &AnalysisConfig::default());
        assert_eq!(run.status, RunStatus::Completed, "{:?}", run.error);
        assert_eq!(run.progress, 100.0);
        assert_eq!(run.load_cases.len(), 2);
        assert_eq!(run.combinations.len(), 1);
        assert!(run.result("1.2D+1.6L").is_some());
        let summary = run.summary.unwrap();
        assert_eq!(summary.max_displacement.unwrap().source, "1.2D+1.6L");
        assert!(run.started_at.unwrap() <= run.finished_at.unwrap());
    }

    #[test]
    fn test_combination_pulls_in_its_cases() {
        let model = frame();
        let config = AnalysisConfig::default()
            .with_load_cases(&["Dead"])
            .with_combinations(&["1.2D+1.6L"]);
        let (cases, combinations) = selection(&model, &config);
        assert_eq!(cases, vec!["Dead", "Live"]);
        assert_eq!(combinations, vec!["1.2D+1.6L"]);
    }

    #[test]
    fn test_progress_is_monotonic() {
        let seen = Mutex::new(Vec::new());
        let sink = |event: &ProgressEvent| seen.lock().unwrap().push(event.progress);
        let run = run_with(&frame(), &AnalysisConfig::default(), &sink, &CancellationToken::new());
        assert_eq!(run.status, RunStatus::Completed);

        let seen = seen.into_inner().unwrap();
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.first().copied(), Some(0.0));
        assert_eq!(seen.last().copied(), Some(100.0));
        assert!(seen.contains(&5.0) && seen.contains(&10.0));
    }

    #[test]
    fn test_cancellation_between_cases() {
        let token = CancellationToken::new();
        let sink = {
            let token = token.clone();
            move |event: &ProgressEvent| {
                if event.progress >= 10.0 {
                    token.cancel();
                }
            }
        };
        let run = run_with(&frame(), &AnalysisConfig::default(), &sink, &token);
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.error.unwrap().kind, ErrorKind::Cancelled);
        assert!(run.load_cases.is_empty());
    }

    #[test]
    fn test_unknown_case_and_unsupported_type() {
        let run1 = run(&frame(), &AnalysisConfig::default().with_load_cases(&["Wind"]));
        assert_eq!(run1.error.unwrap().kind, ErrorKind::Reference);

        let config = AnalysisConfig {
            analysis_type: AnalysisType::Buckling,
            ..Default::default()
        };
        let run2 = run(&frame(), &config);
        assert_eq!(run2.status, RunStatus::Failed);
        assert_eq!(run2.error.unwrap().kind, ErrorKind::UnsupportedFeature);
    }
}
