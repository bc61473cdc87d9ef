//! # Analysis Worker
//!
//! Runs analyses on a dedicated thread. Sample frames go in over one channel
//! and [`AnalysisReport`]s come back over another, so a host can keep its own
//! thread responsive. Workers share no state; several can run side by side
//! with different configurations.

use std::thread::{self, JoinHandle};

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::{Receiver, Sender, select};

use crate::config::AnalyzerConfig;
use crate::fft::MagnitudeTransform;
use crate::{AnalysisReport, perform_analysis};

/// Handle to a running analysis thread.
pub struct AnalysisWorker {
    frames: Option<Sender<Vec<f32>>>,
    reports: Receiver<AnalysisReport>,
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<()>>,
}

impl AnalysisWorker {
    /// Validates `config`, plans its transform and starts the thread.
    pub fn spawn(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;

        let (frames_tx, frames_rx) = crossbeam_channel::unbounded::<Vec<f32>>();
        let (reports_tx, reports_rx) = crossbeam_channel::unbounded();
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);

        let thread_handle = thread::Builder::new()
            .name("harmonic-analysis".into())
            .spawn(move || run(config, frames_rx, reports_tx, shutdown_rx))
            .context("failed to spawn analysis thread")?;

        Ok(Self {
            frames: Some(frames_tx),
            reports: reports_rx,
            shutdown_tx,
            thread_handle: Some(thread_handle),
        })
    }

    /// Queues a sample frame for analysis.
    pub fn submit(&self, frame: Vec<f32>) -> Result<()> {
        self.frames
            .as_ref()
            .ok_or_else(|| anyhow!("analysis worker is shut down"))?
            .send(frame)
            .map_err(|_| anyhow!("analysis thread has exited"))
    }

    /// Reports, one per submitted frame, in submission order.
    pub fn reports(&self) -> &Receiver<AnalysisReport> {
        &self.reports
    }

    /// Stops the thread and waits for it to finish.
    ///
    /// Frames queued but not yet picked up may be dropped.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.shutdown_tx.try_send(());
        self.frames.take();
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::error!("analysis thread panicked");
            }
        }
    }
}

impl Drop for AnalysisWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    config: AnalyzerConfig,
    frames: Receiver<Vec<f32>>,
    reports: Sender<AnalysisReport>,
    shutdown: Receiver<()>,
) {
    log::info!(
        "analysis worker started (fft_size={}, sample_rate={})",
        config.fft_size,
        config.sample_rate
    );
    let transform = MagnitudeTransform::new(&config);

    loop {
        select! {
            recv(frames) -> msg => match msg {
                Ok(frame) => {
                    let report = perform_analysis(&frame, &transform, &config);
                    if reports.send(report).is_err() {
                        log::debug!("report receiver dropped");
                        break;
                    }
                }
                Err(_) => {
                    log::debug!("frame channel closed");
                    break;
                }
            },
            recv(shutdown) -> _ => {
                log::debug!("received shutdown signal");
                break;
            },
        }
    }

    log::info!("analysis worker stopped");
}
