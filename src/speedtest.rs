// Simulated WiFi speed test
//
// A run walks three phases over a single 0-100 progress scale, suspending between steps so
// observers can render progress, then samples a synthetic measurement. Runs cannot fail;
// the only refusal is starting a second run while one is active. A run whose future is
// dropped before completing puts the tester back to idle.

use std::{ops::RangeInclusive, sync::Arc, time::Duration};

use chrono::Utc;
use parking_lot::RwLock;
use rand::Rng;
use thiserror::Error;
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    config::{ConfigError, SpeedTestConfig},
    models::SpeedTestResult,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeedTestError {
    #[error("Speed test already running ({0}% complete)")]
    AlreadyRunning(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Ping,
    Download,
    Upload,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Ping, Phase::Download, Phase::Upload];

    // Contiguous slice of the progress scale owned by this phase
    pub fn progress_range(&self) -> RangeInclusive<u8> {
        match self {
            Phase::Ping => 0..=20,
            Phase::Download => 21..=60,
            Phase::Upload => 61..=100,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Ping => "Measuring latency...",
            Phase::Download => "Measuring download speed...",
            Phase::Upload => "Measuring upload speed...",
        }
    }

    fn step_delay(&self, config: &SpeedTestConfig) -> Duration {
        let ms = match self {
            Phase::Ping => config.ping_step_ms,
            Phase::Download => config.download_step_ms,
            Phase::Upload => config.upload_step_ms,
        };
        Duration::from_millis(ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SpeedTestState {
    #[default]
    Idle,
    Running {
        phase: Phase,
        progress: u8,
    },
    Completed(SpeedTestResult),
}

impl SpeedTestState {
    pub fn progress(&self) -> u8 {
        match self {
            SpeedTestState::Idle => 0,
            SpeedTestState::Running { progress, .. } => *progress,
            SpeedTestState::Completed(_) => 100,
        }
    }

    pub fn phase(&self) -> Option<Phase> {
        match self {
            SpeedTestState::Running { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, SpeedTestState::Running { .. })
    }

    pub fn result(&self) -> Option<&SpeedTestResult> {
        match self {
            SpeedTestState::Completed(result) => Some(result),
            _ => None,
        }
    }
}

// Notifications pushed to an observer while a run progresses
#[derive(Debug, Clone, PartialEq)]
pub enum SpeedTestEvent {
    Started,
    PhaseChanged(Phase),
    Progress { phase: Phase, progress: u8 },
    Completed(SpeedTestResult),
}

// Resets an interrupted run (aborted task, timeout, panic) to idle
struct RunGuard<'a> {
    state: &'a RwLock<SpeedTestState>,
    completed: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            warn!("speed test interrupted before completion");
            *self.state.write() = SpeedTestState::Idle;
        }
    }
}

#[derive(Debug, Default)]
pub struct SpeedTest {
    config: SpeedTestConfig,
    state: RwLock<SpeedTestState>,
}

impl SpeedTest {
    pub fn new(config: SpeedTestConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state: RwLock::new(SpeedTestState::Idle),
        })
    }

    pub fn config(&self) -> &SpeedTestConfig {
        &self.config
    }

    pub fn state(&self) -> SpeedTestState {
        self.state.read().clone()
    }

    pub fn progress(&self) -> u8 {
        self.state.read().progress()
    }

    pub fn phase(&self) -> Option<Phase> {
        self.state.read().phase()
    }

    pub fn is_running(&self) -> bool {
        self.state.read().is_running()
    }

    // Cleared for the duration of a run, replaced when it completes
    pub fn last_result(&self) -> Option<SpeedTestResult> {
        self.state.read().result().cloned()
    }

    // Total simulated duration of one run
    pub fn expected_duration(&self) -> Duration {
        Phase::ALL
            .iter()
            .map(|phase| phase.step_delay(&self.config) * phase.progress_range().count() as u32)
            .sum()
    }

    // Run the whole sequence to completion. Events are best effort, a dropped receiver
    // does not interrupt the run.
    pub async fn run(
        &self,
        events: Option<UnboundedSender<SpeedTestEvent>>,
    ) -> Result<SpeedTestResult, SpeedTestError> {
        let emit = |event: SpeedTestEvent| {
            if let Some(tx) = &events {
                let _ = tx.send(event);
            }
        };

        {
            let mut state = self.state.write();
            if let SpeedTestState::Running { progress, .. } = *state {
                return Err(SpeedTestError::AlreadyRunning(progress));
            }
            *state = SpeedTestState::Running {
                phase: Phase::Ping,
                progress: 0,
            };
        }

        let mut guard = RunGuard {
            state: &self.state,
            completed: false,
        };

        info!("speed test started");
        emit(SpeedTestEvent::Started);

        for phase in Phase::ALL {
            let delay = phase.step_delay(&self.config);
            debug!(phase = ?phase, "speed test phase started");
            emit(SpeedTestEvent::PhaseChanged(phase));

            for progress in phase.progress_range() {
                *self.state.write() = SpeedTestState::Running { phase, progress };
                emit(SpeedTestEvent::Progress { phase, progress });

                if delay.is_zero() {
                    tokio::task::yield_now().await;
                } else {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        let result = self.sample_result(&mut rand::thread_rng());
        *self.state.write() = SpeedTestState::Completed(result.clone());
        guard.completed = true;

        info!(
            download = result.download_speed,
            upload = result.upload_speed,
            ping = result.ping,
            "speed test completed"
        );
        emit(SpeedTestEvent::Completed(result.clone()));

        Ok(result)
    }

    // Start a run on the runtime and hand back its progress stream
    pub fn spawn(
        tester: Arc<Self>,
    ) -> (
        JoinHandle<Result<SpeedTestResult, SpeedTestError>>,
        UnboundedReceiver<SpeedTestEvent>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move { tester.run(Some(tx)).await });
        (handle, rx)
    }

    // Draw a synthetic measurement from the configured half-open ranges
    pub fn sample_result<R: Rng>(&self, rng: &mut R) -> SpeedTestResult {
        SpeedTestResult {
            download_speed: rng.gen_range(self.config.download_mbps.clone()),
            upload_speed: rng.gen_range(self.config.upload_mbps.clone()),
            ping: rng.gen_range(self.config.ping_ms.clone()),
            timestamp: Utc::now(),
        }
    }
}
