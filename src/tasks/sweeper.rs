//! TTL Sweeper Task
//!
//! Background task that periodically removes expired cache entries.

use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::runtime::{self, Runtime};
use tokio::sync::oneshot;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::cache::store::Store;
use crate::cache::Clock;

const SWEEPER_THREAD_NAME: &str = "memocache-sweeper";

// == Sweeper State ==
/// Lifecycle of a cache's background sweeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweeperState {
    /// No background task is running (disabled or failed to start)
    Idle,
    /// The sweeper is ticking
    Running,
    /// The cache was stopped; terminal
    Stopped,
}

// == Sweeper Handle ==
/// Owns the sweeper thread and its shutdown channel.
#[derive(Debug)]
pub(crate) struct Sweeper {
    state: SweeperState,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Sweeper {
    /// A sweeper that never runs.
    pub(crate) fn idle() -> Self {
        Self {
            state: SweeperState::Idle,
            shutdown: None,
            thread: None,
        }
    }

    /// Spawns the sweeper on a dedicated thread driving a single-threaded
    /// tokio runtime, so it works whether or not the host runs inside tokio.
    ///
    /// If the runtime or the thread cannot be created the error is logged and
    /// the returned sweeper stays `Idle`; the cache then relies on lazy expiry
    /// alone.
    ///
    /// # Arguments
    /// * `store` - Shared store to sweep
    /// * `period` - Interval between sweeps, must be non-zero
    pub(crate) fn spawn<V, C>(store: Arc<Store<V, C>>, period: Duration) -> Self
    where
        V: Send + Sync + 'static,
        C: Clock,
    {
        let runtime = runtime::Builder::new_current_thread()
            .enable_time()
            .build();
        Self::spawn_on(runtime, store, period)
    }

    /// Starts the sweep loop on an already built runtime.
    fn spawn_on<V, C>(
        runtime: io::Result<Runtime>,
        store: Arc<Store<V, C>>,
        period: Duration,
    ) -> Self
    where
        V: Send + Sync + 'static,
        C: Clock,
    {
        let runtime = match runtime {
            Ok(runtime) => runtime,
            Err(err) => {
                error!("Failed to build TTL sweeper runtime: {}", err);
                return Self::idle();
            }
        };

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let spawned = thread::Builder::new()
            .name(SWEEPER_THREAD_NAME.to_string())
            .spawn(move || runtime.block_on(run(store, period, shutdown_rx)));

        match spawned {
            Ok(thread) => Self {
                state: SweeperState::Running,
                shutdown: Some(shutdown_tx),
                thread: Some(thread),
            },
            Err(err) => {
                error!("Failed to spawn TTL sweeper thread: {}", err);
                Self::idle()
            }
        }
    }

    pub(crate) fn state(&self) -> SweeperState {
        self.state
    }

    /// Signals the task and waits for it to exit. Safe to call repeatedly.
    pub(crate) fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            // Err means the task already exited.
            let _ = shutdown.send(());
        }

        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("TTL sweeper thread panicked");
            }
        }

        self.state = SweeperState::Stopped;
    }
}

/// Sweep loop. Exits on shutdown signal or when the sender is dropped.
async fn run<V, C: Clock>(
    store: Arc<Store<V, C>>,
    period: Duration,
    mut shutdown: oneshot::Receiver<()>,
) {
    info!("Starting TTL sweeper with interval of {:?}", period);

    let mut ticker = time::interval_at(time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                let removed = store.sweep_expired();
                if removed > 0 {
                    info!("TTL sweep: removed {} expired entries", removed);
                } else {
                    debug!("TTL sweep: no expired entries found");
                }
            }
        }
    }

    info!("TTL sweeper stopped");
}
