//! Generic named-task cooperative scheduler.
//!
//! A single loop, not a thread pool: registered tasks carry a monotonic
//! next-due instant ([`std::time::Instant`], immune to wall-clock
//! adjustments) and run synchronously, in registration order, whenever they
//! come due. Between checks the loop sleeps a bounded poll interval. A task
//! that fails is reported through the error hook and the loop moves on — one
//! broken task never starves the others or its own future ticks.
//!
//! Stopping is cooperative: the shared stop flag is checked before each task
//! invocation, so a running task always finishes before the loop exits. The
//! scheduler knows nothing about drift reconciliation; the reconciliation
//! cycle is just one registered task among potentially several.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, info, warn};

type TaskFn = Box<dyn FnMut() -> Result<()> + Send>;
type ErrorHook = Box<dyn FnMut(&str, &anyhow::Error) + Send>;

struct Task {
    name: String,
    interval: Duration,
    next_due: Instant,
    run: TaskFn,
}

pub struct Heartbeat {
    tasks: Vec<Task>,
    stop: Arc<AtomicBool>,
    poll_interval: Duration,
    on_task_error: Option<ErrorHook>,
}

impl Heartbeat {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            tasks: Vec::new(),
            stop: Arc::new(AtomicBool::new(false)),
            poll_interval,
            on_task_error: None,
        }
    }

    /// Shared stop flag. Setting it (from a signal handler or another
    /// thread) makes [`run`](Self::run) exit after the current task, if any,
    /// completes — a task is never killed mid-execution.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Install a hook invoked whenever a task returns an error (the `run`
    /// CLI wires this to a `task_error` audit append).
    pub fn on_task_error(&mut self, hook: impl FnMut(&str, &anyhow::Error) + Send + 'static) {
        self.on_task_error = Some(Box::new(hook));
    }

    /// Register a named task. The first run happens one full interval after
    /// registration; tasks registered earlier run first when several are due
    /// at once.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        interval: Duration,
        run: impl FnMut() -> Result<()> + Send + 'static,
    ) {
        let name = name.into();
        debug!(task = %name, interval_ms = interval.as_millis() as u64, "task registered");
        self.tasks.push(Task {
            name,
            interval,
            next_due: Instant::now() + interval,
            run: Box::new(run),
        });
    }

    /// Run every due task once, in registration order. Returns how many
    /// tasks ran. Exposed for deterministic tests; [`run`](Self::run) calls
    /// this in a loop.
    pub fn tick(&mut self, now: Instant) -> usize {
        let mut ran = 0;
        for task in &mut self.tasks {
            if self.stop.load(Ordering::SeqCst) {
                break;
            }
            if now < task.next_due {
                continue;
            }

            match (task.run)() {
                Ok(()) => debug!(task = %task.name, "task completed"),
                Err(e) => {
                    warn!(task = %task.name, error = %e, "task failed");
                    if let Some(hook) = &mut self.on_task_error {
                        hook(&task.name, &e);
                    }
                }
            }

            // Schedule from completion, not from the original due time — a
            // slow task must not cause a burst of catch-up runs.
            task.next_due = Instant::now() + task.interval;
            ran += 1;
        }
        ran
    }

    /// Blocking cooperative loop: tick, sleep the poll interval, repeat
    /// until the stop flag is set.
    pub fn run(&mut self) {
        info!(tasks = self.tasks.len(), "heartbeat started");
        while !self.stop.load(Ordering::SeqCst) {
            self.tick(Instant::now());
            if self.stop.load(Ordering::SeqCst) {
                break;
            }
            std::thread::sleep(self.poll_interval);
        }
        info!("heartbeat stopped");
    }
}
