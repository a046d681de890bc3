//! Periodic producer task

use ring_buffer::{flags, RingBuffer, Sample};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use temp_sim::{SimConfig, Stats, TempGenerator, ThresholdDetector};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info};

/// Everything one firing touches.
///
/// The task holds the only long-lived reference; configuration contexts
/// reach the generator and config through their locks. The task never
/// awaits while holding either lock.
pub struct SamplerContext {
    /// Destination FIFO
    pub buffer: Arc<RingBuffer>,
    /// Temperature source; also reachable by the mode-switch path
    pub generator: Arc<Mutex<TempGenerator>>,
    /// Live configuration, snapshotted at each firing
    pub config: Arc<Mutex<SimConfig>>,
    /// Shared counters
    pub stats: Arc<Stats>,
    /// Broadcast to blocked readers on every push
    pub data_ready: Arc<Notify>,
    /// Broadcast to readiness waiters on every push
    pub poll_ready: Arc<Notify>,
    /// Monotonic anchor for sample timestamps
    pub epoch: std::time::Instant,
}

/// Handle to a running sampler task
pub struct SamplerHandle {
    period_tx: watch::Sender<Duration>,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SamplerHandle {
    /// Cancel-and-rearm with a new period.
    ///
    /// The pending firing at the old period is discarded; the next one
    /// happens `period` from now. Callers serialize rearms under the
    /// configuration lock.
    pub fn rearm(&self, period: Duration) {
        // The receiver lives as long as the task; a send only fails
        // once the task has already exited.
        let _ = self.period_tx.send(period);
    }

    /// Stop the sampler.
    ///
    /// Returns only after the task has exited, so an in-flight firing
    /// completes first and no sample is produced afterwards.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.task.await;
        info!("sampler stopped");
    }

    /// Drop-path cancellation: request stop and abort without waiting.
    ///
    /// Unlike [`SamplerHandle::stop`] this gives no completion
    /// guarantee; it exists for destructors that cannot await.
    pub fn abort(self) {
        let _ = self.stop_tx.send(true);
        self.task.abort();
    }
}

/// Spawn the producer task, armed with the period currently in
/// `ctx.config`. Must be called within a tokio runtime.
pub fn spawn(ctx: SamplerContext) -> SamplerHandle {
    let period = ctx.config.lock().expect("config lock poisoned").period();
    let (period_tx, period_rx) = watch::channel(period);
    let (stop_tx, stop_rx) = watch::channel(false);
    let task = tokio::spawn(run(ctx, period_rx, stop_rx));
    SamplerHandle {
        period_tx,
        stop_tx,
        task,
    }
}

async fn run(
    ctx: SamplerContext,
    mut period_rx: watch::Receiver<Duration>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let base_mc = ctx
        .generator
        .lock()
        .expect("generator lock poisoned")
        .base_temp_mc();
    let mut detector = ThresholdDetector::new(base_mc);

    let mut period = *period_rx.borrow();
    let mut interval = time::interval_at(Instant::now() + period, period);
    info!(period_ms = period.as_millis() as u64, "sampler armed");

    loop {
        tokio::select! {
            changed = stop_rx.changed() => {
                // A dropped handle counts as a stop request
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            changed = period_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                period = *period_rx.borrow();
                interval = time::interval_at(Instant::now() + period, period);
                debug!(period_ms = period.as_millis() as u64, "sampler rearmed");
            }
            _ = interval.tick() => {
                fire(&ctx, &mut detector);
            }
        }
    }
}

/// One firing: snapshot config, generate, classify, publish, wake.
fn fire(ctx: &SamplerContext, detector: &mut ThresholdDetector) {
    let (mode, threshold_mc) = {
        let cfg = ctx.config.lock().expect("config lock poisoned");
        (cfg.mode, cfg.threshold_mc)
    };

    let temp_mc = ctx
        .generator
        .lock()
        .expect("generator lock poisoned")
        .next_temp(mode, &ctx.stats);

    let mut sample_flags = flags::NEW_SAMPLE;
    if detector.crossed(temp_mc, threshold_mc) {
        sample_flags |= flags::THRESHOLD_CROSSED;
        ctx.stats.record_alert();
        debug!(temp_mc, threshold_mc, "threshold crossed");
    }

    ctx.buffer.push(Sample {
        timestamp_ns: ctx.epoch.elapsed().as_nanos() as u64,
        temp_mc,
        flags: sample_flags,
    });

    ctx.data_ready.notify_waiters();
    ctx.poll_ready.notify_waiters();
}

#[cfg(test)]
mod tests {
    use super::*;
    use temp_sim::{Mode, DEFAULT_BASE_TEMP_MC};

    fn test_context(config: SimConfig) -> SamplerContext {
        SamplerContext {
            buffer: Arc::new(RingBuffer::with_default_capacity()),
            generator: Arc::new(Mutex::new(TempGenerator::new(DEFAULT_BASE_TEMP_MC))),
            config: Arc::new(Mutex::new(config)),
            stats: Arc::new(Stats::new()),
            data_ready: Arc::new(Notify::new()),
            poll_ready: Arc::new(Notify::new()),
            epoch: std::time::Instant::now(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_produces_one_sample_per_period() {
        let ctx = test_context(SimConfig::default());
        let buffer = Arc::clone(&ctx.buffer);
        let stats = Arc::clone(&ctx.stats);

        let handle = spawn(ctx);
        time::sleep(Duration::from_millis(1_050)).await;
        handle.stop().await;

        // 100 ms period over ~1 s: ten firings, each counted once
        let produced = buffer.len();
        assert!((9..=11).contains(&produced), "produced {produced}");
        assert_eq!(stats.snapshot().updates, produced as u64);
    }

    #[tokio::test(start_paused = true)]
    async fn test_samples_are_normal_mode_payloads() {
        let ctx = test_context(SimConfig::default());
        let buffer = Arc::clone(&ctx.buffer);

        let handle = spawn(ctx);
        time::sleep(Duration::from_millis(350)).await;
        handle.stop().await;

        let mut last_ts = 0;
        while let Some(sample) = buffer.pop() {
            assert_eq!(sample.temp_mc, DEFAULT_BASE_TEMP_MC);
            assert_eq!(sample.flags, flags::NEW_SAMPLE);
            assert!(sample.timestamp_ns >= last_ts);
            last_ts = sample.timestamp_ns;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_synchronous() {
        let ctx = test_context(SimConfig::default());
        let buffer = Arc::clone(&ctx.buffer);

        let handle = spawn(ctx);
        time::sleep(Duration::from_millis(250)).await;
        handle.stop().await;

        let frozen = buffer.len();
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(buffer.len(), frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_takes_effect_before_next_firing() {
        let slow = SimConfig {
            sampling_ms: 5_000,
            ..SimConfig::default()
        };
        let ctx = test_context(slow);
        let buffer = Arc::clone(&ctx.buffer);

        let handle = spawn(ctx);
        time::sleep(Duration::from_millis(100)).await;
        assert!(buffer.is_empty());

        handle.rearm(Duration::from_millis(10));
        time::sleep(Duration::from_millis(105)).await;
        let produced = buffer.len();
        assert!((9..=11).contains(&produced), "produced {produced}");

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_ramp_crossing_raises_alert() {
        let config = SimConfig {
            threshold_mc: 25_500,
            mode: Mode::Ramp,
            ..SimConfig::default()
        };
        let ctx = test_context(config);
        // Same seeding a mode switch into ramp performs
        ctx.generator
            .lock()
            .unwrap()
            .enter_ramp(25_500);
        let buffer = Arc::clone(&ctx.buffer);
        let stats = Arc::clone(&ctx.stats);

        let handle = spawn(ctx);
        // Ramp climbs 200 mC per 100 ms firing; 25_500 is passed on the
        // third firing
        time::sleep(Duration::from_millis(450)).await;
        handle.stop().await;

        assert_eq!(stats.snapshot().alerts, 1);
        let mut crossings = 0;
        while let Some(sample) = buffer.pop() {
            if sample.threshold_crossed() {
                crossings += 1;
            }
        }
        assert_eq!(crossings, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_push_wakes_data_waiters() {
        let ctx = test_context(SimConfig::default());
        let data_ready = Arc::clone(&ctx.data_ready);

        let handle = spawn(ctx);
        let woken = tokio::spawn(async move {
            data_ready.notified().await;
            true
        });
        time::sleep(Duration::from_millis(150)).await;
        assert!(woken.await.unwrap());

        handle.stop().await;
    }
}
