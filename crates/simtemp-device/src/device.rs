//! Device lifecycle, read gateway, and configuration surface

use crate::{Attribute, DeviceError, DeviceOptions};
use ring_buffer::{RingBuffer, Sample};
use sampling_scheduler::{self as scheduler, SamplerContext, SamplerHandle};
use std::pin::pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use temp_sim::{
    Mode, SimConfig, Stats, StatsSnapshot, TempGenerator, DEFAULT_BASE_TEMP_MC, SAMPLING_MS_MAX,
    SAMPLING_MS_MIN,
};
use tokio::sync::Notify;
use tracing::{debug, info};

/// One simulated temperature sensor instance.
///
/// Attach spawns the sampler; detach stops it and fails pending
/// readers. All state is per-instance, so any number of devices can
/// coexist. Readers and configuration contexts share the device behind
/// an `Arc`.
pub struct SimTempDevice {
    buffer: Arc<RingBuffer>,
    generator: Arc<Mutex<TempGenerator>>,
    config: Arc<Mutex<SimConfig>>,
    stats: Arc<Stats>,
    data_ready: Arc<Notify>,
    poll_ready: Arc<Notify>,
    detached: Arc<AtomicBool>,
    sampler: Mutex<Option<SamplerHandle>>,
}

impl SimTempDevice {
    /// Attach a device: resolve options, allocate the buffer, and start
    /// sampling. Must be called within a tokio runtime.
    pub fn attach(options: DeviceOptions) -> Self {
        let stats = Arc::new(Stats::new());
        let cfg = options.resolve(&stats);
        info!(
            sampling_ms = cfg.sampling_ms,
            threshold_mc = cfg.threshold_mc,
            mode = %cfg.mode,
            "attaching simulated temperature sensor"
        );

        let generator = Arc::new(Mutex::new(TempGenerator::new(DEFAULT_BASE_TEMP_MC)));
        if cfg.mode == Mode::Ramp {
            // Same seeding a runtime switch into ramp performs
            generator
                .lock()
                .expect("generator lock poisoned")
                .enter_ramp(cfg.threshold_mc);
        }

        let buffer = Arc::new(RingBuffer::with_default_capacity());
        let config = Arc::new(Mutex::new(cfg));
        let data_ready = Arc::new(Notify::new());
        let poll_ready = Arc::new(Notify::new());

        let sampler = scheduler::spawn(SamplerContext {
            buffer: Arc::clone(&buffer),
            generator: Arc::clone(&generator),
            config: Arc::clone(&config),
            stats: Arc::clone(&stats),
            data_ready: Arc::clone(&data_ready),
            poll_ready: Arc::clone(&poll_ready),
            epoch: Instant::now(),
        });

        Self {
            buffer,
            generator,
            config,
            stats,
            data_ready,
            poll_ready,
            detached: Arc::new(AtomicBool::new(false)),
            sampler: Mutex::new(Some(sampler)),
        }
    }

    /// Detach the device: stop the sampler (waiting out any in-flight
    /// firing), then wake pending readers, which fail with
    /// [`DeviceError::Interrupted`]. Samples still buffered remain
    /// drainable through the non-blocking calls.
    pub async fn detach(&self) {
        let handle = {
            self.sampler
                .lock()
                .expect("sampler handle lock poisoned")
                .take()
        };

        let Some(handle) = handle else {
            return;
        };
        handle.stop().await;

        self.detached.store(true, Ordering::SeqCst);
        self.data_ready.notify_waiters();
        self.poll_ready.notify_waiters();
        info!("device detached");
    }

    // ------------------------------------------------------------------
    // Read gateway
    // ------------------------------------------------------------------

    /// Non-blocking read of one wire record into `buf`.
    ///
    /// Returns the record size (16) on success, `BufferTooSmall` when
    /// `buf` cannot hold one record, `WouldBlock` when no sample is
    /// buffered.
    pub fn try_read(&self, buf: &mut [u8]) -> Result<usize, DeviceError> {
        Self::check_record_room(buf)?;
        let sample = self.try_next_sample()?;
        buf[..Sample::WIRE_SIZE].copy_from_slice(&sample.to_bytes());
        Ok(Sample::WIRE_SIZE)
    }

    /// Blocking read of one wire record into `buf`.
    ///
    /// Suspends until a sample is available; device detach aborts the
    /// wait with `Interrupted`.
    pub async fn read(&self, buf: &mut [u8]) -> Result<usize, DeviceError> {
        Self::check_record_room(buf)?;
        let sample = self.next_sample().await?;
        buf[..Sample::WIRE_SIZE].copy_from_slice(&sample.to_bytes());
        Ok(Sample::WIRE_SIZE)
    }

    /// Non-blocking typed read of the oldest undelivered sample
    pub fn try_next_sample(&self) -> Result<Sample, DeviceError> {
        self.buffer.pop().ok_or(DeviceError::WouldBlock)
    }

    /// Wait for the oldest undelivered sample.
    ///
    /// Re-checks the buffer on every wakeup; when several readers block
    /// concurrently, each sample goes to exactly one of them.
    pub async fn next_sample(&self) -> Result<Sample, DeviceError> {
        loop {
            let mut wakeup = pin!(self.data_ready.notified());
            // Register before checking so a push between the check and
            // the await still wakes us
            wakeup.as_mut().enable();

            if let Some(sample) = self.buffer.pop() {
                return Ok(sample);
            }
            if self.detached.load(Ordering::SeqCst) {
                return Err(DeviceError::Interrupted);
            }
            wakeup.await;
        }
    }

    /// Resolve once at least one sample is buffered.
    ///
    /// Registers against both the data and poll wakeup conditions, so a
    /// push arriving after the check still resolves the wait.
    pub async fn readable(&self) -> Result<(), DeviceError> {
        loop {
            let mut data = pin!(self.data_ready.notified());
            let mut poll = pin!(self.poll_ready.notified());
            data.as_mut().enable();
            poll.as_mut().enable();

            if !self.buffer.is_empty() {
                return Ok(());
            }
            if self.detached.load(Ordering::SeqCst) {
                return Err(DeviceError::Interrupted);
            }
            tokio::select! {
                _ = data => {}
                _ = poll => {}
            }
        }
    }

    /// True when a read would not block right now
    pub fn poll_ready(&self) -> bool {
        !self.buffer.is_empty()
    }

    fn check_record_room(buf: &[u8]) -> Result<(), DeviceError> {
        if buf.len() < Sample::WIRE_SIZE {
            return Err(DeviceError::BufferTooSmall {
                got: buf.len(),
                need: Sample::WIRE_SIZE,
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Configuration surface
    // ------------------------------------------------------------------

    /// Current sampling period in milliseconds
    pub fn sampling_ms(&self) -> u32 {
        self.config.lock().expect("config lock poisoned").sampling_ms
    }

    /// Current alert threshold in milli-degrees Celsius
    pub fn threshold_mc(&self) -> i32 {
        self.config.lock().expect("config lock poisoned").threshold_mc
    }

    /// Current generation mode
    pub fn mode(&self) -> Mode {
        self.config.lock().expect("config lock poisoned").mode
    }

    /// Snapshot of the device statistics
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Set the sampling period and rearm the sampler before returning.
    ///
    /// At most the already-pending firing still happens at the old
    /// period.
    pub fn set_sampling_ms(&self, ms: u32) -> Result<(), DeviceError> {
        if !SimConfig::valid_sampling_ms(ms) {
            return Err(DeviceError::InvalidArgument(format!(
                "sampling_ms {ms} out of range {SAMPLING_MS_MIN}..={SAMPLING_MS_MAX}"
            )));
        }

        let mut cfg = self.config.lock().expect("config lock poisoned");
        cfg.sampling_ms = ms;
        if let Some(sampler) = &*self.sampler.lock().expect("sampler handle lock poisoned") {
            sampler.rearm(cfg.period());
        }
        info!(sampling_ms = ms, "sampling period updated");
        Ok(())
    }

    /// Set the alert threshold; any value is representable.
    ///
    /// Takes effect for the next generated sample's crossing compare.
    pub fn set_threshold_mc(&self, threshold_mc: i32) {
        self.config.lock().expect("config lock poisoned").threshold_mc = threshold_mc;
        debug!(threshold_mc, "threshold updated");
    }

    /// Switch the generation mode.
    ///
    /// Entering ramp from a different mode re-seeds the ramp state
    /// toward the current threshold; ramp-to-ramp and all other
    /// transitions leave it alone.
    pub fn set_mode(&self, mode: Mode) {
        let mut cfg = self.config.lock().expect("config lock poisoned");
        if mode == Mode::Ramp && cfg.mode != Mode::Ramp {
            self.generator
                .lock()
                .expect("generator lock poisoned")
                .enter_ramp(cfg.threshold_mc);
        }
        cfg.mode = mode;
        info!(%mode, "mode updated");
    }

    // ------------------------------------------------------------------
    // Attribute surface
    // ------------------------------------------------------------------

    /// Render an attribute value, newline-terminated
    pub fn show_attr(&self, attr: Attribute) -> String {
        match attr {
            Attribute::SamplingMs => format!("{}\n", self.sampling_ms()),
            Attribute::ThresholdMc => format!("{}\n", self.threshold_mc()),
            Attribute::Mode => format!("{}\n", self.mode()),
            Attribute::Stats => format!("{}\n", self.stats()),
        }
    }

    /// Parse and apply an attribute write; one trailing newline is
    /// tolerated. Rejected input leaves the attribute unchanged.
    pub fn store_attr(&self, attr: Attribute, input: &str) -> Result<(), DeviceError> {
        let value = input.strip_suffix('\n').unwrap_or(input);
        match attr {
            Attribute::SamplingMs => {
                let ms: u32 = value.parse().map_err(|_| {
                    DeviceError::InvalidArgument(format!(
                        "sampling_ms {value:?} is not an unsigned integer"
                    ))
                })?;
                self.set_sampling_ms(ms)
            }
            Attribute::ThresholdMc => {
                let mc: i32 = value.parse().map_err(|_| {
                    DeviceError::InvalidArgument(format!(
                        "threshold_mC {value:?} is not a signed integer"
                    ))
                })?;
                self.set_threshold_mc(mc);
                Ok(())
            }
            Attribute::Mode => {
                let mode: Mode = value
                    .parse()
                    .map_err(|err| DeviceError::InvalidArgument(format!("{err}")))?;
                self.set_mode(mode);
                Ok(())
            }
            Attribute::Stats => Err(DeviceError::InvalidArgument(
                "stats is read-only".to_string(),
            )),
        }
    }
}

impl Drop for SimTempDevice {
    fn drop(&mut self) {
        // Best-effort cancellation for devices dropped without detach;
        // an explicit detach is still the ordered teardown path.
        if let Ok(mut guard) = self.sampler.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}
