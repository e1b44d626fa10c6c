//! Runs a [FrameGenerator] on a fixed-rate background task.
//!
//! Each tick the generator is called with the time elapsed since [DataProvider::start], and the
//! resulting frame is published to a [latest_frame_channel]. A frame the consumer has not taken
//! by the next tick is discarded in favour of the newer one, so the generator always runs at the
//! wall-clock rate regardless of how fast the consumer is.
//!
//! The channel is closed whenever the task exits, so a receiver waiting on it returns once the
//! schedule ends or the provider stops. Starting again reopens it.
use crate::{
    channels::{LatestFrameReceiver, LatestFrameSender, latest_frame_channel},
    generators::FrameGenerator,
    metrics::names::{FRAMES_DROPPED, FRAMES_GENERATED},
};
use metrics::counter;
use std::{mem, time::Duration};
use thiserror::Error;
use tokio::{
    select,
    sync::oneshot,
    task::{JoinError, JoinHandle},
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::{debug, info, instrument, trace};

pub const DEFAULT_UPDATE_RATE_HZ: u32 = 20;

/// The timer never runs faster than this.
const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Frame production task failed: {0}")]
    TaskFailed(#[from] JoinError),
    #[error("Generator was lost by an earlier task failure")]
    GeneratorLost,
}

/// Returns the timer period for the given rate, or [None] for a rate of zero.
pub fn period_for_rate(rate_hz: u32) -> Option<Duration> {
    (rate_hz > 0).then(|| Duration::from_secs(1) / rate_hz)
}

enum Worker<G> {
    /// Not running, the provider holds the generator.
    Idle(G),
    /// The task owns the generator and hands it back when it exits.
    Running {
        cancel: oneshot::Sender<()>,
        handle: JoinHandle<G>,
    },
    /// The task panicked and took the generator with it.
    Failed,
}

pub struct DataProvider<const N: usize, G> {
    worker: Worker<G>,
    sender: LatestFrameSender<N>,
    period: Duration,
}

impl<const N: usize, G> DataProvider<N, G>
where
    G: FrameGenerator<N> + 'static,
{
    /// Creates an idle provider and the receiving end of its frame channel.
    /// # Parameters
    /// - generator: produces the frames, it is moved onto the task while running.
    /// - period: time between ticks.
    pub fn new(generator: G, period: Duration) -> (Self, LatestFrameReceiver<N>) {
        let (sender, receiver) = latest_frame_channel();
        let provider = Self {
            worker: Worker::Idle(generator),
            sender,
            period: period.max(MIN_PERIOD),
        };
        (provider, receiver)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        matches!(&self.worker, Worker::Running { handle, .. } if !handle.is_finished())
    }

    /// Spawns the production task, elapsed time is counted from this call.
    ///
    /// Does nothing if the task is already running. If a previous task ended on its own, its
    /// generator is reclaimed and production restarts from zero elapsed time.
    pub async fn start(&mut self) -> Result<(), ProviderError> {
        if self.is_running() {
            return Ok(());
        }

        let generator = match mem::replace(&mut self.worker, Worker::Failed) {
            Worker::Idle(generator) => generator,
            Worker::Running { handle, .. } => handle.await?,
            Worker::Failed => return Err(ProviderError::GeneratorLost),
        };

        self.sender.reopen();
        let (cancel, cancelled) = oneshot::channel();
        let handle = tokio::spawn(produce_frames(
            generator,
            self.sender.clone(),
            self.period,
            cancelled,
        ));
        self.worker = Worker::Running { cancel, handle };
        info!("Data provider started");
        Ok(())
    }

    /// Requests cancellation and waits for the task to exit.
    ///
    /// Does nothing if the task is not running. Once this returns the generator is back with
    /// the provider and nothing else touches it.
    pub async fn stop(&mut self) -> Result<(), ProviderError> {
        match mem::replace(&mut self.worker, Worker::Failed) {
            Worker::Running { cancel, handle } => {
                //  The task may already have finished and dropped its end
                let _ = cancel.send(());
                self.worker = Worker::Idle(handle.await?);
                info!("Data provider stopped");
            }
            worker => self.worker = worker,
        }
        Ok(())
    }
}

/// The production loop.
///
/// Exits when cancellation is requested (or the provider is dropped), when the generator's
/// total duration has elapsed, or when the receiver has gone. None of these are errors.
/// The channel is closed on the way out.
/// # Parameters
/// - generator: produces the frames, returned when the loop exits.
/// - sender: frame channel.
/// - period: time between ticks.
/// - cancelled: resolves when the provider requests cancellation.
#[instrument(skip_all, fields(period_ms = period.as_millis() as u64))]
async fn produce_frames<const N: usize, G>(
    mut generator: G,
    sender: LatestFrameSender<N>,
    period: Duration,
    mut cancelled: oneshot::Receiver<()>,
) -> G
where
    G: FrameGenerator<N>,
{
    let started = Instant::now();
    let total_duration = generator.total_duration();

    let mut ticker = interval_at(started + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        select! {
            biased;
            _ = &mut cancelled => {
                debug!("Cancellation requested");
                break;
            }
            _ = ticker.tick() => {
                let elapsed = started.elapsed();
                if total_duration.has_elapsed(elapsed) {
                    info!("Generator schedule complete after {elapsed:?}");
                    break;
                }

                let frame = generator.generate(elapsed);
                counter!(FRAMES_GENERATED).increment(1);

                match sender.send(frame) {
                    Ok(Some(_)) => {
                        trace!("Unconsumed frame replaced");
                        counter!(FRAMES_DROPPED).increment(1);
                    }
                    Ok(None) => {}
                    Err(_) => {
                        debug!("Receiver dropped");
                        break;
                    }
                }
            }
        }
    }
    sender.close();
    debug!("Frame channel closed by producer");
    generator
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{frame::Frame, signal::SignalDuration};

    /// Writes the elapsed time in seconds as the power of every point.
    struct Clock {
        duration: SignalDuration,
    }

    impl FrameGenerator<4> for Clock {
        fn render(&mut self, elapsed: Duration, frame: &mut Frame<4>) {
            for point in frame.iter_mut() {
                point.power = elapsed.as_secs_f64();
            }
        }

        fn total_duration(&self) -> SignalDuration {
            self.duration
        }
    }

    fn provider(duration: SignalDuration) -> (DataProvider<4, Clock>, LatestFrameReceiver<4>) {
        DataProvider::new(Clock { duration }, Duration::from_millis(10))
    }

    #[test]
    fn rate_to_period() {
        assert_eq!(period_for_rate(20), Some(Duration::from_millis(50)));
        assert_eq!(period_for_rate(0), None);
    }

    #[tokio::test]
    async fn produces_frames_with_increasing_time() {
        let (mut provider, mut frames) = provider(SignalDuration::Infinite);
        provider.start().await.unwrap();

        let mut last = 0.0;
        for _ in 0..3 {
            let frame = frames.recv().await.unwrap();
            assert!(frame[0].power > last);
            last = frame[0].power;
        }
        provider.stop().await.unwrap();
    }

    #[tokio::test]
    async fn start_and_stop_are_idempotent() {
        let (mut provider, _frames) = provider(SignalDuration::Infinite);
        assert!(!provider.is_running());
        provider.stop().await.unwrap();

        provider.start().await.unwrap();
        provider.start().await.unwrap();
        assert!(provider.is_running());

        provider.stop().await.unwrap();
        assert!(!provider.is_running());
        provider.stop().await.unwrap();
        assert!(!provider.is_running());
    }

    #[tokio::test]
    async fn no_frames_after_stop() {
        let (mut provider, mut frames) = provider(SignalDuration::Infinite);
        provider.start().await.unwrap();
        frames.recv().await.unwrap();
        provider.stop().await.unwrap();

        frames.try_recv();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(frames.try_recv(), None);
    }

    #[tokio::test]
    async fn slow_consumer_sees_latest_frame_only() {
        let (mut provider, mut frames) = provider(SignalDuration::Infinite);
        provider.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        provider.stop().await.unwrap();

        let latest = frames.try_recv().unwrap();
        assert!(latest[0].power > 0.05);
        assert_eq!(frames.try_recv(), None);
    }

    #[tokio::test]
    async fn stops_when_schedule_completes() {
        let (mut provider, mut frames) =
            provider(SignalDuration::Finite(Duration::from_millis(60)));
        provider.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!provider.is_running());

        let last = frames.try_recv().unwrap();
        assert!(last[0].power < 0.06);
        assert!(frames.is_closed());
        assert_eq!(frames.recv().await, None);

        //  The generator is reclaimed and production restarts from zero
        provider.start().await.unwrap();
        assert!(!frames.is_closed());
        let first = frames.recv().await.unwrap();
        assert!(first[0].power < 0.06);
        provider.stop().await.unwrap();
    }

    #[tokio::test]
    async fn waiting_receiver_returns_when_schedule_completes() {
        let (mut provider, mut frames) =
            provider(SignalDuration::Finite(Duration::from_millis(40)));
        provider.start().await.unwrap();

        let mut received = 0;
        let drained = tokio::time::timeout(Duration::from_secs(1), async {
            while frames.recv().await.is_some() {
                received += 1;
            }
        })
        .await;
        assert!(drained.is_ok());
        assert!(received > 0);
        provider.stop().await.unwrap();
    }

    #[tokio::test]
    async fn exits_when_receiver_dropped() {
        let (mut provider, frames) = provider(SignalDuration::Infinite);
        provider.start().await.unwrap();
        drop(frames);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!provider.is_running());
        provider.stop().await.unwrap();
    }
}
