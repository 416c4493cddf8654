use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::debug;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::ping::Sample;
use crate::prober::{ProbeOutcome, Prober};

/// Per-round settings shared by every sampler of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleSettings {
    pub samples: u32,
    pub interval: Duration,
    pub timeout: Duration,
    pub packet_size: usize,
}

/// Drives one target through its rounds.
pub struct Sampler {
    target: String,
    settings: SampleSettings,
    prober: Arc<dyn Prober>,
}

impl Sampler {
    pub fn new(target: impl Into<String>, settings: SampleSettings, prober: Arc<dyn Prober>) -> Self {
        Self {
            target: target.into(),
            settings,
            prober,
        }
    }

    /// Emits one sample per round until all rounds are done or `cancel`
    /// fires. Returns the number of samples emitted.
    ///
    /// The interval is slept after every round, including failed ones and
    /// the last one. Cancellation is checked at the top of each round and
    /// also cuts the sleep short.
    pub async fn run(self, tx: mpsc::Sender<Sample>, cancel: CancellationToken) -> u32 {
        let mut emitted = 0;

        for round in 0..self.settings.samples {
            if cancel.is_cancelled() {
                debug!("{}: cancelled before round {}", self.target, round);
                break;
            }

            let outcome = self
                .prober
                .probe(&self.target, self.settings.packet_size, self.settings.timeout)
                .await;
            let timestamp = Utc::now();
            let sample = match outcome {
                ProbeOutcome::Reply(rtt) => Sample::success(&self.target, timestamp, rtt),
                ProbeOutcome::Lost => Sample::failure(&self.target, timestamp),
            };
            debug!("{}: round {} -> {:?}", self.target, round, sample.rtt_ms);

            // Receiver gone means nobody will read the result.
            if tx.send(sample).await.is_err() {
                break;
            }
            emitted += 1;

            tokio::select! {
                _ = tokio::time::sleep(self.settings.interval) => {}
                _ = cancel.cancelled() => {}
            }
        }

        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Alternates replies and losses, starting with a reply.
    struct Alternating {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Prober for Alternating {
        async fn probe(&self, _: &str, _: usize, _: Duration) -> ProbeOutcome {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n % 2 == 0 {
                ProbeOutcome::Reply(Duration::from_micros(10_250))
            } else {
                ProbeOutcome::Lost
            }
        }
    }

    struct Silent;

    #[async_trait]
    impl Prober for Silent {
        async fn probe(&self, _: &str, _: usize, _: Duration) -> ProbeOutcome {
            ProbeOutcome::Lost
        }
    }

    fn settings(samples: u32, interval_ms: u64) -> SampleSettings {
        SampleSettings {
            samples,
            interval: Duration::from_millis(interval_ms),
            timeout: Duration::from_millis(50),
            packet_size: 56,
        }
    }

    #[tokio::test]
    async fn test_emits_one_sample_per_round() {
        let prober = Arc::new(Alternating { calls: AtomicU32::new(0) });
        let (tx, mut rx) = mpsc::channel(16);
        let sampler = Sampler::new("host", settings(5, 1), prober.clone());

        let emitted = sampler.run(tx, CancellationToken::new()).await;
        assert_eq!(emitted, 5);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 5);

        let mut samples = Vec::new();
        while let Some(s) = rx.recv().await {
            samples.push(s);
        }
        let rtts: Vec<_> = samples.iter().map(|s| s.rtt_ms).collect();
        assert_eq!(rtts, vec![Some(10.25), None, Some(10.25), None, Some(10.25)]);
        assert!(samples.iter().all(|s| s.target == "host"));
        assert!(samples.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn test_lost_rounds_sleep_full_interval() {
        let (tx, mut rx) = mpsc::channel(16);

        let start = std::time::Instant::now();
        let emitted = Sampler::new("host", settings(3, 40), Arc::new(Silent))
            .run(tx, CancellationToken::new())
            .await;
        assert_eq!(emitted, 3);
        assert!(start.elapsed() >= Duration::from_millis(120));

        let mut failed = 0;
        while let Some(s) = rx.recv().await {
            assert!(!s.is_success());
            failed += 1;
        }
        assert_eq!(failed, 3);
    }

    #[tokio::test]
    async fn test_pre_cancelled_emits_nothing() {
        let prober = Arc::new(Alternating { calls: AtomicU32::new(0) });
        let (tx, mut rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let emitted = Sampler::new("host", settings(3, 1), prober.clone())
            .run(tx, cancel)
            .await;
        assert_eq!(emitted, 0);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 0);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_interrupts_sleep() {
        let prober = Arc::new(Alternating { calls: AtomicU32::new(0) });
        let (tx, _rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            trigger.cancel();
        });

        let start = std::time::Instant::now();
        let emitted = Sampler::new("host", settings(10, 10_000), prober)
            .run(tx, cancel)
            .await;
        assert_eq!(emitted, 1);
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
