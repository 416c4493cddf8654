use std::sync::Arc;
use std::time::Duration;

use log::{debug, error};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::ping::Sample;
use crate::prober::Prober;
use crate::sampler::{SampleSettings, Sampler};

/// Runs one sampler per target concurrently and collects every sample.
pub struct Scheduler {
    targets: Vec<String>,
    settings: SampleSettings,
    prober: Arc<dyn Prober>,
}

impl Scheduler {
    pub fn new(targets: Vec<String>, settings: SampleSettings, prober: Arc<dyn Prober>) -> Self {
        Self {
            targets,
            settings,
            prober,
        }
    }

    /// Blocks until every sampler has finished its rounds or stopped on
    /// `cancel`. Samples come back in arrival order, interleaved across
    /// targets.
    pub async fn collect(self, cancel: CancellationToken) -> Vec<Sample> {
        // Senders wait while the channel is full.
        let (tx, mut rx) = mpsc::channel(self.targets.len().max(1) * 2);

        let mut workers = JoinSet::new();
        for target in self.targets {
            let sampler = Sampler::new(target, self.settings, Arc::clone(&self.prober));
            workers.spawn(sampler.run(tx.clone(), cancel.clone()));
        }
        // The channel closes once the last worker drops its sender.
        drop(tx);

        let mut samples = Vec::new();
        while let Some(sample) = rx.recv().await {
            samples.push(sample);
        }

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(emitted) => debug!("Sampler finished after {} samples", emitted),
                Err(e) => error!("Sampler task failed: {}", e),
            }
        }

        samples
    }
}

/// Cancels `cancel` once `deadline` elapses. The timer stops on its own if
/// the token is cancelled first; abort the handle to stop it earlier.
pub fn spawn_deadline(
    deadline: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(deadline) => {
                debug!("Deadline of {:?} reached, cancelling", deadline);
                cancel.cancel();
            }
            _ = cancel.cancelled() => {}
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prober::ProbeOutcome;
    use async_trait::async_trait;

    struct Fixed(Duration);

    #[async_trait]
    impl Prober for Fixed {
        async fn probe(&self, _: &str, _: usize, _: Duration) -> ProbeOutcome {
            ProbeOutcome::Reply(self.0)
        }
    }

    struct Panicking;

    #[async_trait]
    impl Prober for Panicking {
        async fn probe(&self, target: &str, _: usize, _: Duration) -> ProbeOutcome {
            if target == "bad" {
                panic!("probe exploded");
            }
            ProbeOutcome::Lost
        }
    }

    fn settings(samples: u32) -> SampleSettings {
        SampleSettings {
            samples,
            interval: Duration::from_millis(1),
            timeout: Duration::from_millis(10),
            packet_size: 56,
        }
    }

    #[tokio::test]
    async fn test_collects_every_sample() {
        let targets = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let scheduler = Scheduler::new(targets, settings(4), Arc::new(Fixed(Duration::from_millis(3))));

        let samples = scheduler.collect(CancellationToken::new()).await;
        assert_eq!(samples.len(), 12);
        for target in ["a", "b", "c"] {
            assert_eq!(samples.iter().filter(|s| s.target == target).count(), 4);
        }
    }

    #[tokio::test]
    async fn test_panicking_worker_does_not_hang_collection() {
        let targets = vec!["bad".to_string(), "good".to_string()];
        let samples = Scheduler::new(targets, settings(3), Arc::new(Panicking))
            .collect(CancellationToken::new())
            .await;

        assert_eq!(samples.len(), 3);
        assert!(samples.iter().all(|s| s.target == "good" && !s.is_success()));
    }

    #[tokio::test]
    async fn test_deadline_cancels_token() {
        let cancel = CancellationToken::new();
        let handle = spawn_deadline(Duration::from_millis(10), cancel.clone());
        tokio::time::timeout(Duration::from_secs(5), cancel.cancelled())
            .await
            .unwrap();
        handle.await.unwrap();
    }
}
