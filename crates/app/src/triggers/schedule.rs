//! Periodically repeated bus directives.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::TriggerEngine;
use crate::ports::{AlertSink, BusBridge, SettingsPersistence, StateMirror};

/// A directive re-sent to the bus bridge every `every`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatDirective {
    pub directive: String,
    pub every: Duration,
}

impl<M, P, B, A> TriggerEngine<M, P, B, A>
where
    M: StateMirror + 'static,
    P: SettingsPersistence + 'static,
    B: BusBridge + 'static,
    A: AlertSink + 'static,
{
    /// Start one task per configured repeat. Each stops when `cancel` fires.
    pub fn spawn_repeaters(&self, cancel: &CancellationToken) -> Vec<JoinHandle<()>> {
        self.config
            .repeats
            .iter()
            .filter(|repeat| !repeat.every.is_zero())
            .map(|repeat| {
                let bus = Arc::clone(&self.bus);
                let cancel = cancel.clone();
                let repeat = repeat.clone();
                tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(repeat.every);
                    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                    loop {
                        tokio::select! {
                            () = cancel.cancelled() => break,
                            _ = ticker.tick() => {
                                if let Err(err) = bus.enqueue(&repeat.directive).await {
                                    tracing::warn!(directive = %repeat.directive, error = %err, "repeated directive failed");
                                }
                            }
                        }
                    }
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use super::RepeatDirective;
    use crate::triggers::TriggerConfig;
    use crate::triggers::testing::Rig;

    #[tokio::test]
    async fn should_repeat_directive_until_cancelled() {
        let rig = Rig::new(TriggerConfig {
            repeats: vec![
                RepeatDirective {
                    directive: "keepalive".to_string(),
                    every: Duration::from_millis(10),
                },
                RepeatDirective {
                    directive: "never".to_string(),
                    every: Duration::ZERO,
                },
            ],
            ..TriggerConfig::default()
        });
        let cancel = CancellationToken::new();

        let handles = rig.engine.spawn_repeaters(&cancel);
        assert_eq!(handles.len(), 1);
        tokio::time::sleep(Duration::from_millis(55)).await;
        cancel.cancel();
        for handle in handles {
            handle.await.unwrap();
        }

        let sent = rig.bus.0.lock().clone();
        assert!(sent.len() >= 3, "sent {sent:?}");
        assert!(sent.iter().all(|d| d == "keepalive"));
    }
}
