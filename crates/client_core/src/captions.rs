//! Cosmetic progress captions shown while a generation is in flight.

use std::{convert::Infallible, time::Duration};

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptionStep {
    pub delay: Duration,
    pub message: &'static str,
}

/// Ordered `(delay, message)` steps. Delays are measured from the start of
/// the request and must not decrease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionSchedule {
    steps: Vec<CaptionStep>,
}

impl CaptionSchedule {
    pub fn new(steps: Vec<CaptionStep>) -> Self {
        Self { steps }
    }

    pub fn for_generation(use_wikipedia: bool) -> Self {
        if use_wikipedia {
            Self::new(vec![
                CaptionStep {
                    delay: Duration::ZERO,
                    message: "📖 Получаем данные из Википедии...",
                },
                CaptionStep {
                    delay: Duration::from_secs(2),
                    message: "✨ AI обрабатывает информацию...",
                },
            ])
        } else {
            Self::new(vec![CaptionStep {
                delay: Duration::ZERO,
                message: "✨ Генерация текста...",
            }])
        }
    }

    pub fn steps(&self) -> &[CaptionStep] {
        &self.steps
    }

    pub fn caption_at(&self, elapsed: Duration) -> Option<&'static str> {
        self.steps
            .iter()
            .take_while(|step| step.delay <= elapsed)
            .last()
            .map(|step| step.message)
    }

    /// Publishes each caption when its delay passes, then waits forever.
    /// Dropping the future is the only way to stop it.
    pub async fn play(&self, sink: &watch::Sender<Option<String>>) -> Infallible {
        let mut elapsed = Duration::ZERO;
        for step in &self.steps {
            tokio::time::sleep(step.delay.saturating_sub(elapsed)).await;
            elapsed = elapsed.max(step.delay);
            sink.send_replace(Some(step.message.to_string()));
        }
        std::future::pending().await
    }
}
