use super::AlertChannel;
use crate::alerts::models::{Alert, ChannelKind, Recipients};
use crate::errors::ChannelError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Clone, Copy)]
pub enum Behavior {
    Succeed,
    Fail,
    Hang,
}

/// In-process channel that counts calls.
pub struct MockChannel {
    kind: ChannelKind,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl MockChannel {
    pub fn new(kind: ChannelKind, behavior: Behavior) -> Self {
        Self {
            kind,
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlertChannel for MockChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    async fn send(&self, _alert: &Alert, recipients: &Recipients) -> Result<Vec<String>, ChannelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Succeed => Ok(recipients.email.clone()),
            Behavior::Fail => Err(ChannelError::Http("500 Internal Server Error: boom".into())),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
        }
    }
}
