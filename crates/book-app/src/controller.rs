use std::time::Duration;

use book_core::types::AppEvent;
use book_vision::FrameSource;
use kanal::{AsyncReceiver, AsyncSender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::input::input_io;
use crate::update::{Foreground, update_loop};

/// Centralized channel management
pub struct ChannelSet {
    pub events: (AsyncSender<AppEvent>, AsyncReceiver<AppEvent>),
}

impl ChannelSet {
    pub fn new() -> Self {
        Self {
            events: kanal::bounded_async(64),
        }
    }
}

/// Application controller for task spawning and lifecycle
pub struct AppController {
    channels: ChannelSet,
    cancel_token: CancellationToken,
}

impl AppController {
    pub fn new() -> Self {
        Self {
            channels: ChannelSet::new(),
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn spawn_tasks(
        &self,
        foreground: Foreground,
        source: Box<dyn FrameSource + Send>,
        frame_interval: Duration,
    ) -> JoinSet<anyhow::Result<()>> {
        let mut tasks = JoinSet::new();

        // Foreground update loop
        tasks.spawn(update_loop(
            foreground,
            source,
            frame_interval,
            self.channels.events.1.clone(),
            self.cancel_token.clone(),
        ));

        // Console command reader. Both tasks share one token so a quit
        // command from either side stops the other.
        tasks.spawn(input_io(
            self.channels.events.0.clone(),
            self.cancel_token.clone(),
        ));

        tasks
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}
