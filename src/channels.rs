use crate::prelude::*;

#[derive(Debug, Clone)]
pub struct Channels {
    pub to_poller: broadcast::Sender<crate::poller::ChannelData>,
    pub from_poller: broadcast::Sender<crate::poller::ChannelData>,
    pub to_alarm_events: broadcast::Sender<alarms::ChannelData>,
}

impl Default for Channels {
    fn default() -> Self {
        Self::new()
    }
}

impl Channels {
    pub fn new() -> Self {
        Self {
            to_poller: Self::channel(),
            from_poller: Self::channel(),
            to_alarm_events: Self::channel(),
        }
    }

    fn channel<T: Clone>() -> broadcast::Sender<T> {
        broadcast::channel(2048).0
    }
}
