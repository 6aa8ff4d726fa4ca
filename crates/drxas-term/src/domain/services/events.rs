use tokio::sync::mpsc;
use tokio::time;

use crate::domain::models::Event;

pub const TICK: time::Duration = time::Duration::from_millis(500);

/// Input of the control loop: queued events, interleaved with a steady tick.
pub struct EventsService {
    events: mpsc::UnboundedReceiver<Event>,
    interval: time::Interval,
}

/// Ticks keep their cadence however busy the queue is. Missed ticks are
/// dropped rather than fired in a burst.
fn ticker(tick: time::Duration) -> time::Interval {
    let mut interval = time::interval_at(time::Instant::now() + tick, tick);
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
    return interval;
}

impl EventsService {
    pub fn new(events: mpsc::UnboundedReceiver<Event>) -> EventsService {
        return EventsService {
            events,
            interval: ticker(TICK),
        };
    }

    pub fn with_tick(mut self, tick: time::Duration) -> EventsService {
        self.interval = ticker(tick);
        return self;
    }

    /// The next event, or `None` once every sender is gone.
    pub async fn next(&mut self) -> Option<Event> {
        return tokio::select! {
            event = self.events.recv() => event,
            _ = self.interval.tick() => Some(Event::UITick)
        };
    }
}
