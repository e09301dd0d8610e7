//! Periodic sweep that pushes a notification when tasks fall due soon.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::models::{NotificationPayload, Task};
use crate::push::PushSender;
use crate::store::Store;

/// Outcome of one sweep tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Tasks found inside the lookahead window.
    pub due: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Run one sweep at `now`.
///
/// All tasks due within `[now, now + lookahead]` are folded into a single
/// payload, delivered once to every subscription. Delivery failures are
/// logged and counted, never returned.
pub async fn sweep_tick<S: PushSender + ?Sized>(
    store: &Store,
    sender: &S,
    now: DateTime<Utc>,
    lookahead: chrono::Duration,
) -> SweepReport {
    let Some(until) = now.checked_add_signed(lookahead) else {
        tracing::warn!("Lookahead {} overflows from {}, skipping sweep", lookahead, now);
        return SweepReport::default();
    };

    let due = store.tasks_due_within(now, until).await;
    let mut report = SweepReport {
        due: due.len(),
        ..Default::default()
    };

    let Some(payload) = build_payload(&due, now) else {
        return report;
    };

    let subscriptions = store.list_subscriptions().await;
    tracing::info!(
        "{} task(s) due soon, notifying {} subscription(s)",
        due.len(),
        subscriptions.len()
    );

    for subscription in &subscriptions {
        match sender.deliver(subscription, &payload).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                tracing::warn!("Push delivery to {} failed: {}", subscription.endpoint, e);
                report.failed += 1;
            }
        }
    }

    report
}

/// Build the notification for a non-empty set of due tasks, earliest first.
pub fn build_payload(due: &[Task], now: DateTime<Utc>) -> Option<NotificationPayload> {
    let first = due.first()?;
    let minutes = (first.time - now).num_minutes().max(0);

    let mut body = format!(
        "\"{}\" is due in {} minute{}",
        first.title,
        minutes,
        if minutes == 1 { "" } else { "s" }
    );
    match due.len() - 1 {
        0 => {}
        1 => body.push_str(" (and 1 more task)"),
        n => body.push_str(&format!(" (and {} more tasks)", n)),
    }

    Some(NotificationPayload {
        title: "Upcoming task".to_string(),
        body,
        task_ids: due.iter().map(|task| task.id.clone()).collect(),
    })
}

/// Tick every `interval` until `shutdown` flips to true.
pub async fn run_sweep_loop(
    store: Arc<Store>,
    sender: Arc<dyn PushSender>,
    interval: Duration,
    lookahead: chrono::Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tracing::info!(
        "Notification sweep running every {:?} with {} minute lookahead",
        interval,
        lookahead.num_minutes()
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = sweep_tick(&store, sender.as_ref(), Utc::now(), lookahead).await;
                if report.failed > 0 {
                    tracing::warn!(
                        "Sweep delivered {} notification(s), {} failed",
                        report.delivered,
                        report.failed
                    );
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    tracing::info!("Notification sweep stopped");
}
