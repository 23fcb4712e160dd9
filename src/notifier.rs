//! Change notification broadcasting.
//!
//! After a successful sync the watcher hands the changed node ids to a
//! [`ChangeNotifier`], which forwards them to any subscribed live-reload
//! collaborator over a broadcast channel. Delivery is fire-and-forget:
//! a missed notification is not a correctness failure of the tree, so
//! send errors are logged and swallowed and the watcher never blocks.

use tokio::sync::broadcast;

/// Events published after a completed sync.
#[derive(Debug, Clone)]
pub enum TreeChangeEvent {
    /// Nodes were created or re-synced.
    PathsChanged { ids: Vec<String> },
    /// Nodes were removed, descendants included.
    PathsRemoved { ids: Vec<String> },
    /// The figures document was re-published.
    FiguresChanged,
    /// The whole tree was rebuilt from disk.
    TreeRebuilt,
}

/// Broadcasts tree change events to live-reload subscribers.
#[derive(Clone)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<TreeChangeEvent>,
}

impl ChangeNotifier {
    /// Create a notifier with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Send an event to all subscribers. Never fails, never blocks.
    pub fn notify(&self, event: TreeChangeEvent) {
        match self.sender.send(event.clone()) {
            Ok(count) => {
                crate::debug_event!("notify", "sent", "{event:?} to {count} subscribers");
            }
            Err(_) => {
                // No receivers, this is fine.
                crate::debug_event!("notify", "dropped", "no subscribers for {event:?}");
            }
        }
    }

    /// Subscribe to receive change events.
    pub fn subscribe(&self) -> broadcast::Receiver<TreeChangeEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notify_reaches_subscriber() {
        let notifier = ChangeNotifier::new(8);
        let mut rx = notifier.subscribe();

        notifier.notify(TreeChangeEvent::PathsChanged {
            ids: vec!["2/3".to_string()],
        });

        match rx.recv().await.unwrap() {
            TreeChangeEvent::PathsChanged { ids } => assert_eq!(ids, vec!["2/3"]),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_notify_without_subscribers_is_swallowed() {
        let notifier = ChangeNotifier::new(8);
        // Must not panic or block.
        notifier.notify(TreeChangeEvent::FiguresChanged);
    }
}
