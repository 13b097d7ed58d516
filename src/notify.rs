use tracing::{error, info};

/// Toast-style side channel. The workflow reports outcomes here instead of
/// owning a rendering surface, so its logic stays testable without one.
pub trait Notifier: Send {
    fn success(&self, title: &str, detail: &str);
    fn error(&self, title: &str, detail: &str);
}

/// Routes notifications through the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, title: &str, detail: &str) {
        info!("{}: {}", title, detail);
    }

    fn error(&self, title: &str, detail: &str) {
        error!("{}: {}", title, detail);
    }
}
