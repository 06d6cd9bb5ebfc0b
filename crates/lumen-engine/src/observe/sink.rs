/// Observability collaborator.
///
/// Receives the periodic `"FPS: <n>"` status line and one diagnostic line per
/// shader/program failure. Implementations must not block: both calls happen
/// on the frame thread.
pub trait StatusSink {
    fn publish_status(&mut self, status: &str);

    fn publish_diagnostic(&mut self, line: &str);
}

/// Forwards everything to the `log` facade.
#[derive(Debug, Default, Copy, Clone)]
pub struct LogSink;

impl StatusSink for LogSink {
    fn publish_status(&mut self, status: &str) {
        log::info!("{status}");
    }

    fn publish_diagnostic(&mut self, line: &str) {
        log::error!("{line}");
    }
}

/// Keeps every message in memory.
///
/// Used by tests and by hosts that want to display the latest status
/// themselves (the viewer puts it in the window title).
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub statuses: Vec<String>,
    pub diagnostics: Vec<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent status line, if any.
    pub fn latest_status(&self) -> Option<&str> {
        self.statuses.last().map(String::as_str)
    }
}

impl StatusSink for MemorySink {
    fn publish_status(&mut self, status: &str) {
        log::debug!("{status}");
        self.statuses.push(status.to_owned());
    }

    fn publish_diagnostic(&mut self, line: &str) {
        log::debug!("{line}");
        self.diagnostics.push(line.to_owned());
    }
}

impl<S: StatusSink + ?Sized> StatusSink for &mut S {
    fn publish_status(&mut self, status: &str) {
        (**self).publish_status(status);
    }

    fn publish_diagnostic(&mut self, line: &str) {
        (**self).publish_diagnostic(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_keeps_order() {
        let mut sink = MemorySink::new();
        sink.publish_status("FPS: 10");
        sink.publish_status("FPS: 12");
        sink.publish_diagnostic("bad shader");

        assert_eq!(sink.statuses, vec!["FPS: 10", "FPS: 12"]);
        assert_eq!(sink.latest_status(), Some("FPS: 12"));
        assert_eq!(sink.diagnostics.len(), 1);
    }

    #[test]
    fn forwarding_through_mut_ref() {
        fn publish<S: StatusSink>(mut sink: S) {
            sink.publish_status("FPS: 1");
        }

        let mut sink = MemorySink::new();
        publish(&mut sink);
        assert_eq!(sink.latest_status(), Some("FPS: 1"));
    }
}
