use std::sync::Mutex;

/// Trait for receiving messages the compiler emits while it runs
/// This allows for dependency injection and testing with mock receivers
pub trait CompilerLogger: Send + Sync {
    fn warning(&self, message: &str);
    fn debug(&self, message: &str);
}

/// Routes compiler messages into the `tracing` subscriber
#[derive(Debug, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl CompilerLogger for TracingLogger {
    fn warning(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!("{}", message);
    }
}

/// Collecting logger for testing
/// Collects all messages without printing them
#[derive(Debug, Default)]
pub struct CollectingLogger {
    warnings: Mutex<Vec<String>>,
    debug_messages: Mutex<Vec<String>>,
}

impl CollectingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }

    pub fn debug_messages(&self) -> Vec<String> {
        self.debug_messages.lock().unwrap().clone()
    }
}

impl CompilerLogger for CollectingLogger {
    fn warning(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }

    fn debug(&self, message: &str) {
        self.debug_messages.lock().unwrap().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_logger_records_messages() {
        let logger = CollectingLogger::new();
        logger.warning("deprecated division");
        logger.debug("resolved tokens");

        assert_eq!(logger.warnings(), vec!["deprecated division".to_string()]);
        assert_eq!(logger.debug_messages(), vec!["resolved tokens".to_string()]);
    }

    #[test]
    fn test_collecting_logger_starts_empty() {
        let logger = CollectingLogger::new();
        assert!(logger.warnings().is_empty());
        assert!(logger.debug_messages().is_empty());
    }
}
