//! Logging sink for exceptions nobody handled
//!
//! The exceptions handler reports unknown exceptions through an
//! [`ExceptionLogger`] handed to it at construction. [`TracingLogger`] forwards
//! to `tracing`.

use crate::config::DEFAULT_LOGGER_CONTEXT;

/// Sink for unknown-exception reports
pub trait ExceptionLogger: Send + Sync + 'static {
    fn error(&self, message: &str, trace: Option<&str>);
}

/// Logs through `tracing::error!`, tagged with a context name
#[derive(Debug, Clone)]
pub struct TracingLogger {
    context: String,
}

impl TracingLogger {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new(DEFAULT_LOGGER_CONTEXT)
    }
}

impl ExceptionLogger for TracingLogger {
    fn error(&self, message: &str, trace: Option<&str>) {
        match trace {
            Some(trace) => tracing::error!(context = %self.context, trace = %trace, "{}", message),
            None => tracing::error!(context = %self.context, "{}", message),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingLogger;
    use super::*;

    #[test]
    fn test_tracing_logger_context() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let logger = TracingLogger::default();
        assert_eq!(logger.context(), "RpcExceptionsHandler");
        logger.error("boom", Some("at handler"));
        logger.error("boom", None);
    }

    #[test]
    fn test_recording_logger() {
        let logger = RecordingLogger::default();
        let sink: &dyn ExceptionLogger = &logger;
        sink.error("first", None);
        sink.error("second", Some("trace"));

        assert_eq!(
            logger.records(),
            vec![
                ("first".to_string(), None),
                ("second".to_string(), Some("trace".to_string())),
            ]
        );
    }
}
