use crate::envelope::DatumEnvelope;

/// Observer notified after each successful serialization or deserialization.
///
/// Both hooks default to doing nothing. Implementations are treated as
/// best-effort telemetry: a panic inside a hook is contained by the caller.
pub trait SerDeListener<T>: Send + Sync {
    fn on_serialize(
        &self,
        _stream_name: &str,
        _datum: &T,
        _envelope: &DatumEnvelope,
        _byte_len: usize,
    ) {
    }

    fn on_deserialize(
        &self,
        _stream_name: &str,
        _datum: &T,
        _envelope: &DatumEnvelope,
        _byte_len: usize,
    ) {
    }
}

/// Listener that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl<T> SerDeListener<T> for NoopListener {}

/// Run a listener hook, containing any panic so it cannot replace the
/// result the caller already holds.
pub(crate) fn run_contained(hook: &'static str, stream_name: &str, call: impl FnOnce()) {
    if std::panic::catch_unwind(std::panic::AssertUnwindSafe(call)).is_err() {
        tracing::warn!(hook, stream = stream_name, "SerDe listener panicked; ignoring");
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod recording {
    use std::sync::Mutex;

    use super::*;

    /// Which hook fired.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum SerDeEventKind {
        Serialize,
        Deserialize,
    }

    /// One captured listener call.
    #[derive(Debug, Clone, PartialEq)]
    pub struct SerDeEvent<T> {
        pub kind: SerDeEventKind,
        pub stream_name: String,
        pub datum: T,
        pub envelope: DatumEnvelope,
        pub byte_len: usize,
    }

    /// Listener that records every call, for tests.
    pub struct RecordingListener<T> {
        events: Mutex<Vec<SerDeEvent<T>>>,
    }

    impl<T> Default for RecordingListener<T> {
        fn default() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
            }
        }
    }

    impl<T: Clone> RecordingListener<T> {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<SerDeEvent<T>> {
            self.events.lock().unwrap().clone()
        }

        pub fn len(&self) -> usize {
            self.events.lock().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        fn record(
            &self,
            kind: SerDeEventKind,
            stream_name: &str,
            datum: &T,
            envelope: &DatumEnvelope,
            byte_len: usize,
        ) {
            self.events.lock().unwrap().push(SerDeEvent {
                kind,
                stream_name: stream_name.to_string(),
                datum: datum.clone(),
                envelope: envelope.clone(),
                byte_len,
            });
        }
    }

    impl<T: Clone + Send> SerDeListener<T> for RecordingListener<T> {
        fn on_serialize(
            &self,
            stream_name: &str,
            datum: &T,
            envelope: &DatumEnvelope,
            byte_len: usize,
        ) {
            self.record(
                SerDeEventKind::Serialize,
                stream_name,
                datum,
                envelope,
                byte_len,
            );
        }

        fn on_deserialize(
            &self,
            stream_name: &str,
            datum: &T,
            envelope: &DatumEnvelope,
            byte_len: usize,
        ) {
            self.record(
                SerDeEventKind::Deserialize,
                stream_name,
                datum,
                envelope,
                byte_len,
            );
        }
    }
}
