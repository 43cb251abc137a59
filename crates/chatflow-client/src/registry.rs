//! Streaming registry: decouples network arrival of text fragments
//! from rendering.
//!
//! An injectable keyed store, not a singleton. The consumer that owns a
//! turn is the only writer for its stream id; renderers subscribe and
//! only observe. `append`/`complete` on an unknown or already-completed
//! id are no-ops, which defends against duplicate frames and writes
//! from superseded turns.

use std::collections::HashMap;

use parking_lot::RwLock;

/// Client-side accumulation state for one in-flight stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamState {
    pub accumulated: String,
    pub is_active: bool,
}

/// Event delivered to registry subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamUpdate {
    Started {
        stream_id: String,
    },
    Appended {
        stream_id: String,
        fragment: String,
        accumulated: String,
    },
    Completed {
        stream_id: String,
        accumulated: String,
    },
}

type Subscriber = Box<dyn Fn(&StreamUpdate) + Send + Sync>;

/// Keyed store mapping stream ids to their accumulation state.
#[derive(Default)]
pub struct StreamingRegistry {
    streams: RwLock<HashMap<String, StreamState>>,
    subscribers: RwLock<Vec<Subscriber>>,
}

impl StreamingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a renderer callback. Callbacks run synchronously, after
    /// the state write that produced the event has been released.
    pub fn subscribe(&self, subscriber: impl Fn(&StreamUpdate) + Send + Sync + 'static) {
        self.subscribers.write().push(Box::new(subscriber));
    }

    /// Begin tracking a stream. Creating an id that already exists
    /// resets its state; the new turn owns the id from here on.
    pub fn create_stream(&self, id: &str) {
        self.streams.write().insert(
            id.to_string(),
            StreamState {
                accumulated: String::new(),
                is_active: true,
            },
        );
        self.notify(&StreamUpdate::Started {
            stream_id: id.to_string(),
        });
    }

    /// Append a text fragment. Returns false (and does nothing) for an
    /// unknown or completed id.
    pub fn append(&self, id: &str, fragment: &str) -> bool {
        let update = {
            let mut streams = self.streams.write();
            match streams.get_mut(id) {
                Some(state) if state.is_active => {
                    state.accumulated.push_str(fragment);
                    StreamUpdate::Appended {
                        stream_id: id.to_string(),
                        fragment: fragment.to_string(),
                        accumulated: state.accumulated.clone(),
                    }
                }
                _ => return false,
            }
        };
        self.notify(&update);
        true
    }

    /// Finalize a stream, removing its state and returning the
    /// accumulated text. A no-op for unknown ids.
    pub fn complete(&self, id: &str) -> Option<String> {
        let state = self.streams.write().remove(id)?;
        self.notify(&StreamUpdate::Completed {
            stream_id: id.to_string(),
            accumulated: state.accumulated.clone(),
        });
        Some(state.accumulated)
    }

    /// Current state of a stream, if it is still tracked.
    pub fn snapshot(&self, id: &str) -> Option<StreamState> {
        self.streams.read().get(id).cloned()
    }

    fn notify(&self, update: &StreamUpdate) {
        for subscriber in self.subscribers.read().iter() {
            subscriber(update);
        }
    }
}
