//! Sink selection shared by `retry` and `limit`.

use std::sync::Arc;

use pacer_core::{EventSink, MemorySink, TracingSink};

/// Memory sink when the trail should be printed, tracing otherwise.
pub(crate) fn choose_sink(events: bool) -> (Arc<dyn EventSink>, Option<Arc<MemorySink>>) {
    if events {
        let memory = Arc::new(MemorySink::new());
        let sink: Arc<dyn EventSink> = memory.clone();
        (sink, Some(memory))
    } else {
        let sink: Arc<dyn EventSink> = Arc::new(TracingSink);
        (sink, None)
    }
}

pub(crate) fn print_events(memory: Option<&MemorySink>) {
    let Some(memory) = memory else {
        return;
    };
    println!("events:");
    for (level, message) in memory.events() {
        println!("  [{:<7}] {}", level, message);
    }
}
