//! Key/value event hooks routed through `tracing`.
//!
//! Subscribers are installed by the binary; without one these are no-ops.

pub fn emit_span(event: &str, key_values: &[(&str, String)]) {
    let span = tracing::debug_span!("shardtab", event);
    let _guard = span.enter();
    for (k, v) in key_values {
        tracing::debug!(%event, key = %k, value = %v, "metric");
    }
}
