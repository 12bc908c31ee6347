// Session persistence for the answer loop.
// The engine is pure; this module owns the only shared mutable state and
// serializes writes per session with optimistic versioning.

pub mod store;
