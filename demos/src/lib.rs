//! Runnable demos live under `examples/`. Start `mock-service` first for the HTTP ones.
