//! Flutter-facing bindings over `capsule_core`.

pub mod api;
