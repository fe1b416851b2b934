//! Persisted key layout.
//!
//! The `pc_` namespace matches data written by the browser build, so a
//! dumped storage area can be loaded as-is.

pub const INDEX_KEY: &str = "pc_capsules_index";
const CAPSULE_PREFIX: &str = "pc_capsule_";
const PROGRESS_PREFIX: &str = "pc_progress_";

pub fn capsule_key(id: &str) -> String {
    format!("{CAPSULE_PREFIX}{id}")
}

pub fn progress_key(id: &str) -> String {
    format!("{PROGRESS_PREFIX}{id}")
}

#[cfg(test)]
mod tests {
    use super::{capsule_key, progress_key, INDEX_KEY};

    #[test]
    fn keys_do_not_collide() {
        assert_eq!(capsule_key("42"), "pc_capsule_42");
        assert_eq!(progress_key("42"), "pc_progress_42");
        assert_ne!(capsule_key("s_index"), INDEX_KEY);
    }
}
