mod env;

pub use env::EnvVars;

/// Current wall-clock time as unix seconds, the representation every
/// entity's `created_at`/`updated_at` column uses.
pub fn get_current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}
