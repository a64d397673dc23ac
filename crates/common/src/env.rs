/// Environment-backed configuration block. Each deployable concern owns a
/// struct implementing this, loading its variables once at startup.
pub trait EnvVars {
    fn load() -> Self;
    fn get_env_var(&self, key: &str) -> String;
}
