//! Configuration access port trait.

/// Section/key lookup over a loaded configuration source.
///
/// Integer and boolean getters fall back to `default` when the key is missing
/// or unparseable; use `get_string` when the distinction matters.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;
}
