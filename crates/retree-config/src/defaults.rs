/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "info";
