pub const INVALID_INPUT: &str = "invalid_input";
pub const UNKNOWN_TOOL: &str = "unknown_tool";

pub const METHOD_NOT_FOUND: i64 = -32601;
