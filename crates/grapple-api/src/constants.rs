/// API route prefix
pub const API_PREFIX: &str = "/api/v0";

/// Allowance on top of the max video size for multipart boundaries and the
/// text parts sent alongside the file.
pub const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Default max in-flight HTTP requests. Override with `HTTP_CONCURRENCY_LIMIT`.
pub const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
