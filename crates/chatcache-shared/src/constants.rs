/// Storage key of the record holding chats, users, groups and options
pub const CACHE_KEY: &str = "cache";

/// Storage key of the record holding `(file id, data URL)` pairs
pub const FILES_KEY: &str = "files";

/// Format version written into every cache record.
/// Records carrying any other version are ignored on load.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Quiet period before a requested save actually runs, in milliseconds
pub const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 2_000;

/// Largest file payload embedded into the files record (5 MiB)
pub const DEFAULT_MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// Mime type used when the payload's magic bytes are not recognised
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// Application name, used for the data directory
pub const APP_NAME: &str = "chatcache";
