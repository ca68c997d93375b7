/// Default page size for collection listings
pub const DEFAULT_LIST_LIMIT: i64 = 24;

/// Default page size for the media library listing
pub const DEFAULT_MEDIA_LIST_LIMIT: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

/// Maximum accepted keyword length for collection searches
pub const DEFAULT_MAX_KEYWORD_LENGTH: usize = 100;

/// Maximum number of ids accepted by bulk operations
pub const MAX_BULK_ITEMS: usize = 1000;
