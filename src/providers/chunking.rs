//! Splitting URL lists into vendor-sized batches.

/// Consecutive chunks of at most `limit` URLs, in original order.
///
/// A zero limit is treated as one URL per chunk.
pub fn chunk_urls(urls: &[String], limit: usize) -> std::slice::Chunks<'_, String> {
    urls.chunks(limit.max(1))
}

/// Number of chunks `chunk_urls` yields: `ceil(len / limit)`
pub fn chunk_count(len: usize, limit: usize) -> usize {
    len.div_ceil(limit.max(1))
}
