pub mod backing;
pub mod index;
pub mod index_store;
pub mod key_range;
pub mod row_cache;
