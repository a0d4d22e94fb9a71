pub mod assets;
pub mod fetch_worker;
pub mod settings;
pub mod source_cache;
