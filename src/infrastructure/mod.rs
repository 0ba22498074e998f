// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod file_snapshot_repository;
pub mod http_data_source;
pub mod http_response;
pub mod memory_snapshot_repository;
