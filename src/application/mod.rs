// Application layer - stores, builders and the controller state machine
pub mod chart_builder;
pub mod controller;
pub mod conversion;
pub mod dashboard_service;
pub mod data_source;
pub mod id_generator;
pub mod layout_store;
pub mod snapshot_repository;
pub mod widget_store;
