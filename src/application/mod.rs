pub mod analytics;
pub mod lod_aggregator;
pub mod point_mapper;
pub mod predictions;
pub mod refresh_controller;
pub mod scale_builder;
pub mod session;
pub mod telemetry_source;
pub mod timeline_unifier;
