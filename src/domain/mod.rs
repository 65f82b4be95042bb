// Domain layer - chart data model, value objects and the viewport state machine
pub mod analytics;
pub mod chart_point;
pub mod errors;
pub mod metric;
pub mod metric_config;
pub mod prediction;
pub mod records;
pub mod scale;
pub mod scene;
pub mod timeline;
pub mod viewport;
