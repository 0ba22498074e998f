// Domain layer - Widget, chart and layout state model
pub mod chart;
pub mod dashboard;
pub mod error;
pub mod layout;
pub mod widget;
