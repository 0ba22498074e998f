// Dashboard builder - widget and layout state model behind a JSON API
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
