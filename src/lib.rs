pub mod annotation;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod kegg;
pub mod matrix;
pub mod metadata;
pub mod metrics;
pub mod output;
pub mod plot;
