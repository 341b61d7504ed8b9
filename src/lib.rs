//! insightdb - ingests zipped campus datasets and answers structured
//! queries over them
//!
//! Datasets arrive as base64 or raw zip archives of course sections or
//! building/room pages, are normalized into flat records and persisted.
//! Queries are JSON documents (`WHERE`, `OPTIONS`, optional
//! `TRANSFORMATIONS`) validated against the dataset catalog before they run.

pub mod cli;
pub mod config;
pub mod facade;
pub mod http_server;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod query;
pub mod repository;
