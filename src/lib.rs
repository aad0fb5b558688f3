pub mod compat;
pub mod config;
pub mod environment;
pub mod errors;
pub mod game;
pub mod id;
pub mod normalization;
pub mod payload;
pub mod repository;
pub mod review;
pub mod routes;
pub mod store;
pub mod timestamp;
