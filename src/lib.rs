//! Pickup Sports API - Backend for a pickup-sports scheduling app
//!
//! This crate provides the REST API for scheduling pickup games, enabling:
//! - User registration, login, and profile management
//! - Game creation with geocoded locations, plus RSVP tracking
//! - Admin moderation (blocking and unblocking users)

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
