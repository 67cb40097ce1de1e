//! Cake Shop Core - Shared types and client-side logic.
//!
//! This crate provides the types and local logic used across all Cake Shop
//! components:
//! - `client` - REST client for the Cake Shop backend
//! - `cli` - Command-line front-end for customers and admins
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, statuses and roles
//! - [`models`] - Backend JSON payloads (cakes, carts, orders, users, ...)
//! - [`card`] - Card number formatting, network detection, Luhn and form validation
//! - [`calendar`] - Order calendar markings for the admin dashboard
//! - [`recipe`] - Recipes and normalization of their legacy payload shapes
//! - [`catalog`] - Search and sorting for the list screens
//! - [`dashboard`] - Admin dashboard summary numbers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod calendar;
pub mod card;
pub mod catalog;
pub mod dashboard;
pub mod models;
pub mod recipe;
pub mod types;

pub use types::*;
