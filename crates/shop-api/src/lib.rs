//! # shop-api
//!
//! HTTP API layer for storefront-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Email/password login issuing a server-side session and a bearer token
//! - An access gate accepting either credential on protected routes
//! - Payment intent creation and the payment webhook
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/auth/login` | Login, sets `jwt` and `shop.sid` cookies |
//! | GET | `/auth/check` | Attached identity (gated) |
//! | GET | `/auth/logout` | Destroy session, clear `jwt` |
//! | GET | `/users/own` | Caller's identity (gated) |
//! | POST | `/create-payment-intent` | Payment intent client secret |
//! | POST | `/webhook` | Stripe webhook |

pub mod gate;
pub mod handlers;
pub mod routes;
pub mod state;

pub use gate::{AccessGate, AuthStrategy, SessionStrategy, TokenStrategy};
pub use routes::create_router;
pub use state::{AppConfig, AppState};
