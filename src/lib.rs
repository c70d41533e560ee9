//! # Lectern API
//!
//! Backend for the Lectern learning platform: user accounts with role-based
//! access control, course/lesson/file management, and Stripe-backed billing,
//! served over HTTP with Axum on PostgreSQL.
//!
//! ## Overview
//!
//! - **Authentication**: JWT access/refresh pairs with a revocation blacklist
//! - **Authorization**: roles as named permission bundles; route guards check
//!   capabilities against the store at request time
//! - **Billing**: webhook-driven reconciliation of customers, payment plans,
//!   installments and payments against the payment gateway
//! - **Content**: CRUD for courses, lessons and file metadata
//!
//! ## Architecture
//!
//! The codebase follows a modular layout inspired by NestJS:
//!
//! ```text
//! src/
//! ├── config/           # Env-backed configuration (database, JWT, Stripe, CORS)
//! ├── middleware/       # Auth extractor and permission guards
//! ├── modules/          # Feature modules
//! │   ├── auth/        # Login, refresh, logout, token blacklist
//! │   ├── users/       # Accounts and signup provisioning
//! │   ├── roles/       # Permissions, roles, assignment, capability checks
//! │   ├── courses/     # Course catalog
//! │   ├── lessons/     # Lessons
//! │   ├── files/       # File metadata
//! │   └── billing/     # Gateway client, webhook queue, reconciliation
//! ├── utils/            # Errors, password hashing, JWT helpers
//! ├── router.rs         # Route composition, CORS, API docs
//! └── state.rs          # Shared application state
//! ```
//!
//! Each module keeps the same internal shape: `model.rs` (rows + DTOs),
//! `service.rs` (database/gateway logic), `controller.rs` (handlers) and
//! `router.rs` (routes).

pub mod config;
pub mod docs;
pub mod logging;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod utils;
