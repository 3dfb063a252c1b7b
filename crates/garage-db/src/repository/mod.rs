//! # Repository Module
//!
//! Repository pattern implementations for database access.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Repository Pattern                                 │
//! │                                                                         │
//! │  Caller                                                                 │
//! │     │                                                                   │
//! │     │ db.vehicles().get_by_plate("KBZ 412A")                            │
//! │     ▼                                                                   │
//! │  Repository ← Owns SQL, returns garage-core types                       │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  SqlitePool                                                             │
//! │                                                                         │
//! │  One repository per aggregate. Cross-aggregate workflows that need a    │
//! │  single transaction (invoice generation, completion) live in the        │
//! │  billing module, not here.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod activity;
pub mod invoice;
pub mod job;
pub mod labor;
pub mod procurement;
pub mod settings;
pub mod subcontract;
pub mod vehicle;
