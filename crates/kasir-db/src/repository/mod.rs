//! # Repository Module
//!
//! Database repository implementations for Kasir POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.products().list_sellable(&company_id)                      │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── list_sellable(&self, company_id)                                  │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── create(&self, input)                                              │
//! │  └── update(&self, id, changes)                                        │
//! │       │                                                                 │
//! │       │  SQL Query (explicit columns, explicit joins)                  │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Records are plain structs from kasir-core; repositories own every     │
//! │  line of SQL. No record knows how to save itself.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CompanyRepository`](company::CompanyRepository) - Company CRUD with counts
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD, sellable list, stock
//! - [`UserRepository`](user::UserRepository) - Operators
//! - [`OrderRepository`](order::OrderRepository) - Commit, receipts, listings

pub mod company;
pub mod order;
pub mod product;
pub mod user;
