//! # Pendingdb Architecture
//!
//! Pendingdb is a **pending-transaction log for password databases**. A constrained
//! process (an AutoFill extension) cannot safely rewrite the encrypted database file, so
//! it records the edits it wants to make. The main app later replays those edits,
//! persists the database and commits the log.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, formats output, handles terminal I/O   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - One function per user action, returns CmdResult          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Manager (manager.rs)                                       │
//! │  - Queue, replay, commit and discard per database file      │
//! └─────────────────────────────────────────────────────────────┘
//!                 │                              │
//!                 ▼                              ▼
//! ┌───────────────────────────────┐ ┌───────────────────────────┐
//! │  Log (transaction.rs,         │ │  Storage (store/)         │
//! │  operation.rs)                │ │  - SecureStore trait      │
//! │  - ordered replay onto model  │ │  - DirStore, MemoryStore  │
//! └───────────────────────────────┘ └───────────────────────────┘
//! ```
//!
//! ## Replay Modes
//!
//! Replay is **strict** first: a missing parent or entry aborts with an error. On
//! failure the manager retries in **recovery mode**, where operations are redirected
//! into a dated "Recovered Entries" group created under the root. The group is removed
//! again if nothing ended up in it.
//!
//! ## Watermark
//!
//! A loaded [`database_file::DatabaseFile`] remembers how many pending operations have
//! already been applied to its in-memory tree. Replays start from that watermark, and a
//! commit drops exactly that many operations from the front of the log.
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! Everything outside `cli/` takes plain arguments and returns `Result`. It never prints
//! and never exits the process. Diagnostics go through `tracing`.
//!
//! ## Module Overview

pub mod commands;
pub mod config;
pub mod database_file;
pub mod descriptor;
pub mod error;
pub mod manager;
pub mod model;
pub mod operation;
pub mod quicktype;
pub mod store;
pub mod transaction;
