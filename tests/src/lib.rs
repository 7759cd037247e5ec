//! # Presence Sensor Test Suite
//!
//! Cross-crate flows that no single crate can test on its own.
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── epoch_flows.rs   # daemon + registration router + reporting pipeline
//!     └── http_flows.rs    # same, over real sockets and HTTP adapters
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p pc-tests
//! cargo bench -p pc-tests
//! ```

pub mod integration;
