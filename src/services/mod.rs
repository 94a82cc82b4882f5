// src/services/mod.rs
pub mod benchmarks;
pub mod calculations;
pub mod formatting;
pub mod snapshot;
pub mod store_leads;
pub mod threat_impact;
