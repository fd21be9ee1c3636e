//! # Maritime Requisition Domain Models
//!
//! Core types shared by the requisition intake pipeline. All models derive
//! serde for persistence and transport and `validator` for the invariants the
//! parser guarantees.
//!
//! ## Key Models
//!
//! - **Requisition**: header block of an uploaded sheet (vessel, port, dates, currency)
//! - **RequisitionItem**: one requested line, numbered in emission order
//! - **RequisitionStatus**: lifecycle once the requisition is stored

pub mod requisition;


pub use requisition::*;
