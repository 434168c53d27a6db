//! Structural contracts for manifest documents.
//!
//! A [`Contract`] is a tree of [`Shape`]s, either the built-in
//! [`Contract::manifest_v1`] or one compiled from a small JSON-Schema subset.
//! [`check`] reports every place a document departs from its contract.
//!
//! ```
//! use ddc_schema::{check, Contract};
//! use serde_json::json;
//!
//! let violations = check(&Contract::manifest_v1(), &json!({"schema_uri": "s"}));
//! assert!(violations.iter().any(|v| v.path == "integrity"));
//! ```

mod check;
mod compile;
mod error;
mod shape;

pub use check::{check, check_manifest, check_schema_uri, Violation, ViolationKind};
pub use error::SchemaError;
pub use shape::{Contract, Field, Format, ObjectShape, Shape, StringShape};
