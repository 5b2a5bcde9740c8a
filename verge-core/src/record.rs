//! Records of training statistics.
//!
//! Agents summarize each learning call in a [`Record`], e.g. the losses of the
//! critic and the actor, so that a driver can log or plot them.
//!
//! ```rust
//! use verge_core::record::{Record, RecordValue};
//!
//! let mut record = Record::from_slice(&[("loss_critic", RecordValue::Scalar(0.5))]);
//! record.insert("policy_std", RecordValue::Array1(vec![0.3, 0.4]));
//! assert_eq!(record.get_scalar("loss_critic").unwrap(), 0.5);
//! ```
mod base;
pub use base::{Record, RecordValue};
