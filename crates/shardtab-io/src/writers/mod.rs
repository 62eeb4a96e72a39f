//! Row writers: consume a lazy row sequence plus a schema.

pub mod csv;
pub mod pretty;
