pub mod envelope;
pub mod row;
pub mod value;

pub use envelope::ExecutionEnvelope;
pub use row::Row;
pub use value::Value;
