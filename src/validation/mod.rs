pub mod structured;

pub use structured::StructuredValidator;
