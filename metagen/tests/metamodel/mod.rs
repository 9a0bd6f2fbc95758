//! Metamodels of the `model` types in `criteria.rs`, as the generator writes them.

pub mod owner_;
pub mod shape_;
pub mod square_;

pub use owner_::*;
pub use shape_::*;
pub use square_::*;
