//! Backend data types.

pub mod todo;

pub use todo::{NewTodo, Todo};
