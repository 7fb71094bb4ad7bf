// Core modules implementing the container codec, values and error modeling.
pub mod container;
pub mod control;
pub mod decode;
pub mod encode;
pub mod error;
pub mod header;
pub mod layout;
pub mod log;
pub mod schema;
pub mod strings;
pub mod value;
