pub mod errors;
pub mod mapper;
pub mod result;
pub mod space;

pub use errors::*;
pub use mapper::*;
pub use result::*;
pub use space::*;
