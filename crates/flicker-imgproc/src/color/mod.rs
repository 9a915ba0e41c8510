mod gray;
pub use gray::*;

mod pseudo;
pub use pseudo::*;
