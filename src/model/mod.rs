mod member;
mod reward;
mod season;

pub use member::*;
pub use reward::*;
pub use season::*;
