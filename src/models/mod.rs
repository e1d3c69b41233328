mod cart;
mod settings;
mod store;

pub use cart::*;
pub use settings::*;
pub use store::*;
