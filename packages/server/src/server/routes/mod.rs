// HTTP routes
pub mod entities;
pub mod health;
pub mod mining;
pub mod story;
pub mod templates;

pub use entities::*;
pub use health::*;
pub use mining::*;
pub use story::*;
pub use templates::*;
