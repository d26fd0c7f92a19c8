pub mod entity;
pub mod item;
pub mod notification;
pub mod state;

pub use entity::*;
pub use item::*;
pub use notification::*;
pub use state::*;
