mod access;
mod arena;
mod entities;
mod error;

pub use access::{AccessPolicy, RangeAccessPolicy};
pub use arena::World;
pub use entities::{Character, Inventory, InventoryAccess, InventoryOwner, Item};
pub use error::WorldError;
