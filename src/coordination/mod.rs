mod traits;
mod zk;

pub use zk::ZkCoordinator;
pub use traits::{CoordinationClient, CreateMode, Version};
