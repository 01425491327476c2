//! Domain model (IDs, task entity, status machine, frequency rules, health score).

pub mod errors;
pub mod frequency;
pub mod health;
pub mod ids;
pub mod state;
pub mod task;

pub use self::errors::{ErrorKind, HomecueError, Result};
pub use self::frequency::Frequency;
pub use self::health::{calculate_house_health, HealthStatus, HouseHealthScore, Season};
pub use self::ids::{TaskId, UserId, VendorId};
pub use self::state::TaskStatus;
pub use self::task::{NewTask, Priority, Task, TaskUpdate, User};
