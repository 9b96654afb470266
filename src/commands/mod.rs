mod command_pool_guard;

pub use self::command_pool_guard::{clear_value, CommandPoolGuard, DrawPass, TRIANGLE_VERTEX_COUNT};
