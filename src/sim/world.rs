//! 世界 trait
//!
//! 仿真世界由业务层实现（例如信道与协议端点）。

use std::any::Any;

/// 仿真世界：事件通过 `as_any_mut` 向下转型到具体实现。
pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
