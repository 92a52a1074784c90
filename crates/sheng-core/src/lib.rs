//! # sheng-core
//!
//! 笙 (Sheng) 框架核心库, 提供统一错误类型与公共基础设施.
//!
//! 本 crate 为整个笙框架提供底层基础, 不含任何编解码逻辑.

pub mod error;

// 重导出常用类型
pub use error::{ShengError, ShengResult};
