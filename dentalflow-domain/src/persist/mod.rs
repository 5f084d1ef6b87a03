//! 远端存储协议（persist）
//!
//! 工单记录由托管后端持有，本模块只定义存储协议 `WorkOrderRepository`，
//! 具体实现（内存、HTTP 等）由上层提供并注入。
//!
mod repository;

pub use repository::WorkOrderRepository;
