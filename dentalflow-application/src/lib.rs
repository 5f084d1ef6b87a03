//! DentalFlow 应用层（dentalflow-application）
//!
//! 命令/查询总线、应用上下文与配置，以及工单用例的处理器和内存存储实现。
//!
pub mod command;
pub mod command_bus;
pub mod command_handler;
pub mod config;
pub mod context;
pub mod dto;
pub mod error;
pub mod inmemory_command_bus;
pub mod inmemory_query_bus;
pub mod inmemory_work_order_store;
pub mod query;
pub mod query_bus;
pub mod query_handler;
pub mod work_orders;

pub use inmemory_command_bus::InMemoryCommandBus;
pub use inmemory_query_bus::InMemoryQueryBus;
pub use inmemory_work_order_store::InMemoryWorkOrderStore;
