//! DentalFlow 领域层（dentalflow-domain）
//!
//! 牙科技工所工单的核心领域模型与纯逻辑：
//! - 工单与明细（`work_order`）及值对象（`value_object`）
//! - 重复工单的归并与按诊所/患者分组（`aggregation`）
//! - 将归并视图上的操作还原为对原始记录的存储操作（`mutation`）
//! - 规约与工单筛选（`specification`、`filter`）
//! - 统计、税费与报表（`statistics`、`tax`、`report`）
//! - 会员有效期与角色（`membership`）
//! - 远端存储协议（`persist`）
//!
//! 归并逻辑是同步、无副作用的纯函数，每次调用都基于最新拉取的记录重新计算，
//! 不缓存任何结果；所有 I/O 由实现 `persist::WorkOrderRepository` 的基础设施负责。
//!
pub mod aggregation;
pub mod error;
pub mod filter;
pub mod membership;
pub mod mutation;
pub mod persist;
pub mod report;
pub mod specification;
pub mod statistics;
pub mod tax;
pub mod value_object;
pub mod work_order;
