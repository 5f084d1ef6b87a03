//! 重复工单归并（aggregation）
//!
//! 远端存储中同一逻辑工单可能被重复插入为多行。本模块在展示前将其归并：
//! - `key`：由患者、诊所、创建日期（UTC）、状态与明细签名序列推导归并键；
//! - `reducer`：按键折叠记录，累加总价并合并同签名明细；
//! - `grouping`：有序归并与按“诊所 → 患者”分组；
//! - `aggregated`：归并结果及其来源记录集合（`SourceIds`）。
//!
//! 归并每次都从最新记录重新计算，不缓存、不持久化。
//!
mod aggregated;
mod grouping;
mod key;
mod reducer;

pub use aggregated::{AggregatedWorkOrder, SourceIds};
pub use grouping::{GroupedWorkOrders, PatientGroups, WorkOrderAggregator};
pub use key::{GroupingKey, LineItemSignature};
pub use reducer::{AggregateMap, fold_record};
