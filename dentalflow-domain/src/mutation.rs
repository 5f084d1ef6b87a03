//! 归并视图上的操作 → 原始记录上的存储操作
//!
//! 界面只看到归并结果，而存储只认识原始行。这里把每个操作展开为
//! 针对 `SourceIds` 的 `StoreOperation`：
//! - 改状态、删除：一次批量操作，恰好覆盖全部来源 id；
//! - 编辑明细：改写主记录，并删除其余来源记录（有损、不可逆）；
//! - 备注：只写主记录。
//!
//! 多步操作之间没有回滚，调用方在每次变更后重新拉取并归并。
//!
use serde::{Deserialize, Serialize};

use crate::aggregation::{AggregatedWorkOrder, SourceIds};
use crate::error::{DomainError, DomainResult};
use crate::value_object::{Money, ValueObject};
use crate::work_order::{
    ClinicId, DeliveryRecord, LineItem, WorkOrderId, WorkOrderRecord, WorkOrderStatus,
};

/// 存储执行的最小操作单元
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StoreOperation {
    UpdateStatus {
        ids: Vec<WorkOrderId>,
        status: WorkOrderStatus,
    },
    Delete {
        ids: Vec<WorkOrderId>,
    },
    ReplaceLineItems {
        id: WorkOrderId,
        line_items: Vec<LineItem>,
        total_price: Money,
    },
    UpdateNotes {
        id: WorkOrderId,
        notes: Option<String>,
    },
    RecordDelivery {
        id: WorkOrderId,
        delivery: DeliveryRecord,
    },
}

impl StoreOperation {
    /// 操作涉及的记录 id
    pub fn target_ids(&self) -> &[WorkOrderId] {
        match self {
            StoreOperation::UpdateStatus { ids, .. } | StoreOperation::Delete { ids } => ids,
            StoreOperation::ReplaceLineItems { id, .. }
            | StoreOperation::UpdateNotes { id, .. }
            | StoreOperation::RecordDelivery { id, .. } => std::slice::from_ref(id),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StoreOperation::UpdateStatus { .. } => "update_status",
            StoreOperation::Delete { .. } => "delete",
            StoreOperation::ReplaceLineItems { .. } => "replace_line_items",
            StoreOperation::UpdateNotes { .. } => "update_notes",
            StoreOperation::RecordDelivery { .. } => "record_delivery",
        }
    }
}

/// 可被变更的归并目标
pub trait MutationTarget {
    fn source_ids(&self) -> &SourceIds;

    /// 改状态：一次批量更新，恰好覆盖全部来源 id
    fn change_status(&self, status: WorkOrderStatus) -> StoreOperation {
        StoreOperation::UpdateStatus {
            ids: self.source_ids().to_vec(),
            status,
        }
    }

    /// 删除：一次批量删除，恰好覆盖全部来源 id
    fn delete(&self) -> StoreOperation {
        StoreOperation::Delete {
            ids: self.source_ids().to_vec(),
        }
    }

    /// 编辑明细：主记录写入新明细与重算的总价，其余来源记录被删除
    fn edit(&self, line_items: Vec<LineItem>) -> DomainResult<Vec<StoreOperation>> {
        if line_items.is_empty() {
            return Err(DomainError::invalid_command(
                "an edit must keep at least one line item",
            ));
        }
        line_items.iter().try_for_each(ValueObject::validate)?;

        let ids = self.source_ids();
        let total_price = line_items.iter().map(|i| i.price).sum();
        let mut ops = vec![StoreOperation::ReplaceLineItems {
            id: ids.primary().clone(),
            line_items,
            total_price,
        }];
        if !ids.rest().is_empty() {
            ops.push(StoreOperation::Delete {
                ids: ids.rest().to_vec(),
            });
        }
        Ok(ops)
    }

    /// 备注写入主记录；空白备注视为清除
    fn update_notes(&self, notes: Option<String>) -> StoreOperation {
        let notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        StoreOperation::UpdateNotes {
            id: self.source_ids().primary().clone(),
            notes,
        }
    }
}

impl MutationTarget for SourceIds {
    fn source_ids(&self) -> &SourceIds {
        self
    }
}

impl MutationTarget for AggregatedWorkOrder {
    fn source_ids(&self) -> &SourceIds {
        AggregatedWorkOrder::source_ids(self)
    }
}

/// 将某诊所所有未完成（待处理/生产中）的归并工单标记为已完成
///
/// 没有可完成的工单时返回 `None`。
pub fn finish_open_for_clinic<'a, I>(aggregates: I, clinic_id: &ClinicId) -> Option<StoreOperation>
where
    I: IntoIterator<Item = &'a AggregatedWorkOrder>,
{
    let ids: Vec<WorkOrderId> = aggregates
        .into_iter()
        .filter(|agg| agg.clinic_id() == clinic_id && agg.status().is_open())
        .flat_map(|agg| agg.source_ids().iter().cloned())
        .collect();

    if ids.is_empty() {
        return None;
    }
    Some(StoreOperation::UpdateStatus {
        ids,
        status: WorkOrderStatus::Finished,
    })
}

/// 扫码确认交付（针对单条原始记录）
pub fn confirm_delivery(
    record: &WorkOrderRecord,
    delivery: DeliveryRecord,
) -> DomainResult<StoreOperation> {
    if record.status == WorkOrderStatus::Delivered {
        return Err(DomainError::InvalidState {
            reason: format!("work order {} is already delivered", record.id),
        });
    }
    delivery.validate()?;
    Ok(StoreOperation::RecordDelivery {
        id: record.id.clone(),
        delivery,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> SourceIds {
        SourceIds::try_from(raw.iter().map(|s| WorkOrderId::new(*s)).collect::<Vec<_>>()).unwrap()
    }

    fn item(service: &str, price: i64) -> LineItem {
        LineItem::builder()
            .service_id(service)
            .quantity(1)
            .price(price)
            .build()
    }

    #[test]
    fn status_change_names_exactly_the_source_ids() {
        let op = ids(&["id1", "id2", "id3"]).change_status(WorkOrderStatus::Finished);
        assert_eq!(
            op,
            StoreOperation::UpdateStatus {
                ids: vec![
                    WorkOrderId::new("id1"),
                    WorkOrderId::new("id2"),
                    WorkOrderId::new("id3"),
                ],
                status: WorkOrderStatus::Finished,
            }
        );
    }

    #[test]
    fn delete_names_exactly_the_source_ids() {
        let op = ids(&["a", "b"]).delete();
        assert_eq!(op.target_ids(), &[WorkOrderId::new("a"), WorkOrderId::new("b")]);
        assert_eq!(op.kind(), "delete");
    }

    #[test]
    fn edit_rewrites_primary_and_deletes_the_rest() {
        let ops = ids(&["p", "x", "y"])
            .edit(vec![item("S1", 1000), item("S2", 500)])
            .unwrap();
        assert_eq!(ops.len(), 2);
        match &ops[0] {
            StoreOperation::ReplaceLineItems {
                id,
                line_items,
                total_price,
            } => {
                assert_eq!(id, &WorkOrderId::new("p"));
                assert_eq!(line_items.len(), 2);
                assert_eq!(*total_price, Money::from(1500));
            }
            other => panic!("unexpected operation: {other:?}"),
        }
        assert_eq!(
            ops[1],
            StoreOperation::Delete {
                ids: vec![WorkOrderId::new("x"), WorkOrderId::new("y")]
            }
        );
    }

    #[test]
    fn edit_of_single_record_has_no_delete() {
        let ops = ids(&["p"]).edit(vec![item("S1", 10)]).unwrap();
        assert_eq!(ops.len(), 1);
    }

    #[test]
    fn edit_rejects_empty_or_invalid_items() {
        assert!(matches!(
            ids(&["p"]).edit(Vec::new()),
            Err(DomainError::InvalidCommand { .. })
        ));
        let mut bad = item("S1", 10);
        bad.quantity = 0;
        assert!(ids(&["p"]).edit(vec![bad]).is_err());
    }

    #[test]
    fn notes_go_to_primary_and_blank_clears() {
        let op = ids(&["p", "q"]).update_notes(Some("  ".into()));
        assert_eq!(
            op,
            StoreOperation::UpdateNotes {
                id: WorkOrderId::new("p"),
                notes: None
            }
        );
    }

    #[test]
    fn operations_serialize_with_tag() {
        let op = ids(&["a"]).change_status(WorkOrderStatus::Delivered);
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["op"], "update_status");
        assert_eq!(json["status"], "delivered");
        let back: StoreOperation = serde_json::from_value(json).unwrap();
        assert_eq!(back, op);
    }
}
