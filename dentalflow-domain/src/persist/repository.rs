use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DomainResult;
use crate::mutation::StoreOperation;
use crate::value_object::Money;
use crate::work_order::{DeliveryRecord, LineItem, WorkOrderId, WorkOrderRecord, WorkOrderStatus};

/// 工单存储
///
/// 批量操作只作用于存在的 id，返回受影响的行数；缺失的 id 不视为错误。
#[async_trait]
pub trait WorkOrderRepository: Send + Sync {
    async fn fetch_all(&self) -> DomainResult<Vec<WorkOrderRecord>>;

    async fn find(&self, id: &WorkOrderId) -> DomainResult<Option<WorkOrderRecord>>;

    async fn update_status(
        &self,
        ids: &[WorkOrderId],
        status: WorkOrderStatus,
    ) -> DomainResult<usize>;

    async fn delete(&self, ids: &[WorkOrderId]) -> DomainResult<usize>;

    async fn replace_line_items(
        &self,
        id: &WorkOrderId,
        line_items: Vec<LineItem>,
        total_price: Money,
    ) -> DomainResult<usize>;

    async fn update_notes(&self, id: &WorkOrderId, notes: Option<String>) -> DomainResult<usize>;

    /// 写入交付信息并将状态置为已交付
    async fn record_delivery(
        &self,
        id: &WorkOrderId,
        delivery: DeliveryRecord,
    ) -> DomainResult<usize>;

    /// 执行单个存储操作
    async fn execute(&self, op: &StoreOperation) -> DomainResult<usize> {
        match op {
            StoreOperation::UpdateStatus { ids, status } => self.update_status(ids, *status).await,
            StoreOperation::Delete { ids } => self.delete(ids).await,
            StoreOperation::ReplaceLineItems {
                id,
                line_items,
                total_price,
            } => {
                self.replace_line_items(id, line_items.clone(), *total_price)
                    .await
            }
            StoreOperation::UpdateNotes { id, notes } => self.update_notes(id, notes.clone()).await,
            StoreOperation::RecordDelivery { id, delivery } => {
                self.record_delivery(id, delivery.clone()).await
            }
        }
    }

    /// 依次执行，遇错即停；已执行的操作不回滚
    async fn execute_all(&self, ops: &[StoreOperation]) -> DomainResult<usize> {
        let mut affected = 0;
        for op in ops {
            affected += self.execute(op).await?;
        }
        Ok(affected)
    }
}

#[async_trait]
impl<T> WorkOrderRepository for Arc<T>
where
    T: WorkOrderRepository + ?Sized,
{
    async fn fetch_all(&self) -> DomainResult<Vec<WorkOrderRecord>> {
        (**self).fetch_all().await
    }

    async fn find(&self, id: &WorkOrderId) -> DomainResult<Option<WorkOrderRecord>> {
        (**self).find(id).await
    }

    async fn update_status(
        &self,
        ids: &[WorkOrderId],
        status: WorkOrderStatus,
    ) -> DomainResult<usize> {
        (**self).update_status(ids, status).await
    }

    async fn delete(&self, ids: &[WorkOrderId]) -> DomainResult<usize> {
        (**self).delete(ids).await
    }

    async fn replace_line_items(
        &self,
        id: &WorkOrderId,
        line_items: Vec<LineItem>,
        total_price: Money,
    ) -> DomainResult<usize> {
        (**self).replace_line_items(id, line_items, total_price).await
    }

    async fn update_notes(&self, id: &WorkOrderId, notes: Option<String>) -> DomainResult<usize> {
        (**self).update_notes(id, notes).await
    }

    async fn record_delivery(
        &self,
        id: &WorkOrderId,
        delivery: DeliveryRecord,
    ) -> DomainResult<usize> {
        (**self).record_delivery(id, delivery).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainError;
    use std::sync::Mutex;

    // 只记录调用的存储
    #[derive(Default)]
    struct RecordingRepo {
        calls: Mutex<Vec<String>>,
        fail_on_delete: bool,
    }

    impl RecordingRepo {
        fn log(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl WorkOrderRepository for RecordingRepo {
        async fn fetch_all(&self) -> DomainResult<Vec<WorkOrderRecord>> {
            Ok(Vec::new())
        }

        async fn find(&self, _id: &WorkOrderId) -> DomainResult<Option<WorkOrderRecord>> {
            Ok(None)
        }

        async fn update_status(
            &self,
            ids: &[WorkOrderId],
            status: WorkOrderStatus,
        ) -> DomainResult<usize> {
            self.log(format!("status {} {status}", ids.len()));
            Ok(ids.len())
        }

        async fn delete(&self, ids: &[WorkOrderId]) -> DomainResult<usize> {
            if self.fail_on_delete {
                return Err(DomainError::repository("delete rejected"));
            }
            self.log(format!("delete {}", ids.len()));
            Ok(ids.len())
        }

        async fn replace_line_items(
            &self,
            id: &WorkOrderId,
            line_items: Vec<LineItem>,
            total_price: Money,
        ) -> DomainResult<usize> {
            self.log(format!("replace {id} {} {total_price}", line_items.len()));
            Ok(1)
        }

        async fn update_notes(
            &self,
            id: &WorkOrderId,
            _notes: Option<String>,
        ) -> DomainResult<usize> {
            self.log(format!("notes {id}"));
            Ok(1)
        }

        async fn record_delivery(
            &self,
            id: &WorkOrderId,
            _delivery: DeliveryRecord,
        ) -> DomainResult<usize> {
            self.log(format!("delivery {id}"));
            Ok(1)
        }
    }

    fn edit_ops() -> Vec<StoreOperation> {
        vec![
            StoreOperation::ReplaceLineItems {
                id: WorkOrderId::new("p"),
                line_items: Vec::new(),
                total_price: Money::from(10),
            },
            StoreOperation::Delete {
                ids: vec![WorkOrderId::new("x"), WorkOrderId::new("y")],
            },
            StoreOperation::UpdateNotes {
                id: WorkOrderId::new("p"),
                notes: None,
            },
        ]
    }

    #[tokio::test]
    async fn execute_all_dispatches_in_order_through_arc() {
        let repo = Arc::new(RecordingRepo::default());
        let affected = repo.execute_all(&edit_ops()).await.unwrap();
        assert_eq!(affected, 4);
        assert_eq!(
            *repo.calls.lock().unwrap(),
            vec!["replace p 0 10", "delete 2", "notes p"]
        );
    }

    #[tokio::test]
    async fn execute_all_stops_at_first_failure() {
        let repo = RecordingRepo {
            fail_on_delete: true,
            ..Default::default()
        };
        let err = repo.execute_all(&edit_ops()).await.unwrap_err();
        assert!(matches!(err, DomainError::Repository { .. }));
        assert_eq!(*repo.calls.lock().unwrap(), vec!["replace p 0 10"]);
    }
}
