use async_trait::async_trait;
use dashmap::DashMap;
use dentalflow_domain::error::DomainResult;
use dentalflow_domain::persist::WorkOrderRepository;
use dentalflow_domain::value_object::Money;
use dentalflow_domain::work_order::{
    DeliveryRecord, LineItem, WorkOrderId, WorkOrderRecord, WorkOrderStatus,
};

/// 交付历史中的一条
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryHistoryEntry {
    pub work_order_id: WorkOrderId,
    pub delivery: DeliveryRecord,
}

/// 基于内存的工单存储
/// - 以 `DashMap` 保存记录，支持并发读写
/// - 交付确认同时追加一条交付历史
#[derive(Default)]
pub struct InMemoryWorkOrderStore {
    records: DashMap<WorkOrderId, WorkOrderRecord>,
    deliveries: DashMap<WorkOrderId, Vec<DeliveryRecord>>,
}

impl InMemoryWorkOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = WorkOrderRecord>,
    {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// 插入或覆盖一条记录
    pub fn insert(&self, record: WorkOrderRecord) {
        self.records.insert(record.id.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn delivery_history(&self, id: &WorkOrderId) -> Vec<DeliveryHistoryEntry> {
        self.deliveries
            .get(id)
            .map(|entries| {
                entries
                    .iter()
                    .map(|delivery| DeliveryHistoryEntry {
                        work_order_id: id.clone(),
                        delivery: delivery.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn update_each<F>(&self, ids: &[WorkOrderId], mut f: F) -> usize
    where
        F: FnMut(&mut WorkOrderRecord),
    {
        let mut affected = 0;
        for id in ids {
            if let Some(mut record) = self.records.get_mut(id) {
                f(record.value_mut());
                affected += 1;
            }
        }
        affected
    }
}

#[async_trait]
impl WorkOrderRepository for InMemoryWorkOrderStore {
    /// 按创建时间（其次 id）排序返回，模拟远端的稳定排序
    async fn fetch_all(&self) -> DomainResult<Vec<WorkOrderRecord>> {
        let mut all: Vec<WorkOrderRecord> =
            self.records.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn find(&self, id: &WorkOrderId) -> DomainResult<Option<WorkOrderRecord>> {
        Ok(self.records.get(id).map(|r| r.value().clone()))
    }

    async fn update_status(
        &self,
        ids: &[WorkOrderId],
        status: WorkOrderStatus,
    ) -> DomainResult<usize> {
        Ok(self.update_each(ids, |r| r.status = status))
    }

    async fn delete(&self, ids: &[WorkOrderId]) -> DomainResult<usize> {
        Ok(ids
            .iter()
            .filter(|id| self.records.remove(*id).is_some())
            .count())
    }

    async fn replace_line_items(
        &self,
        id: &WorkOrderId,
        line_items: Vec<LineItem>,
        total_price: Money,
    ) -> DomainResult<usize> {
        let mut line_items = Some(line_items);
        Ok(self.update_each(std::slice::from_ref(id), |r| {
            r.line_items = line_items.take().unwrap_or_default();
            r.total_price = total_price;
        }))
    }

    async fn update_notes(&self, id: &WorkOrderId, notes: Option<String>) -> DomainResult<usize> {
        let mut notes = Some(notes);
        Ok(self.update_each(std::slice::from_ref(id), |r| {
            r.notes = notes.take().flatten();
        }))
    }

    async fn record_delivery(
        &self,
        id: &WorkOrderId,
        delivery: DeliveryRecord,
    ) -> DomainResult<usize> {
        let affected = self.update_each(std::slice::from_ref(id), |r| {
            r.status = WorkOrderStatus::Delivered;
            r.delivery = Some(delivery.clone());
        });
        if affected > 0 {
            self.deliveries.entry(id.clone()).or_default().push(delivery);
        }
        Ok(affected)
    }
}
