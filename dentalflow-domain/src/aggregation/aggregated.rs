//! 归并结果
//!
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_object::Money;
use crate::work_order::{
    ClinicId, DeliveryRecord, DentistId, LineItem, TechnicianId, WorkOrderId, WorkOrderRecord,
    WorkOrderStatus,
};

use super::key::LineItemSignature;

/// 归并结果对应的原始记录 id，非空、不重复、保持折叠顺序；首个 id 为主记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<WorkOrderId>", into = "Vec<WorkOrderId>")]
pub struct SourceIds(Vec<WorkOrderId>);

impl SourceIds {
    pub fn single(id: WorkOrderId) -> Self {
        Self(vec![id])
    }

    /// 主记录 id（编辑时保留的那一行）
    pub fn primary(&self) -> &WorkOrderId {
        &self.0[0]
    }

    /// 除主记录外的其余 id
    pub fn rest(&self) -> &[WorkOrderId] {
        &self.0[1..]
    }

    pub fn as_slice(&self) -> &[WorkOrderId] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WorkOrderId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, id: &WorkOrderId) -> bool {
        self.0.contains(id)
    }

    pub fn to_vec(&self) -> Vec<WorkOrderId> {
        self.0.clone()
    }

    /// 追加 id；已存在时忽略并返回 `false`
    pub(crate) fn push(&mut self, id: WorkOrderId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.0.push(id);
        true
    }
}

impl TryFrom<Vec<WorkOrderId>> for SourceIds {
    type Error = DomainError;

    fn try_from(ids: Vec<WorkOrderId>) -> Result<Self, Self::Error> {
        if ids.is_empty() {
            return Err(DomainError::EmptySourceIds);
        }
        for (i, id) in ids.iter().enumerate() {
            if ids[..i].contains(id) {
                return Err(DomainError::invalid_value(format!(
                    "duplicate source id: {id}"
                )));
            }
        }
        Ok(Self(ids))
    }
}

impl From<SourceIds> for Vec<WorkOrderId> {
    fn from(ids: SourceIds) -> Self {
        ids.0
    }
}

impl<'a> IntoIterator for &'a SourceIds {
    type Item = &'a WorkOrderId;
    type IntoIter = std::slice::Iter<'a, WorkOrderId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// 归并后的工单（派生、瞬时，不持久化）
///
/// 除 `id` 外拥有记录的全部字段；`line_items` 为合并后的明细，`total_price`
/// 为各来源记录总价之和。时间戳、牙医、技工、备注等非键字段取自首条折叠的记录。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedWorkOrder {
    source_ids: SourceIds,
    patient_name: String,
    clinic_id: ClinicId,
    dentist_id: Option<DentistId>,
    technician_id: Option<TechnicianId>,
    status: WorkOrderStatus,
    created_at: DateTime<Utc>,
    estimated_delivery: Option<NaiveDate>,
    total_price: Money,
    line_items: Vec<LineItem>,
    notes: Option<String>,
    delivery: Option<DeliveryRecord>,
}

impl AggregatedWorkOrder {
    /// 以单条记录作为种子；记录内部重复签名的明细在此合并
    pub(crate) fn seed(record: &WorkOrderRecord) -> Self {
        let mut line_items = Vec::with_capacity(record.line_items.len());
        for item in &record.line_items {
            merge_line_item(&mut line_items, item);
        }

        Self {
            source_ids: SourceIds::single(record.id.clone()),
            patient_name: record.patient_name.clone(),
            clinic_id: record.clinic_id.clone(),
            dentist_id: record.dentist_id.clone(),
            technician_id: record.technician_id.clone(),
            status: record.status,
            created_at: record.created_at,
            estimated_delivery: record.estimated_delivery,
            total_price: record.total_price,
            line_items,
            notes: record.notes.clone(),
            delivery: record.delivery.clone(),
        }
    }

    /// 吸收一条同键记录。同一 id 重复出现时不重复计入。
    pub(crate) fn absorb(&mut self, record: &WorkOrderRecord) {
        if !self.source_ids.push(record.id.clone()) {
            return;
        }
        self.total_price += record.total_price;
        for item in &record.line_items {
            merge_line_item(&mut self.line_items, item);
        }
    }

    pub fn source_ids(&self) -> &SourceIds {
        &self.source_ids
    }

    pub fn primary_id(&self) -> &WorkOrderId {
        self.source_ids.primary()
    }

    pub fn patient_name(&self) -> &str {
        &self.patient_name
    }

    pub fn clinic_id(&self) -> &ClinicId {
        &self.clinic_id
    }

    pub fn dentist_id(&self) -> Option<&DentistId> {
        self.dentist_id.as_ref()
    }

    pub fn technician_id(&self) -> Option<&TechnicianId> {
        self.technician_id.as_ref()
    }

    pub fn status(&self) -> WorkOrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn created_on(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    pub fn estimated_delivery(&self) -> Option<NaiveDate> {
        self.estimated_delivery
    }

    pub fn total_price(&self) -> Money {
        self.total_price
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn delivery(&self) -> Option<&DeliveryRecord> {
        self.delivery.as_ref()
    }

    /// 服务件数（合并后明细数量之和）
    pub fn service_count(&self) -> u64 {
        self.line_items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// 是否由多条记录归并而来
    pub fn is_merged(&self) -> bool {
        self.source_ids.len() > 1
    }
}

fn merge_line_item(items: &mut Vec<LineItem>, incoming: &LineItem) {
    match items
        .iter_mut()
        .find(|existing| LineItemSignature::matches(existing, incoming))
    {
        Some(existing) => {
            existing.quantity = existing.quantity.saturating_add(incoming.quantity);
            existing.price += incoming.price;
        }
        None => items.push(incoming.clone()),
    }
}
