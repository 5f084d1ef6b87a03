//! 归并键推导
//!
use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;

use crate::work_order::{ClinicId, LineItem, ServiceId, WorkOrderRecord, WorkOrderStatus};

/// 明细签名：`(service_id, tooth_number ?? "", special_note ?? "")`
///
/// 签名只描述明细“是什么”，与数量、价格无关。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LineItemSignature {
    service_id: ServiceId,
    tooth_number: String,
    special_note: String,
}

impl LineItemSignature {
    pub fn of(item: &LineItem) -> Self {
        Self {
            service_id: item.service_id.clone(),
            tooth_number: item.tooth_number.clone().unwrap_or_default(),
            special_note: item.special_note.clone().unwrap_or_default(),
        }
    }

    /// 无需分配即可判断两条明细是否同签名
    pub fn matches(a: &LineItem, b: &LineItem) -> bool {
        a.service_id == b.service_id
            && a.tooth_number.as_deref().unwrap_or_default()
                == b.tooth_number.as_deref().unwrap_or_default()
            && a.special_note.as_deref().unwrap_or_default()
                == b.special_note.as_deref().unwrap_or_default()
    }

    pub fn service_id(&self) -> &ServiceId {
        &self.service_id
    }

    pub fn tooth_number(&self) -> &str {
        &self.tooth_number
    }

    pub fn special_note(&self) -> &str {
        &self.special_note
    }

    fn sort_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.service_id
            .as_ref()
            .bytes()
            .chain(self.tooth_number.bytes())
    }
}

impl Ord for LineItemSignature {
    /// 先按 `service_id ++ tooth_number` 的字节序，再以完整三元组兜底，
    /// 保证同一多重集合的任意排列都得到相同序列。
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_bytes()
            .cmp(other.sort_bytes())
            .then_with(|| self.service_id.cmp(&other.service_id))
            .then_with(|| self.tooth_number.cmp(&other.tooth_number))
            .then_with(|| self.special_note.cmp(&other.special_note))
    }
}

impl PartialOrd for LineItemSignature {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// 归并键
///
/// 两条记录当且仅当键相等时归并。字段顺序决定归并结果的输出顺序
/// （先诊所，后患者，再日期）。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupingKey {
    clinic_id: ClinicId,
    patient_name: String,
    created_on: NaiveDate,
    status: WorkOrderStatus,
    signatures: Vec<LineItemSignature>,
}

impl GroupingKey {
    pub fn derive(record: &WorkOrderRecord) -> Self {
        let mut signatures: Vec<LineItemSignature> =
            record.line_items.iter().map(LineItemSignature::of).collect();
        signatures.sort();

        Self {
            clinic_id: record.clinic_id.clone(),
            patient_name: record.patient_name.clone(),
            created_on: record.created_on(),
            status: record.status,
            signatures,
        }
    }

    pub fn clinic_id(&self) -> &ClinicId {
        &self.clinic_id
    }

    pub fn patient_name(&self) -> &str {
        &self.patient_name
    }

    pub fn created_on(&self) -> NaiveDate {
        self.created_on
    }

    pub fn status(&self) -> WorkOrderStatus {
        self.status
    }

    pub fn signatures(&self) -> &[LineItemSignature] {
        &self.signatures
    }

    /// 规范字符串形式（JSON 数组，分隔无歧义），用于日志与外部比对
    pub fn canonical(&self) -> String {
        let signatures: Vec<_> = self
            .signatures
            .iter()
            .map(|s| json!([s.service_id, s.tooth_number, s.special_note]))
            .collect();

        json!([
            self.patient_name,
            self.clinic_id,
            self.created_on.format("%Y-%m-%d").to_string(),
            self.status.as_str(),
            signatures,
        ])
        .to_string()
    }
}

impl fmt::Display for GroupingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}
