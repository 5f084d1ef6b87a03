//! 归并与分组编排
//!
use std::collections::BTreeMap;
use std::collections::HashSet;

use serde::Serialize;

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;
use crate::work_order::{ClinicId, WorkOrderRecord};

use super::aggregated::AggregatedWorkOrder;
use super::key::GroupingKey;
use super::reducer::{AggregateMap, fold_record};

/// 患者名 → 该患者的归并工单
pub type PatientGroups = BTreeMap<String, Vec<AggregatedWorkOrder>>;

/// 工单归并器（无状态）
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkOrderAggregator;

impl WorkOrderAggregator {
    /// 归并记录，按键顺序输出；空输入得到空输出
    pub fn aggregate<'a, I>(records: I) -> Vec<AggregatedWorkOrder>
    where
        I: IntoIterator<Item = &'a WorkOrderRecord>,
    {
        let mut map = AggregateMap::new();
        for record in records {
            fold_record(&mut map, GroupingKey::derive(record), record);
        }
        map.into_values().collect()
    }

    /// 先校验每条记录（含 id 唯一），任一失败即返回错误，不会静默丢弃记录
    pub fn aggregate_checked<'a, I>(records: I) -> DomainResult<Vec<AggregatedWorkOrder>>
    where
        I: IntoIterator<Item = &'a WorkOrderRecord>,
    {
        let mut seen = HashSet::new();
        let mut map = AggregateMap::new();
        for record in records {
            record.validate()?;
            if !seen.insert(&record.id) {
                return Err(DomainError::invalid_value(format!(
                    "duplicate work order id: {}",
                    record.id
                )));
            }
            fold_record(&mut map, GroupingKey::derive(record), record);
        }
        Ok(map.into_values().collect())
    }

    /// 归并后按“诊所 → 患者”分组
    pub fn group<'a, I>(records: I) -> GroupedWorkOrders
    where
        I: IntoIterator<Item = &'a WorkOrderRecord>,
    {
        GroupedWorkOrders::from_aggregates(Self::aggregate(records))
    }
}

/// 诊所 → 患者 → 归并工单，每个归并结果恰好出现一次
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GroupedWorkOrders {
    clinics: BTreeMap<ClinicId, PatientGroups>,
}

impl GroupedWorkOrders {
    pub fn from_aggregates<I>(aggregates: I) -> Self
    where
        I: IntoIterator<Item = AggregatedWorkOrder>,
    {
        let mut clinics: BTreeMap<ClinicId, PatientGroups> = BTreeMap::new();
        for agg in aggregates {
            clinics
                .entry(agg.clinic_id().clone())
                .or_default()
                .entry(agg.patient_name().to_string())
                .or_default()
                .push(agg);
        }
        Self { clinics }
    }

    /// 还原为扁平列表（诊所、患者有序）
    pub fn flatten(self) -> Vec<AggregatedWorkOrder> {
        self.clinics
            .into_values()
            .flat_map(BTreeMap::into_values)
            .flatten()
            .collect()
    }

    pub fn clinic(&self, clinic_id: &ClinicId) -> Option<&PatientGroups> {
        self.clinics.get(clinic_id)
    }

    pub fn patient(&self, clinic_id: &ClinicId, patient_name: &str) -> Option<&[AggregatedWorkOrder]> {
        self.clinic(clinic_id)?
            .get(patient_name)
            .map(Vec::as_slice)
    }

    pub fn clinics(&self) -> impl Iterator<Item = (&ClinicId, &PatientGroups)> {
        self.clinics.iter()
    }

    /// 按顺序遍历所有归并结果
    pub fn aggregates(&self) -> impl Iterator<Item = &AggregatedWorkOrder> {
        self.clinics.values().flat_map(|p| p.values()).flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.clinics.is_empty()
    }

    pub fn clinic_count(&self) -> usize {
        self.clinics.len()
    }

    pub fn patient_count(&self) -> usize {
        self.clinics.values().map(BTreeMap::len).sum()
    }

    pub fn aggregate_count(&self) -> usize {
        self.aggregates().count()
    }

    /// 所有归并结果覆盖的原始记录数
    pub fn record_count(&self) -> usize {
        self.aggregates().map(|a| a.source_ids().len()).sum()
    }
}
