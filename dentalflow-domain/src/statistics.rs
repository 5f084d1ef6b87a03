//! 看板统计（基于归并结果）
//!
use serde::Serialize;

use crate::aggregation::AggregatedWorkOrder;
use crate::value_object::Money;
use crate::work_order::WorkOrderStatus;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkOrderStatistics {
    pub total: usize,
    pub pending: usize,
    pub in_production: usize,
    pub finished: usize,
    pub delivered: usize,
    pub revenue: Money,
}

impl WorkOrderStatistics {
    pub fn from_aggregates<'a, I>(aggregates: I) -> Self
    where
        I: IntoIterator<Item = &'a AggregatedWorkOrder>,
    {
        aggregates
            .into_iter()
            .fold(Self::default(), |mut stats, agg| {
                stats.total += 1;
                match agg.status() {
                    WorkOrderStatus::Pending => stats.pending += 1,
                    WorkOrderStatus::InProduction => stats.in_production += 1,
                    WorkOrderStatus::Finished => stats.finished += 1,
                    WorkOrderStatus::Delivered => stats.delivered += 1,
                }
                stats.revenue += agg.total_price();
                stats
            })
    }

    /// 进行中（待处理 + 生产中）
    pub fn in_progress(&self) -> usize {
        self.pending + self.in_production
    }

    /// 已完成（已完成 + 已交付）
    pub fn completed(&self) -> usize {
        self.finished + self.delivered
    }

    pub fn count(&self, status: WorkOrderStatus) -> usize {
        match status {
            WorkOrderStatus::Pending => self.pending,
            WorkOrderStatus::InProduction => self.in_production,
            WorkOrderStatus::Finished => self.finished,
            WorkOrderStatus::Delivered => self.delivered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::WorkOrderAggregator;
    use crate::work_order::WorkOrderRecord;
    use chrono::{TimeZone, Utc};

    fn record(id: &str, patient: &str, status: WorkOrderStatus, total: i64) -> WorkOrderRecord {
        WorkOrderRecord::builder()
            .id(id)
            .patient_name(patient)
            .clinic_id("C1")
            .status(status)
            .created_at(Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap())
            .total_price(total)
            .build()
    }

    #[test]
    fn counts_aggregates_not_records() {
        let records = vec![
            record("1", "A", WorkOrderStatus::Pending, 100),
            record("2", "A", WorkOrderStatus::Pending, 100),
            record("3", "B", WorkOrderStatus::InProduction, 50),
            record("4", "C", WorkOrderStatus::Delivered, 25),
        ];
        let aggregates = WorkOrderAggregator::aggregate(&records);
        let stats = WorkOrderStatistics::from_aggregates(&aggregates);

        assert_eq!(stats.total, 3);
        assert_eq!(stats.count(WorkOrderStatus::Pending), 1);
        assert_eq!(stats.in_progress(), 2);
        assert_eq!(stats.completed(), 1);
        assert_eq!(stats.revenue, Money::from(275));
    }

    #[test]
    fn empty_statistics() {
        let stats = WorkOrderStatistics::from_aggregates(&[]);
        assert_eq!(stats, WorkOrderStatistics::default());
    }
}
