use chrono::{DateTime, NaiveDate, Utc};
use dentalflow_domain::aggregation::{AggregatedWorkOrder, GroupedWorkOrders};
use dentalflow_domain::report::LabReport;
use dentalflow_domain::statistics::WorkOrderStatistics;
use dentalflow_domain::value_object::Money;
use dentalflow_domain::work_order::{
    ClinicId, DentistId, LineItem, TechnicianId, WorkOrderId, WorkOrderStatus,
};
use serde::Serialize;

use crate::dto::Dto;

/// 归并工单的展示形式
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedWorkOrderDto {
    pub primary_id: WorkOrderId,
    pub source_ids: Vec<WorkOrderId>,
    pub merged: bool,
    pub patient_name: String,
    pub clinic_id: ClinicId,
    pub dentist_id: Option<DentistId>,
    pub technician_id: Option<TechnicianId>,
    pub status: WorkOrderStatus,
    pub created_at: DateTime<Utc>,
    pub estimated_delivery: Option<NaiveDate>,
    pub total_price: Money,
    pub service_count: u64,
    pub line_items: Vec<LineItem>,
    pub notes: Option<String>,
}

impl From<&AggregatedWorkOrder> for AggregatedWorkOrderDto {
    fn from(agg: &AggregatedWorkOrder) -> Self {
        Self {
            primary_id: agg.primary_id().clone(),
            source_ids: agg.source_ids().to_vec(),
            merged: agg.is_merged(),
            patient_name: agg.patient_name().to_string(),
            clinic_id: agg.clinic_id().clone(),
            dentist_id: agg.dentist_id().cloned(),
            technician_id: agg.technician_id().cloned(),
            status: agg.status(),
            created_at: agg.created_at(),
            estimated_delivery: agg.estimated_delivery(),
            total_price: agg.total_price(),
            service_count: agg.service_count(),
            line_items: agg.line_items().to_vec(),
            notes: agg.notes().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatientGroupDto {
    pub patient_name: String,
    pub work_orders: Vec<AggregatedWorkOrderDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClinicGroupDto {
    pub clinic_id: ClinicId,
    pub patients: Vec<PatientGroupDto>,
}

/// 分组视图
///
/// `shown_records` 为筛选后的记录数，`total_records` 为存储中的记录总数。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupedWorkOrdersDto {
    pub clinics: Vec<ClinicGroupDto>,
    pub aggregate_count: usize,
    pub shown_records: usize,
    pub total_records: usize,
}

impl Dto for GroupedWorkOrdersDto {}

impl GroupedWorkOrdersDto {
    pub fn new(grouped: &GroupedWorkOrders, shown_records: usize, total_records: usize) -> Self {
        let clinics = grouped
            .clinics()
            .map(|(clinic_id, patients)| ClinicGroupDto {
                clinic_id: clinic_id.clone(),
                patients: patients
                    .iter()
                    .map(|(patient_name, aggs)| PatientGroupDto {
                        patient_name: patient_name.clone(),
                        work_orders: aggs.iter().map(AggregatedWorkOrderDto::from).collect(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            clinics,
            aggregate_count: grouped.aggregate_count(),
            shown_records,
            total_records,
        }
    }

    /// 按顺序遍历所有归并工单
    pub fn work_orders(&self) -> impl Iterator<Item = &AggregatedWorkOrderDto> {
        self.clinics
            .iter()
            .flat_map(|c| c.patients.iter())
            .flat_map(|p| p.work_orders.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkOrderStatisticsDto {
    pub total: usize,
    pub pending: usize,
    pub in_production: usize,
    pub finished: usize,
    pub delivered: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub revenue: Money,
}

impl Dto for WorkOrderStatisticsDto {}

impl From<&WorkOrderStatistics> for WorkOrderStatisticsDto {
    fn from(stats: &WorkOrderStatistics) -> Self {
        Self {
            total: stats.total,
            pending: stats.pending,
            in_production: stats.in_production,
            finished: stats.finished,
            delivered: stats.delivered,
            in_progress: stats.in_progress(),
            completed: stats.completed(),
            revenue: stats.revenue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabReportDto {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub clinic_id: Option<ClinicId>,
    #[serde(flatten)]
    pub report: LabReport,
}

impl Dto for LabReportDto {}
