//! 工单查询及其处理器
//!
//! 每次查询都重新拉取全部记录，先筛选、再归并，结果不缓存。
//!
use std::sync::Arc;

use async_trait::async_trait;
use dentalflow_domain::aggregation::{GroupedWorkOrders, WorkOrderAggregator};
use dentalflow_domain::filter::WorkOrderFilter;
use dentalflow_domain::persist::WorkOrderRepository;
use dentalflow_domain::report::{LabReport, ReportPeriod};
use dentalflow_domain::statistics::WorkOrderStatistics;
use dentalflow_domain::work_order::ClinicId;
use serde::{Deserialize, Serialize};

use crate::config::LabSettings;
use crate::context::AppContext;
use crate::error::AppError;
use crate::query::Query;
use crate::query_handler::QueryHandler;

use super::dto::{GroupedWorkOrdersDto, LabReportDto, WorkOrderStatisticsDto};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListGroupedWorkOrders {
    #[serde(default)]
    pub filter: WorkOrderFilter,
}

impl Query for ListGroupedWorkOrders {
    const NAME: &'static str = "work_orders.list_grouped";
    type Dto = GroupedWorkOrdersDto;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetWorkOrderStatistics {
    #[serde(default)]
    pub filter: WorkOrderFilter,
}

impl Query for GetWorkOrderStatistics {
    const NAME: &'static str = "work_orders.statistics";
    type Dto = WorkOrderStatisticsDto;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetLabReport {
    pub period: ReportPeriod,
    #[serde(default)]
    pub clinic_id: Option<ClinicId>,
}

impl Query for GetLabReport {
    const NAME: &'static str = "work_orders.lab_report";
    type Dto = LabReportDto;
}

pub struct WorkOrderQueryHandler<R> {
    repo: Arc<R>,
    settings: LabSettings,
}

impl<R> WorkOrderQueryHandler<R>
where
    R: WorkOrderRepository,
{
    pub fn new(repo: Arc<R>, settings: LabSettings) -> Self {
        Self { repo, settings }
    }

    /// 拉取、筛选并归并；返回分组结果与（筛选后、全部）记录数
    async fn grouped(
        &self,
        filter: &WorkOrderFilter,
    ) -> Result<(GroupedWorkOrders, usize, usize), AppError> {
        let records = self.repo.fetch_all().await?;
        let shown = filter.apply(&records)?;
        let shown_records = shown.len();
        let aggregates = WorkOrderAggregator::aggregate_checked(shown)?;

        tracing::debug!(
            total = records.len(),
            shown = shown_records,
            aggregates = aggregates.len(),
            "work orders aggregated"
        );
        Ok((
            GroupedWorkOrders::from_aggregates(aggregates),
            shown_records,
            records.len(),
        ))
    }
}

#[async_trait]
impl<R> QueryHandler<ListGroupedWorkOrders> for WorkOrderQueryHandler<R>
where
    R: WorkOrderRepository + 'static,
{
    async fn handle(
        &self,
        ctx: &AppContext,
        q: ListGroupedWorkOrders,
    ) -> Result<GroupedWorkOrdersDto, AppError> {
        ctx.ensure_active_membership()?;
        let (grouped, shown, total) = self.grouped(&q.filter).await?;
        tracing::info!(
            clinics = grouped.clinic_count(),
            aggregates = grouped.aggregate_count(),
            shown,
            total,
            "grouped work orders listed"
        );
        Ok(GroupedWorkOrdersDto::new(&grouped, shown, total))
    }
}

#[async_trait]
impl<R> QueryHandler<GetWorkOrderStatistics> for WorkOrderQueryHandler<R>
where
    R: WorkOrderRepository + 'static,
{
    async fn handle(
        &self,
        ctx: &AppContext,
        q: GetWorkOrderStatistics,
    ) -> Result<WorkOrderStatisticsDto, AppError> {
        ctx.ensure_active_membership()?;
        let (grouped, _, _) = self.grouped(&q.filter).await?;
        let stats = WorkOrderStatistics::from_aggregates(grouped.aggregates());
        Ok(WorkOrderStatisticsDto::from(&stats))
    }
}

#[async_trait]
impl<R> QueryHandler<GetLabReport> for WorkOrderQueryHandler<R>
where
    R: WorkOrderRepository + 'static,
{
    async fn handle(&self, ctx: &AppContext, q: GetLabReport) -> Result<LabReportDto, AppError> {
        ctx.ensure_can_view_reports()?;
        let (from, to) = q.period.date_range()?;
        let records = self.repo.fetch_all().await?;
        let report = LabReport::for_period(
            &records,
            &q.period,
            q.clinic_id.clone(),
            self.settings.tax_policy(),
        )?;

        tracing::info!(
            %from,
            %to,
            records = report.record_count,
            gross = %report.gross_income,
            "lab report built"
        );
        Ok(LabReportDto {
            from,
            to,
            clinic_id: q.clinic_id,
            report,
        })
    }
}
