//! 实验室报表
//!
//! 报表基于原始记录（不归并），统计工单数、服务件数与毛收入，并按税费配置
//! 给出总额与逐单的税额、净额。
//!
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::filter::WorkOrderFilter;
use crate::tax::{TaxBreakdown, TaxPolicy};
use crate::value_object::Money;
use crate::work_order::{ClinicId, WorkOrderId, WorkOrderRecord, WorkOrderStatus};

/// 报表周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportPeriod {
    Month { year: i32, month: u32 },
    Year { year: i32 },
    Custom { from: NaiveDate, to: NaiveDate },
}

impl ReportPeriod {
    /// 包含 `today` 的自然月
    pub fn current_month(today: NaiveDate) -> Self {
        ReportPeriod::Month {
            year: today.year(),
            month: today.month(),
        }
    }

    /// 闭区间 `[from, to]`
    pub fn date_range(&self) -> DomainResult<(NaiveDate, NaiveDate)> {
        match *self {
            ReportPeriod::Month { year, month } => {
                let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
                    DomainError::invalid_value(format!("invalid report month {year}-{month}"))
                })?;
                let last = first
                    .checked_add_months(Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .ok_or_else(|| {
                        DomainError::invalid_value(format!("report month {year}-{month} out of range"))
                    })?;
                Ok((first, last))
            }
            ReportPeriod::Year { year } => {
                let first = NaiveDate::from_ymd_opt(year, 1, 1);
                let last = NaiveDate::from_ymd_opt(year, 12, 31);
                first.zip(last).ok_or_else(|| {
                    DomainError::invalid_value(format!("invalid report year {year}"))
                })
            }
            ReportPeriod::Custom { from, to } => {
                if from > to {
                    return Err(DomainError::invalid_value(format!(
                        "report period start {from} is after its end {to}"
                    )));
                }
                Ok((from, to))
            }
        }
    }

    /// 转换为按创建日期筛选的条件
    pub fn to_filter(&self, clinic_id: Option<ClinicId>) -> DomainResult<WorkOrderFilter> {
        let (from, to) = self.date_range()?;
        Ok(WorkOrderFilter {
            clinic_id,
            created_from: Some(from),
            created_to: Some(to),
            ..Default::default()
        })
    }
}

/// 报表中的单条工单
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabReportRow {
    pub id: WorkOrderId,
    pub patient_name: String,
    pub clinic_id: ClinicId,
    pub created_on: NaiveDate,
    pub status: WorkOrderStatus,
    pub service_count: u64,
    pub amounts: TaxBreakdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabReport {
    pub record_count: usize,
    pub service_count: u64,
    pub gross_income: Money,
    pub totals: TaxBreakdown,
    pub rows: Vec<LabReportRow>,
}

impl LabReport {
    pub fn build<'a, I>(records: I, policy: Option<&TaxPolicy>) -> Self
    where
        I: IntoIterator<Item = &'a WorkOrderRecord>,
    {
        let rows: Vec<LabReportRow> = records
            .into_iter()
            .map(|r| LabReportRow {
                id: r.id.clone(),
                patient_name: r.patient_name.clone(),
                clinic_id: r.clinic_id.clone(),
                created_on: r.created_on(),
                status: r.status,
                service_count: r.service_count(),
                amounts: TaxBreakdown::compute(policy, r.total_price),
            })
            .collect();

        let gross_income: Money = rows.iter().map(|row| row.amounts.gross).sum();

        Self {
            record_count: rows.len(),
            service_count: rows.iter().map(|row| row.service_count).sum(),
            gross_income,
            totals: TaxBreakdown::compute(policy, gross_income),
            rows,
        }
    }

    /// 按周期（及可选诊所）筛选后生成报表
    pub fn for_period<'a, I>(
        records: I,
        period: &ReportPeriod,
        clinic_id: Option<ClinicId>,
        policy: Option<&TaxPolicy>,
    ) -> DomainResult<Self>
    where
        I: IntoIterator<Item = &'a WorkOrderRecord>,
    {
        let filtered = period.to_filter(clinic_id)?.apply(records)?;
        Ok(Self::build(filtered, policy))
    }
}
