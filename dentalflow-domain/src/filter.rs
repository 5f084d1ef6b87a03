//! 工单筛选
//!
//! 每个条件都是一个 `Specification<WorkOrderRecord>`；`WorkOrderFilter`
//! 把可选条件组合为合取规约，`None` 表示“全部”。筛选发生在归并之前，
//! 日期一律按 UTC 日历日判断。
//!
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::specification::{AllOf, Specification};
use crate::work_order::{ClinicId, DentistId, TechnicianId, WorkOrderRecord, WorkOrderStatus};

pub struct ClinicIs(pub ClinicId);

impl Specification<WorkOrderRecord> for ClinicIs {
    fn is_satisfied_by(&self, candidate: &WorkOrderRecord) -> bool {
        candidate.clinic_id == self.0
    }
}

pub struct StatusIs(pub WorkOrderStatus);

impl Specification<WorkOrderRecord> for StatusIs {
    fn is_satisfied_by(&self, candidate: &WorkOrderRecord) -> bool {
        candidate.status == self.0
    }
}

/// 患者名包含（不区分大小写）
pub struct PatientNameContains {
    needle: String,
}

impl PatientNameContains {
    pub fn new(needle: impl AsRef<str>) -> Self {
        Self {
            needle: needle.as_ref().to_lowercase(),
        }
    }
}

impl Specification<WorkOrderRecord> for PatientNameContains {
    fn is_satisfied_by(&self, candidate: &WorkOrderRecord) -> bool {
        candidate
            .patient_name
            .to_lowercase()
            .contains(&self.needle)
    }
}

pub struct TechnicianIs(pub TechnicianId);

impl Specification<WorkOrderRecord> for TechnicianIs {
    fn is_satisfied_by(&self, candidate: &WorkOrderRecord) -> bool {
        candidate.technician_id.as_ref() == Some(&self.0)
    }
}

pub struct DentistIs(pub DentistId);

impl Specification<WorkOrderRecord> for DentistIs {
    fn is_satisfied_by(&self, candidate: &WorkOrderRecord) -> bool {
        candidate.dentist_id.as_ref() == Some(&self.0)
    }
}

pub struct CreatedInYear(pub i32);

impl Specification<WorkOrderRecord> for CreatedInYear {
    fn is_satisfied_by(&self, candidate: &WorkOrderRecord) -> bool {
        candidate.created_on().year() == self.0
    }
}

/// 创建月份（1–12），不限年份
pub struct CreatedInMonth(u32);

impl CreatedInMonth {
    pub fn new(month: u32) -> DomainResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(DomainError::invalid_value(format!(
                "month must be within 1..=12, got {month}"
            )));
        }
        Ok(Self(month))
    }
}

impl Specification<WorkOrderRecord> for CreatedInMonth {
    fn is_satisfied_by(&self, candidate: &WorkOrderRecord) -> bool {
        candidate.created_on().month() == self.0
    }
}

/// 创建日期位于闭区间 `[from, to]`
pub struct CreatedBetween {
    from: NaiveDate,
    to: NaiveDate,
}

impl CreatedBetween {
    pub fn new(from: NaiveDate, to: NaiveDate) -> DomainResult<Self> {
        if from > to {
            return Err(DomainError::invalid_value(format!(
                "date range start {from} is after its end {to}"
            )));
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }
}

impl Specification<WorkOrderRecord> for CreatedBetween {
    fn is_satisfied_by(&self, candidate: &WorkOrderRecord) -> bool {
        let day = candidate.created_on();
        self.from <= day && day <= self.to
    }
}

/// 工单筛选条件（均为可选）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrderFilter {
    #[serde(default)]
    pub clinic_id: Option<ClinicId>,
    #[serde(default)]
    pub status: Option<WorkOrderStatus>,
    #[serde(default)]
    pub patient: Option<String>,
    #[serde(default)]
    pub technician_id: Option<TechnicianId>,
    #[serde(default)]
    pub dentist_id: Option<DentistId>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub created_from: Option<NaiveDate>,
    #[serde(default)]
    pub created_to: Option<NaiveDate>,
}

impl WorkOrderFilter {
    /// 组合为合取规约；月份越界或日期区间倒置时报错
    pub fn specification(&self) -> DomainResult<AllOf<WorkOrderRecord>> {
        let mut spec = AllOf::new();

        if let Some(clinic_id) = &self.clinic_id {
            spec.push(ClinicIs(clinic_id.clone()));
        }
        if let Some(status) = self.status {
            spec.push(StatusIs(status));
        }
        if let Some(patient) = self.patient.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            spec.push(PatientNameContains::new(patient));
        }
        if let Some(technician_id) = &self.technician_id {
            spec.push(TechnicianIs(technician_id.clone()));
        }
        if let Some(dentist_id) = &self.dentist_id {
            spec.push(DentistIs(dentist_id.clone()));
        }
        if let Some(year) = self.year {
            spec.push(CreatedInYear(year));
        }
        if let Some(month) = self.month {
            spec.push(CreatedInMonth::new(month)?);
        }
        match (self.created_from, self.created_to) {
            (Some(from), Some(to)) => spec.push(CreatedBetween::new(from, to)?),
            (Some(from), None) => spec.push(CreatedBetween::new(from, NaiveDate::MAX)?),
            (None, Some(to)) => spec.push(CreatedBetween::new(NaiveDate::MIN, to)?),
            (None, None) => {}
        }

        Ok(spec)
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn matches(&self, record: &WorkOrderRecord) -> DomainResult<bool> {
        Ok(self.specification()?.is_satisfied_by(record))
    }

    /// 按原顺序保留满足条件的记录
    pub fn apply<'a, I>(&self, records: I) -> DomainResult<Vec<&'a WorkOrderRecord>>
    where
        I: IntoIterator<Item = &'a WorkOrderRecord>,
    {
        let spec = self.specification()?;
        Ok(records
            .into_iter()
            .filter(|r| spec.is_satisfied_by(r))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn record(id: &str, patient: &str, clinic: &str, at: &str) -> WorkOrderRecord {
        WorkOrderRecord::builder()
            .id(id)
            .patient_name(patient)
            .clinic_id(clinic)
            .status(WorkOrderStatus::Pending)
            .created_at(at.parse::<DateTime<Utc>>().unwrap())
            .total_price(0)
            .build()
    }

    fn sample() -> Vec<WorkOrderRecord> {
        vec![
            record("1", "Juan Perez", "C1", "2024-03-01T10:00:00Z"),
            record("2", "Maria Rojas", "C1", "2024-04-15T10:00:00Z"),
            record("3", "juanita Diaz", "C2", "2023-03-20T10:00:00Z"),
        ]
    }

    fn ids(records: Vec<&WorkOrderRecord>) -> Vec<&str> {
        records.into_iter().map(|r| r.id.as_ref().as_str()).collect()
    }

    #[test]
    fn empty_filter_matches_everything() {
        let records = sample();
        let filter = WorkOrderFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&records).unwrap().len(), 3);
    }

    #[test]
    fn patient_search_is_case_insensitive() {
        let records = sample();
        let filter = WorkOrderFilter {
            patient: Some("JUAN".into()),
            ..Default::default()
        };
        assert_eq!(ids(filter.apply(&records).unwrap()), vec!["1", "3"]);
    }

    #[test]
    fn month_matches_any_year() {
        let records = sample();
        let filter = WorkOrderFilter {
            month: Some(3),
            ..Default::default()
        };
        assert_eq!(ids(filter.apply(&records).unwrap()), vec!["1", "3"]);

        let filter = WorkOrderFilter {
            month: Some(3),
            year: Some(2024),
            ..Default::default()
        };
        assert_eq!(ids(filter.apply(&records).unwrap()), vec!["1"]);
    }

    #[test]
    fn clinic_and_status_combine() {
        let records = sample();
        let filter = WorkOrderFilter {
            clinic_id: Some(ClinicId::new("C1")),
            status: Some(WorkOrderStatus::Pending),
            ..Default::default()
        };
        assert_eq!(ids(filter.apply(&records).unwrap()), vec!["1", "2"]);

        let filter = WorkOrderFilter {
            status: Some(WorkOrderStatus::Delivered),
            ..Default::default()
        };
        assert!(filter.apply(&records).unwrap().is_empty());
    }

    #[test]
    fn date_range_is_inclusive() {
        let records = sample();
        let filter = WorkOrderFilter {
            created_from: NaiveDate::from_ymd_opt(2024, 3, 1),
            created_to: NaiveDate::from_ymd_opt(2024, 4, 15),
            ..Default::default()
        };
        assert_eq!(ids(filter.apply(&records).unwrap()), vec!["1", "2"]);

        let open_ended = WorkOrderFilter {
            created_from: NaiveDate::from_ymd_opt(2024, 4, 1),
            ..Default::default()
        };
        assert_eq!(ids(open_ended.apply(&records).unwrap()), vec!["2"]);
    }

    #[test]
    fn invalid_filters_are_rejected() {
        let records = sample();
        let bad_month = WorkOrderFilter {
            month: Some(13),
            ..Default::default()
        };
        assert!(matches!(
            bad_month.apply(&records),
            Err(DomainError::InvalidValue { .. })
        ));

        let inverted = WorkOrderFilter {
            created_from: NaiveDate::from_ymd_opt(2024, 5, 1),
            created_to: NaiveDate::from_ymd_opt(2024, 4, 1),
            ..Default::default()
        };
        assert!(inverted.matches(&records[0]).is_err());
    }

    #[test]
    fn technician_filter_requires_assignment() {
        let mut records = sample();
        records[1].technician_id = Some(TechnicianId::new("T1"));
        let filter = WorkOrderFilter {
            technician_id: Some(TechnicianId::new("T1")),
            ..Default::default()
        };
        assert_eq!(ids(filter.apply(&records).unwrap()), vec!["2"]);
    }
}
