//! 工单（Work Order）与明细（Line Item）
//!
//! 工单记录由远端存储持有，本模块只读取与校验。字段名以英文为准，
//! 同时通过 serde 别名兼容存储中的原始列名（`paciente`、`clinica_id`、`servicios` 等）。
//!
use std::fmt;
use std::str::FromStr;

use bon::Builder;
use chrono::{DateTime, NaiveDate, Utc};
use dentalflow_macros::{entity_id, value_object};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_object::{Money, ValueObject};

/// 工单标识（存储侧的不透明字符串）
#[entity_id]
pub struct WorkOrderId(String);

/// 诊所标识
#[entity_id]
pub struct ClinicId(String);

/// 服务目录项标识
#[entity_id]
pub struct ServiceId(String);

/// 牙医标识
#[entity_id]
pub struct DentistId(String);

/// 技工标识
#[entity_id]
pub struct TechnicianId(String);

/// 工单状态
#[value_object(default = false)]
#[derive(Copy, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    #[serde(alias = "pendiente")]
    Pending,
    #[serde(alias = "produccion")]
    InProduction,
    #[serde(alias = "terminado")]
    Finished,
    #[serde(alias = "entregado")]
    Delivered,
}

impl WorkOrderStatus {
    pub const ALL: [WorkOrderStatus; 4] = [
        WorkOrderStatus::Pending,
        WorkOrderStatus::InProduction,
        WorkOrderStatus::Finished,
        WorkOrderStatus::Delivered,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::Pending => "pending",
            WorkOrderStatus::InProduction => "in_production",
            WorkOrderStatus::Finished => "finished",
            WorkOrderStatus::Delivered => "delivered",
        }
    }

    /// 尚未完成（待处理或生产中）
    pub const fn is_open(&self) -> bool {
        matches!(
            self,
            WorkOrderStatus::Pending | WorkOrderStatus::InProduction
        )
    }
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkOrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" | "pendiente" => Ok(WorkOrderStatus::Pending),
            "in_production" | "produccion" => Ok(WorkOrderStatus::InProduction),
            "finished" | "terminado" => Ok(WorkOrderStatus::Finished),
            "delivered" | "entregado" => Ok(WorkOrderStatus::Delivered),
            other => Err(DomainError::Parse {
                reason: format!("unknown work order status: {other}"),
            }),
        }
    }
}

/// 工单明细：一项服务的数量与价格（`price` 为该数量的总价，而非单价）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
pub struct LineItem {
    #[builder(into)]
    #[serde(alias = "servicio_id")]
    pub service_id: ServiceId,
    #[serde(alias = "cantidad")]
    pub quantity: u32,
    #[builder(into)]
    #[serde(alias = "precio")]
    pub price: Money,
    /// 牙位编号
    #[builder(into)]
    #[serde(default, alias = "pieza_dental", skip_serializing_if = "Option::is_none")]
    pub tooth_number: Option<String>,
    #[builder(into)]
    #[serde(default, alias = "nota_especial", skip_serializing_if = "Option::is_none")]
    pub special_note: Option<String>,
}

impl ValueObject for LineItem {
    type Error = DomainError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.service_id.as_ref().trim().is_empty() {
            return Err(DomainError::invalid_value("line item service id is empty"));
        }
        if self.quantity == 0 {
            return Err(DomainError::invalid_value(format!(
                "line item quantity must be positive (service {})",
                self.service_id
            )));
        }
        self.price.validate()
    }
}

/// 交付记录（扫码确认交付时写入）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
pub struct DeliveryRecord {
    #[serde(alias = "fecha_entrega")]
    pub delivered_at: DateTime<Utc>,
    #[builder(into)]
    #[serde(alias = "entregado_por")]
    pub delivered_by: String,
    #[builder(into)]
    #[serde(default, alias = "receptor_nombre")]
    pub receiver_name: Option<String>,
    #[builder(into)]
    #[serde(default, alias = "observaciones_entrega")]
    pub observations: Option<String>,
}

impl ValueObject for DeliveryRecord {
    type Error = DomainError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.delivered_by.trim().is_empty() {
            return Err(DomainError::invalid_value(
                "delivery must name who delivered it",
            ));
        }
        Ok(())
    }
}

/// 工单记录（远端存储中的一行）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
pub struct WorkOrderRecord {
    #[builder(into)]
    pub id: WorkOrderId,
    #[builder(into)]
    #[serde(alias = "paciente")]
    pub patient_name: String,
    #[builder(into)]
    #[serde(alias = "clinica_id")]
    pub clinic_id: ClinicId,
    #[builder(into)]
    #[serde(default, alias = "dentista_id")]
    pub dentist_id: Option<DentistId>,
    #[builder(into)]
    #[serde(default, alias = "laboratorista_id")]
    pub technician_id: Option<TechnicianId>,
    #[serde(alias = "estado")]
    pub status: WorkOrderStatus,
    #[serde(alias = "fecha_creacion")]
    pub created_at: DateTime<Utc>,
    #[serde(default, alias = "fecha_entrega_estimada")]
    pub estimated_delivery: Option<NaiveDate>,
    #[builder(into)]
    #[serde(alias = "precio_total")]
    pub total_price: Money,
    #[builder(default)]
    #[serde(default, alias = "servicios")]
    pub line_items: Vec<LineItem>,
    #[builder(into)]
    #[serde(default, alias = "notas")]
    pub notes: Option<String>,
    #[serde(default)]
    pub delivery: Option<DeliveryRecord>,
}

impl WorkOrderRecord {
    /// 创建日期（UTC 日历日）
    pub fn created_on(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    /// 服务件数（各明细数量之和）
    pub fn service_count(&self) -> u64 {
        self.line_items.iter().map(|i| u64::from(i.quantity)).sum()
    }
}

impl ValueObject for WorkOrderRecord {
    type Error = DomainError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.id.as_ref().trim().is_empty() {
            return Err(DomainError::invalid_value("work order id is empty"));
        }
        if self.patient_name.trim().is_empty() {
            return Err(DomainError::invalid_value(format!(
                "work order {} has no patient name",
                self.id
            )));
        }
        if self.clinic_id.as_ref().trim().is_empty() {
            return Err(DomainError::invalid_value(format!(
                "work order {} has no clinic",
                self.id
            )));
        }
        self.total_price.validate()?;
        self.line_items.iter().try_for_each(ValueObject::validate)
    }
}
