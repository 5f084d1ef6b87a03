//! 税费计算
//!
//! 两种制度：增值税（IVA，税额加在毛额之上）与劳务预扣（honorarios，
//! 税额从毛额中扣除）。税额保留两位小数，中点远离零舍入。
//!
use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxRegime {
    #[serde(alias = "iva")]
    Vat,
    #[serde(alias = "honorarios", alias = "retencion")]
    Withholding,
}

impl TaxRegime {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TaxRegime::Vat => "vat",
            TaxRegime::Withholding => "withholding",
        }
    }
}

impl fmt::Display for TaxRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaxRegime {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vat" | "iva" => Ok(TaxRegime::Vat),
            "withholding" | "honorarios" | "retencion" => Ok(TaxRegime::Withholding),
            other => Err(DomainError::Parse {
                reason: format!("unknown tax regime: {other}"),
            }),
        }
    }
}

/// 实验室税费配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaxPolicy {
    regime: TaxRegime,
    percent: Decimal,
}

impl TaxPolicy {
    pub fn new(regime: TaxRegime, percent: Decimal) -> DomainResult<Self> {
        if percent.is_sign_negative() || percent > Decimal::ONE_HUNDRED {
            return Err(DomainError::invalid_value(format!(
                "tax percent must be within 0..=100, got {percent}"
            )));
        }
        Ok(Self { regime, percent })
    }

    pub fn regime(&self) -> TaxRegime {
        self.regime
    }

    pub fn percent(&self) -> Decimal {
        self.percent
    }

    pub fn apply(&self, gross: Money) -> TaxBreakdown {
        let tax = (gross.amount() * self.percent / Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let net = match self.regime {
            TaxRegime::Vat => gross.amount() + tax,
            TaxRegime::Withholding => gross.amount() - tax,
        };
        TaxBreakdown {
            gross,
            tax: Money::new(tax),
            net: Money::new(net),
            percent: self.percent,
            regime: Some(self.regime),
        }
    }
}

/// 毛额、税额与净额
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaxBreakdown {
    pub gross: Money,
    pub tax: Money,
    pub net: Money,
    pub percent: Decimal,
    /// 未配置税费时为 `None`
    pub regime: Option<TaxRegime>,
}

impl TaxBreakdown {
    /// 未配置税费：税额为零，净额等于毛额
    pub fn untaxed(gross: Money) -> Self {
        Self {
            gross,
            tax: Money::ZERO,
            net: gross,
            percent: Decimal::ZERO,
            regime: None,
        }
    }

    pub fn compute(policy: Option<&TaxPolicy>, gross: Money) -> Self {
        match policy {
            Some(policy) => policy.apply(gross),
            None => Self::untaxed(gross),
        }
    }
}
