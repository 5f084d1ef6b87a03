//! 实验室运行配置
//!
//! 配置在进程启动时解析一次，然后注入处理器；处理请求期间不再读取环境变量。
//!
use std::path::{Path, PathBuf};

use dentalflow_domain::tax::{TaxPolicy, TaxRegime};
use rust_decimal::Decimal;

use crate::error::AppError;

pub const TAX_REGIME_ENV: &str = "DENTALFLOW_TAX_REGIME";
pub const TAX_PERCENT_ENV: &str = "DENTALFLOW_TAX_PERCENT";
pub const FIXTURE_PATH_ENV: &str = "DENTALFLOW_FIXTURE";

pub const DEFAULT_TAX_PERCENT: u32 = 19;
pub const DEFAULT_FIXTURE_PATH: &str = "demo/fixtures/work_orders.json";

/// 启动时解析完成的配置
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabSettings {
    tax_policy: Option<TaxPolicy>,
    fixture_path: PathBuf,
}

impl LabSettings {
    pub fn new(tax_policy: Option<TaxPolicy>, fixture_path: PathBuf) -> Result<Self, AppError> {
        if fixture_path.as_os_str().is_empty() {
            return Err(AppError::Config("fixture path cannot be empty".into()));
        }
        Ok(Self {
            tax_policy,
            fixture_path,
        })
    }

    /// 从环境变量解析（调用方应先加载 `.env`）
    pub fn from_env() -> Result<Self, AppError> {
        let var = |key: &str| std::env::var(key).ok();
        Self::from_values(var(TAX_REGIME_ENV), var(TAX_PERCENT_ENV), var(FIXTURE_PATH_ENV))
    }

    /// 由原始字符串值解析，便于测试时不读取进程环境
    pub fn from_values(
        regime: Option<String>,
        percent: Option<String>,
        fixture_path: Option<String>,
    ) -> Result<Self, AppError> {
        let tax_policy = tax_policy_from_env_values(regime, percent)?;
        let fixture_path = non_blank(fixture_path)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FIXTURE_PATH));
        Self::new(tax_policy, fixture_path)
    }

    pub fn tax_policy(&self) -> Option<&TaxPolicy> {
        self.tax_policy.as_ref()
    }

    pub fn fixture_path(&self) -> &Path {
        &self.fixture_path
    }

    pub fn with_fixture_path(mut self, fixture_path: PathBuf) -> Result<Self, AppError> {
        self.fixture_path = fixture_path;
        Self::new(self.tax_policy, self.fixture_path)
    }
}

impl Default for LabSettings {
    fn default() -> Self {
        Self {
            tax_policy: TaxPolicy::new(TaxRegime::Vat, Decimal::from(DEFAULT_TAX_PERCENT)).ok(),
            fixture_path: PathBuf::from(DEFAULT_FIXTURE_PATH),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 解析税费配置
///
/// - 制度为空时默认 `iva`，为 `none` 时不计税；
/// - 税率为空时默认 19，必须在 0–100 之间。
pub fn tax_policy_from_env_values(
    regime: Option<String>,
    percent: Option<String>,
) -> Result<Option<TaxPolicy>, AppError> {
    let regime = match non_blank(regime) {
        None => TaxRegime::Vat,
        Some(v) if v.eq_ignore_ascii_case("none") => return Ok(None),
        Some(v) => v
            .parse::<TaxRegime>()
            .map_err(|e| AppError::Config(format!("{TAX_REGIME_ENV}: {e}")))?,
    };

    let percent = match non_blank(percent) {
        None => Decimal::from(DEFAULT_TAX_PERCENT),
        Some(v) => v
            .parse::<Decimal>()
            .map_err(|e| AppError::Config(format!("{TAX_PERCENT_ENV}: {e}")))?,
    };

    TaxPolicy::new(regime, percent)
        .map(Some)
        .map_err(|e| AppError::Config(format!("{TAX_PERCENT_ENV}: {e}")))
}
