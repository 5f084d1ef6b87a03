//! 会员有效期与角色
//!
use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// 免费试用天数（无会员档案时）
pub const FREE_TRIAL_DAYS: u64 = 30;

pub const FREE_PLAN: &str = "free";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[serde(alias = "cliente")]
    Client,
    #[serde(alias = "laboratorista")]
    Technician,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Client => "client",
            Role::Technician => "technician",
        }
    }

    /// 是否可查看报表
    pub const fn can_view_reports(&self) -> bool {
        matches!(self, Role::Admin | Role::Client)
    }

    /// 管理员不受会员有效期限制
    pub const fn bypasses_membership(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(Role::Admin),
            "client" | "cliente" => Ok(Role::Client),
            "technician" | "laboratorista" => Ok(Role::Technician),
            other => Err(DomainError::Parse {
                reason: format!("unknown role: {other}"),
            }),
        }
    }
}

/// 会员档案
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    #[serde(default = "free_plan")]
    pub plan: String,
    #[serde(default, alias = "fecha_expiracion")]
    pub expires_on: Option<NaiveDate>,
    #[serde(default, alias = "suscripcion_activa")]
    pub subscription_active: bool,
}

fn free_plan() -> String {
    FREE_PLAN.to_string()
}

impl Membership {
    /// 无档案时的免费试用：自 `today` 起 30 天
    pub fn free_trial(today: NaiveDate) -> Self {
        Self {
            plan: free_plan(),
            expires_on: today.checked_add_days(Days::new(FREE_TRIAL_DAYS)),
            subscription_active: true,
        }
    }

    /// 档案缺失时回退为免费试用
    pub fn or_free_trial(profile: Option<Membership>, today: NaiveDate) -> Self {
        profile.unwrap_or_else(|| Self::free_trial(today))
    }

    /// 距到期的整天数，不小于 0；未设置到期日为 0
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        self.expires_on
            .map(|expires| (expires - today).num_days().max(0))
            .unwrap_or(0)
    }

    pub fn is_active(&self, today: NaiveDate) -> bool {
        self.subscription_active && self.days_remaining(today) > 0
    }

    pub fn is_free(&self) -> bool {
        self.plan == FREE_PLAN || self.plan == "gratuita"
    }
}
