use bon::Builder;
use chrono::{DateTime, NaiveDate, Utc};
use dentalflow_domain::membership::{Membership, Role};
use ulid::Ulid;

use crate::error::AppError;

/// 操作者：用户 id、角色与会员档案（档案缺失视为免费试用）
#[derive(Clone, Debug, PartialEq, Eq, Builder)]
pub struct Actor {
    #[builder(into)]
    pub id: String,
    pub role: Role,
    pub membership: Option<Membership>,
}

impl Actor {
    /// 内部任务使用的管理员身份
    pub fn system() -> Self {
        Self {
            id: "system".to_string(),
            role: Role::Admin,
            membership: None,
        }
    }
}

/// 应用层上下文（Application Context）
///
/// 承载一次应用层调用（命令/查询）所需的横切信息：
/// - 操作者（`Actor`）：用于角色与会员有效期校验；
/// - 关联追踪 `correlation_id`（默认生成 ULID）；
/// - 请求时间 `requested_at`：会员有效期与交付时间都以此为准；
/// - 幂等键（`idempotency_key`）：用于在基础设施层实现请求幂等。
///
/// 典型用法：
/// ```rust
/// use dentalflow_application::context::{Actor, AppContext};
/// use dentalflow_domain::membership::Role;
///
/// let ctx = AppContext::builder()
///     .actor(Actor::builder().id("u-1").role(Role::Client).build())
///     .correlation_id("cor-123")
///     .idempotency_key("idem-xyz")
///     .build();
/// assert!(ctx.ensure_can_view_reports().is_ok());
/// ```
#[derive(Clone, Debug, Builder)]
pub struct AppContext {
    pub actor: Actor,
    #[builder(into, default = Ulid::new().to_string())]
    pub correlation_id: String,
    #[builder(default = Utc::now())]
    pub requested_at: DateTime<Utc>,
    #[builder(into)]
    pub idempotency_key: Option<String>,
}

impl Default for AppContext {
    fn default() -> Self {
        Self::builder().actor(Actor::system()).build()
    }
}

impl AppContext {
    pub fn today(&self) -> NaiveDate {
        self.requested_at.date_naive()
    }

    /// 操作者当前生效的会员档案
    pub fn membership(&self) -> Membership {
        Membership::or_free_trial(self.actor.membership.clone(), self.today())
    }

    /// 工单的读写：任意角色，会员有效；管理员不受会员限制
    pub fn ensure_active_membership(&self) -> Result<(), AppError> {
        if self.actor.role.bypasses_membership() {
            return Ok(());
        }
        let membership = self.membership();
        if membership.is_active(self.today()) {
            return Ok(());
        }
        Err(AppError::Authorization(format!(
            "membership of {} is not active (plan {}, {} days remaining)",
            self.actor.id,
            membership.plan,
            membership.days_remaining(self.today())
        )))
    }

    /// 报表：仅管理员与诊所用户，且会员有效
    pub fn ensure_can_view_reports(&self) -> Result<(), AppError> {
        if !self.actor.role.can_view_reports() {
            return Err(AppError::Authorization(format!(
                "role {} cannot view reports",
                self.actor.role
            )));
        }
        self.ensure_active_membership()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ctx(role: Role, membership: Option<Membership>) -> AppContext {
        AppContext::builder()
            .actor(Actor::builder().id("u-1").role(role).maybe_membership(membership).build())
            .requested_at(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
            .build()
    }

    fn expired() -> Membership {
        Membership {
            plan: "pro".into(),
            expires_on: NaiveDate::from_ymd_opt(2024, 5, 1),
            subscription_active: true,
        }
    }

    #[test]
    fn default_context_is_system_admin() {
        let ctx = AppContext::default();
        assert_eq!(ctx.actor.role, Role::Admin);
        assert_eq!(ctx.correlation_id.len(), 26);
        assert!(ctx.ensure_can_view_reports().is_ok());
    }

    #[test]
    fn missing_profile_gets_free_trial() {
        let ctx = ctx(Role::Technician, None);
        assert!(ctx.ensure_active_membership().is_ok());
        assert_eq!(ctx.membership().days_remaining(ctx.today()), 30);
    }

    #[test]
    fn expired_membership_is_rejected_except_for_admins() {
        assert!(matches!(
            ctx(Role::Client, Some(expired())).ensure_active_membership(),
            Err(AppError::Authorization(_))
        ));
        assert!(ctx(Role::Admin, Some(expired())).ensure_active_membership().is_ok());
    }

    #[test]
    fn technicians_cannot_view_reports() {
        assert!(matches!(
            ctx(Role::Technician, None).ensure_can_view_reports(),
            Err(AppError::Authorization(_))
        ));
        assert!(ctx(Role::Client, None).ensure_can_view_reports().is_ok());
    }
}
