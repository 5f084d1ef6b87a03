//! 值对象（Value Object）
//!
//! 无标识、以值相等为准的对象，用于封装不可变的概念性值与校验逻辑。
//!
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

use dentalflow_macros::value_object;
use rust_decimal::Decimal;

use crate::error::DomainError;

/// 值对象抽象
pub trait ValueObject {
    /// 业务校验失败时的错误类型
    type Error;

    /// 校验值是否满足业务约束
    fn validate(&self) -> Result<(), Self::Error>;
}

/// 金额
///
/// 以十进制精确表示，累加满足结合律与交换律，归并结果与折叠顺序无关。
///
/// ```
/// use dentalflow_domain::value_object::Money;
///
/// let total: Money = [Money::from(1000), Money::from(2000)].into_iter().sum();
/// assert_eq!(total, Money::from(3000));
/// ```
#[value_object]
#[derive(Copy, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub const fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl ValueObject for Money {
    type Error = DomainError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.is_negative() {
            return Err(DomainError::invalid_value(format!(
                "amount must not be negative: {self}"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

macro_rules! money_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Money {
                fn from(value: $t) -> Self {
                    Self(Decimal::from(value))
                }
            }
        )*
    };
}

money_from_int!(i32, i64, u32, u64);

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_default_is_zero() {
        assert_eq!(Money::default(), Money::ZERO);
        assert!(!Money::ZERO.is_negative());
    }

    #[test]
    fn test_money_arithmetic() {
        let mut m = Money::from(1000);
        m += Money::from(250);
        assert_eq!(m, Money::from(1250));
        assert_eq!(m - Money::from(1250), Money::ZERO);
        assert_eq!(m + Money::from(-250), Money::from(1000));
    }

    #[test]
    fn test_money_sum_is_exact() {
        // 0.1 + 0.2 在十进制下是精确的
        let a = Money::new(Decimal::new(1, 1));
        let b = Money::new(Decimal::new(2, 1));
        let total: Money = [a, b].iter().sum();
        assert_eq!(total, Money::new(Decimal::new(3, 1)));
    }

    #[test]
    fn test_money_validate() {
        assert!(Money::from(0).validate().is_ok());
        assert!(Money::from(10).validate().is_ok());
        let err = Money::from(-1).validate().unwrap_err();
        assert!(matches!(err, DomainError::InvalidValue { .. }));
    }

    #[test]
    fn test_money_display_normalizes() {
        assert_eq!(Money::new(Decimal::new(150000, 2)).to_string(), "1500");
        assert_eq!(Money::new(Decimal::new(1505, 1)).to_string(), "150.5");
    }

    #[test]
    fn test_money_deserializes_from_number_and_string() {
        let from_number: Money = serde_json::from_str("2000").unwrap();
        assert_eq!(from_number, Money::from(2000));

        let from_string: Money = serde_json::from_str("\"2000.50\"").unwrap();
        assert_eq!(from_string, Money::new(Decimal::new(200050, 2)));
    }
}
