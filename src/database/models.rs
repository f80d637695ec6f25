use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::error::LedgerError;

#[derive(Queryable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::users)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub referral_code: String,
    pub referred_by: Option<i64>,
    pub wallet_balance: BigDecimal,
    pub total_earnings: BigDecimal,
    pub pending_earnings: BigDecimal,
    pub created_at: NaiveDateTime,
}

#[derive(Queryable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::courses)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub price: BigDecimal,
    pub discount_price: Option<BigDecimal>,
    pub is_published: bool,
}

#[derive(Queryable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::cart_items)]
pub struct CartItem {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Queryable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::coupons)]
pub struct Coupon {
    pub id: i64,
    pub code: String,
    pub discount_type: String,
    pub discount_value: BigDecimal,
    pub max_uses: Option<i32>,
    pub valid_until: Option<NaiveDateTime>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Queryable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::coupon_uses)]
pub struct CouponUse {
    pub id: i64,
    pub coupon_id: i64,
    pub user_id: i64,
    pub order_id: i64,
    pub used_at: NaiveDateTime,
}

#[derive(Queryable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::orders)]
pub struct Order {
    pub id: i64,
    pub txn_id: String,
    pub user_id: i64,
    pub course_ids: Vec<i64>,
    pub subtotal: BigDecimal,
    pub discount: BigDecimal,
    pub coupon_code: Option<String>,
    pub total: BigDecimal,
    pub status: String,
    pub product_info: String,
    // buyer details as sent to the gateway, the callback hash is checked against these
    pub first_name: String,
    pub email: String,
    pub payment_method: String,
    pub payment_id: Option<String>,
    pub payment_mode: Option<String>,
    pub created_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
}

impl Order {
    pub fn status(&self) -> Result<OrderStatus, LedgerError> {
        self.status.parse()
    }
}

#[derive(Queryable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::enrollments)]
pub struct Enrollment {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub order_id: i64,
    pub progress_percentage: i32,
    pub completed_lesson_ids: Vec<i64>,
    pub is_completed: bool,
    pub enrolled_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
}

#[derive(Queryable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::referral_earnings)]
pub struct ReferralEarning {
    pub id: i64,
    pub referrer_id: i64,
    pub buyer_id: i64,
    pub course_id: i64,
    pub course_title: String,
    pub course_price: BigDecimal,
    pub commission_amount: BigDecimal,
    pub order_id: i64,
    pub status: String,
    pub created_at: NaiveDateTime,
}

#[derive(Queryable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::withdrawals)]
pub struct Withdrawal {
    pub id: i64,
    pub user_id: i64,
    pub amount: BigDecimal,
    pub bank_details: String,
    pub status: String,
    pub processed_by: Option<i64>,
    pub processed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl Withdrawal {
    pub fn status(&self) -> Result<WithdrawalStatus, LedgerError> {
        self.status.parse()
    }
}

#[derive(Queryable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::notifications)]
pub struct Notification {
    pub id: i64,
    pub user_id: Option<i64>,
    pub audience: String,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub data: Option<serde_json::Value>,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

/// Commission earnings are liquid as soon as they are posted.
pub const EARNING_AVAILABLE: &str = "available";

pub const AUDIENCE_USER: &str = "user";
pub const AUDIENCE_ADMIN: &str = "admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Completed,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            "failed" => Ok(OrderStatus::Failed),
            _ => Err(LedgerError::validation("order status")),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
}

impl WithdrawalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for WithdrawalStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(WithdrawalStatus::Pending),
            "approved" => Ok(WithdrawalStatus::Approved),
            "rejected" => Ok(WithdrawalStatus::Rejected),
            _ => Err(LedgerError::validation("withdrawal status")),
        }
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountType {
    Percentage,
    Fixed,
}

impl FromStr for DiscountType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(DiscountType::Percentage),
            "fixed" => Ok(DiscountType::Fixed),
            _ => Err(LedgerError::validation("discount type")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!("completed".parse::<OrderStatus>().unwrap(), OrderStatus::Completed);
        assert_eq!("rejected".parse::<WithdrawalStatus>().unwrap(), WithdrawalStatus::Rejected);
        assert_eq!("fixed".parse::<DiscountType>().unwrap(), DiscountType::Fixed);
        assert!(matches!(
            "refunded".parse::<OrderStatus>(),
            Err(LedgerError::Validation { field: "order status" })
        ));
        assert_eq!(OrderStatus::Pending.to_string(), "pending");
    }
}
