use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;

use crate::database::models::{
    CartItem, Coupon, CouponUse, Course, Enrollment, Notification, Order, OrderStatus, ReferralEarning, User,
    Withdrawal, WithdrawalStatus,
};
use crate::database::store::{GatewayPayment, LedgerStore};
use crate::error::LedgerError;

/// In-process `LedgerStore` mirroring the constraints of the SQL schema.
///
/// `atomically` snapshots the whole store and restores it on error, which
/// gives the same all-or-nothing behaviour as a database transaction.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    pub users: Vec<User>,
    pub courses: Vec<Course>,
    pub cart: Vec<CartItem>,
    pub coupons: Vec<Coupon>,
    pub coupon_uses: Vec<CouponUse>,
    pub orders: Vec<Order>,
    pub enrollments: Vec<Enrollment>,
    pub earnings: Vec<ReferralEarning>,
    pub withdrawals: Vec<Withdrawal>,
    pub notifications: Vec<Notification>,
    /// Operation name that should fail with a database error.
    pub fail_on: Option<&'static str>,
}

impl MemoryLedger {
    pub fn user(&self, user_id: i64) -> &User {
        self.users.iter().find(|u| u.id == user_id).unwrap()
    }

    pub fn order(&self, txn_id: &str) -> &Order {
        self.orders.iter().find(|o| o.txn_id == txn_id).unwrap()
    }

    fn check(&self, operation: &'static str) -> Result<(), LedgerError> {
        if self.fail_on == Some(operation) {
            return Err(diesel::result::Error::QueryBuilderError(format!("injected failure in {operation}").into()).into());
        }
        Ok(())
    }

    fn user_mut(&mut self, user_id: i64) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == user_id)
    }
}

fn newest_first<T: Clone>(rows: impl Iterator<Item = T>, created_at: impl Fn(&T) -> NaiveDateTime) -> Vec<T> {
    let mut rows: Vec<T> = rows.collect();
    rows.sort_by_key(|row| std::cmp::Reverse(created_at(row)));
    rows
}

impl LedgerStore for MemoryLedger {
    fn atomically<T, F>(&mut self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Self) -> Result<T, LedgerError>,
    {
        let snapshot = self.clone();
        let res = f(self);
        if res.is_err() {
            *self = snapshot;
        }
        res
    }

    fn find_user(&mut self, user_id: i64) -> Result<Option<User>, LedgerError> {
        Ok(self.users.iter().find(|u| u.id == user_id).cloned())
    }

    fn find_user_by_referral_code(&mut self, code: &str) -> Result<Option<User>, LedgerError> {
        Ok(self.users.iter().find(|u| u.referral_code == code).cloned())
    }

    fn find_users(&mut self, user_ids: &[i64]) -> Result<Vec<User>, LedgerError> {
        Ok(self.users.iter().filter(|u| user_ids.contains(&u.id)).cloned().collect())
    }

    fn count_referred_users(&mut self, referrer_id: i64) -> Result<i64, LedgerError> {
        Ok(self.users.iter().filter(|u| u.referred_by == Some(referrer_id)).count() as i64)
    }

    fn referred_users(&mut self, referrer_id: i64) -> Result<Vec<User>, LedgerError> {
        Ok(newest_first(
            self.users.iter().filter(|u| u.referred_by == Some(referrer_id)).cloned(),
            |u| u.created_at,
        ))
    }

    fn set_referrer_once(&mut self, user_id: i64, referrer_id: i64) -> Result<bool, LedgerError> {
        match self.user_mut(user_id) {
            Some(user) if user.referred_by.is_none() => {
                user.referred_by = Some(referrer_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn credit_commission(&mut self, user_id: i64, amount: &BigDecimal) -> Result<(), LedgerError> {
        self.check("credit_commission")?;
        if let Some(user) = self.user_mut(user_id) {
            user.wallet_balance += amount.clone();
            user.total_earnings += amount.clone();
        }
        Ok(())
    }

    fn reserve_withdrawal_funds(&mut self, user_id: i64, amount: &BigDecimal) -> Result<bool, LedgerError> {
        match self.user_mut(user_id) {
            Some(user) if user.wallet_balance >= *amount => {
                user.wallet_balance -= amount.clone();
                user.pending_earnings += amount.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn release_pending_funds(
        &mut self,
        user_id: i64,
        amount: &BigDecimal,
        restore_wallet: bool,
    ) -> Result<(), LedgerError> {
        if let Some(user) = self.user_mut(user_id) {
            user.pending_earnings -= amount.clone();
            if restore_wallet {
                user.wallet_balance += amount.clone();
            }
        }
        Ok(())
    }

    fn find_course(&mut self, course_id: i64) -> Result<Option<Course>, LedgerError> {
        Ok(self.courses.iter().find(|c| c.id == course_id).cloned())
    }

    fn find_courses(&mut self, course_ids: &[i64]) -> Result<Vec<Course>, LedgerError> {
        let mut courses: Vec<Course> = self
            .courses
            .iter()
            .filter(|c| course_ids.contains(&c.id))
            .cloned()
            .collect();
        courses.sort_by_key(|c| c.id);
        Ok(courses)
    }

    fn cart_items(&mut self, user_id: i64) -> Result<Vec<CartItem>, LedgerError> {
        Ok(self.cart.iter().filter(|i| i.user_id == user_id).cloned().collect())
    }

    fn insert_cart_item(&mut self, item: &CartItem) -> Result<bool, LedgerError> {
        if self
            .cart
            .iter()
            .any(|i| i.user_id == item.user_id && i.course_id == item.course_id)
        {
            return Ok(false);
        }
        self.cart.push(item.clone());
        Ok(true)
    }

    fn remove_cart_item(&mut self, user_id: i64, item_id: i64) -> Result<bool, LedgerError> {
        let before = self.cart.len();
        self.cart.retain(|i| !(i.id == item_id && i.user_id == user_id));
        Ok(self.cart.len() < before)
    }

    fn clear_cart(&mut self, user_id: i64) -> Result<usize, LedgerError> {
        let before = self.cart.len();
        self.cart.retain(|i| i.user_id != user_id);
        Ok(before - self.cart.len())
    }

    fn find_active_coupon(&mut self, code: &str) -> Result<Option<Coupon>, LedgerError> {
        Ok(self.coupons.iter().find(|c| c.code == code && c.is_active).cloned())
    }

    fn lock_coupon(&mut self, code: &str) -> Result<Option<Coupon>, LedgerError> {
        Ok(self.coupons.iter().find(|c| c.code == code).cloned())
    }

    fn count_coupon_uses(&mut self, coupon_id: i64) -> Result<i64, LedgerError> {
        Ok(self.coupon_uses.iter().filter(|u| u.coupon_id == coupon_id).count() as i64)
    }

    fn insert_coupon_use(&mut self, coupon_use: &CouponUse) -> Result<bool, LedgerError> {
        self.check("insert_coupon_use")?;
        if self
            .coupon_uses
            .iter()
            .any(|u| u.coupon_id == coupon_use.coupon_id && u.order_id == coupon_use.order_id)
        {
            return Ok(false);
        }
        self.coupon_uses.push(coupon_use.clone());
        Ok(true)
    }

    fn insert_order(&mut self, order: &Order) -> Result<(), LedgerError> {
        self.orders.push(order.clone());
        Ok(())
    }

    fn lock_order_by_txn(&mut self, txn_id: &str) -> Result<Option<Order>, LedgerError> {
        Ok(self.orders.iter().find(|o| o.txn_id == txn_id).cloned())
    }

    fn mark_order_completed(
        &mut self,
        order_id: i64,
        payment: &GatewayPayment,
        completed_at: NaiveDateTime,
    ) -> Result<bool, LedgerError> {
        match self.orders.iter_mut().find(|o| o.id == order_id) {
            Some(order) if order.status == OrderStatus::Pending.as_str() => {
                order.status = OrderStatus::Completed.as_str().to_string();
                order.payment_id = payment.payment_id.clone();
                order.payment_mode = payment.payment_mode.clone();
                order.completed_at = Some(completed_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn mark_order_failed(&mut self, order_id: i64) -> Result<bool, LedgerError> {
        match self.orders.iter_mut().find(|o| o.id == order_id) {
            Some(order) if order.status == OrderStatus::Pending.as_str() => {
                order.status = OrderStatus::Failed.as_str().to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn orders_for_user(&mut self, user_id: i64) -> Result<Vec<Order>, LedgerError> {
        Ok(newest_first(
            self.orders.iter().filter(|o| o.user_id == user_id).cloned(),
            |o| o.created_at,
        ))
    }

    fn is_enrolled(&mut self, user_id: i64, course_id: i64) -> Result<bool, LedgerError> {
        Ok(self
            .enrollments
            .iter()
            .any(|e| e.user_id == user_id && e.course_id == course_id))
    }

    fn insert_enrollment(&mut self, enrollment: &Enrollment) -> Result<bool, LedgerError> {
        self.check("insert_enrollment")?;
        if self.is_enrolled(enrollment.user_id, enrollment.course_id)? {
            return Ok(false);
        }
        self.enrollments.push(enrollment.clone());
        Ok(true)
    }

    fn insert_referral_earning(&mut self, earning: &ReferralEarning) -> Result<bool, LedgerError> {
        if self
            .earnings
            .iter()
            .any(|e| e.order_id == earning.order_id && e.course_id == earning.course_id)
        {
            return Ok(false);
        }
        self.earnings.push(earning.clone());
        Ok(true)
    }

    fn earnings_for_referrer(&mut self, referrer_id: i64) -> Result<Vec<ReferralEarning>, LedgerError> {
        Ok(newest_first(
            self.earnings.iter().filter(|e| e.referrer_id == referrer_id).cloned(),
            |e| e.created_at,
        ))
    }

    fn insert_withdrawal(&mut self, withdrawal: &Withdrawal) -> Result<(), LedgerError> {
        self.withdrawals.push(withdrawal.clone());
        Ok(())
    }

    fn lock_withdrawal(&mut self, withdrawal_id: i64) -> Result<Option<Withdrawal>, LedgerError> {
        Ok(self.withdrawals.iter().find(|w| w.id == withdrawal_id).cloned())
    }

    fn resolve_withdrawal(
        &mut self,
        withdrawal_id: i64,
        status: WithdrawalStatus,
        admin_id: i64,
        processed_at: NaiveDateTime,
    ) -> Result<bool, LedgerError> {
        match self.withdrawals.iter_mut().find(|w| w.id == withdrawal_id) {
            Some(w) if w.status == WithdrawalStatus::Pending.as_str() => {
                w.status = status.as_str().to_string();
                w.processed_by = Some(admin_id);
                w.processed_at = Some(processed_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn withdrawals_for_user(&mut self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError> {
        Ok(newest_first(
            self.withdrawals.iter().filter(|w| w.user_id == user_id).cloned(),
            |w| w.created_at,
        ))
    }

    fn list_withdrawals(&mut self, status: Option<WithdrawalStatus>) -> Result<Vec<Withdrawal>, LedgerError> {
        Ok(newest_first(
            self.withdrawals
                .iter()
                .filter(|w| status.map_or(true, |s| w.status == s.as_str()))
                .cloned(),
            |w| w.created_at,
        ))
    }

    fn insert_notification(&mut self, notification: &Notification) -> Result<(), LedgerError> {
        self.check("insert_notification")?;
        self.notifications.push(notification.clone());
        Ok(())
    }
}
