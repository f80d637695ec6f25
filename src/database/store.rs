use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::PgConnection;
use tracing::warn;

use crate::database::models::{
    CartItem, Coupon, CouponUse, Course, Enrollment, Notification, Order, ReferralEarning, User, Withdrawal,
    WithdrawalStatus,
};
use crate::database::{mutations, queries};
use crate::error::LedgerError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GatewayPayment {
    pub payment_id: Option<String>,
    pub payment_mode: Option<String>,
}

/// Persistence primitives the ledger workflows are written against.
///
/// Mutations that guard an invariant are single conditional statements and
/// report whether they took effect.
pub trait LedgerStore {
    // all writes made by `f` land together or not at all
    fn atomically<T, F>(&mut self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Self) -> Result<T, LedgerError>;

    fn find_user(&mut self, user_id: i64) -> Result<Option<User>, LedgerError>;
    fn find_user_by_referral_code(&mut self, code: &str) -> Result<Option<User>, LedgerError>;
    fn find_users(&mut self, user_ids: &[i64]) -> Result<Vec<User>, LedgerError>;
    fn users_by_id(&mut self, user_ids: &[i64]) -> Result<HashMap<i64, User>, LedgerError> {
        Ok(self.find_users(user_ids)?.into_iter().map(|u| (u.id, u)).collect())
    }
    fn count_referred_users(&mut self, referrer_id: i64) -> Result<i64, LedgerError>;
    fn referred_users(&mut self, referrer_id: i64) -> Result<Vec<User>, LedgerError>;
    fn set_referrer_once(&mut self, user_id: i64, referrer_id: i64) -> Result<bool, LedgerError>;
    fn credit_commission(&mut self, user_id: i64, amount: &BigDecimal) -> Result<(), LedgerError>;
    // wallet_balance -> pending_earnings, false when the wallet does not cover it
    fn reserve_withdrawal_funds(&mut self, user_id: i64, amount: &BigDecimal) -> Result<bool, LedgerError>;
    fn release_pending_funds(
        &mut self,
        user_id: i64,
        amount: &BigDecimal,
        restore_wallet: bool,
    ) -> Result<(), LedgerError>;

    fn find_course(&mut self, course_id: i64) -> Result<Option<Course>, LedgerError>;
    fn find_courses(&mut self, course_ids: &[i64]) -> Result<Vec<Course>, LedgerError>;

    fn cart_items(&mut self, user_id: i64) -> Result<Vec<CartItem>, LedgerError>;
    fn insert_cart_item(&mut self, item: &CartItem) -> Result<bool, LedgerError>;
    fn remove_cart_item(&mut self, user_id: i64, item_id: i64) -> Result<bool, LedgerError>;
    fn clear_cart(&mut self, user_id: i64) -> Result<usize, LedgerError>;

    fn find_active_coupon(&mut self, code: &str) -> Result<Option<Coupon>, LedgerError>;
    // ignores is_active; the row stays locked until the unit of work ends
    fn lock_coupon(&mut self, code: &str) -> Result<Option<Coupon>, LedgerError>;
    fn count_coupon_uses(&mut self, coupon_id: i64) -> Result<i64, LedgerError>;
    fn insert_coupon_use(&mut self, coupon_use: &CouponUse) -> Result<bool, LedgerError>;

    fn insert_order(&mut self, order: &Order) -> Result<(), LedgerError>;
    fn lock_order_by_txn(&mut self, txn_id: &str) -> Result<Option<Order>, LedgerError>;
    // pending -> completed
    fn mark_order_completed(
        &mut self,
        order_id: i64,
        payment: &GatewayPayment,
        completed_at: NaiveDateTime,
    ) -> Result<bool, LedgerError>;
    fn mark_order_failed(&mut self, order_id: i64) -> Result<bool, LedgerError>;
    fn orders_for_user(&mut self, user_id: i64) -> Result<Vec<Order>, LedgerError>;

    fn is_enrolled(&mut self, user_id: i64, course_id: i64) -> Result<bool, LedgerError>;
    fn insert_enrollment(&mut self, enrollment: &Enrollment) -> Result<bool, LedgerError>;

    // false when the (order, course) pair already earned a commission
    fn insert_referral_earning(&mut self, earning: &ReferralEarning) -> Result<bool, LedgerError>;
    fn earnings_for_referrer(&mut self, referrer_id: i64) -> Result<Vec<ReferralEarning>, LedgerError>;

    fn insert_withdrawal(&mut self, withdrawal: &Withdrawal) -> Result<(), LedgerError>;
    fn lock_withdrawal(&mut self, withdrawal_id: i64) -> Result<Option<Withdrawal>, LedgerError>;
    fn resolve_withdrawal(
        &mut self,
        withdrawal_id: i64,
        status: WithdrawalStatus,
        admin_id: i64,
        processed_at: NaiveDateTime,
    ) -> Result<bool, LedgerError>;
    fn withdrawals_for_user(&mut self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError>;
    fn list_withdrawals(&mut self, status: Option<WithdrawalStatus>) -> Result<Vec<Withdrawal>, LedgerError>;

    fn insert_notification(&mut self, notification: &Notification) -> Result<(), LedgerError>;
}

pub struct PgLedger<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> PgLedger<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }
}

impl<'a> LedgerStore for PgLedger<'a> {
    fn atomically<T, F>(&mut self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Self) -> Result<T, LedgerError>,
    {
        <AnsiTransactionManager as TransactionManager<PgConnection>>::begin_transaction(&mut *self.conn)?;
        match f(self) {
            Ok(value) => {
                <AnsiTransactionManager as TransactionManager<PgConnection>>::commit_transaction(&mut *self.conn)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) =
                    <AnsiTransactionManager as TransactionManager<PgConnection>>::rollback_transaction(&mut *self.conn)
                {
                    warn!("rollback failed: {rollback_err}");
                }
                Err(e)
            }
        }
    }

    fn find_user(&mut self, user_id: i64) -> Result<Option<User>, LedgerError> {
        Ok(queries::find_user(self.conn, user_id)?)
    }

    fn find_user_by_referral_code(&mut self, code: &str) -> Result<Option<User>, LedgerError> {
        Ok(queries::find_user_by_referral_code(self.conn, code)?)
    }

    fn find_users(&mut self, user_ids: &[i64]) -> Result<Vec<User>, LedgerError> {
        Ok(queries::find_users(self.conn, user_ids)?)
    }

    fn count_referred_users(&mut self, referrer_id: i64) -> Result<i64, LedgerError> {
        Ok(queries::count_referred_users(self.conn, referrer_id)?)
    }

    fn referred_users(&mut self, referrer_id: i64) -> Result<Vec<User>, LedgerError> {
        Ok(queries::referred_users(self.conn, referrer_id)?)
    }

    fn set_referrer_once(&mut self, user_id: i64, referrer_id: i64) -> Result<bool, LedgerError> {
        Ok(mutations::set_referrer_once(self.conn, user_id, referrer_id)?)
    }

    fn credit_commission(&mut self, user_id: i64, amount: &BigDecimal) -> Result<(), LedgerError> {
        Ok(mutations::credit_commission(self.conn, user_id, amount)?)
    }

    fn reserve_withdrawal_funds(&mut self, user_id: i64, amount: &BigDecimal) -> Result<bool, LedgerError> {
        Ok(mutations::reserve_withdrawal_funds(self.conn, user_id, amount)?)
    }

    fn release_pending_funds(
        &mut self,
        user_id: i64,
        amount: &BigDecimal,
        restore_wallet: bool,
    ) -> Result<(), LedgerError> {
        Ok(mutations::release_pending_funds(self.conn, user_id, amount, restore_wallet)?)
    }

    fn find_course(&mut self, course_id: i64) -> Result<Option<Course>, LedgerError> {
        Ok(queries::find_course(self.conn, course_id)?)
    }

    fn find_courses(&mut self, course_ids: &[i64]) -> Result<Vec<Course>, LedgerError> {
        Ok(queries::find_courses(self.conn, course_ids)?)
    }

    fn cart_items(&mut self, user_id: i64) -> Result<Vec<CartItem>, LedgerError> {
        Ok(queries::cart_items(self.conn, user_id)?)
    }

    fn insert_cart_item(&mut self, item: &CartItem) -> Result<bool, LedgerError> {
        Ok(mutations::insert_cart_item(self.conn, item)?)
    }

    fn remove_cart_item(&mut self, user_id: i64, item_id: i64) -> Result<bool, LedgerError> {
        Ok(mutations::remove_cart_item(self.conn, user_id, item_id)?)
    }

    fn clear_cart(&mut self, user_id: i64) -> Result<usize, LedgerError> {
        Ok(mutations::clear_cart(self.conn, user_id)?)
    }

    fn find_active_coupon(&mut self, code: &str) -> Result<Option<Coupon>, LedgerError> {
        Ok(queries::find_active_coupon(self.conn, code)?)
    }

    fn lock_coupon(&mut self, code: &str) -> Result<Option<Coupon>, LedgerError> {
        Ok(queries::lock_coupon(self.conn, code)?)
    }

    fn count_coupon_uses(&mut self, coupon_id: i64) -> Result<i64, LedgerError> {
        Ok(queries::count_coupon_uses(self.conn, coupon_id)?)
    }

    fn insert_coupon_use(&mut self, coupon_use: &CouponUse) -> Result<bool, LedgerError> {
        Ok(mutations::insert_coupon_use(self.conn, coupon_use)?)
    }

    fn insert_order(&mut self, order: &Order) -> Result<(), LedgerError> {
        Ok(mutations::insert_order(self.conn, order)?)
    }

    fn lock_order_by_txn(&mut self, txn_id: &str) -> Result<Option<Order>, LedgerError> {
        Ok(queries::lock_order_by_txn(self.conn, txn_id)?)
    }

    fn mark_order_completed(
        &mut self,
        order_id: i64,
        payment: &GatewayPayment,
        completed_at: NaiveDateTime,
    ) -> Result<bool, LedgerError> {
        Ok(mutations::mark_order_completed(self.conn, order_id, payment, completed_at)?)
    }

    fn mark_order_failed(&mut self, order_id: i64) -> Result<bool, LedgerError> {
        Ok(mutations::mark_order_failed(self.conn, order_id)?)
    }

    fn orders_for_user(&mut self, user_id: i64) -> Result<Vec<Order>, LedgerError> {
        Ok(queries::orders_for_user(self.conn, user_id)?)
    }

    fn is_enrolled(&mut self, user_id: i64, course_id: i64) -> Result<bool, LedgerError> {
        Ok(queries::is_enrolled(self.conn, user_id, course_id)?)
    }

    fn insert_enrollment(&mut self, enrollment: &Enrollment) -> Result<bool, LedgerError> {
        Ok(mutations::insert_enrollment(self.conn, enrollment)?)
    }

    fn insert_referral_earning(&mut self, earning: &ReferralEarning) -> Result<bool, LedgerError> {
        Ok(mutations::insert_referral_earning(self.conn, earning)?)
    }

    fn earnings_for_referrer(&mut self, referrer_id: i64) -> Result<Vec<ReferralEarning>, LedgerError> {
        Ok(queries::earnings_for_referrer(self.conn, referrer_id)?)
    }

    fn insert_withdrawal(&mut self, withdrawal: &Withdrawal) -> Result<(), LedgerError> {
        Ok(mutations::insert_withdrawal(self.conn, withdrawal)?)
    }

    fn lock_withdrawal(&mut self, withdrawal_id: i64) -> Result<Option<Withdrawal>, LedgerError> {
        Ok(queries::lock_withdrawal(self.conn, withdrawal_id)?)
    }

    fn resolve_withdrawal(
        &mut self,
        withdrawal_id: i64,
        status: WithdrawalStatus,
        admin_id: i64,
        processed_at: NaiveDateTime,
    ) -> Result<bool, LedgerError> {
        Ok(mutations::resolve_withdrawal(
            self.conn,
            withdrawal_id,
            status,
            admin_id,
            processed_at,
        )?)
    }

    fn withdrawals_for_user(&mut self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError> {
        Ok(queries::withdrawals_for_user(self.conn, user_id)?)
    }

    fn list_withdrawals(&mut self, status: Option<WithdrawalStatus>) -> Result<Vec<Withdrawal>, LedgerError> {
        Ok(queries::list_withdrawals(self.conn, status)?)
    }

    fn insert_notification(&mut self, notification: &Notification) -> Result<(), LedgerError> {
        Ok(mutations::insert_notification(self.conn, notification)?)
    }
}
