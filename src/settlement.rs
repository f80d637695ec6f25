//! Order settlement: everything that happens when the payment gateway reports
//! the outcome of a checkout.
//!
//! Steps 1-5 (order transition, enrollments, cart, referral commissions,
//! coupon use) run inside a single store transaction guarded by a row lock on
//! the order, so a duplicated or concurrent callback observes the completed
//! order and changes nothing. The buyer notification and confirmation email
//! happen after commit and can only be logged on failure.

use std::str::FromStr;

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::commission::{commission, commission_rate, display_amount, effective_price};
use crate::config::Settings;
use crate::database::idgen;
use crate::database::models::{
    CouponUse, Enrollment, Notification, Order, OrderStatus, ReferralEarning, User, AUDIENCE_USER, EARNING_AVAILABLE,
};
use crate::database::store::{GatewayPayment, LedgerStore};
use crate::error::LedgerError;
use crate::mailer::{templates, EmailMessage};
use crate::payu;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStatus {
    Success,
    Failure,
}

impl FromStr for CallbackStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(CallbackStatus::Success),
            "failure" | "failed" => Ok(CallbackStatus::Failure),
            _ => Err(LedgerError::validation("status")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentCallback {
    pub txn_id: String,
    pub status: CallbackStatus,
    // as sent by the gateway, the callback hash covers this text
    pub raw_status: String,
    pub payment: GatewayPayment,
    pub hash: Option<String>,
}

impl PaymentCallback {
    pub fn parse(
        txn_id: &str,
        status: &str,
        hash: Option<&str>,
        payment_id: Option<&str>,
        payment_mode: Option<&str>,
    ) -> Result<Self, LedgerError> {
        let non_empty = |v: Option<&str>| v.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string);

        let txn_id = txn_id.trim();
        if txn_id.is_empty() {
            return Err(LedgerError::validation("transaction_id"));
        }
        Ok(PaymentCallback {
            txn_id: txn_id.to_string(),
            status: status.parse()?,
            raw_status: status.trim().to_string(),
            payment: GatewayPayment {
                payment_id: non_empty(payment_id),
                payment_mode: non_empty(payment_mode),
            },
            hash: non_empty(hash),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Completed {
        order: Order,
        enrollments_created: usize,
        commissions: Vec<ReferralEarning>,
        coupon_recorded: bool,
        confirmation: EmailMessage,
    },
    // an earlier callback completed the order
    AlreadyCompleted { order: Order },
    Failed { order: Order },
}

impl Settlement {
    pub fn order(&self) -> &Order {
        match self {
            Settlement::Completed { order, .. }
            | Settlement::AlreadyCompleted { order }
            | Settlement::Failed { order } => order,
        }
    }
}

// checked against the buyer details the request was signed with, not the current profile
fn verify_callback_hash(settings: &Settings, callback: &PaymentCallback, order: &Order) -> Result<(), LedgerError> {
    if settings.payu.merchant_salt.is_empty() {
        return Ok(());
    }
    let received = callback.hash.as_deref().ok_or(LedgerError::validation("hash"))?;
    let amount = display_amount(&order.total);
    let fields = payu::HashFields {
        txn_id: &order.txn_id,
        amount: &amount,
        product_info: &order.product_info,
        first_name: &order.first_name,
        email: &order.email,
    };
    if !payu::verify_response(&settings.payu, &callback.raw_status, &fields, received) {
        warn!(txn_id = %order.txn_id, "payment callback hash mismatch");
        return Err(LedgerError::validation("hash"));
    }
    Ok(())
}

/// Applies one gateway callback. Safe to call any number of times for the same transaction.
pub fn settle<S: LedgerStore>(
    store: &mut S,
    settings: &Settings,
    callback: &PaymentCallback,
    now: NaiveDateTime,
) -> Result<Settlement, LedgerError> {
    let settlement = store.atomically(|store| {
        let mut order = store
            .lock_order_by_txn(&callback.txn_id)?
            .ok_or(LedgerError::not_found("order"))?;
        let buyer = store
            .find_user(order.user_id)?
            .ok_or(LedgerError::not_found("user"))?;
        verify_callback_hash(settings, callback, &order)?;

        match (order.status()?, callback.status) {
            (OrderStatus::Completed, _) => {
                info!(order_id = order.id, txn_id = %order.txn_id, "order already settled");
                Ok(Settlement::AlreadyCompleted { order })
            }
            (OrderStatus::Failed, CallbackStatus::Failure) => Ok(Settlement::Failed { order }),
            (OrderStatus::Failed, CallbackStatus::Success) => {
                Err(LedgerError::conflict("order already marked failed"))
            }
            (OrderStatus::Pending, CallbackStatus::Failure) => {
                store.mark_order_failed(order.id)?;
                order.status = OrderStatus::Failed.as_str().to_string();
                info!(order_id = order.id, txn_id = %order.txn_id, "payment failed");
                Ok(Settlement::Failed { order })
            }
            (OrderStatus::Pending, CallbackStatus::Success) => complete(store, settings, order, &buyer, callback, now),
        }
    })?;

    if let Settlement::Completed { order, .. } = &settlement {
        let notification = Notification {
            id: idgen::next(),
            user_id: Some(order.user_id),
            audience: AUDIENCE_USER.to_string(),
            kind: "order_completed".to_string(),
            title: "Order Confirmed".to_string(),
            message: format!(
                "Your payment of ${} for order {} was received.",
                display_amount(&order.total),
                order.txn_id
            ),
            data: Some(serde_json::json!({ "order_id": order.id, "txn_id": order.txn_id })),
            is_read: false,
            created_at: now,
        };
        if let Err(e) = store.insert_notification(&notification) {
            warn!(order_id = order.id, "failed to record order notification: {e}");
        }
    }
    Ok(settlement)
}

fn complete<S: LedgerStore>(
    store: &mut S,
    settings: &Settings,
    mut order: Order,
    buyer: &User,
    callback: &PaymentCallback,
    now: NaiveDateTime,
) -> Result<Settlement, LedgerError> {
    // 1. order transition
    if !store.mark_order_completed(order.id, &callback.payment, now)? {
        return Err(LedgerError::conflict("order is no longer pending"));
    }
    order.status = OrderStatus::Completed.as_str().to_string();
    order.payment_id = callback.payment.payment_id.clone();
    order.payment_mode = callback.payment.payment_mode.clone();
    order.completed_at = Some(now);

    // 2. enrollments
    let mut enrollments_created = 0;
    for &course_id in &order.course_ids {
        let enrollment = Enrollment {
            id: idgen::next(),
            user_id: order.user_id,
            course_id,
            order_id: order.id,
            progress_percentage: 0,
            completed_lesson_ids: Vec::new(),
            is_completed: false,
            enrolled_at: now,
            completed_at: None,
        };
        if store.insert_enrollment(&enrollment)? {
            enrollments_created += 1;
        } else {
            warn!(user_id = order.user_id, course_id, "already enrolled, skipping");
        }
    }

    // 3. cart is fully consumed by checkout
    store.clear_cart(order.user_id)?;

    let courses = store.find_courses(&order.course_ids)?;

    // 4. referral commissions, one per course
    let mut commissions = Vec::new();
    if let Some(referrer_id) = buyer.referred_by {
        match store.find_user(referrer_id)? {
            Some(referrer) if referrer.id != buyer.id => {
                let rate = commission_rate();
                for course_id in &order.course_ids {
                    let Some(course) = courses.iter().find(|c| c.id == *course_id) else {
                        warn!(course_id, "course missing, no commission posted");
                        continue;
                    };
                    let course_price = effective_price(course);
                    let commission_amount = commission(&course_price, &rate)?;
                    let earning = ReferralEarning {
                        id: idgen::next(),
                        referrer_id: referrer.id,
                        buyer_id: buyer.id,
                        course_id: course.id,
                        course_title: course.title.clone(),
                        course_price,
                        commission_amount,
                        order_id: order.id,
                        status: EARNING_AVAILABLE.to_string(),
                        created_at: now,
                    };
                    if store.insert_referral_earning(&earning)? {
                        store.credit_commission(referrer.id, &earning.commission_amount)?;
                        info!(
                            referrer_id = referrer.id,
                            course_id = course.id,
                            commission = %display_amount(&earning.commission_amount),
                            "referral commission posted"
                        );
                        commissions.push(earning);
                    }
                }
            }
            Some(_) => warn!(user_id = buyer.id, "self-referral ignored"),
            None => warn!(user_id = buyer.id, referrer_id, "referrer no longer exists"),
        }
    }

    // 5. coupon use, guarded by a lock on the coupon row
    let mut coupon_recorded = false;
    if let Some(code) = order.coupon_code.as_deref() {
        match store.lock_coupon(code)? {
            Some(coupon) => {
                let uses = store.count_coupon_uses(coupon.id)?;
                if coupon.max_uses.map_or(false, |max_uses| uses >= i64::from(max_uses)) {
                    warn!(
                        coupon_id = coupon.id,
                        order_id = order.id,
                        "coupon limit reached by concurrent checkouts, use not recorded"
                    );
                } else {
                    coupon_recorded = store.insert_coupon_use(&CouponUse {
                        id: idgen::next(),
                        coupon_id: coupon.id,
                        user_id: order.user_id,
                        order_id: order.id,
                        used_at: now,
                    })?;
                }
            }
            None => warn!(code, "coupon no longer exists, use not recorded"),
        }
    }

    info!(
        order_id = order.id,
        txn_id = %order.txn_id,
        enrollments_created,
        commissions = commissions.len(),
        coupon_recorded,
        "order settled"
    );

    // 6. confirmation is sent by the caller once this transaction has committed
    let confirmation = templates::order_confirmation(buyer, &order, &courses, &settings.public_base_url);
    Ok(Settlement::Completed {
        order,
        enrollments_created,
        commissions,
        coupon_recorded,
        confirmation,
    })
}
