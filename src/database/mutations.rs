use crate::database::models;
use crate::database::models::{OrderStatus, WithdrawalStatus};
use crate::database::store::GatewayPayment;
use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use diesel::result::Error;
use diesel::{ExpressionMethods, PgConnection, QueryDsl, RunQueryDsl};

// one-time write: only lands while referred_by is still null
pub fn set_referrer_once(conn: &mut PgConnection, req_user_id: i64, req_referrer_id: i64) -> Result<bool, Error> {
    use crate::schema::users::dsl::*;
    diesel::update(users.filter(id.eq(req_user_id)).filter(referred_by.is_null()))
        .set(referred_by.eq(req_referrer_id))
        .execute(conn)
        .map(|res| res > 0)
}

// atomic increment, no read of the current balance
pub fn credit_commission(conn: &mut PgConnection, req_user_id: i64, amount: &BigDecimal) -> Result<(), Error> {
    use crate::schema::users::dsl::*;
    diesel::update(users.filter(id.eq(req_user_id)))
        .set((
            wallet_balance.eq(wallet_balance + amount.clone()),
            total_earnings.eq(total_earnings + amount.clone()),
        ))
        .execute(conn)
        .map(|_| ())
}

// conditional decrement: affects no rows when the wallet cannot cover the amount
pub fn reserve_withdrawal_funds(conn: &mut PgConnection, req_user_id: i64, amount: &BigDecimal) -> Result<bool, Error> {
    use crate::schema::users::dsl::*;
    diesel::update(
        users
            .filter(id.eq(req_user_id))
            .filter(wallet_balance.ge(amount.clone())),
    )
    .set((
        wallet_balance.eq(wallet_balance - amount.clone()),
        pending_earnings.eq(pending_earnings + amount.clone()),
    ))
    .execute(conn)
    .map(|res| res > 0)
}

pub fn release_pending_funds(
    conn: &mut PgConnection,
    req_user_id: i64,
    amount: &BigDecimal,
    restore_wallet: bool,
) -> Result<(), Error> {
    use crate::schema::users::dsl::*;
    let target = users.filter(id.eq(req_user_id));
    if restore_wallet {
        diesel::update(target)
            .set((
                wallet_balance.eq(wallet_balance + amount.clone()),
                pending_earnings.eq(pending_earnings - amount.clone()),
            ))
            .execute(conn)?;
    } else {
        diesel::update(target)
            .set(pending_earnings.eq(pending_earnings - amount.clone()))
            .execute(conn)?;
    }
    Ok(())
}

pub fn insert_cart_item(conn: &mut PgConnection, item: &models::CartItem) -> Result<bool, Error> {
    use crate::schema::cart_items::dsl::*;
    diesel::insert_into(cart_items)
        .values(item)
        .on_conflict((user_id, course_id))
        .do_nothing()
        .execute(conn)
        .map(|res| res > 0)
}

pub fn remove_cart_item(conn: &mut PgConnection, req_user_id: i64, req_item_id: i64) -> Result<bool, Error> {
    use crate::schema::cart_items::dsl::*;
    diesel::delete(cart_items.filter(id.eq(req_item_id)).filter(user_id.eq(req_user_id)))
        .execute(conn)
        .map(|res| res > 0)
}

pub fn clear_cart(conn: &mut PgConnection, req_user_id: i64) -> Result<usize, Error> {
    use crate::schema::cart_items::dsl::*;
    diesel::delete(cart_items.filter(user_id.eq(req_user_id))).execute(conn)
}

pub fn insert_coupon_use(conn: &mut PgConnection, coupon_use: &models::CouponUse) -> Result<bool, Error> {
    use crate::schema::coupon_uses::dsl::*;
    diesel::insert_into(coupon_uses)
        .values(coupon_use)
        .on_conflict((coupon_id, order_id))
        .do_nothing()
        .execute(conn)
        .map(|res| res > 0)
}

pub fn insert_order(conn: &mut PgConnection, order: &models::Order) -> Result<(), Error> {
    use crate::schema::orders::dsl::*;
    diesel::insert_into(orders).values(order).execute(conn).map(|_| ())
}

// pending -> completed, at most once
pub fn mark_order_completed(
    conn: &mut PgConnection,
    req_order_id: i64,
    payment: &GatewayPayment,
    req_completed_at: NaiveDateTime,
) -> Result<bool, Error> {
    use crate::schema::orders::dsl::*;
    diesel::update(
        orders
            .filter(id.eq(req_order_id))
            .filter(status.eq(OrderStatus::Pending.as_str())),
    )
    .set((
        status.eq(OrderStatus::Completed.as_str()),
        payment_id.eq(payment.payment_id.as_deref()),
        payment_mode.eq(payment.payment_mode.as_deref()),
        completed_at.eq(Some(req_completed_at)),
    ))
    .execute(conn)
    .map(|res| res > 0)
}

// pending -> failed, at most once
pub fn mark_order_failed(conn: &mut PgConnection, req_order_id: i64) -> Result<bool, Error> {
    use crate::schema::orders::dsl::*;
    diesel::update(
        orders
            .filter(id.eq(req_order_id))
            .filter(status.eq(OrderStatus::Pending.as_str())),
    )
    .set(status.eq(OrderStatus::Failed.as_str()))
    .execute(conn)
    .map(|res| res > 0)
}

pub fn insert_enrollment(conn: &mut PgConnection, enrollment: &models::Enrollment) -> Result<bool, Error> {
    use crate::schema::enrollments::dsl::*;
    diesel::insert_into(enrollments)
        .values(enrollment)
        .on_conflict((user_id, course_id))
        .do_nothing()
        .execute(conn)
        .map(|res| res > 0)
}

pub fn insert_referral_earning(conn: &mut PgConnection, earning: &models::ReferralEarning) -> Result<bool, Error> {
    use crate::schema::referral_earnings::dsl::*;
    diesel::insert_into(referral_earnings)
        .values(earning)
        .on_conflict((order_id, course_id))
        .do_nothing()
        .execute(conn)
        .map(|res| res > 0)
}

pub fn insert_withdrawal(conn: &mut PgConnection, withdrawal: &models::Withdrawal) -> Result<(), Error> {
    use crate::schema::withdrawals::dsl::*;
    diesel::insert_into(withdrawals)
        .values(withdrawal)
        .execute(conn)
        .map(|_| ())
}

// pending -> approved | rejected, at most once
pub fn resolve_withdrawal(
    conn: &mut PgConnection,
    req_withdrawal_id: i64,
    req_status: WithdrawalStatus,
    admin_id: i64,
    req_processed_at: NaiveDateTime,
) -> Result<bool, Error> {
    use crate::schema::withdrawals::dsl::*;
    diesel::update(
        withdrawals
            .filter(id.eq(req_withdrawal_id))
            .filter(status.eq(WithdrawalStatus::Pending.as_str())),
    )
    .set((
        status.eq(req_status.as_str()),
        processed_by.eq(Some(admin_id)),
        processed_at.eq(Some(req_processed_at)),
    ))
    .execute(conn)
    .map(|res| res > 0)
}

pub fn insert_notification(conn: &mut PgConnection, notification: &models::Notification) -> Result<(), Error> {
    use crate::schema::notifications::dsl::*;
    diesel::insert_into(notifications)
        .values(notification)
        .execute(conn)
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;
    use crate::database::{fixtures, queries};
    use bigdecimal::BigDecimal;
    use diesel::result::Error;
    use diesel::Connection;
    use std::str::FromStr;

    #[test]
    #[ignore = "requires a PostgreSQL database at DATABASE_URL"]
    fn test_reserve_withdrawal_funds() {
        dotenvy::dotenv().ok();

        let pool = database::connect::create_db_connection_pool(&std::env::var("DATABASE_URL").unwrap()).unwrap();
        database::connect::run_migrations(&pool).unwrap();

        pool.get().unwrap().test_transaction::<_, Error, _>(|conn| {
            let user = fixtures::user("wallet@example.com", "WALLTEST", None);
            diesel::insert_into(crate::schema::users::table)
                .values(&user)
                .execute(conn)?;

            credit_commission(conn, user.id, &BigDecimal::from_str("25.50").unwrap())?;
            assert!(!reserve_withdrawal_funds(conn, user.id, &BigDecimal::from(30))?);
            assert!(reserve_withdrawal_funds(conn, user.id, &BigDecimal::from(20))?);

            let after = queries::find_user(conn, user.id)?.unwrap();
            assert_eq!(after.wallet_balance, BigDecimal::from_str("5.50").unwrap());
            assert_eq!(after.pending_earnings, BigDecimal::from(20));
            assert_eq!(after.total_earnings, BigDecimal::from_str("25.50").unwrap());

            release_pending_funds(conn, user.id, &BigDecimal::from(20), true)?;
            let restored = queries::find_user(conn, user.id)?.unwrap();
            assert_eq!(restored.wallet_balance, BigDecimal::from_str("25.50").unwrap());
            assert_eq!(restored.pending_earnings, BigDecimal::from(0));
            Ok(())
        });
    }

    #[test]
    #[ignore = "requires a PostgreSQL database at DATABASE_URL"]
    fn test_order_transitions_once() {
        dotenvy::dotenv().ok();

        let pool = database::connect::create_db_connection_pool(&std::env::var("DATABASE_URL").unwrap()).unwrap();
        database::connect::run_migrations(&pool).unwrap();

        pool.get().unwrap().test_transaction::<_, Error, _>(|conn| {
            let user = fixtures::user("transition@example.com", "TRANTEST", None);
            diesel::insert_into(crate::schema::users::table)
                .values(&user)
                .execute(conn)?;
            let order = fixtures::pending_order(user.id, vec![], "TXNTRANSITION");
            insert_order(conn, &order)?;

            let now = chrono::Utc::now().naive_utc();
            let payment = GatewayPayment {
                payment_id: Some("403993715".to_string()),
                payment_mode: Some("CC".to_string()),
            };
            assert!(mark_order_completed(conn, order.id, &payment, now)?);
            assert!(!mark_order_completed(conn, order.id, &payment, now)?);
            assert!(!mark_order_failed(conn, order.id)?);

            let stored = queries::lock_order_by_txn(conn, "TXNTRANSITION")?.unwrap();
            assert_eq!(stored.status, "completed");
            assert_eq!(stored.payment_id.as_deref(), Some("403993715"));
            Ok(())
        });
    }
}
