use crate::database::models;
use crate::database::models::WithdrawalStatus;
use diesel::{result::Error, ExpressionMethods, OptionalExtension, PgConnection, QueryDsl, RunQueryDsl};

pub fn find_user(conn: &mut PgConnection, req_user_id: i64) -> Result<Option<models::User>, Error> {
    use crate::schema::users::dsl::*;
    users.filter(id.eq(req_user_id)).first::<models::User>(conn).optional()
}

pub fn find_user_by_referral_code(conn: &mut PgConnection, req_code: &str) -> Result<Option<models::User>, Error> {
    use crate::schema::users::dsl::*;
    users
        .filter(referral_code.eq(req_code))
        .first::<models::User>(conn)
        .optional()
}

pub fn count_referred_users(conn: &mut PgConnection, req_referrer_id: i64) -> Result<i64, Error> {
    use crate::schema::users::dsl::*;
    users.filter(referred_by.eq(req_referrer_id)).count().get_result(conn)
}

pub fn find_users(conn: &mut PgConnection, req_user_ids: &[i64]) -> Result<Vec<models::User>, Error> {
    use crate::schema::users::dsl::*;
    users.filter(id.eq_any(req_user_ids)).load::<models::User>(conn)
}

pub fn referred_users(conn: &mut PgConnection, req_referrer_id: i64) -> Result<Vec<models::User>, Error> {
    use crate::schema::users::dsl::*;
    users
        .filter(referred_by.eq(req_referrer_id))
        .order(created_at.desc())
        .limit(100)
        .load::<models::User>(conn)
}

pub fn find_course(conn: &mut PgConnection, req_course_id: i64) -> Result<Option<models::Course>, Error> {
    use crate::schema::courses::dsl::*;
    courses.filter(id.eq(req_course_id)).first::<models::Course>(conn).optional()
}

pub fn find_courses(conn: &mut PgConnection, req_course_ids: &[i64]) -> Result<Vec<models::Course>, Error> {
    use crate::schema::courses::dsl::*;
    courses
        .filter(id.eq_any(req_course_ids))
        .order(id.asc())
        .load::<models::Course>(conn)
}

pub fn cart_items(conn: &mut PgConnection, req_user_id: i64) -> Result<Vec<models::CartItem>, Error> {
    use crate::schema::cart_items::dsl::*;
    cart_items
        .filter(user_id.eq(req_user_id))
        .order(created_at.asc())
        .load::<models::CartItem>(conn)
}

pub fn find_active_coupon(conn: &mut PgConnection, req_code: &str) -> Result<Option<models::Coupon>, Error> {
    use crate::schema::coupons::dsl::*;
    coupons
        .filter(code.eq(req_code))
        .filter(is_active.eq(true))
        .first::<models::Coupon>(conn)
        .optional()
}

// coupon row lock serializes concurrent redemptions of the same code
pub fn lock_coupon(conn: &mut PgConnection, req_code: &str) -> Result<Option<models::Coupon>, Error> {
    use crate::schema::coupons::dsl::*;
    coupons
        .filter(code.eq(req_code))
        .for_update()
        .first::<models::Coupon>(conn)
        .optional()
}

pub fn count_coupon_uses(conn: &mut PgConnection, req_coupon_id: i64) -> Result<i64, Error> {
    use crate::schema::coupon_uses::dsl::*;
    coupon_uses.filter(coupon_id.eq(req_coupon_id)).count().get_result(conn)
}

// order row lock serializes duplicate gateway callbacks for one transaction
pub fn lock_order_by_txn(conn: &mut PgConnection, req_txn_id: &str) -> Result<Option<models::Order>, Error> {
    use crate::schema::orders::dsl::*;
    orders
        .filter(txn_id.eq(req_txn_id))
        .for_update()
        .first::<models::Order>(conn)
        .optional()
}

pub fn orders_for_user(conn: &mut PgConnection, req_user_id: i64) -> Result<Vec<models::Order>, Error> {
    use crate::schema::orders::dsl::*;
    orders
        .filter(user_id.eq(req_user_id))
        .order(created_at.desc())
        .limit(100)
        .load::<models::Order>(conn)
}

pub fn is_enrolled(conn: &mut PgConnection, req_user_id: i64, req_course_id: i64) -> Result<bool, Error> {
    use crate::schema::enrollments::dsl::*;
    diesel::select(diesel::dsl::exists(
        enrollments
            .filter(user_id.eq(req_user_id))
            .filter(course_id.eq(req_course_id)),
    ))
    .get_result(conn)
}

pub fn earnings_for_referrer(
    conn: &mut PgConnection,
    req_referrer_id: i64,
) -> Result<Vec<models::ReferralEarning>, Error> {
    use crate::schema::referral_earnings::dsl::*;
    referral_earnings
        .filter(referrer_id.eq(req_referrer_id))
        .order(created_at.desc())
        .limit(1000)
        .load::<models::ReferralEarning>(conn)
}

pub fn lock_withdrawal(conn: &mut PgConnection, req_withdrawal_id: i64) -> Result<Option<models::Withdrawal>, Error> {
    use crate::schema::withdrawals::dsl::*;
    withdrawals
        .filter(id.eq(req_withdrawal_id))
        .for_update()
        .first::<models::Withdrawal>(conn)
        .optional()
}

pub fn withdrawals_for_user(conn: &mut PgConnection, req_user_id: i64) -> Result<Vec<models::Withdrawal>, Error> {
    use crate::schema::withdrawals::dsl::*;
    withdrawals
        .filter(user_id.eq(req_user_id))
        .order(created_at.desc())
        .limit(100)
        .load::<models::Withdrawal>(conn)
}

pub fn list_withdrawals(
    conn: &mut PgConnection,
    req_status: Option<WithdrawalStatus>,
) -> Result<Vec<models::Withdrawal>, Error> {
    use crate::schema::withdrawals::dsl::*;
    let mut query = withdrawals.into_boxed();
    if let Some(req_status) = req_status {
        query = query.filter(status.eq(req_status.as_str()));
    }
    query
        .order(created_at.desc())
        .limit(100)
        .load::<models::Withdrawal>(conn)
}
