use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{NaiveDate, NaiveDateTime};

use crate::database::idgen;
use crate::database::models::{Coupon, Course, Order, OrderStatus, User};

pub fn money(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).unwrap()
}

pub fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

pub fn user(email: &str, referral_code: &str, referred_by: Option<i64>) -> User {
    User {
        id: idgen::next(),
        email: email.to_string(),
        first_name: email.split('@').next().unwrap_or("user").to_string(),
        last_name: "Tester".to_string(),
        referral_code: referral_code.to_string(),
        referred_by,
        wallet_balance: BigDecimal::zero(),
        total_earnings: BigDecimal::zero(),
        pending_earnings: BigDecimal::zero(),
        created_at: at(2026, 1, 1),
    }
}

pub fn course(title: &str, price: &str, discount_price: Option<&str>) -> Course {
    Course {
        id: idgen::next(),
        title: title.to_string(),
        price: money(price),
        discount_price: discount_price.map(money),
        is_published: true,
    }
}

pub fn percentage_coupon(code: &str, percent: i64, max_uses: Option<i32>) -> Coupon {
    Coupon {
        id: idgen::next(),
        code: code.to_string(),
        discount_type: "percentage".to_string(),
        discount_value: BigDecimal::from(percent),
        max_uses,
        valid_until: None,
        is_active: true,
        created_at: at(2026, 1, 1),
    }
}

pub fn fixed_coupon(code: &str, value: &str, max_uses: Option<i32>) -> Coupon {
    Coupon {
        discount_type: "fixed".to_string(),
        discount_value: money(value),
        ..percentage_coupon(code, 0, max_uses)
    }
}

pub fn pending_order(user_id: i64, course_ids: Vec<i64>, txn_id: &str) -> Order {
    Order {
        id: idgen::next(),
        txn_id: txn_id.to_string(),
        user_id,
        course_ids,
        subtotal: BigDecimal::zero(),
        discount: BigDecimal::zero(),
        coupon_code: None,
        total: BigDecimal::zero(),
        status: OrderStatus::Pending.as_str().to_string(),
        product_info: "Courses: ".to_string(),
        first_name: "buyer".to_string(),
        email: "buyer@example.com".to_string(),
        payment_method: "payu".to_string(),
        payment_id: None,
        payment_mode: None,
        created_at: at(2026, 2, 1),
        completed_at: None,
    }
}
