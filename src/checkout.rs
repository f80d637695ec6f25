use bigdecimal::{BigDecimal, Signed, Zero};
use chrono::NaiveDateTime;
use tracing::info;

use crate::commission::{display_amount, effective_price};
use crate::config::PayuConfig;
use crate::database::idgen;
use crate::database::models::{CartItem, Coupon, Course, DiscountType, Order, OrderStatus};
use crate::database::store::LedgerStore;
use crate::error::LedgerError;
use crate::payu;

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub subtotal: BigDecimal,
    pub discount: BigDecimal,
    pub total: BigDecimal,
}

impl Quote {
    fn undiscounted(subtotal: BigDecimal) -> Self {
        Quote {
            total: subtotal.clone(),
            subtotal,
            discount: BigDecimal::zero(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub item: CartItem,
    pub course: Course,
    pub price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    pub lines: Vec<CartLine>,
    pub total: BigDecimal,
}

/// Everything the buyer's browser needs to post the payment form.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSession {
    pub order: Order,
    pub amount: String,
    pub merchant_key: String,
    pub hash: String,
    pub first_name: String,
    pub email: String,
    pub payment_url: &'static str,
}

// validity check performed before a coupon is priced into an order
pub fn apply_coupon(
    coupon: &Coupon,
    uses: i64,
    subtotal: &BigDecimal,
    now: NaiveDateTime,
) -> Result<Quote, LedgerError> {
    if coupon.valid_until.map_or(false, |valid_until| now > valid_until) {
        return Err(LedgerError::Expired {
            code: coupon.code.clone(),
        });
    }
    if coupon.max_uses.map_or(false, |max_uses| uses >= i64::from(max_uses)) {
        return Err(LedgerError::LimitReached {
            code: coupon.code.clone(),
        });
    }

    let discount = match coupon.discount_type.parse::<DiscountType>()? {
        DiscountType::Percentage => subtotal * &coupon.discount_value / BigDecimal::from(100),
        DiscountType::Fixed => coupon.discount_value.clone(),
    };
    // total paid never drops below zero
    let discount = if discount.is_negative() {
        BigDecimal::zero()
    } else if discount > *subtotal {
        subtotal.clone()
    } else {
        discount
    };

    Ok(Quote {
        total: subtotal - &discount,
        subtotal: subtotal.clone(),
        discount,
    })
}

pub fn add_to_cart<S: LedgerStore>(
    store: &mut S,
    user_id: i64,
    course_id: i64,
    now: NaiveDateTime,
) -> Result<CartItem, LedgerError> {
    store.atomically(|store| {
        store.find_user(user_id)?.ok_or(LedgerError::not_found("user"))?;
        store.find_course(course_id)?.ok_or(LedgerError::not_found("course"))?;
        if store.is_enrolled(user_id, course_id)? {
            return Err(LedgerError::conflict("already enrolled in this course"));
        }
        let item = CartItem {
            id: idgen::next(),
            user_id,
            course_id,
            created_at: now,
        };
        if !store.insert_cart_item(&item)? {
            return Err(LedgerError::conflict("course already in cart"));
        }
        Ok(item)
    })
}

// items whose course has been deleted are left out of the listing and the total
pub fn cart<S: LedgerStore>(store: &mut S, user_id: i64) -> Result<Cart, LedgerError> {
    store.find_user(user_id)?.ok_or(LedgerError::not_found("user"))?;
    let items = store.cart_items(user_id)?;
    let course_ids: Vec<i64> = items.iter().map(|item| item.course_id).collect();
    let courses = store.find_courses(&course_ids)?;

    let lines: Vec<CartLine> = items
        .into_iter()
        .filter_map(|item| {
            let course = courses.iter().find(|c| c.id == item.course_id)?.clone();
            Some(CartLine {
                price: effective_price(&course),
                item,
                course,
            })
        })
        .collect();
    let total = lines.iter().fold(BigDecimal::zero(), |acc, line| acc + &line.price);
    Ok(Cart { lines, total })
}

pub fn remove_from_cart<S: LedgerStore>(store: &mut S, user_id: i64, item_id: i64) -> Result<(), LedgerError> {
    if store.remove_cart_item(user_id, item_id)? {
        Ok(())
    } else {
        Err(LedgerError::not_found("cart item"))
    }
}

/// Turns the buyer's cart into a pending order and signs the gateway request for it.
pub fn initiate<S: LedgerStore>(
    store: &mut S,
    payu_config: &PayuConfig,
    user_id: i64,
    coupon_code: Option<&str>,
    now: NaiveDateTime,
) -> Result<CheckoutSession, LedgerError> {
    let session = store.atomically(|store| {
        let buyer = store.find_user(user_id)?.ok_or(LedgerError::not_found("user"))?;
        let cart = store.cart_items(user_id)?;
        if cart.is_empty() {
            return Err(LedgerError::validation("cart"));
        }

        let cart_course_ids: Vec<i64> = cart.iter().map(|item| item.course_id).collect();
        let courses = store.find_courses(&cart_course_ids)?;
        if courses.is_empty() {
            return Err(LedgerError::validation("cart"));
        }
        let subtotal = courses
            .iter()
            .fold(BigDecimal::zero(), |acc, course| acc + effective_price(course));

        let quote = match coupon_code {
            Some(code) => {
                let coupon = store
                    .find_active_coupon(code)?
                    .ok_or(LedgerError::not_found("coupon"))?;
                let uses = store.count_coupon_uses(coupon.id)?;
                apply_coupon(&coupon, uses, &subtotal, now)?
            }
            None => Quote::undiscounted(subtotal),
        };

        let titles: Vec<&str> = courses.iter().map(|course| course.title.as_str()).collect();
        let order = Order {
            id: idgen::next(),
            txn_id: idgen::next_transaction_id(now),
            user_id,
            course_ids: courses.iter().map(|course| course.id).collect(),
            subtotal: quote.subtotal,
            discount: quote.discount,
            coupon_code: coupon_code.map(str::to_string),
            total: quote.total,
            status: OrderStatus::Pending.as_str().to_string(),
            product_info: format!("Courses: {}", titles.join(", ")),
            first_name: buyer.first_name,
            email: buyer.email,
            payment_method: "payu".to_string(),
            payment_id: None,
            payment_mode: None,
            created_at: now,
            completed_at: None,
        };
        store.insert_order(&order)?;

        let amount = display_amount(&order.total);
        let hash = payu::request_hash(
            payu_config,
            &payu::HashFields {
                txn_id: &order.txn_id,
                amount: &amount,
                product_info: &order.product_info,
                first_name: &order.first_name,
                email: &order.email,
            },
        );
        Ok(CheckoutSession {
            amount,
            merchant_key: payu_config.merchant_key.clone(),
            hash,
            first_name: order.first_name.clone(),
            email: order.email.clone(),
            payment_url: payu::payment_url(payu_config),
            order,
        })
    })?;

    info!(
        order_id = session.order.id,
        txn_id = %session.order.txn_id,
        amount = %session.amount,
        "checkout initiated"
    );
    Ok(session)
}
