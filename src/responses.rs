use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use prost::Message;

use crate::checkout::{Cart, CheckoutSession};
use crate::commission::display_amount;
use crate::database::models::{CartItem, Order, ReferralEarning, User, Withdrawal};
use crate::error::LedgerError;
use crate::proto::{
    error, timestamp, AccountData, BadParameterError, CartData, CartItemData, CartLineData, CheckoutData, ConflictError,
    EarningData, EarningList, Error, ExpiredError, GenericOutput, InsufficientFundsError, LimitReachedError,
    NotFoundError, OrderData, OrderList, ReferralStatsData, ReferrerData, RemovedCartItemData, SettlementData,
    WithdrawalData, WithdrawalList,
};
use crate::referral::{BuyerEarning, ReferralStats};
use crate::settlement::Settlement;
use crate::withdrawal::WithdrawalListing;

fn http_response(status: StatusCode, data: GenericOutput, is_protobuf: bool) -> HttpResponse {
    if is_protobuf {
        HttpResponse::build(status)
            .content_type("application/x-protobuf")
            .body(data.encode_to_vec())
    } else {
        HttpResponse::build(status).json(data)
    }
}

fn ok_http_response(data: GenericOutput, is_protobuf: bool) -> HttpResponse {
    http_response(StatusCode::OK, data, is_protobuf)
}

fn error_output(one_error: error::OneError) -> GenericOutput {
    GenericOutput {
        error: Some(Error {
            one_error: Some(one_error),
        }),
        ..Default::default()
    }
}

pub fn bad_parameter_http_response(field: &str, is_protobuf: bool) -> HttpResponse {
    http_response(
        StatusCode::BAD_REQUEST,
        error_output(error::OneError::BadParameter(BadParameterError {
            name: field.to_string(),
        })),
        is_protobuf,
    )
}

/// Renders a rejection as a typed error payload. Database failures are not
/// rejections and are handed back to actix as an internal error.
pub fn ledger_error_http_response(
    err: LedgerError,
    is_protobuf: bool,
) -> Result<HttpResponse, Box<dyn std::error::Error>> {
    let (status, one_error) = match err {
        LedgerError::NotFound { entity } => (
            StatusCode::NOT_FOUND,
            error::OneError::NotFound(NotFoundError {
                entity: entity.to_string(),
            }),
        ),
        LedgerError::Validation { field } => return Ok(bad_parameter_http_response(field, is_protobuf)),
        LedgerError::Conflict { reason } => (StatusCode::CONFLICT, error::OneError::Conflict(ConflictError { reason })),
        LedgerError::InsufficientFunds { requested, available } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            error::OneError::InsufficientFunds(InsufficientFundsError {
                requested: display_amount(&requested),
                available: display_amount(&available),
            }),
        ),
        LedgerError::Expired { code } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            error::OneError::Expired(ExpiredError { code }),
        ),
        LedgerError::LimitReached { code } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            error::OneError::LimitReached(LimitReachedError { code }),
        ),
        LedgerError::Database(e) => return Err(e.into()),
    };
    Ok(http_response(status, error_output(one_error), is_protobuf))
}

fn account_data(user: &User) -> AccountData {
    AccountData {
        id: user.id,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
        created_at: Some(timestamp(user.created_at)),
    }
}

fn order_data(order: &Order) -> OrderData {
    OrderData {
        id: order.id,
        txn_id: order.txn_id.clone(),
        course_ids: order.course_ids.clone(),
        subtotal: display_amount(&order.subtotal),
        discount: display_amount(&order.discount),
        total: display_amount(&order.total),
        coupon_code: order.coupon_code.clone().unwrap_or_default(),
        status: order.status.clone(),
        payment_id: order.payment_id.clone().unwrap_or_default(),
        created_at: Some(timestamp(order.created_at)),
        completed_at: order.completed_at.map(timestamp),
    }
}

fn earning_data(earning: &ReferralEarning) -> EarningData {
    EarningData {
        id: earning.id,
        buyer_id: earning.buyer_id,
        course_id: earning.course_id,
        course_title: earning.course_title.clone(),
        course_price: display_amount(&earning.course_price),
        // full precision, so sums on the client match the wallet
        commission_amount: earning.commission_amount.to_string(),
        order_id: earning.order_id,
        status: earning.status.clone(),
        created_at: Some(timestamp(earning.created_at)),
        buyer: None,
    }
}

fn withdrawal_data(withdrawal: &Withdrawal) -> WithdrawalData {
    WithdrawalData {
        id: withdrawal.id,
        user_id: withdrawal.user_id,
        amount: display_amount(&withdrawal.amount),
        bank_details: withdrawal.bank_details.clone(),
        status: withdrawal.status.clone(),
        processed_by: withdrawal.processed_by,
        processed_at: withdrawal.processed_at.map(timestamp),
        created_at: Some(timestamp(withdrawal.created_at)),
        user: None,
    }
}

pub fn cart_item_http_response(item: &CartItem, is_protobuf: bool) -> HttpResponse {
    let data = GenericOutput {
        cart_item: Some(CartItemData {
            id: item.id,
            user_id: item.user_id,
            course_id: item.course_id,
            created_at: Some(timestamp(item.created_at)),
        }),
        ..Default::default()
    };
    ok_http_response(data, is_protobuf)
}

pub fn cart_http_response(cart: &Cart, is_protobuf: bool) -> HttpResponse {
    let data = GenericOutput {
        cart: Some(CartData {
            items: cart
                .lines
                .iter()
                .map(|line| CartLineData {
                    id: line.item.id,
                    course_id: line.course.id,
                    course_title: line.course.title.clone(),
                    list_price: display_amount(&line.course.price),
                    price: display_amount(&line.price),
                })
                .collect(),
            total: display_amount(&cart.total),
        }),
        ..Default::default()
    };
    ok_http_response(data, is_protobuf)
}

pub fn removed_cart_item_http_response(item_id: i64, is_protobuf: bool) -> HttpResponse {
    let data = GenericOutput {
        removed_cart_item: Some(RemovedCartItemData { item_id }),
        ..Default::default()
    };
    ok_http_response(data, is_protobuf)
}

pub fn checkout_http_response(session: &CheckoutSession, is_protobuf: bool) -> HttpResponse {
    let data = GenericOutput {
        checkout: Some(CheckoutData {
            order_id: session.order.id,
            txn_id: session.order.txn_id.clone(),
            amount: session.amount.clone(),
            merchant_key: session.merchant_key.clone(),
            hash: session.hash.clone(),
            product_info: session.order.product_info.clone(),
            first_name: session.first_name.clone(),
            email: session.email.clone(),
            payment_url: session.payment_url.to_string(),
            subtotal: display_amount(&session.order.subtotal),
            discount: display_amount(&session.order.discount),
        }),
        ..Default::default()
    };
    ok_http_response(data, is_protobuf)
}

pub fn settlement_http_response(settlement: &Settlement, is_protobuf: bool) -> HttpResponse {
    let (applied, enrollments_created, commissions_posted) = match settlement {
        Settlement::Completed {
            enrollments_created,
            commissions,
            ..
        } => (true, *enrollments_created as u32, commissions.len() as u32),
        Settlement::Failed { .. } => (true, 0, 0),
        Settlement::AlreadyCompleted { .. } => (false, 0, 0),
    };
    let data = GenericOutput {
        settlement: Some(SettlementData {
            order: Some(order_data(settlement.order())),
            applied,
            enrollments_created,
            commissions_posted,
        }),
        ..Default::default()
    };
    ok_http_response(data, is_protobuf)
}

pub fn orders_http_response(orders: &[Order], is_protobuf: bool) -> HttpResponse {
    let data = GenericOutput {
        orders: Some(OrderList {
            orders: orders.iter().map(order_data).collect(),
        }),
        ..Default::default()
    };
    ok_http_response(data, is_protobuf)
}

pub fn referrer_http_response(referrer: &User, is_protobuf: bool) -> HttpResponse {
    let data = GenericOutput {
        referrer: Some(ReferrerData {
            referrer_id: referrer.id,
            referrer_name: format!("{} {}", referrer.first_name, referrer.last_name)
                .trim()
                .to_string(),
        }),
        ..Default::default()
    };
    ok_http_response(data, is_protobuf)
}

pub fn referral_stats_http_response(stats: &ReferralStats, is_protobuf: bool) -> HttpResponse {
    let data = GenericOutput {
        referral_stats: Some(ReferralStatsData {
            referral_code: stats.referral_code.clone(),
            referral_link: stats.referral_link.clone(),
            total_earnings: display_amount(&stats.total_earnings),
            wallet_balance: display_amount(&stats.wallet_balance),
            pending_earnings: display_amount(&stats.pending_earnings),
            referred_users_count: stats.referred_users_count,
            earnings: stats.earnings.iter().map(earning_data).collect(),
            referred_users: stats.referred_users.iter().map(account_data).collect(),
        }),
        ..Default::default()
    };
    ok_http_response(data, is_protobuf)
}

pub fn earnings_http_response(earnings: &[BuyerEarning], is_protobuf: bool) -> HttpResponse {
    let data = GenericOutput {
        earnings: Some(EarningList {
            earnings: earnings
                .iter()
                .map(|e| EarningData {
                    buyer: e.buyer.as_ref().map(account_data),
                    ..earning_data(&e.earning)
                })
                .collect(),
        }),
        ..Default::default()
    };
    ok_http_response(data, is_protobuf)
}

pub fn withdrawal_http_response(withdrawal: &Withdrawal, is_protobuf: bool) -> HttpResponse {
    let data = GenericOutput {
        withdrawal: Some(withdrawal_data(withdrawal)),
        ..Default::default()
    };
    ok_http_response(data, is_protobuf)
}

pub fn withdrawals_http_response(withdrawals: &[Withdrawal], is_protobuf: bool) -> HttpResponse {
    let data = GenericOutput {
        withdrawals: Some(WithdrawalList {
            withdrawals: withdrawals.iter().map(withdrawal_data).collect(),
        }),
        ..Default::default()
    };
    ok_http_response(data, is_protobuf)
}

pub fn withdrawal_listing_http_response(listing: &[WithdrawalListing], is_protobuf: bool) -> HttpResponse {
    let data = GenericOutput {
        withdrawals: Some(WithdrawalList {
            withdrawals: listing
                .iter()
                .map(|row| WithdrawalData {
                    user: row.user.as_ref().map(account_data),
                    ..withdrawal_data(&row.withdrawal)
                })
                .collect(),
        }),
        ..Default::default()
    };
    ok_http_response(data, is_protobuf)
}
