#![allow(unused_variables)]

use std::ops::DerefMut;
use std::str::FromStr;

use actix_request_identifier::RequestId;
use actix_web::error::BlockingError;
use actix_web::{delete, get, http::header, post, put, web, HttpResponse};
use bigdecimal::BigDecimal;
use chrono::{NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::{error, instrument};

use crate::config::Settings;
use crate::database::connect::DbPool;
use crate::database::models::WithdrawalStatus;
use crate::database::store::{LedgerStore, PgLedger};
use crate::error::LedgerError;
use crate::mailer::{self, DynMailer};
use crate::settlement::{PaymentCallback, Settlement};
use crate::{checkout, proto, referral, responses, settlement, withdrawal};

/// Shared handler state, built once at startup.
pub struct AppState {
    pub db: DbPool,
    pub settings: Settings,
    pub mailer: DynMailer,
}

type HandlerResult = Result<HttpResponse, Box<dyn std::error::Error>>;

fn wants_protobuf(accept: &header::Accept) -> bool {
    accept.iter().any(|a| a.item.essence_str() == "application/x-protobuf")
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

// turns the outcome of a blocking store call into a response
fn finish<T>(
    res: Result<Result<T, LedgerError>, BlockingError>,
    is_protobuf: bool,
    ok: impl FnOnce(T) -> HttpResponse,
) -> HandlerResult {
    match res {
        Ok(Ok(value)) => Ok(ok(value)),
        Ok(Err(e)) => {
            if let LedgerError::Database(_) = e {
                error!("{e}");
            }
            responses::ledger_error_http_response(e, is_protobuf)
        }
        Err(e) => {
            error!("{e}");
            Err(e.into())
        }
    }
}

#[post("/cart")]
#[instrument(skip(state), fields(request_id = request_id.as_str()))]
pub async fn add_to_cart_handler(
    state: web::Data<AppState>,
    request_id: RequestId,
    accept: web::Header<header::Accept>,
    input: web::Json<proto::AddToCartInput>,
) -> HandlerResult {
    let is_protobuf = wants_protobuf(&accept);
    if input.user_id <= 0 {
        return Ok(responses::bad_parameter_http_response("user_id", is_protobuf));
    }
    if input.course_id <= 0 {
        return Ok(responses::bad_parameter_http_response("course_id", is_protobuf));
    }

    let mut conn = state.db.get()?;
    let res = web::block(move || {
        let mut store = PgLedger::new(conn.deref_mut());
        checkout::add_to_cart(&mut store, input.user_id, input.course_id, now())
    })
    .await;
    finish(res, is_protobuf, |item| responses::cart_item_http_response(&item, is_protobuf))
}

#[get("/cart/{user_id}")]
#[instrument(skip(state), fields(request_id = request_id.as_str()))]
pub async fn cart_handler(
    state: web::Data<AppState>,
    request_id: RequestId,
    accept: web::Header<header::Accept>,
    user_id: web::Path<i64>,
) -> HandlerResult {
    let is_protobuf = wants_protobuf(&accept);
    let user_id = user_id.into_inner();
    if user_id <= 0 {
        return Ok(responses::bad_parameter_http_response("user_id", is_protobuf));
    }

    let mut conn = state.db.get()?;
    let res = web::block(move || {
        let mut store = PgLedger::new(conn.deref_mut());
        checkout::cart(&mut store, user_id)
    })
    .await;
    finish(res, is_protobuf, |cart| responses::cart_http_response(&cart, is_protobuf))
}

#[delete("/cart/{user_id}/{item_id}")]
#[instrument(skip(state), fields(request_id = request_id.as_str()))]
pub async fn remove_from_cart_handler(
    state: web::Data<AppState>,
    request_id: RequestId,
    accept: web::Header<header::Accept>,
    path: web::Path<(i64, i64)>,
) -> HandlerResult {
    let is_protobuf = wants_protobuf(&accept);
    let (user_id, item_id) = path.into_inner();

    let mut conn = state.db.get()?;
    let res = web::block(move || {
        let mut store = PgLedger::new(conn.deref_mut());
        checkout::remove_from_cart(&mut store, user_id, item_id)
    })
    .await;
    finish(res, is_protobuf, |_| {
        responses::removed_cart_item_http_response(item_id, is_protobuf)
    })
}

#[post("/payments/initiate")]
#[instrument(skip(state), fields(request_id = request_id.as_str()))]
pub async fn initiate_payment_handler(
    state: web::Data<AppState>,
    request_id: RequestId,
    accept: web::Header<header::Accept>,
    input: web::Json<proto::InitiatePaymentInput>,
) -> HandlerResult {
    let is_protobuf = wants_protobuf(&accept);
    if input.user_id <= 0 {
        return Ok(responses::bad_parameter_http_response("user_id", is_protobuf));
    }

    let mut conn = state.db.get()?;
    let payu = state.settings.payu.clone();
    let res = web::block(move || {
        let mut store = PgLedger::new(conn.deref_mut());
        let coupon_code = Some(input.coupon_code.trim()).filter(|c| !c.is_empty());
        checkout::initiate(&mut store, &payu, input.user_id, coupon_code, now())
    })
    .await;
    finish(res, is_protobuf, |session| {
        responses::checkout_http_response(&session, is_protobuf)
    })
}

async fn handle_payment_callback(
    state: web::Data<AppState>,
    input: proto::PaymentCallbackInput,
    is_protobuf: bool,
) -> HandlerResult {
    let callback = match PaymentCallback::parse(
        &input.txn_id,
        &input.status,
        Some(&input.hash),
        Some(&input.payment_id),
        Some(&input.payment_mode),
    ) {
        Ok(callback) => callback,
        Err(e) => return responses::ledger_error_http_response(e, is_protobuf),
    };

    let mut conn = state.db.get()?;
    let settings = state.settings.clone();
    let res = web::block(move || {
        let mut store = PgLedger::new(conn.deref_mut());
        settlement::settle(&mut store, &settings, &callback, now())
    })
    .await;

    if let Ok(Ok(Settlement::Completed { confirmation, .. })) = &res {
        mailer::dispatch(state.mailer.clone(), confirmation.clone(), state.settings.mail_timeout);
    }
    finish(res, is_protobuf, |settlement| {
        responses::settlement_http_response(&settlement, is_protobuf)
    })
}

/// Browser redirect from the gateway, posted as a form.
#[post("/payments/success")]
#[instrument(skip(state), fields(request_id = request_id.as_str()))]
pub async fn payment_success_handler(
    state: web::Data<AppState>,
    request_id: RequestId,
    accept: web::Header<header::Accept>,
    input: web::Form<proto::PaymentCallbackInput>,
) -> HandlerResult {
    handle_payment_callback(state, input.into_inner(), wants_protobuf(&accept)).await
}

/// Server-to-server notification from the gateway.
#[post("/payments/webhook")]
#[instrument(skip(state), fields(request_id = request_id.as_str()))]
pub async fn payment_webhook_handler(
    state: web::Data<AppState>,
    request_id: RequestId,
    accept: web::Header<header::Accept>,
    input: web::Json<proto::PaymentCallbackInput>,
) -> HandlerResult {
    handle_payment_callback(state, input.into_inner(), wants_protobuf(&accept)).await
}

#[get("/orders/{user_id}")]
#[instrument(skip(state), fields(request_id = request_id.as_str()))]
pub async fn orders_handler(
    state: web::Data<AppState>,
    request_id: RequestId,
    accept: web::Header<header::Accept>,
    user_id: web::Path<i64>,
) -> HandlerResult {
    let is_protobuf = wants_protobuf(&accept);
    let user_id = user_id.into_inner();

    let mut conn = state.db.get()?;
    let res = web::block(move || PgLedger::new(conn.deref_mut()).orders_for_user(user_id)).await;
    finish(res, is_protobuf, |orders| responses::orders_http_response(&orders, is_protobuf))
}

#[post("/referrals/apply")]
#[instrument(skip(state), fields(request_id = request_id.as_str()))]
pub async fn apply_referral_handler(
    state: web::Data<AppState>,
    request_id: RequestId,
    accept: web::Header<header::Accept>,
    input: web::Json<proto::ApplyReferralInput>,
) -> HandlerResult {
    let is_protobuf = wants_protobuf(&accept);
    if input.referral_code.trim().is_empty() {
        return Ok(responses::bad_parameter_http_response("referral_code", is_protobuf));
    }

    let mut conn = state.db.get()?;
    let res = web::block(move || {
        let mut store = PgLedger::new(conn.deref_mut());
        referral::apply_code(&mut store, input.user_id, &input.referral_code)
    })
    .await;
    finish(res, is_protobuf, |referrer| {
        responses::referrer_http_response(&referrer, is_protobuf)
    })
}

#[get("/referrals/{user_id}/stats")]
#[instrument(skip(state), fields(request_id = request_id.as_str()))]
pub async fn referral_stats_handler(
    state: web::Data<AppState>,
    request_id: RequestId,
    accept: web::Header<header::Accept>,
    user_id: web::Path<i64>,
) -> HandlerResult {
    let is_protobuf = wants_protobuf(&accept);
    let user_id = user_id.into_inner();

    let mut conn = state.db.get()?;
    let base_url = state.settings.public_base_url.clone();
    let res = web::block(move || {
        let mut store = PgLedger::new(conn.deref_mut());
        referral::stats(&mut store, user_id, &base_url)
    })
    .await;
    finish(res, is_protobuf, |stats| {
        responses::referral_stats_http_response(&stats, is_protobuf)
    })
}

#[get("/referrals/{user_id}/earnings")]
#[instrument(skip(state), fields(request_id = request_id.as_str()))]
pub async fn referral_earnings_handler(
    state: web::Data<AppState>,
    request_id: RequestId,
    accept: web::Header<header::Accept>,
    user_id: web::Path<i64>,
) -> HandlerResult {
    let is_protobuf = wants_protobuf(&accept);
    let user_id = user_id.into_inner();

    let mut conn = state.db.get()?;
    let res = web::block(move || {
        let mut store = PgLedger::new(conn.deref_mut());
        referral::earnings(&mut store, user_id)
    })
    .await;
    finish(res, is_protobuf, |earnings| {
        responses::earnings_http_response(&earnings, is_protobuf)
    })
}

#[post("/referrals/withdraw")]
#[instrument(skip(state), fields(request_id = request_id.as_str()))]
pub async fn withdraw_handler(
    state: web::Data<AppState>,
    request_id: RequestId,
    accept: web::Header<header::Accept>,
    input: web::Json<proto::WithdrawInput>,
) -> HandlerResult {
    let is_protobuf = wants_protobuf(&accept);
    let req_amount = match BigDecimal::from_str(input.amount.trim()) {
        Ok(req_amount) => req_amount,
        Err(_) => return Ok(responses::bad_parameter_http_response("amount", is_protobuf)),
    };
    if input.bank_details.trim().is_empty() {
        return Ok(responses::bad_parameter_http_response("bank_details", is_protobuf));
    }

    let mut conn = state.db.get()?;
    let res = web::block(move || {
        let mut store = PgLedger::new(conn.deref_mut());
        withdrawal::request(&mut store, input.user_id, &req_amount, &input.bank_details, now())
    })
    .await;
    finish(res, is_protobuf, |withdrawal| {
        responses::withdrawal_http_response(&withdrawal, is_protobuf)
    })
}

#[get("/referrals/{user_id}/withdrawals")]
#[instrument(skip(state), fields(request_id = request_id.as_str()))]
pub async fn withdrawal_history_handler(
    state: web::Data<AppState>,
    request_id: RequestId,
    accept: web::Header<header::Accept>,
    user_id: web::Path<i64>,
) -> HandlerResult {
    let is_protobuf = wants_protobuf(&accept);
    let user_id = user_id.into_inner();

    let mut conn = state.db.get()?;
    let res = web::block(move || {
        let mut store = PgLedger::new(conn.deref_mut());
        withdrawal::history(&mut store, user_id)
    })
    .await;
    finish(res, is_protobuf, |withdrawals| {
        responses::withdrawals_http_response(&withdrawals, is_protobuf)
    })
}

#[derive(Debug, Deserialize)]
pub struct WithdrawalFilter {
    status: Option<String>,
}

#[get("/admin/withdrawals")]
#[instrument(skip(state), fields(request_id = request_id.as_str()))]
pub async fn admin_withdrawals_handler(
    state: web::Data<AppState>,
    request_id: RequestId,
    accept: web::Header<header::Accept>,
    filter: web::Query<WithdrawalFilter>,
) -> HandlerResult {
    let is_protobuf = wants_protobuf(&accept);
    let status = match filter.status.as_deref().filter(|s| !s.is_empty()) {
        Some(status) => match WithdrawalStatus::from_str(status) {
            Ok(status) => Some(status),
            Err(_) => return Ok(responses::bad_parameter_http_response("status", is_protobuf)),
        },
        None => None,
    };

    let mut conn = state.db.get()?;
    let res = web::block(move || {
        let mut store = PgLedger::new(conn.deref_mut());
        withdrawal::list(&mut store, status)
    })
    .await;
    finish(res, is_protobuf, |listing| {
        responses::withdrawal_listing_http_response(&listing, is_protobuf)
    })
}

#[put("/admin/withdrawals/{withdrawal_id}")]
#[instrument(skip(state), fields(request_id = request_id.as_str()))]
pub async fn resolve_withdrawal_handler(
    state: web::Data<AppState>,
    request_id: RequestId,
    accept: web::Header<header::Accept>,
    withdrawal_id: web::Path<i64>,
    input: web::Json<proto::ResolveWithdrawalInput>,
) -> HandlerResult {
    let is_protobuf = wants_protobuf(&accept);
    let withdrawal_id = withdrawal_id.into_inner();
    let status = match WithdrawalStatus::from_str(input.status.trim()) {
        Ok(status @ (WithdrawalStatus::Approved | WithdrawalStatus::Rejected)) => status,
        _ => return Ok(responses::bad_parameter_http_response("status", is_protobuf)),
    };

    let mut conn = state.db.get()?;
    let res = web::block(move || {
        let mut store = PgLedger::new(conn.deref_mut());
        withdrawal::resolve(&mut store, withdrawal_id, input.admin_id, status, now())
    })
    .await;

    if let Ok(Ok(resolution)) = &res {
        mailer::dispatch(state.mailer.clone(), resolution.email.clone(), state.settings.mail_timeout);
    }
    finish(res, is_protobuf, |resolution| {
        responses::withdrawal_http_response(&resolution.withdrawal, is_protobuf)
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(cart_handler)
        .service(add_to_cart_handler)
        .service(remove_from_cart_handler)
        .service(initiate_payment_handler)
        .service(payment_success_handler)
        .service(payment_webhook_handler)
        .service(orders_handler)
        .service(apply_referral_handler)
        .service(referral_stats_handler)
        .service(referral_earnings_handler)
        .service(withdraw_handler)
        .service(withdrawal_history_handler)
        .service(admin_withdrawals_handler)
        .service(resolve_withdrawal_handler);
}
