//! Wire messages of the HTTP API.
//!
//! Every response is a `GenericOutput` with exactly one payload or an
//! `error` set. Messages encode as protobuf or, via serde, as camelCase JSON.
//! Money travels as decimal strings, timestamps as `google.protobuf.Timestamp`.

use chrono::NaiveDateTime;
use prost_wkt_types::Timestamp;
use serde::{Deserialize, Serialize};

pub fn timestamp(value: NaiveDateTime) -> Timestamp {
    Timestamp {
        seconds: value.timestamp(),
        nanos: value.timestamp_subsec_nanos() as i32,
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct GenericOutput {
    #[prost(message, optional, tag = "1")]
    pub error: Option<Error>,
    #[prost(message, optional, tag = "2")]
    pub cart_item: Option<CartItemData>,
    #[prost(message, optional, tag = "3")]
    pub checkout: Option<CheckoutData>,
    #[prost(message, optional, tag = "4")]
    pub settlement: Option<SettlementData>,
    #[prost(message, optional, tag = "5")]
    pub orders: Option<OrderList>,
    #[prost(message, optional, tag = "6")]
    pub referrer: Option<ReferrerData>,
    #[prost(message, optional, tag = "7")]
    pub referral_stats: Option<ReferralStatsData>,
    #[prost(message, optional, tag = "8")]
    pub earnings: Option<EarningList>,
    #[prost(message, optional, tag = "9")]
    pub withdrawal: Option<WithdrawalData>,
    #[prost(message, optional, tag = "10")]
    pub withdrawals: Option<WithdrawalList>,
    #[prost(message, optional, tag = "11")]
    pub removed_cart_item: Option<RemovedCartItemData>,
    #[prost(message, optional, tag = "12")]
    pub cart: Option<CartData>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    #[prost(oneof = "error::OneError", tags = "1, 2, 3, 4, 5, 6")]
    pub one_error: Option<error::OneError>,
}

pub mod error {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Oneof)]
    #[serde(rename_all = "camelCase")]
    pub enum OneError {
        #[prost(message, tag = "1")]
        NotFound(super::NotFoundError),
        #[prost(message, tag = "2")]
        BadParameter(super::BadParameterError),
        #[prost(message, tag = "3")]
        Conflict(super::ConflictError),
        #[prost(message, tag = "4")]
        InsufficientFunds(super::InsufficientFundsError),
        #[prost(message, tag = "5")]
        Expired(super::ExpiredError),
        #[prost(message, tag = "6")]
        LimitReached(super::LimitReachedError),
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundError {
    #[prost(string, tag = "1")]
    pub entity: String,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct BadParameterError {
    #[prost(string, tag = "1")]
    pub name: String,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct ConflictError {
    #[prost(string, tag = "1")]
    pub reason: String,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct InsufficientFundsError {
    #[prost(string, tag = "1")]
    pub requested: String,
    #[prost(string, tag = "2")]
    pub available: String,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct ExpiredError {
    #[prost(string, tag = "1")]
    pub code: String,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct LimitReachedError {
    #[prost(string, tag = "1")]
    pub code: String,
}

// ---- payloads

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct AccountData {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(string, tag = "2")]
    pub first_name: String,
    #[prost(string, tag = "3")]
    pub last_name: String,
    #[prost(string, tag = "4")]
    pub email: String,
    #[prost(message, optional, tag = "5")]
    pub created_at: Option<Timestamp>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct CartItemData {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(int64, tag = "2")]
    pub user_id: i64,
    #[prost(int64, tag = "3")]
    pub course_id: i64,
    #[prost(message, optional, tag = "4")]
    pub created_at: Option<Timestamp>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct CartLineData {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(int64, tag = "2")]
    pub course_id: i64,
    #[prost(string, tag = "3")]
    pub course_title: String,
    #[prost(string, tag = "4")]
    pub list_price: String,
    // discount price when the course has one
    #[prost(string, tag = "5")]
    pub price: String,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct CartData {
    #[prost(message, repeated, tag = "1")]
    pub items: Vec<CartLineData>,
    #[prost(string, tag = "2")]
    pub total: String,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct RemovedCartItemData {
    #[prost(int64, tag = "1")]
    pub item_id: i64,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutData {
    #[prost(int64, tag = "1")]
    pub order_id: i64,
    #[prost(string, tag = "2")]
    pub txn_id: String,
    #[prost(string, tag = "3")]
    pub amount: String,
    #[prost(string, tag = "4")]
    pub merchant_key: String,
    #[prost(string, tag = "5")]
    pub hash: String,
    #[prost(string, tag = "6")]
    pub product_info: String,
    #[prost(string, tag = "7")]
    pub first_name: String,
    #[prost(string, tag = "8")]
    pub email: String,
    #[prost(string, tag = "9")]
    pub payment_url: String,
    #[prost(string, tag = "10")]
    pub subtotal: String,
    #[prost(string, tag = "11")]
    pub discount: String,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct OrderData {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(string, tag = "2")]
    pub txn_id: String,
    #[prost(int64, repeated, tag = "3")]
    pub course_ids: Vec<i64>,
    #[prost(string, tag = "4")]
    pub subtotal: String,
    #[prost(string, tag = "5")]
    pub discount: String,
    #[prost(string, tag = "6")]
    pub total: String,
    #[prost(string, tag = "7")]
    #[serde(default)]
    pub coupon_code: String,
    #[prost(string, tag = "8")]
    pub status: String,
    #[prost(string, tag = "9")]
    #[serde(default)]
    pub payment_id: String,
    #[prost(message, optional, tag = "10")]
    pub created_at: Option<Timestamp>,
    #[prost(message, optional, tag = "11")]
    pub completed_at: Option<Timestamp>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct OrderList {
    #[prost(message, repeated, tag = "1")]
    pub orders: Vec<OrderData>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct SettlementData {
    #[prost(message, optional, tag = "1")]
    pub order: Option<OrderData>,
    /// false when the callback was a duplicate of one already applied
    #[prost(bool, tag = "2")]
    pub applied: bool,
    #[prost(uint32, tag = "3")]
    pub enrollments_created: u32,
    #[prost(uint32, tag = "4")]
    pub commissions_posted: u32,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct ReferrerData {
    #[prost(int64, tag = "1")]
    pub referrer_id: i64,
    #[prost(string, tag = "2")]
    pub referrer_name: String,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct EarningData {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(int64, tag = "2")]
    pub buyer_id: i64,
    #[prost(int64, tag = "3")]
    pub course_id: i64,
    #[prost(string, tag = "4")]
    pub course_title: String,
    #[prost(string, tag = "5")]
    pub course_price: String,
    #[prost(string, tag = "6")]
    pub commission_amount: String,
    #[prost(int64, tag = "7")]
    pub order_id: i64,
    #[prost(string, tag = "8")]
    pub status: String,
    #[prost(message, optional, tag = "9")]
    pub created_at: Option<Timestamp>,
    #[prost(message, optional, tag = "10")]
    pub buyer: Option<AccountData>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct EarningList {
    #[prost(message, repeated, tag = "1")]
    pub earnings: Vec<EarningData>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct ReferralStatsData {
    #[prost(string, tag = "1")]
    pub referral_code: String,
    #[prost(string, tag = "2")]
    pub referral_link: String,
    #[prost(string, tag = "3")]
    pub total_earnings: String,
    #[prost(string, tag = "4")]
    pub wallet_balance: String,
    #[prost(string, tag = "5")]
    pub pending_earnings: String,
    #[prost(int64, tag = "6")]
    pub referred_users_count: i64,
    #[prost(message, repeated, tag = "7")]
    pub earnings: Vec<EarningData>,
    #[prost(message, repeated, tag = "8")]
    pub referred_users: Vec<AccountData>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalData {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(int64, tag = "2")]
    pub user_id: i64,
    #[prost(string, tag = "3")]
    pub amount: String,
    #[prost(string, tag = "4")]
    pub bank_details: String,
    #[prost(string, tag = "5")]
    pub status: String,
    #[prost(int64, optional, tag = "6")]
    pub processed_by: Option<i64>,
    #[prost(message, optional, tag = "7")]
    pub processed_at: Option<Timestamp>,
    #[prost(message, optional, tag = "8")]
    pub created_at: Option<Timestamp>,
    // admin listings only
    #[prost(message, optional, tag = "9")]
    pub user: Option<AccountData>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalList {
    #[prost(message, repeated, tag = "1")]
    pub withdrawals: Vec<WithdrawalData>,
}

// ---- inputs

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartInput {
    #[prost(int64, tag = "1")]
    pub user_id: i64,
    #[prost(int64, tag = "2")]
    pub course_id: i64,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentInput {
    #[prost(int64, tag = "1")]
    pub user_id: i64,
    #[prost(string, tag = "2")]
    #[serde(default)]
    pub coupon_code: String,
}

/// Gateway callback, posted as a form by the browser redirect or as JSON by the webhook.
#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
pub struct PaymentCallbackInput {
    #[prost(string, tag = "1")]
    #[serde(default, rename = "txnid", alias = "transaction_id", alias = "txnId")]
    pub txn_id: String,
    #[prost(string, tag = "2")]
    #[serde(default)]
    pub status: String,
    #[prost(string, tag = "3")]
    #[serde(default)]
    pub hash: String,
    #[prost(string, tag = "4")]
    #[serde(default, rename = "mihpayid", alias = "gateway_payment_id")]
    pub payment_id: String,
    #[prost(string, tag = "5")]
    #[serde(default, rename = "mode", alias = "payment_mode")]
    pub payment_mode: String,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReferralInput {
    #[prost(int64, tag = "1")]
    pub user_id: i64,
    #[prost(string, tag = "2")]
    #[serde(default)]
    pub referral_code: String,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawInput {
    #[prost(int64, tag = "1")]
    pub user_id: i64,
    #[prost(string, tag = "2")]
    pub amount: String,
    #[prost(string, tag = "3")]
    #[serde(default)]
    pub bank_details: String,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct ResolveWithdrawalInput {
    #[prost(int64, tag = "1")]
    pub admin_id: i64,
    #[prost(string, tag = "2")]
    pub status: String,
}
