use bigdecimal::BigDecimal;
use tracing::info;

use crate::database::models::{ReferralEarning, User};
use crate::database::store::LedgerStore;
use crate::error::LedgerError;

#[derive(Debug, Clone, PartialEq)]
pub struct ReferralStats {
    pub referral_code: String,
    pub referral_link: String,
    pub total_earnings: BigDecimal,
    pub wallet_balance: BigDecimal,
    pub pending_earnings: BigDecimal,
    pub referred_users_count: i64,
    pub referred_users: Vec<User>,
    pub earnings: Vec<ReferralEarning>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuyerEarning {
    pub earning: ReferralEarning,
    // none once the buyer's account is gone
    pub buyer: Option<User>,
}

pub fn referral_link(base_url: &str, code: &str) -> String {
    format!("{base_url}/register?ref={code}")
}

/// Attaches `user_id` to the owner of `code`. A referrer can be set once and never changed.
pub fn apply_code<S: LedgerStore>(store: &mut S, user_id: i64, code: &str) -> Result<User, LedgerError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(LedgerError::validation("referral_code"));
    }
    store.atomically(|store| {
        let user = store.find_user(user_id)?.ok_or(LedgerError::not_found("user"))?;
        if user.referred_by.is_some() {
            return Err(LedgerError::conflict("referral code already applied"));
        }
        let referrer = store
            .find_user_by_referral_code(code)?
            .ok_or(LedgerError::not_found("referral code"))?;
        if referrer.id == user.id {
            return Err(LedgerError::validation("referral_code"));
        }
        if !store.set_referrer_once(user.id, referrer.id)? {
            return Err(LedgerError::conflict("referral code already applied"));
        }
        info!(user_id, referrer_id = referrer.id, "referral code applied");
        Ok(referrer)
    })
}

pub fn stats<S: LedgerStore>(store: &mut S, user_id: i64, base_url: &str) -> Result<ReferralStats, LedgerError> {
    let user = store.find_user(user_id)?.ok_or(LedgerError::not_found("user"))?;
    let earnings = store.earnings_for_referrer(user_id)?;
    let total_earnings = earnings
        .iter()
        .fold(BigDecimal::from(0), |acc, e| acc + &e.commission_amount);
    Ok(ReferralStats {
        referral_link: referral_link(base_url, &user.referral_code),
        referral_code: user.referral_code,
        total_earnings,
        wallet_balance: user.wallet_balance,
        pending_earnings: user.pending_earnings,
        referred_users_count: store.count_referred_users(user_id)?,
        referred_users: store.referred_users(user_id)?,
        earnings,
    })
}

pub fn earnings<S: LedgerStore>(store: &mut S, user_id: i64) -> Result<Vec<BuyerEarning>, LedgerError> {
    store.find_user(user_id)?.ok_or(LedgerError::not_found("user"))?;
    let earnings = store.earnings_for_referrer(user_id)?;
    let buyer_ids: Vec<i64> = earnings.iter().map(|e| e.buyer_id).collect();
    let buyers = store.users_by_id(&buyer_ids)?;
    Ok(earnings
        .into_iter()
        .map(|earning| BuyerEarning {
            buyer: buyers.get(&earning.buyer_id).cloned(),
            earning,
        })
        .collect())
}
