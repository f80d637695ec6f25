use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::commission::display_amount;
use crate::database::idgen;
use crate::database::models::{Notification, User, Withdrawal, WithdrawalStatus, AUDIENCE_ADMIN};
use crate::database::store::LedgerStore;
use crate::error::LedgerError;
use crate::mailer::{templates, EmailMessage};

pub fn minimum_withdrawal() -> BigDecimal {
    BigDecimal::from(10)
}

/// Outcome of an admin decision on a withdrawal.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub withdrawal: Withdrawal,
    pub user: User,
    pub email: EmailMessage,
}

// admin view of a withdrawal
#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawalListing {
    pub withdrawal: Withdrawal,
    pub user: Option<User>,
}

/// Moves `amount` out of the user's wallet into pending earnings and files a pending withdrawal.
pub fn request<S: LedgerStore>(
    store: &mut S,
    user_id: i64,
    amount: &BigDecimal,
    bank_details: &str,
    now: NaiveDateTime,
) -> Result<Withdrawal, LedgerError> {
    let bank_details = bank_details.trim();
    let withdrawal = store.atomically(|store| {
        let user = store.find_user(user_id)?.ok_or(LedgerError::not_found("user"))?;
        if *amount > user.wallet_balance {
            return Err(LedgerError::InsufficientFunds {
                requested: amount.clone(),
                available: user.wallet_balance,
            });
        }
        if *amount < minimum_withdrawal() {
            return Err(LedgerError::validation("amount"));
        }
        if bank_details.is_empty() {
            return Err(LedgerError::validation("bank_details"));
        }

        // the balance may have moved since it was read
        if !store.reserve_withdrawal_funds(user_id, amount)? {
            let available = store
                .find_user(user_id)?
                .map(|u| u.wallet_balance)
                .unwrap_or(user.wallet_balance);
            return Err(LedgerError::InsufficientFunds {
                requested: amount.clone(),
                available,
            });
        }

        let withdrawal = Withdrawal {
            id: idgen::next(),
            user_id,
            amount: amount.clone(),
            bank_details: bank_details.to_string(),
            status: WithdrawalStatus::Pending.as_str().to_string(),
            processed_by: None,
            processed_at: None,
            created_at: now,
        };
        store.insert_withdrawal(&withdrawal)?;
        info!(withdrawal_id = withdrawal.id, user_id, amount = %display_amount(amount), "withdrawal requested");
        Ok((withdrawal, user))
    });
    let (withdrawal, user) = withdrawal?;

    let notification = Notification {
        id: idgen::next(),
        user_id: None,
        audience: AUDIENCE_ADMIN.to_string(),
        kind: "withdrawal_request".to_string(),
        title: "New Withdrawal Request".to_string(),
        message: format!(
            "{} {} requested a withdrawal of ${}",
            user.first_name,
            user.last_name,
            display_amount(&withdrawal.amount)
        ),
        data: Some(serde_json::json!({ "withdrawal_id": withdrawal.id, "user_id": user.id })),
        is_read: false,
        created_at: now,
    };
    if let Err(e) = store.insert_notification(&notification) {
        warn!(withdrawal_id = withdrawal.id, "failed to notify admins of withdrawal: {e}");
    }
    Ok(withdrawal)
}

/// Approves or rejects a pending withdrawal on behalf of `admin_id`.
pub fn resolve<S: LedgerStore>(
    store: &mut S,
    withdrawal_id: i64,
    admin_id: i64,
    status: WithdrawalStatus,
    now: NaiveDateTime,
) -> Result<Resolution, LedgerError> {
    if status == WithdrawalStatus::Pending {
        return Err(LedgerError::validation("status"));
    }
    store.atomically(|store| {
        let mut withdrawal = store
            .lock_withdrawal(withdrawal_id)?
            .ok_or(LedgerError::not_found("withdrawal"))?;
        if withdrawal.status()? != WithdrawalStatus::Pending
            || !store.resolve_withdrawal(withdrawal_id, status, admin_id, now)?
        {
            return Err(LedgerError::conflict(format!(
                "withdrawal {withdrawal_id} is already {}",
                withdrawal.status
            )));
        }
        store.release_pending_funds(
            withdrawal.user_id,
            &withdrawal.amount,
            status == WithdrawalStatus::Rejected,
        )?;
        withdrawal.status = status.as_str().to_string();
        withdrawal.processed_by = Some(admin_id);
        withdrawal.processed_at = Some(now);

        let user = store
            .find_user(withdrawal.user_id)?
            .ok_or(LedgerError::not_found("user"))?;
        info!(withdrawal_id, admin_id, %status, "withdrawal resolved");
        let email = templates::withdrawal_resolution(&user, &withdrawal.amount, status);
        Ok(Resolution { withdrawal, user, email })
    })
}

pub fn history<S: LedgerStore>(store: &mut S, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError> {
    store.withdrawals_for_user(user_id)
}

pub fn list<S: LedgerStore>(
    store: &mut S,
    status: Option<WithdrawalStatus>,
) -> Result<Vec<WithdrawalListing>, LedgerError> {
    let withdrawals = store.list_withdrawals(status)?;
    let user_ids: Vec<i64> = withdrawals.iter().map(|w| w.user_id).collect();
    let users = store.users_by_id(&user_ids)?;
    Ok(withdrawals
        .into_iter()
        .map(|withdrawal| WithdrawalListing {
            user: users.get(&withdrawal.user_id).cloned(),
            withdrawal,
        })
        .collect())
}
