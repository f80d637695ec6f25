use bigdecimal::BigDecimal;

use super::EmailMessage;
use crate::commission::{display_amount, effective_price};
use crate::database::models::{Course, Order, User, WithdrawalStatus};

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><body style=\"font-family: Arial, sans-serif;\">\
         <h1>{title}</h1>{body}\
         <p style=\"color: #64748B; font-size: 12px;\">&copy; LUMINA. All rights reserved.</p>\
         </body></html>"
    )
}

pub fn order_confirmation(user: &User, order: &Order, courses: &[Course], base_url: &str) -> EmailMessage {
    let rows: String = courses
        .iter()
        .map(|c| {
            format!(
                "<tr><td>{}</td><td style=\"text-align: right;\">${}</td></tr>",
                escape(&c.title),
                display_amount(&effective_price(c))
            )
        })
        .collect();
    let lines: String = courses
        .iter()
        .map(|c| format!("  {} - ${}\n", c.title, display_amount(&effective_price(c))))
        .collect();
    let total = display_amount(&order.total);
    let date = order.created_at.format("%B %d, %Y");

    let body_html = layout(
        "Order Confirmed!",
        &format!(
            "<p>Thank you for your purchase, {name}!</p>\
             <p>Invoice Number: <b>{txn}</b><br>Order Date: {date}</p>\
             <table style=\"width: 100%;\"><tr><th>Course</th><th style=\"text-align: right;\">Price</th></tr>\
             {rows}<tr><td><b>Total Paid</b></td><td style=\"text-align: right;\"><b>${total}</b></td></tr></table>\
             <p><a href=\"{base_url}/my-courses\">Start Learning</a></p>",
            name = escape(&user.first_name),
            txn = escape(&order.txn_id),
        ),
    );
    let body_text = format!(
        "Thank you for your purchase, {name}!\n\nInvoice Number: {txn}\nOrder Date: {date}\n\n{lines}\nTotal Paid: ${total}\n\nStart learning: {base_url}/my-courses\n",
        name = user.first_name,
        txn = order.txn_id,
    );

    EmailMessage {
        to: user.email.clone(),
        subject: format!("Order Confirmed - Invoice #{}", order.txn_id),
        body_html,
        body_text,
    }
}

pub fn withdrawal_resolution(user: &User, amount: &BigDecimal, status: WithdrawalStatus) -> EmailMessage {
    let (title, outcome, followup) = match status {
        WithdrawalStatus::Approved => (
            "Approved",
            "approved and processed",
            "The amount will be transferred to your bank account within 3-5 business days.",
        ),
        _ => (
            "Rejected",
            "rejected",
            "The amount has been returned to your wallet. Please contact support if you have any questions.",
        ),
    };
    let amount = display_amount(amount);

    EmailMessage {
        to: user.email.clone(),
        subject: format!("Withdrawal {title} - LUMINA"),
        body_html: layout(
            &format!("Withdrawal {title}"),
            &format!(
                "<p>Hi {name},</p><p>Your withdrawal request has been {outcome}.</p>\
                 <p style=\"font-size: 32px; font-weight: bold;\">${amount}</p><p>{followup}</p>",
                name = escape(&user.first_name),
            ),
        ),
        body_text: format!(
            "Hi {name},\n\nYour withdrawal request of ${amount} has been {outcome}.\n{followup}\n",
            name = user.first_name,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::fixtures::{course, money, pending_order, user};

    #[test]
    fn test_order_confirmation() {
        let buyer = user("bob@example.com", "BOBCODE1", None);
        let courses = vec![course("Rust <Advanced>", "100", Some("49.99")), course("SQL", "20", None)];
        let mut order = pending_order(buyer.id, courses.iter().map(|c| c.id).collect(), "TXN20260201120000AAAA0001");
        order.total = money("69.99");

        let email = order_confirmation(&buyer, &order, &courses, "https://learn.example.com");
        assert_eq!(email.to, "bob@example.com");
        assert_eq!(email.subject, "Order Confirmed - Invoice #TXN20260201120000AAAA0001");
        assert!(email.body_html.contains("Rust &lt;Advanced&gt;"));
        assert!(email.body_html.contains("$49.99"));
        assert!(email.body_html.contains("$69.99"));
        assert!(email.body_html.contains("February 01, 2026"));
        assert!(email.body_text.contains("SQL - $20.00"));
        assert!(email.body_text.contains("https://learn.example.com/my-courses"));
    }

    #[test]
    fn test_withdrawal_resolution() {
        let alice = user("alice@example.com", "ALICE001", None);

        let approved = withdrawal_resolution(&alice, &money("15"), WithdrawalStatus::Approved);
        assert_eq!(approved.subject, "Withdrawal Approved - LUMINA");
        assert!(approved.body_text.contains("$15.00 has been approved and processed"));

        let rejected = withdrawal_resolution(&alice, &money("15"), WithdrawalStatus::Rejected);
        assert_eq!(rejected.subject, "Withdrawal Rejected - LUMINA");
        assert!(rejected.body_html.contains("returned to your wallet"));
    }
}
