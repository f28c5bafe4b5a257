use skybook_shared::User;

/// Credit the ledger on order confirmation: one ticket, the flight's
/// distance in miles.
pub fn credit(user: &mut User, miles: f64) {
    user.accumulated_miles += miles;
    user.ticket_count += 1;
}

/// Reverse a previous credit on refund. The balance is not clamped at
/// zero; a negative result is logged.
pub fn debit(user: &mut User, miles: f64) {
    user.accumulated_miles -= miles;
    user.ticket_count -= 1;
    if user.accumulated_miles < 0.0 || user.ticket_count < 0 {
        tracing::warn!(
            user_id = %user.id,
            miles = user.accumulated_miles,
            tickets = user.ticket_count,
            "loyalty ledger went negative after debit"
        );
    }
}
