use super::models::{Priority, Recipients};
use crate::configuration::{OnCallResponder, RecipientSettings};
use chrono::{DateTime, Utc};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Index of today's responder: whole days since the epoch modulo the
/// rotation length.
pub fn on_call_index(now: DateTime<Utc>, rotation_len: usize) -> Option<usize> {
    if rotation_len == 0 {
        return None;
    }
    let days = now.timestamp_millis().div_euclid(MILLIS_PER_DAY);
    Some(days.rem_euclid(rotation_len as i64) as usize)
}

pub fn on_call<'a>(rotation: &'a [OnCallResponder], now: DateTime<Utc>) -> Option<&'a OnCallResponder> {
    on_call_index(now, rotation.len()).map(|i| &rotation[i])
}

/// Base recipients always; urgent priorities add today's on-call responder.
pub fn resolve(
    priority: Priority,
    base: &RecipientSettings,
    rotation: &[OnCallResponder],
    now: DateTime<Utc>,
) -> Recipients {
    let mut recipients = Recipients {
        email: base.email.clone(),
        phone: base.phone.clone(),
    };

    if priority.pages_on_call() {
        if let Some(responder) = on_call(rotation, now) {
            if let Some(email) = &responder.email {
                if !recipients.email.contains(email) {
                    recipients.email.push(email.clone());
                }
            }
            if let Some(phone) = &responder.phone {
                if !recipients.phone.contains(phone) {
                    recipients.phone.push(phone.clone());
                }
            }
        }
    }

    recipients
}
