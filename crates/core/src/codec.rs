//! Action-state tokens.
//!
//! Interactive buttons carry the context needed to replay a schedule toggle on
//! a later, unrelated request. The context is packed into a short URL-safe
//! ASCII token:
//!
//! ```text
//! v1.<b64(reviewer_id)>.<b64(slot_id)>.<week>.<year>.<b64(hmac-sha256)>
//! ```
//!
//! Tokens come back from an external actor, so decoding validates every field
//! and checks the signature before anything is trusted. A new layout gets a new
//! leading version and the decoder keeps accepting older versions.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::domain::reviewer::ReviewerId;
use crate::domain::slot::SlotId;
use crate::domain::week::WeekYear;
use crate::errors::DomainError;

type HmacSha256 = Hmac<Sha256>;

pub const ACTION_INFO_VERSION: &str = "v1";
/// Slack caps an `action_id` at 255 characters and the longest toggle prefix
/// (`schedule.availability.v1:`) takes 25 of them.
pub const MAX_TOKEN_LEN: usize = 230;
/// Longest reviewer id, in bytes, whose tokens stay within [`MAX_TOKEN_LEN`]
/// for every slot and week.
pub const MAX_REVIEWER_ID_LEN: usize = 120;
pub const MIN_SECRET_LEN: usize = 16;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleActionInfo {
    pub reviewer_id: ReviewerId,
    pub slot_id: SlotId,
    pub week: WeekYear,
}

#[derive(Clone)]
pub struct ActionInfoCodec {
    mac: HmacSha256,
}

impl fmt::Debug for ActionInfoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionInfoCodec").finish_non_exhaustive()
    }
}

impl ActionInfoCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, DomainError> {
        let secret = secret.as_ref();
        if secret.len() < MIN_SECRET_LEN {
            return Err(DomainError::InvariantViolation(format!(
                "action signing secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|error| DomainError::InvariantViolation(error.to_string()))?;
        Ok(Self { mac })
    }

    pub fn encode(&self, info: &ScheduleActionInfo) -> Result<String, DomainError> {
        let body = format!(
            "{ACTION_INFO_VERSION}.{}.{}.{}.{}",
            URL_SAFE_NO_PAD.encode(info.reviewer_id.0.as_bytes()),
            URL_SAFE_NO_PAD.encode(info.slot_id.to_string().as_bytes()),
            info.week.week(),
            info.week.year(),
        );
        let signature = URL_SAFE_NO_PAD.encode(self.sign(body.as_bytes()));
        let token = format!("{body}.{signature}");
        if token.len() > MAX_TOKEN_LEN {
            return Err(DomainError::InvariantViolation(format!(
                "reviewer id `{}` is too long for an action token",
                info.reviewer_id.0
            )));
        }
        Ok(token)
    }

    pub fn decode(&self, token: &str) -> Result<ScheduleActionInfo, DomainError> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(malformed("token exceeds maximum length"));
        }
        if !token.is_ascii() {
            return Err(malformed("token must be ASCII"));
        }

        let (body, signature) = token.rsplit_once('.').ok_or_else(|| malformed("missing signature"))?;
        let fields = body.split('.').collect::<Vec<_>>();
        let [version, reviewer_id, slot_id, week, year] = fields.as_slice() else {
            return Err(malformed(format!("expected 6 fields, found {}", fields.len() + 1)));
        };
        if *version != ACTION_INFO_VERSION {
            return Err(malformed(format!("unsupported version `{version}`")));
        }

        let signature =
            URL_SAFE_NO_PAD.decode(signature).map_err(|_| malformed("signature is not base64"))?;
        let mut mac = self.mac.clone();
        mac.update(body.as_bytes());
        mac.verify_slice(&signature).map_err(|_| malformed("signature mismatch"))?;

        let reviewer_id = decode_text(reviewer_id, "reviewer id")?;
        let slot_id = decode_text(slot_id, "slot id")?
            .parse::<SlotId>()
            .map_err(|error| malformed(error.to_string()))?;
        let week = parse_number::<u32>(week, "week")?;
        let year = parse_number::<i32>(year, "year")?;
        let week = WeekYear::new(week, year).map_err(|error| malformed(error.to_string()))?;

        Ok(ScheduleActionInfo { reviewer_id: ReviewerId(reviewer_id), slot_id, week })
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

fn malformed(reason: impl Into<String>) -> DomainError {
    DomainError::MalformedActionInfo(reason.into())
}

fn decode_text(field: &str, label: &str) -> Result<String, DomainError> {
    let bytes =
        URL_SAFE_NO_PAD.decode(field).map_err(|_| malformed(format!("{label} is not base64")))?;
    let text = String::from_utf8(bytes).map_err(|_| malformed(format!("{label} is not UTF-8")))?;
    if text.trim().is_empty() {
        return Err(malformed(format!("{label} is empty")));
    }
    Ok(text)
}

fn parse_number<T: std::str::FromStr>(field: &str, label: &str) -> Result<T, DomainError> {
    if field.is_empty() || !field.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(malformed(format!("{label} is not numeric")));
    }
    field.parse::<T>().map_err(|_| malformed(format!("{label} is out of range")))
}
