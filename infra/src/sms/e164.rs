//! E.164 destination validation shared by the real providers

use phonenumber::{Mode, PhoneNumber};
use tracing::{debug, warn};

use vk_core::errors::DispatchError;
use vk_shared::phone::{mask_phone_number, normalize_phone_number};

/// Validate and normalize a destination to E.164
///
/// Numbers without a leading `+` are assumed to be North American.
pub fn to_e164(phone: &str) -> Result<String, DispatchError> {
    let normalized = normalize_phone_number(phone);

    if normalized.starts_with('+') {
        match normalized.parse::<PhoneNumber>() {
            Ok(parsed) if phonenumber::is_valid(&parsed) => {
                let formatted = parsed.format().mode(Mode::E164).to_string();
                debug!("Validated phone number: {}", mask_phone_number(&formatted));
                Ok(formatted)
            }
            Ok(_) => Err(DispatchError::InvalidRequest(format!(
                "Invalid phone number: {}",
                mask_phone_number(phone)
            ))),
            Err(e) => Err(DispatchError::InvalidRequest(format!(
                "Invalid phone number format: {}",
                e
            ))),
        }
    } else {
        let with_country = format!("+1{}", normalized);
        match with_country.parse::<PhoneNumber>() {
            Ok(parsed) if phonenumber::is_valid(&parsed) => {
                let formatted = parsed.format().mode(Mode::E164).to_string();
                warn!(
                    "Phone number missing country code, assumed US: {}",
                    mask_phone_number(&formatted)
                );
                Ok(formatted)
            }
            _ => Err(DispatchError::InvalidRequest(
                "Phone number must be in E.164 format (e.g., +14155552671)".to_string(),
            )),
        }
    }
}
