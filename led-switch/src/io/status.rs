//! The status wire format: a base-10 integer in plain text, "0" meaning off.

use crate::errors::Error;

/// Parses a status response body into the LED state.
///
/// The body is trimmed, then must be an optional sign followed by ASCII digits. The LED is on
/// when the number is not zero. Digits are checked one by one, so arbitrarily long numbers never
/// overflow.
///
/// # Errors
/// * `InvalidStatus`: the trimmed body is not an integer.
///
/// # Example
/// ```
/// use led_switch::io::parse_status;
///
/// assert_eq!(parse_status("1\n").unwrap(), true);
/// assert_eq!(parse_status(" 0 ").unwrap(), false);
/// assert!(parse_status("on").is_err());
/// ```
pub fn parse_status(body: &str) -> Result<bool, Error> {
    let trimmed = body.trim();
    let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);

    match !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        true => Ok(digits.bytes().any(|b| b != b'0')),
        false => Err(Error::InvalidStatus {
            body: body.to_string(),
        }),
    }
}

/// Encodes a LED state the way the control endpoint expects it: "1" for on, "0" for off.
pub fn encode_status(enabled: bool) -> &'static str {
    match enabled {
        true => "1",
        false => "0",
    }
}
