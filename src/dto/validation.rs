//! Validation helpers for DTOs.

use validator::ValidationError;

/// Length of an NBA game identifier such as `0022400501`.
const GAME_ID_LEN: usize = 10;

/// Validates that a game ID is exactly 10 ASCII digits.
///
/// # Examples
///
/// ```ignore
/// validate_game_id("0022400501") // Ok
/// validate_game_id("22400501")   // Err - too short
/// validate_game_id("00224005O1") // Err - letter O
/// ```
pub fn validate_game_id(id: &str) -> Result<(), ValidationError> {
    if id.len() != GAME_ID_LEN {
        let mut err = ValidationError::new("game_id_length");
        err.message = Some(
            format!(
                "Game ID must be exactly {GAME_ID_LEN} characters (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !id.bytes().all(|b| b.is_ascii_digit()) {
        let mut err = ValidationError::new("game_id_format");
        err.message = Some("Game ID must contain only digits".into());
        return Err(err);
    }

    Ok(())
}
