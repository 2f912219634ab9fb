use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::dto::validation::validate_game_id;

/// Path parameters of the per-game endpoints.
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Path)]
pub struct GameIdPath {
    /// NBA game identifier, 10 digits.
    #[validate(custom(function = "validate_game_id"))]
    pub game_id: String,
}
