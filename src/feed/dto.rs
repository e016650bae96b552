use serde::Deserialize;

use crate::error::AppError;

pub const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub message: String,
}

impl PostMessageRequest {
    pub fn checked(&self) -> Result<&str, AppError> {
        let text = self.message.trim();
        if text.is_empty() {
            return Err(AppError::validation("El mensaje no puede estar vacío"));
        }
        if text.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AppError::validation(format!(
                "El mensaje no puede superar {MAX_MESSAGE_CHARS} caracteres"
            )));
        }
        Ok(text)
    }
}
