use crate::utils::error::{PredictionError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(PredictionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(PredictionError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(PredictionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(PredictionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(PredictionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(PredictionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(PredictionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PredictionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// An empty goal is a user mistake, not a configuration fault.
pub fn validate_design_goal(goal: &str) -> Result<()> {
    if goal.trim().is_empty() {
        return Err(PredictionError::ValidationError {
            message: "Please enter a valid materials design goal.".to_string(),
        });
    }
    Ok(())
}

pub fn validate_supercell(field_name: &str, factors: &[usize]) -> Result<()> {
    if factors.len() != 3 {
        return Err(PredictionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: format!("{:?}", factors),
            reason: "Expected exactly three factors (a, b, c)".to_string(),
        });
    }
    for factor in factors {
        validate_range(field_name, *factor, 1, 6)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("openai.endpoint", "https://api.openai.com/v1").is_ok());
        assert!(validate_url("openai.endpoint", "http://localhost:8080").is_ok());
        assert!(validate_url("openai.endpoint", "").is_err());
        assert!(validate_url("openai.endpoint", "invalid-url").is_err());
        assert!(validate_url("openai.endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("http.retry_attempts", 1, 1).is_ok());
        assert!(validate_positive_number("http.retry_attempts", 0, 1).is_err());
    }

    #[test]
    fn test_validate_design_goal() {
        assert!(validate_design_goal("transparent conductor").is_ok());
        let err = validate_design_goal("   ").unwrap_err();
        assert!(matches!(err, PredictionError::ValidationError { .. }));
    }

    #[test]
    fn test_validate_supercell() {
        assert!(validate_supercell("supercell", &[2, 2, 2]).is_ok());
        assert!(validate_supercell("supercell", &[1, 1, 6]).is_ok());
        assert!(validate_supercell("supercell", &[0, 2, 2]).is_err());
        assert!(validate_supercell("supercell", &[2, 2]).is_err());
        assert!(validate_supercell("supercell", &[2, 2, 7]).is_err());
    }
}
