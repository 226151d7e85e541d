use crate::error::{RecommendError, RecommendResult};
use crate::models::*;

/// Checks an incoming rating against the scale and builds the triple.
pub fn validate_rating(user_id: UserId, film_id: FilmId, score: i64, scale: RatingScale) -> RecommendResult<Rating> {
    let score = Score::try_from(score)
        .ok()
        .filter(|&s| scale.contains(s))
        .ok_or_else(|| {
            RecommendError::InvalidInput(format!(
                "rating {} outside scale {}..={}",
                score, scale.min, scale.max
            ))
        })?;

    Ok(Rating::new(user_id, film_id, score))
}

/// Resolves a requested result count: absent uses `default`, negative
/// becomes zero, anything above `max` is capped.
pub fn resolve_count(requested: Option<i64>, default: usize, max: usize) -> usize {
    match requested {
        None => default.min(max),
        Some(n) if n <= 0 => 0,
        Some(n) => usize::try_from(n).unwrap_or(usize::MAX).min(max),
    }
}

pub fn require_user_id(user_id: Option<UserId>) -> RecommendResult<UserId> {
    user_id.ok_or_else(|| RecommendError::InvalidInput("no user_id provided".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rating() {
        let scale = RatingScale::default();
        assert_eq!(validate_rating(1, 2, 5, scale).unwrap(), Rating::new(1, 2, 5));
        assert!(validate_rating(1, 2, 0, scale).is_err());
        assert!(validate_rating(1, 2, 6, scale).is_err());
        assert!(validate_rating(1, 2, -3, scale).is_err());
        assert!(validate_rating(1, 2, 1000, scale).is_err());
    }

    #[test]
    fn test_resolve_count() {
        assert_eq!(resolve_count(None, 10, 100), 10);
        assert_eq!(resolve_count(Some(0), 10, 100), 0);
        assert_eq!(resolve_count(Some(-4), 10, 100), 0);
        assert_eq!(resolve_count(Some(7), 10, 100), 7);
        assert_eq!(resolve_count(Some(5000), 10, 100), 100);
    }

    #[test]
    fn test_require_user_id() {
        assert_eq!(require_user_id(Some(3)).unwrap(), 3);
        assert!(matches!(require_user_id(None), Err(RecommendError::InvalidInput(_))));
    }
}
