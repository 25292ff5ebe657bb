/// Arithmetic mean of `ratings`, or exactly `0.0` when there are none.
pub fn average_rating(ratings: &[i32]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
    sum as f64 / ratings.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_reviews_is_zero() {
        let rating = average_rating(&[]);
        assert_eq!(rating, 0.0);
        assert!(!rating.is_nan());
    }

    #[test]
    fn mean_of_ratings() {
        assert_eq!(average_rating(&[4]), 4.0);
        assert_eq!(average_rating(&[3, 4]), 3.5);
        assert!((average_rating(&[1, 2, 2]) - 5.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn large_ratings_do_not_overflow() {
        assert_eq!(average_rating(&[i32::MAX, i32::MAX]), i32::MAX as f64);
    }
}
