use serde::Deserialize;

const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

impl Pagination {
    /// Limit and offset clamped to sane bounds.
    pub fn bounds(&self) -> (i64, i64) {
        (self.limit.clamp(1, MAX_LIMIT), self.offset.max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_clamped() {
        let p = Pagination { limit: 1000, offset: -4 };
        assert_eq!(p.bounds(), (100, 0));
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.bounds(), (20, 0));
    }
}
