/// Position of the current question within the questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

impl Progress {
    pub fn new(current: usize, total: usize) -> Self {
        Self { current, total }
    }

    /// Rounded completion percentage; zero for an empty questionnaire.
    pub fn percentage(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let ratio = self.current.min(self.total) as f64 / self.total as f64;
        (ratio * 100.0).round() as u8
    }

    pub fn label(&self) -> String {
        format!("Question {} of {}", self.current, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds() {
        assert_eq!(Progress::new(1, 3).percentage(), 33);
        assert_eq!(Progress::new(2, 3).percentage(), 67);
        assert_eq!(Progress::new(3, 3).percentage(), 100);
    }

    #[test]
    fn empty_questionnaire_reports_zero() {
        assert_eq!(Progress::new(0, 0).percentage(), 0);
        assert_eq!(Progress::new(0, 0).label(), "Question 0 of 0");
    }
}
